use parking_lot::RwLock;

use tether_core::BindingConfiguration;

/// Registry and lifecycle events. Plain data values; no payload carries
/// behavior, so events can be cloned into handlers freely.
#[derive(Clone, Debug)]
pub enum Event {
    ConfigurationScopesAdded {
        scope_ids: Vec<String>,
    },
    ConfigurationScopeRemoved {
        scope_id: String,
    },
    BindingConfigChanged {
        scope_id: String,
        previous: BindingConfiguration,
        new_config: BindingConfiguration,
    },
    ConnectionAdded {
        connection_id: String,
    },
    ConnectionUpdated {
        connection_id: String,
    },
    ConnectionRemoved {
        connection_id: String,
    },
    ConnectionCredentialsChanged {
        connection_id: String,
    },
    /// Files created or modified in a scope, as `(scope_id, file_name)` pairs.
    FileSystemUpdated {
        added_or_updated: Vec<(String, String)>,
    },
}

type Handler = Box<dyn Fn(&Event) + Send + Sync>;

/// Synchronous in-process observer registry.
///
/// Handlers are registered once at backend startup and invoked in
/// registration order on the publisher's thread. Handlers that need to do
/// real work hand it off to the background scheduler themselves.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.handlers.write().push(Box::new(handler));
    }

    pub fn publish(&self, event: &Event) {
        for handler in self.handlers.read().iter() {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn publish_invokes_handlers_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |_event| seen.lock().push(tag));
        }

        bus.publish(&Event::ConnectionAdded {
            connection_id: "conn1".to_string(),
        });
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn each_publish_reaches_every_handler() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_for_handler = Arc::clone(&calls);
        bus.subscribe(move |_event| {
            calls_for_handler.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&Event::ConfigurationScopeRemoved {
            scope_id: "scope1".to_string(),
        });
        bus.publish(&Event::ConnectionRemoved {
            connection_id: "conn1".to_string(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
