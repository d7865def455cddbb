//! In-memory registries for connections and configuration scopes, plus the
//! event bus that ties backend components together.
//!
//! Repositories are pure data guarded by locks: event handlers and suggestion
//! computations mutate and read them concurrently, and read-then-act races
//! (an entry vanishing between a lookup and a removal) are benign by design.

mod config;
mod connection;
mod events;
mod validation;

pub use config::ConfigurationRepository;
pub use connection::ConnectionRepository;
pub use events::{Event, EventBus};
pub use validation::{validate_connection, FieldError, InvalidConnectionParams};
