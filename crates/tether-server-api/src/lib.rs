//! Remote server API contract and its default blocking HTTP implementation.
//!
//! The backend only needs two operations from a server: look up one project by
//! key, and list all projects visible to the connection. Everything else
//! (auth, base-URL rules, paging) is an implementation detail behind the
//! [`ServerApi`] trait, which tests replace with in-memory fakes.

mod endpoint;
mod http;

use std::sync::Arc;

use tether_scheduler::CancellationToken;

pub use endpoint::{Credentials, CredentialsProvider, EndpointParams};
pub use http::{HttpServerApi, HttpServerApiProvider};

/// A remote project, as the server reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerProject {
    pub key: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credentials were rejected. Flips the owning connection to INVALID.
    #[error("unauthorized")]
    Unauthorized,
    /// Cooperative cancellation observed mid-call. Never cached.
    #[error("cancelled")]
    Cancelled,
    #[error("server returned status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("transport error for {path}: {message}")]
    Transport { path: String, message: String },
    #[error("unexpected payload for {path}: {message}")]
    Payload { path: String, message: String },
}

/// Operations the backend consumes from a remote server.
pub trait ServerApi: Send + Sync {
    /// Fetches one project by key. `Ok(None)` means the project does not
    /// exist (or is not visible to these credentials).
    fn get_project(
        &self,
        project_key: &str,
        token: &CancellationToken,
    ) -> Result<Option<ServerProject>, ApiError>;

    /// Lists every project visible to the connection.
    fn search_projects(&self, token: &CancellationToken) -> Result<Vec<ServerProject>, ApiError>;
}

/// Builds [`ServerApi`] instances for resolved endpoints. The production
/// implementation speaks HTTP; tests substitute programmable fakes.
pub trait ServerApiProvider: Send + Sync {
    fn create(&self, endpoint: &EndpointParams, credentials: &Credentials) -> Arc<dyn ServerApi>;
}
