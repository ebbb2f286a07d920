//! Error types for the gateway contract.

use crate::model::EntityId;
use std::time::Duration;
use thiserror::Error;

/// Failures a gateway operation can report.
///
/// `RateLimited` is the only transient signal the replication engine reacts
/// to; every other variant is absorbed at the entity level.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote asked us to back off for the given duration.
    #[error("rate limited, retry after {:.1}s", .retry_after.as_secs_f64())]
    RateLimited {
        /// How long the remote asked us to wait before retrying.
        retry_after: Duration,
    },

    /// The workspace does not exist or the session cannot see it.
    #[error("workspace {workspace_id} not found or not accessible")]
    WorkspaceNotFound {
        /// The workspace that could not be reached.
        workspace_id: EntityId,
    },

    /// The session lacks permission for the operation.
    #[error("permission denied: {msg}")]
    Forbidden {
        /// What the remote reported.
        msg: String,
    },

    /// The remote rejected the request payload.
    #[error("validation rejected: {msg}")]
    Validation {
        /// What the remote reported.
        msg: String,
    },

    /// Any other non-success HTTP response.
    #[error("HTTP {status}: {msg}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        msg: String,
    },

    /// The request never got a response.
    #[error("network error: {msg}")]
    Network {
        /// Underlying transport error text.
        msg: String,
    },
}

/// Convenience alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
