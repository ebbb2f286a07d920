//! Error types for the replication engine.
//!
//! Only precondition failures are fatal. Everything that goes wrong after
//! the run has started is scoped to a single entity, absorbed by
//! [`retry::guarded_call`](crate::retry::guarded_call), and surfaced
//! through the run report instead of an error.

use thiserror::Error;
use wsmirror_gateway::error::GatewayError;
use wsmirror_gateway::model::EntityId;

/// Fatal errors that abort a run before any mutation is issued.
#[derive(Debug, Error)]
pub enum CloneError {
    /// The source workspace could not be read.
    #[error("source workspace {workspace_id} is not accessible: {cause}")]
    SourceUnavailable {
        /// The source workspace id.
        workspace_id: EntityId,
        /// The gateway failure that stopped the precondition check.
        cause: GatewayError,
    },

    /// The target workspace could not be read.
    #[error("target workspace {workspace_id} is not accessible: {cause}")]
    TargetUnavailable {
        /// The target workspace id.
        workspace_id: EntityId,
        /// The gateway failure that stopped the precondition check.
        cause: GatewayError,
    },
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, CloneError>;
