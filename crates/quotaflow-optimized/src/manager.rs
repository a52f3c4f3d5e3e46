//! The connection-manager interface the optimizer decorates.

use async_trait::async_trait;
use serde::Serialize;

/// Aggregate status snapshot of a connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    /// Connections currently established.
    pub active_connections: usize,
    /// Whether every active connection passed its last health check.
    pub healthy: bool,
    /// Free-form detail for display.
    pub detail: String,
}

/// Errors surfaced by manager operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    /// A connect attempt failed.
    #[error("connect failed for {profile:?}: {message}")]
    Connect {
        /// Profile that failed to connect.
        profile: String,
        /// Source error description.
        message: String,
    },
    /// A disconnect attempt failed.
    #[error("disconnect failed for {profile:?}: {message}")]
    Disconnect {
        /// Profile that failed to disconnect.
        profile: String,
        /// Source error description.
        message: String,
    },
    /// The status snapshot could not be produced.
    #[error("status unavailable: {message}")]
    Status {
        /// Source error description.
        message: String,
    },
    /// A batched operation lost its outcome before delivery.
    #[error("batched operation failed: {message}")]
    Batch {
        /// What went wrong in the batching layer.
        message: String,
    },
}

/// A connection manager: the narrow interface the optimizer wraps.
///
/// `batch_connect` has a default pass-through implementation so plain
/// managers only provide the three core operations.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Establishes the connection for a profile.
    async fn connect(&self, profile: &str) -> Result<(), ManagerError>;

    /// Tears down the connection for a profile.
    async fn disconnect(&self, profile: &str) -> Result<(), ManagerError>;

    /// Produces an aggregate status snapshot.
    async fn status(&self) -> Result<ManagerStatus, ManagerError>;

    /// Connects several profiles, returning one outcome per profile in
    /// the given order.
    async fn batch_connect(&self, profiles: &[String]) -> Vec<Result<(), ManagerError>> {
        let mut results = Vec::with_capacity(profiles.len());
        for profile in profiles {
            results.push(self.connect(profile).await);
        }
        results
    }
}
