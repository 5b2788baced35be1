//! Unified error handling for the sync engine.
//!
//! Provides the recoverable error surface exposed to UI callers. All
//! engine operations return `Result<T, SyncError>`. Stale-generation
//! responses are an internal condition and never surface here; they are
//! discarded with a debug log inside the orchestrator.

use thiserror::Error;

use crate::backend::BackendError;

/// Recoverable failures surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote cart/wishlist mutation failed. In-memory state has
    /// already been rolled back to the pre-mutation snapshot; the caller
    /// may retry the operation, but the engine never retries on its own.
    #[error("remote mutation failed: {0}")]
    RemoteMutation(#[from] BackendError),

    /// A wishlist mutation was attempted without an authenticated
    /// identity. No state was changed.
    #[error("authentication required")]
    AuthRequired,
}

impl SyncError {
    /// Whether the failure is worth offering a retry to the user.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteMutation(_))
    }
}

/// Result type alias for `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;
