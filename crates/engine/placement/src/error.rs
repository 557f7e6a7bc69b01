//! Error types for the placement engine
//!
//! Capability and normalization edge cases never show up here: an
//! unresolved probe is reported as [`Capability::Unsupported`] and a
//! zero-extent mesh gets identity normalization.

use crate::capability::Capability;
use crate::session::{ObjectId, SessionId};
use crate::substrate::SubstrateError;

/// Errors that can occur while driving a placement session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A session start was requested while another is running
    #[error("Tracking session {active} is already active")]
    SessionConflict { active: SessionId },

    /// The environment cannot open a tracking session
    #[error("AR tracking is not available (capability: {0})")]
    TrackingUnavailable(Capability),

    /// The operation needs a running session
    #[error("No tracking session is active")]
    NoActiveSession,

    /// The session a model was requested under has been torn down
    #[error("Tracking session {0} ended before the model could be attached")]
    SessionEnded(SessionId),

    /// The asset loader rejected the locator or returned no geometry
    #[error("Failed to load asset '{locator}': {reason}")]
    AssetLoad { locator: String, reason: String },

    /// The catalog provider failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// No catalog entry with this id
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// No anchored object with this id in the current session
    #[error("Unknown anchored object: {0}")]
    UnknownObject(ObjectId),

    /// The tracking substrate refused an operation
    #[error("Substrate error: {0}")]
    Substrate(#[from] SubstrateError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for placement operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an asset load error from any displayable cause
    pub fn asset_load(locator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::AssetLoad {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the failure originated outside the engine (assets,
    /// catalog, substrate) and should be shown to the user as-is
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            Error::AssetLoad { .. } | Error::Catalog(_) | Error::Substrate(_)
        )
    }

    /// Returns true if the caller misused the session lifecycle
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Error::SessionConflict { .. }
                | Error::TrackingUnavailable(_)
                | Error::NoActiveSession
                | Error::SessionEnded(_)
        )
    }
}
