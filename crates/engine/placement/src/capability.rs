//! AR capability detection
//!
//! The probe runs at most once per detector. Every later call returns the
//! cached answer, and once resolved the answer never changes. A missing
//! tracking API, a rejected check and a check that never completes all
//! resolve to [`Capability::Unsupported`]: not being able to do AR is an
//! ordinary outcome, not an error.

use crate::substrate::TrackingSubstrate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Whether the environment can open an AR tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The probe has not completed yet
    #[default]
    Unknown,
    Supported,
    Unsupported,
}

impl Capability {
    pub fn is_supported(self) -> bool {
        self == Capability::Supported
    }

    pub fn is_resolved(self) -> bool {
        self != Capability::Unknown
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Supported => write!(f, "supported"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Caches the result of a single capability probe
#[derive(Debug)]
pub struct CapabilityDetector {
    resolved: OnceCell<Capability>,
    timeout: Duration,
}

impl CapabilityDetector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            resolved: OnceCell::new(),
            timeout,
        }
    }

    /// The resolved capability, or `Unknown` while the probe is pending
    pub fn current(&self) -> Capability {
        self.resolved.get().copied().unwrap_or_default()
    }

    /// Probe the substrate once and cache the answer
    ///
    /// Concurrent callers wait for the same probe; callers after resolution
    /// get the cached value without touching the substrate.
    pub async fn probe<S>(&self, substrate: &S) -> Capability
    where
        S: TrackingSubstrate + ?Sized,
    {
        *self
            .resolved
            .get_or_init(|| async {
                let capability = resolve(substrate, self.timeout).await;
                info!(%capability, "AR capability resolved");
                capability
            })
            .await
    }
}

impl Default for CapabilityDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

async fn resolve<S>(substrate: &S, timeout: Duration) -> Capability
where
    S: TrackingSubstrate + ?Sized,
{
    if !substrate.has_tracking_api() {
        debug!("no tracking API present");
        return Capability::Unsupported;
    }

    match tokio::time::timeout(timeout, substrate.is_session_supported()).await {
        Ok(Ok(true)) => Capability::Supported,
        Ok(Ok(false)) => Capability::Unsupported,
        Ok(Err(err)) => {
            warn!(error = %err, "capability check rejected, treating as unsupported");
            Capability::Unsupported
        }
        Err(_) => {
            warn!(?timeout, "capability check timed out, treating as unsupported");
            Capability::Unsupported
        }
    }
}
