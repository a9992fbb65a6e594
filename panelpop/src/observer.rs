//! Observability hook for panel sessions.
//!
//! A fetch that "succeeds" with an unreadable schema still returns a panel with
//! no content. Hosts that need to tell that apart from a genuinely empty panel
//! can watch for [`PanelEvent::SchemaDegraded`].

use crate::errors::{DecodeError, PanelError};

#[derive(Debug)]
pub enum PanelEvent<'a> {
    /// A panel was fetched and stored as the current panel.
    Fetched { token: &'a str, blocks: usize },
    /// The panel was fetched but its content schema was replaced by an empty document.
    SchemaDegraded {
        token: &'a str,
        error: &'a DecodeError,
    },
    /// The fetch produced no panel. The session stays usable.
    FetchFailed {
        token: &'a str,
        error: &'a PanelError,
    },
    /// The backend rejected the installation and the session is now deactivated.
    Deactivated { token: &'a str },
    SkippedInactive { token: &'a str },
    SkippedEmptyToken,
}

impl PanelEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            PanelEvent::Fetched { .. } => "fetched",
            PanelEvent::SchemaDegraded { .. } => "schema_degraded",
            PanelEvent::FetchFailed { .. } => "fetch_failed",
            PanelEvent::Deactivated { .. } => "deactivated",
            PanelEvent::SkippedInactive { .. } => "skipped_inactive",
            PanelEvent::SkippedEmptyToken => "skipped_empty_token",
        }
    }
}

pub trait PanelObserver: Send + Sync {
    fn on_event(&self, event: &PanelEvent<'_>);
}

/// Default observer. Writes every event to the `tracing` log.
pub struct TracingObserver;

impl PanelObserver for TracingObserver {
    fn on_event(&self, event: &PanelEvent<'_>) {
        match event {
            PanelEvent::Fetched { token, blocks } => {
                tracing::info!(token = %token, blocks = blocks, "Fetched panel");
            }
            PanelEvent::SchemaDegraded { token, error } => {
                tracing::warn!(
                    token = %token,
                    error = %error,
                    "Panel schema could not be decoded, showing empty content"
                );
            }
            PanelEvent::FetchFailed { token, error } => {
                tracing::error!(token = %token, kind = error.kind(), error = %error, "Failed to fetch panel");
            }
            PanelEvent::Deactivated { token } => {
                tracing::warn!(token = %token, "Panel fetch rejected with 403, client deactivated");
            }
            PanelEvent::SkippedInactive { token } => {
                tracing::debug!(token = %token, "Client is inactive, not fetching panel");
            }
            PanelEvent::SkippedEmptyToken => {
                tracing::debug!("No token provided, not fetching panel");
            }
        }
    }
}
