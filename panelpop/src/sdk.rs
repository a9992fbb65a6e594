//! Process-wide client for hosts that want a single shared session.
//!
//! Embedders that manage their own lifetimes can use [`PanelSession`] directly.

use crate::config::Config;
use crate::errors::InitError;
use crate::session::{FetchedPanel, PanelSession, SessionState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

static SESSION: OnceCell<PanelSession> = OnceCell::const_new();

/// Creates the shared session. Calling this again returns the existing
/// session and ignores the new config.
pub async fn initialize(config: Config) -> Result<&'static PanelSession, InitError> {
    if let Some(session) = SESSION.get() {
        tracing::warn!("PanelPop is already initialized, ignoring new configuration");
        return Ok(session);
    }

    SESSION
        .get_or_try_init(|| async move {
            let session = PanelSession::new(config).await?;
            tracing::info!(
                api_url = %session.config().api_url,
                active = session.is_active(),
                "PanelPop initialized"
            );
            Ok::<_, InitError>(session)
        })
        .await
}

/// Shorthand for [`initialize`] with the default endpoint, storing the
/// deactivation marker under `data_dir`.
pub async fn initialize_with_key(
    app_key: impl Into<String>,
    data_dir: impl Into<PathBuf>,
) -> Result<&'static PanelSession, InitError> {
    initialize(Config::new(app_key, data_dir)).await
}

pub fn session() -> Option<&'static PanelSession> {
    SESSION.get()
}

pub async fn get_panel(token: &str) -> Option<Arc<FetchedPanel>> {
    match SESSION.get() {
        Some(session) => session.get_panel(token).await,
        None => {
            tracing::warn!("PanelPop is not initialized, call initialize first");
            None
        }
    }
}

pub fn state() -> SessionState {
    SESSION
        .get()
        .map_or(SessionState::Uninitialized, PanelSession::state)
}
