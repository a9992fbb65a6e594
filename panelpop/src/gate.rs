//! The activation gate permanently disables panel fetching for an installation
//! once the backend has rejected it. The tripped state survives restarts through
//! a marker whose presence alone means "deactivated".

use crate::config::MarkerStoreType;
use crate::counter;
use crate::metrics_defs::{GATE_PERSIST_FAILURE, GATE_TRIPPED};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const MARKER_CONTENTS: &[u8] = b"{}";

#[derive(thiserror::Error, Debug)]
pub enum MarkerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("could not move marker into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("marker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn exists(&self) -> Result<bool, MarkerError>;
    async fn create(&self) -> Result<(), MarkerError>;
}

pub fn get_store(store_type: &MarkerStoreType) -> Arc<dyn MarkerStore> {
    match store_type {
        MarkerStoreType::Filesystem { base_dir, filename } => {
            Arc::new(FilesystemMarkerStore::new(base_dir, filename))
        }
        MarkerStoreType::Memory => Arc::new(EphemeralMarkerStore::default()),
    }
}

pub struct FilesystemMarkerStore {
    path: PathBuf,
}

impl FilesystemMarkerStore {
    pub fn new<P: AsRef<Path>>(base_dir: P, filename: &str) -> Self {
        FilesystemMarkerStore {
            path: base_dir.as_ref().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MarkerStore for FilesystemMarkerStore {
    async fn exists(&self) -> Result<bool, MarkerError> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    async fn create(&self) -> Result<(), MarkerError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, MARKER_CONTENTS)).await?
    }
}

/// Writes to a temporary file in the target directory and renames it over the
/// target, so readers see either no marker or a complete one.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), MarkerError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    tracing::debug!(path = ?path, "Wrote deactivation marker");
    Ok(())
}

/// Marker kept in memory only. The deactivation is forgotten when the process exits.
#[derive(Default)]
pub struct EphemeralMarkerStore {
    marked: AtomicBool,
}

#[async_trait]
impl MarkerStore for EphemeralMarkerStore {
    async fn exists(&self) -> Result<bool, MarkerError> {
        Ok(self.marked.load(Ordering::Acquire))
    }

    async fn create(&self) -> Result<(), MarkerError> {
        self.marked.store(true, Ordering::Release);
        Ok(())
    }
}

pub struct ActivationGate {
    active: AtomicBool,
    store: Arc<dyn MarkerStore>,
}

impl ActivationGate {
    /// Reads the marker once. The result is cached for the lifetime of the gate.
    pub async fn load(store: Arc<dyn MarkerStore>) -> Self {
        let active = match store.exists().await {
            Ok(marked) => !marked,
            Err(e) => {
                tracing::warn!(error = %e, "Could not check deactivation marker, assuming active");
                true
            }
        };

        if !active {
            tracing::info!("Deactivation marker present, panel fetching is disabled");
        }

        ActivationGate {
            active: AtomicBool::new(active),
            store,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deactivates the client. Idempotent; there is no way back.
    ///
    /// The in-memory flag is cleared before the marker is written, so a failed
    /// write only loses durability across restarts. The write runs on its own
    /// task and completes even if the caller is cancelled.
    pub async fn trip(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        counter!(GATE_TRIPPED).increment(1);
        tracing::warn!("Backend rejected this installation, deactivating panel fetching");

        let store = self.store.clone();
        let result = match tokio::spawn(async move { store.create().await }).await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            counter!(GATE_PERSIST_FAILURE).increment(1);
            tracing::error!(
                error = %e,
                "Failed to persist deactivation marker, deactivation will not survive a restart"
            );
        }
    }
}
