use crate::config::Config;
use crate::content::{self, ContentDocument, SchemaStatus};
use crate::errors::{InitError, NetworkError, PanelError};
use crate::gate::{self, ActivationGate, MarkerStore};
use crate::http::HttpFetcher;
use crate::metrics_defs::{
    PANEL_FETCH_DURATION, PANEL_FETCH_FAILURE, PANEL_FETCH_SUCCESS, PANEL_SCHEMA_DEGRADED,
    PANEL_SKIPPED_EMPTY_TOKEN, PANEL_SKIPPED_INACTIVE,
};
use crate::observer::{PanelEvent, PanelObserver, TracingObserver};
use crate::protocol::{Panel, PanelButton, PanelRequest, PanelVariant, fetch_path};
use crate::{counter, histogram};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Instant;

const OUTCOME_NONE: u8 = 0;
const OUTCOME_LOADED: u8 = 1;
const OUTCOME_FAILED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session exists yet. Only reported by [`crate::sdk::state`].
    Uninitialized,
    Ready,
    Fetching,
    Loaded,
    Failed,
    /// The backend rejected this installation. Absorbing.
    Deactivated,
}

/// A fetched panel together with its decoded content.
#[derive(Debug)]
pub struct FetchedPanel {
    panel: Panel,
    content: ContentDocument,
    schema: SchemaStatus,
}

impl FetchedPanel {
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn name(&self) -> &str {
        &self.panel.name
    }

    /// The variant being shown. Panels without variants are never stored.
    pub fn variant(&self) -> &PanelVariant {
        &self.panel.panels[0]
    }

    pub fn buttons(&self) -> &[PanelButton] {
        &self.variant().buttons
    }

    pub fn content(&self) -> &ContentDocument {
        &self.content
    }

    pub fn schema_status(&self) -> &SchemaStatus {
        &self.schema
    }

    /// True if the content is empty because the schema could not be decoded.
    pub fn is_degraded(&self) -> bool {
        matches!(self.schema, SchemaStatus::Degraded { .. })
    }
}

pub struct SessionBuilder {
    config: Config,
    store: Option<Arc<dyn MarkerStore>>,
    observer: Option<Arc<dyn PanelObserver>>,
}

impl SessionBuilder {
    /// Overrides the marker store selected by the config.
    pub fn marker_store(mut self, store: Arc<dyn MarkerStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PanelObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub async fn build(self) -> Result<PanelSession, InitError> {
        self.config.validate()?;

        let fetcher = HttpFetcher::from_config(&self.config).map_err(InitError::Client)?;
        let store = self
            .store
            .unwrap_or_else(|| gate::get_store(&self.config.storage));
        let gate = ActivationGate::load(store).await;

        Ok(PanelSession {
            inner: Arc::new(SessionInner {
                config: self.config,
                fetcher,
                gate,
                observer: self.observer.unwrap_or_else(|| Arc::new(TracingObserver)),
                current: RwLock::new(None),
                last_outcome: AtomicU8::new(OUTCOME_NONE),
                in_flight: AtomicUsize::new(0),
            }),
        })
    }
}

struct SessionInner {
    config: Config,
    fetcher: HttpFetcher,
    gate: ActivationGate,
    observer: Arc<dyn PanelObserver>,
    // Last writer wins. Never held across an await.
    current: RwLock<Option<Arc<FetchedPanel>>>,
    last_outcome: AtomicU8,
    in_flight: AtomicUsize,
}

/// Counts a request as in flight until dropped, including on cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Fetches panels for one installation and holds the current panel.
///
/// Cheap to clone; clones share the same gate and current panel.
#[derive(Clone)]
pub struct PanelSession {
    inner: Arc<SessionInner>,
}

impl PanelSession {
    pub fn builder(config: Config) -> SessionBuilder {
        SessionBuilder {
            config,
            store: None,
            observer: None,
        }
    }

    pub async fn new(config: Config) -> Result<Self, InitError> {
        Self::builder(config).build().await
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn is_active(&self) -> bool {
        self.inner.gate.is_active()
    }

    pub fn current_panel(&self) -> Option<Arc<FetchedPanel>> {
        self.inner.current.read().clone()
    }

    pub fn state(&self) -> SessionState {
        if !self.inner.gate.is_active() {
            return SessionState::Deactivated;
        }
        if self.inner.in_flight.load(Ordering::Acquire) > 0 {
            return SessionState::Fetching;
        }
        match self.inner.last_outcome.load(Ordering::Acquire) {
            OUTCOME_LOADED => SessionState::Loaded,
            OUTCOME_FAILED => SessionState::Failed,
            _ => SessionState::Ready,
        }
    }

    /// Fetches the panel for `token` and makes it the current panel.
    ///
    /// Never fails loudly: every failure is reported to the observer and
    /// yields `None`. A 403 additionally deactivates the client for good.
    /// Dropping the returned future before it completes leaves the gate and
    /// the current panel untouched.
    pub async fn get_panel(&self, token: &str) -> Option<Arc<FetchedPanel>> {
        let inner = &self.inner;

        if !inner.gate.is_active() {
            counter!(PANEL_SKIPPED_INACTIVE).increment(1);
            inner
                .observer
                .on_event(&PanelEvent::SkippedInactive { token });
            return None;
        }

        if token.is_empty() {
            counter!(PANEL_SKIPPED_EMPTY_TOKEN).increment(1);
            inner.observer.on_event(&PanelEvent::SkippedEmptyToken);
            return None;
        }

        let _in_flight = InFlight::enter(&inner.in_flight);
        let request = PanelRequest::new(inner.config.platform);

        let started = Instant::now();
        let result: Result<Panel, NetworkError> = inner
            .fetcher
            .post(&inner.config, &fetch_path(token), &request)
            .await;
        histogram!(PANEL_FETCH_DURATION).record(started.elapsed().as_secs_f64());

        match result {
            Ok(panel) => self.accept(token, panel),
            Err(e) if e.is_forbidden() => {
                inner.gate.trip().await;
                counter!(PANEL_FETCH_FAILURE, "kind" => "forbidden").increment(1);
                inner.observer.on_event(&PanelEvent::Deactivated { token });
                None
            }
            Err(e) => {
                self.fail(token, PanelError::from(e));
                None
            }
        }
    }

    fn accept(&self, token: &str, panel: Panel) -> Option<Arc<FetchedPanel>> {
        let Some(variant) = panel.primary_variant() else {
            self.fail(token, PanelError::NoVariants);
            return None;
        };

        let outcome = content::decode_or_empty(&variant.schema);
        if let Some(error) = &outcome.error {
            counter!(PANEL_SCHEMA_DEGRADED).increment(1);
            self.inner
                .observer
                .on_event(&PanelEvent::SchemaDegraded { token, error });
        }

        let fetched = Arc::new(FetchedPanel {
            schema: outcome.status(),
            content: outcome.document,
            panel,
        });

        *self.inner.current.write() = Some(fetched.clone());
        self.inner
            .last_outcome
            .store(OUTCOME_LOADED, Ordering::Release);

        counter!(PANEL_FETCH_SUCCESS).increment(1);
        self.inner.observer.on_event(&PanelEvent::Fetched {
            token,
            blocks: fetched.content.blocks.len(),
        });

        Some(fetched)
    }

    fn fail(&self, token: &str, error: PanelError) {
        self.inner
            .last_outcome
            .store(OUTCOME_FAILED, Ordering::Release);
        counter!(PANEL_FETCH_FAILURE, "kind" => error.kind()).increment(1);
        self.inner
            .observer
            .on_event(&PanelEvent::FetchFailed {
                token,
                error: &error,
            });
    }
}
