//! Metrics definitions for the panel client.
//!
//! Recording goes through the `metrics` facade. Nothing is emitted unless the
//! host installs a recorder.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
    ($def:expr, $($label:expr => $value:expr),+ $(,)?) => {
        metrics::counter!($def.name, $($label => $value),+)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
}

pub const PANEL_FETCH_SUCCESS: MetricDef = MetricDef {
    name: "panel.fetch.success",
    metric_type: MetricType::Counter,
    description: "Number of panel fetches that returned a panel",
};

pub const PANEL_FETCH_FAILURE: MetricDef = MetricDef {
    name: "panel.fetch.failure",
    metric_type: MetricType::Counter,
    description: "Number of panel fetches that failed, tagged by error kind",
};

pub const PANEL_FETCH_DURATION: MetricDef = MetricDef {
    name: "panel.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a panel fetch request in seconds",
};

pub const PANEL_SCHEMA_DEGRADED: MetricDef = MetricDef {
    name: "panel.schema.degraded",
    metric_type: MetricType::Counter,
    description: "Number of fetched panels whose content schema could not be decoded",
};

pub const PANEL_SKIPPED_INACTIVE: MetricDef = MetricDef {
    name: "panel.skipped.inactive",
    metric_type: MetricType::Counter,
    description: "Number of panel requests skipped because the client is deactivated",
};

pub const PANEL_SKIPPED_EMPTY_TOKEN: MetricDef = MetricDef {
    name: "panel.skipped.empty_token",
    metric_type: MetricType::Counter,
    description: "Number of panel requests skipped because no token was given",
};

pub const GATE_TRIPPED: MetricDef = MetricDef {
    name: "gate.tripped",
    metric_type: MetricType::Counter,
    description: "Number of times the activation gate was tripped by a 403",
};

pub const GATE_PERSIST_FAILURE: MetricDef = MetricDef {
    name: "gate.persist.failure",
    metric_type: MetricType::Counter,
    description: "Number of failures writing the deactivation marker",
};

// All metrics must be listed here so hosts can register descriptions.
pub const ALL_METRICS: &[MetricDef] = &[
    PANEL_FETCH_SUCCESS,
    PANEL_FETCH_FAILURE,
    PANEL_FETCH_DURATION,
    PANEL_SCHEMA_DEGRADED,
    PANEL_SKIPPED_INACTIVE,
    PANEL_SKIPPED_EMPTY_TOKEN,
    GATE_TRIPPED,
    GATE_PERSIST_FAILURE,
];

/// Registers the description of every metric with the installed recorder.
pub fn describe_all() {
    for def in ALL_METRICS {
        match def.metric_type {
            MetricType::Counter => metrics::describe_counter!(def.name, def.description),
            MetricType::Histogram => metrics::describe_histogram!(def.name, def.description),
        }
    }
}
