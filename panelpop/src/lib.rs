pub mod config;
pub mod content;
pub mod errors;
pub mod gate;
pub mod http;
pub mod metrics_defs;
pub mod observer;
pub mod protocol;
pub mod sdk;
pub mod session;

#[cfg(test)]
mod testutils;

pub use config::Config;
pub use errors::{DecodeError, InitError, NetworkError, PanelError};
pub use observer::{PanelEvent, PanelObserver};
pub use session::{FetchedPanel, PanelSession, SessionBuilder, SessionState};
