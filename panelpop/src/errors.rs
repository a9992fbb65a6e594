use http::StatusCode;

/// Failures of a single request to the panel API.
#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("could not encode request body: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error: {status}")]
    Http { status: StatusCode },
    #[error("could not decode response body: {0}")]
    Decoding(#[source] serde_json::Error),
}

impl NetworkError {
    /// The HTTP status code, if the server answered with a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            NetworkError::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected this installation as no longer entitled.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(StatusCode::FORBIDDEN)
    }

    /// Short, stable label used for metric tags and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkError::InvalidUrl(_) => "invalid_url",
            NetworkError::Encoding(_) => "encoding",
            NetworkError::Transport(_) => "transport",
            NetworkError::Http { .. } => "http",
            NetworkError::Decoding(_) => "decoding",
        }
    }
}

/// Failures decoding the content schema embedded in a panel variant.
///
/// These never propagate out of a panel fetch; the session degrades to an empty
/// document and reports the error through the observer instead.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("schema is not a valid content document: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("block {id} of type {kind} has an invalid payload: {source}")]
    Block {
        id: String,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] crate::config::ValidationError),
    #[error("could not create HTTP client: {0}")]
    Client(#[source] NetworkError),
}

/// Reasons a fetch produced no panel, as reported to observers.
#[derive(thiserror::Error, Debug)]
pub enum PanelError {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
    #[error("panel has no variants")]
    NoVariants,
}

impl PanelError {
    pub fn kind(&self) -> &'static str {
        match self {
            PanelError::Network(e) => e.kind(),
            PanelError::NoVariants => "no_variants",
        }
    }
}
