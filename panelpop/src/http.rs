use crate::config::Config;
use crate::errors::NetworkError;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const APP_KEY_HEADER: &str = "AppKey";

/// Issues single, authenticated JSON POST requests to the panel API.
///
/// There is no retry and no caching at this layer.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpFetcher { client })
    }

    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }

    /// POSTs `body` to the path made of `segments`. Each segment is
    /// percent-encoded on its own, so a segment can never add to or climb out
    /// of the path.
    pub async fn post<Req, Res>(
        &self,
        config: &Config,
        segments: &[&str],
        body: &Req,
    ) -> Result<Res, NetworkError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = build_url(&config.api_url, segments)?;
        let body = serde_json::to_vec(body).map_err(NetworkError::Encoding)?;

        let response = self
            .client
            .post(url.clone())
            .header(APP_KEY_HEADER, &config.app_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(url = %url, status = %status, "Panel API responded");

        if !status.is_success() {
            return Err(NetworkError::Http { status });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(NetworkError::Decoding)
    }
}

/// Replaces the path of `base` with `segments`.
pub fn build_url(base: &str, segments: &[&str]) -> Result<Url, NetworkError> {
    let mut url = Url::parse(base).map_err(|e| NetworkError::InvalidUrl(format!("{base}: {e}")))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(NetworkError::InvalidUrl(format!(
            "{base}: expected an http or https base URL"
        )));
    }

    if let Some(bad) = segments
        .iter()
        .find(|segment| matches!(**segment, "" | "." | ".."))
    {
        return Err(NetworkError::InvalidUrl(format!(
            "{base}: invalid path segment {bad:?}"
        )));
    }

    url.path_segments_mut()
        .map_err(|()| NetworkError::InvalidUrl(format!("{base}: cannot carry a path")))?
        .clear()
        .extend(segments);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerStoreType;
    use crate::protocol::{Panel, PanelRequest};
    use crate::testutils::{DEMO_PANEL, MockPanelServer, MockResponse};
    use http::StatusCode;

    fn test_config(api_url: String) -> Config {
        Config {
            app_key: "test-key".into(),
            api_url,
            request_timeout_secs: 2,
            platform: 0,
            storage: MarkerStoreType::Memory,
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_build_url() {
        let url = build_url("https://serve.panelpop.co/", &["panels", "v1", "fetch", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://serve.panelpop.co/panels/v1/fetch/abc");

        let url = build_url("https://serve.panelpop.co", &["panels", "v1", "fetch", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://serve.panelpop.co/panels/v1/fetch/abc");

        // The path replaces any path on the base, the port is kept
        let url = build_url("http://127.0.0.1:8080/api/", &["panels"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/panels");
    }

    #[test]
    fn test_build_url_encodes_each_segment() {
        let cases = [
            ("../../admin/x", "/panels/v1/fetch/..%2F..%2Fadmin%2Fx"),
            ("a/b", "/panels/v1/fetch/a%2Fb"),
            ("a?b=1", "/panels/v1/fetch/a%3Fb=1"),
            ("a#frag", "/panels/v1/fetch/a%23frag"),
            ("100%", "/panels/v1/fetch/100%25"),
        ];
        for (token, expected) in cases {
            let url = build_url("https://serve.panelpop.co/", &["panels", "v1", "fetch", token]).unwrap();
            assert_eq!(url.path(), expected, "token {token:?}");
            assert_eq!(url.query(), None);
            assert_eq!(url.fragment(), None);
        }

        for token in ["", ".", ".."] {
            assert!(
                matches!(
                    build_url("https://serve.panelpop.co/", &["panels", token]),
                    Err(NetworkError::InvalidUrl(_))
                ),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_build_url_invalid() {
        for base in ["", "not a url", "serve.panelpop.co", "mailto:me@example.com", "ftp://x/"] {
            assert!(
                matches!(build_url(base, &["p"]), Err(NetworkError::InvalidUrl(_))),
                "{base:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockPanelServer::spawn(vec![MockResponse::ok(DEMO_PANEL)]).await;
        let config = test_config(server.url());

        let panel: Panel = fetcher()
            .post(&config, &["panels", "v1", "fetch", "demo_panel"], &PanelRequest::new(0))
            .await
            .unwrap();
        assert_eq!(panel.token, "demo_panel");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/panels/v1/fetch/demo_panel");
        assert_eq!(requests[0].app_key.as_deref(), Some("test-key"));
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(
            requests[0].body,
            serde_json::json!({"version": "1.0", "platform": 0})
        );
    }

    #[tokio::test]
    async fn test_post_http_error_keeps_status() {
        let server = MockPanelServer::spawn(vec![
            MockResponse::status(StatusCode::FORBIDDEN),
            MockResponse::status(StatusCode::INTERNAL_SERVER_ERROR),
        ])
        .await;
        let config = test_config(server.url());

        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert_eq!(err.kind(), "http");

        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!err.is_forbidden());

        // Exactly one attempt per call
        assert_eq!(server.request_count(), 2);
    }

    #[tokio::test]
    async fn test_post_decoding_error() {
        let server = MockPanelServer::spawn(vec![MockResponse::ok(r#"{"hash": "only"}"#)]).await;
        let config = test_config(server.url());

        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Decoding(_)));
    }

    #[tokio::test]
    async fn test_post_transport_error() {
        // Bind then drop a listener to get a port nobody is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = test_config(format!("http://127.0.0.1:{port}"));
        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Transport(_)));
    }

    #[tokio::test]
    async fn test_post_timeout_is_transport_error() {
        let server = MockPanelServer::spawn(vec![
            MockResponse::ok(DEMO_PANEL).delayed(Duration::from_millis(1500)),
        ])
        .await;
        let config = test_config(server.url());

        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
        let err = fetcher
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Transport(_)));
    }

    #[tokio::test]
    async fn test_post_invalid_url_does_no_io() {
        let server = MockPanelServer::spawn(vec![]).await;
        let config = test_config("::not a url::".into());

        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &PanelRequest::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidUrl(_)));
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_post_encoding_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let body: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let config = test_config("http://127.0.0.1:9".into());

        let err = fetcher()
            .post::<_, Panel>(&config, &["p"], &body)
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Encoding(_)));
    }
}
