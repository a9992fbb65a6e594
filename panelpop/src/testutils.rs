use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const DEMO_PANEL: &str = r#"{"hash":"91ndaz","token":"demo_panel","name":"Demo Panel","platform":0,"lastUpdated":"2025-05-09T03:16:59.882778Z","panels":[{"name":"Demo Panel","panelType":0,"schema":"{\"time\":1,\"blocks\":[{\"id\":\"a\",\"type\":\"header\",\"data\":{\"text\":\"Hi\",\"level\":2}}],\"version\":\"1\"}","buttons":[{"text":"Close","icon":"remove","meta":"closebutton","style":"secondary"}],"displayType":0}]}"#;

pub const FULL_SCHEMA: &str = r#"{"time": 1746760619531, "blocks": [{"id": "tGjMYFC37W", "data": {"text": "This is some text"}, "type": "paragraph"}, {"id": "ZUToz62mk5", "data": {"text": "This is <i>some</i> text <b>with</b> formatting and a <a href=\"https://overlandnavigator.co.nz/\">link</a>"}, "type": "paragraph"}, {"id": "N7-m0kO1bI", "data": {"text": "This is a heading", "level": 2}, "type": "header"}, {"id": "JBJMoUzUZQ", "data": {"meta": {}, "items": [{"meta": {}, "items": [], "content": "This is a list item"}, {"meta": {}, "items": [], "content": "This is a list item"}], "style": "unordered"}, "type": "list"}, {"id": "c_Quv3QCbL", "data": {"meta": {"counterType": "numeric"}, "items": [{"meta": {}, "items": [], "content": "This is an ordered item"}, {"meta": {}, "items": [], "content": "This is an ordered item"}], "style": "ordered"}, "type": "list"}, {"id": "m2Yy3OQrtc", "data": {"meta": {}, "items": [{"meta": {"checked": false}, "items": [], "content": "This is a checklist"}], "style": "checklist"}, "type": "list"}, {"id": "-TWQQOld_t", "data": {"file": {"url": "https://static.panelpop.co/0fsd52/0fsd52/91ndaz/1255002b-11d7-4aed-a89b-51794d9b2c4d"}, "caption": "This is the caption", "stretched": false, "withBorder": false, "withBackground": false}, "type": "image"}], "version": "2.31.0-rc.7"}"#;

/// A panel response whose single variant carries `schema`.
pub fn panel_with_schema(token: &str, schema: &str) -> String {
    serde_json::json!({
        "hash": "h1",
        "token": token,
        "name": format!("Panel {token}"),
        "platform": 0,
        "lastUpdated": "2025-05-09T03:16:59.882778Z",
        "panels": [{
            "name": "variant",
            "panelType": 0,
            "displayType": 0,
            "schema": schema,
            "buttons": [{"text": "OK", "icon": "check", "meta": "closebutton", "style": "primary"}]
        }]
    })
    .to_string()
}

pub fn panel_without_variants(token: &str) -> String {
    serde_json::json!({
        "hash": "h1",
        "token": token,
        "name": "Empty",
        "platform": 0,
        "lastUpdated": "2025-05-09T03:16:59.882778Z",
        "panels": []
    })
    .to_string()
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl MockResponse {
    pub fn ok(body: &str) -> Self {
        MockResponse {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        MockResponse {
            status,
            body: r#"{"detail": "mock error"}"#.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub app_key: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct ServerState {
    // Responses are served in order; the last one repeats once the rest are used up
    script: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ServerState {
    async fn respond(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();
        let bytes = body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_default();

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        self.requests.lock().push(RecordedRequest {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            app_key: header("AppKey"),
            content_type: header("content-type"),
            body: serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null),
        });

        let next = {
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        let Some(mock) = next else {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::new()))
                .unwrap();
        };

        if let Some(delay) = mock.delay {
            tokio::time::sleep(delay).await;
        }

        Response::builder()
            .status(mock.status)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(mock.body)))
            .unwrap()
    }
}

/// Panel API stand-in listening on an ephemeral local port.
pub struct MockPanelServer {
    port: u16,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockPanelServer {
    pub async fn spawn(script: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(ServerState {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        });

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let io = TokioIo::new(stream);
                let state = server_state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(state.respond(req).await) }
                    });

                    let _ = Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        MockPanelServer {
            port,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

impl Drop for MockPanelServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
