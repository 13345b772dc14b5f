//! HTTP transport implementation.
//!
//! Session-aware JSON-RPC over HTTP. Every enabled logical server gets its
//! own listener and its own [`SessionManager`]:
//!
//! - `POST {rpc_path}`: JSON-RPC messages, session id in `mcp-session-id`
//! - `GET {rpc_path}`: status of the session named by the header
//! - `DELETE {rpc_path}`: terminate that session
//! - `GET /health`, `GET /`: liveness and endpoint info

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, instrument, warn};

use super::protocol::{JsonRpcRequest, JsonRpcResponse, parse_initialize};
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::server::{HostedServer, ServerBinding};
use crate::core::session::{SESSION_HEADER, SessionContext, SessionError, SessionManager};
use crate::domains::tools::ToolCallRequest;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across the handlers of one logical server.
#[derive(Clone)]
pub struct AppState {
    server: HostedServer,
    sessions: Arc<SessionManager>,
    rpc_path: Arc<str>,
}

impl AppState {
    pub fn new(server: HostedServer, rpc_path: impl Into<Arc<str>>) -> Self {
        Self {
            server,
            sessions: Arc::new(SessionManager::new()),
            rpc_path: rpc_path.into(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}

/// Build the router for one logical server.
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let rpc_path = state.rpc_path.to_string();
    let mut app = Router::new()
        .route(
            &rpc_path,
            get(handle_session_status)
                .post(handle_rpc)
                .delete(handle_session_close),
        )
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([HeaderName::from_static(SESSION_HEADER)]);
        app = app.layer(cors);
    }
    app
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address for a port.
    pub fn address(&self, port: u16) -> String {
        format!("{}:{}", self.config.host, port)
    }

    /// Serve every binding until Ctrl-C or until one listener fails.
    pub async fn run(self, bindings: Vec<ServerBinding>) -> TransportResult<()> {
        if bindings.is_empty() {
            return Err(TransportError::init("no logical servers enabled"));
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for binding in bindings {
            let addr = self.address(binding.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|e| TransportError::bind(&addr, e))?;

            let name = binding.server.name();
            let state = AppState::new(binding.server, self.config.rpc_path.as_str());
            if let Some(idle) = self.config.session_idle_timeout() {
                tasks.spawn(sweep_sessions(state.sessions.clone(), idle, shutdown_rx.clone()));
            }
            let app = router(state, self.config.enable_cors);
            info!(server = name, "Ready - listening on http://{}{}", addr, self.config.rpc_path);

            let mut stop = shutdown_rx.clone();
            tasks.spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.wait_for(|stopped| *stopped).await;
                    })
                    .await
                    .map_err(|e| TransportError::http(format!("{name}: {e}")))
            });
        }

        let cors_status = if self.config.enable_cors { "enabled" } else { "disabled" };
        info!("  → JSON-RPC: POST/GET/DELETE {} (CORS {})", self.config.rpc_path, cors_status);
        info!("  → Health:   GET /health");

        let early_exit = tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutdown signal received");
                None
            }
            Some(joined) = tasks.join_next() => Some(joined),
        };

        let _ = shutdown_tx.send(true);

        let mut result = Ok(());
        if let Some(joined) = early_exit {
            result = flatten(joined);
            if result.is_ok() {
                result = Err(TransportError::http("listener stopped unexpectedly"));
            }
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = flatten(joined) {
                warn!("Listener shut down with error: {}", e);
            }
        }
        result
    }
}

/// Periodically close idle sessions until shutdown.
async fn sweep_sessions(
    sessions: Arc<SessionManager>,
    idle: Duration,
    mut stop: watch::Receiver<bool>,
) -> TransportResult<()> {
    let max_idle = chrono::Duration::from_std(idle).unwrap_or(chrono::Duration::MAX);
    let mut ticker = tokio::time::interval((idle / 4).max(Duration::from_secs(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let closed = sessions.sweep_idle(max_idle, chrono::Utc::now()).await;
                if closed > 0 {
                    debug!(closed, "Swept idle sessions");
                }
            }
            _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => return Ok(()),
        }
    }
}

fn flatten(
    joined: Result<TransportResult<()>, tokio::task::JoinError>,
) -> TransportResult<()> {
    joined.map_err(|e| TransportError::service(e.to_string()))?
}

// ============================================================================
// Responses
// ============================================================================

fn with_session(mut response: Response, session: &SessionContext) -> Response {
    if let Ok(value) = HeaderValue::from_str(session.id()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

fn rpc_reply(reply: JsonRpcResponse, session: &SessionContext) -> Response {
    with_session((StatusCode::OK, Json(reply)).into_response(), session)
}

fn accepted(session: &SessionContext) -> Response {
    with_session(StatusCode::ACCEPTED.into_response(), session)
}

/// Session rejection on POST: JSON-RPC shaped, HTTP 400.
fn rpc_rejection(err: &SessionError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::session_error(err)),
    )
        .into_response()
}

/// Session rejection on GET/DELETE: plain text, HTTP 400.
fn text_rejection() -> Response {
    (
        StatusCode::BAD_REQUEST,
        SessionError::InvalidSession.to_string(),
    )
        .into_response()
}

/// Session id sent by the client, if any.
///
/// A header that is present but not visible ASCII names no session and is
/// rejected rather than ignored.
fn session_header(headers: &HeaderMap) -> Result<Option<&str>, SessionError> {
    match headers.get(SESSION_HEADER) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            warn!("Rejected unreadable session header");
            SessionError::InvalidSession
        }),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": &*state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "documentation": format!(
            "POST an initialize request to {} and send the returned {} header on every later request",
            state.rpc_path, SESSION_HEADER
        )
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "server": state.server.name(),
        "sessions": state.sessions.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn handle_session_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Ok(Some(id)) = session_header(&headers) else {
        return text_rejection();
    };
    match state.sessions.require(id).await {
        Ok(session) => {
            session.touch();
            with_session(Json(session.status()).into_response(), &session)
        }
        Err(_) => text_rejection(),
    }
}

async fn handle_session_close(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Ok(Some(id)) = session_header(&headers) else {
        return text_rejection();
    };
    match state.sessions.close(id, "client request").await {
        Some(session) => Json(json!({ "sessionId": session.id(), "status": "closed" })).into_response(),
        None => {
            warn!(session = %id, "Close rejected for unknown session id");
            text_rejection()
        }
    }
}

/// Handle one JSON-RPC message.
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let header = match session_header(&headers) {
        Ok(header) => header,
        Err(err) => return rpc_rejection(&err),
    };
    let message: Option<Value> = serde_json::from_slice(&body).ok();

    let init = match header {
        None => message.as_ref().and_then(parse_initialize),
        Some(_) => None,
    };

    let resolved = match state.sessions.resolve(header, init).await {
        Ok(resolved) => resolved,
        Err(err) => return rpc_rejection(&err),
    };
    let session = resolved.session().clone();

    let Some(message) = message else {
        warn!(session = %session.id(), "Malformed JSON body");
        return rpc_reply(JsonRpcResponse::parse_error(), &session);
    };

    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return rpc_reply(
                JsonRpcResponse::invalid_request(None, format!("Invalid Request: {e}")),
                &session,
            );
        }
    };
    if request.jsonrpc != "2.0" {
        return rpc_reply(
            JsonRpcResponse::invalid_request(request.id, "Invalid Request: jsonrpc must be \"2.0\""),
            &session,
        );
    }

    if resolved.is_new() {
        return rpc_reply(handle_initialize(&state, request), &session);
    }

    if request.is_notification() {
        handle_notification(&session, &request);
        return accepted(&session);
    }

    let method = request.method.clone();
    info!(server = state.server.name(), session = %session.id(), "Received JSON-RPC request: {}", method);
    let reply = match method.as_str() {
        "initialize" => {
            JsonRpcResponse::invalid_request(request.id, "Invalid Request: session already initialized")
        }
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        "tools/list" => handle_tools_list(&state, request),
        "tools/call" => handle_tools_call(&state, request, &session).await,
        other => {
            warn!("Unknown method: {}", other);
            JsonRpcResponse::method_not_found(request.id, other)
        }
    };
    rpc_reply(reply, &session)
}

fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");
    match serde_json::to_value(state.server.server_info()) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let tools = state.server.tools().list_tools();
    match serde_json::to_value(&tools) {
        Ok(tools) => JsonRpcResponse::success(request.id, json!({ "tools": tools })),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

#[instrument(skip_all, fields(server = state.server.name(), session = %session.id()))]
async fn handle_tools_call(
    state: &AppState,
    request: JsonRpcRequest,
    session: &SessionContext,
) -> JsonRpcResponse {
    let Some(params) = request.params.as_ref().and_then(Value::as_object) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
    if !(arguments.is_object() || arguments.is_null()) {
        return JsonRpcResponse::invalid_params(request.id, "Tool arguments must be an object");
    }

    let response = state
        .server
        .tools()
        .call_tool(ToolCallRequest::new(name, arguments), session)
        .await;
    match serde_json::to_value(&response) {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::internal_error(request.id, e.to_string()),
    }
}

fn handle_notification(session: &SessionContext, request: &JsonRpcRequest) {
    match request.method.as_str() {
        "notifications/initialized" => {
            info!(session = %session.id(), "Client sent initialized notification");
            session.mark_initialized();
        }
        other => debug!(session = %session.id(), "Received notification: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, ServerVariant};
    use crate::domains::Backends;
    use crate::domains::testing::{
        ChainBehavior, CompletionBehavior, FeedBehavior, MockChain, MockCompletion, MockFeed,
    };
    use crate::domains::tools::build_tool_service;
    use axum::body::Body;
    use http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state(variant: ServerVariant) -> AppState {
        let config = Config::default();
        let backends = Backends::new(
            Arc::new(MockChain::new(ChainBehavior::Fail)),
            Arc::new(MockFeed::new(FeedBehavior::Fail)),
            Arc::new(MockCompletion::new(CompletionBehavior::Fail)),
            &config,
        );
        let tools = build_tool_service(variant, &backends).unwrap();
        AppState::new(HostedServer::new(variant, "0.0.0-test", tools), "/mcp")
    }

    fn initialize_body() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.1" }
            }
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        session: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Option<String>, Bytes) {
        let mut builder = Request::builder().method(method).uri("/mcp");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let header = response
            .headers()
            .get(SESSION_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, header, bytes)
    }

    async fn post(app: &Router, session: Option<&str>, body: Value) -> (StatusCode, Option<String>, Value) {
        let (status, header, bytes) = send(app, Method::POST, session, Some(body.to_string())).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, header, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, header, body) = post(app, None, initialize_body()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["serverInfo"]["name"], "pricer-server");
        header.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_creates_distinct_sessions() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);
        let first = open_session(&app).await;
        let second = open_session(&app).await;
        assert_ne!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        assert_eq!(state.sessions().len().await, 2);
    }

    #[tokio::test]
    async fn test_request_without_session_is_rejected() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);
        let (status, header, body) = post(
            &app,
            None,
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(header.is_none());
        assert_eq!(
            body,
            json!({
                "jsonrpc": "2.0",
                "error": { "code": -32000, "message": "Bad Request: No valid session ID provided" },
                "id": null
            })
        );
        assert!(state.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected_without_creating_one() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);
        let (status, _, body) = post(&app, Some("nope"), initialize_body()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid or missing session ID");
        assert!(state.sessions().is_empty().await);

        let (status, _, bytes) = send(&app, Method::GET, Some("nope"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(&bytes[..], b"Invalid or missing session ID");
    }

    #[tokio::test]
    async fn test_tools_roundtrip_on_session() {
        let app = router(state(ServerVariant::Pricer), true);
        let id = open_session(&app).await;

        let (status, header, body) = post(
            &app,
            Some(&id),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header.as_deref(), Some(id.as_str()));
        let tools = body["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert_eq!(tools[0]["name"], "fetch_assets");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");

        let (_, _, body) = post(
            &app,
            Some(&id),
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": { "name": "fetch_assets" }
            }),
        )
        .await;
        assert_eq!(body["id"], 3);
        assert_eq!(body["result"]["isError"], false);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"symbol\": \"APT\""));

        let (_, _, body) = post(
            &app,
            Some(&id),
            json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": { "name": "launch_rocket", "arguments": {} }
            }),
        )
        .await;
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(body["result"]["content"][0]["text"], "Unknown tool: launch_rocket");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let app = router(state(ServerVariant::Pricer), false);
        let id = open_session(&app).await;

        let (_, _, body) = post(&app, Some(&id), json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" })).await;
        assert_eq!(body["error"]["code"], -32601);

        let (_, _, body) = post(&app, Some(&id), initialize_body()).await;
        assert_eq!(body["error"]["code"], -32600);

        let (status, _, bytes) = send(&app, Method::POST, Some(&id), Some("{not json".into())).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_notification_marks_initialized() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);
        let id = open_session(&app).await;

        let (status, _, body) = post(
            &app,
            Some(&id),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);

        let (status, _, bytes) = send(&app, Method::GET, Some(&id), None).await;
        assert_eq!(status, StatusCode::OK);
        let status_doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status_doc["sessionId"], id.as_str());
        assert_eq!(status_doc["initialized"], true);
        assert_eq!(status_doc["protocolVersion"], "2025-03-26");
        assert_eq!(status_doc["client"]["name"], "test-client");
    }

    #[tokio::test]
    async fn test_notification_method_with_id_is_answered() {
        let app = router(state(ServerVariant::Pricer), false);
        let id = open_session(&app).await;

        let (status, _, body) = post(
            &app,
            Some(&id),
            json!({ "jsonrpc": "2.0", "id": 11, "method": "notifications/initialized" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 11);
        assert_eq!(body["error"]["code"], -32601);
    }

    fn with_raw_session(method: Method, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/mcp")
            .header("content-type", "application/json")
            .header(SESSION_HEADER, HeaderValue::from_bytes(b"stale-\xff").unwrap())
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_unreadable_session_header_is_rejected() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);

        let request = with_raw_session(Method::POST, Body::from(initialize_body().to_string()));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(SESSION_HEADER).is_none());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["error"]["message"], "Invalid or missing session ID");
        assert!(state.sessions().is_empty().await);

        for method in [Method::GET, Method::DELETE] {
            let response = app.clone().oneshot(with_raw_session(method, Body::empty())).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&bytes[..], b"Invalid or missing session ID");
        }
    }

    #[tokio::test]
    async fn test_delete_closes_session() {
        let state = state(ServerVariant::Pricer);
        let app = router(state.clone(), false);
        let id = open_session(&app).await;

        let (status, _, bytes) = send(&app, Method::DELETE, Some(&id), None).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "sessionId": id, "status": "closed" }));
        assert!(state.sessions().is_empty().await);

        let (status, _, _) = post(&app, Some(&id), json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(&app, Method::DELETE, Some(&id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = router(state(ServerVariant::Vault), false);
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["server"], "hyperfill-mcp-server");

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["endpoints"]["rpc"], "/mcp");
    }
}
