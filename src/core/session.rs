//! Session Transport Manager.
//!
//! Maps `mcp-session-id` values to live [`SessionContext`]s. A context is
//! created only from a well-formed `initialize` request and removed on close.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// JSON-RPC error code used for session-level rejections.
pub const SESSION_ERROR_CODE: i32 = -32000;

/// Client identity announced during `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Negotiated parameters of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionInit {
    pub protocol_version: String,
    pub client: ClientInfo,
}

/// Per-session transport state.
#[derive(Debug)]
pub struct SessionContext {
    id: String,
    created_at: DateTime<Utc>,
    protocol_version: String,
    client: ClientInfo,
    initialized: AtomicBool,
    last_seen_ms: AtomicI64,
}

impl SessionContext {
    fn new(id: String, init: SessionInit) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            protocol_version: init.protocol_version,
            client: init.client,
            initialized: AtomicBool::new(false),
            last_seen_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// A context not registered with any manager, for in-process callers.
    pub fn detached() -> Self {
        Self::new(format!("local-{}", Uuid::new_v4()), SessionInit::default())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn client(&self) -> &ClientInfo {
        &self.client
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Called on `notifications/initialized`.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn touch(&self) {
        self.last_seen_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        let ms = self.last_seen_ms.load(Ordering::Relaxed);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(self.created_at)
    }

    /// Status document returned by `GET` on the RPC endpoint.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id.clone(),
            created_at: self.created_at.to_rfc3339(),
            last_seen_at: self.last_seen().to_rfc3339(),
            initialized: self.is_initialized(),
            protocol_version: self.protocol_version.clone(),
            client: self.client.clone(),
        }
    }
}

/// Serializable snapshot of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: String,
    pub created_at: String,
    pub last_seen_at: String,
    pub initialized: bool,
    pub protocol_version: String,
    pub client: ClientInfo,
}

/// Session-level rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No header and the body is not a valid `initialize`.
    #[error("Bad Request: No valid session ID provided")]
    NoValidSession,

    /// A header was sent but names no live session.
    #[error("Invalid or missing session ID")]
    InvalidSession,
}

impl SessionError {
    pub fn code(&self) -> i32 {
        SESSION_ERROR_CODE
    }
}

/// Outcome of resolving an inbound message.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// The header named a live session.
    Existing(Arc<SessionContext>),
    /// A new session was registered for this `initialize`.
    Created(Arc<SessionContext>),
}

impl Resolved {
    pub fn session(&self) -> &Arc<SessionContext> {
        match self {
            Self::Existing(s) | Self::Created(s) => s,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Registry of live sessions for one logical server.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<SessionContext>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an inbound message to a session.
    ///
    /// `init` is `Some` only when the body is a well-formed `initialize`
    /// request; it is consulted only when no header is present.
    pub async fn resolve(
        &self,
        header: Option<&str>,
        init: Option<SessionInit>,
    ) -> Result<Resolved, SessionError> {
        match (header, init) {
            (Some(id), _) => {
                let session = self.require(id).await?;
                session.touch();
                Ok(Resolved::Existing(session))
            }
            (None, Some(init)) => Ok(Resolved::Created(self.create(init).await)),
            (None, None) => {
                warn!("Rejected request without session id");
                Err(SessionError::NoValidSession)
            }
        }
    }

    /// Register a fresh session with a new UUIDv4 id.
    pub async fn create(&self, init: SessionInit) -> Arc<SessionContext> {
        let mut sessions = self.sessions.write().await;
        let mut id = Uuid::new_v4().to_string();
        while sessions.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        let session = Arc::new(SessionContext::new(id.clone(), init));
        sessions.insert(id, session.clone());
        info!(
            session = %session.id(),
            client = %session.client().name,
            "Session created"
        );
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<SessionContext>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn require(&self, id: &str) -> Result<Arc<SessionContext>, SessionError> {
        self.get(id).await.ok_or_else(|| {
            warn!(session = %id, "Rejected unknown session id");
            SessionError::InvalidSession
        })
    }

    /// Deregister a session; returns it if it was live.
    pub async fn close(&self, id: &str, reason: &str) -> Option<Arc<SessionContext>> {
        let removed = self.sessions.write().await.remove(id);
        match &removed {
            Some(_) => info!(session = %id, reason, "Session closed"),
            None => debug!(session = %id, "Close requested for unknown session"),
        }
        removed
    }

    /// Close every session idle for longer than `max_idle` as of `now`.
    pub async fn sweep_idle(&self, max_idle: chrono::Duration, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(max_idle) else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.last_seen() >= cutoff;
            if !keep {
                info!(session = %id, reason = "idle", "Session closed");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() -> SessionInit {
        SessionInit {
            protocol_version: "2024-11-05".to_string(),
            client: ClientInfo {
                name: "test-client".to_string(),
                version: Some("1.0.0".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_two_bootstraps_get_distinct_ids() {
        let manager = SessionManager::new();
        let a = manager.resolve(None, Some(init())).await.unwrap();
        let b = manager.resolve(None, Some(init())).await.unwrap();
        assert!(a.is_new() && b.is_new());
        assert_ne!(a.session().id(), b.session().id());
        assert!(Uuid::parse_str(a.session().id()).is_ok());
        assert_eq!(manager.len().await, 2);
    }

    #[tokio::test]
    async fn test_known_id_reuses_context() {
        let manager = SessionManager::new();
        let created = manager.create(init()).await;
        for _ in 0..3 {
            let resolved = manager.resolve(Some(created.id()), None).await.unwrap();
            assert!(!resolved.is_new());
            assert!(Arc::ptr_eq(resolved.session(), &created));
        }
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_id_ignores_payload_shape() {
        let manager = SessionManager::new();
        let created = manager.create(init()).await;
        let resolved = manager.resolve(Some(created.id()), Some(init())).await.unwrap();
        assert!(!resolved.is_new());
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_rejected_without_creating() {
        let manager = SessionManager::new();
        let err = manager.resolve(Some("nope"), Some(init())).await.unwrap_err();
        assert_eq!(err, SessionError::InvalidSession);
        assert_eq!(err.to_string(), "Invalid or missing session ID");
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_header_without_initialize() {
        let manager = SessionManager::new();
        let err = manager.resolve(None, None).await.unwrap_err();
        assert_eq!(err, SessionError::NoValidSession);
        assert_eq!(err.code(), -32000);
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_close_deregisters() {
        let manager = SessionManager::new();
        let session = manager.create(init()).await;
        assert!(manager.close(session.id(), "client request").await.is_some());
        assert!(manager.get(session.id()).await.is_none());
        assert!(manager.close(session.id(), "again").await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_closes_only_idle_sessions() {
        let manager = SessionManager::new();
        let session = manager.create(init()).await;
        let idle = chrono::Duration::minutes(30);

        assert_eq!(manager.sweep_idle(idle, Utc::now()).await, 0);
        assert!(manager.get(session.id()).await.is_some());

        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(manager.sweep_idle(idle, later).await, 1);
        assert!(manager.is_empty().await);
        let err = manager.resolve(Some(session.id()), None).await.unwrap_err();
        assert_eq!(err, SessionError::InvalidSession);
    }

    #[test]
    fn test_status_reflects_initialized_flag() {
        let session = SessionContext::new("abc".to_string(), init());
        assert!(!session.status().initialized);
        session.mark_initialized();
        let status = serde_json::to_value(session.status()).unwrap();
        assert_eq!(status["sessionId"], "abc");
        assert_eq!(status["initialized"], true);
        assert_eq!(status["protocolVersion"], "2024-11-05");
        assert_eq!(status["client"]["name"], "test-client");
    }
}
