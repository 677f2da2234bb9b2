//! In-memory login sessions and flash messages
//!
//! A random id in the `larder_session` cookie maps to the logged-in account
//! (if any) and the flash messages waiting for the next rendered page.
//!
//! An entry is only stored once there is something to keep: a login or a
//! pending flash. Anonymous entries are dropped as soon as their flashes are
//! shown, and the number of anonymous entries waiting for a reader is
//! bounded. Logged-in sessions are neither persisted nor expired.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "larder_session";

/// Flash shown when a protected page is opened without logging in
pub const LOGIN_REQUIRED: &str = "Please log in first.";

/// Anonymous sessions kept while their flashes wait to be shown
pub const MAX_ANONYMOUS_SESSIONS: usize = 1024;

/// Anonymous sessions unread for this long are discarded
pub const ANONYMOUS_SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// Flash message category, used as a CSS class suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Warning,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Warning => "warning",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
struct SessionData {
    user: Option<String>,
    flashes: Vec<Flash>,
    created: Instant,
    /// Creation order, for evicting the oldest anonymous entries
    seq: u64,
}

impl SessionData {
    fn new(user: Option<String>, seq: u64) -> Self {
        Self {
            user,
            flashes: Vec::new(),
            created: Instant::now(),
            seq,
        }
    }
}

/// Session id of the current request, inserted by [`session_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

impl SessionId {
    /// Fresh random id, not yet stored
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Account of the current request, inserted by [`require_login`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Shared session table
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    next_seq: Arc<AtomicU64>,
    anonymous_limit: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_anonymous_limit(MAX_ANONYMOUS_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anonymous_limit(anonymous_limit: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            anonymous_limit: anonymous_limit.max(1),
        }
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn exists(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(&id.0)
    }

    pub async fn user(&self, id: &SessionId) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(&id.0)
            .and_then(|s| s.user.clone())
    }

    /// Replace `id` by a fresh session logged in as `user`, carrying over
    /// pending flashes
    pub async fn login(&self, id: &SessionId, user: &str) -> SessionId {
        let fresh = SessionId::generate();
        let mut sessions = self.sessions.write().await;
        let flashes = sessions
            .remove(&id.0)
            .map(|s| s.flashes)
            .unwrap_or_default();
        let mut session = SessionData::new(Some(user.to_string()), self.seq());
        session.flashes = flashes;
        sessions.insert(fresh.0.clone(), session);
        fresh
    }

    pub async fn logout(&self, id: &SessionId) {
        if let Some(session) = self.sessions.write().await.get_mut(&id.0) {
            session.user = None;
        }
    }

    /// Queue a flash, storing the session first if it is new
    pub async fn flash(&self, id: &SessionId, level: FlashLevel, message: impl Into<String>) {
        let message = message.into();
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&id.0) {
            self.make_room(&mut sessions);
            sessions.insert(id.0.clone(), SessionData::new(None, self.seq()));
        }
        if let Some(session) = sessions.get_mut(&id.0) {
            session.flashes.push(Flash { level, message });
        }
    }

    /// Remove and return the pending flashes; an anonymous session has
    /// nothing left to keep afterwards and is dropped
    pub async fn take_flashes(&self, id: &SessionId) -> Vec<Flash> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&id.0) else {
            return Vec::new();
        };
        let flashes = std::mem::take(&mut session.flashes);
        if session.user.is_none() {
            sessions.remove(&id.0);
        }
        flashes
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop expired anonymous sessions, then the oldest ones while the
    /// anonymous count is at the limit
    fn make_room(&self, sessions: &mut HashMap<String, SessionData>) {
        sessions.retain(|_, s| s.user.is_some() || s.created.elapsed() < ANONYMOUS_SESSION_TTL);

        let mut anonymous: Vec<(u64, String)> = sessions
            .iter()
            .filter(|(_, s)| s.user.is_none())
            .map(|(id, s)| (s.seq, id.clone()))
            .collect();
        if anonymous.len() < self.anonymous_limit {
            return;
        }
        anonymous.sort();
        let excess = anonymous.len() + 1 - self.anonymous_limit;
        for (_, id) in anonymous.into_iter().take(excess) {
            sessions.remove(&id);
        }
        debug!(evicted = excess, "Evicted anonymous sessions");
    }
}

/// Value of cookie `name` from the request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value binding the browser to session `id`
pub fn session_cookie(id: &SessionId) -> HeaderValue {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id.0);
    // Uuid text and the fixed attributes are always visible ASCII
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Attach a session id to every page request
///
/// Reuses the cookie's session when it is known. Otherwise the request gets a
/// fresh id that is only stored if the handler queues a flash; the cookie is
/// set in that case (unless the handler already set one).
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = match cookie_value(request.headers(), SESSION_COOKIE) {
        Some(value) => {
            let id = SessionId(value);
            state.sessions.exists(&id).await.then_some(id)
        }
        None => None,
    };

    let (id, fresh) = match existing {
        Some(id) => (id, false),
        None => (SessionId::generate(), true),
    };

    request.extensions_mut().insert(id.clone());
    let mut response = next.run(request).await;

    if fresh
        && !response.headers().contains_key(header::SET_COOKIE)
        && state.sessions.exists(&id).await
    {
        debug!("Started session");
        response
            .headers_mut()
            .insert(header::SET_COOKIE, session_cookie(&id));
    }
    response
}

/// Redirect to the login page unless the session is logged in
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(id) = request.extensions().get::<SessionId>().cloned() else {
        return Redirect::to("/").into_response();
    };

    match state.sessions.user(&id).await {
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        None => {
            state
                .sessions
                .flash(&id, FlashLevel::Error, LOGIN_REQUIRED)
                .await;
            Redirect::to("/").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; larder_session=abc-123; other=1"),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc-123")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let value = session_cookie(&SessionId("abc".to_string()));
        let text = value.to_str().unwrap();
        assert!(text.starts_with("larder_session=abc;"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once() {
        let store = SessionStore::new();
        let id = store.login(&SessionId::generate(), "cook@example.com").await;
        store.flash(&id, FlashLevel::Success, "Saved").await;
        store.flash(&id, FlashLevel::Error, "Oops").await;

        let flashes = store.take_flashes(&id).await;
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].message, "Saved");
        assert_eq!(flashes[1].level, FlashLevel::Error);
        assert!(store.take_flashes(&id).await.is_empty());
    }

    #[tokio::test]
    async fn test_login_rotates_session_and_keeps_flashes() {
        let store = SessionStore::new();
        let anonymous = SessionId::generate();
        store.flash(&anonymous, FlashLevel::Success, "Login successful!").await;
        assert!(store.exists(&anonymous).await);

        let logged_in = store.login(&anonymous, "cook@example.com").await;
        assert_ne!(logged_in, anonymous);
        assert!(!store.exists(&anonymous).await);
        assert_eq!(store.user(&logged_in).await.as_deref(), Some("cook@example.com"));
        assert_eq!(store.take_flashes(&logged_in).await.len(), 1);

        store.logout(&logged_in).await;
        assert_eq!(store.user(&logged_in).await, None);
    }

    #[tokio::test]
    async fn test_anonymous_session_is_stored_only_while_flashes_wait() {
        let store = SessionStore::new();
        let id = SessionId::generate();
        assert!(store.take_flashes(&id).await.is_empty());
        assert_eq!(store.len().await, 0);

        store.flash(&id, FlashLevel::Error, LOGIN_REQUIRED).await;
        assert_eq!(store.len().await, 1);

        assert_eq!(store.take_flashes(&id).await.len(), 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_sessions_are_bounded() {
        let store = SessionStore::with_anonymous_limit(3);
        let user = store.login(&SessionId::generate(), "cook@example.com").await;

        let ids: Vec<SessionId> = (0..10).map(|_| SessionId::generate()).collect();
        for id in &ids {
            store.flash(id, FlashLevel::Error, LOGIN_REQUIRED).await;
        }

        assert_eq!(store.len().await, 4);
        assert!(store.exists(&user).await);
        assert!(store.exists(&ids[9]).await);
        assert!(!store.exists(&ids[0]).await);
    }
}
