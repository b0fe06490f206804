use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

/// Header carrying the session id once a session has been established
/// (spec §4.4). Clients echo it back on every subsequent request.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// One streamable-HTTP session: a single logical MCP peer connection that
/// may span many HTTP requests. `client_id` identifies the connecting
/// client across reconnects (assigned by the server on first contact, not
/// carried on the wire); `session_id` is the value handed out in
/// `Mcp-Session-Id` and is what the peer actually holds onto.
#[derive(Debug, Clone)]
pub struct Session {
    pub client_id: Uuid,
    pub session_id: Uuid,
    pub initialized: bool,
}

impl Session {
    fn new() -> Self {
        Session {
            client_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            initialized: false,
        }
    }
}

/// Tracks live sessions by the id handed out in `Mcp-Session-Id`. A session
/// is created on the `initialize` request and torn down on `DELETE` or
/// transport close (spec §4.4).
#[derive(Default, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        SessionManager::default()
    }

    pub async fn create_session(&self) -> Session {
        let session = Session::new();
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        session
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    pub async fn mark_initialized(&self, session_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(session) => {
                session.initialized = true;
                true
            }
            None => false,
        }
    }

    /// Returns `true` if a session existed and was removed. Callers use
    /// this to decide the HTTP status for `DELETE` (spec §4.4: 200 if a
    /// session was torn down, 404 if it was already gone).
    pub async fn remove(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
