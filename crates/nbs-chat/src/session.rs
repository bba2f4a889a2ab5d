//! Browser sessions and the one-time conversation seed

use axum::http::{header, HeaderMap, HeaderValue};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::ServerConfig;

/// One entry of a session seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEntry {
    pub content: String,
}

/// Seed stored once per browser session: a greeting for the user, then their first question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFlow {
    pub entries: Vec<FlowEntry>,
}

impl SessionFlow {
    pub fn seed(username: &str, question: &str) -> Self {
        Self {
            entries: vec![
                FlowEntry {
                    content: greeting(username),
                },
                FlowEntry {
                    content: question.to_string(),
                },
            ],
        }
    }
}

fn greeting(username: &str) -> String {
    format!(
        "welcome the user with their {}. You are a chatbot, able to have normal interactions, \
         as well as talk about data related to Nigeria. If you are asked anything out of context, \
         just say you don't know you were trained on different data from the NBS",
        username
    )
}

/// Outcome of resolving a request's session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub id: Uuid,
    /// The id was minted for this request and must be sent back as a cookie
    pub issued: bool,
}

struct SessionEntry {
    flow: SessionFlow,
    last_seen: Instant,
}

/// Server-side session store keyed by the id carried in the session cookie
///
/// Sessions idle for longer than the TTL are dropped, and the store never
/// holds more than `max_sessions` entries.
pub struct SessionStore {
    cookie_name: String,
    ttl: Duration,
    max_sessions: usize,
    sessions: DashMap<Uuid, SessionEntry>,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, ttl: Duration, max_sessions: usize) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            ttl,
            max_sessions: max_sessions.max(1),
            sessions: DashMap::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.session_cookie.clone(),
            Duration::from_secs(config.session_ttl_secs),
            config.max_sessions,
        )
    }

    /// Make sure the session has its seed, minting a session if the id is missing, unknown or expired
    ///
    /// A live session that already holds a seed only has its last-seen time refreshed.
    pub fn ensure_flow(&self, session_id: Option<Uuid>, username: &str, question: &str) -> SessionTicket {
        let now = Instant::now();

        if let Some(id) = session_id {
            if let Some(mut entry) = self.sessions.get_mut(&id) {
                if now.duration_since(entry.last_seen) < self.ttl {
                    entry.last_seen = now;
                    return SessionTicket { id, issued: false };
                }
            }
        }

        self.evict(now);

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionEntry {
                flow: SessionFlow::seed(username, question),
                last_seen: now,
            },
        );
        tracing::debug!(
            "Seeded session {} for user '{}' ({} live)",
            id,
            username,
            self.sessions.len()
        );

        SessionTicket { id, issued: true }
    }

    /// Drop expired sessions, then the least recently seen ones until a new one fits
    fn evict(&self, now: Instant) {
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.last_seen)
                .map(|entry| *entry.key());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                }
                None => break,
            }
        }
    }

    pub fn flow(&self, session_id: &Uuid) -> Option<SessionFlow> {
        self.sessions.get(session_id).map(|entry| entry.flow.clone())
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Session id from the request's `Cookie` headers, if present and well formed
    pub fn session_id(&self, headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
    }

    /// `Set-Cookie` value carrying a session id
    pub fn set_cookie(&self, session_id: &Uuid) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            self.cookie_name, session_id
        ))
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_seed_created_once_per_session() {
        let store = SessionStore::new("nbs_session", DAY, 100);

        let first = store.ensure_flow(None, "alice", "What is Nigeria's population?");
        assert!(first.issued);

        let second = store.ensure_flow(Some(first.id), "alice", "And the GDP?");
        assert_eq!(second.id, first.id);
        assert!(!second.issued);

        let flow = store.flow(&first.id).unwrap();
        assert_eq!(flow.entries.len(), 2);
        assert!(flow.entries[0].content.starts_with("welcome the user with their alice."));
        assert!(flow.entries[0].content.ends_with("you don't know you were trained on different data from the NBS"));
        assert_eq!(flow.entries[1].content, "What is Nigeria's population?");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_session_gets_new_id() {
        let store = SessionStore::new("nbs_session", DAY, 100);
        let stale = Uuid::new_v4();

        let ticket = store.ensure_flow(Some(stale), "bob", "hi");
        assert_ne!(ticket.id, stale);
        assert!(ticket.issued);
        assert!(store.flow(&stale).is_none());
    }

    #[test]
    fn test_store_never_exceeds_cap() {
        let store = SessionStore::new("nbs_session", DAY, 5);

        let ids: Vec<Uuid> = (0..50)
            .map(|i| store.ensure_flow(None, "curl", &format!("q{}", i)).id)
            .collect();

        assert_eq!(store.len(), 5);
        assert_eq!(ids.iter().filter(|id| store.flow(id).is_some()).count(), 5);
        assert!(store.flow(&ids[49]).is_some());
    }

    #[test]
    fn test_recently_seen_session_survives_eviction() {
        let store = SessionStore::new("nbs_session", DAY, 2);

        let kept = store.ensure_flow(None, "alice", "first").id;
        let dropped = store.ensure_flow(None, "bob", "first").id;
        std::thread::sleep(Duration::from_millis(2));
        store.ensure_flow(Some(kept), "alice", "again");
        store.ensure_flow(None, "carol", "first");

        assert!(store.flow(&kept).is_some());
        assert!(store.flow(&dropped).is_none());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new("nbs_session", Duration::from_millis(1), 100);

        let old = store.ensure_flow(None, "dan", "hello").id;
        std::thread::sleep(Duration::from_millis(5));

        let ticket = store.ensure_flow(Some(old), "dan", "hello again");
        assert!(ticket.issued);
        assert_ne!(ticket.id, old);
        assert!(store.flow(&old).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let store = SessionStore::new("nbs_session", DAY, 100);
        let id = Uuid::new_v4();

        let found = store.session_id(&headers(&format!("theme=dark; nbs_session={}", id)));
        assert_eq!(found, Some(id));

        assert_eq!(store.session_id(&headers("nbs_session=not-a-uuid")), None);
        assert_eq!(store.session_id(&headers("other=1")), None);
        assert_eq!(store.session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let store = SessionStore::new("nbs_session", DAY, 100);
        let id = Uuid::new_v4();

        let cookie = store.set_cookie(&id).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("nbs_session={};", id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
