//! Server-side sessions, keyed by the identifier clients send back in the
//! `EJBSESSIONID` cookie.
//!
//! There is one [`SessionRegistry`] per server process, built at startup and
//! shared by every connection through an `Arc`. Sessions are never evicted:
//! an identifier stays reachable until [`SessionRegistry::invalidate`] is
//! called for it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use dashmap::DashMap;
use uuid::Uuid;


/// Server-held state for one client.
#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: SystemTime,
    last_accessed: Mutex<SystemTime>,
    attributes: DashMap<String, String>,
}

impl Session {
    /// A session with a freshly generated identifier.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: String) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            created_at: now,
            last_accessed: Mutex::new(now),
            attributes: DashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn last_accessed(&self) -> SystemTime {
        *self.last_accessed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn touch(&self) {
        *self.last_accessed.lock().unwrap_or_else(PoisonError::into_inner) = SystemTime::now();
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).map(|r| r.value().clone())
    }

    /// Returns the previous value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.attributes.insert(name.into(), value.into())
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.remove(name).map(|(_, value)| value)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|r| r.key().clone()).collect()
    }

    /// Removes this session from `registry`; shorthand for
    /// `registry.invalidate(session.id())`.
    pub fn invalidate(&self, registry: &SessionRegistry) {
        registry.invalidate(&self.id);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}


/// Concurrent identifier → session map shared by all connections.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    /// The live session registered under `id`, if any.
    pub fn lookup(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|r| r.value().clone())?;
        session.touch();
        Some(session)
    }

    /// Registers `session` unless its identifier is already taken, and
    /// returns whichever session ends up registered under it.
    ///
    /// Atomic: racing callers with the same identifier all get the same
    /// `Arc` back.
    pub fn insert_if_absent(&self, session: Session) -> Arc<Session> {
        let candidate = Arc::new(session);
        let winner = self.sessions
            .entry(candidate.id.clone())
            .or_insert_with(|| candidate.clone())
            .value()
            .clone();

        if Arc::ptr_eq(&winner, &candidate) {
            tracing::debug!(session = %winner.id, "session created");
        } else {
            tracing::debug!(session = %winner.id, "session identifier already taken, adopting it");
        }
        winner
    }

    /// Returns `existing` if there is one, otherwise creates and registers
    /// a new session when `allow_create` is set.
    pub fn get_or_create(&self, existing: Option<Arc<Session>>, allow_create: bool) -> Option<Arc<Session>> {
        if existing.is_some() {
            return existing
        }
        if !allow_create {
            return None
        }
        Some(self.insert_if_absent(Session::new()))
    }

    /// Forgets `id`. Holders of the session keep their reference, only
    /// later lookups are affected.
    pub fn invalidate(&self, id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            tracing::debug!(session = id, "session invalidated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
