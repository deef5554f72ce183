//! Short-lived storage for split pages
//!
//! A referenced-mode split writes its pages into a [`SessionStore`] under a
//! fresh [`SessionId`]; clients fetch pages one by one afterwards. Sessions
//! live for a fixed window from creation. Reads never extend it.
//!
//! [`InMemorySessionStore`] keeps everything in process memory. Expired
//! sessions disappear on the first access after their deadline, and
//! [`SessionStore::sweep_expired`] drops the ones nobody asks for again.

use crate::artifact::PageArtifact;
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// How long a session stays retrievable (10 minutes)
pub const SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// Opaque session identifier
///
/// `{creation millis, hex}-{128 random bits, hex}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let random: [u8; 16] = rand::thread_rng().gen();
        SessionId(format!(
            "{:x}-{}",
            now.timestamp_millis(),
            hex::encode(random)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Handle returned to the caller of [`SessionStore::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    pub id: SessionId,
    pub page_count: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Storage for split pages, shared by the split and download handlers.
pub trait SessionStore: Send + Sync {
    /// Register all `artifacts` under a new session identifier.
    ///
    /// The session is visible to readers only once every artifact is stored.
    fn create(&self, artifacts: Vec<PageArtifact>) -> CreatedSession;

    /// Look up one page of a live session.
    fn get(&self, session_id: &str, page_index: usize) -> Result<PageArtifact, StoreError>;

    /// Drop a session and all its pages. Returns whether anything was removed.
    fn expire(&self, session_id: &str) -> bool;

    fn contains(&self, session_id: &str) -> bool;

    /// Number of live sessions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired session, returning how many were dropped.
    ///
    /// Stores whose backend expires entries on its own keep the default.
    fn sweep_expired(&self) -> usize {
        0
    }

    fn ttl(&self) -> Duration;
}

#[derive(Debug)]
struct Session {
    pages: BTreeMap<usize, PageArtifact>,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local [`SessionStore`]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Sessions currently held in memory, including expired ones not yet
    /// swept or looked up.
    pub fn stored_sessions(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, Session>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn deadline(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) {
        let mut sessions = self.write();
        if sessions.get(session_id).is_some_and(|s| s.is_expired(now)) {
            sessions.remove(session_id);
            tracing::debug!(session_id, "Session expired");
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl fmt::Debug for InMemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySessionStore")
            .field("sessions", &self.read().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, artifacts: Vec<PageArtifact>) -> CreatedSession {
        let created_at = self.clock.now();
        let expires_at = self.deadline(created_at);
        let page_count = artifacts.len();
        let session = Session {
            pages: artifacts.into_iter().map(|a| (a.index(), a)).collect(),
            expires_at,
        };

        let mut sessions = self.write();
        let id = loop {
            match sessions.entry(SessionId::generate(created_at)) {
                Entry::Vacant(slot) => {
                    let id = slot.key().clone();
                    slot.insert(session);
                    break id;
                }
                Entry::Occupied(slot) => {
                    tracing::warn!(session_id = %slot.key(), "Session id collision, regenerating");
                }
            }
        };
        drop(sessions);

        tracing::info!(session_id = %id, page_count, %expires_at, "Created session");

        CreatedSession {
            id,
            page_count,
            created_at,
            expires_at,
        }
    }

    fn get(&self, session_id: &str, page_index: usize) -> Result<PageArtifact, StoreError> {
        let now = self.clock.now();
        {
            let sessions = self.read();
            match sessions.get(session_id) {
                None => return Err(StoreError::SessionNotFound),
                Some(session) if !session.is_expired(now) => {
                    return session
                        .pages
                        .get(&page_index)
                        .cloned()
                        .ok_or(StoreError::PageNotFound);
                }
                Some(_) => {}
            }
        }

        self.remove_if_expired(session_id, now);
        Err(StoreError::SessionNotFound)
    }

    fn expire(&self, session_id: &str) -> bool {
        let removed = self.write().remove(session_id).is_some();
        if removed {
            tracing::debug!(session_id, "Session removed");
        }
        removed
    }

    fn contains(&self, session_id: &str) -> bool {
        let now = self.clock.now();
        self.read()
            .get(session_id)
            .is_some_and(|s| !s.is_expired(now))
    }

    fn len(&self) -> usize {
        let now = self.clock.now();
        self.read().values().filter(|s| !s.is_expired(now)).count()
    }

    fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let removed = before - sessions.len();
        drop(sessions);

        if removed > 0 {
            tracing::info!(removed, "Swept expired sessions");
        }
        removed
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
