//! Session store.
//!
//! Maps opaque tokens to authenticated identities for hosts that put a graph
//! behind a transport. Sessions expire a fixed time after they were issued or
//! last touched; expired sessions are never returned and are removed either on
//! lookup or by the periodic eviction task.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use chrono::{DateTime, Utc};
use handle_trait::Handle;
use serde::{Deserialize, Serialize};
use tokio::{task::JoinHandle, time::interval};
use tracing::{debug, info};

use crate::{
    Result,
    clock::{Clock, SystemClock},
    config::SessionConfig,
    graph::Identity,
};

mod errors;

pub use errors::SessionError;


/// An issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque UUID v4 token
    pub token: String,
    pub alias: String,
    pub public_key: String,
    /// Issue time, milliseconds since Unix epoch
    pub issued_at: u64,
    /// Expiry time, milliseconds since Unix epoch
    pub expires_at: u64,
}

impl Session {
    pub fn is_expired_at(&self, now_millis: u64) -> bool {
        now_millis >= self.expires_at
    }

    /// Expiry time as a UTC timestamp.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at as i64)
    }
}

/// Shared session state.
///
/// Cloning (or calling `handle()`) gives another handle to the same sessions.
///
/// ```
/// use ripple::{Identity, IdentityScheme, SessionConfig, SessionStore};
///
/// let store = SessionStore::new(SessionConfig::default());
/// let session = store.issue(&Identity::new("alice", IdentityScheme::Alias));
///
/// let found = store.lookup(&session.token).unwrap();
/// assert_eq!(found.alias, "alice");
///
/// store.revoke(&session.token);
/// assert!(store.lookup(&session.token).unwrap_err().is_not_found());
/// ```
#[derive(Clone, Debug, Handle)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: Mutex<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionStoreInner {
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evict_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }
}

impl SessionStore {
    /// Create a store reading time from the system clock.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`.
    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: Mutex::new(HashMap::new()),
                clock,
                config,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    fn ttl_millis(&self) -> u64 {
        self.inner.config.ttl_secs.saturating_mul(1000)
    }

    /// Issue a new session for `identity`.
    pub fn issue(&self, identity: &Identity) -> Session {
        let now = self.inner.clock.now_millis();
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            alias: identity.alias.clone(),
            public_key: identity.public_key.clone(),
            issued_at: now,
            expires_at: now.saturating_add(self.ttl_millis()),
        };
        self.inner
            .sessions()
            .insert(session.token.clone(), session.clone());

        let expires = session.expires_at_utc().map(|at| at.to_rfc3339());
        info!(alias = %session.alias, ?expires, "Session issued");
        session
    }

    /// Find a live session.
    ///
    /// An expired session is removed and reported as [`SessionError::Expired`].
    pub fn lookup(&self, token: &str) -> Result<Session> {
        let now = self.inner.clock.now_millis();
        let mut sessions = self.inner.sessions();
        match sessions.get(token) {
            None => {
                return Err(SessionError::NotFound {
                    token: token.to_string(),
                }
                .into());
            }
            Some(session) if !session.is_expired_at(now) => return Ok(session.clone()),
            Some(_) => {}
        }

        sessions.remove(token);
        debug!("Removed expired session on lookup");
        Err(SessionError::Expired {
            token: token.to_string(),
        }
        .into())
    }

    /// Extend a live session by a full lifetime from now.
    pub fn touch(&self, token: &str) -> Result<Session> {
        self.lookup(token)?;
        let expires_at = self
            .inner
            .clock
            .now_millis()
            .saturating_add(self.ttl_millis());
        let mut sessions = self.inner.sessions();
        let session = sessions.get_mut(token).ok_or_else(|| SessionError::NotFound {
            token: token.to_string(),
        })?;
        session.expires_at = expires_at;
        Ok(session.clone())
    }

    /// Remove a session. Returns it if it existed, expired or not.
    pub fn revoke(&self, token: &str) -> Option<Session> {
        let revoked = self.inner.sessions().remove(token);
        if let Some(session) = &revoked {
            info!(alias = %session.alias, "Session revoked");
        }
        revoked
    }

    /// Remove every expired session. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let evicted = self.inner.evict_expired();
        if evicted > 0 {
            info!(evicted, "Evicted expired sessions");
        }
        evicted
    }

    /// Number of stored sessions, including expired ones not evicted yet.
    pub fn len(&self) -> usize {
        self.inner.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run [`SessionStore::evict_expired`] periodically on the current tokio runtime.
    ///
    /// The task holds only a weak reference and ends once every handle to the
    /// store is dropped. It can also be stopped with `JoinHandle::abort`.
    pub fn spawn_eviction(&self) -> JoinHandle<()> {
        let weak: Weak<SessionStoreInner> = Arc::downgrade(&self.handle().inner);
        let period = self.inner.config.eviction_interval();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Session store dropped, stopping eviction");
                    break;
                };
                let evicted = inner.evict_expired();
                if evicted > 0 {
                    info!(evicted, "Evicted expired sessions");
                }
            }
        })
    }
}
