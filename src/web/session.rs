use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};
use thiserror::Error;
use uuid::Uuid;

use crate::conversation::ChatSession;

/// Chat sessions kept before the least recently used one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a generation request is already running for this session")]
    Busy,

    #[error("session store is unavailable")]
    Poisoned,
}

#[derive(Debug)]
struct Session {
    chat: ChatSession,
    last_active: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    by_id: HashMap<Uuid, Session>,
    // logical clock for LRU eviction
    clock: u64,
}

impl Sessions {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .by_id
            .iter()
            .min_by_key(|(_, session)| session.last_active)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            debug!("Evicting idle session {}", id);
            self.by_id.remove(&id);
        }
    }
}

/// In-memory chat sessions keyed by id, bounded to `max_sessions`.
/// Generations in flight are tracked separately and never create a session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<Sessions>,
    generating: Mutex<HashSet<Uuid>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            generating: Mutex::new(HashSet::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>, SessionError> {
        self.sessions.lock().map_err(|e| {
            error!("Failed to lock sessions mutex: {}", e);
            SessionError::Poisoned
        })
    }

    fn lock_generating(&self) -> Result<MutexGuard<'_, HashSet<Uuid>>, SessionError> {
        self.generating.lock().map_err(|e| {
            error!("Failed to lock generation mutex: {}", e);
            SessionError::Poisoned
        })
    }

    /// Runs `f` on the chat of `id`, creating the session when it is new or
    /// no id was given.
    pub fn with_chat<R>(
        &self,
        id: Option<Uuid>,
        f: impl FnOnce(&mut ChatSession) -> R,
    ) -> Result<(Uuid, R), SessionError> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.lock()?;
        let now = sessions.tick();

        if !sessions.by_id.contains_key(&id) && sessions.by_id.len() >= self.max_sessions {
            sessions.evict_oldest();
        }

        let session = sessions.by_id.entry(id).or_insert_with(|| {
            debug!("Starting session {}", id);
            Session {
                chat: ChatSession::new(),
                last_active: now,
            }
        });
        session.last_active = now;
        Ok((id, f(&mut session.chat)))
    }

    /// Like [`with_chat`](Self::with_chat) but never creates a session.
    pub fn read_chat<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&ChatSession) -> R,
    ) -> Result<Option<R>, SessionError> {
        let sessions = self.lock()?;
        Ok(sessions.by_id.get(&id).map(|session| f(&session.chat)))
    }

    /// Marks a generation as running for `id`. The returned guard clears the
    /// mark when dropped; a second call before that fails with
    /// [`SessionError::Busy`].
    pub fn begin_generation(self: &Arc<Self>, id: Option<Uuid>) -> Result<InFlight, SessionError> {
        let id = id.unwrap_or_else(Uuid::new_v4);
        if !self.lock_generating()?.insert(id) {
            return Err(SessionError::Busy);
        }
        Ok(InFlight {
            store: Arc::clone(self),
            session_id: id,
        })
    }

    #[cfg(test)]
    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().by_id.len()
    }

    #[cfg(test)]
    pub(crate) fn in_flight_count(&self) -> usize {
        self.generating.lock().unwrap().len()
    }
}

#[derive(Debug)]
pub struct InFlight {
    store: Arc<SessionStore>,
    session_id: Uuid,
}

impl InFlight {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        match self.store.generating.lock() {
            Ok(mut generating) => {
                generating.remove(&self.session_id);
            }
            Err(e) => error!("Failed to release generation for {}: {}", self.session_id, e),
        }
    }
}
