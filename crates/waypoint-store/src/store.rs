//! Append-only conversation store
//!
//! Sessions are logically single-writer (one user converses serially), but
//! the store tolerates racing requests: each session owns an async mutex, so
//! concurrent appends serialize instead of interleaving. Lock acquisition is
//! bounded; on timeout the append is retried once, then surfaced as
//! [`StoreError::Unavailable`].

use crate::error::StoreError;
use crate::types::{ConversationSnapshot, SessionId, Turn};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_WINDOW: usize = 20;
const DEFAULT_LOCK_BUDGET: Duration = Duration::from_secs(1);

/// In-memory per-session conversation store
#[derive(Debug)]
pub struct ConversationStore {
    sessions: DashMap<SessionId, Arc<Mutex<Vec<Turn>>>>,
    window: usize,
    lock_budget: Duration,
}

impl ConversationStore {
    /// Create a store with the default recency window (20 turns)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            window: DEFAULT_WINDOW,
            lock_budget: DEFAULT_LOCK_BUDGET,
        }
    }

    /// With a custom recency window
    #[inline]
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// With a custom per-append lock budget
    #[inline]
    #[must_use]
    pub fn with_lock_budget(mut self, budget: Duration) -> Self {
        self.lock_budget = budget;
        self
    }

    /// Point-in-time snapshot of a session's most recent turns.
    ///
    /// A session that has never been written yields an empty snapshot.
    ///
    /// # Errors
    /// `StoreError::Unavailable` when the session log stays locked past the
    /// budget twice in a row.
    pub async fn snapshot(&self, session: &SessionId) -> Result<ConversationSnapshot, StoreError> {
        self.snapshot_windowed(session, self.window).await
    }

    /// Snapshot with an explicit window, overriding the store default.
    ///
    /// # Errors
    /// Same as [`ConversationStore::snapshot`].
    pub async fn snapshot_windowed(
        &self,
        session: &SessionId,
        window: usize,
    ) -> Result<ConversationSnapshot, StoreError> {
        let Some(log) = self.sessions.get(session).map(|e| Arc::clone(e.value())) else {
            return Ok(ConversationSnapshot::empty(session.clone()));
        };

        let guard = self.lock_with_retry(session, &log).await?;
        let start = guard.len().saturating_sub(window);
        Ok(ConversationSnapshot::new(
            session.clone(),
            guard[start..].to_vec(),
        ))
    }

    /// Append one turn to a session's history.
    ///
    /// Append-only: no turn is ever mutated or deleted through this
    /// interface.
    ///
    /// # Errors
    /// `StoreError::Unavailable` when the session log stays locked past the
    /// budget twice in a row.
    pub async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), StoreError> {
        let log = self
            .sessions
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone();

        let mut guard = self.lock_with_retry(session, &log).await?;
        guard.push(turn);
        tracing::trace!(%session, turns = guard.len(), "turn appended");
        Ok(())
    }

    /// Number of turns recorded for a session (full log, not windowed)
    pub async fn turn_count(&self, session: &SessionId) -> Result<usize, StoreError> {
        let Some(log) = self.sessions.get(session).map(|e| Arc::clone(e.value())) else {
            return Ok(0);
        };
        let guard = self.lock_with_retry(session, &log).await?;
        Ok(guard.len())
    }

    /// Number of sessions with at least one recorded turn
    #[inline]
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    async fn lock_with_retry<'a>(
        &self,
        session: &SessionId,
        log: &'a Mutex<Vec<Turn>>,
    ) -> Result<tokio::sync::MutexGuard<'a, Vec<Turn>>, StoreError> {
        for attempt in 0..2 {
            match tokio::time::timeout(self.lock_budget, log.lock()).await {
                Ok(guard) => return Ok(guard),
                Err(_) => {
                    tracing::warn!(%session, attempt, "session log lock timed out");
                }
            }
        }
        Err(StoreError::Unavailable {
            session: session.to_string(),
        })
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
