// ── Most recent connection failure ──
//
// Shared between a writer handle and its supervisor task. Readers take the
// shared lock, the supervisor takes the exclusive one.

use std::sync::{PoisonError, RwLock};

use crate::error::ConnectionError;

/// Lock-protected cell holding the last connection failure, if any.
#[derive(Debug, Default)]
pub struct LastError {
    inner: RwLock<Option<ConnectionError>>,
}

impl LastError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current error. May be stale by the time the caller
    /// looks at it.
    pub fn get(&self) -> Option<ConnectionError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn set(&self, err: ConnectionError) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
