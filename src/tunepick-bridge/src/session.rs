//! Live picker sessions.
//!
//! A picker surface only holds a weak reference to its delegate, so the
//! registry keeps both the surface and its collector alive until the
//! collector releases the session after dismissal.

use crate::collector::SelectionOutcomeCollector;
use crate::platform::PickerSurface;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One presented picker and the collector answering for it.
pub struct PickerSession {
    pub surface: Arc<dyn PickerSurface>,
    pub collector: Arc<SelectionOutcomeCollector>,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, PickerSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: SessionId, session: PickerSession) {
        if self.lock().insert(id, session).is_some() {
            tracing::warn!(session = %id, "replaced an existing picker session");
        }
    }

    /// Drop the session's strong references. Returns whether it was live.
    pub fn release(&self, id: SessionId) -> bool {
        // Drop outside the lock; the session may hold the last reference to
        // objects whose destructors log.
        let removed = self.lock().remove(&id);
        removed.is_some()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, PickerSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.lock().keys().copied().collect();
        ids.sort();
        f.debug_struct("SessionRegistry")
            .field("sessions", &ids)
            .finish()
    }
}
