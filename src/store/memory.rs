// src/store/memory.rs — In-process store for tests and dry runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{SessionStore, StoreError};
use crate::bot::session::{Session, UserId};
use crate::core::PeriodData;

#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<UserId, PeriodData>>,
    sessions: Mutex<HashMap<UserId, Session>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (simulates a full or read-only disk).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn saved_data(&self, user: UserId) -> Option<PeriodData> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, user: UserId) -> Result<PeriodData, StoreError> {
        Ok(self.saved_data(user).unwrap_or_default())
    }

    fn save(&self, user: UserId, data: &PeriodData) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, data.clone());
        Ok(())
    }

    fn load_session(&self, user: UserId) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned())
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.check_writable()?;
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.user_id, session.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_writes_toggle() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.save(1, &PeriodData::default()).is_err());
        assert!(store.saved_data(1).is_none());

        store.set_fail_writes(false);
        store.save(1, &PeriodData::default()).unwrap();
        assert_eq!(store.saved_data(1), Some(PeriodData::default()));
    }
}
