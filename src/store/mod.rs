// src/store/mod.rs — Session persistence and the in-process session registry

pub mod file;
pub mod memory;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::bot::session::{Session, UserId};
use crate::core::PeriodData;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for one user's periods and conversation record.
pub trait SessionStore: Send + Sync {
    /// Periods for `user`; empty data when nothing was stored yet.
    fn load(&self, user: UserId) -> Result<PeriodData, StoreError>;
    fn save(&self, user: UserId, data: &PeriodData) -> Result<(), StoreError>;
    fn load_session(&self, user: UserId) -> Result<Option<Session>, StoreError>;
    fn save_session(&self, session: &Session) -> Result<(), StoreError>;
}

/// Keeps one live `Session` per user, restoring it from the store on first use.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    live: Mutex<HashMap<UserId, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            live: Mutex::new(HashMap::new()),
        }
    }

    /// The shared session for `user`. Concurrent callers for the same user
    /// get the same handle, so their turns serialize on its lock.
    pub fn get(&self, user: UserId) -> Arc<Mutex<Session>> {
        if let Some(handle) = self.lookup(user) {
            return handle;
        }
        // Cold load without holding the registry lock; a racing loader may
        // have inserted meanwhile, in which case its handle wins.
        let restored = Arc::new(Mutex::new(self.restore(user)));
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.entry(user).or_insert(restored).clone()
    }

    fn lookup(&self, user: UserId) -> Option<Arc<Mutex<Session>>> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned()
    }

    /// Replace the live session for `session.user_id`.
    pub fn put(&self, session: Session) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.insert(session.user_id, Arc::new(Mutex::new(session)));
    }

    pub fn persist(&self, session: &Session) -> Result<(), StoreError> {
        self.store.save(session.user_id, &session.data)?;
        self.store.save_session(session)
    }

    pub fn live_count(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn restore(&self, user: UserId) -> Session {
        match self.store.load_session(user) {
            Ok(Some(mut session)) => {
                session.user_id = user;
                tracing::debug!(user, state = session.pending.name(), "Session restored");
                return session;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user, "Session record unreadable, starting over: {e}");
            }
        }
        match self.store.load(user) {
            Ok(data) => Session::with_data(user, data),
            Err(e) => {
                tracing::warn!(user, "Stored periods unreadable, starting empty: {e}");
                Session::new(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::action::PendingAction;
    use crate::core::Period;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let mgr = SessionManager::new(store.clone());
        (store, mgr)
    }

    #[test]
    fn test_get_returns_same_handle() {
        let (_, mgr) = manager();
        let a = mgr.get(1);
        let b = mgr.get(1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(mgr.live_count(), 1);
    }

    #[test]
    fn test_users_are_isolated() {
        let (_, mgr) = manager();
        mgr.get(1).lock().unwrap().pending = PendingAction::AwaitingDate;
        assert_eq!(mgr.get(2).lock().unwrap().pending, PendingAction::Idle);
    }

    #[test]
    fn test_restore_from_data_only() {
        let (store, _) = manager();
        let mut data = PeriodData::default();
        data.periods.push(Period::new(None, None, "Россия"));
        store.save(5, &data).unwrap();

        let mgr = SessionManager::new(store);
        let session = mgr.get(5);
        assert_eq!(session.lock().unwrap().data, data);
    }

    #[test]
    fn test_persist_then_restore() {
        let (store, mgr) = manager();
        let mut session = Session::new(9);
        session.pending = PendingAction::AwaitingAddIn;
        mgr.persist(&session).unwrap();

        let fresh = SessionManager::new(store);
        assert_eq!(*fresh.get(9).lock().unwrap(), session);
    }

    /// Blocks the load of user 1 until released.
    struct GatedStore {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SessionStore for GatedStore {
        fn load(&self, _user: UserId) -> Result<PeriodData, StoreError> {
            Ok(PeriodData::default())
        }

        fn save(&self, _user: UserId, _data: &PeriodData) -> Result<(), StoreError> {
            Ok(())
        }

        fn load_session(&self, user: UserId) -> Result<Option<Session>, StoreError> {
            if user == 1 {
                self.entered.lock().unwrap().send(()).unwrap();
                let _ = self
                    .release
                    .lock()
                    .unwrap()
                    .recv_timeout(Duration::from_secs(5));
            }
            Ok(None)
        }

        fn save_session(&self, _session: &Session) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_cold_load_does_not_block_other_users() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let mgr = Arc::new(SessionManager::new(Arc::new(GatedStore {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        })));

        let slow_mgr = Arc::clone(&mgr);
        let slow = thread::spawn(move || slow_mgr.get(1));
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        mgr.get(2);
        assert!(!slow.is_finished(), "user 2 waited for user 1's load");

        release_tx.send(()).unwrap();
        slow.join().unwrap();
        assert_eq!(mgr.live_count(), 2);
    }

    #[test]
    fn test_put_replaces_live_session() {
        let (_, mgr) = manager();
        let mut s = Session::new(3);
        s.pending = PendingAction::AwaitingDeleteIndex;
        mgr.put(s.clone());
        assert_eq!(*mgr.get(3).lock().unwrap(), s);
    }
}
