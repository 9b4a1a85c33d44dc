// src/store/file.rs — JSON files under one directory per user
//
// Layout: <root>/<user_id>/data.json, session.json, backup.json.
// Every write goes to a temp file first and is renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{SessionStore, StoreError};
use crate::bot::session::{Session, UserId};
use crate::core::PeriodData;

const DATA_FILE: &str = "data.json";
const SESSION_FILE: &str = "session.json";
const BACKUP_FILE: &str = "backup.json";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn user_dir(&self, user: UserId) -> PathBuf {
        self.root.join(user.to_string())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_json<T: Serialize>(&self, user: UserId, name: &str, value: &T) -> Result<(), StoreError> {
        let dir = self.user_dir(user);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };
        std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: dir.join(name),
            source,
        })?;

        let tmp = dir.join(format!(".{name}.tmp"));
        let dst = dir.join(name);
        let mut f = std::fs::File::create(&tmp).map_err(io_err(&tmp))?;
        f.write_all(json.as_bytes()).map_err(io_err(&tmp))?;
        f.sync_all().map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, &dst).map_err(io_err(&dst))?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn load(&self, user: UserId) -> Result<PeriodData, StoreError> {
        let path = self.user_dir(user).join(DATA_FILE);
        Ok(self.read_json(&path)?.unwrap_or_default())
    }

    fn save(&self, user: UserId, data: &PeriodData) -> Result<(), StoreError> {
        self.write_json(user, DATA_FILE, data)
    }

    fn load_session(&self, user: UserId) -> Result<Option<Session>, StoreError> {
        let path = self.user_dir(user).join(SESSION_FILE);
        self.read_json(&path)
    }

    fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.write_json(session.user_id, SESSION_FILE, session)?;
        self.write_json(session.user_id, BACKUP_FILE, &session.backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use chrono::NaiveDate;

    fn sample() -> PeriodData {
        let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day);
        PeriodData {
            periods: vec![
                Period::new(None, d(3, 31), "Россия"),
                Period::new(d(4, 1), None, "Грузия"),
            ],
            current: d(12, 31),
        }
    }

    #[test]
    fn test_missing_user_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        assert!(store.load(1).unwrap().is_empty());
        assert!(store.load_session(1).unwrap().is_none());
    }

    #[test]
    fn test_save_writes_upload_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.save(77, &sample()).unwrap();

        let text = std::fs::read_to_string(dir.path().join("77").join("data.json")).unwrap();
        assert!(text.contains("\"out\": \"31.03.2023\""));
        assert!(text.contains("\"current\": \"31.12.2023\""));
        assert!(!dir.path().join("77").join(".data.json.tmp").exists());
        assert_eq!(store.load(77).unwrap(), sample());
    }

    #[test]
    fn test_session_writes_backup_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let mut session = Session::with_data(5, sample());
        session.snapshot();
        store.save_session(&session).unwrap();

        let backup: PeriodData = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("5").join("backup.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(backup, sample());
        assert_eq!(store.load_session(5).unwrap(), Some(session));
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        std::fs::create_dir_all(dir.path().join("3")).unwrap();
        std::fs::write(dir.path().join("3").join("data.json"), "{not json").unwrap();
        assert!(matches!(store.load(3), Err(StoreError::Json { .. })));
    }
}
