use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::HuddleError;

const SESSION_FILE: &str = "session.json";

/// A user capable of signing in.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
        }
    }
}

/// Bearer token plus the environment that issued it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub environment: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
struct PersistedSession {
    #[serde(default)]
    user: Option<Identity>,
    #[serde(default)]
    credential: Option<Credential>,
}

/// Device-local store for the signed-in identity and its credential.
///
/// Every write rewrites `session.json` in full. The current identity is also
/// published on a watch channel so navigation can react to sign-in/out.
///
/// A failed write still updates memory and the watch channel; the error is
/// returned as [`HuddleError::Storage`].
pub struct SessionStore {
    session: Mutex<PersistedSession>,
    file_path: PathBuf,
    user_tx: watch::Sender<Option<Identity>>,
}

impl SessionStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let file_path = data_dir.as_ref().join(SESSION_FILE);
        let session = Self::load(&file_path);
        let (user_tx, _) = watch::channel(session.user.clone());
        Self {
            session: Mutex::new(session),
            file_path,
            user_tx,
        }
    }

    pub fn user(&self) -> Option<Identity> {
        self.lock().user.clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    /// Reactive "current user" signal.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.user_tx.subscribe()
    }

    pub fn update_user(&self, user: Option<Identity>) -> Result<(), HuddleError> {
        self.lock().user = user.clone();
        let saved = self.save();
        self.publish(user);
        saved
    }

    pub fn update_credential(&self, credential: Option<Credential>) -> Result<(), HuddleError> {
        self.lock().credential = credential;
        self.save()
    }

    /// Forget both identity and credential.
    pub fn clear(&self) -> Result<(), HuddleError> {
        *self.lock() = PersistedSession::default();
        let saved = self.save();
        self.publish(None);
        saved
    }

    fn publish(&self, user: Option<Identity>) {
        self.user_tx.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, PersistedSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self) -> Result<(), HuddleError> {
        let session = self.lock().clone();
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        serde_json::to_string_pretty(&session)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&self.file_path, json).map_err(|e| e.to_string()))
            .map_err(|e| {
                tracing::warn!("failed to persist session to {}: {e}", self.file_path.display());
                HuddleError::Storage(e)
            })
    }

    fn load(path: &Path) -> PersistedSession {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => PersistedSession::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn demo() -> Identity {
        Identity::new("demo1@gmail.com", "Demo User 1")
    }

    fn credential() -> Credential {
        Credential {
            token: "tok-1".to_string(),
            environment: "demo".to_string(),
        }
    }

    #[test]
    fn new_store_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.user(), None);
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn user_and_credential_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SessionStore::new(dir.path());
            store.update_user(Some(demo())).unwrap();
            store.update_credential(Some(credential())).unwrap();
        }
        let store = SessionStore::new(dir.path());
        assert_eq!(store.user(), Some(demo()));
        assert_eq!(store.credential(), Some(credential()));
    }

    #[test]
    fn clear_removes_everything_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.update_user(Some(demo())).unwrap();
        store.update_credential(Some(credential())).unwrap();
        store.clear().unwrap();

        let reloaded = SessionStore::new(dir.path());
        assert_eq!(reloaded.user(), None);
        assert_eq!(reloaded.credential(), None);
    }

    #[test]
    fn corrupt_file_falls_back_to_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("session.json"), "not json!!!").unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.user(), None);
    }

    #[tokio::test]
    async fn subscribers_see_user_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let mut rx = store.subscribe();
        assert_eq!(*rx.borrow(), None);

        store.update_user(Some(demo())).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&demo()));

        store.clear().unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), None);
    }

    #[test]
    fn rewriting_same_user_does_not_notify() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.update_user(Some(demo())).unwrap();
        let rx = store.subscribe();
        store.update_user(Some(demo())).unwrap();
        store.update_credential(Some(credential())).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn unwritable_directory_reports_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain-file");
        fs::write(&not_a_dir, "x").unwrap();
        let store = SessionStore::new(&not_a_dir);

        let result = store.update_user(Some(demo()));

        assert!(matches!(result, Err(HuddleError::Storage(_))));
        assert_eq!(store.user(), Some(demo()));
        assert!(matches!(store.clear(), Err(HuddleError::Storage(_))));
        assert_eq!(store.user(), None);
    }
}
