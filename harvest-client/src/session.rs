//! Session context and durable token storage
//!
//! The session is an explicitly passed handle; every component that needs the
//! identity or the bearer token receives a clone of it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Role, User};
use tokio::sync::watch;

use crate::{ClientError, ClientResult};

/// Durable storage for the bearer token (the only persisted client state)
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> ClientResult<Option<String>>;
    fn save(&self, token: &str) -> ClientResult<()>;
    fn delete(&self) -> ClientResult<()>;
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// JSON file `{ "access_token": "..." }`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredToken = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Storage(format!("Corrupt token file: {}", e)))?;
        Ok(Some(stored.access_token))
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(&StoredToken {
            access_token: token.to_string(),
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn delete(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store; the token does not survive the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> ClientResult<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> ClientResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

struct Inner {
    store: Box<dyn TokenStore>,
    state: RwLock<SessionState>,
    user_tx: watch::Sender<Option<String>>,
}

/// Authenticated identity and credential, shared by cloning
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("SessionContext")
            .field("user", &state.user.as_ref().map(|u| &u.id))
            .field("has_token", &state.token.is_some())
            .finish()
    }
}

impl SessionContext {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        let (user_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                store,
                state: RwLock::new(SessionState::default()),
                user_tx,
            }),
        }
    }

    /// Session that keeps its token in memory only
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryTokenStore::default()))
    }

    /// Install a token and its user; the token is persisted first
    pub fn establish(&self, token: impl Into<String>, user: User) -> ClientResult<()> {
        let token = token.into();
        self.inner.store.save(&token)?;
        let user_id = user.id.clone();
        {
            let mut state = self.inner.state.write();
            state.token = Some(token);
            state.user = Some(user);
        }
        tracing::info!(user_id = %user_id, "Session established");
        self.publish(Some(user_id));
        Ok(())
    }

    /// Drop identity and credential, removing the persisted token
    pub fn clear(&self) {
        let had_user = {
            let mut state = self.inner.state.write();
            let had = state.user.is_some() || state.token.is_some();
            *state = SessionState::default();
            had
        };
        if let Err(e) = self.inner.store.delete() {
            tracing::warn!("Failed to delete stored token: {}", e);
        }
        if had_user {
            tracing::info!("Session cleared");
        }
        self.publish(None);
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.read().user.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.state.read().user.as_ref().map(|u| u.id.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.inner.state.read();
        state.token.is_some() && state.user.is_some()
    }

    pub fn require_user(&self) -> Result<User, AppError> {
        self.user().ok_or_else(AppError::not_authenticated)
    }

    /// Current user, if it has `role`
    pub fn require_role(&self, role: Role) -> Result<User, AppError> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(AppError::role_required(role.as_str(), user.role.as_str()));
        }
        Ok(user)
    }

    /// Token persisted by a previous run
    pub fn stored_token(&self) -> ClientResult<Option<String>> {
        self.inner.store.load()
    }

    /// Observe the current user id; changes on establish and clear
    pub fn watch(&self) -> watch::Receiver<Option<String>> {
        self.inner.user_tx.subscribe()
    }

    fn publish(&self, user_id: Option<String>) {
        self.inner.user_tx.send_if_modified(|current| {
            if *current == user_id {
                false
            } else {
                *current = user_id;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.into(),
            email: format!("{id}@example.com"),
            name: id.into(),
            phone: String::new(),
            role,
            address: None,
            created_at: None,
        }
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"access_token\""));

        store.delete().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Deleting twice is fine
        store.delete().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileTokenStore::new(path);
        assert!(matches!(store.load(), Err(ClientError::Storage(_))));
    }

    #[test]
    fn test_establish_and_clear() {
        let session = SessionContext::in_memory();
        assert!(!session.is_authenticated());
        assert_eq!(
            session.require_user().unwrap_err().code,
            ErrorCode::NotAuthenticated
        );

        session.establish("t1", user("f1", Role::Farmer)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("t1"));
        assert_eq!(session.stored_token().unwrap().as_deref(), Some("t1"));
        assert_eq!(session.require_role(Role::Farmer).unwrap().id, "f1");

        let err = session.require_role(Role::Buyer).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleRequired);

        session.clear();
        assert!(session.user().is_none());
        assert_eq!(session.stored_token().unwrap(), None);
    }

    #[test]
    fn test_watch_sees_user_changes() {
        let session = SessionContext::in_memory();
        let mut rx = session.watch();
        assert_eq!(*rx.borrow(), None);

        session.establish("t1", user("b1", Role::Buyer)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_deref(), Some("b1"));

        // Same user again is not a change
        session.establish("t2", user("b1", Role::Buyer)).unwrap();
        assert!(!rx.has_changed().unwrap());

        session.clear();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), None);
    }
}
