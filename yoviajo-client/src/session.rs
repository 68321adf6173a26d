use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use yoviajo_core::{User, Viewer};
use yoviajo_shared::{LogoutReason, Masked, SessionEvent};

use crate::error::{ClientError, ClientResult};

/// What is persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: Masked<String>,
    pub user: User,
}

impl StoredSession {
    fn from_json(raw: &str) -> ClientResult<Self> {
        serde_json::from_str(raw).map_err(|e| ClientError::Decode(e.to_string()))
    }

    fn to_json(&self) -> ClientResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ClientError::Storage(e.to_string()))
    }
}

// ============================================================================
// Storage backends
// ============================================================================

/// Persistence for the session. `load` returns `ClientError::Decode` when
/// something is stored but cannot be read back.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> ClientResult<Option<StoredSession>>;
    async fn save(&self, session: &StoredSession) -> ClientResult<()>;
    async fn clear(&self) -> ClientResult<()>;
}

/// JSON file on disk, written atomically through a temp file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> ClientResult<Option<StoredSession>> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => StoredSession::from_json(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    async fn save(&self, session: &StoredSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let json = session.to_json()?;
        let temp = self.temp_path();
        write_private(&temp, json.as_bytes()).await.map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::rename(&temp, &self.path).await.map_err(|e| ClientError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

/// Write `bytes` to a fresh file readable only by the owner (0600 on unix).
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// In-process store holding the same JSON a file would.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    raw: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with arbitrary stored text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Mutex::new(Some(raw.into())) }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|guard| guard.clone())
    }

    fn set(&self, value: Option<String>) -> ClientResult<()> {
        let mut guard = self.raw.lock().map_err(|_| ClientError::Storage("session lock poisoned".into()))?;
        *guard = value;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> ClientResult<Option<StoredSession>> {
        match self.raw() {
            Some(raw) => StoredSession::from_json(&raw).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &StoredSession) -> ClientResult<()> {
        self.set(Some(session.to_json()?))
    }

    async fn clear(&self) -> ClientResult<()> {
        self.set(None)
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Sole owner of the bearer credential. Every identity change is published
/// as a `SessionEvent`.
pub struct SessionManager {
    store: Box<dyn SessionStore>,
    current: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Start logged out, without touching the store.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self { store, current: RwLock::new(None), events }
    }

    /// Rebuild the session from storage. Stored identity is trusted as-is;
    /// unreadable data is cleared and the manager starts logged out.
    pub async fn restore(store: Box<dyn SessionStore>) -> Self {
        let manager = Self::new(store);
        match manager.store.load().await {
            Ok(Some(session)) => {
                info!("Restored session for user {}", session.user.id);
                *manager.current.write().await = Some(session);
            }
            Ok(None) => {}
            Err(ClientError::Decode(e)) => {
                warn!("Discarding unreadable stored session: {}", e);
                if let Err(e) = manager.store.clear().await {
                    warn!("Failed to clear stored session: {}", e);
                }
                manager.publish(SessionEvent::LoggedOut { reason: LogoutReason::CorruptStorage, at: Utc::now() });
            }
            Err(e) => warn!("Could not read stored session: {}", e),
        }
        manager
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn login(&self, token: Masked<String>, user: User) -> ClientResult<()> {
        let session = StoredSession { token, user };
        self.store.save(&session).await?;

        info!("Logged in as user {} ({})", session.user.id, session.user.role.as_code());
        let event = SessionEvent::LoggedIn {
            user_id: session.user.id,
            role: session.user.role.as_code().to_string(),
            at: Utc::now(),
        };
        *self.current.write().await = Some(session);
        self.publish(event);
        Ok(())
    }

    /// Clear identity and credential from memory and storage.
    pub async fn logout(&self, reason: LogoutReason) -> ClientResult<()> {
        let previous = self.current.write().await.take();
        let cleared = self.store.clear().await;

        if previous.is_some() {
            info!("Logged out ({:?})", reason);
            self.publish(SessionEvent::LoggedOut { reason, at: Utc::now() });
        }
        cleared
    }

    /// Replace the cached identity, e.g. after a profile update.
    pub async fn update_user(&self, user: User) -> ClientResult<()> {
        let mut guard = self.current.write().await;
        if let Some(session) = guard.as_mut() {
            session.user = user;
            self.store.save(session).await?;
        }
        Ok(())
    }

    pub async fn token(&self) -> Option<Masked<String>> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn viewer(&self) -> Viewer {
        Viewer { identity: self.current_user().await }
    }
}
