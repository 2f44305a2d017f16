use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Keys of everything dailysong persists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    AccessToken,
    AuthState,
    CodeVerifier,
    PhoneNumber,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::AccessToken,
        StoreKey::AuthState,
        StoreKey::CodeVerifier,
        StoreKey::PhoneNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::AccessToken => "spotify_access_token",
            StoreKey::AuthState => "spotify_auth_state",
            StoreKey::CodeVerifier => "spotify_code_verifier",
            StoreKey::PhoneNumber => "user_phone",
        }
    }
}

/// Small asynchronous key/value store for credentials and settings.
///
/// Every `set` replaces the previous value as a whole; readers never observe
/// a partially written value.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> Result<Option<String>>;
    async fn set(&self, key: StoreKey, value: &str) -> Result<()>;
    async fn remove(&self, key: StoreKey) -> Result<()>;

    /// Removes the authorization material, keeping user settings.
    async fn clear(&self) -> Result<()> {
        self.remove(StoreKey::AccessToken).await?;
        self.remove(StoreKey::AuthState).await?;
        self.remove(StoreKey::CodeVerifier).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StoreKey, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Store("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        self.lock()?.remove(&key);
        Ok(())
    }
}

/// JSON file backed store, shared by every dailysong process of the user.
///
/// An unreadable file counts as empty and is replaced on the next write, so
/// `logout` always works.
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        crate::config::data_dir().join("store.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                log::warn!(
                    "ignoring unreadable credential store {}: {}",
                    self.path.display(),
                    e
                );
                Ok(HashMap::new())
            }
        }
    }

    // write-then-rename so a crash never leaves a half-written file behind
    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) + Send,
    {
        let _guard = self.guard.lock().await;
        let mut entries = self.read_all().await?;
        f(&mut entries);
        self.write_all(&entries).await
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key.as_str()))
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
        .await
    }
}
