/*
[INPUT]:  Token keys and token strings
[OUTPUT]: Durable or in-memory token persistence
[POS]:    Auth layer - token storage shared by client and sign-in flow
[UPDATE]: When adding storage backends or changing the file format
*/

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use crate::http::{Result, SandwatchError};
use crate::types::{TokenKey, TokenPair};

/// Key-value storage for the access and refresh tokens.
///
/// Stores never check expiry; that is the caller's job.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: TokenKey) -> Result<Option<String>>;

    async fn set(&self, key: TokenKey, token: &str) -> Result<()>;

    async fn remove(&self, key: TokenKey) -> Result<()>;

    /// Read both tokens
    async fn load_pair(&self) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.get(TokenKey::AccessToken).await?,
            refresh: self.get(TokenKey::RefreshToken).await?,
        })
    }

    /// Write whichever tokens are present
    async fn save_pair(&self, pair: &TokenPair) -> Result<()> {
        if let Some(access) = &pair.access {
            self.set(TokenKey::AccessToken, access).await?;
        }
        if let Some(refresh) = &pair.refresh {
            self.set(TokenKey::RefreshToken, refresh).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        for key in TokenKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Process-local token store
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    data: Arc<RwLock<HashMap<TokenKey, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given pair
    pub fn with_pair(pair: &TokenPair) -> Self {
        let mut data = HashMap::new();
        if let Some(access) = &pair.access {
            data.insert(TokenKey::AccessToken, access.clone());
        }
        if let Some(refresh) = &pair.refresh {
            data.insert(TokenKey::RefreshToken, refresh.clone());
        }
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    fn lock_error() -> SandwatchError {
        SandwatchError::Storage(std::io::Error::other("token store lock poisoned"))
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let guard = self.data.read().map_err(|_| Self::lock_error())?;
        Ok(guard.get(&key).cloned())
    }

    async fn set(&self, key: TokenKey, token: &str) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| Self::lock_error())?;
        guard.insert(key, token.to_string());
        Ok(())
    }

    async fn remove(&self, key: TokenKey) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| Self::lock_error())?;
        guard.remove(&key);
        Ok(())
    }
}

/// Token store persisted as a single JSON object on disk.
///
/// The file is read once on open; every write replaces it atomically.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content).map_err(|e| {
                SandwatchError::Storage(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("corrupted token file {}: {e}", path.display()),
                ))
            })?
        } else {
            HashMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "token store opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, json.as_bytes()))
            .await
            .map_err(|e| SandwatchError::Storage(std::io::Error::other(e)))??;

        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: TokenKey) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key.as_str()).cloned())
    }

    async fn set(&self, key: TokenKey, token: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let mut updated = entries.clone();
        updated.insert(key.as_str().to_string(), token.to_string());
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }

    async fn remove(&self, key: TokenKey) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key.as_str()) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key.as_str());
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut temp_file = NamedTempFile::new_in(&parent)?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file.as_file().metadata()?.permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms)?;
    }

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
