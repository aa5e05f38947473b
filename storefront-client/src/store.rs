//! Token and identity persistence
//!
//! [`TokenStore`] is a scoped wrapper over a [`StorageBackend`]: it knows the
//! three storage keys and nothing else — no validation, no network access.
//! Backends must apply multi-key writes and removals as one unit so no
//! reader observes a torn access/refresh pair.

use shared::UserInfo;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the cached user profile
pub const USER_KEY: &str = "user";

/// Persistence backend for the token store.
///
/// `put_all` and `remove_all` apply every entry under one lock so a
/// concurrent reader sees either the old state or the new state, never a
/// mixture.
pub trait StorageBackend: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a batch of entries as one unit.
    fn put_all(&self, entries: &[(&str, &str)]) -> io::Result<()>;
    /// Remove a batch of keys as one unit.
    fn remove_all(&self, keys: &[&str]) -> io::Result<()>;
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-process backend, the default. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn put_all(&self, entries: &[(&str, &str)]) -> io::Result<()> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> io::Result<()> {
        let mut map = self.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// File-backed storage: one JSON document holding all entries.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    /// Create a file backend at `{base_path}/{filename}`
    pub fn new(base_path: impl Into<PathBuf>, filename: &str) -> Self {
        Self {
            path: base_path.into().join(filename),
            guard: Mutex::new(()),
        }
    }

    /// The document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn load(&self) -> HashMap<String, String> {
        if !self.path.exists() {
            return HashMap::new();
        }
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn save(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        self.load().get(key).cloned()
    }

    fn put_all(&self, entries: &[(&str, &str)]) -> io::Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load();
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&map)
    }

    fn remove_all(&self, keys: &[&str]) -> io::Result<()> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load();
        for key in keys {
            map.remove(*key);
        }
        self.save(&map)
    }
}

// ============================================================================
// Token store
// ============================================================================

/// Scoped accessor for the access token, refresh token and cached profile.
///
/// Backend write failures are logged and otherwise ignored — the in-memory
/// session stays usable even when persistence is broken.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn StorageBackend>,
}

impl TokenStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Create a store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Current access token
    pub fn access_token(&self) -> Option<String> {
        self.backend.get(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> Option<String> {
        self.backend.get(REFRESH_TOKEN_KEY)
    }

    /// Cached user profile
    pub fn identity(&self) -> Option<UserInfo> {
        let json = self.backend.get(USER_KEY)?;
        serde_json::from_str(&json).ok()
    }

    /// Store a new access/refresh pair. The pair is written as one unit.
    pub fn set_tokens(&self, access: &str, refresh: &str) {
        if let Err(e) = self
            .backend
            .put_all(&[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)])
        {
            tracing::warn!("failed to persist tokens: {}", e);
        }
    }

    /// Replace the access token only, keeping the stored refresh token.
    pub fn set_access_token(&self, access: &str) {
        if let Err(e) = self.backend.put_all(&[(ACCESS_TOKEN_KEY, access)]) {
            tracing::warn!("failed to persist access token: {}", e);
        }
    }

    /// Cache the user profile
    pub fn set_identity(&self, user: &UserInfo) {
        match serde_json::to_string(user) {
            Ok(json) => {
                if let Err(e) = self.backend.put_all(&[(USER_KEY, &json)]) {
                    tracing::warn!("failed to persist user profile: {}", e);
                }
            }
            Err(e) => tracing::warn!("failed to encode user profile: {}", e),
        }
    }

    /// Remove all three entries as one unit.
    pub fn clear(&self) {
        if let Err(e) = self
            .backend
            .remove_all(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
        {
            tracing::warn!("failed to clear stored session: {}", e);
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_access_token", &self.access_token().is_some())
            .field("has_refresh_token", &self.refresh_token().is_some())
            .finish()
    }
}
