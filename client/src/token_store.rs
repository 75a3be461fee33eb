use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Access and refresh token issued at login
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Durable key-value storage for the token pair.
///
/// Implementations must tolerate `clear` on an empty store.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<TokenPair>, StoreError>;

    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

fn pair_from(entries: &BTreeMap<String, String>) -> Option<TokenPair> {
    Some(TokenPair {
        access_token: entries.get(ACCESS_TOKEN_KEY)?.clone(),
        refresh_token: entries.get(REFRESH_TOKEN_KEY)?.clone(),
    })
}

fn insert_pair(entries: &mut BTreeMap<String, String>, tokens: &TokenPair) {
    entries.insert(ACCESS_TOKEN_KEY.to_string(), tokens.access_token.clone());
    entries.insert(REFRESH_TOKEN_KEY.to_string(), tokens.refresh_token.clone());
}

fn remove_pair(entries: &mut BTreeMap<String, String>) {
    entries.remove(ACCESS_TOKEN_KEY);
    entries.remove(REFRESH_TOKEN_KEY);
}

/// Tokens kept in a JSON object on disk.
///
/// Keys other than the two token keys are preserved. Writes go through a
/// sibling temp file and a rename so a crash never leaves half a file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        Ok(pair_from(&self.read_entries()?))
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        let mut entries = self.read_entries()?;
        insert_pair(&mut entries, tokens);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        // An unreadable file still has to go, otherwise stale tokens survive logout
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(StoreError::Json(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        remove_pair(&mut entries);
        self.write_entries(&entries)
    }
}

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pair_from(&entries))
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        insert_pair(&mut entries, tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        remove_pair(&mut entries);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
        }
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("tokens.json"));

        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tokens.json");

        FileTokenStore::new(&path).save(&pair("acc", "ref")).unwrap();
        let reopened = FileTokenStore::new(&path);

        assert_eq!(reopened.load().unwrap(), Some(pair("acc", "ref")));
    }

    #[test]
    fn test_file_store_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        FileTokenStore::new(&path).save(&pair("acc", "ref")).unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(raw.get("access_token").map(String::as_str), Some("acc"));
        assert_eq!(raw.get("refresh_token").map(String::as_str), Some("ref"));
    }

    #[test]
    fn test_file_store_clear_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"theme":"dark","access_token":"a","refresh_token":"r"}"#).unwrap();
        let store = FileTokenStore::new(&path);

        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(fs::read_to_string(&path).unwrap().contains("theme"));
    }

    #[test]
    fn test_file_store_clear_removes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = FileTokenStore::new(&path);
        store.save(&pair("acc", "ref")).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_clear_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileTokenStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_partial_pair_is_absent() {
        let store = MemoryTokenStore::new();
        store
            .entries
            .lock()
            .unwrap()
            .insert(ACCESS_TOKEN_KEY.to_string(), "acc".to_string());

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", pair("secret-access", "secret-refresh"));

        assert!(!rendered.contains("secret"));
    }
}
