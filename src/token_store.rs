use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DriveMcpError, Result};

/// One user's delegated-access grant, persisted across process runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredCredential {
    /// A token with no recorded expiry is treated as expired, which routes
    /// it through the refresh path rather than trusting it blindly.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }
}

/// Disk-backed credential store: one JSON token object at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Missing file means no credential yet; a file that fails to parse is
    /// reported as a store error rather than silently discarded.
    pub fn load(&self) -> Result<Option<StoredCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let cred =
            serde_json::from_str(&raw).map_err(|e| DriveMcpError::TokenStore {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(cred))
    }

    pub fn save(&self, cred: &StoredCredential) -> Result<()> {
        let raw = serde_json::to_string_pretty(cred)?;
        std::fs::write(&self.path, raw).map_err(|e| DriveMcpError::TokenStore {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn sample(expiry: Option<DateTime<Utc>>) -> StoredCredential {
        StoredCredential {
            access_token: "ya29.sample".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry,
            scopes: vec![crate::config::DRIVE_SCOPE.to_string()],
        }
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let now = Utc::now();
        store.save(&sample(Some(now))).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "ya29.sample");
        assert_eq!(loaded.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(loaded.expiry, Some(now));
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();
        let store = TokenStore::new(path);
        assert!(matches!(
            store.load(),
            Err(DriveMcpError::TokenStore { .. })
        ));
    }

    #[test]
    fn expiry_check() {
        let now = Utc::now();
        assert!(sample(None).is_expired(now));
        assert!(sample(Some(now - Duration::seconds(1))).is_expired(now));
        assert!(!sample(Some(now + Duration::hours(1))).is_expired(now));
    }
}
