mod error;
mod format;

pub use error::StoreError;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use janitor_types::models::{CommunityId, PolicyRecord};

use crate::format::{PolicyFile, StoredPolicy};

/// Durable per-community policy records backed by a single JSON file.
///
/// Every mutation rewrites the whole file while holding the lock, so
/// concurrent writers never interleave. A failed write is reported but the
/// in-memory change is kept.
pub struct PolicyStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    records: BTreeMap<CommunityId, PolicyRecord>,
    extra: serde_json::Map<String, serde_json::Value>,
}

impl PolicyStore {
    /// Load the policy file. A missing file yields an empty store; a
    /// malformed one is an error so it never gets overwritten blindly.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<PolicyFile>(&raw).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Policy file {} not found, starting empty", path.display());
                PolicyFile::default()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut records = BTreeMap::new();
        for (key, stored) in file.guilds {
            let id = key
                .parse::<CommunityId>()
                .map_err(|_| StoreError::InvalidCommunity(key.clone()))?;
            records.insert(id, stored.into_record());
        }

        info!("Loaded {} community policies from {}", records.len(), path.display());
        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                records,
                extra: file.extra,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Policy for one community, `None` until the wizard has run there.
    pub fn get(&self, community: CommunityId) -> Result<Option<PolicyRecord>, StoreError> {
        Ok(self.lock()?.records.get(&community).cloned())
    }

    /// Snapshot of every known community and its policy.
    pub fn communities(&self) -> Result<Vec<(CommunityId, PolicyRecord)>, StoreError> {
        Ok(self
            .lock()?
            .records
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    /// Mutate one community's record, creating it if needed, then persist.
    /// Fields the closure does not touch are preserved.
    pub fn update<F, T>(&self, community: CommunityId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PolicyRecord) -> T,
    {
        let mut inner = self.lock()?;
        let out = f(inner.records.entry(community).or_default());
        write_file(&self.path, &inner)?;
        Ok(out)
    }

    /// Flip the deletion switch. Returns `false` without touching the file
    /// when it is already in the requested position.
    pub fn set_enabled(&self, community: CommunityId, enabled: bool) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let current = inner.records.get(&community).is_some_and(|r| r.is_enabled());
        if current == enabled {
            return Ok(false);
        }
        inner.records.entry(community).or_default().enabled = Some(enabled);
        write_file(&self.path, &inner)?;
        Ok(true)
    }

    /// Rewrite the file from the current in-memory state.
    pub fn save(&self) -> Result<(), StoreError> {
        let inner = self.lock()?;
        write_file(&self.path, &inner)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn write_file(path: &Path, inner: &Inner) -> Result<(), StoreError> {
    let file = PolicyFile {
        guilds: inner
            .records
            .iter()
            .map(|(id, record)| (id.to_string(), StoredPolicy::from(record)))
            .collect(),
        extra: inner.extra.clone(),
    };
    let body = serde_json::to_string_pretty(&file)?;

    // Write to a sibling and rename so a crash never leaves a truncated file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use janitor_types::models::{ChannelId, RoleId};

    fn temp_store() -> (tempfile::TempDir, PolicyStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PolicyStore::open(dir.path().join("config.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_opens_empty() {
        let (_dir, store) = temp_store();
        assert!(store.communities().unwrap().is_empty());
        assert_eq!(store.get(CommunityId(1)).unwrap(), None);
    }

    #[test]
    fn update_creates_record_and_persists() {
        let (dir, store) = temp_store();
        store
            .update(CommunityId(5), |r| r.log_channel_id = Some(ChannelId(9)))
            .unwrap();

        let reopened = PolicyStore::open(dir.path().join("config.json")).unwrap();
        let record = reopened.get(CommunityId(5)).unwrap().unwrap();
        assert_eq!(record.log_channel_id, Some(ChannelId(9)));
        assert_eq!(record.enabled, None);
    }

    #[test]
    fn update_preserves_other_fields() {
        let (_dir, store) = temp_store();
        store
            .update(CommunityId(1), |r| r.moderator_role_id = Some(RoleId(3)))
            .unwrap();
        store.set_enabled(CommunityId(1), true).unwrap();

        let record = store.get(CommunityId(1)).unwrap().unwrap();
        assert_eq!(record.moderator_role_id, Some(RoleId(3)));
        assert_eq!(record.enabled, Some(true));
    }

    #[test]
    fn unchanged_switch_skips_the_write() {
        let (dir, store) = temp_store();
        let path = dir.path().join("config.json");

        assert!(!store.set_enabled(CommunityId(1), false).unwrap());
        assert!(!path.exists());
        assert_eq!(store.get(CommunityId(1)).unwrap(), None);

        assert!(store.set_enabled(CommunityId(1), true).unwrap());
        fs::remove_file(&path).unwrap();
        assert!(!store.set_enabled(CommunityId(1), true).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn legacy_file_is_normalized_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"GUILDS":{"77":{"DELETE_ENABLED":"True","MESSAGE_AGE_LIMIT":90}},"BOT_TOKEN":"t"}"#,
        )
        .unwrap();

        let store = PolicyStore::open(&path).unwrap();
        assert!(store.get(CommunityId(77)).unwrap().unwrap().is_enabled());
        store.save().unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["GUILDS"]["77"]["DELETE_ENABLED"], serde_json::Value::Bool(true));
        assert_eq!(raw["BOT_TOKEN"], "t");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PolicyStore::open(&path), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so every write fails.
        let store = PolicyStore::open(dir.path().join("missing").join("config.json")).unwrap();

        let result = store.set_enabled(CommunityId(2), true);
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert!(store.get(CommunityId(2)).unwrap().unwrap().is_enabled());
    }
}
