//! Key/value persistence over browser local storage.
//!
//! Everything the game remembers between sessions (settings, unlock flags,
//! achievement records, endless progression) goes through [`KeyValueStore`].
//! Reads are forgiving: a missing key or malformed JSON is treated as "no
//! value" and callers fall back to defaults.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;

pub const KEY_ACHIEVEMENTS: &str = "echomaze_achievements";
pub const KEY_ACHIEVEMENT_STATS: &str = "echomaze_achievement_stats";
pub const KEY_ENDLESS: &str = "echomaze_endless";
pub const KEY_MOVEMENT_AUDIO: &str = "echomaze_setting_movement_audio";
pub const KEY_AUTO_MOVEMENT: &str = "echomaze_setting_auto_movement";
pub const KEY_SIMPLIFIED_UI: &str = "echomaze_setting_simplified_ui";
pub const KEY_MASTER_VOLUME: &str = "echomaze_setting_master_volume";
pub const KEY_GOD_MODE: &str = "echomaze_god_mode";

/// Unlock flag key for a cosmetic skin.
pub fn skin_key(skin_id: &str) -> String {
    format!("echomaze_skin_unlocked_{skin_id}")
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable")]
    Unavailable,
    #[error("write rejected for {key}: {reason}")]
    Rejected { key: String, reason: String },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str);
}

/// In-process store used on the host and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// `window.localStorage` backed store.
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    /// Returns `None` when local storage is disabled or there is no window.
    pub fn open() -> Option<Self> {
        let win = web_sys::window()?;
        match win.local_storage() {
            Ok(Some(storage)) => Some(Self { storage }),
            _ => None,
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected { key: key.to_string(), reason: format!("{e:?}") })
    }

    fn remove(&mut self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            log::warn!("failed to remove {key}: {e:?}");
        }
    }
}

/// Reads and decodes a JSON value. Missing and malformed entries both yield `None`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("discarding malformed value under {key}: {e}");
            None
        }
    }
}

pub fn try_save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Best-effort write; failures are logged and reported as `false`.
pub fn save_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    match try_save_json(store, key, value) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to persist {key}: {e}");
            false
        }
    }
}

pub fn load_flag(store: &dyn KeyValueStore, key: &str) -> Option<bool> {
    store.get(key).map(|v| v == "1" || v == "true")
}

pub fn save_flag(store: &mut dyn KeyValueStore, key: &str, value: bool) {
    if let Err(e) = store.set(key, if value { "true" } else { "false" }) {
        log::warn!("failed to persist {key}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        a: u32,
    }

    #[test]
    fn malformed_json_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert_eq!(load_json::<Blob>(&store, "k"), None);
        assert_eq!(load_json::<Blob>(&store, "absent"), None);
    }

    #[test]
    fn json_and_flags_persist() {
        let mut store = MemoryStore::new();
        assert!(save_json(&mut store, "k", &Blob { a: 7 }));
        assert_eq!(load_json::<Blob>(&store, "k"), Some(Blob { a: 7 }));

        save_flag(&mut store, "f", true);
        assert_eq!(load_flag(&store, "f"), Some(true));
        store.set("f", "1").unwrap();
        assert_eq!(load_flag(&store, "f"), Some(true));
        store.set("f", "0").unwrap();
        assert_eq!(load_flag(&store, "f"), Some(false));
        store.remove("f");
        assert_eq!(load_flag(&store, "f"), None);
    }
}
