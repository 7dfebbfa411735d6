// Player-facing settings, one storage key per field.

use crate::storage::{
    KEY_AUTO_MOVEMENT, KEY_GOD_MODE, KEY_MASTER_VOLUME, KEY_MOVEMENT_AUDIO, KEY_SIMPLIFIED_UI,
    KeyValueStore, load_flag, save_flag,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub movement_audio: bool,
    /// Held movement keys repeat steps on every tick when on.
    pub auto_movement: bool,
    pub simplified_ui: bool,
    /// 0.0..=1.0
    pub master_volume: f32,
    /// Debug flag; blocks non-secret achievement unlocks while set.
    pub god_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            movement_audio: true,
            auto_movement: true,
            simplified_ui: false,
            master_volume: 0.7,
            god_mode: false,
        }
    }
}

impl Settings {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let d = Self::default();
        let master_volume = store
            .get(KEY_MASTER_VOLUME)
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .unwrap_or(d.master_volume);
        Self {
            movement_audio: load_flag(store, KEY_MOVEMENT_AUDIO).unwrap_or(d.movement_audio),
            auto_movement: load_flag(store, KEY_AUTO_MOVEMENT).unwrap_or(d.auto_movement),
            simplified_ui: load_flag(store, KEY_SIMPLIFIED_UI).unwrap_or(d.simplified_ui),
            master_volume,
            god_mode: load_flag(store, KEY_GOD_MODE).unwrap_or(d.god_mode),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        save_flag(store, KEY_MOVEMENT_AUDIO, self.movement_audio);
        save_flag(store, KEY_AUTO_MOVEMENT, self.auto_movement);
        save_flag(store, KEY_SIMPLIFIED_UI, self.simplified_ui);
        save_flag(store, KEY_GOD_MODE, self.god_mode);
        if let Err(e) = store.set(KEY_MASTER_VOLUME, &format!("{:.2}", self.master_volume)) {
            log::warn!("failed to persist volume: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_when_store_is_empty_or_garbage() {
        let mut store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
        store.set(KEY_MASTER_VOLUME, "loud").unwrap();
        assert_eq!(Settings::load(&store).master_volume, 0.7);
        store.set(KEY_MASTER_VOLUME, "3.5").unwrap();
        assert_eq!(Settings::load(&store).master_volume, 1.0);
    }

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        let s = Settings { auto_movement: false, god_mode: true, master_volume: 0.25, ..Settings::default() };
        s.save(&mut store);
        assert_eq!(Settings::load(&store), s);
    }
}
