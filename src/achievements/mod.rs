//! Achievement tracking.
//!
//! Every [`GameEvent`] goes through [`AchievementEngine::check_achievements`]:
//! the persisted stats bag is loaded, the matching handler updates counters
//! and unlocks whatever thresholds were crossed, composite achievements are
//! re-derived from the unlocked set, and the stats are written back whether
//! or not anything unlocked.
//!
//! Unlocks never roll back. The notification outbox and the cosmetic unlock
//! are side effects whose failure only gets logged.

pub mod catalog;
pub mod events;
pub mod stats;

pub use catalog::{ACHIEVEMENTS, AchievementDef, Tier};
pub use events::GameEvent;
pub use stats::AchievementStats;

use crate::storage::{
    KEY_ACHIEVEMENT_STATS, KEY_ACHIEVEMENTS, KeyValueStore, StorageError, load_json, save_json,
    skin_key,
};
use catalog::*;
use serde::{Deserialize, Serialize};

/// Final campaign level; completing it is the escape ending.
pub const FINAL_LEVEL: u32 = 10;
pub const SPEEDRUN_MS: u64 = 60_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRecord {
    pub id: String,
    pub unlocked_at: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AchievementNotification {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: Tier,
}

/// Optional capability for granting cosmetics tied to achievements.
pub trait CosmeticUnlocker {
    fn unlock_cosmetic(
        &mut self,
        store: &mut dyn KeyValueStore,
        cosmetic_id: &str,
    ) -> Result<(), StorageError>;
}

/// Marks skins as owned through their storage flag.
#[derive(Debug, Default)]
pub struct StoredSkinUnlocker;

impl CosmeticUnlocker for StoredSkinUnlocker {
    fn unlock_cosmetic(
        &mut self,
        store: &mut dyn KeyValueStore,
        cosmetic_id: &str,
    ) -> Result<(), StorageError> {
        store.set(&skin_key(cosmetic_id), "true")
    }
}

pub struct AchievementEngine {
    records: Vec<UnlockRecord>,
    god_mode: bool,
    cosmetics: Option<Box<dyn CosmeticUnlocker>>,
    outbox: Vec<AchievementNotification>,
}

impl AchievementEngine {
    pub fn load(store: &dyn KeyValueStore, cosmetics: Option<Box<dyn CosmeticUnlocker>>) -> Self {
        let mut records: Vec<UnlockRecord> = load_json(store, KEY_ACHIEVEMENTS).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        records.retain(|r| seen.insert(r.id.clone()));
        Self { records, god_mode: false, cosmetics, outbox: Vec::new() }
    }

    pub fn set_god_mode(&mut self, on: bool) {
        self.god_mode = on;
    }

    pub fn records(&self) -> &[UnlockRecord] {
        &self.records
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// (unlocked catalog entries, catalog size)
    pub fn progress(&self) -> (usize, usize) {
        let unlocked = ACHIEVEMENTS.iter().filter(|d| self.is_unlocked(d.id)).count();
        (unlocked, ACHIEVEMENTS.len())
    }

    pub fn stats(&self, store: &dyn KeyValueStore) -> AchievementStats {
        load_json(store, KEY_ACHIEVEMENT_STATS).unwrap_or_default()
    }

    pub fn drain_notifications(&mut self) -> Vec<AchievementNotification> {
        std::mem::take(&mut self.outbox)
    }

    /// Records an unlock. Returns false for unknown ids, repeats, and
    /// non-secret achievements while god mode is on.
    pub fn unlock_achievement(
        &mut self,
        store: &mut dyn KeyValueStore,
        id: &str,
        now: u64,
    ) -> bool {
        let Some(def) = catalog::find(id) else {
            return false;
        };
        if self.is_unlocked(def.id) {
            return false;
        }
        if self.god_mode && !def.secret {
            log::debug!("god mode: skipping unlock of {}", def.id);
            return false;
        }
        self.records.push(UnlockRecord { id: def.id.to_string(), unlocked_at: now });
        save_json(store, KEY_ACHIEVEMENTS, &self.records);
        log::info!("achievement unlocked: {} ({})", def.name, def.id);

        self.outbox.push(AchievementNotification {
            id: def.id,
            name: def.name,
            description: def.description,
            tier: def.tier,
        });
        if let (Some(skin), Some(cosmetics)) = (def.skin, self.cosmetics.as_mut()) {
            if let Err(e) = cosmetics.unlock_cosmetic(store, skin) {
                log::warn!("skin {skin} for {} not granted: {e}", def.id);
            }
        }
        true
    }

    /// Wipes unlock records and stats.
    pub fn reset_achievements(&mut self, store: &mut dyn KeyValueStore) {
        self.records.clear();
        self.outbox.clear();
        store.remove(KEY_ACHIEVEMENTS);
        store.remove(KEY_ACHIEVEMENT_STATS);
    }

    /// Routes one event; returns the ids unlocked by it.
    pub fn check_achievements(
        &mut self,
        store: &mut dyn KeyValueStore,
        event: &GameEvent,
        now: u64,
    ) -> Vec<&'static str> {
        let mut stats = self.stats(store);
        let before = self.records.len();
        log::debug!("achievement event {}", event.name());

        match event {
            GameEvent::LevelComplete { level, time_ms, deathless, no_abilities } => {
                stats.levels_completed += 1;
                if *deathless {
                    stats.current_deathless_streak += 1;
                    stats.best_deathless_streak =
                        stats.best_deathless_streak.max(stats.current_deathless_streak);
                } else {
                    stats.current_deathless_streak = 0;
                }
                self.unlock_achievement(store, FIRST_STEPS, now);
                if *time_ms < SPEEDRUN_MS {
                    self.unlock_achievement(store, SPEEDRUNNER, now);
                }
                if *deathless {
                    self.unlock_achievement(store, UNTOUCHABLE, now);
                }
                if *no_abilities {
                    self.unlock_achievement(store, PURIST, now);
                }
                if stats.current_deathless_streak >= 3 {
                    self.unlock_achievement(store, HOT_STREAK, now);
                }
                if stats.current_deathless_streak >= 10 {
                    self.unlock_achievement(store, FLAWLESS, now);
                }
                if *level >= FINAL_LEVEL {
                    self.unlock_achievement(store, ENDING_ESCAPE, now);
                }
            }
            GameEvent::Death => {
                stats.total_deaths += 1;
                stats.current_deathless_streak = 0;
                stats.perfect_wave_streak = 0;
                self.unlock_achievement(store, FIRST_DEATH, now);
                if stats.total_deaths >= 10 {
                    self.unlock_achievement(store, PERSISTENT, now);
                }
                if stats.total_deaths >= 50 {
                    self.unlock_achievement(store, UNDYING_WILL, now);
                }
            }
            GameEvent::ShieldReflect => {
                stats.shield_reflects += 1;
                self.unlock_achievement(store, FIRST_REFLECT, now);
                if stats.shield_reflects >= 25 {
                    self.unlock_achievement(store, SHIELD_MASTER, now);
                }
            }
            GameEvent::EndlessWave { wave, perfect_wave } => {
                stats.best_endless_wave = stats.best_endless_wave.max(*wave);
                if *perfect_wave {
                    stats.perfect_wave_streak += 1;
                } else {
                    stats.perfect_wave_streak = 0;
                }
                for (threshold, id) in [(10, ENDLESS_10), (25, ENDLESS_25), (50, ENDLESS_50)] {
                    if *wave >= threshold {
                        self.unlock_achievement(store, id, now);
                    }
                }
                if stats.perfect_wave_streak >= 5 {
                    self.unlock_achievement(store, PERFECT_WAVES, now);
                }
            }
            GameEvent::EndlessSurvival => {
                self.unlock_achievement(store, SURVIVOR, now);
            }
            GameEvent::GeneratorPerfect => {
                stats.perfect_generators += 1;
                self.unlock_achievement(store, MECHANIC, now);
                if stats.perfect_generators >= 50 {
                    self.unlock_achievement(store, PERFECTIONIST, now);
                }
            }
            GameEvent::SecretFound { secret_id } => {
                stats.secrets_found.insert(secret_id.clone());
                if let Some(id) = catalog::achievement_for_secret(secret_id) {
                    self.unlock_achievement(store, id, now);
                }
                if stats.secrets_found.len() >= 5 {
                    self.unlock_achievement(store, SECRET_HUNTER, now);
                }
            }
            GameEvent::AbilityUsed => {
                stats.abilities_used += 1;
                self.unlock_achievement(store, EMPOWERED, now);
                if stats.abilities_used >= 50 {
                    self.unlock_achievement(store, POWER_HUNGRY, now);
                }
            }
            GameEvent::TrapCatch => {
                stats.trap_catches += 1;
                self.unlock_achievement(store, TRAPPER, now);
                if stats.trap_catches >= 25 {
                    self.unlock_achievement(store, MASTER_TRAPPER, now);
                }
            }
        }

        self.check_composites(store, now);
        save_json(store, KEY_ACHIEVEMENT_STATS, &stats);

        self.records[before..]
            .iter()
            .filter_map(|r| catalog::find(&r.id).map(|d| d.id))
            .collect()
    }

    fn check_composites(&mut self, store: &mut dyn KeyValueStore, now: u64) {
        if ENDINGS.iter().all(|id| self.is_unlocked(id)) {
            self.unlock_achievement(store, ALL_ENDINGS, now);
        }
        let everything_else = ACHIEVEMENTS
            .iter()
            .filter(|d| d.id != COMPLETIONIST)
            .all(|d| self.is_unlocked(d.id));
        if everything_else {
            self.unlock_achievement(store, COMPLETIONIST, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn engine(store: &MemoryStore) -> AchievementEngine {
        AchievementEngine::load(store, Some(Box::new(StoredSkinUnlocker)))
    }

    #[test]
    fn three_deaths() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        let first = eng.check_achievements(&mut store, &GameEvent::Death, 1);
        assert_eq!(first, vec![FIRST_DEATH]);
        assert_eq!(eng.stats(&store).current_deathless_streak, 0);
        for t in 2..=3 {
            assert!(eng.check_achievements(&mut store, &GameEvent::Death, t).is_empty());
            assert_eq!(eng.stats(&store).current_deathless_streak, 0);
        }
        assert_eq!(eng.stats(&store).total_deaths, 3);
        assert_eq!(eng.records().len(), 1);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        assert!(eng.unlock_achievement(&mut store, MECHANIC, 5));
        assert!(!eng.unlock_achievement(&mut store, MECHANIC, 6));
        assert_eq!(eng.records().len(), 1);
        assert!(!eng.unlock_achievement(&mut store, "not_an_achievement", 7));
        assert_eq!(eng.drain_notifications().len(), 1);
    }

    #[test]
    fn god_mode_only_lets_secrets_through() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        eng.set_god_mode(true);
        assert!(!eng.unlock_achievement(&mut store, FIRST_STEPS, 1));
        assert!(eng.unlock_achievement(&mut store, HIDDEN_ROOM, 1));
        assert_eq!(store.get(&skin_key("shadow")).as_deref(), Some("true"));
    }

    #[test]
    fn stats_persist_even_when_nothing_unlocks() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        eng.set_god_mode(true);
        eng.check_achievements(&mut store, &GameEvent::TrapCatch, 1);
        eng.check_achievements(&mut store, &GameEvent::TrapCatch, 2);
        assert!(eng.records().is_empty());
        assert_eq!(eng.stats(&store).trap_catches, 2);
    }

    #[test]
    fn deathless_streak_resets_on_death() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        let clean = GameEvent::LevelComplete { level: 1, time_ms: 90_000, deathless: true, no_abilities: false };
        eng.check_achievements(&mut store, &clean, 1);
        eng.check_achievements(&mut store, &clean, 2);
        eng.check_achievements(&mut store, &GameEvent::Death, 3);
        eng.check_achievements(&mut store, &clean, 4);
        let stats = eng.stats(&store);
        assert_eq!(stats.current_deathless_streak, 1);
        assert_eq!(stats.best_deathless_streak, 2);
        assert!(!eng.is_unlocked(HOT_STREAK));
        eng.check_achievements(&mut store, &clean, 5);
        let unlocked = eng.check_achievements(&mut store, &clean, 6);
        assert_eq!(unlocked, vec![HOT_STREAK]);
    }

    #[test]
    fn all_endings_derives_from_unlocked_set() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        let finale = GameEvent::LevelComplete { level: FINAL_LEVEL, time_ms: 300_000, deathless: false, no_abilities: false };
        eng.check_achievements(&mut store, &finale, 1);
        eng.check_achievements(&mut store, &GameEvent::SecretFound { secret_id: "true_ending".into() }, 2);
        assert!(!eng.is_unlocked(ALL_ENDINGS));
        let unlocked =
            eng.check_achievements(&mut store, &GameEvent::SecretFound { secret_id: "sacrifice".into() }, 3);
        assert_eq!(unlocked, vec![ENDING_SACRIFICE, ALL_ENDINGS]);
        assert_eq!(store.get(&skin_key("prism")).as_deref(), Some("true"));
    }

    #[test]
    fn completionist_follows_every_other_unlock() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        for d in ACHIEVEMENTS.iter().filter(|d| d.id != COMPLETIONIST && d.id != TRAPPER) {
            eng.unlock_achievement(&mut store, d.id, 1);
        }
        assert!(!eng.is_unlocked(COMPLETIONIST));
        let unlocked = eng.check_achievements(&mut store, &GameEvent::TrapCatch, 2);
        assert_eq!(unlocked, vec![TRAPPER, COMPLETIONIST]);
        assert_eq!(eng.progress(), (ACHIEVEMENTS.len(), ACHIEVEMENTS.len()));
    }

    #[test]
    fn records_survive_reload_and_reset_wipes_them() {
        let mut store = MemoryStore::new();
        let mut eng = engine(&store);
        eng.check_achievements(&mut store, &GameEvent::AbilityUsed, 42);
        let reloaded = engine(&store);
        assert_eq!(reloaded.records(), &[UnlockRecord { id: EMPOWERED.into(), unlocked_at: 42 }]);
        eng.reset_achievements(&mut store);
        assert!(engine(&store).records().is_empty());
        assert_eq!(eng.stats(&store), AchievementStats::default());
    }
}
