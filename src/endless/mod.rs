//! Endless mode: run state, lifetime stats and the permanent upgrade shop.
//!
//! A run goes inactive -> active (room 0) -> room after room -> inactive.
//! Points are earned per room and banked into the spendable balance when the
//! run ends, win or lose.

pub mod difficulty;
pub mod upgrades;

pub use difficulty::{Difficulty, EnemyKind, RoomDifficulty, room_difficulty};
pub use upgrades::{PermanentUpgrades, PurchaseRejection, UPGRADE_DEFS, UpgradeDef, UpgradeKey};

use crate::abilities::RunAbility;
use crate::achievements::GameEvent;
use crate::storage::{KEY_ENDLESS, KeyValueStore, load_json, save_json};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SURVIVAL_MILESTONE_MS: u64 = 10 * 60 * 1000;

/// Room at which each run ability is handed out. Only an exact match grants.
pub static ABILITY_UNLOCK_ROOMS: &[(RunAbility, u32)] = &[
    (RunAbility::ShieldBoost, 3),
    (RunAbility::EnemySlow, 5),
    (RunAbility::ExtraLife, 8),
    (RunAbility::WallPhase, 12),
    (RunAbility::ReducedStamina, 15),
    (RunAbility::Invincibility, 20),
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifetimeStats {
    pub best_run: u32,
    pub total_rooms_cleared: u64,
    pub total_runs: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentRun {
    pub active: bool,
    pub room_number: u32,
    pub points: u64,
    pub abilities: Vec<RunAbility>,
    pub mode: Difficulty,
    pub started_at: u64,
    pub survival_milestone_reached: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndlessProgression {
    #[serde(alias = "totalPoints")]
    pub available_points: u64,
    pub lifetime_stats: LifetimeStats,
    pub current_run: CurrentRun,
    pub permanent_upgrades: PermanentUpgrades,
    pub upgrades_enabled: bool,
}

impl Default for EndlessProgression {
    fn default() -> Self {
        Self {
            available_points: 0,
            lifetime_stats: LifetimeStats::default(),
            current_run: CurrentRun::default(),
            permanent_upgrades: PermanentUpgrades::default(),
            upgrades_enabled: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomCleared {
    pub room: u32,
    pub points: u64,
    pub granted: Vec<RunAbility>,
    /// Achievement events for the caller to dispatch.
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub rooms: u32,
    pub points: u64,
    pub new_best: bool,
    pub won: bool,
}

impl EndlessProgression {
    /// Loads the saved blob; fields missing from older saves take their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        load_json(store, KEY_ENDLESS).unwrap_or_default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        save_json(store, KEY_ENDLESS, self);
    }

    pub fn is_run_active(&self) -> bool {
        self.current_run.active
    }

    pub fn start_endless_run(&mut self, mode: Difficulty, now: u64) {
        let mut abilities = Vec::new();
        if self.upgrades_enabled {
            if self.permanent_upgrades.starting_extra_life {
                abilities.push(RunAbility::ExtraLife);
            }
            if self.permanent_upgrades.starting_shield {
                abilities.push(RunAbility::ShieldBoost);
            }
        }
        self.current_run = CurrentRun {
            active: true,
            room_number: 0,
            points: 0,
            abilities,
            mode,
            started_at: now,
            survival_milestone_reached: false,
        };
        log::info!("endless run started ({mode:?})");
    }

    /// Advances to the next room. `None` when no run is active.
    pub fn complete_endless_room(&mut self, now: u64, perfect_wave: bool) -> Option<RoomCleared> {
        if !self.current_run.active {
            return None;
        }
        let mut events = Vec::new();
        if !self.current_run.survival_milestone_reached
            && now.saturating_sub(self.current_run.started_at) >= SURVIVAL_MILESTONE_MS
        {
            self.current_run.survival_milestone_reached = true;
            events.push(GameEvent::EndlessSurvival);
        }

        self.current_run.room_number += 1;
        let room = self.current_run.room_number;
        let points = self.calculate_room_points(room, self.current_run.mode);
        self.current_run.points += points;
        events.push(GameEvent::EndlessWave { wave: room, perfect_wave });

        let mut granted = Vec::new();
        for (ability, unlock_room) in ABILITY_UNLOCK_ROOMS {
            if *unlock_room == room && !self.current_run.abilities.contains(ability) {
                self.current_run.abilities.push(*ability);
                granted.push(*ability);
            }
        }
        log::debug!("endless room {room} cleared for {points} points");
        Some(RoomCleared { room, points, granted, events })
    }

    /// Banks the run into lifetime stats and clears it. `None` when no run is active.
    pub fn end_endless_run(&mut self, won: bool) -> Option<RunSummary> {
        if !self.current_run.active {
            return None;
        }
        let run = std::mem::take(&mut self.current_run);
        let stats = &mut self.lifetime_stats;
        let new_best = run.room_number > stats.best_run;
        stats.best_run = stats.best_run.max(run.room_number);
        stats.total_rooms_cleared += run.room_number as u64;
        stats.total_runs += 1;
        self.available_points += run.points;
        log::info!(
            "endless run over after {} rooms, {} points banked (won: {won})",
            run.room_number,
            run.points
        );
        Some(RunSummary { rooms: run.room_number, points: run.points, new_best, won })
    }

    fn point_multiplier_level(&self) -> u32 {
        if self.upgrades_enabled { self.permanent_upgrades.point_multiplier } else { 0 }
    }

    pub fn calculate_room_points(&self, room: u32, mode: Difficulty) -> u64 {
        let mode_factor = match mode {
            Difficulty::Hard => 2.0,
            Difficulty::Easy => 1.0,
        };
        let base = (10 + room as u64 * 2) as f64;
        let bonus = 1.0 + 0.25 * self.point_multiplier_level() as f64;
        (base * mode_factor * bonus).floor() as u64
    }

    pub fn room_difficulty<R: Rng + ?Sized>(
        &self,
        room: u32,
        mode: Difficulty,
        rng: &mut R,
    ) -> RoomDifficulty {
        difficulty::room_difficulty(room, mode, rng)
    }

    pub fn purchase_upgrade(&mut self, key: UpgradeKey) -> Result<u64, PurchaseRejection> {
        let cost = self.permanent_upgrades.purchase(key, &mut self.available_points)?;
        log::info!("bought {:?} for {cost}", key);
        Ok(cost)
    }

    /// Refunds every owned level at its original cost and clears all upgrades.
    pub fn reset_upgrades(&mut self) -> u64 {
        let refund = self.permanent_upgrades.total_spent();
        self.available_points += refund;
        self.permanent_upgrades = PermanentUpgrades::default();
        refund
    }

    pub fn set_upgrades_enabled(&mut self, enabled: bool) {
        self.upgrades_enabled = enabled;
    }

    /// Upgrade level as it applies to gameplay right now.
    pub fn effective_level(&self, key: UpgradeKey) -> u32 {
        if self.upgrades_enabled { self.permanent_upgrades.level(key) } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn hard_pays_double_before_multiplier() {
        let p = EndlessProgression::default();
        for room in 1..60 {
            assert_eq!(
                p.calculate_room_points(room, Difficulty::Hard),
                2 * p.calculate_room_points(room, Difficulty::Easy)
            );
        }
        assert_eq!(p.calculate_room_points(1, Difficulty::Easy), 12);
    }

    #[test]
    fn point_multiplier_applies_only_when_enabled() {
        let mut p = EndlessProgression::default();
        p.permanent_upgrades.point_multiplier = 2;
        // (10 + 3*2) * 1.5
        assert_eq!(p.calculate_room_points(3, Difficulty::Easy), 24);
        // (10 + 1*2) * 2 * 1.5
        assert_eq!(p.calculate_room_points(1, Difficulty::Hard), 36);
        p.set_upgrades_enabled(false);
        assert_eq!(p.calculate_room_points(3, Difficulty::Easy), 16);
    }

    #[test]
    fn five_rooms_accumulate_points() {
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Easy, 0);
        for i in 0..5 {
            p.complete_endless_room(1_000 * i, false).unwrap();
        }
        let expected: u64 = (1..=5).map(|r| p.calculate_room_points(r, Difficulty::Easy)).sum();
        assert_eq!(p.current_run.room_number, 5);
        assert_eq!(p.current_run.points, expected);
        assert_eq!(
            p.current_run.abilities,
            vec![RunAbility::ShieldBoost, RunAbility::EnemySlow]
        );
    }

    #[test]
    fn inactive_run_ignores_room_and_end() {
        let mut p = EndlessProgression::default();
        assert_eq!(p.complete_endless_room(0, true), None);
        assert_eq!(p.end_endless_run(false), None);
        assert_eq!(p.lifetime_stats, LifetimeStats::default());
    }

    #[test]
    fn survival_milestone_fires_once() {
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Easy, 100);
        let early = p.complete_endless_room(100 + SURVIVAL_MILESTONE_MS - 1, true).unwrap();
        assert!(!early.events.contains(&GameEvent::EndlessSurvival));
        let on_time = p.complete_endless_room(100 + SURVIVAL_MILESTONE_MS, true).unwrap();
        assert_eq!(on_time.events[0], GameEvent::EndlessSurvival);
        let later = p.complete_endless_room(100 + 2 * SURVIVAL_MILESTONE_MS, true).unwrap();
        assert_eq!(later.events, vec![GameEvent::EndlessWave { wave: 3, perfect_wave: true }]);
    }

    #[test]
    fn ability_grant_needs_exact_room() {
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Hard, 0);
        p.current_run.room_number = 5;
        let cleared = p.complete_endless_room(1, false).unwrap();
        assert_eq!(cleared.room, 6);
        assert!(cleared.granted.is_empty());
        assert!(!p.current_run.abilities.contains(&RunAbility::EnemySlow));
    }

    #[test]
    fn ending_banks_points_and_stats() {
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Easy, 0);
        p.complete_endless_room(1, false);
        p.complete_endless_room(2, false);
        let banked = p.current_run.points;
        let summary = p.end_endless_run(false).unwrap();
        assert_eq!(summary, RunSummary { rooms: 2, points: banked, new_best: true, won: false });
        assert_eq!(p.available_points, banked);
        assert_eq!(p.lifetime_stats, LifetimeStats { best_run: 2, total_rooms_cleared: 2, total_runs: 1 });
        assert_eq!(p.current_run, CurrentRun::default());

        p.start_endless_run(Difficulty::Easy, 0);
        p.complete_endless_room(1, false);
        let summary = p.end_endless_run(true).unwrap();
        assert!(!summary.new_best);
        assert_eq!(p.lifetime_stats.best_run, 2);
        assert_eq!(p.lifetime_stats.total_rooms_cleared, 3);
    }

    #[test]
    fn starting_upgrades_seed_run_abilities() {
        let mut p = EndlessProgression::default();
        p.permanent_upgrades.starting_extra_life = true;
        p.permanent_upgrades.starting_shield = true;
        p.start_endless_run(Difficulty::Easy, 0);
        assert_eq!(p.current_run.abilities, vec![RunAbility::ExtraLife, RunAbility::ShieldBoost]);
        p.end_endless_run(false);
        p.set_upgrades_enabled(false);
        p.start_endless_run(Difficulty::Easy, 0);
        assert!(p.current_run.abilities.is_empty());
    }

    #[test]
    fn reset_refund_round_trips() {
        let mut p = EndlessProgression { available_points: 5_000, ..Default::default() };
        let buys = [
            UpgradeKey::PointMultiplier,
            UpgradeKey::StaminaRegen,
            UpgradeKey::PointMultiplier,
            UpgradeKey::StartingShield,
            UpgradeKey::StaminaRegen,
            UpgradeKey::DashCooldown,
            UpgradeKey::StaminaRegen,
        ];
        for k in buys {
            p.purchase_upgrade(k).unwrap();
        }
        let after_buys = p.available_points;
        let refund = p.reset_upgrades();
        assert_eq!(p.available_points, 5_000);
        assert_eq!(refund, 5_000 - after_buys);
        assert_eq!(p.permanent_upgrades, PermanentUpgrades::default());
        for k in buys {
            p.purchase_upgrade(k).unwrap();
        }
        assert_eq!(p.available_points, after_buys);
    }

    #[test]
    fn rejected_purchase_changes_nothing() {
        let mut p = EndlessProgression { available_points: 10, ..Default::default() };
        let before = p.clone();
        assert_eq!(p.purchase_upgrade(UpgradeKey::DashCooldown), Err(PurchaseRejection::NotEnoughPoints));
        assert_eq!(p, before);
    }

    #[test]
    fn old_save_shapes_load_with_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(KEY_ENDLESS, r#"{"totalPoints":320,"lifetimeStats":{"bestRun":7}}"#)
            .unwrap();
        let p = EndlessProgression::load(&store);
        assert_eq!(p.available_points, 320);
        assert_eq!(p.lifetime_stats.best_run, 7);
        assert_eq!(p.lifetime_stats.total_runs, 0);
        assert_eq!(p.permanent_upgrades, PermanentUpgrades::default());
        assert!(p.upgrades_enabled);
        assert!(!p.current_run.active);

        store.set(KEY_ENDLESS, "][").unwrap();
        assert_eq!(EndlessProgression::load(&store), EndlessProgression::default());
    }

    #[test]
    fn save_and_reload() {
        let mut store = MemoryStore::new();
        let mut p = EndlessProgression::default();
        p.start_endless_run(Difficulty::Hard, 9);
        p.complete_endless_room(10, true);
        p.save(&mut store);
        assert_eq!(EndlessProgression::load(&store), p);
    }
}
