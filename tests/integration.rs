// Whole-session scenarios driven through the public API.
// Native only: the store is in-memory and the RNG is seeded.

use echo_maze::GameSession;
use echo_maze::abilities::TimedAbility;
use echo_maze::achievements::GameEvent;
use echo_maze::endless::{Difficulty, PurchaseRejection, UpgradeKey};
use echo_maze::maze::{Position, TileKind};
use echo_maze::model::{CAMPAIGN_LEVELS, Mode};
use echo_maze::storage::{KeyValueStore, MemoryStore, StorageError};
use std::cell::RefCell;
use std::rc::Rc;

/// Store shared between sessions to simulate a page reload.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) {
        self.0.borrow_mut().remove(key);
    }
}

fn repair_all(s: &mut GameSession) {
    let gens: Vec<Position> = s
        .room
        .positions()
        .filter(|p| matches!(s.room.tile(*p), Some(TileKind::Generator { .. })))
        .collect();
    for p in gens {
        s.room.set(p, TileKind::Generator { repaired: true });
    }
}

fn clear_room(s: &mut GameSession, now: u64) {
    s.enemies.clear();
    repair_all(s);
    s.player.pos = s.room.exit;
    s.tick(now);
}

#[test]
fn endless_progress_survives_a_reload() {
    let store = SharedStore::default();
    let mut s = GameSession::new(Box::new(store.clone()), 7);
    s.start_endless(Difficulty::Easy, 0);
    for room in 1..=5u64 {
        clear_room(&mut s, room * 10);
        if room == 3 {
            assert_eq!(s.abilities.shield_boost_hits, 3, "shield boost granted on room 3");
        }
    }
    assert_eq!(s.endless.current_run.room_number, 5);
    assert_eq!(s.endless.current_run.points, 12 + 14 + 16 + 18 + 20);
    assert_eq!(s.ability_slots.len(), 1, "enemy slow arrives on room 5");

    s.key_down("Digit1", 100);
    assert!(s.abilities.is_ability_active(TimedAbility::EnemySlow, 101));

    s.quit_run(200);
    assert!(matches!(&s.mode, Mode::GameOver { summary: Some(sum) } if sum.rooms == 5 && sum.new_best));
    assert_eq!(s.endless.available_points, 80);

    assert_eq!(s.purchase_upgrade(UpgradeKey::PointMultiplier), Err(PurchaseRejection::NotEnoughPoints));
    assert_eq!(s.purchase_upgrade(UpgradeKey::StaminaRegen), Ok(75));

    let reloaded = GameSession::new(Box::new(store), 8);
    assert_eq!(reloaded.endless.available_points, 5);
    assert_eq!(reloaded.endless.permanent_upgrades.stamina_regen, 1);
    assert_eq!(reloaded.endless.lifetime_stats.best_run, 5);
    assert_eq!(reloaded.endless.lifetime_stats.total_runs, 1);
    assert!(!reloaded.endless.is_run_active());
    assert_eq!(reloaded.achievements.stats(reloaded.store()).best_endless_wave, 5);
    assert!(reloaded.achievements.is_unlocked("ability_first"));
}

#[test]
fn repeated_deaths_count_but_unlock_once() {
    let mut s = GameSession::new(Box::new(MemoryStore::new()), 1);
    for t in 0..3 {
        s.record_event(GameEvent::Death, t);
    }
    let first_death = s.achievements.records().iter().filter(|r| r.id == "first_death").count();
    assert_eq!(first_death, 1);
    assert_eq!(s.achievements.stats(s.store()).total_deaths, 3);
    assert!(!s.achievements.is_unlocked("persistent"));
}

#[test]
fn god_mode_lets_only_secrets_through() {
    let store = SharedStore::default();
    let mut s = GameSession::new(Box::new(store.clone()), 3);
    let mut settings = s.settings.clone();
    settings.god_mode = true;
    s.update_settings(settings);

    s.record_event(
        GameEvent::LevelComplete { level: 1, time_ms: 1_000, deathless: true, no_abilities: true },
        0,
    );
    assert!(s.achievements.records().is_empty());

    s.record_event(GameEvent::SecretFound { secret_id: "hidden_room".into() }, 5);
    assert!(s.achievements.is_unlocked("hidden_room"));
    assert!(s.skin_unlocked("shadow"));
    assert_eq!(s.achievements.progress().0, 1);

    let reloaded = GameSession::new(Box::new(store), 4);
    assert!(reloaded.settings.god_mode);
    assert!(reloaded.achievements.is_unlocked("hidden_room"));
}

#[test]
fn campaign_ends_after_the_final_level() {
    let mut s = GameSession::new(Box::new(MemoryStore::new()), 11);
    s.start_campaign(CAMPAIGN_LEVELS - 1, 0);
    clear_room(&mut s, 10);
    assert!(matches!(&s.mode, Mode::Campaign(run) if run.level == CAMPAIGN_LEVELS));
    clear_room(&mut s, 20);
    assert_eq!(s.mode, Mode::Victory);
    assert!(s.achievements.is_unlocked("ending_escape"));
    assert!(!s.achievements.is_unlocked("all_endings"));
    assert!(s.skin_unlocked("neon"), "fast clears unlock the speedrunner skin");
}

#[test]
fn upgrades_shape_the_next_run() {
    let mut s = GameSession::new(Box::new(MemoryStore::new()), 5);
    s.endless.available_points = 1_000;
    assert_eq!(s.purchase_upgrade(UpgradeKey::StartingShield), Ok(200));
    assert_eq!(s.purchase_upgrade(UpgradeKey::StartingShield), Err(PurchaseRejection::AlreadyOwned));

    s.start_endless(Difficulty::Hard, 0);
    assert_eq!(s.abilities.shield_boost_hits, 3);
    s.quit_run(1);

    s.set_upgrades_enabled(false);
    s.start_endless(Difficulty::Hard, 2);
    assert_eq!(s.abilities.shield_boost_hits, 0);
    s.quit_run(3);

    assert_eq!(s.reset_upgrades(), 200);
    assert_eq!(s.endless.available_points, 1_000);
}
