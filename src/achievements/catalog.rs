//! Static achievement catalog.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub fn color(self) -> &'static str {
        match self {
            Tier::Bronze => "#cd7f32",
            Tier::Silver => "#c0c0c0",
            Tier::Gold => "#ffd700",
            Tier::Platinum => "#9fe8ff",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tier: Tier,
    /// Hidden until unlocked; still unlockable in god mode.
    pub secret: bool,
    /// Skin granted alongside the achievement.
    pub skin: Option<&'static str>,
}

const fn def(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    tier: Tier,
) -> AchievementDef {
    AchievementDef { id, name, description, tier, secret: false, skin: None }
}

const fn with_skin(mut d: AchievementDef, skin: &'static str) -> AchievementDef {
    d.skin = Some(skin);
    d
}

const fn secret(mut d: AchievementDef) -> AchievementDef {
    d.secret = true;
    d
}

pub const FIRST_STEPS: &str = "first_steps";
pub const FIRST_DEATH: &str = "first_death";
pub const PERSISTENT: &str = "persistent";
pub const UNDYING_WILL: &str = "undying_will";
pub const SPEEDRUNNER: &str = "speedrunner";
pub const UNTOUCHABLE: &str = "untouchable";
pub const PURIST: &str = "purist";
pub const HOT_STREAK: &str = "streak_3";
pub const FLAWLESS: &str = "streak_10";
pub const FIRST_REFLECT: &str = "first_reflect";
pub const SHIELD_MASTER: &str = "shield_master";
pub const MECHANIC: &str = "mechanic";
pub const PERFECTIONIST: &str = "perfectionist";
pub const ENDLESS_10: &str = "endless_10";
pub const ENDLESS_25: &str = "endless_25";
pub const ENDLESS_50: &str = "endless_50";
pub const PERFECT_WAVES: &str = "perfect_waves_5";
pub const SURVIVOR: &str = "survivor";
pub const EMPOWERED: &str = "ability_first";
pub const POWER_HUNGRY: &str = "ability_50";
pub const TRAPPER: &str = "trapper";
pub const MASTER_TRAPPER: &str = "master_trapper";
pub const ENDING_ESCAPE: &str = "ending_escape";
pub const ENDING_TRUE: &str = "ending_true";
pub const ENDING_SACRIFICE: &str = "ending_sacrifice";
pub const ALL_ENDINGS: &str = "all_endings";
pub const HIDDEN_ROOM: &str = "hidden_room";
pub const SECRET_HUNTER: &str = "secret_hunter";
pub const COMPLETIONIST: &str = "completionist";

pub const ENDINGS: [&str; 3] = [ENDING_ESCAPE, ENDING_TRUE, ENDING_SACRIFICE];

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    def(FIRST_STEPS, "First Steps", "Complete your first level", Tier::Bronze),
    def(FIRST_DEATH, "Echoes Fade", "Die for the first time", Tier::Bronze),
    def(PERSISTENT, "Persistent", "Die 10 times", Tier::Bronze),
    def(UNDYING_WILL, "Undying Will", "Die 50 times", Tier::Silver),
    with_skin(def(SPEEDRUNNER, "Speedrunner", "Complete a level in under 60 seconds", Tier::Silver), "neon"),
    def(UNTOUCHABLE, "Untouchable", "Complete a level without dying", Tier::Bronze),
    def(PURIST, "Purist", "Complete a level without using abilities", Tier::Silver),
    def(HOT_STREAK, "Hot Streak", "Complete 3 levels in a row without dying", Tier::Silver),
    with_skin(def(FLAWLESS, "Flawless", "Complete 10 levels in a row without dying", Tier::Gold), "gilded"),
    def(FIRST_REFLECT, "Mirror", "Reflect an attack with your shield", Tier::Bronze),
    with_skin(def(SHIELD_MASTER, "Shield Master", "Reflect 25 attacks", Tier::Gold), "aegis"),
    def(MECHANIC, "Mechanic", "Hit a perfect generator skill check", Tier::Bronze),
    def(PERFECTIONIST, "Perfectionist", "Hit 50 perfect generator skill checks", Tier::Gold),
    def(ENDLESS_10, "Deep Diver", "Reach room 10 in endless mode", Tier::Silver),
    def(ENDLESS_25, "Abyss Walker", "Reach room 25 in endless mode", Tier::Gold),
    with_skin(def(ENDLESS_50, "Echo Eternal", "Reach room 50 in endless mode", Tier::Platinum), "void"),
    def(PERFECT_WAVES, "Untouched Depths", "Clear 5 endless rooms in a row without being hit", Tier::Gold),
    def(SURVIVOR, "Survivor", "Survive 10 minutes in a single endless run", Tier::Silver),
    def(EMPOWERED, "Empowered", "Use an ability", Tier::Bronze),
    def(POWER_HUNGRY, "Power Hungry", "Use 50 abilities", Tier::Silver),
    def(TRAPPER, "Trapper", "Catch an enemy in a trap", Tier::Bronze),
    def(MASTER_TRAPPER, "Master Trapper", "Catch 25 enemies in traps", Tier::Silver),
    def(ENDING_ESCAPE, "Escape", "Reach the surface", Tier::Gold),
    secret(def(ENDING_TRUE, "The True Echo", "Hear what the maze was saying", Tier::Gold)),
    secret(def(ENDING_SACRIFICE, "Sacrifice", "Stay behind so another can leave", Tier::Gold)),
    with_skin(def(ALL_ENDINGS, "Full Circle", "See all three endings", Tier::Platinum), "prism"),
    secret(with_skin(def(HIDDEN_ROOM, "Hidden Room", "Find the room that is not on the map", Tier::Silver), "shadow")),
    def(SECRET_HUNTER, "Secret Hunter", "Find 5 secrets", Tier::Gold),
    with_skin(def(COMPLETIONIST, "Completionist", "Unlock every other achievement", Tier::Platinum), "crown"),
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|d| d.id == id)
}

/// Secret ids reported by the world that map straight onto an achievement.
pub fn achievement_for_secret(secret_id: &str) -> Option<&'static str> {
    match secret_id {
        "hidden_room" => Some(HIDDEN_ROOM),
        "true_ending" => Some(ENDING_TRUE),
        "sacrifice" => Some(ENDING_SACRIFICE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_resolvable() {
        let mut seen = HashSet::new();
        for d in ACHIEVEMENTS {
            assert!(seen.insert(d.id), "duplicate achievement id {}", d.id);
            assert_eq!(find(d.id).map(|f| f.name), Some(d.name));
        }
        for id in ENDINGS {
            assert!(find(id).is_some());
        }
    }
}
