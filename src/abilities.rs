//! Timed buffs and static counters for the current run.
//!
//! Timed abilities are stored as "active until" timestamps and read lazily:
//! an ability is active iff `now < until`. Nothing needs to clear them when
//! they run out. The status-effect list only exists for the HUD and is
//! purged once per tick by [`AbilityState::update_status_effects`].

use serde::{Deserialize, Serialize};

pub const DEFAULT_ABILITY_DURATION_MS: u64 = 30_000;
pub const SHIELD_BOOST_HITS: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimedAbility {
    EnemySlow,
    WallPhase,
    Invincibility,
}

impl TimedAbility {
    pub const ALL: [TimedAbility; 3] = [Self::EnemySlow, Self::WallPhase, Self::Invincibility];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "enemySlow" => Some(Self::EnemySlow),
            "wallPhase" => Some(Self::WallPhase),
            "invincibility" => Some(Self::Invincibility),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::EnemySlow => "enemySlow",
            Self::WallPhase => "wallPhase",
            Self::Invincibility => "invincibility",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::EnemySlow => "🐌",
            Self::WallPhase => "👻",
            Self::Invincibility => "⭐",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EnemySlow => "Enemies Slowed",
            Self::WallPhase => "Wall Phase",
            Self::Invincibility => "Invincible",
        }
    }
}

/// Abilities an endless run can carry. The first three are activated on
/// demand, the rest apply as soon as the run (or room) grants them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunAbility {
    EnemySlow,
    WallPhase,
    Invincibility,
    ExtraLife,
    ReducedStamina,
    ShieldBoost,
}

impl RunAbility {
    pub fn timed(self) -> Option<TimedAbility> {
        match self {
            Self::EnemySlow => Some(TimedAbility::EnemySlow),
            Self::WallPhase => Some(TimedAbility::WallPhase),
            Self::Invincibility => Some(TimedAbility::Invincibility),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ExtraLife => "Extra Life",
            Self::ReducedStamina => "Light Feet",
            Self::ShieldBoost => "Shield Boost",
            other => other.timed().map(TimedAbility::label).unwrap_or(""),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusEffect {
    pub id: TimedAbility,
    pub icon: &'static str,
    pub label: &'static str,
    pub expires_at: u64,
}

/// Outcome of resolving one incoming hit against the active protections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protection {
    Invincible,
    ShieldAbsorbed { hits_left: u32 },
    /// The hit that used up the last shield-boost charge; it still hurts.
    ShieldBroken,
    Unprotected,
}

impl Protection {
    pub fn should_take_damage(self) -> bool {
        matches!(self, Self::ShieldBroken | Self::Unprotected)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityState {
    pub enemy_slow_until: u64,
    pub wall_phase_until: u64,
    pub invincibility_until: u64,
    pub shield_boost_hits: u32,
    pub reduced_stamina: bool,
    pub extra_lives: u32,
    pub status_effects: Vec<StatusEffect>,
}

impl AbilityState {
    /// Full reset, then apply the static abilities in `active`. Timed entries
    /// in the list are left for the player to trigger.
    pub fn initialize_run(&mut self, active: &[RunAbility]) {
        *self = Self::default();
        for ability in active {
            self.apply_static_ability(*ability);
        }
    }

    pub fn apply_static_ability(&mut self, ability: RunAbility) {
        match ability {
            RunAbility::ExtraLife => self.extra_lives = 1,
            RunAbility::ReducedStamina => self.reduced_stamina = true,
            RunAbility::ShieldBoost => self.shield_boost_hits = SHIELD_BOOST_HITS,
            RunAbility::EnemySlow | RunAbility::WallPhase | RunAbility::Invincibility => {}
        }
    }

    fn until_mut(&mut self, ability: TimedAbility) -> &mut u64 {
        match ability {
            TimedAbility::EnemySlow => &mut self.enemy_slow_until,
            TimedAbility::WallPhase => &mut self.wall_phase_until,
            TimedAbility::Invincibility => &mut self.invincibility_until,
        }
    }

    fn until(&self, ability: TimedAbility) -> u64 {
        match ability {
            TimedAbility::EnemySlow => self.enemy_slow_until,
            TimedAbility::WallPhase => self.wall_phase_until,
            TimedAbility::Invincibility => self.invincibility_until,
        }
    }

    pub fn activate_timed_ability(&mut self, ability: TimedAbility, now: u64, duration_ms: u64) {
        let expires_at = now.saturating_add(duration_ms);
        *self.until_mut(ability) = expires_at;
        self.status_effects.retain(|e| e.id != ability);
        self.status_effects.push(StatusEffect {
            id: ability,
            icon: ability.icon(),
            label: ability.label(),
            expires_at,
        });
        log::debug!("ability {} active until {expires_at}", ability.key());
    }

    /// String-keyed activation for saved/scripted ability ids. Unknown keys
    /// are ignored; returns whether anything was activated.
    pub fn activate_timed_ability_by_key(&mut self, key: &str, now: u64, duration_ms: u64) -> bool {
        match TimedAbility::from_key(key) {
            Some(ability) => {
                self.activate_timed_ability(ability, now, duration_ms);
                true
            }
            None => false,
        }
    }

    pub fn is_ability_active(&self, ability: TimedAbility, now: u64) -> bool {
        now < self.until(ability)
    }

    /// Decides whether an incoming hit hurts. Consumes one shield-boost
    /// charge when that is what absorbs the hit, so call it once per hit.
    pub fn resolve_and_consume_protection(&mut self, now: u64) -> Protection {
        if self.is_ability_active(TimedAbility::Invincibility, now) {
            return Protection::Invincible;
        }
        if self.shield_boost_hits > 0 {
            self.shield_boost_hits -= 1;
            return if self.shield_boost_hits == 0 {
                Protection::ShieldBroken
            } else {
                Protection::ShieldAbsorbed { hits_left: self.shield_boost_hits }
            };
        }
        Protection::Unprotected
    }

    pub fn stamina_multiplier(&self) -> f64 {
        if self.reduced_stamina { 0.5 } else { 1.0 }
    }

    pub fn enemy_speed_multiplier(&self, now: u64) -> f64 {
        if self.is_ability_active(TimedAbility::EnemySlow, now) { 0.5 } else { 1.0 }
    }

    pub fn can_phase_walls(&self, now: u64) -> bool {
        self.is_ability_active(TimedAbility::WallPhase, now)
    }

    /// Returns true when a spare life absorbed a death.
    pub fn consume_extra_life(&mut self) -> bool {
        if self.extra_lives > 0 {
            self.extra_lives -= 1;
            true
        } else {
            false
        }
    }

    pub fn update_status_effects(&mut self, now: u64) {
        self.status_effects.retain(|e| e.expires_at > now);
    }
}
