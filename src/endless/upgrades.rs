//! Permanent upgrades bought with endless points.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKey {
    StartingExtraLife,
    StartingShield,
    PointMultiplier,
    StaminaRegen,
    DashCooldown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PurchaseRejection {
    #[error("Already owned")]
    AlreadyOwned,
    #[error("Max level reached")]
    MaxLevelReached,
    #[error("Not enough points")]
    NotEnoughPoints,
}

pub struct UpgradeDef {
    pub key: UpgradeKey,
    pub name: &'static str,
    pub description: &'static str,
    /// 1 for one-off (boolean) upgrades.
    pub max_level: u32,
    pub boolean: bool,
}

pub static UPGRADE_DEFS: &[UpgradeDef] = &[
    UpgradeDef {
        key: UpgradeKey::StartingExtraLife,
        name: "Second Wind",
        description: "Start every run with an extra life",
        max_level: 1,
        boolean: true,
    },
    UpgradeDef {
        key: UpgradeKey::StartingShield,
        name: "Reinforced Shield",
        description: "Start every run with a 3-hit shield boost",
        max_level: 1,
        boolean: true,
    },
    UpgradeDef {
        key: UpgradeKey::PointMultiplier,
        name: "Echo Collector",
        description: "+25% points per room per level",
        max_level: 4,
        boolean: false,
    },
    UpgradeDef {
        key: UpgradeKey::StaminaRegen,
        name: "Deep Breath",
        description: "Faster stamina recovery",
        max_level: 3,
        boolean: false,
    },
    UpgradeDef {
        key: UpgradeKey::DashCooldown,
        name: "Quick Step",
        description: "Shorter dash cooldown",
        max_level: 3,
        boolean: false,
    },
];

impl UpgradeKey {
    pub fn def(self) -> &'static UpgradeDef {
        // UPGRADE_DEFS is declared in enum order.
        &UPGRADE_DEFS[self as usize]
    }

    /// Marginal cost of buying the level after `level`. Strictly increasing in `level`.
    pub fn cost_at(self, level: u32) -> u64 {
        let level = level as u64;
        match self {
            UpgradeKey::StartingExtraLife => 150,
            UpgradeKey::StartingShield => 200,
            UpgradeKey::PointMultiplier => 100 * (level + 1),
            UpgradeKey::StaminaRegen => 75 * (1u64 << level.min(32)),
            UpgradeKey::DashCooldown => 60 + 40 * level,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermanentUpgrades {
    pub starting_extra_life: bool,
    pub starting_shield: bool,
    pub point_multiplier: u32,
    pub stamina_regen: u32,
    pub dash_cooldown: u32,
}

impl PermanentUpgrades {
    /// Boolean upgrades read as 0 or 1.
    pub fn level(&self, key: UpgradeKey) -> u32 {
        match key {
            UpgradeKey::StartingExtraLife => self.starting_extra_life as u32,
            UpgradeKey::StartingShield => self.starting_shield as u32,
            UpgradeKey::PointMultiplier => self.point_multiplier,
            UpgradeKey::StaminaRegen => self.stamina_regen,
            UpgradeKey::DashCooldown => self.dash_cooldown,
        }
    }

    fn set_level(&mut self, key: UpgradeKey, level: u32) {
        match key {
            UpgradeKey::StartingExtraLife => self.starting_extra_life = level > 0,
            UpgradeKey::StartingShield => self.starting_shield = level > 0,
            UpgradeKey::PointMultiplier => self.point_multiplier = level,
            UpgradeKey::StaminaRegen => self.stamina_regen = level,
            UpgradeKey::DashCooldown => self.dash_cooldown = level,
        }
    }

    /// Cost of the next level, or why it cannot be bought at any price.
    pub fn next_cost(&self, key: UpgradeKey) -> Result<u64, PurchaseRejection> {
        let def = key.def();
        let level = self.level(key);
        if level >= def.max_level {
            return Err(if def.boolean {
                PurchaseRejection::AlreadyOwned
            } else {
                PurchaseRejection::MaxLevelReached
            });
        }
        Ok(key.cost_at(level))
    }

    /// Debits `points` and raises the level. Nothing changes on rejection.
    pub fn purchase(
        &mut self,
        key: UpgradeKey,
        points: &mut u64,
    ) -> Result<u64, PurchaseRejection> {
        let cost = self.next_cost(key)?;
        if *points < cost {
            return Err(PurchaseRejection::NotEnoughPoints);
        }
        *points -= cost;
        self.set_level(key, self.level(key) + 1);
        Ok(cost)
    }

    /// Sum of marginal costs for every owned level.
    pub fn total_spent(&self) -> u64 {
        UPGRADE_DEFS
            .iter()
            .map(|d| (0..self.level(d.key)).map(|l| d.key.cost_at(l)).sum::<u64>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages() {
        assert_eq!(PurchaseRejection::AlreadyOwned.to_string(), "Already owned");
        assert_eq!(PurchaseRejection::MaxLevelReached.to_string(), "Max level reached");
        assert_eq!(PurchaseRejection::NotEnoughPoints.to_string(), "Not enough points");
    }

    #[test]
    fn costs_increase_per_level() {
        for d in UPGRADE_DEFS {
            assert_eq!(d.key.def().key, d.key);
        }
        for d in UPGRADE_DEFS.iter().filter(|d| !d.boolean) {
            for l in 1..d.max_level {
                assert!(d.key.cost_at(l) > d.key.cost_at(l - 1), "{:?} at {l}", d.key);
            }
        }
    }

    #[test]
    fn purchase_paths() {
        let mut ups = PermanentUpgrades::default();
        let mut points = 250;
        assert_eq!(ups.purchase(UpgradeKey::StartingExtraLife, &mut points), Ok(150));
        assert_eq!(points, 100);
        assert_eq!(
            ups.purchase(UpgradeKey::StartingExtraLife, &mut points),
            Err(PurchaseRejection::AlreadyOwned)
        );
        assert_eq!(
            ups.purchase(UpgradeKey::StartingShield, &mut points),
            Err(PurchaseRejection::NotEnoughPoints)
        );
        assert_eq!(points, 100);
        assert!(!ups.starting_shield);

        let mut points = 10_000;
        for _ in 0..4 {
            ups.purchase(UpgradeKey::PointMultiplier, &mut points).unwrap();
        }
        assert_eq!(
            ups.purchase(UpgradeKey::PointMultiplier, &mut points),
            Err(PurchaseRejection::MaxLevelReached)
        );
        assert_eq!(points, 10_000 - (100 + 200 + 300 + 400));
        assert_eq!(ups.total_spent(), 150 + 1_000);
    }
}
