use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counters used to evaluate achievement thresholds. Lifetime totals only
/// grow; streaks are zeroed when broken.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementStats {
    pub total_deaths: u32,
    pub levels_completed: u32,
    pub current_deathless_streak: u32,
    pub best_deathless_streak: u32,
    pub shield_reflects: u32,
    pub perfect_generators: u32,
    pub abilities_used: u32,
    pub trap_catches: u32,
    pub secrets_found: BTreeSet<String>,
    pub best_endless_wave: u32,
    pub perfect_wave_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_blobs_backfill_missing_counters() {
        let stats: AchievementStats =
            serde_json::from_str(r#"{"totalDeaths":4,"currentDeathlessStreak":2}"#).unwrap();
        assert_eq!(stats.total_deaths, 4);
        assert_eq!(stats.current_deathless_streak, 2);
        assert_eq!(stats.trap_catches, 0);
        assert!(stats.secrets_found.is_empty());
    }
}
