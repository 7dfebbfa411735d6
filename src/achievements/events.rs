use serde::{Deserialize, Serialize};

/// Gameplay events the achievement engine reacts to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    LevelComplete {
        level: u32,
        #[serde(rename = "timeMs")]
        time_ms: u64,
        deathless: bool,
        #[serde(rename = "noAbilities")]
        no_abilities: bool,
    },
    Death,
    ShieldReflect,
    EndlessWave {
        wave: u32,
        #[serde(rename = "perfectWave")]
        perfect_wave: bool,
    },
    /// Ten minutes survived in one endless run.
    EndlessSurvival,
    GeneratorPerfect,
    SecretFound {
        #[serde(rename = "secretId")]
        secret_id: String,
    },
    AbilityUsed,
    TrapCatch,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::LevelComplete { .. } => "level_complete",
            GameEvent::Death => "death",
            GameEvent::ShieldReflect => "shield_reflect",
            GameEvent::EndlessWave { .. } => "endless_wave",
            GameEvent::EndlessSurvival => "endless_survival",
            GameEvent::GeneratorPerfect => "generator_perfect",
            GameEvent::SecretFound { .. } => "secret_found",
            GameEvent::AbilityUsed => "ability_used",
            GameEvent::TrapCatch => "trap_catch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_payloads() {
        let ev: GameEvent = serde_json::from_str(
            r#"{"event":"level_complete","level":3,"timeMs":41000,"deathless":true,"noAbilities":false}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            GameEvent::LevelComplete { level: 3, time_ms: 41_000, deathless: true, no_abilities: false }
        );
        let ev: GameEvent = serde_json::from_str(r#"{"event":"death"}"#).unwrap();
        assert_eq!(ev.name(), "death");
        let ev: GameEvent =
            serde_json::from_str(r#"{"event":"secret_found","secretId":"hidden_room"}"#).unwrap();
        assert_eq!(ev, GameEvent::SecretFound { secret_id: "hidden_room".into() });
    }
}
