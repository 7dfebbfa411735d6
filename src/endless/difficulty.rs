// Room difficulty for endless runs: generator count plus the enemy roster.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    Chaser,
    Seeker,
    FlyingPig,
    Batter,
    Mortar,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 5] =
        [Self::Chaser, Self::Seeker, Self::FlyingPig, Self::Batter, Self::Mortar];
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomDifficulty {
    pub generators: u32,
    pub enemies: Vec<EnemyKind>,
}

pub fn generator_count(room: u32) -> u32 {
    match room {
        0..20 => 3,
        20..30 => 4,
        _ => 5,
    }
}

pub fn room_difficulty<R: Rng + ?Sized>(
    room: u32,
    mode: Difficulty,
    rng: &mut R,
) -> RoomDifficulty {
    let mut enemies: Vec<EnemyKind> = match mode {
        Difficulty::Easy => {
            if room <= 5 {
                EnemyKind::ALL
                    .choose_multiple(rng, room.min(5) as usize)
                    .copied()
                    .collect()
            } else {
                EnemyKind::ALL.to_vec()
            }
        }
        Difficulty::Hard => {
            let extra = (2 + room / 2).min(10) as usize;
            let mut list = EnemyKind::ALL.to_vec();
            for _ in 0..extra {
                list.push(EnemyKind::ALL[rng.gen_range(0..EnemyKind::ALL.len())]);
            }
            list
        }
    };
    enemies.shuffle(rng);
    RoomDifficulty { generators: generator_count(room), enemies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    #[test]
    fn easy_rooms_have_unique_types() {
        let mut rng = SmallRng::seed_from_u64(7);
        for room in 1..=12 {
            let d = room_difficulty(room, Difficulty::Easy, &mut rng);
            let unique: HashSet<_> = d.enemies.iter().collect();
            assert_eq!(d.enemies.len(), room.min(5) as usize);
            assert_eq!(unique.len(), d.enemies.len());
        }
    }

    #[test]
    fn hard_rooms_cover_every_type() {
        let mut rng = SmallRng::seed_from_u64(11);
        for room in [1, 4, 10, 18, 40] {
            let d = room_difficulty(room, Difficulty::Hard, &mut rng);
            let unique: HashSet<_> = d.enemies.iter().collect();
            assert_eq!(unique.len(), 5);
            assert_eq!(d.enemies.len(), 5 + (2 + room as usize / 2).min(10));
        }
    }

    #[test]
    fn generator_steps() {
        assert_eq!(generator_count(1), 3);
        assert_eq!(generator_count(19), 3);
        assert_eq!(generator_count(20), 4);
        assert_eq!(generator_count(29), 4);
        assert_eq!(generator_count(30), 5);
    }
}
