use bevy_math::Vec2;
use rand::{Rng, rngs::StdRng};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use super::{Monster, MonsterKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonsterInfo {
    pub kind: MonsterKind,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
    // Relative chance in a random pick
    pub weight: f32,
}

impl MonsterInfo {
    const fn new(
        kind: MonsterKind,
        name: &'static str,
        description: &'static str,
        difficulty: Difficulty,
        weight: f32,
    ) -> Self {
        Self {
            kind,
            name,
            description,
            difficulty,
            weight,
        }
    }
}

// Immutable registry of every monster kind
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterCatalog {
    entries: Vec<MonsterInfo>,
}

impl Default for MonsterCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MonsterCatalog {
    #[must_use]
    pub fn new() -> Self {
        let entry = MonsterInfo::new;
        Self {
            entries: vec![
                entry(MonsterKind::Kraken, "Kraken", "The original threat", Difficulty::Easy, 1.0),
                entry(MonsterKind::Gazer, "Gazer", "Freezes when watched", Difficulty::Medium, 1.0),
                entry(
                    MonsterKind::Phantom,
                    "Phantom",
                    "Invisible until it sees you",
                    Difficulty::Medium,
                    1.0,
                ),
                entry(MonsterKind::Mimic, "Mimic", "Copies your movement", Difficulty::Medium, 1.0),
                entry(MonsterKind::Echo, "Echo", "Hunts by sound", Difficulty::Hard, 0.9),
                entry(MonsterKind::Fracture, "Fracture", "Splits when threatened", Difficulty::Hard, 0.8),
                entry(
                    MonsterKind::Sentinel,
                    "Sentinel",
                    "Smashes doors, guards the exit",
                    Difficulty::VeryHard,
                    0.5,
                ),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, kind: MonsterKind) -> Option<&MonsterInfo> {
        self.entries.iter().find(|info| info.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonsterInfo> {
        self.entries.iter()
    }

    // Weighted pick; falls back to the Kraken if the weights run out
    pub fn choose(&self, rng: &mut StdRng) -> MonsterKind {
        let total: f32 = self.entries.iter().map(|info| info.weight).sum();
        if total <= 0.0 {
            return MonsterKind::Kraken;
        }
        let mut roll = rng.random_range(0.0..total);
        for info in &self.entries {
            roll -= info.weight;
            if roll <= 0.0 {
                return info.kind;
            }
        }
        MonsterKind::Kraken
    }

    #[must_use]
    pub fn spawn(&self, kind: MonsterKind, id: u32, pos: Vec2) -> Monster {
        Monster::new(id, kind, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    #[test]
    fn every_kind_is_registered() {
        let catalog = MonsterCatalog::new();
        for kind in MonsterKind::ALL {
            assert_eq!(catalog.get(kind).map(|info| info.kind), Some(kind));
        }
        assert_eq!(catalog.get(MonsterKind::Sentinel).unwrap().difficulty, Difficulty::VeryHard);
    }

    #[test]
    fn weighted_choice_follows_weights() {
        let catalog = MonsterCatalog::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = BTreeMap::new();
        for _ in 0..12_400 {
            *counts.entry(catalog.choose(&mut rng)).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), MonsterKind::ALL.len());
        // Kraken weighs twice as much as the Sentinel
        let kraken = f64::from(counts[&MonsterKind::Kraken]);
        let sentinel = f64::from(counts[&MonsterKind::Sentinel]);
        let ratio = kraken / sentinel;
        assert!((1.6..2.5).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn spawn_builds_the_requested_kind() {
        let catalog = MonsterCatalog::new();
        let monster = catalog.spawn(MonsterKind::Echo, 4, Vec2::new(64.0, 64.0));
        assert_eq!(monster.kind(), MonsterKind::Echo);
        assert_eq!(monster.id, 4);
        assert_eq!(monster.pos(), Vec2::new(64.0, 64.0));
    }
}
