use anyhow::{Result, bail};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::constants::{
    BARRICADE_COOLDOWN, BARRICADE_DURATION, DASH_COOLDOWN, DASH_DURATION, DASH_SPEED, DECOY_COOLDOWN,
    DECOY_LURE_TIME, PULSE_COOLDOWN, PULSE_DURATION, SURGE_COOLDOWN, SURGE_DURATION, SURGE_FOOTSTEP_MULTIPLIER,
    SURGE_SPEED_MULTIPLIER,
};

// ============================================================================
// Ability Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum AbilityKind {
    Dash,
    Surge,
    Pulse,
    Barricade,
    Decoy,
}

impl AbilityKind {
    pub const ALL: [Self; 5] = [Self::Dash, Self::Surge, Self::Pulse, Self::Barricade, Self::Decoy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dash => "dash",
            Self::Surge => "surge",
            Self::Pulse => "pulse",
            Self::Barricade => "barricade",
            Self::Decoy => "decoy",
        }
    }
}

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbilityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match Self::ALL.into_iter().find(|kind| kind.as_str() == lower) {
            Some(kind) => Ok(kind),
            None => bail!("unknown ability {s:?}"),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

// Immutable tuning for one ability
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityInfo {
    pub kind: AbilityKind,
    pub name: &'static str,
    pub description: &'static str,
    pub cooldown: f32,
    pub duration: f32,
    pub dash_speed: f32,
    pub speed_multiplier: f32,
    pub footstep_multiplier: f32,
}

impl AbilityInfo {
    const fn base(kind: AbilityKind, name: &'static str, description: &'static str, cooldown: f32, duration: f32) -> Self {
        Self {
            kind,
            name,
            description,
            cooldown,
            duration,
            dash_speed: 0.0,
            speed_multiplier: 1.0,
            footstep_multiplier: 1.0,
        }
    }
}

// Registry of every ability, handed to whoever equips players
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityCatalog {
    entries: Vec<AbilityInfo>,
}

impl Default for AbilityCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AbilityCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![
                AbilityInfo {
                    dash_speed: DASH_SPEED,
                    ..AbilityInfo::base(
                        AbilityKind::Dash,
                        "Dash",
                        "Burst forward through walls",
                        DASH_COOLDOWN,
                        DASH_DURATION,
                    )
                },
                AbilityInfo {
                    speed_multiplier: SURGE_SPEED_MULTIPLIER,
                    footstep_multiplier: SURGE_FOOTSTEP_MULTIPLIER,
                    ..AbilityInfo::base(
                        AbilityKind::Surge,
                        "Surge",
                        "Run faster but louder",
                        SURGE_COOLDOWN,
                        SURGE_DURATION,
                    )
                },
                AbilityInfo::base(
                    AbilityKind::Pulse,
                    "Pulse",
                    "Reveal the whole facility",
                    PULSE_COOLDOWN,
                    PULSE_DURATION,
                ),
                AbilityInfo::base(
                    AbilityKind::Barricade,
                    "Barricade",
                    "Raise a short wall ahead",
                    BARRICADE_COOLDOWN,
                    BARRICADE_DURATION,
                ),
                AbilityInfo::base(
                    AbilityKind::Decoy,
                    "Decoy",
                    "Drop a noise lure",
                    DECOY_COOLDOWN,
                    DECOY_LURE_TIME,
                ),
            ],
        }
    }

    #[must_use]
    pub fn get(&self, kind: AbilityKind) -> &AbilityInfo {
        // Every kind is registered in `new`
        self.entries
            .iter()
            .find(|info| info.kind == kind)
            .unwrap_or(&self.entries[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityInfo> {
        self.entries.iter()
    }
}

// ============================================================================
// Equipped Ability
// ============================================================================

// Cooldown bookkeeping for the single ability a player carries
#[derive(Debug, Clone, PartialEq)]
pub struct EquippedAbility {
    pub info: AbilityInfo,
    cooldown: f32,
}

impl EquippedAbility {
    #[must_use]
    pub const fn new(info: AbilityInfo) -> Self {
        Self { info, cooldown: 0.0 }
    }

    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        self.info.kind
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    #[must_use]
    pub const fn cooldown_remaining(&self) -> f32 {
        self.cooldown
    }

    // Start the cooldown; false while still recharging
    pub fn trigger(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.cooldown = self.info.cooldown;
        true
    }

    pub fn update(&mut self, dt: f32) {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
    }
}
