mod brain;
pub mod catalog;
mod echo;
mod fracture;
mod gazer;
mod mimic;
mod movement;
mod phantom;
mod sentinel;

use anyhow::{Result, bail};
use bevy_math::Vec2;
use rand::{Rng, rngs::StdRng};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    collision::distance,
    constants::{
        MONSTER_BASE_SPEED, MONSTER_HEARING_RANGE, MONSTER_INVESTIGATION_DURATION, MONSTER_LEAD_TIME,
        MONSTER_PATROL_ATTEMPTS, MONSTER_SEARCH_OFFSET, MONSTER_SIZE, MONSTER_SPEED_INCREMENT,
    },
    events::WorldEvent,
    map::{GameMap, TilePos},
    pathfinding::Pathfinder,
    players::PlayerSnapshot,
    props::{Decoy, Door},
};

pub use catalog::{Difficulty, MonsterCatalog, MonsterInfo};
pub use echo::{EchoState, SoundKind};
pub use fracture::FractureState;
pub use gazer::GazerState;
pub use mimic::MimicState;
pub use phantom::PhantomState;
pub use sentinel::{SentinelMode, SentinelState};

// ============================================================================
// Kinds and States
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum MonsterKind {
    Kraken,
    Gazer,
    Phantom,
    Echo,
    Mimic,
    Fracture,
    Sentinel,
}

impl MonsterKind {
    pub const ALL: [Self; 7] = [
        Self::Kraken,
        Self::Gazer,
        Self::Phantom,
        Self::Echo,
        Self::Mimic,
        Self::Fracture,
        Self::Sentinel,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kraken => "kraken",
            Self::Gazer => "gazer",
            Self::Phantom => "phantom",
            Self::Echo => "echo",
            Self::Mimic => "mimic",
            Self::Fracture => "fracture",
            Self::Sentinel => "sentinel",
        }
    }
}

impl fmt::Display for MonsterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonsterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match Self::ALL.into_iter().find(|kind| kind.as_str() == lower) {
            Some(kind) => Ok(kind),
            None => bail!("unknown monster {s:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum MonsterState {
    Patrol,
    Chase,
    Investigate,
    Search,
    Decoy,
}

impl MonsterState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Investigate => "investigate",
            Self::Search => "search",
            Self::Decoy => "decoy",
        }
    }
}

// ============================================================================
// Update Context
// ============================================================================

// Everything a monster may read or mutate during its update
pub struct MonsterContext<'a> {
    pub map: &'a mut GameMap,
    pub doors: &'a mut [Door],
    pub decoys: &'a [Decoy],
    pub player: PlayerSnapshot,
    pub rng: &'a mut StdRng,
    // Fracture instances that may still be created this tick
    pub fracture_slots: &'a mut usize,
}

// A new monster the world should append after the update pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub pos: Vec2,
    pub generation: u8,
    pub generators_activated: usize,
}

// ============================================================================
// Shared Monster State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Lure {
    pub id: u32,
    pub pos: Vec2,
}

// How a chasing monster aims at the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Prediction {
    Lead(f32),
    Exact,
}

#[derive(Debug, Clone)]
pub(crate) struct MonsterBase {
    pub pos: Vec2,
    pub size: f32,
    pub base_speed: f32,
    pub speed: f32,
    pub generators_activated: usize,
    pub state: MonsterState,
    pub target: Option<Vec2>,
    pub path: Vec<TilePos>,
    pub path_timer: f32,
    pub pathfinder: Pathfinder,
    pub last_seen: Option<Vec2>,
    pub last_seen_timer: f32,
    pub search_timer: f32,
    pub search_pattern: Vec<Vec2>,
    pub search_index: usize,
    pub investigate_pos: Option<Vec2>,
    pub investigate_timer: f32,
    pub lure: Option<Lure>,
    pub lure_timer: f32,
}

impl MonsterBase {
    fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: MONSTER_SIZE,
            base_speed: MONSTER_BASE_SPEED,
            speed: MONSTER_BASE_SPEED,
            generators_activated: 0,
            state: MonsterState::Patrol,
            target: None,
            path: Vec::new(),
            path_timer: 0.0,
            pathfinder: Pathfinder::new(),
            last_seen: None,
            last_seen_timer: 0.0,
            search_timer: 0.0,
            search_pattern: Vec::new(),
            search_index: 0,
            investigate_pos: None,
            investigate_timer: 0.0,
            lure: None,
            lure_timer: 0.0,
        }
    }

    pub fn set_generators_activated(&mut self, count: usize) {
        self.generators_activated = count;
        self.speed = (count as f32).mul_add(MONSTER_SPEED_INCREMENT, self.base_speed);
    }

    // Default noise reaction: walk over and have a look
    pub fn investigate(&mut self, pos: Vec2) {
        self.investigate_pos = Some(pos);
        self.investigate_timer = MONSTER_INVESTIGATION_DURATION;
        if self.state != MonsterState::Chase {
            self.state = MonsterState::Investigate;
        }
    }

    // Extrapolate the player, falling back to the exact position off the walkable grid
    pub fn predicted_target(&self, player: &PlayerSnapshot, prediction: Prediction, map: &GameMap) -> Vec2 {
        let Prediction::Lead(lead) = prediction else {
            return player.pos;
        };
        let predicted = player.pos + player.vel * lead;
        if map.is_walkable(map.world_to_tile(predicted)) {
            predicted
        } else {
            player.pos
        }
    }

    // Up to four points around the last sighting, kept only on walkable tiles
    pub fn generate_search_pattern(&mut self, map: &GameMap) {
        let centre = self.last_seen.unwrap_or(self.pos);
        self.search_pattern = [
            Vec2::new(MONSTER_SEARCH_OFFSET, 0.0),
            Vec2::new(0.0, MONSTER_SEARCH_OFFSET),
            Vec2::new(-MONSTER_SEARCH_OFFSET, 0.0),
            Vec2::new(0.0, -MONSTER_SEARCH_OFFSET),
        ]
        .into_iter()
        .map(|offset| centre + offset)
        .filter(|&point| map.is_walkable(map.world_to_tile(point)))
        .collect();
        self.search_index = 0;
    }

    #[must_use]
    pub fn random_patrol_point(&self, map: &GameMap, rng: &mut StdRng) -> Vec2 {
        for _ in 0..MONSTER_PATROL_ATTEMPTS {
            let tile = TilePos::new(rng.random_range(0..map.width()), rng.random_range(0..map.height()));
            if map.is_walkable(tile) {
                return map.tile_to_world(tile);
            }
        }
        self.pos
    }

    pub fn lure_to(&mut self, decoy: &Decoy) {
        self.lure = Some(Lure {
            id: decoy.id,
            pos: decoy.pos,
        });
        self.lure_timer = crate::constants::DECOY_LURE_TIME;
        self.state = MonsterState::Decoy;
    }
}

// ============================================================================
// Variant Payloads
// ============================================================================

#[derive(Debug, Clone)]
pub enum Variant {
    Kraken,
    Gazer(GazerState),
    Phantom(PhantomState),
    Echo(EchoState),
    Mimic(MimicState),
    Fracture(FractureState),
    Sentinel(SentinelState),
}

impl Variant {
    #[must_use]
    pub fn new(kind: MonsterKind) -> Self {
        match kind {
            MonsterKind::Kraken => Self::Kraken,
            MonsterKind::Gazer => Self::Gazer(GazerState::default()),
            MonsterKind::Phantom => Self::Phantom(PhantomState::default()),
            MonsterKind::Echo => Self::Echo(EchoState::default()),
            MonsterKind::Mimic => Self::Mimic(MimicState::default()),
            MonsterKind::Fracture => Self::Fracture(FractureState::new(0)),
            MonsterKind::Sentinel => Self::Sentinel(SentinelState::default()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> MonsterKind {
        match self {
            Self::Kraken => MonsterKind::Kraken,
            Self::Gazer(_) => MonsterKind::Gazer,
            Self::Phantom(_) => MonsterKind::Phantom,
            Self::Echo(_) => MonsterKind::Echo,
            Self::Mimic(_) => MonsterKind::Mimic,
            Self::Fracture(_) => MonsterKind::Fracture,
            Self::Sentinel(_) => MonsterKind::Sentinel,
        }
    }
}

// ============================================================================
// Monster
// ============================================================================

#[derive(Debug, Clone)]
pub struct Monster {
    pub id: u32,
    pub(crate) base: MonsterBase,
    pub(crate) variant: Variant,
}

impl Monster {
    #[must_use]
    pub fn new(id: u32, kind: MonsterKind, pos: Vec2) -> Self {
        Self {
            id,
            base: MonsterBase::new(pos),
            variant: Variant::new(kind),
        }
    }

    // Offspring of a Fracture split
    #[must_use]
    pub fn fracture_offspring(id: u32, request: &SpawnRequest) -> Self {
        let mut monster = Self {
            id,
            base: MonsterBase::new(request.pos),
            variant: Variant::Fracture(FractureState::new(request.generation)),
        };
        fracture::apply_generation(&mut monster.base, request.generation);
        monster.base.set_generators_activated(request.generators_activated);
        monster
    }

    // ------------------------------------------------------------------------
    // Exposed per-tick state
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn kind(&self) -> MonsterKind {
        self.variant.kind()
    }

    #[must_use]
    pub const fn variant(&self) -> &Variant {
        &self.variant
    }

    #[must_use]
    pub const fn pos(&self) -> Vec2 {
        self.base.pos
    }

    #[must_use]
    pub const fn size(&self) -> f32 {
        self.base.size
    }

    #[must_use]
    pub const fn state(&self) -> MonsterState {
        self.base.state
    }

    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        self.base.state.as_str()
    }

    #[must_use]
    pub const fn target(&self) -> Option<Vec2> {
        self.base.target
    }

    #[must_use]
    pub fn path(&self) -> &[TilePos] {
        &self.base.path
    }

    #[must_use]
    pub const fn last_seen(&self) -> Option<Vec2> {
        self.base.last_seen
    }

    #[must_use]
    pub const fn generators_activated(&self) -> usize {
        self.base.generators_activated
    }

    // Variant-specific flags for debug overlays and logs
    #[must_use]
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        match &self.variant {
            Variant::Kraken | Variant::Echo(_) => {}
            Variant::Gazer(gazer) => {
                if gazer.is_watched() {
                    flags.push("watched");
                }
                if gazer.is_circling() {
                    flags.push("circling");
                }
            }
            Variant::Phantom(phantom) => {
                if phantom.is_visible() {
                    flags.push("visible");
                } else if phantom.is_flickering() {
                    flags.push("flickering");
                }
            }
            Variant::Mimic(mimic) => {
                if mimic.is_replaying() {
                    flags.push("replaying");
                }
            }
            Variant::Fracture(fracture) => {
                if fracture.is_splitting() {
                    flags.push("cracking");
                }
            }
            Variant::Sentinel(sentinel) => {
                if sentinel.mode() == SentinelMode::Guard {
                    flags.push("guard");
                }
                if sentinel.is_guarding() {
                    flags.push("guarding");
                }
                if sentinel.is_smashing() {
                    flags.push("smashing");
                }
            }
        }
        flags
    }

    #[must_use]
    pub fn current_speed(&self) -> f32 {
        let speed = self.base.speed;
        match &self.variant {
            Variant::Kraken | Variant::Echo(_) | Variant::Fracture(_) => speed,
            Variant::Gazer(gazer) => speed * gazer.speed_factor(),
            Variant::Phantom(phantom) => speed * phantom.speed_factor(),
            Variant::Mimic(mimic) => speed * mimic.speed_factor(),
            Variant::Sentinel(sentinel) => speed * sentinel.speed_factor(),
        }
    }

    #[must_use]
    pub const fn can_kill_player(&self) -> bool {
        match &self.variant {
            Variant::Phantom(phantom) => phantom.can_kill(),
            Variant::Sentinel(sentinel) => !sentinel.is_smashing(),
            _ => true,
        }
    }

    // No variant removes itself from play
    #[must_use]
    pub const fn supports_despawn(&self) -> bool {
        false
    }

    // Contact test used for the lose condition
    #[must_use]
    pub fn touches(&self, player: &PlayerSnapshot) -> bool {
        distance(self.base.pos, player.pos) < (player.size + self.base.size) / 2.0
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    // React to a world event. `fracture_slots` is how many more Fracture
    // instances may exist; a split is only started while one is free.
    pub fn handle_event(&mut self, event: &WorldEvent, rng: &mut StdRng, fracture_slots: usize) {
        match *event {
            WorldEvent::GeneratorActivating(pos) => {
                if let Variant::Echo(echo) = &mut self.variant {
                    echo.hear(&mut self.base, pos, SoundKind::GeneratorActive, 1.0);
                }
            }
            WorldEvent::GeneratorCompleted { pos, active_count } => {
                self.hear_noise(pos);
                self.base.set_generators_activated(active_count);
                if let Variant::Fracture(fracture) = &mut self.variant {
                    fracture.on_generator_completed(rng, fracture_slots);
                }
            }
            WorldEvent::DoorClosed(pos) => {
                if let Variant::Echo(echo) = &mut self.variant {
                    echo.hear(&mut self.base, pos, SoundKind::DoorClose, 1.0);
                }
            }
            WorldEvent::ExitOpened(pos) => match &mut self.variant {
                Variant::Echo(echo) => echo.hear(&mut self.base, pos, SoundKind::ExitOpen, 1.0),
                Variant::Sentinel(sentinel) => sentinel.set_exit(pos),
                _ => {}
            },
            WorldEvent::ExitUnlocked => {
                if let Variant::Sentinel(sentinel) = &mut self.variant {
                    sentinel.on_exit_unlocked(&mut self.base);
                }
            }
            WorldEvent::Footstep {
                pos,
                sprinting,
                loudness,
            } => {
                if let Variant::Echo(echo) = &mut self.variant {
                    let kind = if sprinting {
                        SoundKind::SprintFootstep
                    } else {
                        SoundKind::Footstep
                    };
                    echo.hear(&mut self.base, pos, kind, loudness);
                }
            }
        }
    }

    // Generator noise within hearing range
    fn hear_noise(&mut self, pos: Vec2) {
        let dist = distance(self.base.pos, pos);
        match &mut self.variant {
            Variant::Echo(echo) => echo.hear(&mut self.base, pos, SoundKind::GeneratorComplete, 1.0),
            _ if dist <= MONSTER_HEARING_RANGE => self.base.investigate(pos),
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Variant policy hooks
    // ------------------------------------------------------------------------

    fn should_chase(&self, has_los: bool, dist: f32) -> bool {
        match &self.variant {
            Variant::Echo(_) => false,
            _ => has_los && dist <= crate::constants::MONSTER_LOS_DISTANCE,
        }
    }

    fn prediction(&self) -> Prediction {
        match &self.variant {
            Variant::Gazer(gazer) if gazer.is_watched() => Prediction::Exact,
            Variant::Fracture(fracture) => Prediction::Lead(fracture.lead_time()),
            _ => Prediction::Lead(MONSTER_LEAD_TIME),
        }
    }
}

// ============================================================================
// Test Helpers
// ============================================================================
