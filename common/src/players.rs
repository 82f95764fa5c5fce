use bevy_math::Vec2;
use std::f32::consts::FRAC_PI_2;
use tracing::debug;

use crate::{
    abilities::{AbilityInfo, AbilityKind, EquippedAbility},
    collision::{AgentKind, resolve_collision},
    constants::{
        BARRICADE_DISTANCE, CONVEYOR_SPEED, DASH_BORDER_MARGIN, PHYSICS_EPSILON, PLAYER_SIZE, PLAYER_SPEED,
        PUDDLE_SPEED_MULTIPLIER,
    },
    map::{GameMap, TilePos},
    props::Door,
};

// ============================================================================
// Input and Snapshot
// ============================================================================

// One tick of survivor controls
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    // Raw direction, each axis in -1..=1
    pub movement: Vec2,
    pub interact_held: bool,
    pub interact_pressed: bool,
    pub use_ability: bool,
}

impl PlayerInput {
    #[must_use]
    pub const fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            interact_held: false,
            interact_pressed: false,
            use_ability: false,
        }
    }
}

// What monsters are allowed to know about the player each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub pos: Vec2,
    // Pixels per second
    pub vel: Vec2,
    pub hiding: bool,
    pub size: f32,
}

// Side effect of an ability the world has to act on
#[derive(Debug, Clone, PartialEq)]
pub enum AbilityUse {
    Dash,
    Surge,
    Pulse,
    Barricade(Vec<TilePos>),
    Decoy(Vec2),
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct DashState {
    dir: Vec2,
    timer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlacedBarricade {
    tile: TilePos,
    timer: f32,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: f32,
    pub speed: f32,
    pub size: f32,
    moving: bool,
    ability: Option<EquippedAbility>,
    hiding_in: Option<usize>,
    dash: Option<DashState>,
    surge_timer: f32,
    pulse_timer: f32,
    barricades: Vec<PlacedBarricade>,
}

impl Player {
    #[must_use]
    pub const fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            facing: 0.0,
            speed: PLAYER_SPEED,
            size: PLAYER_SIZE,
            moving: false,
            ability: None,
            hiding_in: None,
            dash: None,
            surge_timer: 0.0,
            pulse_timer: 0.0,
            barricades: Vec::new(),
        }
    }

    pub fn equip(&mut self, info: AbilityInfo) {
        self.ability = Some(EquippedAbility::new(info));
    }

    #[must_use]
    pub const fn ability(&self) -> Option<&EquippedAbility> {
        self.ability.as_ref()
    }

    #[must_use]
    pub const fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            pos: self.pos,
            vel: self.vel,
            hiding: self.hiding_in.is_some(),
            size: self.size,
        }
    }

    // ------------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    #[must_use]
    pub const fn is_hiding(&self) -> bool {
        self.hiding_in.is_some()
    }

    #[must_use]
    pub const fn hiding_in(&self) -> Option<usize> {
        self.hiding_in
    }

    #[must_use]
    pub const fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    #[must_use]
    pub fn is_surging(&self) -> bool {
        self.surge_timer > 0.0
    }

    // Full-map reveal flag, read by presentation layers only
    #[must_use]
    pub fn is_pulsing(&self) -> bool {
        self.pulse_timer > 0.0
    }

    #[must_use]
    pub fn footstep_loudness(&self) -> f32 {
        match &self.ability {
            Some(ability) if self.is_surging() => ability.info.footstep_multiplier,
            _ => 1.0,
        }
    }

    #[must_use]
    pub fn facing_dir(&self) -> Vec2 {
        Vec2::from_angle(self.facing)
    }

    pub fn barricade_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.barricades.iter().map(|b| b.tile)
    }

    // ------------------------------------------------------------------------
    // Hiding
    // ------------------------------------------------------------------------

    pub fn enter_cabinet(&mut self, index: usize, cabinet_pos: Vec2) {
        self.hiding_in = Some(index);
        self.pos = cabinet_pos;
        self.vel = Vec2::ZERO;
        self.moving = false;
    }

    pub const fn leave_cabinet(&mut self) {
        self.hiding_in = None;
    }

    // ------------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------------

    pub fn update(&mut self, dt: f32, input: &PlayerInput, map: &mut GameMap, doors: &[Door]) {
        self.update_barricades(dt, map);
        self.update_ability_timers(dt);

        if self.is_hiding() {
            self.vel = Vec2::ZERO;
            self.moving = false;
            return;
        }

        if self.dash.is_some() {
            self.update_dash(dt, map);
            return;
        }

        let mut dir = Vec2::new(input.movement.x.clamp(-1.0, 1.0), input.movement.y.clamp(-1.0, 1.0));
        if dir.length_squared() > 1.0 + PHYSICS_EPSILON {
            dir = dir.normalize_or_zero();
        }

        let mut multiplier = 1.0;
        if map.is_in_puddle(self.pos) {
            multiplier *= PUDDLE_SPEED_MULTIPLIER;
        }
        if let Some(ability) = &self.ability
            && self.is_surging()
        {
            multiplier *= ability.info.speed_multiplier;
        }

        self.vel = dir * self.speed * multiplier;
        self.vel.x += map.conveyor_drift(self.pos, CONVEYOR_SPEED);

        self.moving = dir.length_squared() > PHYSICS_EPSILON;
        if self.moving {
            self.facing = dir.y.atan2(dir.x);
        }

        self.pos = resolve_collision(self.pos, self.vel * dt, self.size, map, doors, AgentKind::Player);
    }

    fn update_ability_timers(&mut self, dt: f32) {
        if let Some(ability) = &mut self.ability {
            ability.update(dt);
        }
        self.surge_timer = (self.surge_timer - dt).max(0.0);
        self.pulse_timer = (self.pulse_timer - dt).max(0.0);
    }

    fn update_barricades(&mut self, dt: f32, map: &mut GameMap) {
        self.barricades.retain_mut(|barricade| {
            barricade.timer -= dt;
            if barricade.timer <= 0.0 {
                map.set_temporary_wall(barricade.tile, false);
                false
            } else {
                true
            }
        });
    }

    // Dashes ignore walls but stay inside the map border
    fn update_dash(&mut self, dt: f32, map: &GameMap) {
        let Some(dash) = &mut self.dash else {
            return;
        };
        dash.timer -= dt;

        if dash.timer <= 0.0 {
            self.dash = None;
            self.vel = Vec2::ZERO;
            self.settle_after_dash(map);
            return;
        }

        let (duration, dash_speed) = self
            .ability
            .as_ref()
            .map_or((1.0, 0.0), |ability| (ability.info.duration, ability.info.dash_speed));
        let progress = dash.timer / duration;
        let speed = dash_speed * (progress * FRAC_PI_2).sin();
        let dir = dash.dir;

        let ts = map.tile_size();
        let min = DASH_BORDER_MARGIN * ts;
        let max_x = (map.width() as f32 - DASH_BORDER_MARGIN) * ts;
        let max_y = (map.height() as f32 - DASH_BORDER_MARGIN) * ts;

        self.vel = dir * speed;
        let next = self.pos + self.vel * dt;
        self.pos = Vec2::new(next.x.clamp(min, max_x), next.y.clamp(min, max_y));
        self.moving = true;
    }

    // Pop out of a wall onto the first open neighbour
    fn settle_after_dash(&mut self, map: &GameMap) {
        let tile = map.world_to_tile(self.pos);
        if !map.is_wall(tile) {
            return;
        }
        const NEIGHBOURS: [(i32, i32); 8] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1), (1, -1), (-1, 1)];
        if let Some(open) = NEIGHBOURS
            .iter()
            .map(|&(dx, dy)| tile.offset(dx, dy))
            .find(|&candidate| !map.is_wall(candidate))
        {
            self.pos = map.tile_to_world(open);
        }
    }

    // ------------------------------------------------------------------------
    // Abilities
    // ------------------------------------------------------------------------

    // Fire the equipped ability if it is off cooldown
    pub fn use_ability(&mut self, map: &mut GameMap) -> Option<AbilityUse> {
        let ability = self.ability.as_mut()?;
        if self.hiding_in.is_some() || !ability.trigger() {
            return None;
        }
        let info = ability.info.clone();

        let used = match info.kind {
            AbilityKind::Dash => {
                self.dash = Some(DashState {
                    dir: self.facing_dir(),
                    timer: info.duration,
                });
                AbilityUse::Dash
            }
            AbilityKind::Surge => {
                self.surge_timer = info.duration;
                AbilityUse::Surge
            }
            AbilityKind::Pulse => {
                self.pulse_timer = info.duration;
                AbilityUse::Pulse
            }
            AbilityKind::Barricade => AbilityUse::Barricade(self.place_barricade(map, info.duration)),
            AbilityKind::Decoy => AbilityUse::Decoy(self.pos),
        };
        debug!(ability = %info.kind, "player used ability");
        Some(used)
    }

    // Three tiles across the facing direction, two tiles ahead
    fn place_barricade(&mut self, map: &mut GameMap, duration: f32) -> Vec<TilePos> {
        let ts = map.tile_size();
        let dir = self.facing_dir();
        let perp = dir.perp();
        let centre = self.pos + dir * ts * BARRICADE_DISTANCE;

        let mut placed = Vec::new();
        for pos in [centre, centre + perp * ts, centre - perp * ts] {
            let tile = map.world_to_tile(pos);
            if !map.is_interior(tile, 1) || map.is_wall(tile) {
                continue;
            }
            map.set_temporary_wall(tile, true);
            self.barricades.push(PlacedBarricade { tile, timer: duration });
            placed.push(tile);
        }
        placed
    }
}

// ============================================================================
// Tests
// ============================================================================
