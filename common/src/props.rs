use bevy_math::Vec2;

use crate::{
    constants::{
        CABINET_COOLDOWN, CABINET_HIDE_DURATION, CABINET_INTERACT_RADIUS, DECOY_LURE_TIME, DOOR_CLOSE_DURATION,
        DOOR_COOLDOWN, DOOR_INTERACT_RADIUS, EXIT_INTERACT_RADIUS, GENERATOR_ACTIVATE_TIME,
        GENERATOR_INTERACT_RADIUS,
    },
    map::{GameMap, Orientation, TilePos},
};

// ============================================================================
// Door
// ============================================================================

// Two-tile door. Closing is timed and followed by a cooldown; destruction is final.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    origin: TilePos,
    orientation: Orientation,
    center: Vec2,
    closed: bool,
    destroyed: bool,
    close_timer: f32,
    cooldown: f32,
}

impl Door {
    #[must_use]
    pub fn new(x: i32, y: i32, orientation: Orientation, map: &GameMap) -> Self {
        let ts = map.tile_size();
        let (cx, cy) = match orientation {
            Orientation::Horizontal => ((x as f32).mul_add(ts, ts), (y as f32).mul_add(ts, ts / 2.0)),
            Orientation::Vertical => ((x as f32).mul_add(ts, ts / 2.0), (y as f32).mul_add(ts, ts)),
        };
        Self {
            origin: TilePos::new(x, y),
            orientation,
            center: Vec2::new(cx, cy),
            closed: false,
            destroyed: false,
            close_timer: 0.0,
            cooldown: 0.0,
        }
    }

    #[must_use]
    pub const fn tiles(&self) -> [TilePos; 2] {
        match self.orientation {
            Orientation::Horizontal => [self.origin, self.origin.offset(1, 0)],
            Orientation::Vertical => [self.origin, self.origin.offset(0, 1)],
        }
    }

    #[must_use]
    pub fn covers(&self, tile: TilePos) -> bool {
        self.tiles().contains(&tile)
    }

    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // Closed and still standing: blocks movement and sight
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.closed && !self.destroyed
    }

    #[must_use]
    pub fn can_close(&self) -> bool {
        !self.closed && !self.destroyed && self.cooldown <= 0.0
    }

    #[must_use]
    pub fn is_in_range(&self, pos: Vec2) -> bool {
        pos.distance(self.center) < DOOR_INTERACT_RADIUS
    }

    // Returns true when the door actually closed
    pub fn close(&mut self) -> bool {
        if !self.can_close() {
            return false;
        }
        self.closed = true;
        self.close_timer = DOOR_CLOSE_DURATION;
        true
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.closed = false;
    }

    pub fn update(&mut self, dt: f32) {
        if self.closed {
            self.close_timer -= dt;
            if self.close_timer <= 0.0 {
                self.closed = false;
                self.cooldown = DOOR_COOLDOWN;
            }
        }
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub pos: Vec2,
    progress: f32,
    activating: bool,
    active: bool,
}

impl Generator {
    #[must_use]
    pub const fn new(pos: Vec2) -> Self {
        Self {
            pos,
            progress: 0.0,
            activating: false,
            active: false,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn is_activating(&self) -> bool {
        self.activating
    }

    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    #[must_use]
    pub fn is_in_range(&self, pos: Vec2) -> bool {
        pos.distance(self.pos) < GENERATOR_INTERACT_RADIUS
    }

    // Returns true when this call began a fresh activation
    pub fn start_activation(&mut self) -> bool {
        if self.active || self.activating {
            return false;
        }
        self.activating = true;
        true
    }

    // Advance an activation; true on the tick it completes
    pub fn update_activation(&mut self, dt: f32) -> bool {
        if !self.activating || self.active {
            return false;
        }
        self.progress += dt / GENERATOR_ACTIVATE_TIME;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.activating = false;
            self.active = true;
            return true;
        }
        false
    }

    pub fn cancel_activation(&mut self) {
        if !self.active {
            self.activating = false;
            self.progress = 0.0;
        }
    }
}

// ============================================================================
// Decoy
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Decoy {
    pub id: u32,
    pub pos: Vec2,
    timer: f32,
}

impl Decoy {
    #[must_use]
    pub const fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            timer: DECOY_LURE_TIME,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.timer > 0.0
    }

    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.timer
    }

    pub fn update(&mut self, dt: f32) {
        self.timer = (self.timer - dt).max(0.0);
    }
}

// ============================================================================
// Cabinet
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Cabinet {
    pub pos: Vec2,
    occupied: bool,
    hide_timer: f32,
    cooldown: f32,
}

impl Cabinet {
    #[must_use]
    pub const fn new(pos: Vec2) -> Self {
        Self {
            pos,
            occupied: false,
            hide_timer: 0.0,
            cooldown: 0.0,
        }
    }

    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    #[must_use]
    pub fn can_hide(&self) -> bool {
        !self.occupied && self.cooldown <= 0.0
    }

    #[must_use]
    pub fn is_in_range(&self, pos: Vec2) -> bool {
        pos.distance(self.pos) < CABINET_INTERACT_RADIUS
    }

    pub fn hide(&mut self) -> bool {
        if !self.can_hide() {
            return false;
        }
        self.occupied = true;
        self.hide_timer = CABINET_HIDE_DURATION;
        true
    }

    // Leaving, voluntarily or not, locks the cabinet for a while
    pub fn release(&mut self) {
        self.occupied = false;
        self.hide_timer = 0.0;
        self.cooldown = CABINET_COOLDOWN;
    }

    // Returns true when the occupant was forced out this tick
    pub fn update(&mut self, dt: f32) -> bool {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
        }
        if self.occupied {
            self.hide_timer -= dt;
            if self.hide_timer <= 0.0 {
                self.release();
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Exit
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub pos: Vec2,
    pub tile: TilePos,
}

impl Exit {
    #[must_use]
    pub fn new(tile: TilePos, map: &GameMap) -> Self {
        Self {
            pos: map.tile_to_world(tile),
            tile,
        }
    }

    #[must_use]
    pub fn is_in_range(&self, pos: Vec2) -> bool {
        pos.distance(self.pos) < EXIT_INTERACT_RADIUS
    }
}

// ============================================================================
// Tests
// ============================================================================
