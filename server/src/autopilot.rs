use bevy_ecs::prelude::Resource;
use bevy_math::Vec2;
use serde::Serialize;
use tracing::debug;

use crate::constants::{
    AUTOPILOT_ACTIVATE_DISTANCE, AUTOPILOT_EXIT_DISTANCE, AUTOPILOT_FLEE_ANGLES, AUTOPILOT_FLEE_DISTANCES,
    AUTOPILOT_FLEE_GAIN, AUTOPILOT_PANIC_DISTANCE, AUTOPILOT_PANIC_TIME, AUTOPILOT_PATH_INTERVAL,
    AUTOPILOT_WAYPOINT_RADIUS,
};
use common::{
    GameWorld,
    abilities::AbilityKind,
    collision::{direction_to, distance},
    constants::PLAYER_SPEED,
    map::{GameMap, TilePos},
    pathfinding::Pathfinder,
    players::PlayerInput,
    props::Generator,
};

// ============================================================================
// Autopilot Survivor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotState {
    SeekGenerator,
    Activating,
    Flee,
    SeekExit,
}

// Plays the survivor: works through the generators, runs from anything that
// gets close and heads for the exit once it opens.
#[derive(Resource, Debug)]
pub struct Autopilot {
    state: AutopilotState,
    target: Option<usize>,
    panic_timer: f32,
    path: Vec<TilePos>,
    path_goal: Option<TilePos>,
    path_timer: f32,
    pathfinder: Pathfinder,
    input: PlayerInput,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Autopilot {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AutopilotState::SeekGenerator,
            target: None,
            panic_timer: 0.0,
            path: Vec::new(),
            path_goal: None,
            path_timer: 0.0,
            pathfinder: Pathfinder::new(),
            input: PlayerInput::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> AutopilotState {
        self.state
    }

    // Input chosen by the last `plan` call
    #[must_use]
    pub const fn input(&self) -> &PlayerInput {
        &self.input
    }

    pub fn plan(&mut self, dt: f32, world: &GameWorld) -> PlayerInput {
        self.path_timer -= dt;
        let player = world.player();
        let mut input = PlayerInput::default();

        let threatened = world
            .nearest_monster()
            .is_some_and(|monster| distance(monster.pos(), player.pos) < AUTOPILOT_PANIC_DISTANCE);
        if threatened {
            if self.state != AutopilotState::Flee {
                debug!(state = ?self.state, "autopilot panicking");
            }
            self.panic_timer = AUTOPILOT_PANIC_TIME;
            self.state = AutopilotState::Flee;
            // Pulse only lights the map and a barricade would land on the escape route
            input.use_ability = player.ability().is_some_and(|ability| {
                ability.is_ready() && !matches!(ability.kind(), AbilityKind::Pulse | AbilityKind::Barricade)
            });
        }
        self.panic_timer = (self.panic_timer - dt).max(0.0);

        if player.is_hiding() {
            // Stay inside while anything is close
            input.use_ability = false;
            input.interact_pressed = !threatened && self.panic_timer <= 0.0;
            self.input = input;
            return input;
        }

        match self.state {
            AutopilotState::SeekGenerator => self.seek_generator(dt, world, &mut input),
            AutopilotState::Activating => self.activate(world, &mut input),
            AutopilotState::Flee => self.flee(dt, world, &mut input),
            AutopilotState::SeekExit => self.seek_exit(dt, world, &mut input),
        }
        self.input = input;
        input
    }

    fn set_state(&mut self, state: AutopilotState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "autopilot state");
            self.state = state;
            self.path.clear();
            self.path_goal = None;
        }
    }

    fn resume(&mut self, world: &GameWorld) {
        let done = world.generators().iter().all(Generator::is_active);
        self.set_state(if done {
            AutopilotState::SeekExit
        } else {
            AutopilotState::SeekGenerator
        });
    }

    // ------------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------------

    fn seek_generator(&mut self, dt: f32, world: &GameWorld, input: &mut PlayerInput) {
        let pos = world.player().pos;
        let generators = world.generators();
        if self
            .target
            .is_none_or(|index| generators.get(index).is_none_or(Generator::is_active))
        {
            self.target = nearest_inactive(generators, pos);
        }
        let Some(generator) = self.target.and_then(|index| generators.get(index)) else {
            self.set_state(AutopilotState::SeekExit);
            self.seek_exit(dt, world, input);
            return;
        };

        if distance(pos, generator.pos) < AUTOPILOT_ACTIVATE_DISTANCE {
            self.set_state(AutopilotState::Activating);
            input.interact_held = true;
            return;
        }
        input.movement = self.steer(dt, world, generator.pos);
    }

    fn activate(&mut self, world: &GameWorld, input: &mut PlayerInput) {
        let pos = world.player().pos;
        match self.target.and_then(|index| world.generators().get(index)) {
            Some(generator) if !generator.is_active() && generator.is_in_range(pos) => {
                input.interact_held = true;
            }
            _ => {
                self.target = None;
                self.resume(world);
            }
        }
    }

    fn flee(&mut self, dt: f32, world: &GameWorld, input: &mut PlayerInput) {
        if self.panic_timer <= 0.0 {
            self.resume(world);
            return;
        }
        let pos = world.player().pos;
        let Some(monster) = world.nearest_monster() else {
            return;
        };
        if let Some(goal) = flee_target(world.map(), pos, monster.pos()) {
            input.movement = self.steer(dt, world, goal);
        }
        // Slam any door on the way
        input.interact_pressed = world
            .doors()
            .iter()
            .any(|door| door.can_close() && door.is_in_range(pos));
    }

    fn seek_exit(&mut self, dt: f32, world: &GameWorld, input: &mut PlayerInput) {
        let Some(exit) = world.exit() else {
            return;
        };
        let pos = world.player().pos;
        if distance(pos, exit.pos) < AUTOPILOT_EXIT_DISTANCE {
            input.interact_pressed = true;
            return;
        }
        input.movement = self.steer(dt, world, exit.pos);
    }

    // ------------------------------------------------------------------------
    // Steering
    // ------------------------------------------------------------------------

    // Direction towards the next waypoint, replanning on a timer or a new goal
    fn steer(&mut self, dt: f32, world: &GameWorld, goal: Vec2) -> Vec2 {
        let map = world.map();
        let pos = world.player().pos;
        let goal_tile = map.world_to_tile(goal);
        if self.path_timer <= 0.0 || self.path_goal != Some(goal_tile) {
            self.path = self.pathfinder.find_path(map, world.doors(), pos, goal);
            self.path_goal = Some(goal_tile);
            self.path_timer = AUTOPILOT_PATH_INTERVAL;
        }

        let reach = (PLAYER_SPEED * dt).max(AUTOPILOT_WAYPOINT_RADIUS);
        while let Some(&next) = self.path.first() {
            let waypoint = map.tile_to_world(next);
            if distance(pos, waypoint) > reach {
                return direction_to(pos, waypoint);
            }
            self.path.remove(0);
        }
        direction_to(pos, goal)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn nearest_inactive(generators: &[Generator], pos: Vec2) -> Option<usize> {
    generators
        .iter()
        .enumerate()
        .filter(|(_, generator)| !generator.is_active())
        .min_by(|(_, a), (_, b)| distance(a.pos, pos).total_cmp(&distance(b.pos, pos)))
        .map(|(index, _)| index)
}

// Walkable tile roughly away from the threat, widening the angle and
// shortening the reach until one fits
fn flee_target(map: &GameMap, pos: Vec2, threat: Vec2) -> Option<Vec2> {
    let me = map.world_to_tile(pos);
    let them = map.world_to_tile(threat);
    let tile_distance = |tile: TilePos| Vec2::new((tile.x - them.x) as f32, (tile.y - them.y) as f32).length();
    let current = tile_distance(me);
    let away = Vec2::new((me.x - them.x) as f32, (me.y - them.y) as f32)
        .try_normalize()
        .unwrap_or(Vec2::X);

    for reach in AUTOPILOT_FLEE_DISTANCES {
        for angle in AUTOPILOT_FLEE_ANGLES {
            let step = Vec2::from_angle(angle).rotate(away) * reach;
            let tile = me.offset(step.x.round() as i32, step.y.round() as i32);
            if map.is_walkable(tile) && tile_distance(tile) > current * AUTOPILOT_FLEE_GAIN {
                return Some(map.tile_to_world(tile));
            }
        }
    }

    // Any neighbour not towards the threat, then any neighbour at all
    let neighbours = || {
        (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (dx, dy)))
            .filter(|&offset| offset != (0, 0))
    };
    let toward = (them.x - me.x, them.y - me.y);
    neighbours()
        .find(|&(dx, dy)| map.is_walkable(me.offset(dx, dy)) && dx * toward.0 + dy * toward.1 <= 0)
        .or_else(|| neighbours().find(|&(dx, dy)| map.is_walkable(me.offset(dx, dy))))
        .map(|(dx, dy)| map.tile_to_world(me.offset(dx, dy)))
}

// ============================================================================
// Tests
// ============================================================================
