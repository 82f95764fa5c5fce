use bevy_math::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_4, TAU};
use tracing::debug;

use super::{MonsterBase, MonsterContext, MonsterState, brain::Senses};
use crate::{
    collision::distance,
    constants::{
        MONSTER_LOS_DISTANCE, MONSTER_MEMORY_DURATION, MONSTER_PATROL_REACHED, SENTINEL_ANGER_BUILD_RATE,
        SENTINEL_ANGER_DECAY_RATE, SENTINEL_ANGER_STAGE_2, SENTINEL_ANGER_STAGE_3, SENTINEL_GUARD_RADIUS,
        SENTINEL_GUARD_SPEED, SENTINEL_PATROL_CANDIDATES, SENTINEL_PATROL_DRIFT, SENTINEL_PATROL_RADIUS,
        SENTINEL_PATROL_REACHED, SENTINEL_SMASH_COOLDOWN, SENTINEL_SMASH_RANGE, SENTINEL_SMASH_RATE,
        SENTINEL_SPEED_MAX, SENTINEL_SPEED_MIN, SENTINEL_STUCK_SPEED, SENTINEL_STUCK_TIME,
        SENTINEL_WALL_BREAK_COOLDOWN,
    },
    map::{GameMap, Tile, TilePos},
};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelMode {
    #[default]
    Chase,
    Guard,
}

// Smashes doors and walls on its way to the player, then guards the exit
// once it unlocks
#[derive(Debug, Clone, Default)]
pub struct SentinelState {
    mode: SentinelMode,
    anger: f32,
    smashing: bool,
    smash_progress: f32,
    smash_cooldown: f32,
    wall_break_cooldown: f32,
    stuck_timer: f32,
    last_position: Option<Vec2>,
    exit: Option<Vec2>,
    guarding: bool,
    patrol_angle: f32,
    wandering: bool,
}

impl SentinelState {
    #[must_use]
    pub const fn mode(&self) -> SentinelMode {
        self.mode
    }

    #[must_use]
    pub const fn anger(&self) -> f32 {
        self.anger
    }

    // 1 doors only, 2 one wall tile, 3 two wall tiles
    #[must_use]
    pub fn anger_stage(&self) -> u8 {
        if self.anger >= SENTINEL_ANGER_STAGE_3 {
            3
        } else if self.anger >= SENTINEL_ANGER_STAGE_2 {
            2
        } else {
            1
        }
    }

    #[must_use]
    pub const fn is_smashing(&self) -> bool {
        self.smashing
    }

    #[must_use]
    pub const fn is_guarding(&self) -> bool {
        self.guarding
    }

    #[must_use]
    pub const fn exit(&self) -> Option<Vec2> {
        self.exit
    }

    pub(super) fn speed_factor(&self) -> f32 {
        if self.smashing {
            0.0
        } else if self.guarding {
            SENTINEL_GUARD_SPEED
        } else {
            (SENTINEL_SPEED_MAX - SENTINEL_SPEED_MIN).mul_add(self.anger, SENTINEL_SPEED_MIN)
        }
    }

    pub(super) const fn set_exit(&mut self, pos: Vec2) {
        self.exit = Some(pos);
    }

    pub(super) const fn on_exit_unlocked(&mut self, base: &mut MonsterBase) {
        self.mode = SentinelMode::Guard;
        self.guarding = false;
        base.last_seen = None;
        base.last_seen_timer = 0.0;
    }

    pub(super) const fn on_lured(&mut self) {
        self.guarding = false;
    }

    const fn start_smash(&mut self) {
        self.smashing = true;
        self.smash_progress = 0.0;
    }
}

// ============================================================================
// Obstacles
// ============================================================================

// Runs before anything else so this tick's paths see the opened map
pub(super) fn smash_obstacles(state: &mut SentinelState, base: &MonsterBase, ctx: &mut MonsterContext<'_>) {
    if state.smash_cooldown <= 0.0 && !state.smashing {
        let pos = base.pos;
        if let Some(door) = ctx
            .doors
            .iter_mut()
            .find(|door| door.is_blocking() && distance(pos, door.center()) < SENTINEL_SMASH_RANGE)
        {
            door.destroy();
            state.start_smash();
            state.smash_cooldown = SENTINEL_SMASH_COOLDOWN;
            debug!(x = door.center().x, y = door.center().y, "sentinel smashed door");
        }
    }

    if state.stuck_timer >= SENTINEL_STUCK_TIME
        && state.wall_break_cooldown <= 0.0
        && !state.smashing
        && state.anger_stage() >= 2
    {
        try_break_wall(state, base, ctx.map, ctx.player.pos);
    }
}

fn is_breakable(map: &GameMap, tile: TilePos) -> bool {
    map.is_interior(tile, 2) && map.tile(tile) == Some(Tile::Wall)
}

// Break into the wall between the Sentinel and the player, trying the
// dominant axis first and then its two diagonals
fn try_break_wall(state: &mut SentinelState, base: &MonsterBase, map: &mut GameMap, player: Vec2) {
    let origin = map.world_to_tile(base.pos);
    let delta = player - base.pos;
    let sign = |v: f32| if v > 0.0 { 1 } else { -1 };
    let primary = (
        if delta.x.abs() > delta.y.abs() { sign(delta.x) } else { 0 },
        if delta.y.abs() >= delta.x.abs() { sign(delta.y) } else { 0 },
    );
    let directions = match primary {
        (dx, 0) => [(dx, 0), (dx, 1), (dx, -1)],
        (0, dy) => [(0, dy), (1, dy), (-1, dy)],
        other => [other; 3],
    };

    let Some((dx, dy)) = directions
        .into_iter()
        .find(|&(dx, dy)| is_breakable(map, origin.offset(dx, dy)))
    else {
        return;
    };

    let count = if state.anger_stage() >= 3 { 2 } else { 1 };
    let mut broken = 0;
    for step in 1..=count {
        let tile = origin.offset(dx * step, dy * step);
        if !is_breakable(map, tile) || !map.break_wall(tile) {
            break;
        }
        broken += 1;
    }

    if broken > 0 {
        state.start_smash();
        state.wall_break_cooldown = SENTINEL_WALL_BREAK_COOLDOWN;
        state.stuck_timer = 0.0;
        debug!(tiles = broken, x = origin.x + dx, y = origin.y + dy, "sentinel broke wall");
    }
}

// ============================================================================
// Behaviour
// ============================================================================

pub(super) fn pre_update(
    state: &mut SentinelState,
    base: &mut MonsterBase,
    dt: f32,
    ctx: &mut MonsterContext<'_>,
    senses: &Senses,
) {
    state.patrol_angle += SENTINEL_PATROL_DRIFT * dt;
    if state.smash_cooldown > 0.0 {
        state.smash_cooldown -= dt;
    }
    if state.wall_break_cooldown > 0.0 {
        state.wall_break_cooldown -= dt;
    }
    if state.smashing {
        state.smash_progress += SENTINEL_SMASH_RATE * dt;
        if state.smash_progress >= 1.0 {
            state.smashing = false;
            state.smash_progress = 0.0;
        }
    }

    state.anger = match state.mode {
        SentinelMode::Chase if senses.has_los => state.anger + SENTINEL_ANGER_BUILD_RATE * dt,
        SentinelMode::Chase => state.anger - SENTINEL_ANGER_DECAY_RATE * dt,
        SentinelMode::Guard => 2.0f32.mul_add(-SENTINEL_ANGER_DECAY_RATE * dt, state.anger),
    }
    .clamp(0.0, 1.0);

    let moved = state.last_position.map_or(f32::INFINITY, |last| distance(base.pos, last));
    if state.mode == SentinelMode::Chase && moved < SENTINEL_STUCK_SPEED * dt {
        state.stuck_timer += dt;
    } else {
        state.stuck_timer = 0.0;
    }
    state.last_position = Some(base.pos);

    if base.state == MonsterState::Decoy && base.lure.is_some() {
        return;
    }
    match state.mode {
        SentinelMode::Chase => update_chase(state, base, dt, ctx, senses),
        SentinelMode::Guard => update_guard(state, base, ctx, senses),
    }
}

// Exact aim while visible, then memory, then wander
fn update_chase(state: &mut SentinelState, base: &mut MonsterBase, dt: f32, ctx: &mut MonsterContext<'_>, senses: &Senses) {
    let player = senses.player;
    if player.hiding {
        base.last_seen = None;
        base.last_seen_timer = 0.0;
        wander(state, base, ctx);
    } else if senses.has_los && senses.dist <= MONSTER_LOS_DISTANCE {
        state.wandering = false;
        base.target = Some(player.pos);
        base.last_seen = Some(player.pos);
        base.last_seen_timer = MONSTER_MEMORY_DURATION;
    } else if let Some(seen) = base.last_seen
        && base.last_seen_timer > 0.0
    {
        state.wandering = false;
        base.target = Some(seen);
        base.last_seen_timer -= dt;
    } else {
        wander(state, base, ctx);
    }
}

fn wander(state: &mut SentinelState, base: &mut MonsterBase, ctx: &mut MonsterContext<'_>) {
    let reached = base
        .target
        .is_none_or(|target| distance(base.pos, target) < MONSTER_PATROL_REACHED);
    if !state.wandering || reached {
        base.target = Some(base.random_patrol_point(ctx.map, ctx.rng));
        state.wandering = true;
    }
}

fn update_guard(state: &mut SentinelState, base: &mut MonsterBase, ctx: &mut MonsterContext<'_>, senses: &Senses) {
    let player = senses.player;
    let Some(exit) = state.exit else {
        base.target = Some(player.pos);
        return;
    };

    if senses.has_los && senses.dist <= MONSTER_LOS_DISTANCE {
        base.target = Some(player.pos);
        state.guarding = false;
        return;
    }

    if !state.guarding {
        base.target = Some(exit);
        if distance(base.pos, exit) < SENTINEL_GUARD_RADIUS {
            state.guarding = true;
            state.patrol_angle = ctx.rng.random_range(0.0..TAU);
        }
        return;
    }

    // Walk a ring around the exit, skipping points that land in walls
    let step = TAU / SENTINEL_PATROL_CANDIDATES as f32;
    for i in 0..SENTINEL_PATROL_CANDIDATES {
        let angle = (i as f32).mul_add(step, state.patrol_angle);
        let point = exit + Vec2::new(angle.cos(), angle.sin()) * SENTINEL_PATROL_RADIUS;
        if ctx.map.is_walkable(ctx.map.world_to_tile(point)) {
            base.target = Some(point);
            if distance(base.pos, point) < SENTINEL_PATROL_REACHED {
                state.patrol_angle += FRAC_PI_4;
            }
            return;
        }
    }
    base.target = Some(exit);
}

// Replaces the shared state machine entirely
pub(super) fn update_state(state: &SentinelState, base: &mut MonsterBase) {
    if base.state == MonsterState::Decoy
        && let Some(lure) = base.lure
    {
        base.target = Some(lure.pos);
        return;
    }
    base.state = if state.guarding {
        MonsterState::Patrol
    } else {
        MonsterState::Chase
    };
}

#[cfg(test)]
mod tests {
    use super::super::{Monster, MonsterKind, Variant, testing::*};
    use super::*;
    use crate::{
        events::WorldEvent,
        map::Orientation,
        props::{Decoy, Door},
    };

    fn sentinel(monster: &Monster) -> &SentinelState {
        match monster.variant() {
            Variant::Sentinel(state) => state,
            other => panic!("not a sentinel: {other:?}"),
        }
    }

    fn sentinel_mut(monster: &mut Monster) -> &mut SentinelState {
        match &mut monster.variant {
            Variant::Sentinel(state) => state,
            other => panic!("not a sentinel: {other:?}"),
        }
    }

    #[test]
    fn anger_builds_with_sight_and_decays_without() {
        let mut sandbox = Sandbox::room(30, 20);
        let mut monster = Monster::new(0, MonsterKind::Sentinel, Vec2::new(300.0, 320.0));
        let player = player_at(Vec2::new(500.0, 320.0));

        let mut previous = 0.0;
        for _ in 0..120 {
            sandbox.step(&mut monster, 0.1, player);
            let anger = sentinel(&monster).anger();
            assert!(anger >= previous && anger <= 1.0);
            previous = anger;
        }
        assert!(previous >= SENTINEL_ANGER_STAGE_3);
        assert_eq!(sentinel(&monster).anger_stage(), 3);
        let angry_speed = monster.current_speed();

        let hidden = hidden_player(Vec2::new(500.0, 320.0));
        for _ in 0..600 {
            sandbox.step(&mut monster, 0.1, hidden);
            let anger = sentinel(&monster).anger();
            assert!(anger <= previous && anger >= 0.0);
            previous = anger;
        }
        assert!(previous < SENTINEL_ANGER_STAGE_2);
        if !sentinel(&monster).is_smashing() {
            assert!(monster.current_speed() < angry_speed);
        }
    }

    const WALL_MAP: &[&str] = &[
        "#########",
        "#.......#",
        "#.......#",
        "#..###..#",
        "#..###..#",
        "#.......#",
        "#.......#",
        "#########",
    ];

    #[test]
    fn breaks_one_or_two_tiles_by_stage() {
        for (anger, expected) in [(0.5, 1), (0.9, 2)] {
            let mut sandbox = Sandbox::ascii(WALL_MAP);
            let mut state = SentinelState {
                anger,
                ..SentinelState::default()
            };
            let base = MonsterBase::new(sandbox.map.tile_to_world(TilePos::new(4, 2)));
            let player = sandbox.map.tile_to_world(TilePos::new(4, 6));
            try_break_wall(&mut state, &base, &mut sandbox.map, player);

            let opened = [TilePos::new(4, 3), TilePos::new(4, 4)]
                .into_iter()
                .filter(|&tile| sandbox.map.is_walkable_for_monster(tile))
                .count();
            assert_eq!(opened, expected);
            assert!(state.is_smashing());
            assert!((state.wall_break_cooldown - SENTINEL_WALL_BREAK_COOLDOWN).abs() < 1e-6);
            assert_eq!(sandbox.map.tile(TilePos::new(3, 3)), Some(Tile::Wall));
        }
    }

    #[test]
    fn falls_back_to_diagonals() {
        let mut sandbox = Sandbox::ascii(WALL_MAP);
        let mut state = SentinelState {
            anger: 0.5,
            ..SentinelState::default()
        };
        // Straight ahead is floor, the down-left diagonal is wall
        let base = MonsterBase::new(sandbox.map.tile_to_world(TilePos::new(6, 2)));
        let player = sandbox.map.tile_to_world(TilePos::new(6, 6));
        try_break_wall(&mut state, &base, &mut sandbox.map, player);
        assert!(sandbox.map.is_walkable_for_monster(TilePos::new(5, 3)));
    }

    #[test]
    fn border_walls_survive() {
        let mut sandbox = Sandbox::ascii(WALL_MAP);
        let mut state = SentinelState {
            anger: 1.0,
            ..SentinelState::default()
        };
        let base = MonsterBase::new(sandbox.map.tile_to_world(TilePos::new(1, 1)));
        let player = Vec2::new(-100.0, 48.0);
        try_break_wall(&mut state, &base, &mut sandbox.map, player);
        assert!(!state.is_smashing());
        assert!(sandbox.map.is_wall(TilePos::new(0, 1)));
    }

    #[test]
    fn smashes_closed_doors_and_pauses() {
        let mut sandbox = Sandbox::room(12, 12);
        let door = {
            let mut door = Door::new(5, 5, Orientation::Horizontal, &sandbox.map);
            assert!(door.close());
            door
        };
        let near = door.center() + Vec2::new(0.0, -40.0);
        sandbox.doors.push(door);

        let mut monster = Monster::new(0, MonsterKind::Sentinel, near);
        sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 48.0)));
        assert!(sandbox.doors[0].is_destroyed());
        assert!(sentinel(&monster).is_smashing());
        assert!(monster.current_speed().abs() < f32::EPSILON);
        assert!(!monster.can_kill_player());
        assert_eq!(monster.pos(), near);

        for _ in 0..6 {
            sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 48.0)));
        }
        assert!(!sentinel(&monster).is_smashing());
        assert!(monster.can_kill_player());
    }

    #[test]
    fn guards_the_exit_after_unlock() {
        let mut sandbox = Sandbox::room(20, 20);
        let exit = sandbox.map.tile_to_world(TilePos::new(10, 10));
        let mut monster = Monster::new(0, MonsterKind::Sentinel, exit + Vec2::new(0.0, -200.0));
        monster.base.last_seen = Some(Vec2::new(48.0, 48.0));

        monster.handle_event(&WorldEvent::ExitOpened(exit), &mut sandbox.rng, 0);
        monster.handle_event(&WorldEvent::ExitUnlocked, &mut sandbox.rng, 0);
        assert_eq!(sentinel(&monster).mode(), SentinelMode::Guard);
        assert_eq!(monster.last_seen(), None);

        let hidden = hidden_player(Vec2::new(48.0, 48.0));
        sandbox.step(&mut monster, 0.05, hidden);
        assert_eq!(monster.target(), Some(exit));

        let mut ticks = 0;
        while !sentinel(&monster).is_guarding() {
            sandbox.step(&mut monster, 0.05, hidden);
            ticks += 1;
            assert!(ticks < 200, "never reached the exit");
        }
        sandbox.step(&mut monster, 0.05, hidden);
        assert_eq!(monster.state(), MonsterState::Patrol);
        let ring = monster.target().unwrap();
        assert!((ring.distance(exit) - SENTINEL_PATROL_RADIUS).abs() < 1e-3);
        assert!((monster.current_speed() - monster.base.speed * SENTINEL_GUARD_SPEED).abs() < 1e-4);

        // A decoy pulls it off its post
        sandbox.decoys.push(Decoy::new(3, exit + Vec2::new(150.0, 0.0)));
        sandbox.step(&mut monster, 0.05, hidden);
        assert_eq!(monster.state(), MonsterState::Decoy);
        assert!(!sentinel(&monster).is_guarding());
    }

    #[test]
    fn stuck_timer_only_runs_while_still() {
        let mut sandbox = Sandbox::room(12, 12);
        let mut monster = Monster::new(0, MonsterKind::Sentinel, Vec2::new(200.0, 200.0));
        sentinel_mut(&mut monster).smashing = true;
        sentinel_mut(&mut monster).smash_progress = -100.0;
        for _ in 0..25 {
            sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 48.0)));
        }
        assert!(sentinel(&monster).stuck_timer >= SENTINEL_STUCK_TIME);
    }
}
