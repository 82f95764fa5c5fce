use bevy_math::Vec2;

use crate::{
    constants::{COLLISION_SNAP_MARGIN, LOS_STEP_FRACTION, PHYSICS_EPSILON},
    map::{GameMap, TilePos},
    props::Door,
};

// Which walkability rules apply to a moving box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Player,
    Monster,
}

// ============================================================================
// Tile Blocking
// ============================================================================

// True when a closed, intact door covers the tile
#[must_use]
pub fn door_blocks(doors: &[Door], tile: TilePos) -> bool {
    doors.iter().any(|door| door.is_blocking() && door.covers(tile))
}

#[must_use]
fn tile_blocks(map: &GameMap, doors: &[Door], tile: TilePos, agent: AgentKind) -> bool {
    let blocked = match agent {
        AgentKind::Player => map.is_wall(tile),
        AgentKind::Monster => !map.is_walkable_for_monster(tile),
    };
    blocked || door_blocks(doors, tile)
}

// ============================================================================
// Box Collision
// ============================================================================

// Test the four corners of a `size` x `size` box centred on `pos`
#[must_use]
pub fn check_collision(pos: Vec2, size: f32, map: &GameMap, doors: &[Door], agent: AgentKind) -> bool {
    let half = size / 2.0;
    [
        Vec2::new(pos.x - half, pos.y - half),
        Vec2::new(pos.x + half, pos.y - half),
        Vec2::new(pos.x - half, pos.y + half),
        Vec2::new(pos.x + half, pos.y + half),
    ]
    .into_iter()
    .any(|corner| tile_blocks(map, doors, map.world_to_tile(corner), agent))
}

// Move by `delta`, sliding along whichever axis stays free.
//
// X is resolved first at the old Y, snapping flush to the blocking tile edge,
// then Y is resolved against the new X. If the result still collides the
// original position is returned.
#[must_use]
pub fn resolve_collision(pos: Vec2, delta: Vec2, size: f32, map: &GameMap, doors: &[Door], agent: AgentKind) -> Vec2 {
    let target = pos + delta;
    if !check_collision(target, size, map, doors, agent) {
        return target;
    }

    let half = size / 2.0;
    let tile_size = map.tile_size();

    let mut resolved = pos;
    if delta.x.abs() > PHYSICS_EPSILON {
        if check_collision(Vec2::new(target.x, pos.y), size, map, doors, agent) {
            resolved.x = snap_axis(target.x, delta.x, half, tile_size);
        } else {
            resolved.x = target.x;
        }
    }

    if delta.y.abs() > PHYSICS_EPSILON {
        if check_collision(Vec2::new(resolved.x, target.y), size, map, doors, agent) {
            resolved.y = snap_axis(target.y, delta.y, half, tile_size);
        } else {
            resolved.y = target.y;
        }
    }

    if check_collision(resolved, size, map, doors, agent) {
        pos
    } else {
        resolved
    }
}

// Place the leading edge just short of the tile boundary it crossed
fn snap_axis(target: f32, motion: f32, half: f32, tile_size: f32) -> f32 {
    if motion > 0.0 {
        let blocked_tile = ((target + half) / tile_size).floor();
        blocked_tile.mul_add(tile_size, -half - COLLISION_SNAP_MARGIN)
    } else {
        let blocked_tile = ((target - half) / tile_size).floor();
        (blocked_tile + 1.0).mul_add(tile_size, half + COLLISION_SNAP_MARGIN)
    }
}

// ============================================================================
// Line of Sight
// ============================================================================

// Sample the segment every half tile; any wall or closed door breaks sight.
// The query is directional: callers that need both ways must ask both ways.
#[must_use]
pub fn line_of_sight(from: Vec2, to: Vec2, map: &GameMap, doors: &[Door]) -> bool {
    let step = map.tile_size() * LOS_STEP_FRACTION;
    let length = distance(from, to);
    let steps = (length / step).ceil() as u32;

    if steps == 0 {
        let tile = map.world_to_tile(from);
        return !map.is_wall(tile) && !door_blocks(doors, tile);
    }

    (0..=steps).all(|i| {
        let point = from.lerp(to, i as f32 / steps as f32);
        let tile = map.world_to_tile(point);
        !map.is_wall(tile) && !door_blocks(doors, tile)
    })
}

// ============================================================================
// Vector Helpers
// ============================================================================

#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

// Unit vector from `from` to `to`, zero when the points coincide
#[must_use]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    let offset = to - from;
    let length = offset.length();
    if length <= PHYSICS_EPSILON {
        Vec2::ZERO
    } else {
        offset / length
    }
}

// ============================================================================
// Tests
// ============================================================================
