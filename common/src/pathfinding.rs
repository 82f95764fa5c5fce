use bevy_math::Vec2;
use std::{cmp::Reverse, collections::BinaryHeap, collections::VecDeque};

use crate::{
    collision::door_blocks,
    constants::{PATH_COST_DIAGONAL, PATH_COST_ORTHOGONAL, PATH_GOAL_SNAP_RINGS},
    map::{GameMap, TilePos},
    props::Door,
};

const NO_PARENT: u32 = u32::MAX;

// (dx, dy, cost) for the 8-connected grid
const NEIGHBOURS: [(i32, i32, u32); 8] = [
    (1, 0, PATH_COST_ORTHOGONAL),
    (-1, 0, PATH_COST_ORTHOGONAL),
    (0, 1, PATH_COST_ORTHOGONAL),
    (0, -1, PATH_COST_ORTHOGONAL),
    (1, 1, PATH_COST_DIAGONAL),
    (1, -1, PATH_COST_DIAGONAL),
    (-1, 1, PATH_COST_DIAGONAL),
    (-1, -1, PATH_COST_DIAGONAL),
];

// Open-set key: lowest f, then lowest h, then row, then column
type OpenKey = Reverse<(u32, u32, i32, i32)>;

// ============================================================================
// Passability
// ============================================================================

// Monster walkable and not under a closed door
#[must_use]
pub fn is_passable(map: &GameMap, doors: &[Door], tile: TilePos) -> bool {
    map.is_walkable_for_monster(tile) && !door_blocks(doors, tile)
}

// Breadth-first search over 4-neighbours for the closest passable tile,
// at most `max_rings` steps away
#[must_use]
pub fn nearest_passable(map: &GameMap, doors: &[Door], tile: TilePos, max_rings: u32) -> Option<TilePos> {
    if is_passable(map, doors, tile) {
        return Some(tile);
    }

    let mut visited = std::collections::BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(tile);
    queue.push_back((tile, 0_u32));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_rings {
            continue;
        }
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let next = current.offset(dx, dy);
            if !map.in_bounds(next) || !visited.insert(next) {
                continue;
            }
            if is_passable(map, doors, next) {
                return Some(next);
            }
            queue.push_back((next, depth + 1));
        }
    }
    None
}

const fn heuristic(a: TilePos, b: TilePos) -> u32 {
    (a.x.abs_diff(b.x) + a.y.abs_diff(b.y)) * PATH_COST_ORTHOGONAL
}

// ============================================================================
// Pathfinder
// ============================================================================

// A* search over the monster grid. Scratch buffers are kept between calls.
#[derive(Debug, Default, Clone)]
pub struct Pathfinder {
    g_score: Vec<u32>,
    parent: Vec<u32>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenKey>,
}

impl Pathfinder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // World-space entry point; returns tiles from the start tile to the goal
    pub fn find_path(&mut self, map: &GameMap, doors: &[Door], start: Vec2, goal: Vec2) -> Vec<TilePos> {
        self.find_tile_path(map, doors, map.world_to_tile(start), map.world_to_tile(goal))
    }

    pub fn find_tile_path(&mut self, map: &GameMap, doors: &[Door], start: TilePos, goal: TilePos) -> Vec<TilePos> {
        if !map.in_bounds(start) {
            return Vec::new();
        }
        let Some(goal) = nearest_passable(map, doors, goal, PATH_GOAL_SNAP_RINGS) else {
            return Vec::new();
        };
        if start == goal {
            return vec![start];
        }

        self.reset(map);
        let width = map.width();
        let index = |tile: TilePos| (tile.y * width + tile.x) as usize;

        let start_h = heuristic(start, goal);
        self.g_score[index(start)] = 0;
        self.open.push(Reverse((start_h, start_h, start.y, start.x)));

        while let Some(Reverse((_, _, y, x))) = self.open.pop() {
            let current = TilePos::new(x, y);
            let current_index = index(current);
            if self.closed[current_index] {
                continue;
            }
            self.closed[current_index] = true;

            if current == goal {
                return self.reconstruct(goal, width);
            }

            for (dx, dy, cost) in NEIGHBOURS {
                let next = current.offset(dx, dy);
                if !is_passable(map, doors, next) {
                    continue;
                }
                // No cutting across a blocked corner
                if dx != 0
                    && dy != 0
                    && (!is_passable(map, doors, current.offset(dx, 0)) || !is_passable(map, doors, current.offset(0, dy)))
                {
                    continue;
                }

                let next_index = index(next);
                if self.closed[next_index] {
                    continue;
                }
                let tentative = self.g_score[current_index] + cost;
                if tentative < self.g_score[next_index] {
                    self.g_score[next_index] = tentative;
                    self.parent[next_index] = current_index as u32;
                    let h = heuristic(next, goal);
                    self.open.push(Reverse((tentative + h, h, next.y, next.x)));
                }
            }
        }

        Vec::new()
    }

    fn reset(&mut self, map: &GameMap) {
        let cells = (map.width() * map.height()) as usize;
        self.g_score.clear();
        self.g_score.resize(cells, u32::MAX);
        self.parent.clear();
        self.parent.resize(cells, NO_PARENT);
        self.closed.clear();
        self.closed.resize(cells, false);
        self.open.clear();
    }

    fn reconstruct(&self, goal: TilePos, width: i32) -> Vec<TilePos> {
        let mut path = vec![goal];
        let mut cursor = (goal.y * width + goal.x) as u32;
        while self.parent[cursor as usize] != NO_PARENT {
            cursor = self.parent[cursor as usize];
            let cell = cursor as i32;
            path.push(TilePos::new(cell % width, cell / width));
        }
        path.reverse();
        path
    }
}

// ============================================================================
// Tests
// ============================================================================
