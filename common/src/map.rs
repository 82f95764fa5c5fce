use anyhow::{Context, Result, bail, ensure};
use bevy_math::Vec2;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::TILE_SIZE;

// ============================================================================
// Tiles
// ============================================================================

// Grid coordinate. Ordered row first so iteration over sets is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct TilePos {
    pub y: i32,
    pub x: i32,
}

impl TilePos {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tile {
    Floor = 0,
    Wall = 1,
    Vent = 2,
    Barricade = 99,
}

impl Tile {
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Floor),
            1 => Some(Self::Wall),
            2 => Some(Self::Vent),
            99 => Some(Self::Barricade),
            _ => None,
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Map Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct DoorSpec {
    pub x: i32,
    pub y: i32,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum ZoneKind {
    Puddle,
    ConveyorLeft,
    ConveyorRight,
}

// Rectangle of tiles with a terrain effect on the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct Zone {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: ZoneKind,
}

impl Zone {
    #[must_use]
    pub fn contains(&self, pos: Vec2, tile_size: f32) -> bool {
        let min_x = self.x as f32 * tile_size;
        let min_y = self.y as f32 * tile_size;
        let max_x = (self.x + self.width) as f32 * tile_size;
        let max_y = (self.y + self.height) as f32 * tile_size;
        pos.x >= min_x && pos.x <= max_x && pos.y >= min_y && pos.y <= max_y
    }
}

// Static description of a level, loadable from JSON
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
pub struct MapConfig {
    pub name: String,
    pub data: Vec<Vec<u8>>,
    #[cfg_attr(feature = "json", serde(default))]
    pub generator_spawns: Vec<TilePos>,
    #[cfg_attr(feature = "json", serde(default))]
    pub doors: Vec<DoorSpec>,
    #[cfg_attr(feature = "json", serde(default))]
    pub cabinets: Vec<TilePos>,
    #[cfg_attr(feature = "json", serde(default))]
    pub zones: Vec<Zone>,
    #[cfg_attr(feature = "json", serde(default))]
    pub exit: Option<TilePos>,
}

const FACILITY_LAYOUT: [&str; 20] = [
    "##############################",
    "#G...........#..............G#",
    "#............#...............#",
    "#....C.......d.......C.......#",
    "#............................#",
    "######D.######v#####D.########",
    "#............................#",
    "#..G.....#..........#.....G..#",
    "#........#....##....#........#",
    "#........#....##....#........#",
    "#........v..........d........#",
    "#........#...................#",
    "#........#....##....#........#",
    "#####.####....##....####.#####",
    "#............................#",
    "#..C.........................#",
    "#.......#####D.#####......C..#",
    "#.......#....G.....#.........#",
    "#.......v..........#....X....#",
    "##############################",
];

impl MapConfig {
    // Build a config from a text grid.
    //
    // `#` wall, `.` floor, `v` vent, `B` barricade. Markers sit on floor tiles:
    // `G` generator spawn, `C` cabinet, `X` exit, `D` horizontal door origin,
    // `d` vertical door origin.
    pub fn from_ascii(name: &str, rows: &[&str]) -> Result<Self> {
        let mut config = Self {
            name: name.to_string(),
            data: Vec::with_capacity(rows.len()),
            generator_spawns: Vec::new(),
            doors: Vec::new(),
            cabinets: Vec::new(),
            zones: Vec::new(),
            exit: None,
        };

        for (y, row) in rows.iter().enumerate() {
            let mut codes = Vec::with_capacity(row.len());
            for (x, ch) in row.chars().enumerate() {
                let tile = TilePos::new(x as i32, y as i32);
                let code = match ch {
                    '#' => Tile::Wall,
                    '.' => Tile::Floor,
                    'v' => Tile::Vent,
                    'B' => Tile::Barricade,
                    'G' => {
                        config.generator_spawns.push(tile);
                        Tile::Floor
                    }
                    'C' => {
                        config.cabinets.push(tile);
                        Tile::Floor
                    }
                    'X' => {
                        config.exit = Some(tile);
                        Tile::Floor
                    }
                    'D' | 'd' => {
                        let orientation = if ch == 'D' {
                            Orientation::Horizontal
                        } else {
                            Orientation::Vertical
                        };
                        config.doors.push(DoorSpec {
                            x: tile.x,
                            y: tile.y,
                            orientation,
                        });
                        Tile::Floor
                    }
                    other => bail!("unknown map character {other:?} at ({x}, {y})"),
                };
                codes.push(code.code());
            }
            config.data.push(codes);
        }

        Ok(config)
    }

    // Built-in facility used when no map file is given
    #[must_use]
    pub fn facility() -> Self {
        let mut config = Self::from_ascii("Facility", &FACILITY_LAYOUT).unwrap_or_else(|_| Self::empty_room(30, 20));
        config.zones = vec![
            Zone {
                x: 1,
                y: 6,
                width: 28,
                height: 1,
                kind: ZoneKind::ConveyorRight,
            },
            Zone {
                x: 1,
                y: 14,
                width: 4,
                height: 3,
                kind: ZoneKind::Puddle,
            },
        ];
        config
    }

    // Open room of floor tiles bordered by walls
    #[must_use]
    pub fn empty_room(width: usize, height: usize) -> Self {
        let width = width.max(3);
        let height = height.max(3);
        let data = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                            Tile::Wall.code()
                        } else {
                            Tile::Floor.code()
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            name: format!("Room {width}x{height}"),
            data,
            generator_spawns: Vec::new(),
            doors: Vec::new(),
            cabinets: Vec::new(),
            zones: Vec::new(),
            exit: None,
        }
    }

    // Horizontal mirror of the whole layout
    #[must_use]
    pub fn mirrored(&self) -> Self {
        let width = self.data.first().map_or(0, Vec::len) as i32;
        let flip = |tile: TilePos| TilePos::new(width - 1 - tile.x, tile.y);

        Self {
            name: format!("{} (Mirrored)", self.name),
            data: self
                .data
                .iter()
                .map(|row| row.iter().rev().copied().collect())
                .collect(),
            generator_spawns: self.generator_spawns.iter().copied().map(flip).collect(),
            doors: self
                .doors
                .iter()
                .map(|door| match door.orientation {
                    // A horizontal door spans x and x + 1, so its origin moves one further left
                    Orientation::Horizontal => DoorSpec {
                        x: width - 2 - door.x,
                        ..*door
                    },
                    Orientation::Vertical => DoorSpec {
                        x: width - 1 - door.x,
                        ..*door
                    },
                })
                .collect(),
            cabinets: self.cabinets.iter().copied().map(flip).collect(),
            zones: self
                .zones
                .iter()
                .map(|zone| Zone {
                    x: width - zone.x - zone.width,
                    kind: match zone.kind {
                        ZoneKind::ConveyorLeft => ZoneKind::ConveyorRight,
                        ZoneKind::ConveyorRight => ZoneKind::ConveyorLeft,
                        ZoneKind::Puddle => ZoneKind::Puddle,
                    },
                    ..*zone
                })
                .collect(),
            exit: self.exit.map(flip),
        }
    }

    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse map config")
    }

    #[cfg(feature = "json")]
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize map config")
    }
}

// ============================================================================
// Game Map
// ============================================================================

#[derive(Debug, Clone)]
pub struct GameMap {
    name: String,
    width: i32,
    height: i32,
    tile_size: f32,
    tiles: Vec<Tile>,
    // Single overlay for every temporary obstacle (barricades)
    temporary_walls: BTreeSet<TilePos>,
    zones: Vec<Zone>,
}

impl GameMap {
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        let height = config.data.len();
        ensure!(height >= 3, "map {:?} needs at least 3 rows", config.name);
        let width = config.data[0].len();
        ensure!(width >= 3, "map {:?} needs at least 3 columns", config.name);

        let mut tiles = Vec::with_capacity(width * height);
        for (y, row) in config.data.iter().enumerate() {
            ensure!(
                row.len() == width,
                "map {:?} row {y} has {} tiles, expected {width}",
                config.name,
                row.len()
            );
            for (x, &code) in row.iter().enumerate() {
                let tile = Tile::from_code(code)
                    .with_context(|| format!("map {:?} has unknown tile code {code} at ({x}, {y})", config.name))?;
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                ensure!(
                    !border || tile == Tile::Wall,
                    "map {:?} border tile ({x}, {y}) must be a wall",
                    config.name
                );
                tiles.push(tile);
            }
        }

        Ok(Self {
            name: config.name.clone(),
            width: width as i32,
            height: height as i32,
            tile_size: TILE_SIZE,
            tiles,
            temporary_walls: BTreeSet::new(),
            zones: config.zones.clone(),
        })
    }

    // ------------------------------------------------------------------------
    // Dimensions
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[must_use]
    pub const fn in_bounds(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    // At least `margin` tiles away from every border
    #[must_use]
    pub const fn is_interior(&self, tile: TilePos, margin: i32) -> bool {
        tile.x >= margin && tile.y >= margin && tile.x < self.width - margin && tile.y < self.height - margin
    }

    #[must_use]
    pub fn tile(&self, tile: TilePos) -> Option<Tile> {
        if !self.in_bounds(tile) {
            return None;
        }
        Some(self.tiles[(tile.y * self.width + tile.x) as usize])
    }

    // ------------------------------------------------------------------------
    // Walkability
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn is_wall(&self, tile: TilePos) -> bool {
        match self.tile(tile) {
            None | Some(Tile::Wall | Tile::Barricade) => true,
            Some(_) => self.temporary_walls.contains(&tile),
        }
    }

    // Player walkability: floor and vents
    #[must_use]
    pub fn is_walkable(&self, tile: TilePos) -> bool {
        matches!(self.tile(tile), Some(Tile::Floor | Tile::Vent)) && !self.temporary_walls.contains(&tile)
    }

    // Monster walkability: floor only, vents stay player shortcuts
    #[must_use]
    pub fn is_walkable_for_monster(&self, tile: TilePos) -> bool {
        self.tile(tile) == Some(Tile::Floor) && !self.temporary_walls.contains(&tile)
    }

    #[must_use]
    pub fn is_vent(&self, tile: TilePos) -> bool {
        self.tile(tile) == Some(Tile::Vent)
    }

    // ------------------------------------------------------------------------
    // Coordinates
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn world_to_tile(&self, pos: Vec2) -> TilePos {
        TilePos::new(
            (pos.x / self.tile_size).floor() as i32,
            (pos.y / self.tile_size).floor() as i32,
        )
    }

    #[must_use]
    pub fn tile_to_world(&self, tile: TilePos) -> Vec2 {
        Vec2::new(
            (tile.x as f32).mul_add(self.tile_size, self.tile_size / 2.0),
            (tile.y as f32).mul_add(self.tile_size, self.tile_size / 2.0),
        )
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    pub fn set_temporary_wall(&mut self, tile: TilePos, blocked: bool) {
        if blocked {
            self.temporary_walls.insert(tile);
        } else {
            self.temporary_walls.remove(&tile);
        }
    }

    #[must_use]
    pub fn is_temporary_wall(&self, tile: TilePos) -> bool {
        self.temporary_walls.contains(&tile)
    }

    #[must_use]
    pub fn temporary_wall_count(&self) -> usize {
        self.temporary_walls.len()
    }

    // Permanently turn an interior wall into floor. Returns false if nothing changed.
    pub fn break_wall(&mut self, tile: TilePos) -> bool {
        if !self.is_interior(tile, 1) || self.tile(tile) != Some(Tile::Wall) {
            return false;
        }
        self.tiles[(tile.y * self.width + tile.x) as usize] = Tile::Floor;
        true
    }

    // ------------------------------------------------------------------------
    // Terrain
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    #[must_use]
    pub fn is_in_puddle(&self, pos: Vec2) -> bool {
        self.zones
            .iter()
            .any(|zone| zone.kind == ZoneKind::Puddle && zone.contains(pos, self.tile_size))
    }

    // Horizontal drift from conveyor belts under `pos`, in pixels per second
    #[must_use]
    pub fn conveyor_drift(&self, pos: Vec2, speed: f32) -> f32 {
        self.zones
            .iter()
            .filter(|zone| zone.contains(pos, self.tile_size))
            .map(|zone| match zone.kind {
                ZoneKind::ConveyorRight => speed,
                ZoneKind::ConveyorLeft => -speed,
                ZoneKind::Puddle => 0.0,
            })
            .sum()
    }

    // Every tile the player can stand on, row by row
    pub fn walkable_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| TilePos::new(x, y)))
            .filter(|&tile| self.is_walkable(tile))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> GameMap {
        GameMap::from_config(&MapConfig::empty_room(10, 10)).unwrap()
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let map = room();
        for tile in [TilePos::new(-1, 3), TilePos::new(3, -1), TilePos::new(10, 3), TilePos::new(3, 10)] {
            assert!(map.is_wall(tile));
            assert!(!map.is_walkable(tile));
            assert!(!map.is_walkable_for_monster(tile));
        }
    }

    #[test]
    fn vents_are_player_only() {
        let config = MapConfig::from_ascii("vent", &["#####", "#.v.#", "#####"]).unwrap();
        let map = GameMap::from_config(&config).unwrap();
        let vent = TilePos::new(2, 1);
        assert!(map.is_vent(vent));
        assert!(map.is_walkable(vent));
        assert!(!map.is_walkable_for_monster(vent));
        assert!(!map.is_wall(vent));
    }

    #[test]
    fn barricade_code_blocks_everyone() {
        let config = MapConfig::from_ascii("barricade", &["#####", "#.B.#", "#####"]).unwrap();
        let map = GameMap::from_config(&config).unwrap();
        let tile = TilePos::new(2, 1);
        assert!(map.is_wall(tile));
        assert!(!map.is_walkable(tile));
        assert!(!map.is_walkable_for_monster(tile));
    }

    #[test]
    fn temporary_overlay_is_seen_by_every_query() {
        let mut map = room();
        let tile = TilePos::new(4, 4);
        map.set_temporary_wall(tile, true);
        assert!(map.is_wall(tile));
        assert!(!map.is_walkable(tile));
        assert!(!map.is_walkable_for_monster(tile));

        map.set_temporary_wall(tile, false);
        assert!(!map.is_wall(tile));
        assert!(map.is_walkable_for_monster(tile));
        assert_eq!(map.temporary_wall_count(), 0);
    }

    #[test]
    fn tile_world_conversion() {
        let map = room();
        assert_eq!(map.world_to_tile(Vec2::new(0.0, 0.0)), TilePos::new(0, 0));
        assert_eq!(map.world_to_tile(Vec2::new(31.9, 64.0)), TilePos::new(0, 2));
        assert_eq!(map.world_to_tile(Vec2::new(-0.5, 10.0)), TilePos::new(-1, 0));
        assert_eq!(map.tile_to_world(TilePos::new(2, 3)), Vec2::new(80.0, 112.0));
        let tile = TilePos::new(7, 5);
        assert_eq!(map.world_to_tile(map.tile_to_world(tile)), tile);
    }

    #[test]
    fn break_wall_only_touches_interior_walls() {
        let config = MapConfig::from_ascii("walls", &["#######", "#.....#", "#..#..#", "#.....#", "#######"]).unwrap();
        let mut map = GameMap::from_config(&config).unwrap();
        assert!(!map.break_wall(TilePos::new(0, 2)));
        assert!(!map.break_wall(TilePos::new(1, 1)));
        assert!(map.break_wall(TilePos::new(3, 2)));
        assert!(map.is_walkable_for_monster(TilePos::new(3, 2)));
    }

    #[test]
    fn open_border_is_rejected() {
        let config = MapConfig::from_ascii("leaky", &["#.#", "#.#", "###"]).unwrap();
        assert!(GameMap::from_config(&config).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let config = MapConfig::from_ascii("ragged", &["####", "#..#", "###"]).unwrap();
        assert!(GameMap::from_config(&config).is_err());
    }

    #[test]
    fn unknown_characters_are_rejected() {
        assert!(MapConfig::from_ascii("bad", &["###", "#?#", "###"]).is_err());
    }

    #[test]
    fn facility_layout_is_valid() {
        let config = MapConfig::facility();
        assert_eq!(config.name, "Facility");
        let map = GameMap::from_config(&config).unwrap();
        assert_eq!((map.width(), map.height()), (30, 20));
        assert_eq!(config.generator_spawns.len(), 5);
        assert_eq!(config.doors.len(), 5);
        assert_eq!(config.cabinets.len(), 4);
        assert!(config.exit.is_some());
        for door in &config.doors {
            assert!(map.is_walkable_for_monster(TilePos::new(door.x, door.y)));
        }
    }

    #[test]
    fn mirroring_flips_markers() {
        let config = MapConfig::facility();
        let mirrored = config.mirrored();
        let map = GameMap::from_config(&mirrored).unwrap();
        for door in &mirrored.doors {
            assert!(map.is_walkable_for_monster(TilePos::new(door.x, door.y)));
            if door.orientation == Orientation::Horizontal {
                assert!(map.is_walkable_for_monster(TilePos::new(door.x + 1, door.y)));
            }
        }
        let exit = mirrored.exit.unwrap();
        assert_eq!(exit.x, 29 - config.exit.unwrap().x);
    }

    #[test]
    fn zones_affect_terrain_queries() {
        let map = GameMap::from_config(&MapConfig::facility()).unwrap();
        let on_belt = map.tile_to_world(TilePos::new(5, 6));
        assert!((map.conveyor_drift(on_belt, 100.0) - 100.0).abs() < f32::EPSILON);
        let in_puddle = map.tile_to_world(TilePos::new(2, 15));
        assert!(map.is_in_puddle(in_puddle));
        assert!(!map.is_in_puddle(on_belt));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_round_trip_keeps_layout() {
        let config = MapConfig::facility();
        let json = config.to_json_string().unwrap();
        assert_eq!(MapConfig::from_json_str(&json).unwrap(), config);
    }
}
