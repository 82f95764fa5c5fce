// ============================================================================
// Simulation Clock
// ============================================================================

pub const MAX_TICK_DELTA: f32 = 0.1; // seconds, clamp after a stall

// ============================================================================
// Floating-Point Comparisons
// ============================================================================

// Small value for floating-point comparisons (near-zero checks, division guards).
pub const PHYSICS_EPSILON: f32 = 1e-6;

// ============================================================================
// Grid
// ============================================================================

pub const TILE_SIZE: f32 = 32.0; // pixels per tile
pub const COLLISION_SNAP_MARGIN: f32 = 0.1; // pixels kept between an entity and a wall edge
pub const LOS_STEP_FRACTION: f32 = 0.5; // sample every half tile

// ============================================================================
// Terrain
// ============================================================================

pub const PUDDLE_SPEED_MULTIPLIER: f32 = 0.6;
pub const CONVEYOR_SPEED: f32 = 100.0; // pixels per second

// ============================================================================
// Pathfinding
// ============================================================================

pub const PATH_COST_ORTHOGONAL: u32 = 10;
pub const PATH_COST_DIAGONAL: u32 = 14;
pub const PATH_GOAL_SNAP_RINGS: u32 = 10; // BFS depth when the goal tile is blocked

// ============================================================================
// Player
// ============================================================================

pub const PLAYER_SPEED: f32 = 180.0; // pixels per second
pub const PLAYER_SIZE: f32 = 24.0; // pixels
pub const PLAYER_MOVING_EPSILON: f32 = 1.0; // pixels per second
pub const FOOTSTEP_INTERVAL: f32 = 0.3; // seconds
pub const FOOTSTEP_INTERVAL_SURGING: f32 = 0.15; // seconds

// ============================================================================
// Abilities
// ============================================================================

pub const DASH_COOLDOWN: f32 = 8.0; // seconds
pub const DASH_DURATION: f32 = 0.2; // seconds
pub const DASH_SPEED: f32 = 800.0; // pixels per second at full ease
pub const DASH_BORDER_MARGIN: f32 = 1.5; // tiles kept from the map edge

pub const SURGE_COOLDOWN: f32 = 12.0; // seconds
pub const SURGE_DURATION: f32 = 4.0; // seconds
pub const SURGE_SPEED_MULTIPLIER: f32 = 1.8;
pub const SURGE_FOOTSTEP_MULTIPLIER: f32 = 3.0;

pub const PULSE_COOLDOWN: f32 = 15.0; // seconds
pub const PULSE_DURATION: f32 = 2.0; // seconds

pub const BARRICADE_COOLDOWN: f32 = 10.0; // seconds
pub const BARRICADE_DURATION: f32 = 5.0; // seconds
pub const BARRICADE_DISTANCE: f32 = 2.0; // tiles ahead of the player

pub const DECOY_COOLDOWN: f32 = 12.0; // seconds
pub const DECOY_LURE_TIME: f32 = 5.0; // seconds

// ============================================================================
// Props
// ============================================================================

pub const GENERATOR_COUNT: usize = 5;
pub const GENERATOR_INTERACT_RADIUS: f32 = 50.0; // pixels
pub const GENERATOR_ACTIVATE_TIME: f32 = 1.0; // seconds

pub const DOOR_CLOSE_DURATION: f32 = 5.0; // seconds
pub const DOOR_COOLDOWN: f32 = 8.0; // seconds
pub const DOOR_INTERACT_RADIUS: f32 = 60.0; // pixels, two-tile door

pub const CABINET_HIDE_DURATION: f32 = 5.0; // seconds
pub const CABINET_COOLDOWN: f32 = 8.0; // seconds
pub const CABINET_INTERACT_RADIUS: f32 = TILE_SIZE * 1.2; // pixels

pub const EXIT_INTERACT_RADIUS: f32 = 50.0; // pixels
pub const EXIT_EDGE_BAND: i32 = 2; // tiles from the border
pub const EXIT_MIN_PLAYER_DISTANCE: f32 = 200.0; // pixels

// ============================================================================
// Spawning
// ============================================================================

pub const SPAWN_ATTEMPTS: usize = 200;
pub const SPAWN_CLEARANCE: f32 = 100.0; // pixels from generators, doors, exit and earlier spawns
pub const MONSTER_SPAWN_DISTANCE: f32 = 300.0; // pixels from the player

// ============================================================================
// Monsters
// ============================================================================

pub const MONSTER_SIZE: f32 = 28.0; // pixels
pub const MONSTER_BASE_SPEED: f32 = 100.0; // pixels per second
pub const MONSTER_SPEED_INCREMENT: f32 = 8.0; // per activated generator
pub const MONSTER_PATH_UPDATE_INTERVAL: f32 = 0.25; // seconds
pub const MONSTER_LEAD_TIME: f32 = 0.4; // seconds of player velocity extrapolation
pub const MONSTER_LOS_DISTANCE: f32 = 300.0; // pixels
pub const MONSTER_MEMORY_DURATION: f32 = 3.0; // seconds
pub const MONSTER_SEARCH_DURATION: f32 = 2.0; // seconds
pub const MONSTER_HEARING_RANGE: f32 = 250.0; // pixels
pub const MONSTER_INVESTIGATION_DURATION: f32 = 2.0; // seconds

pub const MONSTER_WAYPOINT_RADIUS: f32 = 5.0; // pixels
pub const MONSTER_PATROL_REACHED: f32 = 30.0; // pixels
pub const MONSTER_SEARCH_REACHED: f32 = 30.0; // pixels
pub const MONSTER_INVESTIGATE_REACHED: f32 = 40.0; // pixels
pub const MONSTER_SEARCH_OFFSET: f32 = 60.0; // pixels
pub const MONSTER_PATROL_ATTEMPTS: usize = 50;

// Gazer
pub const GAZER_SPEED_WATCHED: f32 = 0.2;
pub const GAZER_SPEED_UNSEEN: f32 = 1.6;
pub const GAZER_VIEW_DISTANCE: f32 = 200.0; // pixels, player flashlight reach
pub const GAZER_STARE_THRESHOLD: f32 = 3.0; // seconds
pub const GAZER_CIRCLE_DURATION: f32 = 2.0; // seconds
pub const GAZER_CIRCLE_RADIUS: f32 = 150.0; // pixels
pub const GAZER_CIRCLE_RATE: f32 = 1.5; // radians per second

// Phantom
pub const PHANTOM_SPEED_INVISIBLE: f32 = 1.4;
pub const PHANTOM_SPEED_VISIBLE: f32 = 0.8;
pub const PHANTOM_FLICKER_DURATION: f32 = 0.5; // seconds
pub const PHANTOM_MATERIALIZE_TIME: f32 = 0.3; // seconds
pub const PHANTOM_KILL_THRESHOLD: f32 = 0.8; // materialize progress

// Echo
pub const ECHO_HEARING_RANGE: f32 = 500.0; // pixels
pub const ECHO_SOUND_MEMORY: f32 = 6.0; // seconds
pub const ECHO_GENERATOR_INTENSITY: f32 = 2.0;
pub const ECHO_GENERATOR_ACTIVE_BOOST: f32 = 1.2;
pub const ECHO_EXIT_INTENSITY: f32 = 2.5;
pub const ECHO_DOOR_INTENSITY: f32 = 1.5;
pub const ECHO_FOOTSTEP_INTENSITY: f32 = 0.6;
pub const ECHO_SPRINT_INTENSITY: f32 = 1.0;

// Mimic
pub const MIMIC_RECORD_INTERVAL: f32 = 0.1; // seconds
pub const MIMIC_MAX_RECORDED_POINTS: usize = 30; // three seconds of samples
pub const MIMIC_REPLAY_SPEED: f32 = 1.2;
pub const MIMIC_STOP_THRESHOLD: f32 = 0.5; // seconds
pub const MIMIC_REPLAY_REACHED: f32 = 20.0; // pixels

// Fracture
pub const FRACTURE_MAX_COUNT: usize = 4;
pub const FRACTURE_MAX_GENERATION: u8 = 2;
pub const FRACTURE_SPLIT_CHANCE: f32 = 0.02; // per second while pressured
pub const FRACTURE_PRESSURE_DISTANCE: f32 = 200.0; // pixels
pub const FRACTURE_SPLIT_ON_GENERATOR: f64 = 0.7;
pub const FRACTURE_SPLIT_ON_FAILED_CHASE: f64 = 0.4;
pub const FRACTURE_SPEED_PER_SPLIT: f32 = 1.15;
pub const FRACTURE_SIZE_PER_SPLIT: f32 = 0.5;
pub const FRACTURE_LEAD_REDUCTION: f32 = 0.3; // lead time fraction lost per generation
pub const FRACTURE_CRACK_WARNING_TIME: f32 = 1.0; // seconds
pub const FRACTURE_SPLIT_OFFSET: f32 = 20.0; // pixels

// Sentinel
pub const SENTINEL_SMASH_RANGE: f32 = 50.0; // pixels
pub const SENTINEL_SMASH_COOLDOWN: f32 = 1.0; // seconds
pub const SENTINEL_SMASH_RATE: f32 = 4.0; // animation progress per second
pub const SENTINEL_GUARD_RADIUS: f32 = 80.0; // pixels
pub const SENTINEL_PATROL_RADIUS: f32 = 120.0; // pixels
pub const SENTINEL_PATROL_CANDIDATES: usize = 8;
pub const SENTINEL_PATROL_REACHED: f32 = 30.0; // pixels
pub const SENTINEL_PATROL_DRIFT: f32 = 0.5; // radians per second
pub const SENTINEL_WALL_BREAK_COOLDOWN: f32 = 2.0; // seconds
pub const SENTINEL_STUCK_TIME: f32 = 1.0; // seconds
pub const SENTINEL_STUCK_SPEED: f32 = 5.0; // pixels per second, slower counts as stuck
pub const SENTINEL_ANGER_BUILD_RATE: f32 = 0.08; // per second
pub const SENTINEL_ANGER_DECAY_RATE: f32 = 0.02; // per second
pub const SENTINEL_ANGER_STAGE_2: f32 = 0.4;
pub const SENTINEL_ANGER_STAGE_3: f32 = 0.75;
pub const SENTINEL_SPEED_MIN: f32 = 0.9;
pub const SENTINEL_SPEED_MAX: f32 = 1.4;
pub const SENTINEL_GUARD_SPEED: f32 = 0.7;
