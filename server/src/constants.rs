// ============================================================================
// Runner
// ============================================================================

pub const DEFAULT_TICK_FREQUENCY: u32 = 60; // Hz
pub const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 5; // five simulated minutes at 60 Hz
pub const HEARTBEAT_INTERVAL: f32 = 5.0; // simulated seconds between status lines
pub const LOG_FILTER: &str = "info";

// ============================================================================
// Autopilot
// ============================================================================

pub const AUTOPILOT_PANIC_DISTANCE: f32 = 150.0; // pixels
pub const AUTOPILOT_PANIC_TIME: f32 = 2.0; // seconds
pub const AUTOPILOT_ACTIVATE_DISTANCE: f32 = 40.0; // pixels
pub const AUTOPILOT_EXIT_DISTANCE: f32 = 30.0; // pixels
pub const AUTOPILOT_PATH_INTERVAL: f32 = 0.3; // seconds
pub const AUTOPILOT_WAYPOINT_RADIUS: f32 = 5.0; // pixels
pub const AUTOPILOT_FLEE_DISTANCES: [f32; 5] = [8.0, 6.0, 4.0, 3.0, 2.0]; // tiles
pub const AUTOPILOT_FLEE_ANGLES: [f32; 8] = [0.0, 0.3, -0.3, 0.6, -0.6, 0.9, -0.9, std::f32::consts::PI]; // radians
pub const AUTOPILOT_FLEE_GAIN: f32 = 0.8; // a flee tile must keep this share of the current distance
