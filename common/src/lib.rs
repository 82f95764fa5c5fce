pub mod abilities;
pub mod collision;
pub mod constants;
pub mod events;
pub mod map;
pub mod monsters;
pub mod pathfinding;
pub mod players;
pub mod props;
pub mod world;

pub use world::{GameWorld, Outcome, TickReport, WorldConfig};
