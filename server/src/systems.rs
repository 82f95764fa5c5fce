use bevy_ecs::prelude::*;
use tracing::{debug, info};

use crate::{
    autopilot::Autopilot,
    constants::HEARTBEAT_INTERVAL,
    resources::{RunClock, RunStats},
};
use common::GameWorld;

// ============================================================================
// Simulation Systems
// ============================================================================

// Systems run chained in this order every tick:
// 1. The autopilot reads the world and picks this tick's input
// 2. The world advances one step with that input
// 3. The heartbeat counts the tick and logs progress now and then

pub fn autopilot_system(world: Res<GameWorld>, clock: Res<RunClock>, mut pilot: ResMut<Autopilot>) {
    pilot.plan(clock.dt, &world);
}

pub fn world_tick_system(
    mut world: ResMut<GameWorld>,
    pilot: Res<Autopilot>,
    clock: Res<RunClock>,
    mut stats: ResMut<RunStats>,
) {
    let input = *pilot.input();
    let report = world.tick(clock.dt, &input);
    for event in &report.events {
        debug!(event = event.name(), pos = ?event.position(), "world event");
    }
    stats.record(&report, &world);
}

pub fn heartbeat_system(world: Res<GameWorld>, pilot: Res<Autopilot>, mut clock: ResMut<RunClock>) {
    clock.tick += 1;
    if world.elapsed() < clock.next_heartbeat {
        return;
    }
    clock.next_heartbeat += HEARTBEAT_INTERVAL;

    info!(
        tick = clock.tick,
        elapsed = %format!("{:.1}s", world.elapsed()),
        generators = %format!("{}/{}", world.active_generators(), world.required_generators()),
        autopilot = ?pilot.state(),
        monsters = world.monsters().len(),
        "heartbeat"
    );
    for monster in world.monsters() {
        debug!(
            id = monster.id,
            kind = %monster.kind(),
            state = monster.state_name(),
            x = monster.pos().x,
            y = monster.pos().y,
            speed = monster.current_speed(),
            flags = ?monster.flags(),
            "monster"
        );
    }
}
