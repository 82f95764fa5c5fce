use bevy_ecs::prelude::Resource;
use std::collections::BTreeMap;

use common::{GameWorld, TickReport, collision::distance};

// ============================================================================
// Bevy Resources
// ============================================================================

// Fixed step shared by every system in the schedule
#[derive(Resource, Debug)]
pub struct RunClock {
    pub dt: f32,
    pub tick: u64,
    pub next_heartbeat: f32,
}

impl RunClock {
    #[must_use]
    pub const fn new(dt: f32) -> Self {
        Self {
            dt,
            tick: 0,
            next_heartbeat: 0.0,
        }
    }
}

// Running tallies for the end-of-run report
#[derive(Resource, Debug, Default)]
pub struct RunStats {
    pub events: BTreeMap<&'static str, u64>,
    // Smallest gap between the exposed player and a monster that could kill them
    pub closest_call: Option<f32>,
    pub peak_monsters: usize,
}

impl RunStats {
    pub fn record(&mut self, report: &TickReport, world: &GameWorld) {
        for event in &report.events {
            *self.events.entry(event.name()).or_default() += 1;
        }
        self.peak_monsters = self.peak_monsters.max(world.monsters().len());

        let player = world.player();
        if player.is_hiding() {
            return;
        }
        let nearest = world
            .monsters()
            .iter()
            .filter(|monster| monster.can_kill_player())
            .map(|monster| distance(monster.pos(), player.pos))
            .min_by(f32::total_cmp);
        if let Some(gap) = nearest {
            self.closest_call = Some(self.closest_call.map_or(gap, |best| best.min(gap)));
        }
    }
}
