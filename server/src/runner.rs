use bevy_ecs::{prelude::*, schedule::ExecutorKind};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::{
    autopilot::Autopilot,
    report::RunReport,
    resources::{RunClock, RunStats},
    systems::{autopilot_system, heartbeat_system, world_tick_system},
};
use common::{GameWorld, Outcome};

// ============================================================================
// Headless Runner
// ============================================================================

// Owns the ECS world holding the game and drives the schedule one tick at a time
pub struct Runner {
    world: World,
    schedule: Schedule,
    tick_duration: Duration,
    max_ticks: u64,
}

impl Runner {
    #[must_use]
    pub fn new(game: GameWorld, hz: u32, max_ticks: u64) -> Self {
        let hz = hz.max(1);
        let mut world = World::new();
        world.insert_resource(game);
        world.insert_resource(Autopilot::new());
        world.insert_resource(RunClock::new(1.0 / hz as f32));
        world.insert_resource(RunStats::default());

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems((autopilot_system, world_tick_system, heartbeat_system).chain());

        Self {
            world,
            schedule,
            tick_duration: Duration::from_nanos(1_000_000_000 / u64::from(hz)),
            max_ticks,
        }
    }

    #[must_use]
    pub fn game(&self) -> &GameWorld {
        self.world.resource::<GameWorld>()
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.game().outcome()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.world.resource::<RunClock>().tick
    }

    #[must_use]
    pub fn stats(&self) -> &RunStats {
        self.world.resource::<RunStats>()
    }

    fn finished(&self) -> bool {
        self.outcome().is_over() || self.ticks() >= self.max_ticks
    }

    pub fn step(&mut self) -> Outcome {
        self.schedule.run(&mut self.world);
        self.outcome()
    }

    // As fast as the CPU allows
    pub fn run(&mut self) -> Outcome {
        info!(max_ticks = self.max_ticks, "running simulation");
        while !self.finished() {
            self.step();
        }
        self.outcome()
    }

    // Paced against the wall clock; late ticks are skipped, not bunched up
    #[instrument(skip(self), fields(max_ticks = self.max_ticks))]
    pub async fn run_realtime(&mut self) -> Outcome {
        let mut interval = time::interval(self.tick_duration);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("running simulation in real time");
        while !self.finished() {
            interval.tick().await;

            let update_start = Instant::now();
            self.step();
            let update_elapsed = update_start.elapsed();

            if update_elapsed > self.tick_duration {
                warn!(
                    "tick {} took {:.2}ms (exceeded {:.2}ms budget)",
                    self.ticks(),
                    update_elapsed.as_secs_f64() * 1000.0,
                    self.tick_duration.as_secs_f64() * 1000.0
                );
            }
        }
        self.outcome()
    }

    #[must_use]
    pub fn report(&self, seed: u64) -> RunReport {
        let game = self.game();
        let stats = self.stats();
        RunReport {
            seed,
            map: game.map().name().to_string(),
            ability: game.player().ability().map(|ability| ability.kind()),
            outcome: game.outcome(),
            ticks: self.ticks(),
            elapsed: game.elapsed(),
            generators_active: game.active_generators(),
            generators_required: game.required_generators(),
            autopilot: self.world.resource::<Autopilot>().state(),
            closest_call: stats.closest_call,
            peak_monsters: stats.peak_monsters,
            events: stats.events.clone(),
            monsters: RunReport::monsters(game),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{WorldConfig, abilities::AbilityKind, map::MapConfig, monsters::MonsterKind};

    const YARD: [&str; 8] = [
        "##############",
        "#............#",
        "#..G.........#",
        "#............#",
        "#............#",
        "#..........X.#",
        "#............#",
        "##############",
    ];

    fn yard(monster: MonsterKind) -> GameWorld {
        let config = WorldConfig {
            seed: 5,
            generator_count: 1,
            monster: Some(monster),
            ability: Some(AbilityKind::Dash),
            ..WorldConfig::default()
        };
        GameWorld::new(&MapConfig::from_ascii("Yard", &YARD).unwrap(), config).unwrap()
    }

    #[test]
    fn autopilot_escapes_an_empty_yard() {
        let mut game = yard(MonsterKind::Kraken);
        game.remove_monsters();
        let mut runner = Runner::new(game, 60, 1200);

        let outcome = runner.run();
        assert_eq!(outcome, Outcome::Escaped);
        assert!(runner.ticks() < 1200);

        let report = runner.report(5);
        assert_eq!(report.generators_active, 1);
        assert_eq!(report.events.get("exit_unlocked"), Some(&1));
        assert_eq!(report.events.get("generator_completed"), Some(&1));
        assert!(report.events.get("footstep").copied().unwrap_or(0) > 0);
        assert!(report.monsters.is_empty());
    }

    #[test]
    fn stops_at_the_tick_limit() {
        let mut runner = Runner::new(yard(MonsterKind::Gazer), 60, 30);
        runner.run();
        assert!(runner.ticks() <= 30);
        if !runner.outcome().is_over() {
            assert_eq!(runner.ticks(), 30);
        }
        assert!(runner.stats().peak_monsters >= 1);
    }

    #[test]
    fn finished_round_stays_frozen() {
        let mut game = yard(MonsterKind::Kraken);
        game.remove_monsters();
        let mut runner = Runner::new(game, 60, 5000);
        let outcome = runner.run();
        assert!(outcome.is_over());
        let world_ticks = runner.game().ticks();
        let elapsed = runner.game().elapsed();

        runner.step();
        assert_eq!(runner.outcome(), outcome);
        assert_eq!(runner.game().ticks(), world_ticks);
        assert!((runner.game().elapsed() - elapsed).abs() < f32::EPSILON);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut runner = Runner::new(yard(MonsterKind::Echo), 30, 10);
        runner.run();
        let json = runner.report(9).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 9);
        assert_eq!(value["map"], "Yard");
        assert_eq!(value["ability"], "dash");
        assert_eq!(value["monsters"][0]["kind"], "echo");
    }

    #[tokio::test]
    async fn realtime_run_reaches_the_limit() {
        let mut runner = Runner::new(yard(MonsterKind::Mimic), 60, 20);
        runner.run_realtime().await;
        assert!(runner.ticks() <= 20);
    }
}
