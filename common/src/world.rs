use anyhow::{Context, Result, ensure};
use bevy_ecs::prelude::Resource;
use bevy_math::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    abilities::{AbilityCatalog, AbilityKind},
    collision::{AgentKind, distance},
    constants::{
        EXIT_EDGE_BAND, EXIT_MIN_PLAYER_DISTANCE, FOOTSTEP_INTERVAL, FOOTSTEP_INTERVAL_SURGING, FRACTURE_MAX_COUNT,
        GENERATOR_COUNT, MAX_TICK_DELTA, MONSTER_SPAWN_DISTANCE, PLAYER_MOVING_EPSILON, SPAWN_ATTEMPTS,
        SPAWN_CLEARANCE,
    },
    events::WorldEvent,
    map::{GameMap, MapConfig, TilePos},
    monsters::{Monster, MonsterCatalog, MonsterContext, MonsterKind},
    players::{AbilityUse, Player, PlayerInput},
    props::{Cabinet, Decoy, Door, Exit, Generator},
};

// ============================================================================
// Configuration and Results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    pub seed: u64,
    pub generator_count: usize,
    // Random pick from the catalog when unset
    pub monster: Option<MonsterKind>,
    pub ability: Option<AbilityKind>,
    // Mirror the map and the horizontal controls
    pub mirror: bool,
    // One of every monster kind
    pub nightmare: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            generator_count: GENERATOR_COUNT,
            monster: None,
            ability: None,
            mirror: false,
            nightmare: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Outcome {
    Running,
    Escaped,
    Caught { id: u32, kind: MonsterKind },
}

impl Outcome {
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    // Events dispatched to the monsters this tick, in order
    pub events: Vec<WorldEvent>,
    pub outcome: Outcome,
}

// ============================================================================
// Game World
// ============================================================================

/// One round of the facility: map, props, the survivor and every monster.
///
/// All simulation state lives here and only [`GameWorld::tick`] advances it.
/// Monsters are kept in a plain arena; Fracture offspring are appended after
/// the monster pass and first move on the following tick.
#[derive(Resource, Debug)]
pub struct GameWorld {
    map: GameMap,
    doors: Vec<Door>,
    generators: Vec<Generator>,
    cabinets: Vec<Cabinet>,
    decoys: Vec<Decoy>,
    exit_tile: Option<TilePos>,
    exit: Option<Exit>,
    player: Player,
    monsters: Vec<Monster>,
    rng: StdRng,
    mirror: bool,
    footstep_timer: f32,
    next_monster_id: u32,
    next_decoy_id: u32,
    elapsed: f32,
    ticks: u64,
    outcome: Outcome,
}

impl GameWorld {
    pub fn new(map_config: &MapConfig, config: WorldConfig) -> Result<Self> {
        let map_config = if config.mirror {
            map_config.mirrored()
        } else {
            map_config.clone()
        };
        let map = GameMap::from_config(&map_config).with_context(|| format!("failed to load map {:?}", map_config.name))?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut spawns = map_config.generator_spawns.clone();
        spawns.shuffle(&mut rng);
        spawns.truncate(config.generator_count);
        ensure!(
            !spawns.is_empty(),
            "map {:?} has no generator spawns for {} generators",
            map_config.name,
            config.generator_count
        );
        let generators: Vec<Generator> = spawns
            .into_iter()
            .map(|tile| Generator::new(map.tile_to_world(tile)))
            .collect();

        let doors: Vec<Door> = map_config
            .doors
            .iter()
            .map(|spec| Door::new(spec.x, spec.y, spec.orientation, &map))
            .collect();
        let cabinets = map_config
            .cabinets
            .iter()
            .map(|&tile| Cabinet::new(map.tile_to_world(tile)))
            .collect();

        let mut occupied: Vec<Vec2> = generators.iter().map(|generator| generator.pos).collect();
        occupied.extend(doors.iter().map(Door::center));
        occupied.extend(map_config.exit.map(|tile| map.tile_to_world(tile)));

        let spawn = find_spawn_point(&map, &mut rng, &occupied, None, AgentKind::Player);
        let mut player = Player::new(spawn);
        occupied.push(spawn);

        let ability = config
            .ability
            .unwrap_or_else(|| AbilityKind::ALL[rng.random_range(0..AbilityKind::ALL.len())]);
        player.equip(AbilityCatalog::new().get(ability).clone());

        let catalog = MonsterCatalog::new();
        let kinds = if config.nightmare {
            MonsterKind::ALL.to_vec()
        } else {
            vec![config.monster.unwrap_or_else(|| catalog.choose(&mut rng))]
        };
        let mut monsters = Vec::with_capacity(kinds.len());
        for (id, kind) in (0u32..).zip(kinds) {
            let pos = find_spawn_point(&map, &mut rng, &occupied, Some(spawn), AgentKind::Monster);
            occupied.push(pos);
            monsters.push(catalog.spawn(kind, id, pos));
        }
        let next_monster_id = monsters.len() as u32;

        info!(
            map = map.name(),
            generators = generators.len(),
            ability = %ability,
            monsters = ?monsters.iter().map(Monster::kind).collect::<Vec<_>>(),
            "world created"
        );

        Ok(Self {
            map,
            doors,
            generators,
            cabinets,
            decoys: Vec::new(),
            exit_tile: map_config.exit,
            exit: None,
            player,
            monsters,
            rng,
            mirror: config.mirror,
            footstep_timer: 0.0,
            next_monster_id,
            next_decoy_id: 0,
            elapsed: 0.0,
            ticks: 0,
            outcome: Outcome::Running,
        })
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    #[must_use]
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    #[must_use]
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    #[must_use]
    pub fn cabinets(&self) -> &[Cabinet] {
        &self.cabinets
    }

    #[must_use]
    pub fn decoys(&self) -> &[Decoy] {
        &self.decoys
    }

    #[must_use]
    pub const fn exit(&self) -> Option<&Exit> {
        self.exit.as_ref()
    }

    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    // Simulated seconds since the round started
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn active_generators(&self) -> usize {
        self.generators.iter().filter(|generator| generator.is_active()).count()
    }

    #[must_use]
    pub fn required_generators(&self) -> usize {
        self.generators.len()
    }

    #[must_use]
    pub fn nearest_monster(&self) -> Option<&Monster> {
        let pos = self.player.pos;
        self.monsters
            .iter()
            .min_by(|a, b| distance(a.pos(), pos).total_cmp(&distance(b.pos(), pos)))
    }

    // ------------------------------------------------------------------------
    // Scenario setup
    // ------------------------------------------------------------------------

    // Move the player, leaving any cabinet
    pub fn teleport_player(&mut self, pos: Vec2) {
        if let Some(index) = self.player.hiding_in()
            && let Some(cabinet) = self.cabinets.get_mut(index)
        {
            cabinet.release();
        }
        self.player.leave_cabinet();
        self.player.pos = pos;
        self.player.vel = Vec2::ZERO;
    }

    pub fn spawn_monster(&mut self, kind: MonsterKind, pos: Vec2) -> u32 {
        let id = self.next_monster_id;
        self.next_monster_id += 1;
        self.monsters.push(Monster::new(id, kind, pos));
        id
    }

    pub fn remove_monsters(&mut self) {
        self.monsters.clear();
    }

    fn fracture_slots(&self) -> usize {
        let live = self
            .monsters
            .iter()
            .filter(|monster| monster.kind() == MonsterKind::Fracture)
            .count();
        FRACTURE_MAX_COUNT.saturating_sub(live)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the round by `dt` seconds (clamped to [`MAX_TICK_DELTA`]).
    ///
    /// Props update and raise their events first, every monster hears those
    /// events, and only then do the monsters move. A finished round is frozen.
    pub fn tick(&mut self, dt: f32, input: &PlayerInput) -> TickReport {
        if self.outcome.is_over() {
            return TickReport {
                events: Vec::new(),
                outcome: self.outcome,
            };
        }
        let dt = dt.clamp(0.0, MAX_TICK_DELTA);
        self.elapsed += dt;
        self.ticks += 1;

        let mut input = *input;
        if self.mirror {
            input.movement.x = -input.movement.x;
        }

        let mut events = Vec::new();
        self.update_player(dt, &input);
        self.update_footsteps(dt, &mut events);
        self.decoys.iter_mut().for_each(|decoy| decoy.update(dt));
        self.decoys.retain(Decoy::is_active);
        self.update_generators(dt, &input, &mut events);
        self.update_doors(dt, &input, &mut events);
        self.update_cabinets(dt, &input);

        self.dispatch(&events);
        self.update_monsters(dt);

        self.outcome = self.check_outcome(&input);
        if let Outcome::Caught { id, kind } = self.outcome {
            info!(monster = id, %kind, elapsed = self.elapsed, "player caught");
        } else if self.outcome == Outcome::Escaped {
            info!(elapsed = self.elapsed, "player escaped");
        }

        TickReport {
            events,
            outcome: self.outcome,
        }
    }

    fn update_player(&mut self, dt: f32, input: &PlayerInput) {
        self.player.update(dt, input, &mut self.map, &self.doors);
        if !input.use_ability {
            return;
        }
        match self.player.use_ability(&mut self.map) {
            Some(AbilityUse::Decoy(pos)) => {
                self.decoys.push(Decoy::new(self.next_decoy_id, pos));
                self.next_decoy_id += 1;
            }
            Some(AbilityUse::Barricade(tiles)) => debug!(tiles = tiles.len(), "barricade placed"),
            Some(_) | None => {}
        }
    }

    fn update_footsteps(&mut self, dt: f32, events: &mut Vec<WorldEvent>) {
        if self.player.vel.length() <= PLAYER_MOVING_EPSILON {
            return;
        }
        let surging = self.player.is_surging();
        let interval = if surging {
            FOOTSTEP_INTERVAL_SURGING
        } else {
            FOOTSTEP_INTERVAL
        };
        self.footstep_timer += dt;
        if self.footstep_timer >= interval {
            self.footstep_timer = 0.0;
            events.push(WorldEvent::Footstep {
                pos: self.player.pos,
                sprinting: surging,
                loudness: self.player.footstep_loudness(),
            });
        }
    }

    fn update_generators(&mut self, dt: f32, input: &PlayerInput, events: &mut Vec<WorldEvent>) {
        let pos = self.player.pos;
        let working = input.interact_held && !self.player.is_hiding();
        let mut completed = Vec::new();

        for generator in &mut self.generators {
            if generator.is_active() {
                continue;
            }
            if !(working && generator.is_in_range(pos)) {
                generator.cancel_activation();
                continue;
            }
            generator.start_activation();
            events.push(WorldEvent::GeneratorActivating(generator.pos));
            if generator.update_activation(dt) {
                completed.push(generator.pos);
            }
        }

        for generator_pos in completed {
            let active_count = self.active_generators();
            info!(
                active = active_count,
                required = self.required_generators(),
                "generator completed"
            );
            events.push(WorldEvent::GeneratorCompleted {
                pos: generator_pos,
                active_count,
            });
            if active_count >= self.required_generators() && self.exit.is_none() {
                let exit = self.spawn_exit();
                info!(x = exit.pos.x, y = exit.pos.y, "exit opened");
                events.push(WorldEvent::ExitOpened(exit.pos));
                events.push(WorldEvent::ExitUnlocked);
            }
        }
    }

    fn update_doors(&mut self, dt: f32, input: &PlayerInput, events: &mut Vec<WorldEvent>) {
        let pos = self.player.pos;
        let hiding = self.player.is_hiding();
        for door in &mut self.doors {
            door.update(dt);
            if input.interact_pressed && !hiding && door.is_in_range(pos) && door.close() {
                debug!(x = door.center().x, y = door.center().y, "door closed");
                events.push(WorldEvent::DoorClosed(door.center()));
            }
        }
    }

    fn update_cabinets(&mut self, dt: f32, input: &PlayerInput) {
        let mut pressed = input.interact_pressed;
        for (index, cabinet) in self.cabinets.iter_mut().enumerate() {
            let inside = self.player.hiding_in() == Some(index);
            if cabinet.update(dt) && inside {
                debug!(cabinet = index, "forced out of cabinet");
                self.player.leave_cabinet();
                continue;
            }
            if !pressed {
                continue;
            }
            if inside {
                cabinet.release();
                self.player.leave_cabinet();
                pressed = false;
            } else if !self.player.is_hiding() && cabinet.is_in_range(self.player.pos) && cabinet.hide() {
                debug!(cabinet = index, "player hiding");
                self.player.enter_cabinet(index, cabinet.pos);
                pressed = false;
            }
        }
    }

    fn dispatch(&mut self, events: &[WorldEvent]) {
        for event in events {
            let slots = self.fracture_slots();
            for monster in &mut self.monsters {
                monster.handle_event(event, &mut self.rng, slots);
            }
        }
    }

    fn update_monsters(&mut self, dt: f32) {
        let player = self.player.snapshot();
        let mut slots = self.fracture_slots();
        let mut spawns = Vec::new();
        for monster in &mut self.monsters {
            let mut ctx = MonsterContext {
                map: &mut self.map,
                doors: &mut self.doors,
                decoys: &self.decoys,
                player,
                rng: &mut self.rng,
                fracture_slots: &mut slots,
            };
            if let Some(request) = monster.update(dt, &mut ctx) {
                spawns.push(request);
            }
        }
        for request in spawns {
            let id = self.next_monster_id;
            self.next_monster_id += 1;
            self.monsters.push(Monster::fracture_offspring(id, &request));
        }
    }

    fn check_outcome(&self, input: &PlayerInput) -> Outcome {
        let player = self.player.snapshot();
        if player.hiding {
            return Outcome::Running;
        }
        if input.interact_pressed
            && let Some(exit) = &self.exit
            && exit.is_in_range(player.pos)
        {
            return Outcome::Escaped;
        }
        self.monsters
            .iter()
            .find(|monster| monster.can_kill_player() && monster.touches(&player))
            .map_or(Outcome::Running, |monster| Outcome::Caught {
                id: monster.id,
                kind: monster.kind(),
            })
    }

    // ------------------------------------------------------------------------
    // Exit
    // ------------------------------------------------------------------------

    // A fixed exit from the map wins; otherwise a walkable tile near the border
    // and away from the player.
    fn spawn_exit(&mut self) -> Exit {
        let tile = self.exit_tile.unwrap_or_else(|| self.random_edge_tile());
        let exit = Exit::new(tile, &self.map);
        self.exit = Some(exit);
        exit
    }

    fn random_edge_tile(&mut self) -> TilePos {
        let (width, height) = (self.map.width(), self.map.height());
        let mut edge: Vec<TilePos> = self
            .map
            .walkable_tiles()
            .filter(|tile| !self.map.is_interior(*tile, EXIT_EDGE_BAND + 1))
            .collect();
        edge.shuffle(&mut self.rng);

        let player = self.player.pos;
        edge.iter()
            .copied()
            .find(|&tile| distance(self.map.tile_to_world(tile), player) >= EXIT_MIN_PLAYER_DISTANCE)
            .or_else(|| edge.first().copied())
            .unwrap_or_else(|| TilePos::new(width / 2, height / 2))
    }
}

// ============================================================================
// Spawning
// ============================================================================

// Random walkable tile clear of `occupied` and, when given, far from
// `away_from`. Falls back to the first interior tile.
fn find_spawn_point(
    map: &GameMap,
    rng: &mut StdRng,
    occupied: &[Vec2],
    away_from: Option<Vec2>,
    agent: AgentKind,
) -> Vec2 {
    let walkable = |tile: TilePos| match agent {
        AgentKind::Player => map.is_walkable(tile),
        AgentKind::Monster => map.is_walkable_for_monster(tile),
    };

    for _ in 0..SPAWN_ATTEMPTS {
        let tile = TilePos::new(rng.random_range(0..map.width()), rng.random_range(0..map.height()));
        if !walkable(tile) {
            continue;
        }
        let pos = map.tile_to_world(tile);
        if occupied.iter().any(|&other| distance(pos, other) < SPAWN_CLEARANCE) {
            continue;
        }
        if away_from.is_some_and(|other| distance(pos, other) < MONSTER_SPAWN_DISTANCE) {
            continue;
        }
        return pos;
    }

    (1..map.height() - 1)
        .flat_map(|y| (1..map.width() - 1).map(move |x| TilePos::new(x, y)))
        .find(|&tile| walkable(tile))
        .map_or_else(
            || map.tile_to_world(TilePos::new(map.width() / 2, map.height() / 2)),
            |tile| map.tile_to_world(tile),
        )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{DECOY_LURE_TIME, FRACTURE_MAX_GENERATION},
        monsters::{MonsterState, Variant},
    };

    const HALL: [&str; 12] = [
        "##############################",
        "#............................#",
        "#.G.......................G..#",
        "#............................#",
        "#............................#",
        "#....C.......................#",
        "#............................#",
        "#............................#",
        "#............................#",
        "#.......................G....#",
        "#............................#",
        "##############################",
    ];

    fn hall() -> MapConfig {
        MapConfig::from_ascii("Hall", &HALL).unwrap()
    }

    fn world(monster: MonsterKind) -> GameWorld {
        let config = WorldConfig {
            seed: 3,
            monster: Some(monster),
            ability: Some(AbilityKind::Decoy),
            ..WorldConfig::default()
        };
        GameWorld::new(&hall(), config).unwrap()
    }

    // World with the monsters removed so props can be tested in peace
    fn empty_world() -> GameWorld {
        let mut world = world(MonsterKind::Kraken);
        world.monsters.clear();
        world
    }

    fn hold() -> PlayerInput {
        PlayerInput {
            interact_held: true,
            ..PlayerInput::default()
        }
    }

    fn press() -> PlayerInput {
        PlayerInput {
            interact_pressed: true,
            ..PlayerInput::default()
        }
    }

    fn activate_all(world: &mut GameWorld) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        let targets: Vec<Vec2> = world.generators.iter().map(|generator| generator.pos).collect();
        for pos in targets {
            world.player.pos = pos;
            for _ in 0..12 {
                events.extend(world.tick(0.1, &hold()).events);
            }
        }
        events
    }

    #[test]
    fn spawns_respect_clearances() {
        for seed in 0..20 {
            let config = WorldConfig {
                seed,
                ..WorldConfig::default()
            };
            let world = GameWorld::new(&hall(), config).unwrap();
            assert_eq!(world.required_generators(), 3);
            assert_eq!(world.monsters().len(), 1);

            let player = world.player().pos;
            for generator in world.generators() {
                assert!(distance(generator.pos, player) >= SPAWN_CLEARANCE);
            }
            assert!(distance(world.monsters()[0].pos(), player) >= MONSTER_SPAWN_DISTANCE);
            assert!(world.player().ability().is_some());
        }
    }

    #[test]
    fn generator_count_is_limited_by_spawns() {
        let config = WorldConfig {
            generator_count: 2,
            ..WorldConfig::default()
        };
        assert_eq!(GameWorld::new(&hall(), config).unwrap().required_generators(), 2);

        let bare = MapConfig::empty_room(10, 10);
        assert!(GameWorld::new(&bare, WorldConfig::default()).is_err());
    }

    #[test]
    fn nightmare_spawns_every_kind() {
        let config = WorldConfig {
            nightmare: true,
            ..WorldConfig::default()
        };
        let world = GameWorld::new(&MapConfig::facility(), config).unwrap();
        let kinds: Vec<MonsterKind> = world.monsters().iter().map(Monster::kind).collect();
        assert_eq!(kinds, MonsterKind::ALL.to_vec());
    }

    #[test]
    fn delta_is_clamped() {
        let mut world = empty_world();
        world.tick(2.0, &PlayerInput::default());
        assert!((world.elapsed() - MAX_TICK_DELTA).abs() < 1e-6);
        assert_eq!(world.ticks(), 1);
    }

    #[test]
    fn footsteps_follow_movement() {
        let mut world = empty_world();
        world.player.pos = Vec2::new(100.0, 200.0);
        let mut steps = 0;
        for _ in 0..10 {
            let report = world.tick(0.1, &PlayerInput::moving(Vec2::new(1.0, 0.0)));
            steps += report
                .events
                .iter()
                .filter(|event| matches!(event, WorldEvent::Footstep { sprinting: false, .. }))
                .count();
        }
        assert!((2..=3).contains(&steps), "steps {steps}");

        let mut quiet = 0;
        for _ in 0..10 {
            quiet += world.tick(0.1, &PlayerInput::default()).events.len();
        }
        assert_eq!(quiet, 0);
    }

    #[test]
    fn holding_a_generator_reports_progress_then_completion() {
        let mut world = world(MonsterKind::Kraken);
        let generator = world.generators[0].pos;
        world.player.pos = generator;
        // Opposite end of the hall, too far to catch up within a second
        world.monsters[0].base.pos = if generator.x < 480.0 {
            Vec2::new(880.0, 300.0)
        } else {
            Vec2::new(80.0, 300.0)
        };

        let mut activating = 0;
        let mut completed = Vec::new();
        for _ in 0..12 {
            for event in world.tick(0.1, &hold()).events {
                match event {
                    WorldEvent::GeneratorActivating(pos) => {
                        assert_eq!(pos, generator);
                        activating += 1;
                    }
                    WorldEvent::GeneratorCompleted { active_count, .. } => completed.push(active_count),
                    _ => {}
                }
            }
        }
        assert!((10..=11).contains(&activating), "activating {activating}");
        assert_eq!(completed, vec![1]);
        assert_eq!(world.active_generators(), 1);
        assert_eq!(world.monsters()[0].generators_activated(), 1);
    }

    #[test]
    fn walking_away_cancels_activation() {
        let mut world = empty_world();
        world.player.pos = world.generators[0].pos;
        for _ in 0..5 {
            world.tick(0.1, &hold());
        }
        assert!(world.generators()[0].progress() > 0.0);
        world.tick(0.1, &PlayerInput::default());
        assert!(world.generators()[0].progress().abs() < f32::EPSILON);
        assert!(!world.generators()[0].is_activating());
    }

    #[test]
    fn last_generator_opens_the_exit() {
        let mut world = empty_world();
        let events = activate_all(&mut world);

        let completed = events
            .iter()
            .filter(|event| matches!(event, WorldEvent::GeneratorCompleted { .. }))
            .count();
        assert_eq!(completed, 3);
        let opened = events
            .iter()
            .position(|event| matches!(event, WorldEvent::ExitOpened(_)))
            .expect("exit never opened");
        assert_eq!(events.get(opened + 1), Some(&WorldEvent::ExitUnlocked));

        let exit = *world.exit().unwrap();
        assert!(!world.map().is_interior(exit.tile, EXIT_EDGE_BAND + 1));
        assert!(world.map().is_walkable(exit.tile));
        assert!(distance(exit.pos, world.player().pos) >= EXIT_MIN_PLAYER_DISTANCE);

        // A Sentinel hearing the same events switches to guarding
        world.monsters.push(Monster::new(9, MonsterKind::Sentinel, Vec2::new(480.0, 200.0)));
        world.dispatch(&events);
        let Variant::Sentinel(sentinel) = world.monsters()[0].variant() else {
            panic!("expected a sentinel");
        };
        assert_eq!(sentinel.exit(), Some(exit.pos));
        assert!(world.monsters()[0].flags().contains(&"guard"));
    }

    #[test]
    fn reaching_the_exit_wins_and_freezes_the_round() {
        let mut world = empty_world();
        activate_all(&mut world);
        world.player.pos = world.exit().unwrap().pos;
        assert_eq!(world.tick(0.1, &press()).outcome, Outcome::Escaped);

        let frozen = world.ticks();
        let report = world.tick(0.1, &PlayerInput::default());
        assert_eq!(report.outcome, Outcome::Escaped);
        assert_eq!(world.ticks(), frozen);
    }

    #[test]
    fn contact_with_a_monster_loses() {
        let mut world = world(MonsterKind::Kraken);
        world.player.pos = Vec2::new(480.0, 250.0);
        world.monsters[0].base.pos = Vec2::new(490.0, 250.0);
        let report = world.tick(0.05, &PlayerInput::default());
        assert_eq!(
            report.outcome,
            Outcome::Caught {
                id: 0,
                kind: MonsterKind::Kraken
            }
        );
    }

    #[test]
    fn hiding_in_a_cabinet_is_safe() {
        let mut world = world(MonsterKind::Kraken);
        let cabinet = world.cabinets[0].pos;
        world.player.pos = cabinet + Vec2::new(10.0, 0.0);
        world.monsters[0].base.pos = Vec2::new(900.0, 340.0);
        world.tick(0.05, &press());
        assert!(world.player().is_hiding());
        assert_eq!(world.player().pos, cabinet);

        world.monsters[0].base.pos = cabinet;
        for _ in 0..10 {
            assert_eq!(world.tick(0.05, &PlayerInput::default()).outcome, Outcome::Running);
        }
        assert_ne!(world.monsters()[0].state(), MonsterState::Chase);

        // Pressing again leaves the cabinet right next to the monster
        world.monsters[0].base.pos = cabinet;
        assert!(world.tick(0.05, &press()).outcome.is_over());
    }

    #[test]
    fn cabinet_forces_the_player_out() {
        let mut world = empty_world();
        world.player.pos = world.cabinets[0].pos;
        world.tick(0.1, &press());
        assert!(world.player().is_hiding());
        for _ in 0..52 {
            world.tick(0.1, &PlayerInput::default());
        }
        assert!(!world.player().is_hiding());
        assert!(!world.cabinets()[0].can_hide());
    }

    #[test]
    fn decoys_are_dropped_and_expire() {
        let mut world = empty_world();
        world.player.pos = Vec2::new(480.0, 200.0);
        let use_ability = PlayerInput {
            use_ability: true,
            ..PlayerInput::default()
        };
        world.tick(0.1, &use_ability);
        assert_eq!(world.decoys().len(), 1);
        assert_eq!(world.decoys()[0].pos, Vec2::new(480.0, 200.0));

        let ticks = (DECOY_LURE_TIME / 0.1) as usize + 1;
        for _ in 0..ticks {
            world.tick(0.1, &PlayerInput::default());
        }
        assert!(world.decoys().is_empty());
    }

    #[test]
    fn mirror_flips_horizontal_controls() {
        let config = WorldConfig {
            mirror: true,
            ..WorldConfig::default()
        };
        let mut world = GameWorld::new(&hall(), config).unwrap();
        world.monsters.clear();
        world.player.pos = Vec2::new(480.0, 200.0);
        world.tick(0.1, &PlayerInput::moving(Vec2::new(1.0, 0.0)));
        assert!(world.player().pos.x < 480.0);
    }

    #[test]
    fn fracture_offspring_stay_within_the_cap() {
        let mut world = world(MonsterKind::Fracture);
        world.player.pos = world.cabinets[0].pos;
        world.tick(0.05, &press());
        assert!(world.player().is_hiding());
        world.monsters[0].base.pos = Vec2::new(700.0, 200.0);

        for _ in 0..70 {
            let slots = world.fracture_slots();
            for monster in &mut world.monsters {
                if let Variant::Fracture(state) = &mut monster.variant {
                    state.start_split(slots);
                }
            }
            world.tick(0.05, &PlayerInput::default());
            assert!(world.monsters().len() <= FRACTURE_MAX_COUNT);
        }

        assert_eq!(world.monsters().len(), FRACTURE_MAX_COUNT);
        let mut ids: Vec<u32> = world.monsters().iter().map(|monster| monster.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), FRACTURE_MAX_COUNT);
        for monster in world.monsters() {
            let Variant::Fracture(state) = monster.variant() else {
                panic!("unexpected {:?}", monster.kind());
            };
            assert!(state.generation() <= FRACTURE_MAX_GENERATION);
        }
    }
}
