use tracing::trace;

use super::{
    Monster, MonsterBase, MonsterContext, MonsterState, Prediction, SpawnRequest, Variant, echo, fracture, gazer,
    mimic, phantom, sentinel,
};
use crate::{
    collision::{distance, line_of_sight},
    constants::{
        MONSTER_HEARING_RANGE, MONSTER_INVESTIGATE_REACHED, MONSTER_MEMORY_DURATION, MONSTER_PATROL_REACHED,
        MONSTER_SEARCH_DURATION, MONSTER_SEARCH_REACHED,
    },
    players::PlayerSnapshot,
    props::Decoy,
};

// Per-tick perception shared by every hook
#[derive(Debug, Clone, Copy)]
pub(crate) struct Senses {
    pub player: PlayerSnapshot,
    pub has_los: bool,
    pub dist: f32,
}

impl Monster {
    // Advance one tick. A Fracture that finishes splitting hands back its offspring.
    pub fn update(&mut self, dt: f32, ctx: &mut MonsterContext<'_>) -> Option<SpawnRequest> {
        if let Variant::Sentinel(state) = &mut self.variant {
            sentinel::smash_obstacles(state, &mut self.base, ctx);
        }

        self.check_for_decoys(ctx.decoys);
        self.update_lure(dt, ctx.decoys);

        let player = ctx.player;
        let has_los = !player.hiding && line_of_sight(self.base.pos, player.pos, ctx.map, ctx.doors);
        let senses = Senses {
            player,
            has_los,
            dist: distance(self.base.pos, player.pos),
        };

        if player.hiding && self.base.state == MonsterState::Chase {
            self.base.state = MonsterState::Search;
            self.base.search_timer = MONSTER_SEARCH_DURATION;
            self.base.generate_search_pattern(ctx.map);
            self.base.last_seen = None;
        }

        let spawn = self.pre_update(dt, ctx, &senses);
        self.update_state_machine(dt, ctx, &senses);
        self.post_update(&senses);

        self.update_pathfinding(dt, ctx);
        self.update_movement(dt, ctx);
        spawn
    }

    // ------------------------------------------------------------------------
    // Decoys
    // ------------------------------------------------------------------------

    fn check_for_decoys(&mut self, decoys: &[Decoy]) {
        if self.base.state == MonsterState::Decoy
            && let Some(lure) = self.base.lure
            && decoys.iter().any(|decoy| decoy.id == lure.id && decoy.is_active())
        {
            return;
        }

        let pos = self.base.pos;
        let Some(decoy) = decoys
            .iter()
            .find(|decoy| decoy.is_active() && distance(pos, decoy.pos) <= MONSTER_HEARING_RANGE)
        else {
            return;
        };

        trace!(monster = self.id, decoy = decoy.id, "lured by decoy");
        self.base.lure_to(decoy);
        if let Variant::Sentinel(state) = &mut self.variant {
            state.on_lured();
        }
    }

    fn update_lure(&mut self, dt: f32, decoys: &[Decoy]) {
        if self.base.state != MonsterState::Decoy {
            return;
        }
        if self.base.lure_timer > 0.0 {
            self.base.lure_timer -= dt;
        }
        let still_active = self
            .base
            .lure
            .is_some_and(|lure| decoys.iter().any(|decoy| decoy.id == lure.id && decoy.is_active()));
        if self.base.lure_timer <= 0.0 || !still_active {
            self.base.lure = None;
            self.base.state = MonsterState::Patrol;
        }
    }

    // ------------------------------------------------------------------------
    // Variant hooks
    // ------------------------------------------------------------------------

    fn pre_update(&mut self, dt: f32, ctx: &mut MonsterContext<'_>, senses: &Senses) -> Option<SpawnRequest> {
        match &mut self.variant {
            Variant::Kraken => None,
            Variant::Gazer(state) => {
                gazer::pre_update(state, &self.base, dt, ctx, senses);
                None
            }
            Variant::Phantom(state) => {
                phantom::pre_update(state, dt, senses);
                None
            }
            Variant::Echo(state) => {
                echo::pre_update(state, &mut self.base, dt);
                None
            }
            Variant::Mimic(state) => {
                mimic::pre_update(state, dt, senses);
                None
            }
            Variant::Fracture(state) => fracture::pre_update(state, &mut self.base, dt, ctx, senses),
            Variant::Sentinel(state) => {
                sentinel::pre_update(state, &mut self.base, dt, ctx, senses);
                None
            }
        }
    }

    fn post_update(&mut self, senses: &Senses) {
        match &mut self.variant {
            Variant::Gazer(state) => gazer::post_update(state, &mut self.base, senses),
            Variant::Mimic(state) => mimic::post_update(state, &self.base),
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    fn update_state_machine(&mut self, dt: f32, ctx: &mut MonsterContext<'_>, senses: &Senses) {
        match &mut self.variant {
            Variant::Sentinel(state) => {
                sentinel::update_state(state, &mut self.base);
                return;
            }
            Variant::Mimic(state) => {
                if let Some(point) = state.replay_point() {
                    self.base.target = Some(point);
                    self.base.state = MonsterState::Chase;
                    return;
                }
            }
            _ => {}
        }

        let previous = self.base.state;
        if self.base.state == MonsterState::Decoy
            && let Some(lure) = self.base.lure
        {
            self.base.target = Some(lure.pos);
            return;
        }

        if self.should_chase(senses.has_los, senses.dist) {
            let prediction = self.prediction();
            enter_chase(&mut self.base, senses, prediction, ctx);
        } else {
            match self.base.state {
                MonsterState::Chase => {
                    update_lost_chase(&mut self.base, dt, ctx);
                    if self.base.state == MonsterState::Search
                        && let Variant::Fracture(state) = &mut self.variant
                    {
                        state.on_chase_lost(ctx.rng, *ctx.fracture_slots);
                    }
                }
                MonsterState::Investigate => update_investigate(&mut self.base, dt),
                MonsterState::Search => update_search(&mut self.base, dt),
                MonsterState::Patrol => update_patrol(&mut self.base, ctx),
                MonsterState::Decoy => {}
            }
        }

        if self.base.state != previous {
            trace!(
                monster = self.id,
                from = previous.as_str(),
                to = self.base.state.as_str(),
                "state change"
            );
        }
    }
}

// ============================================================================
// Shared State Handlers
// ============================================================================

fn enter_chase(base: &mut MonsterBase, senses: &Senses, prediction: Prediction, ctx: &MonsterContext<'_>) {
    base.state = MonsterState::Chase;
    base.target = Some(base.predicted_target(&senses.player, prediction, ctx.map));
    base.last_seen = Some(senses.player.pos);
    base.last_seen_timer = MONSTER_MEMORY_DURATION;
}

// Chasing without sight: follow memory, then fall back to a search
fn update_lost_chase(base: &mut MonsterBase, dt: f32, ctx: &MonsterContext<'_>) {
    if base.last_seen_timer > 0.0 {
        base.last_seen_timer -= dt;
        base.target = base.last_seen;
        return;
    }
    base.state = MonsterState::Search;
    base.search_timer = MONSTER_SEARCH_DURATION;
    base.generate_search_pattern(ctx.map);
}

fn update_investigate(base: &mut MonsterBase, dt: f32) {
    let Some(spot) = base.investigate_pos else {
        base.state = MonsterState::Patrol;
        return;
    };
    base.target = Some(spot);
    base.investigate_timer -= dt;
    if distance(base.pos, spot) < MONSTER_INVESTIGATE_REACHED || base.investigate_timer <= 0.0 {
        base.investigate_pos = None;
        base.state = MonsterState::Patrol;
    }
}

fn update_search(base: &mut MonsterBase, dt: f32) {
    base.search_timer -= dt;
    if base.search_timer <= 0.0 {
        base.state = MonsterState::Patrol;
        return;
    }
    let Some(&point) = base.search_pattern.get(base.search_index) else {
        return;
    };
    base.target = Some(point);
    if distance(base.pos, point) < MONSTER_SEARCH_REACHED {
        base.search_index = (base.search_index + 1) % base.search_pattern.len();
    }
}

fn update_patrol(base: &mut MonsterBase, ctx: &mut MonsterContext<'_>) {
    let needs_point = base
        .target
        .is_none_or(|target| distance(base.pos, target) < MONSTER_PATROL_REACHED);
    if needs_point {
        base.target = Some(base.random_patrol_point(ctx.map, ctx.rng));
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec2;

    use super::super::{MonsterKind, testing::*};
    use super::*;

    // A room with a sealed 3x3 pocket in the bottom-left
    const POCKET_MAP: &[&str] = &[
        "##############",
        "#............#",
        "#............#",
        "#............#",
        "#............#",
        "#............#",
        "#####........#",
        "#...#........#",
        "#...#........#",
        "#...#........#",
        "##############",
    ];

    #[test]
    fn chase_memory_search_patrol_sequence() {
        let mut sandbox = Sandbox::ascii(POCKET_MAP);
        let map = &sandbox.map;
        let monster_pos = map.tile_to_world(crate::map::TilePos::new(10, 3));
        let visible = map.tile_to_world(crate::map::TilePos::new(6, 3));
        let pocket = map.tile_to_world(crate::map::TilePos::new(2, 8));
        let mut monster = Monster::new(1, MonsterKind::Kraken, monster_pos);
        assert_eq!(monster.state(), MonsterState::Patrol);

        // Sight within range: chase on the very next tick
        sandbox.step(&mut monster, 0.05, player_at(visible));
        assert_eq!(monster.state(), MonsterState::Chase);
        assert_eq!(monster.last_seen(), Some(visible));

        // Player vanishes into the pocket: keep chasing the memory
        let sealed = player_at(pocket);
        sandbox.step(&mut monster, 0.05, sealed);
        assert_eq!(monster.state(), MonsterState::Chase);
        assert_eq!(monster.target(), Some(visible));

        let mut elapsed = 0.05;
        while monster.state() == MonsterState::Chase {
            sandbox.step(&mut monster, 0.05, sealed);
            elapsed += 0.05;
            assert!(elapsed < MONSTER_MEMORY_DURATION + 0.2, "memory never expired");
        }
        assert_eq!(monster.state(), MonsterState::Search);
        assert!(elapsed >= MONSTER_MEMORY_DURATION - 0.1);

        let mut searched = 0.0;
        while monster.state() == MonsterState::Search {
            sandbox.step(&mut monster, 0.05, sealed);
            searched += 0.05;
            assert!(searched < MONSTER_SEARCH_DURATION + 0.2, "search never ended");
        }
        assert_eq!(monster.state(), MonsterState::Patrol);
    }

    #[test]
    fn hiding_breaks_an_active_chase() {
        let mut sandbox = Sandbox::room(12, 12);
        let mut monster = Monster::new(1, MonsterKind::Kraken, Vec2::new(100.0, 100.0));
        let player = Vec2::new(200.0, 100.0);
        sandbox.step(&mut monster, 0.05, player_at(player));
        assert_eq!(monster.state(), MonsterState::Chase);

        sandbox.step(&mut monster, 0.05, hidden_player(player));
        assert_eq!(monster.state(), MonsterState::Search);
        assert_eq!(monster.last_seen(), None);
    }

    #[test]
    fn sight_beyond_range_is_ignored() {
        let mut sandbox = Sandbox::room(20, 5);
        let mut monster = Monster::new(1, MonsterKind::Kraken, Vec2::new(48.0, 80.0));
        sandbox.step(&mut monster, 0.05, player_at(Vec2::new(560.0, 80.0)));
        assert_eq!(monster.state(), MonsterState::Patrol);
    }

    #[test]
    fn decoy_lures_then_releases() {
        let mut sandbox = Sandbox::room(12, 12);
        let decoy_pos = Vec2::new(250.0, 250.0);
        sandbox.decoys.push(Decoy::new(9, decoy_pos));
        let mut monster = Monster::new(1, MonsterKind::Kraken, Vec2::new(100.0, 100.0));

        sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 48.0)));
        assert_eq!(monster.state(), MonsterState::Decoy);
        assert_eq!(monster.target(), Some(decoy_pos));

        sandbox.decoys.clear();
        sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(48.0, 48.0)));
        assert_eq!(monster.state(), MonsterState::Patrol);
    }

    #[test]
    fn investigation_times_out() {
        let mut sandbox = Sandbox::ascii(POCKET_MAP);
        let mut monster = Monster::new(1, MonsterKind::Kraken, Vec2::new(400.0, 48.0));
        // Unreachable spot inside the pocket keeps the monster from arriving
        monster.base.investigate(Vec2::new(80.0, 272.0));
        let hidden = hidden_player(Vec2::new(48.0, 48.0));
        let mut elapsed = 0.0;
        while monster.state() == MonsterState::Investigate {
            sandbox.step(&mut monster, 0.1, hidden);
            elapsed += 0.1;
            assert!(elapsed < 2.5);
        }
        assert_eq!(monster.state(), MonsterState::Patrol);
    }
}
