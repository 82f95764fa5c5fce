use bevy_math::Vec2;
use rand::{Rng, rngs::StdRng};
use std::f32::consts::TAU;
use tracing::debug;

use super::{MonsterBase, MonsterContext, SpawnRequest, brain::Senses};
use crate::{
    collision::{AgentKind, check_collision},
    constants::{
        FRACTURE_CRACK_WARNING_TIME, FRACTURE_LEAD_REDUCTION, FRACTURE_MAX_GENERATION, FRACTURE_PRESSURE_DISTANCE,
        FRACTURE_SIZE_PER_SPLIT, FRACTURE_SPEED_PER_SPLIT, FRACTURE_SPLIT_CHANCE, FRACTURE_SPLIT_OFFSET,
        FRACTURE_SPLIT_ON_FAILED_CHASE, FRACTURE_SPLIT_ON_GENERATOR, MONSTER_BASE_SPEED, MONSTER_LEAD_TIME,
        MONSTER_SIZE,
    },
};

// Splits into smaller, faster copies. The world owns the siblings; a
// finished split only hands back a request for the next one.
#[derive(Debug, Clone)]
pub struct FractureState {
    generation: u8,
    splitting: bool,
    split_timer: f32,
}

impl FractureState {
    #[must_use]
    pub const fn new(generation: u8) -> Self {
        Self {
            generation,
            splitting: false,
            split_timer: 0.0,
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u8 {
        self.generation
    }

    #[must_use]
    pub const fn can_split(&self) -> bool {
        self.generation < FRACTURE_MAX_GENERATION
    }

    #[must_use]
    pub const fn is_splitting(&self) -> bool {
        self.splitting
    }

    // 0..=1 progress of the cracking warning
    #[must_use]
    pub fn crack_progress(&self) -> f32 {
        (self.split_timer / FRACTURE_CRACK_WARNING_TIME).min(1.0)
    }

    pub(super) fn lead_time(&self) -> f32 {
        MONSTER_LEAD_TIME * f32::from(self.generation).mul_add(-FRACTURE_LEAD_REDUCTION, 1.0)
    }

    // Begin cracking; no-op at the generation cap, mid-split or without a free slot
    pub fn start_split(&mut self, free_slots: usize) {
        if !self.can_split() || self.splitting || free_slots == 0 {
            return;
        }
        self.splitting = true;
        self.split_timer = 0.0;
    }

    pub(super) fn on_generator_completed(&mut self, rng: &mut StdRng, free_slots: usize) {
        if self.can_split() && rng.random_bool(FRACTURE_SPLIT_ON_GENERATOR) {
            self.start_split(free_slots);
        }
    }

    pub(super) fn on_chase_lost(&mut self, rng: &mut StdRng, free_slots: usize) {
        if self.can_split() && rng.random_bool(FRACTURE_SPLIT_ON_FAILED_CHASE) {
            self.start_split(free_slots);
        }
    }

    const fn cancel_split(&mut self) {
        self.splitting = false;
        self.split_timer = 0.0;
    }
}

// Size and base speed for a split generation
pub(super) fn apply_generation(base: &mut MonsterBase, generation: u8) {
    let level = i32::from(generation);
    base.size = MONSTER_SIZE * FRACTURE_SIZE_PER_SPLIT.powi(level);
    base.base_speed = MONSTER_BASE_SPEED * FRACTURE_SPEED_PER_SPLIT.powi(level);
    base.set_generators_activated(base.generators_activated);
}

pub(super) fn pre_update(
    state: &mut FractureState,
    base: &mut MonsterBase,
    dt: f32,
    ctx: &mut MonsterContext<'_>,
    senses: &Senses,
) -> Option<SpawnRequest> {
    if state.can_split()
        && senses.dist < FRACTURE_PRESSURE_DISTANCE
        && ctx.rng.random::<f32>() < FRACTURE_SPLIT_CHANCE * dt
    {
        state.start_split(*ctx.fracture_slots);
    }

    if !state.splitting {
        return None;
    }
    state.split_timer += dt;
    if state.split_timer < FRACTURE_CRACK_WARNING_TIME {
        return None;
    }
    complete_split(state, base, ctx)
}

fn complete_split(
    state: &mut FractureState,
    base: &mut MonsterBase,
    ctx: &mut MonsterContext<'_>,
) -> Option<SpawnRequest> {
    state.cancel_split();
    // Another sibling may have taken the last slot while this one cracked
    if *ctx.fracture_slots == 0 {
        return None;
    }
    *ctx.fracture_slots -= 1;

    let angle = ctx.rng.random_range(0.0..TAU);
    let offset = Vec2::new(angle.cos(), angle.sin()) * FRACTURE_SPLIT_OFFSET;
    let origin = base.pos;

    state.generation += 1;
    apply_generation(base, state.generation);

    let blocked = |pos: Vec2| check_collision(pos, base.size, ctx.map, ctx.doors, AgentKind::Monster);
    let child_pos = if blocked(origin + offset) { origin } else { origin + offset };
    if !blocked(origin - offset) {
        base.pos = origin - offset;
    }

    debug!(
        generation = state.generation,
        x = child_pos.x,
        y = child_pos.y,
        "fracture split"
    );
    Some(SpawnRequest {
        pos: child_pos,
        generation: state.generation,
        generators_activated: base.generators_activated,
    })
}

#[cfg(test)]
mod tests {
    use super::super::{Monster, MonsterKind, Variant, testing::*};
    use super::*;
    use crate::constants::FRACTURE_MAX_COUNT;

    fn fracture_mut(monster: &mut Monster) -> &mut FractureState {
        match &mut monster.variant {
            Variant::Fracture(state) => state,
            other => panic!("not a fracture: {other:?}"),
        }
    }

    #[test]
    fn forced_splits_never_exceed_the_cap() {
        let mut sandbox = Sandbox::room(30, 20);
        let hidden = hidden_player(Vec2::new(64.0, 64.0));
        let mut arena = vec![Monster::new(0, MonsterKind::Fracture, Vec2::new(480.0, 320.0))];

        for _ in 0..400 {
            sandbox.fracture_slots = FRACTURE_MAX_COUNT.saturating_sub(arena.len());
            let mut spawns = Vec::new();
            for monster in &mut arena {
                let free = sandbox.fracture_slots;
                fracture_mut(monster).start_split(free);
                if let Some(request) = sandbox.step(monster, 0.05, hidden) {
                    spawns.push(request);
                }
            }
            for request in spawns {
                let id = u32::try_from(arena.len()).unwrap();
                arena.push(Monster::fracture_offspring(id, &request));
            }
            assert!(arena.len() <= FRACTURE_MAX_COUNT);
        }

        assert_eq!(arena.len(), FRACTURE_MAX_COUNT);
        for monster in &mut arena {
            let state = fracture_mut(monster);
            assert_eq!(state.generation(), FRACTURE_MAX_GENERATION);
            assert!(!state.can_split());
        }
    }

    #[test]
    fn split_shrinks_and_speeds_up_both_halves() {
        let mut sandbox = Sandbox::room(30, 20);
        let mut monster = Monster::new(0, MonsterKind::Fracture, Vec2::new(480.0, 320.0));
        monster.base.set_generators_activated(2);
        fracture_mut(&mut monster).start_split(3);
        assert!(fracture_mut(&mut monster).is_splitting());

        let hidden = hidden_player(Vec2::new(64.0, 64.0));
        let mut request = None;
        for _ in 0..25 {
            if let Some(spawned) = sandbox.step(&mut monster, 0.05, hidden) {
                request = Some(spawned);
                break;
            }
        }
        let request = request.expect("split never completed");
        assert_eq!(request.generation, 1);
        assert_eq!(request.generators_activated, 2);
        assert_eq!(sandbox.fracture_slots, 2);

        let child = Monster::fracture_offspring(1, &request);
        let expected_speed = MONSTER_BASE_SPEED.mul_add(FRACTURE_SPEED_PER_SPLIT, 16.0);
        for half in [&monster, &child] {
            assert!((half.size() - MONSTER_SIZE * 0.5).abs() < 1e-4);
            assert!((half.current_speed() - expected_speed).abs() < 1e-3);
        }
        assert!(request.pos.distance(monster.pos()) > 30.0);
    }

    #[test]
    fn no_free_slot_means_no_split() {
        let mut state = FractureState::new(0);
        state.start_split(0);
        assert!(!state.is_splitting());

        let mut capped = FractureState::new(FRACTURE_MAX_GENERATION);
        capped.start_split(3);
        assert!(!capped.is_splitting());
    }

    #[test]
    fn deeper_generations_lead_less() {
        assert!((FractureState::new(0).lead_time() - MONSTER_LEAD_TIME).abs() < 1e-6);
        assert!((FractureState::new(2).lead_time() - MONSTER_LEAD_TIME * 0.4).abs() < 1e-6);
    }
}
