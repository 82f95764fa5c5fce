use bevy_math::Vec2;

use super::{MonsterBase, brain::Senses};
use crate::{
    collision::distance,
    constants::{
        MIMIC_MAX_RECORDED_POINTS, MIMIC_RECORD_INTERVAL, MIMIC_REPLAY_REACHED, MIMIC_REPLAY_SPEED,
        MIMIC_STOP_THRESHOLD, PLAYER_MOVING_EPSILON,
    },
};

// Records the player's trail while they move and walks it once they stop
#[derive(Debug, Clone, Default)]
pub struct MimicState {
    recorded: Vec<Vec2>,
    record_timer: f32,
    stop_timer: f32,
    replaying: bool,
    replay_index: usize,
}

impl MimicState {
    #[must_use]
    pub const fn is_replaying(&self) -> bool {
        self.replaying
    }

    #[must_use]
    pub fn recorded(&self) -> &[Vec2] {
        &self.recorded
    }

    pub(super) fn replay_point(&self) -> Option<Vec2> {
        if self.replaying {
            self.recorded.get(self.replay_index).copied()
        } else {
            None
        }
    }

    pub(super) const fn speed_factor(&self) -> f32 {
        if self.replaying { MIMIC_REPLAY_SPEED } else { 1.0 }
    }

    fn start_replay(&mut self) {
        if self.recorded.len() < 2 {
            return;
        }
        self.replaying = true;
        self.replay_index = 0;
    }
}

pub(super) fn pre_update(state: &mut MimicState, dt: f32, senses: &Senses) {
    let player = senses.player;
    if player.vel.length() > PLAYER_MOVING_EPSILON {
        state.stop_timer = 0.0;
        state.replaying = false;
        state.record_timer += dt;
        if state.record_timer >= MIMIC_RECORD_INTERVAL {
            state.record_timer = 0.0;
            state.recorded.push(player.pos);
            if state.recorded.len() > MIMIC_MAX_RECORDED_POINTS {
                state.recorded.remove(0);
            }
        }
        return;
    }

    state.stop_timer += dt;
    if state.stop_timer >= MIMIC_STOP_THRESHOLD && !state.replaying {
        state.start_replay();
    }
}

pub(super) fn post_update(state: &mut MimicState, base: &MonsterBase) {
    if !state.replaying {
        return;
    }
    match state.recorded.get(state.replay_index) {
        Some(&point) => {
            if distance(base.pos, point) < MIMIC_REPLAY_REACHED {
                state.replay_index += 1;
            }
        }
        None => {
            state.replaying = false;
            state.recorded.clear();
        }
    }
}
