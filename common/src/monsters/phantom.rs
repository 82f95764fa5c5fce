use super::brain::Senses;
use crate::constants::{
    MONSTER_LOS_DISTANCE, PHANTOM_FLICKER_DURATION, PHANTOM_KILL_THRESHOLD, PHANTOM_MATERIALIZE_TIME,
    PHANTOM_SPEED_INVISIBLE, PHANTOM_SPEED_VISIBLE,
};

// Invisible and wall-phasing until it sees the player, then flickers into view
#[derive(Debug, Clone, Default)]
pub struct PhantomState {
    visible: bool,
    flicker_timer: f32,
    materialize: f32,
}

impl PhantomState {
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_flickering(&self) -> bool {
        self.flicker_timer > 0.0
    }

    // 0 while invisible, 1 once fully solid
    #[must_use]
    pub const fn materialize_progress(&self) -> f32 {
        self.materialize
    }

    pub(super) const fn speed_factor(&self) -> f32 {
        if self.visible { PHANTOM_SPEED_VISIBLE } else { PHANTOM_SPEED_INVISIBLE }
    }

    pub(super) const fn can_kill(&self) -> bool {
        self.visible && self.materialize >= PHANTOM_KILL_THRESHOLD
    }
}

pub(super) fn pre_update(state: &mut PhantomState, dt: f32, senses: &Senses) {
    let sees_player = senses.has_los && senses.dist <= MONSTER_LOS_DISTANCE;
    if !sees_player {
        state.visible = false;
        state.flicker_timer = 0.0;
        state.materialize = 0.0;
        return;
    }

    if !state.visible && state.flicker_timer <= 0.0 {
        state.flicker_timer = PHANTOM_FLICKER_DURATION;
    }
    if state.flicker_timer > 0.0 {
        state.flicker_timer -= dt;
        if state.flicker_timer <= 0.0 {
            state.visible = true;
        }
    } else if state.visible {
        state.materialize = (state.materialize + dt / PHANTOM_MATERIALIZE_TIME).min(1.0);
    }
}
