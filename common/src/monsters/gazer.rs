use bevy_math::Vec2;

use super::{MonsterBase, MonsterContext, brain::Senses};
use crate::{
    collision::line_of_sight,
    constants::{
        GAZER_CIRCLE_DURATION, GAZER_CIRCLE_RADIUS, GAZER_CIRCLE_RATE, GAZER_SPEED_UNSEEN, GAZER_SPEED_WATCHED,
        GAZER_STARE_THRESHOLD, GAZER_VIEW_DISTANCE,
    },
};

// Freezes under the player's gaze, sprints otherwise. Stared at for too long
// it gives up the direct approach and circles instead.
#[derive(Debug, Clone, Default)]
pub struct GazerState {
    watched: bool,
    stare_timer: f32,
    circling: bool,
    circle_timer: f32,
    circle_angle: f32,
}

impl GazerState {
    #[must_use]
    pub const fn is_watched(&self) -> bool {
        self.watched
    }

    #[must_use]
    pub const fn is_circling(&self) -> bool {
        self.circling
    }

    #[must_use]
    pub const fn stare_time(&self) -> f32 {
        self.stare_timer
    }

    pub(super) const fn speed_factor(&self) -> f32 {
        if self.watched { GAZER_SPEED_WATCHED } else { GAZER_SPEED_UNSEEN }
    }
}

pub(super) fn pre_update(
    state: &mut GazerState,
    base: &MonsterBase,
    dt: f32,
    ctx: &MonsterContext<'_>,
    senses: &Senses,
) {
    let player = senses.player;
    // Sight runs from the player towards the Gazer
    state.watched = !player.hiding
        && senses.dist <= GAZER_VIEW_DISTANCE
        && line_of_sight(player.pos, base.pos, ctx.map, ctx.doors);

    if state.watched {
        state.stare_timer += dt;
        if state.stare_timer >= GAZER_STARE_THRESHOLD && !state.circling {
            state.circling = true;
            state.circle_timer = GAZER_CIRCLE_DURATION;
            let away = base.pos - player.pos;
            state.circle_angle = away.y.atan2(away.x);
        }
    } else {
        state.stare_timer = 0.0;
        state.circling = false;
    }

    if state.circling {
        state.circle_timer -= dt;
        if state.circle_timer <= 0.0 {
            state.circling = false;
        } else {
            state.circle_angle += GAZER_CIRCLE_RATE * dt;
        }
    }
}

// Circling wins over whatever the state machine aimed at
pub(super) fn post_update(state: &GazerState, base: &mut MonsterBase, senses: &Senses) {
    if state.circling {
        let offset = Vec2::new(state.circle_angle.cos(), state.circle_angle.sin()) * GAZER_CIRCLE_RADIUS;
        base.target = Some(senses.player.pos + offset);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Monster, MonsterKind, MonsterState, Variant, testing::*};
    use super::*;
    use crate::constants::MONSTER_BASE_SPEED;

    fn gazer(monster: &Monster) -> &GazerState {
        match monster.variant() {
            Variant::Gazer(state) => state,
            other => panic!("not a gazer: {other:?}"),
        }
    }

    #[test]
    fn speed_drops_while_watched() {
        let mut sandbox = Sandbox::room(20, 10);
        let mut monster = Monster::new(0, MonsterKind::Gazer, Vec2::new(400.0, 160.0));
        sandbox.step(&mut monster, 0.05, player_at(Vec2::new(250.0, 160.0)));
        assert!(gazer(&monster).is_watched());
        assert!((monster.current_speed() - MONSTER_BASE_SPEED * GAZER_SPEED_WATCHED).abs() < 1e-4);
        // Watched means exact aim, no velocity lead
        assert_eq!(monster.target(), Some(Vec2::new(250.0, 160.0)));

        sandbox.step(&mut monster, 0.05, hidden_player(Vec2::new(250.0, 160.0)));
        assert!(!gazer(&monster).is_watched());
        assert!((monster.current_speed() - MONSTER_BASE_SPEED * GAZER_SPEED_UNSEEN).abs() < 1e-4);
    }

    #[test]
    fn beyond_flashlight_reach_is_unseen() {
        let mut sandbox = Sandbox::room(20, 10);
        let mut monster = Monster::new(0, MonsterKind::Gazer, Vec2::new(500.0, 160.0));
        sandbox.step(&mut monster, 0.05, player_at(Vec2::new(250.0, 160.0)));
        assert!(!gazer(&monster).is_watched());
        // Still close enough to chase
        assert_eq!(monster.state(), MonsterState::Chase);
    }

    #[test]
    fn long_stare_starts_circling() {
        let mut sandbox = Sandbox::room(24, 24);
        let player = Vec2::new(384.0, 384.0);
        let mut monster = Monster::new(0, MonsterKind::Gazer, Vec2::new(384.0 + 120.0, 384.0));
        let mut ticks = 0;
        while !gazer(&monster).is_circling() {
            sandbox.step(&mut monster, 0.1, player_at(player));
            ticks += 1;
            assert!(ticks <= 31, "never started circling");
        }
        let target = monster.target().unwrap();
        assert!((target.distance(player) - GAZER_CIRCLE_RADIUS).abs() < 0.5);

        // Looking away resets the stare
        sandbox.step(&mut monster, 0.1, hidden_player(player));
        assert!(!gazer(&monster).is_circling());
        assert!(gazer(&monster).stare_time().abs() < f32::EPSILON);
    }
}
