use bevy_math::Vec2;

use super::{MonsterBase, MonsterState};
use crate::{
    collision::distance,
    constants::{
        ECHO_DOOR_INTENSITY, ECHO_EXIT_INTENSITY, ECHO_FOOTSTEP_INTENSITY, ECHO_GENERATOR_ACTIVE_BOOST,
        ECHO_GENERATOR_INTENSITY, ECHO_HEARING_RANGE, ECHO_SOUND_MEMORY, ECHO_SPRINT_INTENSITY,
        MONSTER_INVESTIGATION_DURATION,
    },
};

// ============================================================================
// Sounds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    GeneratorActive,
    ExitOpen,
    GeneratorComplete,
    DoorClose,
    SprintFootstep,
    Footstep,
}

impl SoundKind {
    // Higher priorities always win over louder, lower ones
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::GeneratorActive => 10,
            Self::ExitOpen => 9,
            Self::GeneratorComplete => 8,
            Self::DoorClose => 6,
            Self::SprintFootstep => 5,
            Self::Footstep => 3,
        }
    }

    #[must_use]
    pub const fn intensity(self) -> f32 {
        match self {
            Self::GeneratorActive => ECHO_GENERATOR_INTENSITY * ECHO_GENERATOR_ACTIVE_BOOST,
            Self::ExitOpen => ECHO_EXIT_INTENSITY,
            Self::GeneratorComplete => ECHO_GENERATOR_INTENSITY,
            Self::DoorClose => ECHO_DOOR_INTENSITY,
            Self::SprintFootstep => ECHO_SPRINT_INTENSITY,
            Self::Footstep => ECHO_FOOTSTEP_INTENSITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundPulse {
    pub pos: Vec2,
    pub kind: SoundKind,
    pub intensity: f32,
    pub timer: f32,
}

impl SoundPulse {
    fn score(&self) -> f32 {
        let freshness = self.timer / ECHO_SOUND_MEMORY;
        f32::from(self.kind.priority()).mul_add(100.0, self.intensity * freshness * 10.0)
    }
}

// ============================================================================
// Echo
// ============================================================================

// Blind hunter driven by a short memory of prioritised sounds
#[derive(Debug, Clone, Default)]
pub struct EchoState {
    pulses: Vec<SoundPulse>,
    sound_target: Option<Vec2>,
}

impl EchoState {
    #[must_use]
    pub fn pulses(&self) -> &[SoundPulse] {
        &self.pulses
    }

    #[must_use]
    pub const fn sound_target(&self) -> Option<Vec2> {
        self.sound_target
    }

    // Record a sound; distance fades it and anything beyond earshot is dropped
    pub(super) fn hear(&mut self, base: &mut MonsterBase, pos: Vec2, kind: SoundKind, loudness: f32) {
        let dist = distance(base.pos, pos);
        if dist > ECHO_HEARING_RANGE {
            return;
        }
        self.pulses.push(SoundPulse {
            pos,
            kind,
            intensity: (1.0 - dist / ECHO_HEARING_RANGE) * kind.intensity() * loudness,
            timer: ECHO_SOUND_MEMORY,
        });
        if base.state != MonsterState::Chase {
            base.state = MonsterState::Investigate;
        }
        self.refresh_target(base);
    }

    fn refresh_target(&mut self, base: &mut MonsterBase) {
        let Some(best) = self
            .pulses
            .iter()
            .max_by(|a, b| a.score().total_cmp(&b.score()))
        else {
            return;
        };
        self.sound_target = Some(best.pos);
        base.investigate_pos = Some(best.pos);
        base.investigate_timer = best.timer.max(MONSTER_INVESTIGATION_DURATION);
    }
}

pub(super) fn pre_update(state: &mut EchoState, base: &mut MonsterBase, dt: f32) {
    state.pulses.retain_mut(|pulse| {
        pulse.timer -= dt;
        pulse.timer > 0.0
    });
    if state.pulses.is_empty() {
        state.sound_target = None;
    } else {
        state.refresh_target(base);
    }
}
