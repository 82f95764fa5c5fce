use bevy_math::Vec2;

// Signals the world pushes into every monster before they move
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    GeneratorActivating(Vec2),
    GeneratorCompleted { pos: Vec2, active_count: usize },
    DoorClosed(Vec2),
    ExitOpened(Vec2),
    ExitUnlocked,
    Footstep { pos: Vec2, sprinting: bool, loudness: f32 },
}

impl WorldEvent {
    #[must_use]
    pub const fn position(&self) -> Option<Vec2> {
        match *self {
            Self::GeneratorActivating(pos)
            | Self::GeneratorCompleted { pos, .. }
            | Self::DoorClosed(pos)
            | Self::ExitOpened(pos)
            | Self::Footstep { pos, .. } => Some(pos),
            Self::ExitUnlocked => None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GeneratorActivating(_) => "generator_activating",
            Self::GeneratorCompleted { .. } => "generator_completed",
            Self::DoorClosed(_) => "door_closed",
            Self::ExitOpened(_) => "exit_opened",
            Self::ExitUnlocked => "exit_unlocked",
            Self::Footstep { .. } => "footstep",
        }
    }
}
