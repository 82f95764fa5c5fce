use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};

use crate::autopilot::AutopilotState;
use common::{GameWorld, Outcome, abilities::AbilityKind, monsters::MonsterKind};

#[derive(Debug, Clone, Serialize)]
pub struct MonsterSummary {
    pub id: u32,
    pub kind: MonsterKind,
    pub state: &'static str,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub flags: Vec<&'static str>,
}

// End-of-run summary written as JSON
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub map: String,
    pub ability: Option<AbilityKind>,
    pub outcome: Outcome,
    pub ticks: u64,
    pub elapsed: f32,
    pub generators_active: usize,
    pub generators_required: usize,
    pub autopilot: AutopilotState,
    pub closest_call: Option<f32>,
    pub peak_monsters: usize,
    pub events: BTreeMap<&'static str, u64>,
    pub monsters: Vec<MonsterSummary>,
}

impl RunReport {
    pub(crate) fn monsters(world: &GameWorld) -> Vec<MonsterSummary> {
        world
            .monsters()
            .iter()
            .map(|monster| MonsterSummary {
                id: monster.id,
                kind: monster.kind(),
                state: monster.state_name(),
                x: monster.pos().x,
                y: monster.pos().y,
                speed: monster.current_speed(),
                flags: monster.flags(),
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize run report")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?).with_context(|| format!("failed to write report {}", path.display()))
    }
}
