use super::Session;
use crate::emitter::EmitterSnapshot;
use crate::ledger::MassSnapshot;
use crate::vector::{self, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct StepTimings {
    pub tick_us: u64,
    pub rebuild_us: u64,
    pub creep_update_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub elapsed: f64,
    pub baseline: f64,
    pub potential_min: f64,
    pub potential_max: f64,
    pub mass: MassSnapshot,
    pub emitter_count: usize,
    pub total_emitter_mass: f64,
    pub creep_count: usize,
    pub creep_mean_position: Vec2,
    pub creep_mean_speed: f64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub delta_seconds: f64,
    pub samples: Vec<StepMetrics>,
    pub final_mass: MassSnapshot,
    #[serde(default)]
    pub emitters: Vec<EmitterSnapshot>,
}

impl Session {
    pub(crate) fn collect_step_metrics(&self) -> StepMetrics {
        let (potential_min, potential_max) = self.field.potential_range();
        let creep_count = self.creeps.len();
        let denom = creep_count.max(1) as f64;

        let mut position_sum = [0.0f64, 0.0];
        let mut speed_sum = 0.0f64;
        for creep in &self.creeps {
            position_sum = vector::add(position_sum, creep.position);
            speed_sum += vector::length(creep.velocity);
        }

        StepMetrics {
            step: self.step_index,
            elapsed: self.elapsed,
            baseline: self.baseline,
            potential_min,
            potential_max,
            mass: self.ledger.snapshot(),
            emitter_count: self.emitters.len(),
            total_emitter_mass: self.emitters.iter().map(|e| e.mass()).sum(),
            creep_count,
            creep_mean_position: vector::scale(position_sum, 1.0 / denom),
            creep_mean_speed: speed_sum / denom,
        }
    }
}
