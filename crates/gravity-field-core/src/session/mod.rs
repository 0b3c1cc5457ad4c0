pub mod metrics;

pub use metrics::*;

use crate::agent::{Creep, CreepId, CreepParams};
use crate::config::{ConfigError, SessionConfig};
use crate::emitter::{Emitter, EmitterId, EmitterParams, EmitterSnapshot, PotentialSource};
use crate::field::PotentialField;
use crate::ledger::{MassLedger, MassSnapshot};
use std::time::Instant;
use std::{error::Error, fmt};
use tracing::{debug, warn};

/// One simulation run: a field, the emitters feeding it, the creeps reading it
/// and the mass ledger gating emitter placement.
///
/// Each [`Session::step`] runs, in order: emitter ticks, one full field
/// rebuild, then creep updates.
pub struct Session {
    config: SessionConfig,
    field: PotentialField,
    ledger: MassLedger,
    emitters: Vec<Emitter>,
    creeps: Vec<Creep>,
    next_emitter_id: EmitterId,
    next_creep_id: CreepId,
    elapsed: f64,
    step_index: usize,
    baseline: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Config(ConfigError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Config(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementError {
    Invalid(ConfigError),
    InsufficientMass { requested: f64, available: f64 },
    IdExhausted,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::Invalid(e) => write!(f, "{}", e),
            PlacementError::InsufficientMass {
                requested,
                available,
            } => write!(
                f,
                "requested mass ({requested}) exceeds available mass ({available})"
            ),
            PlacementError::IdExhausted => write!(f, "no identifiers left"),
        }
    }
}

impl From<ConfigError> for PlacementError {
    fn from(err: ConfigError) -> Self {
        PlacementError::Invalid(err)
    }
}

impl Error for PlacementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PlacementError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    InvalidSampleEvery,
    InvalidDelta,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            RunError::InvalidDelta => write!(f, "dt must be non-negative and finite"),
            RunError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            RunError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for RunError {}

impl Session {
    pub const MAX_RUN_STEPS: usize = 1_000_000;
    pub const MAX_RUN_SAMPLES: usize = 50_000;

    pub fn new(config: SessionConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Validate `config`, place its wells through the ledger, spawn its creeps
    /// and build the initial field.
    ///
    /// Wells the ledger cannot afford are skipped, not reported as errors.
    pub fn try_new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let field = PotentialField::try_new(config.field)?;
        let wells = config.wells.clone();
        let creeps = config.creeps.clone();
        let mut session = Self {
            ledger: MassLedger::new(config.mass_capacity),
            baseline: config.field.baseline,
            field,
            config,
            emitters: Vec::new(),
            creeps: Vec::new(),
            next_emitter_id: 0,
            next_creep_id: 0,
            elapsed: 0.0,
            step_index: 0,
        };

        for params in wells {
            if let Err(e) = session.place_emitter(params) {
                warn!(error = %e, position = ?params.position, "skipping configured well");
            }
        }
        for params in creeps {
            if let Err(e) = session.spawn_creep(params) {
                warn!(error = %e, position = ?params.position, "skipping configured creep");
            }
        }
        session.rebuild_field();
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn field(&self) -> &PotentialField {
        &self.field
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn creeps(&self) -> &[Creep] {
        &self.creeps
    }

    pub fn mass_snapshot(&self) -> MassSnapshot {
        self.ledger.snapshot()
    }

    /// Simulated seconds since the session started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Ambient potential used by the most recent rebuild.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Charge the ledger for `params.mass` and add the emitter.
    ///
    /// The field is not rebuilt until the next step or [`Session::rebuild_field`].
    pub fn place_emitter(&mut self, params: EmitterParams) -> Result<EmitterId, PlacementError> {
        params.validate()?;
        if self.next_emitter_id == EmitterId::MAX {
            return Err(PlacementError::IdExhausted);
        }
        if !self.ledger.try_spend(params.mass) {
            return Err(PlacementError::InsufficientMass {
                requested: params.mass,
                available: self.ledger.available(),
            });
        }
        let id = self.next_emitter_id;
        self.next_emitter_id += 1;
        self.emitters.push(Emitter::try_new(id, params)?);
        debug!(id, mass = params.mass, position = ?params.position, "emitter placed");
        Ok(id)
    }

    /// Remove an emitter and refund its base mass.
    pub fn remove_emitter(&mut self, id: EmitterId) -> Option<EmitterSnapshot> {
        let idx = self.emitters.iter().position(|e| e.id() == id)?;
        let emitter = self.emitters.remove(idx);
        self.ledger.refund(emitter.base_mass());
        debug!(id, mass = emitter.base_mass(), "emitter removed");
        Some(emitter.snapshot())
    }

    pub fn spawn_creep(&mut self, params: CreepParams) -> Result<CreepId, PlacementError> {
        params.validate()?;
        if self.next_creep_id == CreepId::MAX {
            return Err(PlacementError::IdExhausted);
        }
        let id = self.next_creep_id;
        self.next_creep_id += 1;
        self.creeps.push(Creep::new(id, params));
        Ok(id)
    }

    /// Rebuild the field from the current emitters and baseline.
    pub fn rebuild_field(&mut self) {
        self.field.set_baseline(self.baseline);
        self.field.rebuild(&self.emitters);
    }

    /// Advance the simulation by `delta_seconds`, clamped to
    /// `[0, max_step_seconds]`.
    pub fn step(&mut self, delta_seconds: f64) -> StepTimings {
        let total_start = Instant::now();
        let dt = if delta_seconds.is_finite() {
            delta_seconds.clamp(0.0, self.config.max_step_seconds)
        } else {
            0.0
        };
        self.step_index += 1;
        self.elapsed += dt;
        self.baseline =
            self.config.field.baseline + self.config.thermostat.baseline_offset(self.elapsed);

        // 1. Emitter time updates
        let t0 = Instant::now();
        for emitter in &mut self.emitters {
            emitter.tick(dt);
        }
        let tick_us = t0.elapsed().as_micros() as u64;

        // 2. Full field rebuild
        let t1 = Instant::now();
        self.rebuild_field();
        let rebuild_us = t1.elapsed().as_micros() as u64;

        // 3. Creeps read the fresh gradient
        let t2 = Instant::now();
        for creep in &mut self.creeps {
            creep.update(&self.field, dt);
        }
        let creep_update_us = t2.elapsed().as_micros() as u64;

        StepTimings {
            tick_us,
            rebuild_us,
            creep_update_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }

    /// Validates `try_run` arguments and returns the number of samples the
    /// run will record.
    fn check_run_args(
        steps: usize,
        delta_seconds: f64,
        sample_every: usize,
    ) -> Result<usize, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        if !(delta_seconds.is_finite() && delta_seconds >= 0.0) {
            return Err(RunError::InvalidDelta);
        }
        if steps > Self::MAX_RUN_STEPS {
            return Err(RunError::TooManySteps {
                max: Self::MAX_RUN_STEPS,
                actual: steps,
            });
        }
        let samples = steps.div_ceil(sample_every);
        if samples > Self::MAX_RUN_SAMPLES {
            return Err(RunError::TooManySamples {
                max: Self::MAX_RUN_SAMPLES,
                actual: samples,
            });
        }
        Ok(samples)
    }

    pub fn run(&mut self, steps: usize, delta_seconds: f64, sample_every: usize) -> RunSummary {
        self.try_run(steps, delta_seconds, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Step `steps` times, sampling metrics every `sample_every` steps and at
    /// the final step.
    pub fn try_run(
        &mut self,
        steps: usize,
        delta_seconds: f64,
        sample_every: usize,
    ) -> Result<RunSummary, RunError> {
        let estimated_samples = Self::check_run_args(steps, delta_seconds, sample_every)?;

        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.step(delta_seconds);
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics());
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            delta_seconds,
            samples,
            final_mass: self.mass_snapshot(),
            emitters: self.emitters.iter().map(Emitter::snapshot).collect(),
        })
    }
}
