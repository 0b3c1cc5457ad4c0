//! Gravity-well emitters.
//!
//! Every emitter shares one potential law, parameterized by a [`WellShape`]:
//!
//! ```text
//! n = |p - position| / radius
//! f = (n + eps)^falloff
//! phi(p) = -mass / (1 + f)
//! ```
//!
//! What varies between emitters is how `mass` evolves over time, expressed by
//! [`EmitterKind`]. Pulsing wells keep only a phase accumulator and derive
//! their mass from it on every tick, so repeated ticks never drift.

use crate::config::ConfigError;
use crate::constants::{DEFAULT_PULSE_PERIOD, POTENTIAL_EPSILON, SINGULARITY_DISTANCE};
use crate::vector::{self, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub type EmitterId = u32;

/// Something that contributes to the potential field.
pub trait PotentialSource {
    /// Scalar potential contributed at `point`. Negative values attract.
    fn potential_at(&self, point: Vec2) -> f64;

    /// Closed-form pull at `point`, pointing toward the source.
    fn force_at(&self, point: Vec2) -> Vec2;

    /// Advance time-varying state by `delta_seconds`.
    fn tick(&mut self, delta_seconds: f64);
}

fn default_pulse_period() -> f64 {
    DEFAULT_PULSE_PERIOD
}

/// Construction parameters for an emitter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmitterParams {
    pub position: Vec2,
    /// Base mass; this is what the ledger charges.
    pub mass: f64,
    /// Falloff length scale.
    pub radius: f64,
    pub falloff: f64,
    pub max_force: f64,
    #[serde(default)]
    pub pulse_amplitude: f64,
    #[serde(default = "default_pulse_period")]
    pub pulse_period: f64,
}

impl EmitterParams {
    /// Non-pulsing well parameters.
    pub fn new(position: Vec2, mass: f64, radius: f64, falloff: f64, max_force: f64) -> Self {
        Self {
            position,
            mass,
            radius,
            falloff,
            max_force,
            pulse_amplitude: 0.0,
            pulse_period: DEFAULT_PULSE_PERIOD,
        }
    }

    /// A well pulses only when both amplitude and period are positive.
    pub fn is_pulsing(&self) -> bool {
        self.pulse_amplitude > 0.0 && self.pulse_period > 0.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !vector::is_finite(self.position) {
            return Err(ConfigError::InvalidEmitter("position must be finite"));
        }
        if !(self.mass.is_finite() && self.mass >= 0.0) {
            return Err(ConfigError::InvalidEmitter(
                "mass must be non-negative and finite",
            ));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidEmitter(
                "radius must be positive and finite",
            ));
        }
        if !(self.falloff.is_finite() && self.falloff >= 0.0) {
            return Err(ConfigError::InvalidEmitter(
                "falloff must be non-negative and finite",
            ));
        }
        if !(self.max_force.is_finite() && self.max_force > 0.0) {
            return Err(ConfigError::InvalidEmitter(
                "max_force must be positive and finite",
            ));
        }
        if !(self.pulse_amplitude.is_finite() && self.pulse_period.is_finite()) {
            return Err(ConfigError::InvalidEmitter(
                "pulse parameters must be finite",
            ));
        }
        Ok(())
    }
}

/// Geometry and force law shared by all emitter kinds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellShape {
    pub position: Vec2,
    pub radius: f64,
    pub falloff: f64,
    pub max_force: f64,
}

impl WellShape {
    pub fn potential(&self, mass: f64, point: Vec2) -> f64 {
        let normalized = vector::distance(point, self.position) / self.radius;
        let falloff_factor = (normalized + POTENTIAL_EPSILON).powf(self.falloff);
        -mass / (1.0 + falloff_factor)
    }

    pub fn force(&self, mass: f64, point: Vec2) -> Vec2 {
        let dx = point[0] - self.position[0];
        let dy = point[1] - self.position[1];
        let distance_sq = dx * dx + dy * dy + POTENTIAL_EPSILON;
        let distance = distance_sq.sqrt();
        if distance < SINGULARITY_DISTANCE {
            return [0.0, 0.0];
        }

        let normalized = distance / self.radius;
        let falloff_factor = (normalized + POTENTIAL_EPSILON).powf(self.falloff);
        let denom = 1.0 + falloff_factor;
        let gradient_magnitude = mass
            * self.falloff
            * normalized.powf((self.falloff - 1.0).max(0.0))
            / (self.radius * denom * denom);

        // Negative mass repels; cap both signs.
        let magnitude = gradient_magnitude.clamp(-self.max_force, self.max_force);
        [-dx / distance * magnitude, -dy / distance * magnitude]
    }
}

/// Sinusoidal mass oscillation. Only the phase is stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub amplitude: f64,
    /// Seconds per full oscillation; always positive.
    pub period: f64,
    elapsed: f64,
}

impl Pulse {
    pub fn new(amplitude: f64, period: f64) -> Self {
        debug_assert!(period > 0.0, "pulse period must be positive");
        Self {
            amplitude,
            period,
            elapsed: 0.0,
        }
    }

    /// Fraction of the current period in `[0, 1)`.
    pub fn phase(&self) -> f64 {
        self.elapsed / self.period
    }

    pub fn advance(&mut self, delta_seconds: f64) {
        self.elapsed = (self.elapsed + delta_seconds).rem_euclid(self.period);
    }

    pub fn mass(&self, base_mass: f64) -> f64 {
        base_mass + self.amplitude * (TAU * self.phase()).sin()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmitterKind {
    /// Constant mass.
    Steady,
    Pulsing(Pulse),
}

#[derive(Clone, Debug)]
pub struct Emitter {
    id: EmitterId,
    shape: WellShape,
    base_mass: f64,
    mass: f64,
    kind: EmitterKind,
}

impl Emitter {
    pub fn new(id: EmitterId, params: EmitterParams) -> Self {
        Self::try_new(id, params).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(id: EmitterId, params: EmitterParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let kind = if params.is_pulsing() {
            EmitterKind::Pulsing(Pulse::new(params.pulse_amplitude, params.pulse_period))
        } else {
            EmitterKind::Steady
        };
        Ok(Self {
            id,
            shape: WellShape {
                position: params.position,
                radius: params.radius,
                falloff: params.falloff,
                max_force: params.max_force,
            },
            base_mass: params.mass,
            mass: params.mass,
            kind,
        })
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn shape(&self) -> &WellShape {
        &self.shape
    }

    pub fn position(&self) -> Vec2 {
        self.shape.position
    }

    pub fn kind(&self) -> &EmitterKind {
        &self.kind
    }

    pub fn base_mass(&self) -> f64 {
        self.base_mass
    }

    /// Mass as of the most recent tick.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn snapshot(&self) -> EmitterSnapshot {
        let (pulse_amplitude, pulse_period, phase) = match self.kind {
            EmitterKind::Steady => (0.0, 0.0, 0.0),
            EmitterKind::Pulsing(pulse) => (pulse.amplitude, pulse.period, pulse.phase()),
        };
        EmitterSnapshot {
            id: self.id,
            position: self.shape.position,
            base_mass: self.base_mass,
            mass: self.mass,
            radius: self.shape.radius,
            falloff: self.shape.falloff,
            max_force: self.shape.max_force,
            pulse_amplitude,
            pulse_period,
            phase,
        }
    }
}

impl PotentialSource for Emitter {
    fn potential_at(&self, point: Vec2) -> f64 {
        self.shape.potential(self.mass, point)
    }

    fn force_at(&self, point: Vec2) -> Vec2 {
        self.shape.force(self.mass, point)
    }

    fn tick(&mut self, delta_seconds: f64) {
        match &mut self.kind {
            EmitterKind::Steady => {}
            EmitterKind::Pulsing(pulse) => {
                pulse.advance(delta_seconds);
                self.mass = pulse.mass(self.base_mass);
            }
        }
    }
}

/// Read-only view of an emitter for presentation and run reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmitterSnapshot {
    pub id: EmitterId,
    pub position: Vec2,
    pub base_mass: f64,
    pub mass: f64,
    pub radius: f64,
    pub falloff: f64,
    pub max_force: f64,
    pub pulse_amplitude: f64,
    pub pulse_period: f64,
    pub phase: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well() -> Emitter {
        Emitter::new(0, EmitterParams::new([100.0, 100.0], 10.0, 60.0, 2.0, 80.0))
    }

    fn numeric_gradient(emitter: &Emitter, point: Vec2, h: f64) -> Vec2 {
        let dx = (emitter.potential_at([point[0] + h, point[1]])
            - emitter.potential_at([point[0] - h, point[1]]))
            / (2.0 * h);
        let dy = (emitter.potential_at([point[0], point[1] + h])
            - emitter.potential_at([point[0], point[1] - h]))
            / (2.0 * h);
        [dx, dy]
    }

    #[test]
    fn potential_deepens_toward_centre_within_radius() {
        let emitter = well();
        let mut previous = f64::NEG_INFINITY;
        // Walk inward from the radius; each sample must be strictly lower.
        for step in 0..=60 {
            let d = 60.0 - step as f64;
            let phi = emitter.potential_at([100.0 + d, 100.0]);
            if step > 0 {
                assert!(phi < previous, "phi({d}) = {phi} not below {previous}");
            }
            previous = phi;
        }
        assert!(emitter.potential_at([100.0, 100.0]) < 0.0);
        assert!(emitter.potential_at([100.0, 100.0]) >= -10.0);
    }

    #[test]
    fn force_never_exceeds_max_force() {
        let emitter = Emitter::new(0, EmitterParams::new([0.0, 0.0], 500.0, 5.0, 1.5, 3.0));
        for i in -40..=40 {
            for j in -40..=40 {
                let p = [i as f64 * 0.25, j as f64 * 0.25];
                let f = emitter.force_at(p);
                assert!(vector::length(f) <= 3.0 + 1e-12, "force {f:?} at {p:?}");
            }
        }
    }

    #[test]
    fn force_stays_capped_when_pulse_drives_mass_negative() {
        let params = EmitterParams {
            pulse_amplitude: 1000.0,
            pulse_period: 4.0,
            ..EmitterParams::new([0.0, 0.0], 1.0, 1.0, 1.0, 3.0)
        };
        let mut emitter = Emitter::new(0, params);
        emitter.tick(3.0);
        assert!((emitter.mass() + 999.0).abs() < 1e-9);
        for &p in &[[0.5, 0.0], [0.0, -0.25], [1.5, 1.5], [1e-4, 0.0]] {
            let f = emitter.force_at(p);
            assert!(vector::length(f) <= 3.0 + 1e-12, "force {f:?} at {p:?}");
        }
        // Negative mass pushes away from the centre.
        assert!(emitter.force_at([0.5, 0.0])[0] > 0.0);
    }

    #[test]
    fn force_at_centre_is_zero() {
        let emitter = well();
        let f = emitter.force_at([100.0, 100.0]);
        assert_eq!(f, [0.0, 0.0]);
    }

    #[test]
    fn force_matches_negative_potential_gradient() {
        let emitter = Emitter::new(0, EmitterParams::new([100.0, 100.0], 10.0, 60.0, 2.0, 1e9));
        for &p in &[[130.0, 100.0], [100.0, 45.0], [140.0, 150.0], [20.0, 90.0]] {
            let force = emitter.force_at(p);
            let grad = numeric_gradient(&emitter, p, 1e-3);
            for axis in 0..2 {
                let expected = -grad[axis];
                let tol = 1e-4 * expected.abs().max(1e-6);
                assert!(
                    (force[axis] - expected).abs() <= tol,
                    "axis {axis} at {p:?}: force {} vs -grad {}",
                    force[axis],
                    expected
                );
            }
        }
    }

    #[test]
    fn force_points_toward_emitter() {
        let emitter = well();
        let f = emitter.force_at([150.0, 100.0]);
        assert!(f[0] < 0.0);
        assert!(f[1].abs() < 1e-12);
    }

    #[test]
    fn steady_emitter_ignores_ticks() {
        let mut emitter = well();
        assert_eq!(emitter.kind(), &EmitterKind::Steady);
        emitter.tick(1.7);
        assert_eq!(emitter.mass(), 10.0);
    }

    #[test]
    fn non_positive_pulse_parameters_yield_steady_emitter() {
        let mut params = EmitterParams::new([0.0, 0.0], 5.0, 10.0, 2.0, 10.0);
        params.pulse_amplitude = 2.0;
        params.pulse_period = 0.0;
        assert_eq!(Emitter::new(0, params).kind(), &EmitterKind::Steady);
        params.pulse_amplitude = 0.0;
        params.pulse_period = 3.0;
        assert_eq!(Emitter::new(0, params).kind(), &EmitterKind::Steady);
    }

    #[test]
    fn pulsing_mass_starts_at_base_and_averages_to_base() {
        let params = EmitterParams {
            pulse_amplitude: 4.0,
            pulse_period: 6.0,
            ..EmitterParams::new([0.0, 0.0], 18.0, 140.0, 2.4, 190.0)
        };
        let mut emitter = Emitter::new(1, params);
        assert_eq!(emitter.mass(), 18.0);
        emitter.tick(0.0);
        assert!((emitter.mass() - 18.0).abs() < 1e-12);

        let samples = 600;
        let dt = 6.0 / samples as f64;
        let mut sum = 0.0;
        let mut peak = f64::NEG_INFINITY;
        for _ in 0..samples {
            emitter.tick(dt);
            sum += emitter.mass();
            peak = peak.max(emitter.mass());
        }
        assert!((sum / samples as f64 - 18.0).abs() < 1e-6);
        assert!((peak - 22.0).abs() < 1e-3);
        // A full period returns to phase 0.
        assert!(emitter.snapshot().phase < 1e-9 || emitter.snapshot().phase > 1.0 - 1e-9);
    }

    #[test]
    fn pulse_mass_is_derived_from_phase_not_accumulated() {
        let params = EmitterParams {
            pulse_amplitude: 2.0,
            pulse_period: 4.0,
            ..EmitterParams::new([0.0, 0.0], 16.0, 130.0, 2.2, 180.0)
        };
        let mut many = Emitter::new(0, params);
        let mut once = Emitter::new(1, params);
        for _ in 0..1000 {
            many.tick(0.013);
        }
        once.tick(13.0);
        assert!((many.mass() - once.mass()).abs() < 1e-9);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut params = EmitterParams::new([0.0, 0.0], 5.0, 0.0, 2.0, 10.0);
        assert!(matches!(
            Emitter::try_new(0, params),
            Err(ConfigError::InvalidEmitter(_))
        ));
        params.radius = 10.0;
        params.max_force = -1.0;
        assert!(Emitter::try_new(0, params).is_err());
        params.max_force = 1.0;
        params.position = [f64::NAN, 0.0];
        assert!(Emitter::try_new(0, params).is_err());
    }

    #[test]
    fn snapshot_reports_current_state() {
        let params = EmitterParams {
            pulse_amplitude: 1.0,
            pulse_period: 2.0,
            ..EmitterParams::new([3.0, 4.0], 5.0, 10.0, 2.0, 10.0)
        };
        let mut emitter = Emitter::new(7, params);
        emitter.tick(0.5);
        let snap = emitter.snapshot();
        assert_eq!(snap.id, 7);
        assert_eq!(snap.base_mass, 5.0);
        assert!((snap.mass - 6.0).abs() < 1e-12);
        assert!((snap.phase - 0.25).abs() < 1e-12);
    }
}
