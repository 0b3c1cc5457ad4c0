//! Numeric floors shared by the emitter law and the field sampler.
//!
//! These are tuning constants, not error bounds. Changing them moves the
//! shape of the field near emitter centres and at the world edges.

/// Added to the normalized distance before raising it to the falloff power,
/// and to squared distances before taking a square root.
pub const POTENTIAL_EPSILON: f64 = 1e-6;

/// Below this distance from an emitter centre the force direction is undefined
/// and `force_at` returns the zero vector.
pub const SINGULARITY_DISTANCE: f64 = 1e-5;

/// Floor for finite-difference denominators and potential ranges.
pub const GRADIENT_EPSILON: f64 = 1e-4;

/// Pulse period used when a well is configured without one (seconds).
pub const DEFAULT_PULSE_PERIOD: f64 = 4.0;

/// Upper bound on a single simulation step (seconds).
pub const MAX_STEP_SECONDS: f64 = 1.0 / 15.0;
