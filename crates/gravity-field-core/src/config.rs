use crate::agent::CreepParams;
use crate::constants::MAX_STEP_SECONDS;
use crate::emitter::EmitterParams;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// World rectangle and grid resolution of a potential field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
    /// Linear size of one grid cell in world units.
    pub resolution: f64,
    /// Ambient potential added to every cell.
    pub baseline: f64,
}

impl FieldConfig {
    /// Upper bound on `columns * rows`, so a bad resolution cannot request an
    /// unbounded allocation.
    pub const MAX_GRID_CELLS: usize = 4_000_000;

    /// Grid dimensions `(columns, rows)` for this configuration; never below 2x2.
    ///
    /// Only meaningful for a configuration that passed [`FieldConfig::validate`].
    pub fn grid_dimensions(&self) -> (usize, usize) {
        let (columns, rows) = self.cell_counts();
        (columns as usize + 1, rows as usize + 1)
    }

    // `width / resolution` can underflow to zero for extreme ratios.
    fn cell_counts(&self) -> (f64, f64) {
        (
            (self.width / self.resolution).ceil().max(1.0),
            (self.height / self.resolution).ceil().max(1.0),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::InvalidWidth);
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::InvalidHeight);
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(ConfigError::InvalidResolution);
        }
        if !self.baseline.is_finite() {
            return Err(ConfigError::InvalidBaseline);
        }
        let (columns, rows) = self.cell_counts();
        let cells = (columns + 1.0) * (rows + 1.0);
        if cells > Self::MAX_GRID_CELLS as f64 {
            return Err(ConfigError::GridTooLarge {
                max: Self::MAX_GRID_CELLS,
                actual: cells,
            });
        }
        Ok(())
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
            resolution: 24.0,
            baseline: -1.2,
        }
    }
}

/// Slow oscillation of the ambient baseline:
/// `baseline(t) = field.baseline + sin(t * speed) * amplitude`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    pub amplitude: f64,
    /// Angular speed in radians per second.
    pub speed: f64,
}

impl ThermostatConfig {
    pub fn baseline_offset(&self, elapsed_seconds: f64) -> f64 {
        (elapsed_seconds * self.speed).sin() * self.amplitude
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0 && self.speed.is_finite()) {
            return Err(ConfigError::InvalidThermostat);
        }
        Ok(())
    }
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.4,
            speed: 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub field: FieldConfig,
    /// Total emitter mass the ledger may hand out.
    pub mass_capacity: f64,
    pub thermostat: ThermostatConfig,
    /// Longest step `Session::step` will simulate; larger deltas are clamped.
    pub max_step_seconds: f64,
    /// Wells placed through the ledger when the session starts.
    pub wells: Vec<EmitterParams>,
    pub creeps: Vec<CreepParams>,
}

impl SessionConfig {
    pub const DEMO_CREEP_ROWS: usize = 8;
    pub const DEMO_CREEP_SPACING: f64 = 40.0;
    pub const DEMO_CREEP_OFFSET_Y: f64 = 120.0;
    pub const DEMO_CREEP_SPEED: f64 = 50.0;
    pub const DEMO_CREEP_MASS: f64 = 0.6;

    /// Session with the given field and capacity but no wells, creeps or
    /// baseline oscillation.
    pub fn empty(field: FieldConfig, mass_capacity: f64) -> Self {
        Self {
            field,
            mass_capacity,
            thermostat: ThermostatConfig {
                amplitude: 0.0,
                speed: 0.0,
            },
            max_step_seconds: MAX_STEP_SECONDS,
            wells: Vec::new(),
            creeps: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.field.validate()?;
        if !(self.mass_capacity.is_finite() && self.mass_capacity >= 0.0) {
            return Err(ConfigError::InvalidMassCapacity);
        }
        self.thermostat.validate()?;
        if !(self.max_step_seconds.is_finite() && self.max_step_seconds > 0.0) {
            return Err(ConfigError::InvalidMaxStep);
        }
        for well in &self.wells {
            well.validate()?;
        }
        for creep in &self.creeps {
            creep.validate()?;
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let wells = vec![
            EmitterParams {
                pulse_amplitude: 4.0,
                pulse_period: 6.0,
                ..EmitterParams::new([320.0, 300.0], 18.0, 140.0, 2.4, 190.0)
            },
            EmitterParams::new([540.0, 200.0], 12.0, 110.0, 2.0, 160.0),
            EmitterParams {
                pulse_amplitude: 2.0,
                pulse_period: 4.0,
                ..EmitterParams::new([680.0, 360.0], 16.0, 130.0, 2.2, 180.0)
            },
        ];
        let creeps = (0..Self::DEMO_CREEP_ROWS)
            .map(|i| {
                CreepParams::new(
                    [
                        40.0,
                        Self::DEMO_CREEP_OFFSET_Y + i as f64 * Self::DEMO_CREEP_SPACING,
                    ],
                    Self::DEMO_CREEP_SPEED,
                    Self::DEMO_CREEP_MASS,
                )
            })
            .collect();
        Self {
            field: FieldConfig::default(),
            mass_capacity: 120.0,
            thermostat: ThermostatConfig::default(),
            max_step_seconds: MAX_STEP_SECONDS,
            wells,
            creeps,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidWidth,
    InvalidHeight,
    InvalidResolution,
    InvalidBaseline,
    GridTooLarge { max: usize, actual: f64 },
    InvalidMassCapacity,
    InvalidThermostat,
    InvalidMaxStep,
    InvalidEmitter(&'static str),
    InvalidCreep(&'static str),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWidth => write!(f, "field width must be positive and finite"),
            ConfigError::InvalidHeight => write!(f, "field height must be positive and finite"),
            ConfigError::InvalidResolution => {
                write!(f, "field resolution must be positive and finite")
            }
            ConfigError::InvalidBaseline => write!(f, "field baseline must be finite"),
            ConfigError::GridTooLarge { max, actual } => {
                write!(f, "grid cell count ({actual}) exceeds supported maximum ({max})")
            }
            ConfigError::InvalidMassCapacity => {
                write!(f, "mass_capacity must be non-negative and finite")
            }
            ConfigError::InvalidThermostat => write!(
                f,
                "thermostat amplitude must be non-negative and speed finite"
            ),
            ConfigError::InvalidMaxStep => {
                write!(f, "max_step_seconds must be positive and finite")
            }
            ConfigError::InvalidEmitter(reason) => write!(f, "invalid emitter: {reason}"),
            ConfigError::InvalidCreep(reason) => write!(f, "invalid creep: {reason}"),
            ConfigError::Parse(msg) => write!(f, "failed to parse session config: {msg}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_dimensions_round_up_and_include_both_edges() {
        let config = FieldConfig {
            width: 200.0,
            height: 190.0,
            resolution: 20.0,
            baseline: 0.0,
        };
        assert_eq!(config.grid_dimensions(), (11, 11));
        let coarse = FieldConfig {
            resolution: 500.0,
            ..config
        };
        assert_eq!(coarse.grid_dimensions(), (2, 2));
    }

    #[test]
    fn underflowing_cell_ratio_still_yields_two_by_two_grid() {
        let config = FieldConfig {
            width: 1e-200,
            height: 1e-200,
            resolution: 1e200,
            baseline: -1.0,
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.grid_dimensions(), (2, 2));
    }

    #[test]
    fn validate_rejects_non_positive_resolution() {
        let config = FieldConfig {
            resolution: 0.0,
            ..FieldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidResolution));
        let nan = FieldConfig {
            width: f64::NAN,
            ..FieldConfig::default()
        };
        assert_eq!(nan.validate(), Err(ConfigError::InvalidWidth));
    }

    #[test]
    fn validate_rejects_oversized_grids() {
        let config = FieldConfig {
            width: 1e6,
            height: 1e6,
            resolution: 1.0,
            baseline: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn default_session_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wells.len(), 3);
        assert_eq!(config.creeps.len(), SessionConfig::DEMO_CREEP_ROWS);
    }

    #[test]
    fn session_config_parses_partial_json_with_defaults() {
        let json = r#"{
            "field": { "width": 200.0, "height": 100.0, "resolution": 10.0, "baseline": -1.0 },
            "mass_capacity": 30.0,
            "wells": [
                { "position": [50.0, 50.0], "mass": 10.0, "radius": 40.0, "falloff": 2.0, "max_force": 50.0 }
            ]
        }"#;
        let config = SessionConfig::from_json_str(json).expect("valid config");
        assert_eq!(config.field.width, 200.0);
        assert_eq!(config.wells.len(), 1);
        assert_eq!(config.wells[0].pulse_amplitude, 0.0);
        assert_eq!(config.max_step_seconds, MAX_STEP_SECONDS);
    }

    #[test]
    fn session_config_reports_parse_errors() {
        let err = SessionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
