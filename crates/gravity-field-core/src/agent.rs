use crate::config::ConfigError;
use crate::constants::POTENTIAL_EPSILON;
use crate::field::PotentialField;
use crate::vector::{self, Vec2};
use serde::{Deserialize, Serialize};

pub type CreepId = u32;

fn default_direction() -> Vec2 {
    [1.0, 0.0]
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreepParams {
    pub position: Vec2,
    /// Cruise speed along `preferred_direction`, world units per second.
    pub speed: f64,
    /// Scales how strongly the field gradient bends the path.
    pub mass: f64,
    /// Scaled to unit length on spawn; a zero vector means no cruise.
    #[serde(default = "default_direction")]
    pub preferred_direction: Vec2,
}

impl CreepParams {
    pub fn new(position: Vec2, speed: f64, mass: f64) -> Self {
        Self {
            position,
            speed,
            mass,
            preferred_direction: default_direction(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !vector::is_finite(self.position) {
            return Err(ConfigError::InvalidCreep("position must be finite"));
        }
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(ConfigError::InvalidCreep(
                "speed must be non-negative and finite",
            ));
        }
        if !self.mass.is_finite() {
            return Err(ConfigError::InvalidCreep("mass must be finite"));
        }
        if !vector::is_finite(self.preferred_direction) {
            return Err(ConfigError::InvalidCreep(
                "preferred_direction must be finite",
            ));
        }
        Ok(())
    }
}

/// Mobile agent steered by the field gradient.
#[derive(Clone, Debug)]
pub struct Creep {
    pub id: CreepId,
    pub position: Vec2,
    pub velocity: Vec2,
    speed: f64,
    mass: f64,
    preferred_direction: Vec2,
}

impl Creep {
    pub fn new(id: CreepId, params: CreepParams) -> Self {
        Self {
            id,
            position: params.position,
            velocity: [0.0, 0.0],
            speed: params.speed,
            mass: params.mass,
            preferred_direction: vector::normalize(params.preferred_direction, POTENTIAL_EPSILON),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Steer down the gradient, then integrate one explicit Euler step.
    ///
    /// Velocity is capped at twice the cruise speed and the position stays
    /// inside the field's world rectangle.
    pub fn update(&mut self, field: &PotentialField, delta_seconds: f64) {
        let gradient = field.gradient(self.position);
        let influence = vector::scale(gradient, -self.mass);
        let desired = vector::add(
            vector::scale(self.preferred_direction, self.speed),
            influence,
        );
        self.velocity = vector::clamp_magnitude(desired, self.speed * 2.0);
        let moved = vector::add(self.position, vector::scale(self.velocity, delta_seconds));
        let [width, height] = field.size();
        self.position = [moved[0].clamp(0.0, width), moved[1].clamp(0.0, height)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::emitter::{Emitter, EmitterParams};

    fn field_with_well(position: Vec2, mass: f64) -> PotentialField {
        let mut field = PotentialField::new(FieldConfig {
            width: 400.0,
            height: 200.0,
            resolution: 10.0,
            baseline: -1.0,
        });
        field.rebuild(&[Emitter::new(
            0,
            EmitterParams::new(position, mass, 80.0, 2.0, 100.0),
        )]);
        field
    }

    #[test]
    fn flat_field_moves_along_preferred_direction() {
        let mut field = field_with_well([0.0, 0.0], 0.0);
        field.rebuild::<Emitter>(&[]);
        let mut creep = Creep::new(0, CreepParams::new([40.0, 100.0], 50.0, 0.6));
        creep.update(&field, 0.1);
        assert!((creep.position[0] - 45.0).abs() < 1e-9);
        assert!((creep.position[1] - 100.0).abs() < 1e-9);
        assert!((vector::length(creep.velocity) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn non_unit_direction_still_cruises_at_speed() {
        let mut field = field_with_well([0.0, 0.0], 0.0);
        field.rebuild::<Emitter>(&[]);
        let mut creep = Creep::new(
            0,
            CreepParams {
                preferred_direction: [3.0, 4.0],
                ..CreepParams::new([100.0, 50.0], 50.0, 0.6)
            },
        );
        creep.update(&field, 0.1);
        assert!((vector::length(creep.velocity) - 50.0).abs() < 1e-9);
        assert!((creep.position[0] - 103.0).abs() < 1e-9);
        assert!((creep.position[1] - 54.0).abs() < 1e-9);
    }

    #[test]
    fn well_bends_path_toward_it() {
        let field = field_with_well([200.0, 40.0], 400.0);
        let mut creep = Creep::new(
            0,
            CreepParams {
                preferred_direction: [0.0, 0.0],
                ..CreepParams::new([200.0, 120.0], 10.0, 1.0)
            },
        );
        creep.update(&field, 0.5);
        assert!(creep.velocity[1] < 0.0, "velocity {:?}", creep.velocity);
        assert!(creep.position[1] < 120.0);
    }

    #[test]
    fn velocity_is_capped_and_position_clamped() {
        let field = field_with_well([390.0, 100.0], 5000.0);
        let mut creep = Creep::new(0, CreepParams::new([360.0, 100.0], 20.0, 50.0));
        for _ in 0..200 {
            creep.update(&field, 0.25);
            assert!(vector::length(creep.velocity) <= 40.0 + 1e-9);
            assert!((0.0..=400.0).contains(&creep.position[0]));
            assert!((0.0..=200.0).contains(&creep.position[1]));
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = CreepParams::new([0.0, 0.0], -1.0, 1.0);
        assert!(matches!(params.validate(), Err(ConfigError::InvalidCreep(_))));
    }
}
