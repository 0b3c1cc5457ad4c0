pub mod agent;
pub mod config;
pub mod constants;
pub mod emitter;
pub mod field;
pub mod ledger;
pub mod session;
pub mod vector;

pub use agent::{Creep, CreepParams};
pub use config::{ConfigError, FieldConfig, SessionConfig, ThermostatConfig};
pub use emitter::{Emitter, EmitterKind, EmitterParams, EmitterSnapshot, PotentialSource};
pub use field::PotentialField;
pub use ledger::{MassLedger, MassSnapshot};
pub use session::{
    PlacementError, RunError, RunSummary, Session, SessionError, StepMetrics, StepTimings,
};
pub use vector::Vec2;
