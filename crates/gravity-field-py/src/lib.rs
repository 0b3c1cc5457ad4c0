use gravity_field_core::{Session, SessionConfig};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Minimal PyO3 module exposing gravity-field-core to Python.
#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

/// Run a session and return its summary as JSON.
///
/// `config_json` of `None` uses the built-in demonstration setup.
#[pyfunction]
#[pyo3(signature = (config_json=None, steps=600, dt=0.016666666666666666, sample_every=60))]
fn run_session(
    config_json: Option<&str>,
    steps: usize,
    dt: f64,
    sample_every: usize,
) -> PyResult<String> {
    let config = match config_json {
        Some(json) => {
            SessionConfig::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string()))?
        }
        None => SessionConfig::default(),
    };
    let mut session =
        Session::try_new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let summary = session
        .try_run(steps, dt, sample_every)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    serde_json::to_string(&summary).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(run_session, m)?)?;
    Ok(())
}
