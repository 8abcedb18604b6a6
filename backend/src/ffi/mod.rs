//! Python bindings (enabled with the `pyo3` feature)

pub mod coordinator;
pub mod types;
