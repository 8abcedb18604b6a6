//! PyO3 wrapper for Coordinator
//!
//! This module provides the Python interface to one coordinator session.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{
    batch_report_to_py, coordinator_error, outcome_row_to_py, outcome_rows_to_py, parse_availability,
    parse_coordinator_config, parse_node, parse_submit_batch, toggle_report_to_py,
};
use crate::coordinator::Coordinator as RustCoordinator;

/// Python wrapper for Rust Coordinator
///
/// # Example (from Python)
///
/// ```python
/// from crash_recovery_core_rs import Coordinator
///
/// coord = Coordinator.new({"routing": {"read_fallback": True}})
/// coord.toggle_node("node2")
///
/// report = coord.submit_batch({
///     "simulationCase": "case2",
///     "transactions": [
///         {"id": 1, "node": "node2", "query": "UPDATE games_frag1 SET price = 5"},
///     ],
/// })
/// print(report["message"])
///
/// recovery = coord.toggle_node("node2")
/// print(recovery["retried"][0]["outcome_kind"])  # executed
/// ```
#[pyclass(name = "Coordinator")]
pub struct PyCoordinator {
    inner: RustCoordinator,
}

#[pymethods]
impl PyCoordinator {
    /// Create a coordinator; `config` may be omitted for the defaults
    ///
    /// # Errors
    ///
    /// Raises RuntimeError if the routing configuration is invalid.
    #[staticmethod]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let rust_config = parse_coordinator_config(config)?;
        let inner = RustCoordinator::new(rust_config).map_err(coordinator_error)?;

        Ok(PyCoordinator { inner })
    }

    /// Process a batch
    ///
    /// Returns `{"batch", "simulation_case", "summary", "message", "results"}`.
    /// Raises ValueError for a malformed batch (nothing is processed).
    fn submit_batch(&mut self, py: Python<'_>, request: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let request = parse_submit_batch(request)?;
        let report = self.inner.submit_batch(request).map_err(coordinator_error)?;

        batch_report_to_py(py, &report)
    }

    /// Flip a replica; raises ValueError when both replicas would be down
    fn toggle_node(&mut self, py: Python<'_>, node: &str) -> PyResult<Py<PyDict>> {
        let node = parse_node(node)?;
        let report = self.inner.toggle_node(node).map_err(coordinator_error)?;

        toggle_report_to_py(py, &report)
    }

    fn set_availability(&mut self, py: Python<'_>, node: &str, availability: &str) -> PyResult<Py<PyDict>> {
        let node = parse_node(node)?;
        let availability = parse_availability(availability)?;
        let report = self
            .inner
            .set_availability(node, availability)
            .map_err(coordinator_error)?;

        toggle_report_to_py(py, &report)
    }

    /// Drop a stashed transaction; returns the recorded failed attempt
    fn abandon(&mut self, py: Python<'_>, node: &str, batch: u64, transaction_id: u64) -> PyResult<Py<PyDict>> {
        let node = parse_node(node)?;
        let row = self
            .inner
            .abandon(node, batch, transaction_id)
            .map_err(coordinator_error)?;

        Ok(outcome_row_to_py(py, &row)?.unbind())
    }

    /// Current availability of a node ("up" or "down")
    fn availability(&self, node: &str) -> PyResult<String> {
        Ok(self.inner.availability(parse_node(node)?).to_string())
    }

    /// Number of transactions waiting in a node's stash
    fn stash_len(&self, node: &str) -> PyResult<usize> {
        Ok(self.inner.stash().len(parse_node(node)?))
    }

    /// Every attempt in the session, ordered for display
    fn outcomes(&self, py: Python<'_>) -> PyResult<Py<PyList>> {
        Ok(outcome_rows_to_py(py, &self.inner.outcome_rows())?.unbind())
    }

    /// Session event log as a list of `{"type": ..., ...}` dicts
    fn event_log(&self, py: Python<'_>) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for event in self.inner.event_log().events() {
            let dict = PyDict::new_bound(py);
            dict.set_item("type", event.event_type())?;
            if let Some((batch, tx_id)) = event.tx() {
                dict.set_item("batch", batch)?;
                dict.set_item("tx_id", tx_id)?;
            }
            if let Some(node) = event.node() {
                dict.set_item("node", node.as_str())?;
            }
            list.append(dict)?;
        }
        Ok(list.unbind())
    }
}
