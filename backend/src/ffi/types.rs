//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList).
//! Request dicts use the same field names as the JSON wire format.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::api::{BatchReport, OutcomeRow, SubmitBatch, ToggleReport};
use crate::coordinator::{CoordinatorConfig, CoordinatorError};
use crate::models::node::{Availability, NodeId};
use crate::models::outcome::BatchSummary;
use crate::models::transaction::{IsolationLevel, Transaction};
use crate::policy::{FragmentRoute, RoutingRules, SimulationCase};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field, raising ValueError when it is missing
fn extract_required<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyErr::new::<PyValueError, _>(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract an optional field; errors only when conversion fails
fn extract_optional<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<Option<T>>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

fn extract_with_default<'py, T>(dict: &Bound<'py, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    Ok(extract_optional(dict, key)?.unwrap_or(default))
}

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(err.to_string())
}

/// Map a coordinator error onto a Python exception
///
/// Caller mistakes (bad batch, rejected toggle, unknown stash entry) raise
/// ValueError; configuration problems raise RuntimeError.
pub(crate) fn coordinator_error(err: CoordinatorError) -> PyErr {
    match err {
        CoordinatorError::Config(_) => PyErr::new::<PyRuntimeError, _>(err.to_string()),
        _ => value_error(err),
    }
}

// ========================================================================
// Parsing
// ========================================================================

pub(crate) fn parse_node(name: &str) -> PyResult<NodeId> {
    name.parse().map_err(value_error)
}

pub(crate) fn parse_availability(name: &str) -> PyResult<Availability> {
    name.parse().map_err(value_error)
}

/// Parse an optional `{"routing": {...}}` dict
pub(crate) fn parse_coordinator_config(config: Option<&Bound<'_, PyDict>>) -> PyResult<CoordinatorConfig> {
    let Some(config) = config else {
        return Ok(CoordinatorConfig::default());
    };

    let routing = match extract_optional::<Bound<'_, PyDict>>(config, "routing")? {
        Some(routing) => parse_routing(&routing)?,
        None => RoutingRules::default(),
    };

    Ok(CoordinatorConfig { routing })
}

fn parse_routing(dict: &Bound<'_, PyDict>) -> PyResult<RoutingRules> {
    let defaults = RoutingRules::default();

    let fragments = match extract_optional::<Vec<Bound<'_, PyDict>>>(dict, "fragments")? {
        Some(items) => items
            .iter()
            .map(|item| {
                let table: String = extract_required(item, "table")?;
                let owner: String = extract_required(item, "owner")?;
                Ok(FragmentRoute::new(table, parse_node(&owner)?))
            })
            .collect::<PyResult<Vec<_>>>()?,
        None => defaults.fragments,
    };

    Ok(RoutingRules {
        fragment_failover: extract_with_default(dict, "fragment_failover", defaults.fragment_failover)?,
        read_fallback: extract_with_default(dict, "read_fallback", defaults.read_fallback)?,
        write_through: extract_with_default(dict, "write_through", defaults.write_through)?,
        fragments,
    })
}

fn parse_transaction(dict: &Bound<'_, PyDict>) -> PyResult<Transaction> {
    let id: u64 = extract_required(dict, "id")?;
    let node: String = extract_required(dict, "node")?;
    let query: String = extract_required(dict, "query")?;

    let mut tx = Transaction::new(id, parse_node(&node)?, query);
    if let Some(isolation) = extract_optional::<String>(dict, "isolation")? {
        tx = tx.with_isolation(isolation.parse::<IsolationLevel>().map_err(value_error)?);
    }
    Ok(tx)
}

/// Parse `{"simulationCase": "case2", "transactions": [...]}`
pub(crate) fn parse_submit_batch(dict: &Bound<'_, PyDict>) -> PyResult<SubmitBatch> {
    let case: String = extract_required(dict, "simulationCase")?;
    let case: SimulationCase = case.parse().map_err(value_error)?;

    let transactions = extract_with_default::<Vec<Bound<'_, PyDict>>>(dict, "transactions", Vec::new())?
        .iter()
        .map(parse_transaction)
        .collect::<PyResult<Vec<_>>>()?;

    Ok(SubmitBatch::new(case, transactions))
}

// ========================================================================
// Conversion to Python
// ========================================================================

pub(crate) fn outcome_row_to_py<'py>(py: Python<'py>, row: &OutcomeRow) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("transaction_id", row.transaction_id)?;
    dict.set_item("batch", row.batch)?;
    dict.set_item("node", row.node.as_str())?;
    dict.set_item("executed_on", row.executed_on.map(NodeId::as_str))?;
    dict.set_item("statement", &row.statement)?;
    dict.set_item("outcome_kind", row.outcome_kind.as_str())?;
    dict.set_item("payload_or_error", &row.payload_or_error)?;
    dict.set_item("attempt_index", row.attempt_index)?;
    Ok(dict)
}

pub(crate) fn outcome_rows_to_py<'py>(py: Python<'py>, rows: &[OutcomeRow]) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty_bound(py);
    for row in rows {
        list.append(outcome_row_to_py(py, row)?)?;
    }
    Ok(list)
}

fn summary_to_py<'py>(py: Python<'py>, summary: BatchSummary) -> PyResult<Bound<'py, PyDict>> {
    let (status, errors) = match summary {
        BatchSummary::AllSucceeded => ("success", 0),
        BatchSummary::PartialSuccess(n) => ("partial_success", n),
        BatchSummary::AllFailed => ("failed", 0),
    };

    let dict = PyDict::new_bound(py);
    dict.set_item("status", status)?;
    dict.set_item("errors", errors)?;
    Ok(dict)
}

pub(crate) fn batch_report_to_py(py: Python<'_>, report: &BatchReport) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("batch", report.batch)?;
    dict.set_item("simulation_case", report.simulation_case.to_string())?;
    dict.set_item("summary", summary_to_py(py, report.summary)?)?;
    dict.set_item("message", &report.status_message)?;
    dict.set_item("results", outcome_rows_to_py(py, &report.outcomes)?)?;
    Ok(dict.unbind())
}

pub(crate) fn toggle_report_to_py(py: Python<'_>, report: &ToggleReport) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("node", report.node.as_str())?;
    dict.set_item("availability", report.availability.to_string())?;
    dict.set_item("message", &report.status_message)?;
    dict.set_item("retried", outcome_rows_to_py(py, &report.retried)?)?;
    Ok(dict.unbind())
}
