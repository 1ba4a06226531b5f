//! Error types for the CRT fill pipeline.
//!
//! Every variant is fatal for the run.  Unparseable cells in the solver
//! output are not errors; the importer counts and logs them instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid project configuration value.
    #[error("Configuration error: {key}: {reason}")]
    Configuration { key: &'static str, reason: String },

    /// Required fishnet field absent, degenerate, or grid not rectangular.
    #[error("Input validation error: {0}")]
    InputValidation(String),

    #[error("Invalid flow direction code {code} at cell ({row}, {col})")]
    InvalidFlowDirection { code: i32, row: i32, col: i32 },

    /// A segment does not form a single chain with one exit.
    #[error("Topology error in segment {segment}: {reason}")]
    Topology { segment: i32, reason: String },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Solver execution error: {0}")]
    SolverExecution(String),

    /// Solver ran but its result file is incomplete or malformed.
    #[error("Solver output error: {0}")]
    SolverOutput(String),
}

/// Result type alias for CRT fill operations.
pub type Result<T> = std::result::Result<T, Error>;
