//! Fill-parameter engine for the CRT (Cascade Routing Tool) solver.
//!
//! Routes stream and lake segments over a fishnet grid, writes the solver's
//! fixed-format inputs, runs it, and merges the filled land surface back
//! into the grid.
pub mod cell;
pub mod config;
pub mod crt;
pub mod error;
pub mod fishnet;
pub mod pipeline;
pub mod routing;
pub mod validate;

pub use cell::{ActivityType, Cell, CellAddr, EXIT_SEGMENT};
pub use config::{CrtFillConfig, CrtParams};
pub use error::{Error, Result};
pub use fishnet::Fishnet;
pub use pipeline::{run_crt_fill, CrtFillReport};
pub use routing::{route_fishnet, RoutingSummary};
