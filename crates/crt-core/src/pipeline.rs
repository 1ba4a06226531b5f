//! End-to-end CRT fill run.
//!
//! Steps:
//! 1. Load and validate the fishnet.
//! 2. Route stream and lake segments, save the routing fields.
//! 3. Stage the solver workspace and export the `.DAT` inputs.
//! 4. Run CRT.
//! 5. Import the filled surface and save the fishnet again.
use std::path::PathBuf;

use tracing::info;

use crate::config::CrtFillConfig;
use crate::crt::export::{export_crt_inputs, CrtInputFiles};
use crate::crt::import::{apply_fill_output, FillOutput, ImportSummary};
use crate::crt::solver::FillWorkspace;
use crate::error::Result;
use crate::fishnet::Fishnet;
use crate::routing::{route_fishnet, RoutingSummary};
use crate::validate::validate_fishnet;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct CrtFillReport {
    pub nrows: usize,
    pub ncols: usize,
    pub routing: RoutingSummary,
    pub inputs: CrtInputFiles,
    pub output_path: PathBuf,
    pub import: ImportSummary,
}

/// Run the full fill workflow for `config`.
///
/// `overwrite` re-copies the CRT executable into the workspace even if a
/// copy is already there.  The fishnet file is rewritten once routing is
/// done, so routing results survive a solver failure.
pub fn run_crt_fill(config: &CrtFillConfig, overwrite: bool) -> Result<CrtFillReport> {
    info!("Reading fishnet {}", config.fishnet_path.display());
    let mut fishnet = Fishnet::load(&config.fishnet_path)?;
    validate_fishnet(&fishnet)?;
    let (nrows, ncols) = fishnet.shape();
    info!("  {} cells, {} rows x {} cols", fishnet.len(), nrows, ncols);

    let routing = route_fishnet(&mut fishnet)?;
    fishnet.save(&config.fishnet_path)?;

    let mut workspace = FillWorkspace::acquire(&config.param_ws, &config.crt_exe_path, overwrite)?;
    let inputs = export_crt_inputs(&fishnet, &config.params, workspace.dir())?;
    let output_path = workspace.run(config.solver_timeout)?;

    info!("Reading {}", output_path.display());
    let output = FillOutput::read(&output_path, nrows)?;
    let import = apply_fill_output(&output, &mut fishnet, config.use_crt_fill_flag)?;
    fishnet.save(&config.fishnet_path)?;

    Ok(CrtFillReport { nrows, ncols, routing, inputs, output_path, import })
}
