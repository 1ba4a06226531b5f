//! CRT `outputstat.txt` reader.
//!
//! The result file is free-form console output.  Only two blocks matter: the
//! filled elevation grid and the fill depth grid, each introduced by a fixed
//! marker line and spanning exactly `nrows` lines.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cell::CellAddr;
use crate::error::{Error, Result};
use crate::fishnet::Fishnet;

pub const FILLED_ELEV_MARKER: &str = "CRT FILLED LAND SURFACE MODEL USED TO GENERATE CASCADES";
pub const FILL_DEPTH_MARKER: &str = "DIFFERENCES BETWEEN FILLED AND UNFILLED LAND SURFACE MODELS";

/// Raw token grid, 1-based by (row, col).
type TokenGrid = HashMap<CellAddr, String>;

/// The two result blocks, still as text.  Tokens are kept unparsed so that
/// overflow symbols can be reported per cell.
#[derive(Debug, Clone, Default)]
pub struct FillOutput {
    elev: TokenGrid,
    fill: TokenGrid,
}

/// What `apply_fill_output` did to the fishnet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Cells that received `crt_elev` / `crt_fill`.
    pub imported: usize,
    /// Cells whose tokens were not numbers.
    pub skipped: usize,
    /// Imported cells with fill depth > 0.
    pub filled: usize,
    /// Cells whose `elevation` was replaced.
    pub overridden: usize,
}

fn block(lines: &[&str], marker: &str, nrows: usize) -> Result<TokenGrid> {
    let start = lines.iter().position(|l| *l == marker).ok_or_else(|| {
        Error::SolverOutput(format!("CRT didn't completely run: marker '{marker}' not found"))
    })?;
    let rows = &lines[start + 1..];
    if rows.len() < nrows {
        return Err(Error::SolverOutput(format!(
            "block '{marker}' has {} of {nrows} rows",
            rows.len()
        )));
    }
    let mut grid = TokenGrid::new();
    for (r, line) in rows[..nrows].iter().enumerate() {
        for (c, token) in line.split_whitespace().enumerate() {
            grid.insert(CellAddr::new(r as i32 + 1, c as i32 + 1), token.to_string());
        }
    }
    Ok(grid)
}

impl FillOutput {
    pub fn parse(text: &str, nrows: usize) -> Result<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let elev = block(&lines, FILLED_ELEV_MARKER, nrows)?;
        let fill = block(&lines, FILL_DEPTH_MARKER, nrows)?;
        Ok(Self { elev, fill })
    }

    pub fn read(path: &Path, nrows: usize) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, nrows)
    }

    pub fn elev_token(&self, addr: CellAddr) -> Option<&str> {
        self.elev.get(&addr).map(String::as_str)
    }

    pub fn fill_token(&self, addr: CellAddr) -> Option<&str> {
        self.fill.get(&addr).map(String::as_str)
    }
}

/// Merge the solver results into `fishnet`.
///
/// Every cell must have a token in both blocks; if one is missing nothing
/// is written.  Cells with a non-numeric token end up with `crt_elev` and
/// `crt_fill` unset, even if an earlier run had filled them.  With `use_crt_fill_flag`, cells with a positive fill depth
/// take the filled elevation as their `elevation`.
pub fn apply_fill_output(
    output: &FillOutput,
    fishnet: &mut Fishnet,
    use_crt_fill_flag: bool,
) -> Result<ImportSummary> {
    let mut resolved = Vec::with_capacity(fishnet.len());
    for (i, cell) in fishnet.cells().iter().enumerate() {
        let addr = cell.addr();
        match (output.elev_token(addr), output.fill_token(addr)) {
            (Some(elev), Some(fill)) => resolved.push((i, elev, fill)),
            _ => {
                return Err(Error::SolverOutput(format!(
                    "no CRT value for cell ({}, {})",
                    addr.row, addr.col
                )))
            }
        }
    }

    info!("Writing CRT data to fishnet");
    debug!("  {:<4} {:<4} {:>7}", "ROW", "COL", "FILL");
    let mut summary = ImportSummary::default();
    let cells = fishnet.cells_mut();
    for (i, elev_token, fill_token) in resolved {
        let cell = &mut cells[i];
        let (elev, fill) = match (elev_token.parse::<f64>(), fill_token.parse::<f64>()) {
            (Ok(elev), Ok(fill)) => (elev, fill),
            _ => {
                debug!(
                    "  Skipping value at ({}, {}): elev '{}', fill '{}'",
                    cell.row, cell.col, elev_token, fill_token
                );
                // Values from an earlier run no longer describe this surface.
                cell.crt_elev = None;
                cell.crt_fill = None;
                summary.skipped += 1;
                continue;
            }
        };
        cell.crt_elev = Some(elev);
        cell.crt_fill = Some(fill);
        summary.imported += 1;
        if fill > 0.0 {
            debug!("  {:>4} {:>4} {:>7.2}", cell.row, cell.col, fill);
            summary.filled += 1;
            if use_crt_fill_flag {
                cell.elevation = elev;
                summary.overridden += 1;
            }
        }
    }
    info!("  {} cells imported, {} filled", summary.imported, summary.filled);
    if summary.skipped > 0 {
        warn!("  {} cells had non-numeric CRT values and were skipped", summary.skipped);
    }
    Ok(summary)
}
