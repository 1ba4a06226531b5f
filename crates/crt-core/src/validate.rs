//! Fishnet precondition checks, run before anything is mutated.
use std::collections::BTreeSet;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::fishnet::Fishnet;

/// Upstream step that produces a group of required fields.
const HRU_STEP: &str = "hru_parameters";
const STREAM_STEP: &str = "dem_2_streams";

type FieldProbe = fn(&Cell) -> f64;

/// Required fields: (name, producing step, accessor).
fn required_fields() -> [(&'static str, &'static str, FieldProbe); 8] {
    [
        ("activity_type", HRU_STEP, |c: &Cell| c.activity_type.code() as f64),
        ("row", HRU_STEP, |c: &Cell| c.row as f64),
        ("col", HRU_STEP, |c: &Cell| c.col as f64),
        ("irunbound", STREAM_STEP, |c: &Cell| c.irunbound as f64),
        ("segment_id", STREAM_STEP, |c: &Cell| c.segment_id as f64),
        ("flow_dir", STREAM_STEP, |c: &Cell| c.flow_dir as f64),
        ("outflow", STREAM_STEP, |c: &Cell| if c.outflow { 1.0 } else { 0.0 }),
        ("subbasin_id", STREAM_STEP, |c: &Cell| c.subbasin_id as f64),
    ]
}

/// Reject grids the routing engine and the solver cannot work with.
///
/// * the grid must be a complete, 1-based `nrows × ncols` rectangle with
///   unique addresses;
/// * no required field may have a maximum of 0 over the grid.
pub fn validate_fishnet(fishnet: &Fishnet) -> Result<()> {
    if fishnet.is_empty() {
        return Err(Error::InputValidation("fishnet contains no cells".into()));
    }
    if fishnet.distinct_addrs() != fishnet.len() {
        return Err(Error::InputValidation(format!(
            "{} cells share a (row, col) address with another cell",
            fishnet.len() - fishnet.distinct_addrs()
        )));
    }

    for (name, step, probe) in required_fields() {
        let max = fishnet.cells().iter().map(probe).fold(f64::NEG_INFINITY, f64::max);
        if max == 0.0 {
            return Err(Error::InputValidation(format!(
                "input field {name} contains only 0; try re-running {step}"
            )));
        }
    }

    let rows: BTreeSet<i32> = fishnet.cells().iter().map(|c| c.row).collect();
    let cols: BTreeSet<i32> = fishnet.cells().iter().map(|c| c.col).collect();
    let nrows = rows.len() as i32;
    let ncols = cols.len() as i32;
    let rows_contiguous = rows.first() == Some(&1) && rows.last() == Some(&nrows);
    let cols_contiguous = cols.first() == Some(&1) && cols.last() == Some(&ncols);
    if !rows_contiguous || !cols_contiguous || fishnet.len() != (nrows * ncols) as usize {
        return Err(Error::InputValidation(format!(
            "fishnet is not a complete 1-based grid: {} cells over {nrows} rows x {ncols} cols",
            fishnet.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellAddr;
    use crate::fishnet::fixtures::*;

    fn routable_grid() -> Fishnet {
        let mut fishnet = land_grid(3, 3);
        stream(&mut fishnet, 1, 2, 1, 4);
        stream(&mut fishnet, 2, 2, 1, 4);
        stream(&mut fishnet, 3, 2, 1, 4);
        outflow(&mut fishnet, 3, 2);
        fishnet
    }

    #[test]
    fn complete_grid_passes() {
        validate_fishnet(&routable_grid()).unwrap();
    }

    #[test]
    fn constant_zero_field_is_rejected() {
        // No stream delineation at all: segment/irunbound/outflow are all 0.
        let err = validate_fishnet(&land_grid(3, 3)).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::InputValidation(_)));
        assert!(msg.contains("irunbound") && msg.contains("dem_2_streams"), "{msg}");
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let mut cells = routable_grid().cells().to_vec();
        cells.retain(|c| c.addr() != CellAddr::new(1, 1));
        let err = validate_fishnet(&Fishnet::new(cells)).unwrap_err();
        assert!(err.to_string().contains("complete"), "{err}");
    }

    #[test]
    fn duplicate_address_is_rejected() {
        let mut cells = routable_grid().cells().to_vec();
        let mut dup = cells[0].clone();
        dup.unique_id = 99;
        cells.push(dup);
        let err = validate_fishnet(&Fishnet::new(cells)).unwrap_err();
        assert!(err.to_string().contains("share"), "{err}");
    }
}
