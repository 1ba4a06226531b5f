//! D8 flow direction decoding.
//!
//! Encoding (power-of-two, clockwise from east):
//! ```text
//!   32  64  128
//!   16   x    1
//!    8   4    2
//! ```
use crate::cell::CellAddr;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

/// (code, direction, row offset, col offset).  Rows increase southward.
const D8_TABLE: [(i32, FlowDirection, i32, i32); 8] = [
    (1, FlowDirection::East, 0, 1),
    (2, FlowDirection::SouthEast, 1, 1),
    (4, FlowDirection::South, 1, 0),
    (8, FlowDirection::SouthWest, 1, -1),
    (16, FlowDirection::West, 0, -1),
    (32, FlowDirection::NorthWest, -1, -1),
    (64, FlowDirection::North, -1, 0),
    (128, FlowDirection::NorthEast, -1, 1),
];

impl FlowDirection {
    pub fn from_code(code: i32) -> Option<Self> {
        D8_TABLE.iter().find(|e| e.0 == code).map(|e| e.1)
    }

    pub fn code(self) -> i32 {
        self.entry().0
    }

    /// (row offset, col offset) of the downstream neighbour.
    pub fn offset(self) -> (i32, i32) {
        let e = self.entry();
        (e.2, e.3)
    }

    fn entry(self) -> &'static (i32, FlowDirection, i32, i32) {
        // Every variant has exactly one table row.
        &D8_TABLE[self as usize]
    }
}

/// Address of the cell that `addr` drains into.
pub fn next_cell(code: i32, addr: CellAddr) -> Result<CellAddr> {
    let dir = FlowDirection::from_code(code).ok_or(Error::InvalidFlowDirection {
        code,
        row: addr.row,
        col: addr.col,
    })?;
    let (dr, dc) = dir.offset();
    Ok(addr.offset(dr, dc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_variant_order() {
        for (i, e) in D8_TABLE.iter().enumerate() {
            assert_eq!(e.1 as usize, i);
            assert_eq!(FlowDirection::from_code(e.0), Some(e.1));
            assert_eq!(e.1.code(), e.0);
        }
    }

    #[test]
    fn all_codes_decode_to_unit_neighbours() {
        let here = CellAddr::new(5, 5);
        let expected = [
            (1, (5, 6)),
            (2, (6, 6)),
            (4, (6, 5)),
            (8, (6, 4)),
            (16, (5, 4)),
            (32, (4, 4)),
            (64, (4, 5)),
            (128, (4, 6)),
        ];
        for (code, (r, c)) in expected {
            assert_eq!(next_cell(code, here).unwrap(), CellAddr::new(r, c), "code {code}");
        }
    }

    #[test]
    fn edge_cells_may_point_outside_the_grid() {
        assert_eq!(next_cell(64, CellAddr::new(1, 1)).unwrap(), CellAddr::new(0, 1));
    }

    #[test]
    fn unknown_codes_are_rejected() {
        for code in [0, 3, 5, 255, -1] {
            let err = next_cell(code, CellAddr::new(2, 3)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidFlowDirection { code: c, row: 2, col: 3 } if c == code),
                "code {code}: {err}"
            );
        }
    }
}
