//! Fishnet cell types and grid addressing.
//! Rows and columns are 1-based; row increases downward (north to south).
use serde::{Deserialize, Serialize};

/// Outseg value meaning "flow leaves the modeled domain".
pub const EXIT_SEGMENT: i32 = 0;

/// A (row, column) grid address.
///
/// Downstream addresses of edge cells may point one step outside the grid,
/// so both components are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: i32,
    pub col: i32,
}

impl CellAddr {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Address shifted by a (row, col) offset.
    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Self { row: self.row + dr, col: self.col + dc }
    }
}

/// HRU activity type, stored as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ActivityType {
    Inactive,
    Land,
    Lake,
    Stream,
}

impl ActivityType {
    pub fn code(self) -> u8 {
        match self {
            ActivityType::Inactive => 0,
            ActivityType::Land => 1,
            ActivityType::Lake => 2,
            ActivityType::Stream => 3,
        }
    }

    pub fn is_active(self) -> bool {
        self != ActivityType::Inactive
    }
}

impl TryFrom<u8> for ActivityType {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(ActivityType::Inactive),
            1 => Ok(ActivityType::Land),
            2 => Ok(ActivityType::Lake),
            3 => Ok(ActivityType::Stream),
            other => Err(format!("invalid activity type code {other} (expected 0-3)")),
        }
    }
}

impl From<ActivityType> for u8 {
    fn from(t: ActivityType) -> u8 {
        t.code()
    }
}

/// One fishnet cell: inputs from the upstream delineation steps plus the
/// fields this crate derives and writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Grid-wide unique id, stable across runs.
    pub unique_id: i64,
    pub row: i32,
    pub col: i32,
    pub activity_type: ActivityType,
    /// 0 when the cell is not part of a lake.
    pub lake_id: i32,
    /// Stream segment id; 0 = no reach, negative = lake segment.
    pub segment_id: i32,
    /// Routing segment id.  Kept non-zero for lake cells whose `segment_id`
    /// is later zeroed.
    pub irunbound: i32,
    /// D8 flow direction code (1, 2, 4, ..., 128).
    pub flow_dir: i32,
    /// Adjusted land-surface elevation.
    pub elevation: f64,
    /// True if the cell is a domain outflow point.
    pub outflow: bool,
    pub subbasin_id: i32,
    pub x: f64,
    pub y: f64,

    // ── Derived ──────────────────────────────────────────────────────────
    #[serde(default)]
    pub krch: i32,
    #[serde(default)]
    pub irch: i32,
    #[serde(default)]
    pub jrch: i32,
    #[serde(default)]
    pub reach_index: i32,
    #[serde(default)]
    pub max_reach: i32,
    #[serde(default)]
    pub outseg_id: i32,
    #[serde(default)]
    pub crt_elev: Option<f64>,
    #[serde(default)]
    pub crt_fill: Option<f64>,
}

impl Cell {
    pub fn addr(&self) -> CellAddr {
        CellAddr::new(self.row, self.col)
    }

    /// Stream or lake cell that takes part in segment routing.
    pub fn is_routed(&self) -> bool {
        self.activity_type.is_active() && (self.segment_id != 0 || self.lake_id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_type_codes_roundtrip_through_serde() {
        for t in [
            ActivityType::Inactive,
            ActivityType::Land,
            ActivityType::Lake,
            ActivityType::Stream,
        ] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, t.code().to_string());
            let back: ActivityType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn unknown_activity_code_is_rejected() {
        assert!(serde_json::from_str::<ActivityType>("4").is_err());
    }

    #[test]
    fn derived_fields_default_when_absent() {
        let json = r#"{
            "unique_id": 5, "row": 2, "col": 3, "activity_type": 3,
            "lake_id": 0, "segment_id": 4, "irunbound": 4, "flow_dir": 1,
            "elevation": 101.5, "outflow": false, "subbasin_id": 1,
            "x": 500.0, "y": 800.0
        }"#;
        let cell: Cell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.addr(), CellAddr::new(2, 3));
        assert_eq!(cell.krch, 0);
        assert_eq!(cell.outseg_id, 0);
        assert!(cell.crt_elev.is_none());
        assert!(cell.is_routed());
    }

    #[test]
    fn addresses_order_row_major() {
        let mut addrs = vec![CellAddr::new(2, 1), CellAddr::new(1, 3), CellAddr::new(1, 2)];
        addrs.sort();
        assert_eq!(addrs, vec![CellAddr::new(1, 2), CellAddr::new(1, 3), CellAddr::new(2, 1)]);
    }
}
