//! Downstream graph over the routed (stream and lake) cells.
use std::collections::{BTreeMap, BTreeSet};

use crate::cell::CellAddr;
use crate::error::Result;
use crate::fishnet::Fishnet;
use super::flow_dir::next_cell;

/// Routing state of one stream or lake cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCell {
    pub unique_id: i64,
    /// Routing segment id.
    pub irunbound: i32,
    /// Address this cell drains into; may be untracked or off-grid.
    pub downstream: CellAddr,
    pub elevation: f64,
    pub outseg_id: i32,
    pub reach_index: i32,
    pub max_reach: i32,
}

/// Tracked cells keyed by address, plus the sorted segment list.
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    pub(crate) cells: BTreeMap<CellAddr, RouteCell>,
    segments: Vec<i32>,
}

impl RoutingGraph {
    /// Track every active cell with a segment or lake id.
    ///
    /// Fails on the first tracked cell whose flow direction code is not a
    /// D8 code.  The fishnet is not modified.
    pub fn build(fishnet: &Fishnet) -> Result<Self> {
        let mut cells = BTreeMap::new();
        for cell in fishnet.cells().iter().filter(|c| c.is_routed()) {
            let addr = cell.addr();
            let downstream = next_cell(cell.flow_dir, addr)?;
            cells.insert(
                addr,
                RouteCell {
                    unique_id: cell.unique_id,
                    irunbound: cell.irunbound,
                    downstream,
                    elevation: cell.elevation,
                    outseg_id: 0,
                    reach_index: 0,
                    max_reach: 0,
                },
            );
        }
        let segments: BTreeSet<i32> = cells.values().map(|c| c.irunbound).collect();
        Ok(Self { cells, segments: segments.into_iter().collect() })
    }

    /// Distinct routing segment ids, ascending.
    pub fn segments(&self) -> &[i32] {
        &self.segments
    }

    pub fn get(&self, addr: CellAddr) -> Option<&RouteCell> {
        self.cells.get(&addr)
    }

    pub fn contains(&self, addr: CellAddr) -> bool {
        self.cells.contains_key(&addr)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellAddr, &RouteCell)> {
        self.cells.iter()
    }

    /// Copy outseg / reach / max reach to the fishnet.  Cells that are not
    /// tracked get 0 for all three.
    pub fn write_back(&self, fishnet: &mut Fishnet) {
        for cell in fishnet.cells_mut() {
            match self.cells.get(&cell.addr()) {
                Some(rc) => {
                    cell.outseg_id = rc.outseg_id;
                    cell.reach_index = rc.reach_index;
                    cell.max_reach = rc.max_reach;
                }
                None => {
                    cell.outseg_id = 0;
                    cell.reach_index = 0;
                    cell.max_reach = 0;
                }
            }
        }
    }
}
