//! Reach numbering and outseg resolution per routing segment.
//!
//! A stream segment (`irunbound > 0`) must form one linear chain from a head
//! cell to an exit cell.  Reaches are numbered 1..=k in flow order.  Lake
//! segments (`irunbound <= 0`) route every member straight to the outseg and
//! carry no reach numbers.
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::cell::{ActivityType, CellAddr, EXIT_SEGMENT};
use crate::error::{Error, Result};
use crate::fishnet::Fishnet;
use super::graph::RoutingGraph;

/// Outcome of routing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    /// Receiving segment, or `EXIT_SEGMENT`.
    pub outseg: i32,
    pub cell_count: usize,
    /// First reach; `None` for lake segments.
    pub head: Option<CellAddr>,
    /// Address outside the segment that the segment drains into.
    pub exit_target: CellAddr,
}

/// Segment id → summary, ascending by id.
pub type SegmentTable = BTreeMap<i32, SegmentSummary>;

/// Assign `outseg_id`, `reach_index` and `max_reach` to every tracked cell.
///
/// Derived fields are reset first, so repeated calls on the same graph give
/// the same result.
pub fn assign_segments(graph: &mut RoutingGraph) -> Result<SegmentTable> {
    for rc in graph.cells.values_mut() {
        rc.outseg_id = 0;
        rc.reach_index = 0;
        rc.max_reach = 0;
    }

    let mut by_segment: BTreeMap<i32, BTreeSet<CellAddr>> = BTreeMap::new();
    for (&addr, rc) in &graph.cells {
        by_segment.entry(rc.irunbound).or_default().insert(addr);
    }

    let mut table = SegmentTable::new();
    for (seg, members) in by_segment {
        let out_cells: BTreeSet<CellAddr> = members
            .iter()
            .map(|addr| graph.cells[addr].downstream)
            .collect();

        let exits: Vec<CellAddr> = out_cells.difference(&members).copied().collect();
        let exit_target = match exits.as_slice() {
            [only] => *only,
            _ => {
                return Err(Error::Topology {
                    segment: seg,
                    reason: format!("expected 1 exit cell, found {}: {exits:?}", exits.len()),
                })
            }
        };
        let outseg = graph
            .get(exit_target)
            .map_or(EXIT_SEGMENT, |rc| rc.irunbound);

        let head = if seg > 0 {
            let reaches = walk_chain(graph, seg, &members, &out_cells, exit_target)?;
            let k = members.len() as i32;
            for (addr, reach) in &reaches {
                if let Some(rc) = graph.cells.get_mut(addr) {
                    rc.outseg_id = outseg;
                    rc.reach_index = *reach;
                    rc.max_reach = k;
                }
            }
            reaches.first().map(|(addr, _)| *addr)
        } else {
            for addr in &members {
                if let Some(rc) = graph.cells.get_mut(addr) {
                    rc.outseg_id = outseg;
                }
            }
            None
        };

        debug!("  Segment {seg}: {} cells, outseg {outseg}", members.len());
        table.insert(
            seg,
            SegmentSummary { outseg, cell_count: members.len(), head, exit_target },
        );
    }
    Ok(table)
}

/// Follow downstream pointers from the head cell, returning (address, reach)
/// in flow order.  Anything other than a single chain covering all members is
/// a topology error.
fn walk_chain(
    graph: &RoutingGraph,
    seg: i32,
    members: &BTreeSet<CellAddr>,
    out_cells: &BTreeSet<CellAddr>,
    exit_target: CellAddr,
) -> Result<Vec<(CellAddr, i32)>> {
    let topology = |reason: String| Error::Topology { segment: seg, reason };

    let heads: Vec<CellAddr> = members.difference(out_cells).copied().collect();
    let mut current = match heads.as_slice() {
        [only] => *only,
        _ => {
            return Err(topology(format!(
                "expected 1 head cell, found {}: {heads:?}",
                heads.len()
            )))
        }
    };

    let mut visited = BTreeSet::new();
    let mut reaches = Vec::with_capacity(members.len());
    for reach in 1..=members.len() as i32 {
        if !members.contains(&current) || !visited.insert(current) {
            return Err(topology(format!(
                "chain leaves the segment or revisits {current:?} at reach {reach}"
            )));
        }
        reaches.push((current, reach));
        let downstream = graph.cells[&current].downstream;
        if reach < members.len() as i32 {
            current = downstream;
        } else if downstream != exit_target {
            return Err(topology(format!(
                "last reach {current:?} drains to {downstream:?}, not the exit {exit_target:?}"
            )));
        }
    }
    Ok(reaches)
}

/// Zero the segment id of lake cells that carry a negative (lake) segment.
/// Routing already used `irunbound`, so only the exported id changes.
pub fn reset_lake_segments(fishnet: &mut Fishnet) -> usize {
    let mut count = 0;
    for cell in fishnet.cells_mut() {
        if cell.activity_type == ActivityType::Lake && cell.segment_id < 0 {
            cell.segment_id = 0;
            count += 1;
        }
    }
    count
}
