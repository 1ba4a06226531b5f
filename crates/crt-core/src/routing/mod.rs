//! Stream/lake routing: reach flags → downstream graph → reach numbering and
//! outseg → write back → lake segment reset.
pub mod flow_dir;
pub mod graph;
pub mod reach_cells;
pub mod segments;

use tracing::info;

use crate::error::Result;
use crate::fishnet::Fishnet;
use graph::RoutingGraph;
use reach_cells::mark_reach_cells;
use segments::{assign_segments, reset_lake_segments, SegmentTable};

/// Counts and per-segment results of one routing pass.
#[derive(Debug, Clone)]
pub struct RoutingSummary {
    pub reach_cells: usize,
    pub routed_cells: usize,
    pub segments: SegmentTable,
    pub lake_cells_reset: usize,
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Compute all routing fields of `fishnet` in place.
///
/// Steps:
/// 1. KRCH / IRCH / JRCH for stream reach cells.
/// 2. Downstream cell of every stream and lake cell.
/// 3. Reach numbers and outseg per segment.
/// 4. Write outseg / reach / max reach back to the fishnet.
/// 5. Zero negative lake segment ids.
///
/// The graph is built and checked before the fishnet's outseg fields are
/// touched, so a topology error leaves them as they were.
pub fn route_fishnet(fishnet: &mut Fishnet) -> Result<RoutingSummary> {
    info!("KRCH, IRCH & JRCH for streams");
    let reach_cells = mark_reach_cells(fishnet);

    info!("Cell out-flow dictionary");
    let mut graph = RoutingGraph::build(fishnet)?;

    info!("Calculate reach and outseg");
    let segments = assign_segments(&mut graph)?;

    info!("Save reach and outseg");
    graph.write_back(fishnet);

    info!("Lake segment ids");
    let lake_cells_reset = reset_lake_segments(fishnet);

    info!(
        "  {} reach cells, {} routed cells in {} segments",
        reach_cells,
        graph.len(),
        segments.len()
    );
    Ok(RoutingSummary { reach_cells, routed_cells: graph.len(), segments, lake_cells_reset })
}
