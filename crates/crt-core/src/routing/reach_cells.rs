//! KRCH / IRCH / JRCH: flag stream reach cells and copy their grid address
//! into the solver-facing reach fields.
use crate::cell::ActivityType;
use crate::fishnet::Fishnet;

/// Returns the number of cells flagged as reaches.
pub fn mark_reach_cells(fishnet: &mut Fishnet) -> usize {
    let mut count = 0;
    for cell in fishnet.cells_mut() {
        let is_reach = matches!(cell.activity_type, ActivityType::Land | ActivityType::Stream)
            && cell.segment_id > 0;
        if is_reach {
            cell.krch = 1;
            cell.irch = cell.row;
            cell.jrch = cell.col;
            count += 1;
        } else {
            cell.krch = 0;
            cell.irch = 0;
            cell.jrch = 0;
        }
    }
    count
}
