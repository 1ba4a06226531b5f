//! Fishnet grid store.
//!
//! Cells live in a flat arena persisted as a JSON `{"cells": [...]}` file;
//! lookups and writes go through an address index, never through position.
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellAddr};
use crate::error::{Error, Result};

/// On-disk layout of a fishnet JSON file.
#[derive(Serialize, Deserialize)]
struct FishnetFile {
    cells: Vec<Cell>,
}

/// Arena of fishnet cells with an address index.
///
/// Cell order is whatever the store was built with; every consumer that
/// emits row-major output sorts explicitly.
#[derive(Debug, Clone)]
pub struct Fishnet {
    cells: Vec<Cell>,
    index: HashMap<CellAddr, usize>,
}

impl Fishnet {
    pub fn new(cells: Vec<Cell>) -> Self {
        let mut index = HashMap::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            index.entry(cell.addr()).or_insert(i);
        }
        Self { cells, index }
    }

    /// Read a fishnet from a JSON file.  A missing attribute on any cell is
    /// reported as an input validation error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file: FishnetFile = serde_json::from_str(&text).map_err(|e| {
            Error::InputValidation(format!("fishnet {} could not be read: {e}", path.display()))
        })?;
        Ok(Self::new(file.cells))
    }

    /// Rewrite the whole fishnet JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = FishnetFile { cells: self.cells.clone() };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of distinct addresses (less than `len()` if any repeat).
    pub fn distinct_addrs(&self) -> usize {
        self.index.len()
    }

    /// (number of distinct rows, number of cells in the first row).
    pub fn shape(&self) -> (usize, usize) {
        let rows: BTreeSet<i32> = self.cells.iter().map(|c| c.row).collect();
        let ncols = match rows.iter().next() {
            Some(&first) => self.cells.iter().filter(|c| c.row == first).count(),
            None => 0,
        };
        (rows.len(), ncols)
    }

    /// Storage position of the cell at `addr`.
    pub fn index_of(&self, addr: CellAddr) -> Option<usize> {
        self.index.get(&addr).copied()
    }

    pub fn get(&self, addr: CellAddr) -> Option<&Cell> {
        self.index_of(addr).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, addr: CellAddr) -> Option<&mut Cell> {
        match self.index_of(addr) {
            Some(i) => Some(&mut self.cells[i]),
            None => None,
        }
    }

    /// Cells sorted by (row, col).
    pub fn row_major(&self) -> Vec<&Cell> {
        let mut sorted: Vec<&Cell> = self.cells.iter().collect();
        sorted.sort_by_key(|c| c.addr());
        sorted
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn shape_counts_rows_and_first_row_columns() {
        let fishnet = land_grid(3, 4);
        assert_eq!(fishnet.shape(), (3, 4));
        assert_eq!(fishnet.len(), 12);
    }

    #[test]
    fn lookup_does_not_depend_on_cell_order() {
        let mut cells = land_grid(2, 2).cells().to_vec();
        cells.reverse();
        let fishnet = Fishnet::new(cells);
        assert_eq!(fishnet.index_of(CellAddr::new(2, 2)), Some(0));
        assert_eq!(fishnet.index_of(CellAddr::new(3, 1)), None);
        assert_eq!(fishnet.get(CellAddr::new(1, 2)).unwrap().unique_id, 2);
        let order: Vec<i64> = fishnet.row_major().iter().map(|c| c.unique_id).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn save_and_load_preserve_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fishnet.json");
        let mut fishnet = land_grid(2, 3);
        stream(&mut fishnet, 1, 2, 5, 4);
        fishnet.save(&path).unwrap();
        let loaded = Fishnet::load(&path).unwrap();
        assert_eq!(loaded.cells(), fishnet.cells());
    }

    #[test]
    fn missing_attribute_is_input_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fishnet.json");
        fs::write(&path, r#"{"cells": [{"unique_id": 1, "row": 1, "col": 1}]}"#).unwrap();
        let err = Fishnet::load(&path).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)), "{err}");
    }
}
