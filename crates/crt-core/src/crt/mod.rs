//! Boundary with the external CRT (Cascade Routing Tool) solver.
//!
//! `export` writes the four `.DAT` inputs, `solver` runs CRT inside its
//! `fill_work` directory, and `import` merges the filled surface from
//! `outputstat.txt` back into the fishnet.
pub mod export;
pub mod import;
pub mod solver;
