//! CRT fill input files.
//!
//! All four files are plain fixed-format text, rows in ascending grid row
//! order and columns ascending within a row:
//!
//! | file              | content                                   |
//! |-------------------|-------------------------------------------|
//! | `OUTFLOW_HRU.DAT` | count + (row, col) of every outflow cell  |
//! | `HRU_CASC.DAT`    | control header + activity type grid       |
//! | `LAND_ELEV.DAT`   | shape header + elevation grid (`{:10.6}`) |
//! | `XY.DAT`          | `unique_id x y` per cell, sorted          |
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cell::Cell;
use crate::config::CrtParams;
use crate::error::{Error, Result};
use crate::fishnet::Fishnet;

pub const OUTFLOW_HRU_FILE: &str = "OUTFLOW_HRU.DAT";
pub const HRU_CASC_FILE: &str = "HRU_CASC.DAT";
pub const LAND_ELEV_FILE: &str = "LAND_ELEV.DAT";
pub const XY_FILE: &str = "XY.DAT";

const HRU_CASC_LABELS: &str = "HRUFLG STRMFLG FLOWFLG VISFLG IPRN IFILL DPIT OUTITMAX";

/// Paths of the written input files.
#[derive(Debug, Clone)]
pub struct CrtInputFiles {
    pub outflow_hru: PathBuf,
    pub hru_casc: PathBuf,
    pub land_elev: PathBuf,
    pub xy: PathBuf,
    pub outflow_count: usize,
}

/// Delete any input files left by a previous run.
pub fn remove_stale_files(dir: &Path) -> Result<()> {
    debug!("Removing existing CRT fill files");
    for name in [OUTFLOW_HRU_FILE, HRU_CASC_FILE, LAND_ELEV_FILE, XY_FILE] {
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(Error::Export(format!("{} could not be removed: {e}", path.display())))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Write every input file into `dir`, stale copies removed first.
pub fn export_crt_inputs(fishnet: &Fishnet, params: &CrtParams, dir: &Path) -> Result<CrtInputFiles> {
    remove_stale_files(dir)?;
    info!("Building output CRT fill files");

    let outflow_hru = dir.join(OUTFLOW_HRU_FILE);
    info!("  {OUTFLOW_HRU_FILE}");
    let outflow_count = write_outflow_hru(fishnet, &outflow_hru)?;

    let hru_casc = dir.join(HRU_CASC_FILE);
    info!("  {HRU_CASC_FILE}");
    write_hru_casc(fishnet, params, &hru_casc)?;

    let land_elev = dir.join(LAND_ELEV_FILE);
    info!("  {LAND_ELEV_FILE}");
    write_land_elev(fishnet, &land_elev)?;

    let xy = dir.join(XY_FILE);
    info!("  {XY_FILE}");
    write_xy(fishnet, &xy)?;

    Ok(CrtInputFiles { outflow_hru, hru_casc, land_elev, xy, outflow_count })
}

/// Create `path` and fill it through `body`.  Every I/O failure, flush
/// included, is an export error naming the file.
fn write_file(path: &Path, body: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::Export(format!("{} could not be created: {e}", path.display()))
    })?;
    let mut w = BufWriter::new(file);
    body(&mut w)
        .and_then(|()| w.flush())
        .map_err(|e| Error::Export(format!("{} could not be written: {e}", path.display())))
}

/// Row-major cells split into grid rows.
fn grid_rows(fishnet: &Fishnet) -> Vec<Vec<&Cell>> {
    let mut rows: Vec<Vec<&Cell>> = Vec::new();
    for cell in fishnet.row_major() {
        match rows.last_mut() {
            Some(row) if row[0].row == cell.row => row.push(cell),
            _ => rows.push(vec![cell]),
        }
    }
    rows
}

/// `OUTFLOW_HRU.DAT`.  Returns the number of outflow cells; zero is an
/// error because CRT cannot route a model without an outlet.
pub fn write_outflow_hru(fishnet: &Fishnet, path: &Path) -> Result<usize> {
    let outflows: Vec<&Cell> = fishnet
        .row_major()
        .into_iter()
        .filter(|c| c.activity_type.is_active() && c.outflow)
        .collect();
    if outflows.is_empty() {
        return Err(Error::Export("no OUTFLOWHRU points in the fishnet".into()));
    }

    write_file(path, |w| {
        writeln!(w, "{}    NUMOUTFLOWHRU", outflows.len())?;
        for (i, cell) in outflows.iter().enumerate() {
            writeln!(w, "{} {} {}   OUTFLOW_ID ROW COL", i + 1, cell.row, cell.col)?;
        }
        Ok(())
    })?;
    Ok(outflows.len())
}

/// `HRU_CASC.DAT`: control header then one line of activity codes per row.
pub fn write_hru_casc(fishnet: &Fishnet, params: &CrtParams, path: &Path) -> Result<()> {
    write_file(path, |w| {
        writeln!(
            w,
            "{} {} {} {} {} {} {} {}     {HRU_CASC_LABELS}",
            params.hruflg,
            params.strmflg,
            params.flowflg,
            params.visflg,
            params.iprn,
            params.ifill,
            params.dpit,
            params.outitmax,
        )?;
        for row in grid_rows(fishnet) {
            let line: Vec<String> = row.iter().map(|c| c.activity_type.code().to_string()).collect();
            writeln!(w, "{}", line.join(" "))?;
        }
        Ok(())
    })
}

/// `LAND_ELEV.DAT`: shape header then one line of elevations per row.
pub fn write_land_elev(fishnet: &Fishnet, path: &Path) -> Result<()> {
    let rows = grid_rows(fishnet);
    let ncol = rows.first().map_or(0, |r| r.len());
    write_file(path, |w| {
        writeln!(w, "{} {}       NROW NCOL", rows.len(), ncol)?;
        for row in &rows {
            let line: Vec<String> = row.iter().map(|c| format!("{:10.6}", c.elevation)).collect();
            writeln!(w, "{}", line.join(" "))?;
        }
        Ok(())
    })
}

/// `XY.DAT`: integer (unique_id, x, y) per cell, ascending.
pub fn write_xy(fishnet: &Fishnet, path: &Path) -> Result<()> {
    let mut xy: Vec<(i64, i64, i64)> = fishnet
        .cells()
        .iter()
        .map(|c| (c.unique_id, c.x as i64, c.y as i64))
        .collect();
    xy.sort_unstable();
    write_file(path, |w| {
        for (id, x, y) in xy {
            writeln!(w, "{id} {x} {y}")?;
        }
        Ok(())
    })
}

/// Parsed `HRU_CASC.DAT`.
#[derive(Debug, Clone, PartialEq)]
pub struct HruCasc {
    pub params: CrtParams,
    /// Activity codes, row-major.
    pub activity: Vec<Vec<u8>>,
}

/// Read an `HRU_CASC.DAT` file back.
pub fn read_hru_casc(path: &Path) -> Result<HruCasc> {
    let text = fs::read_to_string(path)?;
    let bad = |reason: String| Error::Export(format!("{}: {reason}", path.display()));

    let mut lines = text.lines();
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| bad("empty file".into()))?
        .split_whitespace()
        .take(8)
        .collect();
    if header.len() != 8 {
        return Err(bad(format!("header has {} values, expected 8", header.len())));
    }
    let int = |i: usize| header[i].parse::<i32>().map_err(|e| bad(format!("header value {i}: {e}")));
    let params = CrtParams {
        hruflg: int(0)?,
        strmflg: int(1)?,
        flowflg: int(2)?,
        visflg: int(3)?,
        iprn: int(4)?,
        ifill: int(5)?,
        dpit: header[6].parse().map_err(|e| bad(format!("DPIT: {e}")))?,
        outitmax: header[7].parse().map_err(|e| bad(format!("OUTITMAX: {e}")))?,
    };

    let mut activity = Vec::new();
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let row = line
            .split_whitespace()
            .map(|t| t.parse::<u8>().map_err(|e| bad(format!("activity code {t:?}: {e}"))))
            .collect::<Result<Vec<u8>>>()?;
        activity.push(row);
    }
    Ok(HruCasc { params, activity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{ActivityType, CellAddr};
    use crate::fishnet::fixtures::*;

    fn sample_grid() -> Fishnet {
        let mut fishnet = land_grid(2, 3);
        stream(&mut fishnet, 1, 2, 1, 4);
        stream(&mut fishnet, 2, 2, 1, 4);
        lake(&mut fishnet, 1, 3, 1, -1, 16);
        fishnet.get_mut(CellAddr::new(2, 1)).unwrap().activity_type = ActivityType::Inactive;
        outflow(&mut fishnet, 2, 2);
        fishnet
    }

    #[test]
    fn outflow_file_lists_active_outlets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTFLOW_HRU_FILE);
        let mut fishnet = sample_grid();
        outflow(&mut fishnet, 2, 1); // inactive: skipped
        outflow(&mut fishnet, 1, 1);

        assert_eq!(write_outflow_hru(&fishnet, &path).unwrap(), 2);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "2    NUMOUTFLOWHRU\n1 1 1   OUTFLOW_ID ROW COL\n2 2 2   OUTFLOW_ID ROW COL\n"
        );
    }

    #[test]
    fn no_outflow_cells_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OUTFLOW_HRU_FILE);
        let err = write_outflow_hru(&land_grid(2, 2), &path).unwrap_err();
        assert!(matches!(err, Error::Export(_)), "{err}");
        assert!(!path.exists());
    }

    #[test]
    fn hru_casc_header_and_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HRU_CASC_FILE);
        write_hru_casc(&sample_grid(), &CrtParams::default(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "0 0 1 0 1 1 0.01 100000     HRUFLG STRMFLG FLOWFLG VISFLG IPRN IFILL DPIT OUTITMAX\n\
             1 3 2\n\
             0 3 1\n"
        );
    }

    #[test]
    fn activity_grid_reads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HRU_CASC_FILE);
        // Shuffled store order must not leak into the file.
        let mut cells = sample_grid().cells().to_vec();
        cells.reverse();
        let fishnet = Fishnet::new(cells);
        let params = CrtParams { hruflg: 1, dpit: 0.005, outitmax: 250, ..CrtParams::default() };
        write_hru_casc(&fishnet, &params, &path).unwrap();

        let parsed = read_hru_casc(&path).unwrap();
        assert_eq!(parsed.params, params);
        let expected: Vec<Vec<u8>> = (1..=2)
            .map(|r| {
                (1..=3)
                    .map(|c| fishnet.get(CellAddr::new(r, c)).unwrap().activity_type.code())
                    .collect()
            })
            .collect();
        assert_eq!(parsed.activity, expected);
    }

    #[test]
    fn land_elev_uses_fixed_width_six_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LAND_ELEV_FILE);
        let mut fishnet = land_grid(1, 2);
        fishnet.get_mut(CellAddr::new(1, 1)).unwrap().elevation = 12.5;
        fishnet.get_mut(CellAddr::new(1, 2)).unwrap().elevation = 1234.0000004;
        write_land_elev(&fishnet, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1 2       NROW NCOL\n 12.500000 1234.000000\n");
    }

    #[test]
    fn xy_is_sorted_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(XY_FILE);
        let mut cells = land_grid(1, 2).cells().to_vec();
        cells[0].unique_id = 20;
        cells[0].x = 100.9;
        cells[0].y = 200.2;
        cells[1].unique_id = 3;
        cells[1].x = 50.0;
        cells[1].y = 75.7;
        write_xy(&Fishnet::new(cells), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "3 50 75\n20 100 200\n");
    }

    #[test]
    fn export_replaces_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(XY_FILE), "stale\nstale\nstale\n").unwrap();
        let files = export_crt_inputs(&sample_grid(), &CrtParams::default(), dir.path()).unwrap();
        assert_eq!(files.outflow_count, 1);
        let xy = fs::read_to_string(&files.xy).unwrap();
        assert!(!xy.contains("stale"));
        assert_eq!(xy.lines().count(), 6);
        for path in [&files.outflow_hru, &files.hru_casc, &files.land_elev] {
            assert!(path.is_file(), "{}", path.display());
        }
    }

    #[test]
    fn stale_artifact_that_cannot_be_removed_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(XY_FILE)).unwrap();
        let err = export_crt_inputs(&sample_grid(), &CrtParams::default(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Export(_)), "{err}");
        assert!(err.to_string().contains(XY_FILE), "{err}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failure_is_an_export_error() {
        let err = write_xy(&land_grid(2, 2), Path::new("/dev/full")).unwrap_err();
        assert!(matches!(err, Error::Export(_)), "{err}");
        assert!(err.to_string().contains("/dev/full"), "{err}");
    }

    #[test]
    fn failed_export_leaves_no_stale_inputs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HRU_CASC_FILE), "old").unwrap();
        let err = export_crt_inputs(&land_grid(2, 2), &CrtParams::default(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        assert!(!dir.path().join(HRU_CASC_FILE).exists());
    }
}
