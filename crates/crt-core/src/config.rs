//! Project configuration for a CRT fill run.
//!
//! The project file is JSON.  Required keys name the fishnet, the parameter
//! workspace and the CRT executable; every solver control value is optional
//! and falls back to a documented default, which is logged.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// CRT control values written to the `HRU_CASC.DAT` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrtParams {
    pub hruflg: i32,
    /// Fixed at 0 for fill runs.
    pub strmflg: i32,
    pub flowflg: i32,
    /// Fixed at 0 for fill runs.
    pub visflg: i32,
    /// Fixed at 1; not user-configurable.
    pub iprn: i32,
    /// Fixed at 1 for fill runs.
    pub ifill: i32,
    /// Convergence tolerance for pit filling.
    pub dpit: f64,
    pub outitmax: u32,
}

impl Default for CrtParams {
    fn default() -> Self {
        Self {
            hruflg: 0,
            strmflg: 0,
            flowflg: 1,
            visflg: 0,
            iprn: 1,
            ifill: 1,
            dpit: 0.01,
            outitmax: 100_000,
        }
    }
}

/// Resolved project configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CrtFillConfig {
    pub fishnet_path: PathBuf,
    /// Parent of the `fill_work` solver workspace.
    pub param_ws: PathBuf,
    pub crt_exe_path: PathBuf,
    /// Replace `elevation` with the CRT filled elevation where fill > 0.
    pub use_crt_fill_flag: bool,
    pub params: CrtParams,
    /// `None` waits for the solver indefinitely.
    pub solver_timeout: Option<Duration>,
}

/// Project file as written by the user; every key optional so missing ones
/// can be reported by name.
#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    fishnet_path: Option<PathBuf>,
    param_ws: Option<PathBuf>,
    crt_exe_path: Option<PathBuf>,
    use_crt_fill_flag: Option<bool>,
    crt_hruflg: Option<i32>,
    crt_flowflg: Option<i32>,
    crt_dpit: Option<f64>,
    crt_outitmax: Option<u32>,
    solver_timeout_secs: Option<u64>,
}

fn or_default<T: std::fmt::Display>(value: Option<T>, key: &str, default: T) -> T {
    value.unwrap_or_else(|| {
        info!("  Missing parameter, setting {key} = {default}");
        default
    })
}

fn required(value: Option<PathBuf>, key: &'static str, base: &Path) -> Result<PathBuf> {
    let path = value.ok_or(Error::Configuration { key, reason: "required key is missing".into() })?;
    Ok(if path.is_relative() { base.join(path) } else { path })
}

impl CrtFillConfig {
    /// Read a project file.  Relative paths are resolved against the
    /// absolute directory containing the file, so the result does not
    /// depend on the working directory of later steps.
    pub fn from_path(path: &Path) -> Result<Self> {
        let unreadable = |e: std::io::Error| Error::Configuration {
            key: "config_path",
            reason: format!("{} could not be read: {e}", path.display()),
        };
        let path = fs::canonicalize(path).map_err(unreadable)?;
        let text = fs::read_to_string(&path).map_err(unreadable)?;
        let base = path.parent().unwrap_or_else(|| Path::new("/"));
        Self::from_json(&text, base)
    }

    pub fn from_json(text: &str, base: &Path) -> Result<Self> {
        let file: ProjectFile = serde_json::from_str(text).map_err(|e| Error::Configuration {
            key: "config_path",
            reason: format!("not a valid project file: {e}"),
        })?;

        let defaults = CrtParams::default();
        let use_crt_fill_flag = or_default(file.use_crt_fill_flag, "use_crt_fill_flag", false);
        let params = CrtParams {
            hruflg: or_default(file.crt_hruflg, "crt_hruflg", defaults.hruflg),
            flowflg: or_default(file.crt_flowflg, "crt_flowflg", defaults.flowflg),
            dpit: or_default(file.crt_dpit, "crt_dpit", defaults.dpit),
            outitmax: or_default(file.crt_outitmax, "crt_outitmax", defaults.outitmax),
            ..defaults
        };

        if !(params.dpit.is_finite() && params.dpit > 0.0) {
            return Err(Error::Configuration {
                key: "crt_dpit",
                reason: format!("must be a positive number, got {}", params.dpit),
            });
        }
        if params.outitmax == 0 {
            return Err(Error::Configuration {
                key: "crt_outitmax",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            fishnet_path: required(file.fishnet_path, "fishnet_path", base)?,
            param_ws: required(file.param_ws, "param_ws", base)?,
            crt_exe_path: required(file.crt_exe_path, "crt_exe_path", base)?,
            use_crt_fill_flag,
            params,
            solver_timeout: file.solver_timeout_secs.map(Duration::from_secs),
        })
    }
}
