//! External CRT solver boundary.
//!
//! `FillWorkspace` owns the `fill_work` directory for one run: it stages the
//! executable, runs it there, and checks that it left a result file.  The
//! run is blocking; an optional timeout kills the solver and fails the same
//! way as an abnormal exit.
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::error::{Error, Result};

pub const FILL_WORKSPACE_NAME: &str = "fill_work";
pub const OUTPUT_FILE: &str = "outputstat.txt";
/// Solver stdout/stderr are redirected here.
pub const CONSOLE_FILE: &str = "crt_console.txt";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Succeeded,
    Failed,
}

/// Scoped ownership of the solver working directory.
#[derive(Debug)]
pub struct FillWorkspace {
    dir: PathBuf,
    exe: PathBuf,
    state: RunState,
}

impl FillWorkspace {
    /// Create `<param_ws>/fill_work` and stage the executable in it.
    ///
    /// The executable is copied only if the workspace has none yet, unless
    /// `overwrite` is set.
    pub fn acquire(param_ws: &Path, exe_path: &Path, overwrite: bool) -> Result<Self> {
        let dir = param_ws.join(FILL_WORKSPACE_NAME);
        fs::create_dir_all(&dir)?;
        // The solver is spawned with `dir` as its working directory, so the
        // program path must not be relative to ours.
        let dir = fs::canonicalize(&dir)?;

        let exe_name = exe_path.file_name().ok_or_else(|| Error::Configuration {
            key: "crt_exe_path",
            reason: format!("{} has no file name", exe_path.display()),
        })?;
        let exe = dir.join(exe_name);
        if (overwrite || !exe.is_file()) && exe_path.is_file() && exe_path != exe {
            debug!("Copying {} to {}", exe_path.display(), dir.display());
            fs::copy(exe_path, &exe)?;
        }
        if !exe.is_file() {
            return Err(Error::SolverExecution(format!(
                "CRT executable ({}) does not exist",
                exe.display()
            )));
        }
        Ok(Self { dir, exe, state: RunState::Idle })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    /// Run the solver to completion and return the result file path.
    ///
    /// A result file left by an earlier run is removed first so a solver
    /// that dies early cannot be mistaken for a successful one.
    pub fn run(&mut self, timeout: Option<Duration>) -> Result<PathBuf> {
        self.state = RunState::Failed;
        let output = self.output_path();
        if output.is_file() {
            fs::remove_file(&output)?;
        }

        let console = File::create(self.dir.join(CONSOLE_FILE))?;
        let child = Command::new(&self.exe)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(console.try_clone()?))
            .stderr(Stdio::from(console))
            .spawn()
            .map_err(|e| {
                Error::SolverExecution(format!("{} could not be started: {e}", self.exe.display()))
            })?;

        info!("Running CRT");
        let mut guard = ChildGuard(Some(child));
        let status = guard.wait(timeout)?;
        if !status.success() {
            return Err(Error::SolverExecution(format!(
                "CRT exited with {status}; see {}",
                self.dir.join(CONSOLE_FILE).display()
            )));
        }
        if !output.is_file() {
            return Err(Error::SolverExecution(format!(
                "CRT finished but did not write {}",
                output.display()
            )));
        }
        self.state = RunState::Succeeded;
        Ok(output)
    }
}

impl Drop for FillWorkspace {
    fn drop(&mut self) {
        match self.state {
            RunState::Succeeded => debug!("CRT workspace {} released", self.dir.display()),
            RunState::Failed => error!(
                "CRT run failed; inputs and console output kept in {}",
                self.dir.display()
            ),
            RunState::Idle => {}
        }
    }
}

/// Kills the solver if it is still running when the guard goes away.
struct ChildGuard(Option<Child>);

impl ChildGuard {
    fn wait(&mut self, timeout: Option<Duration>) -> Result<ExitStatus> {
        let child = self
            .0
            .as_mut()
            .ok_or_else(|| Error::SolverExecution("solver process already reaped".into()))?;
        let status = match timeout {
            None => child.wait()?,
            Some(limit) => {
                let start = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if start.elapsed() >= limit {
                        return Err(Error::SolverExecution(format!(
                            "CRT did not finish within {} s",
                            limit.as_secs_f64()
                        )));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };
        self.0 = None;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
