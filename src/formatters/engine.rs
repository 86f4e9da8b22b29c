//! Lazily acquired, disposable engine handles.
//!
//! Each adapter owns one [`EngineSlot`]. The first call that needs the engine
//! locates its binary and probes its version; every later call reuses that
//! handle until [`EngineSlot::dispose`] clears it. A failed acquisition is
//! remembered so an absent engine is not probed once per fragment.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use super::executor::ProcessExecutor;
use crate::error::{Error, Result};

/// Timeout for `--version` probes.
const VERSION_PROBE_TIMEOUT_MS: u64 = 10_000;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+)?").expect("valid version regex"));

/// An acquired engine: the resolved executable and the version it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHandle {
    pub program: PathBuf,
    pub version: String,
}

#[derive(Debug)]
enum SlotState {
    Vacant,
    Ready(Arc<EngineHandle>),
    Unavailable(String),
}

/// Holder for one adapter's engine handle.
#[derive(Debug)]
pub struct EngineSlot {
    engine: String,
    state: Mutex<SlotState>,
}

impl EngineSlot {
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            state: Mutex::new(SlotState::Vacant),
        }
    }

    /// Return the held handle, running `acquire` first if the slot is vacant.
    ///
    /// The lock is held across `acquire`, so concurrent first uses acquire once.
    pub fn get_or_acquire<F>(&self, acquire: F) -> Result<Arc<EngineHandle>>
    where
        F: FnOnce() -> Result<EngineHandle>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            SlotState::Ready(handle) => return Ok(Arc::clone(handle)),
            SlotState::Unavailable(_) => return Err(Error::engine_missing(&self.engine)),
            SlotState::Vacant => {}
        }

        match acquire() {
            Ok(handle) => {
                log::debug!(
                    "[fencefmt-engine] Acquired {} {} at {}",
                    self.engine,
                    handle.version,
                    handle.program.display()
                );
                let handle = Arc::new(handle);
                *state = SlotState::Ready(Arc::clone(&handle));
                Ok(handle)
            }
            Err(e) => {
                log::debug!("[fencefmt-engine] {} unavailable: {e}", self.engine);
                *state = SlotState::Unavailable(e.to_string());
                Err(Error::engine_missing(&self.engine))
            }
        }
    }

    pub fn is_acquired(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            SlotState::Ready(_)
        )
    }

    /// Why the last acquisition failed, if it did.
    pub fn unavailable_reason(&self) -> Option<String> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Unavailable(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Drop the handle (or a remembered failure).
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, SlotState::Ready(_)) {
            log::debug!("[fencefmt-engine] Disposed {}", self.engine);
        }
        *state = SlotState::Vacant;
    }
}

/// A stdin/stdout engine driven through a subprocess.
///
/// Shared machinery behind the built-in adapters: where to find the binary,
/// how long a call may run, and the slot holding the acquired handle.
#[derive(Debug)]
pub struct ExternalEngine {
    name: &'static str,
    binary: &'static str,
    program_override: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    executor: ProcessExecutor,
    slot: EngineSlot,
}

impl ExternalEngine {
    pub fn new(name: &'static str, binary: &'static str, timeout_ms: u64, working_dir: Option<PathBuf>) -> Self {
        Self {
            name,
            binary,
            program_override: None,
            working_dir,
            executor: ProcessExecutor::new(timeout_ms),
            slot: EngineSlot::new(name),
        }
    }

    /// Use `program` instead of searching for the binary.
    pub fn set_program(&mut self, program: PathBuf) {
        self.program_override = Some(program);
        self.slot.dispose();
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn handle(&self) -> Result<Arc<EngineHandle>> {
        self.slot.get_or_acquire(|| self.acquire())
    }

    pub fn is_available(&self) -> bool {
        self.handle().is_ok()
    }

    pub fn version(&self) -> Result<String> {
        self.handle().map(|h| h.version.clone())
    }

    /// Pipe `input` through the engine with `args`, returning its stdout.
    pub fn run_format(&self, args: &[String], input: &str) -> Result<String> {
        let handle = self.handle()?;
        self.executor
            .format(self.name, &handle.program, args, input, self.working_dir.as_deref())
    }

    pub fn dispose(&self) {
        self.slot.dispose();
    }

    pub fn slot(&self) -> &EngineSlot {
        &self.slot
    }

    fn acquire(&self) -> Result<EngineHandle> {
        let program = match &self.program_override {
            Some(program) => program.clone(),
            None => locate_program(self.binary, self.working_dir.as_deref())
                .ok_or_else(|| Error::engine_missing(self.name))?,
        };
        let version = probe_version(self.name, &program, self.working_dir.as_deref())?;
        Ok(EngineHandle { program, version })
    }
}

/// Find `binary` in a `node_modules/.bin` under `working_dir` or its
/// ancestors, then on `PATH`.
pub fn locate_program(binary: &str, working_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = working_dir {
        for ancestor in dir.ancestors() {
            let bin_dir = ancestor.join("node_modules").join(".bin");
            for name in local_bin_names(binary) {
                let candidate = bin_dir.join(&name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }
    which(binary)
}

fn local_bin_names(binary: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{binary}.cmd"), format!("{binary}.exe"), binary.to_string()]
    } else {
        vec![binary.to_string()]
    }
}

fn which(binary: &str) -> Option<PathBuf> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = Command::new(finder)
        .arg(binary)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Run `<program> --version` and pull the version number out of its output.
pub fn probe_version(engine: &str, program: &Path, cwd: Option<&Path>) -> Result<String> {
    let executor = ProcessExecutor::new(VERSION_PROBE_TIMEOUT_MS);
    let output = executor.run(engine, program, &["--version".to_string()], None, cwd)?;
    if !output.success {
        return Err(Error::FormatterFailed {
            engine: engine.to_string(),
            diagnostic: output.diagnostic(),
        });
    }
    parse_version(&output.stdout).ok_or_else(|| Error::FormatterFailed {
        engine: engine.to_string(),
        diagnostic: format!("unrecognised version output: {}", output.stdout.trim()),
    })
}

/// Extract a semantic version from free-form `--version` output.
pub fn parse_version(text: &str) -> Option<String> {
    VERSION_RE.find(text).map(|m| m.as_str().to_string())
}
