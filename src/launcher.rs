//! Launches an external statistics tool and streams its stdout line by line.
//!
//! The launcher is the probe's "line source": it spawns the child process
//! with a piped stdout, reads lines on a dedicated thread, and hands each
//! one to a caller-supplied handler in arrival order. Collection problems
//! after a successful spawn (stream errors, early exit of the tool) end the
//! stream quietly; only the spawn itself can fail.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

/// Error establishing the external line source.
#[derive(Debug)]
pub enum StartupError {
    /// The command line was empty.
    EmptyCommand,
    /// The child process could not be spawned.
    Spawn {
        command: String,
        source: io::Error,
    },
    /// The reader thread could not be created.
    ReaderThread(io::Error),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::EmptyCommand => write!(f, "empty command line"),
            StartupError::Spawn { command, source } => {
                write!(f, "failed to spawn '{}': {}", command, source)
            }
            StartupError::ReaderThread(e) => write!(f, "failed to start reader thread: {}", e),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::EmptyCommand => None,
            StartupError::Spawn { source, .. } => Some(source),
            StartupError::ReaderThread(e) => Some(e),
        }
    }
}

/// A running external process whose stdout is delivered line by line.
#[derive(Debug)]
pub struct ProcessLauncher {
    child: Arc<Mutex<Child>>,
    reader: Option<JoinHandle<()>>,
}

impl ProcessLauncher {
    /// Spawns `command` (program followed by its arguments) with the given
    /// extra environment and delivers every stdout line to `on_line`, in
    /// order, on a dedicated reader thread.
    pub fn exec<F>(
        command: &[String],
        envs: &HashMap<String, String>,
        mut on_line: F,
    ) -> Result<Self, StartupError>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let (program, args) = command.split_first().ok_or(StartupError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .envs(envs)
            .stdout(Stdio::piped())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| StartupError::Spawn {
                command: command.join(" "),
                source,
            })?;

        let pid = child.id();
        debug!("Spawned '{}' with pid {}", command.join(" "), pid);

        // Piped stdout is always present after a successful spawn.
        let stdout = child.stdout.take().ok_or_else(|| StartupError::Spawn {
            command: command.join(" "),
            source: io::Error::other("no stdout pipe"),
        })?;

        let reader = std::thread::Builder::new()
            .name("probe-reader".to_string())
            .spawn(move || {
                let lines = BufReader::new(stdout).lines();
                for line in lines {
                    match line {
                        Ok(line) => on_line(&line),
                        Err(e) => {
                            debug!("Output stream of pid {} failed: {}", pid, e);
                            break;
                        }
                    }
                }
                debug!("Output stream of pid {} closed", pid);
            })
            .map_err(StartupError::ReaderThread)?;

        Ok(Self {
            child: Arc::new(Mutex::new(child)),
            reader: Some(reader),
        })
    }

    /// Process id of the child.
    pub fn pid(&self) -> u32 {
        self.child.lock().expect("poisoned").id()
    }

    /// Terminates the child and joins the reader thread.
    ///
    /// Idempotent: later calls are no-ops. Lines already in flight when the
    /// shutdown starts are still delivered before the reader thread exits.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.reader.take() else {
            return;
        };

        {
            let mut child = self.child.lock().expect("poisoned");
            if let Err(e) = child.kill() {
                debug!("Failed to kill pid {}: {}", child.id(), e);
            }
            if let Err(e) = child.wait() {
                debug!("Failed to reap pid {}: {}", child.id(), e);
            }
        }

        if handle.join().is_err() {
            warn!("Line handler panicked");
        }
    }
}

impl Drop for ProcessLauncher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
