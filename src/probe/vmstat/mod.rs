//! Probe for the Linux `vmstat` tool.
//!
//! Runs `vmstat <opts> <interval>` for the duration of a benchmark and
//! turns each reporting line into one point of 16 counters (run queue,
//! blocked processes, memory, swap, block IO, interrupts, context switches
//! and CPU percentages). Malformed lines are logged and skipped; a single
//! bad line never interrupts a run.

pub mod parser;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::ProbeConfig;
use crate::launcher::{ProcessLauncher, StartupError};
use crate::probe::{PointBuffer, Probe, ProbePoint};

use parser::{LineClassifier, LineOutcome};

/// Labels for the timestamp and the 16 value fields, in point order.
/// Must stay in lockstep with the fields extracted by the classifier.
pub const META_INFO: [&str; 17] = [
    "Time, ms",
    "procs r",
    "procs b",
    "memory swpd",
    "memory free",
    "memory buff",
    "memory cache",
    "swap si",
    "swap so",
    "io bi",
    "io bo",
    "system in",
    "system cs",
    "cpu us",
    "cpu sy",
    "cpu id",
    "cpu wa",
];

/// Probe that gathers statistics reported by the `vmstat` command.
pub struct VmStatProbe {
    buffer: Arc<PointBuffer>,
    launcher: Option<ProcessLauncher>,
}

impl VmStatProbe {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(PointBuffer::new()),
            launcher: None,
        }
    }
}

impl Default for VmStatProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for VmStatProbe {
    fn start(&mut self, cfg: &ProbeConfig) -> Result<(), StartupError> {
        // Restart semantics: an earlier run is shut down first.
        self.stop();

        let command = cfg.command();
        let buffer = Arc::clone(&self.buffer);
        let mut classifier = LineClassifier::new();

        let launcher = ProcessLauncher::exec(&command, &HashMap::new(), move |line| {
            process_line(&mut classifier, &buffer, line);
        })?;

        info!("VmStatProbe is started (pid {})", launcher.pid());
        self.launcher = Some(launcher);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut launcher) = self.launcher.take() {
            launcher.shutdown();
            info!("VmStatProbe is stopped");
        }
    }

    fn meta_info(&self) -> &'static [&'static str] {
        &META_INFO
    }

    fn points(&self) -> Vec<ProbePoint> {
        self.buffer.drain()
    }
}

impl Drop for VmStatProbe {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Maps one classified line to its diagnostic and, for data rows, appends
/// the point. Runs on the launcher's reader thread.
fn process_line(classifier: &mut LineClassifier, buffer: &PointBuffer, line: &str) {
    match classifier.classify(line) {
        LineOutcome::Banner | LineOutcome::Header => {}
        LineOutcome::Point(pnt) => buffer.append(pnt),
        LineOutcome::BannerMismatch => {
            warn!("vmstat returned unexpected first line: {}", line);
        }
        LineOutcome::HeaderMismatch => {
            error!(
                "Header line does not match expected header [exp={}, act={}]",
                classifier.expected_header(),
                line
            );
        }
        LineOutcome::RowMismatch => {
            error!("Cannot parse vmstat line: {}", line);
        }
    }
}
