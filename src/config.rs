//! Resolved probe configuration.
//!
//! Holds already-resolved scalar values; parsing raw CLI arguments or
//! property files is the caller's concern (see `src/bin/vmprobed.rs`).

/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// Default name of the statistics executable, resolved via `PATH`.
pub const DEFAULT_VMSTAT_PATH: &str = "vmstat";

/// Default invocation options. `-n` prints the header once instead of
/// repeating it periodically, which keeps the line positions stable.
pub const DEFAULT_VMSTAT_OPTS: &str = "-n";

/// Resolved configuration for a vmstat probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Sampling interval in seconds, passed through to the tool.
    pub interval_secs: u64,
    /// Path to the statistics executable.
    pub vmstat_path: String,
    /// Invocation options as a single string, split on whitespace.
    pub vmstat_opts: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            vmstat_path: DEFAULT_VMSTAT_PATH.to_string(),
            vmstat_opts: DEFAULT_VMSTAT_OPTS.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Assembles the full command line: executable, options, interval.
    pub fn command(&self) -> Vec<String> {
        let mut cmd = Vec::with_capacity(4);
        cmd.push(self.vmstat_path.clone());
        cmd.extend(self.vmstat_opts.split_whitespace().map(str::to_string));
        cmd.push(self.interval_secs.to_string());
        cmd
    }
}
