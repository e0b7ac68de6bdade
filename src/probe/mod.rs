//! Benchmark probes.
//!
//! A probe samples one source of operating-system statistics for the
//! duration of a benchmark run. The harness drives every probe through the
//! same lifecycle:
//!
//! ```text
//! start(config) ──► lines arrive asynchronously ──► points accumulate
//!                                                        │
//! points() ◄── drained periodically by the harness ◄─────┘
//! stop()
//! ```
//!
//! Probes are pluggable: the harness only sees the [`Probe`] trait plus the
//! label contract of [`Probe::meta_info`], which must stay in lockstep with
//! the order of [`ProbePoint::values`].

mod buffer;
pub mod vmstat;

pub use buffer::PointBuffer;
pub use vmstat::VmStatProbe;

use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;
use crate::launcher::StartupError;

/// One timestamped sample produced by a probe.
///
/// `values` has a fixed length for every point produced by one probe
/// instance, equal to `meta_info().len() - 1` (the first label describes
/// the timestamp itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePoint {
    /// Milliseconds since the Unix epoch, assigned when the line parsed.
    pub time_ms: i64,
    /// Ordered numeric fields, in the order advertised by `meta_info()`.
    pub values: Vec<u64>,
}

impl ProbePoint {
    /// Creates a point stamped with the current wall-clock time.
    pub fn now(values: Vec<u64>) -> Self {
        Self {
            time_ms: chrono::Utc::now().timestamp_millis(),
            values,
        }
    }
}

/// A pluggable metrics probe.
pub trait Probe {
    /// Starts collection. Fails only if the underlying line source cannot
    /// be established; per-line problems after startup are logged and
    /// skipped, never propagated.
    fn start(&mut self, cfg: &ProbeConfig) -> Result<(), StartupError>;

    /// Stops collection. Idempotent; safe to call if `start` never ran.
    /// Points appended before the stop remain drainable via `points()`.
    fn stop(&mut self);

    /// Labels for the timestamp and every value field, in point order.
    /// A static contract, never recomputed from live data.
    fn meta_info(&self) -> &'static [&'static str];

    /// Drains all points collected since the previous call.
    fn points(&self) -> Vec<ProbePoint>;
}
