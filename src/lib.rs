//! vmprobe - OS performance counter probes for benchmark runs.
//!
//! This library provides the core functionality shared between:
//! - `vmprobed` - standalone daemon that runs a probe and streams its points
//! - benchmark harnesses that embed probes directly via the [`probe::Probe`] trait
//!
//! A probe launches a long-running statistics tool (`vmstat` by default),
//! parses its periodic textual output into timestamped numeric points, and
//! buffers them until the harness drains via `points()`.

pub mod config;
pub mod launcher;
pub mod probe;
