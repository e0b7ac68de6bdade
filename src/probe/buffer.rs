//! Lock-guarded point buffer with drain-on-read semantics.

use std::mem;
use std::sync::Mutex;

use super::ProbePoint;

/// Accumulates points between periodic drains.
///
/// One writer (the line-processing path) appends while one reader (the
/// harness) drains; both sides share a single mutex, so a drain never
/// observes a torn append. `drain` swaps the live vector out instead of
/// copying it, keeping the critical section short.
pub struct PointBuffer {
    points: Mutex<Vec<ProbePoint>>,
}

impl PointBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            points: Mutex::new(Vec::new()),
        }
    }

    /// Appends one point to the live collection.
    pub fn append(&self, point: ProbePoint) {
        self.points.lock().expect("poisoned").push(point);
    }

    /// Returns everything accumulated since the previous drain (or since
    /// creation) and resets the live collection to empty.
    pub fn drain(&self) -> Vec<ProbePoint> {
        mem::take(&mut *self.points.lock().expect("poisoned"))
    }

    /// Number of points currently buffered.
    pub fn len(&self) -> usize {
        self.points.lock().expect("poisoned").len()
    }

    /// Whether the buffer is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn point(ms: i64) -> ProbePoint {
        ProbePoint {
            time_ms: ms,
            values: vec![ms as u64],
        }
    }

    #[test]
    fn test_drain_returns_appended_points_in_order() {
        let buf = PointBuffer::new();
        buf.append(point(1));
        buf.append(point(2));
        buf.append(point(3));

        let drained = buf.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(
            drained.iter().map(|p| p.time_ms).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_drain_of_empty_buffer_is_empty() {
        let buf = PointBuffer::new();
        assert!(buf.drain().is_empty());

        buf.append(point(1));
        assert_eq!(buf.drain().len(), 1);
        // Second drain with no intervening append yields nothing.
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn test_append_after_drain_starts_fresh() {
        let buf = PointBuffer::new();
        buf.append(point(1));
        buf.drain();
        buf.append(point(2));

        let drained = buf.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].time_ms, 2);
    }

    #[test]
    fn test_concurrent_appends_and_drains_lose_nothing() {
        const TOTAL: usize = 10_000;

        let buf = Arc::new(PointBuffer::new());

        let writer = {
            let buf = Arc::clone(&buf);
            std::thread::spawn(move || {
                for i in 0..TOTAL {
                    buf.append(point(i as i64));
                }
            })
        };

        let mut seen: Vec<i64> = Vec::new();
        while seen.len() < TOTAL {
            for p in buf.drain() {
                seen.push(p.time_ms);
            }
        }
        writer.join().unwrap();

        // Every point appears exactly once, order preserved across batches.
        assert_eq!(seen, (0..TOTAL as i64).collect::<Vec<_>>());
    }
}
