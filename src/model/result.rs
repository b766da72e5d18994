//! Run and benchmark results.

use std::fmt;

/// Metrics from one policy run at one frame count.
///
/// Produced once and never mutated. Invariants:
/// `hits + faults == trace_len` and `evictions <= faults`.
///
/// Hit and fault rates are derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Name of the policy that produced this result.
    pub policy_name: String,

    /// Number of physical frames the run was given.
    pub frame_count: usize,

    /// Number of references replayed.
    pub trace_len: usize,

    /// References to pages that were not resident.
    pub faults: usize,

    /// References to pages that were resident.
    pub hits: usize,

    /// Pages removed to make room for a faulting page.
    pub evictions: usize,
}

impl RunResult {
    /// Fraction of references that hit, 0.0 for an empty trace.
    pub fn hit_rate(&self) -> f64 {
        if self.trace_len == 0 {
            0.0
        } else {
            self.hits as f64 / self.trace_len as f64
        }
    }

    /// Fraction of references that faulted, 0.0 for an empty trace.
    pub fn fault_rate(&self) -> f64 {
        if self.trace_len == 0 {
            0.0
        } else {
            self.faults as f64 / self.trace_len as f64
        }
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{ frames: {}, faults: {}, hits: {}, evictions: {}, hit_rate: {:.2}% }}",
            self.policy_name,
            self.frame_count,
            self.faults,
            self.hits,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}

/// Ordered results of one policy across a frame-count sweep.
///
/// Entry order matches the order of the requested frame counts.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    /// Name of the policy that produced these results.
    pub policy_name: String,

    /// One result per requested frame count, in request order.
    pub results: Vec<RunResult>,
}

impl BenchmarkResult {
    /// Look up the result for a specific frame count, if it was swept.
    pub fn at_frame_count(&self, frame_count: usize) -> Option<&RunResult> {
        self.results.iter().find(|r| r.frame_count == frame_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(faults: usize, hits: usize) -> RunResult {
        RunResult {
            policy_name: "FIFO".to_string(),
            frame_count: 3,
            trace_len: faults + hits,
            faults,
            hits,
            evictions: 0,
        }
    }

    #[test]
    fn test_rates() {
        let r = result(9, 3);
        assert!((r.fault_rate() - 0.75).abs() < f64::EPSILON);
        assert!((r.hit_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rates_empty_trace() {
        let r = result(0, 0);
        assert_eq!(r.hit_rate(), 0.0);
        assert_eq!(r.fault_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let shown = format!("{}", result(9, 3));
        assert!(shown.contains("FIFO"));
        assert!(shown.contains("faults: 9"));
        assert!(shown.contains("25.00%"));
    }

    #[test]
    fn test_at_frame_count() {
        let br = BenchmarkResult {
            policy_name: "FIFO".to_string(),
            results: vec![result(9, 3)],
        };
        assert_eq!(br.at_frame_count(3).unwrap().faults, 9);
        assert!(br.at_frame_count(4).is_none());
    }
}
