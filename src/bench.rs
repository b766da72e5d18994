//! Benchmark driver: one policy, many frame counts.

use log::debug;

use crate::common::{Error, Result};
use crate::model::{normalize, BenchmarkResult, Reference};
use crate::policy::Policy;

/// Run `policy` once per entry of `frame_counts`, in order.
///
/// The trace is normalized and validated exactly once; every run replays
/// the same immutable normalized sequence, so runs cannot influence each
/// other. A failing run aborts the remaining frame counts — a partial
/// `BenchmarkResult` is never produced.
///
/// # Errors
/// - [`Error::InvalidConfiguration`] for an empty `frame_counts` list or
///   a bad per-run configuration
/// - [`Error::MalformedTrace`] if normalization rejects the trace
///
/// # Example
/// ```
/// use pagesim::{benchmark, Lru, PageId, Reference};
///
/// let trace: Vec<Reference> = [1, 2, 3, 1, 2, 1].iter()
///     .map(|&p| Reference::read(PageId::new(p)))
///     .collect();
///
/// let result = benchmark(&Lru::new(), &trace, &[1, 2, 3]).unwrap();
/// assert_eq!(result.results.len(), 3);
/// // More frames never hurt LRU.
/// assert!(result.results[2].faults <= result.results[0].faults);
/// ```
pub fn benchmark(
    policy: &dyn Policy,
    trace: &[Reference],
    frame_counts: &[usize],
) -> Result<BenchmarkResult> {
    if frame_counts.is_empty() {
        return Err(Error::InvalidConfiguration(
            "frame count list is empty".to_string(),
        ));
    }

    let normalized = normalize(trace)?;
    let mut results = Vec::with_capacity(frame_counts.len());

    for &frame_count in frame_counts {
        let result = policy.run(&normalized, frame_count)?;
        debug!(
            "{}: frames={} faults={} hits={} evictions={} hit_rate={:.3}",
            policy.name(),
            frame_count,
            result.faults,
            result.hits,
            result.evictions,
            result.hit_rate()
        );
        results.push(result);
    }

    Ok(BenchmarkResult {
        policy_name: policy.name().to_string(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;
    use crate::policy::Fifo;

    fn trace(pages: &[u64]) -> Vec<Reference> {
        pages.iter().map(|&p| Reference::read(PageId::new(p))).collect()
    }

    #[test]
    fn test_benchmark_preserves_sweep_order() {
        let result = benchmark(&Fifo::new(), &trace(&[1, 2, 3, 1]), &[4, 1, 2]).unwrap();
        let swept: Vec<usize> = result.results.iter().map(|r| r.frame_count).collect();
        assert_eq!(swept, [4, 1, 2]);
    }

    #[test]
    fn test_benchmark_rejects_empty_sweep() {
        assert!(matches!(
            benchmark(&Fifo::new(), &trace(&[1]), &[]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_benchmark_aborts_on_first_failure() {
        // The zero frame count in the middle kills the whole sweep.
        assert!(benchmark(&Fifo::new(), &trace(&[1]), &[2, 0, 3]).is_err());
    }

    #[test]
    fn test_benchmark_rejects_malformed_trace() {
        let bad = vec![
            Reference::read(PageId::new(1)).at(5),
            Reference::read(PageId::new(2)).at(1),
        ];
        assert!(matches!(
            benchmark(&Fifo::new(), &bad, &[2]),
            Err(Error::MalformedTrace(_))
        ));
    }
}
