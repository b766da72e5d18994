//! Trace synthesis and identity.
//!
//! The engine only requires an already-materialized `Vec<Reference>`; the
//! generators here are one convenient, fully deterministic source. Both
//! take an explicit seed and produce the same trace for the same
//! parameters on every platform.

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{Error, PageId, Result};
use crate::model::Reference;

/// Uniform-random trace: every reference picks a page uniformly from
/// `[0, num_pages)` and is a write with probability `write_prob`.
#[derive(Debug, Clone)]
pub struct RandomTrace {
    /// Size of the page universe.
    pub num_pages: u64,

    /// Number of references to generate.
    pub trace_length: usize,

    /// Probability in `[0, 1]` that a reference is a write.
    pub write_prob: f64,

    /// RNG seed; equal seeds give equal traces.
    pub seed: u64,
}

impl RandomTrace {
    /// Generate the trace.
    pub fn generate(&self) -> Result<Vec<Reference>> {
        check_universe(self.num_pages, self.write_prob)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let refs = (0..self.trace_length)
            .map(|_| {
                let page = PageId::new(rng.gen_range(0..self.num_pages));
                if rng.gen_bool(self.write_prob) {
                    Reference::write(page)
                } else {
                    Reference::read(page)
                }
            })
            .collect();

        trace!(
            "random trace: pages={} len={} seed={}",
            self.num_pages,
            self.trace_length,
            self.seed
        );
        Ok(refs)
    }
}

/// Locality-biased trace: execution proceeds in phases, each with its own
/// working set of contiguous pages. Within a phase, references stay in
/// the working set with probability `locality_prob` and stray uniformly
/// otherwise.
#[derive(Debug, Clone)]
pub struct LocalityTrace {
    /// Size of the page universe.
    pub num_pages: u64,

    /// Number of references to generate.
    pub trace_length: usize,

    /// Probability in `[0, 1]` that a reference is a write.
    pub write_prob: f64,

    /// Probability in `[0, 1]` of staying inside the current working set.
    pub locality_prob: f64,

    /// References per phase; a new working set is drawn at each boundary.
    pub phase_length: usize,

    /// Pages per working set.
    pub working_set_size: u64,

    /// RNG seed; equal seeds give equal traces.
    pub seed: u64,
}

impl LocalityTrace {
    /// Generate the trace.
    pub fn generate(&self) -> Result<Vec<Reference>> {
        check_universe(self.num_pages, self.write_prob)?;
        if !(0.0..=1.0).contains(&self.locality_prob) {
            return Err(Error::InvalidConfiguration(format!(
                "locality_prob must be within [0, 1], got {}",
                self.locality_prob
            )));
        }
        if self.phase_length == 0 {
            return Err(Error::InvalidConfiguration(
                "phase_length must be > 0".to_string(),
            ));
        }
        if self.working_set_size == 0 || self.working_set_size > self.num_pages {
            return Err(Error::InvalidConfiguration(format!(
                "working_set_size must be within 1..={}, got {}",
                self.num_pages, self.working_set_size
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut refs = Vec::with_capacity(self.trace_length);
        // First page of the current working set; the set covers
        // [base, base + working_set_size).
        let mut base = 0u64;

        for position in 0..self.trace_length {
            if position % self.phase_length == 0 {
                base = rng.gen_range(0..=self.num_pages - self.working_set_size);
            }

            let page = if rng.gen_bool(self.locality_prob) {
                PageId::new(base + rng.gen_range(0..self.working_set_size))
            } else {
                PageId::new(rng.gen_range(0..self.num_pages))
            };

            refs.push(if rng.gen_bool(self.write_prob) {
                Reference::write(page)
            } else {
                Reference::read(page)
            });
        }

        trace!(
            "locality trace: pages={} len={} phase={} ws={} seed={}",
            self.num_pages,
            self.trace_length,
            self.phase_length,
            self.working_set_size,
            self.seed
        );
        Ok(refs)
    }
}

fn check_universe(num_pages: u64, write_prob: f64) -> Result<()> {
    if num_pages == 0 {
        return Err(Error::InvalidConfiguration(
            "num_pages must be > 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&write_prob) {
        return Err(Error::InvalidConfiguration(format!(
            "write_prob must be within [0, 1], got {}",
            write_prob
        )));
    }
    Ok(())
}

/// Frame-count sweep covering the interesting range for `num_pages`
/// distinct pages: an eighth, a quarter, a half, three quarters, and all
/// of them, deduplicated and never below 1. The fault curve's knee always
/// falls inside this range.
pub fn default_frame_sweep(num_pages: u64) -> Vec<usize> {
    let mut sweep: Vec<usize> = [
        num_pages / 8,
        num_pages / 4,
        num_pages / 2,
        num_pages * 3 / 4,
        num_pages,
    ]
    .iter()
    .map(|&n| (n as usize).max(1))
    .collect();
    sweep.dedup();
    sweep
}

/// CRC32 fingerprint of a trace's logical content.
///
/// Covers page ids, write flags, and explicit timestamps, so two traces
/// with the same fingerprint replay identically under every policy. Used
/// by the reporter to tag output rows with the trace they came from.
pub fn fingerprint(trace: &[Reference]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for reference in trace {
        hasher.update(&reference.page.0.to_le_bytes());
        hasher.update(&[reference.write as u8]);
        match reference.at {
            Some(at) => {
                hasher.update(&[1]);
                hasher.update(&at.to_le_bytes());
            }
            None => hasher.update(&[0]),
        }
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_trace_is_deterministic() {
        let spec = RandomTrace {
            num_pages: 20,
            trace_length: 200,
            write_prob: 0.25,
            seed: 42,
        };
        let a = spec.generate().unwrap();
        let b = spec.generate().unwrap();
        assert_eq!(a, b);
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(a.len(), 200);
    }

    #[test]
    fn test_random_trace_page_range() {
        let spec = RandomTrace {
            num_pages: 5,
            trace_length: 500,
            write_prob: 0.0,
            seed: 7,
        };
        let refs = spec.generate().unwrap();
        assert!(refs.iter().all(|r| r.page.0 < 5));
        assert!(refs.iter().all(|r| !r.write));
    }

    #[test]
    fn test_random_trace_rejects_bad_parameters() {
        let zero_pages = RandomTrace {
            num_pages: 0,
            trace_length: 10,
            write_prob: 0.0,
            seed: 0,
        };
        assert!(zero_pages.generate().is_err());

        let bad_prob = RandomTrace {
            num_pages: 5,
            trace_length: 10,
            write_prob: 1.5,
            seed: 0,
        };
        assert!(bad_prob.generate().is_err());
    }

    #[test]
    fn test_locality_trace_stays_in_universe() {
        let spec = LocalityTrace {
            num_pages: 60,
            trace_length: 800,
            write_prob: 0.25,
            locality_prob: 0.85,
            phase_length: 80,
            working_set_size: 8,
            seed: 42,
        };
        let refs = spec.generate().unwrap();
        assert_eq!(refs.len(), 800);
        assert!(refs.iter().all(|r| r.page.0 < 60));
        assert_eq!(refs, spec.generate().unwrap());
    }

    #[test]
    fn test_locality_trace_rejects_oversized_working_set() {
        let spec = LocalityTrace {
            num_pages: 4,
            trace_length: 10,
            write_prob: 0.0,
            locality_prob: 0.9,
            phase_length: 5,
            working_set_size: 5,
            seed: 0,
        };
        assert!(spec.generate().is_err());
    }

    #[test]
    fn test_default_frame_sweep() {
        assert_eq!(default_frame_sweep(60), vec![7, 15, 30, 45, 60]);
        // Tiny universes collapse to a single frame count.
        assert_eq!(default_frame_sweep(1), vec![1]);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = vec![Reference::read(PageId::new(1))];
        let b = vec![Reference::write(PageId::new(1))];
        let c = vec![Reference::read(PageId::new(1)).at(3)];
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&c));
        assert_eq!(fingerprint(&a), fingerprint(&[Reference::read(PageId::new(1))]));
    }
}
