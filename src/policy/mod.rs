//! Eviction policy implementations.
//!
//! Nine policies, one per module, all behind the [`Policy`] trait:
//!
//! - [`Fifo`] - strict arrival order
//! - [`Clock`] - second chance via a circular scan
//! - [`Nru`] - (R, M) classes with periodic reference-bit reset
//! - [`Aging`] - fixed-width shift-register counters
//! - [`Lru`] - exact recency
//! - [`Nfu`] - monotone use counters
//! - [`WorkingSet`] - window-based working-set eviction
//! - [`WsClock`] - clock scan combined with a working-set age test
//! - [`Optimal`] - Belady's offline oracle (baseline only)
//!
//! Every policy is a plain configuration struct; all mutable run state
//! (resident tables, scan hands, counters) lives on the stack of a single
//! `run` call, so separate runs are fully independent.

mod aging;
mod clock;
mod fifo;
mod lru;
mod nfu;
mod nru;
mod optimal;
mod working_set;
mod wsclock;

pub use aging::Aging;
pub use clock::Clock;
pub use fifo::Fifo;
pub use lru::Lru;
pub use nfu::Nfu;
pub use nru::Nru;
pub use optimal::Optimal;
pub use working_set::WorkingSet;
pub use wsclock::WsClock;

use std::collections::VecDeque;

use crate::common::{Error, FrameId, Result};
use crate::model::{Reference, ResidentPage, RunResult};
use crate::observe::{FrameSnapshot, StepEvent, StepObserver};

/// One eviction state machine.
///
/// Contract:
/// - `run` fails with [`Error::InvalidConfiguration`] before touching the
///   trace if `frame_count == 0` or a policy parameter is out of range,
///   and with [`Error::MalformedTrace`] if normalization rejects the
///   trace.
/// - References are processed strictly in input order; each is classified
///   as exactly one of hit or fault, and a fault with no free frame
///   performs exactly one eviction before installing the new page.
/// - No mutable state survives between `run` calls: policies take `&self`
///   and keep every table and pointer local to the call.
/// - `run_observed` behaves identically and additionally delivers one
///   [`StepEvent`] per reference to `observer`; observation never changes
///   the outcome.
pub trait Policy {
    /// Human-readable policy name, echoed into results.
    fn name(&self) -> &str;

    /// Replay `trace` against `frame_count` frames.
    fn run(&self, trace: &[Reference], frame_count: usize) -> Result<RunResult>;

    /// Replay `trace`, delivering one step event per reference.
    fn run_observed(
        &self,
        trace: &[Reference],
        frame_count: usize,
        observer: &mut dyn StepObserver,
    ) -> Result<RunResult>;
}

/// All nine policies with default parameters, Optimal last.
///
/// Convenient for sweeps that compare every policy against the oracle.
pub fn default_policies() -> Vec<Box<dyn Policy>> {
    vec![
        Box::new(Fifo::new()),
        Box::new(Clock::new()),
        Box::new(Nru::new()),
        Box::new(Aging::default()),
        Box::new(Lru::new()),
        Box::new(Nfu::new()),
        Box::new(WorkingSet::default()),
        Box::new(WsClock::default()),
        Box::new(Optimal::new()),
    ]
}

/// Reject zero-frame runs before any reference is processed.
pub(crate) fn check_frame_count(frame_count: usize) -> Result<()> {
    if frame_count == 0 {
        return Err(Error::InvalidConfiguration(
            "frame_count must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Free-frame pool, handed out in ascending index order.
pub(crate) fn free_frames(frame_count: usize) -> VecDeque<FrameId> {
    (0..frame_count).map(FrameId::new).collect()
}

/// Hit/fault/eviction counters for one run.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub hits: usize,
    pub faults: usize,
    pub evictions: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn fault(&mut self) {
        self.faults += 1;
    }

    #[inline]
    pub fn eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn finish(self, policy_name: &str, frame_count: usize, trace_len: usize) -> RunResult {
        debug_assert_eq!(self.hits + self.faults, trace_len);
        debug_assert!(self.evictions <= self.faults);

        RunResult {
            policy_name: policy_name.to_string(),
            frame_count,
            trace_len,
            faults: self.faults,
            hits: self.hits,
            evictions: self.evictions,
        }
    }
}

/// Optional observation sink for one run.
///
/// The unobserved path never constructs events: `emit` takes a closure
/// that only runs when a sink is attached.
pub(crate) struct Observation<'a> {
    sink: Option<&'a mut dyn StepObserver>,
}

impl<'a> Observation<'a> {
    pub fn off() -> Self {
        Self { sink: None }
    }

    pub fn on(sink: &'a mut dyn StepObserver) -> Self {
        Self { sink: Some(sink) }
    }

    #[inline]
    pub fn emit(&mut self, build: impl FnOnce() -> StepEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_step(&build());
        }
    }
}

/// Build a frame-indexed snapshot from the resident pages of a run.
///
/// `detail` supplies the per-frame policy annotation (use `|_| None` when
/// there is nothing to say).
pub(crate) fn snapshot_residents<'a, I, F>(
    frame_count: usize,
    residents: I,
    detail: F,
) -> Vec<FrameSnapshot>
where
    I: IntoIterator<Item = &'a ResidentPage>,
    F: Fn(&ResidentPage) -> Option<String>,
{
    let mut frames: Vec<FrameSnapshot> = (0..frame_count)
        .map(|i| FrameSnapshot::empty(FrameId::new(i)))
        .collect();

    for pte in residents {
        if let Some(frame) = pte.frame {
            if frame.0 < frame_count {
                frames[frame.0] = FrameSnapshot {
                    frame,
                    page: Some(pte.page),
                    referenced: pte.referenced,
                    modified: pte.modified,
                    detail: detail(pte),
                };
            }
        }
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;

    #[test]
    fn test_check_frame_count() {
        assert!(check_frame_count(1).is_ok());
        assert!(matches!(
            check_frame_count(0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_free_frames_ascending() {
        let mut free = free_frames(3);
        assert_eq!(free.pop_front(), Some(FrameId::new(0)));
        assert_eq!(free.pop_front(), Some(FrameId::new(1)));
        assert_eq!(free.pop_front(), Some(FrameId::new(2)));
        assert_eq!(free.pop_front(), None);
    }

    #[test]
    fn test_tally_finish() {
        let mut tally = Tally::new();
        tally.fault();
        tally.fault();
        tally.hit();
        tally.eviction();

        let result = tally.finish("FIFO", 2, 3);
        assert_eq!(result.faults, 2);
        assert_eq!(result.hits, 1);
        assert_eq!(result.evictions, 1);
        assert_eq!(result.frame_count, 2);
    }

    #[test]
    fn test_snapshot_residents_places_pages() {
        let residents = vec![
            ResidentPage::load(PageId::new(9), FrameId::new(1), false, 0),
            ResidentPage::load(PageId::new(4), FrameId::new(0), true, 2),
        ];

        let frames = snapshot_residents(3, residents.iter(), |_| None);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].page, Some(PageId::new(4)));
        assert!(frames[0].modified);
        assert_eq!(frames[1].page, Some(PageId::new(9)));
        assert_eq!(frames[2].page, None);
    }

    #[test]
    fn test_default_policies_has_all_nine() {
        let policies = default_policies();
        assert_eq!(policies.len(), 9);
        assert_eq!(policies.last().unwrap().name(), "Optimal");
    }
}
