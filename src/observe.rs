//! Step observation: an injected sink receiving one event per reference.
//!
//! Observation is purely diagnostic. Policies produce identical counts with
//! and without an observer attached; the unobserved path never builds
//! snapshots. Sinks provided here:
//!
//! - [`StepRecorder`] - collects events in memory for one run
//! - [`SharedRecorder`] - thread-safe collector for callers that fan
//!   independent runs out across threads

use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{FrameId, PageId};

/// Policy-specific key/value annotations attached to a step.
pub type DecisionMeta = Vec<(&'static str, String)>;

/// State of one frame after a step was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// The frame index.
    pub frame: FrameId,

    /// Resident page, or `None` for an empty frame.
    pub page: Option<PageId>,

    /// Reference bit of the resident page (false when empty).
    pub referenced: bool,

    /// Modified bit of the resident page (false when empty).
    pub modified: bool,

    /// Optional policy annotation (aging counter, last-used time, ...).
    pub detail: Option<String>,
}

impl FrameSnapshot {
    /// Snapshot of an empty frame.
    pub fn empty(frame: FrameId) -> Self {
        Self {
            frame,
            page: None,
            referenced: false,
            modified: false,
            detail: None,
        }
    }
}

/// Everything that happened while processing one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    /// Resolved time of the reference.
    pub time: u64,

    /// The page that was requested.
    pub page: PageId,

    /// Whether the access was a write.
    pub write: bool,

    /// True for a hit, false for a fault.
    pub hit: bool,

    /// Page evicted during this step, if any.
    pub evicted: Option<PageId>,

    /// Per-frame state after the step, ordered by frame index.
    pub frames: Vec<FrameSnapshot>,

    /// Policy decision annotations (hand position, victim class, ...).
    pub decision: DecisionMeta,
}

/// Sink for per-reference step events.
///
/// Implementations must not influence the run: they only read the event.
pub trait StepObserver {
    /// Called exactly once per reference, after the step is processed.
    fn on_step(&mut self, event: &StepEvent);
}

/// Records every step event of a run in memory.
///
/// # Example
/// ```
/// use pagesim::{Fifo, PageId, Policy, Reference, StepRecorder};
///
/// let trace: Vec<Reference> = [1, 2, 1].iter()
///     .map(|&p| Reference::read(PageId::new(p)))
///     .collect();
///
/// let mut recorder = StepRecorder::new();
/// let result = Fifo::new().run_observed(&trace, 2, &mut recorder).unwrap();
///
/// assert_eq!(recorder.steps().len(), result.trace_len);
/// assert!(recorder.steps()[2].hit);
/// ```
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Vec<StepEvent>,
}

impl StepRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, in step order.
    pub fn steps(&self) -> &[StepEvent] {
        &self.steps
    }

    /// Consume the recorder, returning its events.
    pub fn into_steps(self) -> Vec<StepEvent> {
        self.steps
    }
}

impl StepObserver for StepRecorder {
    fn on_step(&mut self, event: &StepEvent) {
        self.steps.push(event.clone());
    }
}

/// Thread-safe step collector.
///
/// Runs are independent (each owns its state), so callers may execute
/// `(policy, frame_count)` pairs on separate threads; cloning one
/// `SharedRecorder` into each thread funnels all events into one buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedRecorder {
    steps: Arc<Mutex<Vec<StepEvent>>>,
}

impl SharedRecorder {
    /// Create an empty shared recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out everything recorded so far.
    pub fn snapshot(&self) -> Vec<StepEvent> {
        self.steps.lock().clone()
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.steps.lock().len()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.lock().is_empty()
    }
}

impl StepObserver for SharedRecorder {
    fn on_step(&mut self, event: &StepEvent) {
        self.steps.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(time: u64) -> StepEvent {
        StepEvent {
            time,
            page: PageId::new(1),
            write: false,
            hit: false,
            evicted: None,
            frames: vec![FrameSnapshot::empty(FrameId::new(0))],
            decision: vec![("policy", "test".to_string())],
        }
    }

    #[test]
    fn test_recorder_collects_in_order() {
        let mut recorder = StepRecorder::new();
        recorder.on_step(&event(0));
        recorder.on_step(&event(1));

        let steps = recorder.into_steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].time, 1);
    }

    #[test]
    fn test_shared_recorder_across_threads() {
        let recorder = SharedRecorder::new();
        let mut handles = vec![];

        for t in 0..4u64 {
            let mut sink = recorder.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    sink.on_step(&event(t * 100 + i));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 100);
        assert!(!recorder.is_empty());
    }
}
