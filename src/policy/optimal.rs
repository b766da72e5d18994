//! Optimal (Belady) replacement policy — offline oracle baseline.

use std::collections::HashMap;

use crate::common::{FrameId, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, Resolved, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, snapshot_residents, Observation, Policy, Tally};

/// Evicts the resident page whose next use lies farthest in the future.
///
/// Pages never referenced again count as infinitely far and go first;
/// ties fall to the lowest frame index. Requires the full trace up front,
/// so this is an offline lower bound on achievable faults, never an
/// online policy. R/M bits are maintained for bookkeeping only and do not
/// influence victim choice.
#[derive(Debug, Default)]
pub struct Optimal;

impl Optimal {
    /// Create the oracle policy.
    pub fn new() -> Self {
        Self
    }

    /// Position of the next reference to `page`, or `None` if it never
    /// occurs again.
    fn next_use(page: PageId, future: &[Resolved]) -> Option<usize> {
        future.iter().position(|step| step.page == page)
    }

    /// True when distance `a` is strictly farther than `b`
    /// (`None` = never again = infinitely far).
    fn farther(a: Option<usize>, b: Option<usize>) -> bool {
        match (a, b) {
            (None, None) => false,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a > b,
        }
    }

    fn execute(
        &self,
        trace: &[Reference],
        frame_count: usize,
        mut observation: Observation<'_>,
    ) -> Result<RunResult> {
        check_frame_count(frame_count)?;
        let steps = resolve(trace)?;

        let mut table: HashMap<PageId, ResidentPage> = HashMap::new();
        // Slot i holds the page resident in frame i.
        let mut frames: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut tally = Tally::new();

        for (position, step) in steps.iter().enumerate() {
            let mut evicted = None;
            let hit = table.contains_key(&step.page);

            if hit {
                tally.hit();
                if let Some(pte) = table.get_mut(&step.page) {
                    pte.touch(step.write, step.at);
                }
            } else {
                tally.fault();

                let slot = if frames.len() < frame_count {
                    frames.push(step.page);
                    frames.len() - 1
                } else {
                    let future = &steps[position + 1..];
                    let mut victim_slot = 0usize;
                    let mut victim_distance = Self::next_use(frames[0], future);

                    for slot in 1..frames.len() {
                        let distance = Self::next_use(frames[slot], future);
                        if Self::farther(distance, victim_distance) {
                            victim_slot = slot;
                            victim_distance = distance;
                        }
                    }

                    let victim_page = frames[victim_slot];
                    table.remove(&victim_page);
                    tally.eviction();
                    evicted = Some(victim_page);
                    frames[victim_slot] = step.page;
                    victim_slot
                };

                table.insert(
                    step.page,
                    ResidentPage::load(step.page, FrameId::new(slot), step.write, step.at),
                );
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: snapshot_residents(frame_count, table.values(), |_| None),
                decision: vec![("policy", "optimal".to_string())],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }
}

impl Policy for Optimal {
    fn name(&self) -> &str {
        "Optimal"
    }

    fn run(&self, trace: &[Reference], frame_count: usize) -> Result<RunResult> {
        self.execute(trace, frame_count, Observation::off())
    }

    fn run_observed(
        &self,
        trace: &[Reference],
        frame_count: usize,
        observer: &mut dyn StepObserver,
    ) -> Result<RunResult> {
        self.execute(trace, frame_count, Observation::on(observer))
    }
}
