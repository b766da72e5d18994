//! NFU (Not Frequently Used) replacement policy.

use std::collections::HashMap;

use crate::common::{Error, FrameId, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, snapshot_residents, Observation, Policy, Tally};

/// Evicts the resident page with the smallest use counter.
///
/// Counters only ever grow while a page stays resident (no decay, unlike
/// [`Aging`](super::Aging)), which gives NFU its textbook weakness: a page
/// hammered long ago outlives pages in the current working set. A page
/// starts at 1 when loaded and loses its counter on eviction.
#[derive(Debug, Default)]
pub struct Nfu;

impl Nfu {
    /// Create an NFU policy.
    pub fn new() -> Self {
        Self
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
        let mut counters: HashMap<PageId, u64> = HashMap::new();
        let mut resident: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut tally = Tally::new();

        for step in &steps {
            let mut evicted = None;
            let hit = table.contains_key(&step.page);

            if hit {
                tally.hit();
                if let Some(pte) = table.get_mut(&step.page) {
                    pte.touch(step.write, step.at);
                }
                *counters.entry(step.page).or_insert(0) += 1;
            } else {
                tally.fault();

                let frame = if resident.len() < frame_count {
                    FrameId::new(resident.len())
                } else {
                    let mut victim: Option<(usize, u64)> = None;
                    for (position, page) in resident.iter().enumerate() {
                        let count = *counters.get(page).ok_or(Error::InternalInvariant(
                            "nfu resident page has no counter",
                        ))?;
                        if victim.is_none_or(|(_, best)| count < best) {
                            victim = Some((position, count));
                        }
                    }
                    let (position, _) = victim.ok_or(Error::InternalInvariant(
                        "nfu victim scan over empty resident set",
                    ))?;

                    let victim_page = resident.remove(position);
                    counters.remove(&victim_page);
                    let victim_pte = table.remove(&victim_page).ok_or(
                        Error::InternalInvariant("nfu victim missing from table"),
                    )?;
                    tally.eviction();
                    evicted = Some(victim_page);
                    victim_pte.frame.ok_or(Error::InternalInvariant(
                        "nfu victim held no frame",
                    ))?
                };

                table.insert(
                    step.page,
                    ResidentPage::load(step.page, frame, step.write, step.at),
                );
                counters.insert(step.page, 1);
                resident.push(step.page);
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: snapshot_residents(frame_count, table.values(), |pte| {
                    counters.get(&pte.page).map(|c| format!("count={}", c))
                }),
                decision: vec![("policy", "nfu".to_string())],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }
}

impl Policy for Nfu {
    fn name(&self) -> &str {
        "NFU"
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

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(pages: &[u64]) -> Vec<Reference> {
        pages.iter().map(|&p| Reference::read(PageId::new(p))).collect()
    }

    #[test]
    fn test_nfu_evicts_least_used() {
        // Page 1 is hit twice, page 2 once; page 3 (count 1) goes first.
        let result = Nfu::new().run(&trace(&[1, 2, 3, 1, 1, 2, 4, 3]), 3).unwrap();
        // 1 F, 2 F, 3 F, 1 H, 1 H, 2 H, 4 F (evict 3), 3 F (evict 4)
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 3);
        assert_eq!(result.evictions, 2);
    }

    #[test]
    fn test_nfu_hot_page_survives_cold_cycling() {
        // 1 builds a big count and keeps its frame while fresh pages
        // (each restarting at count 1) cycle through the other frame.
        let result = Nfu::new().run(&trace(&[1, 1, 1, 2, 3, 1, 4, 2]), 2).unwrap();
        // 1 F, 1 H, 1 H, 2 F, 3 F (evict 2: count 1), 1 H,
        // 4 F (evict 3: count 1), 2 F (evict 4: count 1)
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 3);
        assert_eq!(result.evictions, 3);
    }
}
