//! LRU (Least Recently Used) replacement policy.

use std::collections::HashMap;

use crate::common::{Error, FrameId, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, snapshot_residents, Observation, Policy, Tally};

/// Evicts the page with the smallest `last_used` timestamp.
///
/// Exact recency: every hit refreshes the timestamp, and the victim scan
/// walks resident pages in residency order so equal timestamps fall back
/// to encounter order.
#[derive(Debug, Default)]
pub struct Lru;

impl Lru {
    /// Create an LRU policy.
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
        // Residency order; the victim scan walks this for tie-breaks.
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
            } else {
                tally.fault();

                let frame = if resident.len() < frame_count {
                    FrameId::new(resident.len())
                } else {
                    let mut victim: Option<(usize, u64)> = None;
                    for (position, page) in resident.iter().enumerate() {
                        let pte = table.get(page).ok_or(Error::InternalInvariant(
                            "lru resident page missing from table",
                        ))?;
                        if victim.is_none_or(|(_, best)| pte.last_used < best) {
                            victim = Some((position, pte.last_used));
                        }
                    }
                    let (position, _) = victim.ok_or(Error::InternalInvariant(
                        "lru victim scan over empty resident set",
                    ))?;

                    let victim_page = resident.remove(position);
                    let victim_pte = table.remove(&victim_page).ok_or(
                        Error::InternalInvariant("lru victim missing from table"),
                    )?;
                    tally.eviction();
                    evicted = Some(victim_page);
                    victim_pte.frame.ok_or(Error::InternalInvariant(
                        "lru victim held no frame",
                    ))?
                };

                table.insert(
                    step.page,
                    ResidentPage::load(step.page, frame, step.write, step.at),
                );
                resident.push(step.page);
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: snapshot_residents(frame_count, table.values(), |pte| {
                    Some(format!("last_used={}", pte.last_used))
                }),
                decision: vec![("policy", "lru".to_string())],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }
}

impl Policy for Lru {
    fn name(&self) -> &str {
        "LRU"
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
    fn test_lru_evicts_least_recent() {
        // Hit on 1 makes 2 the least recent; the fault on 4 must evict 2.
        let result = Lru::new().run(&trace(&[1, 2, 3, 1, 4, 2]), 3).unwrap();
        // 1 F, 2 F, 3 F, 1 H, 4 F (evict 2), 2 F (evict 3)
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 1);
        assert_eq!(result.evictions, 2);
    }

    #[test]
    fn test_lru_textbook_reference_string() {
        let result = Lru::new()
            .run(&trace(&[1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5]), 3)
            .unwrap();
        // Classic result for this string under LRU with 3 frames.
        assert_eq!(result.faults, 10);
        assert_eq!(result.hits, 2);
    }
}
