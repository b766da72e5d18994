//! Second-Chance (Clock) replacement policy.

use std::collections::HashMap;

use crate::common::{Error, FrameId, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, snapshot_residents, Observation, Policy, Tally};

/// Second chance over a circular frame list.
///
/// Resident pages form a ring with a hand pointer. A hit sets the page's
/// reference bit, re-arming it against the next scan. On a fault with no
/// free frame the hand scans forward: pages with R=1 get the bit cleared
/// and are passed over; the first page found with R=0 is the victim. The
/// hand always advances past the victim.
///
/// The hand is local to one `run`, so concurrent runs never share scan
/// position.
#[derive(Debug)]
pub struct Clock {
    // Test-only knob for the FIFO-degeneracy check; hits always re-arm
    // in production builds.
    #[cfg(test)]
    rearm_on_hit: bool,
}

impl Clock {
    /// Create a Clock policy.
    pub fn new() -> Self {
        Self {
            #[cfg(test)]
            rearm_on_hit: true,
        }
    }

    #[cfg(test)]
    fn without_rearm() -> Self {
        Self {
            rearm_on_hit: false,
        }
    }

    #[cfg(test)]
    fn hit_sets_reference(&self) -> bool {
        self.rearm_on_hit
    }

    #[cfg(not(test))]
    fn hit_sets_reference(&self) -> bool {
        true
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
        // Ring slot i holds the page resident in frame i.
        let mut ring: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut hand: usize = 0;
        let mut tally = Tally::new();

        for step in &steps {
            let mut evicted = None;
            let hit = table.contains_key(&step.page);

            if hit {
                tally.hit();
                if let Some(pte) = table.get_mut(&step.page) {
                    if self.hit_sets_reference() {
                        pte.referenced = true;
                    }
                    if step.write {
                        pte.modified = true;
                    }
                    pte.last_used = step.at;
                }
            } else {
                tally.fault();

                if ring.len() < frame_count {
                    let frame = FrameId::new(ring.len());
                    ring.push(step.page);
                    table.insert(
                        step.page,
                        ResidentPage::load(step.page, frame, step.write, step.at),
                    );
                } else {
                    loop {
                        let candidate = ring[hand];
                        let pte = table.get_mut(&candidate).ok_or(Error::InternalInvariant(
                            "clock ring entry missing from page table",
                        ))?;

                        if pte.referenced {
                            pte.referenced = false;
                            hand = (hand + 1) % frame_count;
                            continue;
                        }

                        let frame = pte.frame.ok_or(Error::InternalInvariant(
                            "clock victim held no frame",
                        ))?;
                        table.remove(&candidate);
                        tally.eviction();
                        evicted = Some(candidate);

                        ring[hand] = step.page;
                        table.insert(
                            step.page,
                            ResidentPage::load(step.page, frame, step.write, step.at),
                        );
                        hand = (hand + 1) % frame_count;
                        break;
                    }
                }
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: snapshot_residents(frame_count, table.values(), |_| None),
                decision: vec![
                    ("policy", "clock".to_string()),
                    ("hand", hand.to_string()),
                    ("resident", ring.len().to_string()),
                ],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Clock {
    fn name(&self) -> &str {
        "Clock"
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
    use super::super::Fifo;
    use super::*;

    fn trace(pages: &[u64]) -> Vec<Reference> {
        pages.iter().map(|&p| Reference::read(PageId::new(p))).collect()
    }

    #[test]
    fn test_clock_scan_clears_bits_before_evicting() {
        let result = Clock::new().run(&trace(&[1, 2, 3, 1, 4, 1]), 3).unwrap();
        // 1 F, 2 F, 3 F, 1 H, 4 F (scan clears R of 1,2,3, wraps, evicts
        // 1), 1 F (page 2 now has R=0, evicted)
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 1);
        assert_eq!(result.evictions, 2);
    }

    #[test]
    fn test_clock_victim_is_first_unreferenced() {
        // Load 1,2,3. Fault on 4: scan clears R of 1,2,3, wraps, evicts 1.
        // Fault on 5: hand at 1, page 2 has R=0 now, so 2 goes next.
        let result = Clock::new().run(&trace(&[1, 2, 3, 4, 5, 2]), 3).unwrap();
        // 1 F, 2 F, 3 F, 4 F (evict 1), 5 F (evict 2), 2 F (evict 3)
        assert_eq!(result.faults, 6);
        assert_eq!(result.evictions, 3);
    }

    #[test]
    fn test_clock_without_rearm_degenerates_to_fifo() {
        // With hits no longer re-arming pages, the circular scan reduces
        // to strict arrival order.
        let reference_string = trace(&[1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5]);

        let clock = Clock::without_rearm()
            .run(&reference_string, 3)
            .unwrap();
        let fifo = Fifo::new().run(&reference_string, 3).unwrap();

        assert_eq!(clock.faults, fifo.faults);
        assert_eq!(clock.hits, fifo.hits);
        assert_eq!(clock.evictions, fifo.evictions);
    }

    #[test]
    fn test_clock_rejects_zero_frames() {
        assert!(matches!(
            Clock::new().run(&trace(&[1]), 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
