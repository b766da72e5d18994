//! Aging replacement policy (shift-register approximation of LRU).

use std::collections::HashMap;

use crate::common::{config, Error, FrameId, PageId, Result};
use crate::model::{resolve, Reference, RunResult};
use crate::observe::{FrameSnapshot, StepEvent, StepObserver};

use super::{check_frame_count, Observation, Policy, Tally};

/// Per-frame slot state. Aging tracks frames directly rather than going
/// through a resident-page map: the counters belong to the frame.
#[derive(Debug, Clone)]
struct Slot {
    page: Option<PageId>,
    counter: u64,
    referenced: bool,
    modified: bool,
    loaded_at: u64,
}

impl Slot {
    fn empty() -> Self {
        Self {
            page: None,
            counter: 0,
            referenced: false,
            modified: false,
            loaded_at: 0,
        }
    }
}

/// Approximates LRU with a fixed-width shift counter per frame.
///
/// Every `refresh_every` references a tick shifts each counter right by
/// one bit and inserts the current reference bit at the top, then clears
/// the bit. Pages referenced in recent ticks accumulate high counter
/// values; the victim is the minimum counter, with ties broken by the
/// oldest `loaded_at`.
///
/// `bits` must be in `2..=64` and `refresh_every` at least 1; anything
/// else is rejected before the trace is touched.
#[derive(Debug)]
pub struct Aging {
    /// Width of the shift counter in bits.
    pub bits: u32,

    /// Number of references between ticks.
    pub refresh_every: u64,
}

impl Default for Aging {
    fn default() -> Self {
        Self {
            bits: config::DEFAULT_AGING_BITS,
            refresh_every: config::DEFAULT_AGING_REFRESH,
        }
    }
}

impl Aging {
    /// Create an Aging policy with explicit counter width and tick period.
    pub fn new(bits: u32, refresh_every: u64) -> Self {
        Self {
            bits,
            refresh_every,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bits < 2 || self.bits > config::MAX_AGING_BITS {
            return Err(Error::InvalidConfiguration(format!(
                "aging bits must be in 2..={}, got {}",
                config::MAX_AGING_BITS,
                self.bits
            )));
        }
        if self.refresh_every == 0 {
            return Err(Error::InvalidConfiguration(
                "refresh_every must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn counter_mask(&self) -> u64 {
        if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Shift every counter right, folding the reference bit into the top.
    fn tick(&self, slots: &mut [Slot]) {
        let top = 1u64 << (self.bits - 1);
        let mask = self.counter_mask();

        for slot in slots.iter_mut() {
            if slot.page.is_none() {
                slot.counter = 0;
                slot.referenced = false;
            } else {
                let r = if slot.referenced { top } else { 0 };
                slot.counter = (r | (slot.counter >> 1)) & mask;
                slot.referenced = false;
            }
        }
    }

    fn execute(
        &self,
        trace: &[Reference],
        frame_count: usize,
        mut observation: Observation<'_>,
    ) -> Result<RunResult> {
        check_frame_count(frame_count)?;
        self.validate()?;
        let steps = resolve(trace)?;

        let mut slots: Vec<Slot> = vec![Slot::empty(); frame_count];
        let mut page_to_slot: HashMap<PageId, usize> = HashMap::new();
        let mut logical_time: u64 = 0;
        let mut tally = Tally::new();

        for step in &steps {
            logical_time += 1;

            let mut evicted = None;
            let hit = page_to_slot.contains_key(&step.page);

            if hit {
                tally.hit();
                if let Some(&index) = page_to_slot.get(&step.page) {
                    slots[index].referenced = true;
                    if step.write {
                        slots[index].modified = true;
                    }
                }
            } else {
                tally.fault();

                let index = match slots.iter().position(|s| s.page.is_none()) {
                    Some(free) => free,
                    None => {
                        let mut victim = 0usize;
                        for index in 1..frame_count {
                            let challenger = (slots[index].counter, slots[index].loaded_at);
                            if challenger < (slots[victim].counter, slots[victim].loaded_at) {
                                victim = index;
                            }
                        }

                        let old = slots[victim].page.ok_or(Error::InternalInvariant(
                            "aging victim slot was empty",
                        ))?;
                        page_to_slot.remove(&old);
                        tally.eviction();
                        evicted = Some(old);
                        victim
                    }
                };

                slots[index] = Slot {
                    page: Some(step.page),
                    counter: 0,
                    referenced: true,
                    modified: step.write,
                    loaded_at: step.at,
                };
                page_to_slot.insert(step.page, index);
            }

            let ticked = logical_time % self.refresh_every == 0;
            if ticked {
                self.tick(&mut slots);
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: slots
                    .iter()
                    .enumerate()
                    .map(|(i, slot)| FrameSnapshot {
                        frame: FrameId::new(i),
                        page: slot.page,
                        referenced: slot.referenced,
                        modified: slot.modified,
                        detail: slot.page.map(|_| format!("counter={:#x}", slot.counter)),
                    })
                    .collect(),
                decision: vec![
                    ("policy", "aging".to_string()),
                    ("tick", ticked.to_string()),
                ],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }
}

impl Policy for Aging {
    fn name(&self) -> &str {
        "Aging"
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
    fn test_aging_rejects_bad_parameters() {
        assert!(matches!(
            Aging::new(1, 1).run(&trace(&[1]), 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Aging::new(65, 1).run(&trace(&[1]), 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Aging::new(8, 0).run(&trace(&[1]), 1),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(Aging::new(2, 1).run(&trace(&[1]), 1).is_ok());
        assert!(Aging::new(64, 1).run(&trace(&[1]), 1).is_ok());
    }

    #[test]
    fn test_aging_recently_used_page_survives() {
        // With a tick after every reference, page 1's counter keeps its
        // top bit fresh while 2 decays to zero; the fault evicts 2.
        let result = Aging::default()
            .run(&trace(&[1, 2, 1, 1, 3, 2]), 2)
            .unwrap();
        // 1 F, 2 F, 1 H, 1 H, 3 F (evict 2), 2 F (evict ...)
        assert_eq!(result.faults, 4);
        assert_eq!(result.hits, 2);
        assert_eq!(result.evictions, 2);
    }

    #[test]
    fn test_aging_tie_breaks_by_oldest_load() {
        // Tick period beyond the trace: every counter stays 0, so ties
        // are broken by the oldest loaded_at, which is arrival order.
        let aging = Aging::new(8, 100);
        let result = aging.run(&trace(&[1, 2, 3, 4, 1]), 3).unwrap();
        // t3 evicts 1 (oldest), so t4 faults on 1 again.
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 0);
    }

    #[test]
    fn test_aging_counter_shift() {
        let aging = Aging::new(8, 1);
        let mut slots = vec![Slot {
            page: Some(PageId::new(1)),
            counter: 0,
            referenced: true,
            modified: false,
            loaded_at: 0,
        }];

        aging.tick(&mut slots);
        assert_eq!(slots[0].counter, 0b1000_0000);
        assert!(!slots[0].referenced);

        // Unreferenced tick halves the counter.
        aging.tick(&mut slots);
        assert_eq!(slots[0].counter, 0b0100_0000);

        // Referenced tick sets the top bit again.
        slots[0].referenced = true;
        aging.tick(&mut slots);
        assert_eq!(slots[0].counter, 0b1010_0000);
    }
}
