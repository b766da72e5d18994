//! WSClock replacement policy (working set over a clock scan).

use std::collections::HashMap;

use crate::common::{config, Error, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, free_frames, snapshot_residents, Observation, Policy, Tally};

/// Clock scan combined with a working-set age test.
///
/// The hand scans the resident ring. A page with R=1 gets the bit cleared
/// and is passed over. For R=0 pages the age `now - last_used` decides:
///
/// - `age > window`, clean: evict immediately.
/// - `age > window`, dirty: clear M (the write-back is considered
///   scheduled) and keep scanning — unless a full cycle has already
///   completed, in which case evict anyway.
/// - `age <= window`: evict only once a full cycle has completed.
///
/// The visited-full-cycle flag bounds the scan to two passes over the
/// resident ring: pass one clears bits and schedules write-backs, pass
/// two is allowed to take anything. A second wrap forces the page under
/// the hand out, so the scan can never loop even when every resident
/// page is dirty and inside its working set.
#[derive(Debug)]
pub struct WsClock {
    /// Time horizon of the working set.
    pub window: u64,
}

impl Default for WsClock {
    fn default() -> Self {
        Self {
            window: config::DEFAULT_WINDOW,
        }
    }
}

impl WsClock {
    /// Create a WSClock policy with the given window.
    pub fn new(window: u64) -> Self {
        Self { window }
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
        // Ring of resident pages; the hand survives across faults within
        // one run and resets with it.
        let mut ring: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut hand: usize = 0;
        let mut free = free_frames(frame_count);
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

                if let Some(frame) = free.pop_front() {
                    table.insert(
                        step.page,
                        ResidentPage::load(step.page, frame, step.write, step.at),
                    );
                    ring.push(step.page);
                } else {
                    let victim_index = self.find_victim(&mut table, &ring, hand, step.at)?;
                    let victim_page = ring[victim_index];
                    let victim_pte = table.remove(&victim_page).ok_or(
                        Error::InternalInvariant("wsclock victim missing from table"),
                    )?;
                    let frame = victim_pte.frame.ok_or(Error::InternalInvariant(
                        "wsclock victim held no frame",
                    ))?;
                    tally.eviction();
                    evicted = Some(victim_page);

                    ring[victim_index] = step.page;
                    table.insert(
                        step.page,
                        ResidentPage::load(step.page, frame, step.write, step.at),
                    );
                    hand = (victim_index + 1) % ring.len();
                }
            }

            observation.emit(|| StepEvent {
                time: step.at,
                page: step.page,
                write: step.write,
                hit,
                evicted,
                frames: snapshot_residents(frame_count, table.values(), |pte| {
                    Some(format!("age={}", step.at.saturating_sub(pte.last_used)))
                }),
                decision: vec![
                    ("policy", "wsclock".to_string()),
                    ("window", self.window.to_string()),
                    ("hand", hand.to_string()),
                ],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }

    /// Scan for a victim slot, mutating R/M bits along the way.
    ///
    /// Terminates within two full passes: the wrap back to the start
    /// position sets the full-cycle flag once and forces eviction of the
    /// page under the hand the second time around.
    fn find_victim(
        &self,
        table: &mut HashMap<PageId, ResidentPage>,
        ring: &[PageId],
        hand: usize,
        now: u64,
    ) -> Result<usize> {
        let len = ring.len();
        if len == 0 {
            return Err(Error::InternalInvariant(
                "wsclock scan over empty resident set",
            ));
        }

        let start = hand % len;
        let mut index = start;
        let mut visited_full_cycle = false;

        loop {
            let page = ring[index];
            let pte = table.get_mut(&page).ok_or(Error::InternalInvariant(
                "wsclock ring entry missing from page table",
            ))?;

            if pte.referenced {
                pte.referenced = false;
            } else {
                let age = now.saturating_sub(pte.last_used);
                let evict = if age > self.window {
                    if !pte.modified {
                        true
                    } else if visited_full_cycle {
                        true
                    } else {
                        // Schedule the write-back and defer the eviction.
                        pte.modified = false;
                        false
                    }
                } else {
                    visited_full_cycle
                };

                if evict {
                    return Ok(index);
                }
            }

            index = (index + 1) % len;
            if index == start {
                if visited_full_cycle {
                    return Ok(index);
                }
                visited_full_cycle = true;
            }
        }
    }
}

impl Policy for WsClock {
    fn name(&self) -> &str {
        "WSClock"
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

    fn reads(pages: &[u64]) -> Vec<Reference> {
        pages.iter().map(|&p| Reference::read(PageId::new(p))).collect()
    }

    fn writes(pages: &[u64]) -> Vec<Reference> {
        pages.iter().map(|&p| Reference::write(PageId::new(p))).collect()
    }

    #[test]
    fn test_wsclock_evicts_old_clean_page() {
        // At the fault on 4 the scan clears R bits on the first pass;
        // on the second pass page 1 (age 4 > window 2, clean) goes.
        let policy = WsClock::new(2);
        let result = policy.run(&reads(&[1, 2, 3, 3, 4, 1]), 3).unwrap();
        // 1 F, 2 F, 3 F, 3 H, 4 F (evict 1), 1 F (evict 2)
        assert_eq!(result.faults, 5);
        assert_eq!(result.hits, 1);
        assert_eq!(result.evictions, 2);
    }

    #[test]
    fn test_wsclock_terminates_all_dirty_inside_window() {
        // Every resident page is dirty and recently used: pass one
        // clears R, pass two schedules nothing evictable, and the forced
        // second wrap must still pick a victim instead of spinning.
        let policy = WsClock::new(1_000);
        let result = policy.run(&writes(&[1, 2, 3, 4, 5, 6, 7, 8]), 3).unwrap();
        assert_eq!(result.faults, 8);
        assert_eq!(result.evictions, 5);
    }

    #[test]
    fn test_wsclock_all_dirty_beyond_window() {
        // Ages beyond the window with M set everywhere: the first pass
        // only schedules write-backs, the second pass evicts.
        let policy = WsClock::new(0);
        let result = policy.run(&writes(&[1, 2, 3, 4, 5]), 3).unwrap();
        assert_eq!(result.faults, 5);
        assert_eq!(result.evictions, 2);
        assert_eq!(result.hits, 0);
    }
}
