//! Working-Set replacement policy.

use std::collections::HashMap;

use crate::common::{config, Error, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, free_frames, snapshot_residents, Observation, Policy, Tally};

/// Evicts pages that have fallen out of the working set.
///
/// A page is outside the working set when `now - last_used > window`. The
/// victim is the stalest such page; when the entire resident set is still
/// inside its window, the policy falls back to the global least-recently
/// used page so a fault can always be served.
///
/// With `window = 0` every page not touched at the current instant is
/// outside the window, which makes the policy coincide with exact LRU.
#[derive(Debug)]
pub struct WorkingSet {
    /// Time horizon of the working set.
    pub window: u64,
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self {
            window: config::DEFAULT_WINDOW,
        }
    }
}

impl WorkingSet {
    /// Create a Working-Set policy with the given window.
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
        let mut load_order: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut free = free_frames(frame_count);
        let mut tally = Tally::new();

        for step in &steps {
            let mut evicted = None;
            let mut fell_back_to_lru = false;
            let hit = table.contains_key(&step.page);

            if hit {
                tally.hit();
                if let Some(pte) = table.get_mut(&step.page) {
                    pte.touch(step.write, step.at);
                }
            } else {
                tally.fault();

                let frame = match free.pop_front() {
                    Some(frame) => frame,
                    None => {
                        let (position, outside) =
                            self.select_victim(&table, &load_order, step.at)?;
                        fell_back_to_lru = !outside;

                        let victim_page = load_order.remove(position);
                        let victim_pte = table.remove(&victim_page).ok_or(
                            Error::InternalInvariant(
                                "working-set victim missing from table",
                            ),
                        )?;
                        tally.eviction();
                        evicted = Some(victim_page);
                        victim_pte.frame.ok_or(Error::InternalInvariant(
                            "working-set victim held no frame",
                        ))?
                    }
                };

                table.insert(
                    step.page,
                    ResidentPage::load(step.page, frame, step.write, step.at),
                );
                load_order.push(step.page);
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
                    ("policy", "working_set".to_string()),
                    ("window", self.window.to_string()),
                    ("lru_fallback", fell_back_to_lru.to_string()),
                ],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }

    /// Pick the stalest page outside the window, or the global LRU page
    /// when everything is inside. Returns the load-order position and
    /// whether an outside-window page was found.
    fn select_victim(
        &self,
        table: &HashMap<PageId, ResidentPage>,
        load_order: &[PageId],
        now: u64,
    ) -> Result<(usize, bool)> {
        let mut outside: Option<(usize, u64)> = None;
        let mut least_recent: Option<(usize, u64)> = None;

        for (position, page) in load_order.iter().enumerate() {
            let pte = table.get(page).ok_or(Error::InternalInvariant(
                "working-set resident page missing from table",
            ))?;

            if least_recent.is_none_or(|(_, best)| pte.last_used < best) {
                least_recent = Some((position, pte.last_used));
            }

            if now.saturating_sub(pte.last_used) > self.window
                && outside.is_none_or(|(_, best)| pte.last_used < best)
            {
                outside = Some((position, pte.last_used));
            }
        }

        if let Some((position, _)) = outside {
            return Ok((position, true));
        }
        if let Some((position, _)) = least_recent {
            return Ok((position, false));
        }
        Err(Error::InternalInvariant(
            "working-set victim scan over empty resident set",
        ))
    }
}

impl Policy for WorkingSet {
    fn name(&self) -> &str {
        "WorkingSet"
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
