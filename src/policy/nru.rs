//! NRU (Not Recently Used) replacement policy.

use std::collections::HashMap;

use crate::common::{config, Error, PageId, Result};
use crate::model::{resolve, Reference, ResidentPage, RunResult};
use crate::observe::{StepEvent, StepObserver};

use super::{check_frame_count, free_frames, snapshot_residents, Observation, Policy, Tally};

/// Classifies resident pages by (R, M) and evicts from the lowest class.
///
/// Class order is `(0,0) < (0,1) < (1,0) < (1,1)`: an unreferenced clean
/// page beats an unreferenced dirty one, which beats anything recently
/// referenced. Within a class the first page in load order is taken.
///
/// Every `reset_interval` accesses all reference bits are cleared (before
/// the triggering access is processed), so "recently" means "since the
/// last reset".
#[derive(Debug, Default)]
pub struct Nru {
    /// Accesses between reference-bit resets. `None` selects
    /// `max(1, 2 × frame_count)` at run time.
    pub reset_interval: Option<u64>,
}

impl Nru {
    /// Create an NRU policy with the default reset interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an NRU policy with an explicit reset interval.
    pub fn with_reset_interval(reset_interval: u64) -> Self {
        Self {
            reset_interval: Some(reset_interval),
        }
    }

    fn execute(
        &self,
        trace: &[Reference],
        frame_count: usize,
        mut observation: Observation<'_>,
    ) -> Result<RunResult> {
        check_frame_count(frame_count)?;
        if self.reset_interval == Some(0) {
            return Err(Error::InvalidConfiguration(
                "reset_interval must be > 0".to_string(),
            ));
        }
        let interval = self
            .reset_interval
            .unwrap_or_else(|| config::default_nru_reset_interval(frame_count));
        let steps = resolve(trace)?;

        let mut table: HashMap<PageId, ResidentPage> = HashMap::new();
        let mut load_order: Vec<PageId> = Vec::with_capacity(frame_count);
        let mut free = free_frames(frame_count);
        let mut accesses_since_reset: u64 = 0;
        let mut tally = Tally::new();

        for step in &steps {
            if accesses_since_reset >= interval {
                for page in &load_order {
                    if let Some(pte) = table.get_mut(page) {
                        pte.referenced = false;
                    }
                }
                accesses_since_reset = 0;
            }
            accesses_since_reset += 1;

            let mut evicted = None;
            let mut victim_class = None;
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
                        let (position, class) =
                            Self::select_victim(&table, &load_order)?;
                        victim_class = Some(class);

                        let victim_page = load_order.remove(position);
                        let victim_pte = table.remove(&victim_page).ok_or(
                            Error::InternalInvariant("nru victim missing from table"),
                        )?;
                        tally.eviction();
                        evicted = Some(victim_page);
                        victim_pte.frame.ok_or(Error::InternalInvariant(
                            "nru victim held no frame",
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
                    Some(format!("class={}", pte.class()))
                }),
                decision: vec![
                    ("policy", "nru".to_string()),
                    (
                        "victim_class",
                        victim_class.map_or_else(|| "-".to_string(), |c| c.to_string()),
                    ),
                    ("until_reset", (interval - accesses_since_reset).to_string()),
                ],
            });
        }

        Ok(tally.finish(self.name(), frame_count, steps.len()))
    }

    /// First page in load order belonging to the lowest non-empty class.
    fn select_victim(
        table: &HashMap<PageId, ResidentPage>,
        load_order: &[PageId],
    ) -> Result<(usize, u8)> {
        for class in 0..4u8 {
            for (position, page) in load_order.iter().enumerate() {
                let pte = table.get(page).ok_or(Error::InternalInvariant(
                    "nru resident page missing from table",
                ))?;
                if pte.class() == class {
                    return Ok((position, class));
                }
            }
        }
        Err(Error::InternalInvariant(
            "nru victim scan over empty resident set",
        ))
    }
}

impl Policy for Nru {
    fn name(&self) -> &str {
        "NRU"
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
