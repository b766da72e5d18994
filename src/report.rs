//! CSV reporting over benchmark results and recorded step traces.
//!
//! All persistence and formatting lives here, at the crate boundary; the
//! engine itself only ever returns in-memory results. Writers take any
//! `io::Write`, so callers decide between files, pipes, and buffers.

use std::io::Write;

use crate::common::{Error, Result};
use crate::model::BenchmarkResult;
use crate::observe::StepEvent;

/// Aggregates for one policy across its frame-count sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySummary {
    pub policy_name: String,
    pub avg_faults: f64,
    pub avg_fault_rate: f64,
    pub avg_hits: f64,
    pub avg_hit_rate: f64,
    pub avg_evictions: f64,
    pub min_frames: usize,
    pub max_frames: usize,
    pub faults_at_min_frames: usize,
    pub faults_at_max_frames: usize,
    /// Fault delta versus the Optimal baseline, in percent; 0 for the
    /// baseline itself. Negative means more faults than the oracle.
    pub fault_delta_vs_optimal: f64,
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Summarize each benchmark, computing fault deltas against the Optimal
/// baseline (matched by name, case-insensitively; if no Optimal run is
/// present the policy with the fewest average faults is the baseline).
///
/// Fails with [`Error::InvalidConfiguration`] when `benchmarks` is empty
/// or any benchmark carries no results.
pub fn summarize(benchmarks: &[BenchmarkResult]) -> Result<Vec<PolicySummary>> {
    if benchmarks.is_empty() {
        return Err(Error::InvalidConfiguration(
            "no benchmark results to summarize".to_string(),
        ));
    }

    let mut summaries = Vec::with_capacity(benchmarks.len());
    for benchmark in benchmarks {
        let results = &benchmark.results;
        let (min, max) = match (
            results.iter().min_by_key(|r| r.frame_count),
            results.iter().max_by_key(|r| r.frame_count),
        ) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "benchmark for {} has no results",
                    benchmark.policy_name
                )));
            }
        };

        summaries.push(PolicySummary {
            policy_name: benchmark.policy_name.clone(),
            avg_faults: average(results.iter().map(|r| r.faults as f64)),
            avg_fault_rate: average(results.iter().map(|r| r.fault_rate())),
            avg_hits: average(results.iter().map(|r| r.hits as f64)),
            avg_hit_rate: average(results.iter().map(|r| r.hit_rate())),
            avg_evictions: average(results.iter().map(|r| r.evictions as f64)),
            min_frames: min.frame_count,
            max_frames: max.frame_count,
            faults_at_min_frames: min.faults,
            faults_at_max_frames: max.faults,
            fault_delta_vs_optimal: 0.0,
        });
    }

    let baseline_faults = summaries
        .iter()
        .find(|s| s.policy_name.eq_ignore_ascii_case("optimal"))
        .or_else(|| {
            summaries
                .iter()
                .min_by(|a, b| a.avg_faults.total_cmp(&b.avg_faults))
        })
        .map(|s| s.avg_faults)
        .unwrap_or(0.0);

    if baseline_faults > 0.0 {
        for summary in &mut summaries {
            summary.fault_delta_vs_optimal =
                (baseline_faults - summary.avg_faults) / baseline_faults * 100.0;
        }
    }

    Ok(summaries)
}

/// Write one row per `policy × frame_count`.
///
/// `trace_tag` is the [`fingerprint`](crate::trace::fingerprint) of the
/// trace the benchmarks ran against; it lands in every row so results
/// from different traces cannot be silently mixed.
pub fn write_detailed_csv(
    benchmarks: &[BenchmarkResult],
    trace_tag: u32,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(
        out,
        "policy,frames,faults,hits,evictions,hit_rate,fault_rate,trace_tag"
    )?;
    for benchmark in benchmarks {
        for result in &benchmark.results {
            writeln!(
                out,
                "{},{},{},{},{},{:.6},{:.6},{:08x}",
                benchmark.policy_name,
                result.frame_count,
                result.faults,
                result.hits,
                result.evictions,
                result.hit_rate(),
                result.fault_rate(),
                trace_tag
            )?;
        }
    }
    Ok(())
}

/// Write one summary row per policy, sorted by average faults.
pub fn write_summary_csv(
    benchmarks: &[BenchmarkResult],
    trace_tag: u32,
    out: &mut impl Write,
) -> Result<()> {
    let mut summaries = summarize(benchmarks)?;
    summaries.sort_by(|a, b| a.avg_faults.total_cmp(&b.avg_faults));

    writeln!(
        out,
        "policy,avg_faults,avg_fault_rate,avg_hits,avg_hit_rate,avg_evictions,\
         min_frames,max_frames,faults_at_min_frames,faults_at_max_frames,\
         fault_delta_vs_optimal_pct,trace_tag"
    )?;
    for s in &summaries {
        writeln!(
            out,
            "{},{:.3},{:.6},{:.3},{:.6},{:.3},{},{},{},{},{:.2},{:08x}",
            s.policy_name,
            s.avg_faults,
            s.avg_fault_rate,
            s.avg_hits,
            s.avg_hit_rate,
            s.avg_evictions,
            s.min_frames,
            s.max_frames,
            s.faults_at_min_frames,
            s.faults_at_max_frames,
            s.fault_delta_vs_optimal,
            trace_tag
        )?;
    }
    Ok(())
}

/// Write a recorded step trace, one row per reference.
///
/// The `frames` column shows occupancy after the step in frame order,
/// `-` for empty frames, e.g. `[4 2 -]`.
pub fn write_step_trace_csv(steps: &[StepEvent], out: &mut impl Write) -> Result<()> {
    writeln!(out, "t,page,write,outcome,evicted,frames")?;
    for step in steps {
        let frames = step
            .frames
            .iter()
            .map(|f| f.page.map_or_else(|| "-".to_string(), |p| p.0.to_string()))
            .collect::<Vec<_>>()
            .join(" ");

        writeln!(
            out,
            "{},{},{},{},{},[{}]",
            step.time,
            step.page.0,
            step.write as u8,
            if step.hit { "hit" } else { "fault" },
            step.evicted
                .map_or_else(|| "-".to_string(), |p| p.0.to_string()),
            frames
        )?;
    }
    Ok(())
}
