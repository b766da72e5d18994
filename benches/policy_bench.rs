use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use pagesim::{default_policies, LocalityTrace, Optimal, Policy, Reference};

fn phased_trace(trace_length: usize) -> Vec<Reference> {
    LocalityTrace {
        num_pages: 256,
        trace_length,
        write_prob: 0.25,
        locality_prob: 0.9,
        phase_length: 200,
        working_set_size: 16,
        seed: 42,
    }
    .generate()
    .unwrap()
}

fn policy_benchmark(c: &mut Criterion) {
    let trace = phased_trace(10_000);
    let mut group = c.benchmark_group("policies");

    for policy in default_policies() {
        // The oracle is quadratic; bench it separately on a shorter trace.
        if policy.name() == "Optimal" {
            continue;
        }
        group.bench_with_input(
            BenchmarkId::new(policy.name().to_string(), trace.len()),
            &trace,
            |b, trace| b.iter(|| policy.run(trace, 64).unwrap()),
        );
    }
    group.finish();
}

fn oracle_benchmark(c: &mut Criterion) {
    let trace = phased_trace(1_000);
    c.bench_function("oracle_lookahead", |b| {
        b.iter(|| Optimal::new().run(&trace, 64).unwrap())
    });
}

fn frame_sweep_benchmark(c: &mut Criterion) {
    let trace = phased_trace(10_000);
    let mut group = c.benchmark_group("frame_sweep");

    for frame_count in [16usize, 64, 192] {
        group.bench_with_input(
            BenchmarkId::from_parameter(frame_count),
            &frame_count,
            |b, &frame_count| {
                let policy = pagesim::Lru::new();
                b.iter(|| policy.run(&trace, frame_count).unwrap())
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    policy_benchmark,
    oracle_benchmark,
    frame_sweep_benchmark
);
criterion_main!(benches);
