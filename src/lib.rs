//! pagesim - a virtual-memory page-replacement simulator with swappable
//! eviction policies.
//!
//! Replays a synthetic reference trace against a fixed number of physical
//! frames and records faults, hits, and evictions per policy.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           pagesim                             │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │        Trace Source (trace)   +   Reporter (report)     │  │
//! │  │    seeded generators, fingerprints, CSV aggregation     │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↕                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │               Benchmark Driver (bench)                  │  │
//! │  │         one policy × ordered frame-count sweep          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │         Eviction Policies (policy/)  [Swappable]        │  │
//! │  │  ┌───────────────────────────────────────────────────┐  │  │
//! │  │  │  FIFO │ Clock │ NRU │ Aging │ LRU │ NFU │         │  │  │
//! │  │  │  WorkingSet │ WSClock │ Optimal (oracle)          │  │  │
//! │  │  └───────────────────────────────────────────────────┘  │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                              ↓                                │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │    Data Model (model/)   +   Step Observer (observe)    │  │
//! │  │  Reference, ResidentPage, RunResult, per-step events    │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, defaults)
//! - [`model`] - Trace entries, resident-page records, results
//! - [`policy`] - The nine eviction state machines
//! - [`bench`] - Benchmark driver over frame-count sweeps
//! - [`observe`] - Optional per-step observation hook
//! - [`trace`] - Seeded trace generators and fingerprints
//! - [`report`] - CSV reporting (the only module that touches I/O)
//!
//! # Quick Start
//! ```
//! use pagesim::{benchmark, Lru, Optimal, PageId, Policy, Reference};
//!
//! let trace: Vec<Reference> = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5]
//!     .iter()
//!     .map(|&p| Reference::read(PageId::new(p)))
//!     .collect();
//!
//! let lru = benchmark(&Lru::new(), &trace, &[3, 4]).unwrap();
//! let oracle = Optimal::new().run(&trace, 3).unwrap();
//!
//! // Belady's bound: no policy beats the oracle.
//! assert!(oracle.faults <= lru.results[0].faults);
//! ```

pub mod bench;
pub mod common;
pub mod model;
pub mod observe;
pub mod policy;
pub mod report;
pub mod trace;

// Re-export commonly used items at crate root for convenience
pub use common::{Error, FrameId, PageId, Result};

pub use model::{normalize, BenchmarkResult, Reference, ResidentPage, RunResult};

pub use bench::benchmark;
pub use observe::{
    DecisionMeta, FrameSnapshot, SharedRecorder, StepEvent, StepObserver, StepRecorder,
};
pub use policy::{
    default_policies, Aging, Clock, Fifo, Lru, Nfu, Nru, Optimal, Policy, WorkingSet, WsClock,
};
pub use trace::{fingerprint, LocalityTrace, RandomTrace};
