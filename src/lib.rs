#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Batch construction for classifier training.
pub mod batch;
/// Resampling and discovery-time configuration types.
pub mod config;
/// Centralized constants for weighting defaults, label codes, and seeding.
pub mod constants;
/// Label vectors and row-gatherable containers.
pub mod data;
/// Discovery-time estimation over simulation traces.
pub mod discovery;
/// Reusable demo runners shared by the `demos/` binaries.
pub mod example_apps;
/// Batch composition and screening-efficiency metrics.
pub mod metrics;
/// Weighted resampling primitives.
pub mod resample;
/// Deterministic random generator and seed derivation.
pub mod rng;
/// Read-only simulation trace interface and validation.
pub mod trace;
/// Shared type aliases.
pub mod types;

mod errors;

pub use batch::{TrainingBatch, TrainingBatchBuilder};
pub use config::{BalanceConfig, BalanceStrategy, TimeUnit, UndersampleParams, WeightParams};
pub use data::{DenseMatrix, Label, LabelVector, RowGather};
pub use discovery::{DiscoveryTimeEstimator, DiscoveryTimes, estimate_discovery_times};
pub use errors::ScreeningError;
pub use metrics::{BatchComposition, batch_composition};
pub use resample::{
    ClassWeights, TrainCounts, allocate_counts, compute_weights, fill_indices, random_round,
};
pub use rng::{DeterministicRng, derive_seed};
pub use trace::{RunTrace, SimulationTrace, validate_trace};
pub use types::{ItemIndex, Iteration, LabelCode, Seed};
