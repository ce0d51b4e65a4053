//! Weighted resampling primitives used to build balanced training batches.
//!
//! Every function here takes its random source explicitly so that a seeded generator
//! reproduces the same batch for the same labeled set.

use rand::Rng;
use rand::seq::index;
use tracing::warn;

use crate::config::WeightParams;
use crate::constants::resample::{
    MIN_READ_FOR_RESAMPLING, MIN_RELEVANT_SLOTS, RESERVED_IRRELEVANT_SLOTS,
};
use crate::errors::ScreeningError;
use crate::types::ItemIndex;

/// Per-class sampling weights for one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassWeights {
    /// Weight of each relevant item.
    pub one: f64,
    /// Weight of each irrelevant item.
    pub zero: f64,
    degraded: bool,
}

impl ClassWeights {
    /// True when there were no relevant items to oversample.
    ///
    /// The relevant weight is then `+inf` and carries no information; the allocation still
    /// reserves the minimum relevant slot, which cannot be filled.
    pub fn degraded(&self) -> bool {
        self.degraded
    }
}

/// Number of rows to draw per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainCounts {
    /// Relevant rows in the batch.
    pub n_one: usize,
    /// Irrelevant rows in the batch.
    pub n_zero: usize,
}

impl TrainCounts {
    /// Batch size.
    pub fn total(&self) -> usize {
        self.n_one + self.n_zero
    }
}

/// Compute the class weights.
///
/// Formula:
/// - `one = a * (n_one / n_zero) ^ (-alpha)`
/// - `zero = 1 - (1 - b) * (1 + ln(n_read)) ^ (-beta)`
///
/// `n_zero == 0` and `n_read == 0` leave the formula undefined and fail. `n_one == 0` is
/// accepted but the result is flagged as degraded.
pub fn compute_weights(
    n_one: usize,
    n_zero: usize,
    n_read: usize,
    params: &WeightParams,
) -> Result<ClassWeights, ScreeningError> {
    if n_zero == 0 {
        return Err(ScreeningError::Domain(
            "class ratio undefined: no irrelevant items labeled".to_string(),
        ));
    }
    if n_read == 0 {
        return Err(ScreeningError::Domain(
            "evidence term undefined: no items labeled".to_string(),
        ));
    }
    let ratio = n_one as f64 / n_zero as f64;
    let one = params.a * ratio.powf(-params.alpha);
    let zero = 1.0 - (1.0 - params.b) * (1.0 + (n_read as f64).ln()).powf(-params.beta);
    let degraded = n_one == 0;
    if degraded {
        warn!(n_zero, n_read, "no relevant items labeled; nothing to oversample");
    }
    Ok(ClassWeights {
        one,
        zero,
        degraded,
    })
}

/// Split `n_read` batch slots between the classes.
///
/// The relevant share is `one * n_one * n_read / (one * n_one + zero * n_zero)`, clamped to
/// `[1, n_read - 2]` and stochastically rounded; irrelevant rows fill the rest.
/// Requires `n_read >= 3`.
pub fn allocate_counts<R: Rng + ?Sized>(
    n_one: usize,
    n_zero: usize,
    n_read: usize,
    weights: &ClassWeights,
    rng: &mut R,
) -> Result<TrainCounts, ScreeningError> {
    if n_read < MIN_READ_FOR_RESAMPLING {
        return Err(ScreeningError::InsufficientLabels {
            required: MIN_READ_FOR_RESAMPLING,
            actual: n_read,
        });
    }
    if n_zero == 0 {
        return Err(ScreeningError::Domain(
            "cannot allocate batch: no irrelevant items labeled".to_string(),
        ));
    }
    let one_mass = class_mass(weights.one, n_one);
    let zero_mass = class_mass(weights.zero, n_zero);
    let total_weight = one_mass + zero_mass;
    if !total_weight.is_finite() || total_weight <= 0.0 {
        return Err(ScreeningError::Domain(format!(
            "total class weight must be finite and positive, got {total_weight}"
        )));
    }
    let raw_one = one_mass * n_read as f64 / total_weight;
    let low = MIN_RELEVANT_SLOTS as f64;
    let high = (n_read - RESERVED_IRRELEVANT_SLOTS) as f64;
    let n_one_train = random_round(raw_one.clamp(low, high), rng)?;
    Ok(TrainCounts {
        n_one: n_one_train,
        n_zero: n_read - n_one_train,
    })
}

/// A class without items contributes no mass, whatever its weight.
fn class_mass(weight: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        weight * count as f64
    }
}

/// Round `value` down with probability `1 - frac(value)`, otherwise up.
///
/// For example `8.1` becomes `8` in 90% of calls and `9` in 10%, so repeated calls are
/// unbiased in expectation.
pub fn random_round<R: Rng + ?Sized>(value: f64, rng: &mut R) -> Result<usize, ScreeningError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScreeningError::Domain(format!(
            "cannot round {value} to a sample count"
        )));
    }
    let base = value.floor();
    let mut rounded = base as usize;
    if rng.random::<f64>() < value - base {
        rounded += 1;
    }
    Ok(rounded)
}

/// Build a sequence of exactly `count` entries drawn from `source`.
///
/// Whole copies of `source` are repeated `count / |source|` times; the remainder is drawn
/// without replacement, so duplicates only come from whole extra copies.
pub fn fill_indices<R: Rng + ?Sized>(
    source: &[ItemIndex],
    count: usize,
    rng: &mut R,
) -> Result<Vec<ItemIndex>, ScreeningError> {
    if source.is_empty() {
        if count == 0 {
            return Ok(Vec::new());
        }
        return Err(ScreeningError::Domain(format!(
            "cannot draw {count} rows from an empty class"
        )));
    }
    let n_copy = count / source.len();
    let n_sample = count - n_copy * source.len();

    let mut dest = Vec::with_capacity(count);
    for _ in 0..n_copy {
        dest.extend_from_slice(source);
    }
    dest.extend(
        index::sample(rng, source.len(), n_sample)
            .iter()
            .map(|pos| source[pos]),
    );
    Ok(dest)
}
