use rand::Rng;
use rand::seq::{SliceRandom, index};
use tracing::debug;

use crate::config::{BalanceStrategy, UndersampleParams, WeightParams};
use crate::data::{LabelVector, RowGather};
use crate::errors::ScreeningError;
use crate::resample::{allocate_counts, compute_weights, fill_indices};
use crate::types::ItemIndex;

/// Training rows produced for one loop iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingBatch<X, Y> {
    /// Gathered feature rows.
    pub x: X,
    /// Gathered targets, parallel to `x`.
    pub y: Y,
    /// Item index behind each row, in batch order.
    pub indices: Vec<ItemIndex>,
}

impl<X, Y> TrainingBatch<X, Y> {
    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Builds balanced training batches from the labeled part of the corpus.
///
/// The builder holds only the strategy; the random generator is supplied per call and is
/// the only state mutated. Reusing one seeded generator across sequential calls reproduces
/// the same batches; sharing it between concurrent calls does not.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainingBatchBuilder {
    strategy: BalanceStrategy,
}

impl TrainingBatchBuilder {
    /// Builder for a validated strategy.
    pub fn new(strategy: BalanceStrategy) -> Result<Self, ScreeningError> {
        Ok(Self {
            strategy: strategy.validated()?,
        })
    }

    /// Strategy in use.
    pub fn strategy(&self) -> BalanceStrategy {
        self.strategy
    }

    /// Item indices making up the next batch, already shuffled.
    pub fn sample_indices<R: Rng + ?Sized>(
        &self,
        labels: &LabelVector,
        rng: &mut R,
    ) -> Result<Vec<ItemIndex>, ScreeningError> {
        let (one_idx, zero_idx) = labels.partition();
        let mut all_idx = match &self.strategy {
            BalanceStrategy::Simple => simple_indices(&one_idx, &zero_idx)?,
            BalanceStrategy::Double(params) => double_indices(&one_idx, &zero_idx, params, rng)?,
            BalanceStrategy::Undersample(params) => {
                undersample_indices(&one_idx, &zero_idx, params, rng)?
            }
        };
        all_idx.shuffle(rng);
        Ok(all_idx)
    }

    /// Resample the labeled items and gather their feature and target rows.
    ///
    /// `features` and `targets` must have one row per item of `labels`.
    pub fn build<F, T, R>(
        &self,
        labels: &LabelVector,
        features: &F,
        targets: &T,
        rng: &mut R,
    ) -> Result<TrainingBatch<F::Output, T::Output>, ScreeningError>
    where
        F: RowGather + ?Sized,
        T: RowGather + ?Sized,
        R: Rng + ?Sized,
    {
        ensure_rows("feature matrix", labels.len(), features.n_rows())?;
        ensure_rows("target vector", labels.len(), targets.n_rows())?;

        let indices = self.sample_indices(labels, rng)?;
        Ok(TrainingBatch {
            x: features.gather(&indices),
            y: targets.gather(&indices),
            indices,
        })
    }
}

fn ensure_rows(what: &'static str, expected: usize, actual: usize) -> Result<(), ScreeningError> {
    if expected != actual {
        return Err(ScreeningError::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

fn simple_indices(
    one_idx: &[ItemIndex],
    zero_idx: &[ItemIndex],
) -> Result<Vec<ItemIndex>, ScreeningError> {
    if one_idx.is_empty() && zero_idx.is_empty() {
        return Err(ScreeningError::InsufficientLabels {
            required: 1,
            actual: 0,
        });
    }
    debug!(
        n_one = one_idx.len(),
        n_zero = zero_idx.len(),
        "simple batch"
    );
    Ok(one_idx.iter().chain(zero_idx).copied().collect())
}

fn double_indices<R: Rng + ?Sized>(
    one_idx: &[ItemIndex],
    zero_idx: &[ItemIndex],
    params: &WeightParams,
    rng: &mut R,
) -> Result<Vec<ItemIndex>, ScreeningError> {
    let n_one = one_idx.len();
    let n_zero = zero_idx.len();
    let n_read = n_one + n_zero;

    let weights = compute_weights(n_one, n_zero, n_read, params)?;
    let counts = allocate_counts(n_one, n_zero, n_read, &weights, rng)?;
    debug!(
        n_one,
        n_zero,
        one_weight = weights.one,
        zero_weight = weights.zero,
        n_one_train = counts.n_one,
        n_zero_train = counts.n_zero,
        "double-weighted batch allocation"
    );

    let mut all_idx = fill_indices(one_idx, counts.n_one, rng)?;
    all_idx.extend(fill_indices(zero_idx, counts.n_zero, rng)?);
    Ok(all_idx)
}

fn undersample_indices<R: Rng + ?Sized>(
    one_idx: &[ItemIndex],
    zero_idx: &[ItemIndex],
    params: &UndersampleParams,
    rng: &mut R,
) -> Result<Vec<ItemIndex>, ScreeningError> {
    if one_idx.is_empty() || zero_idx.is_empty() {
        return Err(ScreeningError::Domain(format!(
            "undersampling needs both classes, got {} relevant and {} irrelevant",
            one_idx.len(),
            zero_idx.len()
        )));
    }
    let n_one = one_idx.len();
    let n_zero = zero_idx.len();
    let mut all_idx = one_idx.to_vec();
    if (n_one as f64 / n_zero as f64) < params.ratio {
        let n_zero_train = ((n_one as f64 / params.ratio).ceil() as usize).min(n_zero);
        all_idx.extend(
            index::sample(rng, n_zero, n_zero_train)
                .iter()
                .map(|pos| zero_idx[pos]),
        );
        debug!(n_one, n_zero, n_zero_train, "undersampled batch");
    } else {
        all_idx.extend_from_slice(zero_idx);
        debug!(n_one, n_zero, "ratio already met; batch keeps every row");
    }
    Ok(all_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DenseMatrix, Label};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn labels_with(n_one: usize, n_zero: usize, n_unlabeled: usize) -> LabelVector {
        std::iter::repeat_n(Label::Relevant, n_one)
            .chain(std::iter::repeat_n(Label::Unlabeled, n_unlabeled))
            .chain(std::iter::repeat_n(Label::Irrelevant, n_zero))
            .collect()
    }

    #[test]
    fn double_batch_matches_labeled_count_for_any_imbalance() {
        let builder = TrainingBatchBuilder::default();
        for (n_one, n_zero) in [(1, 99), (50, 50), (3, 7), (90, 10)] {
            let labels = labels_with(n_one, n_zero, 25);
            let features: Vec<usize> = (0..labels.len()).collect();
            let targets: Vec<Label> = labels.as_slice().to_vec();
            let mut rng = StdRng::seed_from_u64(n_one as u64);
            let batch = builder.build(&labels, &features, &targets, &mut rng).unwrap();
            let n_read = n_one + n_zero;
            assert_eq!(batch.len(), n_read);
            assert_eq!(batch.x, batch.indices);
            let relevant = batch.y.iter().filter(|l| **l == Label::Relevant).count();
            assert!(relevant >= 1 && relevant <= n_read - 2, "relevant={relevant}");
            assert!(batch.y.iter().all(|l| l.is_labeled()));
        }
    }

    #[test]
    fn minority_class_is_oversampled() {
        let builder = TrainingBatchBuilder::default();
        let labels = labels_with(5, 45, 0);
        let mut rng = StdRng::seed_from_u64(8);
        let indices = builder.sample_indices(&labels, &mut rng).unwrap();
        let relevant = indices.iter().filter(|&&idx| labels.is_relevant(idx)).count();
        assert!(relevant == 33 || relevant == 34, "relevant={relevant}");
    }

    #[test]
    fn same_seed_reproduces_batch() {
        let builder = TrainingBatchBuilder::default();
        let labels = labels_with(4, 30, 10);
        let a = builder
            .sample_indices(&labels, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = builder
            .sample_indices(&labels, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn double_rejects_degenerate_label_sets() {
        let builder = TrainingBatchBuilder::default();
        let mut rng = StdRng::seed_from_u64(0);

        let too_few = labels_with(1, 1, 5);
        assert_eq!(
            builder.sample_indices(&too_few, &mut rng),
            Err(ScreeningError::InsufficientLabels {
                required: 3,
                actual: 2
            })
        );

        let no_zero = labels_with(4, 0, 0);
        assert!(matches!(
            builder.sample_indices(&no_zero, &mut rng),
            Err(ScreeningError::Domain(_))
        ));

        let no_one = labels_with(0, 6, 0);
        assert!(matches!(
            builder.sample_indices(&no_one, &mut rng),
            Err(ScreeningError::Domain(_))
        ));
    }

    #[test]
    fn build_checks_row_alignment() {
        let builder = TrainingBatchBuilder::default();
        let labels = labels_with(2, 3, 0);
        let features = DenseMatrix::from_row_major(4, 1, vec![0.0_f32; 4]).unwrap();
        let targets = vec![0_u8; 5];
        let err = builder
            .build(&labels, &features, &targets, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            ScreeningError::LengthMismatch {
                what: "feature matrix",
                expected: 5,
                actual: 4
            }
        );

        let features = DenseMatrix::from_row_major(5, 1, vec![0.0_f32; 5]).unwrap();
        let short_targets = vec![0_u8; 3];
        let err = builder
            .build(&labels, &features, &short_targets, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(
            err,
            ScreeningError::LengthMismatch {
                what: "target vector",
                expected: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn simple_strategy_returns_each_labeled_row_once() {
        let builder = TrainingBatchBuilder::new(BalanceStrategy::Simple).unwrap();
        let labels = labels_with(2, 3, 4);
        let mut indices = builder
            .sample_indices(&labels, &mut StdRng::seed_from_u64(2))
            .unwrap();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 6, 7, 8]);

        let empty = labels_with(0, 0, 3);
        assert!(builder
            .sample_indices(&empty, &mut StdRng::seed_from_u64(2))
            .is_err());
    }

    #[test]
    fn undersample_drops_irrelevant_rows_to_ratio() {
        let strategy = BalanceStrategy::Undersample(UndersampleParams { ratio: 0.5 });
        let builder = TrainingBatchBuilder::new(strategy).unwrap();
        let labels = labels_with(3, 40, 0);
        let indices = builder
            .sample_indices(&labels, &mut StdRng::seed_from_u64(4))
            .unwrap();
        let relevant = indices.iter().filter(|&&idx| labels.is_relevant(idx)).count();
        assert_eq!(relevant, 3);
        assert_eq!(indices.len(), 3 + 6);
        let mut unique = indices.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), indices.len());

        let balanced = labels_with(10, 5, 0);
        let all = builder
            .sample_indices(&balanced, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(all.len(), 15);
    }

    #[test]
    fn invalid_strategy_parameters_are_rejected() {
        let bad = WeightParams {
            a: -1.0,
            ..WeightParams::default()
        };
        assert!(TrainingBatchBuilder::new(BalanceStrategy::Double(bad)).is_err());
    }
}
