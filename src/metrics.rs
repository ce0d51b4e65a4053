use std::collections::HashSet;

use crate::data::LabelVector;
use crate::types::ItemIndex;

/// Class make-up of a produced training batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchComposition {
    pub total: usize,
    pub relevant: usize,
    pub irrelevant: usize,
    pub relevant_share: f64,
    /// Distinct relevant items behind the relevant rows.
    pub unique_relevant: usize,
    /// Relevant rows per distinct relevant item (`1.0` means no oversampling).
    pub oversampling_factor: f64,
}

/// Summarize a batch given its item indices and the labels they were drawn from.
/// Returns `None` for an empty batch.
pub fn batch_composition(indices: &[ItemIndex], labels: &LabelVector) -> Option<BatchComposition> {
    if indices.is_empty() {
        return None;
    }
    let total = indices.len();
    let mut relevant = 0;
    let mut unique = HashSet::new();
    for &idx in indices {
        if labels.is_relevant(idx) {
            relevant += 1;
            unique.insert(idx);
        }
    }
    let unique_relevant = unique.len();
    Some(BatchComposition {
        total,
        relevant,
        irrelevant: total - relevant,
        relevant_share: relevant as f64 / total as f64,
        unique_relevant,
        oversampling_factor: if unique_relevant == 0 {
            0.0
        } else {
            relevant as f64 / unique_relevant as f64
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_reports_oversampling() {
        let labels = LabelVector::from_codes([1, 0, 0, -1, 1]).unwrap();
        let comp = batch_composition(&[0, 0, 4, 0, 1, 2], &labels).expect("composition");
        assert_eq!(comp.total, 6);
        assert_eq!(comp.relevant, 4);
        assert_eq!(comp.irrelevant, 2);
        assert_eq!(comp.unique_relevant, 2);
        assert!((comp.relevant_share - 4.0 / 6.0).abs() < 1e-9);
        assert!((comp.oversampling_factor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn composition_of_empty_batch_is_none() {
        let labels = LabelVector::from_codes([1, 0]).unwrap();
        assert!(batch_composition(&[], &labels).is_none());
        let only_zero = batch_composition(&[1, 1], &labels).unwrap();
        assert_eq!(only_zero.oversampling_factor, 0.0);
    }
}
