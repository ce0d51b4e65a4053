//! Discovery-time estimation over completed simulation runs.
//!
//! For every relevant item, the estimator records the position at which a run surfaced it
//! and averages those positions across runs:
//!
//! - items labeled after the prior-knowledge prefix contribute `mult * (i + 1)`, with `i` the
//!   0-based position inside `label_order[n..]`;
//! - every relevant item outside the prefix `label_order[..n]` also contributes
//!   `mult * (j + |label_order|)`, with `j` its 0-based rank in `proba_order`.
//!
//! The second rule also fires for items already counted by the first one, so a trace whose
//! `proba_order` covers labeled items records two observations for them.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::config::TimeUnit;
use crate::data::LabelVector;
use crate::errors::ScreeningError;
use crate::trace::{SimulationTrace, validate_trace};
use crate::types::ItemIndex;

/// Averaged discovery time per relevant item, in ascending item order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DiscoveryTimes {
    times: IndexMap<ItemIndex, f64>,
}

impl DiscoveryTimes {
    /// Discovery time of `item`, if it was observed.
    pub fn get(&self, item: ItemIndex) -> Option<f64> {
        self.times.get(&item).copied()
    }

    /// Number of items with an estimate.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when no relevant item was observed.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// `(item, time)` pairs in ascending item order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemIndex, f64)> + '_ {
        self.times.iter().map(|(&item, &time)| (item, time))
    }

    /// Average time to discovery over all estimated items.
    pub fn average(&self) -> Option<f64> {
        if self.times.is_empty() {
            return None;
        }
        Some(self.times.values().sum::<f64>() / self.times.len() as f64)
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> IndexMap<ItemIndex, f64> {
        self.times
    }
}

/// Estimates discovery times in a fixed unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryTimeEstimator {
    unit: TimeUnit,
}

impl DiscoveryTimeEstimator {
    /// Estimator reporting in `unit`.
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }

    /// Reporting unit.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Estimate per-item discovery times from `traces` against the shared ground truth.
    ///
    /// Traces are validated and processed in parallel; items never observed are omitted.
    pub fn estimate<T>(
        &self,
        traces: &[T],
        labels: &LabelVector,
    ) -> Result<DiscoveryTimes, ScreeningError>
    where
        T: SimulationTrace + Sync,
    {
        if traces.is_empty() {
            return Err(ScreeningError::NoTraces);
        }

        let per_trace = traces
            .par_iter()
            .enumerate()
            .map(|(trace_id, trace)| trace_observations(trace, labels, self.unit, trace_id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut observations: IndexMap<ItemIndex, Vec<f64>> = labels
            .relevant_indices()
            .into_iter()
            .map(|idx| (idx, Vec::new()))
            .collect();
        for trace_obs in per_trace {
            for (idx, time) in trace_obs {
                if let Some(list) = observations.get_mut(&idx) {
                    list.push(time);
                }
            }
        }

        let relevant = observations.len();
        let times: IndexMap<ItemIndex, f64> = observations
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(idx, list)| (idx, list.iter().sum::<f64>() / list.len() as f64))
            .collect();
        debug!(
            traces = traces.len(),
            relevant,
            estimated = times.len(),
            unit = %self.unit,
            "discovery times estimated"
        );
        Ok(DiscoveryTimes { times })
    }
}

/// Estimate discovery times in `unit`; see [`DiscoveryTimeEstimator::estimate`].
pub fn estimate_discovery_times<T>(
    traces: &[T],
    labels: &LabelVector,
    unit: TimeUnit,
) -> Result<DiscoveryTimes, ScreeningError>
where
    T: SimulationTrace + Sync,
{
    DiscoveryTimeEstimator::new(unit).estimate(traces, labels)
}

/// Raw `(item, time)` observations contributed by one trace.
pub fn trace_observations<T: SimulationTrace + ?Sized>(
    trace: &T,
    labels: &LabelVector,
    unit: TimeUnit,
    trace_id: usize,
) -> Result<Vec<(ItemIndex, f64)>, ScreeningError> {
    let n_total = labels.len();
    validate_trace(trace, n_total, trace_id)?;

    let label_order = trace.label_order();
    let n_prior = trace.n_prior();
    let time_mult = unit.multiplier(n_total, n_prior)?;

    let mut observed = Vec::new();
    for (i_time, &idx) in label_order[n_prior..].iter().enumerate() {
        if labels.is_relevant(idx) {
            observed.push((idx, time_mult * (i_time + 1) as f64));
        }
    }

    let prior: HashSet<ItemIndex> = label_order[..n_prior].iter().copied().collect();
    for (i_time, &idx) in trace.proba_order().iter().enumerate() {
        if labels.is_relevant(idx) && !prior.contains(&idx) {
            observed.push((idx, time_mult * (i_time + label_order.len()) as f64));
        }
    }
    Ok(observed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::RunTrace;

    fn labels(codes: &[i64]) -> LabelVector {
        LabelVector::from_codes(codes.iter().copied()).unwrap()
    }

    #[test]
    fn single_trace_counts_one_based_positions() {
        // Items 0 and 1 are relevant; they are labeled second and third.
        let truth = labels(&[1, 1, 0, 0]);
        let trace = RunTrace::new(vec![3, 0, 1, 2], vec![], 0);
        let times = estimate_discovery_times(&[trace], &truth, TimeUnit::Count).unwrap();
        assert_eq!(times.len(), 2);
        assert_eq!(times.get(0), Some(2.0));
        assert_eq!(times.get(1), Some(3.0));
        assert_eq!(times.get(2), None);
        assert_eq!(times.get(3), None);
        assert_eq!(times.average(), Some(2.5));
        assert_eq!(DiscoveryTimes::default().average(), None);
    }

    #[test]
    fn labels_are_looked_up_by_item_index() {
        let truth = labels(&[0, 1, 1, 0]);
        let trace = RunTrace::new(vec![3, 0, 1, 2], vec![], 0);
        let times = estimate_discovery_times(&[trace], &truth, TimeUnit::Count).unwrap();
        assert_eq!(times.iter().collect::<Vec<_>>(), vec![(1, 3.0), (2, 4.0)]);
        assert_eq!(times.average(), Some(3.5));
    }

    #[test]
    fn normalized_units_divide_by_screenable_items() {
        let truth = labels(&[1, 0, 1, 0, 0]);
        // Item 0 is prior knowledge; four items remain screenable.
        let trace = RunTrace::new(vec![0, 3, 2], vec![], 1);
        let fraction = estimate_discovery_times(&[&trace], &truth, TimeUnit::Fraction).unwrap();
        assert_eq!(fraction.get(2), Some(0.5));
        assert_eq!(fraction.get(0), None);

        let percentage =
            estimate_discovery_times(&[&trace], &truth, TimeUnit::Percentage).unwrap();
        assert_eq!(percentage.get(2), Some(50.0));
    }

    #[test]
    fn prior_items_are_estimated_from_final_ranking() {
        let truth = labels(&[1, 0, 1, 0, 0]);
        let trace = RunTrace::new(vec![0, 3], vec![2, 1, 4], 1);
        let times = estimate_discovery_times(&[trace], &truth, TimeUnit::Count).unwrap();
        // Item 2 was never labeled: rank 0 in proba_order plus |label_order| = 2.
        assert_eq!(times.get(2), Some(2.0));
        // Item 0 sits in the prior prefix and is excluded from both passes.
        assert_eq!(times.get(0), None);
    }

    #[test]
    fn ranking_pass_double_counts_labeled_items() {
        // Unresolved ambiguity: the ranking pass only excludes the prior prefix, so an item
        // found during the run is observed twice. Kept as-is until the intent is confirmed.
        let truth = labels(&[1, 0, 0]);
        let trace = RunTrace::new(vec![1, 0, 2], vec![0, 1, 2], 0);
        let obs = trace_observations(&trace, &truth, TimeUnit::Count, 0).unwrap();
        assert_eq!(obs, vec![(0, 2.0), (0, 3.0)]);

        let times = estimate_discovery_times(&[trace], &truth, TimeUnit::Count).unwrap();
        assert_eq!(times.get(0), Some(2.5));
    }

    #[test]
    fn observations_are_averaged_across_traces() {
        let truth = labels(&[1, 0, 0, 1]);
        let traces = vec![
            RunTrace::new(vec![0, 1, 2, 3], vec![], 0),
            RunTrace::new(vec![2, 1, 3, 0], vec![], 0),
            RunTrace::new(vec![1, 2], vec![], 0),
        ];
        let times = estimate_discovery_times(&traces, &truth, TimeUnit::Count).unwrap();
        assert_eq!(times.get(0), Some(2.5));
        assert_eq!(times.get(3), Some(3.5));
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let truth = labels(&[1, 0]);
        let empty: Vec<RunTrace> = Vec::new();
        assert_eq!(
            estimate_discovery_times(&empty, &truth, TimeUnit::Count),
            Err(ScreeningError::NoTraces)
        );

        let traces = vec![
            RunTrace::new(vec![0, 1], vec![], 0),
            RunTrace::new(vec![0, 5], vec![], 0),
        ];
        assert!(matches!(
            estimate_discovery_times(&traces, &truth, TimeUnit::Count),
            Err(ScreeningError::IndexOutOfRange { trace: 1, index: 5, .. })
        ));

        let all_prior = vec![RunTrace::new(vec![0, 1], vec![], 2)];
        assert!(matches!(
            estimate_discovery_times(&all_prior, &truth, TimeUnit::Fraction),
            Err(ScreeningError::Domain(_))
        ));
    }
}
