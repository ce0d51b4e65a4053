use serde::{Deserialize, Serialize};

use crate::errors::ScreeningError;
use crate::types::ItemIndex;

/// Read-only view of one completed simulation run.
///
/// Implemented by whatever the simulation harness persists; this crate never writes traces.
pub trait SimulationTrace {
    /// Item indices in the order the oracle labeled them, prior-knowledge prefix first.
    fn label_order(&self) -> &[ItemIndex];
    /// Item indices ranked by the final model's relevance score, most relevant first.
    fn proba_order(&self) -> &[ItemIndex];
    /// Length of the prior-knowledge prefix of `label_order`.
    fn n_prior(&self) -> usize;
}

/// In-memory simulation trace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTrace {
    /// Labeling order, prior-knowledge prefix first.
    pub label_order: Vec<ItemIndex>,
    /// Final relevance ranking, descending.
    pub proba_order: Vec<ItemIndex>,
    /// Number of leading `label_order` entries known before the run started.
    #[serde(default)]
    pub n_prior: usize,
}

impl RunTrace {
    /// Trace with the given orders and prior-knowledge prefix length.
    pub fn new(label_order: Vec<ItemIndex>, proba_order: Vec<ItemIndex>, n_prior: usize) -> Self {
        Self {
            label_order,
            proba_order,
            n_prior,
        }
    }
}

impl SimulationTrace for RunTrace {
    fn label_order(&self) -> &[ItemIndex] {
        &self.label_order
    }

    fn proba_order(&self) -> &[ItemIndex] {
        &self.proba_order
    }

    fn n_prior(&self) -> usize {
        self.n_prior
    }
}

impl<T: SimulationTrace + ?Sized> SimulationTrace for &T {
    fn label_order(&self) -> &[ItemIndex] {
        (**self).label_order()
    }

    fn proba_order(&self) -> &[ItemIndex] {
        (**self).proba_order()
    }

    fn n_prior(&self) -> usize {
        (**self).n_prior()
    }
}

/// Check that a trace only references a universe of `universe` items.
///
/// Both orders must be permutations or permutation prefixes of `0..universe`, and the
/// prior-knowledge prefix must fit inside `label_order`. `trace_id` only labels errors.
pub fn validate_trace<T: SimulationTrace + ?Sized>(
    trace: &T,
    universe: usize,
    trace_id: usize,
) -> Result<(), ScreeningError> {
    validate_order(trace.label_order(), "label_order", universe, trace_id)?;
    validate_order(trace.proba_order(), "proba_order", universe, trace_id)?;
    let len = trace.label_order().len();
    if trace.n_prior() > len {
        return Err(ScreeningError::PriorExceedsTrace {
            trace: trace_id,
            n_prior: trace.n_prior(),
            len,
        });
    }
    Ok(())
}

fn validate_order(
    order: &[ItemIndex],
    field: &'static str,
    universe: usize,
    trace: usize,
) -> Result<(), ScreeningError> {
    if order.len() > universe {
        return Err(ScreeningError::TraceTooLong {
            trace,
            field,
            len: order.len(),
            universe,
        });
    }
    let mut seen = vec![false; universe];
    for &index in order {
        let Some(slot) = seen.get_mut(index) else {
            return Err(ScreeningError::IndexOutOfRange {
                trace,
                field,
                index,
                universe,
            });
        };
        if *slot {
            return Err(ScreeningError::DuplicateIndex {
                trace,
                field,
                index,
            });
        }
        *slot = true;
    }
    Ok(())
}
