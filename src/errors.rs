use thiserror::Error;

use crate::types::ItemIndex;

/// Error type for degenerate class counts, malformed traces, and invalid configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ScreeningError {
    #[error("domain error: {0}")]
    Domain(String),
    #[error("resampling needs at least {required} labeled items, got {actual}")]
    InsufficientLabels { required: usize, actual: usize },
    #[error("{what} has {actual} rows but the label vector has {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("trace {trace}: {field} references item {index} outside universe of {universe}")]
    IndexOutOfRange {
        trace: usize,
        field: &'static str,
        index: ItemIndex,
        universe: usize,
    },
    #[error("trace {trace}: {field} contains item {index} more than once")]
    DuplicateIndex {
        trace: usize,
        field: &'static str,
        index: ItemIndex,
    },
    #[error("trace {trace}: {field} has {len} entries but the universe only has {universe}")]
    TraceTooLong {
        trace: usize,
        field: &'static str,
        len: usize,
        universe: usize,
    },
    #[error("trace {trace}: prior-knowledge prefix of {n_prior} exceeds label order of {len}")]
    PriorExceedsTrace {
        trace: usize,
        n_prior: usize,
        len: usize,
    },
    #[error("invalid label code {code} at item {index}")]
    InvalidLabel { index: ItemIndex, code: i64 },
    #[error("no simulation traces supplied")]
    NoTraces,
    #[error("configuration error: {0}")]
    Configuration(String),
}
