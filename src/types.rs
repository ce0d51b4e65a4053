/// Position of an item in the fixed item universe.
/// Example: `0` is the first record of the screened corpus.
pub type ItemIndex = usize;
/// Raw integer label code as stored by screening tools.
/// Examples: `1` (relevant), `0` (irrelevant), `-1` (unlabeled)
pub type LabelCode = i64;
/// Seed used to construct reproducible random generators.
/// Example: `535`
pub type Seed = u64;
/// Zero-based iteration counter of the active-learning loop.
/// Example: `12` after twelve retraining rounds
pub type Iteration = u64;
