/// Constants used by the adaptive resampler and its default weighting curve.
pub mod resample {
    /// Default linear weight of the relevant class.
    pub const DEFAULT_A: f64 = 2.155;
    /// Default exponent applied to the relevant/irrelevant ratio.
    pub const DEFAULT_ALPHA: f64 = 0.94;
    /// Default asymptotic weight of the irrelevant class.
    pub const DEFAULT_B: f64 = 0.789;
    /// Default exponent applied to the evidence term `1 + ln(n_read)`.
    pub const DEFAULT_BETA: f64 = 1.0;
    /// Smallest labeled-set size for which the weighted allocation is defined.
    ///
    /// The allocation reserves at least one relevant slot and two irrelevant slots.
    pub const MIN_READ_FOR_RESAMPLING: usize = 3;
    /// Minimum number of relevant rows in a weighted batch.
    pub const MIN_RELEVANT_SLOTS: usize = 1;
    /// Number of slots always left for irrelevant rows in a weighted batch.
    pub const RESERVED_IRRELEVANT_SLOTS: usize = 2;
    /// Default relevant/irrelevant ratio targeted by undersampling.
    pub const DEFAULT_UNDERSAMPLE_RATIO: f64 = 1.0;
}

/// Constants used by label decoding.
pub mod labels {
    use crate::types::LabelCode;

    /// Integer code for a relevant item.
    pub const RELEVANT_CODE: LabelCode = 1;
    /// Integer code for an irrelevant item.
    pub const IRRELEVANT_CODE: LabelCode = 0;
    /// Integer code for an item without a label.
    pub const UNLABELED_CODE: LabelCode = -1;
}

/// Constants used by seed derivation.
pub mod rng {
    /// Default seed for `BalanceConfig`.
    pub const DEFAULT_SEED: u64 = 42;
    /// Offset mixed into per-iteration seed derivation.
    pub const ITERATION_SEED_OFFSET: u64 = 0xB4C3_5EED;
    /// SplitMix64 increment (golden-ratio constant).
    pub const SPLITMIX_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    /// First SplitMix64 finalizer multiplier.
    pub const SPLITMIX_MUL_1: u64 = 0xBF58_476D_1CE4_E5B9;
    /// Second SplitMix64 finalizer multiplier.
    pub const SPLITMIX_MUL_2: u64 = 0x94D0_49BB_1331_11EB;
}

/// Constants used by discovery-time normalization.
pub mod discovery {
    /// Multiplier applied for percentage output.
    pub const PERCENT_SCALE: f64 = 100.0;
}
