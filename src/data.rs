use serde::{Deserialize, Serialize};

use crate::constants::labels::{IRRELEVANT_CODE, RELEVANT_CODE, UNLABELED_CODE};
use crate::errors::ScreeningError;

use crate::types::{ItemIndex, LabelCode};

/// Screening decision for a single item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Included by the oracle.
    Relevant,
    /// Excluded by the oracle.
    Irrelevant,
    /// Not yet shown to the oracle.
    Unlabeled,
}

impl Label {
    /// Decode an integer label code (`1`, `0`, `-1`).
    pub fn from_code(code: LabelCode) -> Option<Self> {
        match code {
            RELEVANT_CODE => Some(Self::Relevant),
            IRRELEVANT_CODE => Some(Self::Irrelevant),
            UNLABELED_CODE => Some(Self::Unlabeled),
            _ => None,
        }
    }

    /// Integer code for this label.
    pub fn code(self) -> LabelCode {
        match self {
            Self::Relevant => RELEVANT_CODE,
            Self::Irrelevant => IRRELEVANT_CODE,
            Self::Unlabeled => UNLABELED_CODE,
        }
    }

    /// Whether the oracle has decided on this item.
    pub fn is_labeled(self) -> bool {
        !matches!(self, Self::Unlabeled)
    }
}

impl From<Option<bool>> for Label {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Relevant,
            Some(false) => Self::Irrelevant,
            None => Self::Unlabeled,
        }
    }
}

/// Snapshot of labels over the full item universe.
///
/// Entry `i` is the label of item `i`. The vector is read-only to this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelVector {
    labels: Vec<Label>,
}

impl LabelVector {
    /// Wrap an existing label sequence.
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Decode integer codes; any code other than `1`, `0`, `-1` is rejected.
    pub fn from_codes<I>(codes: I) -> Result<Self, ScreeningError>
    where
        I: IntoIterator<Item = LabelCode>,
    {
        let labels = codes
            .into_iter()
            .enumerate()
            .map(|(index, code)| {
                Label::from_code(code).ok_or(ScreeningError::InvalidLabel { index, code })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { labels })
    }

    /// Size of the item universe (`N_total`).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of `index`, if inside the universe.
    pub fn get(&self, index: ItemIndex) -> Option<Label> {
        self.labels.get(index).copied()
    }

    /// True when `index` is inside the universe and labeled relevant.
    pub fn is_relevant(&self, index: ItemIndex) -> bool {
        matches!(self.get(index), Some(Label::Relevant))
    }

    /// Borrow the raw labels.
    pub fn as_slice(&self) -> &[Label] {
        &self.labels
    }

    /// Relevant and irrelevant item indices, each in ascending order.
    pub fn partition(&self) -> (Vec<ItemIndex>, Vec<ItemIndex>) {
        let mut one_idx = Vec::new();
        let mut zero_idx = Vec::new();
        for (idx, label) in self.labels.iter().enumerate() {
            match label {
                Label::Relevant => one_idx.push(idx),
                Label::Irrelevant => zero_idx.push(idx),
                Label::Unlabeled => {}
            }
        }
        (one_idx, zero_idx)
    }

    /// Indices of every relevant item, ascending.
    pub fn relevant_indices(&self) -> Vec<ItemIndex> {
        self.partition().0
    }

    /// Number of labeled items (`n_read`).
    pub fn n_read(&self) -> usize {
        self.labels.iter().filter(|label| label.is_labeled()).count()
    }
}

impl From<Vec<Label>> for LabelVector {
    fn from(labels: Vec<Label>) -> Self {
        Self::new(labels)
    }
}

impl FromIterator<Label> for LabelVector {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Row-indexable container that can be gathered by index.
///
/// Feature matrices and target vectors are opaque here; only row selection is needed.
pub trait RowGather {
    /// Container produced by a gather.
    type Output;

    /// Number of rows available.
    fn n_rows(&self) -> usize;

    /// Build a new container whose row `k` is row `indices[k]` of `self`.
    ///
    /// Callers guarantee every index is `< n_rows()`.
    fn gather(&self, indices: &[usize]) -> Self::Output;
}

impl<T: Clone> RowGather for [T] {
    type Output = Vec<T>;

    fn n_rows(&self) -> usize {
        self.len()
    }

    fn gather(&self, indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&idx| self[idx].clone()).collect()
    }
}

impl<T: Clone> RowGather for Vec<T> {
    type Output = Vec<T>;

    fn n_rows(&self) -> usize {
        self.len()
    }

    fn gather(&self, indices: &[usize]) -> Vec<T> {
        self.as_slice().gather(indices)
    }
}

/// Dense row-major matrix.
///
/// Deserialization goes through [`DenseMatrix::from_row_major`], so a decoded matrix always
/// holds exactly `rows * cols` values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDenseMatrix<T>")]
pub struct DenseMatrix<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

#[derive(Deserialize)]
struct RawDenseMatrix<T> {
    rows: usize,
    cols: usize,
    values: Vec<T>,
}

impl<T> TryFrom<RawDenseMatrix<T>> for DenseMatrix<T> {
    type Error = ScreeningError;

    fn try_from(raw: RawDenseMatrix<T>) -> Result<Self, Self::Error> {
        Self::from_row_major(raw.rows, raw.cols, raw.values)
    }
}

impl<T> DenseMatrix<T> {
    /// Build a matrix from a row-major buffer of `rows * cols` values.
    pub fn from_row_major(
        rows: usize,
        cols: usize,
        values: Vec<T>,
    ) -> Result<Self, ScreeningError> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(ScreeningError::Configuration(format!(
                "row-major buffer of {} values does not fit {rows}x{cols}",
                values.len()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `row`, if present.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(&self.values[start..start + self.cols])
    }

    /// Borrow the row-major buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Clone> RowGather for DenseMatrix<T> {
    type Output = DenseMatrix<T>;

    fn n_rows(&self) -> usize {
        self.rows
    }

    fn gather(&self, indices: &[usize]) -> DenseMatrix<T> {
        let mut values = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            let start = row * self.cols;
            values.extend_from_slice(&self.values[start..start + self.cols]);
        }
        DenseMatrix {
            rows: indices.len(),
            cols: self.cols,
            values,
        }
    }
}
