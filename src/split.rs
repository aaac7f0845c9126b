//! Seeded train/test partitioning.
//!
//! The test partition holds `round(fraction × N)` records chosen by shuffling
//! row indices with a [`StdRng`]. The same seed over the same dataset always
//! selects the same records. Records keep their original relative order
//! inside each partition. No stratification by label is attempted.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{PipelineError, PipelineResult};

/// Disjoint train and test partitions covering a dataset exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Number of test records for `fraction` of `len` records.
///
/// Rounds half away from zero.
///
/// # Examples
///
/// ```
/// use senti_runner::split::test_size;
///
/// assert_eq!(test_size(0.3, 10), 3);
/// assert_eq!(test_size(0.25, 10), 3);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "fraction lies in (0, 1) so the product fits in usize"
)]
pub fn test_size(fraction: f64, len: usize) -> usize {
    #[expect(clippy::float_arithmetic, reason = "fraction of the record count")]
    let raw = (fraction * len as f64).round();
    (raw as usize).min(len)
}

/// Partition `dataset` into train and test subsets.
///
/// Without a seed the generator is seeded from the operating system.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidArgument`] when `fraction` is not strictly
/// between 0 and 1, or the dataset is empty.
pub fn split_dataset(dataset: &Dataset, fraction: f64, seed: Option<u64>) -> PipelineResult<Split> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::InvalidArgument(format!(
            "test split must lie strictly between 0 and 1, got {fraction}"
        )));
    }
    if dataset.is_empty() {
        return Err(PipelineError::InvalidArgument(
            "cannot split an empty dataset".into(),
        ));
    }

    let len = dataset.len();
    let mut order: Vec<usize> = (0..len).collect();
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    order.shuffle(&mut rng);

    let mut in_test = vec![false; len];
    for &idx in order.iter().take(test_size(fraction, len)) {
        if let Some(flag) = in_test.get_mut(idx) {
            *flag = true;
        }
    }

    let mut train = Vec::with_capacity(len);
    let mut test = Vec::with_capacity(len);
    for (record, is_test) in dataset.records().iter().zip(in_test) {
        if is_test {
            test.push(record.clone());
        } else {
            train.push(record.clone());
        }
    }
    debug!(train = train.len(), test = test.len(), ?seed, "split dataset");
    Ok(Split {
        train: Dataset::from_records(train)?,
        test: Dataset::from_records(test)?,
    })
}
