//! Train/test and k-fold index splits

use crate::deterministic::LcgRng;
use mansion_core::{MansionError, Result};

/// Shuffled train/test indices over `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(test_size · n)` rows.
///
/// Both sides must end up non-empty.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MansionError::Configuration(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(MansionError::Data(format!(
            "{} rows cannot be split into non-empty train and test sets (test_size {})",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    LcgRng::new(seed).shuffle(&mut indices);
    let train = indices.split_off(n_test);

    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

/// Contiguous k-fold partition; the first `n mod k` folds are one row larger.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    k: usize,
}

/// Positions `(fit, validate)` of one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub fit: Vec<usize>,
    pub validate: Vec<usize>,
}

impl KFold {
    pub fn new(k: usize) -> Result<Self> {
        if k < 2 {
            return Err(MansionError::Configuration(format!(
                "cv_folds must be at least 2, got {}",
                k
            )));
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Folds over positions `0..n`; requires `n >= k`.
    pub fn folds(&self, n: usize) -> Result<Vec<Fold>> {
        if n < self.k {
            return Err(MansionError::Data(format!(
                "{} training rows are too few for {}-fold cross-validation",
                n, self.k
            )));
        }

        let base = n / self.k;
        let extra = n % self.k;
        let mut folds = Vec::with_capacity(self.k);
        let mut start = 0;
        for i in 0..self.k {
            let len = base + usize::from(i < extra);
            let end = start + len;
            folds.push(Fold {
                fit: (0..start).chain(end..n).collect(),
                validate: (start..end).collect(),
            });
            start = end;
        }
        Ok(folds)
    }
}
