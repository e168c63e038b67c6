//! Validated p-value samples and weights

use crate::error::{PvalueError, PvalueResult};

/// A non-empty sample of p-values, each in (0, 1]
#[derive(Debug, Clone, Copy)]
pub struct PvalueSample<'a> {
    values: &'a [f64],
}

impl<'a> PvalueSample<'a> {
    /// Validate a slice of p-values
    pub fn new(values: &'a [f64]) -> PvalueResult<Self> {
        if values.is_empty() {
            return Err(PvalueError::EmptySample);
        }

        // NaN fails both comparisons
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|&(_, &p)| !(p > 0.0 && p <= 1.0))
        {
            return Err(PvalueError::OutOfRange { index, value });
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Number of p-values (never zero)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `-log10(p)` for every value, in input order
    pub fn neg_log10(&self) -> Vec<f64> {
        self.values.iter().map(|p| -p.log10()).collect()
    }

    /// `sum(ln p)`, the log of the product of the sample
    pub fn ln_product(&self) -> f64 {
        self.values.iter().map(|p| p.ln()).sum()
    }
}

/// Positive weights matched one-to-one with a p-value sample
#[derive(Debug, Clone, Copy)]
pub struct Weights<'a> {
    values: &'a [f64],
}

impl<'a> Weights<'a> {
    /// Validate weights against the sample they belong to
    pub fn for_sample(values: &'a [f64], sample: &PvalueSample<'_>) -> PvalueResult<Self> {
        if values.len() != sample.len() {
            return Err(PvalueError::LengthMismatch {
                pvalues: sample.len(),
                weights: values.len(),
            });
        }

        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|&(_, &w)| !(w.is_finite() && w > 0.0))
        {
            return Err(PvalueError::InvalidWeight { index, value });
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First pair of indices holding equal weights, if any
    pub fn find_duplicate(&self) -> Option<(usize, usize)> {
        for (i, wi) in self.values.iter().enumerate() {
            for (offset, wj) in self.values[i + 1..].iter().enumerate() {
                if wi == wj {
                    return Some((i, i + 1 + offset));
                }
            }
        }
        None
    }
}
