//! Empirical distribution function of p-values
//!
//! The observed p-values are plotted on a `-log10(p)` axis against the
//! fraction of the sample that is at least that significant. Under the null
//! hypothesis the p-values are uniform on (0, 1], so the expected curve is
//! simply `y = 10^(-x)`.
//!
//! # Curve layout
//!
//! - `hx`: ascending `-log10(p)`, followed by one synthetic point
//! - `hy`: survival fraction `(N - i) / N`, followed by one synthetic point
//!
//! The synthetic trailing point only keeps the plotted step from stopping
//! abruptly; it is never fed back into any statistic.

use serde::{Deserialize, Serialize};

use crate::config::EdfConfig;
use crate::error::{PvalueError, PvalueResult};
use crate::sample::PvalueSample;

/// An (x, y) curve with equal-length coordinate vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdfCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl EdfCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Get points for plotting (x, y pairs)
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

/// EDF of an observed p-value sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvalueEdf {
    /// Sorted `-log10(p)` plus the synthetic point
    hx: Vec<f64>,
    /// Survival fraction plus the synthetic point
    hy: Vec<f64>,
    /// Number of samples
    n: usize,
    config: EdfConfig,
}

impl PvalueEdf {
    /// Build the EDF from observed p-values
    ///
    /// Time complexity: O(n log n) for sorting
    pub fn from_pvalues(pvalues: &[f64]) -> PvalueResult<Self> {
        Self::with_config(pvalues, EdfConfig::default())
    }

    /// Build the EDF with explicit curve settings
    pub fn with_config(pvalues: &[f64], config: EdfConfig) -> PvalueResult<Self> {
        if !(config.synthetic_offset.is_finite() && config.synthetic_offset > 0.0) {
            return Err(PvalueError::InvalidInput(format!(
                "synthetic offset must be positive, got {}",
                config.synthetic_offset
            )));
        }

        let sample = PvalueSample::new(pvalues)?;
        let n = sample.len();

        let mut hx = sample.neg_log10();
        hx.sort_by(f64::total_cmp);

        let mut hy: Vec<f64> = (0..n).map(|i| (n - i) as f64 / n as f64).collect();

        // Extra point so the last step is drawn
        let last = hx[n - 1];
        hx.push(last + config.synthetic_offset);
        hy.push(synthetic_floor(n));

        tracing::debug!("Built p-value EDF over {} samples", n);

        Ok(Self { hx, hy, n, config })
    }

    /// Observed x-axis values (`-log10 p`, ascending, plus synthetic point)
    pub fn hx(&self) -> &[f64] {
        &self.hx
    }

    /// Observed y-axis values (survival fraction, plus synthetic point)
    pub fn hy(&self) -> &[f64] {
        &self.hy
    }

    /// The observed curve as an owned pair
    pub fn curve(&self) -> EdfCurve {
        EdfCurve {
            x: self.hx.clone(),
            y: self.hy.clone(),
        }
    }

    /// Sorted `-log10 p` without the synthetic point
    pub fn real_x(&self) -> &[f64] {
        &self.hx[..self.n]
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.n
    }

    /// Check if the EDF is empty (never true for a constructed EDF)
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn config(&self) -> &EdfConfig {
        &self.config
    }

    /// Analytic uniform EDF using the configured extension length
    pub fn uniform_edf_with_defaults(&self) -> PvalueResult<EdfCurve> {
        self.uniform_edf(self.config.extra_leg)
    }

    /// Analytic EDF expected under H0: `y = 10^(-x)`
    ///
    /// The x-axis is the observed `hx` followed by `extra_leg` points spaced
    /// at the step between the last two observed values, so the expected line
    /// runs past the observed data on a plot.
    pub fn uniform_edf(&self, extra_leg: usize) -> PvalueResult<EdfCurve> {
        let step = self.tail_step()?;
        let last = self.hx[self.hx.len() - 1];

        let mut x = Vec::with_capacity(self.hx.len() + extra_leg);
        x.extend_from_slice(&self.hx);
        x.extend((1..=extra_leg).map(|k| last + k as f64 * step));

        let y = x.iter().map(|v| 10f64.powf(-v)).collect();

        Ok(EdfCurve { x, y })
    }

    /// Spacing used to extend the analytic curve
    ///
    /// Gap between the last two real points; ties fall back to the last
    /// positive gap further down the sample.
    fn tail_step(&self) -> PvalueResult<f64> {
        let real = self.real_x();
        let mut gaps = real.windows(2).rev().map(|w| w[1] - w[0]);

        match gaps.next() {
            Some(gap) if gap > 0.0 => Ok(gap),
            Some(_) => match gaps.find(|gap| *gap > 0.0) {
                Some(gap) => {
                    tracing::warn!(
                        "Tied p-values at the tail of the sample, extending with step {}",
                        gap
                    );
                    Ok(gap)
                }
                None => Err(PvalueError::UndefinedStep { size: self.n }),
            },
            None => Err(PvalueError::UndefinedStep { size: self.n }),
        }
    }
}

/// y-value of the synthetic point: one decade below the smallest real step
///
/// `10^-(d + 1)` where `d` is the number of decimal digits of `n`.
fn synthetic_floor(n: usize) -> f64 {
    let digits = n.to_string().len() as i32;
    10f64.powi(-(digits + 1))
}

/// Expected survival fractions `(N - j) / N` for `j` in `0..N`
pub fn expected_fraction(n: usize) -> Vec<f64> {
    (0..n).map(|j| (n - j) as f64 / n as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edf_basic() {
        let data = vec![0.1, 0.01, 1.0, 0.001];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();

        assert_eq!(edf.len(), 4);
        assert_eq!(edf.hx().len(), 5);
        assert_eq!(edf.hy().len(), 5);

        let expected_x = [0.0, 1.0, 2.0, 3.0];
        for (got, want) in edf.real_x().iter().zip(expected_x) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(&edf.hy()[..4], &[1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn test_synthetic_point() {
        let data = vec![0.5, 0.05];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();

        let hx = edf.hx();
        assert!((hx[2] - hx[1] - 1e-6).abs() < 1e-12);
        // N = 2 has one digit
        assert!((edf.hy()[2] - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_synthetic_floor() {
        let cases = [(1usize, 1e-2), (9, 1e-2), (10, 1e-3), (12345, 1e-6)];
        for (n, want) in cases {
            assert!((synthetic_floor(n) - want).abs() < want * 1e-12);
        }
    }

    #[test]
    fn test_synthetic_point_is_below_last_fraction() {
        for n in [1usize, 9, 10, 99, 100, 1000] {
            assert!(synthetic_floor(n) < 1.0 / n as f64);
        }
    }

    #[test]
    fn test_edf_empty() {
        assert_eq!(
            PvalueEdf::from_pvalues(&[]).unwrap_err(),
            PvalueError::EmptySample
        );
    }

    #[test]
    fn test_edf_rejects_zero() {
        let data = vec![0.5, 0.0];
        assert!(matches!(
            PvalueEdf::from_pvalues(&data),
            Err(PvalueError::OutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn test_uniform_edf_length_and_values() {
        let data = vec![0.5, 0.1, 0.01];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();
        let curve = edf.uniform_edf(10).unwrap();

        assert_eq!(curve.len(), edf.hx().len() + 10);
        for (x, y) in curve.points() {
            assert!((y - 10f64.powf(-x)).abs() < 1e-12);
        }
        // Extension keeps the gap of the last two real points
        let step = 2.0 - 1.0;
        let n = curve.x.len();
        assert!((curve.x[n - 1] - curve.x[n - 2] - step).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_edf_zero_extension() {
        let data = vec![0.5, 0.1];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();
        let curve = edf.uniform_edf(0).unwrap();
        assert_eq!(curve.x, edf.hx());
    }

    #[test]
    fn test_uniform_edf_tied_tail_uses_earlier_gap() {
        let data = vec![0.1, 0.001, 0.001];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();
        let curve = edf.uniform_edf(1).unwrap();

        let last = curve.x[curve.x.len() - 1];
        let prev = curve.x[curve.x.len() - 2];
        assert!((last - prev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_edf_undefined_step() {
        let single = PvalueEdf::from_pvalues(&[0.2]).unwrap();
        assert_eq!(
            single.uniform_edf(5).unwrap_err(),
            PvalueError::UndefinedStep { size: 1 }
        );

        let tied = PvalueEdf::from_pvalues(&[0.3, 0.3, 0.3]).unwrap();
        assert_eq!(
            tied.uniform_edf(5).unwrap_err(),
            PvalueError::UndefinedStep { size: 3 }
        );
    }

    #[test]
    fn test_uniform_edf_with_defaults() {
        let data = vec![0.9, 0.2, 0.04];
        let edf = PvalueEdf::from_pvalues(&data).unwrap();
        let curve = edf.uniform_edf_with_defaults().unwrap();
        assert_eq!(curve.len(), 4 + 1000);
    }

    #[test]
    fn test_bad_offset_rejected() {
        let config = EdfConfig {
            synthetic_offset: 0.0,
            ..EdfConfig::default()
        };
        assert!(PvalueEdf::with_config(&[0.5], config)
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn test_expected_fraction() {
        assert_eq!(expected_fraction(4), vec![1.0, 0.75, 0.5, 0.25]);
        assert!(expected_fraction(0).is_empty());
    }
}
