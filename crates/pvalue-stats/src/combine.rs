//! Compounded p-values
//!
//! Combines the p-values of several independent tests into one:
//!
//! - **Fisher**: equal weights, `-2 Σ ln p` is chi-squared with `2k` dof
//! - **Good**: Fisher generalised to distinct positive weights
//! - **Bhoj**: weighted combination through a mixture of gamma CDFs
//!
//! # Good-method stability
//!
//! Good's closed form divides by `Π_{j≠i} (w_i - w_j)`. Equal weights make
//! this singular, and beyond five p-values the alternating terms cancel so
//! badly that the result is unreliable or NaN. Equal weights are rejected;
//! large inputs are computed anyway and logged as a warning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Gamma};
use statrs::function::factorial::ln_factorial;

use crate::config::GoodConfig;
use crate::error::{PvalueError, PvalueResult};
use crate::sample::{PvalueSample, Weights};

/// Available combination methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMethod {
    Fisher,
    Good,
    Bhoj,
}

impl CombinationMethod {
    /// Whether the method needs per-p-value weights
    pub fn requires_weights(&self) -> bool {
        !matches!(self, CombinationMethod::Fisher)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationMethod::Fisher => "fisher",
            CombinationMethod::Good => "good",
            CombinationMethod::Bhoj => "bhoj",
        }
    }
}

impl fmt::Display for CombinationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombinationMethod {
    type Err = PvalueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fisher" => Ok(CombinationMethod::Fisher),
            "good" => Ok(CombinationMethod::Good),
            "bhoj" => Ok(CombinationMethod::Bhoj),
            other => Err(PvalueError::InvalidInput(format!(
                "unknown combination method '{}'",
                other
            ))),
        }
    }
}

/// Combine p-values with the given method
///
/// Fisher ignores `weights`; Good and Bhoj fail with `MissingWeights`
/// when none are given.
pub fn combine(
    method: CombinationMethod,
    pvalues: &[f64],
    weights: Option<&[f64]>,
) -> PvalueResult<f64> {
    match (method, weights) {
        (CombinationMethod::Fisher, _) => fisher_pvalue(pvalues),
        (CombinationMethod::Good, Some(w)) => good_pvalue(pvalues, w),
        (CombinationMethod::Bhoj, Some(w)) => bhoj_pvalue(pvalues, w),
        (method, None) => Err(PvalueError::MissingWeights {
            method: method.to_string(),
        }),
    }
}

/// Fisher's combined p-value
///
/// `Σ_{i=0}^{k-1} T (-ln T)^i / i!` with `T = Π p`, the survival function of
/// a chi-squared variable with `2k` degrees of freedom at `-2 ln T`.
pub fn fisher_pvalue(pvalues: &[f64]) -> PvalueResult<f64> {
    let sample = PvalueSample::new(pvalues)?;

    // ln T from a sum of logs; the raw product underflows for many small p
    let logtt = -sample.ln_product();
    if logtt == 0.0 {
        // Every p is 1: only the i = 0 term survives
        return Ok(1.0);
    }

    // ln(T logtt^i / i!) per term, summed in log space so i! never overflows
    let ln_logtt = logtt.ln();
    let ln_terms: Vec<f64> = (0..sample.len())
        .map(|i| -logtt + i as f64 * ln_logtt - ln_factorial(i as u64))
        .collect();

    let max = ln_terms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total = max.exp() * ln_terms.iter().map(|t| (t - max).exp()).sum::<f64>();

    Ok(total.min(1.0))
}

/// Good's weighted combined p-value
///
/// Requires pairwise distinct weights. Results for more than
/// `GoodConfig::max_stable_size` p-values are numerically unreliable.
pub fn good_pvalue(pvalues: &[f64], weights: &[f64]) -> PvalueResult<f64> {
    good_pvalue_with_config(pvalues, weights, &GoodConfig::default())
}

/// Good's combined p-value with an explicit stability threshold
pub fn good_pvalue_with_config(
    pvalues: &[f64],
    weights: &[f64],
    config: &GoodConfig,
) -> PvalueResult<f64> {
    let sample = PvalueSample::new(pvalues)?;
    let weights = Weights::for_sample(weights, &sample)?;

    if let Some((first, second)) = weights.find_duplicate() {
        return Err(PvalueError::SingularWeights { first, second });
    }

    let k = sample.len();
    if k > config.max_stable_size {
        tracing::warn!(
            "Good method combining {} p-values (stable up to {}); result may be unreliable",
            k,
            config.max_stable_size
        );
    }

    let w = weights.values();
    // ln TT = Σ w_i ln p_i
    let ln_tt: f64 = w
        .iter()
        .zip(sample.values())
        .map(|(wi, p)| wi * p.ln())
        .sum();

    let mut total = 0.0;
    for (i, &wi) in w.iter().enumerate() {
        let cross: f64 = w
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &wj)| wi - wj)
            .product();

        total += wi.powi(k as i32 - 1) / cross * (ln_tt / wi).exp();
    }

    Ok(total)
}

/// Bhoj's weighted combined p-value
///
/// `1 - Σ w_i · GammaCDF(-Σ w_j ln p_j; shape 1/w_i, scale w_i)`.
/// The raw expression leaves [0, 1] for weights that do not sum to one;
/// the result is clamped into [0, 1].
pub fn bhoj_pvalue(pvalues: &[f64], weights: &[f64]) -> PvalueResult<f64> {
    let sample = PvalueSample::new(pvalues)?;
    let weights = Weights::for_sample(weights, &sample)?;
    let w = weights.values();

    let log_tt: f64 = w
        .iter()
        .zip(sample.values())
        .map(|(wi, p)| wi * p.ln())
        .sum();
    let x = -log_tt;

    let mut mixture = 0.0;
    for &wi in w {
        // statrs takes a rate, the inverse of the scale
        let gamma = Gamma::new(1.0 / wi, 1.0 / wi)
            .map_err(|e| PvalueError::Distribution(e.to_string()))?;
        mixture += wi * gamma.cdf(x);
    }

    let raw = 1.0 - mixture;
    if !(0.0..=1.0).contains(&raw) {
        tracing::warn!(
            "Bhoj p-value {} outside [0, 1] (weights sum to {}), clamping",
            raw,
            w.iter().sum::<f64>()
        );
    }

    Ok(raw.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fisher_ones() {
        assert_eq!(fisher_pvalue(&[1.0, 1.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_fisher_two_values() {
        // T = 0.0025, -ln T = 5.9915; 0.0025 * (1 + 5.9915)
        let p = fisher_pvalue(&[0.05, 0.05]).unwrap();
        assert!((p - 0.0025 * (1.0 - 0.0025_f64.ln())).abs() < 1e-12);
        assert!(p < 0.05);
    }

    #[test]
    fn test_fisher_single_value() {
        assert!((fisher_pvalue(&[0.3]).unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_fisher_many_values_stays_finite() {
        let pvalues = vec![1e-3; 400];
        let p = fisher_pvalue(&pvalues).unwrap();
        assert!(p.is_finite());
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_fisher_rejects_zero() {
        assert!(matches!(
            fisher_pvalue(&[0.5, 0.0]),
            Err(PvalueError::OutOfRange { index: 1, .. })
        ));
    }

    #[test]
    fn test_good_distinct_weights() {
        let p = good_pvalue(&[0.5, 0.5], &[1.0, 2.0]).unwrap();
        // -0.125 + 2 * sqrt(0.125)
        assert!(p.is_finite());
        assert!((p - (2.0 * 0.125_f64.sqrt() - 0.125)).abs() < 1e-12);
    }

    #[test]
    fn test_good_three_weights() {
        // TT = 1/64; cross products 2, -1, 2
        // 1/2 * 1/64 - 4 * 1/8 + 9/2 * 1/4 = 81/128
        let p = good_pvalue(&[0.5, 0.5, 0.5], &[1.0, 2.0, 3.0]).unwrap();
        assert!((p - 81.0 / 128.0).abs() < 1e-12, "good {}", p);
    }

    #[test]
    fn test_good_equal_weights() {
        assert_eq!(
            good_pvalue(&[0.5, 0.5], &[1.0, 1.0]).unwrap_err(),
            PvalueError::SingularWeights {
                first: 0,
                second: 1
            }
        );
    }

    #[test]
    fn test_good_single_value() {
        assert!((good_pvalue(&[0.2], &[3.0]).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_good_large_input_still_returns() {
        let pvalues = vec![0.5; 6];
        let weights = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(good_pvalue(&pvalues, &weights).is_ok());
    }

    #[test]
    fn test_good_length_mismatch() {
        let err = good_pvalue(&[0.5, 0.5], &[1.0]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_bhoj_in_unit_interval() {
        let p = bhoj_pvalue(&[0.5, 0.5], &[1.0, 1.0]).unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_bhoj_single_value() {
        // Gamma(1, 1) is exponential: 1 - (1 - p) = p
        assert!((bhoj_pvalue(&[0.3], &[1.0]).unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_bhoj_normalised_weights() {
        // Gamma(2, scale 0.5) at ln 2: 1 - e^{-2 ln 2}(1 + 2 ln 2)
        let p = bhoj_pvalue(&[0.5, 0.5], &[0.5, 0.5]).unwrap();
        let x = 2f64.ln();
        let cdf = 1.0 - (-2.0 * x).exp() * (1.0 + 2.0 * x);
        assert!((p - (1.0 - cdf)).abs() < 1e-9);
    }

    #[test]
    fn test_bhoj_all_ones() {
        let p = bhoj_pvalue(&[1.0, 1.0], &[0.5, 0.5]).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_combine_dispatch() {
        let pvalues = [0.2, 0.4];
        assert_eq!(
            combine(CombinationMethod::Fisher, &pvalues, None).unwrap(),
            fisher_pvalue(&pvalues).unwrap()
        );
        assert_eq!(
            combine(CombinationMethod::Good, &pvalues, Some(&[1.0, 2.0][..])).unwrap(),
            good_pvalue(&pvalues, &[1.0, 2.0]).unwrap()
        );
        assert_eq!(
            combine(CombinationMethod::Bhoj, &pvalues, None).unwrap_err(),
            PvalueError::MissingWeights {
                method: "bhoj".to_string()
            }
        );
    }

    #[test]
    fn test_method_parse() {
        let fisher: CombinationMethod = "Fisher".parse().unwrap();
        let bhoj: CombinationMethod = " bhoj ".parse().unwrap();
        assert_eq!(fisher, CombinationMethod::Fisher);
        assert_eq!(bhoj, CombinationMethod::Bhoj);
        assert!("stouffer".parse::<CombinationMethod>().is_err());
        assert!(CombinationMethod::Good.requires_weights());
        assert!(!CombinationMethod::Fisher.requires_weights());
    }
}
