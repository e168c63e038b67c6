//! Monte Carlo confidence bands for the uniform p-value EDF
//!
//! Simulates `n_sim` samples of `N` uniform p-values, transforms each with
//! `-log10` and sorts it, then reads percentiles off every order statistic.
//! Because all percentiles of one order statistic come from the same sorted
//! column, the bands are nested by construction.

use std::fmt;

use ndarray::Array2;
use rand::distributions::{Distribution, Open01};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MonteCarloConfig;
use crate::edf::{expected_fraction, PvalueEdf};
use crate::error::{PvalueError, PvalueResult};

/// Percentile-width label of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BandLevel {
    /// 50th percentile
    Median,
    /// 16th to 84th percentile
    Sigma68,
    /// 5th to 95th percentile
    Percent90,
    /// 2.5th to 97.5th percentile
    Percent95,
}

impl BandLevel {
    pub const ALL: [BandLevel; 4] = [
        BandLevel::Median,
        BandLevel::Sigma68,
        BandLevel::Percent90,
        BandLevel::Percent95,
    ];

    /// Numeric label (50, 68, 90 or 95)
    pub fn label(&self) -> u8 {
        match self {
            BandLevel::Median => 50,
            BandLevel::Sigma68 => 68,
            BandLevel::Percent90 => 90,
            BandLevel::Percent95 => 95,
        }
    }

    /// Look a level up by its numeric label
    pub fn from_label(label: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }

    /// Cumulative fractions at which the order statistics are read
    pub fn fractions(&self) -> (f64, f64) {
        match self {
            BandLevel::Median => (0.50, 0.50),
            BandLevel::Sigma68 => (0.16, 0.84),
            BandLevel::Percent90 => (0.05, 0.95),
            BandLevel::Percent95 => (0.025, 0.975),
        }
    }
}

impl fmt::Display for BandLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lower and upper bound of a percentile band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Band {
    fn with_len(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Elementwise containment of another band
    pub fn contains(&self, inner: &Band) -> bool {
        self.lower.iter().zip(&inner.lower).all(|(o, i)| o <= i)
            && self.upper.iter().zip(&inner.upper).all(|(o, i)| o >= i)
    }
}

/// A band looked up by level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandCurve<'a> {
    Median(&'a [f64]),
    Interval(&'a Band),
}

/// Median and percentile bands of the transformed order statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBands {
    pub median: Vec<f64>,
    pub b68: Band,
    pub b90: Band,
    pub b95: Band,
}

impl ConfidenceBands {
    fn with_len(n: usize) -> Self {
        Self {
            median: vec![0.0; n],
            b68: Band::with_len(n),
            b90: Band::with_len(n),
            b95: Band::with_len(n),
        }
    }

    pub fn get(&self, level: BandLevel) -> BandCurve<'_> {
        match level {
            BandLevel::Median => BandCurve::Median(&self.median),
            BandLevel::Sigma68 => BandCurve::Interval(&self.b68),
            BandLevel::Percent90 => BandCurve::Interval(&self.b90),
            BandLevel::Percent95 => BandCurve::Interval(&self.b95),
        }
    }

    /// Look a band up by numeric label (50, 68, 90, 95)
    pub fn by_label(&self, label: u8) -> Option<BandCurve<'_>> {
        BandLevel::from_label(label).map(|level| self.get(level))
    }

    pub fn len(&self) -> usize {
        self.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }

    /// True when 95 ⊇ 90 ⊇ 68 ⊇ median at every position
    pub fn is_nested(&self) -> bool {
        let median_inside = self
            .median
            .iter()
            .enumerate()
            .all(|(j, m)| self.b68.lower[j] <= *m && *m <= self.b68.upper[j]);

        median_inside && self.b90.contains(&self.b68) && self.b95.contains(&self.b90)
    }
}

/// Monte Carlo estimate of the uniform EDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McUniformEdf {
    pub bands: ConfidenceBands,
    /// `(N - j) / N` for every order statistic
    pub expected_fraction: Vec<f64>,
    /// Smallest plottable y-value
    pub y_low_limit: f64,
}

/// Simulate the percentile bands of `n` uniform p-values
pub fn simulate_uniform_bands<R: Rng + ?Sized>(
    n: usize,
    n_sim: usize,
    rng: &mut R,
) -> PvalueResult<McUniformEdf> {
    if n == 0 {
        return Err(PvalueError::EmptySample);
    }
    if n_sim == 0 {
        return Err(PvalueError::InvalidInput(
            "number of simulations must be at least 1".to_string(),
        ));
    }

    let matrix = simulate_matrix(n, n_sim, rng)?;

    let mut bands = ConfidenceBands::with_len(n);
    let mut column = Vec::with_capacity(n_sim);
    for (j, values) in matrix.columns().into_iter().enumerate() {
        column.clear();
        column.extend(values.iter().copied());
        column.sort_by(f64::total_cmp);

        bands.median[j] = order_statistic(&column, 0.50);
        fill_band(&mut bands.b68, j, &column, BandLevel::Sigma68);
        fill_band(&mut bands.b90, j, &column, BandLevel::Percent90);
        fill_band(&mut bands.b95, j, &column, BandLevel::Percent95);
    }

    let expected_fraction = expected_fraction(n);
    let y_low_limit = expected_fraction
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);

    Ok(McUniformEdf {
        bands,
        expected_fraction,
        y_low_limit,
    })
}

/// `n_sim x n` matrix; row `i` holds one sorted simulated sample
fn simulate_matrix<R: Rng + ?Sized>(
    n: usize,
    n_sim: usize,
    rng: &mut R,
) -> PvalueResult<Array2<f64>> {
    let mut flat = Vec::with_capacity(n * n_sim);
    let mut row = Vec::with_capacity(n);
    for _ in 0..n_sim {
        row.clear();
        row.extend((0..n).map(|_| {
            let p: f64 = Open01.sample(rng);
            -p.log10()
        }));
        row.sort_by(f64::total_cmp);
        flat.extend_from_slice(&row);
    }

    Array2::from_shape_vec((n_sim, n), flat)
        .map_err(|e| PvalueError::InvalidInput(format!("simulation matrix: {}", e)))
}

fn fill_band(band: &mut Band, j: usize, sorted: &[f64], level: BandLevel) {
    let (lo, hi) = level.fractions();
    band.lower[j] = order_statistic(sorted, lo);
    band.upper[j] = order_statistic(sorted, hi);
}

/// Value at `floor(fraction * len)` of a sorted slice
fn order_statistic(sorted: &[f64], fraction: f64) -> f64 {
    let idx = (fraction * sorted.len() as f64) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

impl PvalueEdf {
    /// Monte Carlo uniform EDF, seeded from OS entropy
    pub fn mc_uniform_edf(&self, n_sim: usize) -> PvalueResult<McUniformEdf> {
        self.mc_uniform_edf_with_config(&MonteCarloConfig {
            n_sim,
            seed: None,
        })
    }

    /// Monte Carlo uniform EDF with simulation count and seed from config
    pub fn mc_uniform_edf_with_config(
        &self,
        config: &MonteCarloConfig,
    ) -> PvalueResult<McUniformEdf> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tracing::debug!(
            "Simulating {} uniform samples of size {} (seeded: {})",
            config.n_sim,
            self.len(),
            config.seed.is_some()
        );
        self.mc_uniform_edf_with_rng(config.n_sim, &mut rng)
    }

    /// Monte Carlo uniform EDF drawing from a caller-supplied generator
    pub fn mc_uniform_edf_with_rng<R: Rng + ?Sized>(
        &self,
        n_sim: usize,
        rng: &mut R,
    ) -> PvalueResult<McUniformEdf> {
        simulate_uniform_bands(self.len(), n_sim, rng)
    }
}
