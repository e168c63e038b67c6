//! pvalue-stats - EDF diagnostics and combination of p-values
//!
//! This crate provides two independent tools for multiple-hypothesis work:
//!
//! - **EDF**: the empirical distribution of observed p-values on a
//!   `-log10(p)` axis, with the analytic uniform expectation and Monte Carlo
//!   percentile bands (50, 68, 90, 95)
//! - **Combination**: Fisher, Good and Bhoj compounded p-values
//!
//! # Example
//!
//! ```
//! use pvalue_stats::{fisher_pvalue, PvalueEdf};
//!
//! let pvalues = [0.01, 0.2, 0.04, 0.7];
//! let edf = PvalueEdf::from_pvalues(&pvalues).unwrap();
//! assert_eq!(edf.hx().len(), pvalues.len() + 1);
//!
//! let combined = fisher_pvalue(&pvalues).unwrap();
//! assert!(combined > 0.0 && combined < 1.0);
//! ```
//!
//! Every result type is plain numeric vectors; rendering is left to the
//! caller. Warnings (Good-method instability, clamped Bhoj values) go
//! through `tracing`.

pub mod bands;
pub mod combine;
pub mod config;
pub mod edf;
pub mod error;
pub mod sample;

pub use bands::*;
pub use combine::*;
pub use config::*;
pub use edf::*;
pub use error::*;
pub use sample::*;
