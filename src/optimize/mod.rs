//! Parameter optimization request shaping
//!
//! The search itself runs in the analytics backend; this module only
//! builds what gets sent to it.

pub mod range_builder;

use serde::{Deserialize, Serialize};

pub use range_builder::{
    build, expand, is_optimizable, out_of_ui_bounds, validate, CandidateValueSet, MaCrossRanges,
    ParameterRanges, RangeIssue, RsiRanges,
};

/// Search algorithm requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    #[default]
    Grid,
    Genetic,
    MonteCarlo,
}

/// Objective the backend ranks candidates by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    Return,
    #[default]
    Sharpe,
    Drawdown,
    Custom,
}

/// The `optimization` block of an optimize request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSpec {
    pub method: OptimizationMethod,
    pub target_metric: TargetMetric,
    pub param_ranges: CandidateValueSet,
}
