//! Parameter range expansion
//!
//! Turns the min/max bounds entered on the optimization form into the
//! explicit candidate arrays the backend optimizer evaluates. Every
//! parameter has a fixed step; an absent bound falls back to the default
//! pair for that parameter. Expansion never fails and never yields an
//! empty sequence.

use crate::strategy::StrategyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Static description of one optimizable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRule {
    pub kind: StrategyKind,
    pub name: &'static str,
    pub step: i64,
    /// Bounds used when the form leaves either end empty
    pub default_bounds: (i64, i64),
    /// Input limits of the form widgets
    pub ui_bounds: (i64, i64),
}

pub const PARAM_RULES: [ParamRule; 5] = [
    ParamRule {
        kind: StrategyKind::MaCross,
        name: "short",
        step: 1,
        default_bounds: (5, 15),
        ui_bounds: (1, 50),
    },
    ParamRule {
        kind: StrategyKind::MaCross,
        name: "long",
        step: 5,
        default_bounds: (20, 50),
        ui_bounds: (10, 200),
    },
    ParamRule {
        kind: StrategyKind::Rsi,
        name: "period",
        step: 2,
        default_bounds: (7, 21),
        ui_bounds: (1, 50),
    },
    ParamRule {
        kind: StrategyKind::Rsi,
        name: "overbought",
        step: 5,
        default_bounds: (65, 80),
        ui_bounds: (50, 90),
    },
    ParamRule {
        kind: StrategyKind::Rsi,
        name: "oversold",
        step: 5,
        default_bounds: (20, 35),
        ui_bounds: (10, 50),
    },
];

/// Rules for the parameters of one strategy family
pub fn rules_for(kind: StrategyKind) -> impl Iterator<Item = &'static ParamRule> {
    PARAM_RULES.iter().filter(move |rule| rule.kind == kind)
}

/// Whether the family has anything to optimize
pub fn is_optimizable(kind: StrategyKind) -> bool {
    rules_for(kind).next().is_some()
}

/// Expand `min..=max` by `step`.
///
/// Yields `floor((max - min) / step) + 1` values starting at `min`. When
/// `max < min`, the step is not positive or the span does not fit in an
/// `i64`, the result is `[min]`.
pub fn expand(min: i64, max: i64, step: i64) -> Vec<i64> {
    if max < min || step <= 0 {
        return vec![min];
    }

    let count = max
        .checked_sub(min)
        .and_then(|span| span.checked_div(step))
        .and_then(|n| n.checked_add(1));
    let Some(count) = count else {
        return vec![min];
    };

    // min + i * step <= max for every i < count
    (0..count).map(|i| min + i * step).collect()
}

/// Moving-average crossover bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossRanges {
    pub short_min: Option<i64>,
    pub short_max: Option<i64>,
    pub long_min: Option<i64>,
    pub long_max: Option<i64>,
}

/// RSI bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiRanges {
    pub period_min: Option<i64>,
    pub period_max: Option<i64>,
    pub overbought_min: Option<i64>,
    pub overbought_max: Option<i64>,
    pub oversold_min: Option<i64>,
    pub oversold_max: Option<i64>,
}

/// Bounds for every family, as kept by the optimization form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRanges {
    pub ma: MaCrossRanges,
    pub rsi: RsiRanges,
}

impl ParameterRanges {
    /// Raw (possibly absent) bounds of one parameter
    fn raw_bounds(&self, rule: &ParamRule) -> (Option<i64>, Option<i64>) {
        match (rule.kind, rule.name) {
            (StrategyKind::MaCross, "short") => (self.ma.short_min, self.ma.short_max),
            (StrategyKind::MaCross, "long") => (self.ma.long_min, self.ma.long_max),
            (StrategyKind::Rsi, "period") => (self.rsi.period_min, self.rsi.period_max),
            (StrategyKind::Rsi, "overbought") => (self.rsi.overbought_min, self.rsi.overbought_max),
            (StrategyKind::Rsi, "oversold") => (self.rsi.oversold_min, self.rsi.oversold_max),
            _ => (None, None),
        }
    }

    /// Effective bounds of one parameter; a missing end swaps in the default pair
    pub fn bounds(&self, rule: &ParamRule) -> (i64, i64) {
        match self.raw_bounds(rule) {
            (Some(min), Some(max)) => (min, max),
            _ => rule.default_bounds,
        }
    }
}

/// Candidate sequences keyed by parameter name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateValueSet(BTreeMap<String, Vec<i64>>);

impl CandidateValueSet {
    pub fn get(&self, param: &str) -> Option<&[i64]> {
        self.0.get(param).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<i64>)> {
        self.0.iter()
    }

    /// Size of the full grid (product of sequence lengths), 0 when empty
    pub fn combination_count(&self) -> usize {
        if self.0.is_empty() {
            return 0;
        }
        self.0.values().map(Vec::len).product()
    }
}

/// Expand the form bounds of `kind` into candidate arrays.
///
/// Only the parameters of `kind` appear in the result; families without
/// optimizable parameters produce an empty set.
pub fn build(kind: StrategyKind, ranges: &ParameterRanges) -> CandidateValueSet {
    let candidates = rules_for(kind)
        .map(|rule| {
            let (min, max) = ranges.bounds(rule);
            (rule.name.to_string(), expand(min, max, rule.step))
        })
        .collect();

    CandidateValueSet(candidates)
}

/// A bound that the form should not have accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeIssue {
    pub param: &'static str,
    pub message: String,
}

/// Effective bounds that fall outside the form widget limits.
///
/// These are the only issues a submit refuses; everything else `validate`
/// reports is tolerated by `build`.
pub fn out_of_ui_bounds(kind: StrategyKind, ranges: &ParameterRanges) -> Vec<RangeIssue> {
    let mut issues = Vec::new();

    for rule in rules_for(kind) {
        let (min, max) = ranges.bounds(rule);
        let (lo, hi) = rule.ui_bounds;

        for value in [min, max] {
            if value < lo || value > hi {
                issues.push(RangeIssue {
                    param: rule.name,
                    message: format!("{} value {} outside {}..={}", rule.name, value, lo, hi),
                });
            }
        }
    }

    issues
}

/// Check effective bounds against the form limits and ordering rules.
///
/// Informational: `build` tolerates every issue reported here.
pub fn validate(kind: StrategyKind, ranges: &ParameterRanges) -> Vec<RangeIssue> {
    let mut issues = Vec::new();

    for rule in rules_for(kind) {
        let (min, max) = ranges.bounds(rule);
        if min > max {
            issues.push(RangeIssue {
                param: rule.name,
                message: format!("{} minimum {} exceeds maximum {}", rule.name, min, max),
            });
        }
    }
    issues.extend(out_of_ui_bounds(kind, ranges));

    let bounds_of = |name: &str| rules_for(kind).find(|r| r.name == name).map(|r| ranges.bounds(r));
    match kind {
        StrategyKind::MaCross => {
            // The backend skips every pair with short >= long
            if let (Some((short_min, _)), Some((_, long_max))) =
                (bounds_of("short"), bounds_of("long"))
            {
                if short_min >= long_max {
                    issues.push(RangeIssue {
                        param: "long",
                        message: format!(
                            "no short period below long period: short minimum {} is not below long maximum {}",
                            short_min, long_max
                        ),
                    });
                }
            }
        }
        StrategyKind::Rsi => {
            if let (Some((_, oversold_max)), Some((overbought_min, _))) =
                (bounds_of("oversold"), bounds_of("overbought"))
            {
                if oversold_max >= overbought_min {
                    issues.push(RangeIssue {
                        param: "oversold",
                        message: format!(
                            "oversold maximum {} must be below overbought minimum {}",
                            oversold_max, overbought_min
                        ),
                    });
                }
            }
        }
        _ => {}
    }

    issues
}
