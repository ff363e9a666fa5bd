//! Strategy descriptors
//!
//! A strategy is a closed set of families, each with its own parameter
//! record. On the wire (backend requests and persisted slots) a strategy is
//! `{"type": "<family>", "params": {...}}`. Missing parameters take the
//! family defaults and unknown parameters are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Loose parameter mapping, as returned by the optimizer
pub type ParamMap = Map<String, Value>;

/// Strategy family identifier (the `type` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MaCross,
    Rsi,
    KdCross,
    Macd,
    Bollinger,
    Multi,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::MaCross,
        StrategyKind::Rsi,
        StrategyKind::KdCross,
        StrategyKind::Macd,
        StrategyKind::Bollinger,
        StrategyKind::Multi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MaCross => "ma_cross",
            StrategyKind::Rsi => "rsi",
            StrategyKind::KdCross => "kd_cross",
            StrategyKind::Macd => "macd",
            StrategyKind::Bollinger => "bollinger",
            StrategyKind::Multi => "multi",
        }
    }

    /// Human readable name shown on the result page
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::MaCross => "Moving Average Crossover",
            StrategyKind::Rsi => "RSI Overbought/Oversold",
            StrategyKind::KdCross => "KD Crossover",
            StrategyKind::Macd => "MACD Crossover",
            StrategyKind::Bollinger => "Bollinger Band Breakout",
            StrategyKind::Multi => "Multi-Indicator Combination",
        }
    }

    /// Indicators preselected when the family is chosen on the strategy form
    pub fn default_indicators(&self) -> &'static [IndicatorKind] {
        match self {
            StrategyKind::MaCross => &[IndicatorKind::Ma],
            StrategyKind::Rsi => &[IndicatorKind::Rsi],
            StrategyKind::KdCross => &[IndicatorKind::Kd],
            StrategyKind::Macd => &[IndicatorKind::Macd],
            StrategyKind::Bollinger => &[IndicatorKind::Bollinger],
            StrategyKind::Multi => &[],
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown strategy type: {}", s))
    }
}

/// Indicator families understood by the backend indicator endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Ma,
    Ema,
    Rsi,
    Macd,
    Bollinger,
    Kd,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossParams {
    pub short: u32,
    pub long: u32,
}

impl Default for MaCrossParams {
    fn default() -> Self {
        Self { short: 5, long: 20 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: u32,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdCrossParams {
    pub k_period: u32,
    pub d_period: u32,
    pub slowing: u32,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for KdCrossParams {
    fn default() -> Self {
        Self {
            k_period: 9,
            d_period: 3,
            slowing: 3,
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,
    pub use_histogram: bool,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            use_histogram: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerParams {
    pub period: u32,
    /// Band width in standard deviations
    pub std: f64,
    pub use_middle: bool,
    pub use_squeeze: bool,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            std: 2.0,
            use_middle: false,
            use_squeeze: false,
        }
    }
}

/// How the signals of a multi-indicator strategy are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineLogic {
    #[default]
    And,
    Or,
    Majority,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiParams {
    pub logic: CombineLogic,
    pub indicators: Vec<IndicatorKind>,
}

/// A strategy family together with its concrete parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum StrategyDescriptor {
    MaCross(MaCrossParams),
    Rsi(RsiParams),
    KdCross(KdCrossParams),
    Macd(MacdParams),
    Bollinger(BollingerParams),
    Multi(MultiParams),
}

impl StrategyDescriptor {
    /// Family defaults
    pub fn with_defaults(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::MaCross => StrategyDescriptor::MaCross(MaCrossParams::default()),
            StrategyKind::Rsi => StrategyDescriptor::Rsi(RsiParams::default()),
            StrategyKind::KdCross => StrategyDescriptor::KdCross(KdCrossParams::default()),
            StrategyKind::Macd => StrategyDescriptor::Macd(MacdParams::default()),
            StrategyKind::Bollinger => StrategyDescriptor::Bollinger(BollingerParams::default()),
            StrategyKind::Multi => StrategyDescriptor::Multi(MultiParams::default()),
        }
    }

    /// Build a descriptor from a loose parameter mapping.
    ///
    /// Keys the family does not know are dropped, missing keys take the
    /// family default. Values of the wrong shape are an error.
    pub fn from_params(kind: StrategyKind, params: &ParamMap) -> serde_json::Result<Self> {
        let mut tagged = Map::new();
        tagged.insert("type".to_string(), Value::String(kind.as_str().to_string()));
        tagged.insert("params".to_string(), Value::Object(params.clone()));
        serde_json::from_value(Value::Object(tagged))
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyDescriptor::MaCross(_) => StrategyKind::MaCross,
            StrategyDescriptor::Rsi(_) => StrategyKind::Rsi,
            StrategyDescriptor::KdCross(_) => StrategyKind::KdCross,
            StrategyDescriptor::Macd(_) => StrategyKind::Macd,
            StrategyDescriptor::Bollinger(_) => StrategyKind::Bollinger,
            StrategyDescriptor::Multi(_) => StrategyKind::Multi,
        }
    }

    /// `key=value` pairs for display, sorted by key
    pub fn param_summary(&self) -> String {
        let value = match self {
            StrategyDescriptor::MaCross(p) => serde_json::to_value(p),
            StrategyDescriptor::Rsi(p) => serde_json::to_value(p),
            StrategyDescriptor::KdCross(p) => serde_json::to_value(p),
            StrategyDescriptor::Macd(p) => serde_json::to_value(p),
            StrategyDescriptor::Bollinger(p) => serde_json::to_value(p),
            StrategyDescriptor::Multi(p) => serde_json::to_value(p),
        };

        match value {
            Ok(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        }
    }
}

impl Default for StrategyDescriptor {
    fn default() -> Self {
        StrategyDescriptor::with_defaults(StrategyKind::MaCross)
    }
}

/// The `{type}` only strategy reference sent with optimization requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRef {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let descriptor = StrategyDescriptor::Rsi(RsiParams {
            period: 10,
            overbought: 75.0,
            oversold: 25.0,
        });
        let value = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(value["type"], "rsi");
        assert_eq!(value["params"]["period"], 10);
        assert_eq!(value["params"]["overbought"], 75.0);
    }

    #[test]
    fn test_missing_params_take_defaults() {
        let descriptor: StrategyDescriptor =
            serde_json::from_value(json!({"type": "ma_cross", "params": {"short": 8}})).unwrap();
        assert_eq!(
            descriptor,
            StrategyDescriptor::MaCross(MaCrossParams { short: 8, long: 20 })
        );
    }

    #[test]
    fn test_extra_params_ignored() {
        let params = json!({"period": 9, "overbought": 80, "oversold": 20, "medium": 10});
        let descriptor =
            StrategyDescriptor::from_params(StrategyKind::Rsi, params.as_object().unwrap()).unwrap();

        assert_eq!(
            descriptor,
            StrategyDescriptor::Rsi(RsiParams {
                period: 9,
                overbought: 80.0,
                oversold: 20.0,
            })
        );
    }

    #[test]
    fn test_wrong_value_shape_is_error() {
        let params = json!({"short": "five"});
        let result = StrategyDescriptor::from_params(StrategyKind::MaCross, params.as_object().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<StrategyDescriptor, _> =
            serde_json::from_value(json!({"type": "turtle", "params": {}}));
        assert!(result.is_err());
        assert!("turtle".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_kind_round_trip_through_str() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(StrategyDescriptor::with_defaults(kind).kind(), kind);
        }
    }

    #[test]
    fn test_param_summary() {
        let summary = StrategyDescriptor::default().param_summary();
        assert_eq!(summary, "long=20, short=5");
    }

    #[test]
    fn test_multi_defaults_to_and() {
        let descriptor = StrategyDescriptor::from_params(StrategyKind::Multi, &ParamMap::new()).unwrap();
        assert_eq!(descriptor, StrategyDescriptor::Multi(MultiParams::default()));
        assert_eq!(StrategyKind::Multi.default_indicators().len(), 0);
    }
}
