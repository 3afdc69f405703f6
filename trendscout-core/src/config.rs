//! Engine configuration: thresholds and windows for every pipeline stage.
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs to name
//! the values it overrides. `validate()` rejects settings the stages cannot
//! work with before any series is touched.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::{PriceField, VolumeField};
use crate::strategy::StrategyKind;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub trend: TrendConfig,
    pub signals: SignalConfig,
    pub strategy: StrategyConfig,
    pub profit: ProfitConfig,
}

impl EngineConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.trend.validate()?;
        self.signals.validate()?;
        self.strategy.validate()?;
        self.profit.validate()?;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Indicator windows and column selectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Moving-average periods, strictly ascending.
    pub ma_periods: Vec<usize>,
    /// Look-back used for MA slope.
    pub slope_window: usize,
    pub atr_period: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    /// Bars per year for the lagged annual return.
    pub annual_period: usize,
    /// MA density (%) below which a bar counts as dense.
    pub dense_threshold_pct: f64,
    pub high_volume_ratio: f64,
    pub low_volume_ratio: f64,
    pub price_field: PriceField,
    pub volume_field: VolumeField,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ma_periods: vec![20, 60, 120],
            slope_window: 5,
            atr_period: 14,
            volume_short: 5,
            volume_long: 60,
            annual_period: 252,
            dense_threshold_pct: 5.0,
            high_volume_ratio: 1.5,
            low_volume_ratio: 0.5,
            price_field: PriceField::Close,
            volume_field: VolumeField::Volume,
        }
    }
}

impl IndicatorConfig {
    /// Longest configured MA period.
    pub fn max_period(&self) -> usize {
        self.ma_periods.iter().copied().max().unwrap_or(0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ma_periods.is_empty() {
            return Err(invalid("indicators.ma_periods must not be empty"));
        }
        if self.ma_periods.contains(&0) {
            return Err(invalid("indicators.ma_periods must be >= 1"));
        }
        if self.ma_periods.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "indicators.ma_periods must be strictly ascending, got {:?}",
                self.ma_periods
            )));
        }
        if self.slope_window == 0 || self.atr_period == 0 || self.annual_period == 0 {
            return Err(invalid(
                "indicators.slope_window, atr_period and annual_period must be >= 1",
            ));
        }
        if self.volume_short == 0 || self.volume_long == 0 {
            return Err(invalid("indicators volume periods must be >= 1"));
        }
        if self.dense_threshold_pct <= 0.0 {
            return Err(invalid("indicators.dense_threshold_pct must be > 0"));
        }
        if self.low_volume_ratio >= self.high_volume_ratio {
            return Err(invalid(
                "indicators.low_volume_ratio must be below high_volume_ratio",
            ));
        }
        Ok(())
    }
}

/// How the protective stop is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLossMethod {
    /// Stop at the shortest moving average still below the price.
    #[default]
    Ma,
    /// Stop two ATRs below the entry.
    Atr,
    /// Fixed 5% below the entry.
    Percentage,
    /// Under the low of a reversal structure. Placed by the reversal
    /// playbook; not selectable as the classifier's method.
    Structure,
}

/// Trend classification thresholds. Returns are fractions (0.8 = 80%).
///
/// Density gating uses `indicators.dense_threshold_pct` through the
/// enriched series, so every stage agrees on what "dense" means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub accelerate_threshold: f64,
    pub stable_min: f64,
    pub stable_max: f64,
    /// Bars required before any trend label other than undefined.
    pub min_bars: usize,
    /// Max (high - low) / low over `min_bars` for a dense zone.
    pub range_limit: f64,
    pub phase_lookback: usize,
    pub phase_min_samples: usize,
    pub zone_lookback: usize,
    pub zone_gap_days: i64,
    pub zone_min_bars: usize,
    pub max_targets: usize,
    pub stop_loss_method: StopLossMethod,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            accelerate_threshold: 0.8,
            stable_min: 0.15,
            stable_max: 0.8,
            min_bars: 120,
            range_limit: 0.25,
            phase_lookback: 60,
            phase_min_samples: 20,
            zone_lookback: 252,
            zone_gap_days: 10,
            zone_min_bars: 20,
            max_targets: 3,
            stop_loss_method: StopLossMethod::Ma,
        }
    }
}

impl TrendConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.range_limit <= 0.0 {
            return Err(invalid("trend.range_limit must be > 0"));
        }
        if self.stable_min < 0.0 || self.stable_min >= self.stable_max {
            return Err(invalid(format!(
                "trend.stable_min ({}) must be >= 0 and below stable_max ({})",
                self.stable_min, self.stable_max
            )));
        }
        if self.accelerate_threshold < self.stable_max {
            return Err(invalid(
                "trend.accelerate_threshold must not be below stable_max",
            ));
        }
        if self.min_bars == 0 || self.phase_lookback == 0 || self.zone_lookback == 0 {
            return Err(invalid("trend look-back windows must be >= 1"));
        }
        if self.zone_gap_days < 0 {
            return Err(invalid("trend.zone_gap_days must be >= 0"));
        }
        if self.stop_loss_method == StopLossMethod::Structure {
            return Err(invalid(
                "trend.stop_loss_method must be ma, atr or percentage",
            ));
        }
        Ok(())
    }
}

/// Signal detector windows and tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub two_b_lookback: usize,
    /// Window searched for the most recent extreme.
    pub two_b_window: usize,
    /// Minimum bars between the prior extreme search range and the recent extreme.
    pub two_b_min_separation: usize,
    pub two_b_tolerance: f64,
    pub breakout_volume_ratio: f64,
    pub pullback_band_pct: f64,
    pub touch_band_pct: f64,
    pub touch_lookback: usize,
    pub max_first_touches: usize,
    pub pattern_lookback: usize,
    pub pattern_separation: usize,
    pub pattern_similarity_pct: f64,
    pub pattern_swing_pct: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            two_b_lookback: 60,
            two_b_window: 30,
            two_b_min_separation: 5,
            two_b_tolerance: 0.01,
            breakout_volume_ratio: 1.5,
            pullback_band_pct: 3.0,
            touch_band_pct: 2.0,
            touch_lookback: 60,
            max_first_touches: 5,
            pattern_lookback: 30,
            pattern_separation: 5,
            pattern_similarity_pct: 3.0,
            pattern_swing_pct: 3.0,
        }
    }
}

impl SignalConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.two_b_window == 0 || self.two_b_window > self.two_b_lookback {
            return Err(invalid(
                "signals.two_b_window must be in 1..=two_b_lookback",
            ));
        }
        if self.two_b_tolerance < 0.0 {
            return Err(invalid("signals.two_b_tolerance must be >= 0"));
        }
        if self.pattern_separation == 0 || self.pattern_lookback < 3 {
            return Err(invalid(
                "signals.pattern_separation must be >= 1 and pattern_lookback >= 3",
            ));
        }
        if self.pullback_band_pct <= 0.0 || self.touch_band_pct <= 0.0 {
            return Err(invalid("signals band widths must be > 0"));
        }
        Ok(())
    }
}

/// Recommendation gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub min_score: u32,
    pub max_recommendations: usize,
    /// Bars required before a symbol is analyzed at all.
    pub min_data_points: usize,
    /// |Bias| (%) on the longest MA that turns a hold into a warning.
    pub extreme_bias_pct: f64,
    /// Best risk/reward above which breakouts earn the reward bonus.
    pub rr_bonus_ratio: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            min_score: 60,
            max_recommendations: 20,
            min_data_points: 252,
            extreme_bias_pct: 50.0,
            rr_bonus_ratio: 3.0,
        }
    }
}

impl StrategyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_score > 100 {
            return Err(invalid("strategy.min_score must be <= 100"));
        }
        if self.max_recommendations == 0 {
            return Err(invalid("strategy.max_recommendations must be >= 1"));
        }
        Ok(())
    }
}

/// Per-strategy defaults for target synthesis and holding time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProfile {
    /// Gain tiers in percent, nearest first.
    pub expected_gain: Vec<f64>,
    /// Base probability of reaching the first tier.
    pub success_rate: f64,
    pub min_days: u32,
    pub target_days: u32,
    pub max_days: u32,
}

impl StrategyProfile {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.expected_gain.is_empty() {
            return Err(invalid(format!("profit.{name}.expected_gain must not be empty")));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(invalid(format!("profit.{name}.success_rate must be in [0, 1]")));
        }
        if self.min_days > self.target_days || self.target_days > self.max_days {
            return Err(invalid(format!(
                "profit.{name} holding days must satisfy min <= target <= max"
            )));
        }
        Ok(())
    }
}

/// Profit predictor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitConfig {
    /// ATR / price above which targets are raised.
    pub high_volatility: f64,
    /// ATR / price below which targets are lowered.
    pub low_volatility: f64,
    pub volatility_adjustment: f64,
    /// Probability multiplier per target tier.
    pub tier_decay: Vec<f64>,
    pub exit_extreme_bias_pct: f64,
    pub breakout: StrategyProfile,
    pub pullback: StrategyProfile,
    pub accelerate_hold: StrategyProfile,
    pub reversal: StrategyProfile,
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            breakout: StrategyProfile {
                expected_gain: vec![10.0, 25.0, 50.0],
                success_rate: 0.65,
                min_days: 5,
                target_days: 20,
                max_days: 90,
            },
            pullback: StrategyProfile {
                expected_gain: vec![8.0, 18.0, 35.0],
                success_rate: 0.75,
                min_days: 10,
                target_days: 30,
                max_days: 180,
            },
            accelerate_hold: StrategyProfile {
                expected_gain: vec![15.0, 35.0, 70.0],
                success_rate: 0.45,
                min_days: 3,
                target_days: 10,
                max_days: 30,
            },
            reversal: StrategyProfile {
                expected_gain: vec![5.0, 10.0, 15.0],
                success_rate: 0.45,
                min_days: 2,
                target_days: 5,
                max_days: 15,
            },
            high_volatility: 0.03,
            low_volatility: 0.015,
            volatility_adjustment: 0.10,
            tier_decay: vec![1.0, 0.65, 0.35],
            exit_extreme_bias_pct: 30.0,
        }
    }
}

impl ProfitConfig {
    /// Profile for a strategy. Both variants of the accelerate-up and the
    /// reversal playbooks share one profile each.
    pub fn profile(&self, kind: StrategyKind) -> &StrategyProfile {
        match kind {
            StrategyKind::Breakout => &self.breakout,
            StrategyKind::Pullback => &self.pullback,
            StrategyKind::AccelerateHold | StrategyKind::AccelerateWarning => {
                &self.accelerate_hold
            }
            StrategyKind::ReversalLong | StrategyKind::ReversalShort => &self.reversal,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.breakout.validate("breakout")?;
        self.pullback.validate("pullback")?;
        self.accelerate_hold.validate("accelerate_hold")?;
        self.reversal.validate("reversal")?;
        if self.low_volatility >= self.high_volatility {
            return Err(invalid("profit.low_volatility must be below high_volatility"));
        }
        if self.tier_decay.is_empty() || self.tier_decay.iter().any(|d| !(0.0..=1.0).contains(d))
        {
            return Err(invalid("profit.tier_decay entries must be in [0, 1]"));
        }
        Ok(())
    }
}
