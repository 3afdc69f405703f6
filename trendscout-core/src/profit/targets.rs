//! Tiered price targets: strategy gain tiers blended with zone targets,
//! scaled by volatility.

use serde::{Deserialize, Serialize};

use crate::config::{ProfitConfig, StrategyProfile};
use crate::trend::TargetLevel;

/// Probability used for tiers beyond the configured decay list.
const FALLBACK_TIER_PROBABILITY: f64 = 0.1;

/// ATR as a fraction of price when ATR is undefined.
const DEFAULT_VOLATILITY: f64 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTarget {
    /// 1-based tier.
    pub level: usize,
    pub price: f64,
    pub gain_pct: f64,
    pub probability: f64,
    pub description: String,
}

/// Build one target per gain tier of `profile`.
///
/// Tier i averages the gain-based price with zone target i when one exists,
/// then scales up in high volatility and down in low volatility.
pub fn calculate_targets(
    profile: &StrategyProfile,
    config: &ProfitConfig,
    current_price: f64,
    atr: Option<f64>,
    zone_targets: &[TargetLevel],
) -> Vec<ProfitTarget> {
    if current_price <= 0.0 {
        return Vec::new();
    }
    let volatility = atr.map_or(DEFAULT_VOLATILITY, |a| a / current_price);
    let scale = if volatility > config.high_volatility {
        1.0 + config.volatility_adjustment
    } else if volatility < config.low_volatility {
        1.0 - config.volatility_adjustment
    } else {
        1.0
    };

    profile
        .expected_gain
        .iter()
        .enumerate()
        .map(|(i, gain)| {
            let base = current_price * (1.0 + gain / 100.0);
            let blended = match zone_targets.get(i) {
                Some(zone) => (zone.price + base) / 2.0,
                None => base,
            };
            let price = blended * scale;
            let gain_pct = (price - current_price) / current_price * 100.0;
            ProfitTarget {
                level: i + 1,
                price,
                gain_pct,
                probability: tier_probability(profile, config, i),
                description: describe(i, gain_pct),
            }
        })
        .collect()
}

fn tier_probability(profile: &StrategyProfile, config: &ProfitConfig, tier: usize) -> f64 {
    config
        .tier_decay
        .get(tier)
        .map_or(FALLBACK_TIER_PROBABILITY, |decay| profile.success_rate * decay)
}

fn describe(tier: usize, gain_pct: f64) -> String {
    match tier {
        0 => format!("Target 1 (+{gain_pct:.1}%): short-term, take partial profit"),
        1 => format!("Target 2 (+{gain_pct:.1}%): medium-term, reduce again"),
        2 => format!("Target 3 (+{gain_pct:.1}%): full target, close the position"),
        n => format!("Target {}", n + 1),
    }
}
