//! Double top / double bottom over the recent window.

use serde::Serialize;

use crate::config::SignalConfig;

/// Minimum prices in the window before any extrema are searched.
const MIN_PATTERN_BARS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoubleStructure {
    pub kind: PatternKind,
    pub first_price: f64,
    pub second_price: f64,
    /// The opposite extreme between the two.
    pub middle_price: f64,
    /// |second - first| / first, in percent.
    pub price_diff_pct: f64,
    /// Distance from the first extreme to the middle one, in percent.
    pub swing_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopBottomReport {
    pub double_top: Option<DoubleStructure>,
    pub double_bottom: Option<DoubleStructure>,
}

impl TopBottomReport {
    pub fn has_structure(&self) -> bool {
        self.double_top.is_some() || self.double_bottom.is_some()
    }
}

pub fn detect_top_bottom(prices: &[f64], config: &SignalConfig) -> TopBottomReport {
    if prices.len() < config.pattern_lookback {
        return TopBottomReport::default();
    }
    let window = &prices[prices.len() - config.pattern_lookback..];
    if window.len() < MIN_PATTERN_BARS {
        return TopBottomReport::default();
    }
    TopBottomReport {
        double_top: double_extreme(window, PatternKind::DoubleTop, config),
        double_bottom: double_extreme(window, PatternKind::DoubleBottom, config),
    }
}

fn double_extreme(
    prices: &[f64],
    kind: PatternKind,
    config: &SignalConfig,
) -> Option<DoubleStructure> {
    let extrema = match kind {
        PatternKind::DoubleTop => find_peaks(prices, config.pattern_separation),
        PatternKind::DoubleBottom => {
            let negated: Vec<f64> = prices.iter().map(|p| -p).collect();
            find_peaks(&negated, config.pattern_separation)
        }
    };
    let [.., i1, i2] = extrema[..] else {
        return None;
    };
    let (first, second) = (prices[i1], prices[i2]);
    let price_diff_pct = (first - second).abs() / first * 100.0;
    if price_diff_pct >= config.pattern_similarity_pct {
        return None;
    }

    let between = &prices[i1..=i2];
    let (middle_price, swing_pct) = match kind {
        PatternKind::DoubleTop => {
            let low = between.iter().copied().fold(f64::INFINITY, f64::min);
            (low, (first - low) / first * 100.0)
        }
        PatternKind::DoubleBottom => {
            let high = between.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (high, (high - first) / first * 100.0)
        }
    };
    (swing_pct > config.pattern_swing_pct).then_some(DoubleStructure {
        kind,
        first_price: first,
        second_price: second,
        middle_price,
        price_diff_pct,
        swing_pct,
    })
}

/// Indices of local maxima at least `distance` bars apart.
///
/// A maximum is a sample strictly above its left neighbour and strictly
/// above the first differing sample to its right; flat tops report their
/// middle index. Endpoints never qualify. When two maxima are closer than
/// `distance`, the higher one is kept (later one on equal height).
pub fn find_peaks(values: &[f64], distance: usize) -> Vec<usize> {
    let n = values.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    if distance <= 1 || peaks.len() < 2 {
        return peaks;
    }

    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| values[peaks[a]].total_cmp(&values[peaks[b]]));
    let mut keep = vec![true; peaks.len()];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }
    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_peaks() {
        let x = [0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        assert_eq!(find_peaks(&x, 1), vec![1, 3, 5]);
    }

    #[test]
    fn plateau_reports_middle() {
        let x = [0.0, 2.0, 2.0, 2.0, 0.0];
        assert_eq!(find_peaks(&x, 1), vec![2]);
        // plateau running into the end is not a peak
        let x = [0.0, 2.0, 2.0, 2.0];
        assert!(find_peaks(&x, 1).is_empty());
    }

    #[test]
    fn distance_keeps_higher_peak() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&x, 5), vec![3, 9]);
    }

    fn w_shape() -> Vec<f64> {
        // falls to 90 at 8, rebounds to 100 at 15, back to 90.5 at 22
        let mut prices = Vec::new();
        for i in 0..=8 {
            prices.push(100.0 - 10.0 * i as f64 / 8.0);
        }
        for i in 1..=7 {
            prices.push(90.0 + 10.0 * i as f64 / 7.0);
        }
        for i in 1..=7 {
            prices.push(100.0 - 9.5 * i as f64 / 7.0);
        }
        for i in 1..=7 {
            prices.push(90.5 + i as f64);
        }
        prices
    }

    #[test]
    fn double_bottom_detected() {
        let prices = w_shape();
        assert_eq!(prices.len(), 30);
        let report = detect_top_bottom(&prices, &SignalConfig::default());
        let b = report.double_bottom.as_ref().expect("double bottom");
        assert_eq!(b.first_price, 90.0);
        assert_eq!(b.second_price, 90.5);
        assert_eq!(b.middle_price, 100.0);
        assert!(report.double_top.is_none());
        assert!(report.has_structure());
    }

    #[test]
    fn double_top_is_mirror() {
        let prices: Vec<f64> = w_shape().iter().map(|p| 200.0 - p).collect();
        let report = detect_top_bottom(&prices, &SignalConfig::default());
        let t = report.double_top.expect("double top");
        assert_eq!(t.first_price, 110.0);
        assert_eq!(t.middle_price, 100.0);
        assert!(report.double_bottom.is_none());
    }

    #[test]
    fn distant_levels_rejected() {
        let mut prices = w_shape();
        prices[22] = 80.0;
        let report = detect_top_bottom(&prices, &SignalConfig::default());
        assert!(report.double_bottom.is_none());
    }

    #[test]
    fn monotonic_has_no_structure() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert!(!detect_top_bottom(&prices, &SignalConfig::default()).has_structure());
    }
}
