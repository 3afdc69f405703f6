//! Shift- and ratio-based columns: discount price, bias, MA slope and the
//! trailing one-year return.

/// Value of the series `period` bars ago (NaN for the first `period` bars).
///
/// Applied to a price column this is the "discount price": once today's
/// price is above the value about to drop out of an N-bar window, the N-bar
/// MA must rise tomorrow.
pub fn discount(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        result[i] = values[i - period];
    }
    result
}

/// Percentage deviation of price from its moving average.
pub fn bias(prices: &[f64], ma: &[f64]) -> Vec<f64> {
    prices
        .iter()
        .zip(ma)
        .map(|(&p, &m)| {
            if m.is_nan() || m == 0.0 {
                f64::NAN
            } else {
                (p - m) / m * 100.0
            }
        })
        .collect()
}

/// Percentage change of a series over `window` bars.
pub fn pct_change(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }
    for i in window..n {
        let base = values[i - window];
        let now = values[i];
        if base.is_finite() && now.is_finite() && base != 0.0 {
            result[i] = (now - base) / base * 100.0;
        }
    }
    result
}

/// Trailing return over `period` bars, as a fraction (0.25 = +25%).
pub fn trailing_return(prices: &[f64], period: usize) -> Vec<f64> {
    pct_change(prices, period)
        .into_iter()
        .map(|v| v / 100.0)
        .collect()
}
