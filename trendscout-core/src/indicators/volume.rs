//! Volume averages and the volume ratio.

use super::sma::rolling_mean;

/// Today's volume divided by its `long`-bar average.
pub fn volume_ratio(volumes: &[f64], long_ma: &[f64]) -> Vec<f64> {
    volumes
        .iter()
        .zip(long_ma)
        .map(|(&v, &m)| if m.is_nan() || m <= 0.0 { f64::NAN } else { v / m })
        .collect()
}

/// Short and long volume moving averages.
pub fn volume_averages(volumes: &[f64], short: usize, long: usize) -> (Vec<f64>, Vec<f64>) {
    (rolling_mean(volumes, short), rolling_mean(volumes, long))
}
