//! Multi-MA structure: density (spread of the MAs) and alignment.

use crate::series::MaAlignment;

/// (max - min) / min * 100 across the given MA columns, per bar.
///
/// NaN wherever any MA is still warming up.
pub fn ma_density(mas: &[&[f64]]) -> Vec<f64> {
    let n = mas.first().map_or(0, |c| c.len());
    (0..n)
        .map(|i| {
            let mut hi = f64::NEG_INFINITY;
            let mut lo = f64::INFINITY;
            for col in mas {
                let v = col[i];
                if v.is_nan() {
                    return f64::NAN;
                }
                hi = hi.max(v);
                lo = lo.min(v);
            }
            if mas.is_empty() || lo <= 0.0 {
                f64::NAN
            } else {
                (hi - lo) / lo * 100.0
            }
        })
        .collect()
}

/// Ordering of the MAs (shortest period first), per bar.
///
/// Strictly decreasing is bull, strictly increasing is bear; anything else,
/// including undefined MAs, is mixed.
pub fn ma_alignment(mas: &[&[f64]]) -> Vec<MaAlignment> {
    let n = mas.first().map_or(0, |c| c.len());
    (0..n)
        .map(|i| {
            let values: Vec<f64> = mas.iter().map(|c| c[i]).collect();
            classify_alignment(&values)
        })
        .collect()
}

/// Alignment of one bar's MA values ordered shortest period first.
pub fn classify_alignment(values: &[f64]) -> MaAlignment {
    if values.len() < 2 || values.iter().any(|v| v.is_nan()) {
        return MaAlignment::Mixed;
    }
    if values.windows(2).all(|w| w[0] > w[1]) {
        MaAlignment::Bull
    } else if values.windows(2).all(|w| w[0] < w[1]) {
        MaAlignment::Bear
    } else {
        MaAlignment::Mixed
    }
}
