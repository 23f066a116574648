//! Window statistics over numeric series.
//!
//! Two primitives, both taking a window of `w` points ending at `end`
//! (inclusive):
//! - empirical quantile with linear interpolation between order statistics;
//! - local peak / trough scan with a centered sub-window of radius `r`.
//!
//! A window reaching before the first point is truncated to the available
//! prefix. Undefined (`None`) points are skipped. With nothing left the call
//! fails with `InsufficientHistory`.

use crate::domain::error::ScreenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Peak,
    Trough,
}

/// Quantile at level `q` (clamped to [0, 1]) of an unsorted sample.
pub fn quantile(sample: &[f64], q: f64) -> Result<f64, ScreenError> {
    if sample.is_empty() {
        return Err(ScreenError::InsufficientHistory {
            needed: 1,
            available: 0,
        });
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let last = sorted.len() - 1;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = (lower + 1).min(last);
    let frac = pos - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// Defined values in the window `[end + 1 - window, end]`, truncated at 0.
pub fn window_values(
    series: &[Option<f64>],
    end: usize,
    window: usize,
) -> Result<Vec<f64>, ScreenError> {
    if end >= series.len() {
        return Err(ScreenError::InsufficientHistory {
            needed: window.max(1),
            available: series.len(),
        });
    }
    let values: Vec<f64> = series[window_start(end, window)..=end]
        .iter()
        .flatten()
        .copied()
        .collect();
    if values.is_empty() {
        return Err(ScreenError::InsufficientHistory {
            needed: window.max(1),
            available: 0,
        });
    }
    Ok(values)
}

/// Quantile of the window ending at `end`.
pub fn quantile_at(
    series: &[Option<f64>],
    end: usize,
    window: usize,
    q: f64,
) -> Result<f64, ScreenError> {
    let values = window_values(series, end, window)?;
    quantile(&values, q)
}

/// Rolling quantile for every index; `None` where no defined value is available.
pub fn rolling_quantile(series: &[Option<f64>], window: usize, q: f64) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|end| quantile_at(series, end, window, q).ok())
        .collect()
}

/// Indices of local extrema of `values` within the window ending at `end`.
///
/// Only indices inside the window are candidates, but each candidate is
/// compared against its full neighbourhood `[i - radius, i + radius]`, clipped
/// at the start of the series and at `end`. `i` is a peak when it is strictly
/// above every earlier neighbour and no later neighbour is above it, so among
/// equal neighbours only the earliest counts. Troughs are symmetric. Points
/// after `end` are never consulted.
pub fn local_extrema(
    values: &[f64],
    end: usize,
    window: usize,
    radius: usize,
    kind: ExtremumKind,
) -> Result<Vec<usize>, ScreenError> {
    if values.is_empty() || end >= values.len() || window == 0 {
        return Err(ScreenError::InsufficientHistory {
            needed: window.max(1),
            available: values.len().min(end + 1),
        });
    }
    let start = window_start(end, window);

    // "a beats b": strictly more extreme.
    let beats = |a: f64, b: f64| match kind {
        ExtremumKind::Peak => a > b,
        ExtremumKind::Trough => a < b,
    };

    let found = (start..=end)
        .filter(|&i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(end);
            let v = values[i];
            (lo..i).all(|j| beats(v, values[j])) && (i + 1..=hi).all(|j| !beats(values[j], v))
        })
        .collect();
    Ok(found)
}

pub fn local_peaks(
    values: &[f64],
    end: usize,
    window: usize,
    radius: usize,
) -> Result<Vec<usize>, ScreenError> {
    local_extrema(values, end, window, radius, ExtremumKind::Peak)
}

pub fn local_troughs(
    values: &[f64],
    end: usize,
    window: usize,
    radius: usize,
) -> Result<Vec<usize>, ScreenError> {
    local_extrema(values, end, window, radius, ExtremumKind::Trough)
}

fn window_start(end: usize, window: usize) -> usize {
    (end + 1).saturating_sub(window.max(1))
}
