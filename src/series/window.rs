//! Sliding history windows over each disease's seasonal series.

use crate::domain::{HORIZON, SeriesPoint, Window};
use crate::series::aggregate::series_by_disease;

/// Windows plus the diseases that were too short to contribute any.
#[derive(Debug, Clone, PartialEq)]
pub struct Windowed {
    pub windows: Vec<Window>,
    /// Disease ids with fewer than `seq_len + 1` points.
    pub excluded: Vec<usize>,
}

/// Build every `(seq_len history -> next value)` window.
///
/// A disease with `L >= seq_len + 1` points yields exactly `L - seq_len`
/// windows; shorter diseases yield none and are reported in `excluded`.
pub fn build_windows(points: &[SeriesPoint], seq_len: usize) -> Windowed {
    let mut windows = Vec::new();
    let mut excluded = Vec::new();

    for (disease_id, vals) in series_by_disease(points) {
        if vals.len() < seq_len + HORIZON {
            excluded.push(disease_id);
            continue;
        }
        for i in 0..=(vals.len() - seq_len - HORIZON) {
            windows.push(Window {
                disease_id,
                history: vals[i..i + seq_len].to_vec(),
                target: vals[i + seq_len],
            });
        }
    }

    Windowed { windows, excluded }
}

/// The most recent `seq_len` counts of each disease, for next-step inference.
///
/// Returns `(disease_id, Some(tail))` when enough points exist and
/// `(disease_id, None)` otherwise, in first-encountered disease order.
pub fn latest_windows(points: &[SeriesPoint], seq_len: usize) -> Vec<(usize, Option<Vec<f64>>)> {
    series_by_disease(points)
        .into_iter()
        .map(|(disease_id, vals)| {
            if vals.len() < seq_len {
                (disease_id, None)
            } else {
                (disease_id, Some(vals[vals.len() - seq_len..].to_vec()))
            }
        })
        .collect()
}
