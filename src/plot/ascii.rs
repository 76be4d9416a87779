//! Terminal charts printed after `incidence train` and `incidence predict`.
//!
//! Both renderers write into a fixed character grid so the output is stable
//! enough to snapshot. The loss chart draws training loss as a `-` line with
//! validation loss as `o` marks; forecasts are `#` bars.

use crate::domain::{EpochLog, ForecastRecord};

/// Render training (and validation, when present) loss per epoch.
pub fn render_loss_plot(history: &[EpochLog], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let epochs = history.len();

    let values = history
        .iter()
        .flat_map(|e| std::iter::once(e.loss).chain(e.val_loss));
    let (y_min, y_max) = y_range(values).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let cell = |epoch: usize, y: f64| (epoch_column(epoch, epochs, width), loss_row(y, y_min, y_max, height));

    let mut grid = vec![vec![' '; width]; height];

    // Line first so validation marks overlay it. A non-finite loss breaks the line.
    let mut prev: Option<(usize, usize)> = None;
    for e in history {
        if !e.loss.is_finite() {
            prev = None;
            continue;
        }
        let here = cell(e.epoch, e.loss);
        draw_line(&mut grid, prev.unwrap_or(here), here, '-');
        prev = Some(here);
    }
    for e in history {
        if let Some(v) = e.val_loss.filter(|v| v.is_finite()) {
            let (x, y) = cell(e.epoch, v);
            grid[y][x] = 'o';
        }
    }

    let mut out = format!("Loss: epochs=[1, {epochs}] | mse=[{y_min:.4}, {y_max:.4}]\n");
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

/// Horizontal bars for the top-N forecasts, scaled to the largest value.
pub fn render_forecast_bars(forecasts: &[ForecastRecord], top_n: usize, width: usize) -> String {
    let rows: Vec<&ForecastRecord> = forecasts.iter().take(top_n).collect();
    let label_w = rows.iter().map(|f| f.disease.chars().count()).max().unwrap_or(0);
    let bar_w = width.max(10);
    let max = rows
        .iter()
        .map(|f| f.predicted_count)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    let mut out = String::new();
    for f in rows {
        let len = if max > 0.0 && f.predicted_count.is_finite() {
            ((f.predicted_count.max(0.0) / max) * bar_w as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{:<label_w$} | {:<bar_w$} {:.1}\n",
            f.disease,
            "#".repeat(len),
            f.predicted_count
        ));
    }
    out
}

fn y_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for y in values.filter(|y| y.is_finite()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

/// Widen a value range by `frac` of its span on both sides.
fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

/// Column for a 0-based epoch; the first epoch sits at the left edge and the
/// last one at the right edge.
fn epoch_column(epoch: usize, epochs: usize, width: usize) -> usize {
    let last = epochs.max(2) - 1;
    let u = (epoch as f64 / last as f64).clamp(0.0, 1.0);
    (u * (width.max(2) - 1) as f64).round() as usize
}

/// Row for a loss value; larger losses sit higher (row 0 is the top).
fn loss_row(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let bottom = (height.max(2) - 1) as f64;
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    (bottom - u * bottom).round() as usize
}

/// Bresenham segment between two cells. Occupied cells are left alone.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x, mut y) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let step_x = (x1 - x).signum();
    let step_y = (y1 - y).signum();
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }
        if (x, y) == (x1, y1) {
            return;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += step_x;
        }
        if doubled <= dx {
            err += dx;
            y += step_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_plot_golden_snapshot_small() {
        let history = vec![
            EpochLog { epoch: 0, loss: 1.0, val_loss: None },
            EpochLog { epoch: 1, loss: 0.0, val_loss: None },
        ];
        let txt = render_loss_plot(&history, 10, 5);
        let expected = concat!(
            "Loss: epochs=[1, 2] | mse=[-0.0500, 1.0500]\n",
            "--\n",
            "  --\n",
            "    --\n",
            "      --\n",
            "        --\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn validation_points_overlay_the_line() {
        let history = vec![
            EpochLog { epoch: 0, loss: 0.5, val_loss: Some(0.5) },
            EpochLog { epoch: 1, loss: 0.5, val_loss: Some(0.5) },
        ];
        let txt = render_loss_plot(&history, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[3], "o--------o");
    }

    #[test]
    fn forecast_bars_scale_to_largest() {
        let rows = vec![
            ForecastRecord { disease: "Fever".to_string(), predicted_count: 100.0 },
            ForecastRecord { disease: "Cold".to_string(), predicted_count: 50.0 },
            ForecastRecord { disease: "Dengue".to_string(), predicted_count: 10.0 },
        ];
        let txt = render_forecast_bars(&rows, 2, 10);
        let expected = concat!(
            "Fever | ########## 100.0\n",
            "Cold  | #####      50.0\n",
        );
        assert_eq!(txt, expected);
    }
}
