//! SVG charts rendered with Plotters.
//!
//! Each function writes one self-contained SVG file. The SVG backend needs no
//! system fonts, so charts render the same on any machine.

use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;
use crate::io::export::ensure_parent_dir;
use crate::math::Summary;

const SIZE: (u32, u32) = (900, 540);

type DrawResult = Result<(), Box<dyn std::error::Error>>;

fn finish(path: &Path, result: DrawResult) -> Result<(), AppError> {
    result.map_err(|e| AppError::io(format!("Failed to render chart '{}': {e}", path.display())))?;
    log::debug!("Wrote chart {}", path.display());
    Ok(())
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (0.0f64, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !hi.is_finite() || hi <= lo {
        hi = lo + 1.0;
    }
    (lo, hi + (hi - lo) * 0.05)
}

/// Vertical bars, one per `(label, value)`, in the given order.
pub fn write_bar_chart(path: &Path, title: &str, y_desc: &str, bars: &[(String, f64)]) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    finish(path, draw_bar_chart(path, title, y_desc, bars))
}

fn draw_bar_chart(path: &Path, title: &str, y_desc: &str, bars: &[(String, f64)]) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let n = bars.len().max(1);
    let (y_lo, y_hi) = value_range(bars.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => bars.get(*i).map(|(label, _)| label.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(y_desc)
        .draw()?;

    let color = RGBColor(70, 130, 180);
    chart.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
            color.filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }))?;

    root.present()?;
    Ok(())
}

/// One line per named series over a shared numeric x axis.
pub fn write_line_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(f64, f64)>)],
) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    finish(path, draw_line_chart(path, title, x_desc, y_desc, series))
}

fn draw_line_chart(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(f64, f64)>)],
) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let xs = || series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.0));
    let x_lo = xs().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
    let x_hi = xs().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    let (x_lo, x_hi) = if x_lo.is_finite() && x_hi > x_lo { (x_lo, x_hi) } else { (0.0, 1.0) };
    let (y_lo, y_hi) = value_range(series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    for (idx, (name, pts)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(
                pts.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
                color.stroke_width(2),
            ))?
            .label(name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// One box per `(label, summary)`: whiskers from min to max, a box from the
/// 25th to the 75th percentile and a bar at the median.
pub fn write_box_chart(path: &Path, title: &str, y_desc: &str, boxes: &[(String, Summary)]) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    finish(path, draw_box_chart(path, title, y_desc, boxes))
}

fn draw_box_chart(path: &Path, title: &str, y_desc: &str, boxes: &[(String, Summary)]) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let n = boxes.len().max(1);
    let (y_lo, y_hi) = value_range(boxes.iter().flat_map(|(_, s)| [s.min, s.max]));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => boxes.get(*i).map(|(label, _)| label.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(y_desc)
        .draw()?;

    // Horizontal strokes span the segment minus a pixel margin on each side.
    let across = |i: usize, y: f64, inset: u32, style: ShapeStyle| {
        let mut r = Rectangle::new([(SegmentValue::Exact(i), y), (SegmentValue::Exact(i + 1), y)], style);
        r.set_margin(0, 0, inset, inset);
        r
    };
    let fill = RGBColor(70, 130, 180);
    for (i, (_, s)) in boxes.iter().enumerate() {
        let mid = SegmentValue::CenterOf(i);
        chart.draw_series([
            PathElement::new(vec![(mid.clone(), s.min), (mid.clone(), s.q25)], BLACK.stroke_width(1)),
            PathElement::new(vec![(mid.clone(), s.q75), (mid.clone(), s.max)], BLACK.stroke_width(1)),
        ])?;
        let mut body = Rectangle::new(
            [(SegmentValue::Exact(i), s.q25), (SegmentValue::Exact(i + 1), s.q75)],
            fill.mix(0.6).filled(),
        );
        body.set_margin(0, 0, 20, 20);
        chart.draw_series([body])?;
        chart.draw_series([
            across(i, s.min, 40, BLACK.stroke_width(1)),
            across(i, s.max, 40, BLACK.stroke_width(1)),
            across(i, s.median, 20, BLACK.stroke_width(2)),
        ])?;
    }

    root.present()?;
    Ok(())
}

/// Grid of `rows × cols` cells shaded by value, with the value printed in
/// each cell. `cells` holds `(row, col, value)`; cells not listed stay blank.
pub fn write_heatmap(
    path: &Path,
    title: &str,
    rows: &[String],
    cols: &[String],
    cells: &[(usize, usize, f64)],
) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    finish(path, draw_heatmap(path, title, rows, cols, cells))
}

fn shade(v: f64, hi: f64) -> RGBColor {
    let t = if hi > 0.0 { (v / hi).clamp(0.0, 1.0) } else { 0.0 };
    let mix = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    RGBColor(mix(235.0, 30.0), mix(245.0, 90.0), mix(255.0, 160.0))
}

fn draw_heatmap(
    path: &Path,
    title: &str,
    rows: &[String],
    cols: &[String],
    cells: &[(usize, usize, f64)],
) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (n_rows, n_cols) = (rows.len().max(1), cols.len().max(1));
    let hi = cells
        .iter()
        .map(|c| c.2)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d((0..n_cols).into_segmented(), (0..n_rows).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => cols.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => rows.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    let in_grid = |&&(r, c, v): &&(usize, usize, f64)| r < rows.len() && c < cols.len() && v.is_finite();
    chart.draw_series(cells.iter().filter(in_grid).map(|&(r, c, v)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(c), SegmentValue::Exact(r)),
                (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1)),
            ],
            shade(v, hi).filled(),
        )
    }))?;
    chart.draw_series(cells.iter().filter(in_grid).map(|&(r, c, v)| {
        let color = if hi > 0.0 && v / hi > 0.5 { WHITE } else { BLACK };
        Text::new(
            format!("{v:.0}"),
            (SegmentValue::CenterOf(c), SegmentValue::CenterOf(r)),
            ("sans-serif", 12).into_font().color(&color),
        )
    }))?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("bars.svg");
        let bars = vec![("Fever".to_string(), 120.0), ("Cold".to_string(), 80.5)];
        write_bar_chart(&path, "Totals", "Cases", &bars).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Fever"));
    }

    #[test]
    fn line_chart_handles_missing_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loss.svg");
        let series = vec![
            ("loss".to_string(), vec![(1.0, 0.5), (2.0, 0.25), (3.0, 0.2)]),
            ("val_loss".to_string(), vec![(1.0, f64::NAN)]),
        ];
        write_line_chart(&path, "Loss", "Epoch", "MSE", &series).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn value_range_always_has_width() {
        assert_eq!(value_range([].into_iter()), (0.0, 1.05));
        let (lo, hi) = value_range([3.0, 3.0].into_iter());
        assert_eq!(lo, 0.0);
        assert!(hi > 3.0);
    }

    fn summary(min: f64, q25: f64, median: f64, q75: f64, max: f64) -> Summary {
        Summary {
            n: 5,
            mean: median,
            std: 1.0,
            min,
            q25,
            median,
            q75,
            max,
        }
    }

    #[test]
    fn box_chart_labels_every_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seasons.svg");
        let boxes = vec![
            ("Winter".to_string(), summary(1.0, 4.0, 6.0, 9.0, 20.0)),
            ("Spring".to_string(), summary(0.0, 2.0, 3.0, 5.0, 8.0)),
        ];
        write_box_chart(&path, "Cases by season", "Cases", &boxes).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Winter"));
        assert!(svg.contains("Spring"));
    }

    #[test]
    fn heatmap_prints_cell_values_and_skips_out_of_grid_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.svg");
        let rows = vec!["Delhi".to_string(), "Goa".to_string()];
        let cols = vec!["Fever".to_string()];
        let cells = vec![(0, 0, 4.0), (1, 0, 2.0), (5, 5, 9.0)];
        write_heatmap(&path, "Years covered", &rows, &cols, &cells).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Goa"));
        assert!(svg.contains(">4<"));
        assert!(!svg.contains(">9<"));
    }

    #[test]
    fn shade_darkens_with_value() {
        assert_eq!(shade(0.0, 4.0), RGBColor(235, 245, 255));
        assert_eq!(shade(4.0, 4.0), RGBColor(30, 90, 160));
        assert_eq!(shade(3.0, 0.0), shade(0.0, 4.0));
    }
}
