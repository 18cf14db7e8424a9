//! ASCII plotting for terminal output.
//!
//! Fixed-size grid with deterministic output. The x axis is the day offset
//! relative to the last close; history sits left of the `|` divider.
//!
//! Plot elements:
//! - actual closes: `*` joined by `.`
//! - forecasts: one letter per model (`N` LSTM, `L` linear, `F` forest, `A` ARIMA)

use crate::domain::{ModelBundle, ModelKind};
use crate::report::CHART_HISTORY;

fn marker(kind: ModelKind) -> char {
    match kind {
        ModelKind::Lstm => 'N',
        ModelKind::Linear => 'L',
        ModelKind::RandomForest => 'F',
        ModelKind::Arima => 'A',
    }
}

/// Render the recent closes and every available forecast.
pub fn render_forecast_plot(
    closes: &[f64],
    bundle: &ModelBundle,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let tail = &closes[closes.len().saturating_sub(CHART_HISTORY)..];
    let history: Vec<(f64, f64)> = tail
        .iter()
        .enumerate()
        .map(|(i, &y)| (i as f64 - (tail.len() as f64 - 1.0), y))
        .collect();

    let forecasts: Vec<(ModelKind, Vec<(f64, f64)>)> = ModelKind::ALL
        .into_iter()
        .filter_map(|kind| {
            bundle.forecast(kind).map(|r| {
                let pts = r
                    .predictions
                    .iter()
                    .enumerate()
                    .map(|(i, &y)| ((i + 1) as f64, y))
                    .collect();
                (kind, pts)
            })
        })
        .collect();

    let all = history.iter().chain(forecasts.iter().flat_map(|(_, pts)| pts.iter()));
    let Some((x_min, x_max, y_min, y_max)) = ranges(all) else {
        return "Plot: no data\n".to_string();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Divider between history and forecast.
    if x_min < 0.5 && x_max > 0.5 {
        let x = map_x(0.5, x_min, x_max, width);
        for row in grid.iter_mut() {
            row[x] = '|';
        }
    }

    draw_series(&mut grid, &history, x_min, x_max, y_min, y_max, '.', '*');
    for (kind, pts) in &forecasts {
        let ch = marker(*kind);
        draw_series(&mut grid, pts, x_min, x_max, y_min, y_max, ch, ch);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: day=[{x_min:.0}, {x_max:.0}] | price=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = std::iter::once("* actual".to_string())
        .chain(forecasts.iter().map(|(k, _)| format!("{} {}", marker(*k), k.display_name())))
        .collect();
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

fn ranges<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &(x, y) in points {
        if !y.is_finite() {
            continue;
        }
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !(x_min.is_finite() && y_min.is_finite()) {
        return None;
    }
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    Some((x_min, x_max, y_min, y_max))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(min.abs() * 1e-3).max(1e-9);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[allow(clippy::too_many_arguments)]
fn draw_series(
    grid: &mut [Vec<char>],
    points: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    line: char,
    point: char,
) {
    let height = grid.len();
    let width = grid[0].len();

    let cells: Vec<(usize, usize)> = points
        .iter()
        .filter(|(_, y)| y.is_finite())
        .map(|&(x, y)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height)))
        .collect();

    for pair in cells.windows(2) {
        draw_line(grid, pair[0], pair[1], line);
    }
    for &(x, y) in &cells {
        grid[y][x] = point;
    }
}

/// Integer line drawing (Bresenham-ish); only fills blank or divider cells.
fn draw_line(grid: &mut [Vec<char>], from: (usize, usize), to: (usize, usize), ch: char) {
    let (mut x0, mut y0) = (from.0 as isize, from.1 as isize);
    let (x1, y1) = (to.0 as isize, to.1 as isize);

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        let cell = &mut grid[y0 as usize][x0 as usize];
        if *cell == ' ' || *cell == '|' {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
