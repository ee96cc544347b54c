//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Two views:
//! - spend per tier as horizontal bars (`#` optimised, `=` previous)
//! - total uplift against budget from a sweep (`*` points joined by `-`)

use crate::optimise::SweepPoint;
use crate::report::TierComparison;

/// Horizontal bars of spend per tier, optimised above previous.
///
/// Both series share one scale so bar lengths are comparable.
pub fn render_tier_bars(rows: &[TierComparison], width: usize) -> String {
    let width = width.max(10);
    let max = rows
        .iter()
        .flat_map(|r| [r.optimised.spend, r.previous.spend])
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    out.push_str("Spend by tier (# optimised, = previous)\n");
    for r in rows {
        let label = r.tier.display_name();
        out.push_str(format!("{label:<4}|{}", bar(r.optimised.spend, max, width, '#')).trim_end());
        out.push('\n');
        out.push_str(format!("{:<4}|{}", "", bar(r.previous.spend, max, width, '=')).trim_end());
        out.push('\n');
    }
    out
}

fn bar(value: f64, max: f64, width: usize, ch: char) -> String {
    if !(max > 0.0 && value > 0.0) {
        return String::new();
    }
    let n = ((value / max).clamp(0.0, 1.0) * width as f64).round() as usize;
    std::iter::repeat_n(ch, n).collect()
}

/// Plot total uplift against budget.
pub fn render_budget_curve(points: &[SweepPoint], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (b_min, b_max) = range(points.iter().map(|p| p.budget)).unwrap_or((0.0, 1.0));
    let (u_min, u_max) = range(points.iter().map(|p| p.total_uplift)).unwrap_or((0.0, 1.0));
    let (u_min, u_max) = pad_range(u_min, u_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let mut prev = None;
    for p in points {
        let x = map_x(p.budget, b_min, b_max, width);
        let y = map_y(p.total_uplift, u_min, u_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, x, y, '-');
        }
        prev = Some((x, y));
    }
    // Points last so they sit on top of the connecting lines.
    for p in points {
        let x = map_x(p.budget, b_min, b_max, width);
        let y = map_y(p.total_uplift, u_min, u_max, height);
        grid[y][x] = '*';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: budget=[{b_min:.0}, {b_max:.0}] | uplift=[{u_min:.2}, {u_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(v: f64, v_min: f64, v_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - v_min) / (v_max - v_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;
    use crate::report::Totals;

    #[test]
    fn tier_bars_golden_snapshot() {
        let rows = vec![
            TierComparison {
                tier: Tier::Xxl,
                optimised: Totals { spend: 100.0, uplift: 1.0 },
                previous: Totals { spend: 50.0, uplift: 1.0 },
            },
            TierComparison {
                tier: Tier::S,
                optimised: Totals { spend: 0.0, uplift: 0.0 },
                previous: Totals { spend: 20.0, uplift: 1.0 },
            },
        ];
        let txt = render_tier_bars(&rows, 10);
        let expected = concat!(
            "Spend by tier (# optimised, = previous)\n",
            "XXL |##########\n",
            "    |=====\n",
            "S   |\n",
            "    |==\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn budget_curve_golden_snapshot() {
        let points = vec![
            SweepPoint { budget: 0.0, total_spend: 0.0, total_uplift: 0.0, steps_used: 0 },
            SweepPoint { budget: 100.0, total_spend: 100.0, total_uplift: 10.0, steps_used: 1 },
        ];
        let txt = render_budget_curve(&points, 10, 5);
        let expected = concat!(
            "Plot: budget=[0, 100] | uplift=[-0.50, 10.50]\n",
            "        -*\n",
            "      --\n",
            "    --\n",
            "  --\n",
            "*-\n",
        );
        assert_eq!(txt, expected);
    }
}
