//! Number formatting and small layout helpers for the stats screens.

use crate::render::canvas::{BLACK, Canvas, WHITE};
use crate::render::composer::Composer;

/// `1234` → `1.2K`, `2_500_000` → `2.5M`.
pub fn format_count(value: i64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

/// `42` → `42s`, `300` → `5m`, `3900` → `1h 5m`, `7200` → `2h`.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else {
        let (hours, minutes) = (seconds / 3600, (seconds % 3600) / 60);
        if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    }
}

/// Change against the previous period, e.g. `▲20%`, `▼5%`, `0%`.
///
/// Halves round to even, so 12.5% prints as `▲12%`.
pub fn format_change(current: i64, previous: i64) -> String {
    if previous == 0 {
        return if current > 0 { "▲100%".to_string() } else { "0%".to_string() };
    }
    let change = (current - previous) as f64 / previous as f64 * 100.0;
    let rounded = change.abs().round_ties_even() as i64;
    if change > 0.0 {
        format!("▲{}%", rounded)
    } else if change < 0.0 {
        format!("▼{}%", rounded)
    } else {
        "0%".to_string()
    }
}

/// Contribution count → shade level 0-3.
pub fn contribution_level(count: i64) -> u8 {
    match count {
        i64::MIN..=0 => 0,
        1..=3 => 1,
        4..=9 => 2,
        _ => 3,
    }
}

/// One square of the contribution grid.
///
/// ```text
/// 0  outline only     2  checkerboard
/// 1  sparse dots      3  solid
/// ```
pub fn draw_contribution_cell(canvas: &mut Canvas, x: i32, y: i32, size: usize, level: u8) {
    if level >= 3 {
        canvas.fill_rect(x, y, size, size, BLACK);
        return;
    }
    canvas.fill_rect(x, y, size, size, WHITE);
    canvas.stroke_rect(x, y, size, size, 1, BLACK);
    for dy in 0..size as i32 {
        for dx in 0..size as i32 {
            let ink = match level {
                1 => dx % 3 == 0 && dy % 3 == 0 && (dx + dy) % 4 == 0,
                2 => (dx + dy) % 2 == 0,
                _ => false,
            };
            if ink {
                canvas.set((x + dx) as usize, (y + dy) as usize, BLACK);
            }
        }
    }
}

/// A label / value / change column centered in `[x0, x0 + width)`.
pub struct StatColumn<'a> {
    pub label: &'a str,
    pub value: String,
    pub change: Option<String>,
}

impl StatColumn<'_> {
    pub fn draw(&self, composer: &Composer, canvas: &mut Canvas, x0: i32, width: usize, y: i32) {
        let label_font = composer.font(14);
        let value_font = composer.font(20);
        let change_font = composer.font(12);

        composer.draw_centered(canvas, &label_font, self.label, x0, width, y);
        let value_y = y + label_font.line_height() as i32;
        composer.draw_centered(canvas, &value_font, &self.value, x0, width, value_y);
        if let Some(change) = &self.change {
            let change_y = value_y + value_font.line_height() as i32;
            composer.draw_centered(canvas, &change_font, change, x0, width, change_y);
        }
    }
}
