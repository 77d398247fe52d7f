// ── Terminal output helpers ──
//
// Table rendering and status coloring. Kept dumb on purpose: rows in,
// text out.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Render rows with the house table style.
pub fn table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(nothing cached -- run 'wifimgr refresh')".to_owned();
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Color a status word by its conventional severity.
pub fn colorize_status(status: &str) -> String {
    match status {
        "online" | "ok" | "healthy" => status.green().to_string(),
        "offline" | "corrupted" | "unhealthy" => status.red().to_string(),
        "alerting" | "stale" | "dormant" => status.yellow().to_string(),
        other => other.to_owned(),
    }
}
