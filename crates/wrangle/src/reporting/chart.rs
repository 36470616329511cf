//! Horizontal bar charts rendered as plain text.

use crate::frame::FrequencyEntry;
use std::fmt::Write;

/// Default width of the longest bar, in characters.
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Longest label printed before it gets truncated.
const MAX_LABEL_WIDTH: usize = 32;

/// A titled bar chart over frequency entries.
///
/// # Example
///
/// ```rust,ignore
/// let chart = BarChart::new("The 10 Countries with the Most Projects", "# of projects", &entries);
/// println!("{}", chart.render());
/// ```
#[derive(Debug, Clone)]
pub struct BarChart<'a> {
    title: &'a str,
    value_label: &'a str,
    entries: &'a [FrequencyEntry],
    bar_width: usize,
}

impl<'a> BarChart<'a> {
    pub fn new(title: &'a str, value_label: &'a str, entries: &'a [FrequencyEntry]) -> Self {
        Self {
            title,
            value_label,
            entries,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }

    /// Set the width of the longest bar.
    pub fn bar_width(mut self, width: usize) -> Self {
        self.bar_width = width.max(1);
        self
    }

    /// Render the chart. Bars are scaled so the largest count fills the
    /// full width; any non-zero count gets at least one block.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", "-".repeat(self.title.chars().count()));

        if self.entries.is_empty() {
            let _ = writeln!(out, "  (no data)");
            return out;
        }

        let labels: Vec<String> = self
            .entries
            .iter()
            .map(|e| truncate_label(&e.value, MAX_LABEL_WIDTH))
            .collect();
        let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let max_count = self.entries.iter().map(|e| e.count).max().unwrap_or(0);

        for (label, entry) in labels.iter().zip(self.entries) {
            let bar = scaled_length(entry.count, max_count, self.bar_width);
            let _ = writeln!(
                out,
                "  {:<label_width$} | {:<bar_width$} {}",
                label,
                "#".repeat(bar),
                entry.count,
                label_width = label_width,
                bar_width = self.bar_width,
            );
        }
        let _ = writeln!(out, "  {:<label_width$}   ({})", "", self.value_label);

        out
    }
}

fn scaled_length(count: usize, max_count: usize, width: usize) -> usize {
    if count == 0 || max_count == 0 {
        return 0;
    }
    let scaled = (count as f64 / max_count as f64 * width as f64).round() as usize;
    scaled.clamp(1, width)
}

/// Truncate a label to max length with ellipsis
fn truncate_label(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
