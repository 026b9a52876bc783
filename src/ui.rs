//! Terminal output.
//!
//! - `print_status` - one `[status] target` line per build result
//! - `Table` - box-drawn table used by `mb plan`, shrunk to the terminal width

use crate::build::BuildStatus;
use colored::*;
use std::cmp;

pub fn status_line(name: &str, status: BuildStatus) -> String {
    let label = match status {
        BuildStatus::Built => status.label().green(),
        BuildStatus::UpToDate => status.label().cyan(),
        BuildStatus::Failed => status.label().red().bold(),
    };
    format!("[{}] {}", label, name)
}

pub fn print_status(name: &str, status: BuildStatus) {
    println!("{}", status_line(name, status));
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, width) = console::Term::stdout().size();
        print!("{}", self.render(width as usize));
    }

    /// Render for a terminal of `max_width` columns. Wide columns are
    /// truncated with `…` down to a minimum of 8 characters.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], console::measure_text_width(cell));
            }
        }

        let overhead = 3 + 3 * self.headers.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }

        let sep = |left: &str, mid: &str, right: &str| -> String {
            let cols: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, cols.join(mid), right)
        };
        let line = |cells: &[String]| -> String {
            let cols: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!(" {} ", fit(cell, *w)))
                .collect();
            format!("  │{}│\n", cols.join("│"))
        };

        let mut out = sep("┌", "┬", "┐");
        let headers: Vec<String> = self.headers.iter().map(|h| h.bold().to_string()).collect();
        out.push_str(&line(&headers));
        out.push_str(&sep("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out.push_str(&sep("└", "┴", "┘"));
        out
    }
}

fn fit(cell: &str, width: usize) -> String {
    let len = console::measure_text_width(cell);
    if len <= width {
        return format!("{}{}", cell, " ".repeat(width - len));
    }
    let plain = console::strip_ansi_codes(cell);
    let mut cut: String = plain.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
