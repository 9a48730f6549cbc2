//! Text table rendering.
//!
//! Renders a Markdown-compatible pipe table whose columns are sized to their
//! widest cell, so the same text reads well in a terminal and in a `.md` file.
//!
//! ## Example
//!
//! ```rust
//! use commitgate::ui::Table;
//!
//! let mut table = Table::new(&["Check", "Status"]);
//! table.add_row(vec!["clang-tidy".to_string(), "FAIL".to_string()]);
//! assert!(table.render().starts_with("| Check      | Status |"));
//! ```

use console::{Alignment, measure_text_width, pad_str};
use std::cmp;

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

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row.iter().map(|c| sanitize_content(c)).collect());
        }
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| measure_text_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], measure_text_width(cell));
            }
        }
        // Markdown needs at least three dashes per separator cell.
        widths.iter().map(|&w| cmp::max(w, 3)).collect()
    }

    pub fn render(&self) -> String {
        if self.headers.is_empty() {
            return String::new();
        }

        let widths = self.column_widths();
        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| pad_str(c, w, Alignment::Left, None).into_owned())
                .collect();
            format!("| {} |\n", padded.join(" | "))
        };

        let mut out = line(&self.headers);
        let separator: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        out.push_str(&line(&separator));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out
    }
}

/// Keep a cell on one line and out of the column separators.
fn sanitize_content(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            '|' => '/',
            _ => c,
        })
        .collect()
}
