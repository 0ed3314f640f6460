//! In-memory stand-in for the page: table head and body, pagination
//! controls, the status slot, control enablement and invalid-input markers.
//! The renderer and controller only ever write here; serializing to HTML,
//! text or CSV happens at the edge.

use crate::core::paginator::PaginationControls;
use crate::domain::model::{Severity, StatusMessage};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    /// Field key in the row data.
    pub key: String,
    /// Humanized label for display.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyRow {
    Cells { cells: Vec<String> },
    Placeholder { colspan: usize, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSurface {
    pub head: Vec<HeaderCell>,
    pub body: Vec<BodyRow>,
    pub pagination: Option<PaginationControls>,
}

impl TableSurface {
    pub fn has_headers(&self) -> bool {
        !self.head.is_empty()
    }

    pub fn clear_headers(&mut self) {
        self.head.clear();
    }

    pub fn column_count(&self) -> usize {
        self.head.len()
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &[String]> {
        self.body.iter().filter_map(|row| match row {
            BodyRow::Cells { cells } => Some(cells.as_slice()),
            BodyRow::Placeholder { .. } => None,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body.as_slice(), [BodyRow::Placeholder { .. }])
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<table>\n  <thead>\n");
        if self.has_headers() {
            out.push_str("    <tr>");
            for header in &self.head {
                let _ = write!(out, "<th>{}</th>", escape_html(&header.label));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("  </thead>\n  <tbody>\n");
        for row in &self.body {
            match row {
                BodyRow::Cells { cells } => {
                    out.push_str("    <tr>");
                    for cell in cells {
                        let _ = write!(out, "<td>{}</td>", escape_html(cell));
                    }
                    out.push_str("</tr>\n");
                }
                BodyRow::Placeholder { colspan, message } => {
                    let _ = writeln!(
                        out,
                        "    <tr><td colspan=\"{}\" class=\"placeholder\">{}</td></tr>",
                        colspan,
                        escape_html(message)
                    );
                }
            }
        }
        out.push_str("  </tbody>\n</table>\n");

        if let Some(controls) = &self.pagination {
            let _ = write!(
                out,
                "<div class=\"pagination\">\n  <div class=\"pagination-info\">{}</div>\n  <div class=\"pagination-controls\">\n    <button class=\"pagination-btn\" data-page=\"{}\"{}>Anterior</button>\n    <span class=\"pagination-info\">{}</span>\n    <button class=\"pagination-btn\" data-page=\"{}\"{}>Siguiente</button>\n  </div>\n</div>\n",
                controls.range_text(),
                controls.page_number.saturating_sub(1),
                if controls.previous_enabled { "" } else { " disabled" },
                controls.page_text(),
                controls.page_number + 1,
                if controls.next_enabled { "" } else { " disabled" },
            );
        }
        out
    }

    /// Tab-separated lines, header first.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        if self.has_headers() {
            lines.push(
                self.head
                    .iter()
                    .map(|h| h.label.as_str())
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }
        for row in &self.body {
            match row {
                BodyRow::Cells { cells } => lines.push(cells.join("\t")),
                BodyRow::Placeholder { message, .. } => lines.push(message.clone()),
            }
        }
        if let Some(controls) = &self.pagination {
            lines.push(format!("{} | {}", controls.range_text(), controls.page_text()));
        }
        lines.join("\n")
    }

    /// Header labels and rendered cells; placeholders are skipped.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.has_headers() {
            writer.write_record(self.head.iter().map(|h| h.label.as_str()))?;
        }
        for cells in self.data_rows() {
            writer.write_record(cells)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSurface {
    pub table: TableSurface,
    pub status: StatusMessage,
    pub controls_enabled: bool,
    pub invalid_inputs: BTreeSet<String>,
}

impl ViewSurface {
    pub fn new(initial_status: impl Into<String>) -> Self {
        Self {
            table: TableSurface::default(),
            status: StatusMessage::new(initial_status, Severity::Info),
            controls_enabled: true,
            invalid_inputs: BTreeSet::new(),
        }
    }

    /// Overwrites the single status slot.
    pub fn set_status(&mut self, text: impl Into<String>, severity: Severity) {
        self.status = StatusMessage::new(text, severity);
    }

    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    pub fn mark_input(&mut self, field: &str, valid: bool) {
        if valid {
            self.invalid_inputs.remove(field);
        } else {
            self.invalid_inputs.insert(field.to_string());
        }
    }

    pub fn is_input_invalid(&self, field: &str) -> bool {
        self.invalid_inputs.contains(field)
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"status-message {}\">{}</div>\n{}",
            self.status.severity.as_str(),
            escape_html(&self.status.text),
            self.table.to_html()
        )
    }

    /// The whole surface as pretty JSON, for scripted consumers.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
