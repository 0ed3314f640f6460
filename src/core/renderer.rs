use crate::core::format::{format_cell, ColumnFormats, Locale};
use crate::core::surface::{BodyRow, HeaderCell, TableSurface};
use crate::domain::model::Row;

pub const DEFAULT_NO_RESULTS: &str = "No hay resultados para mostrar";

/// Draws headers and rows into a `TableSurface`. Every call fully replaces
/// the part of the table it owns.
#[derive(Debug, Clone)]
pub struct TableRenderer {
    locale: Locale,
    no_results: String,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl TableRenderer {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            no_results: DEFAULT_NO_RESULTS.to_string(),
        }
    }

    pub fn with_no_results_message(mut self, message: impl Into<String>) -> Self {
        self.no_results = message.into();
        self
    }

    /// Builds the header row unless one already exists for the active
    /// result set. `columns` overrides discovery from the first row.
    pub fn render_headers(&self, table: &mut TableSurface, rows: &[Row], columns: Option<&[String]>) {
        if table.has_headers() {
            return;
        }
        let keys: Vec<String> = match columns {
            Some(columns) => columns.to_vec(),
            None => match rows.first() {
                Some(first) => first.data.keys().cloned().collect(),
                None => return,
            },
        };
        table.head = keys
            .into_iter()
            .map(|key| HeaderCell {
                label: humanize(&key),
                key,
            })
            .collect();
    }

    /// Renders one page of rows. Rows missing a column get a blank cell and
    /// fields outside the header set are not shown.
    pub fn render_rows(
        &self,
        table: &mut TableSurface,
        rows: &[Row],
        columns: Option<&[String]>,
        formats: &ColumnFormats,
    ) {
        table.body.clear();

        if rows.is_empty() {
            table.body.push(BodyRow::Placeholder {
                colspan: table.column_count().max(1),
                message: self.no_results.clone(),
            });
            return;
        }

        self.render_headers(table, rows, columns);

        let keys: Vec<&str> = table.head.iter().map(|h| h.key.as_str()).collect();
        let column_formats: Vec<_> = keys.iter().map(|key| formats.format_for(key)).collect();

        table.body = rows
            .iter()
            .map(|row| BodyRow::Cells {
                cells: keys
                    .iter()
                    .zip(&column_formats)
                    .map(|(key, format)| format_cell(row.get(key), *format, self.locale))
                    .collect(),
            })
            .collect();
    }

    /// Empty state: drop pagination and any discovered headers, leave the
    /// placeholder. Configured `columns` stay as the header row.
    pub fn render_empty(&self, table: &mut TableSurface, columns: Option<&[String]>) {
        table.clear_headers();
        table.pagination = None;
        self.render_headers(table, &[], columns);
        self.render_rows(table, &[], columns, &ColumnFormats::default());
    }
}

/// `fecha_compra` -> `Fecha compra`. Display only; keys are untouched.
pub fn humanize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.as_str().replace('_', " ");
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}
