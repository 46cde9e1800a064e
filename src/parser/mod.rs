//! Table-level parsing of results pages.
//!
//! Extractors work against the narrow [`TableDocument`] interface so they can
//! be driven either by real markup ([`HtmlDocument`]) or by a synthetic
//! [`RawTable`] in tests.

pub mod eliminations;
pub mod results;
pub mod running_orders;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

pub use eliminations::parse_eliminations;
pub use results::{extract_results, ResultTable, TableLayout};
pub use running_orders::{extract_running_orders, RunningOrderTable};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static TH: Lazy<Selector> = Lazy::new(|| Selector::parse("th").unwrap());
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

static FIRST_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static FIRST_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Text content of one `<table>`: header cells plus the `td` text of each row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    header_cells: Vec<String>,
    rows: Vec<Vec<String>>,
    row_count: usize,
}

impl RawTable {
    /// Build a table from header cells and data rows; the header counts as one row.
    pub fn new(header_cells: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len() + usize::from(!header_cells.is_empty());
        Self {
            header_cells,
            rows,
            row_count,
        }
    }

    pub fn from_strs(header_cells: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            header_cells.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    pub fn header_cells(&self) -> &[String] {
        &self.header_cells
    }

    /// Rows that carry at least one data cell, in document order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Every `<tr>` of the table, header rows included
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// The only view of a parsed page the table extractors need.
pub trait TableDocument {
    fn find_first_table(&self) -> Option<RawTable>;
}

impl TableDocument for RawTable {
    fn find_first_table(&self) -> Option<RawTable> {
        Some(self.clone())
    }
}

/// A parsed HTML page
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn has_table(&self) -> bool {
        self.html.select(&TABLE).next().is_some()
    }
}

impl TableDocument for HtmlDocument {
    fn find_first_table(&self) -> Option<RawTable> {
        let table = self.html.select(&TABLE).next()?;

        let header_cells = table.select(&TH).map(cell_text).collect();
        let mut row_count = 0;
        let mut rows = Vec::new();
        for tr in table.select(&TR) {
            row_count += 1;
            let cells: Vec<String> = tr.select(&TD).map(cell_text).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        Some(RawTable {
            header_cells,
            rows,
            row_count,
        })
    }
}

/// Whitespace-collapsed text of an element
pub fn cell_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First run of digits in `text`, e.g. "1st" -> "1"
pub fn first_digits(text: &str) -> Option<&str> {
    FIRST_DIGITS.find(text).map(|m| m.as_str())
}

/// First decimal number in `text`, e.g. "32.45s" -> 32.45
pub fn first_decimal(text: &str) -> Option<f64> {
    FIRST_DECIMAL.find(text).and_then(|m| m.as_str().parse().ok())
}

/// A row whose width did not match the header and was padded or truncated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaWarning {
    pub row: usize,
    pub found: usize,
    pub expected: usize,
}

/// Pad with empty cells or truncate `row` to `width`, recording a warning on mismatch.
pub(crate) fn fit_row(
    index: usize,
    mut row: Vec<String>,
    width: usize,
    warnings: &mut Vec<SchemaWarning>,
) -> Vec<String> {
    if row.len() != width {
        tracing::warn!(
            "schema-mismatch: row {} has {} cells, expected {}",
            index,
            row.len(),
            width
        );
        warnings.push(SchemaWarning {
            row: index,
            found: row.len(),
            expected: width,
        });
        row.resize(width, String::new());
    }
    row
}
