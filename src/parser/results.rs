use super::{
    eliminations::parse_eliminations, first_decimal, first_digits, fit_row, SchemaWarning,
    TableDocument,
};
use crate::constants::{KC_NAMES_COLUMN, MOBILE_PLACE_COLUMN, RESULT_COLUMNS};
use crate::error::{FinalsError, Result};
use crate::types::{Elimination, ResultRow};
use serde::Serialize;
use tracing::{debug, warn};

/// Which of the two published result-table layouts a page uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableLayout {
    /// Headed by "Place": only emitted once the round has run to completion
    Complete,
    /// Headed by "Rank" while competitors are still running
    InProgress,
}

/// Canonical contents of one class results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub layout: TableLayout,
    pub rows: Vec<ResultRow>,
    pub eliminations: Vec<Elimination>,
    pub warnings: Vec<SchemaWarning>,
}

/// Column positions in the canonical (synthetic-columns-inserted) header
struct ColumnMap {
    pairing: usize,
    run_data: usize,
    faults: usize,
    time: usize,
}

impl ColumnMap {
    fn resolve(header: &[String]) -> Self {
        // Unknown headings fall back to the canonical position.
        let find = |name: &str| {
            let canonical = RESULT_COLUMNS.iter().position(|c| *c == name).unwrap_or(0);
            header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .unwrap_or(canonical)
        };
        Self {
            pairing: find("Name"),
            run_data: find("Run Data"),
            faults: find("Faults"),
            time: find("Time"),
        }
    }
}

fn detect_layout(header: &[String]) -> TableLayout {
    let has = |name: &str| header.iter().any(|h| h.eq_ignore_ascii_case(name));
    if has("Place") && !has("Rank") {
        TableLayout::Complete
    } else {
        TableLayout::InProgress
    }
}

/// Extract the ranked rows and the trailing elimination annotation of a results table.
pub fn extract_results<D: TableDocument + ?Sized>(doc: &D) -> Result<ResultTable> {
    let table = doc.find_first_table().ok_or_else(|| {
        FinalsError::MalformedSource(
            "no table found in results page; the page structure may have changed".to_string(),
        )
    })?;

    if table.row_count() < 2 {
        return Err(FinalsError::InsufficientData {
            rows: table.row_count(),
        });
    }
    if table.rows().len() < 2 {
        return Err(FinalsError::InsufficientData {
            rows: table.rows().len(),
        });
    }

    let source_header = table.header_cells();
    if !source_header.iter().any(|h| !h.is_empty()) {
        return Err(FinalsError::MalformedSource(
            "results table has no non-empty header cells".to_string(),
        ));
    }

    let layout = detect_layout(source_header);

    let mut header: Vec<String> = Vec::with_capacity(source_header.len() + 2);
    header.push(source_header[0].clone());
    header.push(MOBILE_PLACE_COLUMN.to_string());
    header.push(KC_NAMES_COLUMN.to_string());
    header.extend(source_header[1..].iter().cloned());
    let width = header.len();
    let columns = ColumnMap::resolve(&header);
    debug!("Results header {:?} ({:?})", header, layout);

    let (data_rows, elimination_row) = table.rows().split_at(table.rows().len() - 1);

    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(data_rows.len());
    for (index, raw) in data_rows.iter().enumerate() {
        let cells = fit_row(index, raw.clone(), width, &mut warnings);
        rows.push(canonical_row(index, &cells, &columns)?);
    }
    check_ranks(&rows)?;

    let eliminations = elimination_row
        .first()
        .and_then(|row| row.first())
        .map(|text| parse_eliminations(text))
        .unwrap_or_default()
        .into_iter()
        .map(|pairing| Elimination { pairing })
        .collect::<Vec<_>>();

    if !warnings.is_empty() {
        warn!("{} results rows did not match the header width", warnings.len());
    }
    debug!(
        "Parsed {} result rows and {} eliminations",
        rows.len(),
        eliminations.len()
    );

    Ok(ResultTable {
        layout,
        rows,
        eliminations,
        warnings,
    })
}

fn canonical_row(index: usize, cells: &[String], columns: &ColumnMap) -> Result<ResultRow> {
    let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

    let rank = first_digits(cell(0))
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|r| *r > 0)
        .ok_or_else(|| {
            FinalsError::MalformedSource(format!(
                "results row {} has no positive rank in '{}'",
                index,
                cell(0)
            ))
        })?;

    let pairing = cell(columns.pairing).trim().to_string();
    if pairing.is_empty() {
        return Err(FinalsError::MalformedSource(format!(
            "results row {} has no competitor name",
            index
        )));
    }

    Ok(ResultRow {
        rank,
        mobile_place: first_digits(cell(1)).unwrap_or_default().to_string(),
        kc_name: cell(2).to_string(),
        pairing,
        run_data: cell(columns.run_data).to_string(),
        faults: first_decimal(cell(columns.faults)).unwrap_or(0.0),
        time: first_decimal(cell(columns.time)).unwrap_or(0.0),
    })
}

fn check_ranks(rows: &[ResultRow]) -> Result<()> {
    for pair in rows.windows(2) {
        if pair[1].rank <= pair[0].rank {
            return Err(FinalsError::MalformedSource(format!(
                "ranks are not strictly increasing: {} then {}",
                pair[0].rank, pair[1].rank
            )));
        }
    }
    Ok(())
}
