use super::{first_digits, fit_row, SchemaWarning, TableDocument};
use crate::constants::WITHDRAWN_MARKER;
use crate::error::{FinalsError, Result};
use crate::types::RunningOrderRow;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

const POSITION_HEADERS: &[&str] = &["ro", "no", "no.", "#", "position", "running order", "order"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningOrderTable {
    pub rows: Vec<RunningOrderRow>,
    pub warnings: Vec<SchemaWarning>,
}

impl RunningOrderTable {
    pub fn withdrawn(&self) -> impl Iterator<Item = &RunningOrderRow> {
        self.rows.iter().filter(|r| r.withdrawn)
    }

    pub fn still_to_run(&self) -> impl Iterator<Item = &RunningOrderRow> {
        self.rows.iter().filter(|r| !r.withdrawn)
    }
}

/// Extract the start list of a round that has not finished yet.
pub fn extract_running_orders<D: TableDocument + ?Sized>(doc: &D) -> Result<RunningOrderTable> {
    let table = doc.find_first_table().ok_or_else(|| {
        FinalsError::MalformedSource(
            "no table found in running orders page; the page structure may have changed"
                .to_string(),
        )
    })?;

    if table.row_count() < 2 || table.rows().is_empty() {
        return Err(FinalsError::MalformedSource(format!(
            "running orders table has {} rows, expected a header and at least one entry",
            table.row_count()
        )));
    }

    let header = table.header_cells();
    if !header.iter().any(|h| !h.is_empty()) {
        return Err(FinalsError::MalformedSource(
            "running orders table has no non-empty header cells".to_string(),
        ));
    }

    let name_col = header
        .iter()
        .position(|h| h.eq_ignore_ascii_case("Name"))
        .ok_or_else(|| {
            FinalsError::MalformedSource(format!(
                "running orders table has no Name column: {:?}",
                header
            ))
        })?;
    let position_col = header
        .iter()
        .position(|h| POSITION_HEADERS.contains(&h.to_lowercase().as_str()))
        .or(if name_col == 0 { None } else { Some(0) });

    let width = header.len();
    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(table.rows().len());

    for (index, raw) in table.rows().iter().enumerate() {
        let cells = fit_row(index, raw.clone(), width, &mut warnings);
        let raw_name = cells[name_col].as_str();
        if raw_name.trim().is_empty() {
            debug!("Skipping running order row {} with no name", index);
            continue;
        }

        let withdrawn = raw_name.contains(WITHDRAWN_MARKER);
        let pairing = raw_name.replace(WITHDRAWN_MARKER, "").trim().to_string();
        let position = position_col
            .and_then(|col| first_digits(&cells[col]))
            .and_then(|d| d.parse().ok())
            .unwrap_or(index as u32 + 1);

        rows.push(RunningOrderRow {
            position,
            pairing,
            withdrawn,
        });
    }

    warn_duplicate_dogs(&rows);
    debug!(
        "Parsed {} running order rows ({} withdrawn)",
        rows.len(),
        rows.iter().filter(|r| r.withdrawn).count()
    );

    Ok(RunningOrderTable { rows, warnings })
}

fn warn_duplicate_dogs(rows: &[RunningOrderRow]) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for dog in rows.iter().filter_map(RunningOrderRow::dog) {
        *seen.entry(dog).or_default() += 1;
    }
    let mut duplicated: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(dog, _)| dog)
        .collect();
    if !duplicated.is_empty() {
        duplicated.sort_unstable();
        warn!("Duplicate dog names in running order: {:?}", duplicated);
    }
}
