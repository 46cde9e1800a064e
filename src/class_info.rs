use crate::parser::{ResultTable, RunningOrderTable, SchemaWarning, TableLayout};
use crate::types::{Discipline, Elimination, Height, ResultRow, RunningOrderRow};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Lifecycle of one qualifying round, derived from which pages are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    NotStarted,
    InProgress,
    Completed,
    NotStartedNoRunningOrders,
}

impl ClassStatus {
    /// Pure mapping from URL presence to status.
    pub fn from_urls(has_running_orders: bool, has_results: bool) -> Self {
        match (has_running_orders, has_results) {
            (true, true) => ClassStatus::InProgress,
            (false, true) => ClassStatus::Completed,
            (true, false) => ClassStatus::NotStarted,
            (false, false) => ClassStatus::NotStartedNoRunningOrders,
        }
    }

    /// completed(0) < in progress(1) < not started(2)
    pub fn severity(&self) -> u8 {
        match self {
            ClassStatus::Completed => 0,
            ClassStatus::InProgress => 1,
            ClassStatus::NotStarted | ClassStatus::NotStartedNoRunningOrders => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::NotStarted => "not started",
            ClassStatus::InProgress => "in progress",
            ClassStatus::Completed => "completed",
            ClassStatus::NotStartedNoRunningOrders => "not started, no running orders",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a round relative to its sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrder {
    First,
    Second,
    /// Both rounds report the same lifecycle status; sequencing needs other evidence
    SameState,
}

impl RunOrder {
    pub fn value(&self) -> u8 {
        match self {
            RunOrder::First => 0,
            RunOrder::Second => 1,
            RunOrder::SameState => 2,
        }
    }
}

/// One qualifying round of a championship final
#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub discipline: Discipline,
    pub height: Option<Height>,
    pub class_number: Option<String>,
    pub results_url: Option<String>,
    pub running_orders_url: Option<String>,
    status: ClassStatus,
    order: RunOrder,
    results: Vec<ResultRow>,
    eliminations: Vec<Elimination>,
    running_orders: Option<Vec<RunningOrderRow>>,
    layout: Option<TableLayout>,
    warnings: Vec<SchemaWarning>,
}

impl ClassInfo {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            height: None,
            class_number: None,
            results_url: None,
            running_orders_url: None,
            status: ClassStatus::NotStartedNoRunningOrders,
            order: RunOrder::SameState,
            results: Vec::new(),
            eliminations: Vec::new(),
            running_orders: None,
            layout: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_height(mut self, height: Height) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_results_url(mut self, url: impl Into<String>) -> Self {
        self.results_url = Some(url.into());
        self.update_status();
        self
    }

    pub fn with_running_orders_url(mut self, url: impl Into<String>) -> Self {
        self.running_orders_url = Some(url.into());
        self.update_status();
        self
    }

    pub fn status(&self) -> ClassStatus {
        self.status
    }

    pub fn order(&self) -> RunOrder {
        self.order
    }

    /// Recompute the status from the URLs currently known; idempotent.
    pub fn update_status(&mut self) -> ClassStatus {
        self.status =
            ClassStatus::from_urls(self.running_orders_url.is_some(), self.results_url.is_some());
        self.status
    }

    /// Assign relative run order against the sibling round.
    pub fn update_order(&mut self, other: &mut ClassInfo) {
        let (mine, theirs) = (self.status.severity(), other.status.severity());
        let (a, b) = match mine.cmp(&theirs) {
            std::cmp::Ordering::Less => (RunOrder::First, RunOrder::Second),
            std::cmp::Ordering::Greater => (RunOrder::Second, RunOrder::First),
            std::cmp::Ordering::Equal => (RunOrder::SameState, RunOrder::SameState),
        };
        self.order = a;
        other.order = b;
        debug!(
            "{} order {:?}, {} order {:?}",
            self.discipline, a, other.discipline, b
        );
    }

    pub fn import_results(&mut self, table: ResultTable) {
        self.layout = Some(table.layout);
        self.results = table.rows;
        self.eliminations = table.eliminations;
        self.warnings.extend(table.warnings);
    }

    pub fn import_running_orders(&mut self, table: RunningOrderTable) {
        self.running_orders = Some(table.rows);
        self.warnings.extend(table.warnings);
    }

    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn eliminations(&self) -> &[Elimination] {
        &self.eliminations
    }

    pub fn running_orders(&self) -> Option<&[RunningOrderRow]> {
        self.running_orders.as_deref()
    }

    /// Layout of the imported results table, if any
    pub fn layout(&self) -> Option<TableLayout> {
        self.layout
    }

    pub fn warnings(&self) -> &[SchemaWarning] {
        &self.warnings
    }

    /// First row by rank
    pub fn winner(&self) -> Option<&ResultRow> {
        self.results.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(running_orders: bool, results: bool) -> ClassInfo {
        let mut c = ClassInfo::new(Discipline::Agility);
        if running_orders {
            c = c.with_running_orders_url("https://example.test/ro");
        }
        if results {
            c = c.with_results_url("https://example.test/results");
        }
        c
    }

    #[test]
    fn test_status_from_urls() {
        assert_eq!(class(true, true).status(), ClassStatus::InProgress);
        assert_eq!(class(false, true).status(), ClassStatus::Completed);
        assert_eq!(class(true, false).status(), ClassStatus::NotStarted);
        assert_eq!(class(false, false).status(), ClassStatus::NotStartedNoRunningOrders);
        assert_eq!(
            class(false, false).status().to_string(),
            "not started, no running orders"
        );
    }

    #[test]
    fn test_update_status_is_idempotent() {
        let mut c = class(true, true);
        let first = c.update_status();
        assert_eq!(c.update_status(), first);
        c.running_orders_url = None;
        assert_eq!(c.update_status(), ClassStatus::Completed);
    }

    #[test]
    fn test_update_order_is_antisymmetric() {
        let mut completed = class(false, true);
        let mut running = class(true, true);
        completed.update_order(&mut running);
        assert_eq!(completed.order(), RunOrder::First);
        assert_eq!(running.order(), RunOrder::Second);

        running.update_order(&mut completed);
        assert_eq!(running.order(), RunOrder::Second);
        assert_eq!(completed.order(), RunOrder::First);
    }

    #[test]
    fn test_update_order_same_state() {
        let mut a = class(false, true);
        let mut b = class(false, true);
        a.update_order(&mut b);
        assert_eq!(a.order().value(), 2);
        assert_eq!(b.order().value(), 2);
    }
}
