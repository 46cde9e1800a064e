//! Merge of the two qualifying rounds into final standings.

use crate::class_info::{ClassInfo, ClassStatus, RunOrder};
use crate::error::{FinalsError, Result};
use crate::types::{Discipline, ResultRow};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStatus {
    FinalRunningOrder,
    PartialRunningOrder,
    InProgress,
    NotStarted,
}

impl FinalStatus {
    pub fn derive(jumping: ClassStatus, agility: ClassStatus) -> Self {
        use ClassStatus::{Completed, InProgress, NotStarted};
        match (jumping, agility) {
            (Completed, Completed) => FinalStatus::FinalRunningOrder,
            (InProgress, Completed) | (Completed, InProgress) => FinalStatus::PartialRunningOrder,
            (NotStarted, NotStarted) => FinalStatus::NotStarted,
            (InProgress, _) => FinalStatus::InProgress,
            _ => FinalStatus::NotStarted,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::FinalRunningOrder => "final running order",
            FinalStatus::PartialRunningOrder => "partial running order",
            FinalStatus::InProgress => "in progress",
            FinalStatus::NotStarted => "not started",
        }
    }
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pairing placed in both rounds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRow {
    /// 1-based position in the standings
    pub place: usize,
    pub pairing: String,
    pub agility_rank: u32,
    pub jumping_rank: u32,
    pub combined_points: u32,
    pub combined_faults: f64,
    pub combined_time: f64,
}

/// How the standings rows are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingOrder {
    /// Combined points, then combined faults, then combined time, then pairing
    Points,
    /// Combined faults, then combined time, then agility rank, then pairing
    Faults,
}

/// Snapshot of the final for one height; a refresh builds a new one.
#[derive(Debug, Clone, Serialize)]
pub struct FinalStanding {
    pub status: FinalStatus,
    pub order: StandingOrder,
    pub agility: ClassInfo,
    pub jumping: ClassInfo,
    pub rows: Vec<CombinedRow>,
}

impl FinalStanding {
    /// Combine both rounds' results by exact pairing identity.
    ///
    /// Standings are ordered by combined points, then combined faults, then
    /// combined time, then pairing name.
    pub fn combine(agility: &ClassInfo, jumping: &ClassInfo) -> Result<Self> {
        for class in [agility, jumping] {
            if !class.has_results() {
                return Err(FinalsError::MissingData(format!(
                    "{} round has no imported results ({})",
                    class.discipline,
                    class.status()
                )));
            }
        }

        check_unique(agility)?;
        let jumping_by_pairing = index_by_pairing(jumping)?;

        let mut rows = agility
            .results()
            .iter()
            .filter_map(|a| {
                jumping_by_pairing
                    .get(a.pairing.as_str())
                    .map(|j| combined_row(a, j))
            })
            .collect::<Result<Vec<CombinedRow>>>()?;

        rank_rows(&mut rows, StandingOrder::Points);

        let status = FinalStatus::derive(jumping.status(), agility.status());
        info!(
            "Combined {} pairings ({} agility, {} jumping), status {}",
            rows.len(),
            agility.results().len(),
            jumping.results().len(),
            status
        );

        Ok(Self {
            status,
            order: StandingOrder::Points,
            agility: agility.clone(),
            jumping: jumping.clone(),
            rows,
        })
    }

    /// The same snapshot ranked by faults instead of points; places are reassigned.
    pub fn by_faults(&self) -> Self {
        self.ranked_by(StandingOrder::Faults)
    }

    pub fn ranked_by(&self, order: StandingOrder) -> Self {
        let mut standing = self.clone();
        standing.order = order;
        rank_rows(&mut standing.rows, order);
        standing
    }

    /// The round that ran first, unless both report the same state
    pub fn first_round(&self) -> Option<Discipline> {
        match (self.agility.order(), self.jumping.order()) {
            (RunOrder::First, _) => Some(Discipline::Agility),
            (_, RunOrder::First) => Some(Discipline::Jumping),
            _ => None,
        }
    }

    pub fn agility_winner(&self) -> Option<&ResultRow> {
        self.agility.winner()
    }

    pub fn jumping_winner(&self) -> Option<&ResultRow> {
        self.jumping.winner()
    }

    pub fn top(&self, n: usize) -> &[CombinedRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

fn combined_row(agility: &ResultRow, jumping: &ResultRow) -> Result<CombinedRow> {
    let combined_points = agility.rank.checked_add(jumping.rank).ok_or_else(|| {
        FinalsError::MalformedSource(format!(
            "ranks {} and {} for '{}' are out of range",
            agility.rank, jumping.rank, agility.pairing
        ))
    })?;
    Ok(CombinedRow {
        place: 0,
        pairing: agility.pairing.clone(),
        agility_rank: agility.rank,
        jumping_rank: jumping.rank,
        combined_points,
        combined_faults: agility.faults + jumping.faults,
        combined_time: agility.time + jumping.time,
    })
}

fn rank_rows(rows: &mut [CombinedRow], order: StandingOrder) {
    match order {
        StandingOrder::Points => rows.sort_by(points_order),
        StandingOrder::Faults => rows.sort_by(faults_order),
    }
    for (idx, row) in rows.iter_mut().enumerate() {
        row.place = idx + 1;
    }
}

fn points_order(a: &CombinedRow, b: &CombinedRow) -> Ordering {
    a.combined_points
        .cmp(&b.combined_points)
        .then_with(|| a.combined_faults.total_cmp(&b.combined_faults))
        .then_with(|| a.combined_time.total_cmp(&b.combined_time))
        .then_with(|| a.pairing.cmp(&b.pairing))
}

fn faults_order(a: &CombinedRow, b: &CombinedRow) -> Ordering {
    a.combined_faults
        .total_cmp(&b.combined_faults)
        .then_with(|| a.combined_time.total_cmp(&b.combined_time))
        .then_with(|| a.agility_rank.cmp(&b.agility_rank))
        .then_with(|| a.pairing.cmp(&b.pairing))
}

fn check_unique(class: &ClassInfo) -> Result<()> {
    let mut seen = HashSet::new();
    for row in class.results() {
        if !seen.insert(row.pairing.as_str()) {
            return Err(duplicate(class, &row.pairing));
        }
    }
    Ok(())
}

fn index_by_pairing(class: &ClassInfo) -> Result<HashMap<&str, &ResultRow>> {
    let mut index = HashMap::with_capacity(class.results().len());
    for row in class.results() {
        if index.insert(row.pairing.as_str(), row).is_some() {
            return Err(duplicate(class, &row.pairing));
        }
    }
    debug!("Indexed {} {} pairings", index.len(), class.discipline);
    Ok(index)
}

fn duplicate(class: &ClassInfo, pairing: &str) -> FinalsError {
    FinalsError::DuplicatePairing(format!(
        "'{}' appears more than once in the {} results",
        pairing, class.discipline
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ResultTable, TableLayout};

    fn row(rank: u32, pairing: &str, faults: f64, time: f64) -> ResultRow {
        ResultRow {
            rank,
            mobile_place: rank.to_string(),
            kc_name: String::new(),
            pairing: pairing.to_string(),
            run_data: String::new(),
            faults,
            time,
        }
    }

    fn completed(discipline: Discipline, rows: Vec<ResultRow>) -> ClassInfo {
        let mut class = ClassInfo::new(discipline).with_results_url("https://example.test/r");
        class.import_results(ResultTable {
            layout: TableLayout::Complete,
            rows,
            eliminations: Vec::new(),
            warnings: Vec::new(),
        });
        class
    }

    #[test]
    fn test_status_table() {
        use ClassStatus::*;
        assert_eq!(FinalStatus::derive(Completed, Completed), FinalStatus::FinalRunningOrder);
        assert_eq!(FinalStatus::derive(InProgress, Completed), FinalStatus::PartialRunningOrder);
        assert_eq!(FinalStatus::derive(Completed, InProgress), FinalStatus::PartialRunningOrder);
        assert_eq!(FinalStatus::derive(NotStarted, NotStarted), FinalStatus::NotStarted);
        assert_eq!(FinalStatus::derive(InProgress, NotStarted), FinalStatus::InProgress);
        assert_eq!(FinalStatus::derive(InProgress, InProgress), FinalStatus::InProgress);
        assert_eq!(FinalStatus::derive(NotStarted, InProgress), FinalStatus::NotStarted);
        assert_eq!(
            FinalStatus::derive(Completed, NotStartedNoRunningOrders),
            FinalStatus::NotStarted
        );
    }

    #[test]
    fn test_tie_break_on_faults_then_time() {
        let agility = completed(
            Discipline::Agility,
            vec![row(1, "A", 5.0, 30.0), row(2, "B", 0.0, 31.0), row(3, "C", 0.0, 29.0)],
        );
        let jumping = completed(
            Discipline::Jumping,
            vec![row(1, "C", 0.0, 20.0), row(2, "B", 0.0, 20.0), row(3, "A", 0.0, 20.0)],
        );
        let standing = FinalStanding::combine(&agility, &jumping).unwrap();
        let order: Vec<&str> = standing.rows.iter().map(|r| r.pairing.as_str()).collect();
        // all on 4 points: B and C clear, C faster
        assert_eq!(order, vec!["C", "B", "A"]);
        assert_eq!(standing.rows[0].place, 1);
        assert_eq!(standing.rows[2].place, 3);
    }

    #[test]
    fn test_by_faults_ranks_on_faults_then_time_then_agility_rank() {
        let agility = completed(
            Discipline::Agility,
            vec![
                row(1, "A", 5.0, 30.0),
                row(2, "Zed", 0.0, 31.0),
                row(3, "Cob", 0.0, 32.0),
                row(4, "Ada", 0.0, 33.0),
            ],
        );
        let jumping = completed(
            Discipline::Jumping,
            vec![
                row(1, "A", 0.0, 20.0),
                row(2, "Ada", 0.0, 20.0),
                row(3, "Cob", 0.0, 21.0),
                row(4, "Zed", 0.0, 22.0),
            ],
        );
        let standing = FinalStanding::combine(&agility, &jumping).unwrap();
        let by_points: Vec<&str> = standing.rows.iter().map(|r| r.pairing.as_str()).collect();
        // A leads on 2 points; the rest tie on points, faults and time
        assert_eq!(by_points, vec!["A", "Ada", "Cob", "Zed"]);

        let by_faults = standing.by_faults();
        assert_eq!(by_faults.order, StandingOrder::Faults);
        let order: Vec<&str> = by_faults.rows.iter().map(|r| r.pairing.as_str()).collect();
        // clear rounds first, all on 53.0s, so agility rank decides
        assert_eq!(order, vec!["Zed", "Cob", "Ada", "A"]);
        assert_eq!(by_faults.rows[0].place, 1);
        assert_eq!(by_faults.rows[3].place, 4);
        assert_eq!(by_faults.rows[3].combined_points, 2);

        assert_eq!(standing.order, StandingOrder::Points);
        assert_eq!(standing.rows[0].pairing, "A");
    }

    #[test]
    fn test_single_round_pairings_are_excluded() {
        let agility = completed(
            Discipline::Agility,
            vec![row(1, "A", 0.0, 30.0), row(2, "Only Ag", 0.0, 31.0)],
        );
        let jumping = completed(
            Discipline::Jumping,
            vec![row(1, "Only Jp", 0.0, 20.0), row(2, "A", 0.0, 21.0)],
        );
        let standing = FinalStanding::combine(&agility, &jumping).unwrap();
        assert_eq!(standing.rows.len(), 1);
        assert_eq!(standing.rows[0].combined_points, 3);
    }

    #[test]
    fn test_duplicate_pairing_is_error() {
        let agility = completed(Discipline::Agility, vec![row(1, "A", 0.0, 30.0)]);
        let jumping = completed(
            Discipline::Jumping,
            vec![row(1, "A", 0.0, 20.0), row(2, "A", 0.0, 21.0)],
        );
        assert!(matches!(
            FinalStanding::combine(&agility, &jumping),
            Err(FinalsError::DuplicatePairing(_))
        ));
    }

    #[test]
    fn test_out_of_range_ranks_are_malformed() {
        let agility = completed(Discipline::Agility, vec![row(4_000_000_000, "A", 0.0, 30.0)]);
        let jumping = completed(Discipline::Jumping, vec![row(4_000_000_000, "A", 0.0, 20.0)]);
        assert!(matches!(
            FinalStanding::combine(&agility, &jumping),
            Err(FinalsError::MalformedSource(_))
        ));
    }

    #[test]
    fn test_missing_results() {
        let agility = completed(Discipline::Agility, vec![row(1, "A", 0.0, 30.0)]);
        let jumping = ClassInfo::new(Discipline::Jumping)
            .with_running_orders_url("https://example.test/ro");
        assert!(matches!(
            FinalStanding::combine(&agility, &jumping),
            Err(FinalsError::MissingData(_))
        ));
    }

    #[test]
    fn test_first_round_is_none_for_same_state() {
        let mut agility = completed(Discipline::Agility, vec![row(1, "A", 0.0, 30.0)]);
        let mut jumping = completed(Discipline::Jumping, vec![row(1, "A", 0.0, 20.0)]);
        agility.update_order(&mut jumping);
        let standing = FinalStanding::combine(&agility, &jumping).unwrap();
        assert_eq!(standing.first_round(), None);
        assert_eq!(standing.top(10).len(), 1);
    }
}
