use crate::error::Result;
use crate::matcher::{MatchTier, NameMatcher};
use crate::types::ShowCalendarEntry;
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read-only show calendar loaded once per session
#[derive(Debug, Clone, Default)]
pub struct ShowCalendar {
    entries: Vec<ShowCalendarEntry>,
}

impl ShowCalendar {
    pub fn new(entries: Vec<ShowCalendarEntry>) -> Self {
        Self { entries }
    }

    /// Load from a CSV file with `Show Name`, `Date` and optional `Cancelled` columns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let calendar = Self::from_reader(std::fs::File::open(path)?)?;
        info!("Loaded {} calendar shows from {}", calendar.entries.len(), path.display());
        Ok(calendar)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let entries = csv_reader
            .deserialize()
            .collect::<std::result::Result<Vec<ShowCalendarEntry>, csv::Error>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ShowCalendarEntry] {
        &self.entries
    }

    /// The `count` non-cancelled shows closest to `reference`, ordered for display:
    /// upcoming shows first (soonest first), then past shows (most recent first).
    pub fn nearest(&self, reference: NaiveDate, count: usize) -> Vec<ShowCalendarEntry> {
        let mut by_distance: Vec<&ShowCalendarEntry> =
            self.entries.iter().filter(|e| !e.cancelled).collect();
        by_distance.sort_by_key(|e| ((e.date - reference).num_days().abs(), e.date));

        let (mut future, mut past): (Vec<ShowCalendarEntry>, Vec<ShowCalendarEntry>) = by_distance
            .into_iter()
            .take(count)
            .cloned()
            .partition(|e| e.date > reference);

        future.sort_by_key(|e| e.date);
        past.sort_by(|a, b| b.date.cmp(&a.date));
        future.extend(past);
        future
    }

    /// Resolve a user-supplied show name among the nearest shows.
    pub fn resolve(
        &self,
        show_name: &str,
        reference: NaiveDate,
        count: usize,
        matcher: &NameMatcher,
    ) -> Result<(ShowCalendarEntry, MatchTier)> {
        let candidates = self.nearest(reference, count);
        debug!(
            "Matching '{}' against {} nearby shows around {}",
            show_name,
            candidates.len(),
            reference
        );
        let (entry, tier) = matcher.find(show_name, &candidates, |e| e.name.as_str())?;
        Ok((entry.clone(), tier))
    }
}
