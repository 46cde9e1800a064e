//! Request-scoped orchestration of one refresh.
//!
//! A [`FinalsTracker`] holds only configuration and a fetcher. Every refresh
//! builds its own [`FinalSession`] with a fresh `ClassInfo` pair, so
//! concurrent refreshes never share class state.

use crate::apis::plaza;
use crate::app::ports::DocumentFetcher;
use crate::calendar::ShowCalendar;
use crate::class_info::{ClassInfo, ClassStatus};
use crate::combine::{FinalStanding, FinalStatus};
use crate::config::Config;
use crate::error::{FinalsError, Result};
use crate::matcher::NameMatcher;
use crate::parser::{extract_results, extract_running_orders, HtmlDocument, TableLayout};
use crate::types::{ClassId, Discipline, Height, ShowCalendarEntry};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// One refresh's view of a final: both rounds, imported from the source.
#[derive(Debug, Clone, Serialize)]
pub struct FinalSession {
    pub agility: ClassInfo,
    pub jumping: ClassInfo,
}

impl FinalSession {
    pub fn new(agility: ClassInfo, jumping: ClassInfo) -> Self {
        Self { agility, jumping }
    }

    pub fn status(&self) -> FinalStatus {
        FinalStatus::derive(self.jumping.status(), self.agility.status())
    }

    /// Combined standings; fails with `MissingData` until both rounds have results.
    pub fn standing(&self) -> Result<FinalStanding> {
        FinalStanding::combine(&self.agility, &self.jumping)
    }
}

pub struct FinalsTracker<F: DocumentFetcher> {
    fetcher: F,
    config: Config,
    matcher: NameMatcher,
}

impl<F: DocumentFetcher> FinalsTracker<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        let matcher = NameMatcher::new(config.matcher.fuzzy_threshold);
        Self {
            fetcher,
            config,
            matcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Reference date for calendar lookups: today shifted by `calendar.days_ahead`.
    pub fn reference_date(&self) -> NaiveDate {
        Local::now().date_naive() + Duration::days(self.config.calendar.days_ahead)
    }

    /// Resolve a user-supplied show name to its calendar entry.
    pub fn resolve_show(
        &self,
        calendar: &ShowCalendar,
        show_name: &str,
    ) -> Result<ShowCalendarEntry> {
        let (entry, tier) = calendar.resolve(
            show_name,
            self.reference_date(),
            self.config.calendar.num_shows,
            &self.matcher,
        )?;
        info!("Resolved '{}' to '{}' on {} ({:?})", show_name, entry.name, entry.date, tier);
        Ok(entry)
    }

    /// Find the results-page URL of a show held on `date`.
    #[instrument(skip(self))]
    pub async fn find_show_url(&self, show_name: &str, date: NaiveDate) -> Result<String> {
        let year_url = plaza::year_results_url(&self.config.plaza.results_url, date.year());
        let body = self.fetcher.fetch(&year_url).await?;

        let sections = plaza::parse_month_sections(&body);
        let (link, tier) = plaza::find_show_link(&sections, show_name, date, &self.matcher)?;
        let url = plaza::absolute_url(&self.config.plaza.results_url, &link)?;
        info!("Show '{}' found ({:?}) at {}", show_name, tier, url);
        Ok(url)
    }

    /// Discover both rounds on a show page and import everything published for them.
    #[instrument(skip(self))]
    pub async fn refresh(&self, show_url: &str, height: Height) -> Result<FinalSession> {
        let body = self.fetcher.fetch(show_url).await?;
        let (agility, jumping) =
            plaza::find_championship_classes(&body, height, &self.config.plaza.base_url)?;
        self.import_session(FinalSession::new(agility, jumping)).await
    }

    /// Build and import a session from two class identifiers.
    ///
    /// Without a show page, a round's pages count as published when they
    /// serve a table. Running orders are ignored once the results table is in
    /// its completed layout.
    #[instrument(skip(self))]
    pub async fn refresh_from_ids(
        &self,
        agility_id: &ClassId,
        jumping_id: &ClassId,
    ) -> Result<FinalSession> {
        let mut agility = self.inspect_class(Discipline::Agility, agility_id).await?;
        let mut jumping = self.inspect_class(Discipline::Jumping, jumping_id).await?;
        agility.update_order(&mut jumping);
        self.import_session(FinalSession::new(agility, jumping)).await
    }

    async fn inspect_class(&self, discipline: Discipline, id: &ClassId) -> Result<ClassInfo> {
        let base = &self.config.plaza.base_url;
        let mut class = ClassInfo::new(discipline);
        class.class_number = Some(id.to_string());

        let results_url = id.results_url(base);
        let mut completed_layout = false;
        if let Some(body) = self.fetch_optional(&results_url).await? {
            let doc = HtmlDocument::parse(&body);
            if doc.has_table() {
                completed_layout = matches!(
                    extract_results(&doc).map(|t| t.layout),
                    Ok(TableLayout::Complete)
                );
                class.results_url = Some(results_url);
            }
        }

        let running_orders_url = id.running_orders_url(base);
        if !completed_layout {
            if let Some(body) = self.fetch_optional(&running_orders_url).await? {
                if HtmlDocument::parse(&body).has_table() {
                    class.running_orders_url = Some(running_orders_url);
                }
            }
        }

        class.update_status();
        debug!("Inspected {} class {}: {}", discipline, id, class.status());
        Ok(class)
    }

    /// A 404 means the page is not published yet; other failures pass through.
    async fn fetch_optional(&self, url: &str) -> Result<Option<String>> {
        match self.fetcher.fetch(url).await {
            Ok(body) => Ok(Some(body)),
            Err(FinalsError::Fetch { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetch and import every page the session's classes point at.
    pub async fn import_session(&self, mut session: FinalSession) -> Result<FinalSession> {
        self.import_class(&mut session.agility).await?;
        self.import_class(&mut session.jumping).await?;
        info!("Final status: {}", session.status());
        Ok(session)
    }

    async fn import_class(&self, class: &mut ClassInfo) -> Result<()> {
        if let Some(url) = class.results_url.clone() {
            let body = self.fetcher.fetch(&url).await?;
            let table = extract_results(&HtmlDocument::parse(&body))?;
            if !table.warnings.is_empty() {
                warn!(
                    "{} results: {} rows repaired to the header width",
                    class.discipline,
                    table.warnings.len()
                );
            }
            class.import_results(table);
        }

        if class.status() != ClassStatus::Completed {
            if let Some(url) = class.running_orders_url.clone() {
                let body = self.fetcher.fetch(&url).await?;
                let table = extract_running_orders(&HtmlDocument::parse(&body))?;
                class.import_running_orders(table);
            }
        }
        Ok(())
    }
}
