//! Page-level parsing for the results site: the yearly calendar grouped by
//! month headings and the per-show page listing classes and running orders.

use crate::class_info::ClassInfo;
use crate::constants::month_name;
use crate::error::{FinalsError, Result};
use crate::matcher::{MatchTier, NameMatcher};
use crate::parser::{cell_text, normalize_whitespace};
use crate::types::{Discipline, Height};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

static THEAD: Lazy<Selector> = Lazy::new(|| Selector::parse("thead").unwrap());
static TR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TD: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static CARD_HEADER: Lazy<Selector> = Lazy::new(|| Selector::parse("div.card-header").unwrap());
static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// "<number> <height> <round> <discipline>", e.g. "12 Lge Championship Jumping"
static CLASS_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<number>\S+)\s+(?P<height>\S+)\s+(?P<round>\S+)\s+(?P<discipline>\S+)$")
        .unwrap()
});

/// One show row under a month heading of the yearly calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub cells: Vec<String>,
    pub link: Option<String>,
}

impl CatalogRow {
    /// Show name cell; the first cell holds the date
    pub fn show_name(&self) -> Option<&str> {
        self.cells.get(1).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSection {
    pub heading: String,
    pub rows: Vec<CatalogRow>,
}

pub fn year_results_url(results_base: &str, year: i32) -> String {
    format!("{}/{}", results_base.trim_end_matches('/'), year)
}

/// Resolve a possibly relative link against `base`.
pub fn absolute_url(base: &str, link: &str) -> Result<String> {
    let base = reqwest::Url::parse(base)
        .map_err(|e| FinalsError::Config(format!("bad base URL '{}': {}", base, e)))?;
    base.join(link)
        .map(|u| u.to_string())
        .map_err(|e| FinalsError::MalformedSource(format!("bad link '{}': {}", link, e)))
}

/// Split the yearly calendar page into month sections.
///
/// Rows belong to the closest preceding `<thead>`; rows the parser wrapped
/// in an implicit `<tbody>` are included.
pub fn parse_month_sections(body: &str) -> Vec<MonthSection> {
    let document = Html::parse_document(body);
    let mut sections = Vec::new();

    for thead in document.select(&THEAD) {
        let mut rows = Vec::new();
        for sibling in thead.next_siblings().filter_map(ElementRef::wrap) {
            match sibling.value().name() {
                "thead" => break,
                "tr" => rows.extend(catalog_row(sibling)),
                "tbody" => rows.extend(sibling.select(&TR).filter_map(catalog_row)),
                _ => {}
            }
        }
        sections.push(MonthSection {
            heading: cell_text(thead),
            rows,
        });
    }

    debug!("Found {} month sections", sections.len());
    sections
}

fn catalog_row(tr: ElementRef<'_>) -> Option<CatalogRow> {
    let cells: Vec<String> = tr.select(&TD).map(cell_text).collect();
    if cells.is_empty() {
        return None;
    }
    Some(CatalogRow {
        cells,
        link: tr.value().attr("data-href").map(str::to_string),
    })
}

/// Find a show's results-page link within the month section for `date`.
pub fn find_show_link(
    sections: &[MonthSection],
    show_name: &str,
    date: NaiveDate,
    matcher: &NameMatcher,
) -> Result<(String, MatchTier)> {
    let month = month_name(date.month())
        .ok_or_else(|| FinalsError::InvalidInput(format!("bad month in {}", date)))?;

    let section = sections
        .iter()
        .find(|s| s.heading.contains(month))
        .ok_or_else(|| {
            FinalsError::NotFound(format!("month '{}' not found for year {}", month, date.year()))
        })?;
    debug!("Found month section '{}' with {} rows", section.heading, section.rows.len());

    let named: Vec<&CatalogRow> = section.rows.iter().filter(|r| r.show_name().is_some()).collect();
    let (row, tier) = matcher
        .find(show_name, &named, |r| r.show_name().unwrap_or_default())
        .map_err(|e| match e {
            FinalsError::NotFound(_) => FinalsError::NotFound(format!(
                "show '{}' not found in the {} section",
                show_name, month
            )),
            other => other,
        })?;

    let link = row.link.clone().ok_or_else(|| {
        FinalsError::NotFound(format!(
            "show '{}' has no results link yet",
            row.show_name().unwrap_or_default()
        ))
    })?;
    Ok((link, tier))
}

/// A parsed championship class label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    pub number: String,
    pub height: Height,
    pub discipline: Discipline,
}

impl ClassLabel {
    pub fn parse(text: &str) -> Result<Self> {
        let text = normalize_whitespace(text);
        let caps = CLASS_LABEL.captures(&text).ok_or_else(|| {
            FinalsError::MalformedSource(format!(
                "class label '{}' does not have the form '<number> <height> <round> <discipline>'",
                text
            ))
        })?;
        if !caps["round"].eq_ignore_ascii_case("championship") {
            return Err(FinalsError::MalformedSource(format!(
                "class label '{}' is not a championship round",
                text
            )));
        }
        let height = caps["height"]
            .parse()
            .map_err(|_| FinalsError::MalformedSource(format!("unknown height in '{}'", text)))?;
        Ok(Self {
            number: caps["number"].to_string(),
            height,
            discipline: caps["discipline"].parse()?,
        })
    }
}

/// Whether link text names a championship round for `height`
fn is_championship_label(text: &str, height: Height) -> bool {
    let lower = text.to_lowercase();
    lower.contains("championship")
        && lower.contains(&height.code().to_lowercase())
        && (lower.contains("agility") || lower.contains("jumping"))
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Locate both championship rounds for `height` on a show page.
///
/// Running-order links come from the "Running Orders" card, result links from
/// the per-day cards. Status and run order are derived before returning.
#[instrument(skip(body, site_base))]
pub fn find_championship_classes(
    body: &str,
    height: Height,
    site_base: &str,
) -> Result<(ClassInfo, ClassInfo)> {
    let document = Html::parse_document(body);
    let mut agility = ClassInfo::new(Discipline::Agility).with_height(height);
    let mut jumping = ClassInfo::new(Discipline::Jumping).with_height(height);
    let mut found = 0usize;

    for header in document.select(&CARD_HEADER) {
        let header_text = cell_text(header).to_lowercase();

        if header_text == "running orders" {
            let Some(card) = header
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "div" && has_class(e, "card"))
            else {
                continue;
            };

            for span in card.select(&SPAN) {
                let text = cell_text(span);
                if !is_championship_label(&text, height) {
                    continue;
                }
                let label = ClassLabel::parse(&text)?;
                if label.height != height {
                    continue;
                }
                let href = span
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == "a")
                    .and_then(|a| a.value().attr("href"))
                    .ok_or_else(|| {
                        FinalsError::MalformedSource(format!(
                            "no link found for running orders of '{}'",
                            text
                        ))
                    })?;
                let class = class_for(&mut agility, &mut jumping, label.discipline);
                class.class_number = Some(label.number);
                class.running_orders_url = Some(absolute_url(site_base, href)?);
                found += 1;
                debug!("Running orders for '{}' at {}", text, href);
            }
        } else {
            let Some(card_block) = header
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "div" && has_class(e, "card-block"))
            else {
                debug!("No card block for header '{}'", header_text);
                continue;
            };

            for anchor in card_block.select(&ANCHOR) {
                let text = cell_text(anchor);
                if !is_championship_label(&text, height) {
                    continue;
                }
                let label = ClassLabel::parse(&text)?;
                if label.height != height {
                    continue;
                }
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let class = class_for(&mut agility, &mut jumping, label.discipline);
                class.class_number = Some(label.number);
                class.results_url = Some(absolute_url(site_base, href)?);
                found += 1;
                debug!("Results for '{}' at {}", text, href);
            }
        }
    }

    if found == 0 {
        return Err(FinalsError::NotFound(format!(
            "no championship class found for height '{}'",
            height.full_name()
        )));
    }

    agility.update_status();
    jumping.update_status();
    agility.update_order(&mut jumping);
    info!(
        "Agility {} ({:?}), jumping {} ({:?})",
        agility.status(),
        agility.order(),
        jumping.status(),
        jumping.order()
    );

    Ok((agility, jumping))
}

fn class_for<'a>(
    agility: &'a mut ClassInfo,
    jumping: &'a mut ClassInfo,
    discipline: Discipline,
) -> &'a mut ClassInfo {
    match discipline {
        Discipline::Agility => agility,
        Discipline::Jumping => jumping,
    }
}
