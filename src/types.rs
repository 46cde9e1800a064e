use crate::error::{FinalsError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two qualifying rounds of a championship final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Agility,
    Jumping,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Agility => "agility",
            Discipline::Jumping => "jumping",
        }
    }

    /// Title-cased form as it appears in class labels
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Agility => "Agility",
            Discipline::Jumping => "Jumping",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = FinalsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "agility" => Ok(Discipline::Agility),
            "jumping" => Ok(Discipline::Jumping),
            other => Err(FinalsError::NotSupported(format!(
                "discipline '{}' is not part of a championship final",
                other
            ))),
        }
    }
}

/// Competitor size category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Height {
    Sml,
    Med,
    Int,
    Lge,
}

impl Height {
    pub const ALL: [Height; 4] = [Height::Sml, Height::Med, Height::Int, Height::Lge];

    /// Short code used in class labels
    pub fn code(&self) -> &'static str {
        match self {
            Height::Sml => "Sml",
            Height::Med => "Med",
            Height::Int => "Int",
            Height::Lge => "Lge",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Height::Sml => "Small",
            Height::Med => "Medium",
            Height::Int => "Intermediate",
            Height::Lge => "Large",
        }
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Height {
    type Err = FinalsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Height::ALL
            .iter()
            .find(|h| h.code().to_lowercase() == wanted || h.full_name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| {
                FinalsError::InvalidInput(format!(
                    "height must be one of Sml, Med, Int, Lge; got '{}'",
                    s
                ))
            })
    }
}

/// Ten-digit class identifier used in class page URLs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the identifier from a class page URL such as
    /// `https://www.agilityplaza.co.uk/agilityClass/1799909160/results`.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| FinalsError::InvalidInput(format!("bad class URL '{}': {}", url, e)))?;
        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| FinalsError::InvalidInput(format!("class URL '{}' has no path", url)))?;
        segments
            .by_ref()
            .find(|s| *s == "agilityClass")
            .ok_or_else(|| {
                FinalsError::InvalidInput(format!("'{}' is not a class page URL", url))
            })?;
        let id = segments
            .next()
            .ok_or_else(|| FinalsError::InvalidInput(format!("class URL '{}' has no id", url)))?;
        id.parse()
    }

    pub fn results_url(&self, base: &str) -> String {
        format!("{}/agilityClass/{}/results", base.trim_end_matches('/'), self.0)
    }

    pub fn running_orders_url(&self, base: &str) -> String {
        format!(
            "{}/agilityClass/{}/running_orders",
            base.trim_end_matches('/'),
            self.0
        )
    }
}

impl FromStr for ClassId {
    type Err = FinalsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() == 10 && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(ClassId(s.to_string()))
        } else {
            Err(FinalsError::InvalidInput(format!(
                "class id must be 10 digits, got '{}'",
                s
            )))
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the show calendar dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowCalendarEntry {
    #[serde(rename = "Show Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Date", alias = "date")]
    pub date: NaiveDate,
    #[serde(rename = "Cancelled", alias = "cancelled", default)]
    pub cancelled: bool,
}

/// Canonical row of a results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub rank: u32,
    pub mobile_place: String,
    pub kc_name: String,
    /// "Handler & Dog" or club-formatted name
    pub pairing: String,
    pub run_data: String,
    pub faults: f64,
    pub time: f64,
}

impl ResultRow {
    pub fn handler(&self) -> &str {
        split_pairing(&self.pairing).0
    }

    pub fn dog(&self) -> Option<&str> {
        split_pairing(&self.pairing).1
    }
}

/// A pairing named in a round's elimination annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub pairing: String,
}

/// One row of a pre-run start list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningOrderRow {
    pub position: u32,
    pub pairing: String,
    pub withdrawn: bool,
}

impl RunningOrderRow {
    pub fn dog(&self) -> Option<&str> {
        split_pairing(&self.pairing).1
    }
}

/// Split "Handler & Dog" into its two halves; club-formatted names have no dog part.
pub fn split_pairing(pairing: &str) -> (&str, Option<&str>) {
    match pairing.split_once(" & ") {
        Some((handler, dog)) => (handler.trim(), Some(dog.trim())),
        None => (pairing.trim(), None),
    }
}
