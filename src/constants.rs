/// Results site constants shared across the codebase

// Base of the results site; class pages hang off this
pub const PLAZA_BASE: &str = "https://www.agilityplaza.co.uk";

// Yearly results calendar, the year is appended
pub const PLAZA_RESULTS: &str = "https://www.agilityplaza.co.uk/results/";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "CHAMP_FINALS_CONFIG";
pub const DEFAULT_CALENDAR_PATH: &str = "champ_shows.csv";

pub const REFRESH_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_MAX_ROWS: usize = 30;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

pub const DEFAULT_LOG_LEVEL: &str = "champ_finals=info";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "champ_finals.log";

/// Canonical result-table schema after the two synthetic columns are inserted
pub const RESULT_COLUMNS: [&str; 7] = [
    "Rank",
    "Place (mobile)",
    "KC names",
    "Name",
    "Run Data",
    "Faults",
    "Time",
];

pub const MOBILE_PLACE_COLUMN: &str = RESULT_COLUMNS[1];
pub const KC_NAMES_COLUMN: &str = RESULT_COLUMNS[2];

pub const ELIMINATED_LABEL: &str = "Eliminated";
pub const WITHDRAWN_MARKER: &str = "(Withdrawn)";

/// Well-known show names and the short codes they are published under
pub const SHOW_ABBREVIATIONS: &[(&str, &str)] = &[
    ("kennel club international agility festival", "kciaf"),
    ("dogs in need agility society", "dinas"),
];

/// Month headings used by the yearly results calendar
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Look up the short code for a canonical (trimmed, lowercase) show name
pub fn abbreviation_for(canonical_name: &str) -> Option<&'static str> {
    SHOW_ABBREVIATIONS
        .iter()
        .find(|(long, _)| *long == canonical_name)
        .map(|(_, short)| *short)
}

/// Month heading for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}
