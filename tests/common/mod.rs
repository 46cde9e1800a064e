#![allow(dead_code)]

use champ_finals::config::Config;
use champ_finals::infra::InMemoryFetcher;
use champ_finals::session::FinalsTracker;

pub const SITE: &str = "https://www.agilityplaza.co.uk";
pub const SHOW_URL: &str = "https://www.agilityplaza.co.uk/competition/1205629450/results";

pub const AGILITY_ID: &str = "1799900001";
pub const JUMPING_ID: &str = "1799909160";

pub fn results_url(id: &str) -> String {
    format!("{}/agilityClass/{}/results", SITE, id)
}

pub fn running_orders_url(id: &str) -> String {
    format!("{}/agilityClass/{}/running_orders", SITE, id)
}

pub fn tracker(fetcher: InMemoryFetcher) -> FinalsTracker<InMemoryFetcher> {
    FinalsTracker::new(fetcher, Config::default())
}

/// A results page as the site serves it: five header cells, seven data
/// cells per row and a single trailing elimination row.
pub fn results_page(
    first_heading: &str,
    rows: &[(&str, &str, f64, f64)],
    eliminated: &str,
) -> String {
    let mut html = format!(
        concat!(
            "<html><body><table><thead><tr><th>{}</th><th>Name</th>",
            "<th>Run Data</th><th>Faults</th><th>Time</th></tr></thead><tbody>",
        ),
        first_heading
    );
    for (place, pairing, faults, time) in rows {
        let digits: String = place.chars().filter(|c| c.is_ascii_digit()).collect();
        html.push_str(&format!(
            concat!(
                "<tr><td>{}</td><td>{}</td><td></td><td>{}</td>",
                "<td>Clear</td><td>{}</td><td>{}</td></tr>",
            ),
            place,
            digits,
            pairing.replace('&', "&amp;"),
            faults,
            time
        ));
    }
    html.push_str(&format!(
        "<tr><td colspan=\"7\">{}</td></tr></tbody></table></body></html>",
        eliminated.replace('&', "&amp;")
    ));
    html
}

pub fn running_orders_page(entries: &[&str]) -> String {
    let mut html = String::from(
        "<html><body><table><thead><tr><th>RO</th><th>Name</th></tr></thead><tbody>",
    );
    for (i, name) in entries.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            i + 1,
            name.replace('&', "&amp;")
        ));
    }
    html.push_str("</tbody></table></body></html>");
    html
}

/// Show page with optional running-order and result links for both large
/// championship rounds.
pub fn show_page(
    agility_running_orders: bool,
    agility_results: bool,
    jumping_running_orders: bool,
    jumping_results: bool,
) -> String {
    let mut running_orders = String::new();
    if agility_running_orders {
        running_orders.push_str(&format!(
            concat!(
                "<a href=\"/agilityClass/{}/running_orders\">",
                "<span>3 Lge Championship Agility</span></a>",
            ),
            AGILITY_ID
        ));
    }
    if jumping_running_orders {
        running_orders.push_str(&format!(
            concat!(
                "<a href=\"/agilityClass/{}/running_orders\">",
                "<span>14 Lge Championship Jumping</span></a>",
            ),
            JUMPING_ID
        ));
    }

    let mut results =
        String::from("<a href=\"/agilityClass/1799900002/results\">4 Lge Graded Agility</a>");
    if agility_results {
        results.push_str(&format!(
            "<a href=\"/agilityClass/{}/results\">3 Lge Championship Agility</a>",
            AGILITY_ID
        ));
    }
    if jumping_results {
        results.push_str(&format!(
            "<a href=\"/agilityClass/{}/results\">14 Lge Championship Jumping</a>",
            JUMPING_ID
        ));
    }

    format!(
        r#"<html><body>
        <div class="card"><div class="card-header">Running Orders</div>
          <div class="card-block">{}</div></div>
        <div class="card"><div class="card-header">Saturday 13th September</div>
          <div class="card-block">{}</div></div>
        </body></html>"#,
        running_orders, results
    )
}

/// Round A of the two-pairing final.
pub fn agility_results() -> String {
    results_page(
        "Place",
        &[("1st", "Jo & Rex", 0.0, 30.0), ("2nd", "Al & Fizz", 5.0, 32.0)],
        "Eliminated: Kim & Dot (E)",
    )
}

/// Round B of the two-pairing final; rank 2 went to a pairing absent from round A.
pub fn jumping_results() -> String {
    results_page(
        "Place",
        &[
            ("1st", "Al & Fizz", 0.0, 25.0),
            ("2nd", "Sam & Moss", 0.0, 26.5),
            ("3rd", "Jo & Rex", 5.0, 28.0),
        ],
        "",
    )
}
