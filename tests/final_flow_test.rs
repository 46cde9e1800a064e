mod common;

use anyhow::Result;
use champ_finals::class_info::{ClassInfo, ClassStatus, RunOrder};
use champ_finals::combine::{FinalStatus, StandingOrder};
use champ_finals::error::FinalsError;
use champ_finals::infra::InMemoryFetcher;
use champ_finals::parser::TableLayout;
use champ_finals::session::FinalSession;
use champ_finals::types::{ClassId, Discipline, Height};
use chrono::NaiveDate;
use common::*;
use tempfile::tempdir;

#[tokio::test]
async fn test_refresh_combines_completed_rounds() -> Result<()> {
    let fetcher = InMemoryFetcher::new()
        .with_page(SHOW_URL, show_page(false, true, false, true))
        .with_page(results_url(AGILITY_ID), agility_results())
        .with_page(results_url(JUMPING_ID), jumping_results());
    let tracker = tracker(fetcher);

    let session = tracker.refresh(SHOW_URL, Height::Lge).await?;
    assert_eq!(session.agility.status(), ClassStatus::Completed);
    assert_eq!(session.jumping.status(), ClassStatus::Completed);
    assert_eq!(session.agility.order(), RunOrder::SameState);
    assert_eq!(session.status(), FinalStatus::FinalRunningOrder);
    assert_eq!(session.agility.eliminations().len(), 1);
    assert_eq!(session.agility.eliminations()[0].pairing, "Kim & Dot");

    let standing = session.standing()?;
    assert_eq!(standing.first_round(), None);
    assert_eq!(standing.rows.len(), 2);

    let leader = &standing.rows[0];
    assert_eq!(leader.place, 1);
    assert_eq!(leader.pairing, "Al & Fizz");
    assert_eq!(leader.combined_points, 3);
    assert_eq!(leader.combined_faults, 5.0);
    assert_eq!(leader.combined_time, 57.0);

    let second = &standing.rows[1];
    assert_eq!(second.pairing, "Jo & Rex");
    assert_eq!(second.combined_points, 4);
    assert_eq!(second.combined_faults, 5.0);
    assert_eq!(second.combined_time, 58.0);

    assert_eq!(standing.agility_winner().map(|r| r.pairing.as_str()), Some("Jo & Rex"));
    assert_eq!(standing.jumping_winner().map(|r| r.pairing.as_str()), Some("Al & Fizz"));

    // Level on faults, so time decides.
    let by_faults = standing.by_faults();
    assert_eq!(by_faults.order, StandingOrder::Faults);
    assert_eq!(by_faults.rows[0].pairing, "Al & Fizz");
    assert_eq!(by_faults.rows[1].pairing, "Jo & Rex");
    assert_eq!(by_faults.rows[1].place, 2);
    Ok(())
}

#[tokio::test]
async fn test_refresh_while_second_round_runs() -> Result<()> {
    let in_progress = results_page(
        "Rank",
        &[("1", "Al & Fizz", 0.0, 25.0), ("2", "Jo & Rex", 5.0, 28.0)],
        "",
    );
    let fetcher = InMemoryFetcher::new()
        .with_page(SHOW_URL, show_page(false, true, true, true))
        .with_page(results_url(AGILITY_ID), agility_results())
        .with_page(results_url(JUMPING_ID), in_progress)
        .with_page(
            running_orders_url(JUMPING_ID),
            running_orders_page(&["Al & Fizz", "Jo & Rex", "Sam & Moss"]),
        );
    let tracker = tracker(fetcher);

    let session = tracker.refresh(SHOW_URL, Height::Lge).await?;
    assert_eq!(session.jumping.status(), ClassStatus::InProgress);
    assert_eq!(session.jumping.layout(), Some(TableLayout::InProgress));
    assert_eq!(session.agility.order(), RunOrder::First);
    assert_eq!(session.jumping.order(), RunOrder::Second);
    assert_eq!(session.status(), FinalStatus::PartialRunningOrder);
    assert_eq!(session.jumping.running_orders().map(|r| r.len()), Some(3));
    assert!(session.agility.running_orders().is_none());

    let standing = session.standing()?;
    assert_eq!(standing.first_round(), Some(Discipline::Agility));
    assert_eq!(standing.rows[0].pairing, "Al & Fizz");
    Ok(())
}

#[tokio::test]
async fn test_unstarted_round_has_no_standings() -> Result<()> {
    let fetcher = InMemoryFetcher::new()
        .with_page(SHOW_URL, show_page(false, true, true, false))
        .with_page(results_url(AGILITY_ID), agility_results())
        .with_page(
            running_orders_url(JUMPING_ID),
            running_orders_page(&["Al & Fizz", "Jo & Rex (Withdrawn)"]),
        );
    let tracker = tracker(fetcher);

    let session = tracker.refresh(SHOW_URL, Height::Lge).await?;
    assert_eq!(session.jumping.status(), ClassStatus::NotStarted);
    assert_eq!(session.status(), FinalStatus::NotStarted);
    assert!(matches!(session.standing(), Err(FinalsError::MissingData(_))));

    let order = session.jumping.running_orders().expect("running orders imported");
    assert_eq!(order[1].pairing, "Jo & Rex");
    assert!(order[1].withdrawn);
    Ok(())
}

#[tokio::test]
async fn test_find_show_url_by_abbreviation() -> Result<()> {
    let year_page = r#"<html><body><table>
        <thead><tr><th colspan="2">August 2025</th></tr></thead>
        <tr data-href="/competition/1224271619/results"><td>07/08</td>
            <td>Kennel Club International Agility Festival</td></tr>
        <tr data-href="/competition/1950031424/results"><td>12/08</td>
            <td>Dogs In Need Agility Society</td></tr>
        </table></body></html>"#;
    let fetcher =
        InMemoryFetcher::new().with_page("https://www.agilityplaza.co.uk/results/2025", year_page);
    let tracker = tracker(fetcher);

    let date = NaiveDate::from_ymd_opt(2025, 8, 12).expect("valid date");
    let url = tracker.find_show_url("dinas", date).await?;
    assert_eq!(url, "https://www.agilityplaza.co.uk/competition/1950031424/results");

    let missing = tracker
        .find_show_url("Fake Show Name", date)
        .await
        .expect_err("no such show");
    assert!(matches!(missing, FinalsError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_refresh_from_class_ids() -> Result<()> {
    let fetcher = InMemoryFetcher::new()
        .with_page(results_url(AGILITY_ID), agility_results())
        .with_page(
            running_orders_url(AGILITY_ID),
            running_orders_page(&["Jo & Rex", "Al & Fizz"]),
        )
        .with_page(
            running_orders_url(JUMPING_ID),
            running_orders_page(&["Al & Fizz", "Jo & Rex"]),
        );
    let tracker = tracker(fetcher);

    let agility: ClassId = AGILITY_ID.parse()?;
    let jumping = ClassId::from_url(&running_orders_url(JUMPING_ID))?;
    let session = tracker.refresh_from_ids(&agility, &jumping).await?;

    // The completed layout wins over a still-published running order.
    assert_eq!(session.agility.status(), ClassStatus::Completed);
    assert!(session.agility.running_orders_url.is_none());
    assert_eq!(session.jumping.status(), ClassStatus::NotStarted);
    assert_eq!(session.agility.order(), RunOrder::First);
    assert_eq!(session.jumping.class_number.as_deref(), Some(JUMPING_ID));
    assert_eq!(session.jumping.running_orders().map(|r| r.len()), Some(2));
    assert!(matches!(session.standing(), Err(FinalsError::MissingData(_))));
    Ok(())
}

#[tokio::test]
async fn test_offline_saved_pages() -> Result<()> {
    let dir = tempdir()?;
    let agility_path = dir.path().join("agility.html");
    let jumping_path = dir.path().join("jumping.html");
    std::fs::write(&agility_path, agility_results())?;
    std::fs::write(&jumping_path, jumping_results())?;

    let fetcher = InMemoryFetcher::new();
    fetcher.insert_file("saved/agility", &agility_path)?;
    fetcher.insert_file("saved/jumping", &jumping_path)?;

    let mut agility = ClassInfo::new(Discipline::Agility).with_results_url("saved/agility");
    let mut jumping = ClassInfo::new(Discipline::Jumping).with_results_url("saved/jumping");
    agility.update_order(&mut jumping);

    let session = tracker(fetcher)
        .import_session(FinalSession::new(agility, jumping))
        .await?;
    assert_eq!(session.status(), FinalStatus::FinalRunningOrder);
    assert_eq!(session.standing()?.rows[0].pairing, "Al & Fizz");
    Ok(())
}

#[tokio::test]
async fn test_missing_show_page_is_retryable() {
    let tracker = tracker(InMemoryFetcher::new());
    let err = tracker
        .refresh(SHOW_URL, Height::Lge)
        .await
        .expect_err("show page is not served");
    assert!(matches!(err, FinalsError::Fetch { status: 404, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_results_page_without_table_is_malformed() {
    let fetcher = InMemoryFetcher::new()
        .with_page(SHOW_URL, show_page(false, true, false, true))
        .with_page(results_url(AGILITY_ID), "<html><body><p>Maintenance</p></body></html>")
        .with_page(results_url(JUMPING_ID), jumping_results());
    let err = tracker(fetcher)
        .refresh(SHOW_URL, Height::Lge)
        .await
        .expect_err("results page has no table");
    assert!(matches!(err, FinalsError::MalformedSource(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_duplicate_pairing_is_rejected() -> Result<()> {
    let duplicated = results_page(
        "Place",
        &[("1st", "Jo & Rex", 0.0, 30.0), ("2nd", "Jo & Rex", 5.0, 32.0)],
        "",
    );
    let fetcher = InMemoryFetcher::new()
        .with_page(SHOW_URL, show_page(false, true, false, true))
        .with_page(results_url(AGILITY_ID), duplicated)
        .with_page(results_url(JUMPING_ID), jumping_results());

    let session = tracker(fetcher).refresh(SHOW_URL, Height::Lge).await?;
    assert!(matches!(session.standing(), Err(FinalsError::DuplicatePairing(_))));
    Ok(())
}

#[tokio::test]
async fn test_other_height_is_not_found() {
    let fetcher = InMemoryFetcher::new().with_page(SHOW_URL, show_page(true, true, true, true));
    let err = tracker(fetcher)
        .refresh(SHOW_URL, Height::Sml)
        .await
        .expect_err("only large classes on the page");
    assert!(matches!(err, FinalsError::NotFound(_)));
}
