mod common;

use anyhow::Result;
use async_trait::async_trait;
use myschedule::app::{interactive, PlainRenderer};
use myschedule::domain::model::RefreshOutcome;
use myschedule::domain::ports::{CatalogRefresher, RefreshRequest};
use myschedule::{AppConfig, Session};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Stands in for the scrape + parse commands.
struct FakeRefresher {
    data_dir: PathBuf,
    outcome: RefreshOutcome,
    requests: Mutex<Vec<RefreshRequest>>,
}

impl FakeRefresher {
    fn new(data_dir: impl Into<PathBuf>, outcome: RefreshOutcome) -> Self {
        Self {
            data_dir: data_dir.into(),
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CatalogRefresher for FakeRefresher {
    async fn refresh(&self, request: &RefreshRequest, _cancel: CancellationToken) -> RefreshOutcome {
        self.requests.lock().unwrap().push(request.clone());
        if self.outcome.is_success() {
            common::write_catalog(&self.data_dir);
        }
        self.outcome.clone()
    }
}

async fn run_script(session: &mut Session<myschedule::LocalStorage>, refresher: &FakeRefresher, lines: &[&str]) -> Result<String> {
    let input = Cursor::new(lines.join("\n"));
    let mut r = PlainRenderer::new(Vec::new());
    interactive::run(session, refresher, input, &mut r).await?;
    Ok(String::from_utf8(r.into_inner())?)
}

#[tokio::test]
async fn test_search_add_with_conflict_preview() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    session.engine.add_course("FS261059")?;
    let refresher = FakeRefresher::new(dir.path(), RefreshOutcome::Cancelled);

    let text = run_script(&mut session, &refresher, &["1", "Public", "1", "d", "", "y", "n", "2", "0"]).await?;

    assert!(text.contains("=== MySchedule (interactive) ==="));
    assert!(text.contains("Selected courses: 1 | Selected events: 2"));
    assert!(text.contains("Search results (max 20)"));
    assert!(text.contains("This course conflicts with 1 selected course(s)"));
    assert!(text.contains("Conflicts for candidate course:"));
    assert!(text.contains("Added: FS261110"));
    assert!(text.contains("- FS261110 | Public Economics | Prof. Carla Test | Seminar | 1 events"));
    assert!(text.ends_with("Bye.\n"));
    assert_eq!(session.engine.selection().to_sorted_vec(), vec!["FS261059", "FS261110"]);
    assert!(refresher.requests.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_declined_candidate_is_not_added() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    session.engine.add_course("FS261110")?;
    let refresher = FakeRefresher::new(dir.path(), RefreshOutcome::Cancelled);

    let text = run_script(&mut session, &refresher, &["1", "FS261107", "1", "x", "n", "0"]).await?;

    assert!(text.contains("Invalid input."));
    assert!(text.contains("Not added."));
    assert_eq!(session.engine.selection().to_sorted_vec(), vec!["FS261110"]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_choices_change_nothing() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    session.engine.add_course("FS261059")?;
    let refresher = FakeRefresher::new(dir.path(), RefreshOutcome::Cancelled);

    // input ends without an explicit 0
    let text = run_script(&mut session, &refresher, &["9", "3", "abc", "5", "1", "n"]).await?;

    assert!(text.contains("Invalid choice."));
    assert!(text.contains("Not a number."));
    assert!(text.contains("Out of range."));
    assert!(text.contains("Removed: FS261059"));
    assert!(text.ends_with("Bye.\n"));
    assert!(session.engine.selection().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_conflict_agenda_timetable_and_export_flows() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    for cid in ["FS261059", "FS261110", "FS261107"] {
        session.engine.add_course(cid)?;
    }
    let refresher = FakeRefresher::new(dir.path(), RefreshOutcome::Cancelled);
    let export_path = dir.path().join("out/my-plan");
    let export_arg = export_path.to_string_lossy().into_owned();

    let script = [
        "4", "1", "", "3", "", "0", // conflicts: one pair, then the full list
        "5", "", "0", // timetable of the first week
        "6", "a", // agenda, all weeks
        "7", "p", export_arg.as_str(), // export to a custom path
        "0",
    ];
    let text = run_script(&mut session, &refresher, &script).await?;

    assert!(text.contains("Conflicts found: 2"));
    assert!(text.contains("Conflict overview (by course pair):"));
    assert!(text.contains("3) Show ALL conflicts (2)"));
    assert!(text.contains("=== All conflicts (2) ==="));
    assert!(text.contains("=== Timetable 2026-W08 (2026-02-16 → 2026-02-22) ==="));
    assert!(text.contains("Legend: ! CONFLICT = overlaps detected"));
    assert!(text.contains("=== 2026-W09 (2026-02-23 → 2026-03-01) ==="));
    assert!(text.contains("Exported 4 events to: "));

    let ics = std::fs::read_to_string(export_path.with_extension("ics"))?;
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_onboarding_runs_refresh_and_reloads() -> Result<()> {
    let dir = TempDir::new()?;
    let mut config = AppConfig::default();
    config.data.dir = dir.path().to_string_lossy().into_owned();
    let mut session = Session::open(config);
    assert!(session.engine.catalog().is_empty());

    let refresher = FakeRefresher::new(
        dir.path(),
        RefreshOutcome::Success { courses: 4, events: 6 },
    );
    let script = ["y", "", "n", "", "1", "econometrics", "1", "n", "0"];
    let text = run_script(&mut session, &refresher, &script).await?;

    assert!(text.contains("No catalog data found yet"));
    assert!(text.contains("Update done. courses=4 events=6"));
    assert!(text.contains("Data loaded. Welcome to MySchedule!"));
    assert!(text.contains("Added: FS261107"));

    let requests = refresher.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![RefreshRequest {
            semester: "FS26".into(),
            refresh: false
        }]
    );
    assert_eq!(session.engine.catalog().course_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_keeps_catalog() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    let refresher = FakeRefresher::new(
        dir.path(),
        RefreshOutcome::Failed {
            reason: "scraper exited with 1".into(),
        },
    );

    let text = run_script(&mut session, &refresher, &["8", "HS26", "", "", "0"]).await?;

    assert!(text.contains("Update failed: scraper exited with 1"));
    assert!(!text.contains("Data reloaded"));
    assert_eq!(refresher.requests.lock().unwrap()[0].semester, "HS26");
    assert!(refresher.requests.lock().unwrap()[0].refresh);
    assert_eq!(session.engine.catalog().course_count(), 4);
    Ok(())
}
