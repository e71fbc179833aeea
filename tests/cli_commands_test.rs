mod common;

use anyhow::Result;
use myschedule::app::commands::{self, run_command};
use myschedule::app::PlainRenderer;
use myschedule::{CliCommand, ScheduleError, Session};

fn output(renderer: PlainRenderer<Vec<u8>>) -> String {
    String::from_utf8(renderer.into_inner()).unwrap()
}

#[tokio::test]
async fn test_search_rejects_empty_text() -> Result<()> {
    let (_dir, config) = common::fixture();
    let mut session = Session::open(config);
    let mut r = PlainRenderer::new(Vec::new());

    let code = run_command(&mut session, &CliCommand::Search { text: "   ".into() }, &mut r).await?;
    assert_eq!(code, 1);
    assert_eq!(output(r), "Please provide a search text.\n");
    Ok(())
}

#[tokio::test]
async fn test_search_add_remove_flow() -> Result<()> {
    let (_dir, config) = common::fixture();
    let mut session = Session::open(config);

    let mut r = PlainRenderer::new(Vec::new());
    assert_eq!(run_command(&mut session, &CliCommand::Search { text: "finan".into() }, &mut r).await?, 0);
    let text = output(r);
    assert!(text.contains("FS261059 | Corporate Finance | Prof. Dr. Anna Muster +1 | Vorlesung | 2 events"));
    assert!(text.contains("FS261200 | Financial Accounting"));

    let mut r = PlainRenderer::new(Vec::new());
    run_command(&mut session, &CliCommand::Add { course_id: "fs261059".into() }, &mut r).await?;
    run_command(&mut session, &CliCommand::Add { course_id: "FS261059".into() }, &mut r).await?;
    run_command(&mut session, &CliCommand::Add { course_id: "zz000".into() }, &mut r).await?;
    run_command(&mut session, &CliCommand::Remove { course_id: "zz000".into() }, &mut r).await?;
    run_command(&mut session, &CliCommand::Remove { course_id: "zz000".into() }, &mut r).await?;
    let text = output(r);
    assert!(text.contains("Added: FS261059 (selected: 1)"));
    assert!(text.contains("Already selected: FS261059"));
    assert!(text.contains("Warning: course_id 'ZZ000' not found in catalog (adding anyway)."));
    assert!(text.contains("Removed: ZZ000 (selected: 1)"));
    assert!(text.contains("Not selected: ZZ000"));
    Ok(())
}

#[test]
fn test_limit_reports_remaining_results() -> Result<()> {
    let (_dir, mut config) = common::fixture();
    config.display.search_limit = 1;
    let session = Session::open(config);

    let mut r = PlainRenderer::new(Vec::new());
    commands::search(&session, &mut r, "fs26")?;
    let text = output(r);
    assert_eq!(text.lines().count(), 2);
    assert!(text.ends_with("... and 3 more results\n"));

    let mut r = PlainRenderer::new(Vec::new());
    let err = commands::search(&session, &mut r, "").unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidInput { .. }));
    Ok(())
}

#[test]
fn test_conflicts_and_preview_output() -> Result<()> {
    let (_dir, config) = common::fixture();
    let session = Session::open(config);

    let mut r = PlainRenderer::new(Vec::new());
    commands::conflicts(&session, &mut r)?;
    assert_eq!(output(r), "No conflicts found.\n");

    session.engine.add_course("FS261059")?;
    let mut r = PlainRenderer::new(Vec::new());
    commands::preview(&session, &mut r, "FS261110")?;
    let text = output(r);
    assert!(text.contains("conflicts with 1 selected course(s), total 1 conflicting event overlap(s)."));
    assert!(text.contains("=== With: FS261059 | Corporate Finance"));
    assert!(text.contains(
        "1) 2026-02-19: ! 10:30-12:00 | FS261110 | Public Economics | (lecture) | @ HS 8  <->  ! 10:00-11:00 | FS261059"
    ));

    session.engine.add_course("FS261110")?;
    let mut r = PlainRenderer::new(Vec::new());
    commands::conflicts(&session, &mut r)?;
    let text = output(r);
    assert!(text.starts_with("Conflicts found: 1\nCourses involved in conflicts: 2\n"));
    assert!(text.contains("=== FS261059 ↔ FS261110 (1) ==="));
    Ok(())
}

#[test]
fn test_agenda_and_timetable_output() -> Result<()> {
    let (_dir, mut config) = common::fixture();
    config.display.weeks_per_page = 1;
    let session = Session::open(config);
    for cid in ["FS261059", "FS261110", "FS261200"] {
        session.engine.add_course(cid)?;
    }

    let mut r = PlainRenderer::new(Vec::new());
    commands::agenda(&session, &mut r, None, false)?;
    let text = output(r);
    assert!(text.contains("=== 2026-W08 (2026-02-16 → 2026-02-22) ==="));
    assert!(text.contains("2026-02-19 (Thu)"));
    assert!(text.contains("  - ! 10:00-11:00 | FS261059"));
    assert!(text.contains("  - 08:00-10:00 | FS261200 | Financial Accounting | (exam)"));
    assert!(!text.contains("2026-W09"));
    assert!(text.ends_with("Page 1/2\n"));

    let mut r = PlainRenderer::new(Vec::new());
    assert!(commands::agenda(&session, &mut r, Some(3), false).is_err());

    let mut r = PlainRenderer::new(Vec::new());
    commands::timetable(&session, &mut r, Some("2026-W09"))?;
    let text = output(r);
    assert!(text.contains("=== Timetable 2026-W09 (2026-02-23 → 2026-03-01) ==="));
    assert!(text.contains("Mon"));
    assert!(text.contains("10:00-11:00 | FS261059"));
    assert!(!text.contains("Legend"));

    let mut r = PlainRenderer::new(Vec::new());
    commands::timetable(&session, &mut r, Some("2026-W30"))?;
    let text = output(r);
    assert!(text.starts_with("No events in 2026-W30.\nAvailable weeks:\n"));
    assert!(text.contains(" 1) 2026-W08 (2026-02-16 → 2026-02-22)  |  3 events  |  ! 1 conflicts"));

    let mut r = PlainRenderer::new(Vec::new());
    assert!(commands::timetable(&session, &mut r, Some("2026-W60")).is_err());
    Ok(())
}

#[tokio::test]
async fn test_export_writes_ics_file() -> Result<()> {
    let (dir, config) = common::fixture();
    let mut session = Session::open(config);
    let mut r = PlainRenderer::new(Vec::new());

    let out = dir.path().join("exports/schedule.txt");
    run_command(&mut session, &CliCommand::Export { out: Some(out.clone()) }, &mut r).await?;
    assert_eq!(output(r), "No selected events to export.\n");
    assert!(!out.with_extension("ics").exists());

    session.engine.add_course("FS261200")?;
    let mut r = PlainRenderer::new(Vec::new());
    run_command(&mut session, &CliCommand::Export { out: Some(out.clone()) }, &mut r).await?;

    let ics_path = dir.path().join("exports/schedule.ics");
    assert!(output(r).starts_with("Exported 1 events to: "));
    let ics = std::fs::read_to_string(&ics_path)?;
    assert!(ics.contains("SUMMARY:FS261200 Financial Accounting\r\n"));
    assert!(ics.contains("DESCRIPTION:Open book\r\n"));
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_refresh_command_rebuilds_catalog() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut config = myschedule::AppConfig::default();
    config.data.dir = dir.path().to_string_lossy().into_owned();
    config.refresh.scrape_command = vec![
        "sh".into(),
        "-c".into(),
        "echo \"Found 4 courses ($*)\"".into(),
        "scrape".into(),
    ];
    let courses = common::COURSES.replace('\n', " ");
    let events = common::EVENTS.replace('\n', " ");
    config.refresh.parse_command = vec![
        "sh".into(),
        "-c".into(),
        format!("printf '%s' '{}' > courses.json && printf '%s' '{}' > events.json", courses, events),
    ];

    let mut session = Session::open(config);
    assert!(session.engine.catalog().is_empty());

    let mut r = PlainRenderer::new(Vec::new());
    let command = CliCommand::Refresh {
        semester: Some("HS26".into()),
        no_refresh: true,
    };
    assert_eq!(run_command(&mut session, &command, &mut r).await?, 0);
    assert!(output(r).contains("Update done. courses=4 events=6"));
    assert_eq!(session.engine.catalog().course_count(), 4);

    let metadata = session.metadata().unwrap();
    assert_eq!(metadata.semester, "HS26");
    assert_eq!(metadata.events, 6);

    session.config.refresh.scrape_command = vec!["sh".into(), "-c".into(), "exit 4".into()];
    let mut r = PlainRenderer::new(Vec::new());
    let err = run_command(&mut session, &command, &mut r).await.unwrap_err();
    assert!(matches!(err, ScheduleError::RefreshError { .. }));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}
