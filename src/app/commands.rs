use crate::adapters::ics::{with_ics_extension, IcsExporter};
use crate::app::format::{conflict_line, course_label, course_pair_label, event_line, selected_label};
use crate::app::render::{Renderer, Style, Table};
use crate::app::session::Session;
use crate::core::selection::SelectionChange;
use crate::core::views::{
    self, available_weeks, build_agenda, weekday_short, Agenda, AgendaWeek, ConflictReport,
    WeekKey, WeekSummary, WeeklyTimetable,
};
use crate::domain::model::{normalize_course_id, ConflictPair, RefreshOutcome};
use crate::domain::ports::{CalendarExporter, CatalogRefresher, RefreshRequest, Storage};
use crate::utils::error::{Result, ScheduleError};
use crate::utils::validation::parse_iso_week;
use chrono::Datelike;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const TIMETABLE_COLUMN_WIDTH: usize = 38;

pub fn search<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer, text: &str) -> Result<()> {
    let limit = session.config.display.search_limit;
    let results = session.engine.search(text, limit)?;
    if results.matches.is_empty() {
        return r.line("No results.");
    }

    let catalog = session.engine.catalog();
    for course in &results.matches {
        let label = course_label(course, catalog.events_for(&course.course_id).len(), &*r);
        r.line(&label)?;
    }
    if results.total > results.matches.len() {
        r.line(&format!("... and {} more results", results.total - results.matches.len()))?;
    }
    Ok(())
}

pub fn add<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer, course_id: &str) -> Result<()> {
    let result = session.engine.add_course(course_id)?;
    if result.unknown_course {
        r.line(&format!(
            "Warning: course_id '{}' not found in catalog (adding anyway).",
            result.course_id
        ))?;
    }
    match result.change {
        SelectionChange::AlreadySelected => r.line(&format!("Already selected: {}", result.course_id)),
        _ => r.line(&format!(
            "Added: {} (selected: {})",
            result.course_id, result.selected_count
        )),
    }
}

pub fn remove<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer, course_id: &str) -> Result<()> {
    let (cid, change) = session.engine.remove_course(course_id)?;
    match change {
        SelectionChange::NotSelected => r.line(&format!("Not selected: {}", cid)),
        _ => r.line(&format!(
            "Removed: {} (selected: {})",
            cid,
            session.engine.selection().len()
        )),
    }
}

pub fn selected<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer) -> Result<()> {
    let selection = session.engine.selection();
    if selection.is_empty() {
        return r.line("No courses selected.");
    }

    r.line("Selected courses:")?;
    for cid in selection.iter() {
        let label = selected_label(session.engine.catalog(), cid, &*r);
        r.line(&format!("- {}", label))?;
    }
    Ok(())
}

pub fn conflicts<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer) -> Result<()> {
    let report = session.engine.conflicts();
    if report.total == 0 {
        return r.line("No conflicts found.");
    }

    show_conflict_summary(r, &report)?;
    for group in &report.by_course_pair {
        r.blank()?;
        let (a, b) = &group.courses;
        show_conflict_list(r, &format!("{} ↔ {} ({})", a, b, group.pairs.len()), &group.pairs)?;
    }
    Ok(())
}

pub fn preview<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer, course_id: &str) -> Result<()> {
    let cid = normalize_course_id(course_id)
        .ok_or_else(|| ScheduleError::invalid_input("Please provide a course_id."))?;
    if !session.engine.catalog().contains_course(&cid) {
        r.line(&format!("Warning: course_id '{}' not found in catalog.", cid))?;
    }
    if session.engine.selection().contains(&cid) {
        r.line(&format!("Already selected: {}", cid))?;
    }

    let pairs = session.engine.preview_add(&cid);
    if pairs.is_empty() {
        return r.line(&format!("{} has no conflicts with the current selection.", cid));
    }
    show_preview_warning(r, &pairs)?;
    show_candidate_conflicts(session, r, &cid, &pairs)
}

pub fn agenda<S: Storage + Clone>(
    session: &Session<S>,
    r: &mut dyn Renderer,
    page: Option<usize>,
    all: bool,
) -> Result<()> {
    let events = session.engine.selected_events();
    if events.is_empty() {
        return r.line("No selected events.");
    }

    let agenda = build_agenda(&events);
    show_agenda_legend(r, &agenda)?;
    if all {
        return show_agenda_weeks(r, &agenda, &agenda.weeks);
    }

    let per_page = session.config.display.weeks_per_page;
    let pages = agenda.page_count(per_page);
    let page = page.unwrap_or(1);
    if page == 0 || page > pages.max(1) {
        return Err(ScheduleError::invalid_input(format!(
            "Page {} does not exist (pages: {}).",
            page, pages
        )));
    }

    show_agenda_weeks(r, &agenda, agenda.page(page - 1, per_page))?;
    r.blank()?;
    r.line(&format!("Page {}/{}", page, pages))
}

pub fn timetable<S: Storage + Clone>(
    session: &Session<S>,
    r: &mut dyn Renderer,
    week: Option<&str>,
) -> Result<()> {
    let events = session.engine.selected_events();
    if events.is_empty() {
        return r.line("No selected events.");
    }
    let weeks = available_weeks(&events);
    let Some(first) = weeks.first() else {
        return r.line("No valid event dates.");
    };

    let key = match week {
        Some(label) => {
            let (year, week) = parse_iso_week(label)?;
            WeekKey { year, week }
        }
        None => first.key,
    };

    let grid = views::weekly_timetable(&events, key);
    if grid.is_empty() {
        r.line(&format!("No events in {}.", key))?;
        r.line("Available weeks:")?;
        return show_week_list(r, &weeks);
    }
    show_timetable(r, &grid)
}

pub fn export<S: Storage + Clone>(session: &Session<S>, r: &mut dyn Renderer, out: Option<&Path>) -> Result<()> {
    let events = session.engine.export_events();
    if events.is_empty() {
        return r.line("No selected events to export.");
    }

    let target = match out {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&session.config.export.default_path),
    };
    let target = with_ics_extension(&target);
    let written = IcsExporter::new().export(&events, &target)?;
    r.line(&format!("Exported {} events to: {}", written, target.display()))
}

/// Runs the refresh job and reloads the catalog on success.
pub async fn update_data<S: Storage + Clone>(
    session: &mut Session<S>,
    r: &mut dyn Renderer,
    refresher: &dyn CatalogRefresher,
    request: RefreshRequest,
    cancel: CancellationToken,
) -> Result<RefreshOutcome> {
    r.line(&format!(
        "Updating catalog for {} ({})... (Ctrl+C to abort)",
        request.semester,
        if request.refresh { "re-download all pages" } else { "fetch missing pages only" }
    ))?;

    let outcome = refresher.refresh(&request, cancel).await;
    match &outcome {
        RefreshOutcome::Success { courses, events } => {
            session.reload();
            r.line(&format!("Update done. courses={} events={}", courses, events))?;
        }
        RefreshOutcome::Failed { reason } => {
            tracing::error!("Refresh failed: {}", reason);
            r.line(&format!("Update failed: {}", reason))?;
        }
        RefreshOutcome::Cancelled => r.line("Update cancelled. Catalog files may be incomplete.")?,
    }
    Ok(outcome)
}

pub fn show_conflict_summary(r: &mut dyn Renderer, report: &ConflictReport<'_>) -> Result<()> {
    r.line(&format!("Conflicts found: {}", report.total))?;
    r.line(&format!("Courses involved in conflicts: {}", report.involved_courses))
}

/// Numbered course-pair overview followed by an entry for the full list.
pub fn show_conflict_pairs<S: Storage + Clone>(
    session: &Session<S>,
    r: &mut dyn Renderer,
    report: &ConflictReport<'_>,
) -> Result<()> {
    let catalog = session.engine.catalog();
    r.line("Conflict overview (by course pair):")?;
    for (i, group) in report.by_course_pair.iter().enumerate() {
        let (a, b) = &group.courses;
        let count = r.highlight(&group.pairs.len().to_string(), Style::Count);
        let line = format!(
            "{}) {}  <->  {}  ({} conflicts)",
            i + 1,
            course_pair_label(catalog, a, &*r),
            course_pair_label(catalog, b, &*r),
            count
        );
        r.line(&line)?;
    }
    r.line(&format!(
        "{}) Show ALL conflicts ({})",
        report.by_course_pair.len() + 1,
        report.total
    ))
}

pub fn show_conflict_list(r: &mut dyn Renderer, title: &str, pairs: &[ConflictPair<'_>]) -> Result<()> {
    let heading = r.highlight(&format!("=== {} ===", title), Style::Heading);
    r.line(&heading)?;
    for (i, pair) in pairs.iter().enumerate() {
        let line = format!("{}. {}", i + 1, conflict_line(pair, &*r));
        r.line(&line)?;
    }
    Ok(())
}

pub fn show_preview_warning(r: &mut dyn Renderer, pairs: &[ConflictPair<'_>]) -> Result<()> {
    let mut others: Vec<&str> = pairs.iter().map(|p| p.second.course_id.as_str()).collect();
    others.sort_unstable();
    others.dedup();
    let line = format!(
        "⚠ This course conflicts with {} selected course(s), total {} conflicting event overlap(s).",
        others.len(),
        pairs.len()
    );
    let line = r.highlight(&line, Style::Conflict);
    r.line(&line)
}

/// Candidate-add conflicts grouped by the selected course they collide with.
pub fn show_candidate_conflicts<S: Storage + Clone>(
    session: &Session<S>,
    r: &mut dyn Renderer,
    candidate: &str,
    pairs: &[ConflictPair<'_>],
) -> Result<()> {
    if pairs.is_empty() {
        return r.line("No conflicts.");
    }
    let catalog = session.engine.catalog();

    let mut by_other: BTreeMap<&str, Vec<ConflictPair<'_>>> = BTreeMap::new();
    for pair in pairs {
        by_other.entry(pair.second.course_id.as_str()).or_default().push(*pair);
    }

    r.blank()?;
    r.line("Conflicts for candidate course:")?;
    let label = selected_label(catalog, candidate, &*r);
    r.line(&format!("- {}", label))?;
    r.blank()?;
    for (other, group) in &by_other {
        let label = selected_label(catalog, other, &*r);
        r.line(&format!("* {}  →  {} conflicts", label, group.len()))?;
    }

    r.blank()?;
    r.line("Details:")?;
    let mut n = 1;
    for (other, group) in by_other.iter_mut() {
        crate::core::conflicts::sort_for_display(group);
        r.blank()?;
        let label = selected_label(catalog, other, &*r);
        r.line(&format!("=== With: {} ===", label))?;
        for pair in group.iter() {
            let line = format!("{}) {}", n, conflict_line(pair, &*r));
            r.line(&line)?;
            n += 1;
        }
    }
    Ok(())
}

pub fn show_agenda_legend(r: &mut dyn Renderer, agenda: &Agenda<'_>) -> Result<()> {
    if agenda.conflicting.is_empty() {
        return Ok(());
    }
    let marker = r.highlight("CONFLICT", Style::Conflict);
    r.line(&format!("Legend: {} = overlaps detected", marker))
}

pub fn show_agenda_weeks(r: &mut dyn Renderer, agenda: &Agenda<'_>, weeks: &[AgendaWeek<'_>]) -> Result<()> {
    for week in weeks {
        r.blank()?;
        let heading = r.highlight(&format!("=== {} ===", week.key.range_label()), Style::Heading);
        r.line(&heading)?;
        for day in &week.days {
            r.blank()?;
            r.line(&format!("{} ({})", day.date, weekday_short(day.date.weekday())))?;
            for event in &day.events {
                let text = event_line(event);
                let text = if agenda.is_conflicting(event) {
                    r.highlight(&text, Style::Conflict)
                } else {
                    text
                };
                r.line(&format!("  - {}", text))?;
            }
        }
    }
    Ok(())
}

pub fn show_week_list(r: &mut dyn Renderer, weeks: &[WeekSummary]) -> Result<()> {
    for (i, week) in weeks.iter().enumerate() {
        let conflicts = format!("{} conflicts", week.conflict_count);
        let conflicts = if week.conflict_count > 0 {
            r.highlight(&conflicts, Style::Conflict)
        } else {
            r.highlight(&conflicts, Style::Ok)
        };
        let line = format!(
            "{:>2}) {}  |  {} events  |  {}",
            i + 1,
            week.key.range_label(),
            week.event_count,
            conflicts
        );
        r.line(&line)?;
    }
    Ok(())
}

pub fn show_timetable(r: &mut dyn Renderer, grid: &WeeklyTimetable<'_>) -> Result<()> {
    r.blank()?;
    let heading = r.highlight(&format!("=== Timetable {} ===", grid.key.range_label()), Style::Heading);
    r.line(&heading)?;
    if !grid.conflicting.is_empty() {
        let marker = r.highlight("CONFLICT", Style::Conflict);
        r.line(&format!("Legend: {} = overlaps detected in this week", marker))?;
    }

    let mut table = Table::new(grid.columns.iter().map(|(day, _)| weekday_short(*day)))
        .with_max_column_width(TIMETABLE_COLUMN_WIDTH);
    let cells: Vec<String> = grid
        .columns
        .iter()
        .map(|(_, events)| {
            events
                .iter()
                .map(|event| {
                    let text = event_line(event);
                    if grid.is_conflicting(event) {
                        r.highlight(&text, Style::Conflict)
                    } else {
                        text
                    }
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .collect();
    table.add_row(cells);
    r.table(&table)
}

/// One-shot subcommand dispatch. Rejected input prints a message and yields exit code 1.
#[cfg(feature = "cli")]
pub async fn run_command(
    session: &mut Session<crate::adapters::storage::LocalStorage>,
    command: &crate::config::CliCommand,
    r: &mut dyn Renderer,
) -> Result<i32> {
    use crate::config::CliCommand;

    let result = match command {
        CliCommand::Search { text } => search(session, r, text),
        CliCommand::Add { course_id } => add(session, r, course_id),
        CliCommand::Remove { course_id } => remove(session, r, course_id),
        CliCommand::Selected => selected(session, r),
        CliCommand::Conflicts => conflicts(session, r),
        CliCommand::Preview { course_id } => preview(session, r, course_id),
        CliCommand::Agenda { page, all } => agenda(session, r, *page, *all),
        CliCommand::Timetable { week } => timetable(session, r, week.as_deref()),
        CliCommand::Export { out } => export(session, r, out.as_deref()),
        CliCommand::Refresh {
            semester,
            no_refresh,
        } => {
            let request = RefreshRequest {
                semester: semester
                    .clone()
                    .unwrap_or_else(|| session.config.refresh.semester.clone()),
                refresh: !no_refresh,
            };
            let refresher = session.command_refresher();
            let (cancel, listener) = crate::adapters::refresh::cancel_on_ctrl_c();
            let outcome = update_data(session, r, &refresher, request, cancel).await;
            listener.abort();
            match outcome? {
                RefreshOutcome::Failed { reason } => Err(ScheduleError::RefreshError { message: reason }),
                RefreshOutcome::Cancelled => return Ok(130),
                RefreshOutcome::Success { .. } => Ok(()),
            }
        }
        CliCommand::Interactive => {
            let refresher = session.command_refresher();
            let stdin = std::io::stdin();
            crate::app::interactive::run(session, &refresher, stdin.lock(), r).await
        }
    };

    match result {
        Ok(()) => Ok(0),
        Err(e) if e.category() == crate::utils::error::ErrorCategory::Input => {
            tracing::debug!("Rejected input: {}", e);
            r.line(&e.user_friendly_message())?;
            Ok(e.exit_code())
        }
        Err(e) => Err(e),
    }
}
