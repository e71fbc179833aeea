use crate::adapters::refresh::cancel_on_ctrl_c;
use crate::app::commands;
use crate::app::format::{course_label, selected_label};
use crate::app::render::{Renderer, Table};
use crate::app::session::Session;
use crate::core::views::{available_weeks, build_agenda, weekly_timetable};
use crate::domain::ports::{CatalogRefresher, RefreshRequest, Storage};
use crate::utils::error::Result;
use std::io::BufRead;
use std::path::PathBuf;

const MENU: &str = "\n[1] Search + add course\n\
[2] View selected courses\n\
[3] Remove a course\n\
[4] Show conflicts\n\
[5] Timetable (choose week)\n\
[6] Agenda (all dates)\n\
[7] Export .ics\n\
[8] Update data (scrape + parse)\n\
[0] Exit\n\
\nSelect:";

/// Runs the menu until the user picks 0 or the input ends.
pub async fn run<S: Storage + Clone, R: BufRead>(
    session: &mut Session<S>,
    refresher: &dyn CatalogRefresher,
    input: R,
    out: &mut dyn Renderer,
) -> Result<()> {
    let mut menu = Menu {
        input,
        out,
        refresher,
        eof: false,
    };
    menu.run(session).await
}

struct Menu<'a, R: BufRead> {
    input: R,
    out: &'a mut dyn Renderer,
    refresher: &'a dyn CatalogRefresher,
    eof: bool,
}

impl<R: BufRead> Menu<'_, R> {
    /// Prints `message` and reads one trimmed line. End of input reads as "0".
    fn prompt(&mut self, message: &str) -> Result<String> {
        self.out.line(message)?;
        if self.eof {
            return Ok("0".to_string());
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            tracing::debug!("End of input, leaving the menu");
            self.eof = true;
            return Ok("0".to_string());
        }
        Ok(line.trim().to_string())
    }

    async fn run<S: Storage + Clone>(&mut self, session: &mut Session<S>) -> Result<()> {
        if !session.has_data() {
            self.onboarding(session).await?;
        }

        loop {
            self.header(session)?;
            let choice = self.prompt(MENU)?;
            self.out.line(&"-".repeat(60))?;

            let result = match choice.as_str() {
                "0" => {
                    self.out.line("Bye.")?;
                    return Ok(());
                }
                "1" => self.search_add(session),
                "2" => commands::selected(session, &mut *self.out),
                "3" => self.remove(session),
                "4" => self.conflicts(session),
                "5" => self.timetable(session),
                "6" => self.agenda(session),
                "7" => self.export(session),
                "8" => self.update_data(session).await.map(|_| ()),
                _ => self.out.line("Invalid choice."),
            };

            if let Err(e) = result {
                tracing::warn!("Menu action failed: {}", e);
                self.out.line(&e.user_friendly_message())?;
                self.out.line(&format!("Suggestion: {}", e.recovery_suggestion()))?;
            }
        }
    }

    async fn onboarding<S: Storage + Clone>(&mut self, session: &mut Session<S>) -> Result<()> {
        self.out.line("")?;
        self.out.line("No catalog data found yet (courses.json / events.json).")?;
        self.out.line("You need to run an initial scrape + parse once.")?;
        let go = self.prompt("Run [8] Update data now? [Y/n] (0 = back):")?.to_lowercase();
        if go == "0" || go == "n" {
            self.out.line("Continuing without data. You can run [8] Update data anytime.")?;
            return Ok(());
        }
        if self.update_data(session).await? {
            self.out.line("Data loaded. Welcome to MySchedule!")?;
        }
        Ok(())
    }

    fn header<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        self.out.line("")?;
        self.out.line("=== MySchedule (interactive) ===")?;
        match session.metadata() {
            Some(meta) => self.out.line(&format!(
                "Data: semester={} | last_scraped={} | courses={} | events={}",
                meta.semester, meta.last_scraped, meta.courses, meta.events
            ))?,
            None => self.out.line(
                "Data: (no metadata yet) - run [8] Update data once to generate metadata.json",
            )?,
        }
        self.out.line(&format!(
            "Selected courses: {} | Selected events: {}",
            session.engine.selection().len(),
            session.engine.selected_events().len()
        ))
    }

    fn search_add<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        let limit = session.config.display.search_limit;
        loop {
            let query = self.prompt(
                "Search text or code (e.g. 'finance' or 'FS261107') [blank = new search, 0 = back]:",
            )?;
            if query == "0" {
                return Ok(());
            }
            if query.is_empty() {
                continue;
            }

            let results = session.engine.search(&query, limit)?;
            if results.matches.is_empty() {
                self.out.line("No results.")?;
                continue;
            }

            let mut table = Table::new(["#", "Course"]).with_title(format!("Search results (max {})", limit));
            for (i, course) in results.matches.iter().enumerate() {
                let events = session.engine.catalog().events_for(&course.course_id).len();
                table.add_row([(i + 1).to_string(), course_label(course, events, &*self.out)]);
            }
            self.out.table(&table)?;

            let pick = self.prompt("Enter number to add [blank = new search, 0 = back]:")?;
            if pick == "0" {
                return Ok(());
            }
            if pick.is_empty() {
                continue;
            }
            let Ok(index) = pick.parse::<usize>() else {
                self.out.line("Not a number.")?;
                continue;
            };
            let Some(course) = index.checked_sub(1).and_then(|i| results.matches.get(i)) else {
                self.out.line("Out of range.")?;
                continue;
            };
            let cid = course.course_id.clone();

            if session.engine.selection().contains(&cid) {
                self.out.line(&format!("Already selected: {}", cid))?;
            } else {
                let pairs = session.engine.preview_add(&cid);
                let mut add = true;
                if !pairs.is_empty() {
                    self.out.line("")?;
                    commands::show_preview_warning(&mut *self.out, &pairs)?;
                    loop {
                        let answer = self
                            .prompt("Add anyway? [Y]=add, [N]=cancel, [D]=details:")?
                            .to_lowercase();
                        match answer.as_str() {
                            "y" | "" => break,
                            "n" | "0" => {
                                add = false;
                                break;
                            }
                            "d" => {
                                commands::show_candidate_conflicts(session, &mut *self.out, &cid, &pairs)?;
                                self.prompt("\nPress Enter to go back:")?;
                            }
                            _ => self.out.line("Invalid input.")?,
                        }
                    }
                }
                if add {
                    session.engine.add_course(&cid)?;
                    self.out.line(&format!("Added: {}", cid))?;
                } else {
                    self.out.line("Not added.")?;
                }
            }

            let more = self.prompt("Add another course? [Y/n]:")?.to_lowercase();
            if more == "n" || more == "0" {
                return Ok(());
            }
        }
    }

    fn remove<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        loop {
            let ids = session.engine.selection().to_sorted_vec();
            if ids.is_empty() {
                return self.out.line("No courses selected.");
            }

            let mut table = Table::new(["#", "Course"]).with_title("Remove course");
            for (i, cid) in ids.iter().enumerate() {
                table.add_row([
                    (i + 1).to_string(),
                    selected_label(session.engine.catalog(), cid, &*self.out),
                ]);
            }
            self.out.table(&table)?;

            let pick = self.prompt("Enter number to remove (blank or 0 = cancel):")?;
            if pick.is_empty() || pick == "0" {
                return Ok(());
            }
            let Ok(index) = pick.parse::<usize>() else {
                self.out.line("Not a number.")?;
                continue;
            };
            let Some(cid) = index.checked_sub(1).and_then(|i| ids.get(i)) else {
                self.out.line("Out of range.")?;
                continue;
            };

            session.engine.remove_course(cid)?;
            self.out.line(&format!("Removed: {}", cid))?;

            let more = self.prompt("Remove another course? [Y/n]:")?.to_lowercase();
            if more == "n" || more == "0" {
                return Ok(());
            }
        }
    }

    fn conflicts<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        if session.engine.selected_events().is_empty() {
            return self.out.line("No selected events.");
        }
        let report = session.engine.conflicts();
        if report.total == 0 {
            return self.out.line("No conflicts found.");
        }

        commands::show_conflict_summary(&mut *self.out, &report)?;
        loop {
            self.out.line("")?;
            commands::show_conflict_pairs(session, &mut *self.out, &report)?;

            let pick = self.prompt("Select number for details, or 0 to go back:")?;
            if pick == "0" || pick.is_empty() {
                return Ok(());
            }
            let Ok(choice) = pick.parse::<usize>() else {
                self.out.line("Not a number.")?;
                continue;
            };

            self.out.line("")?;
            if choice == report.by_course_pair.len() + 1 {
                let title = format!("All conflicts ({})", report.total);
                commands::show_conflict_list(&mut *self.out, &title, &report.all)?;
            } else if let Some(group) = choice.checked_sub(1).and_then(|i| report.by_course_pair.get(i)) {
                let (a, b) = &group.courses;
                let title = format!("Conflicts: {} ↔ {} ({})", a, b, group.pairs.len());
                commands::show_conflict_list(&mut *self.out, &title, &group.pairs)?;
            } else {
                self.out.line("Out of range.")?;
                continue;
            }
            self.prompt("\nPress Enter to go back...")?;
        }
    }

    fn timetable<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        let events = session.engine.selected_events();
        if events.is_empty() {
            return self.out.line("No selected events.");
        }
        let weeks = available_weeks(&events);
        let Some(first) = weeks.first().map(|w| w.key) else {
            return self.out.line("No valid event dates.");
        };

        loop {
            self.out.line("")?;
            self.out.line("Available weeks:")?;
            commands::show_week_list(&mut *self.out, &weeks)?;

            let pick = self.prompt("Choose week number (blank = first, 0 = back):")?;
            if pick == "0" {
                return Ok(());
            }
            let key = pick
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| weeks.get(i))
                .map(|w| w.key)
                .unwrap_or(first);

            let grid = weekly_timetable(&events, key);
            if grid.is_empty() {
                self.out.line("No events in that week (Mon-Sat).")?;
            } else {
                commands::show_timetable(&mut *self.out, &grid)?;
            }

            let after = self.prompt("\nPress Enter to choose another week, or 0 to return to menu:")?;
            if after == "0" {
                return Ok(());
            }
        }
    }

    fn agenda<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        let events = session.engine.selected_events();
        if events.is_empty() {
            return self.out.line("No selected events.");
        }
        let agenda = build_agenda(&events);
        let per_page = session.config.display.weeks_per_page;

        commands::show_agenda_legend(&mut *self.out, &agenda)?;
        let mode = self
            .prompt(&format!(
                "\nAgenda mode: [Enter]=paged ({} weeks), [A]=show all, [0]=back:",
                per_page
            ))?
            .to_lowercase();
        if mode == "0" {
            return Ok(());
        }
        if mode == "a" {
            return commands::show_agenda_weeks(&mut *self.out, &agenda, &agenda.weeks);
        }

        let pages = agenda.page_count(per_page);
        for page in 0..pages {
            commands::show_agenda_weeks(&mut *self.out, &agenda, agenda.page(page, per_page))?;
            if page + 1 == pages {
                break;
            }
            let more = self.prompt("\nPress Enter to load more, or 0 to return to menu:")?;
            if more == "0" {
                break;
            }
        }
        Ok(())
    }

    fn export<S: Storage + Clone>(&mut self, session: &Session<S>) -> Result<()> {
        if session.engine.export_events().is_empty() {
            return self.out.line("No selected events.");
        }

        let default_path = session.config.export.default_path.clone();
        let choice = self
            .prompt(&format!(
                "Export location: [Enter]={}, [P]=custom path, [0]=back:",
                default_path
            ))?
            .to_lowercase();
        let target = match choice.as_str() {
            "0" => return Ok(()),
            "p" => match self.prompt("Enter file name or path, e.g. my.ics (0 = back):")?.as_str() {
                "0" => return Ok(()),
                "" => PathBuf::from(&default_path),
                path => PathBuf::from(path),
            },
            _ => PathBuf::from(&default_path),
        };

        commands::export(session, &mut *self.out, Some(&target))?;
        self.out.line("")?;
        self.out.line("Next steps:")?;
        self.out
            .line("- Google Calendar (desktop): Settings → Import & export → Import → choose this .ics file")?;
        self.out
            .line("- Phone: send the .ics file to yourself and tap it to import")
    }

    /// Returns true when the catalog was rebuilt and reloaded.
    async fn update_data<S: Storage + Clone>(&mut self, session: &mut Session<S>) -> Result<bool> {
        let default_semester = session.config.refresh.semester.clone();
        let semester = self.prompt(&format!("Semester [{}] (0 = back):", default_semester))?;
        if semester == "0" {
            return Ok(false);
        }
        let semester = if semester.is_empty() {
            default_semester
        } else {
            semester
        };

        self.out.line("")?;
        self.out.line("About update:")?;
        self.out.line("- Course and event files are rebuilt and OVERWRITTEN each time.")?;
        self.out.line("- Your selected courses stay unchanged.")?;
        self.out.line("- [Y] Refresh = re-download ALL course pages.")?;
        self.out.line("- [N] No refresh = keep cached pages and only fetch missing ones.")?;

        let refresh = self.prompt("Refresh (re-download all pages)? [Y/n] (0 = back):")?.to_lowercase();
        if refresh == "0" {
            return Ok(false);
        }

        self.out.line("")?;
        self.out.line("This may take several minutes. You can abort anytime with Ctrl+C.")?;
        let confirm = self.prompt("Start update now? [Y/n] (0 = back):")?.to_lowercase();
        if confirm == "0" {
            return Ok(false);
        }
        if confirm == "n" {
            self.out.line("Update cancelled.")?;
            return Ok(false);
        }

        let request = RefreshRequest {
            semester,
            refresh: refresh != "n",
        };
        let (cancel, listener) = cancel_on_ctrl_c();
        let outcome = commands::update_data(session, &mut *self.out, self.refresher, request, cancel).await;
        listener.abort();

        let reloaded = outcome?.is_success();
        if reloaded {
            self.out.line("Data reloaded into interactive session.")?;
        }
        Ok(reloaded)
    }
}
