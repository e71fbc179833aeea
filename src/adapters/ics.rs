use crate::domain::model::Event;
use crate::domain::ports::CalendarExporter;
use crate::utils::error::{Result, ScheduleError};
use chrono::{NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const PRODID: &str = "-//MySchedule//EN";

/// Writes iCalendar 2.0 files with floating local times.
#[derive(Debug, Clone, Default)]
pub struct IcsExporter;

impl IcsExporter {
    pub fn new() -> Self {
        Self
    }

    /// Calendar text and the number of events it contains.
    pub fn render(&self, events: &[&Event]) -> (String, usize) {
        let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        let mut lines: Vec<String> = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", PRODID),
            "CALSCALE:GREGORIAN".to_string(),
        ];

        let mut count = 0;
        for event in events {
            let (Some(dtstart), Some(dtend)) = (
                local_datetime(&event.date, &event.start),
                local_datetime(&event.date, &event.end),
            ) else {
                tracing::debug!("Skipping event without valid date/time: {}", event.event_id);
                continue;
            };

            let course_id = event.course_id.trim();
            let title = event.title.trim();
            let summary = if course_id.is_empty() && title.is_empty() {
                "MySchedule Event".to_string()
            } else {
                format!("{} {}", course_id, title).trim().to_string()
            };
            let uid = match event.event_id.trim() {
                "" => format!("{}-{}", course_id, dtstart),
                id => id.to_string(),
            };

            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!("UID:{}", escape_text(&uid)));
            lines.push(format!("DTSTAMP:{}", dtstamp));
            lines.push(format!("DTSTART:{}", dtstart));
            lines.push(format!("DTEND:{}", dtend));
            lines.push(format!("SUMMARY:{}", escape_text(&summary)));
            if let Some(location) = event.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
                lines.push(format!("LOCATION:{}", escape_text(location)));
            }
            if let Some(note) = event.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                lines.push(format!("DESCRIPTION:{}", escape_text(note)));
            }
            lines.push("END:VEVENT".to_string());
            count += 1;
        }

        lines.push("END:VCALENDAR".to_string());

        let mut text = lines.join("\r\n");
        text.push_str("\r\n");
        (text, count)
    }
}

impl CalendarExporter for IcsExporter {
    fn export(&self, events: &[&Event], out: &Path) -> Result<usize> {
        let (text, count) = self.render(events);

        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScheduleError::ExportError {
                message: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }
        fs::write(out, text).map_err(|e| ScheduleError::ExportError {
            message: format!("cannot write {}: {}", out.display(), e),
        })?;

        tracing::info!("Exported {} events to {}", count, out.display());
        Ok(count)
    }
}

/// Forces a `.ics` extension, replacing any other one.
pub fn with_ics_extension(path: &Path) -> PathBuf {
    let is_ics = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ics"));
    if is_ics {
        path.to_path_buf()
    } else {
        path.with_extension("ics")
    }
}

fn local_datetime(date: &str, time: &str) -> Option<String> {
    let parsed =
        NaiveDateTime::parse_from_str(&format!("{} {}", date.trim(), time.trim()), "%Y-%m-%d %H:%M").ok()?;
    Some(parsed.format("%Y%m%dT%H%M00").to_string())
}

fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace(';', "\\;")
        .replace(',', "\\,")
}
