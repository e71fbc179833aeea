use crate::app::render::{Renderer, Style};
use crate::core::catalog::Catalog;
use crate::domain::model::{ConflictPair, Course, Event};

const MAX_INSTRUCTOR_LEN: usize = 38;

/// First instructor, without any `/ ...` suffix, plus `+N` for the rest.
pub fn short_instructors(course: &Course) -> String {
    let names: Vec<&str> = course
        .instructors
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    let Some(first) = names.first() else {
        return String::new();
    };

    let mut first = first.split('/').next().unwrap_or_default().trim().to_string();
    if first.chars().count() > MAX_INSTRUCTOR_LEN {
        first = first.chars().take(MAX_INSTRUCTOR_LEN - 1).collect::<String>().trim_end().to_string();
        first.push('…');
    }

    match names.len() - 1 {
        0 => first,
        extra => format!("{} +{}", first, extra),
    }
}

/// `FS261059 | Corporate Finance | Prof. A +1 | Vorlesung | 12 events`
pub fn course_label(course: &Course, event_count: usize, r: &dyn Renderer) -> String {
    let title = match course.title.trim() {
        "" => "(no title)",
        t => t,
    };
    let mut bits = vec![r.highlight(&course.course_id, Style::Id), title.to_string()];

    let instructors = short_instructors(course);
    if !instructors.is_empty() {
        bits.push(r.highlight(&instructors, Style::Person));
    }
    if let Some(course_type) = course.course_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        bits.push(r.highlight(course_type, Style::Kind));
    }
    bits.push(format!("{} events", r.highlight(&event_count.to_string(), Style::Count)));
    bits.join(" | ")
}

/// Label for a selected id, whether or not the catalog knows it.
pub fn selected_label(catalog: &Catalog, course_id: &str, r: &dyn Renderer) -> String {
    let events = catalog.events_for(course_id).len();
    match catalog.course(course_id) {
        Some(course) => course_label(course, events, r),
        None => format!(
            "{} | (not found in catalog) | {} events",
            r.highlight(course_id, Style::Id),
            events
        ),
    }
}

/// `FS261059 | Corporate Finance | Vorlesung`, used for conflict pairs.
pub fn course_pair_label(catalog: &Catalog, course_id: &str, r: &dyn Renderer) -> String {
    let mut parts = vec![r.highlight(course_id, Style::Id)];
    if let Some(course) = catalog.course(course_id) {
        if !course.title.trim().is_empty() {
            parts.push(course.title.trim().to_string());
        }
        if let Some(course_type) = course.course_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            parts.push(r.highlight(course_type, Style::Kind));
        }
    }
    parts.join(" | ")
}

/// `10:15-12:00 | FS261110 | Public Economics | (lecture) | @ HS 8`
pub fn event_line(event: &Event) -> String {
    let mut bits = vec![
        format!("{}-{}", event.start.trim(), event.end.trim()),
        event.course_id.trim().to_string(),
        event.title.trim().to_string(),
        format!("({})", event.kind),
    ];
    if let Some(location) = event.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        bits.push(format!("@ {}", location));
    }
    bits.retain(|b| !b.is_empty());
    bits.join(" | ")
}

/// `2026-02-19: <event>  <->  <event>`
pub fn conflict_line(pair: &ConflictPair<'_>, r: &dyn Renderer) -> String {
    format!(
        "{}: {}  <->  {}",
        pair.first.date.trim(),
        r.highlight(&event_line(pair.first), Style::Conflict),
        r.highlight(&event_line(pair.second), Style::Conflict)
    )
}
