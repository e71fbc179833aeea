use crate::utils::error::Result;
use regex::Regex;
use std::io::Write;
use std::sync::OnceLock;

/// Semantic emphasis; each renderer decides how (or whether) to show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Heading,
    Id,
    Person,
    Kind,
    Count,
    Conflict,
    Ok,
}

/// Simple text table. Cells may span several lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Cells wider than this are cut with an ellipsis.
    pub max_column_width: Option<usize>,
}

impl Table {
    pub fn new<I, T>(headers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = Some(width.max(2));
        self
    }

    pub fn add_row<I, T>(&mut self, cells: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Presentation seam used by the commands and the interactive menu.
pub trait Renderer {
    fn line(&mut self, text: &str) -> Result<()>;
    fn table(&mut self, table: &Table) -> Result<()>;
    fn highlight(&self, text: &str, style: Style) -> String;

    fn blank(&mut self) -> Result<()> {
        self.line("")
    }
}

/// Plain text output; conflicts are marked with a leading `!`.
pub struct PlainRenderer<W: Write> {
    out: W,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        for line in layout_table(table, |header| header.to_string()) {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn highlight(&self, text: &str, style: Style) -> String {
        match style {
            Style::Conflict => format!("! {}", text),
            _ => text.to_string(),
        }
    }
}

/// Colored terminal output using ANSI escape codes.
pub struct AnsiRenderer<W: Write> {
    out: W,
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for AnsiRenderer<W> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        let lines = layout_table(table, |header| self.highlight(header, Style::Heading));
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn highlight(&self, text: &str, style: Style) -> String {
        let code = match style {
            Style::Heading => "1",
            Style::Id => "1;36",
            Style::Person => "35",
            Style::Kind => "32",
            Style::Count => "33",
            Style::Conflict => "31",
            Style::Ok => "32",
        };
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Picks the colored or plain renderer for stdout.
pub fn stdout_renderer(color: bool) -> Box<dyn Renderer> {
    if color {
        Box::new(AnsiRenderer::new(std::io::stdout()))
    } else {
        Box::new(PlainRenderer::new(std::io::stdout()))
    }
}

fn ansi_pattern() -> Option<&'static Regex> {
    static ANSI: OnceLock<Option<Regex>> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()).as_ref()
}

fn strip_ansi(text: &str) -> String {
    match ansi_pattern() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Display width ignoring color codes.
pub fn visible_width(text: &str) -> usize {
    strip_ansi(text).chars().count()
}

fn fit(text: &str, width: usize) -> String {
    let visible = visible_width(text);
    if visible <= width {
        return format!("{}{}", text, " ".repeat(width - visible));
    }

    // Color codes are copied through so a cut cell keeps its style.
    let keep = width.saturating_sub(1);
    let mut cut = String::new();
    let mut taken = 0;
    let mut styled = false;
    let mut rest = text;
    while taken < keep {
        if let Some(code) = ansi_pattern()
            .and_then(|re| re.find(rest))
            .filter(|m| m.start() == 0)
        {
            cut.push_str(code.as_str());
            styled = true;
            rest = &rest[code.end()..];
            continue;
        }
        let Some(ch) = rest.chars().next() else { break };
        cut.push(ch);
        taken += 1;
        rest = &rest[ch.len_utf8()..];
    }
    cut.push('…');
    if styled {
        cut.push_str("\x1b[0m");
    }
    cut
}

fn layout_table(table: &Table, header_style: impl Fn(&str) -> String) -> Vec<String> {
    let columns = table.column_count();
    if columns == 0 {
        return Vec::new();
    }

    let cell_lines = |row: &[String], col: usize| -> Vec<String> {
        row.get(col)
            .map(|cell| cell.lines().map(str::to_string).collect())
            .unwrap_or_default()
    };

    let mut widths = vec![0usize; columns];
    for (col, width) in widths.iter_mut().enumerate() {
        let header = table.headers.get(col).map(|h| visible_width(h)).unwrap_or(0);
        let cells = table
            .rows
            .iter()
            .flat_map(|row| cell_lines(row, col))
            .map(|line| visible_width(&line))
            .max()
            .unwrap_or(0);
        *width = header.max(cells);
        if let Some(max) = table.max_column_width {
            *width = (*width).min(max);
        }
    }

    let mut lines = Vec::new();
    if let Some(title) = &table.title {
        lines.push(title.clone());
    }
    if !table.headers.is_empty() {
        let header: Vec<String> = (0..columns)
            .map(|col| {
                let text = table.headers.get(col).map(String::as_str).unwrap_or("");
                let padded = fit(text, widths[col]);
                header_style(&padded)
            })
            .collect();
        lines.push(header.join(" | ").trim_end().to_string());
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        lines.push(rule.join("-+-"));
    }

    for row in &table.rows {
        let cells: Vec<Vec<String>> = (0..columns).map(|col| cell_lines(row, col)).collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for i in 0..height {
            let parts: Vec<String> = (0..columns)
                .map(|col| fit(cells[col].get(i).map(String::as_str).unwrap_or(""), widths[col]))
                .collect();
            lines.push(parts.join(" | ").trim_end().to_string());
        }
    }
    lines
}
