use crate::adapters::json_catalog::JsonCatalogSource;
use crate::domain::model::{CatalogMetadata, RefreshOutcome};
use crate::domain::ports::{CatalogRefresher, RefreshRequest, Storage};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Counters derived from the scraper's output lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeProgress {
    pub total: Option<usize>,
    pub fetched: usize,
    pub skipped: usize,
}

impl ScrapeProgress {
    /// Feeds one output line; returns true if it advanced the progress.
    pub fn observe(&mut self, line: &str) -> bool {
        static FOUND: OnceLock<Option<Regex>> = OnceLock::new();
        let found = FOUND.get_or_init(|| Regex::new(r"Found (\d+) courses").ok());

        if let Some(total) = found
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|caps| caps[1].parse().ok())
        {
            self.total = Some(total);
            return true;
        }

        let line = line.trim_start();
        if line.starts_with("FETCH") {
            self.fetched += 1;
            true
        } else if line.starts_with("SKIP") {
            self.skipped += 1;
            true
        } else {
            false
        }
    }

    pub fn done(&self) -> usize {
        self.fetched + self.skipped
    }
}

enum StepOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Runs the external scrape and parse commands, then records catalog metadata.
///
/// Commands are given as a program followed by its fixed arguments and run in
/// the data directory. The scraper additionally receives
/// `--semester <S> [--refresh]`.
pub struct CommandRefresher<S: Storage> {
    scrape_command: Vec<String>,
    parse_command: Vec<String>,
    working_dir: PathBuf,
    catalog: JsonCatalogSource<S>,
}

impl<S: Storage> CommandRefresher<S> {
    pub fn new(
        scrape_command: Vec<String>,
        parse_command: Vec<String>,
        working_dir: impl Into<PathBuf>,
        catalog: JsonCatalogSource<S>,
    ) -> Self {
        Self {
            scrape_command,
            parse_command,
            working_dir: working_dir.into(),
            catalog,
        }
    }

    async fn run_step(
        &self,
        step: &str,
        command: &[String],
        extra_args: &[String],
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let Some((program, base_args)) = command.split_first() else {
            return StepOutcome::Failed(format!("{} command is not configured", step));
        };
        if cancel.is_cancelled() {
            return StepOutcome::Cancelled;
        }

        tracing::info!("Running {} step: {} {:?}", step, program, base_args);
        let mut child = match Command::new(program)
            .args(base_args)
            .args(extra_args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return StepOutcome::Failed(format!("could not start {}: {}", program, e)),
        };

        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(drain_stderr(stderr)));
        let mut stdout = child.stdout.take().map(BufReader::new);
        let mut progress = ScrapeProgress::default();

        let cancelled = loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => break true,
                line = next_line(&mut stdout) => line,
            };
            let Some(line) = line else { break false };
            if progress.observe(&line) {
                match progress.total {
                    Some(total) => tracing::info!("[{}] {}/{} {}", step, progress.done(), total, line.trim()),
                    None => tracing::info!("[{}] {}", step, line.trim()),
                }
            } else {
                tracing::debug!("[{}] {}", step, line);
            }
        };

        let status = if cancelled {
            None
        } else {
            tokio::select! {
                _ = cancel.cancelled() => None,
                status = child.wait() => Some(status),
            }
        };

        let Some(status) = status else {
            tracing::warn!("{} step cancelled, stopping {}", step, program);
            if let Err(e) = child.kill().await {
                tracing::debug!("kill failed: {}", e);
            }
            if let Some(task) = stderr_task {
                task.abort();
            }
            return StepOutcome::Cancelled;
        };

        let last_error = match stderr_task {
            Some(task) => task.await.ok().flatten(),
            None => None,
        };

        match status {
            Ok(status) if status.success() => StepOutcome::Completed,
            Ok(status) => {
                let mut reason = format!("{} step exited with {}", step, status);
                if let Some(detail) = last_error {
                    reason.push_str(": ");
                    reason.push_str(&detail);
                }
                StepOutcome::Failed(reason)
            }
            Err(e) => StepOutcome::Failed(format!("{} step failed: {}", step, e)),
        }
    }
}

#[async_trait]
impl<S: Storage> CatalogRefresher for CommandRefresher<S> {
    async fn refresh(&self, request: &RefreshRequest, cancel: CancellationToken) -> RefreshOutcome {
        let mut scrape_args = vec!["--semester".to_string(), request.semester.clone()];
        if request.refresh {
            scrape_args.push("--refresh".to_string());
        }

        match self
            .run_step("scrape", &self.scrape_command, &scrape_args, &cancel)
            .await
        {
            StepOutcome::Completed => {}
            StepOutcome::Failed(reason) => return RefreshOutcome::Failed { reason },
            StepOutcome::Cancelled => return RefreshOutcome::Cancelled,
        }

        match self.run_step("parse", &self.parse_command, &[], &cancel).await {
            StepOutcome::Completed => {}
            StepOutcome::Failed(reason) => return RefreshOutcome::Failed { reason },
            StepOutcome::Cancelled => return RefreshOutcome::Cancelled,
        }

        let (courses, events) = self.catalog.record_counts();
        let metadata = CatalogMetadata {
            last_scraped: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            semester: request.semester.clone(),
            courses,
            events,
        };
        if let Err(e) = self.catalog.write_metadata(&metadata) {
            tracing::warn!("Could not write catalog metadata: {}", e);
        }

        tracing::info!("Refresh finished: {} courses, {} events", courses, events);
        RefreshOutcome::Success { courses, events }
    }
}

/// Cancels the returned token on Ctrl+C until the listener task is aborted.
pub fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let listener = tokio::spawn(wait_for_ctrl_c(token.clone()));
    (token, listener)
}

async fn wait_for_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Ctrl+C received, cancelling refresh");
            token.cancel();
        }
        Err(e) => tracing::warn!("Cannot listen for Ctrl+C: {}", e),
    }
}

/// Reads one line without its terminator. Bytes that are not UTF-8 are replaced.
async fn read_lossy_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Next output line, or `None` once the pipe is done. The reader is dropped
/// at that point so a child still writing gets a closed pipe instead of blocking.
async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut Option<R>) -> Option<String> {
    let source = reader.as_mut()?;
    match read_lossy_line(source).await {
        Ok(Some(line)) => Some(line),
        Ok(None) => {
            *reader = None;
            None
        }
        Err(e) => {
            tracing::warn!("Could not read command output: {}", e);
            *reader = None;
            None
        }
    }
}

async fn drain_stderr(stderr: ChildStderr) -> Option<String> {
    let mut reader = Some(BufReader::new(stderr));
    let mut last = None;
    while let Some(line) = next_line(&mut reader).await {
        if !line.trim().is_empty() {
            tracing::debug!("stderr: {}", line);
            last = Some(line.trim().to_string());
        }
    }
    last
}
