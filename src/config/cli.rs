use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "myschedule")]
#[command(about = "Plan a course timetable: search, select, check conflicts, export")]
pub struct CliConfig {
    /// TOML config file (defaults to ./myschedule.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding courses.json, events.json and the selection file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Write logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Colored output")]
    pub color: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Search courses by id, title or instructor
    Search { text: String },
    /// Add a course to the selection
    Add { course_id: String },
    /// Remove a course from the selection
    Remove { course_id: String },
    /// List the selected courses
    Selected,
    /// Show conflicts among the selected courses
    Conflicts,
    /// Show the conflicts a course would introduce
    Preview { course_id: String },
    /// Selected events grouped by week
    Agenda {
        /// Page to show, starting at 1
        #[arg(long)]
        page: Option<usize>,
        /// Show every week at once
        #[arg(long)]
        all: bool,
    },
    /// Monday to Saturday grid for one ISO week
    Timetable {
        /// ISO week such as 2026-W08 (defaults to the first week with events)
        #[arg(long)]
        week: Option<String>,
    },
    /// Export the selected events to an .ics file
    Export { out: Option<PathBuf> },
    /// Re-run the scraper and parser to rebuild the catalog
    Refresh {
        #[arg(long)]
        semester: Option<String>,
        /// Keep cached pages and only fetch missing ones
        #[arg(long)]
        no_refresh: bool,
    },
    /// Menu-driven session
    Interactive,
}

impl CliConfig {
    /// Command line flags override the file settings.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data.dir = dir.to_string_lossy().into_owned();
        }
        if self.color {
            config.display.color = true;
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.data_dir {
            validate_path("--data-dir", &dir.to_string_lossy())?;
        }
        if let CliCommand::Agenda { page: Some(0), .. } = self.command {
            return Err(crate::utils::error::ScheduleError::invalid_input(
                "Agenda pages start at 1.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = CliConfig::try_parse_from(["myschedule", "add", "fs261059", "--data-dir", "/tmp/d"]).unwrap();
        assert_eq!(cli.command, CliCommand::Add { course_id: "fs261059".into() });

        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.data.dir, "/tmp/d");

        let cli = CliConfig::try_parse_from(["myschedule", "timetable", "--week", "2026-W08"]).unwrap();
        assert_eq!(cli.command, CliCommand::Timetable { week: Some("2026-W08".into()) });

        let cli = CliConfig::try_parse_from(["myschedule", "-v", "refresh", "--no-refresh"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            CliCommand::Refresh { semester: None, no_refresh: true }
        );
    }

    #[test]
    fn test_validate_agenda_page() {
        let cli = CliConfig::try_parse_from(["myschedule", "agenda", "--page", "0"]).unwrap();
        assert!(cli.validate().is_err());
        let cli = CliConfig::try_parse_from(["myschedule", "agenda", "--page", "2"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(CliConfig::try_parse_from(["myschedule"]).is_err());
    }
}
