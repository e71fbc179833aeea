use crate::adapters::json_catalog::{COURSES_FILE, EVENTS_FILE, METADATA_FILE};
use crate::core::selection::DEFAULT_SELECTION_FILE;
use crate::utils::error::{Result, ScheduleError};
use crate::utils::validation::{
    validate_command, validate_non_empty_string, validate_path, validate_positive_number, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "myschedule.toml";

/// Application settings. Every section and key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub refresh: RefreshConfig,
    pub export: ExportConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: String,
    pub courses_file: String,
    pub events_file: String,
    pub metadata_file: String,
    pub selection_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            courses_file: COURSES_FILE.to_string(),
            events_file: EVENTS_FILE.to_string(),
            metadata_file: METADATA_FILE.to_string(),
            selection_file: DEFAULT_SELECTION_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub semester: String,
    /// Program and fixed arguments; `--semester <S> [--refresh]` is appended.
    pub scrape_command: Vec<String>,
    pub parse_command: Vec<String>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            semester: "FS26".to_string(),
            scrape_command: vec!["python3".into(), "-m".into(), "myschedule.scrape".into()],
            parse_command: vec!["python3".into(), "-m".into(), "myschedule.parse".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_path: "myschedule.ics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub search_limit: usize,
    pub weeks_per_page: usize,
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            search_limit: 20,
            weeks_per_page: 4,
            color: false,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ScheduleError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScheduleError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads `path` if given, else `myschedule.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScheduleError::ConfigError {
            message: format!("env pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.dir)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data.dir", &self.data.dir)?;
        validate_path("data.courses_file", &self.data.courses_file)?;
        validate_path("data.events_file", &self.data.events_file)?;
        validate_path("data.metadata_file", &self.data.metadata_file)?;
        validate_path("data.selection_file", &self.data.selection_file)?;

        validate_non_empty_string("refresh.semester", &self.refresh.semester)?;
        validate_command("refresh.scrape_command", &self.refresh.scrape_command)?;
        validate_command("refresh.parse_command", &self.refresh.parse_command)?;

        validate_path("export.default_path", &self.export.default_path)?;

        validate_positive_number("display.search_limit", self.display.search_limit, 1)?;
        validate_positive_number("display.weeks_per_page", self.display.weeks_per_page, 1)?;

        Ok(())
    }
}
