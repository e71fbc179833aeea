use crate::utils::error::{Result, ScheduleError};
use regex::Regex;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(ScheduleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ScheduleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ScheduleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScheduleError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_command(field_name: &str, command: &[String]) -> Result<()> {
    match command.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(ScheduleError::ConfigValidationError {
            field: field_name.to_string(),
            message: "Command needs at least a program name".to_string(),
        }),
    }
}

/// Parses an ISO week label such as `2026-W08` or `2026-w8` into `(year, week)`.
pub fn parse_iso_week(value: &str) -> Result<(i32, u32)> {
    let re = Regex::new(r"^\s*(\d{4})-[Ww](\d{1,2})\s*$").map_err(|e| {
        ScheduleError::ConfigError {
            message: format!("week pattern: {}", e),
        }
    })?;

    let invalid = || ScheduleError::invalid_input(format!("Invalid ISO week '{}'", value));

    let caps = re.captures(value).ok_or_else(invalid)?;
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let week: u32 = caps[2].parse().map_err(|_| invalid())?;

    if chrono::NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon).is_none() {
        return Err(invalid());
    }

    Ok((year, week))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("data.dir", "./data").is_ok());
        assert!(validate_path("data.dir", "").is_err());
        assert!(validate_path("data.dir", "   ").is_err());
        assert!(validate_path("data.dir", "a\0b").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("display.search_limit", 20, 1).is_ok());
        assert!(validate_positive_number("display.search_limit", 0, 1).is_err());
    }

    #[test]
    fn test_validate_command() {
        assert!(validate_command("refresh.parse_command", &["python".to_string()]).is_ok());
        assert!(validate_command("refresh.parse_command", &[]).is_err());
        assert!(validate_command("refresh.parse_command", &[" ".to_string()]).is_err());
    }

    #[test]
    fn test_parse_iso_week() {
        assert_eq!(parse_iso_week("2026-W08").unwrap(), (2026, 8));
        assert_eq!(parse_iso_week("2026-w8").unwrap(), (2026, 8));
        assert!(parse_iso_week("2026-W54").is_err());
        assert!(parse_iso_week("week 8").is_err());
        // 2026 has 53 ISO weeks, 2025 does not
        assert!(parse_iso_week("2026-W53").is_ok());
        assert!(parse_iso_week("2025-W53").is_err());
    }
}
