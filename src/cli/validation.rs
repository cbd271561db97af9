//! CLI argument validation functions
//!
//! Custom value parsers for arguments that clap cannot check on its own.

use std::fs;
use std::path::PathBuf;

use crate::config::split_uid_list;

/// Author ids given on the command line, already split and trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidList(pub Vec<String>);

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

/// Validate a comma-separated list of numeric author ids
pub fn validate_uid_list(raw: &str) -> Result<UidList, String> {
    let uids = split_uid_list(raw);

    if uids.is_empty() {
        return Err("At least one author id is required".to_string());
    }

    if let Some(bad) = uids.iter().find(|uid| !uid.chars().all(|c| c.is_ascii_digit())) {
        return Err(format!("Author id must be numeric, got: '{}'", bad));
    }

    Ok(UidList(uids))
}

/// Basic shape check for a cron expression; the scheduler parses it for real
pub fn validate_cron_expression(raw: &str) -> Result<String, String> {
    let expression = raw.trim();
    let fields = expression.split_whitespace().count();

    if !(5..=7).contains(&fields) {
        return Err(format!(
            "Cron expression must have 5 to 7 fields (seconds first), got {}: '{}'",
            fields, raw
        ));
    }

    Ok(expression.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_list_valid() {
        let parsed = validate_uid_list(" 946974, 9617619 ,,").unwrap();
        assert_eq!(parsed, UidList(vec!["946974".into(), "9617619".into()]));
    }

    #[test]
    fn test_uid_list_invalid() {
        for raw in ["", " , ", "123,abc", "12 34"] {
            assert!(validate_uid_list(raw).is_err(), "'{}' should be invalid", raw);
        }
    }

    #[test]
    fn test_cron_expression_field_count() {
        assert_eq!(
            validate_cron_expression(" 0 */10 * * * * ").unwrap(),
            "0 */10 * * * *"
        );
        assert!(validate_cron_expression("*/5 * * * *").is_ok());
        assert!(validate_cron_expression("* * *").is_err());
        assert!(validate_cron_expression("").is_err());
    }

    #[test]
    fn test_config_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.toml");
        std::fs::write(&file, "").unwrap();

        assert_eq!(validate_config_file_path(file.to_str().unwrap()).unwrap(), file);
        assert!(validate_config_file_path(dir.path().to_str().unwrap()).is_err());
        assert!(
            validate_config_file_path(dir.path().join("missing.toml").to_str().unwrap()).is_err()
        );
    }
}
