//! Environment variable loading

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;

/// Read a variable.
///
/// `Ok(None)` when unset; an error when the value is not valid UTF-8.
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::InvalidEnv {
            key: key.to_string(),
            reason: "value is not valid UTF-8".to_string(),
        }),
    }
}

/// Read a variable that must be set and non-blank
///
/// # Example
///
/// ```rust
/// use tooling::config::require_env;
///
/// let err = require_env("TOOLING_DOC_SURELY_UNSET").unwrap_err();
/// assert!(err.to_string().contains("TOOLING_DOC_SURELY_UNSET"));
/// ```
pub fn require_env(key: &str) -> Result<String> {
    match get_env(key)? {
        Some(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(ToolingError::MissingEnv {
            key: key.to_string(),
        }),
    }
}

/// Read and parse a variable
///
/// ```rust,ignore
/// let timeout: Option<u64> = get_env_parse("AGENTGRAPH_TIMEOUT_SECS")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ToolingError::InvalidEnv {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Parsed value or `default` when unset. A set but malformed value is an error.
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Boolean variable: true/1/yes/on and false/0/no/off, case-insensitive
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    let Some(val) = get_env(key)? else {
        return Ok(None);
    };
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ToolingError::InvalidEnv {
            key: key.to_string(),
            reason: format!("'{val}' is not a boolean"),
        }),
    }
}

/// `build_env_key("AGENTGRAPH_", "log_level")` is `AGENTGRAPH_LOG_LEVEL`
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable() {
        assert!(get_env("TOOLING_TEST_MISSING_7781").unwrap().is_none());
        assert_eq!(get_env_or("TOOLING_TEST_MISSING_7781", "fallback").unwrap(), "fallback");
    }

    #[test]
    fn test_require_env() {
        env::set_var("TOOLING_TEST_REQUIRED", "https://example.invalid");
        assert_eq!(
            require_env("TOOLING_TEST_REQUIRED").unwrap(),
            "https://example.invalid"
        );
        env::remove_var("TOOLING_TEST_REQUIRED");

        let err = require_env("TOOLING_TEST_REQUIRED").unwrap_err();
        assert!(matches!(err, ToolingError::MissingEnv { key } if key == "TOOLING_TEST_REQUIRED"));
    }

    #[test]
    fn test_require_env_rejects_blank() {
        env::set_var("TOOLING_TEST_BLANK", "   ");
        assert!(matches!(
            require_env("TOOLING_TEST_BLANK"),
            Err(ToolingError::MissingEnv { .. })
        ));
        env::remove_var("TOOLING_TEST_BLANK");
    }

    #[test]
    fn test_parse_and_default() {
        env::set_var("TOOLING_TEST_TEMPERATURE", "0.7");
        let value: f32 = get_env_parse_or("TOOLING_TEST_TEMPERATURE", 0.0).unwrap();
        assert!((value - 0.7).abs() < f32::EPSILON);
        env::remove_var("TOOLING_TEST_TEMPERATURE");

        let value: f32 = get_env_parse_or("TOOLING_TEST_TEMPERATURE", 0.0).unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_parse_invalid() {
        env::set_var("TOOLING_TEST_BAD_NUMBER", "lots");
        let result: Result<Option<u32>> = get_env_parse("TOOLING_TEST_BAD_NUMBER");
        assert!(matches!(result, Err(ToolingError::InvalidEnv { .. })));
        env::remove_var("TOOLING_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_bool() {
        for (value, expected) in [("TRUE", true), ("on", true), ("0", false), ("No", false)] {
            env::set_var("TOOLING_TEST_FLAG", value);
            assert_eq!(get_env_bool("TOOLING_TEST_FLAG").unwrap(), Some(expected), "{value}");
        }
        env::set_var("TOOLING_TEST_FLAG", "maybe");
        assert!(get_env_bool("TOOLING_TEST_FLAG").is_err());
        env::remove_var("TOOLING_TEST_FLAG");
    }

    #[test]
    fn test_build_env_key() {
        assert_eq!(build_env_key("AGENTGRAPH_", "log_level"), "AGENTGRAPH_LOG_LEVEL");
        assert_eq!(build_env_key("", "debug"), "DEBUG");
    }
}
