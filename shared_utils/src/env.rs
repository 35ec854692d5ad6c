use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but its value could not be parsed.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    pub name: String,
    pub value: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable. Unset and blank values are both `None`.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank, and an error when it
/// is set to something `T` cannot parse.
pub fn parse_optional_env_var<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    match get_optional_env_var(name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|_| InvalidEnvVarError {
            name: name.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const VAR: &str = "SHARED_UTILS_TEST_VAR";

    // Edition 2024 marks env mutation unsafe; tests touching it run serially.
    fn set(value: &str) {
        unsafe { std::env::set_var(VAR, value) };
    }

    fn unset() {
        unsafe { std::env::remove_var(VAR) };
    }

    #[test]
    #[serial]
    fn missing_var_is_reported_by_name() {
        unset();
        let err = get_env_var(VAR).unwrap_err();
        assert_eq!(err.to_string(), format!("Missing environment variable: {VAR}"));
    }

    #[test]
    #[serial]
    fn blank_optional_var_is_none() {
        set("   ");
        assert_eq!(get_optional_env_var(VAR), None);
        unset();
    }

    #[test]
    #[serial]
    fn parses_optional_var() {
        set(" 42 ");
        assert_eq!(parse_optional_env_var::<u64>(VAR).unwrap(), Some(42));

        set("forty-two");
        let err = parse_optional_env_var::<u64>(VAR).unwrap_err();
        assert_eq!(err.value, "forty-two");
        unset();

        assert_eq!(parse_optional_env_var::<u64>(VAR).unwrap(), None);
    }
}
