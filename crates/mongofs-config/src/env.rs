use std::env;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::ConfigError;

fn var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// Replace every `${VAR_NAME}` in the input with the value of that
/// environment variable. All unset variables are collected and
/// reported together, each name once.
pub fn interpolate_env(input: &str) -> Result<String, ConfigError> {
    let mut missing: Vec<String> = Vec::new();

    let result = var_pattern().replace_all(input, |caps: &Captures| {
        let name = &caps[1];
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars(missing));
    }

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env() {
        env::set_var("MONGOFS_ENV_A", "hello");
        env::set_var("MONGOFS_ENV_B", "world");

        let result = interpolate_env("${MONGOFS_ENV_A} ${MONGOFS_ENV_B}").unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let result = interpolate_env("host: localhost").unwrap();
        assert_eq!(result, "host: localhost");
    }

    #[test]
    fn test_interpolate_missing_var() {
        let err = interpolate_env("${MONGOFS_ENV_MISSING_XYZ}").unwrap_err();
        match err {
            ConfigError::MissingEnvVars(vars) => {
                assert_eq!(vars, vec!["MONGOFS_ENV_MISSING_XYZ".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_interpolate_repeated_var() {
        env::set_var("MONGOFS_ENV_C", "x");
        let result = interpolate_env("${MONGOFS_ENV_C}/${MONGOFS_ENV_C}").unwrap();
        assert_eq!(result, "x/x");
    }

    #[test]
    fn test_repeated_missing_var_reported_once() {
        let input = "${MONGOFS_ENV_MISSING_XYZ} ${MONGOFS_ENV_MISSING_XYZ}";
        let err = interpolate_env(input).unwrap_err();
        match err {
            ConfigError::MissingEnvVars(vars) => {
                assert_eq!(vars, vec!["MONGOFS_ENV_MISSING_XYZ".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
