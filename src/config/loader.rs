//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<EdgeConfig, ConfigError> {
    let config: EdgeConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogFormat, OriginSource};

    #[test]
    fn minimal_file_uses_defaults() {
        let config = parse_config(
            r#"
            [forwarder]
            origin = "https://origin.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.upstream_secs, 25);
        assert_eq!(config.forwarder.upstream_scheme, "https");
        assert_eq!(config.forwarder.deployment_header, "x-deployment-id");
        assert!(config.sites.is_empty());
    }

    #[test]
    fn parses_static_and_dynamic_sites() {
        let config = parse_config(
            r#"
            [forwarder]
            origin = "http://127.0.0.1:3000"

            [[sites]]
            name = "app"
            host = "app.example"
            priority = 10
            origins = { strategy = "static", mobile = "m.example.org", desktop = "d.example.org" }

            [[sites]]
            name = "launch"
            [sites.origins]
            strategy = "dynamic"
            timeout_ms = 500

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.sites.len(), 2);
        assert_eq!(
            config.sites[0].origins,
            OriginSource::Static {
                mobile: "m.example.org".into(),
                desktop: "d.example.org".into(),
            }
        );
        match &config.sites[1].origins {
            OriginSource::Dynamic { path, forward_headers, timeout_ms } => {
                assert_eq!(path, "/api/data");
                assert!(forward_headers.iter().any(|h| h == "host"));
                assert_eq!(*timeout_ms, 500);
            }
            other => panic!("expected dynamic origins, got {:?}", other),
        }
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_file_lacks_an_origin() {
        let err = parse_config("").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("forwarder.origin"));
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let err = parse_config(
            r#"
            [[sites]]
            name = "x"
            origins = { strategy = "random" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_errors_are_reported_together() {
        let err = parse_config(
            r#"
            [forwarder]
            origin = "https://origin.example"

            [timeouts]
            request_secs = 0

            [[redirects]]
            host = "old.example"
            location = "https://new.example/"
            status = 200
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
