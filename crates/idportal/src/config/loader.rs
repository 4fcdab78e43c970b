use std::path::Path;

use crate::config::schema::{PortalConfig, QrMode, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/portal-config-v1.json");

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "IDPORTAL_CONFIG";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PortalConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<PortalConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: PortalConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the file named by `IDPORTAL_CONFIG`, or the defaults when unset.
pub fn load_config_from_env() -> Result<PortalConfig, ConfigError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            log::info!("Loading configuration from {}", path);
            load_config(path.trim())
        }
        _ => {
            log::info!("{} not set, using default configuration", CONFIG_ENV_VAR);
            Ok(PortalConfig::default())
        }
    }
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &PortalConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.uploads.accepted_types.is_empty() {
        return Err(ConfigError::Validation {
            message: "uploads.accepted_types must not be empty".to_string(),
        });
    }

    let card = &config.card;
    if !(1..=4).contains(&card.render_scale) {
        return Err(ConfigError::Validation {
            message: format!("card.render_scale must be 1-4, got {}", card.render_scale),
        });
    }
    if !(1..=100).contains(&card.jpeg_quality) {
        return Err(ConfigError::Validation {
            message: format!("card.jpeg_quality must be 1-100, got {}", card.jpeg_quality),
        });
    }

    if card.qr.mode == QrMode::External {
        let endpoint = reqwest::Url::parse(&card.qr.endpoint).map_err(|e| {
            ConfigError::Validation {
                message: format!("Invalid QR endpoint '{}': {}", card.qr.endpoint, e),
            }
        })?;
        if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
            return Err(ConfigError::Validation {
                message: format!("QR endpoint must be http(s): {}", card.qr.endpoint),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.card.preview_width, 350);
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "server": { "bind_address": "127.0.0.1:9000" },
            "storage": {
                "data_directory": "/var/lib/idportal",
                "database_file": "portal.db",
                "documents_directory": "uploads"
            },
            "uploads": { "max_file_bytes": 1048576, "accepted_types": ["image/png"] },
            "listing": { "max_results": 50 },
            "card": {
                "render_scale": 3,
                "jpeg_quality": 90,
                "fonts": { "latin": "/fonts/Arial.ttf" },
                "qr": { "mode": "external", "size": 240 },
                "department_labels": { "STORES": "भंडार" }
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.storage.database_file, "portal.db");
        assert_eq!(config.uploads.accepted_types, vec!["image/png"]);
        assert_eq!(config.listing.max_results, 50);
        assert_eq!(config.card.render_scale, 3);
        assert_eq!(config.card.qr.mode, QrMode::External);
        assert_eq!(config.card.qr.size, 240);
        assert_eq!(config.card.department_label_hindi("stores"), Some("भंडार"));
        assert_eq!(config.card.fonts.latin.as_deref(), Some("/fonts/Arial.ttf"));
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_schema_rejects_unknown_qr_mode() {
        let result =
            load_config_from_str(r#"{ "version": "1.0", "card": { "qr": { "mode": "magic" } } }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_schema_requires_version() {
        let result = load_config_from_str(r#"{ "server": {} }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_render_scale_out_of_range() {
        let result = load_config_from_str(r#"{ "version": "1.0", "card": { "render_scale": 8 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/idportal.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idportal.json");
        std::fs::write(&path, r#"{ "version": "1.0", "listing": { "max_results": 5 } }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listing.max_results, 5);
    }
}
