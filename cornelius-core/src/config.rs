//! YAML configuration loading.
//!
//! A malformed document is always fatal: loading never falls back to an empty
//! configuration.

use std::collections::HashSet;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::Config;

impl Config {
    /// Read, parse and validate the configuration at `path`.
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` (with path + line context) if the YAML is malformed.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate an in-memory YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the structural rules the scheduler relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipelines.is_empty() {
            return Err(ConfigError::Invalid("no pipelines configured".into()));
        }
        if self.concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1 when set".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, pipeline) in self.pipelines.iter().enumerate() {
            let name = pipeline.name.0.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pipeline #{} has an empty name",
                    index + 1
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pipeline name '{name}'"
                )));
            }

            let required = [
                ("bucket.host", pipeline.bucket.host.as_str()),
                ("bucket.name", pipeline.bucket.name.as_str()),
                ("drive.id", pipeline.drive.id.as_str()),
                ("drive.parent_folder_id", pipeline.drive.parent_folder_id.as_str()),
            ];
            for (field, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "pipeline '{name}': {field} must not be empty"
                    )));
                }
            }
            if pipeline.drive.wallet_path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pipeline '{name}': drive.wallet_path must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const MINIMAL: &str = r#"
pipelines:
  - name: site
    bucket:
      host: minio.local:9000
      name: assets
    drive:
      id: drive-1
      wallet_path: /etc/cornelius/wallet.json
      parent_folder_id: folder-1
"#;

    #[test]
    fn minimal_document_uses_defaults() {
        let config = Config::from_yaml_str(MINIMAL).expect("parse");
        let pipeline = &config.pipelines[0];
        assert!(pipeline.frequency.is_single_shot());
        assert!(!pipeline.enable_manifest);
        assert!(!pipeline.bucket.is_secure);
        assert_eq!(pipeline.bucket.prefix, "");
        assert_eq!(config.concurrency, None);
    }

    #[test]
    fn frequency_string_is_parsed() {
        let yaml = MINIMAL.replace(
            "      parent_folder_id: folder-1\n",
            "      parent_folder_id: folder-1\n    frequency: 30m\n",
        );
        let config = Config::from_yaml_str(&yaml).expect("parse");
        assert_eq!(
            config.pipelines[0].frequency.as_duration(),
            Duration::from_secs(30 * 60)
        );
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let err = Config::from_yaml_str("pipelines: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)), "got: {err}");
    }

    #[test]
    fn empty_pipeline_set_is_rejected() {
        let err = Config::from_yaml_str("pipelines: []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    }
}
