use crate::config::RetraceSettings;
use crate::utils::error::{CableTraceError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub topology: TopologyConfig,
    #[serde(default)]
    pub retrace: RetraceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetraceConfig {
    #[serde(default)]
    pub models: Vec<String>,
    pub verbosity: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CableTraceError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CableTraceError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TOPOLOGY_PATH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CableTraceError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn to_settings(&self) -> RetraceSettings {
        let defaults = RetraceSettings::default();
        RetraceSettings {
            topology_path: self.topology.path.clone(),
            output_path: self.output.path.clone(),
            models: self.retrace.models.clone(),
            verbosity: self.retrace.verbosity.unwrap_or(defaults.verbosity),
            dry_run: self.output.dry_run.unwrap_or(defaults.dry_run),
            monitor: self.monitoring_enabled(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if self.topology.path.trim().is_empty() {
            return Err(CableTraceError::MissingConfigError {
                field: "topology.path".to_string(),
            });
        }
        self.to_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::EndpointKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[topology]
path = "site-a.json"

[retrace]
models = ["dcim.interface", "circuits.circuittermination"]
verbosity = 2

[output]
path = "site-a.retraced.json"

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let settings = config.to_settings();

        assert_eq!(settings.topology_path, "site-a.json");
        assert_eq!(settings.destination(), "site-a.retraced.json");
        assert_eq!(settings.verbosity, 2);
        assert!(settings.monitor);
        assert!(!settings.dry_run);
        assert_eq!(
            settings.selection().unwrap().kinds(),
            &[EndpointKind::Interface, EndpointKind::CircuitTermination]
        );
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[topology]\npath = \"t.json\"\n").unwrap();
        let settings = config.to_settings();

        assert_eq!(settings.verbosity, 1);
        assert!(settings.models.is_empty());
        assert_eq!(settings.destination(), "t.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CABLE_PATH_TEST_TOPOLOGY", "/srv/topology.json");

        let toml_content = r#"
[topology]
path = "${CABLE_PATH_TEST_TOPOLOGY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.topology.path, "/srv/topology.json");

        std::env::remove_var("CABLE_PATH_TEST_TOPOLOGY");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[topology]
path = "topology.json"

[retrace]
models = ["dcim.frontport"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[topology]\npath = \"\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(CableTraceError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[topology]
path = "from-file.json"

[output]
dry_run = true
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.topology.path, "from-file.json");
        assert!(config.to_settings().dry_run);
    }
}
