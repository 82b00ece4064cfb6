#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, LogFormat};
pub use toml_config::TomlConfig;

use crate::domain::kinds::ModelSelection;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOPOLOGY_PATH: &str = "topology.json";
pub const DEFAULT_VERBOSITY: u8 = 1;
pub const MAX_VERBOSITY: u8 = 3;

/// Effective settings of a retrace run, after merging file and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetraceSettings {
    pub topology_path: String,
    /// Where to write the retraced topology. `None` writes back in place.
    pub output_path: Option<String>,
    pub models: Vec<String>,
    pub verbosity: u8,
    pub dry_run: bool,
    pub monitor: bool,
}

impl Default for RetraceSettings {
    fn default() -> Self {
        Self {
            topology_path: DEFAULT_TOPOLOGY_PATH.to_string(),
            output_path: None,
            models: Vec::new(),
            verbosity: DEFAULT_VERBOSITY,
            dry_run: false,
            monitor: false,
        }
    }
}

impl RetraceSettings {
    pub fn selection(&self) -> Result<ModelSelection> {
        ModelSelection::parse(&self.models)
    }

    /// File the retraced topology is written to.
    pub fn destination(&self) -> &str {
        self.output_path.as_deref().unwrap_or(&self.topology_path)
    }
}

impl ConfigProvider for RetraceSettings {
    fn topology_path(&self) -> &str {
        &self.topology_path
    }

    fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn verbosity(&self) -> u8 {
        self.verbosity
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn monitor(&self) -> bool {
        self.monitor
    }
}

impl Validate for RetraceSettings {
    fn validate(&self) -> Result<()> {
        validate_path("topology.path", &self.topology_path)?;
        if let Some(output) = &self.output_path {
            validate_path("output.path", output)?;
        }
        validate_range("retrace.verbosity", self.verbosity, 0, MAX_VERBOSITY)?;
        // Surface bad labels before any topology is loaded.
        self.selection()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CableTraceError;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = RetraceSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.destination(), DEFAULT_TOPOLOGY_PATH);
    }

    #[test]
    fn test_bad_model_label_fails_validation() {
        let settings = RetraceSettings {
            models: vec!["dcim.rearport".to_string()],
            ..RetraceSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CableTraceError::InvalidModel { .. })
        ));
    }

    #[test]
    fn test_verbosity_out_of_range() {
        let settings = RetraceSettings {
            verbosity: 7,
            ..RetraceSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(CableTraceError::InvalidConfigValueError { .. })
        ));
    }
}
