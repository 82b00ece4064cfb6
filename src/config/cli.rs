use crate::config::{RetraceSettings, TomlConfig, MAX_VERBOSITY};
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "retrace")]
#[command(about = "Recalculate connected endpoints for the specified models")]
pub struct CliConfig {
    /// One or more specific models (each prefixed with its app_label) to retrace
    #[arg(value_name = "app_label.ModelName")]
    pub models: Vec<String>,

    /// Topology document to retrace
    #[arg(long)]
    pub topology: Option<String>,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the retraced topology here instead of back into the source document
    #[arg(short, long)]
    pub output: Option<String>,

    /// 0 = silent, 1 = per-model counts, 2 = verbose counts, 3 = every decision
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=(MAX_VERBOSITY as i64)))]
    pub verbosity: Option<u8>,

    /// Trace and report without writing the topology back
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU and memory usage per retraced model
    #[arg(long)]
    pub monitor: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Merges the optional TOML file with the flags given on the command line.
    pub fn settings(&self) -> Result<RetraceSettings> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?.to_settings(),
            None => RetraceSettings::default(),
        };

        if let Some(topology) = &self.topology {
            settings.topology_path = topology.clone();
        }
        if let Some(output) = &self.output {
            settings.output_path = Some(output.clone());
        }
        if !self.models.is_empty() {
            settings.models = self.models.clone();
        }
        if let Some(verbosity) = self.verbosity {
            settings.verbosity = verbosity;
        }
        settings.dry_run |= self.dry_run;
        settings.monitor |= self.monitor;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_flags() {
        let cli = CliConfig::parse_from([
            "retrace",
            "dcim.interface",
            "dcim.consoleport",
            "--topology",
            "site.json",
            "-v",
            "3",
            "--dry-run",
        ]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.models, vec!["dcim.interface", "dcim.consoleport"]);
        assert_eq!(settings.topology_path, "site.json");
        assert_eq!(settings.verbosity, 3);
        assert!(settings.dry_run);
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_verbosity_is_bounded() {
        assert!(CliConfig::try_parse_from(["retrace", "-v", "4"]).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[topology]
path = "from-file.json"

[retrace]
models = ["dcim.powerport"]
verbosity = 2
"#,
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = CliConfig::parse_from(["retrace", "--config", &path, "-v", "0"]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.topology_path, "from-file.json");
        assert_eq!(settings.models, vec!["dcim.powerport"]);
        assert_eq!(settings.verbosity, 0);
    }
}
