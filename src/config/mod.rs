pub mod easystack;
pub mod record_file;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use record_file::RecordFormat;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "easyconfig")]
#[command(about = "Load, validate and inspect package build records")]
pub struct CliConfig {
    /// Path to the record file (.toml, .yaml, .yml or .json)
    #[arg(short, long, default_value = "easyconfig.toml")]
    pub config: String,

    /// Show sources, source URLs and patches with templates resolved
    #[arg(long)]
    pub resolve: bool,

    /// Print the normalized record in the given format
    #[arg(long, value_enum)]
    pub emit: Option<RecordFormat>,

    /// Override the detected CPU count used for the effective parallelism
    #[arg(long)]
    pub cpus: Option<usize>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_log: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("config", &self.config)?;
        RecordFormat::from_path(&self.config)?;
        if let Some(cpus) = self.cpus {
            validation::validate_positive_number("cpus", cpus, 1)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["easyconfig"]);
        assert_eq!(config.config, "easyconfig.toml");
        assert!(config.emit.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_emit_and_cpus() {
        let config =
            CliConfig::parse_from(["easyconfig", "-c", "GCC-4.9.2.yaml", "--emit", "json", "--cpus", "8"]);
        assert_eq!(config.emit, Some(RecordFormat::Json));
        assert_eq!(config.cpus, Some(8));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_bad_inputs() {
        let config = CliConfig::parse_from(["easyconfig", "-c", "GCC-4.9.2.eb"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["easyconfig", "--cpus", "0"]);
        assert!(config.validate().is_err());
    }
}
