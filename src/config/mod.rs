pub mod evaluation_input;
pub mod toml_config;

pub use evaluation_input::EvaluationInput;
pub use toml_config::{AppConfig, LogFormat};

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "vess")]
#[command(about = "Field client for Qe-VESS soil structure evaluations")]
pub struct CliConfig {
    #[arg(long, help = "Path to the TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Overrides api.base_url from the config file")]
    pub api_url: Option<String>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List one page of saved evaluations
    List {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one evaluation with its samples
    Show { id: String },
    /// Delete an evaluation
    Delete {
        id: String,
        #[arg(long, help = "Page the evaluation is listed on")]
        page: Option<u32>,
    },
    /// Aggregate statistics for the current user
    Stats,
    /// Check that the API is reachable
    Health,
    /// Score an evaluation described in a TOML file
    Evaluate {
        input: PathBuf,
        #[arg(long, help = "Save the evaluation after scoring it")]
        submit: bool,
    },
    /// Export one page of evaluations as CSV
    Export {
        output: PathBuf,
        #[arg(long)]
        page: Option<u32>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Config file (or defaults) with the command-line overrides applied.
    pub fn app_config(&self) -> crate::utils::error::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = CliConfig::parse_from(["vess", "--api-url", "http://10.0.0.5:3000", "list", "--page", "2"]);
        assert!(matches!(cli.command, Command::List { page: Some(2) }));
        assert_eq!(
            cli.app_config().unwrap().api.base_url,
            "http://10.0.0.5:3000"
        );

        let cli = CliConfig::parse_from(["vess", "evaluate", "visita.toml", "--submit"]);
        assert!(matches!(cli.command, Command::Evaluate { submit: true, .. }));
    }
}
