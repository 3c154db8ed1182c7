//! Command-line surface.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::config::Overrides;

const EXAMPLES: &str = r#"Examples:
  smart-terminal find all python files
  smart-terminal "show disk usage"
  smart-terminal list processes using port 8080
  smart-terminal --explain "tar -xzvf archive.tar.gz""#;

#[derive(Debug, Parser)]
#[command(name = "smart-terminal")]
#[command(version)]
#[command(about = "Turn natural language into shell commands using a local model", long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Natural language description of what you want to do
    #[arg(value_name = "REQUEST", trailing_var_arg = true, allow_hyphen_values = true)]
    pub request: Vec<String>,

    /// Explain what a command does instead of generating one
    #[arg(
        long,
        value_name = "COMMAND",
        num_args = 1..,
        allow_hyphen_values = true,
        conflicts_with = "request"
    )]
    pub explain: Option<Vec<String>>,

    /// Inference service generate endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Model name to request
    #[arg(long)]
    pub model: Option<String>,

    /// Inference request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Command execution timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub exec_timeout_ms: Option<u64>,

    /// Path to a YAML config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// What this invocation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// No request given: print usage and exit successfully.
    Usage,
    /// Explain a command; no generation, no execution.
    Explain(String),
    /// Generate, confirm and run a command for a request.
    Generate(String),
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if let Some(words) = &self.explain {
            return Mode::Explain(words.join(" "));
        }
        let request = self.request.join(" ");
        if request.trim().is_empty() {
            Mode::Usage
        } else {
            Mode::Generate(request)
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_ms: self.timeout_ms,
            exec_timeout_ms: self.exec_timeout_ms,
        }
    }

    /// Usage text shown when invoked without a request.
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
