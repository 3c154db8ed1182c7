//! Main entry point for smart-terminal.
//!
//! Parses the command line, resolves configuration, and hands the request to
//! the interaction controller. The controller's final status becomes the
//! process exit code.

use std::process::ExitCode;

use clap::Parser;
use smart_terminal::ai::InferenceClient;
use smart_terminal::app::App;
use smart_terminal::cli::{Cli, Mode};
use smart_terminal::config::AppConfig;
use smart_terminal::platform::Platform;
use smart_terminal::shell::ShellExecutor;
use smart_terminal::ui::StdConsole;
use smart_terminal::utils;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mode = cli.mode();
    if mode == Mode::Usage {
        println!("{}", Cli::usage());
        return ExitCode::SUCCESS;
    }

    // Initialize logging before anything else touches the network or a shell
    let _log_guard = utils::logger::init_logging();

    let platform = Platform::detect();
    let config = match AppConfig::load(platform, &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {:#}", e);
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match InferenceClient::new() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(config, client, ShellExecutor::new(), StdConsole::new());
    let status = match mode {
        Mode::Explain(command) => app.explain_only(&command).await,
        Mode::Generate(text) => app.run(&text).await,
        Mode::Usage => return ExitCode::SUCCESS,
    };

    status.into()
}
