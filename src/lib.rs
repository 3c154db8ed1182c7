//! smart-terminal - natural language to shell commands via a local model
//!
//! This library provides the pieces of the assistant:
//! - platform detection and the shell dialect it implies
//! - prompt building, the inference client and completion decoding
//! - subprocess execution with a timeout
//! - the interaction controller that confirms and runs proposals
//!
//! # Example
//!
//! ```no_run
//! use smart_terminal::ai::InferenceClient;
//! use smart_terminal::app::App;
//! use smart_terminal::config::{AppConfig, Overrides};
//! use smart_terminal::platform::Platform;
//! use smart_terminal::shell::ShellExecutor;
//! use smart_terminal::ui::StdConsole;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(Platform::detect(), &Overrides::default())?;
//!     let mut app = App::new(config, InferenceClient::new()?, ShellExecutor::new(), StdConsole::new());
//!     let status = app.run("list all files").await;
//!     println!("{:?}", status);
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod app;
pub mod cli;
pub mod config;
pub mod platform;
pub mod shell;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use ai::{CommandProposal, InferenceClient, InferenceError, SafetyClass};
pub use app::{App, RunStatus};
pub use config::AppConfig;
pub use platform::{Dialect, Platform};
pub use shell::{ExecutionResult, ShellExecutor};
