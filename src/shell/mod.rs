//! Shell execution module.
//!
//! This module runs confirmed commands as subprocesses of the host shell and
//! normalizes their outcome for reporting.

mod executor;

pub use executor::{CommandRunner, ExecutionResult, ShellExecutor};
