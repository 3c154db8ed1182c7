//! Utility modules for common functionality.
//!
//! This module contains helpers shared across the application: the logging
//! setup and Ctrl-C handling.

pub mod logger;
pub mod signal;
