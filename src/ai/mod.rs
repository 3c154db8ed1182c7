//! AI module for talking to the local inference service.
//!
//! This module provides the HTTP client, prompt construction, and decoding of
//! completions into command proposals.

pub mod client;
pub mod error;
pub mod parser;
pub mod prompt;

pub use client::{CompletionBackend, InferenceClient};
pub use error::InferenceError;
pub use parser::{CommandProposal, Decoded, SafetyClass};
pub use prompt::PromptBuilder;
