use std::time::Duration;

use thiserror::Error;

/// Failure of a single exchange with the inference service.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Connection error: {0}")]
    Network(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Unexpected response from inference service: {0}")]
    Protocol(String),
}
