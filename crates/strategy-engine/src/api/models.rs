//! API response models that are not engine types

use serde::{Deserialize, Serialize};

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Accepted values, when the error is an unknown name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid: Vec<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            valid: Vec::new(),
        }
    }

    pub fn with_valid(mut self, valid: Vec<String>) -> Self {
        self.valid = valid;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub provider: String,
}
