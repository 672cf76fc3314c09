//! Validation related error types

use thiserror::Error;

/// Configuration and chain assembly errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Regex failed to compile
    #[error("Unable to compile regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// Regex compiled but did not match the item name
    #[error("No matches found for regex '{pattern}' in '{name}'")]
    NoMatch { pattern: String, name: String },

    /// Invalid input parameter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A terminal stage was asked to forward to another stage
    #[error("Stage '{stage}' is a sink and cannot have a next stage")]
    TerminalStage { stage: String },

    /// The next stage was linked twice
    #[error("Stage '{stage}' already has a next stage")]
    NextAlreadySet { stage: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid regex error
    pub fn invalid_regex(pattern: &str, reason: &str) -> Self {
        Self::InvalidRegex {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a no-match error
    pub fn no_match(pattern: &str, name: &str) -> Self {
        Self::NoMatch {
            pattern: pattern.to_string(),
            name: name.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    /// Create a terminal stage error
    pub fn terminal_stage(stage: &str) -> Self {
        Self::TerminalStage {
            stage: stage.to_string(),
        }
    }

    /// Create a next-already-set error
    pub fn next_already_set(stage: &str) -> Self {
        Self::NextAlreadySet {
            stage: stage.to_string(),
        }
    }
}
