//! Error types for lore operations.
//!
//! Resolution itself degrades instead of failing on malformed numeric input,
//! so the error surface is small: phonetic coder initialization,
//! configuration loading and validation, and I/O at the edges.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for lore operations.
pub type LoreResult<T> = Result<T, LoreError>;

/// Main error type for all lore operations.
#[derive(Error, Debug)]
pub enum LoreError {
    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration or input failed validation.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// The phonetic coder failed to initialize.
    #[error("Phonetic coder error: {message}")]
    Phonetic { message: String, code: ErrorCode },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalidFormat,
    CfgUnsupportedFormat,

    // Validation (VAL_xxx)
    ValInvalidThreshold,
    ValInvalidWeight,
    ValInvalidRange,

    // Phonetic (PHN_xxx)
    PhnLoadFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidEntityType,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalidFormat => "CFG_001",
            ErrorCode::CfgUnsupportedFormat => "CFG_002",
            ErrorCode::ValInvalidThreshold => "VAL_001",
            ErrorCode::ValInvalidWeight => "VAL_002",
            ErrorCode::ValInvalidRange => "VAL_003",
            ErrorCode::PhnLoadFailed => "PHN_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidEntityType => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl LoreError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        code: ErrorCode,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            details: HashMap::new(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a phonetic coder load error.
    pub fn phonetic(message: impl Into<String>) -> Self {
        Self::Phonetic {
            message: message.into(),
            code: ErrorCode::PhnLoadFailed,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgInvalidFormat,
            Self::Validation { code, .. } => *code,
            Self::Phonetic { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => Some("Check the configuration file syntax and extension"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Phonetic { .. } => Some("Phonetic matching is unavailable; retry initialization"),
            _ => None,
        }
    }
}
