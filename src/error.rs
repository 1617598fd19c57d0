//! Structured errors with machine-readable codes

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A structural path no longer resolves against the live tree.
    ElementNotFound,
    /// Malformed or unsupported path syntax.
    PathInvalid,
    /// An event lacks the minimum data required to act on it.
    ReplaySkip,
    /// Signal synthesis failed against an unexpected element state.
    DispatchFailed,
    /// A page fixture could not be parsed.
    PageInvalid,
    Unknown,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestions: Vec::new(),
            context: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn element_not_found(path: &str) -> Self {
        Self::new(
            ErrorCode::ElementNotFound,
            format!("No element resolves for path: {}", path),
        )
    }

    pub fn path_invalid(path: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::PathInvalid,
            format!("Invalid path '{}': {}", path, reason),
        )
    }

    pub fn replay_skip(reason: &str) -> Self {
        Self::new(ErrorCode::ReplaySkip, format!("Event skipped: {}", reason))
    }

    pub fn dispatch_failed(action: &str, reason: &str) -> Self {
        Self::new(
            ErrorCode::DispatchFailed,
            format!("{} failed: {}", action, reason),
        )
    }

    pub fn page_invalid(reason: &str) -> Self {
        Self::new(ErrorCode::PageInvalid, format!("Invalid page: {}", reason))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::Unknown, e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::Unknown, e.to_string())
    }
}
