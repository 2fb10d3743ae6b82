//! Structured compile diagnostics.
//!
//! Every fallible compiler phase reports through this type instead of
//! inventing its own rendering, so every compile error carries a
//! human-readable message, a stable code, and, where it can be localized, a
//! frontmatter JSON pointer.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single compile-time diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerDiagnostic {
    /// Stable error code, e.g. `"UnauthorizedExpression"`.
    pub code: String,
    pub message: String,
    /// JSON pointer into the merged frontmatter tree, when the diagnostic
    /// can be localized (e.g. `/safe-outputs/jobs/deploy`).
    pub pointer: Option<String>,
    pub severity: Severity,
}

impl CompilerDiagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            pointer: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            pointer: None,
            severity: Severity::Warning,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pointer {
            Some(pointer) => write!(f, "[{}] {} (at {pointer})", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
