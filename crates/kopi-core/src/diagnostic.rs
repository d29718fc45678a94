use serde::Serialize;
use text_size::TextRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A positional problem found while parsing or resolving a document.
///
/// `code` is a stable kebab-case identifier (`missing-semicolon`,
/// `unresolved-identifier`, ...) suitable for filtering; `message` is for humans.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            range,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            range,
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
            range,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
