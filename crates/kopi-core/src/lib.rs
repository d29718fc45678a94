//! Core shared types for Kopi.
//!
//! This crate is intentionally small: tokens, text ranges, diagnostics and the
//! document record handed to the parser. Everything else builds on top of it.

mod diagnostic;
mod text;
mod token;

pub use diagnostic::{Diagnostic, Severity};
pub use text::{LineCol, LineIndex, TextRange, TextSize};
pub use token::{LocKind, SymbolLoc, Token, TokenKind, TokenSpan};

use serde::{Deserialize, Serialize};

/// One edited source document submitted for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document identity (usually a `file://` URI or a workspace-relative path).
    pub uri: String,
    pub text: String,
    pub version: i32,
}

impl SourceDocument {
    pub fn new(uri: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
            version,
        }
    }
}
