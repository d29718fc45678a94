//! Error-tolerant Java parsing with eager name and type resolution.
//!
//! Documents are parsed in batches that share one [`TypeStore`]. A batch runs
//! in phases so that every document sees every other document's types:
//!
//! 1. classes previously declared by the batch's documents are marked stale
//!    and cached units from earlier batches are merged back in;
//! 2. a brace-balance scan registers each document's type skeletons;
//! 3. declarations (package, imports, types and their members) are parsed and
//!    registered for every document;
//! 4. method bodies, initializers, field initializers and enum constant
//!    bodies are parsed, resolving each identifier as it is read.
//!
//! Problems never abort a parse; they are recorded as [`Diagnostic`]s on the
//! document.

mod bodies;
mod decl;
mod expr;
mod imports;
mod parser;
mod resolve;
mod scope;
mod stmt;
mod type_ref;

use std::panic::{catch_unwind, AssertUnwindSafe};

use kopi_core::{Diagnostic, SourceDocument, TextRange, TextSize, Token};
use kopi_hir::CompilationUnit;
use kopi_syntax::{extract_type_skeletons, lex};
use kopi_types::{ClassDef, TypeOrigin, TypeStore};
use serde::Serialize;

use crate::parser::{panic_message, DocState, Parser};

/// Knobs for a parse batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Packages imported on demand by every document.
    pub implicit_imports: Vec<String>,
    /// When false only declarations are parsed; bodies stay as token spans.
    pub parse_bodies: bool,
    /// Maximum number of diagnostics kept per document.
    pub diagnostic_limit: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            implicit_imports: vec!["java.lang".to_string()],
            parse_bodies: true,
            diagnostic_limit: None,
        }
    }
}

/// A document whose tokens were produced by any tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDocument {
    pub uri: String,
    pub version: i32,
    pub tokens: Vec<Token>,
}

impl TokenizedDocument {
    pub fn new(uri: impl Into<String>, version: i32, tokens: Vec<Token>) -> Self {
        Self {
            uri: uri.into(),
            version,
            tokens,
        }
    }

    /// Tokenizes `doc` with the reference lexer.
    pub fn lex(doc: &SourceDocument) -> Self {
        Self::new(doc.uri.clone(), doc.version, lex(&doc.text))
    }
}

/// The result of parsing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedUnit {
    pub uri: String,
    pub version: i32,
    /// The document's tokens with resolved symbols written onto them.
    pub tokens: Vec<Token>,
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
    /// Snapshot of the classes this document declared, reusable as a cache
    /// by a later batch on the same store.
    pub exported: Vec<ClassDef>,
}

impl ParsedUnit {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Lexes and parses `docs` as one batch.
pub fn parse_documents(
    docs: &[SourceDocument],
    cached: &[ParsedUnit],
    store: &mut TypeStore,
    opts: &ParseOptions,
) -> Vec<ParsedUnit> {
    let batch = docs.iter().map(TokenizedDocument::lex).collect();
    parse_token_batch(batch, cached, store, opts)
}

/// Parses a single document against `store`.
pub fn parse_document(
    doc: &SourceDocument,
    store: &mut TypeStore,
    opts: &ParseOptions,
) -> ParsedUnit {
    let mut units = parse_documents(std::slice::from_ref(doc), &[], store, opts);
    units.pop().unwrap_or_else(|| ParsedUnit {
        uri: doc.uri.clone(),
        version: doc.version,
        tokens: Vec::new(),
        unit: CompilationUnit::new(doc.uri.clone()),
        diagnostics: Vec::new(),
        exported: Vec::new(),
    })
}

/// Parses pre-tokenized documents as one batch.
///
/// `cached` holds units from an earlier batch on the same store; their
/// exported classes are merged back unless the document is part of this batch.
pub fn parse_token_batch(
    docs: Vec<TokenizedDocument>,
    cached: &[ParsedUnit],
    store: &mut TypeStore,
    opts: &ParseOptions,
) -> Vec<ParsedUnit> {
    let _span = tracing::debug_span!("parse_batch", docs = docs.len()).entered();

    for doc in &docs {
        store.clear_source(&doc.uri);
    }
    for unit in cached {
        if docs.iter().any(|doc| doc.uri == unit.uri) {
            continue;
        }
        for def in &unit.exported {
            store.upsert_class(def.clone());
        }
    }
    for doc in &docs {
        register_skeletons(store, &doc.uri, &doc.tokens);
    }

    let mut pending: Vec<Pending> = docs
        .into_iter()
        .map(|doc| declare(doc, store, opts))
        .collect();
    if opts.parse_bodies {
        for doc in &mut pending {
            doc.parse_bodies(store);
        }
    }
    pending.into_iter().map(|doc| doc.finish(store)).collect()
}

fn register_skeletons(store: &mut TypeStore, uri: &str, tokens: &[Token]) {
    let skeletons = extract_type_skeletons(tokens);
    let mut ids = Vec::with_capacity(skeletons.len());
    for skeleton in &skeletons {
        let outer = skeleton.outer.and_then(|idx| ids.get(idx).copied());
        let id = store.intern_class(
            &skeleton.package,
            outer,
            &skeleton.name,
            skeleton.kind,
            TypeOrigin::Source {
                uri: uri.to_string(),
            },
        );
        ids.push(id);
    }
    tracing::trace!(uri, types = ids.len(), "registered type skeletons");
}

/// A document between the declaration and body phases.
struct Pending {
    uri: String,
    version: i32,
    /// Tokens and diagnostics returned if the next phase panics.
    fallback: (Vec<Token>, Vec<Diagnostic>),
    unit: CompilationUnit,
    state: Option<DocState>,
    failure: Option<String>,
}

fn declare(doc: TokenizedDocument, store: &mut TypeStore, opts: &ParseOptions) -> Pending {
    let TokenizedDocument {
        uri,
        version,
        tokens,
    } = doc;
    let _span = tracing::debug_span!("parse_unit", uri = %uri).entered();
    let fallback = (tokens.clone(), Vec::new());
    let state = DocState::new(&uri, tokens, opts);
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut parser = Parser::new(state, store);
        let unit = parser.parse_unit();
        (unit, parser.into_state())
    }));
    match outcome {
        Ok((unit, state)) => Pending {
            unit,
            state: Some(state),
            failure: None,
            uri,
            version,
            fallback,
        },
        Err(payload) => Pending {
            unit: CompilationUnit::new(uri.clone()),
            state: None,
            failure: Some(panic_message(payload.as_ref())),
            uri,
            version,
            fallback,
        },
    }
}

impl Pending {
    fn parse_bodies(&mut self, store: &mut TypeStore) {
        self.run_bodies(store, |parser, unit| parser.parse_bodies(unit));
    }

    fn run_bodies(
        &mut self,
        store: &mut TypeStore,
        run: impl FnOnce(&mut Parser<'_>, &mut CompilationUnit),
    ) {
        let Some(state) = self.state.take() else {
            return;
        };
        let _span = tracing::debug_span!("parse_bodies", uri = %self.uri).entered();
        self.fallback = (
            state.cursor.tokens().to_vec(),
            state.cursor.diagnostics().to_vec(),
        );
        let unit = &mut self.unit;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut parser = Parser::new(state, store);
            run(&mut parser, unit);
            parser.into_state()
        }));
        match outcome {
            Ok(state) => self.state = Some(state),
            Err(payload) => self.failure = Some(panic_message(payload.as_ref())),
        }
    }

    fn finish(self, store: &TypeStore) -> ParsedUnit {
        let (tokens, mut diagnostics) = match self.state {
            Some(state) => state.into_parts(),
            None => self.fallback,
        };
        if let Some(message) = self.failure {
            tracing::warn!(uri = %self.uri, %message, "document parse panicked");
            diagnostics.push(Diagnostic::info(
                "parse-failed",
                format!("Parse failed: {message}"),
                TextRange::empty(TextSize::from(0)),
            ));
        }
        let exported = store
            .source_classes(&self.uri)
            .into_iter()
            .filter_map(|id| store.class(id).cloned())
            .collect();
        ParsedUnit {
            uri: self.uri,
            version: self.version,
            tokens,
            unit: self.unit,
            diagnostics,
            exported,
        }
    }
}

#[cfg(test)]
mod tests {
    use kopi_core::Severity;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn a_panicking_body_phase_keeps_declaration_results() {
        let mut store = TypeStore::with_minimal_jdk();
        let doc = TokenizedDocument::lex(&SourceDocument::new(
            "A.java",
            "class A { Missing field; void m() { nope(); } }",
            1,
        ));
        let token_count = doc.tokens.len();
        let mut pending = declare(doc, &mut store, &ParseOptions::default());
        pending.run_bodies(&mut store, |_, _| panic!("boom"));
        let unit = pending.finish(&store);

        let found: Vec<(Severity, &str)> = unit
            .diagnostics
            .iter()
            .map(|d| (d.severity, d.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (Severity::Error, "Unresolved type: Missing"),
                (Severity::Info, "Parse failed: boom"),
            ]
        );
        assert_eq!(unit.tokens.len(), token_count);
        assert_eq!(unit.unit.types.len(), 1);
    }
}
