use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use kopi_core::{Diagnostic, LocKind, SymbolLoc, TextRange, Token, TokenKind, TokenSpan};
use kopi_hir::{Annotation, LocalId, ResolvedIdent};
use kopi_syntax::TokenCursor;
use kopi_types::{TypeId, TypeStore};

use crate::imports::ImportSet;
use crate::scope::ScopeStack;
use crate::ParseOptions;

/// Per-document state carried from the declaration pass to the body pass.
#[derive(Debug)]
pub(crate) struct DocState {
    pub(crate) uri: String,
    pub(crate) cursor: TokenCursor,
    pub(crate) package: String,
    pub(crate) imports: ImportSet,
    next_local: u32,
    class_counters: HashMap<TypeId, u32>,
}

impl DocState {
    pub(crate) fn new(uri: &str, tokens: Vec<Token>, opts: &ParseOptions) -> Self {
        let mut cursor = TokenCursor::new(tokens);
        cursor.set_diagnostic_limit(opts.diagnostic_limit);
        Self {
            uri: uri.to_string(),
            cursor,
            package: String::new(),
            imports: ImportSet::new(&opts.implicit_imports),
            next_local: 0,
            class_counters: HashMap::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Token>, Vec<Diagnostic>) {
        self.cursor.into_parts()
    }
}

/// Modifier keywords and annotations preceding a declaration.
#[derive(Debug, Default)]
pub(crate) struct Modifiers {
    /// Doc comment written before the modifiers.
    pub(crate) docs: Option<String>,
    pub(crate) keywords: Vec<String>,
    pub(crate) keyword_ranges: Vec<TextRange>,
    pub(crate) annotations: Vec<Annotation>,
}

impl Modifiers {
    pub(crate) fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.annotations.is_empty()
    }

    pub(crate) fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

pub(crate) struct Parser<'a> {
    pub(crate) cursor: TokenCursor,
    pub(crate) store: &'a mut TypeStore,
    pub(crate) uri: String,
    pub(crate) package: String,
    pub(crate) imports: ImportSet,
    pub(crate) scopes: ScopeStack,
    /// Method type variables in scope, innermost frame last. Class type
    /// variables are read from the store through `current_type`.
    pub(crate) type_vars: Vec<Vec<String>>,
    pub(crate) current_type: Option<TypeId>,
    next_local: u32,
    class_counters: HashMap<TypeId, u32>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(state: DocState, store: &'a mut TypeStore) -> Self {
        let DocState {
            uri,
            cursor,
            package,
            imports,
            next_local,
            class_counters,
        } = state;
        Self {
            cursor,
            store,
            uri,
            package,
            imports,
            scopes: ScopeStack::default(),
            type_vars: Vec::new(),
            current_type: None,
            next_local,
            class_counters,
        }
    }

    pub(crate) fn into_state(self) -> DocState {
        DocState {
            uri: self.uri,
            cursor: self.cursor,
            package: self.package,
            imports: self.imports,
            next_local: self.next_local,
            class_counters: self.class_counters,
        }
    }

    pub(crate) fn new_local_id(&mut self) -> LocalId {
        let id = LocalId::from_raw(self.next_local);
        self.next_local += 1;
        id
    }

    /// Next number for a local or anonymous class declared inside `owner`.
    pub(crate) fn next_class_number(&mut self, owner: TypeId) -> u32 {
        let counter = self.class_counters.entry(owner).or_insert(0);
        *counter += 1;
        *counter
    }

    /// `current_type` followed by its lexically enclosing types.
    pub(crate) fn type_chain(&self) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut next = self.current_type;
        while let Some(id) = next {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            next = self.store.class(id).and_then(|def| def.outer);
        }
        chain
    }

    pub(crate) fn bind(&mut self, token: usize, kind: LocKind, target: impl Into<String>) {
        self.cursor.set_loc(token, SymbolLoc::new(kind, target));
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.cursor.report(diagnostic);
    }

    /// A fresh result covering `span`.
    pub(crate) fn fragment(&self, span: TokenSpan) -> ResolvedIdent {
        ResolvedIdent::new(
            self.cursor.text_of(span),
            span,
            self.cursor.range_of(span),
        )
    }

    /// Span of the single token at `index`.
    pub(crate) fn token_span(index: usize) -> TokenSpan {
        TokenSpan::new(index, index + 1)
    }

    /// Tokens consumed since `start`; empty when nothing was consumed.
    pub(crate) fn span_from(&self, start: usize) -> TokenSpan {
        let end = self.cursor.previous_index().map_or(start, |idx| idx + 1);
        TokenSpan::new(start, end.max(start))
    }

    pub(crate) fn token_range(&self, index: usize) -> TextRange {
        self.cursor
            .token(index)
            .map_or_else(|| self.cursor.error_range(), |t| t.range)
    }

    /// Reports a missing `;` after the previous token unless one is next.
    pub(crate) fn semicolon(&mut self) {
        if self.cursor.match_value(";") {
            return;
        }
        let range = self.cursor.previous_range();
        self.report(Diagnostic::error(
            "missing-semicolon",
            "Missing operator or semicolon",
            range,
        ));
    }

    /// Modifiers and annotations before a member or top-level declaration.
    pub(crate) fn modifiers(&mut self) -> Modifiers {
        self.collect_modifiers(false)
    }

    /// Modifiers before a local declaration. `default` and `synchronized (`
    /// start statements here and are left in place.
    pub(crate) fn statement_modifiers(&mut self) -> Modifiers {
        self.collect_modifiers(true)
    }

    fn collect_modifiers(&mut self, in_body: bool) -> Modifiers {
        let mut mods = Modifiers {
            docs: self
                .cursor
                .take_docs()
                .filter(|text| text.starts_with("/**")),
            ..Modifiers::default()
        };
        loop {
            if self.cursor.at("@") {
                if self.cursor.peek(1).is("interface") {
                    break;
                }
                if let Some(annotation) = self.annotation() {
                    mods.annotations.push(annotation);
                }
                continue;
            }
            if !self.cursor.at_kind(TokenKind::Modifier) {
                break;
            }
            if in_body
                && (self.cursor.at("default")
                    || (self.cursor.at("synchronized") && self.cursor.peek(1).is("(")))
            {
                break;
            }
            let token = self.cursor.consume();
            mods.keywords.push(token.text.to_string());
            mods.keyword_ranges.push(token.range);
        }
        mods
    }

    pub(crate) fn reject_modifiers(&mut self, mods: &Modifiers) {
        for (keyword, range) in mods.keywords.iter().zip(&mods.keyword_ranges) {
            self.report(Diagnostic::error(
                "invalid-modifier",
                format!("Unexpected modifier: {keyword}"),
                *range,
            ));
        }
        for annotation in &mods.annotations {
            self.report(Diagnostic::error(
                "invalid-modifier",
                format!("Unexpected modifier: @{}", annotation.ty.source),
                annotation.range,
            ));
        }
    }

    /// Runs `f` behind a panic boundary. A panic becomes one informational
    /// diagnostic at `range` and the scope/type context is restored.
    pub(crate) fn guarded<T>(
        &mut self,
        member: &str,
        range: TextRange,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Option<T> {
        let depth = self.scopes.depth();
        let barrier = self.scopes.barrier();
        let type_vars = self.type_vars.len();
        let current_type = self.current_type;
        match catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(value) => Some(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(uri = %self.uri, member, %message, "member body parse panicked");
                self.scopes.truncate(depth);
                self.scopes.restore_barrier(barrier);
                self.type_vars.truncate(type_vars);
                self.current_type = current_type;
                self.report(Diagnostic::info(
                    "parse-failed",
                    format!("Parse failed: {message}"),
                    range,
                ));
                None
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}
