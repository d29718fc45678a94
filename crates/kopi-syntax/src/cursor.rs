use kopi_core::{Diagnostic, SymbolLoc, TextRange, TextSize, Token, TokenKind, TokenSpan};

/// Positional stream over one document's tokens.
///
/// Trivia is skipped transparently: the cursor always rests on a non-trivia
/// token or at the end of its bounds. The cursor also owns the document's
/// diagnostics and writes symbol annotations back onto tokens.
#[derive(Debug)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    diagnostic_limit: Option<usize>,
    pos: usize,
    start: usize,
    end: usize,
    marks: Vec<usize>,
    docs: Option<String>,
    eof: Token,
}

/// Snapshot of the cursor position taken by [`TokenCursor::save`].
#[derive(Debug, Clone)]
pub struct CursorState {
    pos: usize,
    start: usize,
    end: usize,
    marks: Vec<usize>,
    docs: Option<String>,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.len();
        let mut cursor = Self {
            tokens,
            diagnostics: Vec::new(),
            diagnostic_limit: None,
            pos: 0,
            start: 0,
            end,
            marks: Vec::new(),
            docs: None,
            eof: Token::new(TokenKind::Eof, "", TextRange::empty(TextSize::from(0))),
        };
        cursor.refresh_eof();
        cursor.skip_trivia();
        cursor
    }

    /// Caps the number of diagnostics retained; further reports are dropped.
    pub fn set_diagnostic_limit(&mut self, limit: Option<usize>) {
        self.diagnostic_limit = limit;
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<Token>, Vec<Diagnostic>) {
        (self.tokens, self.diagnostics)
    }

    /// Index of the current token; equals the upper bound at the end.
    #[inline]
    pub fn index(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.end
    }

    pub fn current(&self) -> &Token {
        if self.pos < self.end {
            &self.tokens[self.pos]
        } else {
            &self.eof
        }
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn at(&self, text: &str) -> bool {
        !self.is_eof() && self.current().is(text)
    }

    #[inline]
    pub fn at_kind(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Moves past the current token and any trivia following it.
    pub fn advance(&mut self) {
        if self.pos < self.end {
            self.pos += 1;
        }
        self.skip_trivia();
    }

    pub fn consume(&mut self) -> Token {
        let token = self.current().clone();
        self.advance();
        token
    }

    /// The `n`th non-trivia token from the cursor; `peek(0)` is the current token.
    pub fn peek(&self, n: usize) -> &Token {
        self.peek_index(n)
            .map_or(&self.eof, |idx| &self.tokens[idx])
    }

    /// Non-trivia tokens from the cursor to the end of the window.
    pub fn lookahead(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens[self.pos.min(self.end)..self.end]
            .iter()
            .filter(|t| !t.is_trivia())
    }

    /// Token index of [`TokenCursor::peek`]`(n)`, if still within bounds.
    pub fn peek_index(&self, n: usize) -> Option<usize> {
        let mut idx = self.pos;
        let mut remaining = n;
        while idx < self.end {
            if !self.tokens[idx].is_trivia() {
                if remaining == 0 {
                    return Some(idx);
                }
                remaining -= 1;
            }
            idx += 1;
        }
        None
    }

    pub fn mark(&mut self) {
        self.marks.push(self.pos);
    }

    /// Pops the innermost mark and returns the tokens consumed since it,
    /// excluding trailing trivia. The span is never empty.
    pub fn slice_from_mark(&mut self) -> TokenSpan {
        let start = self.marks.pop().unwrap_or(self.pos);
        let mut end = self.pos;
        while end > start && self.tokens[end - 1].is_trivia() {
            end -= 1;
        }
        if end <= start {
            end = (start + 1).min(self.tokens.len()).max(start);
        }
        TokenSpan::new(start, end)
    }

    /// Drops the innermost mark without producing a slice.
    pub fn drop_mark(&mut self) {
        self.marks.pop();
    }

    pub fn match_value(&mut self, text: &str) -> bool {
        if self.at(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) && !self.is_eof() {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `text` or reports it as missing. Parsing continues either way.
    pub fn expect_value(&mut self, text: &str) -> bool {
        if self.match_value(text) {
            return true;
        }
        let range = self.error_range();
        self.report(Diagnostic::error(
            "expected-token",
            format!("`{text}` expected"),
            range,
        ));
        false
    }

    /// The nearest non-trivia token before the cursor.
    pub fn previous(&self) -> Option<&Token> {
        self.previous_index().map(|idx| &self.tokens[idx])
    }

    pub fn previous_index(&self) -> Option<usize> {
        (self.start..self.pos.min(self.end))
            .rev()
            .find(|&idx| !self.tokens[idx].is_trivia())
    }

    /// Range to blame for a problem at the cursor: the current token, or the
    /// last real token once the stream is exhausted.
    pub fn error_range(&self) -> TextRange {
        if self.is_eof() {
            if let Some(prev) = self.previous() {
                return prev.range;
            }
        }
        self.current().range
    }

    /// Range covering the end of the previous token, for "missing X" reports.
    pub fn previous_range(&self) -> TextRange {
        self.previous()
            .map_or_else(|| self.current().range, |tok| tok.range)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        if self
            .diagnostic_limit
            .is_some_and(|limit| self.diagnostics.len() >= limit)
        {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error_here(&mut self, code: &'static str, message: impl Into<String>) {
        let range = self.error_range();
        self.report(Diagnostic::error(code, message, range));
    }

    pub fn set_loc(&mut self, index: usize, loc: SymbolLoc) {
        if let Some(token) = self.tokens.get_mut(index) {
            token.loc = Some(loc);
        }
    }

    /// Documentation comment captured since the last declaration, if any.
    pub fn take_docs(&mut self) -> Option<String> {
        self.docs.take()
    }

    pub fn clear_docs(&mut self) {
        self.docs = None;
    }

    /// Restricts the cursor to `span` and moves to its first real token.
    pub fn seek(&mut self, span: TokenSpan) {
        self.start = (span.start as usize).min(self.tokens.len());
        self.end = (span.end as usize).min(self.tokens.len()).max(self.start);
        self.pos = self.start;
        self.marks.clear();
        self.docs = None;
        self.refresh_eof();
        self.skip_trivia();
    }

    /// Resets bounds to the whole token list and rewinds to the start.
    pub fn reset(&mut self) {
        self.seek(TokenSpan::new(0, self.tokens.len()));
    }

    pub fn save(&self) -> CursorState {
        CursorState {
            pos: self.pos,
            start: self.start,
            end: self.end,
            marks: self.marks.clone(),
            docs: self.docs.clone(),
        }
    }

    pub fn restore(&mut self, state: CursorState) {
        self.pos = state.pos;
        self.start = state.start;
        self.end = state.end;
        self.marks = state.marks;
        self.docs = state.docs;
        self.refresh_eof();
    }

    /// Source text of a token span, trivia included.
    pub fn text_of(&self, span: TokenSpan) -> String {
        let end = (span.end as usize).min(self.tokens.len());
        let start = (span.start as usize).min(end);
        self.tokens[start..end]
            .iter()
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Text range of a token span (empty at the cursor for an empty span).
    pub fn range_of(&self, span: TokenSpan) -> TextRange {
        let first = self.tokens.get(span.start as usize);
        let last = span
            .end
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx as usize));
        match (first, last) {
            (Some(first), Some(last)) if span.end > span.start => {
                TextRange::new(first.range.start(), last.range.end().max(first.range.start()))
            }
            _ => TextRange::empty(self.current().range.start()),
        }
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.end && self.tokens[self.pos].is_trivia() {
            let token = &self.tokens[self.pos];
            if token.kind == TokenKind::BlockComment {
                self.docs = Some(token.text.to_string());
            }
            self.pos += 1;
        }
    }

    fn refresh_eof(&mut self) {
        let at = self.tokens[self.start..self.end]
            .last()
            .map_or_else(
                || self.tokens.get(self.start).map_or(TextSize::from(0), |t| t.range.start()),
                |t| t.range.end(),
            );
        self.eof = Token::new(TokenKind::Eof, "", TextRange::empty(at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex;
    use pretty_assertions::assert_eq;

    fn cursor(src: &str) -> TokenCursor {
        TokenCursor::new(lex(src))
    }

    #[test]
    fn advance_skips_trivia_and_captures_docs() {
        let mut c = cursor("/* first */ a /** docs */ // line\n b");
        assert!(c.at("a"));
        assert_eq!(c.take_docs().as_deref(), Some("/* first */"));
        c.advance();
        assert!(c.at("b"));
        assert_eq!(c.take_docs().as_deref(), Some("/** docs */"));
        assert_eq!(c.take_docs(), None);
        c.advance();
        assert!(c.is_eof());
        assert_eq!(c.kind(), TokenKind::Eof);
    }

    #[test]
    fn peek_looks_past_trivia() {
        let c = cursor("a . b ( )");
        assert_eq!(c.peek(0).text, "a");
        assert_eq!(c.peek(2).text, "b");
        assert_eq!(c.peek(9).kind, TokenKind::Eof);
    }

    #[test]
    fn lookahead_matches_peek() {
        let mut c = cursor("a /* x */ ( b ) -> c");
        c.advance();
        let texts: Vec<&str> = c.lookahead().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["(", "b", ")", "->", "c"]);
        assert_eq!(c.lookahead().nth(3).map(|t| &t.text), Some(&c.peek(3).text));
    }

    #[test]
    fn nested_marks_slice_without_trailing_trivia() {
        let mut c = cursor("x = a + b ;");
        c.mark();
        c.advance();
        c.advance();
        c.mark();
        c.advance();
        c.advance();
        c.advance();
        let inner = c.slice_from_mark();
        assert_eq!(c.text_of(inner), "a + b");
        let outer = c.slice_from_mark();
        assert_eq!(c.text_of(outer), "x = a + b");
    }

    #[test]
    fn slice_is_never_empty() {
        let mut c = cursor("a");
        c.mark();
        let span = c.slice_from_mark();
        assert_eq!(span.len(), 1);
    }

    #[test]
    fn expect_value_reports_at_last_token_when_exhausted() {
        let mut c = cursor("foo (bar");
        c.advance();
        assert!(c.expect_value("("));
        c.advance();
        assert!(!c.expect_value(")"));
        let diag = &c.diagnostics()[0];
        assert_eq!(diag.message, "`)` expected");
        assert_eq!(diag.code, "expected-token");
        assert_eq!(diag.range, TextRange::new(5.into(), 8.into()));
    }

    #[test]
    fn seek_bounds_the_cursor() {
        let mut c = cursor("a { b c } d");
        c.seek(TokenSpan::new(3, 7));
        assert!(c.at("b"));
        c.advance();
        assert!(c.at("c"));
        c.advance();
        assert!(c.is_eof());
        assert_eq!(c.current().range, TextRange::empty(7.into()));

        c.reset();
        assert!(c.at("a"));
    }

    #[test]
    fn save_and_restore_roundtrip_position() {
        let mut c = cursor("a b c");
        let state = c.save();
        c.advance();
        c.advance();
        c.restore(state);
        assert!(c.at("a"));
    }

    #[test]
    fn diagnostic_limit_drops_extra_reports() {
        let mut c = cursor("a");
        c.set_diagnostic_limit(Some(1));
        c.error_here("unexpected-token", "one");
        c.error_here("unexpected-token", "two");
        assert_eq!(c.diagnostics().len(), 1);
    }
}
