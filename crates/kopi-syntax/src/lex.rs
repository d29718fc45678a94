//! Reference tokenizer.
//!
//! The output is lossless: concatenating the text of every token (trivia
//! included) reproduces the input exactly. Malformed input never fails; it
//! produces `Invalid` tokens instead.

use kopi_core::{TextRange, TextSize, Token, TokenKind};

/// Tokenizes Java source text.
pub fn lex(text: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Classifies a word as a keyword class, or `Ident`.
pub fn keyword_kind(word: &str) -> TokenKind {
    match word {
        "public" | "private" | "protected" | "static" | "final" | "abstract" | "native"
        | "transient" | "volatile" | "strictfp" | "default" | "synchronized" => {
            TokenKind::Modifier
        }
        "class" | "interface" | "enum" => TokenKind::TypeKeyword,
        "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double" | "void" => {
            TokenKind::PrimitiveType
        }
        "if" | "while" | "do" | "for" | "switch" | "try" | "return" | "throw" | "break"
        | "continue" | "assert" => TokenKind::StatementKeyword,
        "new" => TokenKind::NewOperator,
        "instanceof" => TokenKind::InstanceofOperator,
        "true" | "false" => TokenKind::BooleanLiteral,
        "this" | "super" | "null" => TokenKind::ObjectLiteral,
        "package" | "import" | "extends" | "implements" | "throws" | "else" | "case" | "catch"
        | "finally" | "goto" | "const" => TokenKind::Keyword,
        _ => TokenKind::Ident,
    }
}

// Longest first. `>>`, `>>>`, `>>=` and `>>>=` are deliberately absent: every
// `>` is its own token so that `List<List<T>>` closes two argument lists.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::AssignmentOperator),
    ("...", TokenKind::Symbol),
    ("->", TokenKind::Symbol),
    ("::", TokenKind::Symbol),
    ("++", TokenKind::IncOperator),
    ("--", TokenKind::IncOperator),
    ("&&", TokenKind::LogicalOperator),
    ("||", TokenKind::LogicalOperator),
    ("==", TokenKind::EqualityOperator),
    ("!=", TokenKind::EqualityOperator),
    ("<=", TokenKind::ComparisonOperator),
    (">=", TokenKind::ComparisonOperator),
    ("<<", TokenKind::ShiftOperator),
    ("+=", TokenKind::AssignmentOperator),
    ("-=", TokenKind::AssignmentOperator),
    ("*=", TokenKind::AssignmentOperator),
    ("/=", TokenKind::AssignmentOperator),
    ("%=", TokenKind::AssignmentOperator),
    ("&=", TokenKind::AssignmentOperator),
    ("|=", TokenKind::AssignmentOperator),
    ("^=", TokenKind::AssignmentOperator),
    ("=", TokenKind::AssignmentOperator),
    ("<", TokenKind::ComparisonOperator),
    (">", TokenKind::ComparisonOperator),
    ("&", TokenKind::BitwiseOperator),
    ("|", TokenKind::BitwiseOperator),
    ("^", TokenKind::BitwiseOperator),
    ("*", TokenKind::MulDivOperator),
    ("/", TokenKind::MulDivOperator),
    ("%", TokenKind::MulDivOperator),
    ("+", TokenKind::PlusMinusOperator),
    ("-", TokenKind::PlusMinusOperator),
    ("!", TokenKind::UnaryOperator),
    ("~", TokenKind::UnaryOperator),
    ("?", TokenKind::TernaryOperator),
    ("(", TokenKind::OpenBracket),
    (")", TokenKind::Symbol),
    ("[", TokenKind::Symbol),
    ("]", TokenKind::Symbol),
    ("{", TokenKind::Symbol),
    ("}", TokenKind::Symbol),
    (";", TokenKind::Symbol),
    (",", TokenKind::Symbol),
    (".", TokenKind::Symbol),
    (":", TokenKind::Symbol),
    ("@", TokenKind::Symbol),
];

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn nth_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let ch = self.peek_char()?;
        let kind = if ch.is_whitespace() {
            self.bump_while(char::is_whitespace);
            TokenKind::Whitespace
        } else if self.rest().starts_with("//") {
            self.bump_while(|c| c != '\n' && c != '\r');
            TokenKind::LineComment
        } else if self.rest().starts_with("/*") {
            self.block_comment()
        } else if is_ident_start(ch) {
            self.bump_while(is_ident_continue);
            keyword_kind(&self.text[start..self.pos])
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.nth_char(1).is_some_and(|c| c.is_ascii_digit()))
        {
            self.number()
        } else if self.rest().starts_with("\"\"\"") {
            self.text_block()
        } else if ch == '"' {
            self.quoted('"', TokenKind::StringLiteral)
        } else if ch == '\'' {
            self.quoted('\'', TokenKind::CharLiteral)
        } else if let Some((op, kind)) = OPERATORS.iter().find(|(op, _)| self.rest().starts_with(op)) {
            self.pos += op.len();
            *kind
        } else {
            self.pos += ch.len_utf8();
            TokenKind::Invalid
        };

        let text = &self.text[start..self.pos];
        let range = TextRange::new(offset(start), offset(self.pos));
        Some(Token::new(kind, text, range))
    }

    fn block_comment(&mut self) -> TokenKind {
        self.pos += 2;
        match self.rest().find("*/") {
            Some(end) => self.pos += end + 2,
            // Unterminated comments swallow the rest of the file.
            None => self.pos = self.text.len(),
        }
        TokenKind::BlockComment
    }

    fn text_block(&mut self) -> TokenKind {
        self.pos += 3;
        loop {
            let rest = self.rest();
            if rest.starts_with("\\") {
                self.pos += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
            } else if rest.starts_with("\"\"\"") {
                self.pos += 3;
                // Extra quotes directly before the delimiter belong to the content.
                self.bump_while(|c| c == '"');
                return TokenKind::StringLiteral;
            } else if let Some(ch) = rest.chars().next() {
                self.pos += ch.len_utf8();
            } else {
                return TokenKind::Invalid;
            }
        }
    }

    fn quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        loop {
            match self.peek_char() {
                None | Some('\n') | Some('\r') => return TokenKind::Invalid,
                Some('\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek_char() {
                        if escaped != '\n' && escaped != '\r' {
                            self.pos += escaped.len_utf8();
                        }
                    }
                }
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return kind;
                }
                Some(ch) => self.pos += ch.len_utf8(),
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            self.bump_while(|c| c.is_ascii_hexdigit() || c == '_');
            return self.integer_suffix();
        }
        if rest.starts_with("0b") || rest.starts_with("0B") {
            self.pos += 2;
            self.bump_while(|c| c == '0' || c == '1' || c == '_');
            return self.integer_suffix();
        }

        let mut floating = false;
        self.bump_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek_char() == Some('.') && self.nth_char(1).map_or(true, |c| !is_ident_start(c)) {
            floating = true;
            self.pos += 1;
            self.bump_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let sign = usize::from(matches!(self.nth_char(1), Some('+') | Some('-')));
            if self.nth_char(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                floating = true;
                self.pos += 1 + sign;
                self.bump_while(|c| c.is_ascii_digit() || c == '_');
            }
        }
        match self.peek_char() {
            Some('f') | Some('F') => {
                self.pos += 1;
                TokenKind::FloatLiteral
            }
            Some('d') | Some('D') => {
                self.pos += 1;
                TokenKind::DoubleLiteral
            }
            Some('l') | Some('L') if !floating => {
                self.pos += 1;
                TokenKind::LongLiteral
            }
            _ if floating => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        }
    }

    fn integer_suffix(&mut self) -> TokenKind {
        if matches!(self.peek_char(), Some('l') | Some('L')) {
            self.pos += 1;
            TokenKind::LongLiteral
        } else {
            TokenKind::IntLiteral
        }
    }
}

fn offset(pos: usize) -> TextSize {
    TextSize::from(pos as u32)
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_ident::is_xid_start(ch)
}

fn is_ident_continue(ch: char) -> bool {
    ch == '$' || unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        lex(text)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn lexing_is_lossless() {
        let src = "class A {\n  /** doc */ int x = 0x1F; // hi\n  String s = \"a\\\"b\";\n}\n";
        let joined: String = lex(src).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn keyword_classes() {
        assert_eq!(
            kinds("public class var this instanceof new for int"),
            vec![
                (TokenKind::Modifier, "public".into()),
                (TokenKind::TypeKeyword, "class".into()),
                (TokenKind::Ident, "var".into()),
                (TokenKind::ObjectLiteral, "this".into()),
                (TokenKind::InstanceofOperator, "instanceof".into()),
                (TokenKind::NewOperator, "new".into()),
                (TokenKind::StatementKeyword, "for".into()),
                (TokenKind::PrimitiveType, "int".into()),
            ]
        );
    }

    #[test]
    fn closing_angles_are_split() {
        let toks = kinds("a>>=b>>>c>=d");
        let texts: Vec<&str> = toks.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["a", ">", ">=", "b", ">", ">", ">", "c", ">=", "d"]);
    }

    #[test]
    fn numeric_literal_kinds() {
        assert_eq!(
            kinds("1 1L 0xFFl 1.5 1e3 2f .5 1_000 3d 0b101"),
            vec![
                (TokenKind::IntLiteral, "1".into()),
                (TokenKind::LongLiteral, "1L".into()),
                (TokenKind::LongLiteral, "0xFFl".into()),
                (TokenKind::DoubleLiteral, "1.5".into()),
                (TokenKind::DoubleLiteral, "1e3".into()),
                (TokenKind::FloatLiteral, "2f".into()),
                (TokenKind::DoubleLiteral, ".5".into()),
                (TokenKind::IntLiteral, "1_000".into()),
                (TokenKind::DoubleLiteral, "3d".into()),
                (TokenKind::IntLiteral, "0b101".into()),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_invalid_and_stops_at_newline() {
        let toks = lex("\"abc\nx");
        assert_eq!(toks[0].kind, TokenKind::Invalid);
        assert_eq!(toks[0].text, "\"abc");
        assert_eq!(toks.last().map(|t| t.text.as_str()), Some("x"));
    }

    #[test]
    fn text_block_is_one_string_token() {
        let toks = kinds("s = \"\"\"\n  hi \"there\"\n  \"\"\";");
        assert_eq!(toks[2].0, TokenKind::StringLiteral);
        assert!(toks[2].1.ends_with("\"\"\""));
        assert_eq!(toks[3], (TokenKind::Symbol, ";".into()));
    }

    #[test]
    fn member_access_on_int_is_not_a_double() {
        let toks = kinds("1.toString");
        assert_eq!(toks[0], (TokenKind::IntLiteral, "1".into()));
        assert_eq!(toks[1], (TokenKind::Symbol, ".".into()));
    }
}
