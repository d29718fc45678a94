use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use text_size::TextRange;

/// Token classes produced by a tokenizer.
///
/// The classes are deliberately coarse: the parser dispatches on the class and
/// then on the token text, so e.g. every assignment form shares one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,

    Ident,
    /// `public`, `static`, `final`, `default`, `synchronized`, ...
    Modifier,
    /// `class`, `interface`, `enum`
    TypeKeyword,
    /// Primitive type names plus `void`.
    PrimitiveType,
    /// `if`, `while`, `do`, `for`, `switch`, `try`, `return`, `throw`, `break`,
    /// `continue`, `assert`
    StatementKeyword,
    NewOperator,
    /// Remaining reserved words: `package`, `import`, `extends`, `else`, ...
    Keyword,

    StringLiteral,
    CharLiteral,
    BooleanLiteral,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    /// `this`, `super`, `null`
    ObjectLiteral,

    AssignmentOperator,
    EqualityOperator,
    ComparisonOperator,
    BitwiseOperator,
    ShiftOperator,
    LogicalOperator,
    MulDivOperator,
    PlusMinusOperator,
    IncOperator,
    UnaryOperator,
    InstanceofOperator,
    TernaryOperator,

    /// `(`
    OpenBracket,
    /// Every other punctuation token.
    Symbol,

    Invalid,
    /// Synthetic token returned past the end of the stream.
    Eof,
}

impl TokenKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral
                | TokenKind::CharLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::ObjectLiteral
        )
    }

    pub fn is_number_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
        )
    }

    /// Operators that may appear between two operands.
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            TokenKind::AssignmentOperator
                | TokenKind::EqualityOperator
                | TokenKind::ComparisonOperator
                | TokenKind::BitwiseOperator
                | TokenKind::ShiftOperator
                | TokenKind::LogicalOperator
                | TokenKind::MulDivOperator
                | TokenKind::PlusMinusOperator
                | TokenKind::InstanceofOperator
        )
    }

    /// Whether a token of this kind can begin an expression.
    pub fn is_expression_start(self) -> bool {
        self == TokenKind::Ident
            || self == TokenKind::PrimitiveType
            || self.is_literal()
            || matches!(
                self,
                TokenKind::IncOperator
                    | TokenKind::PlusMinusOperator
                    | TokenKind::UnaryOperator
                    | TokenKind::OpenBracket
                    | TokenKind::NewOperator
            )
    }
}

/// Half-open range of token indices within one token list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: u32,
    pub end: u32,
}

impl TokenSpan {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    #[inline]
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn cover(self, other: TokenSpan) -> TokenSpan {
        TokenSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// What a token was bound to during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocKind {
    PackageName,
    ImportName,
    Local,
    Field,
    Method,
    EnumConstant,
    Type,
    TypeVariable,
    /// The declaring name of a type, field, method or parameter.
    Declaration,
}

/// Symbol annotation written onto a token for editor features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolLoc {
    pub kind: LocKind,
    /// Signature or name of the bound symbol, e.g. `java/lang/String` or
    /// `com/example/Foo#bar`.
    pub target: String,
}

impl SymbolLoc {
    pub fn new(kind: LocKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

/// One lexed token.
///
/// Tokens are immutable once produced apart from `loc`, which the resolver fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub range: TextRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<SymbolLoc>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            loc: None,
        }
    }

    #[inline]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    #[inline]
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}
