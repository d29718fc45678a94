//! Token-level layer: the reference tokenizer, the parser's token cursor and
//! the brace-balance scan that discovers type declarations ahead of parsing.

mod cursor;
mod lex;
mod skeleton;

pub use cursor::{CursorState, TokenCursor};
pub use lex::{keyword_kind, lex};
pub use skeleton::{extract_type_skeletons, TypeSkeleton};
