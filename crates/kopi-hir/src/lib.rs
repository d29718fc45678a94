//! Tree produced by the Kopi parser.
//!
//! Declarations mirror the source structure; method bodies, field
//! initializers and enum constant bodies stay as captured token spans
//! ([`Deferred`]) until the second parsing pass fills them in. Every
//! expression fragment is a [`ResolvedIdent`] carrying its resolution
//! candidates alongside the syntax.

use std::fmt;

use serde::Serialize;

mod decl;
mod expr;
mod stmt;

pub use decl::{
    Annotation, CompilationUnit, Deferred, EnumConstantDecl, FieldDecl, ImportDecl,
    InitializerDecl, Member, MethodDecl, PackageDecl, TypeDecl, TypeParamDecl,
};
pub use expr::{
    BinaryOp, Expr, LambdaBody, LiteralKind, MethodBinding, ResolvedIdent, UnaryOp, VarBinding,
};
pub use stmt::{Block, CaseLabel, CatchClause, Local, Stmt, StmtKind, SwitchCase, TypeRef};

/// Identity of a local variable within one compilation unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalId(u32);

impl LocalId {
    pub fn from_raw(raw: u32) -> Self {
        LocalId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}
