use kopi_core::TextRange;
use kopi_types::Type;
use serde::Serialize;

use crate::{LocalId, ResolvedIdent, TypeDecl};

/// A type as written in source, with what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub source: String,
    pub ty: Type,
    pub range: TextRange,
}

impl TypeRef {
    pub fn new(source: impl Into<String>, ty: Type, range: TextRange) -> Self {
        Self {
            source: source.into(),
            ty,
            range,
        }
    }
}

/// A local variable, parameter, catch variable or lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Local {
    pub id: LocalId,
    pub modifiers: Vec<String>,
    pub name: String,
    pub name_range: TextRange,
    pub name_token: Option<usize>,
    pub ty: TypeRef,
    /// Dimensions written after the name: `int x[]`.
    pub extra_dims: u32,
    pub init: Option<ResolvedIdent>,
}

impl Local {
    /// Declared type including post-name array dimensions.
    pub fn declared_type(&self) -> Type {
        self.ty.ty.clone().array_of(self.extra_dims)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Locals declared directly in this block's scope.
    pub locals: Vec<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: TextRange,
}

impl Stmt {
    pub fn new(kind: StmtKind, range: TextRange) -> Self {
        Self { kind, range }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CaseLabel {
    Default,
    Expr(ResolvedIdent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatchClause {
    pub modifiers: Vec<String>,
    pub types: Vec<TypeRef>,
    pub var: Option<Local>,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StmtKind {
    Empty,
    Block(Block),
    LocalVars(Vec<Local>),
    Expr(ResolvedIdent),
    If {
        test: ResolvedIdent,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        test: ResolvedIdent,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: ResolvedIdent,
    },
    For {
        /// `LocalVars` or `Expr` statements.
        init: Vec<Stmt>,
        test: Option<ResolvedIdent>,
        update: Vec<ResolvedIdent>,
        body: Box<Stmt>,
        locals: Vec<Local>,
    },
    ForEach {
        /// `None` when the header didn't declare a variable.
        var: Option<Local>,
        iterable: ResolvedIdent,
        body: Box<Stmt>,
    },
    Switch {
        test: ResolvedIdent,
        cases: Vec<SwitchCase>,
        locals: Vec<Local>,
    },
    Try {
        /// `LocalVars` or `Expr` statements.
        resources: Vec<Stmt>,
        block: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        locals: Vec<Local>,
    },
    Return(Option<ResolvedIdent>),
    Throw(Option<ResolvedIdent>),
    Break(Option<String>),
    Continue(Option<String>),
    Synchronized {
        lock: ResolvedIdent,
        body: Block,
    },
    Assert {
        test: ResolvedIdent,
        message: Option<ResolvedIdent>,
    },
    LocalType(Box<TypeDecl>),
    /// A token that can't start a statement.
    Invalid,
}
