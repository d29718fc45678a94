use std::fmt::Write as _;

use kopi_core::{TextRange, TokenSpan};
use kopi_types::{MethodDef, Type, TypeId};
use serde::Serialize;

use crate::{Block, Local, LocalId, TypeDecl, TypeRef};

/// The result of parsing any expression fragment.
///
/// Resolution may leave several candidates alive at once: `foo` can be both a
/// field and a method name, `a.b` can be a package prefix or a type. Later
/// qualifiers narrow the lists. An identifier that resolves to nothing gets
/// the wildcard placeholders ([`VarBinding::Any`], [`MethodBinding::Any`],
/// [`Type::Unknown`]) so parsing can continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIdent {
    /// Source text of the fragment.
    pub source: String,
    pub exprs: Vec<Expr>,
    pub variables: Vec<VarBinding>,
    pub methods: Vec<MethodBinding>,
    pub types: Vec<Type>,
    /// Partial package name, e.g. `java.util` while parsing `java.util.List`.
    pub package_name: Option<String>,
    pub tokens: TokenSpan,
    pub range: TextRange,
}

impl ResolvedIdent {
    pub fn new(source: impl Into<String>, tokens: TokenSpan, range: TextRange) -> Self {
        Self {
            source: source.into(),
            exprs: Vec::new(),
            variables: Vec::new(),
            methods: Vec::new(),
            types: Vec::new(),
            package_name: None,
            tokens,
            range,
        }
    }

    pub fn with_expr(mut self, expr: Expr) -> Self {
        self.exprs.push(expr);
        self
    }

    /// A placeholder for a fragment that failed to parse.
    pub fn missing(tokens: TokenSpan, range: TextRange) -> Self {
        Self::new("", tokens, range).with_expr(Expr::Missing)
    }

    /// Whether no candidate of any kind was found.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.methods.is_empty()
            && self.types.is_empty()
            && self.package_name.is_none()
    }

    /// Resolved to exactly a type (and nothing value-like).
    pub fn is_type_only(&self) -> bool {
        !self.types.is_empty() && self.variables.is_empty() && self.methods.is_empty()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.exprs.first()
    }

    /// Parenthesized rendering of the expression tree, for tests and debugging.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        dump(self, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VarBinding {
    Local {
        id: LocalId,
        name: String,
        ty: Type,
    },
    Field {
        owner: TypeId,
        name: String,
        ty: Type,
        is_static: bool,
    },
    EnumConstant {
        owner: TypeId,
        name: String,
    },
    /// A computed value such as a literal, call result or `this`.
    Value(Type),
    /// Wildcard placeholder for an unresolved identifier.
    Any,
}

impl VarBinding {
    pub fn ty(&self) -> Type {
        match self {
            VarBinding::Local { ty, .. } | VarBinding::Field { ty, .. } | VarBinding::Value(ty) => {
                ty.clone()
            }
            VarBinding::EnumConstant { owner, .. } => Type::Class(*owner),
            VarBinding::Any => Type::unknown("?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MethodBinding {
    Method { owner: TypeId, def: MethodDef },
    /// Wildcard placeholder for an unresolved identifier.
    Any,
}

impl MethodBinding {
    pub fn name(&self) -> Option<&str> {
        match self {
            MethodBinding::Method { def, .. } => Some(&def.name),
            MethodBinding::Any => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralKind {
    String,
    Char,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Null,
    This,
    Super,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_text(text: &str) -> Option<Self> {
        Some(match text {
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "&" => BinaryOp::BitAnd,
            "^" => BinaryOp::BitXor,
            "|" => BinaryOp::BitOr,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn from_text(text: &str) -> Option<Self> {
        Some(match text {
            "+" => UnaryOp::Plus,
            "-" => UnaryOp::Minus,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitNot,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LambdaBody {
    Expr(Box<ResolvedIdent>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expr {
    /// A simple name; candidates live on the enclosing [`ResolvedIdent`].
    Ident {
        name: String,
        token: usize,
    },
    Literal {
        kind: LiteralKind,
        text: String,
        ty: Type,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ResolvedIdent>,
        rhs: Box<ResolvedIdent>,
    },
    /// `=` when `op` is `None`, otherwise a compound assignment.
    Assign {
        op: Option<BinaryOp>,
        target: Box<ResolvedIdent>,
        value: Box<ResolvedIdent>,
    },
    Ternary {
        test: Box<ResolvedIdent>,
        then: Box<ResolvedIdent>,
        otherwise: Box<ResolvedIdent>,
    },
    InstanceOf {
        expr: Box<ResolvedIdent>,
        ty: Box<ResolvedIdent>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ResolvedIdent>,
    },
    Increment {
        increment: bool,
        prefix: bool,
        operand: Box<ResolvedIdent>,
    },
    Cast {
        ty: Box<ResolvedIdent>,
        expr: Box<ResolvedIdent>,
    },
    Bracketed(Box<ResolvedIdent>),
    /// `receiver.name`, including `.class` and `.this`.
    Member {
        receiver: Box<ResolvedIdent>,
        name: String,
        name_token: Option<usize>,
    },
    Index {
        receiver: Box<ResolvedIdent>,
        index: Box<ResolvedIdent>,
    },
    /// `element[]` in a type position.
    ArrayType {
        element: Box<ResolvedIdent>,
    },
    Call {
        callee: Box<ResolvedIdent>,
        args: Vec<ResolvedIdent>,
        /// Return type of the chosen candidate.
        ty: Type,
    },
    /// Explicit type arguments applied to a type or generic method: `Foo<Bar>`, `.<T>m`.
    TypeArgs {
        base: Box<ResolvedIdent>,
        args: Vec<TypeRef>,
    },
    New {
        ty: TypeRef,
        args: Vec<ResolvedIdent>,
        /// Anonymous class declared by the expression's body.
        anonymous: Option<Box<TypeDecl>>,
    },
    NewArray {
        element: TypeRef,
        dims: Vec<Option<ResolvedIdent>>,
        init: Option<Box<ResolvedIdent>>,
    },
    ArrayLiteral {
        elements: Vec<ResolvedIdent>,
    },
    Lambda {
        params: Vec<Local>,
        body: LambdaBody,
    },
    MethodRef {
        receiver: Box<ResolvedIdent>,
        name: String,
    },
    Missing,
}

fn dump(ident: &ResolvedIdent, out: &mut String) {
    let Some(expr) = ident.expr() else {
        out.push_str(&ident.source);
        return;
    };
    match expr {
        Expr::Ident { name, .. } => out.push_str(name),
        Expr::Literal { text, .. } => out.push_str(text),
        Expr::Binary { op, lhs, rhs } => {
            out.push('(');
            dump(lhs, out);
            let _ = write!(out, " {} ", op.as_str());
            dump(rhs, out);
            out.push(')');
        }
        Expr::Assign { op, target, value } => {
            out.push('(');
            dump(target, out);
            let _ = write!(out, " {}= ", op.map_or("", BinaryOp::as_str));
            dump(value, out);
            out.push(')');
        }
        Expr::Ternary {
            test,
            then,
            otherwise,
        } => {
            out.push('(');
            dump(test, out);
            out.push_str(" ? ");
            dump(then, out);
            out.push_str(" : ");
            dump(otherwise, out);
            out.push(')');
        }
        Expr::InstanceOf { expr, ty } => {
            out.push('(');
            dump(expr, out);
            out.push_str(" instanceof ");
            dump(ty, out);
            out.push(')');
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.as_str());
            dump(operand, out);
        }
        Expr::Increment {
            increment,
            prefix,
            operand,
        } => {
            let op = if *increment { "++" } else { "--" };
            if *prefix {
                out.push_str(op);
                dump(operand, out);
            } else {
                dump(operand, out);
                out.push_str(op);
            }
        }
        Expr::Cast { ty, expr } => {
            out.push_str("(cast ");
            dump(ty, out);
            out.push(' ');
            dump(expr, out);
            out.push(')');
        }
        Expr::Bracketed(inner) => dump(inner, out),
        Expr::Member { receiver, name, .. } => {
            dump(receiver, out);
            out.push('.');
            out.push_str(name);
        }
        Expr::Index { receiver, index } => {
            dump(receiver, out);
            out.push('[');
            dump(index, out);
            out.push(']');
        }
        Expr::ArrayType { element } => {
            dump(element, out);
            out.push_str("[]");
        }
        Expr::Call { callee, args, .. } => {
            dump(callee, out);
            out.push('(');
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                dump(arg, out);
            }
            out.push(')');
        }
        Expr::TypeArgs { base, args } => {
            dump(base, out);
            out.push('<');
            let args: Vec<&str> = args.iter().map(|a| a.source.as_str()).collect();
            out.push_str(&args.join(", "));
            out.push('>');
        }
        Expr::New { ty, args, .. } => {
            let _ = write!(out, "new {}(", ty.source);
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                dump(arg, out);
            }
            out.push(')');
        }
        Expr::NewArray { element, dims, .. } => {
            let _ = write!(out, "new {}", element.source);
            for dim in dims {
                out.push('[');
                if let Some(dim) = dim {
                    dump(dim, out);
                }
                out.push(']');
            }
        }
        Expr::ArrayLiteral { elements } => {
            out.push('{');
            for (idx, elem) in elements.iter().enumerate() {
                if idx > 0 {
                    out.push_str(", ");
                }
                dump(elem, out);
            }
            out.push('}');
        }
        Expr::Lambda { params, .. } => {
            let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
            let _ = write!(out, "(lambda {})", names.join(" "));
        }
        Expr::MethodRef { receiver, name } => {
            dump(receiver, out);
            out.push_str("::");
            out.push_str(name);
        }
        Expr::Missing => out.push_str("<missing>"),
    }
}
