//! Expression parsing by precedence climbing.
//!
//! Every fragment is resolved as soon as it is read: a term is looked up in
//! scope, each `.name` qualifier narrows the candidates of the term before
//! it, and operators compute their result type from their operands.

use kopi_core::{Diagnostic, LocKind, TokenKind};
use kopi_hir::{
    BinaryOp, Expr, LambdaBody, LiteralKind, Local, MethodBinding, ResolvedIdent, TypeRef,
    UnaryOp, VarBinding,
};
use kopi_types::{PrimitiveType, Type};

use crate::parser::Parser;
use crate::resolve::{set_value, value_type};

/// Binding strength of the loosest operator; lower binds tighter.
const TOP: u8 = 13;
const TERNARY: u8 = 11;
const ASSIGN: u8 = 12;

fn precedence(op: &str) -> Option<u8> {
    Some(match op {
        "*" | "/" | "%" => 1,
        "+" | "-" => 2,
        "<<" | ">>" | ">>>" => 3,
        "<" | ">" | "<=" | ">=" | "instanceof" => 4,
        "==" | "!=" => 5,
        "&" => 6,
        "^" => 7,
        "|" => 8,
        "&&" => 9,
        "||" => 10,
        "?" => TERNARY,
        _ if op.ends_with('=') => ASSIGN,
        _ => return None,
    })
}

fn literal_kind(kind: TokenKind, text: &str) -> Option<LiteralKind> {
    Some(match kind {
        TokenKind::StringLiteral => LiteralKind::String,
        TokenKind::CharLiteral => LiteralKind::Char,
        TokenKind::BooleanLiteral => LiteralKind::Boolean,
        TokenKind::IntLiteral => LiteralKind::Int,
        TokenKind::LongLiteral => LiteralKind::Long,
        TokenKind::FloatLiteral => LiteralKind::Float,
        TokenKind::DoubleLiteral => LiteralKind::Double,
        TokenKind::ObjectLiteral => match text {
            "this" => LiteralKind::This,
            "super" => LiteralKind::Super,
            _ => LiteralKind::Null,
        },
        _ => return None,
    })
}

impl Parser<'_> {
    pub(crate) fn expression(&mut self) -> ResolvedIdent {
        self.expression_bounded(TOP)
    }

    /// Parses operators binding at least as tightly as `top`.
    fn expression_bounded(&mut self, top: u8) -> ResolvedIdent {
        let start = self.cursor.index();
        let mut lhs = self.qualified_term();
        while let Some((op, width)) = self.binary_operator() {
            let Some(prec) = precedence(&op) else {
                break;
            };
            let right_assoc = prec == TERNARY || prec == ASSIGN;
            if prec > top || (prec == top && !right_assoc) {
                break;
            }
            for _ in 0..width {
                self.cursor.advance();
            }
            lhs = match op.as_str() {
                "?" => self.ternary(start, lhs),
                "instanceof" => self.instance_of(start, lhs),
                _ if prec == ASSIGN => self.assignment(start, &op, lhs),
                _ => self.binary(start, &op, prec, lhs),
            };
        }
        lhs
    }

    /// The operator at the cursor and how many tokens spell it. Shift
    /// operators arrive as adjacent `>` tokens and are put back together.
    fn binary_operator(&self) -> Option<(String, usize)> {
        if self.cursor.is_eof() {
            return None;
        }
        let token = self.cursor.current();
        if token.kind == TokenKind::TernaryOperator {
            return Some(("?".to_string(), 1));
        }
        if !token.kind.is_binary_operator() {
            return None;
        }
        if !token.is(">") {
            return Some((token.text.to_string(), 1));
        }
        let idx = self.cursor.index();
        let mut text = String::from(">");
        let mut width = 1;
        while width < 3 && self.cursor.peek_index(width) == Some(idx + width) {
            let next = self.cursor.peek(width);
            if next.is(">") {
                text.push('>');
                width += 1;
            } else if next.is(">=") {
                text.push_str(">=");
                width += 1;
                break;
            } else {
                break;
            }
        }
        Some((text, width))
    }

    fn binary(&mut self, start: usize, op: &str, prec: u8, lhs: ResolvedIdent) -> ResolvedIdent {
        let rhs = self.expression_bounded(prec);
        let ty = self.binary_type(op, &value_type(&lhs), &value_type(&rhs));
        let Some(op) = BinaryOp::from_text(op) else {
            return lhs;
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        });
        set_value(&mut out, ty);
        out
    }

    fn assignment(&mut self, start: usize, op: &str, target: ResolvedIdent) -> ResolvedIdent {
        let value = self.expression_bounded(ASSIGN);
        let ty = value_type(&target);
        let op = op.strip_suffix('=').and_then(BinaryOp::from_text);
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        });
        set_value(&mut out, ty);
        out
    }

    fn ternary(&mut self, start: usize, test: ResolvedIdent) -> ResolvedIdent {
        let then = self.expression_bounded(TERNARY);
        self.cursor.expect_value(":");
        let otherwise = self.expression_bounded(TERNARY);
        let ty = match value_type(&then) {
            Type::Null => value_type(&otherwise),
            ty => ty,
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Ternary {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        });
        set_value(&mut out, ty);
        out
    }

    /// `expr instanceof Type`, optionally binding a pattern variable.
    fn instance_of(&mut self, start: usize, expr: ResolvedIdent) -> ResolvedIdent {
        let type_start = self.cursor.index();
        let type_ref = self.type_ref(true);
        let mut ty = self.fragment(self.span_from(type_start));
        ty.types.push(type_ref.ty.clone());

        if self.cursor.at_kind(TokenKind::Ident) {
            let idx = self.cursor.index();
            let name = self.cursor.consume();
            self.bind(idx, LocKind::Declaration, name.text.to_string());
            let local = Local {
                id: self.new_local_id(),
                modifiers: Vec::new(),
                name: name.text.to_string(),
                name_range: name.range,
                name_token: Some(idx),
                ty: type_ref,
                extra_dims: 0,
                init: None,
            };
            self.scopes.declare(local);
        }

        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::InstanceOf {
            expr: Box::new(expr),
            ty: Box::new(ty),
        });
        set_value(&mut out, Type::Primitive(PrimitiveType::Boolean));
        out
    }

    /// A term followed by its member, index, call and type argument
    /// qualifiers, then an optional postfix `++`/`--`.
    fn qualified_term(&mut self) -> ResolvedIdent {
        let start = self.cursor.index();
        let mut term = self.root_term();
        loop {
            term = if self.cursor.at(".") {
                self.member_qualifier(start, term)
            } else if self.cursor.at("::") {
                self.method_ref(start, term)
            } else if self.cursor.at("[") {
                self.index_qualifier(start, term)
            } else if self.cursor.at("(") && is_callable(&term) {
                self.call(start, term)
            } else if self.cursor.at("<") && self.type_args_follow(&term) {
                self.type_args_qualifier(start, term)
            } else {
                break;
            };
        }
        if self.cursor.at_kind(TokenKind::IncOperator) {
            let op = self.cursor.consume();
            let ty = value_type(&term);
            let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Increment {
                increment: op.is("++"),
                prefix: false,
                operand: Box::new(term),
            });
            set_value(&mut out, ty);
            return out;
        }
        term
    }

    fn root_term(&mut self) -> ResolvedIdent {
        let start = self.cursor.index();
        let token = self.cursor.current().clone();
        match token.kind {
            TokenKind::Ident if self.cursor.peek(1).is("->") => self.lambda(start),
            TokenKind::Ident => {
                self.cursor.advance();
                let mut ident = self.find_identifier(&token.text, start);
                self.check_identifier_found(&mut ident);
                ident
            }
            TokenKind::PrimitiveType => {
                self.cursor.advance();
                let mut ident = self.fragment(Self::token_span(start));
                ident
                    .types
                    .push(PrimitiveType::from_name(&token.text).map_or(Type::Void, Type::Primitive));
                ident
            }
            kind if kind.is_literal() => {
                self.cursor.advance();
                self.literal(start, kind, &token.text)
            }
            TokenKind::IncOperator => {
                self.cursor.advance();
                let operand = self.qualified_term();
                let ty = value_type(&operand);
                let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Increment {
                    increment: token.is("++"),
                    prefix: true,
                    operand: Box::new(operand),
                });
                set_value(&mut out, ty);
                out
            }
            TokenKind::PlusMinusOperator | TokenKind::UnaryOperator => {
                self.cursor.advance();
                self.unary(start, &token.text)
            }
            TokenKind::NewOperator => self.new_term(start),
            TokenKind::OpenBracket => self.paren_term(start),
            _ if self.cursor.at("{") => self.array_literal(start),
            _ => self.missing_term(start, "Expression expected"),
        }
    }

    fn literal(&mut self, start: usize, kind: TokenKind, text: &str) -> ResolvedIdent {
        let Some(literal) = literal_kind(kind, text) else {
            return self.missing_term(start, "Expression expected");
        };
        let ty = match literal {
            LiteralKind::String => self
                .store
                .string()
                .map_or_else(|| Type::unknown("String"), Type::Class),
            LiteralKind::Char => Type::Primitive(PrimitiveType::Char),
            LiteralKind::Boolean => Type::Primitive(PrimitiveType::Boolean),
            LiteralKind::Int => Type::Primitive(PrimitiveType::Int),
            LiteralKind::Long => Type::Primitive(PrimitiveType::Long),
            LiteralKind::Float => Type::Primitive(PrimitiveType::Float),
            LiteralKind::Double => Type::Primitive(PrimitiveType::Double),
            LiteralKind::Null => Type::Null,
            LiteralKind::This => self
                .current_type
                .map_or_else(|| Type::unknown("this"), Type::Class),
            LiteralKind::Super => self
                .current_type
                .and_then(|id| self.store.super_class(id))
                .unwrap_or_else(|| Type::unknown("super")),
        };
        let mut out = self
            .fragment(Self::token_span(start))
            .with_expr(Expr::Literal {
                kind: literal,
                text: text.to_string(),
                ty: ty.clone(),
            });
        set_value(&mut out, ty);
        out
    }

    /// Prefix `+ - ! ~`. A sign directly on a number literal folds into it.
    fn unary(&mut self, start: usize, op_text: &str) -> ResolvedIdent {
        let operand = self.qualified_term();
        let Some(op) = UnaryOp::from_text(op_text) else {
            return operand;
        };
        if let Some(Expr::Literal { kind, text, ty }) = operand.expr() {
            let number = !matches!(
                kind,
                LiteralKind::String
                    | LiteralKind::Char
                    | LiteralKind::Boolean
                    | LiteralKind::Null
                    | LiteralKind::This
                    | LiteralKind::Super
            );
            if number && matches!(op, UnaryOp::Plus | UnaryOp::Minus) {
                let folded = Expr::Literal {
                    kind: *kind,
                    text: format!("{op_text}{text}"),
                    ty: ty.clone(),
                };
                let ty = ty.clone();
                let mut out = self.fragment(self.span_from(start)).with_expr(folded);
                set_value(&mut out, ty);
                return out;
            }
        }
        let operand_ty = value_type(&operand);
        let ty = match op {
            UnaryOp::Not => Type::Primitive(PrimitiveType::Boolean),
            _ => self
                .promoted(&operand_ty, None)
                .unwrap_or_else(|| Type::unknown(op_text)),
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Unary {
            op,
            operand: Box::new(operand),
        });
        set_value(&mut out, ty);
        out
    }

    /// Error placeholder that resolves every later qualifier silently.
    fn missing_term(&mut self, start: usize, message: &str) -> ResolvedIdent {
        self.cursor.error_here("expected-token", message);
        let span = self.span_from(start);
        let mut out = ResolvedIdent::missing(span, self.cursor.range_of(span));
        out.variables.push(VarBinding::Any);
        out.methods.push(MethodBinding::Any);
        out
    }

    /// `new T(args)`, `new T(args) { body }`, `new T[n][]` or `new T[] {..}`.
    fn new_term(&mut self, start: usize) -> ResolvedIdent {
        self.cursor.advance();
        if !matches!(self.cursor.kind(), TokenKind::Ident | TokenKind::PrimitiveType) {
            return self.missing_term(start, "Constructor expression expected");
        }
        let ty = self.type_ref(false);

        if self.cursor.at("[") {
            let mut dims = Vec::new();
            while self.cursor.match_value("[") {
                if self.cursor.match_value("]") {
                    dims.push(None);
                } else {
                    dims.push(Some(self.expression()));
                    self.cursor.expect_value("]");
                }
            }
            let init = self.cursor.at("{").then(|| {
                let init_start = self.cursor.index();
                Box::new(self.array_literal(init_start))
            });
            let array = ty.ty.clone().array_of(dims.len() as u32);
            let mut out = self.fragment(self.span_from(start)).with_expr(Expr::NewArray {
                element: ty,
                dims,
                init,
            });
            set_value(&mut out, array);
            return out;
        }

        if !self.cursor.at("(") {
            return self.missing_term(start, "Constructor expression expected");
        }
        let args = self.arguments();
        let anonymous = self
            .cursor
            .at("{")
            .then(|| Box::new(self.anonymous_class(&ty.ty)));
        let value = anonymous
            .as_ref()
            .map_or_else(|| ty.ty.clone(), |decl| Type::Class(decl.id));
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::New {
            ty,
            args,
            anonymous,
        });
        set_value(&mut out, value);
        out
    }

    /// `(args)` at the cursor.
    pub(crate) fn arguments(&mut self) -> Vec<ResolvedIdent> {
        let mut args = Vec::new();
        if !self.cursor.expect_value("(") || self.cursor.match_value(")") {
            return args;
        }
        loop {
            args.push(self.expression());
            if !self.cursor.match_value(",") {
                break;
            }
        }
        self.cursor.expect_value(")");
        args
    }

    fn array_literal(&mut self, start: usize) -> ResolvedIdent {
        self.cursor.advance();
        let mut elements = Vec::new();
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            elements.push(self.expression());
            if !self.cursor.match_value(",") {
                break;
            }
        }
        self.cursor.expect_value("}");
        let mut out = self
            .fragment(self.span_from(start))
            .with_expr(Expr::ArrayLiteral { elements });
        set_value(&mut out, Type::unknown("{}"));
        out
    }

    /// `(` starting a lambda, a cast or a bracketed expression.
    fn paren_term(&mut self, start: usize) -> ResolvedIdent {
        if self.is_lambda_paren() {
            return self.lambda(start);
        }
        self.cursor.advance();
        let inner = self.expression();
        self.cursor.expect_value(")");

        if self.is_cast(&inner) {
            let ty = inner
                .types
                .first()
                .cloned()
                .unwrap_or_else(|| Type::unknown(inner.source.clone()));
            let operand = self.qualified_term();
            let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Cast {
                ty: Box::new(inner),
                expr: Box::new(operand),
            });
            set_value(&mut out, ty);
            return out;
        }

        let ty = value_type(&inner);
        let mut out = self
            .fragment(self.span_from(start))
            .with_expr(Expr::Bracketed(Box::new(inner)));
        set_value(&mut out, ty);
        out
    }

    /// Decides whether `(inner)` just read is a cast. A resolved first type
    /// always is, even with no operand after it. An unresolved name is one
    /// only when an operand follows that cannot be the right side of a
    /// binary `+` or `-`.
    fn is_cast(&self, inner: &ResolvedIdent) -> bool {
        match inner.types.first() {
            None => false,
            Some(ty) if !ty.is_unknown() => true,
            Some(_) => {
                let next = self.cursor.kind();
                next.is_expression_start() && next != TokenKind::PlusMinusOperator
            }
        }
    }

    /// Looks ahead from the `(` under the cursor to its matching `)` and
    /// checks for a following `->`. Gives up at a statement boundary.
    fn is_lambda_paren(&self) -> bool {
        let mut depth = 0usize;
        let mut tokens = self.cursor.lookahead();
        while let Some(token) = tokens.next() {
            if token.is(";") || token.is("{") || token.is("}") {
                return false;
            }
            if token.is("(") {
                depth += 1;
            } else if token.is(")") {
                if depth <= 1 {
                    return depth == 1 && tokens.next().is_some_and(|t| t.is("->"));
                }
                depth -= 1;
            }
        }
        false
    }

    /// `x -> ..`, `(a, b) -> ..` or `(int a, String b) -> ..`.
    fn lambda(&mut self, start: usize) -> ResolvedIdent {
        self.scopes.push();
        let mut params = Vec::new();
        if self.cursor.match_value("(") {
            while !self.cursor.is_eof() && !self.cursor.at(")") {
                if let Some(param) = self.lambda_param() {
                    params.push(param);
                }
                if !self.cursor.match_value(",") {
                    break;
                }
            }
            self.cursor.expect_value(")");
        } else if let Some(param) = self.lambda_param() {
            params.push(param);
        }
        self.cursor.expect_value("->");

        let body = if self.cursor.at("{") {
            LambdaBody::Block(self.block())
        } else {
            LambdaBody::Expr(Box::new(self.expression()))
        };
        self.scopes.pop();

        let mut out = self
            .fragment(self.span_from(start))
            .with_expr(Expr::Lambda { params, body });
        set_value(&mut out, Type::unknown("lambda"));
        out
    }

    fn lambda_param(&mut self) -> Option<Local> {
        let mods = self.statement_modifiers();
        let implicit = self.cursor.at_kind(TokenKind::Ident)
            && (self.cursor.peek(1).is(",")
                || self.cursor.peek(1).is(")")
                || self.cursor.peek(1).is("->"));
        let ty = if implicit {
            TypeRef::new("", Type::unknown("lambda"), self.cursor.error_range())
        } else if self.cursor.at("var") && self.cursor.peek(1).kind == TokenKind::Ident {
            let token = self.cursor.consume();
            TypeRef::new("var", Type::unknown("lambda"), token.range)
        } else {
            self.type_ref(true)
        };
        if !self.cursor.at_kind(TokenKind::Ident) {
            self.cursor
                .error_here("expected-token", "Identifier expected");
            return None;
        }
        let idx = self.cursor.index();
        let name = self.cursor.consume();
        self.bind(idx, LocKind::Declaration, name.text.to_string());
        let local = Local {
            id: self.new_local_id(),
            modifiers: mods.keywords,
            name: name.text.to_string(),
            name_range: name.range,
            name_token: Some(idx),
            ty,
            extra_dims: self.extra_dims(),
            init: None,
        };
        self.scopes.declare(local.clone());
        Some(local)
    }

    /// `.name`, `.class`, `.this`, `.new Inner()` or `.<T>name`.
    fn member_qualifier(&mut self, start: usize, receiver: ResolvedIdent) -> ResolvedIdent {
        self.cursor.advance();
        let type_args = if self.cursor.at("<") {
            self.type_args()
        } else {
            None
        };
        let token = self.cursor.current().clone();
        let idx = self.cursor.index();

        if token.is("class") {
            self.cursor.advance();
            let base = receiver.types.first().cloned().unwrap_or(Type::Void);
            let ty = self.class_literal_type(&base);
            return self.member_value(start, receiver, "class", Some(idx), ty);
        }
        if token.is("this") || token.is("super") {
            self.cursor.advance();
            let outer = receiver.types.first().cloned();
            let ty = match (token.is("this"), outer) {
                (true, Some(ty)) => ty,
                (false, Some(Type::Class(id))) => self
                    .store
                    .super_class(id)
                    .unwrap_or_else(|| Type::unknown("super")),
                _ => Type::unknown(token.text.as_str()),
            };
            return self.member_value(start, receiver, &token.text, Some(idx), ty);
        }
        if token.kind == TokenKind::NewOperator {
            return self.new_term(start);
        }
        if token.kind != TokenKind::Ident {
            self.cursor.error_here("expected-token", "Identifier expected");
            let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Member {
                receiver: Box::new(receiver),
                name: String::new(),
                name_token: None,
            });
            out.variables.push(VarBinding::Any);
            out.methods.push(MethodBinding::Any);
            return out;
        }

        self.cursor.advance();
        let mut out = self.fragment(self.span_from(start));
        self.resolve_member(&receiver, &token.text, idx, &mut out);
        out.exprs.push(Expr::Member {
            receiver: Box::new(receiver),
            name: token.text.to_string(),
            name_token: Some(idx),
        });
        match type_args {
            Some(args) => {
                let mut wrapped = out.clone();
                wrapped.exprs = vec![Expr::TypeArgs {
                    base: Box::new(out),
                    args,
                }];
                wrapped
            }
            None => out,
        }
    }

    fn member_value(
        &mut self,
        start: usize,
        receiver: ResolvedIdent,
        name: &str,
        name_token: Option<usize>,
        ty: Type,
    ) -> ResolvedIdent {
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Member {
            receiver: Box::new(receiver),
            name: name.to_string(),
            name_token,
        });
        set_value(&mut out, ty);
        out
    }

    fn method_ref(&mut self, start: usize, receiver: ResolvedIdent) -> ResolvedIdent {
        self.cursor.advance();
        let name = if matches!(self.cursor.kind(), TokenKind::Ident | TokenKind::NewOperator) {
            self.cursor.consume().text.to_string()
        } else {
            self.cursor.error_here("expected-token", "Identifier expected");
            String::new()
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::MethodRef {
            receiver: Box::new(receiver),
            name,
        });
        set_value(&mut out, Type::unknown("::"));
        out
    }

    /// `[]` after a type, or `[index]` after a value.
    fn index_qualifier(&mut self, start: usize, receiver: ResolvedIdent) -> ResolvedIdent {
        self.cursor.advance();
        if self.cursor.match_value("]") {
            let types = receiver.types.iter().map(|t| t.clone().array_of(1)).collect();
            let mut out = self.fragment(self.span_from(start)).with_expr(Expr::ArrayType {
                element: Box::new(receiver),
            });
            out.types = types;
            return out;
        }
        let index = self.expression();
        self.cursor.expect_value("]");
        let ty = match value_type(&receiver) {
            Type::Array(element) => *element,
            other if other.is_unknown() => other,
            _ => Type::unknown("[]"),
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Index {
            receiver: Box::new(receiver),
            index: Box::new(index),
        });
        set_value(&mut out, ty);
        out
    }

    fn call(&mut self, start: usize, callee: ResolvedIdent) -> ResolvedIdent {
        let args = self.arguments();
        let ctor = matches!(
            callee.expr(),
            Some(Expr::Literal {
                kind: LiteralKind::This | LiteralKind::Super,
                ..
            })
        );
        let ty = match self.call_type(&callee, args.len()) {
            Some(ty) => {
                self.bind_called_method(&callee);
                ty
            }
            None if ctor => Type::Void,
            None => {
                if !callee.methods.contains(&MethodBinding::Any) {
                    self.report(Diagnostic::error(
                        "unresolved-method",
                        format!("Unresolved method: {}", callee.source),
                        callee.range,
                    ));
                }
                Type::unknown(callee.source.clone())
            }
        };
        let mut out = self.fragment(self.span_from(start)).with_expr(Expr::Call {
            callee: Box::new(callee),
            args,
            ty: ty.clone(),
        });
        set_value(&mut out, ty);
        out
    }

    /// Points the callee's name token at the method rather than a field of
    /// the same name.
    fn bind_called_method(&mut self, callee: &ResolvedIdent) {
        let Some(MethodBinding::Method { owner, def }) = callee.methods.first() else {
            return;
        };
        let token = match callee.expr() {
            Some(Expr::Ident { token, .. }) => Some(*token),
            Some(Expr::Member { name_token, .. }) => *name_token,
            Some(Expr::TypeArgs { base, .. }) => match base.expr() {
                Some(Expr::Member { name_token, .. }) => *name_token,
                _ => None,
            },
            _ => None,
        };
        if let Some(token) = token {
            let target = format!("{}#{}", self.store.signature(*owner), def.name);
            self.bind(token, LocKind::Method, target);
        }
    }

    /// Whether `<` after `term` opens type arguments rather than a comparison.
    fn type_args_follow(&self, term: &ResolvedIdent) -> bool {
        if term.types.is_empty() {
            return false;
        }
        (term.is_type_only() && term.types.iter().any(|t| !t.is_unknown()))
            || self.looks_like_type_args()
    }

    fn type_args_qualifier(&mut self, start: usize, base: ResolvedIdent) -> ResolvedIdent {
        let args = self.type_args();
        let types = base
            .types
            .clone()
            .into_iter()
            .map(|t| self.apply_type_args(t, args.as_deref()))
            .collect();
        let mut out = self.fragment(self.span_from(start));
        out.types = types;
        out.exprs.push(Expr::TypeArgs {
            base: Box::new(base),
            args: args.unwrap_or_default(),
        });
        out
    }
}

/// Terms a `(` can follow as a call.
fn is_callable(term: &ResolvedIdent) -> bool {
    matches!(
        term.expr(),
        Some(
            Expr::Ident { .. }
                | Expr::Member { .. }
                | Expr::TypeArgs { .. }
                | Expr::Literal {
                    kind: LiteralKind::This | LiteralKind::Super,
                    ..
                }
        )
    )
}
