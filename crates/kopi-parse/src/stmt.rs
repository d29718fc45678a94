use kopi_core::{Diagnostic, LocKind, TokenKind};
use kopi_hir::{
    Block, CaseLabel, CatchClause, Expr, Local, ResolvedIdent, Stmt, StmtKind, SwitchCase, TypeRef,
    VarBinding,
};
use kopi_types::{ClassKind, Type, TypeId};

use crate::decl::Nesting;
use crate::parser::{Modifiers, Parser};
use crate::resolve::value_type;

impl Parser<'_> {
    /// `{ statements }` in a new scope.
    pub(crate) fn block(&mut self) -> Block {
        self.cursor.expect_value("{");
        self.scopes.push();
        let mut stmts = Vec::new();
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            stmts.push(self.statement());
        }
        self.cursor.expect_value("}");
        let locals = self.scopes.pop();
        Block { stmts, locals }
    }

    pub(crate) fn statement(&mut self) -> Stmt {
        let start = self.cursor.index();
        let kind = self.statement_kind();
        self.stmt_from(start, kind)
    }

    fn stmt_from(&self, start: usize, kind: StmtKind) -> Stmt {
        Stmt::new(kind, self.cursor.range_of(self.span_from(start)))
    }

    fn statement_kind(&mut self) -> StmtKind {
        let mods = self.statement_modifiers();
        if self.at_type_keyword() {
            return match self.type_declaration(mods, Nesting::Local) {
                Some(mut decl) => {
                    self.nested_class_bodies(&mut decl);
                    StmtKind::LocalType(Box::new(decl))
                }
                None => StmtKind::Invalid,
            };
        }
        if !mods.is_empty() {
            let locals = self.declaration_with_modifiers(&mods);
            self.semicolon();
            return StmtKind::LocalVars(locals);
        }

        match self.cursor.kind() {
            TokenKind::StatementKeyword => self.keyword_statement(),
            TokenKind::Modifier if self.cursor.at("synchronized") => {
                self.cursor.advance();
                let lock = self.paren_expression();
                let body = self.block();
                StmtKind::Synchronized { lock, body }
            }
            TokenKind::Ident if self.cursor.peek(1).is(":") => {
                self.cursor.advance();
                self.cursor.advance();
                self.statement_kind()
            }
            TokenKind::Ident | TokenKind::PrimitiveType => {
                let kind = self.expression_or_declaration();
                self.semicolon();
                kind
            }
            kind if kind.is_expression_start() => {
                let expr = self.expression();
                self.semicolon();
                StmtKind::Expr(expr)
            }
            TokenKind::Eof => StmtKind::Empty,
            _ if self.cursor.match_value(";") => StmtKind::Empty,
            _ if self.cursor.at("{") => StmtKind::Block(self.block()),
            _ => {
                let token = self.cursor.consume();
                self.report(Diagnostic::error(
                    "unexpected-token",
                    format!("Unexpected token: {}", token.text),
                    token.range,
                ));
                StmtKind::Invalid
            }
        }
    }

    /// A local declaration after explicit modifiers: `final int x = 1`.
    fn declaration_with_modifiers(&mut self, mods: &Modifiers) -> Vec<Local> {
        if self.at_inferred_local() {
            let ty = self.var_keyword();
            return self.var_declarators(mods, ty, true);
        }
        let ty = self.type_ref(true);
        self.var_declarators(mods, ty, false)
    }

    fn at_inferred_local(&self) -> bool {
        self.cursor.at("var") && self.cursor.peek(1).kind == TokenKind::Ident
    }

    fn var_keyword(&mut self) -> TypeRef {
        let token = self.cursor.consume();
        TypeRef::new("var", Type::unknown("var"), token.range)
    }

    /// An expression statement, or a local declaration when a type-only
    /// expression is followed by a name.
    fn expression_or_declaration(&mut self) -> StmtKind {
        let none = Modifiers::default();
        if self.at_inferred_local() {
            let ty = self.var_keyword();
            return StmtKind::LocalVars(self.var_declarators(&none, ty, true));
        }
        let expr = self.expression();
        if !expr.types.is_empty() && self.cursor.at_kind(TokenKind::Ident) {
            let ty = TypeRef::new(expr.source.clone(), expr.types[0].clone(), expr.range);
            return StmtKind::LocalVars(self.var_declarators(&none, ty, false));
        }
        StmtKind::Expr(expr)
    }

    /// `a = 1, b[] = {}`. Each local is in scope from the end of its own
    /// declarator; `infer` takes the type from the initializer (`var`).
    fn var_declarators(&mut self, mods: &Modifiers, ty: TypeRef, infer: bool) -> Vec<Local> {
        let mut locals = Vec::new();
        loop {
            let name = if self.cursor.at_kind(TokenKind::Ident) {
                let idx = self.cursor.index();
                Some((idx, self.cursor.consume()))
            } else {
                self.cursor
                    .error_here("expected-token", "Variable name expected");
                None
            };
            let extra_dims = self.extra_dims();
            let init = self
                .cursor
                .match_value("=")
                .then(|| self.expression());

            if let Some((idx, token)) = name {
                let mut local_ty = ty.clone();
                if infer {
                    local_ty.ty = init.as_ref().map_or_else(|| Type::unknown("var"), value_type);
                }
                self.bind(idx, LocKind::Declaration, token.text.to_string());
                let local = Local {
                    id: self.new_local_id(),
                    modifiers: mods.keywords.clone(),
                    name: token.text.to_string(),
                    name_range: token.range,
                    name_token: Some(idx),
                    ty: local_ty,
                    extra_dims,
                    init,
                };
                self.scopes.declare(local.clone());
                locals.push(local);
            }
            if !self.cursor.match_value(",") {
                break;
            }
        }
        locals
    }

    fn paren_expression(&mut self) -> ResolvedIdent {
        self.cursor.expect_value("(");
        let expr = self.expression();
        self.cursor.expect_value(")");
        expr
    }

    fn optional_expression(&mut self) -> Option<ResolvedIdent> {
        self.cursor
            .kind()
            .is_expression_start()
            .then(|| self.expression())
    }

    fn keyword_statement(&mut self) -> StmtKind {
        let keyword = self.cursor.consume();
        match keyword.text.as_str() {
            "if" => {
                let test = self.paren_expression();
                let then = Box::new(self.statement());
                let otherwise = self
                    .cursor
                    .match_value("else")
                    .then(|| Box::new(self.statement()));
                StmtKind::If {
                    test,
                    then,
                    otherwise,
                }
            }
            "while" => {
                let test = self.paren_expression();
                let body = Box::new(self.statement());
                StmtKind::While { test, body }
            }
            "do" => {
                let body = Box::new(self.statement());
                self.cursor.expect_value("while");
                let test = self.paren_expression();
                self.semicolon();
                StmtKind::DoWhile { body, test }
            }
            "for" => self.for_statement(),
            "switch" => self.switch_statement(),
            "try" => self.try_statement(),
            "return" => {
                let value = self.optional_expression();
                self.semicolon();
                StmtKind::Return(value)
            }
            "throw" => {
                let value = self.optional_expression();
                self.semicolon();
                StmtKind::Throw(value)
            }
            "break" | "continue" => {
                let label = self
                    .cursor
                    .at_kind(TokenKind::Ident)
                    .then(|| self.cursor.consume().text.to_string());
                self.semicolon();
                if keyword.is("break") {
                    StmtKind::Break(label)
                } else {
                    StmtKind::Continue(label)
                }
            }
            "assert" => {
                let test = self.expression();
                let message = self
                    .cursor
                    .match_value(":")
                    .then(|| self.expression());
                self.semicolon();
                StmtKind::Assert { test, message }
            }
            _ => StmtKind::Invalid,
        }
    }

    fn for_statement(&mut self) -> StmtKind {
        self.scopes.push();
        self.cursor.expect_value("(");
        let mut init = Vec::new();
        if !self.cursor.match_value(";") {
            let start = self.cursor.index();
            let mods = self.statement_modifiers();
            let first = if mods.is_empty() {
                self.expression_or_declaration()
            } else {
                StmtKind::LocalVars(self.declaration_with_modifiers(&mods))
            };

            if self.cursor.match_value(":") {
                return self.for_each(first);
            }

            let is_expr = matches!(first, StmtKind::Expr(_));
            init.push(self.stmt_from(start, first));
            while is_expr && self.cursor.match_value(",") {
                let start = self.cursor.index();
                let expr = self.expression();
                init.push(self.stmt_from(start, StmtKind::Expr(expr)));
            }
            self.semicolon();
        }
        let test = if self.cursor.match_value(";") {
            None
        } else {
            let test = self.expression();
            self.semicolon();
            Some(test)
        };
        let mut update = Vec::new();
        if !self.cursor.at(")") {
            loop {
                update.push(self.expression());
                if !self.cursor.match_value(",") {
                    break;
                }
            }
        }
        self.cursor.expect_value(")");
        let body = Box::new(self.statement());
        let locals = self.scopes.pop();
        StmtKind::For {
            init,
            test,
            update,
            body,
            locals,
        }
    }

    /// The rest of `for (T x : iterable) body`, after the `:`.
    fn for_each(&mut self, header: StmtKind) -> StmtKind {
        let iterable = self.expression();
        self.cursor.expect_value(")");
        let mut var = match header {
            StmtKind::LocalVars(mut locals) if !locals.is_empty() => Some(locals.remove(0)),
            _ => None,
        };
        if let Some(var) = &mut var {
            if var.ty.source == "var" && var.ty.ty.is_unknown() {
                let element = self.element_type(&value_type(&iterable));
                var.ty.ty = element.clone();
                self.scopes.set_local_type(var.id, element);
            }
        }
        let body = Box::new(self.statement());
        self.scopes.pop();
        StmtKind::ForEach {
            var,
            iterable,
            body,
        }
    }

    /// Element type when iterating over a value of type `ty`.
    fn element_type(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Array(element) => (**element).clone(),
            Type::Class(id) => {
                let iterable = self.store.class_id("java/lang/Iterable");
                self.store
                    .inheritance_list(*id)
                    .into_iter()
                    .find(|t| Some(self.store.generic_base(*t)) == iterable)
                    .and_then(|t| self.store.type_args(t).first().cloned())
                    .or_else(|| self.store.object().map(Type::Class))
                    .unwrap_or_else(|| Type::unknown("var"))
            }
            _ => Type::unknown("var"),
        }
    }

    fn switch_statement(&mut self) -> StmtKind {
        let test = self.paren_expression();
        let enum_type = value_type(&test).class_id().filter(|id| {
            self.store
                .class(self.store.generic_base(*id))
                .is_some_and(|def| def.kind == ClassKind::Enum)
        });
        self.cursor.expect_value("{");
        self.scopes.push();
        let mut cases = Vec::new();
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            if self.cursor.at("case") || self.cursor.at("default") {
                cases.push(self.switch_case(enum_type));
            } else {
                self.cursor
                    .error_here("expected-token", "case statement expected");
                cases.push(SwitchCase {
                    labels: Vec::new(),
                    stmts: self.case_statements(),
                });
            }
        }
        self.cursor.expect_value("}");
        let locals = self.scopes.pop();
        StmtKind::Switch {
            test,
            cases,
            locals,
        }
    }

    fn switch_case(&mut self, enum_type: Option<TypeId>) -> SwitchCase {
        let mut labels = Vec::new();
        loop {
            if self.cursor.match_value("default") {
                labels.push(CaseLabel::Default);
            } else if self.cursor.match_value("case") {
                let label = match enum_type {
                    Some(owner) if self.at_enum_label(owner) => self.enum_label(owner),
                    _ => self.expression(),
                };
                labels.push(CaseLabel::Expr(label));
            } else {
                break;
            }
            self.cursor.expect_value(":");
        }
        SwitchCase {
            labels,
            stmts: self.case_statements(),
        }
    }

    fn at_enum_label(&self, owner: TypeId) -> bool {
        let token = self.cursor.current();
        token.kind == TokenKind::Ident
            && self.cursor.peek(1).is(":")
            && self
                .store
                .enum_constants(owner)
                .iter()
                .any(|c| c == token.text.as_str())
    }

    /// A bare enum constant name in a `case` label.
    fn enum_label(&mut self, owner: TypeId) -> ResolvedIdent {
        let idx = self.cursor.index();
        let name = self.cursor.consume().text.to_string();
        let base = self.store.generic_base(owner);
        let target = format!("{}#{name}", self.store.signature(base));
        self.bind(idx, LocKind::EnumConstant, target);
        let mut label = self
            .fragment(Self::token_span(idx))
            .with_expr(Expr::Ident { name: name.clone(), token: idx });
        label.variables.push(VarBinding::EnumConstant { owner: base, name });
        label
    }

    fn case_statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.cursor.is_eof()
            && !self.cursor.at("case")
            && !self.cursor.at("default")
            && !self.cursor.at("}")
        {
            stmts.push(self.statement());
        }
        stmts
    }

    fn try_statement(&mut self) -> StmtKind {
        self.scopes.push();
        let mut resources = Vec::new();
        if self.cursor.match_value("(") {
            while !self.cursor.is_eof() && !self.cursor.at(")") {
                let start = self.cursor.index();
                let mods = self.statement_modifiers();
                let kind = if mods.is_empty() {
                    self.expression_or_declaration()
                } else {
                    StmtKind::LocalVars(self.declaration_with_modifiers(&mods))
                };
                resources.push(self.stmt_from(start, kind));
                if !self.cursor.match_value(";") {
                    break;
                }
            }
            self.cursor.expect_value(")");
        }
        let block = self.block();
        let mut catches = Vec::new();
        while self.cursor.match_value("catch") {
            catches.push(self.catch_clause());
        }
        let finally = self
            .cursor
            .match_value("finally")
            .then(|| self.block());
        if catches.is_empty() && finally.is_none() && resources.is_empty() {
            self.cursor
                .error_here("expected-token", "`catch` or `finally` expected");
        }
        let locals = self.scopes.pop();
        StmtKind::Try {
            resources,
            block,
            catches,
            finally,
            locals,
        }
    }

    fn catch_clause(&mut self) -> CatchClause {
        self.cursor.expect_value("(");
        let mods = self.statement_modifiers();
        let mut types = vec![self.catch_type()];
        while self.cursor.match_value("|") {
            types.push(self.catch_type());
        }
        let name = if self.cursor.at_kind(TokenKind::Ident) {
            let idx = self.cursor.index();
            Some((idx, self.cursor.consume()))
        } else {
            self.cursor
                .error_here("expected-token", "Variable identifier expected");
            None
        };
        self.cursor.expect_value(")");

        self.scopes.push();
        let var = name.map(|(idx, token)| {
            self.bind(idx, LocKind::Declaration, token.text.to_string());
            let local = Local {
                id: self.new_local_id(),
                modifiers: mods.keywords.clone(),
                name: token.text.to_string(),
                name_range: token.range,
                name_token: Some(idx),
                ty: types[0].clone(),
                extra_dims: 0,
                init: None,
            };
            self.scopes.declare(local.clone());
            local
        });
        let block = self.block();
        self.scopes.pop();
        CatchClause {
            modifiers: mods.keywords,
            types,
            var,
            block,
        }
    }

    fn catch_type(&mut self) -> TypeRef {
        if self.cursor.at_kind(TokenKind::Ident) {
            return self.type_ref(true);
        }
        self.cursor
            .error_here("expected-token", "Missing or invalid type");
        TypeRef::new("", Type::unknown(""), self.cursor.error_range())
    }
}

#[cfg(test)]
mod tests {
    use kopi_core::{LocKind, SourceDocument};
    use kopi_hir::{Block, Member, StmtKind};
    use kopi_types::TypeStore;
    use pretty_assertions::assert_eq;

    use crate::{parse_document, ParseOptions, ParsedUnit};

    fn parse_method(body: &str) -> (TypeStore, ParsedUnit) {
        let mut store = TypeStore::with_minimal_jdk();
        let text = format!("import java.util.*;\nclass A {{ int field; void m(int p) {{ {body} }} }}");
        let unit = parse_document(&SourceDocument::new("A.java", text, 1), &mut store, &ParseOptions::default());
        (store, unit)
    }

    fn body(unit: &ParsedUnit) -> &Block {
        let Member::Method(m) = &unit.unit.types[0].members[1] else {
            panic!("expected method");
        };
        m.body.as_ref().and_then(|b| b.parsed.as_ref()).expect("parsed body")
    }

    fn messages(unit: &ParsedUnit) -> Vec<&str> {
        unit.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn locals_shadow_fields_and_go_out_of_scope() {
        let (_, unit) = parse_method("{ int field = 1; field++; } field = p;");
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let locs: Vec<(String, LocKind)> = unit
            .tokens
            .iter()
            .filter(|t| t.is("field"))
            .filter_map(|t| t.loc.as_ref().map(|l| (l.target.clone(), l.kind)))
            .collect();
        assert_eq!(
            locs,
            vec![
                ("A#field".to_string(), LocKind::Declaration),
                ("field".to_string(), LocKind::Declaration),
                ("field".to_string(), LocKind::Local),
                ("A#field".to_string(), LocKind::Field),
            ]
        );
    }

    #[test]
    fn statement_forms() {
        let (_, unit) = parse_method(
            "label: for (int i = 0, j = 1; i < 10; i++, j--) { if (i == j) break label; else continue; }\n\
             while (p > 0) p--;\n\
             do { p++; } while (p < 3);\n\
             switch (p) { case 1: case 2: p = 0; break; default: return; }\n\
             try { throw new RuntimeException(\"x\"); } catch (IllegalStateException | IllegalArgumentException e) { e.getMessage(); } finally { }\n\
             synchronized (this) { }\n\
             assert p > 0 : \"positive\";\n\
             ;",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let kinds: Vec<&str> = body(&unit)
            .stmts
            .iter()
            .map(|s| match s.kind {
                StmtKind::For { .. } => "for",
                StmtKind::While { .. } => "while",
                StmtKind::DoWhile { .. } => "do",
                StmtKind::Switch { .. } => "switch",
                StmtKind::Try { .. } => "try",
                StmtKind::Synchronized { .. } => "synchronized",
                StmtKind::Assert { .. } => "assert",
                StmtKind::Empty => "empty",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["for", "while", "do", "switch", "try", "synchronized", "assert", "empty"]
        );
    }

    #[test]
    fn foreach_variable_types() {
        let (store, unit) = parse_method(
            "List<String> names = new ArrayList<>();\n\
             for (String n : names) { n.length(); }\n\
             for (var n : names) { n.isEmpty(); }\n\
             int[] xs = {1, 2};\n\
             for (var x : xs) { x++; }",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let loops: Vec<String> = body(&unit)
            .stmts
            .iter()
            .filter_map(|s| match &s.kind {
                StmtKind::ForEach { var: Some(var), .. } => Some(store.display(&var.ty.ty)),
                _ => None,
            })
            .collect();
        assert_eq!(loops, vec!["java.lang.String", "java.lang.String", "int"]);
    }

    #[test]
    fn catch_variable_is_scoped_to_its_block() {
        let (_, unit) = parse_method("try { } catch (RuntimeException e) { e.getMessage(); } e.getMessage();");
        assert_eq!(messages(&unit), vec!["Unresolved identifier: e"]);
    }

    #[test]
    fn foreach_variable_is_scoped_to_the_loop() {
        let (_, unit) = parse_method(
            "List<String> xs = new ArrayList<>();\n\
             for (String v : xs) { v.length(); }\n\
             v.length();",
        );
        assert_eq!(messages(&unit), vec!["Unresolved identifier: v"]);
    }

    #[test]
    fn a_parameter_shadows_a_field_of_the_same_name() {
        let mut store = TypeStore::with_minimal_jdk();
        let text = "class A { String x; int m(int x) { x++; return x + this.x.length(); } }";
        let unit = parse_document(&SourceDocument::new("A.java", text, 1), &mut store, &ParseOptions::default());
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let uses: Vec<(LocKind, String)> = unit
            .tokens
            .iter()
            .filter(|t| t.is("x"))
            .skip(2)
            .filter_map(|t| t.loc.as_ref().map(|l| (l.kind, l.target.clone())))
            .collect();
        assert_eq!(
            uses,
            vec![
                (LocKind::Local, "x".to_string()),
                (LocKind::Local, "x".to_string()),
                (LocKind::Field, "A#x".to_string()),
            ]
        );
    }

    #[test]
    fn enum_switch_labels_resolve_against_the_enum() {
        let mut store = TypeStore::with_minimal_jdk();
        let text = "enum Color { RED, GREEN }\n\
                    class A { int m(Color c) { switch (c) { case RED: return 1; case GREEN: return 2; } return 0; } }";
        let unit = parse_document(&SourceDocument::new("A.java", text, 1), &mut store, &ParseOptions::default());
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let red = unit
            .tokens
            .iter()
            .filter(|t| t.is("RED"))
            .nth(1)
            .and_then(|t| t.loc.clone())
            .expect("label bound");
        assert_eq!(red.kind, LocKind::EnumConstant);
        assert_eq!(red.target, "Color#RED");
    }

    #[test]
    fn unexpected_tokens_and_missing_semicolons() {
        let (_, unit) = parse_method("int x = 1\n x++; ) ;");
        assert_eq!(
            messages(&unit),
            vec!["Missing operator or semicolon", "Unexpected token: )"]
        );
    }

    #[test]
    fn local_class_sees_captured_locals() {
        let (store, unit) = parse_method(
            "final int base = 2;\n\
             class Local { int twice() { return base * 2; } }\n\
             new Local().twice();",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        assert!(store.class_id("A$1Local").is_some());
        let StmtKind::LocalType(decl) = &body(&unit).stmts[1].kind else {
            panic!("expected a local class");
        };
        assert!(decl.method("twice").is_some_and(|m| m.body.as_ref().is_some_and(|b| b.parsed.is_some())));
    }
}
