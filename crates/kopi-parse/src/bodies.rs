//! Body pass: parses the token spans the declaration pass deferred.
//!
//! Each member body runs behind [`Parser::guarded`], so a failure inside one
//! method leaves the rest of the document intact.

use kopi_core::{Diagnostic, TokenSpan};
use kopi_hir::{Block, CompilationUnit, Local, Member, ResolvedIdent, TypeDecl, TypeParamDecl};
use kopi_types::{ClassKind, Type, TypeId, TypeOrigin};

use crate::parser::Parser;

impl Parser<'_> {
    pub(crate) fn parse_bodies(&mut self, unit: &mut CompilationUnit) {
        for decl in &mut unit.types {
            self.type_bodies(decl);
        }
    }

    /// Fills in every deferred body of `decl`: field initializers, enum
    /// constants, initializers, constructors, methods, then nested types.
    pub(crate) fn type_bodies(&mut self, decl: &mut TypeDecl) {
        let saved = self.current_type.replace(decl.id);

        for member in &mut decl.members {
            let Member::Field(field) = member else {
                continue;
            };
            let Some(init) = &mut field.init else {
                continue;
            };
            let span = init.tokens;
            init.parsed = self.guarded(&field.name, field.name_range, |p| {
                p.field_initializer(span)
            });
        }

        for constant in &mut decl.enum_constants {
            if let Some(args) = &mut constant.args {
                let span = args.tokens;
                args.parsed = self.guarded(&constant.name, constant.name_range, |p| {
                    p.cursor.seek(span);
                    p.arguments()
                });
            }
            if let Some(body) = &mut constant.body {
                let span = body.tokens;
                let owner = decl.id;
                body.parsed = self.guarded(&constant.name, constant.name_range, |p| {
                    p.cursor.seek(span);
                    p.anonymous_class(&Type::Class(owner))
                });
            }
        }

        for member in &mut decl.members {
            let Member::Initializer(init) = member else {
                continue;
            };
            let span = init.body.tokens;
            init.body.parsed = self.guarded("<clinit>", init.range, |p| p.method_body(&[], &[], span));
        }

        for member in &mut decl.members {
            let (Member::Constructor(method) | Member::Method(method)) = member else {
                continue;
            };
            let Some(span) = method.body.as_ref().map(|b| b.tokens) else {
                continue;
            };
            let params = method.params.clone();
            let type_params = method.type_params.clone();
            let parsed = self.guarded(&method.name, method.name_range, |p| {
                p.method_body(&params, &type_params, span)
            });
            if let Some(body) = &mut method.body {
                body.parsed = parsed;
            }
        }

        for member in &mut decl.members {
            if let Member::Type(nested) = member {
                self.type_bodies(nested);
            }
        }

        self.current_type = saved;
    }

    fn field_initializer(&mut self, span: TokenSpan) -> ResolvedIdent {
        self.cursor.seek(span);
        let value = self.expression();
        if !self.cursor.is_eof() {
            let token = self.cursor.current().clone();
            self.report(Diagnostic::error(
                "unexpected-token",
                format!("Unexpected token: {}", token.text),
                token.range,
            ));
        }
        value
    }

    fn method_body(&mut self, params: &[Local], type_params: &[TypeParamDecl], span: TokenSpan) -> Block {
        self.type_vars
            .push(type_params.iter().map(|tp| tp.name.clone()).collect());
        self.scopes.push();
        for param in params {
            self.scopes.declare(param.clone());
        }
        self.cursor.seek(span);
        let block = self.block();
        self.scopes.pop();
        self.type_vars.pop();
        block
    }

    /// Parses the member bodies of a local or anonymous class in place.
    /// Locals of the enclosing body stay reachable as captured variables.
    pub(crate) fn nested_class_bodies(&mut self, decl: &mut TypeDecl) {
        let state = self.cursor.save();
        let barrier = self.scopes.raise_barrier();
        self.type_bodies(decl);
        self.scopes.restore_barrier(barrier);
        self.cursor.restore(state);
    }

    /// Declares and parses an anonymous class body at `{` extending or
    /// implementing `base`.
    pub(crate) fn anonymous_class(&mut self, base: &Type) -> TypeDecl {
        let start = self.cursor.index();
        let owner = self.current_type;
        let number = owner.map_or(1, |o| self.next_class_number(o));
        let prefix = owner.map_or_else(String::new, |o| self.store.signature(o).to_string());
        let package = self.package.clone();
        let id = self.store.intern_with_signature(
            format!("{prefix}${number}"),
            &package,
            owner,
            "",
            ClassKind::Class,
            TypeOrigin::Source {
                uri: self.uri.clone(),
            },
        );
        self.set_anonymous_supertype(id, base);

        let range = self.token_range(start);
        let mut decl = TypeDecl::new(id, ClassKind::Class, "", range);
        self.class_body(&mut decl);
        decl.range = self.cursor.range_of(self.span_from(start));
        self.nested_class_bodies(&mut decl);
        decl
    }

    fn set_anonymous_supertype(&mut self, id: TypeId, base: &Type) {
        let interface = base
            .class_id()
            .and_then(|b| self.store.class(b))
            .is_some_and(|def| def.kind.is_interface_like());
        let object = self.store.object().map(Type::Class);
        let Some(def) = self.store.class_mut(id) else {
            return;
        };
        if interface {
            def.super_class = object;
            def.interfaces = vec![base.clone()];
        } else {
            def.super_class = Some(base.clone());
            def.interfaces.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use kopi_core::SourceDocument;
    use kopi_hir::{Member, StmtKind};
    use kopi_types::TypeStore;
    use pretty_assertions::assert_eq;

    use crate::{parse_document, ParseOptions};

    #[test]
    fn every_deferred_body_is_parsed() {
        let mut store = TypeStore::with_minimal_jdk();
        let doc = SourceDocument::new(
            "A.java",
            "enum A { ONE(1) { int twice() { return 2; } }, TWO(2);\n\
               private final int n;\n\
               static int total = 0;\n\
               static { total = 3; }\n\
               A(int n) { this.n = n; }\n\
               int n() { return n; }\n\
             }",
            1,
        );
        let unit = parse_document(&doc, &mut store, &ParseOptions::default());
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let decl = &unit.unit.types[0];

        let one = &decl.enum_constants[0];
        assert_eq!(one.args.as_ref().and_then(|a| a.parsed.as_ref()).map(Vec::len), Some(1));
        let body = one.body.as_ref().and_then(|b| b.parsed.as_ref()).expect("anonymous body");
        assert_eq!(store.signature(body.id), "A$1");
        assert!(body.method("twice").is_some_and(|m| m.body.as_ref().is_some_and(|b| b.parsed.is_some())));

        for member in &decl.members {
            match member {
                Member::Field(f) => {
                    if let Some(init) = &f.init {
                        assert!(init.parsed.is_some());
                    }
                }
                Member::Method(m) | Member::Constructor(m) => {
                    let block = m.body.as_ref().and_then(|b| b.parsed.as_ref()).expect("body");
                    assert_eq!(block.stmts.len(), 1);
                }
                Member::Initializer(i) => {
                    let block = i.body.parsed.as_ref().expect("initializer");
                    assert!(matches!(block.stmts[0].kind, StmtKind::Expr(_)));
                }
                Member::Type(_) => {}
            }
        }
    }

    #[test]
    fn leftover_tokens_in_field_initializer() {
        let mut store = TypeStore::with_minimal_jdk();
        let doc = SourceDocument::new("A.java", "class A { int x = 1 2; }", 1);
        let unit = parse_document(&doc, &mut store, &ParseOptions::default());
        let messages: Vec<&str> = unit.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Unexpected token: 2"]);
    }
}
