use kopi_core::{Diagnostic, TokenKind};
use kopi_hir::TypeRef;
use kopi_types::{PrimitiveType, Type, WildcardBound};

use crate::parser::Parser;

impl Parser<'_> {
    /// Parses a type as written in a declaration. With `arrays`, trailing
    /// `[]` pairs are part of the type.
    pub(crate) fn type_ref(&mut self, arrays: bool) -> TypeRef {
        let start = self.cursor.index();
        let mut ty = self.type_ident();
        if arrays {
            let mut dims = 0;
            while self.cursor.at("[") && self.cursor.peek(1).is("]") {
                self.cursor.advance();
                self.cursor.advance();
                dims += 1;
            }
            ty = ty.array_of(dims);
        }
        let span = self.span_from(start);
        TypeRef::new(self.cursor.text_of(span), ty, self.cursor.range_of(span))
    }

    pub(crate) fn type_ref_list(&mut self) -> Vec<TypeRef> {
        let mut list = Vec::new();
        loop {
            list.push(self.type_ref(true));
            if !self.cursor.match_value(",") {
                break;
            }
        }
        list
    }

    fn type_ident(&mut self) -> Type {
        let start = self.cursor.index();
        let token = self.cursor.current().clone();
        match token.kind {
            TokenKind::PrimitiveType => {
                self.cursor.advance();
                return PrimitiveType::from_name(&token.text).map_or(Type::Void, Type::Primitive);
            }
            TokenKind::TernaryOperator => {
                self.cursor.advance();
                return self.wildcard();
            }
            TokenKind::Ident => self.cursor.advance(),
            _ => {
                self.cursor.error_here("expected-token", "Type expected");
                return Type::unknown("");
            }
        }

        let mut found = self.resolve_type_or_package(&token.text, Some(start));
        let mut source = token.text.to_string();
        let mut ty = found.types.first().cloned();
        loop {
            if self.cursor.at(".") && self.cursor.peek(1).kind == TokenKind::Ident {
                self.cursor.advance();
                let idx = self.cursor.index();
                let name = self.cursor.consume();
                source.push('.');
                source.push_str(&name.text);
                found = self.resolve_next_type_or_package(&name.text, &found, Some(idx));
                ty = found.types.first().cloned();
            } else if self.cursor.at("<") {
                let args = self.type_args();
                ty = ty.map(|t| self.apply_type_args(t, args.as_deref()));
                found.types = ty.iter().cloned().collect();
                found.package = None;
            } else {
                break;
            }
        }

        ty.unwrap_or_else(|| {
            let range = self.cursor.range_of(self.span_from(start));
            self.report(Diagnostic::error(
                "unresolved-type",
                format!("Unresolved type: {source}"),
                range,
            ));
            Type::unknown(source)
        })
    }

    /// `? extends T`, `? super T` or `?`, after the `?`.
    fn wildcard(&mut self) -> Type {
        if self.cursor.match_value("extends") {
            let bound = self.type_ref(true).ty;
            Type::Wildcard(WildcardBound::Extends(Box::new(bound)))
        } else if self.cursor.match_value("super") {
            let bound = self.type_ref(true).ty;
            Type::Wildcard(WildcardBound::Super(Box::new(bound)))
        } else {
            Type::Wildcard(WildcardBound::Unbounded)
        }
    }

    /// `<A, B>` at the cursor. `None` for the diamond `<>`.
    pub(crate) fn type_args(&mut self) -> Option<Vec<TypeRef>> {
        self.cursor.advance();
        if self.cursor.match_value(">") {
            return None;
        }
        let args = self.type_ref_list();
        self.cursor.expect_value(">");
        Some(args)
    }

    /// Specializes a class type; other types ignore arguments.
    pub(crate) fn apply_type_args(&mut self, ty: Type, args: Option<&[TypeRef]>) -> Type {
        let Some(id) = ty.class_id() else {
            return ty;
        };
        match args {
            None => Type::Class(self.store.infer_type_args(id)),
            Some(args) => {
                let args = args.iter().map(|a| a.ty.clone()).collect();
                Type::Class(self.store.specialize(id, args))
            }
        }
    }

    /// Whether the `<` at the cursor opens a balanced type argument list
    /// followed by something only a type can precede.
    pub(crate) fn looks_like_type_args(&self) -> bool {
        let mut depth = 0usize;
        for n in 0..64 {
            let token = self.cursor.peek(n);
            match token.text.as_str() {
                "<" => depth += 1,
                ">" => {
                    depth -= 1;
                    if depth == 0 {
                        let next = self.cursor.peek(n + 1);
                        return next.kind == TokenKind::Ident
                            || next.is("::")
                            || next.is("(")
                            || next.is(")");
                    }
                }
                "," | "." | "?" | "[" | "]" | "&" | "extends" | "super" => {}
                _ if matches!(token.kind, TokenKind::Ident | TokenKind::PrimitiveType) => {}
                _ => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use kopi_core::SourceDocument;
    use kopi_hir::{Member, TypeDecl};
    use kopi_types::TypeStore;
    use pretty_assertions::assert_eq;

    use crate::{parse_document, ParseOptions};

    fn parse(text: &str) -> (TypeStore, crate::ParsedUnit) {
        let mut store = TypeStore::with_minimal_jdk();
        let doc = SourceDocument::new("T.java", text, 1);
        let unit = parse_document(&doc, &mut store, &ParseOptions::default());
        (store, unit)
    }

    fn field_type(store: &TypeStore, decl: &TypeDecl, name: &str) -> String {
        let field = decl.field(name).expect("field");
        store.display(&field.ty.ty)
    }

    #[test]
    fn generic_and_array_field_types() {
        let (store, unit) = parse(
            "import java.util.*;\n\
             class T { List<String> names; Map<String, List<Integer>> index; int[][] grid; List<? extends Number> nums; }",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let decl = &unit.unit.types[0];
        assert_eq!(field_type(&store, decl, "names"), "java.util.List<java.lang.String>");
        assert_eq!(
            field_type(&store, decl, "index"),
            "java.util.Map<java.lang.String, java.util.List<java.lang.Integer>>"
        );
        assert_eq!(field_type(&store, decl, "grid"), "int[][]");
        assert_eq!(
            field_type(&store, decl, "nums"),
            "java.util.List<? extends java.lang.Number>"
        );
    }

    #[test]
    fn unresolved_type_is_reported_once() {
        let (_, unit) = parse("class T { com.missing.Thing value; }");
        let messages: Vec<&str> = unit.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Unresolved type: com.missing.Thing"]);
        let Member::Field(field) = &unit.unit.types[0].members[0] else {
            panic!("expected a field");
        };
        assert!(field.ty.ty.is_unknown());
    }
}
