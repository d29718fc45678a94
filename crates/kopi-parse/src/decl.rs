//! Declaration pass: package, imports, types and their members.
//!
//! Member signatures are registered in the [`TypeStore`](kopi_types::TypeStore)
//! as they are read. Method bodies, initializers, field initializers and enum
//! constant arguments/bodies are only skipped here and recorded as token
//! spans; [`crate::bodies`] parses them once every document is declared.

use kopi_core::{Diagnostic, LocKind, TextRange, TokenKind, TokenSpan};
use kopi_hir::{
    Annotation, CompilationUnit, Deferred, EnumConstantDecl, FieldDecl, ImportDecl,
    InitializerDecl, Local, Member, MethodDecl, PackageDecl, ResolvedIdent, TypeDecl,
    TypeParamDecl, TypeRef,
};
use kopi_types::{ClassKind, FieldDef, MethodDef, ParamDef, Type, TypeId, TypeOrigin, TypeParamDef};

use crate::parser::{Modifiers, Parser};

/// Where a type declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nesting {
    TopLevel,
    Member,
    /// Declared inside a method body or initializer.
    Local,
}

impl Parser<'_> {
    pub(crate) fn parse_unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit::new(self.uri.clone());
        let mut seen_type = false;
        while !self.cursor.is_eof() {
            if self.cursor.match_value(";") {
                continue;
            }
            let mods = self.modifiers();
            if self.cursor.at("package") {
                let decl = self.package_declaration();
                if unit.package.is_some() {
                    self.report(Diagnostic::error(
                        "duplicate-package",
                        "Duplicate package declaration",
                        decl.range,
                    ));
                } else {
                    if seen_type || !unit.imports.is_empty() {
                        self.report(Diagnostic::error(
                            "misplaced-package",
                            "Package declaration must come first",
                            decl.range,
                        ));
                    }
                    self.package = decl.name.clone();
                    unit.package = Some(decl);
                }
                continue;
            }
            if self.cursor.at("import") {
                self.reject_modifiers(&mods);
                let decl = self.import_declaration();
                unit.imports.push(decl);
                continue;
            }
            if self.at_type_keyword() {
                seen_type = true;
                if let Some(decl) = self.type_declaration(mods, Nesting::TopLevel) {
                    unit.types.push(decl);
                }
                continue;
            }
            self.cursor
                .error_here("expected-token", "Type declaration expected");
            self.skip_to_declaration();
        }
        unit
    }

    pub(crate) fn at_type_keyword(&self) -> bool {
        self.cursor.at_kind(TokenKind::TypeKeyword)
            || (self.cursor.at("@") && self.cursor.peek(1).is("interface"))
    }

    fn skip_to_declaration(&mut self) {
        if !self.cursor.is_eof() {
            self.cursor.advance();
        }
        while !self.cursor.is_eof() {
            let restart = matches!(
                self.cursor.kind(),
                TokenKind::TypeKeyword | TokenKind::Modifier
            ) || self.cursor.at("@")
                || self.cursor.at("package")
                || self.cursor.at("import")
                || self.cursor.at(";");
            if restart {
                break;
            }
            self.cursor.advance();
        }
    }

    fn package_declaration(&mut self) -> PackageDecl {
        let start = self.cursor.index();
        self.cursor.advance();
        let mut name = String::new();
        if self.cursor.at_kind(TokenKind::Ident) {
            loop {
                let idx = self.cursor.index();
                let segment = self.cursor.consume();
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(&segment.text);
                self.bind(idx, LocKind::PackageName, name.clone());
                if !(self.cursor.at(".") && self.cursor.peek(1).kind == TokenKind::Ident) {
                    break;
                }
                self.cursor.advance();
            }
        } else {
            self.cursor
                .error_here("expected-token", "Package identifier expected");
        }
        self.semicolon();
        self.store.add_package(&name);
        PackageDecl {
            name,
            range: self.cursor.range_of(self.span_from(start)),
        }
    }

    fn import_declaration(&mut self) -> ImportDecl {
        let start = self.cursor.index();
        self.cursor.advance();
        let is_static = self.cursor.match_value("static");
        let mut name = String::new();
        let mut segments = Vec::new();
        let mut wildcard = false;
        loop {
            if !self.cursor.at_kind(TokenKind::Ident) {
                self.cursor.error_here("expected-token", "Identifier expected");
                break;
            }
            let idx = self.cursor.index();
            let segment = self.cursor.consume();
            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(&segment.text);
            segments.push((idx, name.clone()));
            if !self.cursor.match_value(".") {
                break;
            }
            if self.cursor.match_value("*") {
                wildcard = true;
                break;
            }
        }
        self.semicolon();
        let range = self.cursor.range_of(self.span_from(start));

        let resolved = if name.is_empty() {
            Vec::new()
        } else {
            self.imports.add(self.store, is_static, &name, wildcard)
        };
        for (idx, prefix) in segments {
            self.bind(idx, LocKind::ImportName, prefix);
        }
        if resolved.is_empty() && !name.is_empty() {
            self.report(Diagnostic::warning(
                "unresolved-import",
                format!("Unresolved import: {name}"),
                range,
            ));
        }
        ImportDecl {
            is_static,
            name,
            wildcard,
            range,
            resolved,
        }
    }

    /// Parses a class, interface, enum or annotation type declaration at the
    /// type keyword. Returns `None` when the name is missing.
    pub(crate) fn type_declaration(&mut self, mods: Modifiers, nesting: Nesting) -> Option<TypeDecl> {
        let docs = mods.docs.clone();
        let start = self.cursor.index();
        let keyword = if self.cursor.match_value("@") {
            self.cursor.advance();
            "@interface".to_string()
        } else {
            self.cursor.consume().text.to_string()
        };
        let kind = ClassKind::from_keyword(&keyword).unwrap_or(ClassKind::Class);

        if !self.cursor.at_kind(TokenKind::Ident) {
            self.cursor
                .error_here("expected-token", "Type identifier expected");
            if self.cursor.at("{") {
                self.skip_braces();
            }
            return None;
        }
        let name_idx = self.cursor.index();
        let name_token = self.cursor.consume();
        let name = name_token.text.to_string();

        let id = self.register_type(&name, kind, nesting);
        if let Some(def) = self.store.class_mut(id) {
            def.modifiers = mods.keywords.clone();
            def.docs = docs.clone();
        }
        let signature = self.store.signature(id).to_string();
        self.bind(name_idx, LocKind::Declaration, signature);

        let mut decl = TypeDecl::new(id, kind, name, name_token.range);
        decl.modifiers = mods.keywords;
        decl.annotations = mods.annotations;
        decl.docs = docs;

        let saved_type = self.current_type.replace(id);
        if self.cursor.at("<") {
            self.type_vars.push(Vec::new());
            decl.type_params = self.type_param_list();
            self.type_vars.pop();
            let defs = type_param_defs(&decl.type_params);
            if let Some(def) = self.store.class_mut(id) {
                def.type_params = defs;
            }
        }
        if self.cursor.match_value("extends") {
            decl.extends = self.type_ref_list();
        }
        if self.cursor.match_value("implements") {
            decl.implements = self.type_ref_list();
        }
        self.set_supertypes(id, &decl);

        if self.cursor.expect_value("{") {
            if kind == ClassKind::Enum {
                decl.enum_constants = self.enum_constants(id);
            }
            self.type_body(&mut decl);
            self.cursor.expect_value("}");
        }
        decl.range = self.cursor.range_of(self.span_from(start));
        self.current_type = saved_type;
        Some(decl)
    }

    fn register_type(&mut self, name: &str, kind: ClassKind, nesting: Nesting) -> TypeId {
        let origin = TypeOrigin::Source {
            uri: self.uri.clone(),
        };
        let package = self.package.clone();
        match (nesting, self.current_type) {
            (Nesting::Local, Some(owner)) => {
                let number = self.next_class_number(owner);
                let signature = format!("{}${number}{name}", self.store.signature(owner));
                let id = self.store.intern_with_signature(
                    signature,
                    &package,
                    Some(owner),
                    name,
                    kind,
                    origin,
                );
                self.scopes.declare_type(name, id);
                id
            }
            (Nesting::TopLevel, _) | (_, None) => {
                self.store.intern_class(&package, None, name, kind, origin)
            }
            (Nesting::Member, owner) => self.store.intern_class(&package, owner, name, kind, origin),
        }
    }

    fn set_supertypes(&mut self, id: TypeId, decl: &TypeDecl) {
        let object = self.store.object().map(Type::Class);
        let refs = |list: &[TypeRef]| list.iter().map(|r| r.ty.clone()).collect::<Vec<_>>();
        let (super_class, interfaces) = match decl.kind {
            ClassKind::Class => (
                decl.extends.first().map(|r| r.ty.clone()).or(object),
                refs(&decl.implements),
            ),
            ClassKind::Interface => (None, refs(&decl.extends)),
            ClassKind::Enum => {
                let base = self
                    .store
                    .class_id("java/lang/Enum")
                    .map(|e| Type::Class(self.store.specialize(e, vec![Type::Class(id)])));
                (base.or(object), refs(&decl.implements))
            }
            ClassKind::Annotation => {
                let annotation = self
                    .store
                    .class_id("java/lang/annotation/Annotation")
                    .map(Type::Class);
                (None, annotation.into_iter().collect())
            }
        };
        if let Some(def) = self.store.class_mut(id) {
            def.super_class = super_class;
            def.interfaces = interfaces;
        }
    }

    fn enum_constants(&mut self, owner: TypeId) -> Vec<EnumConstantDecl> {
        let signature = self.store.signature(owner).to_string();
        let mut constants = Vec::new();
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            if self.cursor.match_value(";") {
                break;
            }
            let mods = self.modifiers();
            if !self.cursor.at_kind(TokenKind::Ident) {
                self.cursor.error_here("expected-token", "Identifier expected");
                while !self.cursor.is_eof()
                    && !self.cursor.at(",")
                    && !self.cursor.at(";")
                    && !self.cursor.at("}")
                {
                    self.cursor.advance();
                }
                self.cursor.match_value(",");
                continue;
            }
            let name_idx = self.cursor.index();
            let name_token = self.cursor.consume();
            let name = name_token.text.to_string();
            if let Some(def) = self.store.class_mut(owner) {
                def.enum_constants.push(name.clone());
            }
            self.bind(name_idx, LocKind::Declaration, format!("{signature}#{name}"));

            let args = self
                .cursor
                .at("(")
                .then(|| Deferred::new(self.skip_parens()));
            let body = self
                .cursor
                .at("{")
                .then(|| Deferred::new(self.skip_braces()));
            constants.push(EnumConstantDecl {
                docs: mods.docs,
                annotations: mods.annotations,
                name,
                name_range: name_token.range,
                args,
                body,
            });

            if self.cursor.match_value(",") || self.cursor.at(";") || self.cursor.at("}") {
                continue;
            }
            if self.cursor.at_kind(TokenKind::Ident) {
                self.cursor.error_here("expected-token", "Missing comma");
                continue;
            }
            self.cursor.error_here("expected-token", "`;` expected");
            break;
        }
        constants
    }

    fn type_body(&mut self, decl: &mut TypeDecl) {
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            if self.cursor.match_value(";") {
                continue;
            }
            let start = self.cursor.index();
            self.member_declaration(decl);
            if self.cursor.index() == start {
                let token = self.cursor.consume();
                self.report(Diagnostic::error(
                    "unexpected-token",
                    format!("Unexpected token: {}", token.text),
                    token.range,
                ));
            }
        }
    }

    /// Parses the members of an anonymous class body at `{`.
    pub(crate) fn class_body(&mut self, decl: &mut TypeDecl) {
        let saved = self.current_type.replace(decl.id);
        if self.cursor.expect_value("{") {
            self.type_body(decl);
            self.cursor.expect_value("}");
        }
        self.current_type = saved;
    }

    fn member_declaration(&mut self, decl: &mut TypeDecl) {
        let start = self.cursor.index();
        let mods = self.modifiers();
        let docs = mods.docs.clone();

        if self.cursor.at("{") {
            let body = self.skip_braces();
            decl.members.push(Member::Initializer(InitializerDecl {
                is_static: mods.has("static"),
                body: Deferred::new(body),
                range: self.cursor.range_of(self.span_from(start)),
            }));
            return;
        }
        if self.at_type_keyword() {
            if let Some(nested) = self.type_declaration(mods, Nesting::Member) {
                decl.members.push(Member::Type(nested));
            }
            return;
        }

        let frames = self.type_vars.len();
        let type_params = if self.cursor.at("<") {
            self.type_vars.push(Vec::new());
            self.type_param_list()
        } else {
            Vec::new()
        };

        let is_constructor = self.cursor.at_kind(TokenKind::Ident)
            && self.cursor.at(&decl.name)
            && self.cursor.peek(1).is("(");
        let return_type = (!is_constructor).then(|| self.type_ref(true));

        if !self.cursor.at_kind(TokenKind::Ident) {
            self.cursor.error_here("expected-token", "Identifier expected");
            self.type_vars.truncate(frames);
            self.skip_member();
            return;
        }
        let name_idx = self.cursor.index();
        let name_token = self.cursor.consume();
        let header = MemberHeader {
            mods,
            docs,
            type_params,
            return_type,
            name: name_token.text.to_string(),
            name_idx,
            name_range: name_token.range,
        };

        if self.cursor.at("(") {
            let method = self.method_declaration(decl, header);
            self.type_vars.truncate(frames);
            decl.members.push(if is_constructor {
                Member::Constructor(method)
            } else {
                Member::Method(method)
            });
            return;
        }

        self.type_vars.truncate(frames);
        if !header.type_params.is_empty() {
            let range = header.name_range;
            self.report(Diagnostic::error(
                "invalid-declaration",
                "Fields cannot declare type variables",
                range,
            ));
        }
        self.field_declarators(decl, header);
    }

    /// Recovery after a malformed member: skips to the next `;` or block.
    fn skip_member(&mut self) {
        while !self.cursor.is_eof() && !self.cursor.at("}") {
            if self.cursor.match_value(";") {
                return;
            }
            if self.cursor.at("{") {
                self.skip_braces();
                return;
            }
            self.cursor.advance();
        }
    }

    fn method_declaration(&mut self, decl: &TypeDecl, header: MemberHeader) -> MethodDecl {
        let MemberHeader {
            mods,
            docs,
            type_params,
            return_type,
            name,
            name_idx,
            name_range,
        } = header;
        let is_constructor = return_type.is_none();

        self.cursor.advance();
        let mut params = Vec::new();
        let mut is_varargs = false;
        while !self.cursor.is_eof() && !self.cursor.at(")") {
            if let Some((param, varargs)) = self.parameter() {
                params.push(param);
                is_varargs |= varargs;
            }
            if !self.cursor.match_value(",") {
                break;
            }
        }
        self.cursor.expect_value(")");

        let mut return_type = return_type;
        while self.cursor.at("[") && self.cursor.peek(1).is("]") {
            self.cursor.advance();
            self.cursor.advance();
            if let Some(ret) = &mut return_type {
                ret.ty = ret.ty.clone().array_of(1);
            }
        }
        let throws = if self.cursor.match_value("throws") {
            self.type_ref_list()
        } else {
            Vec::new()
        };
        if self.cursor.match_value("default") {
            self.skip_initializer();
        }
        let body = if self.cursor.match_value(";") {
            None
        } else if self.cursor.at("{") {
            Some(Deferred::new(self.skip_braces()))
        } else {
            self.cursor.error_here("expected-token", "`{` expected");
            None
        };

        let interface_like = decl.kind.is_interface_like();
        let def = MethodDef {
            name: if is_constructor {
                "<init>".to_string()
            } else {
                name.clone()
            },
            type_params: type_param_defs(&type_params),
            params: params
                .iter()
                .map(|p: &Local| ParamDef {
                    name: p.name.clone(),
                    ty: p.declared_type(),
                })
                .collect(),
            return_type: return_type.as_ref().map_or(Type::Void, |r| r.ty.clone()),
            is_static: mods.has("static"),
            is_varargs,
            is_abstract: mods.has("abstract")
                || (interface_like
                    && body.is_none()
                    && !mods.has("static")
                    && !mods.has("default")),
            modifiers: mods.keywords.clone(),
            docs: docs.clone(),
        };
        let target = format!("{}#{}", self.store.signature(decl.id), def.name);
        if let Some(class) = self.store.class_mut(decl.id) {
            if is_constructor {
                class.constructors.push(def);
            } else {
                class.methods.push(def);
            }
        }
        self.bind(name_idx, LocKind::Declaration, target);

        MethodDecl {
            modifiers: mods.keywords,
            annotations: mods.annotations,
            docs,
            type_params,
            return_type,
            name,
            name_range,
            params,
            is_varargs,
            throws,
            body,
        }
    }

    /// One formal parameter. Returns whether it was a varargs parameter.
    pub(crate) fn parameter(&mut self) -> Option<(Local, bool)> {
        let mods = self.statement_modifiers();
        let mut ty = self.type_ref(true);
        let varargs = self.cursor.match_value("...");
        if !self.cursor.at_kind(TokenKind::Ident) {
            self.cursor.error_here("expected-token", "Identifier expected");
            return None;
        }
        let name_idx = self.cursor.index();
        let name_token = self.cursor.consume();
        let extra_dims = self.extra_dims();
        if varargs {
            ty.ty = ty.ty.array_of(1);
        }
        self.bind(name_idx, LocKind::Declaration, name_token.text.to_string());
        let local = Local {
            id: self.new_local_id(),
            modifiers: mods.keywords,
            name: name_token.text.to_string(),
            name_range: name_token.range,
            name_token: Some(name_idx),
            ty,
            extra_dims,
            init: None,
        };
        Some((local, varargs))
    }

    /// `[]` pairs written after a declared name.
    pub(crate) fn extra_dims(&mut self) -> u32 {
        let mut dims = 0;
        while self.cursor.at("[") && self.cursor.peek(1).is("]") {
            self.cursor.advance();
            self.cursor.advance();
            dims += 1;
        }
        dims
    }

    fn field_declarators(&mut self, decl: &mut TypeDecl, header: MemberHeader) {
        let MemberHeader {
            mods,
            docs,
            return_type,
            mut name,
            mut name_idx,
            mut name_range,
            ..
        } = header;
        let ty = return_type.unwrap_or_else(|| TypeRef::new("", Type::unknown(""), name_range));
        let is_static = mods.has("static") || decl.kind.is_interface_like();
        let owner = self.store.signature(decl.id).to_string();
        loop {
            let extra_dims = self.extra_dims();
            let init = self
                .cursor
                .match_value("=")
                .then(|| Deferred::new(self.skip_initializer()));

            let field_type = ty.ty.clone().array_of(extra_dims);
            if let Some(class) = self.store.class_mut(decl.id) {
                class.fields.push(FieldDef {
                    name: name.clone(),
                    ty: field_type,
                    is_static,
                    modifiers: mods.keywords.clone(),
                    docs: docs.clone(),
                });
            }
            self.bind(name_idx, LocKind::Declaration, format!("{owner}#{name}"));
            decl.members.push(Member::Field(FieldDecl {
                modifiers: mods.keywords.clone(),
                annotations: mods.annotations.clone(),
                docs: docs.clone(),
                ty: ty.clone(),
                name,
                name_range,
                extra_dims,
                init,
            }));

            if !self.cursor.match_value(",") {
                break;
            }
            if !self.cursor.at_kind(TokenKind::Ident) {
                self.cursor.error_here("expected-token", "Identifier expected");
                break;
            }
            name_idx = self.cursor.index();
            let token = self.cursor.consume();
            name = token.text.to_string();
            name_range = token.range;
        }
        self.semicolon();
    }

    /// Skips a field initializer or annotation default up to the next
    /// top-level `,`, `;` or closing brace.
    fn skip_initializer(&mut self) -> TokenSpan {
        let start = self.cursor.index();
        let mut depth = 0usize;
        let mut angle = 0usize;
        let mut in_new = false;
        let mut after_dot = false;
        while !self.cursor.is_eof() {
            let token = self.cursor.current();
            let text = token.text.as_str();
            match text {
                "(" | "[" | "{" => {
                    depth += 1;
                    in_new = false;
                }
                ")" | "]" | "}" => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                "<" if in_new || after_dot => angle += 1,
                ">" if angle > 0 => angle -= 1,
                "," | ";" if depth == 0 && angle == 0 => break,
                _ => {}
            }
            if token.kind == TokenKind::NewOperator {
                in_new = true;
            }
            after_dot = text == ".";
            self.cursor.advance();
        }
        self.span_from(start)
    }

    /// Skips a `{ ... }` block, returning its span including the braces.
    pub(crate) fn skip_braces(&mut self) -> TokenSpan {
        self.skip_balanced("{", "}")
    }

    fn skip_parens(&mut self) -> TokenSpan {
        self.skip_balanced("(", ")")
    }

    fn skip_balanced(&mut self, open: &str, close: &str) -> TokenSpan {
        let start = self.cursor.index();
        let mut depth = 0usize;
        while !self.cursor.is_eof() {
            if self.cursor.at(open) {
                depth += 1;
            } else if self.cursor.at(close) {
                depth = depth.saturating_sub(1);
            }
            self.cursor.advance();
            if depth == 0 {
                break;
            }
        }
        self.span_from(start)
    }

    /// `@Name` or `@Name(args)`.
    pub(crate) fn annotation(&mut self) -> Option<Annotation> {
        let start = self.cursor.index();
        self.cursor.advance();
        if !self.cursor.at_kind(TokenKind::Ident) {
            self.cursor.error_here("expected-token", "Identifier expected");
            return None;
        }
        let ty = self.type_ref(false);
        let owner = ty.ty.class_id().map(|id| self.store.signature(id).to_string());
        let mut args = Vec::new();
        if self.cursor.match_value("(") {
            while !self.cursor.is_eof() && !self.cursor.at(")") {
                if self.cursor.at_kind(TokenKind::Ident) && self.cursor.peek(1).is("=") {
                    let idx = self.cursor.index();
                    let element = self.cursor.consume();
                    self.cursor.advance();
                    if let Some(owner) = &owner {
                        self.bind(idx, LocKind::Method, format!("{owner}#{}", element.text));
                    }
                }
                args.push(self.annotation_value());
                if !self.cursor.match_value(",") {
                    break;
                }
            }
            self.cursor.expect_value(")");
        }
        Some(Annotation {
            ty,
            args,
            range: self.cursor.range_of(self.span_from(start)),
        })
    }

    fn annotation_value(&mut self) -> ResolvedIdent {
        if !self.cursor.at("@") {
            return self.expression();
        }
        let start = self.cursor.index();
        let nested = self.annotation();
        let mut value = self.fragment(self.span_from(start));
        value.types.extend(nested.map(|a| a.ty.ty));
        value
    }

    /// `<A, B extends Bound & Other>` at the cursor. Each name is added to
    /// the innermost type variable frame as soon as it is declared.
    pub(crate) fn type_param_list(&mut self) -> Vec<TypeParamDecl> {
        self.cursor.advance();
        let mut params = Vec::new();
        loop {
            let declared = if self.cursor.at_kind(TokenKind::Ident) {
                let idx = self.cursor.index();
                let token = self.cursor.consume();
                let name = token.text.to_string();
                if let Some(frame) = self.type_vars.last_mut() {
                    frame.push(name.clone());
                }
                self.bind(idx, LocKind::Declaration, name.clone());
                Some((name, token.range))
            } else {
                self.cursor
                    .error_here("expected-token", "Type identifier expected");
                None
            };
            let mut bounds = Vec::new();
            if self.cursor.match_value("extends") || self.cursor.match_value("super") {
                bounds.push(self.type_ref(true));
                while self.cursor.match_value("&") {
                    bounds.push(self.type_ref(true));
                }
            }
            if let Some((name, name_range)) = declared {
                params.push(TypeParamDecl {
                    name,
                    name_range,
                    bounds,
                });
            }
            if self.cursor.match_value(",") {
                continue;
            }
            if self.cursor.at_kind(TokenKind::Ident) {
                self.cursor.error_here("expected-token", "Missing comma");
                continue;
            }
            self.cursor.expect_value(">");
            break;
        }
        params
    }
}

/// Everything read before a member's parameter list or declarators.
struct MemberHeader {
    mods: Modifiers,
    docs: Option<String>,
    type_params: Vec<TypeParamDecl>,
    /// `None` for constructors.
    return_type: Option<TypeRef>,
    name: String,
    name_idx: usize,
    name_range: TextRange,
}

fn type_param_defs(params: &[TypeParamDecl]) -> Vec<TypeParamDef> {
    params
        .iter()
        .map(|tp| TypeParamDef {
            name: tp.name.clone(),
            bounds: tp.bounds.iter().map(|b| b.ty.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use kopi_core::SourceDocument;
    use kopi_hir::Member;
    use kopi_types::{ClassKind, Type, TypeStore};
    use pretty_assertions::assert_eq;

    use crate::{parse_document, ParseOptions, ParsedUnit};

    fn declare(text: &str) -> (TypeStore, ParsedUnit) {
        let mut store = TypeStore::with_minimal_jdk();
        let opts = ParseOptions {
            parse_bodies: false,
            ..ParseOptions::default()
        };
        let unit = parse_document(&SourceDocument::new("A.java", text, 1), &mut store, &opts);
        (store, unit)
    }

    fn messages(unit: &ParsedUnit) -> Vec<&str> {
        unit.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn registers_members_in_the_store() {
        let (mut store, unit) = declare(
            "package p;\n\
             /** Docs. */\n\
             public class A<T> extends Thread implements Runnable {\n\
               private static final int COUNT = 1, LIMIT = 2;\n\
               T value;\n\
               public A(T value) { this.value = value; }\n\
               public <R> R map(java.util.function.Function<T, R> f) { return f.apply(value); }\n\
               abstract void run(String... args);\n\
             }",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let id = store.class_id("p/A").expect("registered");
        let def = store.class(id).expect("class").clone();
        assert_eq!(def.docs.as_deref(), Some("/** Docs. */"));
        assert_eq!(def.type_params.len(), 1);
        assert_eq!(def.constructors.len(), 1);
        let names: Vec<&str> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["COUNT", "LIMIT", "value"]);
        assert!(def.fields[0].is_static);
        assert_eq!(def.fields[2].ty, Type::TypeVar("T".to_string()));

        let methods = store.methods(id);
        let map = methods.iter().find(|m| m.name == "map").expect("map");
        assert_eq!(map.return_type, Type::TypeVar("R".to_string()));
        let run = methods.iter().find(|m| m.name == "run").expect("run");
        assert!(run.is_varargs);
        assert!(run.is_abstract);

        let supers: Vec<String> = store
            .inheritance_list(id)
            .into_iter()
            .map(|t| store.qualified_name(t))
            .collect();
        assert!(supers.contains(&"java.lang.Thread".to_string()));
        assert!(supers.contains(&"java.lang.Runnable".to_string()));
    }

    #[test]
    fn enum_constants_allow_trailing_comma() {
        let (store, unit) = declare("enum Color { RED, GREEN(1), BLUE { }, ; int x; }");
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let decl = &unit.unit.types[0];
        assert_eq!(decl.kind, ClassKind::Enum);
        let names: Vec<&str> = decl.enum_constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["RED", "GREEN", "BLUE"]);
        assert!(decl.enum_constants[1].args.is_some());
        assert!(decl.enum_constants[2].body.is_some());
        let id = store.class_id("Color").expect("enum");
        assert_eq!(store.enum_constants(id).len(), 3);
    }

    #[test]
    fn missing_comma_between_enum_constants() {
        let (_, unit) = declare("enum E { A B }");
        assert_eq!(messages(&unit), vec!["Missing comma"]);
        assert_eq!(unit.unit.types[0].enum_constants.len(), 2);
    }

    #[test]
    fn package_must_come_first_and_only_once() {
        let (_, unit) = declare("import java.util.List;\npackage a;\npackage b;\nclass A {}");
        assert_eq!(
            messages(&unit),
            vec![
                "Package declaration must come first",
                "Duplicate package declaration"
            ]
        );
        assert_eq!(unit.unit.package.as_ref().map(|p| p.name.as_str()), Some("a"));
    }

    #[test]
    fn stray_tokens_between_types_are_skipped() {
        let (_, unit) = declare("int x; class A {} ; class B {}");
        assert_eq!(messages(&unit), vec!["Type declaration expected"]);
        let names: Vec<&str> = unit.unit.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn unresolved_import_is_a_warning() {
        let (_, unit) = declare("import com.nowhere.Thing;\nclass A {}");
        assert_eq!(messages(&unit), vec!["Unresolved import: com.nowhere.Thing"]);
        assert!(!unit.has_errors());
    }

    #[test]
    fn fields_cannot_declare_type_variables() {
        let (_, unit) = declare("class A { <T> int x; }");
        assert_eq!(messages(&unit), vec!["Fields cannot declare type variables"]);
    }

    #[test]
    fn annotation_types_and_element_defaults() {
        let (store, unit) = declare(
            "@interface Marker { String value() default \"x\"; int[] ids() default {}; }\n\
             @Marker(value = \"y\") class A {}",
        );
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let marker = &unit.unit.types[0];
        assert_eq!(marker.kind, ClassKind::Annotation);
        assert_eq!(marker.methods().count(), 2);
        let a = &unit.unit.types[1];
        assert_eq!(a.annotations.len(), 1);
        assert_eq!(a.annotations[0].args.len(), 1);
        let id = store.class_id("Marker").expect("annotation");
        assert!(store.class(id).is_some_and(|d| d.kind == ClassKind::Annotation));
    }

    #[test]
    fn bodies_stay_deferred_without_body_pass() {
        let (_, unit) = declare("class A { int f = 1 + 2; void m() { x(); } static { } }");
        assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
        let decl = &unit.unit.types[0];
        for member in &decl.members {
            match member {
                Member::Field(f) => assert!(f.init.as_ref().is_some_and(|i| i.parsed.is_none())),
                Member::Method(m) => assert!(m.body.as_ref().is_some_and(|b| b.parsed.is_none())),
                Member::Initializer(i) => assert!(i.body.parsed.is_none()),
                _ => {}
            }
        }
    }
}
