use std::collections::HashSet;

use kopi_core::{Diagnostic, LocKind};
use kopi_hir::{Expr, MethodBinding, ResolvedIdent, VarBinding};
use kopi_types::{class_signature, PrimitiveType, Type, TypeId, WildcardBound};

use crate::parser::Parser;

/// Types and package prefix a (partial) dotted name could denote.
#[derive(Debug, Default, Clone)]
pub(crate) struct TypeCandidates {
    pub(crate) types: Vec<Type>,
    pub(crate) package: Option<String>,
}

impl TypeCandidates {
    pub(crate) fn is_empty(&self) -> bool {
        self.types.is_empty() && self.package.is_none()
    }
}

/// Static type of a value fragment, or an unknown placeholder.
pub(crate) fn value_type(ident: &ResolvedIdent) -> Type {
    ident
        .variables
        .first()
        .map_or_else(|| Type::unknown("?"), VarBinding::ty)
}

/// A result carrying a single computed value.
pub(crate) fn set_value(ident: &mut ResolvedIdent, ty: Type) {
    ident.variables = vec![VarBinding::Value(ty)];
    ident.methods.clear();
    ident.types.clear();
    ident.package_name = None;
}

impl Parser<'_> {
    fn is_type_var(&self, name: &str) -> bool {
        if self
            .type_vars
            .iter()
            .rev()
            .any(|frame| frame.iter().any(|n| n == name))
        {
            return true;
        }
        self.type_chain().into_iter().any(|id| {
            self.store
                .class(id)
                .is_some_and(|def| def.type_params.iter().any(|tp| tp.name == name))
        })
    }

    /// Resolves a simple name to types and/or a package prefix.
    ///
    /// Order: type variables, local classes, member types of the enclosing
    /// types and their supertypes, single-type imports, the current package,
    /// on-demand imports, then package names.
    pub(crate) fn resolve_type_or_package(
        &mut self,
        name: &str,
        token: Option<usize>,
    ) -> TypeCandidates {
        let mut out = TypeCandidates::default();
        if self.is_type_var(name) {
            out.types.push(Type::TypeVar(name.to_string()));
            if let Some(token) = token {
                self.bind(token, LocKind::TypeVariable, name);
            }
            return out;
        }

        let found = self
            .scopes
            .find_type(name)
            .or_else(|| self.member_type(name))
            .or_else(|| self.imports.resolve_single(self.store, name))
            .or_else(|| {
                self.store
                    .class_id(&class_signature(&self.package, None, name))
            })
            .or_else(|| self.imports.resolve_on_demand(self.store, name));
        if let Some(id) = found {
            out.types.push(Type::Class(id));
        }
        if self.store.package_exists(name) {
            out.package = Some(name.to_string());
        }
        if let Some(token) = token {
            self.bind_type_candidates(token, &out);
        }
        out
    }

    /// A type nested in one of the enclosing types, or inherited by one.
    fn member_type(&mut self, name: &str) -> Option<TypeId> {
        for owner in self.type_chain() {
            for ty in self.store.inheritance_list(owner) {
                if let Some(id) = self.store.nested_type(ty, name) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Resolves the next dotted segment against what the previous segments found.
    pub(crate) fn resolve_next_type_or_package(
        &mut self,
        name: &str,
        prev: &TypeCandidates,
        token: Option<usize>,
    ) -> TypeCandidates {
        let mut out = TypeCandidates::default();
        for ty in &prev.types {
            let Some(owner) = ty.class_id() else {
                continue;
            };
            let nested = self
                .store
                .inheritance_list(owner)
                .into_iter()
                .find_map(|t| self.store.nested_type(t, name));
            if let Some(id) = nested {
                out.types.push(Type::Class(id));
            }
        }
        if let Some(package) = &prev.package {
            if let Some(id) = self.store.class_id(&class_signature(package, None, name)) {
                out.types.push(Type::Class(id));
            }
            let qualified = format!("{package}.{name}");
            if self.store.package_exists(&qualified) {
                out.package = Some(qualified);
            }
        }
        if let Some(token) = token {
            self.bind_type_candidates(token, &out);
        }
        out
    }

    fn bind_type_candidates(&mut self, token: usize, found: &TypeCandidates) {
        match (found.types.first(), &found.package) {
            (Some(Type::Class(id)), _) => {
                let target = self.store.signature(*id).to_string();
                self.bind(token, LocKind::Type, target);
            }
            (Some(Type::TypeVar(name)), _) => {
                let target = name.clone();
                self.bind(token, LocKind::TypeVariable, target);
            }
            (_, Some(package)) => {
                let target = package.clone();
                self.bind(token, LocKind::PackageName, target);
            }
            _ => {}
        }
    }

    /// Resolves a bare identifier in expression position.
    ///
    /// A local shadows every other value or method. Otherwise members of the
    /// enclosing types (and their supertypes) are collected, then captured
    /// locals and static imports, then types and packages. Static imports are
    /// kept as later candidates even when a member was found.
    pub(crate) fn find_identifier(&mut self, name: &str, token: usize) -> ResolvedIdent {
        let mut ident = self
            .fragment(Self::token_span(token))
            .with_expr(Expr::Ident {
                name: name.to_string(),
                token,
            });

        if let Some(local) = self.scopes.find_local(name) {
            ident.variables.push(VarBinding::Local {
                id: local.id,
                name: local.name.clone(),
                ty: local.declared_type(),
            });
            self.bind(token, LocKind::Local, name);
            return ident;
        }

        let chain = self.type_chain();
        self.collect_members(&chain, name, &mut ident);
        if ident.variables.is_empty() {
            if let Some(local) = self.scopes.find_captured(name) {
                ident.variables.push(VarBinding::Local {
                    id: local.id,
                    name: local.name.clone(),
                    ty: local.declared_type(),
                });
            }
        }

        let (variables, methods) = self.imports.static_members(self.store, name);
        ident.variables.extend(variables);
        ident.methods.extend(methods);

        let types = self.resolve_type_or_package(name, None);
        ident.types = types.types;
        ident.package_name = types.package;

        self.bind_ident(token, &ident);
        ident
    }

    /// Collects the first field or enum constant named `name` and every
    /// method of that name, across each owner's inheritance list.
    pub(crate) fn collect_members(
        &mut self,
        owners: &[TypeId],
        name: &str,
        out: &mut ResolvedIdent,
    ) {
        let mut seen_types = HashSet::new();
        let mut seen_methods: HashSet<String> = out
            .methods
            .iter()
            .filter_map(|m| match m {
                MethodBinding::Method { def, .. } => Some(self.store.method_signature(def)),
                MethodBinding::Any => None,
            })
            .collect();

        for &owner in owners {
            for ty in self.store.inheritance_list(owner) {
                if !seen_types.insert(ty) {
                    continue;
                }
                if out.variables.is_empty() {
                    if let Some(field) = self.store.fields(ty).into_iter().find(|f| f.name == name) {
                        out.variables.push(VarBinding::Field {
                            owner: ty,
                            name: field.name,
                            ty: field.ty,
                            is_static: field.is_static,
                        });
                    } else if self.store.enum_constants(ty).iter().any(|c| c == name) {
                        out.variables.push(VarBinding::EnumConstant {
                            owner: self.store.generic_base(ty),
                            name: name.to_string(),
                        });
                    }
                }
                for def in self.store.methods(ty) {
                    if def.name == name && seen_methods.insert(self.store.method_signature(&def)) {
                        out.methods.push(MethodBinding::Method { owner: ty, def });
                    }
                }
            }
        }
    }

    /// Resolves `.name` on `receiver` into `out`.
    pub(crate) fn resolve_member(
        &mut self,
        receiver: &ResolvedIdent,
        name: &str,
        token: usize,
        out: &mut ResolvedIdent,
    ) {
        if receiver.package_name.is_some() || !receiver.types.is_empty() {
            let prev = TypeCandidates {
                types: receiver.types.clone(),
                package: receiver.package_name.clone(),
            };
            let next = self.resolve_next_type_or_package(name, &prev, None);
            out.types = next.types;
            out.package_name = next.package;
        }

        let mut silent = false;
        if !receiver.variables.is_empty() {
            let ty = value_type(receiver);
            silent = self.collect_value_members(&ty, name, out);
        } else if !receiver.types.is_empty() {
            let owners: Vec<TypeId> = receiver.types.iter().filter_map(Type::class_id).collect();
            silent = receiver
                .types
                .iter()
                .any(|t| matches!(t, Type::Unknown(_) | Type::TypeVar(_)));
            self.collect_members(&owners, name, out);
        } else if receiver.methods.iter().any(|m| matches!(m, MethodBinding::Any)) {
            silent = true;
        }

        if out.is_empty() {
            out.variables.push(VarBinding::Any);
            out.methods.push(MethodBinding::Any);
            if !silent {
                if receiver.variables.is_empty() && receiver.types.is_empty() {
                    out.types.push(Type::unknown(out.source.clone()));
                    let range = out.range;
                    self.report(Diagnostic::error(
                        "unresolved-identifier",
                        format!("Unresolved identifier: {}", out.source),
                        range,
                    ));
                } else {
                    let range = self.token_range(token);
                    self.report(Diagnostic::error(
                        "unresolved-member",
                        format!("Unresolved member: {name}"),
                        range,
                    ));
                }
            }
        }
        self.bind_ident(token, out);
    }

    /// Member lookup on a value of type `ty`. Returns true when the type is
    /// too vague for a missing member to be an error.
    fn collect_value_members(&mut self, ty: &Type, name: &str, out: &mut ResolvedIdent) -> bool {
        match ty {
            Type::Class(id) => {
                self.collect_members(&[*id], name, out);
                false
            }
            Type::Array(_) => {
                if name == "length" {
                    out.variables.push(VarBinding::Value(Type::Primitive(PrimitiveType::Int)));
                } else if let Some(object) = self.store.object() {
                    self.collect_members(&[object], name, out);
                }
                false
            }
            Type::Wildcard(WildcardBound::Extends(bound)) => {
                let bound = (**bound).clone();
                self.collect_value_members(&bound, name, out);
                true
            }
            Type::TypeVar(_) | Type::Wildcard(_) => {
                if let Some(object) = self.store.object() {
                    self.collect_members(&[object], name, out);
                }
                true
            }
            Type::Unknown(_) | Type::Null => true,
            Type::Primitive(_) | Type::Void => false,
        }
    }

    /// Reports an unresolved identifier and fills in the wildcard placeholders.
    pub(crate) fn check_identifier_found(&mut self, ident: &mut ResolvedIdent) {
        if !ident.is_empty() {
            return;
        }
        self.report(Diagnostic::error(
            "unresolved-identifier",
            format!("Unresolved identifier: {}", ident.source),
            ident.range,
        ));
        ident.variables.push(VarBinding::Any);
        ident.methods.push(MethodBinding::Any);
        ident.types.push(Type::unknown(ident.source.clone()));
    }

    fn bind_ident(&mut self, token: usize, ident: &ResolvedIdent) {
        if let Some(var) = ident.variables.first() {
            match var {
                VarBinding::Local { name, .. } => {
                    let target = name.clone();
                    self.bind(token, LocKind::Local, target);
                }
                VarBinding::Field { owner, name, .. } => {
                    let target = format!("{}#{}", self.store.signature(*owner), name);
                    self.bind(token, LocKind::Field, target);
                }
                VarBinding::EnumConstant { owner, name } => {
                    let target = format!("{}#{}", self.store.signature(*owner), name);
                    self.bind(token, LocKind::EnumConstant, target);
                }
                VarBinding::Value(_) | VarBinding::Any => {}
            }
            return;
        }
        if let Some(MethodBinding::Method { owner, def }) = ident.methods.first() {
            let target = format!("{}#{}", self.store.signature(*owner), def.name);
            self.bind(token, LocKind::Method, target);
            return;
        }
        let found = TypeCandidates {
            types: ident.types.clone(),
            package: ident.package_name.clone(),
        };
        self.bind_type_candidates(token, &found);
    }

    /// Return type of the first candidate accepting `arg_count` arguments,
    /// falling back to the first candidate.
    pub(crate) fn call_type(&self, callee: &ResolvedIdent, arg_count: usize) -> Option<Type> {
        let defs: Vec<_> = callee
            .methods
            .iter()
            .filter_map(|m| match m {
                MethodBinding::Method { def, .. } => Some(def),
                MethodBinding::Any => None,
            })
            .collect();
        let arity_match = defs.iter().find(|def| {
            def.params.len() == arg_count || (def.is_varargs && arg_count + 1 >= def.params.len())
        });
        arity_match
            .or(defs.first())
            .map(|def| def.return_type.clone())
    }

    /// `java.lang.Class<T>` for a `.class` literal on `ty`.
    pub(crate) fn class_literal_type(&mut self, ty: &Type) -> Type {
        let Some(class) = self.store.class_id("java/lang/Class") else {
            return Type::unknown("Class");
        };
        let arg = match ty {
            Type::Primitive(p) => self.store.boxed(*p).map(Type::Class),
            Type::Void => self.store.class_id("java/lang/Void").map(Type::Class),
            other => Some(other.clone()),
        };
        match arg {
            Some(arg) => Type::Class(self.store.specialize(class, vec![arg])),
            None => Type::Class(class),
        }
    }

    pub(crate) fn unboxed(&self, ty: &Type) -> Option<PrimitiveType> {
        match ty {
            Type::Primitive(p) => Some(*p),
            Type::Class(id) => {
                let signature = self.store.signature(self.store.generic_base(*id));
                [
                    PrimitiveType::Boolean,
                    PrimitiveType::Byte,
                    PrimitiveType::Char,
                    PrimitiveType::Short,
                    PrimitiveType::Int,
                    PrimitiveType::Long,
                    PrimitiveType::Float,
                    PrimitiveType::Double,
                ]
                .into_iter()
                .find(|p| p.boxed_signature() == signature)
            }
            _ => None,
        }
    }

    fn is_string(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(id) if Some(*id) == self.store.string())
    }

    /// Binary numeric promotion; `None` when either side isn't numeric.
    pub(crate) fn promoted(&self, lhs: &Type, rhs: Option<&Type>) -> Option<Type> {
        let rank = |p: PrimitiveType| match p {
            PrimitiveType::Double => 4,
            PrimitiveType::Float => 3,
            PrimitiveType::Long => 2,
            PrimitiveType::Boolean => 0,
            _ => 1,
        };
        let lhs = self.unboxed(lhs)?;
        let widest = match rhs {
            Some(rhs) => {
                let rhs = self.unboxed(rhs)?;
                if rank(rhs) > rank(lhs) {
                    rhs
                } else {
                    lhs
                }
            }
            None => lhs,
        };
        Some(Type::Primitive(match rank(widest) {
            0 => return None,
            1 => PrimitiveType::Int,
            2 => PrimitiveType::Long,
            3 => PrimitiveType::Float,
            _ => PrimitiveType::Double,
        }))
    }

    /// Result type of `lhs op rhs`.
    pub(crate) fn binary_type(&self, op: &str, lhs: &Type, rhs: &Type) -> Type {
        let boolean = Type::Primitive(PrimitiveType::Boolean);
        match op {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "instanceof" => boolean,
            "+" if self.is_string(lhs) || self.is_string(rhs) => {
                self.store.string().map_or_else(|| Type::unknown("String"), Type::Class)
            }
            "<<" | ">>" | ">>>" => self
                .promoted(lhs, None)
                .unwrap_or_else(|| Type::unknown(op)),
            "&" | "|" | "^"
                if self.unboxed(lhs) == Some(PrimitiveType::Boolean)
                    && self.unboxed(rhs) == Some(PrimitiveType::Boolean) =>
            {
                boolean
            }
            _ => self
                .promoted(lhs, Some(rhs))
                .unwrap_or_else(|| Type::unknown(op)),
        }
    }
}
