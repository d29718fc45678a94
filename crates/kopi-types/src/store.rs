use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    ClassDef, ClassKind, FieldDef, GenericInstance, MethodDef, PrimitiveType, Type, TypeId,
    TypeOrigin, WildcardBound,
};

/// Builds the structural signature of a named class.
///
/// Top-level types use `pkg/path/Name`; nested types append `$Name` to their
/// enclosing type's signature.
pub fn class_signature(package: &str, outer_signature: Option<&str>, name: &str) -> String {
    match outer_signature {
        Some(outer) => format!("{outer}${name}"),
        None if package.is_empty() => name.to_string(),
        None => format!("{}/{}", package.replace('.', "/"), name),
    }
}

/// Arena of every class known to a parse session, keyed by signature.
///
/// A signature maps to at most one [`TypeId`] for the lifetime of the store:
/// re-declaring a class (re-parse, cache merge) updates the entry in place.
#[derive(Debug, Clone, Default)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    by_signature: HashMap<String, TypeId>,
    packages: HashSet<String>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, def)| (TypeId(idx as u32), def))
    }

    #[inline]
    pub fn class(&self, id: TypeId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    #[inline]
    pub fn class_mut(&mut self, id: TypeId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.index())
    }

    /// Signature of `id`, or the empty string for a foreign id.
    pub fn signature(&self, id: TypeId) -> &str {
        self.class(id).map_or("", |def| def.signature.as_str())
    }

    /// Looks up a live (non-stale) class by signature.
    pub fn class_id(&self, signature: &str) -> Option<TypeId> {
        let id = *self.by_signature.get(signature)?;
        (!self.classes[id.index()].stale).then_some(id)
    }

    pub fn object(&self) -> Option<TypeId> {
        self.class_id("java/lang/Object")
    }

    pub fn string(&self) -> Option<TypeId> {
        self.class_id("java/lang/String")
    }

    pub fn boxed(&self, primitive: PrimitiveType) -> Option<TypeId> {
        self.class_id(primitive.boxed_signature())
    }

    /// Insert-or-fetch a named class skeleton.
    ///
    /// An existing entry keeps its id and members; its kind, outer link and
    /// origin are refreshed and it becomes visible again if it was stale.
    pub fn intern_class(
        &mut self,
        package: &str,
        outer: Option<TypeId>,
        name: &str,
        kind: ClassKind,
        origin: TypeOrigin,
    ) -> TypeId {
        let outer_signature = outer.map(|o| self.signature(self.generic_base(o)).to_string());
        let signature = class_signature(package, outer_signature.as_deref(), name);
        self.intern_with_signature(signature, package, outer, name, kind, origin)
    }

    /// Like [`TypeStore::intern_class`] but with an explicit signature, used for
    /// local (`Outer$1Local`) and anonymous (`Outer$1`) classes.
    pub fn intern_with_signature(
        &mut self,
        signature: String,
        package: &str,
        outer: Option<TypeId>,
        name: &str,
        kind: ClassKind,
        origin: TypeOrigin,
    ) -> TypeId {
        if let Some(&id) = self.by_signature.get(&signature) {
            let def = &mut self.classes[id.index()];
            def.kind = kind;
            def.outer = outer;
            def.origin = origin;
            def.stale = false;
            return id;
        }
        let mut def = ClassDef::new(signature, package, name, kind);
        def.outer = outer;
        def.origin = origin;
        self.insert(def)
    }

    /// Stores `def`, replacing any entry with the same signature without changing its id.
    pub fn upsert_class(&mut self, def: ClassDef) -> TypeId {
        match self.by_signature.get(&def.signature) {
            Some(&id) => {
                self.add_package(&def.package);
                self.classes[id.index()] = def;
                id
            }
            None => self.insert(def),
        }
    }

    fn insert(&mut self, def: ClassDef) -> TypeId {
        let id = TypeId(self.classes.len() as u32);
        self.add_package(&def.package);
        self.by_signature.insert(def.signature.clone(), id);
        self.classes.push(def);
        id
    }

    /// Registers a dotted package name and all of its prefixes.
    pub fn add_package(&mut self, package: &str) {
        if package.is_empty() {
            return;
        }
        let mut end = 0;
        for segment in package.split('.') {
            end += segment.len();
            self.packages.insert(package[..end].to_string());
            end += 1;
        }
    }

    pub fn package_exists(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    /// Resolves a dotted name such as `java.util.Map.Entry`, preferring the
    /// longest package prefix.
    pub fn lookup_dotted(&self, name: &str) -> Option<TypeId> {
        let segments: Vec<&str> = name.split('.').collect();
        for split in (0..segments.len()).rev() {
            let rest = segments[split..].join("$");
            let signature = if split == 0 {
                rest
            } else {
                format!("{}/{}", segments[..split].join("/"), rest)
            };
            if let Some(id) = self.class_id(&signature) {
                return Some(id);
            }
        }
        None
    }

    /// A class declared directly inside `owner` (not inherited).
    pub fn nested_type(&self, owner: TypeId, name: &str) -> Option<TypeId> {
        let base = self.generic_base(owner);
        self.class_id(&format!("{}${}", self.signature(base), name))
    }

    /// Types nested directly inside `owner`, in declaration order.
    pub fn nested_types(&self, owner: TypeId) -> Vec<TypeId> {
        let base = self.generic_base(owner);
        self.iter()
            .filter(|(_, def)| !def.stale && def.generic.is_none() && def.outer == Some(base))
            .map(|(id, _)| id)
            .collect()
    }

    /// The generic declaration behind a specialization (or `id` itself).
    pub fn generic_base(&self, id: TypeId) -> TypeId {
        self.class(id)
            .and_then(|def| def.generic.as_ref())
            .map_or(id, |g| g.base)
    }

    /// Explicit specialization, memoized by the resulting signature.
    pub fn specialize(&mut self, base: TypeId, args: Vec<Type>) -> TypeId {
        let base = self.generic_base(base);
        if args.is_empty() {
            return base;
        }
        let mut signature = self.signature(base).to_string();
        signature.push('<');
        for arg in &args {
            signature.push_str(&self.descriptor(arg));
        }
        signature.push('>');
        self.specialization(base, signature, args, false)
    }

    /// Diamond specialization (`new Foo<>()`): type arguments are left for inference.
    pub fn infer_type_args(&mut self, base: TypeId) -> TypeId {
        let base = self.generic_base(base);
        let signature = format!("{}<>", self.signature(base));
        self.specialization(base, signature, Vec::new(), true)
    }

    fn specialization(
        &mut self,
        base: TypeId,
        signature: String,
        args: Vec<Type>,
        inferred: bool,
    ) -> TypeId {
        if let Some(&id) = self.by_signature.get(&signature) {
            return id;
        }
        let Some(template) = self.class(base) else {
            return base;
        };
        let mut def = ClassDef::new(signature, &template.package, &template.name, template.kind);
        def.outer = template.outer;
        def.modifiers = template.modifiers.clone();
        def.type_params = template.type_params.clone();
        def.origin = TypeOrigin::Synthetic;
        def.generic = Some(GenericInstance {
            base,
            args,
            inferred,
        });
        tracing::trace!(signature = %def.signature, "registered specialization");
        self.insert(def)
    }

    /// Type arguments of a specialization; empty for plain and diamond types.
    pub fn type_args(&self, id: TypeId) -> &[Type] {
        self.class(id)
            .and_then(|def| def.generic.as_ref())
            .map(|g| g.args.as_slice())
            .unwrap_or_default()
    }

    /// Type-variable bindings a specialization applies to its base's members.
    pub fn bindings(&self, id: TypeId) -> Vec<(String, Type)> {
        let Some(generic) = self.class(id).and_then(|def| def.generic.as_ref()) else {
            return Vec::new();
        };
        let Some(base) = self.class(generic.base) else {
            return Vec::new();
        };
        base.type_params
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                let ty = if generic.inferred {
                    Type::Unknown(param.name.clone())
                } else {
                    generic
                        .args
                        .get(idx)
                        .cloned()
                        .unwrap_or_else(|| Type::Unknown(param.name.clone()))
                };
                (param.name.clone(), ty)
            })
            .collect()
    }

    /// Replaces type variables in `ty`, re-specializing nested generic types.
    pub fn substitute(&mut self, ty: &Type, bindings: &[(String, Type)]) -> Type {
        if bindings.is_empty() {
            return ty.clone();
        }
        match ty {
            Type::TypeVar(name) => bindings
                .iter()
                .find(|(var, _)| var == name)
                .map_or_else(|| ty.clone(), |(_, bound)| bound.clone()),
            Type::Array(elem) => Type::Array(Box::new(self.substitute(elem, bindings))),
            Type::Wildcard(WildcardBound::Extends(bound)) => Type::Wildcard(
                WildcardBound::Extends(Box::new(self.substitute(bound, bindings))),
            ),
            Type::Wildcard(WildcardBound::Super(bound)) => Type::Wildcard(WildcardBound::Super(
                Box::new(self.substitute(bound, bindings)),
            )),
            Type::Class(id) => {
                let Some(generic) = self.class(*id).and_then(|def| def.generic.clone()) else {
                    return ty.clone();
                };
                if generic.inferred {
                    return ty.clone();
                }
                let args: Vec<Type> = generic
                    .args
                    .iter()
                    .map(|arg| self.substitute(arg, bindings))
                    .collect();
                if args == generic.args {
                    ty.clone()
                } else {
                    Type::Class(self.specialize(generic.base, args))
                }
            }
            _ => ty.clone(),
        }
    }

    pub fn fields(&mut self, id: TypeId) -> Vec<FieldDef> {
        let base = self.generic_base(id);
        let bindings = self.bindings(id);
        let fields = self.class(base).map(|d| d.fields.clone()).unwrap_or_default();
        if bindings.is_empty() {
            return fields;
        }
        fields
            .into_iter()
            .map(|mut field| {
                field.ty = self.substitute(&field.ty, &bindings);
                field
            })
            .collect()
    }

    pub fn methods(&mut self, id: TypeId) -> Vec<MethodDef> {
        let base = self.generic_base(id);
        let methods = self.class(base).map(|d| d.methods.clone()).unwrap_or_default();
        self.substitute_methods(id, methods)
    }

    pub fn constructors(&mut self, id: TypeId) -> Vec<MethodDef> {
        let base = self.generic_base(id);
        let ctors = self
            .class(base)
            .map(|d| d.constructors.clone())
            .unwrap_or_default();
        self.substitute_methods(id, ctors)
    }

    fn substitute_methods(&mut self, id: TypeId, methods: Vec<MethodDef>) -> Vec<MethodDef> {
        let bindings = self.bindings(id);
        if bindings.is_empty() {
            return methods;
        }
        methods
            .into_iter()
            .map(|mut method| {
                // Method type parameters shadow the class's.
                let visible: Vec<(String, Type)> = bindings
                    .iter()
                    .filter(|(name, _)| !method.type_params.iter().any(|tp| &tp.name == name))
                    .cloned()
                    .collect();
                for param in &mut method.params {
                    param.ty = self.substitute(&param.ty, &visible);
                }
                method.return_type = self.substitute(&method.return_type, &visible);
                method
            })
            .collect()
    }

    pub fn enum_constants(&self, id: TypeId) -> &[String] {
        self.class(self.generic_base(id))
            .map(|def| def.enum_constants.as_slice())
            .unwrap_or_default()
    }

    pub fn super_class(&mut self, id: TypeId) -> Option<Type> {
        let base = self.generic_base(id);
        let super_class = self.class(base)?.super_class.clone()?;
        let bindings = self.bindings(id);
        Some(self.substitute(&super_class, &bindings))
    }

    pub fn interfaces(&mut self, id: TypeId) -> Vec<Type> {
        let base = self.generic_base(id);
        let interfaces = self
            .class(base)
            .map(|d| d.interfaces.clone())
            .unwrap_or_default();
        let bindings = self.bindings(id);
        interfaces
            .iter()
            .map(|ty| self.substitute(ty, &bindings))
            .collect()
    }

    pub fn direct_supertypes(&mut self, id: TypeId) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self.super_class(id).and_then(|t| t.class_id()).into_iter().collect();
        out.extend(self.interfaces(id).iter().filter_map(Type::class_id));
        out
    }

    /// `id` followed by all of its supertypes, most-derived first, with
    /// `java.lang.Object` last.
    ///
    /// Each generic declaration appears once, under the first specialization
    /// reached, so `class A<T> extends A<List<T>>` terminates.
    pub fn inheritance_list(&mut self, id: TypeId) -> Vec<TypeId> {
        let object = self.object();
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            let base = self.generic_base(next);
            if Some(base) == object || !seen.insert(base) {
                continue;
            }
            out.push(next);
            queue.extend(self.direct_supertypes(next));
        }
        out.extend(object);
        out
    }

    /// Marks every class declared by `uri` stale and clears its members.
    ///
    /// Ids survive; re-declaring the class makes it visible again.
    pub fn clear_source(&mut self, uri: &str) -> Vec<TypeId> {
        let mut cleared = Vec::new();
        for (idx, def) in self.classes.iter_mut().enumerate() {
            if matches!(&def.origin, TypeOrigin::Source { uri: u } if u == uri) {
                def.reset_members();
                def.stale = true;
                cleared.push(TypeId(idx as u32));
            }
        }
        cleared
    }

    /// Live classes declared by `uri`, in registration order.
    pub fn source_classes(&self, uri: &str) -> Vec<TypeId> {
        self.iter()
            .filter(|(_, def)| {
                !def.stale && matches!(&def.origin, TypeOrigin::Source { uri: u } if u == uri)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// JVM-style descriptor used to build specialization signatures.
    pub fn descriptor(&self, ty: &Type) -> String {
        match ty {
            Type::Void => "V".to_string(),
            Type::Primitive(p) => p.descriptor().to_string(),
            Type::Class(id) => format!("L{};", self.signature(*id)),
            Type::Array(elem) => format!("[{}", self.descriptor(elem)),
            Type::TypeVar(name) => format!("T{name};"),
            Type::Wildcard(WildcardBound::Unbounded) => "*".to_string(),
            Type::Wildcard(WildcardBound::Extends(bound)) => format!("+{}", self.descriptor(bound)),
            Type::Wildcard(WildcardBound::Super(bound)) => format!("-{}", self.descriptor(bound)),
            Type::Null => "Lnull;".to_string(),
            Type::Unknown(label) => format!("L?{label};"),
        }
    }

    /// Dotted name of a class without type arguments, e.g. `java.util.Map.Entry`.
    pub fn qualified_name(&self, id: TypeId) -> String {
        self.signature(self.generic_base(id)).replace(['/', '$'], ".")
    }

    /// Name of a class as written in Java source, e.g. `Map.Entry`.
    pub fn simple_name(&self, id: TypeId) -> String {
        let base = self.generic_base(id);
        let Some(def) = self.class(base) else {
            return String::new();
        };
        match def.outer {
            Some(outer) if !def.name.is_empty() => {
                format!("{}.{}", self.simple_name(outer), def.name)
            }
            _ => def.name.clone(),
        }
    }

    /// Human readable rendering of a type.
    pub fn display(&self, ty: &Type) -> String {
        match ty {
            Type::Void => "void".to_string(),
            Type::Primitive(p) => p.name().to_string(),
            Type::Class(id) => {
                let mut out = self.qualified_name(*id);
                if let Some(generic) = self.class(*id).and_then(|d| d.generic.as_ref()) {
                    let args: Vec<String> = generic.args.iter().map(|a| self.display(a)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
            Type::Array(elem) => format!("{}[]", self.display(elem)),
            Type::TypeVar(name) => name.clone(),
            Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
            Type::Wildcard(WildcardBound::Extends(bound)) => {
                format!("? extends {}", self.display(bound))
            }
            Type::Wildcard(WildcardBound::Super(bound)) => format!("? super {}", self.display(bound)),
            Type::Null => "null".to_string(),
            Type::Unknown(label) => label.clone(),
        }
    }

    /// Signature used to deduplicate overrides: name plus erased-ish parameter descriptors.
    pub fn method_signature(&self, method: &MethodDef) -> String {
        let params: String = method
            .params
            .iter()
            .map(|p| self.descriptor(&p.ty))
            .collect();
        format!("{}({})", method.name, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_dotted_prefers_nested_type_over_missing_package() {
        let mut store = TypeStore::new();
        let map = store.intern_class("java.util", None, "Map", ClassKind::Interface, TypeOrigin::Builtin);
        let entry = store.intern_class(
            "java.util",
            Some(map),
            "Entry",
            ClassKind::Interface,
            TypeOrigin::Builtin,
        );
        assert_eq!(store.signature(entry), "java/util/Map$Entry");
        assert_eq!(store.lookup_dotted("java.util.Map.Entry"), Some(entry));
        assert_eq!(store.lookup_dotted("java.util.Map"), Some(map));
        assert_eq!(store.lookup_dotted("java.util"), None);
        assert!(store.package_exists("java"));
        assert!(store.package_exists("java.util"));
        assert!(!store.package_exists("java.util.Map"));
    }

    #[test]
    fn default_package_signature_has_no_slash() {
        assert_eq!(class_signature("", None, "Main"), "Main");
        assert_eq!(class_signature("a.b", None, "C"), "a/b/C");
        assert_eq!(class_signature("a.b", Some("a/b/C"), "D"), "a/b/C$D");
    }
}
