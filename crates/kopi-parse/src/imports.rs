use kopi_hir::{MethodBinding, VarBinding};
use kopi_types::{class_signature, TypeId, TypeStore};

/// Names made visible by a compilation unit's imports, in declaration order.
///
/// On-demand packages start out with the implicit imports (`java.lang`).
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportSet {
    single: Vec<(String, TypeId)>,
    packages: Vec<String>,
    type_members: Vec<TypeId>,
    static_single: Vec<(TypeId, String)>,
    static_on_demand: Vec<TypeId>,
}

impl ImportSet {
    pub(crate) fn new(implicit: &[String]) -> Self {
        Self {
            packages: implicit.to_vec(),
            ..Self::default()
        }
    }

    /// Resolves one import declaration against the store and records it.
    ///
    /// Returns the types the import made visible; empty when it names nothing known.
    pub(crate) fn add(
        &mut self,
        store: &TypeStore,
        is_static: bool,
        name: &str,
        wildcard: bool,
    ) -> Vec<TypeId> {
        match (is_static, wildcard) {
            (false, false) => {
                let Some(id) = store.lookup_dotted(name) else {
                    return Vec::new();
                };
                let simple = name.rsplit('.').next().unwrap_or(name);
                self.single.push((simple.to_string(), id));
                vec![id]
            }
            (false, true) => {
                if store.package_exists(name) {
                    self.packages.push(name.to_string());
                    return package_types(store, name);
                }
                let Some(id) = store.lookup_dotted(name) else {
                    return Vec::new();
                };
                self.type_members.push(id);
                let mut resolved = vec![id];
                resolved.extend(store.nested_types(id));
                resolved
            }
            (true, false) => {
                let Some((owner, member)) = name.rsplit_once('.') else {
                    return Vec::new();
                };
                let Some(id) = store.lookup_dotted(owner) else {
                    return Vec::new();
                };
                self.static_single.push((id, member.to_string()));
                vec![id]
            }
            (true, true) => {
                let Some(id) = store.lookup_dotted(name) else {
                    return Vec::new();
                };
                self.static_on_demand.push(id);
                vec![id]
            }
        }
    }

    /// Single-type imports, plus member types named by a static import.
    pub(crate) fn resolve_single(&self, store: &TypeStore, name: &str) -> Option<TypeId> {
        self.single
            .iter()
            .find(|(simple, _)| simple == name)
            .map(|(_, id)| *id)
            .or_else(|| {
                self.static_single
                    .iter()
                    .filter(|(_, member)| member == name)
                    .find_map(|(owner, _)| store.nested_type(*owner, name))
            })
    }

    pub(crate) fn resolve_on_demand(&self, store: &TypeStore, name: &str) -> Option<TypeId> {
        self.packages
            .iter()
            .find_map(|package| store.class_id(&class_signature(package, None, name)))
            .or_else(|| {
                self.type_members
                    .iter()
                    .chain(&self.static_on_demand)
                    .find_map(|owner| store.nested_type(*owner, name))
            })
    }

    /// Static fields, enum constants and methods named `name` brought in by
    /// static imports.
    pub(crate) fn static_members(
        &self,
        store: &mut TypeStore,
        name: &str,
    ) -> (Vec<VarBinding>, Vec<MethodBinding>) {
        let owners: Vec<TypeId> = self
            .static_single
            .iter()
            .filter(|(_, member)| member == name)
            .map(|(owner, _)| *owner)
            .chain(self.static_on_demand.iter().copied())
            .collect();

        let mut variables = Vec::new();
        let mut methods = Vec::new();
        for owner in owners {
            if variables.is_empty() {
                if let Some(field) = store
                    .fields(owner)
                    .into_iter()
                    .find(|f| f.is_static && f.name == name)
                {
                    variables.push(VarBinding::Field {
                        owner,
                        name: field.name,
                        ty: field.ty,
                        is_static: true,
                    });
                } else if store.enum_constants(owner).iter().any(|c| c == name) {
                    variables.push(VarBinding::EnumConstant {
                        owner: store.generic_base(owner),
                        name: name.to_string(),
                    });
                }
            }
            for def in store.methods(owner) {
                if def.is_static && def.name == name {
                    methods.push(MethodBinding::Method { owner, def });
                }
            }
        }
        (variables, methods)
    }
}

/// Live top-level types declared in `package`.
fn package_types(store: &TypeStore, package: &str) -> Vec<TypeId> {
    store
        .iter()
        .filter(|(_, def)| {
            !def.stale && def.generic.is_none() && def.outer.is_none() && def.package == package
        })
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn implicit_java_lang_is_on_demand() {
        let store = TypeStore::with_minimal_jdk();
        let imports = ImportSet::new(&["java.lang".to_string()]);
        let string = store.string();
        assert_eq!(imports.resolve_on_demand(&store, "String"), string);
        assert_eq!(imports.resolve_single(&store, "String"), None);
    }

    #[test]
    fn single_and_wildcard_imports() {
        let store = TypeStore::with_minimal_jdk();
        let mut imports = ImportSet::default();
        let list = imports.add(&store, false, "java.util.List", false);
        assert_eq!(list.len(), 1);
        assert_eq!(imports.resolve_single(&store, "List"), list.first().copied());

        let util = imports.add(&store, false, "java.util", true);
        assert!(util.len() > 1);
        assert!(imports.resolve_on_demand(&store, "HashMap").is_some());

        assert!(imports.add(&store, false, "com.missing.Thing", false).is_empty());
    }

    #[test]
    fn static_import_exposes_members() {
        let mut store = TypeStore::with_minimal_jdk();
        let mut imports = ImportSet::default();
        assert_eq!(imports.add(&store, true, "java.lang.System.out", false).len(), 1);
        let (vars, methods) = imports.static_members(&mut store, "out");
        assert_eq!(vars.len(), 1);
        assert!(methods.is_empty());
    }
}
