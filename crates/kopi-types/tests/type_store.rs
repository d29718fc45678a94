use kopi_types::{ClassKind, PrimitiveType, Type, TypeOrigin, TypeParamDef, TypeStore};

use pretty_assertions::assert_eq;

fn source(uri: &str) -> TypeOrigin {
    TypeOrigin::Source {
        uri: uri.to_string(),
    }
}

#[test]
fn intern_class_is_idempotent() {
    let mut store = TypeStore::new();
    let first = store.intern_class("com.example", None, "Foo", ClassKind::Class, source("a"));
    let second = store.intern_class("com.example", None, "Foo", ClassKind::Class, source("a"));
    assert_eq!(first, second);
    assert_eq!(store.class_id("com/example/Foo"), Some(first));
    assert!(store.package_exists("com.example"));
}

#[test]
fn upsert_class_keeps_id() {
    let mut store = TypeStore::new();
    let id = store.intern_class("p", None, "Bar", ClassKind::Class, source("a"));
    let mut def = store.class(id).cloned().expect("class");
    def.kind = ClassKind::Interface;
    def.modifiers = vec!["public".to_string()];

    assert_eq!(store.upsert_class(def), id);
    let def = store.class(id).expect("class");
    assert_eq!(def.kind, ClassKind::Interface);
    assert!(def.has_modifier("public"));
}

#[test]
fn specializations_are_memoized() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.lookup_dotted("java.util.List").expect("List");
    let string = store.string().expect("String");

    let a = store.specialize(list, vec![Type::Class(string)]);
    let b = store.specialize(list, vec![Type::Class(string)]);
    assert_eq!(a, b);
    assert_ne!(a, list);
    assert_eq!(store.generic_base(a), list);
    assert_eq!(store.signature(a), "java/util/List<Ljava/lang/String;>");
    assert_eq!(store.display(&Type::Class(a)), "java.util.List<java.lang.String>");
}

#[test]
fn diamond_specialization_has_distinct_signature() {
    let mut store = TypeStore::with_minimal_jdk();
    let map = store.lookup_dotted("java.util.HashMap").expect("HashMap");
    let inferred = store.infer_type_args(map);
    assert_eq!(store.signature(inferred), "java/util/HashMap<>");
    assert!(store.type_args(inferred).is_empty());
    assert_eq!(store.infer_type_args(map), inferred);
}

#[test]
fn inheritance_list_ends_with_object() {
    let mut store = TypeStore::with_minimal_jdk();
    let array_list = store.lookup_dotted("java.util.ArrayList").expect("ArrayList");
    let object = store.object().expect("Object");

    let names: Vec<String> = store
        .inheritance_list(array_list)
        .into_iter()
        .map(|id| store.qualified_name(id))
        .collect();

    assert_eq!(names.first().map(String::as_str), Some("java.util.ArrayList"));
    assert_eq!(names.last().map(String::as_str), Some("java.lang.Object"));
    assert!(names.iter().any(|n| n == "java.util.List"));
    assert!(names.iter().any(|n| n == "java.lang.Iterable"));
    assert_eq!(names.iter().filter(|n| n.as_str() == "java.lang.Object").count(), 1);
    assert_eq!(store.inheritance_list(object), vec![object]);
}

#[test]
fn members_of_specialization_are_substituted() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.lookup_dotted("java.util.List").expect("List");
    let string = store.string().expect("String");
    let list_of_string = store.specialize(list, vec![Type::Class(string)]);

    let get = store
        .methods(list_of_string)
        .into_iter()
        .find(|m| m.name == "get")
        .expect("get");
    assert_eq!(get.return_type, Type::Class(string));
    assert_eq!(get.params[0].ty, Type::Primitive(PrimitiveType::Int));
}

#[test]
fn inherited_members_follow_supertype_arguments() {
    let mut store = TypeStore::with_minimal_jdk();
    let array_list = store.lookup_dotted("java.util.ArrayList").expect("ArrayList");
    let string = store.string().expect("String");
    let concrete = store.specialize(array_list, vec![Type::Class(string)]);

    let size_owner = store
        .inheritance_list(concrete)
        .into_iter()
        .find(|id| store.qualified_name(*id) == "java.util.Collection")
        .expect("Collection in hierarchy");
    let add = store
        .methods(size_owner)
        .into_iter()
        .find(|m| m.name == "add")
        .expect("add");
    assert_eq!(add.params[0].ty, Type::Class(string));
}

#[test]
fn jdk_statics_and_varargs() {
    let mut store = TypeStore::with_minimal_jdk();
    let system = store.lookup_dotted("java.lang.System").expect("System");
    let out = store
        .fields(system)
        .into_iter()
        .find(|f| f.name == "out")
        .expect("out");
    assert!(out.is_static);
    assert_eq!(store.display(&out.ty), "java.io.PrintStream");

    let stream = out.ty.class_id().expect("class");
    let printf = store
        .methods(stream)
        .into_iter()
        .find(|m| m.name == "printf")
        .expect("printf");
    assert!(printf.is_varargs);
    assert_eq!(store.method_signature(&printf), "printf(Ljava/lang/String;[Ljava/lang/Object;)");
}

#[test]
fn nested_jdk_type_resolves_through_outer() {
    let store = TypeStore::with_minimal_jdk();
    let map = store.lookup_dotted("java.util.Map").expect("Map");
    let entry = store.nested_type(map, "Entry").expect("Entry");
    assert_eq!(store.lookup_dotted("java.util.Map.Entry"), Some(entry));
    assert_eq!(store.simple_name(entry), "Map.Entry");
    assert_eq!(store.nested_types(map), vec![entry]);
}

#[test]
fn cleared_source_classes_become_invisible_until_redeclared() {
    let mut store = TypeStore::new();
    let id = store.intern_class("p", None, "Foo", ClassKind::Class, source("file:///Foo.java"));
    store.intern_class("p", None, "Other", ClassKind::Class, source("file:///Other.java"));

    let cleared = store.clear_source("file:///Foo.java");
    assert_eq!(cleared, vec![id]);
    assert_eq!(store.class_id("p/Foo"), None);
    assert_eq!(store.source_classes("file:///Foo.java"), Vec::new());

    let again = store.intern_class("p", None, "Foo", ClassKind::Enum, source("file:///Foo.java"));
    assert_eq!(again, id);
    assert_eq!(store.class(id).map(|d| d.kind), Some(ClassKind::Enum));
    assert_eq!(store.source_classes("file:///Foo.java"), vec![id]);
}

#[test]
fn self_specializing_supertype_terminates() {
    let mut store = TypeStore::with_minimal_jdk();
    let a = store.intern_class("", None, "A", ClassKind::Class, source("A.java"));
    let list = store.lookup_dotted("java.util.List").expect("List");
    let object = store.object().expect("Object");

    let list_of_t = store.specialize(list, vec![Type::TypeVar("T".to_string())]);
    let grown = store.specialize(a, vec![Type::Class(list_of_t)]);
    let def = store.class_mut(a).expect("A");
    def.type_params = vec![TypeParamDef {
        name: "T".to_string(),
        bounds: Vec::new(),
    }];
    def.super_class = Some(Type::Class(grown));

    assert_eq!(store.inheritance_list(a), vec![a, object]);
    assert_eq!(store.inheritance_list(grown), vec![grown, object]);
}

#[test]
fn unresolved_arguments_get_distinct_specializations() {
    let mut store = TypeStore::with_minimal_jdk();
    let list = store.lookup_dotted("java.util.List").expect("List");

    let foo = store.specialize(list, vec![Type::unknown("Foo")]);
    let bar = store.specialize(list, vec![Type::unknown("Bar")]);
    assert_ne!(foo, bar);
    assert_eq!(store.specialize(list, vec![Type::unknown("Foo")]), foo);
    assert_eq!(store.display(&Type::Class(bar)), "java.util.List<Bar>");
}
