use kopi_core::{LocKind, SourceDocument};
use kopi_parse::{parse_document, ParseOptions, ParsedUnit};
use kopi_types::TypeStore;
use pretty_assertions::assert_eq;

fn parse(text: &str) -> ParsedUnit {
    let mut store = TypeStore::with_minimal_jdk();
    parse_document(&SourceDocument::new("Test.java", text, 1), &mut store, &ParseOptions::default())
}

fn messages(unit: &ParsedUnit) -> Vec<&str> {
    unit.diagnostics.iter().map(|d| d.message.as_str()).collect()
}

/// Binding of the `nth` token spelled `text`.
fn loc(unit: &ParsedUnit, text: &str, nth: usize) -> Option<(LocKind, String)> {
    unit.tokens
        .iter()
        .filter(|t| t.is(text))
        .nth(nth)
        .and_then(|t| t.loc.as_ref())
        .map(|l| (l.kind, l.target.clone()))
}

#[test]
fn generic_members_are_specialized() {
    let unit = parse(
        "class Box<T> { T value; T get() { return value; } }\n\
         class User { int m(Box<String> box) { box.value.isEmpty(); return box.get().length(); } }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_eq!(loc(&unit, "T", 1), Some((LocKind::TypeVariable, "T".to_string())));
    assert_eq!(
        loc(&unit, "length", 0),
        Some((LocKind::Method, "java/lang/String#length".to_string()))
    );
}

#[test]
fn inherited_members_and_super_calls() {
    let unit = parse(
        "class Base { protected int count; void inc() { count++; } }\n\
         class Derived extends Base {\n\
             @Override void inc() { super.inc(); count += 2; }\n\
             Derived() { super(); }\n\
         }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_eq!(loc(&unit, "count", 2), Some((LocKind::Field, "Base#count".to_string())));
}

#[test]
fn static_imports_and_qualified_names() {
    let unit = parse(
        "import static java.lang.Math.max;\n\
         class Calc { int m() { java.util.List<String> xs = new java.util.ArrayList<>(); System.out.println(xs.size()); return max(1, 2); } }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_eq!(
        loc(&unit, "max", 1),
        Some((LocKind::Method, "java/lang/Math#max".to_string()))
    );
    assert_eq!(loc(&unit, "util", 0), Some((LocKind::PackageName, "java.util".to_string())));
}

#[test]
fn nested_and_enum_types() {
    let unit = parse(
        "class Outer {\n\
             static class Inner { int x; }\n\
             enum Mode { ON, OFF }\n\
             Inner make() { return new Inner(); }\n\
             int m() { Mode mode = Mode.ON; return make().x + mode.ordinal() + Mode.OFF.name().length(); }\n\
         }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_eq!(
        loc(&unit, "ON", 1),
        Some((LocKind::EnumConstant, "Outer$Mode#ON".to_string()))
    );
}

#[test]
fn a_broken_member_does_not_hide_later_ones() {
    let unit = parse(
        "class Test {\n\
             void broken() { int x = ; undefined.call(); }\n\
             int fine() { return 1 + 2; }\n\
         }",
    );
    assert_eq!(
        messages(&unit),
        vec!["Expression expected", "Unresolved identifier: undefined"]
    );
    let fine = unit.unit.types[0].method("fine").expect("method");
    assert!(fine.body.as_ref().is_some_and(|b| b.parsed.is_some()));
}

#[test]
fn interface_methods_and_default_bodies() {
    let unit = parse(
        "interface Shape { double area(); default String label() { return \"shape\" + area(); } }\n\
         class Square implements Shape { double side; public double area() { return side * side; } }\n\
         class Use { String m(Square s) { return s.label(); } }",
    );
    assert!(unit.diagnostics.is_empty(), "{:?}", unit.diagnostics);
    assert_eq!(
        loc(&unit, "label", 1),
        Some((LocKind::Method, "Shape#label".to_string()))
    );
}

#[test]
fn symbol_locations_serialize_in_kebab_case() {
    let unit = parse("class Test { int x; int y = x; }");
    let json = serde_json::to_value(&unit.tokens).expect("serializable");
    let kinds: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t.get("loc")?.get("kind")?.as_str())
        .collect();
    assert_eq!(kinds, vec!["declaration", "declaration", "declaration", "field"]);
}

#[test]
fn a_class_extending_its_own_specialization_still_resolves() {
    let unit = parse("class A<T> extends A<java.util.List<T>> { void m() { foo(); hashCode(); } }");
    assert_eq!(messages(&unit), vec!["Unresolved identifier: foo"]);
}
