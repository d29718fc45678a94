use kopi_core::{LocKind, SourceDocument};
use kopi_parse::{parse_documents, parse_token_batch, ParseOptions, ParsedUnit, TokenizedDocument};
use kopi_types::{Type, TypeStore};
use pretty_assertions::assert_eq;

const A: &str = "package shop;\n\
                 public class Order {\n\
                     private Customer customer;\n\
                     public int total() { return customer.discount() + customer.visits; }\n\
                 }\n";

const B: &str = "package shop;\n\
                 public class Customer {\n\
                     public int visits;\n\
                     public int discount() { return visits > 10 ? 5 : 0; }\n\
                     public Order firstOrder() { return new Order(); }\n\
                 }\n";

fn doc(uri: &str, text: &str) -> SourceDocument {
    SourceDocument::new(uri, text, 1)
}

fn parse(docs: &[SourceDocument]) -> (TypeStore, Vec<ParsedUnit>) {
    let mut store = TypeStore::with_minimal_jdk();
    let units = parse_documents(docs, &[], &mut store, &ParseOptions::default());
    (store, units)
}

#[test]
fn documents_see_each_other_in_either_order() {
    for docs in [
        vec![doc("Order.java", A), doc("Customer.java", B)],
        vec![doc("Customer.java", B), doc("Order.java", A)],
    ] {
        let (_, units) = parse(&docs);
        for unit in &units {
            assert!(unit.diagnostics.is_empty(), "{}: {:?}", unit.uri, unit.diagnostics);
        }
    }
}

#[test]
fn tokens_cover_the_text_and_carry_bindings() {
    let (_, units) = parse(&[doc("Order.java", A), doc("Customer.java", B)]);
    let order = &units[0];
    let text: String = order.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(text, A);

    let bound: Vec<(String, LocKind, String)> = order
        .tokens
        .iter()
        .filter_map(|t| t.loc.as_ref().map(|l| (t.text.to_string(), l.kind, l.target.clone())))
        .collect();
    assert!(bound.contains(&("shop".into(), LocKind::PackageName, "shop".into())));
    assert!(bound.contains(&("Customer".into(), LocKind::Type, "shop/Customer".into())));
    assert!(bound.contains(&("discount".into(), LocKind::Method, "shop/Customer#discount".into())));
    assert!(bound.contains(&("visits".into(), LocKind::Field, "shop/Customer#visits".into())));
    assert!(bound.contains(&("customer".into(), LocKind::Field, "shop/Order#customer".into())));
}

#[test]
fn a_broken_body_span_covers_its_exact_text() {
    let text = "class T {\n    void m() { int x = ; foo(; }\n    int after;\n}\n";
    let (_, units) = parse(&[doc("T.java", text)]);
    let unit = &units[0];
    assert!(unit.has_errors(), "{:?}", unit.diagnostics);

    let body = unit.unit.types[0]
        .method("m")
        .and_then(|m| m.body.as_ref())
        .expect("method body");
    let covered: String = unit.tokens[body.tokens.indices()]
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    let start = text.find("{ int").expect("body start");
    let end = text.find("}\n    int after").expect("body end") + 1;
    assert_eq!(covered, &text[start..end]);
    assert!(unit.unit.types[0].field("after").is_some());
}

#[test]
fn reparsing_keeps_type_ids_and_replaces_members() {
    let mut store = TypeStore::with_minimal_jdk();
    let opts = ParseOptions::default();
    parse_documents(&[doc("Order.java", A), doc("Customer.java", B)], &[], &mut store, &opts);
    let id = store.class_id("shop/Customer").expect("declared");

    let edited = SourceDocument::new("Customer.java", "package shop;\npublic class Customer { long points; }", 2);
    let units = parse_documents(&[edited], &[], &mut store, &opts);
    assert_eq!(units[0].version, 2);
    assert_eq!(store.class_id("shop/Customer"), Some(id));

    let def = store.class(id).expect("live");
    let fields: Vec<&str> = def.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["points"]);
    assert!(def.methods.is_empty());
}

#[test]
fn removed_types_stop_resolving() {
    let mut store = TypeStore::with_minimal_jdk();
    let opts = ParseOptions::default();
    let first = parse_documents(&[doc("Order.java", A), doc("Customer.java", B)], &[], &mut store, &opts);

    let emptied = SourceDocument::new("Customer.java", "package shop;\n", 2);
    parse_documents(&[emptied], &first, &mut store, &opts);
    let units = parse_documents(&[doc("Order.java", A)], &[], &mut store, &opts);
    let messages: Vec<&str> = units[0].diagnostics.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages[0], "Unresolved type: Customer");
}

#[test]
fn cached_units_outside_the_batch_are_reused() {
    let mut store = TypeStore::with_minimal_jdk();
    let opts = ParseOptions::default();
    let first = parse_documents(&[doc("Order.java", A), doc("Customer.java", B)], &[], &mut store, &opts);
    assert_eq!(first[1].exported.len(), 1);

    let units = parse_documents(&[doc("Order.java", A)], &first, &mut store, &opts);
    assert!(units[0].diagnostics.is_empty(), "{:?}", units[0].diagnostics);
}

#[test]
fn parsing_is_deterministic() {
    let docs = [doc("Order.java", A), doc("Customer.java", B)];
    let (_, first) = parse(&docs);
    let (_, second) = parse(&docs);
    assert_eq!(first, second);
}

#[test]
fn specializations_are_shared() {
    let text = "import java.util.*;\nclass Lists { List<String> a; List<String> b; List<Integer> c; }";
    let (_, units) = parse(&[doc("Lists.java", text)]);
    let decl = &units[0].unit.types[0];
    let ty = |name: &str| decl.field(name).map(|f| f.ty.ty.clone()).expect("field");
    assert_eq!(ty("a"), ty("b"));
    assert_ne!(ty("a"), ty("c"));
    assert!(matches!(ty("a"), Type::Class(_)));
}

#[test]
fn token_batches_accept_foreign_tokens() {
    let tokens = kopi_syntax::lex("class T { int x = 1 + 2; }");
    let mut store = TypeStore::with_minimal_jdk();
    let units = parse_token_batch(
        vec![TokenizedDocument::new("T.java", 7, tokens)],
        &[],
        &mut store,
        &ParseOptions::default(),
    );
    assert_eq!(units[0].version, 7);
    assert!(units[0].diagnostics.is_empty());
    assert!(store.class_id("T").is_some());
}

#[test]
fn diagnostic_limit_caps_each_document() {
    let text = "class T { void m() { a; b; c; d; } }";
    let mut store = TypeStore::with_minimal_jdk();
    let opts = ParseOptions {
        diagnostic_limit: Some(2),
        ..ParseOptions::default()
    };
    let units = parse_documents(&[doc("T.java", text)], &[], &mut store, &opts);
    assert_eq!(units[0].diagnostics.len(), 2);
}
