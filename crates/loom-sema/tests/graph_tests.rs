use loom_common::error::{Error, Result};
use loom_lexer::Lexer;
use loom_parser::ast::Unit;
use loom_sema::Resolution;

fn resolve(sources: &[(&str, &str)]) -> Result<(Unit, Resolution)> {
    let mut files = Vec::new();
    for (name, source) in sources {
        let tokens = Lexer::tokenize(name, source);
        files.push(loom_parser::parse(&tokens)?);
    }
    let mut unit = Unit::merge(files);
    loom_sema::validate(&mut unit)?;
    let resolution = loom_sema::resolve(&unit)?;
    Ok((unit, resolution))
}

fn resolve_one(source: &str) -> Result<(Unit, Resolution)> {
    resolve(&[("t.loom", source)])
}

fn order_names(unit: &Unit, resolution: &Resolution) -> Vec<String> {
    resolution
        .order
        .iter()
        .map(|id| id.unique_name(unit))
        .collect()
}

// ── Ordering ─────────────────────────────────────────────────────────────

#[test]
fn empty_unit_resolves_to_empty_order() {
    let (_, resolution) = resolve_one("").unwrap();
    assert!(resolution.order.is_empty());
}

#[test]
fn minimal_function_orders_type_first() {
    let source = "@enum Color { RED BLUE }\n@function f {\n  @input Color\n  @output Color\n}";
    let (unit, resolution) = resolve_one(source).unwrap();
    assert_eq!(order_names(&unit, &resolution), vec!["Color", "f"]);
    assert_eq!(resolution.deps_of("f"), ["Color"]);
}

#[test]
fn independent_same_kind_vertices_order_by_source_line() {
    // A declared on line 10, B on line 5: same depth and kind, so the
    // earlier source line wins.
    let source = "\n\n\n\n@enum B { Y }\n\n\n\n\n@enum A { X }";
    let (unit, resolution) = resolve_one(source).unwrap();
    assert_eq!(order_names(&unit, &resolution), vec!["B", "A"]);
}

#[test]
fn kinds_are_interleaved_by_wave_then_kind() {
    let source = "@client[llm] c {\n  @provider p\n  model m\n}\n@enum E { X }\n@class K {\n  x int\n}\n@function f {\n  @input int\n  @output int\n}";
    let (unit, resolution) = resolve_one(source).unwrap();
    // All four are depth 1; kind ordinal puts enum < class < client < function.
    assert_eq!(order_names(&unit, &resolution), vec!["E", "K", "c", "f"]);
}

#[test]
fn variant_orders_after_its_function_within_a_wave() {
    let source = "@function f {\n  @input int\n  @output int\n}\n@variant[code] V for f {}\n@test_group G for f {\n  @input x\n}";
    let (unit, resolution) = resolve_one(source).unwrap();
    let names = order_names(&unit, &resolution);
    let f = names.iter().position(|n| n == "f").unwrap();
    let v = names.iter().position(|n| n == "f::V").unwrap();
    let g = names.iter().position(|n| n == "f::G").unwrap();
    assert!(f < v, "function before variant: {names:?}");
    assert!(v < g, "variant before test group: {names:?}");
}

#[test]
fn client_fallback_chain_orders_targets_first() {
    let source = "@client[llm] primary {\n  @provider p\n  model m\n  @fallback backup\n}\n@client[llm] backup {\n  @provider p\n  model m\n}";
    let (unit, resolution) = resolve_one(source).unwrap();
    assert_eq!(order_names(&unit, &resolution), vec!["backup", "primary"]);
    assert_eq!(resolution.deps_of("primary"), ["backup"]);
}

// ── Transitive closure ───────────────────────────────────────────────────

#[test]
fn class_deps_are_transitive_through_classes() {
    let source = "@enum Color { RED }\n@class Inner {\n  c Color\n}\n@class Outer {\n  inner Inner\n}";
    let (_, resolution) = resolve_one(source).unwrap();
    assert_eq!(resolution.deps_of("Inner"), ["Color"]);
    assert_eq!(resolution.deps_of("Outer"), ["Color", "Inner"]);
}

#[test]
fn code_variant_deps_are_superset_of_function_deps_and_depends_on() {
    let source = "@enum Color { RED }\n@function f {\n  @input Color\n  @output Color\n}\n@function g {\n  @input int\n  @output int\n}\n@variant[code] V for f {\n  @depends_on g\n}";
    let (_, resolution) = resolve_one(source).unwrap();
    let deps = resolution.deps_of("f::V");
    assert!(deps.contains(&"g".to_string()), "deps: {deps:?}");
    assert!(deps.contains(&"Color".to_string()), "deps: {deps:?}");
}

#[test]
fn llm_variant_inherits_function_type_deps() {
    let source = "@enum Color { RED }\n@client[llm] c {\n  @provider p\n  model m\n}\n@function f {\n  @input Color\n  @output Color\n}\n@variant[llm] V for f {\n  @client c\n  @prompt x\n}";
    let (_, resolution) = resolve_one(source).unwrap();
    assert_eq!(resolution.deps_of("f::V"), ["Color"]);
}

#[test]
fn test_group_depends_on_its_function_transitively() {
    let source = "@enum Color { RED }\n@function f {\n  @input Color\n  @output Color\n}\n@test_group G for f {\n  @input RED\n}";
    let (_, resolution) = resolve_one(source).unwrap();
    assert_eq!(resolution.deps_of("f::G"), ["Color", "f"]);
}

// ── Cycles ───────────────────────────────────────────────────────────────

#[test]
fn self_referencing_class_is_circular() {
    let err = resolve_one("@class Node {\n  next Node\n}").unwrap_err();
    assert!(matches!(err, Error::Circular { .. }));
    assert_eq!(
        err.to_string(),
        "t.loom:1:2: Circular: dependency cycle involving: Node"
    );
}

#[test]
fn mutually_recursive_classes_are_circular() {
    let source = "@class A {\n  b B\n}\n@class B {\n  a A\n}";
    let err = resolve_one(source).unwrap_err();
    assert!(matches!(err, Error::Circular { .. }));
    let rendered = err.to_string();
    assert!(rendered.contains("A") && rendered.contains("B"), "{rendered}");
}

#[test]
fn mutual_client_fallbacks_are_circular() {
    let source = "@client[llm] a {\n  @provider p\n  model m\n  @fallback b\n}\n@client[llm] b {\n  @provider p\n  model m\n  @fallback a\n}";
    let err = resolve_one(source).unwrap_err();
    assert!(matches!(err, Error::Circular { .. }));
}

#[test]
fn full_program_order_snapshot() {
    let source = "@enum Color { RED }\n@class Wrap {\n  c Color\n}\n@client[llm] c {\n  @provider p\n  model m\n}\n@function f {\n  @input Wrap\n  @output Color\n}\n@variant[llm] V for f {\n  @client c\n  @prompt x\n}\n@test_group G for f {\n  @input y\n}";
    let (unit, resolution) = resolve_one(source).unwrap();
    insta::assert_snapshot!(order_names(&unit, &resolution).join("\n"), @r"
    Color
    c
    Wrap
    f
    f::V
    f::G
    ");
}

// ── Determinism ──────────────────────────────────────────────────────────

#[test]
fn resolution_is_identical_across_runs() {
    let source = "@enum Color { RED }\n@class Wrap {\n  c Color\n}\n@client[llm] c {\n  @provider p\n  model m\n}\n@function f {\n  @input Wrap\n  @output Color\n}\n@variant[llm] V for f {\n  @client c\n  @prompt x\n}\n@test_group G for f {\n  @input y\n}";
    let (unit_a, res_a) = resolve_one(source).unwrap();
    let (unit_b, res_b) = resolve_one(source).unwrap();
    assert_eq!(order_names(&unit_a, &res_a), order_names(&unit_b, &res_b));
    for id in &res_a.order {
        let name = id.unique_name(&unit_a);
        assert_eq!(res_a.deps_of(&name), res_b.deps_of(&name));
    }
}

#[test]
fn file_order_breaks_cross_file_ties() {
    // Two independent enums on the same line of different files keep the
    // merge (file) order.
    let (unit, resolution) = resolve(&[
        ("a.loom", "@enum First { X }"),
        ("b.loom", "@enum Second { Y }"),
    ])
    .unwrap();
    assert_eq!(order_names(&unit, &resolution), vec!["First", "Second"]);
}
