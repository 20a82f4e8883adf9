use loom_common::error::Result;
use loom_lexer::Lexer;
use loom_parser::ast::{FileAst, Language, Primitive, TypeExpr, VariantKind};

fn parse(source: &str) -> Result<FileAst> {
    let tokens = Lexer::tokenize("t.loom", source);
    loom_parser::parse(&tokens)
}

fn parse_ok(source: &str) -> FileAst {
    parse(source).expect("source should parse")
}

// ── Top level ────────────────────────────────────────────────────────────

#[test]
fn empty_file_parses_to_empty_bag() {
    let ast = parse_ok("");
    assert!(ast.enums.is_empty());
    assert!(ast.classes.is_empty());
    assert!(ast.functions.is_empty());
    assert!(ast.clients.is_empty());
    assert!(ast.variants.is_empty());
    assert!(ast.test_groups.is_empty());
}

#[test]
fn stray_identifier_at_top_level_is_an_error() {
    let err = parse("enum Color {}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.loom:1:1: Syntax: did you forget `@`? got: enum"
    );
}

#[test]
fn unknown_keyword_after_at_is_an_error() {
    let err = parse("@prompt hello").unwrap_err();
    assert!(err.to_string().contains("unexpected token: prompt"));
}

// ── Enums ────────────────────────────────────────────────────────────────

#[test]
fn enum_values_keep_source_order() {
    let ast = parse_ok("@enum Color { RED GREEN BLUE }");
    assert_eq!(ast.enums.len(), 1);
    let e = &ast.enums[0];
    assert_eq!(e.name, "Color");
    assert_eq!(e.values, vec!["RED", "GREEN", "BLUE"]);
    assert_eq!((e.loc.line, e.loc.column), (1, 2));
}

#[test]
fn duplicate_enum_value_reports_both_locations() {
    let err = parse("@enum Color {\n  RED\n  RED\n}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.loom:2:3: Duplicate: duplicate value in enum: RED\n  also declared at t.loom:3:3"
    );
}

// ── Classes ──────────────────────────────────────────────────────────────

#[test]
fn class_with_properties_and_method() {
    let source = "@class Point {\n  x int\n  y int\n  @method label {\n    @lang[py] {\n      def label(self): return 'p'\n    }\n  }\n}";
    let ast = parse_ok(source);
    let class = &ast.classes[0];
    assert_eq!(class.name, "Point");
    assert_eq!(class.properties.len(), 2);
    assert_eq!(class.properties[0].name, "x");
    assert_eq!(
        class.properties[0].ty.expr,
        TypeExpr::Primitive(Primitive::Int)
    );
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name, "label");
    assert_eq!(class.methods[0].langs[0].language, Language::Python);
    assert_eq!(
        class.methods[0].langs[0].code,
        "def label(self): return 'p'"
    );
}

#[test]
fn property_with_union_optional_list_type() {
    let ast = parse_ok("@class Holder {\n  value int|string[]?\n}");
    let ty = &ast.classes[0].properties[0].ty;
    assert_eq!(ty.to_string(), "int|string[]?");
}

// ── Functions ────────────────────────────────────────────────────────────

#[test]
fn function_input_output_types() {
    let ast = parse_ok("@function f {\n  @input Color\n  @output Color[]\n}");
    let f = &ast.functions[0];
    assert_eq!(f.name, "f");
    assert_eq!(f.input.to_string(), "Color");
    assert_eq!(f.output.to_string(), "Color[]");
    assert!(f.variants.is_empty());
}

#[test]
fn function_requires_input_then_output() {
    let err = parse("@function f {\n  @output int\n  @input int\n}").unwrap_err();
    assert!(err.to_string().contains("expected @input"));
}

// ── Variants ─────────────────────────────────────────────────────────────

#[test]
fn llm_variant_single_client_keeps_name() {
    let source = "@variant[llm] V for f {\n  @client gpt4\n  @prompt say hi\n}";
    let ast = parse_ok(source);
    assert_eq!(ast.variants.len(), 1);
    let v = &ast.variants[0];
    assert_eq!(v.name, "V");
    assert_eq!(v.function_name, "f");
    match &v.kind {
        VariantKind::Llm {
            client_name,
            prompt,
            ..
        } => {
            assert_eq!(client_name, "gpt4");
            assert_eq!(prompt, "say hi");
        }
        other => panic!("expected llm variant, got {other:?}"),
    }
}

#[test]
fn llm_variant_fans_out_per_client() {
    let source = "@variant[llm] V for f {\n  @client a b\n  @prompt x\n}";
    let ast = parse_ok(source);
    let names: Vec<&str> = ast.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["V_a", "V_b"]);
    for (variant, client) in ast.variants.iter().zip(["a", "b"]) {
        match &variant.kind {
            VariantKind::Llm { client_name, .. } => assert_eq!(client_name, client),
            other => panic!("expected llm variant, got {other:?}"),
        }
    }
}

#[test]
fn llm_variant_client_list_may_be_braced() {
    let source = "@variant[llm] V for f {\n  @client {\n    a\n    b\n    c\n  }\n  @prompt x\n}";
    let ast = parse_ok(source);
    assert_eq!(ast.variants.len(), 3);
}

#[test]
fn llm_variant_requires_prompt() {
    let err = parse("@variant[llm] V for f {\n  @client a\n}").unwrap_err();
    assert!(err.to_string().contains("a prompt must be specified"));
}

#[test]
fn llm_variant_requires_a_client() {
    let err = parse("@variant[llm] V for f {\n  @client {}\n  @prompt x\n}").unwrap_err();
    assert!(err
        .to_string()
        .contains("at least one client must be specified"));
}

#[test]
fn llm_variant_multiline_prompt() {
    let source =
        "@variant[llm] V for f {\n  @client a\n  @prompt {\n    Given {input},\n    answer.\n  }\n}";
    let ast = parse_ok(source);
    match &ast.variants[0].kind {
        VariantKind::Llm { prompt, .. } => {
            assert_eq!(prompt, "Given {input},\nanswer.");
        }
        other => panic!("expected llm variant, got {other:?}"),
    }
}

#[test]
fn llm_variant_stringify_overrides() {
    let source = "@variant[llm] V for f {\n  @client a\n  @prompt x\n  @stringify Color {\n    red\n    @rename crimson\n    @describe warm\n    blue\n    @skip\n  }\n}";
    let ast = parse_ok(source);
    match &ast.variants[0].kind {
        VariantKind::Llm { stringify, .. } => {
            assert_eq!(stringify.len(), 1);
            let s = &stringify[0];
            assert_eq!(s.type_name, "Color");
            assert_eq!(s.properties.len(), 2);
            assert_eq!(s.properties[0].rename.as_deref(), Some("crimson"));
            assert_eq!(s.properties[0].describe.as_deref(), Some("warm"));
            assert!(!s.properties[0].skip);
            assert!(s.properties[1].skip);
        }
        other => panic!("expected llm variant, got {other:?}"),
    }
}

#[test]
fn code_variant_with_depends_on() {
    let source = "@variant[code] V for f {\n  @depends_on g h\n}";
    let ast = parse_ok(source);
    match &ast.variants[0].kind {
        VariantKind::Code { depends_on } => {
            assert_eq!(depends_on, &vec!["g".to_string(), "h".to_string()]);
        }
        other => panic!("expected code variant, got {other:?}"),
    }
}

#[test]
fn code_variant_rejects_second_depends_on() {
    let source = "@variant[code] V for f {\n  @depends_on g\n  @depends_on h\n}";
    let err = parse(source).unwrap_err();
    assert!(err.to_string().contains("multiple depends_on statements"));
}

#[test]
fn unknown_variant_tag_is_a_syntax_error() {
    let err = parse("@variant[xyz] V for f {}").unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.loom:1:2: Syntax: unknown variant type: xyz"
    );
}

#[test]
fn variant_requires_for_keyword() {
    let err = parse("@variant[llm] V of f {}").unwrap_err();
    assert!(err.to_string().contains("expected `for` keyword, got: of"));
}

// ── Test groups ──────────────────────────────────────────────────────────

#[test]
fn test_group_with_named_and_anonymous_cases() {
    let source = "@test_group G for f {\n  @case first {\n    @input hello\n  }\n  @input bare input\n  @case {\n    @input third\n  }\n}";
    let ast = parse_ok(source);
    let group = &ast.test_groups[0];
    assert_eq!(group.name, "G");
    assert_eq!(group.function_name, "f");
    let names: Vec<&str> = group.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["first", "case_1", "case_2"]);
    assert_eq!(group.cases[1].input, "bare input");
}

#[test]
fn test_case_rejects_duplicate_input() {
    let source = "@test_group G for f {\n  @case c {\n    @input a\n    @input b\n  }\n}";
    let err = parse(source).unwrap_err();
    assert!(err.to_string().contains("duplicate input"));
}

// ── Clients ──────────────────────────────────────────────────────────────

#[test]
fn client_with_args_retry_and_fallbacks() {
    let source = "@client[llm] gpt4 {\n  @provider openai\n  model gpt-4\n  temperature 0.2\n  @retry 3\n  @fallback gpt35\n  @fallback[503] backup\n}";
    let ast = parse_ok(source);
    let client = &ast.clients[0];
    assert_eq!(client.name, "gpt4");
    assert_eq!(client.provider, "openai");
    assert_eq!(client.args.get("model").map(String::as_str), Some("gpt-4"));
    assert_eq!(
        client.args.get("temperature").map(String::as_str),
        Some("0.2")
    );
    assert_eq!(client.num_retries, 3);
    assert_eq!(client.default_fallback.as_deref(), Some("gpt35"));
    assert_eq!(
        client.fallback_by_code.get(&503).map(String::as_str),
        Some("backup")
    );
}

#[test]
fn client_rejects_duplicate_fallback_code() {
    let source =
        "@client[llm] c {\n  @provider p\n  model m\n  @fallback[500] a\n  @fallback[500] b\n}";
    let err = parse(source).unwrap_err();
    assert!(err.to_string().contains("duplicate fallback code: 500"));
}

#[test]
fn client_rejects_malformed_retry_count() {
    let source = "@client[llm] c {\n  @provider p\n  @retry lots\n}";
    let err = parse(source).unwrap_err();
    assert_eq!(
        err.to_string(),
        "t.loom:3:10: Syntax: invalid retry count: lots"
    );
}

#[test]
fn client_rejects_malformed_fallback_code() {
    let source = "@client[llm] c {\n  @provider p\n  @fallback[5xx] a\n}";
    let err = parse(source).unwrap_err();
    assert!(err.to_string().contains("invalid fallback code: 5xx"));
}

// ── Error rendering ──────────────────────────────────────────────────────

#[test]
fn errors_render_editor_parseable_lines() {
    let err = parse("@enum Color {\n  RED\n  RED\n}").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r"
    t.loom:2:3: Duplicate: duplicate value in enum: RED
      also declared at t.loom:3:3
    ");
}

// ── Determinism ──────────────────────────────────────────────────────────

#[test]
fn parsing_is_deterministic() {
    let source = "@enum Color { RED BLUE }\n@function f {\n  @input Color\n  @output Color\n}\n@variant[llm] V for f {\n  @client a b\n  @prompt x\n}";
    let a = parse_ok(source);
    let b = parse_ok(source);
    assert_eq!(a.enums, b.enums);
    assert_eq!(a.functions, b.functions);
    assert_eq!(a.variants, b.variants);
}
