use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use loomc::{compile, compile_status, error_buf_message, CompileError, ERROR_BUF_LEN};

fn sources(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect()
}

const TYPES_LOOM: &str = "@enum Color { RED BLUE }
@class Query {
  question string
}
";

const CLIENTS_LOOM: &str = "@client[llm] main_client {
  @provider openai
  model gpt-4
}
";

const FUNCTIONS_LOOM: &str = "@function Classify {
  @input Query
  @output Color
}
@variant[llm] v1 for Classify {
  @client main_client
  @prompt {
    Answer with a color for {input.question}.
  }
}
@test_group smoke for Classify {
  @input what color is the sky
}
";

// ── Whole-pipeline compiles ──────────────────────────────────────────────

#[test]
fn compiles_a_multi_file_project_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let files = sources(&[
        ("clients.loom", CLIENTS_LOOM),
        ("functions.loom", FUNCTIONS_LOOM),
        ("types.loom", TYPES_LOOM),
    ]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    let status = compile_status(&out, &files, &mut buf);
    assert_eq!(status, 0, "error: {}", error_buf_message(&buf));
    assert_eq!(error_buf_message(&buf), "");

    assert!(out.join("__init__.py").exists());
    assert!(out.join("py.typed").exists());
    assert!(out.join("custom_types/Color_.py").exists());
    assert!(out.join("custom_types/Query_.py").exists());
    assert!(out.join("clients/llm_main_client.py").exists());
    assert!(out.join("functions/Classify_/__init__.py").exists());
    assert!(out.join("functions/Classify_/variants/llm_v1.py").exists());
    assert!(out.join("functions/Classify_/tests/test_smoke.py").exists());
}

#[test]
fn empty_input_compiles_to_an_empty_package() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let files = sources(&[("empty.loom", "")]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&out, &files, &mut buf), 0);
    assert!(out.join("__init__.py").exists());
    assert!(out.join("py.typed").exists());
}

#[test]
fn recompiling_replaces_the_output_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");

    let first = sources(&[("a.loom", "@enum First { X }")]);
    compile(&out, &first).unwrap();
    assert!(out.join("custom_types/First_.py").exists());

    let second = sources(&[("a.loom", "@enum Second { Y }")]);
    compile(&out, &second).unwrap();
    assert!(out.join("custom_types/Second_.py").exists());
    assert!(!out.join("custom_types/First_.py").exists());
}

// ── Status codes and the error buffer ────────────────────────────────────

#[test]
fn domain_errors_return_status_1_with_the_first_line() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let files = sources(&[
        ("a.loom", "@enum Color { RED }"),
        ("b.loom", "@enum Color { BLUE }"),
    ]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&out, &files, &mut buf), 1);
    let message = error_buf_message(&buf);
    assert_eq!(message, "a.loom:1:2: Duplicate: duplicate name `Color` in enum Color");
    assert!(!out.exists());
}

#[test]
fn self_fallback_is_a_domain_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = sources(&[(
        "c.loom",
        "@client[llm] c {\n  @provider p\n  model m\n  @fallback c\n}",
    )]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&dir.path().join("out"), &files, &mut buf), 1);
    assert_eq!(error_buf_message(&buf), "c.loom:1:2: Syntax: cannot fallback to self");
}

#[test]
fn mutual_fallbacks_fail_as_circular() {
    let dir = tempfile::tempdir().unwrap();
    let files = sources(&[(
        "c.loom",
        "@client[llm] a {\n  @provider p\n  model m\n  @fallback b\n}\n@client[llm] b {\n  @provider p\n  model m\n  @fallback a\n}",
    )]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&dir.path().join("out"), &files, &mut buf), 1);
    assert!(error_buf_message(&buf).contains("Circular"));
}

#[test]
fn error_buffer_truncates_to_255_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let long_name = "a".repeat(300);
    let source = format!("@enum {long_name} {{ X }}\n@class {long_name} {{\n  p int\n}}");
    let files = sources(&[("long.loom", source.as_str())]);

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&dir.path().join("out"), &files, &mut buf), 1);
    let message = error_buf_message(&buf);
    assert_eq!(message.len(), 255);
    assert!(message.starts_with("long.loom:1:2: Duplicate:"));
    assert_eq!(buf[255], 0);
}

#[test]
fn unwritable_output_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    // The output root's parent is a file, so staging cannot be created.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let out = blocker.join("generated");

    let files = sources(&[("a.loom", "@enum E { X }")]);
    let err = compile(&out, &files).unwrap_err();
    assert!(matches!(err, CompileError::Io(_)));

    let mut buf = [0u8; ERROR_BUF_LEN];
    assert_eq!(compile_status(&out, &files, &mut buf), 2);
    assert!(!error_buf_message(&buf).is_empty());
}

// ── Ordering and dependencies through the manifest ───────────────────────

#[test]
fn minimal_function_manifest() {
    let files = sources(&[(
        "m.loom",
        "@enum Color { RED BLUE }\n@function f {\n  @input Color\n  @output Color\n}",
    )]);
    let (unit, resolution) = loomc::analyze(&files).unwrap();
    let manifest = loomc::manifest(&unit, &resolution);
    let names: Vec<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Color", "f"]);
    assert_eq!(manifest[1].deps, vec!["Color"]);
}

#[test]
fn fan_out_appears_in_the_manifest() {
    let files = sources(&[(
        "m.loom",
        "@client[llm] a {\n  @provider p\n  model m\n}\n@client[llm] b {\n  @provider p\n  model m\n}\n@function f {\n  @input int\n  @output int\n}\n@variant[llm] V for f {\n  @client a b\n  @prompt x\n}",
    )]);
    let (unit, resolution) = loomc::analyze(&files).unwrap();
    let manifest = loomc::manifest(&unit, &resolution);
    let names: Vec<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"f::V_a"));
    assert!(names.contains(&"f::V_b"));
    assert!(!names.contains(&"f::V"));
}

#[test]
fn analysis_is_idempotent() {
    let files = sources(&[
        ("clients.loom", CLIENTS_LOOM),
        ("functions.loom", FUNCTIONS_LOOM),
        ("types.loom", TYPES_LOOM),
    ]);
    let (unit_a, res_a) = loomc::analyze(&files).unwrap();
    let (unit_b, res_b) = loomc::analyze(&files).unwrap();
    let a = serde_json::to_string(&loomc::manifest(&unit_a, &res_a)).unwrap();
    let b = serde_json::to_string(&loomc::manifest(&unit_b, &res_b)).unwrap();
    assert_eq!(a, b);
}

// ── CLI binary ───────────────────────────────────────────────────────────

fn write_project(dir: &Path) {
    std::fs::write(dir.join("types.loom"), TYPES_LOOM).unwrap();
    std::fs::write(dir.join("clients.loom"), CLIENTS_LOOM).unwrap();
    std::fs::write(dir.join("functions.loom"), FUNCTIONS_LOOM).unwrap();
}

#[test]
fn check_subcommand_prints_the_order() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_loomc"))
        .arg("check")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "enum Color",
            "class Query",
            "client main_client",
            "function Classify",
            "variant Classify::v1",
            "test_group Classify::smoke",
        ]
    );
}

#[test]
fn check_json_subcommand_emits_a_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_loomc"))
        .arg("check")
        .arg(dir.path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = manifest.as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0]["name"], "Color");
    assert_eq!(entries[0]["kind"], "enum");
}

#[test]
fn build_subcommand_writes_the_package() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let out = dir.path().join("pkg");

    let output = Command::new(env!("CARGO_BIN_EXE_loomc"))
        .arg("build")
        .arg(dir.path())
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("custom_types/Color_.py").exists());
}

#[test]
fn build_subcommand_reports_domain_errors_with_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.loom"), "@enum Empty {}").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_loomc"))
        .arg("build")
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad.loom:1:2: Syntax: enum must have at least one value"));
}
