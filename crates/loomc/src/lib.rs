//! The Loom compiler driver.
//!
//! [`compile`] runs the whole pipeline for a filename -> source mapping:
//! tokenize and parse each file, merge into one unit, validate, resolve
//! the dependency order, emit the Python package into an in-memory
//! writer, and atomically flush it under the output directory.
//!
//! [`compile_status`] is the status-code entry point: `0` success, `1`
//! domain error, `2` unexpected internal error, `3` unknown. On failure it
//! fills a fixed 256-byte buffer with the first line of the error message
//! (255-byte payload plus NUL terminator).

pub mod discovery;

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use loom_codegen::python::PyEmitter;
use loom_codegen::writer::DirectoryWriter;
use loom_parser::ast::{DeclId, Unit};
use loom_sema::Resolution;

/// Size of the error buffer handed to [`compile_status`].
pub const ERROR_BUF_LEN: usize = 256;

/// A compilation failure: a domain error from the pipeline, or an I/O
/// failure while writing the output directory.
#[derive(Debug)]
pub enum CompileError {
    Domain(loom_common::error::Error),
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Domain(e) => write!(f, "{e}"),
            CompileError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<loom_common::error::Error> for CompileError {
    fn from(e: loom_common::error::Error) -> Self {
        CompileError::Domain(e)
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

/// Parse, merge, validate, and resolve a set of sources without emitting.
///
/// Files compile in map (filename) order, which makes error order and the
/// merged unit deterministic.
pub fn analyze(files: &BTreeMap<String, String>) -> Result<(Unit, Resolution), loom_common::error::Error> {
    let mut parsed = Vec::new();
    for (name, source) in files {
        parsed.push(loom_parser::parse_source(name, source)?);
    }
    let mut unit = Unit::merge(parsed);
    loom_sema::validate(&mut unit)?;
    let resolution = loom_sema::resolve(&unit)?;
    Ok((unit, resolution))
}

/// Compile sources and write the generated package under `out_dir`.
pub fn compile(out_dir: &Path, files: &BTreeMap<String, String>) -> Result<(), CompileError> {
    let (unit, resolution) = analyze(files)?;
    let mut writer = DirectoryWriter::new();
    let mut emitter = PyEmitter::new();
    loom_codegen::emit_unit(&unit, &resolution, &mut emitter, &mut writer)?;
    writer.flush(out_dir)?;
    Ok(())
}

/// Status-code entry point.
///
/// Returns `0` on success. On failure the buffer receives the first line
/// of the error message, truncated to 255 bytes and NUL-terminated:
/// `1` for domain errors, `2` for I/O and other internal errors, `3` when
/// the pipeline panicked.
pub fn compile_status(
    out_dir: &Path,
    files: &BTreeMap<String, String>,
    error_buf: &mut [u8; ERROR_BUF_LEN],
) -> i32 {
    error_buf.fill(0);
    match catch_unwind(AssertUnwindSafe(|| compile(out_dir, files))) {
        Ok(Ok(())) => 0,
        Ok(Err(CompileError::Domain(e))) => {
            fill_error_buf(error_buf, &e.to_string());
            1
        }
        Ok(Err(CompileError::Io(e))) => {
            fill_error_buf(error_buf, &e.to_string());
            2
        }
        Err(_) => {
            fill_error_buf(error_buf, "unknown error");
            3
        }
    }
}

/// Copy the first line of `message` into the buffer, truncated to 255
/// bytes on a character boundary, NUL-terminated.
fn fill_error_buf(buf: &mut [u8; ERROR_BUF_LEN], message: &str) {
    let first_line = message.lines().next().unwrap_or("");
    let mut end = first_line.len().min(ERROR_BUF_LEN - 1);
    while end > 0 && !first_line.is_char_boundary(end) {
        end -= 1;
    }
    buf[..end].copy_from_slice(&first_line.as_bytes()[..end]);
    buf[end] = 0;
}

/// The buffer's payload as text (up to the NUL).
pub fn error_buf_message(buf: &[u8; ERROR_BUF_LEN]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..end]).unwrap_or("")
}

/// One row of the machine-readable compilation manifest.
#[derive(Debug, serde::Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: &'static str,
    pub deps: Vec<String>,
}

/// The emission order with transitive dependency sets, for
/// `loomc check --json`.
pub fn manifest(unit: &Unit, resolution: &Resolution) -> Vec<ManifestEntry> {
    resolution
        .order
        .iter()
        .map(|id| {
            let name = id.unique_name(unit);
            let deps = resolution.deps_of(&name).to_vec();
            ManifestEntry {
                name,
                kind: decl_kind_name(*id),
                deps,
            }
        })
        .collect()
}

fn decl_kind_name(id: DeclId) -> &'static str {
    match id {
        DeclId::Enum(_) => "enum",
        DeclId::Class(_) => "class",
        DeclId::Client(_) => "client",
        DeclId::Function(_) => "function",
        DeclId::Variant(_) => "variant",
        DeclId::TestGroup(_) => "test_group",
    }
}
