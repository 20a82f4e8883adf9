//! Python backend: emits the generated package consumed by the `loom_py`
//! runtime.
//!
//! Package shape:
//!
//! ```text
//! custom_types/<Name>_.py          one module per enum/class
//! custom_types/__init__.py         re-exports
//! custom_types/stringify.py        re-exports the Stringify wrappers
//! clients/llm_<name>.py            one module per LLM client
//! clients/__init__.py              re-exports
//! functions/<name>_/__init__.py    async dispatch over the variants
//! functions/<name>_/variants/      one module per variant
//! functions/<name>_/tests/         one pytest module per test group
//! __init__.py, py.typed            package markers
//! ```

mod functions;
mod types;
mod util;

use loom_common::error::Result;
use loom_parser::ast::{DeclId, Unit};
use loom_sema::Resolution;

use crate::writer::DirectoryWriter;
use crate::Emitter;

/// The Python emitter. Stateless; all buffering lives in the writer.
#[derive(Debug, Default)]
pub struct PyEmitter;

impl PyEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for PyEmitter {
    fn emit(
        &mut self,
        unit: &Unit,
        id: DeclId,
        deps: &[String],
        out: &mut DirectoryWriter,
    ) -> Result<()> {
        match id {
            DeclId::Enum(i) => types::emit_enum(unit, i, out),
            DeclId::Class(i) => types::emit_class(unit, i, deps, out),
            DeclId::Client(i) => types::emit_client(unit, i, out),
            DeclId::Function(i) => functions::emit_function(unit, i, deps, out),
            DeclId::Variant(i) => functions::emit_variant(unit, i, deps, out),
            DeclId::TestGroup(i) => functions::emit_test_group(unit, i, deps, out),
        }
    }

    fn finish(&mut self, _unit: &Unit, out: &mut DirectoryWriter) -> Result<()> {
        out.file("__init__.py");
        out.file("py.typed");
        Ok(())
    }
}

/// Convenience for driving the whole emission with this backend.
pub fn emit(unit: &Unit, resolution: &Resolution, out: &mut DirectoryWriter) -> Result<()> {
    let mut emitter = PyEmitter::new();
    crate::emit_unit(unit, resolution, &mut emitter, out)
}
