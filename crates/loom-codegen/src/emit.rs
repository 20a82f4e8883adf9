//! The emitter contract and the emission driver.

use loom_common::error::Result;
use loom_parser::ast::{DeclId, Unit};
use loom_sema::Resolution;

use crate::writer::DirectoryWriter;

/// A code backend. The driver calls [`Emitter::emit`] once per declaration
/// in dependency order, then [`Emitter::finish`] after the last one.
pub trait Emitter {
    /// Emit one declaration given its transitive dependency names.
    fn emit(
        &mut self,
        unit: &Unit,
        id: DeclId,
        deps: &[String],
        out: &mut DirectoryWriter,
    ) -> Result<()>;

    /// Called once after every declaration has been emitted.
    fn finish(&mut self, unit: &Unit, out: &mut DirectoryWriter) -> Result<()> {
        let _ = (unit, out);
        Ok(())
    }
}

/// Walk the ordered declarations and drive the emitter over each.
pub fn emit_unit(
    unit: &Unit,
    resolution: &Resolution,
    emitter: &mut dyn Emitter,
    out: &mut DirectoryWriter,
) -> Result<()> {
    for id in &resolution.order {
        let name = id.unique_name(unit);
        emitter.emit(unit, *id, resolution.deps_of(&name), out)?;
    }
    emitter.finish(unit, out)
}
