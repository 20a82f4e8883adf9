//! Code emission for compiled Loom packages.
//!
//! The emission driver walks the resolved declaration order and hands each
//! declaration, with its transitive dependency names, to an [`Emitter`].
//! Emitters write into an in-memory [`writer::DirectoryWriter`]; nothing
//! touches the filesystem until the final [`writer::DirectoryWriter::flush`],
//! which stages every rendered file and atomically swaps the staging
//! directory over the output root.
//!
//! The writer is an explicit value threaded through the pipeline, so a
//! second compilation in the same process starts from a clean slate.

mod emit;
pub mod python;
pub mod writer;

pub use emit::{emit_unit, Emitter};
