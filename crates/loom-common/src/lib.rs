//! Shared leaf types for the Loom compiler: source locations, tokens,
//! and the error taxonomy used by every phase.

pub mod error;
pub mod loc;
pub mod token;
