//! Loom parser: token stream to typed AST.
//!
//! A file is a sequence of `@<keyword> ...` blocks terminated by `Eof`.
//! The parser dispatches on the keyword after the leading `@` and builds
//! one [`ast::FileAst`] bag of top-level declarations per file. Parsing is
//! fail-fast: the first error aborts the file.
//!
//! All AST values are immutable after parsing except for the two linking
//! passes performed by the validator (variant/test-group attachment and
//! type-reference binding).

pub mod ast;
mod parser;

pub use parser::parse;

use loom_common::error::Result;

/// Tokenize and parse one source file.
pub fn parse_source(file: &str, source: &str) -> Result<ast::FileAst> {
    let tokens = loom_lexer::Lexer::tokenize(file, source);
    parse(&tokens)
}
