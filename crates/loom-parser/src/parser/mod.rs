//! Recursive-descent parser over the flat token stream.
//!
//! The [`Parser`] owns a cursor into the token slice and offers the usual
//! `at`/`bump`/`expect`/`eat` helpers. Errors abort the file immediately;
//! there is no recovery.

mod items;
mod strings;

pub(crate) use strings::{parse_identifier_list, parse_string};

use loom_common::error::{Error, Result};
use loom_common::token::{Token, TokenKind};

use crate::ast::FileAst;

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The current token. Clamped to the final `Eof` so lookahead past the
    /// end is safe.
    pub(crate) fn current(&self) -> &Token {
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Whether the current token has the given kind.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consume and return the current token.
    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind; error otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            let token = self.current();
            Err(Error::syntax(
                token.loc.clone(),
                format!(
                    "expected {}, got: {} ({})",
                    kind.label(),
                    token.value,
                    token.kind.label()
                ),
            ))
        }
    }

    /// Expect an identifier and return its spelling.
    pub(crate) fn expect_name(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Identifier)?.value)
    }
}

/// Parse one file's token stream into a bag of top-level declarations.
///
/// A file is a sequence of `@<keyword> ...` blocks terminated by `Eof`;
/// anything else at top level is a syntax error.
pub fn parse(tokens: &[Token]) -> Result<FileAst> {
    if tokens.is_empty() {
        return Ok(FileAst::default());
    }
    debug_assert!(
        matches!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)),
        "token streams end with Eof"
    );
    let mut p = Parser::new(tokens);
    let mut ast = FileAst::default();

    while p.at(TokenKind::At) {
        p.bump();
        let token = p.current().clone();
        match token.kind {
            TokenKind::Enum => ast.enums.push(items::parse_enum(&mut p)?),
            TokenKind::Class => ast.classes.push(items::parse_class(&mut p)?),
            TokenKind::Function => ast.functions.push(items::parse_function(&mut p)?),
            TokenKind::Variant => ast.variants.extend(items::parse_variant(&mut p)?),
            TokenKind::TestGroup => ast.test_groups.push(items::parse_test_group(&mut p)?),
            TokenKind::Client => ast.clients.push(items::parse_client(&mut p)?),
            _ => {
                return Err(Error::syntax(
                    token.loc,
                    format!("unexpected token: {}", token.value),
                ))
            }
        }
    }

    if !p.at(TokenKind::Eof) {
        let token = p.current();
        return Err(Error::syntax(
            token.loc.clone(),
            format!("did you forget `@`? got: {}", token.value),
        ));
    }
    Ok(ast)
}
