//! String and identifier-list reassembly.
//!
//! There are no string literals at the token level. Wherever the grammar
//! expects a string, either all tokens on one source line are glued back
//! together (single-line form) or a `{`-delimited block is reassembled with
//! its original line breaks (multi-line form). Reconstruction uses token
//! columns, so the original gap widths are preserved; continuation lines
//! must not dedent past the first token's column.

use loom_common::error::{Error, Result};
use loom_common::token::{Token, TokenKind};

use super::Parser;

/// Glue a token run back into a string using column arithmetic.
pub(crate) fn tokens_to_string(tokens: &[Token]) -> Result<String> {
    let Some(first) = tokens.first() else {
        return Ok(String::new());
    };
    let mut result = String::new();
    let mut last_line = first.loc.line;
    let dedent = first.loc.column;
    let mut last_column = dedent;

    for token in tokens {
        if token.loc.line > last_line {
            for _ in 0..(token.loc.line - last_line) {
                result.push('\n');
            }
            last_column = dedent;
            last_line = token.loc.line;
        }
        if token.loc.column < last_column {
            return Err(Error::syntax(
                token.loc.clone(),
                "string continuation lines must be indented to match the first line",
            ));
        }
        for _ in 0..(token.loc.column - last_column) {
            result.push(' ');
        }
        result.push_str(&token.value);
        last_column = token.loc.column + token.value.len() as u32;
    }
    Ok(result)
}

/// Parse a string in either surface form.
pub(crate) fn parse_string(p: &mut Parser) -> Result<String> {
    if p.at(TokenKind::LBrace) {
        parse_multi_line_string(p)
    } else {
        parse_single_line_string(p)
    }
}

/// `{ ... }` with nested braces balance-counted and included verbatim.
fn parse_multi_line_string(p: &mut Parser) -> Result<String> {
    p.expect(TokenKind::LBrace)?;
    let mut depth = 1u32;
    let mut tokens = Vec::new();
    loop {
        let token = p.current().clone();
        match token.kind {
            TokenKind::Eof => {
                return Err(Error::syntax(token.loc, "missing closing `}`"));
            }
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            p.bump();
            break;
        }
        tokens.push(p.bump());
    }
    tokens_to_string(&tokens)
}

/// All tokens on the current token's source line.
fn parse_single_line_string(p: &mut Parser) -> Result<String> {
    let line = p.current().loc.line;
    let mut tokens = Vec::new();
    while !p.at(TokenKind::Eof) && p.current().loc.line == line {
        tokens.push(p.bump());
    }
    tokens_to_string(&tokens)
}

/// An identifier list: either brace-delimited (one per line or several per
/// line) or all identifiers on the current line.
pub(crate) fn parse_identifier_list(p: &mut Parser) -> Result<Vec<String>> {
    let mut result = Vec::new();
    if p.at(TokenKind::LBrace) {
        p.bump();
        while !p.at(TokenKind::RBrace) {
            result.push(p.expect_name()?);
        }
        p.expect(TokenKind::RBrace)?;
    } else {
        let line = p.current().loc.line;
        while !p.at(TokenKind::Eof) && p.current().loc.line == line {
            result.push(p.expect_name()?);
        }
    }
    Ok(result)
}
