//! Loom lexer -- line-oriented tokenizer for the Loom DSL.
//!
//! The lexer is a single pass over the source, one line at a time. It never
//! looks across lines except to advance the 1-based line counter. Keywords
//! only exist after an `@` sigil: the identifier immediately following `@`
//! is looked up in the keyword table, every other identifier stays an
//! `Identifier` even when it spells a keyword. There are no string literals
//! at the token level; quoted content is reassembled later by the parser's
//! string helpers.
//!
//! The lexer is total: any input produces a token stream ending in a single
//! `Eof` token at column 1 on the line after the last content line.

use std::sync::Arc;

use loom_common::loc::Loc;
use loom_common::token::{keyword_kind, Token, TokenKind};

/// The Loom lexer. Converts source text into a flat token stream.
pub struct Lexer {
    file: Arc<str>,
    line: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Tokenize an entire source file.
    ///
    /// The returned vector always ends with exactly one `Eof` token.
    pub fn tokenize(file: &str, source: &str) -> Vec<Token> {
        let mut lexer = Lexer {
            file: Arc::from(file),
            line: 1,
            tokens: Vec::new(),
        };
        let mut line_count = 0u32;
        for text in source.lines() {
            lexer.line = line_count + 1;
            lexer.lex_line(text);
            line_count += 1;
        }
        let eof_line = line_count + 1;
        let loc = Loc::new(lexer.file.clone(), eof_line, 1);
        lexer.tokens.push(Token::new(loc, TokenKind::Eof, "[EOF]"));
        lexer.tokens
    }

    /// Tokenize one line, appending tokens to the stream.
    fn lex_line(&mut self, text: &str) {
        let mut column: u32 = 1;
        let mut pending = String::new();
        // Set by `@`, cleared by any flush: only the identifier glued
        // directly onto an `@` is a keyword candidate.
        let mut after_at = false;

        for c in text.chars() {
            match c {
                '{' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    self.push(TokenKind::LBrace, "{", column);
                    column += 1;
                }
                '}' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    self.push(TokenKind::RBrace, "}", column);
                    column += 1;
                }
                ',' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    self.push(TokenKind::Comma, ",", column);
                    column += 1;
                }
                ':' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    self.push(TokenKind::Colon, ":", column);
                    column += 1;
                }
                '@' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    self.push(TokenKind::At, "@", column);
                    after_at = true;
                    column += 1;
                }
                ' ' | '\t' | '\r' => {
                    self.flush(&mut pending, &mut column, &mut after_at);
                    column += 1;
                }
                _ => pending.push(c),
            }
        }
        self.flush(&mut pending, &mut column, &mut after_at);
    }

    /// Flush the pending identifier accumulator, if any.
    ///
    /// Columns count bytes, so a flushed identifier advances the column by
    /// its byte length. The `@`-candidate flag is cleared unconditionally:
    /// whitespace between `@` and a word demotes it to a plain identifier.
    fn flush(&mut self, pending: &mut String, column: &mut u32, after_at: &mut bool) {
        if !pending.is_empty() {
            let kind = if *after_at {
                keyword_kind(pending)
            } else {
                TokenKind::Identifier
            };
            let value = std::mem::take(pending);
            let len = value.len() as u32;
            self.push_owned(kind, value, *column);
            *column += len;
        }
        *after_at = false;
    }

    fn push(&mut self, kind: TokenKind, value: &str, column: u32) {
        self.push_owned(kind, value.to_string(), column);
    }

    fn push_owned(&mut self, kind: TokenKind, value: String, column: u32) {
        let loc = Loc::new(self.file.clone(), self.line, column);
        self.tokens.push(Token { loc, kind, value });
    }
}
