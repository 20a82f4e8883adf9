use crate::loc::Loc;

/// A token produced by the Loom lexer.
///
/// Every token carries its source location and the raw spelling it was
/// built from. Parametric keywords (`variant[llm]`, `lang[py]`, ...) keep
/// the full spelling in `value` so downstream parsers can recover the
/// bracketed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub loc: Loc,
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    /// Create a new token.
    pub fn new(loc: Loc, kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            loc,
            kind,
            value: value.into(),
        }
    }

    /// The payload between the brackets of a parametric keyword spelling,
    /// e.g. `"llm"` for `variant[llm]` or `"503"` for `fallback[503]`.
    pub fn bracket_payload(&self) -> Option<&str> {
        let open = self.value.find('[')?;
        let close = self.value.rfind(']')?;
        if close > open {
            Some(&self.value[open + 1..close])
        } else {
            None
        }
    }
}

/// Every kind of token in the Loom DSL.
///
/// Keywords only exist after an `@` sigil; an identifier that merely spells
/// a keyword stays an [`Identifier`](TokenKind::Identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Structural ─────────────────────────────────────────────────────
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `@`
    At,

    // ── Bare keywords ──────────────────────────────────────────────────
    Enum,
    Class,
    Function,
    Method,
    Prompt,
    Input,
    Output,
    DependsOn,
    TestGroup,
    Case,
    Provider,
    Retry,
    Rename,
    Describe,
    Skip,
    Stringify,

    // ── Parametric keywords ────────────────────────────────────────────
    /// `variant[llm]` / `variant[code]`
    Variant,
    /// `lang[py]` / `lang[ts]`
    Lang,
    /// `client[llm]`; also accepted bare inside variant bodies
    Client,
    /// `fallback` or `fallback[<code>]`
    Fallback,

    // ── Special ────────────────────────────────────────────────────────
    Identifier,
    Eof,
}

impl TokenKind {
    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::LBrace => "left curly bracket ({)",
            TokenKind::RBrace => "right curly bracket (})",
            TokenKind::Comma => "comma (,)",
            TokenKind::Colon => "colon (:)",
            TokenKind::At => "at symbol (@)",
            TokenKind::Enum => "@enum",
            TokenKind::Class => "@class",
            TokenKind::Function => "@function",
            TokenKind::Method => "@method",
            TokenKind::Prompt => "@prompt",
            TokenKind::Input => "@input",
            TokenKind::Output => "@output",
            TokenKind::DependsOn => "@depends_on",
            TokenKind::TestGroup => "@test_group",
            TokenKind::Case => "@case",
            TokenKind::Provider => "@provider",
            TokenKind::Retry => "@retry",
            TokenKind::Rename => "@rename",
            TokenKind::Describe => "@describe",
            TokenKind::Skip => "@skip",
            TokenKind::Stringify => "@stringify",
            TokenKind::Variant => "@variant[*]",
            TokenKind::Lang => "@lang[*]",
            TokenKind::Client => "@client[*]",
            TokenKind::Fallback => "@fallback[*]",
            TokenKind::Identifier => "identifier",
            TokenKind::Eof => "end of file",
        }
    }
}

/// Look up the keyword kind for an identifier spelling.
///
/// Only called for identifiers that immediately follow `@`. Returns
/// [`TokenKind::Identifier`] when the spelling is not a keyword.
/// Parametric keywords are recognized by prefix and suffix so the payload
/// survives in the token value; `client` and `fallback` are also accepted
/// bare.
pub fn keyword_kind(spelling: &str) -> TokenKind {
    match spelling {
        "enum" => TokenKind::Enum,
        "class" => TokenKind::Class,
        "function" => TokenKind::Function,
        "method" => TokenKind::Method,
        "prompt" => TokenKind::Prompt,
        "input" => TokenKind::Input,
        "output" => TokenKind::Output,
        "depends_on" => TokenKind::DependsOn,
        "test_group" => TokenKind::TestGroup,
        "case" => TokenKind::Case,
        "provider" => TokenKind::Provider,
        "retry" => TokenKind::Retry,
        "rename" => TokenKind::Rename,
        "describe" => TokenKind::Describe,
        "skip" => TokenKind::Skip,
        "stringify" => TokenKind::Stringify,
        "client" => TokenKind::Client,
        "fallback" => TokenKind::Fallback,
        _ => {
            if spelling.starts_with("variant[") && spelling.ends_with(']') {
                TokenKind::Variant
            } else if spelling.starts_with("lang[") && spelling.ends_with(']') {
                TokenKind::Lang
            } else if spelling.starts_with("client[") && spelling.ends_with(']') {
                TokenKind::Client
            } else if spelling.starts_with("fallback[") && spelling.ends_with(']') {
                TokenKind::Fallback
            } else {
                TokenKind::Identifier
            }
        }
    }
}
