use std::fmt;

use crate::loc::Loc;

/// Result alias used throughout the compiler.
pub type Result<T> = std::result::Result<T, Error>;

/// A compilation error with source provenance.
///
/// The first error in any phase aborts the whole compilation; there is no
/// recovery and no multi-error reporting. Every variant renders as
/// `<file>:<line>:<col>: <Kind>: <message>` on its first line so editors
/// can parse it.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed tokens, missing keywords, unterminated multi-line strings,
    /// invalid types, invalid identifiers.
    Syntax { loc: Loc, message: String },
    /// A repeated name at the same scope. Carries every offending location:
    /// the primary one plus each additional sighting.
    Duplicate {
        loc: Loc,
        also: Vec<Loc>,
        message: String,
    },
    /// A reference to an unknown function, client, or type.
    Undefined { loc: Loc, message: String },
    /// The dependency graph has a residual after topological sorting.
    Circular { loc: Loc, message: String },
}

impl Error {
    pub fn syntax(loc: Loc, message: impl Into<String>) -> Self {
        Error::Syntax {
            loc,
            message: message.into(),
        }
    }

    pub fn duplicate(loc: Loc, also: Vec<Loc>, message: impl Into<String>) -> Self {
        Error::Duplicate {
            loc,
            also,
            message: message.into(),
        }
    }

    pub fn undefined(loc: Loc, message: impl Into<String>) -> Self {
        Error::Undefined {
            loc,
            message: message.into(),
        }
    }

    pub fn circular(loc: Loc, message: impl Into<String>) -> Self {
        Error::Circular {
            loc,
            message: message.into(),
        }
    }

    /// The primary (blame) location.
    pub fn loc(&self) -> &Loc {
        match self {
            Error::Syntax { loc, .. }
            | Error::Duplicate { loc, .. }
            | Error::Undefined { loc, .. }
            | Error::Circular { loc, .. } => loc,
        }
    }

    /// The error kind as rendered in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Syntax { .. } => "Syntax",
            Error::Duplicate { .. } => "Duplicate",
            Error::Undefined { .. } => "Undefined",
            Error::Circular { .. } => "Circular",
        }
    }

    /// The bare message without location or kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Syntax { message, .. }
            | Error::Duplicate { message, .. }
            | Error::Undefined { message, .. }
            | Error::Circular { message, .. } => message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.loc(),
            self.kind_name(),
            self.message()
        )?;
        if let Error::Duplicate { also, .. } = self {
            for loc in also {
                write!(f, "\n  also declared at {loc}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
