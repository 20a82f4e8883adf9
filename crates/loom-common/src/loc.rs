use std::fmt;
use std::sync::Arc;

/// A 1-based source position: file, line, and column.
///
/// The Loom lexer is line-oriented, so positions are tracked directly as
/// line/column pairs rather than byte offsets. Columns count bytes within
/// a line; a tab occupies a single column. The file name is shared via
/// `Arc` so tokens clone cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loc {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Loc {
    /// Create a new location.
    pub fn new(file: Arc<str>, line: u32, column: u32) -> Self {
        debug_assert!(line >= 1 && column >= 1, "positions are 1-based");
        Self { file, line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
