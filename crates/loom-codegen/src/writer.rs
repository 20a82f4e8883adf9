//! In-memory file buffers and the atomic directory writer.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// One registered import: `from <module> import <symbol>`, optionally
/// re-exported through `__all__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub symbol: String,
    pub re_export: bool,
}

/// A buffered output file: body text, template variables, and an import
/// registry.
///
/// Emitters append template text containing `{@@key}` variables and
/// register imports as they go; rendering happens once at flush time.
/// Imports are deduplicated by the full `(module, symbol, re_export)`
/// triple -- the driver guarantees order, the buffer guarantees
/// uniqueness.
#[derive(Debug, Default)]
pub struct FileBuffer {
    content: String,
    template_vars: BTreeMap<String, String>,
    imports: Vec<Import>,
}

impl FileBuffer {
    /// Append raw template text to the file body.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Set a `{@@key}` template variable.
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.template_vars.insert(key.into(), value.into());
    }

    /// Register an import, ignoring exact duplicates.
    pub fn add_import(&mut self, module: impl Into<String>, symbol: impl Into<String>, re_export: bool) {
        let import = Import {
            module: module.into(),
            symbol: symbol.into(),
            re_export,
        };
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Render the file: import block, template-expanded body, and an
    /// `__all__` list when anything is re-exported.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for import in &self.imports {
            out.push_str(&format!("from {} import {}\n", import.module, import.symbol));
        }

        let mut body = self.content.clone();
        for (key, value) in &self.template_vars {
            body = body.replace(&format!("{{@@{key}}}"), value);
        }
        out.push_str(&body);

        let exported: Vec<&str> = self
            .imports
            .iter()
            .filter(|i| i.re_export)
            .map(|i| i.symbol.as_str())
            .collect();
        if !exported.is_empty() {
            out.push_str("\n__all__ = [");
            for (i, symbol) in exported.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&format!("\"{symbol}\""));
            }
            out.push_str("]\n");
        }
        out
    }
}

/// Buffers every output file of one compilation and writes them in a
/// single atomic swap.
#[derive(Debug, Default)]
pub struct DirectoryWriter {
    files: BTreeMap<String, FileBuffer>,
}

impl DirectoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer for a relative output path, created on first use.
    pub fn file(&mut self, path: impl Into<String>) -> &mut FileBuffer {
        self.files.entry(path.into()).or_default()
    }

    /// Number of buffered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Render every buffered file under a staging directory sibling to
    /// `root`, then atomically rename the staging directory over `root`,
    /// removing any prior contents.
    pub fn flush(&self, root: &Path) -> io::Result<()> {
        let parent = root.parent().unwrap_or_else(|| Path::new("."));
        let staging = parent.join(".loom.tmp");
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        for (path, buffer) in &self.files {
            let full = staging.join(path);
            if let Some(dir) = full.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(&full, buffer.render())?;
        }

        if root.exists() {
            fs::remove_dir_all(root)?;
        }
        fs::rename(&staging, root)?;
        Ok(())
    }
}
