//! Source file discovery for Loom projects.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Recursively discover all `.loom` files in a project directory.
///
/// Returns paths relative to `project_root`, sorted for determinism.
/// Hidden files and directories (names starting with `.`) are skipped.
pub fn discover_loom_files(project_root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    discover_recursive(project_root, project_root, &mut files)
        .map_err(|e| format!("failed to walk directory '{}': {}", project_root.display(), e))?;
    files.sort();
    Ok(files)
}

fn discover_recursive(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        let file_name = entry.file_name();
        let name_str = file_name.to_string_lossy();

        if name_str.starts_with('.') {
            continue;
        }

        if entry_path.is_dir() {
            discover_recursive(root, &entry_path, files)?;
        } else if entry_path.extension().and_then(|e| e.to_str()) == Some("loom") {
            let relative = entry_path
                .strip_prefix(root)
                .unwrap_or(&entry_path)
                .to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

/// Read every discovered file into a filename -> source mapping keyed by
/// the relative path.
pub fn load_sources(project_root: &Path) -> Result<BTreeMap<String, String>, String> {
    let mut sources = BTreeMap::new();
    for relative in discover_loom_files(project_root)? {
        let full = project_root.join(&relative);
        let content = std::fs::read_to_string(&full)
            .map_err(|e| format!("failed to read '{}': {}", full.display(), e))?;
        sources.insert(relative.to_string_lossy().into_owned(), content);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.loom"), "").unwrap();
        std::fs::write(dir.path().join("a.loom"), "").unwrap();
        std::fs::write(dir.path().join("sub/c.loom"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = discover_loom_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.loom"),
                PathBuf::from("b.loom"),
                PathBuf::from("sub/c.loom"),
            ]
        );
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden/x.loom"), "").unwrap();
        std::fs::write(dir.path().join(".secret.loom"), "").unwrap();
        std::fs::write(dir.path().join("ok.loom"), "").unwrap();

        let files = discover_loom_files(dir.path()).unwrap();
        assert_eq!(files, vec![PathBuf::from("ok.loom")]);
    }

    #[test]
    fn load_sources_reads_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m.loom"), "@enum E { X }").unwrap();
        let sources = load_sources(dir.path()).unwrap();
        assert_eq!(sources.get("m.loom").map(String::as_str), Some("@enum E { X }"));
    }
}
