// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Locating and reading `.lks` scripts.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use std::fs;

pub const SCRIPT_EXTENSION: &str = "lks";

/// A script read from disk.
#[derive(Debug, Clone)]
pub struct Script {
    pub path: Utf8PathBuf,
    /// Path relative to the search root, without extension. Batch output is
    /// keyed by this name.
    pub name: String,
    pub source: String,
}

/// The scripts at `path`: the file itself, or every `.lks` file below a
/// directory, sorted by path.
pub fn find_scripts(path: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension() == Some(SCRIPT_EXTENSION) {
            files.push(path.to_path_buf());
        } else {
            miette::bail!("File '{}' is not a .{} script", path, SCRIPT_EXTENSION);
        }
    } else if path.is_dir() {
        collect_scripts_recursive(path, &mut files)?;
        files.sort();
    } else {
        miette::bail!("Path '{}' does not exist", path);
    }

    Ok(files)
}

/// Symlinks are skipped to avoid cycles.
fn collect_scripts_recursive(dir: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let entry_path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path"))?;

        if file_type.is_dir() {
            collect_scripts_recursive(&entry_path, files)?;
        } else if file_type.is_file() && entry_path.extension() == Some(SCRIPT_EXTENSION) {
            files.push(entry_path);
        }
    }
    Ok(())
}

/// Reads every script at `path`.
pub fn read_scripts(path: &Utf8Path) -> Result<Vec<Script>> {
    let root = if path.is_dir() { Some(path) } else { None };
    find_scripts(path)?
        .into_iter()
        .map(|file| {
            let source = fs::read_to_string(&file)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read script '{file}'"))?;
            Ok(Script {
                name: script_name(&file, root),
                path: file,
                source,
            })
        })
        .collect()
}

/// `root/nav/menu.lks` is named `nav/menu`.
fn script_name(file: &Utf8Path, root: Option<&Utf8Path>) -> String {
    let relative = root
        .and_then(|root| file.strip_prefix(root).ok())
        .unwrap_or_else(|| Utf8Path::new(file.file_name().unwrap_or(file.as_str())));
    let stem = relative.with_extension("");
    stem.components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_single_file() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let file = root.join("menu.lks");
        fs::write(&file, "on click toggle .open").unwrap();

        let scripts = read_scripts(&file).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "menu");
        assert_eq!(scripts[0].source, "on click toggle .open");
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp_root(&temp).join("menu.js");
        fs::write(&file, "").unwrap();
        let err = find_scripts(&file).unwrap_err();
        assert!(err.to_string().contains("is not a .lks script"));
    }

    #[test]
    fn test_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = find_scripts(&temp_root(&temp).join("nowhere")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_directory_walk_is_sorted_and_nested() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        fs::create_dir(root.join("nav")).unwrap();
        fs::write(root.join("nav/menu.lks"), "toggle .open").unwrap();
        fs::write(root.join("b.lks"), "log 2").unwrap();
        fs::write(root.join("a.lks"), "log 1").unwrap();
        fs::write(root.join("notes.txt"), "ignored").unwrap();

        let scripts = read_scripts(&root).unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "nav/menu"]);
    }
}
