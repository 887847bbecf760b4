// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript check`: validate and parse without generating code.

use camino::Utf8Path;
use lokascript_core::source_analysis::parse_source;
use lokascript_core::validate::validate_basic;
use miette::{NamedSource, Result};

use crate::sources::{Script, read_scripts};

pub fn run(path: &Utf8Path) -> Result<()> {
    let scripts = read_scripts(path)?;
    let failed = scripts.iter().filter(|script| !check_script(script)).count();

    if failed > 0 {
        miette::bail!("{failed} of {} script(s) have errors", scripts.len());
    }
    println!("Checked {} script(s)", scripts.len());
    Ok(())
}

/// Prints the problems with one script. Returns true if it has no errors.
fn check_script(script: &Script) -> bool {
    let basic = validate_basic(&script.source);
    for warning in &basic.warnings {
        eprintln!("warning: {}: {warning}", script.path);
    }
    if !basic.valid {
        for error in &basic.errors {
            eprintln!("error: {}: {error}", script.path);
        }
        return false;
    }

    match parse_source(&script.source) {
        Ok(_) => true,
        Err(error) => {
            let report = miette::Report::new(error).with_source_code(NamedSource::new(
                script.path.as_str(),
                script.source.clone(),
            ));
            eprintln!("{report:?}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    fn script(source: &str) -> Script {
        Script {
            path: Utf8PathBuf::from("test.lks"),
            name: "test".to_string(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_valid_script() {
        assert!(check_script(&script("on click toggle .active")));
    }

    #[test]
    fn test_basic_errors_fail() {
        assert!(!check_script(&script("")));
        assert!(!check_script(&script("log (1")));
    }

    #[test]
    fn test_syntax_errors_fail() {
        assert!(!check_script(&script("put 1 onto #x")));
    }

    #[test]
    fn test_directory_counts_failures() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        fs::write(root.join("ok.lks"), "log 1").unwrap();
        fs::write(root.join("bad.lks"), "put 1 onto #x").unwrap();

        let err = run(&root).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 script(s) have errors");

        fs::remove_file(root.join("bad.lks")).unwrap();
        run(&root).unwrap();
    }
}
