// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript compile`: scripts to JavaScript modules.
//!
//! A single script is written to `--output`, or to stdout. A directory is
//! compiled as a batch; each `name.lks` becomes `name.js` under `--output`,
//! or next to the script when no output directory is given.

use camino::{Utf8Path, Utf8PathBuf};
use lokascript_core::Compiler;
use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use tracing::{debug, info};

use crate::config::{Overrides, load_options};
use crate::diagnostic::ScriptDiagnostic;
use crate::sources::{Script, read_scripts};

pub fn run(path: &Utf8Path, output: Option<&Utf8Path>, overrides: &Overrides) -> Result<()> {
    let options = load_options(path, overrides)?;
    debug!(?options, "compiler options");
    let compiler = Compiler::new(options);
    let scripts = read_scripts(path)?;

    if path.is_dir() {
        compile_directory(&compiler, &scripts, output)
    } else {
        match scripts.as_slice() {
            [script] => compile_file(&compiler, script, output),
            _ => miette::bail!("Expected one script at '{}'", path),
        }
    }
}

fn compile_file(compiler: &Compiler, script: &Script, output: Option<&Utf8Path>) -> Result<()> {
    let compiled = compiler.compile(&script.source).map_err(|e| {
        miette::Report::new(ScriptDiagnostic::from_compile_error(
            &e,
            &script.path,
            &script.source,
        ))
    })?;
    for warning in &compiled.warnings {
        eprintln!("warning: {}: {warning}", script.path);
    }
    info!(
        path = %script.path,
        frontend = ?compiled.frontend,
        helpers = compiled.helpers.len(),
        "compiled"
    );

    match output {
        Some(out) => write_module(out, &compiled.code),
        None => {
            print!("{}", compiled.code);
            Ok(())
        }
    }
}

fn compile_directory(
    compiler: &Compiler,
    scripts: &[Script],
    output: Option<&Utf8Path>,
) -> Result<()> {
    if scripts.is_empty() {
        println!("No scripts found");
        return Ok(());
    }

    let batch = compiler.compile_batch(
        scripts
            .iter()
            .map(|script| (script.name.clone(), script.source.as_str())),
    );

    for script in scripts {
        if let Some(warnings) = batch.warnings.get(&script.name) {
            for warning in warnings {
                eprintln!("warning: {}: {warning}", script.path);
            }
        }
        if let Some(error) = batch.errors.get(&script.name) {
            let report = miette::Report::new(ScriptDiagnostic::from_compile_error(
                error,
                &script.path,
                &script.source,
            ));
            eprintln!("{report:?}");
        }
        if let Some(code) = batch.compiled.get(&script.name) {
            write_module(&module_path(script, output), code)?;
        }
    }

    let failed = batch.errors.len();
    println!(
        "Compiled {} of {} scripts",
        scripts.len() - failed,
        scripts.len()
    );
    if failed > 0 {
        miette::bail!("{failed} script(s) failed to compile");
    }
    Ok(())
}

/// Where the module for `script` goes.
fn module_path(script: &Script, output: Option<&Utf8Path>) -> Utf8PathBuf {
    match output {
        Some(dir) => dir.join(format!("{}.js", script.name)),
        None => script.path.with_extension("js"),
    }
}

fn write_module(path: &Utf8Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create directory '{parent}'"))?;
    }
    fs::write(path, code)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write '{path}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_single_script_to_output_file() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let script = root.join("menu.lks");
        fs::write(&script, "on click toggle .open").unwrap();
        let out = root.join("dist/menu.js");

        run(&script, Some(&out), &Overrides::default()).unwrap();

        let code = fs::read_to_string(&out).unwrap();
        assert!(code.starts_with("import { createContext, toggle } from \"lokascript/runtime\";"));
        assert!(code.contains("toggle(ctx.me, \"open\");"));
    }

    #[test]
    fn test_directory_batch_writes_next_to_scripts() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        fs::create_dir(root.join("nav")).unwrap();
        fs::write(root.join("nav/menu.lks"), "on click toggle .open").unwrap();
        fs::write(root.join("log.lks"), "log 'hi'").unwrap();

        run(&root, None, &Overrides::default()).unwrap();

        assert!(root.join("nav/menu.js").is_file());
        let code = fs::read_to_string(root.join("log.js")).unwrap();
        assert!(code.contains("console.log(\"hi\");"));
    }

    #[test]
    fn test_batch_failures_are_reported_and_others_still_written() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        fs::write(root.join("good.lks"), "log 1").unwrap();
        fs::write(root.join("bad.lks"), "put 1 onto #x").unwrap();
        fs::write(root.join("lokascript.toml"), "[compiler]\nfrontend = \"grammar\"\n").unwrap();
        let out = root.join("dist");

        let err = run(&root, Some(&out), &Overrides::default()).unwrap_err();

        assert!(err.to_string().contains("1 script(s) failed to compile"));
        assert!(out.join("good.js").is_file());
        assert!(!out.join("bad.js").exists());
    }

    #[test]
    fn test_single_script_error_carries_source() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        let script = root.join("bad.lks");
        fs::write(&script, "put 1 onto #x").unwrap();
        let overrides = Overrides {
            frontend: Some(crate::config::FrontendArg::Grammar),
            ..Overrides::default()
        };

        let err = run(&script, Some(&root.join("bad.js")), &overrides).unwrap_err();
        let diagnostic = err.downcast_ref::<ScriptDiagnostic>().unwrap();
        assert!(diagnostic.message.contains("found 'onto'"), "{}", diagnostic.message);
        assert!(!root.join("bad.js").exists());
    }
}
