// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript analyze`: print a script's analysis as JSON.

use camino::Utf8Path;
use lokascript_core::metadata::ScriptMetadata;
use lokascript_core::semantic_analysis::AnalysisResult;
use lokascript_core::{Compiler, FrontendKind};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::config::{Overrides, load_options};
use crate::diagnostic::ScriptDiagnostic;
use crate::sources::read_scripts;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    path: &'a str,
    frontend: FrontendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    analysis: &'a AnalysisResult,
    metadata: &'a ScriptMetadata,
}

pub fn run(path: &Utf8Path, overrides: &Overrides) -> Result<()> {
    println!("{}", render(path, overrides)?);
    Ok(())
}

fn render(path: &Utf8Path, overrides: &Overrides) -> Result<String> {
    let compiler = Compiler::new(load_options(path, overrides)?);
    let mut reports = Vec::new();
    for script in read_scripts(path)? {
        let output = compiler.compile(&script.source).map_err(|e| {
            miette::Report::new(ScriptDiagnostic::from_compile_error(
                &e,
                &script.path,
                &script.source,
            ))
        })?;
        let report = Report {
            path: script.path.as_str(),
            frontend: output.frontend,
            confidence: output.confidence,
            analysis: &output.analysis,
            metadata: &output.metadata,
        };
        reports.push(serde_json::to_value(&report).into_diagnostic()?);
    }

    let json = match reports.as_slice() {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(&reports),
    };
    json.into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reports_analysis_and_metadata() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let script = root.join("menu.lks");
        fs::write(&script, "add .open to #menu").unwrap();
        let overrides = Overrides {
            frontend: Some(crate::config::FrontendArg::Grammar),
            ..Overrides::default()
        };

        let json: serde_json::Value =
            serde_json::from_str(&render(&script, &overrides).unwrap()).unwrap();
        assert_eq!(json["frontend"], "grammar");
        assert!(json.get("confidence").is_none());
        assert_eq!(json["metadata"]["commands"], serde_json::json!(["add"]));
        assert_eq!(json["metadata"]["selectors"], serde_json::json!([".open", "#menu"]));
    }
}
