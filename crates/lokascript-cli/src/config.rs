// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compiler settings from `lokascript.toml` and the command line.
//!
//! The file lives next to the scripts (the directory being compiled, or the
//! directory containing a single script). Its `[compiler]` table holds
//! [`CompilerOptions`]; command-line flags override it.

use camino::Utf8Path;
use clap::{Args, ValueEnum};
use lokascript_core::{CompilerOptions, FrontendKind};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs;

pub const CONFIG_FILE: &str = "lokascript.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    compiler: CompilerOptions,
}

/// Front end selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FrontendArg {
    Grammar,
    Semantic,
    Auto,
}

impl From<FrontendArg> for FrontendKind {
    fn from(arg: FrontendArg) -> Self {
        match arg {
            FrontendArg::Grammar => Self::Grammar,
            FrontendArg::Semantic => Self::Semantic,
            FrontendArg::Auto => Self::Auto,
        }
    }
}

/// Flags that override `lokascript.toml`.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Front end to read scripts with
    #[arg(long, value_enum)]
    pub frontend: Option<FrontendArg>,

    /// Language code for the pattern matcher
    #[arg(short, long)]
    pub language: Option<String>,

    /// Minimum confidence for an auto match
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Emit compact output
    #[arg(long)]
    pub minify: bool,

    /// Template variable, as NAME=VALUE
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

fn parse_var(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, found '{arg}'")),
    }
}

/// Parse a `lokascript.toml` file.
pub fn parse_config(path: &Utf8Path) -> Result<CompilerOptions> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config '{path}'"))?;

    let config: ConfigFile = toml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse config '{path}'"))?;

    Ok(config.compiler)
}

/// Look for `lokascript.toml` in `dir`. Missing files yield the defaults.
pub fn find_config(dir: &Utf8Path) -> Result<CompilerOptions> {
    let config_path = dir.join(CONFIG_FILE);
    if config_path
        .try_exists()
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to stat config '{config_path}'"))?
    {
        tracing::debug!(path = %config_path, "loading config");
        parse_config(&config_path)
    } else {
        Ok(CompilerOptions::default())
    }
}

/// Options for compiling `path` (a script or a directory of scripts).
pub fn load_options(path: &Utf8Path, overrides: &Overrides) -> Result<CompilerOptions> {
    let dir = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(Utf8Path::new("."))
    };
    let dir = if dir.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        dir
    };
    let mut options = find_config(dir)?;
    overrides.apply(&mut options);
    Ok(options)
}

impl Overrides {
    pub fn apply(&self, options: &mut CompilerOptions) {
        if let Some(frontend) = self.frontend {
            options.frontend = frontend.into();
        }
        if let Some(language) = &self.language {
            options.language = language.as_str().into();
        }
        if let Some(threshold) = self.threshold {
            options.confidence_threshold = threshold;
        }
        if self.minify {
            options.minify = true;
        }
        for (name, value) in &self.vars {
            options
                .template_vars
                .insert(name.as_str().into(), value.as_str().into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::write(path.join(CONFIG_FILE), content).unwrap();
        path
    }

    #[test]
    fn test_missing_config_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        assert_eq!(find_config(&path).unwrap(), CompilerOptions::default());
    }

    #[test]
    fn test_parse_compiler_table() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
[compiler]
frontend = "semantic"
language = "ja"
minify = true

[compiler.template_vars]
accent = "highlight"
"#,
        );

        let options = find_config(&path).unwrap();
        assert_eq!(options.frontend, FrontendKind::Semantic);
        assert_eq!(options.language, "ja");
        assert!(options.minify);
        assert!((options.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(options.template_vars["accent"], "highlight");
    }

    #[test]
    fn test_empty_config_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "");
        assert_eq!(find_config(&path).unwrap(), CompilerOptions::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[compiler]\noptimise = true\n");
        let err = find_config(&path).unwrap_err();
        assert!(format!("{err:?}").contains("Failed to parse config"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp = TempDir::new().unwrap();
        let dir = write_config(&temp, "[compiler]\nlanguage = \"es\"\nfrontend = \"grammar\"\n");
        let script = dir.join("menu.lks");
        fs::write(&script, "on click toggle .open").unwrap();

        let overrides = Overrides {
            frontend: Some(FrontendArg::Auto),
            language: Some("ko".to_string()),
            threshold: Some(0.5),
            minify: true,
            vars: vec![("cls".to_string(), "open".to_string())],
        };
        let options = load_options(&script, &overrides).unwrap();
        assert_eq!(options.frontend, FrontendKind::Auto);
        assert_eq!(options.language, "ko");
        assert!((options.confidence_threshold - 0.5).abs() < f64::EPSILON);
        assert!(options.minify);
        assert_eq!(options.template_vars["cls"], "open");
    }

    #[test]
    fn test_directory_reads_its_own_config() {
        let temp = TempDir::new().unwrap();
        let dir = write_config(&temp, "[compiler]\nlanguage = \"tr\"\n");
        let options = load_options(&dir, &Overrides::default()).unwrap();
        assert_eq!(options.language, "tr");
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("who=world").unwrap(),
            ("who".to_string(), "world".to_string())
        );
        assert_eq!(
            parse_var("sel=a=b").unwrap(),
            ("sel".to_string(), "a=b".to_string())
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }
}
