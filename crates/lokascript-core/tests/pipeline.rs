// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end compilation through the public API.

use lokascript_core::interchange::{from_grammar_node, from_semantic_node};
use lokascript_core::semantic::{Direction, SemanticParser, supported_languages};
use lokascript_core::semantic_analysis::analyze;
use lokascript_core::source_analysis::parse_source;
use lokascript_core::validate::validate;
use lokascript_core::{CompileErrorKind, Compiler, CompilerOptions, FrontendKind};

fn compiler(frontend: FrontendKind, language: &str) -> Compiler {
    Compiler::new(CompilerOptions {
        frontend,
        language: language.into(),
        ..CompilerOptions::default()
    })
}

#[test]
fn front_ends_produce_the_same_module() {
    for source in ["on click toggle .active", "add .a to #box"] {
        let grammar = compiler(FrontendKind::Grammar, "en").compile(source).unwrap();
        let semantic = compiler(FrontendKind::Semantic, "en").compile(source).unwrap();
        assert_eq!(grammar.code, semantic.code, "{source}");
        assert_eq!(grammar.helpers, semantic.helpers, "{source}");
    }
}

#[test]
fn one_handler_in_several_languages() {
    let cases = [
        ("ja", "クリック で .active を 切り替え"),
        ("ja", "クリックで.activeを切り替え"),
        ("ko", "클릭 시 .active를 토글"),
        ("zh", "当 点击 时 切换 .active"),
    ];
    for (language, source) in cases {
        let output = compiler(FrontendKind::Semantic, language)
            .compile(source)
            .unwrap_or_else(|e| panic!("{language}: {e}"));
        assert!(output.code.contains("event: \"click\","), "{language}:\n{}", output.code);
        assert!(
            output.code.contains("toggle(ctx.me, \"active\");"),
            "{language}:\n{}",
            output.code
        );
        assert_eq!(output.helpers, vec!["createContext", "toggle"], "{language}");
    }
}

#[test]
fn right_to_left_scripts() {
    let output = compiler(FrontendKind::Semantic, "ar")
        .compile("أضف .active إلى #menu")
        .unwrap();
    assert!(output.code.contains("$sel0()?.classList.add(\"active\");"), "{}", output.code);
    assert!(output.code.contains("query(\"#menu\")"), "{}", output.code);
}

#[test]
fn toggle_only_programs_import_only_toggle() {
    let output = Compiler::new(CompilerOptions::default())
        .compile("on click toggle .active")
        .unwrap();
    let imports = output.code.lines().next().unwrap();
    assert_eq!(
        imports,
        "import { createContext, toggle } from \"lokascript/runtime\";"
    );
}

#[test]
fn analysis_is_deterministic() {
    let source = "on click from #button \
                  set $count to $count + 1 then put $count into #total \
                  then repeat for item in items log item end";
    let node = from_grammar_node(&parse_source(source).unwrap());
    let first = serde_json::to_string(&analyze(&node)).unwrap();
    let second = serde_json::to_string(&analyze(&node)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn converted_trees_analyse_alike() {
    let source = "put 'x' into #out";
    let grammar = from_grammar_node(&parse_source(source).unwrap());
    let parser = SemanticParser::new().unwrap();
    let semantic = from_semantic_node(&parser.analyze(source, "en").node.unwrap());
    let (a, b) = (analyze(&grammar), analyze(&semantic));
    assert_eq!(a.commands_used, b.commands_used);
    assert_eq!(a.dependencies, b.dependencies);
}

#[test]
fn selector_caching() {
    let output = compiler(FrontendKind::Grammar, "en")
        .compile("add .x to #main then add .y to .sidebar:hover")
        .unwrap();
    let selectors = &output.analysis.expressions.selectors;
    let main = selectors.iter().find(|s| s.selector == "#main").unwrap();
    assert!(main.can_cache && main.is_id);
    let hover = selectors.iter().find(|s| s.selector == ".sidebar:hover").unwrap();
    assert!(!hover.can_cache && !hover.is_id);
    assert!(output.code.contains("$c0 ??= query(\"#main\")"), "{}", output.code);
    assert!(output.code.contains("queryAll(\".sidebar:hover\")"), "{}", output.code);
}

#[test]
fn loops_bind_locals() {
    let output = compiler(FrontendKind::Grammar, "en")
        .compile("repeat for item in items log item end")
        .unwrap();
    let flow = &output.analysis.control_flow;
    assert!(flow.has_loops);
    assert_eq!(flow.max_nesting_depth, 1);
    assert_eq!(output.analysis.variables.locals["item"].writes.len(), 1);
}

#[test]
fn control_flow_signals() {
    let output = compiler(FrontendKind::Grammar, "en")
        .compile("on click if x halt end then log 'after'")
        .unwrap();
    assert!(output.code.contains("return HALT;"), "{}", output.code);
    assert!(output.code.contains("console.log(\"after\");"), "{}", output.code);
    assert!(output.analysis.control_flow.can_throw);
}

#[test]
fn languages_are_listed() {
    let languages = supported_languages().unwrap();
    assert_eq!(languages.len(), 20);
    let codes: Vec<&str> = languages.iter().map(|l| l.code.as_str()).collect();
    for code in ["en", "ja", "ar", "ko", "zh", "es", "tr", "hi", "th"] {
        assert!(codes.contains(&code), "{code} missing from {codes:?}");
    }
    let arabic = languages.iter().find(|l| l.code == "ar").unwrap();
    assert_eq!(arabic.direction, Direction::Rtl);
}

#[test]
fn validation_agrees_with_compilation() {
    let compiler = compiler(FrontendKind::Grammar, "en");
    for source in ["on click toggle .active", "put 1 onto #x", "log (1"] {
        let valid = validate(source).valid;
        let compiled = compiler.compile(source);
        assert_eq!(valid, compiled.is_ok(), "{source}");
    }
    assert_eq!(
        compiler.compile("put 1 onto #x").unwrap_err().kind,
        CompileErrorKind::Syntax
    );
}

#[test]
fn long_operator_chain_is_a_syntax_error() {
    let source = format!("log 1{}", " + 1".repeat(10_000));

    let error = compiler(FrontendKind::Grammar, "en")
        .compile(&source)
        .unwrap_err();
    assert_eq!(error.kind, CompileErrorKind::Syntax);
    assert!(error.message.contains("expression too large"), "{}", error.message);

    // The semantic front end hands role text to the same expression parser.
    let source = format!("log 1{}", " + 1".repeat(2_000));
    let _ = Compiler::new(CompilerOptions::default()).compile(&source);
}

#[test]
fn long_power_chain_is_a_syntax_error() {
    let source = format!("log 2{}", " ** 2".repeat(10_000));
    let error = compiler(FrontendKind::Grammar, "en")
        .compile(&source)
        .unwrap_err();
    assert_eq!(error.message, "nesting too deep");
}

#[test]
fn operator_chain_within_limit_compiles() {
    let source = format!("log 1{}", " + 1".repeat(1_000));
    let output = compiler(FrontendKind::Grammar, "en").compile(&source).unwrap();
    assert!(output.code.contains("console.log("), "{}", output.code);
}

#[test]
fn member_access_on_id_reference() {
    let output = compiler(FrontendKind::Grammar, "en")
        .compile("get #x.value")
        .unwrap();
    assert!(output.code.contains("$sel0().value"), "{}", output.code);
}

#[test]
fn array_literals_compile() {
    let output = compiler(FrontendKind::Grammar, "en")
        .compile("set :xs to [1, 2, [3]] then log :xs[2][0]")
        .unwrap();
    assert!(output.code.contains("ctx.locals.xs = [1, 2, [3]];"), "{}", output.code);
    assert!(output.code.contains("console.log(ctx.locals.xs[2][0]);"), "{}", output.code);
}
