// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Per-script summary derived from analysis.

use ecow::EcoString;
use serde::Serialize;

use crate::semantic_analysis::AnalysisResult;

/// What a compiled script uses, for tooling and batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMetadata {
    /// Distinct commands plus weights for nesting, branches and loops.
    pub complexity: usize,
    /// Runtime helpers the generated code imports.
    pub dependencies: Vec<EcoString>,
    pub selectors: Vec<EcoString>,
    pub events: Vec<EcoString>,
    pub commands: Vec<EcoString>,
    pub template_variables: Vec<EcoString>,
}

impl ScriptMetadata {
    #[must_use]
    pub fn from_analysis(analysis: &AnalysisResult, template_variables: Vec<EcoString>) -> Self {
        let flow = &analysis.control_flow;
        let complexity = analysis.commands_used.len()
            + 2 * flow.max_nesting_depth
            + usize::from(flow.has_conditionals)
            + 2 * usize::from(flow.has_loops)
            + usize::from(flow.has_async);
        Self {
            complexity,
            dependencies: analysis.dependencies.runtime_helpers.iter().cloned().collect(),
            selectors: analysis
                .expressions
                .selectors
                .iter()
                .map(|info| info.selector.clone())
                .collect(),
            events: analysis.dependencies.event_types.iter().cloned().collect(),
            commands: analysis.commands_used.iter().cloned().collect(),
            template_variables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::from_grammar_node;
    use crate::semantic_analysis::analyze;
    use crate::source_analysis::parse_source;

    fn metadata(source: &str) -> ScriptMetadata {
        let node = from_grammar_node(&parse_source(source).unwrap());
        ScriptMetadata::from_analysis(&analyze(&node), Vec::new())
    }

    #[test]
    fn single_command() {
        let meta = metadata("on click toggle .active");
        assert_eq!(meta.commands, vec!["toggle"]);
        assert_eq!(meta.events, vec!["click"]);
        assert_eq!(meta.dependencies, vec!["toggle"]);
        assert_eq!(meta.complexity, 1);
    }

    #[test]
    fn loops_and_branches_weigh_more() {
        let meta = metadata("repeat 3 times if x > 1 log x end end");
        assert_eq!(meta.complexity, 1 + 2 * 2 + 1 + 2);
    }

    #[test]
    fn selectors_in_first_use_order() {
        let meta = metadata("put 'a' into #out then add .b to .item");
        assert_eq!(meta.selectors, vec!["#out", ".b", ".item"]);
    }

    #[test]
    fn serializes_camel_case() {
        let meta = ScriptMetadata::from_analysis(&AnalysisResult::default(), vec!["name".into()]);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["templateVariables"], serde_json::json!(["name"]));
        assert_eq!(json["complexity"], 0);
    }
}
