// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Variable read and write tracking.

use std::collections::{BTreeMap, BTreeSet};

use ecow::EcoString;
use serde::Serialize;

use crate::ast::VariableScope;

/// Where a variable is read and written. Sites are `<statement>:<command>.<role>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableUsage {
    pub reads: Vec<EcoString>,
    pub writes: Vec<EcoString>,
}

/// Variable tables, keyed by name without its scope sigil.
///
/// Element-scoped `^x` variables live on the current element and are kept
/// with the locals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variables {
    pub locals: BTreeMap<EcoString, VariableUsage>,
    pub globals: BTreeMap<EcoString, VariableUsage>,
    /// Context words referenced anywhere: `me`, `it`, `event`, ...
    pub context_vars: BTreeSet<EcoString>,
}

impl Variables {
    fn table(&mut self, scope: VariableScope) -> &mut BTreeMap<EcoString, VariableUsage> {
        match scope {
            VariableScope::Global => &mut self.globals,
            VariableScope::Local | VariableScope::Element => &mut self.locals,
        }
    }

    pub(crate) fn read(&mut self, scope: VariableScope, name: &str, site: EcoString) {
        self.table(scope)
            .entry(VariableScope::strip_sigil(name).into())
            .or_default()
            .reads
            .push(site);
    }

    pub(crate) fn write(&mut self, scope: VariableScope, name: &str, site: EcoString) {
        self.table(scope)
            .entry(VariableScope::strip_sigil(name).into())
            .or_default()
            .writes
            .push(site);
    }

    /// Returns true if `name` has been seen as a local.
    #[must_use]
    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains_key(VariableScope::strip_sigil(name))
    }

    /// The scope a bare identifier read resolves to: local once a local of
    /// that name exists, global otherwise.
    #[must_use]
    pub fn resolve(&self, name: &str) -> VariableScope {
        if self.is_local(name) {
            VariableScope::Local
        } else {
            VariableScope::Global
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigils_are_stripped() {
        let mut variables = Variables::default();
        variables.write(VariableScope::Local, ":count", "0:set.target".into());
        variables.read(VariableScope::Local, "count", "1:log.args".into());
        let usage = &variables.locals["count"];
        assert_eq!(usage.writes, ["0:set.target"]);
        assert_eq!(usage.reads, ["1:log.args"]);
    }

    #[test]
    fn element_variables_are_locals() {
        let mut variables = Variables::default();
        variables.write(VariableScope::Element, "^open", "0:set.target".into());
        assert!(variables.is_local("open"));
        assert!(variables.globals.is_empty());
    }

    #[test]
    fn bare_names_resolve_to_globals_until_written_locally() {
        let mut variables = Variables::default();
        assert_eq!(variables.resolve("x"), VariableScope::Global);
        variables.write(VariableScope::Local, "x", "0:set.target".into());
        assert_eq!(variables.resolve("x"), VariableScope::Local);
    }
}
