// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Match templates.
//!
//! A template is written as space-separated items:
//!
//! | Item | Meaning |
//! |------|---------|
//! | `into` | literal word |
//! | `into\|in` | literal with alternatives |
//! | `{patient}` | role capturing one or more tokens |
//! | `[on {destination}]` | optional group |
//!
//! Groups do not nest.

use std::collections::BTreeMap;

use ecow::EcoString;
use serde::Serialize;
use thiserror::Error;

/// Groups per template. Each group doubles the variants tried.
const MAX_OPTIONAL_GROUPS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template '{template}': {message}")]
pub struct TemplateError {
    pub template: EcoString,
    pub message: EcoString,
}

/// One item of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatternToken {
    Literal {
        value: EcoString,
        alternatives: Vec<EcoString>,
    },
    Role {
        name: EcoString,
    },
    /// An optional group.
    Group {
        tokens: Vec<PatternToken>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternTemplate {
    pub format: EcoString,
    pub tokens: Vec<PatternToken>,
}

/// How a role's value is located, derived from the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionRule {
    /// Ordinal among the template's roles when no marker precedes it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<EcoString>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marker_alternatives: Vec<EcoString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<EcoString>,
}

/// A compiled pattern for one command in one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguagePattern {
    pub id: EcoString,
    pub language: EcoString,
    pub command: EcoString,
    pub priority: u32,
    pub template: PatternTemplate,
    pub extraction: BTreeMap<EcoString, ExtractionRule>,
}

/// A flattened template element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element<'a> {
    Literal {
        value: &'a str,
        alternatives: &'a [EcoString],
    },
    Role(&'a str),
}

impl Element<'_> {
    /// Returns true if `word` satisfies this literal.
    pub(crate) fn accepts(&self, word: &str) -> bool {
        match self {
            Self::Literal {
                value,
                alternatives,
            } => {
                let word = word.to_lowercase();
                word == value.to_lowercase()
                    || alternatives.iter().any(|alt| word == alt.to_lowercase())
            }
            Self::Role(_) => false,
        }
    }
}

/// One way through a template's optional groups.
#[derive(Debug, Clone)]
pub(crate) struct Variant<'a> {
    pub(crate) elements: Vec<Element<'a>>,
    pub(crate) groups_present: usize,
}

impl PatternTemplate {
    pub fn parse(format: &str) -> Result<Self, TemplateError> {
        let error = |message: &str| TemplateError {
            template: format.into(),
            message: message.into(),
        };

        let mut tokens = Vec::new();
        let mut group: Option<Vec<PatternToken>> = None;
        for item in format.split_whitespace() {
            let (opens, item) = match item.strip_prefix('[') {
                Some(rest) => (true, rest),
                None => (false, item),
            };
            let (closes, item) = match item.strip_suffix(']') {
                Some(rest) => (true, rest),
                None => (false, item),
            };
            if opens {
                if group.is_some() {
                    return Err(error("optional groups cannot nest"));
                }
                group = Some(Vec::new());
            }
            if !item.is_empty() {
                let token = parse_item(item).map_err(|m| error(&m))?;
                match group.as_mut() {
                    Some(group) => group.push(token),
                    None => tokens.push(token),
                }
            }
            if closes {
                match group.take() {
                    Some(group) if !group.is_empty() => {
                        tokens.push(PatternToken::Group { tokens: group });
                    }
                    Some(_) => return Err(error("empty optional group")),
                    None => return Err(error("unbalanced ']'")),
                }
            }
        }
        if group.is_some() {
            return Err(error("unclosed '['"));
        }
        if tokens.is_empty() {
            return Err(error("template is empty"));
        }
        let groups = tokens
            .iter()
            .filter(|t| matches!(t, PatternToken::Group { .. }))
            .count();
        if groups > MAX_OPTIONAL_GROUPS {
            return Err(error("too many optional groups"));
        }

        Ok(Self {
            format: format.into(),
            tokens,
        })
    }

    /// Every role name, in template order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.flat().filter_map(|(token, _)| match token {
            PatternToken::Role { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Roles outside optional groups.
    pub fn required_roles(&self) -> impl Iterator<Item = &str> {
        self.flat().filter_map(|(token, optional)| match token {
            PatternToken::Role { name } if !optional => Some(name.as_str()),
            _ => None,
        })
    }

    /// Every literal word including alternatives.
    pub fn literal_words(&self) -> impl Iterator<Item = &str> {
        self.flat().flat_map(|(token, _)| {
            let words: Vec<&str> = match token {
                PatternToken::Literal {
                    value,
                    alternatives,
                } => std::iter::once(value.as_str())
                    .chain(alternatives.iter().map(EcoString::as_str))
                    .collect(),
                _ => Vec::new(),
            };
            words
        })
    }

    /// Number of optional groups.
    pub fn group_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, PatternToken::Group { .. }))
            .count()
    }

    /// Leaf tokens with a flag for membership in an optional group.
    fn flat(&self) -> impl Iterator<Item = (&PatternToken, bool)> {
        self.tokens.iter().flat_map(|token| match token {
            PatternToken::Group { tokens } => tokens.iter().map(|t| (t, true)).collect::<Vec<_>>(),
            other => vec![(other, false)],
        })
    }

    /// All variants, most groups present first.
    pub(crate) fn variants(&self) -> Vec<Variant<'_>> {
        let groups = self.group_count();
        let mut masks: Vec<u32> = (0..(1u32 << groups)).collect();
        masks.sort_by(|a, b| b.count_ones().cmp(&a.count_ones()).then(b.cmp(a)));

        masks
            .into_iter()
            .map(|mask| {
                let mut elements = Vec::new();
                let mut group_index = 0;
                for token in &self.tokens {
                    match token {
                        PatternToken::Group { tokens } => {
                            if mask & (1 << group_index) != 0 {
                                elements.extend(tokens.iter().filter_map(element));
                            }
                            group_index += 1;
                        }
                        other => elements.extend(element(other)),
                    }
                }
                Variant {
                    elements,
                    groups_present: mask.count_ones() as usize,
                }
            })
            .collect()
    }
}

fn element(token: &PatternToken) -> Option<Element<'_>> {
    match token {
        PatternToken::Literal {
            value,
            alternatives,
        } => Some(Element::Literal {
            value,
            alternatives,
        }),
        PatternToken::Role { name } => Some(Element::Role(name)),
        PatternToken::Group { .. } => None,
    }
}

fn parse_item(item: &str) -> Result<PatternToken, String> {
    if let Some(inner) = item.strip_prefix('{') {
        let name = inner
            .strip_suffix('}')
            .ok_or_else(|| format!("unclosed role '{item}'"))?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid role name '{name}'"));
        }
        return Ok(PatternToken::Role { name: name.into() });
    }
    if item.contains(['{', '}']) {
        return Err(format!("role braces must surround the whole item in '{item}'"));
    }
    let mut words = item.split('|').filter(|w| !w.is_empty());
    let value = words
        .next()
        .ok_or_else(|| format!("empty literal '{item}'"))?;
    Ok(PatternToken::Literal {
        value: value.into(),
        alternatives: words.map(EcoString::from).collect(),
    })
}

impl LanguagePattern {
    /// Compiles a pattern, deriving extraction rules from the template.
    pub fn new(
        id: impl Into<EcoString>,
        language: impl Into<EcoString>,
        command: impl Into<EcoString>,
        priority: u32,
        format: &str,
        defaults: &BTreeMap<EcoString, EcoString>,
    ) -> Result<Self, TemplateError> {
        let template = PatternTemplate::parse(format)?;
        let mut extraction: BTreeMap<EcoString, ExtractionRule> = BTreeMap::new();

        let mut previous: Option<&PatternToken> = None;
        let mut ordinal = 0;
        for (token, _) in template.flat() {
            if let PatternToken::Role { name } = token {
                let rule = match previous {
                    Some(PatternToken::Literal {
                        value,
                        alternatives,
                    }) => ExtractionRule {
                        marker: Some(value.clone()),
                        marker_alternatives: alternatives.clone(),
                        ..ExtractionRule::default()
                    },
                    _ => ExtractionRule {
                        position: Some(ordinal),
                        ..ExtractionRule::default()
                    },
                };
                extraction.insert(name.clone(), rule);
                ordinal += 1;
            }
            previous = Some(token);
        }
        for (role, value) in defaults {
            extraction.entry(role.clone()).or_default().default = Some(value.clone());
        }

        Ok(Self {
            id: id.into(),
            language: language.into(),
            command: command.into(),
            priority,
            template,
            extraction,
        })
    }

    /// Declared default for `role`.
    #[must_use]
    pub fn default_for(&self, role: &str) -> Option<&str> {
        self.extraction.get(role)?.default.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(value: &str, alternatives: &[&str]) -> PatternToken {
        PatternToken::Literal {
            value: value.into(),
            alternatives: alternatives.iter().map(|a| EcoString::from(*a)).collect(),
        }
    }

    fn role(name: &str) -> PatternToken {
        PatternToken::Role { name: name.into() }
    }

    #[test]
    fn parses_literals_roles_and_alternatives() {
        let template = PatternTemplate::parse("put {patient} into|in {destination}").unwrap();
        assert_eq!(
            template.tokens,
            vec![
                literal("put", &[]),
                role("patient"),
                literal("into", &["in"]),
                role("destination"),
            ]
        );
    }

    #[test]
    fn parses_optional_groups() {
        let template = PatternTemplate::parse("toggle {patient} [on {destination}]").unwrap();
        assert_eq!(template.group_count(), 1);
        assert_eq!(template.required_roles().collect::<Vec<_>>(), ["patient"]);
        assert_eq!(template.roles().collect::<Vec<_>>(), ["patient", "destination"]);
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in ["", "[a [b]]", "a ]", "[a", "{bad-name}", "x{y}", "[ ]"] {
            assert!(PatternTemplate::parse(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn variants_prefer_more_groups() {
        let template = PatternTemplate::parse("a [b] [c]").unwrap();
        let counts: Vec<_> = template
            .variants()
            .iter()
            .map(|v| (v.groups_present, v.elements.len()))
            .collect();
        assert_eq!(counts, [(2, 3), (1, 2), (1, 2), (0, 1)]);
    }

    #[test]
    fn literal_matching_ignores_case() {
        let template = PatternTemplate::parse("Into|IN").unwrap();
        let variants = template.variants();
        let element = variants[0].elements[0];
        assert!(element.accepts("into"));
        assert!(element.accepts("in"));
        assert!(!element.accepts("onto"));
    }

    #[test]
    fn extraction_uses_markers_and_positions() {
        let defaults = BTreeMap::from([(EcoString::from("destination"), EcoString::from("me"))]);
        let pattern = LanguagePattern::new(
            "ja-toggle-1",
            "ja",
            "toggle",
            100,
            "{patient} を [{destination} で] 切り替え",
            &defaults,
        )
        .unwrap();
        assert_eq!(pattern.extraction["patient"].position, Some(0));
        assert_eq!(pattern.extraction["destination"].marker.as_deref(), Some("を"));
        assert_eq!(pattern.default_for("destination"), Some("me"));
    }
}
