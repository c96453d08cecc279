//! Template parsing
//!
//! A template is an engine input file where some values are replaced by inline
//! parameter definitions:
//!
//! ```text
//! Kappa = <<kappa:25.0:35.0:5.0>> 0 0
//! Temperature = <<temp:1.0,1.5>> 0
//! ```
//!
//! The double-brace spelling `{{kappa:25.0:35.0:5.0}}` is accepted as well.
//! Every occurrence is rewritten to the canonical placeholder `<<name>>`; the
//! first occurrence of a name defines its values.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ScreenError};
use crate::model::{Assignment, ParameterDefinition};

static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<(\w+):([^>]+)>>|\{\{(\w+):([^}]+)\}\}").expect("parameter pattern is valid")
});

/// Canonical placeholder for a parameter in a normalized template
pub fn placeholder(name: &str) -> String {
    format!("<<{name}>>")
}

/// A piece of a normalized template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template ready for substitution
#[derive(Debug, Clone)]
pub struct Template {
    pub raw: String,
    pub normalized: String,
    /// Parameter definitions keyed (and therefore ordered) by name
    pub parameters: BTreeMap<String, ParameterDefinition>,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text, failing if any definition is malformed or if the
    /// template defines no parameters at all.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parameters: BTreeMap<String, ParameterDefinition> = BTreeMap::new();
        let mut normalized = String::with_capacity(raw.len());
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in PARAM_PATTERN.captures_iter(raw) {
            let Some(whole) = caps.get(0) else { continue };
            let (Some(name), Some(definition)) = (
                caps.get(1).or_else(|| caps.get(3)),
                caps.get(2).or_else(|| caps.get(4)),
            ) else {
                continue;
            };
            let (name, definition) = (name.as_str(), definition.as_str());

            // every occurrence must be well formed, even one that is then ignored
            let parsed = ParameterDefinition::parse(name, definition)?;
            match parameters.get(name) {
                Some(existing) if existing.definition != definition => {
                    tracing::warn!(
                        parameter = name,
                        kept = %existing.definition,
                        ignored = definition,
                        "parameter redefined; keeping first definition"
                    );
                }
                Some(_) => {}
                None => {
                    tracing::debug!(
                        parameter = name,
                        kind = ?parsed.kind,
                        count = parsed.len(),
                        "parsed parameter"
                    );
                    parameters.insert(name.to_string(), parsed);
                }
            }

            let literal = &raw[last..whole.start()];
            if !literal.is_empty() {
                segments.push(Segment::Literal(literal.to_string()));
            }
            segments.push(Segment::Placeholder(name.to_string()));
            normalized.push_str(literal);
            normalized.push_str(&placeholder(name));
            last = whole.end();
        }
        if last < raw.len() {
            segments.push(Segment::Literal(raw[last..].to_string()));
        }
        normalized.push_str(&raw[last..]);

        if parameters.is_empty() {
            return Err(ScreenError::NoParameters);
        }

        Ok(Self {
            raw: raw.to_string(),
            normalized,
            parameters,
            segments,
        })
    }

    /// Read and parse a template file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScreenError::io(path, e))?;
        Self::parse(&raw)
    }

    /// Sorted parameter names
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    /// Substitute an assignment into the template.
    ///
    /// Only placeholders produced by parsing are replaced, each exactly once;
    /// substituted text is never scanned again. A placeholder with no assigned
    /// value is left as `<<name>>`.
    pub fn render(&self, assignment: &Assignment) -> String {
        let mut content = String::with_capacity(self.normalized.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => content.push_str(text),
                Segment::Placeholder(name) => match assignment.get(name) {
                    Some(value) => content.push_str(&value.to_string()),
                    None => content.push_str(&placeholder(name)),
                },
            }
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParameterKind, ParameterValue};

    const TEMPLATE: &str = "Kappa = <<kappa:25.0:35.0:5.0>> 0 0\nTemperature = <<temp:1.0,1.5>> 0\n";

    #[test]
    fn test_parse_extracts_parameters() {
        let template = Template::parse(TEMPLATE).unwrap();
        assert_eq!(template.parameter_names(), vec!["kappa", "temp"]);
        assert_eq!(template.parameters["kappa"].kind, ParameterKind::Range);
        assert_eq!(template.parameters["kappa"].len(), 3);
        assert_eq!(template.parameters["temp"].kind, ParameterKind::List);
        assert_eq!(
            template.normalized,
            "Kappa = <<kappa>> 0 0\nTemperature = <<temp>> 0\n"
        );
    }

    #[test]
    fn test_double_brace_spelling() {
        let template = Template::parse("Set_Steps = 1 {{steps:1000,2000}}\n").unwrap();
        assert_eq!(template.normalized, "Set_Steps = 1 <<steps>>\n");
        assert_eq!(
            template.parameters["steps"].values,
            vec![ParameterValue::from("1000"), ParameterValue::from("2000")]
        );
    }

    #[test]
    fn test_repeated_occurrences_collapse() {
        let raw = "A = <<k:1,2>>\nB = <<k:1,2>>\nC = <<k:7,8>>\n";
        let template = Template::parse(raw).unwrap();
        assert_eq!(template.parameters.len(), 1);
        // the first definition wins
        assert_eq!(
            template.parameters["k"].values,
            vec![ParameterValue::from("1"), ParameterValue::from("2")]
        );
        assert_eq!(template.normalized, "A = <<k>>\nB = <<k>>\nC = <<k>>\n");
    }

    #[test]
    fn test_malformed_redefinition_is_error() {
        let err = Template::parse("A = <<k:1,2>>\nB = <<k:1:2>>\n").unwrap_err();
        assert!(matches!(
            err,
            ScreenError::Validation {
                ref parameter,
                ref definition,
                ..
            } if parameter == "k" && definition == "1:2"
        ));
    }

    #[test]
    fn test_no_parameters_is_error() {
        let err = Template::parse("Kappa = 25 0 0\n").unwrap_err();
        assert!(matches!(err, ScreenError::NoParameters));
    }

    #[test]
    fn test_malformed_range_is_error() {
        let err = Template::parse("Kappa = <<kappa:25:35>>\n").unwrap_err();
        assert!(matches!(err, ScreenError::Validation { .. }));
        assert!(err.to_string().contains("25:35"));
    }

    #[test]
    fn test_render_matches_direct_substitution() {
        let template = Template::parse(TEMPLATE).unwrap();
        let assignment: Assignment = [
            ("kappa".to_string(), ParameterValue::Number(30.0)),
            ("temp".to_string(), ParameterValue::from("1.5")),
        ]
        .into_iter()
        .collect();

        let direct = PARAM_PATTERN.replace_all(TEMPLATE, |caps: &regex::Captures| {
            let name = caps.get(1).or_else(|| caps.get(3)).unwrap().as_str();
            assignment[name].to_string()
        });

        assert_eq!(template.render(&assignment), direct);
        assert_eq!(
            template.render(&assignment),
            "Kappa = 30.0 0 0\nTemperature = 1.5 0\n"
        );
    }

    #[test]
    fn test_render_substitutes_in_one_pass() {
        let raw = "A = <<a:x,y>>\nB = <<b:1,2>>\nC = <<c>>\n";
        let template = Template::parse(raw).unwrap();
        let assignment: Assignment = [
            ("a".to_string(), ParameterValue::from("<<b>>")),
            ("b".to_string(), ParameterValue::from("2")),
            ("c".to_string(), ParameterValue::from("3")),
        ]
        .into_iter()
        .collect();

        // a value that looks like a placeholder stays literal, and so does a
        // `<<c>>` that never carried a definition
        assert_eq!(template.render(&assignment), "A = <<b>>\nB = 2\nC = <<c>>\n");
    }

    #[test]
    fn test_text_outside_placeholders_is_untouched() {
        let raw = "; comment with {braces} and <angles>\nX = <<x:1>>\n";
        let template = Template::parse(raw).unwrap();
        assert_eq!(
            template.normalized,
            "; comment with {braces} and <angles>\nX = <<x>>\n"
        );
    }
}
