//! # Variable Table
//!
//! The substitution table maps template variable names to the literal values
//! they expanded to. It is built once per import from the template's
//! declaration and the project's recorded values, and never changes afterwards.
//!
//! Entries are kept longest value first. Substituting a short value before a
//! longer one that contains it would destroy the longer match, so the order is
//! part of the table's contract. Equal-length values keep declaration order.

use log::{debug, warn};

use crate::config::{RecordedValues, TemplateDeclaration};
use crate::error::{Error, Result};
use crate::suggestions;

/// The tag Cookiecutter renders for variable `name`.
pub fn placeholder(name: &str) -> String {
    format!("{{{{cookiecutter.{name}}}}}")
}

/// A single `(name, value)` pair of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
    /// Cached `{{cookiecutter.<name>}}` tag.
    pub placeholder: String,
}

impl Variable {
    fn new(name: String, value: String) -> Self {
        let placeholder = placeholder(&name);
        Self {
            name,
            value,
            placeholder,
        }
    }
}

/// Restricts which variables take part in substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableFilter {
    /// When non-empty, only these variables are substituted.
    pub include: Vec<String>,
    /// These variables are never substituted.
    pub exclude: Vec<String>,
}

impl VariableFilter {
    pub fn allows(&self, name: &str) -> bool {
        if self.exclude.iter().any(|n| n == name) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|n| n == name)
    }
}

/// Ordered substitution table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    variables: Vec<Variable>,
}

impl VariableTable {
    /// Build the table from the template declaration and recorded values.
    ///
    /// Without a declaration every recorded string value participates. With a
    /// declaration, only declared names do. Names starting with `_` are
    /// Cookiecutter internals and never participate. Filter entries naming a
    /// variable that exists in neither artifact are rejected.
    pub fn build(
        declaration: Option<&TemplateDeclaration>,
        recorded: &RecordedValues,
        filter: &VariableFilter,
    ) -> Result<Self> {
        let known: Vec<&str> = match declaration {
            Some(declaration) => declaration.names().collect(),
            None => recorded.names().collect(),
        };

        for name in filter.include.iter().chain(&filter.exclude) {
            if !known.contains(&name.as_str()) && !recorded.contains(name) {
                return Err(Error::Configuration {
                    message: format!("Unknown template variable '{name}'"),
                    hint: suggestions::did_you_mean(name, &known),
                });
            }
        }

        let mut pairs = Vec::new();
        for name in known {
            if name.starts_with('_') || !filter.allows(name) {
                continue;
            }

            match recorded.string(name) {
                Some("") => debug!("Skipping variable '{}' with empty value", name),
                Some(value) => pairs.push((name.to_string(), value.to_string())),
                None if recorded.contains(name) => {
                    debug!("Skipping variable '{}' without a string value", name)
                }
                None => warn!(
                    "Template variable '{}' has no recorded value and will not be rewritten",
                    name
                ),
            }
        }

        Self::from_pairs(pairs)
    }

    /// Build a table from explicit `(name, value)` pairs in declaration order.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut variables: Vec<Variable> = Vec::new();

        for (name, value) in pairs {
            let (name, value) = (name.into(), value.into());
            if variables.iter().any(|v| v.name == name) {
                return Err(Error::configuration(format!(
                    "Variable '{name}' is declared twice"
                )));
            }
            if value.is_empty() {
                return Err(Error::configuration(format!(
                    "Variable '{name}' has an empty value"
                )));
            }
            variables.push(Variable::new(name, value));
        }

        // Stable sort: equal lengths keep declaration order.
        variables.sort_by(|a, b| b.value.len().cmp(&a.value.len()));

        Ok(Self { variables })
    }

    /// Variables in application order (longest value first).
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
