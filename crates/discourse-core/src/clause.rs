//! # Clause AST
//!
//! The pattern-query AST the Pattern Compiler consumes.
//!
//! `Clause` is a closed sum type. Specifications authored by users arrive as
//! tagged JSON/TOML (`{"type": "data-pattern", ...}`); any tag this crate
//! does not know deserializes into [`Clause::Unrecognized`], which compiles
//! to the empty string instead of failing the whole specification.

use serde::{Deserialize, Serialize};

// =============================================================================
// ARGUMENTS
// =============================================================================

/// A leaf argument of a clause.
///
/// Variables and constants are distinguished syntactically: only
/// [`Argument::Variable`] takes part in unification and renaming.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Argument {
    /// Rendered verbatim (`:block/uid`, `"text"`, `42`).
    Constant(String),
    /// The "don't care" placeholder `_`.
    #[serde(rename = "underscore")]
    Wildcard,
    /// A logic variable, rendered `?name`.
    Variable(String),
    /// A source selector, rendered `$name`.
    SrcVar(String),
}

impl Argument {
    /// Variable argument.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Constant argument rendered verbatim.
    #[must_use]
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    /// String literal constant, quoted and escaped.
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::Constant(quote(value))
    }

    /// Name of the variable, if this argument is one.
    #[must_use]
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }
}

/// Quote a string literal for the query language.
#[must_use]
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

// =============================================================================
// CLAUSES
// =============================================================================

/// One node of the pattern-query AST.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Clause {
    /// `[$src e a v]`
    DataPattern {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src_var: Option<String>,
        arguments: Vec<Argument>,
    },

    /// `[(f args...) ?binding]` binds a computed value.
    FnExpr {
        function: String,
        arguments: Vec<Argument>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        binding: Option<Box<Clause>>,
    },

    /// `[(pred args...)]` is a boolean filter and binds nothing.
    PredExpr {
        predicate: String,
        arguments: Vec<Argument>,
    },

    /// `(rule args...)`
    RuleExpr {
        rule: String,
        arguments: Vec<Argument>,
    },

    /// `(not ...)`
    NotClause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src_var: Option<String>,
        clauses: Vec<Clause>,
    },

    /// `(or ...)`
    OrClause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src_var: Option<String>,
        clauses: Vec<Clause>,
    },

    /// `(and ...)`
    AndClause { clauses: Vec<Clause> },

    /// `(not-join [?v ...] ...)`
    NotJoinClause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src_var: Option<String>,
        variables: Vec<String>,
        clauses: Vec<Clause>,
    },

    /// `(or-join [?v ...] ...)`
    OrJoinClause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src_var: Option<String>,
        variables: Vec<String>,
        clauses: Vec<Clause>,
    },

    /// Scalar binding target of a function expression.
    BindScalar { variable: String },

    /// Any clause kind this crate does not know. Compiles to `""`.
    #[serde(other)]
    Unrecognized,
}

impl Clause {
    /// `[a b c]` with no source selector.
    #[must_use]
    pub fn pattern(arguments: Vec<Argument>) -> Self {
        Self::DataPattern {
            src_var: None,
            arguments,
        }
    }

    /// `[?entity attribute ?value]`
    #[must_use]
    pub fn triple(entity: &str, attribute: &str, value: Argument) -> Self {
        Self::pattern(vec![
            Argument::var(entity),
            Argument::constant(attribute),
            value,
        ])
    }

    /// `[(function args...) ?variable]`
    #[must_use]
    pub fn bind(function: &str, arguments: Vec<Argument>, variable: &str) -> Self {
        Self::FnExpr {
            function: function.to_string(),
            arguments,
            binding: Some(Box::new(Self::BindScalar {
                variable: variable.to_string(),
            })),
        }
    }

    /// `[(predicate args...)]`
    #[must_use]
    pub fn predicate(predicate: &str, arguments: Vec<Argument>) -> Self {
        Self::PredExpr {
            predicate: predicate.to_string(),
            arguments,
        }
    }

    /// `(or ...)` without source selector.
    #[must_use]
    pub fn or(clauses: Vec<Clause>) -> Self {
        Self::OrClause {
            src_var: None,
            clauses,
        }
    }

    /// `(not ...)` without source selector.
    #[must_use]
    pub fn not(clauses: Vec<Clause>) -> Self {
        Self::NotClause {
            src_var: None,
            clauses,
        }
    }

    /// `(or-join [vars] ...)` without source selector.
    #[must_use]
    pub fn or_join(variables: &[&str], clauses: Vec<Clause>) -> Self {
        Self::OrJoinClause {
            src_var: None,
            variables: variables.iter().map(|v| (*v).to_string()).collect(),
            clauses,
        }
    }

    /// `(not-join [vars] ...)` without source selector.
    #[must_use]
    pub fn not_join(variables: &[&str], clauses: Vec<Clause>) -> Self {
        Self::NotJoinClause {
            src_var: None,
            variables: variables.iter().map(|v| (*v).to_string()).collect(),
            clauses,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn argument_deserializes_from_tagged_json() {
        let args: Vec<Argument> = toml::from_str::<Wrapper>(
            r#"
            args = [
                { type = "variable", value = "node" },
                { type = "constant", value = ":node/title" },
                { type = "underscore" },
            ]
            "#,
        )
        .expect("parse")
        .args;

        assert_eq!(
            args,
            vec![
                Argument::var("node"),
                Argument::constant(":node/title"),
                Argument::Wildcard,
            ]
        );
    }

    #[test]
    fn unknown_clause_kind_deserializes_as_unrecognized() {
        let parsed: ClauseWrapper = toml::from_str(
            r#"
            clause = { type = "bind-tuple", variables = ["a", "b"] }
            "#,
        )
        .expect("parse");
        assert_eq!(parsed.clause, Clause::Unrecognized);
    }

    #[derive(Deserialize)]
    struct Wrapper {
        args: Vec<Argument>,
    }

    #[derive(Deserialize)]
    struct ClauseWrapper {
        clause: Clause,
    }
}
