//! # Pattern Compiler
//!
//! Turns one clause-tree node into query source text.
//!
//! - Pure and recursive: no I/O, no hidden state
//! - Deterministic: identical trees compile to byte-identical text
//! - Total: every clause kind produces a fragment; [`Clause::Unrecognized`]
//!   and function expressions without a binding target produce `""`
//!
//! Indentation only affects `and` clauses and is purely cosmetic.

use crate::clause::{Argument, Clause};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters that cannot appear inside a variable name.
    static ref VARIABLE_FORBIDDEN: Regex =
        Regex::new(r##"[\s"()\[\]{}/\\^@,~`;#']"##).expect("static regex");
}

/// Two spaces per level.
#[must_use]
pub fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Strip characters that would break the variable token.
#[must_use]
pub fn sanitize_variable(name: &str) -> String {
    VARIABLE_FORBIDDEN.replace_all(name, "").into_owned()
}

/// Render a variable name as `?name`.
#[must_use]
pub fn variable(name: &str) -> String {
    format!("?{}", sanitize_variable(name))
}

/// Compile a single argument.
#[must_use]
pub fn compile_argument(argument: &Argument) -> String {
    match argument {
        Argument::Constant(value) => value.clone(),
        Argument::Wildcard => "_".to_string(),
        Argument::Variable(name) => variable(name),
        Argument::SrcVar(name) => format!("${}", sanitize_variable(name)),
    }
}

/// Compile one clause at the given indentation level.
#[must_use]
pub fn compile(clause: &Clause, level: usize) -> String {
    match clause {
        Clause::DataPattern { src_var, arguments } => {
            let mut parts = source_part(src_var.as_deref());
            parts.extend(arguments.iter().map(compile_argument));
            format!("[{}]", parts.join(" "))
        }

        Clause::FnExpr {
            function,
            arguments,
            binding,
        } => {
            // No binding target means nothing usable would be bound.
            let Some(binding) = binding else {
                return String::new();
            };
            let target = compile(binding, level);
            if target.is_empty() {
                return String::new();
            }
            format!("[{} {}]", call(function, arguments), target)
        }

        Clause::PredExpr {
            predicate,
            arguments,
        } => format!("[{}]", call(predicate, arguments)),

        Clause::RuleExpr { rule, arguments } => call(rule, arguments),

        Clause::NotClause { src_var, clauses } => {
            connective(src_var.as_deref(), "not", None, clauses, level)
        }

        Clause::OrClause { src_var, clauses } => {
            connective(src_var.as_deref(), "or", None, clauses, level)
        }

        Clause::AndClause { clauses } => {
            let body: Vec<String> = compile_all(clauses, level + 1)
                .into_iter()
                .map(|c| format!("\n{}{}", indent(level + 1), c))
                .collect();
            format!("(and{})", body.concat())
        }

        Clause::NotJoinClause {
            src_var,
            variables,
            clauses,
        } => connective(
            src_var.as_deref(),
            "not-join",
            Some(variables),
            clauses,
            level,
        ),

        Clause::OrJoinClause {
            src_var,
            variables,
            clauses,
        } => connective(
            src_var.as_deref(),
            "or-join",
            Some(variables),
            clauses,
            level,
        ),

        Clause::BindScalar { variable: name } => variable(name),

        Clause::Unrecognized => String::new(),
    }
}

/// Compile a list of clauses, dropping fragments that compiled to `""`.
#[must_use]
pub fn compile_all(clauses: &[Clause], level: usize) -> Vec<String> {
    clauses
        .iter()
        .map(|c| compile(c, level))
        .filter(|c| !c.is_empty())
        .collect()
}

// =============================================================================
// HELPERS
// =============================================================================

fn source_part(src_var: Option<&str>) -> Vec<String> {
    src_var
        .map(|s| vec![format!("${}", sanitize_variable(s))])
        .unwrap_or_default()
}

/// `(head args...)`
fn call(head: &str, arguments: &[Argument]) -> String {
    let mut parts = vec![head.to_string()];
    parts.extend(arguments.iter().map(compile_argument));
    format!("({})", parts.join(" "))
}

/// `($src keyword [vars] clauses...)`
fn connective(
    src_var: Option<&str>,
    keyword: &str,
    variables: Option<&[String]>,
    clauses: &[Clause],
    level: usize,
) -> String {
    let mut parts = source_part(src_var);
    parts.push(keyword.to_string());
    if let Some(vars) = variables {
        let vars: Vec<String> = vars.iter().map(|v| variable(v)).collect();
        parts.push(format!("[{}]", vars.join(" ")));
    }
    parts.extend(compile_all(clauses, level + 1));
    format!("({})", parts.join(" "))
}

// =============================================================================
// TESTS
// =============================================================================
