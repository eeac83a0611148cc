//! # Variable Scoping Pass
//!
//! Renames free variables across a clause tree so independently authored
//! specifications can be merged into one query without accidental
//! unification.
//!
//! ## Guarantees
//!
//! - Only [`Argument::Variable`] occurrences (and join-variable lists and
//!   scalar bindings) are touched; constants and source selectors never are
//! - Substitution is simultaneous: `a -> b, b -> a` swaps the two
//! - Total: no `from` name survives as a variable unless it is also a `to`
//! - Capture-free: a variable already in the tree that happens to equal a
//!   `to` name is moved to a fresh name first
//!
//! Names are compared as they will be printed: every variable is passed
//! through [`sanitize_variable`] before lookup, so `Parent Page` and
//! `ParentPage` are the same variable here just as they are in the query
//! text.

use crate::clause::{Argument, Clause};
use crate::compiler::sanitize_variable;
use std::collections::{BTreeMap, BTreeSet};

/// One renaming pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub from: String,
    pub to: String,
}

impl Alias {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// =============================================================================
// RENAME
// =============================================================================

/// Rename variables across `clauses` according to `aliases`.
///
/// When the same `from` appears twice, the first pair wins.
#[must_use]
pub fn rename(aliases: &[Alias], clauses: &[Clause]) -> Vec<Clause> {
    let mut mapping: BTreeMap<String, String> = BTreeMap::new();
    for alias in aliases {
        let from = sanitize_variable(&alias.from);
        let to = sanitize_variable(&alias.to);
        if from != to {
            mapping.entry(from).or_insert(to);
        }
    }
    if mapping.is_empty() {
        return clauses.to_vec();
    }

    let present = variables(clauses);
    let targets: BTreeSet<String> = mapping.values().cloned().collect();

    let mut taken: BTreeSet<String> = present.clone();
    taken.extend(targets.iter().cloned());
    taken.extend(mapping.keys().cloned());

    // Move bystanders out of the way before they get captured.
    for name in &present {
        if !mapping.contains_key(name) && targets.contains(name) {
            let fresh = fresh_name(name, &taken);
            taken.insert(fresh.clone());
            mapping.insert(name.clone(), fresh);
        }
    }

    clauses.iter().map(|c| substitute(c, &mapping)).collect()
}

/// Bind `subject` to `bound_to` and prefix every other variable with `scope`.
///
/// This is how a specification written against a local placeholder is
/// spliced into a larger query.
#[must_use]
pub fn localize(clauses: &[Clause], subject: &str, bound_to: &str, scope: &str) -> Vec<Clause> {
    let aliases: Vec<Alias> = variables(clauses)
        .into_iter()
        .map(|name| {
            if name == subject {
                Alias::new(name, bound_to)
            } else {
                let scoped = format!("{}-{}", scope, name);
                Alias::new(name, scoped)
            }
        })
        .collect();
    rename(&aliases, clauses)
}

/// Every variable name occurring anywhere in the tree, sanitized.
#[must_use]
pub fn variables(clauses: &[Clause]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for clause in clauses {
        collect(clause, &mut found);
    }
    found
}

// =============================================================================
// INTERNALS
// =============================================================================

fn fresh_name(base: &str, taken: &BTreeSet<String>) -> String {
    let mut n = 1usize;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn collect(clause: &Clause, found: &mut BTreeSet<String>) {
    match clause {
        Clause::DataPattern { arguments, .. }
        | Clause::PredExpr { arguments, .. }
        | Clause::RuleExpr { arguments, .. } => collect_arguments(arguments, found),
        Clause::FnExpr {
            arguments, binding, ..
        } => {
            collect_arguments(arguments, found);
            if let Some(binding) = binding {
                collect(binding, found);
            }
        }
        Clause::NotClause { clauses, .. }
        | Clause::OrClause { clauses, .. }
        | Clause::AndClause { clauses } => {
            for c in clauses {
                collect(c, found);
            }
        }
        Clause::NotJoinClause {
            variables, clauses, ..
        }
        | Clause::OrJoinClause {
            variables, clauses, ..
        } => {
            found.extend(variables.iter().map(|v| sanitize_variable(v)));
            for c in clauses {
                collect(c, found);
            }
        }
        Clause::BindScalar { variable } => {
            found.insert(sanitize_variable(variable));
        }
        Clause::Unrecognized => {}
    }
}

fn collect_arguments(arguments: &[Argument], found: &mut BTreeSet<String>) {
    found.extend(
        arguments
            .iter()
            .filter_map(|a| a.as_variable())
            .map(sanitize_variable),
    );
}

fn rename_name(name: &str, mapping: &BTreeMap<String, String>) -> String {
    let name = sanitize_variable(name);
    mapping.get(&name).cloned().unwrap_or(name)
}

fn substitute_arguments(arguments: &[Argument], mapping: &BTreeMap<String, String>) -> Vec<Argument> {
    arguments
        .iter()
        .map(|a| match a {
            Argument::Variable(name) => Argument::Variable(rename_name(name, mapping)),
            other => other.clone(),
        })
        .collect()
}

fn substitute_all(clauses: &[Clause], mapping: &BTreeMap<String, String>) -> Vec<Clause> {
    clauses.iter().map(|c| substitute(c, mapping)).collect()
}

fn substitute(clause: &Clause, mapping: &BTreeMap<String, String>) -> Clause {
    match clause {
        Clause::DataPattern { src_var, arguments } => Clause::DataPattern {
            src_var: src_var.clone(),
            arguments: substitute_arguments(arguments, mapping),
        },
        Clause::FnExpr {
            function,
            arguments,
            binding,
        } => Clause::FnExpr {
            function: function.clone(),
            arguments: substitute_arguments(arguments, mapping),
            binding: binding.as_ref().map(|b| Box::new(substitute(b, mapping))),
        },
        Clause::PredExpr {
            predicate,
            arguments,
        } => Clause::PredExpr {
            predicate: predicate.clone(),
            arguments: substitute_arguments(arguments, mapping),
        },
        Clause::RuleExpr { rule, arguments } => Clause::RuleExpr {
            rule: rule.clone(),
            arguments: substitute_arguments(arguments, mapping),
        },
        Clause::NotClause { src_var, clauses } => Clause::NotClause {
            src_var: src_var.clone(),
            clauses: substitute_all(clauses, mapping),
        },
        Clause::OrClause { src_var, clauses } => Clause::OrClause {
            src_var: src_var.clone(),
            clauses: substitute_all(clauses, mapping),
        },
        Clause::AndClause { clauses } => Clause::AndClause {
            clauses: substitute_all(clauses, mapping),
        },
        Clause::NotJoinClause {
            src_var,
            variables,
            clauses,
        } => Clause::NotJoinClause {
            src_var: src_var.clone(),
            variables: variables.iter().map(|v| rename_name(v, mapping)).collect(),
            clauses: substitute_all(clauses, mapping),
        },
        Clause::OrJoinClause {
            src_var,
            variables,
            clauses,
        } => Clause::OrJoinClause {
            src_var: src_var.clone(),
            variables: variables.iter().map(|v| rename_name(v, mapping)).collect(),
            clauses: substitute_all(clauses, mapping),
        },
        Clause::BindScalar { variable } => Clause::BindScalar {
            variable: rename_name(variable, mapping),
        },
        Clause::Unrecognized => Clause::Unrecognized,
    }
}

// =============================================================================
// TESTS
// =============================================================================
