//! # Property-Based Tests
//!
//! Invariants of the compiler, the scoping pass and format templates,
//! checked over generated clause trees.

use discourse_core::clause::{Argument, Clause};
use discourse_core::compiler::{compile, compile_all};
use discourse_core::format::FormatMatcher;
use discourse_core::scoping::{Alias, rename, variables};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use regex::Regex;
use std::collections::BTreeSet;

// =============================================================================
// STRATEGIES
// =============================================================================

fn var_name() -> impl Strategy<Value = String> {
    "[a-z]{1,4}"
}

fn argument() -> impl Strategy<Value = Argument> {
    prop_oneof![
        var_name().prop_map(Argument::Variable),
        Just(Argument::Wildcard),
        prop::sample::select(vec![":block/refs", ":node/title", ":block/uid", "42"])
            .prop_map(Argument::constant),
        // Printable ASCII, quotes and brackets included.
        "[ -~]{0,8}".prop_map(|s| Argument::string(&s)),
    ]
}

fn function_name() -> impl Strategy<Value = String> {
    "[a-z]{1,5}\\??"
}

fn clause() -> impl Strategy<Value = Clause> {
    let leaf = prop_oneof![
        vec(argument(), 1..4).prop_map(Clause::pattern),
        (function_name(), vec(argument(), 0..3), var_name())
            .prop_map(|(f, args, v)| Clause::bind(&f, args, &v)),
        (function_name(), vec(argument(), 0..3)).prop_map(|(f, args)| Clause::predicate(&f, args)),
        Just(Clause::Unrecognized),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(Clause::not),
            vec(inner.clone(), 0..4).prop_map(Clause::or),
            vec(inner.clone(), 0..4).prop_map(|clauses| Clause::AndClause { clauses }),
            (vec(var_name(), 0..3), vec(inner, 0..4)).prop_map(|(variables, clauses)| {
                Clause::OrJoinClause {
                    src_var: None,
                    variables,
                    clauses,
                }
            }),
        ]
    })
}

// =============================================================================
// HELPERS
// =============================================================================

/// Brackets and parentheses balance outside string literals.
fn balanced(text: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '(' => stack.push(c),
            ']' => {
                if stack.pop() != Some('[') {
                    return false;
                }
            }
            ')' => {
                if stack.pop() != Some('(') {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty() && !in_string
}

/// Distinct `?variable` tokens in compiled fragments.
fn printed_variables(fragments: &[String]) -> BTreeSet<String> {
    let token = Regex::new(r"\?[^\s\[\]()]+").expect("valid regex");
    fragments
        .iter()
        .flat_map(|f| token.find_iter(f).map(|m| m.as_str().to_string()))
        .collect()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Compiling the same tree twice produces byte-identical text.
    #[test]
    fn compilation_is_deterministic(tree in clause(), level in 0usize..4) {
        let copy = tree.clone();
        prop_assert_eq!(compile(&tree, level), compile(&copy, level));
    }

    /// Every fragment is well-bracketed.
    #[test]
    fn compiled_fragments_are_balanced(trees in vec(clause(), 0..5)) {
        for fragment in compile_all(&trees, 0) {
            prop_assert!(balanced(&fragment), "unbalanced: {}", fragment);
        }
    }

    /// Renaming to fresh names leaves no source name behind.
    #[test]
    fn rename_is_total(trees in vec(clause(), 1..4)) {
        let present: Vec<String> = variables(&trees).into_iter().collect();
        // Upper-case names never collide with generated lower-case ones.
        let aliases: Vec<Alias> = present
            .iter()
            .enumerate()
            .map(|(i, name)| Alias::new(name.clone(), format!("V{}", i)))
            .collect();
        let renamed = rename(&aliases, &trees);
        let after = variables(&renamed);
        for (i, name) in present.iter().enumerate() {
            prop_assert!(!after.contains(name));
            let target = format!("V{}", i);
            prop_assert!(after.contains(&target));
        }
    }

    /// Variables neither renamed nor targeted keep their names.
    #[test]
    fn rename_leaves_bystanders_alone(trees in vec(clause(), 1..4)) {
        let present: Vec<String> = variables(&trees).into_iter().collect();
        prop_assume!(!present.is_empty());
        let from = present[0].clone();
        let renamed = rename(&[Alias::new(from.clone(), "Fresh")], &trees);
        let after = variables(&renamed);
        for name in present.iter().skip(1) {
            prop_assert!(after.contains(name));
        }
    }

    /// Renaming onto an existing name never merges two variables.
    #[test]
    fn rename_never_captures(trees in vec(clause(), 1..4), pick in any::<prop::sample::Index>()) {
        let present: Vec<String> = variables(&trees).into_iter().collect();
        prop_assume!(present.len() >= 2);
        let from = pick.get(&present).clone();
        let to = present.iter().find(|v| **v != from).cloned().unwrap_or_default();

        let renamed = rename(&[Alias::new(from.clone(), to.clone())], &trees);
        let after = variables(&renamed);
        prop_assert!(!after.contains(&from));
        prop_assert!(after.contains(&to));
        prop_assert_eq!(after.len(), present.len());
    }

    /// A target spelled with spaces or brackets prints like an existing
    /// variable; that variable must still be moved aside.
    #[test]
    fn rename_never_captures_printed_names(
        names in btree_set("[a-z]{1,4}", 2..5),
        noise in "[ \\[\\]()]{1,3}",
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let trees: Vec<Clause> = names
            .windows(2)
            .map(|w| Clause::triple(&w[0], ":block/refs", Argument::var(w[1].as_str())))
            .collect();
        let (head, tail) = names[1].split_at(1);
        let to = format!("{}{}{}", head, noise, tail);

        let renamed = rename(&[Alias::new(names[0].clone(), to)], &trees);
        let before = printed_variables(&compile_all(&trees, 0));
        let after = printed_variables(&compile_all(&renamed, 0));
        prop_assert_eq!(after.len(), before.len());
        let renamed_away = format!("?{}", names[0]);
        prop_assert!(!after.contains(&renamed_away));
    }

    /// Titles built from a template always match it and yield the content.
    #[test]
    fn format_templates_are_sound(
        prefix in "[a-zA-Z0-9 .?*+()\\[\\]-]{0,8}",
        suffix in "[a-zA-Z0-9 .?*+()\\[\\]-]{0,8}",
        content in "[a-z ]{0,10}"
    ) {
        let template = format!("{}{{content}}{}", prefix, suffix);
        let matcher = FormatMatcher::new(&template).expect("valid template");
        let title = format!("{}{}{}", prefix, content, suffix);
        prop_assert!(matcher.is_match(&title));
        prop_assert_eq!(matcher.content(&title), Some(content.as_str()));
    }
}
