//! # Specification Translator
//!
//! Converts authored specifications into clause trees:
//! - node types: the type's own clauses (specification mode) or a title
//!   expression test (format mode), rebound to the query's variable
//! - relations: each triple template becomes one or more data patterns,
//!   with endpoint roles bound to the caller's variables
//!
//! Every local variable is prefixed with a scope (a fresh condition id at
//! resolution time), so two specifications never unify by accident.

use crate::clause::{Argument, Clause};
use crate::declarations::Declarations;
use crate::format::format_expression;
use crate::primitives::{
    ATTR_CHILDREN, ATTR_PAGE, ATTR_PARENTS, ATTR_REFS, ATTR_STRING, ATTR_TITLE,
    DESTINATION_ROLE, FN_EQUALS, FN_INCLUDES, PREDICATE_HAS_ANCESTOR, PREDICATE_HAS_CHILD,
    PREDICATE_HAS_DESCENDANT, PREDICATE_HAS_PARENT, PREDICATE_HAS_TITLE, PREDICATE_IS_A,
    PREDICATE_IS_IN_PAGE, PREDICATE_IS_REFERENCED_BY, PREDICATE_REFERENCES,
    PREDICATE_WITH_TEXT, SOURCE_ROLE, SUBJECT_VARIABLE,
};
use crate::scoping::localize;
use crate::types::{DiscourseError, NodeType, Recognition, Relation, Triple};

/// Translation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// `is in page` also admits the page itself.
    pub same_system_mode: bool,
}

/// Which extra role a relation exposes as a derived projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionRole {
    Context,
    Anchor,
}

impl ProjectionRole {
    /// Key of the projection in a result row's extras.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Anchor => "anchor",
        }
    }
}

/// A derived projection: the role and the scoped variable bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub role: ProjectionRole,
    pub variable: String,
}

/// Translates node types and relations against one set of declarations.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    declarations: &'a Declarations,
}

impl<'a> Translator<'a> {
    #[must_use]
    pub fn new(declarations: &'a Declarations) -> Self {
        Self { declarations }
    }

    #[must_use]
    pub fn declarations(&self) -> &'a Declarations {
        self.declarations
    }

    /// Clauses constraining `var` to be an instance of `node_type`.
    ///
    /// Follows [`NodeType::recognition`]. The wildcard type constrains
    /// nothing; a type that can never match yields an unsatisfiable test.
    pub fn node_clauses(
        &self,
        node_type: &NodeType,
        var: &str,
        scope: &str,
    ) -> Result<Vec<Clause>, DiscourseError> {
        if node_type.is_wildcard() {
            return Ok(Vec::new());
        }
        match node_type.recognition() {
            Recognition::Specification => Ok(localize(
                &node_type.specification,
                SUBJECT_VARIABLE,
                var,
                scope,
            )),
            Recognition::Format => {
                let expression = format_expression(&node_type.format_template)?;
                let title = format!("{}-Title", scope);
                let pattern = format!("{}-Pattern", scope);
                Ok(vec![
                    Clause::triple(var, ATTR_TITLE, Argument::var(&title)),
                    Clause::bind(
                        "re-pattern",
                        vec![Argument::string(&expression)],
                        &pattern,
                    ),
                    Clause::predicate("re-find", vec![Argument::var(&pattern), Argument::var(&title)]),
                ])
            }
            Recognition::Nothing => Ok(vec![Clause::predicate(
                FN_EQUALS,
                vec![Argument::constant("0"), Argument::constant("1")],
            )]),
        }
    }

    /// Clauses for `source_var <label> target_var` through `relation`.
    ///
    /// `label` selects the orientation: the relation's own label keeps it,
    /// the complement label reverses it.
    pub fn relation_clauses(
        &self,
        relation: &Relation,
        label: &str,
        source_var: &str,
        target_var: &str,
        scope: &str,
        options: TranslateOptions,
    ) -> Result<Vec<Clause>, DiscourseError> {
        let (src, dst) = if label == relation.label {
            (source_var, target_var)
        } else if label == relation.complement_label {
            (target_var, source_var)
        } else {
            return Err(DiscourseError::UnknownRelationLabel {
                relation_id: relation.id.clone(),
                label: label.to_string(),
            });
        };

        let mut clauses = Vec::new();
        for triple in &relation.triple_templates {
            clauses.extend(self.triple_clauses(triple, src, dst, scope, options)?);
        }
        Ok(clauses)
    }

    /// The context/anchor projection of a relation, if it defines one.
    #[must_use]
    pub fn projection(relation: &Relation, scope: &str) -> Option<Projection> {
        let roles: Vec<&str> = relation
            .triple_templates
            .iter()
            .flat_map(|t| {
                let mut roles = vec![t.source.as_str()];
                if !takes_literal(&t.predicate) {
                    roles.push(t.target.as_str());
                }
                roles
            })
            .collect();

        let find = |suffix: &str| {
            roles
                .iter()
                .find(|r| r.to_lowercase().ends_with(suffix))
                .map(|r| role_variable(r, "", "", scope))
        };

        find("context")
            .map(|variable| Projection {
                role: ProjectionRole::Context,
                variable,
            })
            .or_else(|| {
                find("anchor").map(|variable| Projection {
                    role: ProjectionRole::Anchor,
                    variable,
                })
            })
    }

    fn triple_clauses(
        &self,
        triple: &Triple,
        src: &str,
        dst: &str,
        scope: &str,
        options: TranslateOptions,
    ) -> Result<Vec<Clause>, DiscourseError> {
        let s = role_variable(&triple.source, src, dst, scope);
        let predicate = triple.predicate.trim().to_lowercase();

        if predicate == PREDICATE_HAS_TITLE {
            return Ok(vec![Clause::triple(
                &s,
                ATTR_TITLE,
                Argument::string(&triple.target),
            )]);
        }
        if predicate == PREDICATE_WITH_TEXT {
            let text = format!("{}-String", s);
            return Ok(vec![
                Clause::triple(&s, ATTR_STRING, Argument::var(&text)),
                Clause::predicate(
                    FN_INCLUDES,
                    vec![Argument::var(&text), Argument::string(&triple.target)],
                ),
            ]);
        }
        if predicate == PREDICATE_IS_A {
            let node_type = self
                .declarations
                .find_node_type(&triple.target)
                .ok_or_else(|| DiscourseError::UnknownNodeType(triple.target.clone()))?;
            return self.node_clauses(node_type, &s, &format!("{}-{}", scope, triple.source));
        }

        let t = role_variable(&triple.target, src, dst, scope);
        let clauses = match predicate.as_str() {
            PREDICATE_REFERENCES => vec![edge(&s, ATTR_REFS, &t)],
            PREDICATE_IS_REFERENCED_BY => vec![edge(&t, ATTR_REFS, &s)],
            PREDICATE_IS_IN_PAGE if options.same_system_mode => vec![Clause::or_join(
                &[s.as_str(), t.as_str()],
                vec![
                    edge(&s, ATTR_PAGE, &t),
                    Clause::predicate(FN_EQUALS, vec![Argument::var(&s), Argument::var(&t)]),
                ],
            )],
            PREDICATE_IS_IN_PAGE => vec![edge(&s, ATTR_PAGE, &t)],
            PREDICATE_HAS_CHILD => vec![edge(&s, ATTR_CHILDREN, &t)],
            PREDICATE_HAS_PARENT => vec![edge(&t, ATTR_CHILDREN, &s)],
            PREDICATE_HAS_ANCESTOR => vec![edge(&s, ATTR_PARENTS, &t)],
            PREDICATE_HAS_DESCENDANT => vec![edge(&t, ATTR_PARENTS, &s)],
            _ => return Err(DiscourseError::UnknownPredicate(triple.predicate.clone())),
        };
        Ok(clauses)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn takes_literal(predicate: &str) -> bool {
    let predicate = predicate.trim().to_lowercase();
    predicate == PREDICATE_HAS_TITLE || predicate == PREDICATE_WITH_TEXT || predicate == PREDICATE_IS_A
}

/// Endpoint roles map to the caller's variables, everything else is scoped.
fn role_variable(role: &str, src: &str, dst: &str, scope: &str) -> String {
    if role.eq_ignore_ascii_case(SOURCE_ROLE) {
        src.to_string()
    } else if role.eq_ignore_ascii_case(DESTINATION_ROLE) {
        dst.to_string()
    } else {
        format!("{}-{}", scope, role)
    }
}

fn edge(from: &str, attribute: &str, to: &str) -> Clause {
    Clause::triple(from, attribute, Argument::var(to))
}

// =============================================================================
// TESTS
// =============================================================================
