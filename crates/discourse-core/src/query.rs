//! # Query Assembly
//!
//! Wraps compiled clauses into complete `[:find ... :where ...]` queries:
//! - classification queries (is this entity an instance of a node type?)
//! - context queries (which entities relate to this one through a relation?)
//!
//! Both are pure text builders; executing them is the engine's job.

use crate::clause::{Argument, Clause};
use crate::compiler::{compile_all, indent, sanitize_variable, variable};
use crate::primitives::{ATTR_STRING, ATTR_TITLE, ATTR_UID, SUBJECT_VARIABLE};
use crate::translator::{Projection, TranslateOptions, Translator};
use crate::types::{DiscourseError, EntityId, NodeType, Relation};
use std::fmt;

/// A query: find variables plus a conjunction of clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub find: Vec<String>,
    pub clauses: Vec<Clause>,
}

impl Query {
    #[must_use]
    pub fn new(find: Vec<String>, clauses: Vec<Clause>) -> Self {
        Self { find, clauses }
    }

    /// Render the query source.
    #[must_use]
    pub fn compile(&self) -> String {
        let find: Vec<String> = self.find.iter().map(|v| variable(v)).collect();
        let body: Vec<String> = compile_all(&self.clauses, 1)
            .into_iter()
            .map(|c| format!("{}{}", indent(1), c))
            .collect();
        format!("[:find {}\n :where\n{}]", find.join(" "), body.join("\n"))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// How the entity under classification is pinned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// By stable id.
    Id(&'a EntityId),
    /// By title or block text.
    Title(&'a str),
}

/// Query returning the entity iff it satisfies `node_type`'s specification.
pub fn classification_query(
    translator: &Translator<'_>,
    node_type: &NodeType,
    subject: Subject<'_>,
) -> Result<Query, DiscourseError> {
    let binding = match subject {
        Subject::Id(id) => Clause::triple(SUBJECT_VARIABLE, ATTR_UID, Argument::string(id.as_str())),
        Subject::Title(title) => Clause::or(vec![
            Clause::triple(SUBJECT_VARIABLE, ATTR_TITLE, Argument::string(title)),
            Clause::triple(SUBJECT_VARIABLE, ATTR_STRING, Argument::string(title)),
        ]),
    };

    let mut clauses = vec![binding];
    clauses.extend(translator.node_clauses(node_type, SUBJECT_VARIABLE, &node_type.type_id)?);
    Ok(Query::new(vec![SUBJECT_VARIABLE.to_string()], clauses))
}

// =============================================================================
// CONTEXT
// =============================================================================

/// One direction of one relation, ready to run for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextQuery {
    pub query: Query,
    /// Label of the group the rows land in.
    pub label: String,
    pub is_complement: bool,
    pub relation_id: String,
    pub target_type_id: String,
    /// Present when rows carry a third column.
    pub projection: Option<Projection>,
}

/// Build the context query for `entity` through one direction of `relation`.
///
/// Forward (`is_complement == false`): `entity` plays the source role and
/// targets are destination-typed. The complement direction swaps both. Rows
/// have the shape `[target-id, target-text]` plus the projection id, if any.
pub fn context_query(
    translator: &Translator<'_>,
    relation: &Relation,
    is_complement: bool,
    entity: &EntityId,
    condition_id: &str,
    options: TranslateOptions,
) -> Result<ContextQuery, DiscourseError> {
    let declarations = translator.declarations();
    let (label, opposite, target_type_id) = if is_complement {
        (
            &relation.complement_label,
            &relation.label,
            &relation.source_type,
        )
    } else {
        (
            &relation.label,
            &relation.complement_label,
            &relation.destination_type,
        )
    };
    let target_type = declarations
        .node_type(target_type_id)
        .ok_or_else(|| DiscourseError::UnknownNodeType(target_type_id.clone()))?;

    let entity_var = "entity".to_string();
    let mut target_var = sanitize_variable(target_type.label());
    if target_var.is_empty() || target_var == entity_var {
        target_var = format!("{}-Target", condition_id);
    }
    let target_uid = format!("{}-Uid", target_var);
    let target_text = format!("{}-Text", target_var);

    // `?Target <opposite> ?entity` reads the relation back towards the entity.
    let mut clauses = vec![Clause::triple(
        &entity_var,
        ATTR_UID,
        Argument::string(entity.as_str()),
    )];
    clauses.extend(translator.relation_clauses(
        relation,
        opposite,
        &target_var,
        &entity_var,
        condition_id,
        options,
    )?);
    clauses.extend(translator.node_clauses(
        target_type,
        &target_var,
        &format!("{}-Target", condition_id),
    )?);
    clauses.push(Clause::triple(&target_var, ATTR_UID, Argument::var(&target_uid)));
    clauses.push(Clause::or_join(
        &[target_var.as_str(), target_text.as_str()],
        vec![
            Clause::triple(&target_var, ATTR_TITLE, Argument::var(&target_text)),
            Clause::triple(&target_var, ATTR_STRING, Argument::var(&target_text)),
        ],
    ));

    let mut find = vec![target_uid, target_text];
    let projection = Translator::projection(relation, condition_id);
    if let Some(projection) = &projection {
        let uid = format!("{}-Uid", projection.variable);
        clauses.push(Clause::triple(
            &projection.variable,
            ATTR_UID,
            Argument::var(&uid),
        ));
        find.push(uid);
    }

    Ok(ContextQuery {
        query: Query::new(find, clauses),
        label: label.clone(),
        is_complement,
        relation_id: relation.id.clone(),
        target_type_id: target_type_id.clone(),
        projection,
    })
}

// =============================================================================
// TESTS
// =============================================================================
