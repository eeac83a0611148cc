//! # Core Type Definitions
//!
//! This module contains the data model shared by the compiler and the engine:
//! - Entity identifiers (`EntityId`)
//! - Declared node types and relations (`NodeType`, `Relation`, `Triple`)
//! - Resolution output (`ResultRow`, `ContextGroup`)
//! - Error types (`DiscourseError`)
//!
//! ## Determinism Guarantees
//!
//! Result maps use `BTreeMap`, so iteration order never depends on insertion
//! order or hashing.

use crate::clause::Clause;
use crate::compiler::compile;
use crate::primitives::{WILDCARD_LABEL, WILDCARD_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Stable id of an addressable item in the external store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// NODE TYPES
// =============================================================================

/// How entities are recognized as instances of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Run the type's specification against the store.
    #[default]
    Specification,
    /// Match the entity title against the format template.
    Format,
}

/// The test an entity must pass to belong to a node type.
///
/// Derived from the declared mode: a format type always matches its title
/// template; a specification type runs its clauses, falls back to the
/// template when no clause produces query text, and matches nothing when it
/// has neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognition {
    Specification,
    Format,
    Nothing,
}

/// A declared node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeType {
    pub type_id: String,
    pub display_text: String,
    #[serde(default)]
    pub shortcut: String,
    /// Clauses written against the local subject `?node`.
    #[serde(default)]
    pub specification: Vec<Clause>,
    #[serde(default)]
    pub classification_mode: ClassificationMode,
    #[serde(default)]
    pub format_template: String,
}

impl NodeType {
    /// The wildcard type, used for relation endpoints that accept anything.
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            type_id: WILDCARD_TYPE.to_string(),
            display_text: WILDCARD_LABEL.to_string(),
            shortcut: String::new(),
            specification: Vec::new(),
            classification_mode: ClassificationMode::Specification,
            format_template: String::new(),
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.type_id == WILDCARD_TYPE
    }

    /// How instances of this type are recognized. The classifier and the
    /// translator both go through this, so they never disagree.
    #[must_use]
    pub fn recognition(&self) -> Recognition {
        if self.is_wildcard() {
            return Recognition::Specification;
        }
        match self.classification_mode {
            ClassificationMode::Format => Recognition::Format,
            ClassificationMode::Specification => {
                if self.specification.iter().any(|c| !compile(c, 0).is_empty()) {
                    Recognition::Specification
                } else if !self.format_template.is_empty() {
                    Recognition::Format
                } else {
                    Recognition::Nothing
                }
            }
        }
    }

    /// Display label used in result rows.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.is_wildcard() {
            WILDCARD_LABEL
        } else {
            &self.display_text
        }
    }
}

// =============================================================================
// RELATIONS
// =============================================================================

/// One triple template of a relation: `source predicate target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub source: String,
    pub predicate: String,
    pub target: String,
}

impl Triple {
    #[must_use]
    pub fn new(source: &str, predicate: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            predicate: predicate.to_string(),
            target: target.to_string(),
        }
    }
}

/// A directed, labeled association between two node types.
///
/// `label` reads source-to-destination, `complement_label` reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    pub label: String,
    pub complement_label: String,
    pub source_type: String,
    pub destination_type: String,
    #[serde(default)]
    pub triple_templates: Vec<Triple>,
}

impl Relation {
    /// Whether the endpoint type accepts `type_id`.
    #[must_use]
    pub fn endpoint_accepts(endpoint: &str, type_id: &str) -> bool {
        endpoint == WILDCARD_TYPE || endpoint == type_id
    }
}

// =============================================================================
// RESOLUTION OUTPUT
// =============================================================================

/// One related entity inside a context group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: EntityId,
    pub text: String,
    pub target_type_label: String,
    pub is_complement: bool,
    pub relation_id: String,
    /// Derived projections (`context`, `anchor`) keyed by label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

/// Result rows for one relation label, indexed by entity id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextGroup {
    pub label: String,
    pub results: BTreeMap<EntityId, ResultRow>,
}

impl ContextGroup {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            results: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised while validating declarations or translating specifications.
///
/// Unknown clause kinds and classification misses are NOT errors.
#[derive(Debug, Error)]
pub enum DiscourseError {
    /// A format template must contain exactly one `{content}` placeholder.
    #[error("Format template {template:?} has {found} {{content}} placeholders, expected 1")]
    InvalidFormatTemplate { template: String, found: usize },

    /// A derived expression failed to compile.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// A relation's label and complement label must differ.
    #[error("Relation {0} has identical label and complement label")]
    IndistinctLabels(String),

    /// Two relations share one id.
    #[error("Duplicate relation id: {0}")]
    DuplicateRelation(String),

    /// A referenced node type is not declared.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// The label is neither the relation's label nor its complement.
    #[error("Relation {relation_id} has no label {label:?}")]
    UnknownRelationLabel { relation_id: String, label: String },

    /// A triple template uses a predicate the translator does not know.
    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    /// Declarations could not be parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
