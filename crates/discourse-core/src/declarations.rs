//! # Declarations
//!
//! The declared configuration: every node type and relation the engine
//! knows about. Loaded by an external configuration layer, validated once,
//! then shared read-only.
//!
//! Validation rejects:
//! - title templates in use (format types, and specification types falling
//!   back to one) without exactly one `{content}` placeholder
//! - relations whose label equals their complement label
//! - duplicate relation ids (resolution deduplicates by id)
//! - relation endpoints naming an undeclared type

use crate::format::format_expression;
use crate::primitives::WILDCARD_TYPE;
use crate::types::{DiscourseError, NodeType, Recognition, Relation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

lazy_static! {
    static ref WILDCARD: NodeType = NodeType::wildcard();
}

/// All declared node types and relations, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default)]
    pub node_types: Vec<NodeType>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Declarations {
    /// Build and validate.
    pub fn new(node_types: Vec<NodeType>, relations: Vec<Relation>) -> Result<Self, DiscourseError> {
        let declarations = Self {
            node_types,
            relations,
        };
        declarations.validate()?;
        Ok(declarations)
    }

    /// Parse declarations from TOML and validate them.
    pub fn from_toml_str(source: &str) -> Result<Self, DiscourseError> {
        let declarations: Self =
            toml::from_str(source).map_err(|e| DiscourseError::ConfigError(e.to_string()))?;
        declarations.validate()?;
        Ok(declarations)
    }

    /// Check every declaration invariant.
    pub fn validate(&self) -> Result<(), DiscourseError> {
        for node_type in &self.node_types {
            if node_type.recognition() == Recognition::Format {
                format_expression(&node_type.format_template)?;
            }
        }

        let mut seen = BTreeSet::new();
        for relation in &self.relations {
            if relation.label == relation.complement_label {
                return Err(DiscourseError::IndistinctLabels(relation.id.clone()));
            }
            if !seen.insert(relation.id.as_str()) {
                return Err(DiscourseError::DuplicateRelation(relation.id.clone()));
            }
            for endpoint in [&relation.source_type, &relation.destination_type] {
                if endpoint != WILDCARD_TYPE && self.node_type(endpoint).is_none() {
                    return Err(DiscourseError::UnknownNodeType(endpoint.clone()));
                }
            }
        }
        Ok(())
    }

    /// Look up a node type by id. The wildcard id resolves to the wildcard type.
    #[must_use]
    pub fn node_type(&self, type_id: &str) -> Option<&NodeType> {
        if type_id == WILDCARD_TYPE {
            return Some(&WILDCARD);
        }
        self.node_types.iter().find(|t| t.type_id == type_id)
    }

    /// Look up a node type by id or display text.
    #[must_use]
    pub fn find_node_type(&self, reference: &str) -> Option<&NodeType> {
        self.node_type(reference).or_else(|| {
            self.node_types
                .iter()
                .find(|t| t.display_text == reference)
        })
    }

    /// Display label of a type id; unknown ids fall back to the id itself.
    #[must_use]
    pub fn type_label(&self, type_id: &str) -> String {
        self.node_type(type_id)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| type_id.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{Argument, Clause};
    use crate::types::{ClassificationMode, Triple};

    fn claim() -> NodeType {
        NodeType {
            type_id: "clm".into(),
            display_text: "Claim".into(),
            shortcut: "C".into(),
            specification: Vec::new(),
            classification_mode: ClassificationMode::Format,
            format_template: "[[CLM]] - {content}".into(),
        }
    }

    fn supports(label: &str, complement: &str) -> Relation {
        Relation {
            id: "r1".into(),
            label: label.into(),
            complement_label: complement.into(),
            source_type: "clm".into(),
            destination_type: "*".into(),
            triple_templates: vec![Triple::new("source", "references", "destination")],
        }
    }

    #[test]
    fn valid_declarations_pass() {
        let declarations =
            Declarations::new(vec![claim()], vec![supports("supports", "is supported by")]);
        assert!(declarations.is_ok());
    }

    #[test]
    fn equal_labels_rejected() {
        let result = Declarations::new(vec![claim()], vec![supports("same", "same")]);
        assert!(matches!(result, Err(DiscourseError::IndistinctLabels(id)) if id == "r1"));
    }

    #[test]
    fn duplicate_relation_ids_rejected() {
        let relation = supports("supports", "is supported by");
        let result = Declarations::new(vec![claim()], vec![relation.clone(), relation]);
        assert!(matches!(result, Err(DiscourseError::DuplicateRelation(_))));
    }

    #[test]
    fn format_template_without_content_rejected() {
        let mut bad = claim();
        bad.format_template = "[[CLM]]".into();
        let result = Declarations::new(vec![bad], Vec::new());
        assert!(matches!(
            result,
            Err(DiscourseError::InvalidFormatTemplate { found: 0, .. })
        ));
    }

    #[test]
    fn template_fallback_is_validated_too() {
        let mut bad = claim();
        bad.classification_mode = ClassificationMode::Specification;
        bad.format_template = "[[CLM]]".into();
        let result = Declarations::new(vec![bad], Vec::new());
        assert!(matches!(
            result,
            Err(DiscourseError::InvalidFormatTemplate { .. })
        ));
    }

    #[test]
    fn recognition_follows_the_mode() {
        let format = claim();
        assert_eq!(format.recognition(), Recognition::Format);

        let mut with_spec = claim();
        with_spec.specification = vec![Clause::triple("node", ":node/title", Argument::var("t"))];
        assert_eq!(with_spec.recognition(), Recognition::Format);

        with_spec.classification_mode = ClassificationMode::Specification;
        assert_eq!(with_spec.recognition(), Recognition::Specification);

        let mut template_only = claim();
        template_only.classification_mode = ClassificationMode::Specification;
        assert_eq!(template_only.recognition(), Recognition::Format);

        template_only.specification = vec![Clause::Unrecognized];
        assert_eq!(template_only.recognition(), Recognition::Format);

        template_only.format_template = String::new();
        assert_eq!(template_only.recognition(), Recognition::Nothing);

        assert_eq!(NodeType::wildcard().recognition(), Recognition::Specification);
    }

    #[test]
    fn undeclared_endpoint_rejected() {
        let mut relation = supports("supports", "is supported by");
        relation.destination_type = "evd".into();
        let result = Declarations::new(vec![claim()], vec![relation]);
        assert!(matches!(result, Err(DiscourseError::UnknownNodeType(t)) if t == "evd"));
    }

    #[test]
    fn lookups() {
        let declarations = Declarations::new(vec![claim()], Vec::new()).expect("valid");
        assert_eq!(declarations.type_label("clm"), "Claim");
        assert_eq!(declarations.type_label("*"), "Any");
        assert!(declarations.find_node_type("Claim").is_some());
        assert!(declarations.find_node_type("Evidence").is_none());
    }

    #[test]
    fn parses_toml() {
        let source = r#"
            [[node_types]]
            type_id = "clm"
            display_text = "Claim"
            classification_mode = "format"
            format_template = "[[CLM]] - {content}"

            [[node_types]]
            type_id = "evd"
            display_text = "Evidence"

            [[node_types.specification]]
            type = "data-pattern"
            arguments = [
                { type = "variable", value = "node" },
                { type = "constant", value = ":node/title" },
                { type = "variable", value = "title" },
            ]

            [[relations]]
            id = "r1"
            label = "supports"
            complement_label = "is supported by"
            source_type = "evd"
            destination_type = "clm"
            triple_templates = [
                { source = "source", predicate = "references", target = "destination" },
            ]
        "#;
        let declarations = Declarations::from_toml_str(source).expect("parse");
        assert_eq!(declarations.node_types.len(), 2);
        assert_eq!(declarations.node_types[1].specification.len(), 1);
        assert_eq!(declarations.relations[0].label, "supports");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = Declarations::from_toml_str("node_types = 3");
        assert!(matches!(result, Err(DiscourseError::ConfigError(_))));
    }
}
