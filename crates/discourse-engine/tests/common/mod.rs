//! Scripted in-memory store shared by the engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use discourse_core::{ClassificationMode, Declarations, EntityId, NodeType, Relation, Triple};
use discourse_engine::{Row, Store, StoreError};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

struct Response {
    needles: Vec<String>,
    rows: Vec<Row>,
}

/// Answers queries by substring match; records every query it sees.
#[derive(Default)]
pub struct FakeStore {
    titles: BTreeMap<EntityId, String>,
    children: BTreeMap<EntityId, Vec<EntityId>>,
    responses: Vec<Response>,
    failures: Vec<String>,
    delay: Option<Duration>,
    log: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, id: &str, title: &str) -> Self {
        self.titles.insert(EntityId::from(id), title.to_string());
        self
    }

    pub fn with_children(mut self, id: &str, children: &[&str]) -> Self {
        self.children.insert(
            EntityId::from(id),
            children.iter().map(|c| EntityId::from(*c)).collect(),
        );
        self
    }

    /// Queries containing every needle get `rows`. First match wins.
    pub fn respond(mut self, needles: &[&str], rows: Vec<Row>) -> Self {
        self.responses.push(Response {
            needles: needles.iter().map(|n| (*n).to_string()).collect(),
            rows,
        });
        self
    }

    /// Queries containing `needle` fail.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.failures.push(needle.to_string());
        self
    }

    /// Every query takes this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().expect("log lock").len()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn query(&self, query: &str) -> Result<Vec<Row>, StoreError> {
        self.log.lock().expect("log lock").push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(needle) = self.failures.iter().find(|n| query.contains(n.as_str())) {
            return Err(StoreError::new(format!("scripted failure on {}", needle)));
        }
        Ok(self
            .responses
            .iter()
            .find(|r| r.needles.iter().all(|n| query.contains(n.as_str())))
            .map(|r| r.rows.clone())
            .unwrap_or_default())
    }

    async fn title_of(&self, id: &EntityId) -> Result<Option<String>, StoreError> {
        Ok(self.titles.get(id).cloned())
    }

    async fn id_of_title(&self, title: &str) -> Result<Option<EntityId>, StoreError> {
        Ok(self
            .titles
            .iter()
            .find(|(_, t)| t.as_str() == title)
            .map(|(id, _)| id.clone()))
    }

    async fn shallow_children_of(&self, id: &EntityId) -> Result<Vec<EntityId>, StoreError> {
        Ok(self.children.get(id).cloned().unwrap_or_default())
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn row(id: &str, text: &str) -> Row {
    vec![json!(id), json!(text)]
}

pub fn row_with(id: &str, text: &str, extra: &str) -> Row {
    vec![json!(id), json!(text), Value::String(extra.to_string())]
}

pub fn format_type(type_id: &str, display_text: &str, template: &str) -> NodeType {
    NodeType {
        type_id: type_id.into(),
        display_text: display_text.into(),
        shortcut: display_text.chars().take(1).collect(),
        specification: Vec::new(),
        classification_mode: ClassificationMode::Format,
        format_template: template.into(),
    }
}

pub fn relation(
    id: &str,
    label: &str,
    complement: &str,
    source: &str,
    destination: &str,
) -> Relation {
    Relation {
        id: id.into(),
        label: label.into(),
        complement_label: complement.into(),
        source_type: source.into(),
        destination_type: destination.into(),
        triple_templates: vec![
            Triple::new("Block", "references", "source"),
            Triple::new("Block", "references", "destination"),
        ],
    }
}

/// Claim and Evidence (format mode), Claim `supports` Evidence.
pub fn claim_evidence() -> Declarations {
    Declarations::new(
        vec![
            format_type("clm", "Claim", "[[CLM]] - {content}"),
            format_type("evd", "Evidence", "[[EVD]] - {content}"),
        ],
        vec![relation("r-supports", "supports", "is supported by", "clm", "evd")],
    )
    .expect("valid declarations")
}
