//! # Node Classifier
//!
//! Decides which declared node type an entity belongs to. Types are tried
//! in declaration order and the first match wins.
//!
//! Each type is tested the way [`NodeType::recognition`] says, the same
//! rule relation queries use for their targets:
//! - Specification: run the type's clauses with the subject bound to the
//!   entity; any non-empty result is a match
//! - Format: match the entity title against the type's template
//! - Nothing: never matches, and never reaches the store
//!
//! A miss is `Ok(None)`, never an error. Results, misses included, are
//! memoized per entity id for the lifetime of the classifier; `forget`
//! drops one entry.

use crate::error::EngineError;
use crate::store::Store;
use discourse_core::{
    Declarations, EntityId, FormatMatcher, NodeType, Recognition, Subject, Translator,
    classification_query,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub struct NodeClassifier {
    store: Arc<dyn Store>,
    declarations: Arc<Declarations>,
    /// Compiled templates of format-mode types, by type id.
    matchers: BTreeMap<String, FormatMatcher>,
    /// Entity id -> type id, `None` for entities that matched no type.
    memo: RwLock<BTreeMap<EntityId, Option<String>>>,
    memo_enabled: bool,
}

impl NodeClassifier {
    /// Compile every format template up front.
    pub fn new(
        store: Arc<dyn Store>,
        declarations: Arc<Declarations>,
        memo_enabled: bool,
    ) -> Result<Self, EngineError> {
        let mut matchers = BTreeMap::new();
        for node_type in &declarations.node_types {
            if node_type.recognition() == Recognition::Format {
                matchers.insert(
                    node_type.type_id.clone(),
                    FormatMatcher::new(&node_type.format_template)?,
                );
            }
        }
        Ok(Self {
            store,
            declarations,
            matchers,
            memo: RwLock::new(BTreeMap::new()),
            memo_enabled,
        })
    }

    /// Classify an entity by id.
    pub async fn classify(&self, id: &EntityId) -> Result<Option<NodeType>, EngineError> {
        if let Some(remembered) = self.remembered(id).await {
            return Ok(remembered);
        }

        let title = self.store.title_of(id).await?;
        let translator = Translator::new(&self.declarations);
        for node_type in &self.declarations.node_types {
            let matched = match node_type.recognition() {
                Recognition::Format => title
                    .as_deref()
                    .is_some_and(|t| self.title_matches(node_type, t)),
                Recognition::Specification => {
                    let query = classification_query(&translator, node_type, Subject::Id(id))?;
                    !self.store.query(&query.compile()).await?.is_empty()
                }
                Recognition::Nothing => false,
            };
            if matched {
                debug!("Classified {} as {}", id, node_type.display_text);
                self.remember(id, Some(node_type)).await;
                return Ok(Some(node_type.clone()));
            }
        }
        self.remember(id, None).await;
        Ok(None)
    }

    /// Classify by title (or exact block text).
    pub async fn classify_title(&self, title: &str) -> Result<Option<NodeType>, EngineError> {
        let id = self.store.id_of_title(title).await?;
        if let Some(id) = &id {
            if let Some(remembered) = self.remembered(id).await {
                return Ok(remembered);
            }
        }

        let translator = Translator::new(&self.declarations);
        let mut found = None;
        for node_type in &self.declarations.node_types {
            let matched = match node_type.recognition() {
                Recognition::Format => self.title_matches(node_type, title),
                Recognition::Specification => {
                    let query =
                        classification_query(&translator, node_type, Subject::Title(title))?;
                    !self.store.query(&query.compile()).await?.is_empty()
                }
                Recognition::Nothing => false,
            };
            if matched {
                found = Some(node_type);
                break;
            }
        }
        if let Some(id) = &id {
            self.remember(id, found).await;
        }
        Ok(found.cloned())
    }

    /// Classify each direct child of `id`, in store order.
    pub async fn classify_children(
        &self,
        id: &EntityId,
    ) -> Result<Vec<(EntityId, Option<NodeType>)>, EngineError> {
        let children = self.store.shallow_children_of(id).await?;
        let mut classified = Vec::with_capacity(children.len());
        for child in children {
            let node_type = self.classify(&child).await?;
            classified.push((child, node_type));
        }
        Ok(classified)
    }

    /// Drop the memoized type of one entity.
    pub async fn forget(&self, id: &EntityId) -> bool {
        self.memo.write().await.remove(id).is_some()
    }

    pub async fn memo_len(&self) -> usize {
        self.memo.read().await.len()
    }

    /// `Some(result)` when `id` has been classified before.
    async fn remembered(&self, id: &EntityId) -> Option<Option<NodeType>> {
        if !self.memo_enabled {
            return None;
        }
        let type_id = self.memo.read().await.get(id).cloned()?;
        Some(type_id.and_then(|t| self.declarations.node_type(&t).cloned()))
    }

    async fn remember(&self, id: &EntityId, node_type: Option<&NodeType>) {
        if self.memo_enabled {
            self.memo
                .write()
                .await
                .insert(id.clone(), node_type.map(|t| t.type_id.clone()));
        }
    }

    fn title_matches(&self, node_type: &NodeType, title: &str) -> bool {
        self.matchers
            .get(&node_type.type_id)
            .is_some_and(|matcher| matcher.is_match(title))
    }
}
