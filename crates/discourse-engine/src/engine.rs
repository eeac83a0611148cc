//! # Engine
//!
//! One explicit service object wiring the store, the declarations and the
//! engine's state together. Nothing is global: two engines never share a
//! cache, a classification memo or a queue.

use crate::cache::ResultCache;
use crate::classifier::NodeClassifier;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::overlay::{ContextOverlay, OverlayInfo};
use crate::queue::{JobTicket, SchedulingQueue};
use crate::resolver::{QueryPlan, RelationResolver, ResolveOptions};
use crate::store::Store;
use discourse_core::{ContextGroup, Declarations, EntityId, NodeType};
use std::sync::Arc;
use tracing::info;

pub struct Engine {
    config: EngineConfig,
    declarations: Arc<Declarations>,
    classifier: Arc<NodeClassifier>,
    cache: Arc<ResultCache>,
    resolver: Arc<RelationResolver>,
    queue: Arc<SchedulingQueue>,
    overlay: ContextOverlay,
}

impl Engine {
    /// Build an engine. Must be called inside a Tokio runtime.
    pub fn new(
        store: Arc<dyn Store>,
        declarations: Declarations,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        declarations.validate()?;
        let declarations = Arc::new(declarations);

        let classifier = Arc::new(NodeClassifier::new(
            Arc::clone(&store),
            Arc::clone(&declarations),
            config.classification_memo,
        )?);
        let cache = Arc::new(ResultCache::new());
        let resolver = Arc::new(RelationResolver::new(
            store,
            Arc::clone(&declarations),
            Arc::clone(&classifier),
            Arc::clone(&cache),
        ));
        let queue = Arc::new(SchedulingQueue::new(config.backoff_factor));
        let overlay = ContextOverlay::new(
            Arc::clone(&resolver),
            Arc::clone(&queue),
            config.freshness_window(),
        );

        info!(
            "Engine ready: {} node types, {} relations",
            declarations.node_types.len(),
            declarations.relations.len()
        );
        Ok(Self {
            config,
            declarations,
            classifier,
            cache,
            resolver,
            queue,
            overlay,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The declared type of an entity, or `None` if it is not a discourse node.
    pub async fn classify(&self, id: &EntityId) -> Result<Option<NodeType>, EngineError> {
        self.classifier.classify(id).await
    }

    pub async fn classify_title(&self, title: &str) -> Result<Option<NodeType>, EngineError> {
        self.classifier.classify_title(title).await
    }

    pub async fn classify_children(
        &self,
        id: &EntityId,
    ) -> Result<Vec<(EntityId, Option<NodeType>)>, EngineError> {
        self.classifier.classify_children(id).await
    }

    #[must_use]
    pub fn plan(&self, type_id: &str) -> Vec<QueryPlan> {
        self.resolver.plan(type_id)
    }

    pub async fn resolve_context(
        &self,
        id: &EntityId,
        options: ResolveOptions,
    ) -> Result<Vec<ContextGroup>, EngineError> {
        self.resolver.resolve_context(id, options).await
    }

    /// Run expensive work through this engine's queue.
    pub async fn schedule<F, Fut, T>(&self, job: F) -> Result<T, EngineError>
    where
        F: FnOnce(JobTicket) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.queue.schedule(job).await
    }

    pub async fn overlay_info(
        &self,
        id: &EntityId,
        same_system_mode: bool,
    ) -> Result<OverlayInfo, EngineError> {
        self.overlay.info(id, same_system_mode).await
    }

    /// Forget everything known about one entity after it was edited.
    pub async fn invalidate(&self, id: &EntityId) -> usize {
        self.classifier.forget(id).await;
        self.cache.evict_entity(id).await
    }
}
