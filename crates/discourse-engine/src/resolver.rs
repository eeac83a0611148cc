//! # Relation Resolver
//!
//! For one entity, finds every declared relation its type takes part in,
//! runs one query per relation direction and aggregates the rows into
//! labeled context groups.
//!
//! ## Algorithm
//!
//! 1. Classify the entity; unclassified entities have no context
//! 2. Plan: relations whose source accepts the type (forward), then
//!    relations whose destination accepts it (complement), each in
//!    declaration order, each `(relation, direction)` at most once
//! 3. Pairs sharing a cache key form one unit, cached as one row map
//! 4. Units run concurrently; any failure fails the whole call
//! 5. Rows are grouped by label (not relation id), indexed by entity id,
//!    last write wins, and the entity itself is dropped
//!
//! Groups come back in plan order, empty ones included.

use crate::cache::{CacheEntry, CacheKey, ResultCache};
use crate::classifier::NodeClassifier;
use crate::error::EngineError;
use crate::store::{Row, Store, cell_text};
use discourse_core::{
    ContextGroup, ContextQuery, Declarations, EntityId, Relation, ResultRow, TranslateOptions,
    Translator, context_query,
};
use futures_util::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Options for one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Re-query even when the cache holds the key.
    pub ignore_cache: bool,
    /// Treat a page as being "in" itself.
    pub same_system_mode: bool,
}

/// One relation direction applicable to an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub relation_id: String,
    pub is_complement: bool,
    /// Group label the rows land in.
    pub label: String,
    pub target_type_id: String,
    pub target_type_label: String,
}

type RowMap = BTreeMap<EntityId, ResultRow>;

pub struct RelationResolver {
    store: Arc<dyn Store>,
    declarations: Arc<Declarations>,
    classifier: Arc<NodeClassifier>,
    cache: Arc<ResultCache>,
}

impl RelationResolver {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        declarations: Arc<Declarations>,
        classifier: Arc<NodeClassifier>,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self {
            store,
            declarations,
            classifier,
            cache,
        }
    }

    /// Relation directions applicable to entities of `type_id`.
    #[must_use]
    pub fn plan(&self, type_id: &str) -> Vec<QueryPlan> {
        let mut seen = BTreeSet::new();
        let mut plans = Vec::new();

        for is_complement in [false, true] {
            for relation in &self.declarations.relations {
                let (own, other, label) = if is_complement {
                    (
                        &relation.destination_type,
                        &relation.source_type,
                        &relation.complement_label,
                    )
                } else {
                    (
                        &relation.source_type,
                        &relation.destination_type,
                        &relation.label,
                    )
                };
                if !Relation::endpoint_accepts(own, type_id) {
                    continue;
                }
                if !seen.insert((relation.id.as_str(), is_complement)) {
                    continue;
                }
                plans.push(QueryPlan {
                    relation_id: relation.id.clone(),
                    is_complement,
                    label: label.clone(),
                    target_type_id: other.clone(),
                    target_type_label: self.declarations.type_label(other),
                });
            }
        }
        plans
    }

    /// Resolve the discourse context of `entity`.
    pub async fn resolve_context(
        &self,
        entity: &EntityId,
        options: ResolveOptions,
    ) -> Result<Vec<ContextGroup>, EngineError> {
        let Some(node_type) = self.classifier.classify(entity).await? else {
            debug!("{} is not a discourse node", entity);
            return Ok(Vec::new());
        };

        let plans = self.plan(&node_type.type_id);
        let units = units(entity, &plans);
        let rows = try_join_all(
            units
                .iter()
                .map(|(key, members)| self.resolve_unit(entity, key, members, options)),
        )
        .await?;

        let mut groups: Vec<ContextGroup> = Vec::new();
        for plan in &plans {
            if !groups.iter().any(|g| g.label == plan.label) {
                groups.push(ContextGroup::new(plan.label.clone()));
            }
        }
        for ((key, _), unit_rows) in units.iter().zip(rows) {
            if let Some(group) = groups.iter_mut().find(|g| g.label == key.label) {
                group.results.extend(unit_rows);
                group.results.remove(entity);
            }
        }

        info!(
            "Resolved {} ({}): {} groups, {} rows",
            entity,
            node_type.display_text,
            groups.len(),
            groups.iter().map(ContextGroup::len).sum::<usize>()
        );
        Ok(groups)
    }

    /// The cached groups of `entity` if every unit is cached and `accept`s
    /// its entry. Never queries for context, only classifies.
    pub async fn cached_context(
        &self,
        entity: &EntityId,
        accept: impl Fn(&CacheEntry) -> bool,
    ) -> Result<Option<Vec<ContextGroup>>, EngineError> {
        let Some(node_type) = self.classifier.classify(entity).await? else {
            return Ok(Some(Vec::new()));
        };

        let plans = self.plan(&node_type.type_id);
        let mut groups: Vec<ContextGroup> = Vec::new();
        for (key, _) in units(entity, &plans) {
            let Some(entry) = self.cache.get(&key).await else {
                return Ok(None);
            };
            if !accept(&entry) {
                return Ok(None);
            }
            let position = match groups.iter().position(|g| g.label == key.label) {
                Some(position) => position,
                None => {
                    groups.push(ContextGroup::new(key.label.clone()));
                    groups.len() - 1
                }
            };
            groups[position].results.extend(entry.results);
            groups[position].results.remove(entity);
        }
        Ok(Some(groups))
    }

    async fn resolve_unit(
        &self,
        entity: &EntityId,
        key: &CacheKey,
        members: &[&QueryPlan],
        options: ResolveOptions,
    ) -> Result<RowMap, EngineError> {
        if !options.ignore_cache {
            if let Some(entry) = self.cache.get(key).await {
                debug!("Cache hit: {} / {} / {}", entity, key.label, key.target_type_label);
                return Ok(entry.results);
            }
        }

        let translator = Translator::new(&self.declarations);
        let translate = TranslateOptions {
            same_system_mode: options.same_system_mode,
        };

        let mut merged = RowMap::new();
        for plan in members {
            let Some(relation) = self
                .declarations
                .relations
                .iter()
                .find(|r| r.id == plan.relation_id)
            else {
                continue;
            };
            let condition_id = format!("c{}", Uuid::new_v4().simple());
            let context = context_query(
                &translator,
                relation,
                plan.is_complement,
                entity,
                &condition_id,
                translate,
            )?;
            let text = context.query.compile();
            debug!("Querying {} for {}:\n{}", plan.relation_id, entity, text);

            let rows = self.store.query(&text).await.map_err(|e| {
                warn!("Query for {} via {} failed: {}", entity, plan.relation_id, e);
                e
            })?;
            for row in rows {
                if let Some(result) = result_row(&context, &plan.target_type_label, &row) {
                    merged.insert(result.id.clone(), result);
                }
            }
        }

        self.cache.insert(key.clone(), merged.clone()).await;
        Ok(merged)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Group plans by cache key, keeping first-appearance order.
fn units<'p>(entity: &EntityId, plans: &'p [QueryPlan]) -> Vec<(CacheKey, Vec<&'p QueryPlan>)> {
    let mut units: Vec<(CacheKey, Vec<&QueryPlan>)> = Vec::new();
    for plan in plans {
        let key = CacheKey::new(entity, &plan.label, &plan.target_type_label);
        match units.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(plan),
            None => units.push((key, vec![plan])),
        }
    }
    units
}

/// `[id, text]` or `[id, text, projection-id]`.
fn result_row(context: &ContextQuery, target_type_label: &str, row: &Row) -> Option<ResultRow> {
    let (Some(id), Some(text)) = (row.first(), row.get(1)) else {
        warn!("Dropping malformed row with {} columns", row.len());
        return None;
    };

    let mut extras = BTreeMap::new();
    if let (Some(projection), Some(value)) = (&context.projection, row.get(2)) {
        extras.insert(projection.role.label().to_string(), cell_text(value));
    }

    Some(ResultRow {
        id: EntityId::new(cell_text(id)),
        text: cell_text(text),
        target_type_label: target_type_label.to_string(),
        is_complement: context.is_complement,
        relation_id: context.relation_id.clone(),
        extras,
    })
}
