//! # Context Overlay
//!
//! The passive-consumer path: small badges that show how many discourse
//! results an entity has. Many of them render at once, so:
//!
//! - a cached result younger than the freshness window answers directly,
//!   without ever becoming a queue job
//! - anything else is resolved through the scheduling queue, bypassing the
//!   cache so stale entries get replaced

use crate::error::EngineError;
use crate::queue::SchedulingQueue;
use crate::resolver::{RelationResolver, ResolveOptions};
use discourse_core::{ContextGroup, EntityId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// What a badge needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayInfo {
    pub groups: Vec<ContextGroup>,
    /// Rows across all groups.
    pub result_count: usize,
    /// Answered from the cache without queueing.
    pub from_cache: bool,
}

impl OverlayInfo {
    fn new(groups: Vec<ContextGroup>, from_cache: bool) -> Self {
        let result_count = groups.iter().map(ContextGroup::len).sum();
        Self {
            groups,
            result_count,
            from_cache,
        }
    }
}

pub struct ContextOverlay {
    resolver: Arc<RelationResolver>,
    queue: Arc<SchedulingQueue>,
    freshness_window: Duration,
}

impl ContextOverlay {
    #[must_use]
    pub fn new(
        resolver: Arc<RelationResolver>,
        queue: Arc<SchedulingQueue>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            resolver,
            queue,
            freshness_window,
        }
    }

    /// Context of `entity`, fresh from the cache or via the queue.
    pub async fn info(
        &self,
        entity: &EntityId,
        same_system_mode: bool,
    ) -> Result<OverlayInfo, EngineError> {
        let window = self.freshness_window;
        if let Some(groups) = self
            .resolver
            .cached_context(entity, |entry| entry.is_fresh(window))
            .await?
        {
            debug!("Overlay for {} served from cache", entity);
            return Ok(OverlayInfo::new(groups, true));
        }

        let resolver = Arc::clone(&self.resolver);
        let entity = entity.clone();
        let options = ResolveOptions {
            ignore_cache: true,
            same_system_mode,
        };
        let groups = self
            .queue
            .schedule(move |ticket| async move {
                let groups = resolver.resolve_context(&entity, options).await;
                ticket.mark_mid();
                groups
            })
            .await??;
        Ok(OverlayInfo::new(groups, false))
    }
}
