//! # discourse-engine
//!
//! The discourse context engine - THE RESOLVER.
//!
//! Runs queries compiled by `discourse-core` against an external store:
//! classifies entities by declared node type, resolves how an entity
//! relates to the rest of the graph, caches the outcome and throttles
//! expensive work through a single-file queue.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = Engine::new(store, declarations, EngineConfig::default())?;
//! if let Some(node_type) = engine.classify(&id).await? {
//!     let groups = engine.resolve_context(&id, ResolveOptions::default()).await?;
//! }
//! ```
//!
//! ## Logging
//!
//! Everything logs through `tracing`. Embedding applications install their
//! own subscriber or call [`init_tracing`].

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod overlay;
pub mod queue;
pub mod resolver;
pub mod store;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use cache::{CacheEntry, CacheKey, ResultCache};
pub use classifier::NodeClassifier;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, StoreError};
pub use overlay::{ContextOverlay, OverlayInfo};
pub use queue::{JobTicket, JobTiming, SchedulingQueue};
pub use resolver::{QueryPlan, RelationResolver, ResolveOptions};
pub use store::{Row, Store};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// TRACING
// =============================================================================

/// Install a global subscriber. `DISCOURSE_LOG_FORMAT=json` switches to
/// machine-parseable output; `RUST_LOG` overrides the default filter.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing() -> bool {
    let log_format = std::env::var("DISCOURSE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "discourse_engine=info".into());

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok(),
    }
}
