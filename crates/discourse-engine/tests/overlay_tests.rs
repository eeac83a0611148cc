//! # Context Overlay Tests
//!
//! Freshness window and queue bypass, on Tokio's paused clock.

mod common;

use common::{FakeStore, claim_evidence, row};
use discourse_core::EntityId;
use discourse_engine::{Engine, EngineConfig, ResolveOptions};
use std::sync::Arc;
use std::time::Duration;

fn engine(store: &Arc<FakeStore>, freshness_window_ms: u64) -> Engine {
    let config = EngineConfig {
        freshness_window_ms,
        ..EngineConfig::default()
    };
    Engine::new(store.clone(), claim_evidence(), config).expect("engine")
}

fn store() -> Arc<FakeStore> {
    Arc::new(
        FakeStore::new()
            .with_title("X", "[[CLM]] - the sky is blue")
            .respond(
                &["?Evidence-Uid"],
                vec![row("e1", "[[EVD]] - rain"), row("e2", "[[EVD]] - clouds")],
            ),
    )
}

#[tokio::test(start_paused = true)]
async fn fresh_results_skip_the_queue() {
    let store = store();
    let engine = engine(&store, 1_000);
    let x = EntityId::from("X");

    let first = engine.overlay_info(&x, false).await.expect("overlay");
    assert!(!first.from_cache);
    assert_eq!(first.result_count, 2);
    assert_eq!(store.query_count(), 1);

    let second = engine.overlay_info(&x, false).await.expect("overlay");
    assert!(second.from_cache);
    assert_eq!(second.groups, first.groups);
    assert_eq!(store.query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_results_are_requeried() {
    let store = store();
    let engine = engine(&store, 1_000);
    let x = EntityId::from("X");

    engine.overlay_info(&x, false).await.expect("overlay");
    tokio::time::advance(Duration::from_millis(1_500)).await;

    let refreshed = engine.overlay_info(&x, false).await.expect("overlay");
    assert!(!refreshed.from_cache);
    assert_eq!(refreshed.result_count, 2);
    assert_eq!(store.query_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn overlay_reuses_direct_resolutions() {
    let store = store();
    let engine = engine(&store, 1_000);
    let x = EntityId::from("X");

    engine
        .resolve_context(&x, ResolveOptions::default())
        .await
        .expect("resolve");
    let info = engine.overlay_info(&x, false).await.expect("overlay");

    assert!(info.from_cache);
    assert_eq!(store.query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unclassified_entities_report_nothing() {
    let store = store();
    let engine = engine(&store, 1_000);

    let info = engine
        .overlay_info(&EntityId::from("nobody"), false)
        .await
        .expect("overlay");

    assert_eq!(info.result_count, 0);
    assert!(info.groups.is_empty());
    assert_eq!(store.query_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn overlay_info_serializes() {
    let store = store();
    let engine = engine(&store, 1_000);

    let info = engine
        .overlay_info(&EntityId::from("X"), false)
        .await
        .expect("overlay");
    let json = serde_json::to_value(&info).expect("serialize");

    assert_eq!(json["result_count"], 2);
    assert_eq!(json["groups"][0]["label"], "supports");
    assert_eq!(json["groups"][0]["results"]["e1"]["target_type_label"], "Evidence");
}
