//! Capture/send pipeline: two-phase writes, classification, guards

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;
use veriface_types::{AppEvent, ResultStatus, TriggerMode};
use veriface_verify::{HttpVerifier, VerifyError};

use super::support::{ScriptedVerifier, harness};
use crate::capture_context::CaptureContext;
use crate::events::capture_and_send::{capture_and_send, prepare};

#[tokio::test]
async fn test_success_goes_pending_then_done_in_place() {
    let (verifier, gate) = ScriptedVerifier::ok(json!({"is_real": true, "score": 0.9})).gated();
    let h = harness(Arc::new(verifier), "http://verify.local");

    let attempt = prepare(&h.ctx, TriggerMode::Manual).await.unwrap();
    let id = attempt.pending().id;

    {
        let store = h.ctx.state.stores.for_mode(TriggerMode::Manual).read().await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().status, ResultStatus::Pending);
    }

    let run = tokio::spawn(attempt.run());
    gate.add_permits(1);
    let record = timeout(Duration::from_secs(5), run).await.unwrap().unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.status, ResultStatus::Done);
    assert_eq!(record.data, json!({"is_real": true, "score": 0.9}));
    assert!(record.msg.contains("Face verification successful!"));

    let store = h.ctx.state.stores.for_mode(TriggerMode::Manual).read().await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.position(&id), Some(0));
    assert_eq!(store.get(&id), Some(&record));
}

#[tokio::test]
async fn test_rejection_maps_message() {
    let verifier = ScriptedVerifier::ok(json!({"is_real": false, "error": "No valid face detected"}));
    let h = harness(Arc::new(verifier), "http://verify.local");

    let record = capture_and_send(&h.ctx, TriggerMode::Manual).await.unwrap();

    assert_eq!(record.status, ResultStatus::Error);
    assert_eq!(record.data, json!("No valid face detected"));
    assert!(record.msg.contains("No face detected in the image."));
    assert_eq!(h.ctx.state.stores.snapshot(TriggerMode::Manual).await, vec![record]);
}

#[tokio::test]
async fn test_unmapped_code_uses_fallback() {
    let verifier = ScriptedVerifier::ok(json!({"is_real": false, "error": "Spoof suspected"}));
    let h = harness(Arc::new(verifier), "http://verify.local");

    let record = capture_and_send(&h.ctx, TriggerMode::Auto).await.unwrap();
    assert_eq!(record.msg, "ERROR: An unknown error occurred.");
}

#[tokio::test]
async fn test_server_failure_is_recorded() {
    let verifier = ScriptedVerifier::with(|| {
        Err(VerifyError::Server {
            status: 500,
            message: "Internal Server Error".to_string(),
        })
    });
    let h = harness(Arc::new(verifier), "http://verify.local");

    let record = capture_and_send(&h.ctx, TriggerMode::Manual).await.unwrap();
    assert_eq!(record.status, ResultStatus::Error);
    assert_eq!(record.msg, "ERROR: Server error: Internal Server Error");
}

#[tokio::test]
async fn test_unreachable_server_is_no_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = reqwest_client();
    let h = harness(
        Arc::new(HttpVerifier::with_client("/verify", client)),
        &format!("http://{addr}"),
    );

    let record = timeout(
        Duration::from_secs(10),
        capture_and_send(&h.ctx, TriggerMode::Manual),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(record.status, ResultStatus::Error);
    assert!(record.msg.contains("No response from the server."));
    assert!(!h.ctx.state.is_loading());
}

#[tokio::test]
async fn test_empty_server_url_is_noop() {
    let verifier = Arc::new(ScriptedVerifier::ok(json!({"is_real": true})));
    let h = harness(verifier.clone(), "");

    assert!(capture_and_send(&h.ctx, TriggerMode::Manual).await.is_none());
    assert!(capture_and_send(&h.ctx, TriggerMode::Auto).await.is_none());

    assert!(h.ctx.state.stores.snapshot(TriggerMode::Manual).await.is_empty());
    assert!(h.ctx.state.stores.snapshot(TriggerMode::Auto).await.is_empty());
    assert_eq!(verifier.calls(), 0);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn test_feed_not_ready_is_noop() {
    let verifier = Arc::new(ScriptedVerifier::ok(json!({"is_real": true})));
    let h = harness(verifier.clone(), "http://verify.local");
    h.feed.detach();

    assert!(capture_and_send(&h.ctx, TriggerMode::Manual).await.is_none());
    assert!(h.ctx.state.stores.snapshot(TriggerMode::Manual).await.is_empty());
    assert_eq!(verifier.calls(), 0);
}

#[tokio::test]
async fn test_manual_sets_loading_until_done() {
    let (verifier, gate) = ScriptedVerifier::ok(json!({"is_real": true})).gated();
    let h = harness(Arc::new(verifier), "http://verify.local");

    let attempt = prepare(&h.ctx, TriggerMode::Manual).await.unwrap();
    assert!(h.ctx.state.is_loading());

    // Second manual press while loading is ignored
    assert!(prepare(&h.ctx, TriggerMode::Manual).await.is_none());

    let run = tokio::spawn(attempt.run());
    gate.add_permits(1);
    timeout(Duration::from_secs(5), run).await.unwrap().unwrap();

    assert!(!h.ctx.state.is_loading());
    assert_eq!(h.ctx.state.stores.snapshot(TriggerMode::Manual).await.len(), 1);
}

#[tokio::test]
async fn test_loading_cleared_on_failure() {
    let verifier = ScriptedVerifier::with(|| Err(VerifyError::Setup("boom".to_string())));
    let h = harness(Arc::new(verifier), "http://verify.local");

    let record = capture_and_send(&h.ctx, TriggerMode::Manual).await.unwrap();
    assert_eq!(record.msg, "ERROR: Error during request setup: boom");
    assert!(!h.ctx.state.is_loading());
}

#[tokio::test]
async fn test_auto_never_sets_loading() {
    let (verifier, gate) = ScriptedVerifier::ok(json!({"is_real": true})).gated();
    let h = harness(Arc::new(verifier), "http://verify.local");

    let attempt = prepare(&h.ctx, TriggerMode::Auto).await.unwrap();
    assert!(!h.ctx.state.is_loading());

    // Manual is not blocked by an auto request
    let manual = prepare(&h.ctx, TriggerMode::Manual).await;
    assert!(manual.is_some());

    gate.add_permits(2);
    attempt.run().await;
    manual.unwrap().run().await;

    assert_eq!(h.ctx.state.stores.snapshot(TriggerMode::Auto).await.len(), 1);
    assert_eq!(h.ctx.state.stores.snapshot(TriggerMode::Manual).await.len(), 1);
}

#[tokio::test]
async fn test_ui_sees_both_phases() {
    let verifier = ScriptedVerifier::ok(json!({"is_real": true}));
    let h = harness(Arc::new(verifier), "http://verify.local");

    capture_and_send(&h.ctx, TriggerMode::Auto).await.unwrap();

    let mut statuses = Vec::new();
    while let Ok(Some(event)) = h.events.try_recv() {
        if let AppEvent::ShowResults { mode, results } = event {
            assert_eq!(mode, TriggerMode::Auto);
            assert_eq!(results.len(), 1);
            statuses.push(results[0].status);
        }
    }
    assert_eq!(statuses, vec![ResultStatus::Pending, ResultStatus::Done]);
}

#[tokio::test]
async fn test_overlapping_attempts_keep_own_records() {
    let (verifier, gate) = ScriptedVerifier::ok(json!({"is_real": true})).gated();
    let h = harness(Arc::new(verifier), "http://verify.local");

    let first = prepare(&h.ctx, TriggerMode::Auto).await.unwrap();
    let second = prepare(&h.ctx, TriggerMode::Auto).await.unwrap();
    let (first_id, second_id) = (first.pending().id, second.pending().id);
    assert_ne!(first_id, second_id);

    let a = tokio::spawn(second.run());
    let b = tokio::spawn(first.run());
    gate.add_permits(2);
    timeout(Duration::from_secs(5), a).await.unwrap().unwrap();
    timeout(Duration::from_secs(5), b).await.unwrap().unwrap();

    let store = h.ctx.state.stores.for_mode(TriggerMode::Auto).read().await;
    assert_eq!(store.len(), 2);
    assert_eq!(store.position(&first_id), Some(0));
    assert_eq!(store.position(&second_id), Some(1));
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn test_loading_clears_after_final_record() {
    let verifier = ScriptedVerifier::ok(json!({"is_real": true}));
    let h = harness(Arc::new(verifier), "http://verify.local");

    capture_and_send(&h.ctx, TriggerMode::Manual).await.unwrap();

    let mut order = Vec::new();
    while let Ok(Some(event)) = h.events.try_recv() {
        match event {
            AppEvent::ShowResults { results, .. } => {
                order.push(format!("record={}", results[0].status));
            }
            AppEvent::LoadingChanged(loading) => order.push(format!("loading={loading}")),
            _ => {}
        }
    }
    assert_eq!(
        order,
        vec!["record=pending", "loading=true", "record=done", "loading=false"]
    );
}

#[tokio::test]
async fn test_loading_flag_survives_full_ui_channel() {
    let (verifier, gate) = ScriptedVerifier::ok(json!({"is_real": true})).gated();
    let h = harness(Arc::new(verifier), "http://verify.local");

    // A console that stopped reading
    let (tx, rx) = kanal::bounded_async(1);
    let ctx = CaptureContext::new(h.ctx.state.clone(), h.ctx.verifier.clone(), tx);
    let pending = tokio::spawn({
        let ctx = ctx.clone();
        async move { prepare(&ctx, TriggerMode::Manual).await }
    });

    // The pending list fills the channel, the loading event is dropped
    let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(first, AppEvent::ShowResults { .. }));
    let attempt = timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(ctx.state.is_loading());
    assert!(prepare(&ctx, TriggerMode::Manual).await.is_none());

    gate.add_permits(1);
    let run = tokio::spawn(attempt.run());
    let done = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(done, AppEvent::ShowResults { .. }));
    timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
    assert!(!ctx.state.is_loading());
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
