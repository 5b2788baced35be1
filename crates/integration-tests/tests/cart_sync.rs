//! Cart synchronization scenarios.
//!
//! Exercise the sync engine end-to-end against scripted fakes: mode
//! isolation, optimistic confirmation, authoritative re-fetch, and
//! rollback on remote failure.

use rust_decimal::Decimal;

use four_fun_integration_tests::{FakeRemote, RecordingLocal, identity, init_tracing, product};
use four_fun_storefront::SyncError;
use four_fun_storefront::session::MergePolicy;
use four_fun_storefront::sync::SyncEngine;

fn engine(
    remote: &FakeRemote,
    local: &RecordingLocal,
) -> SyncEngine<FakeRemote, RecordingLocal> {
    SyncEngine::new(remote.clone(), local.clone(), MergePolicy::ReplaceWithRemote)
}

// ============================================================================
// Anonymous Mode
// ============================================================================

#[tokio::test]
async fn test_anonymous_mutations_never_call_remote() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    let game = product("a", "Gears", "59.99");
    engine.add_to_cart(&game, 1).await.expect("add");
    let line = engine.cart().lines()[0].id.clone();
    engine.set_quantity(&line, 3).await.expect("set quantity");
    engine.remove_from_cart(&line).await.expect("remove");
    engine.clear_cart().await.expect("clear");

    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn test_anonymous_add_persists_local_snapshot() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine
        .add_to_cart(&product("a", "Gears", "59.99"), 2)
        .await
        .expect("add");

    let stored = local.stored_cart();
    assert_eq!(stored.count(), 2);
    assert_eq!(stored.total(), "119.98".parse::<Decimal>().expect("decimal"));
    // Anonymous lines carry locally generated ids.
    assert!(stored.lines()[0].id.is_local());
}

#[tokio::test]
async fn test_anonymous_cart_survives_engine_restart() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();

    {
        let engine = engine(&remote, &local);
        engine
            .add_to_cart(&product("a", "Gears", "59.99"), 1)
            .await
            .expect("add");
    }

    let restarted = engine(&remote, &local);
    restarted.refresh().await.expect("refresh");
    assert_eq!(restarted.cart_count(), 1);
    assert_eq!(restarted.cart().lines()[0].name, "Gears");
}

#[tokio::test]
async fn test_anonymous_clear_discards_local_snapshot() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine
        .add_to_cart(&product("a", "Gears", "59.99"), 1)
        .await
        .expect("add");
    engine.clear_cart().await.expect("clear");

    assert!(local.stored().is_none());
    assert!(engine.cart().is_empty());
}

// ============================================================================
// Authenticated Mode
// ============================================================================

#[tokio::test]
async fn test_authenticated_mutations_never_touch_local() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    local.reset_calls();

    let game = product("a", "Gears", "59.99");
    engine.add_to_cart(&game, 1).await.expect("add");
    let line = engine.cart().lines()[0].id.clone();
    engine.set_quantity(&line, 2).await.expect("set quantity");
    engine.remove_from_cart(&line).await.expect("remove");
    engine.clear_cart().await.expect("clear");

    assert!(local.calls().is_empty());
}

#[tokio::test]
async fn test_authenticated_add_adopts_server_snapshot() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    engine
        .add_to_cart(&product("a", "Gears", "59.99"), 1)
        .await
        .expect("add");

    // The server's authoritative shape wins over the optimistic guess:
    // the line carries a server-issued id, not a local one.
    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 1);
    assert!(!cart.lines()[0].id.is_local());
    assert_eq!(
        remote.calls(),
        vec!["get_cart", "get_wishlist", "add_to_cart", "get_cart"]
    );
}

#[tokio::test]
async fn test_authenticated_adds_merge_by_product() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    let game = product("a", "Gears", "59.99");
    engine.add_to_cart(&game, 1).await.expect("first add");
    engine.add_to_cart(&game, 1).await.expect("second add");

    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line_remotely() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    engine
        .add_to_cart(&product("a", "Gears", "59.99"), 2)
        .await
        .expect("add");
    let line = engine.cart().lines()[0].id.clone();

    engine.set_quantity(&line, 0).await.expect("set zero");

    assert!(engine.cart().is_empty());
    assert!(remote.server_cart().is_empty());
    assert!(remote.calls().contains(&"remove_from_cart"));
    assert!(!remote.calls().contains(&"update_cart_item"));
}

// ============================================================================
// Rollback
// ============================================================================

#[tokio::test]
async fn test_failed_mutation_rolls_back_to_pre_mutation_state() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    engine
        .add_to_cart(&product("a", "Gears", "59.99"), 1)
        .await
        .expect("add");
    let before = engine.cart();

    remote.fail_mutations(true);
    let err = engine
        .add_to_cart(&product("b", "Hollow", "19.99"), 1)
        .await
        .expect_err("mutation should fail");

    assert!(matches!(err, SyncError::RemoteMutation(_)));
    assert_eq!(engine.cart(), before);
}

#[tokio::test]
async fn test_failed_refetch_also_rolls_back() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    let before = engine.cart();

    // The mutation lands but the authoritative re-fetch fails; the
    // optimistic guess must not be left in place.
    remote.fail_reads(true);
    let err = engine
        .add_to_cart(&product("a", "Gears", "59.99"), 1)
        .await
        .expect_err("refetch should fail");

    assert!(matches!(err, SyncError::RemoteMutation(_)));
    assert_eq!(engine.cart(), before);

    // The next refresh reconciles with what the server actually holds.
    remote.fail_reads(false);
    engine.refresh().await.expect("refresh");
    assert_eq!(engine.cart_count(), 1);
}

#[tokio::test]
async fn test_remove_of_unknown_line_is_noop() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    engine
        .remove_from_cart(&four_fun_core::LineId::new("srv-ghost"))
        .await
        .expect("remove is idempotent");

    assert!(engine.cart().is_empty());
}
