//! Session mode transition scenarios.
//!
//! Sign-in merge policies, sign-out cleanup, and the generation rule:
//! remote responses that resolve after a session transition must be
//! discarded, never applied.

use four_fun_integration_tests::{FakeRemote, RecordingLocal, identity, init_tracing, product};
use four_fun_storefront::session::MergePolicy;
use four_fun_storefront::sync::SyncEngine;

fn engine_with_policy(
    remote: &FakeRemote,
    local: &RecordingLocal,
    policy: MergePolicy,
) -> SyncEngine<FakeRemote, RecordingLocal> {
    SyncEngine::new(remote.clone(), local.clone(), policy)
}

// ============================================================================
// Sign-in Policies
// ============================================================================

#[tokio::test]
async fn test_replace_policy_pulls_remote_and_keeps_local_snapshot() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::ReplaceWithRemote);

    engine
        .add_to_cart(&product("a", "Anonymous Pick", "10.00"), 1)
        .await
        .expect("anonymous add");
    remote.seed_cart_line(&product("b", "Remote Pick", "20.00"), 1);

    engine.sign_in(identity("u1")).await.expect("sign in");

    // The remote cart is authoritative; the anonymous line is gone from
    // memory but its snapshot stays on disk untouched.
    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].name, "Remote Pick");
    assert_eq!(local.stored_cart().lines()[0].name, "Anonymous Pick");
    assert!(!remote.calls().contains(&"add_to_cart"));
}

#[tokio::test]
async fn test_merge_policy_pushes_local_lines_then_refetches() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::MergeLocalIntoRemote);

    engine
        .add_to_cart(&product("a", "Anonymous Pick", "10.00"), 2)
        .await
        .expect("anonymous add");
    remote.seed_cart_line(&product("b", "Remote Pick", "20.00"), 1);

    engine.sign_in(identity("u1")).await.expect("sign in");

    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 2);
    let merged = cart
        .find_by_product(&product("a", "Anonymous Pick", "10.00").id)
        .expect("merged line");
    assert_eq!(merged.quantity, 2);
    assert!(!merged.id.is_local());
    // Local persistence was consumed by the merge.
    assert!(local.stored().is_none());
}

#[tokio::test]
async fn test_merge_policy_skips_failing_lines() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::MergeLocalIntoRemote);

    engine
        .add_to_cart(&product("a", "Anonymous Pick", "10.00"), 1)
        .await
        .expect("anonymous add");

    // The push fails, but sign-in still lands on the remote truth.
    remote.fail_mutations(true);
    remote.seed_cart_line(&product("b", "Remote Pick", "20.00"), 1);
    engine.sign_in(identity("u1")).await.expect("sign in");

    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].name, "Remote Pick");
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test]
async fn test_sign_out_clears_memory_and_local_persistence() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::ReplaceWithRemote);

    let game = product("a", "Gears", "59.99");
    engine.add_to_cart(&game, 1).await.expect("anonymous add");
    engine.sign_in(identity("u1")).await.expect("sign in");
    engine.add_to_cart(&game, 1).await.expect("authed add");
    engine.toggle_wishlist(&game).await.expect("toggle");

    engine.sign_out();

    assert!(engine.cart().is_empty());
    assert!(engine.wishlist().is_empty());
    assert!(local.stored().is_none());
    assert!(!engine.session().is_authenticated());
}

// ============================================================================
// Stale Generations
// ============================================================================

#[tokio::test]
async fn test_confirmation_after_sign_out_is_discarded() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::ReplaceWithRemote);

    engine.sign_in(identity("u1")).await.expect("sign in");

    let gate = remote.install_gate();
    let in_flight = {
        let engine = engine.clone();
        let game = product("a", "Gears", "59.99");
        tokio::spawn(async move { engine.add_to_cart(&game, 1).await })
    };

    // The user signs out while the add is still on the wire.
    gate.wait_entered().await;
    engine.sign_out();
    gate.release();

    in_flight
        .await
        .expect("task")
        .expect("stale outcome is silently discarded");

    // The confirmation resolved under a dead generation: the signed-out
    // session must not inherit the server snapshot.
    assert!(engine.cart().is_empty());
    assert!(!remote.server_cart().is_empty());
}

#[tokio::test]
async fn test_failure_after_sign_out_does_not_roll_back_new_session() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine_with_policy(&remote, &local, MergePolicy::ReplaceWithRemote);

    engine.sign_in(identity("u1")).await.expect("sign in");

    remote.fail_mutations(true);
    let gate = remote.install_gate();
    let in_flight = {
        let engine = engine.clone();
        let game = product("a", "Gears", "59.99");
        tokio::spawn(async move { engine.add_to_cart(&game, 1).await })
    };

    gate.wait_entered().await;
    engine.sign_out();

    // Start the next anonymous session before the failure resolves.
    engine
        .add_to_cart(&product("b", "Fresh Start", "5.00"), 1)
        .await
        .expect("anonymous add");
    gate.release();

    in_flight
        .await
        .expect("task")
        .expect("stale failure is silently discarded");

    // The stale rollback must not clobber the new session's cart.
    let cart = engine.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].name, "Fresh Start");
}
