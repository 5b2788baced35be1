//! Wishlist synchronization scenarios.
//!
//! The wishlist is authenticated-only: anonymous toggles are rejected
//! without touching any state, and remote failures roll the optimistic
//! toggle back.

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

#[tokio::test]
async fn test_anonymous_toggle_is_rejected_without_state_change() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    let game = product("a", "Gears", "59.99");
    let err = engine
        .toggle_wishlist(&game)
        .await
        .expect_err("anonymous wishlist mutation must fail");

    assert!(matches!(err, SyncError::AuthRequired));
    assert!(!engine.in_wishlist(&game.id));
    // No remote call, no local fallback.
    assert!(remote.calls().is_empty());
    assert!(local.calls().is_empty());
}

#[tokio::test]
async fn test_toggle_twice_round_trips_membership() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    let game = product("a", "Gears", "59.99");
    let before = engine.in_wishlist(&game.id);

    engine.toggle_wishlist(&game).await.expect("first toggle");
    assert!(engine.in_wishlist(&game.id));

    engine.toggle_wishlist(&game).await.expect("second toggle");
    assert_eq!(engine.in_wishlist(&game.id), before);
}

#[tokio::test]
async fn test_wishlist_loaded_on_sign_in() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    let game = product("a", "Gears", "59.99");
    remote.seed_wishlist(&game);

    engine.sign_in(identity("u1")).await.expect("sign in");
    assert!(engine.in_wishlist(&game.id));
}

#[tokio::test]
async fn test_failed_toggle_rolls_back_membership() {
    init_tracing();
    let remote = FakeRemote::new();
    let local = RecordingLocal::new();
    let engine = engine(&remote, &local);

    engine.sign_in(identity("u1")).await.expect("sign in");
    let game = product("a", "Gears", "59.99");

    remote.fail_mutations(true);
    let err = engine
        .toggle_wishlist(&game)
        .await
        .expect_err("toggle should fail");

    assert!(matches!(err, SyncError::RemoteMutation(_)));
    assert!(!engine.in_wishlist(&game.id));
}
