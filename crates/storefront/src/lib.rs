//! 4Fun Storefront sync library.
//!
//! This crate provides the client-side core of the 4Fun storefront: the
//! cart/wishlist synchronization engine and the backend client with its
//! record-normalization boundary. The UI layers (web, admin) sit on top of
//! this crate and never talk to the backend or local storage directly.
//!
//! # Architecture
//!
//! - [`backend`] - REST client for the 4Fun API; every raw payload is
//!   normalized into canonical types before leaving this module
//! - [`local`] - session-scoped persistence for the anonymous cart
//! - [`session`] - authentication mode, identity, and session generation
//! - [`sync`] - the orchestrator gluing the aggregates to both backends
//!
//! # Example
//!
//! ```rust,ignore
//! use four_fun_storefront::backend::BackendClient;
//! use four_fun_storefront::config::StoreConfig;
//! use four_fun_storefront::local::MemoryStore;
//! use four_fun_storefront::session::MergePolicy;
//! use four_fun_storefront::sync::SyncEngine;
//!
//! let config = StoreConfig::from_env()?;
//! let engine = SyncEngine::new(
//!     BackendClient::new(&config),
//!     MemoryStore::new(),
//!     MergePolicy::ReplaceWithRemote,
//! );
//!
//! // Anonymous browsing: mutations persist locally, no remote calls.
//! engine.add_to_cart(&product, 1).await?;
//!
//! // Signing in pulls the authoritative remote state.
//! engine.sign_in(identity).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod session;
pub mod sync;

pub use error::{Result, SyncError};
