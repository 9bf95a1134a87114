//! Core types and trait definitions for the Frent rental service.
//!
//! This crate is deliberately free of HTTP, WebSocket and database
//! dependencies. Every other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod movie;
pub mod rental;
pub mod store;
pub mod user;

pub use error::{Error, Result};
pub use identity::Identity;
