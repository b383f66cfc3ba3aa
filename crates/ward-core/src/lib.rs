//! Core types and policy engine for the Ward clinic backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every decision it makes — which rows a principal may see, which writes a
//! principal may perform, which status values an appointment may take — is a
//! pure function of its inputs, so the whole policy surface is unit-testable
//! without a network or a database.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod authz;
pub mod directory;
pub mod error;
pub mod prescription;
pub mod principal;
pub mod scope;
pub mod store;
pub mod user;
pub mod workflow;

pub use error::{Error, Result};
pub use principal::{Principal, Role};
