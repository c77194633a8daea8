//! Core types, the table-store abstraction, and the data/state layer for the
//! visit log.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`table::TableStore`]; the terminal UI and the table
//! server build on top of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod calendar;
pub mod error;
pub mod holiday;
pub mod memory;
pub mod navigation;
pub mod record;
pub mod repository;
pub mod search;
pub mod table;

pub use error::{Error, Result};
