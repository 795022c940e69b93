//! Core types and trait definitions for the clinic service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend implements [`store::ClinicStore`]; the HTTP layer drives
//! the [`resolver`] and the appointment/document rules defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod catalog;
pub mod document;
pub mod error;
pub mod history;
pub mod people;
pub mod resolver;
pub mod session;
pub mod store;

pub use error::{Error, Result};
