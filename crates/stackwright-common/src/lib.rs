//! # stackwright-common
//!
//! Shared error taxonomy, domain identifiers, and constants used across
//! the entire Stackwright workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the config model, the
//! topology builders, and the release pipeline all build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod constants;
pub mod error;
pub mod types;
