//! Storeroom Core - Shared types library.
//!
//! Common types used across Storeroom components:
//! - `server` - Persistence, integrity, and authentication core
//! - `integration-tests` - End-to-end store-contract tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. This
//! keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, logins, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
