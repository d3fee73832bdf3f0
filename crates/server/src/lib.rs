//! Storeroom Server - persistence, integrity, and authentication core.
//!
//! # Architecture
//!
//! - [`models`] - Domain entities, validated at construction
//! - [`store`] - Store contracts plus two interchangeable backends:
//!   a concurrent in-memory store and a transactional `PostgreSQL` store
//! - [`auth`] - Stateless token service, password hashing, and the
//!   role/ownership authorization policy
//! - [`config`] - Environment-driven configuration, including the backend
//!   selector
//! - [`state`] - Backend selection and shared application state
//! - [`error`] - Unified error type with HTTP status mapping
//!
//! The HTTP surface (routing, request binding, OpenAPI) lives outside this
//! crate and consumes the store contracts and the token service only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::Stores;
