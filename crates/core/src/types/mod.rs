//! Core types for Storeroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod login;
pub mod role;

pub use id::*;
pub use login::{Login, LoginError};
pub use role::{Role, RoleError};
