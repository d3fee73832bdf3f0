//! Authentication and authorization.
//!
//! Token issuance and verification ([`token`]), access policy over verified
//! principals ([`policy`]), and password hashing ([`password`]).

pub mod password;
pub mod policy;
pub mod token;

use thiserror::Error;

pub use token::{Principal, TokenService};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Token is malformed or its signature does not verify.
    #[error("invalid token")]
    InvalidToken,

    /// Token verified but its expiry has passed.
    #[error("token expired")]
    ExpiredToken,

    /// The principal is not allowed to perform this action.
    #[error("forbidden")]
    Forbidden,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token signing error")]
    Signing,
}
