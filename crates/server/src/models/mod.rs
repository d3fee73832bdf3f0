//! Domain entities.
//!
//! Each entity comes in two flavors: a `New*` draft carrying not-yet-persisted
//! data, validated in its constructor, and the persisted entity carrying the
//! store-assigned ID. Stores assign IDs; callers never choose them.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{NewProduct, NewProvider, Product, Provider};
pub use order::{Item, NewItem, NewOrder, NewOrderState, Order, OrderState};
pub use user::{NewUser, User};

use storeroom_core::{LoginError, RoleError};

/// Errors raised by entity constructors when an invariant does not hold.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A mandatory field is missing or empty.
    #[error("{field} is required")]
    Required {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A numeric field that must be non-negative is negative.
    #[error("{field} must not be negative")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A numeric field that must be strictly positive is zero or negative.
    #[error("{field} must be positive")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The login is not a valid email-shaped string.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// The role string is not a known role.
    #[error(transparent)]
    Role(#[from] RoleError),
}

/// Reject an empty or whitespace-only string field.
pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Required { field });
    }
    Ok(())
}
