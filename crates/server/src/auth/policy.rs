//! Access policy.
//!
//! Pure checks over a verified [`Principal`]; callers verify the token first
//! and pass the result here.

use storeroom_core::UserId;

use crate::models::Order;

use super::{AuthError, Principal};

/// Admins only.
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] for a non-admin principal.
pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.role.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Any verified principal. The `Login` type already guarantees a non-empty
/// identity, so this is the floor every authenticated route shares.
#[allow(clippy::missing_errors_doc)]
pub fn require_authenticated(_principal: &Principal) -> Result<(), AuthError> {
    Ok(())
}

/// Users act on their own account; admins act on any.
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] when the principal is neither the user
/// in question nor an admin.
pub fn require_self_or_admin(principal: &Principal, user_id: UserId) -> Result<(), AuthError> {
    if principal.id == user_id || principal.role.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Orders are visible to their owner and to admins. Items inherit this
/// through the order they belong to.
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] when the principal neither owns the
/// order nor is an admin.
pub fn require_order_access(principal: &Principal, order: &Order) -> Result<(), AuthError> {
    require_self_or_admin(principal, order.user_id)
}
