//! `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Accounts, hashed passwords, roles
//! - `providers` - Product suppliers
//! - `products` - Catalog, references `providers`
//! - `order_states` - Order lifecycle states
//! - `orders` - References `users` and `order_states`
//! - `items` - Order lines, references `orders` and `products`
//!
//! Migrations live in `crates/server/migrations/` and run with
//! `sqlx migrate run`.
//!
//! Every write runs inside its own transaction: dependent-row checks and the
//! mutation see one consistent snapshot, and an error rolls the whole
//! operation back. Reads go straight to the read pool.

mod catalog;
mod orders;
mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::models::DomainError;

use super::StoreError;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `PostgreSQL` implementation of every store contract.
#[derive(Debug, Clone)]
pub struct PgStore {
    /// Pool for transactions and other writes.
    write: PgPool,
    /// Pool for plain reads; the same pool as `write` unless a read replica
    /// is configured.
    read: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(write: PgPool, read: PgPool) -> Self {
        Self { write, read }
    }

    /// Both roles served by a single pool.
    #[must_use]
    pub fn single(pool: PgPool) -> Self {
        Self::new(pool.clone(), pool)
    }
}

/// Translate a constraint violation raised by an insert or update into the
/// store's own taxonomy; anything else stays a database error.
fn map_write_error(err: sqlx::Error, entity: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!("{entity} violates a uniqueness rule"));
        }
        if db.is_foreign_key_violation() {
            return StoreError::Integrity(format!("{entity} references a missing row"));
        }
        if db.is_check_violation() {
            return check_violation_error(db.constraint(), entity);
        }
    }
    StoreError::Database(err)
}

/// Translate a named `CHECK` constraint into the same domain error the
/// in-memory backend raises for that field, keeping the two backends'
/// error taxonomy identical. The names follow `PostgreSQL`'s default
/// `<table>_<column>_check` convention for inline column constraints.
fn check_violation_error(constraint: Option<&str>, entity: &'static str) -> StoreError {
    let domain = match constraint {
        Some("products_price_check") => DomainError::Negative { field: "price" },
        Some("products_stock_check") => DomainError::Negative { field: "stock" },
        Some("orders_total_amount_check") => DomainError::Negative {
            field: "total_amount",
        },
        Some("items_total_price_check") => DomainError::Negative {
            field: "total_price",
        },
        Some("items_quantity_check") => DomainError::NotPositive { field: "quantity" },
        Some("providers_name_check" | "products_name_check" | "order_states_name_check") => {
            DomainError::Required { field: "name" }
        }
        Some("providers_origin_check") => DomainError::Required { field: "origin" },
        Some("users_password_hash_check") => DomainError::Required { field: "password" },
        _ => {
            return StoreError::Integrity(format!("{entity} violates a value constraint"));
        }
    };
    StoreError::Domain(domain)
}

/// `LIMIT`/`OFFSET` arguments for a [`super::Page`].
const fn page_args(page: super::Page) -> (i64, i64) {
    (page.limit as i64, page.offset as i64)
}

/// Deletes by key refuse the unassigned ID rather than reporting `NotFound`.
fn require_assigned(id: i64) -> Result<(), StoreError> {
    if id == 0 {
        return Err(StoreError::Required { field: "id" });
    }
    Ok(())
}
