//! Integration tests for Storeroom.
//!
//! # Running Tests
//!
//! The in-memory suite runs with plain `cargo test`. The `PostgreSQL` suite
//! is `#[ignore]`d by default and needs a disposable database:
//!
//! ```bash
//! export STOREROOM_TEST_DATABASE_URL=postgres://localhost/storeroom_test
//! cargo test -p storeroom-integration-tests -- --ignored
//! ```
//!
//! Both suites drive the same scenarios through [`Stores`], so a passing run
//! on each backend demonstrates the two are behaviorally interchangeable.

use secrecy::SecretString;
use storeroom_server::Stores;
use storeroom_server::store::StoreError;
use storeroom_server::store::postgres::{self, PgStore};

/// Connection string for the `PostgreSQL` suite.
pub const TEST_DATABASE_ENV: &str = "STOREROOM_TEST_DATABASE_URL";

/// Connect to the test database, run migrations, and wrap it in [`Stores`].
///
/// # Errors
///
/// Returns [`StoreError`] if `STOREROOM_TEST_DATABASE_URL` is unset, the
/// connection fails, or migrations cannot be applied.
pub async fn postgres_stores() -> Result<Stores, StoreError> {
    let url = std::env::var(TEST_DATABASE_ENV)
        .map(SecretString::from)
        .map_err(|_| StoreError::Required { field: TEST_DATABASE_ENV })?;
    let pool = postgres::create_pool(&url).await?;
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Corruption(format!("migration failed: {e}")))?;
    Ok(Stores::postgres(PgStore::single(pool)))
}
