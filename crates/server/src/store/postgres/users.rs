//! User queries.

use std::str::FromStr;

use async_trait::async_trait;
use storeroom_core::{Login, Role, UserId};

use crate::models::{NewUser, User};
use crate::store::{Page, StoreError, UserStore};

use super::{PgStore, map_write_error, page_args, require_assigned};

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    login: String,
    password_hash: String,
    role: String,
    token: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let login = Login::parse(&row.login)
            .map_err(|e| StoreError::Corruption(format!("invalid login in database: {e}")))?;
        let role = Role::from_str(&row.role)
            .map_err(|e| StoreError::Corruption(format!("invalid role in database: {e}")))?;

        Ok(Self {
            id: row.id,
            login,
            password_hash: row.password_hash,
            role,
            token: row.token,
        })
    }
}

const SELECT_USER: &str =
    "SELECT id, login, password_hash, role, token FROM users";

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tx = self.write.begin().await?;
        // The unique index on login is the duplicate check; a concurrent
        // insert of the same login loses here with a constraint violation.
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (login, password_hash, role)
             VALUES ($1, $2, $3)
             RETURNING id, login, password_hash, role, token",
        )
        .bind(new.login.as_ref())
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "user"))?;
        tx.commit().await?;

        let user = User::try_from(row)?;
        tracing::debug!(id = %user.id, login = %user.login, "created user");
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<User, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.read)
                .await?;
        row.ok_or_else(|| StoreError::not_found("user", id))?.try_into()
    }

    async fn get_by_login(&self, login: &Login) -> Result<User, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE login = $1"))
                .bind(login.as_ref())
                .fetch_optional(&self.read)
                .await?;
        row.ok_or_else(|| StoreError::not_found("user", login))?
            .try_into()
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} ORDER BY id LIMIT $1 OFFSET $2"))
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.read)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query(
            "UPDATE users SET login = $2, password_hash = $3, role = $4, token = $5
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(user.login.as_ref())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.token)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "user"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user.id));
        }
        tx.commit().await?;
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut tx = self.write.begin().await?;
        let orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if orders > 0 {
            return Err(StoreError::Integrity(format!(
                "user {id} is referenced by existing orders"
            )));
        }
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", id));
        }
        tx.commit().await?;
        Ok(())
    }
}
