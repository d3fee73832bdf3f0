//! Order, order-state, and item queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use storeroom_core::{ItemId, OrderId, OrderStateId, ProductId, UserId};

use crate::models::{Item, NewItem, NewOrder, NewOrderState, Order, OrderState};
use crate::store::{ItemStore, OrderStateStore, OrderStore, Page, StoreError};

use super::{PgStore, map_write_error, page_args, require_assigned};

#[derive(Debug, sqlx::FromRow)]
struct OrderStateRow {
    id: OrderStateId,
    name: String,
}

impl From<OrderStateRow> for OrderState {
    fn from(row: OrderStateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    state_id: OrderStateId,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            state_id: row.state_id,
            total_amount: row.total_amount,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: ItemId,
    product_id: ProductId,
    order_id: OrderId,
    quantity: i64,
    total_price: Decimal,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            order_id: row.order_id,
            quantity: row.quantity,
            total_price: row.total_price,
        }
    }
}

#[async_trait]
impl OrderStateStore for PgStore {
    async fn create(&self, new: NewOrderState) -> Result<OrderState, StoreError> {
        let mut tx = self.write.begin().await?;
        let row: OrderStateRow = sqlx::query_as(
            "INSERT INTO order_states (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&new.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order state"))?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn get(&self, id: OrderStateId) -> Result<OrderState, StoreError> {
        let row: Option<OrderStateRow> =
            sqlx::query_as("SELECT id, name FROM order_states WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.read)
                .await?;
        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("order state", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderState>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<OrderStateRow> = sqlx::query_as(
            "SELECT id, name FROM order_states ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.read)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, state: OrderState) -> Result<OrderState, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query("UPDATE order_states SET name = $2 WHERE id = $1")
            .bind(state.id)
            .bind(&state.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "order state"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order state", state.id));
        }
        tx.commit().await?;
        Ok(state)
    }

    async fn delete(&self, id: OrderStateId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut tx = self.write.begin().await?;
        let orders: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE state_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if orders > 0 {
            return Err(StoreError::Integrity(format!(
                "order state {id} is referenced by existing orders"
            )));
        }
        let result = sqlx::query("DELETE FROM order_states WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order state", id));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, new: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.write.begin().await?;
        // Foreign keys on user_id and state_id do the existence checks.
        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders (user_id, state_id, total_amount, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, state_id, total_amount, created_at",
        )
        .bind(new.user_id)
        .bind(new.state_id)
        .bind(new.total_amount)
        .bind(new.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order"))?;
        tx.commit().await?;

        let order = Order::from(row);
        tracing::debug!(id = %order.id, user = %order.user_id, "created order");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, user_id, state_id, total_amount, created_at
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.read)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn list(&self, page: Page, user: Option<UserId>) -> Result<Vec<Order>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT id, user_id, state_id, total_amount, created_at
             FROM orders
             WHERE $3::BIGINT IS NULL OR user_id = $3
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .bind(user)
        .fetch_all(&self.read)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, order: Order) -> Result<Order, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query(
            "UPDATE orders SET user_id = $2, state_id = $3, total_amount = $4, created_at = $5
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.state_id)
        .bind(order.total_amount)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "order"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", order.id));
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut tx = self.write.begin().await?;
        let items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE order_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if items > 0 {
            return Err(StoreError::Integrity(format!(
                "order {id} is referenced by existing items"
            )));
        }
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn create(&self, new: NewItem) -> Result<Item, StoreError> {
        let mut tx = self.write.begin().await?;
        // Foreign keys on order_id and product_id do the existence checks.
        let row: ItemRow = sqlx::query_as(
            "INSERT INTO items (product_id, order_id, quantity, total_price)
             VALUES ($1, $2, $3, $4)
             RETURNING id, product_id, order_id, quantity, total_price",
        )
        .bind(new.product_id)
        .bind(new.order_id)
        .bind(new.quantity)
        .bind(new.total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "item"))?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn get(&self, id: ItemId) -> Result<Item, StoreError> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT id, product_id, order_id, quantity, total_price
             FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.read)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("item", id))
    }

    async fn list(&self, page: Page, order: Option<OrderId>) -> Result<Vec<Item>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, product_id, order_id, quantity, total_price
             FROM items
             WHERE $3::BIGINT IS NULL OR order_id = $3
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .bind(order)
        .fetch_all(&self.read)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, item: Item) -> Result<Item, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query(
            "UPDATE items SET product_id = $2, order_id = $3, quantity = $4, total_price = $5
             WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.product_id)
        .bind(item.order_id)
        .bind(item.quantity)
        .bind(item.total_price)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "item"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("item", item.id));
        }
        tx.commit().await?;
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.write)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("item", id));
        }
        Ok(())
    }
}
