//! Provider and product queries.

use async_trait::async_trait;
use rust_decimal::Decimal;
use storeroom_core::{ProductId, ProviderId};

use crate::models::{NewProduct, NewProvider, Product, Provider};
use crate::store::{Page, ProductStore, ProviderStore, StoreError};

use super::{PgStore, map_write_error, page_args, require_assigned};

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
    id: ProviderId,
    name: String,
    origin: String,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            origin: row.origin,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    provider_id: ProviderId,
    price: Decimal,
    stock: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            provider_id: row.provider_id,
            price: row.price,
            stock: row.stock,
        }
    }
}

#[async_trait]
impl ProviderStore for PgStore {
    async fn create(&self, new: NewProvider) -> Result<Provider, StoreError> {
        let mut tx = self.write.begin().await?;
        let row: ProviderRow = sqlx::query_as(
            "INSERT INTO providers (name, origin)
             VALUES ($1, $2)
             RETURNING id, name, origin",
        )
        .bind(&new.name)
        .bind(&new.origin)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "provider"))?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn get(&self, id: ProviderId) -> Result<Provider, StoreError> {
        let row: Option<ProviderRow> =
            sqlx::query_as("SELECT id, name, origin FROM providers WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.read)
                .await?;
        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("provider", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<Provider>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<ProviderRow> = sqlx::query_as(
            "SELECT id, name, origin FROM providers ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.read)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, provider: Provider) -> Result<Provider, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query("UPDATE providers SET name = $2, origin = $3 WHERE id = $1")
            .bind(provider.id)
            .bind(&provider.name)
            .bind(&provider.origin)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "provider"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("provider", provider.id));
        }
        tx.commit().await?;
        Ok(provider)
    }

    async fn delete(&self, id: ProviderId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut tx = self.write.begin().await?;
        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE provider_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if products > 0 {
            return Err(StoreError::Integrity(format!(
                "provider {id} is referenced by existing products"
            )));
        }
        let result = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("provider", id));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn create(&self, new: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.write.begin().await?;
        // The foreign key on provider_id does the existence check.
        let row: ProductRow = sqlx::query_as(
            "INSERT INTO products (name, provider_id, price, stock)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, provider_id, price, stock",
        )
        .bind(&new.name)
        .bind(new.provider_id)
        .bind(new.price)
        .bind(new.stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product"))?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn get(&self, id: ProductId) -> Result<Product, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, provider_id, price, stock FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.read)
        .await?;
        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError> {
        let (limit, offset) = page_args(page);
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, provider_id, price, stock FROM products
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.read)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, product: Product) -> Result<Product, StoreError> {
        let mut tx = self.write.begin().await?;
        let result = sqlx::query(
            "UPDATE products SET name = $2, provider_id = $3, price = $4, stock = $5
             WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.provider_id)
        .bind(product.price)
        .bind(product.stock)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", product.id));
        }
        tx.commit().await?;
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut tx = self.write.begin().await?;
        let items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if items > 0 {
            return Err(StoreError::Integrity(format!(
                "product {id} is referenced by existing items"
            )));
        }
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        tx.commit().await?;
        Ok(())
    }
}
