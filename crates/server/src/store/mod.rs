//! Store contracts and their two backends.
//!
//! One trait per aggregate, implemented by both [`memory::MemoryStore`] and
//! [`postgres::PgStore`]. The two backends are behaviorally interchangeable:
//! identical referential-integrity rules, identical pagination semantics
//! (ascending by ID, `limit` bounds the count, `offset` skips rows in ID
//! order), identical error taxonomy. The backend is selected once at startup;
//! nothing above this layer branches on it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use storeroom_core::{ItemId, Login, OrderId, OrderStateId, ProductId, ProviderId, UserId};
use thiserror::Error;

use crate::models::{
    DomainError, Item, NewItem, NewOrder, NewOrderState, NewProduct, NewProvider, NewUser, Order,
    OrderState, Product, Provider, User,
};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mandatory field (typically the ID) is missing.
    #[error("{field} is required")]
    Required {
        /// Name of the missing field.
        field: &'static str,
    },

    /// No row with the given key.
    #[error("{entity} {key} not found")]
    NotFound {
        /// Aggregate name, e.g. `"provider"`.
        entity: &'static str,
        /// The id or login that was looked up.
        key: String,
    },

    /// A referenced row is missing on insert, or dependents exist on delete.
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// A uniqueness rule was violated (duplicate user login).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An entity invariant did not hold.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    Corruption(String),
}

impl StoreError {
    /// A [`StoreError::NotFound`] with the key rendered for context.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// A page of list results: at most `limit` rows, skipping the first `offset`
/// matching rows in ascending-ID order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    #[must_use]
    pub const fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// The first page with a sensible default size.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(50, 0)
    }
}

/// Store contract for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a user draft, assigning its ID.
    ///
    /// Fails with [`StoreError::Conflict`] if the login is already taken;
    /// the check-and-insert is atomic with respect to concurrent creates.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;

    async fn get(&self, id: UserId) -> Result<User, StoreError>;

    /// Look a user up by login (for sign-in).
    async fn get_by_login(&self, login: &Login) -> Result<User, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError>;

    /// Replace a persisted user; fails with `NotFound` for an unknown ID.
    async fn update(&self, user: User) -> Result<User, StoreError>;

    /// Remove a user. Rejected with [`StoreError::Integrity`] while any order
    /// references the user.
    async fn delete(&self, id: UserId) -> Result<(), StoreError>;
}

/// Store contract for providers.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    async fn create(&self, new: NewProvider) -> Result<Provider, StoreError>;

    async fn get(&self, id: ProviderId) -> Result<Provider, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<Provider>, StoreError>;

    async fn update(&self, provider: Provider) -> Result<Provider, StoreError>;

    /// Remove a provider. Rejected with [`StoreError::Integrity`] while any
    /// product references the provider.
    async fn delete(&self, id: ProviderId) -> Result<(), StoreError>;
}

/// Store contract for products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a product draft; the referenced provider must exist.
    async fn create(&self, new: NewProduct) -> Result<Product, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Product, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError>;

    async fn update(&self, product: Product) -> Result<Product, StoreError>;

    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Store contract for order states.
#[async_trait]
pub trait OrderStateStore: Send + Sync {
    async fn create(&self, new: NewOrderState) -> Result<OrderState, StoreError>;

    async fn get(&self, id: OrderStateId) -> Result<OrderState, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<OrderState>, StoreError>;

    async fn update(&self, state: OrderState) -> Result<OrderState, StoreError>;

    /// Remove an order state. Rejected with [`StoreError::Integrity`] while
    /// any order is in this state.
    async fn delete(&self, id: OrderStateId) -> Result<(), StoreError>;
}

/// Store contract for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order draft; the referenced user and state must exist.
    async fn create(&self, new: NewOrder) -> Result<Order, StoreError>;

    async fn get(&self, id: OrderId) -> Result<Order, StoreError>;

    /// List orders, optionally restricted to one user's.
    async fn list(&self, page: Page, user: Option<UserId>) -> Result<Vec<Order>, StoreError>;

    async fn update(&self, order: Order) -> Result<Order, StoreError>;

    async fn delete(&self, id: OrderId) -> Result<(), StoreError>;
}

/// Store contract for order line items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a line-item draft; the referenced order and product must exist.
    async fn create(&self, new: NewItem) -> Result<Item, StoreError>;

    async fn get(&self, id: ItemId) -> Result<Item, StoreError>;

    /// List items, optionally restricted to one order's.
    async fn list(&self, page: Page, order: Option<OrderId>) -> Result<Vec<Item>, StoreError>;

    async fn update(&self, item: Item) -> Result<Item, StoreError>;

    async fn delete(&self, id: ItemId) -> Result<(), StoreError>;
}
