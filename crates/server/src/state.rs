//! Shared application state.
//!
//! [`Stores`] pins the backend choice at startup; everything downstream
//! works against the trait objects and never learns which backend is live.

use std::sync::Arc;

use crate::config::{Backend, ServerConfig};
use crate::store::memory::MemoryStore;
use crate::store::postgres::{self, PgStore};
use crate::store::{
    ItemStore, OrderStateStore, OrderStore, ProductStore, ProviderStore, StoreError, UserStore,
};

/// One handle per aggregate, all backed by the same store instance.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub providers: Arc<dyn ProviderStore>,
    pub products: Arc<dyn ProductStore>,
    pub order_states: Arc<dyn OrderStateStore>,
    pub orders: Arc<dyn OrderStore>,
    pub items: Arc<dyn ItemStore>,
}

impl Stores {
    /// Fresh, empty in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            providers: store.clone(),
            products: store.clone(),
            order_states: store.clone(),
            orders: store.clone(),
            items: store,
        }
    }

    /// `PostgreSQL` backend over already-created pools.
    #[must_use]
    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            providers: store.clone(),
            products: store.clone(),
            order_states: store.clone(),
            orders: store.clone(),
            items: store,
        }
    }

    /// Build the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the postgres backend is selected without
    /// database settings or its pools cannot be created.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        match config.backend {
            Backend::Memory => Ok(Self::in_memory()),
            Backend::Postgres => {
                let database = config
                    .database
                    .as_ref()
                    .ok_or(StoreError::Required { field: "database" })?;
                let write = postgres::create_pool(&database.write_url).await?;
                let read = match &database.read_url {
                    Some(url) => postgres::create_pool(url).await?,
                    None => write.clone(),
                };
                Ok(Self::postgres(PgStore::new(write, read)))
            }
        }
    }
}
