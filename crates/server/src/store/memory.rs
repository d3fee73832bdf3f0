//! Concurrent in-memory store.
//!
//! One sub-store per aggregate: an ID-ordered map plus a next-ID counter,
//! each behind its own reader/writer lock. Every operation on one aggregate
//! is atomic under that aggregate's lock, so a failed create never mutates
//! the map or consumes an ID.
//!
//! There is no lock ordering across aggregates. Foreign-key checks against
//! other sub-stores take separate read locks, so a concurrent delete of the
//! referenced row between the check and the insert can slip through. The
//! relational backend has the same window between independent transactions.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use storeroom_core::{ItemId, Login, OrderId, OrderStateId, ProductId, ProviderId, UserId};

use crate::models::{
    Item, NewItem, NewOrder, NewOrderState, NewProduct, NewProvider, NewUser, Order, OrderState,
    Product, Provider, User,
};

use super::{
    ItemStore, OrderStateStore, OrderStore, Page, ProductStore, ProviderStore, StoreError,
    UserStore,
};

/// One aggregate's rows plus its auto-increment counter.
///
/// `BTreeMap` keeps rows in ascending-ID order, which is exactly the order
/// `list` must return.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Assign the next ID, build the row with it, and insert.
    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    fn page(&self, page: Page) -> Vec<T> {
        self.rows
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect()
    }
}

/// Recover the guard even if a writer panicked; the data itself is still
/// consistent because every mutation completes before the lock is released.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Map-backed implementation of every store contract.
///
/// Starts empty; IDs for each aggregate start at 1.
#[derive(Debug)]
pub struct MemoryStore {
    users: RwLock<Table<User>>,
    providers: RwLock<Table<Provider>>,
    products: RwLock<Table<Product>>,
    order_states: RwLock<Table<OrderState>>,
    orders: RwLock<Table<Order>>,
    items: RwLock<Table<Item>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Table::new()),
            providers: RwLock::new(Table::new()),
            products: RwLock::new(Table::new()),
            order_states: RwLock::new(Table::new()),
            orders: RwLock::new(Table::new()),
            items: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_assigned(id: i64) -> Result<(), StoreError> {
    if id == 0 {
        return Err(StoreError::Required { field: "id" });
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        // Duplicate check and insert happen under the same write lock, so
        // two concurrent creates with one login cannot both succeed.
        let mut users = write(&self.users);
        if users.rows.values().any(|u| u.login == new.login) {
            return Err(StoreError::Conflict(format!(
                "login {} already exists",
                new.login
            )));
        }
        let user = users.insert_with(|id| new.into_user(UserId::new(id)));
        tracing::debug!(id = %user.id, login = %user.login, "created user");
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<User, StoreError> {
        read(&self.users)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn get_by_login(&self, login: &Login) -> Result<User, StoreError> {
        read(&self.users)
            .rows
            .values()
            .find(|u| &u.login == login)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", login))
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        Ok(read(&self.users).page(page))
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        // Updates pass the same validation as creates.
        NewUser::new(user.login.as_str(), user.password_hash.clone(), user.role.as_str())?;
        let mut users = write(&self.users);
        if !users.contains(user.id.as_i64()) {
            return Err(StoreError::not_found("user", user.id));
        }
        if users
            .rows
            .values()
            .any(|u| u.login == user.login && u.id != user.id)
        {
            return Err(StoreError::Conflict(format!(
                "login {} already exists",
                user.login
            )));
        }
        users.rows.insert(user.id.as_i64(), user.clone());
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut users = write(&self.users);
        if !users.contains(id.as_i64()) {
            return Err(StoreError::not_found("user", id));
        }
        if read(&self.orders).rows.values().any(|o| o.user_id == id) {
            return Err(StoreError::Integrity(format!(
                "user {id} is referenced by existing orders"
            )));
        }
        users.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl ProviderStore for MemoryStore {
    async fn create(&self, new: NewProvider) -> Result<Provider, StoreError> {
        let mut providers = write(&self.providers);
        Ok(providers.insert_with(|id| new.into_provider(ProviderId::new(id))))
    }

    async fn get(&self, id: ProviderId) -> Result<Provider, StoreError> {
        read(&self.providers)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("provider", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<Provider>, StoreError> {
        Ok(read(&self.providers).page(page))
    }

    async fn update(&self, provider: Provider) -> Result<Provider, StoreError> {
        // Updates pass the same validation as creates.
        NewProvider::new(provider.name.clone(), provider.origin.clone())?;
        let mut providers = write(&self.providers);
        if !providers.contains(provider.id.as_i64()) {
            return Err(StoreError::not_found("provider", provider.id));
        }
        providers.rows.insert(provider.id.as_i64(), provider.clone());
        Ok(provider)
    }

    async fn delete(&self, id: ProviderId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut providers = write(&self.providers);
        if !providers.contains(id.as_i64()) {
            return Err(StoreError::not_found("provider", id));
        }
        if read(&self.products)
            .rows
            .values()
            .any(|p| p.provider_id == id)
        {
            return Err(StoreError::Integrity(format!(
                "provider {id} is referenced by existing products"
            )));
        }
        providers.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn create(&self, new: NewProduct) -> Result<Product, StoreError> {
        if !read(&self.providers).contains(new.provider_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "provider {} does not exist",
                new.provider_id
            )));
        }
        let mut products = write(&self.products);
        Ok(products.insert_with(|id| new.into_product(ProductId::new(id))))
    }

    async fn get(&self, id: ProductId) -> Result<Product, StoreError> {
        read(&self.products)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError> {
        Ok(read(&self.products).page(page))
    }

    async fn update(&self, product: Product) -> Result<Product, StoreError> {
        // Updates pass the same validation as creates: numeric invariants
        // via the draft constructor, then the provider reference.
        NewProduct::new(
            product.name.clone(),
            product.provider_id,
            product.price,
            product.stock,
        )?;
        if !read(&self.providers).contains(product.provider_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "provider {} does not exist",
                product.provider_id
            )));
        }
        let mut products = write(&self.products);
        if !products.contains(product.id.as_i64()) {
            return Err(StoreError::not_found("product", product.id));
        }
        products.rows.insert(product.id.as_i64(), product.clone());
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut products = write(&self.products);
        if !products.contains(id.as_i64()) {
            return Err(StoreError::not_found("product", id));
        }
        if read(&self.items).rows.values().any(|i| i.product_id == id) {
            return Err(StoreError::Integrity(format!(
                "product {id} is referenced by existing items"
            )));
        }
        products.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl OrderStateStore for MemoryStore {
    async fn create(&self, new: NewOrderState) -> Result<OrderState, StoreError> {
        let mut states = write(&self.order_states);
        Ok(states.insert_with(|id| new.into_order_state(OrderStateId::new(id))))
    }

    async fn get(&self, id: OrderStateId) -> Result<OrderState, StoreError> {
        read(&self.order_states)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("order state", id))
    }

    async fn list(&self, page: Page) -> Result<Vec<OrderState>, StoreError> {
        Ok(read(&self.order_states).page(page))
    }

    async fn update(&self, state: OrderState) -> Result<OrderState, StoreError> {
        NewOrderState::new(state.name.clone())?;
        let mut states = write(&self.order_states);
        if !states.contains(state.id.as_i64()) {
            return Err(StoreError::not_found("order state", state.id));
        }
        states.rows.insert(state.id.as_i64(), state.clone());
        Ok(state)
    }

    async fn delete(&self, id: OrderStateId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut states = write(&self.order_states);
        if !states.contains(id.as_i64()) {
            return Err(StoreError::not_found("order state", id));
        }
        if read(&self.orders).rows.values().any(|o| o.state_id == id) {
            return Err(StoreError::Integrity(format!(
                "order state {id} is referenced by existing orders"
            )));
        }
        states.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, new: NewOrder) -> Result<Order, StoreError> {
        if !read(&self.users).contains(new.user_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "user {} does not exist",
                new.user_id
            )));
        }
        if !read(&self.order_states).contains(new.state_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "order state {} does not exist",
                new.state_id
            )));
        }
        let mut orders = write(&self.orders);
        let order = orders.insert_with(|id| new.into_order(OrderId::new(id)));
        tracing::debug!(id = %order.id, user = %order.user_id, "created order");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        read(&self.orders)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn list(&self, page: Page, user: Option<UserId>) -> Result<Vec<Order>, StoreError> {
        Ok(read(&self.orders)
            .rows
            .values()
            .filter(|o| user.is_none_or(|u| o.user_id == u))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, order: Order) -> Result<Order, StoreError> {
        // Updates pass the same validation as creates.
        NewOrder::new(
            order.user_id,
            order.state_id,
            order.total_amount,
            order.created_at,
        )?;
        if !read(&self.users).contains(order.user_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "user {} does not exist",
                order.user_id
            )));
        }
        if !read(&self.order_states).contains(order.state_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "order state {} does not exist",
                order.state_id
            )));
        }
        let mut orders = write(&self.orders);
        if !orders.contains(order.id.as_i64()) {
            return Err(StoreError::not_found("order", order.id));
        }
        orders.rows.insert(order.id.as_i64(), order.clone());
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut orders = write(&self.orders);
        if !orders.contains(id.as_i64()) {
            return Err(StoreError::not_found("order", id));
        }
        if read(&self.items).rows.values().any(|i| i.order_id == id) {
            return Err(StoreError::Integrity(format!(
                "order {id} is referenced by existing items"
            )));
        }
        orders.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create(&self, new: NewItem) -> Result<Item, StoreError> {
        // Two independent read locks; a delete of the order or product can
        // land between these checks and the insert below.
        if !read(&self.orders).contains(new.order_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "order {} does not exist",
                new.order_id
            )));
        }
        if !read(&self.products).contains(new.product_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "product {} does not exist",
                new.product_id
            )));
        }
        let mut items = write(&self.items);
        Ok(items.insert_with(|id| new.into_item(ItemId::new(id))))
    }

    async fn get(&self, id: ItemId) -> Result<Item, StoreError> {
        read(&self.items)
            .rows
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreError::not_found("item", id))
    }

    async fn list(&self, page: Page, order: Option<OrderId>) -> Result<Vec<Item>, StoreError> {
        Ok(read(&self.items)
            .rows
            .values()
            .filter(|i| order.is_none_or(|o| i.order_id == o))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, item: Item) -> Result<Item, StoreError> {
        // Updates pass the same validation as creates.
        NewItem::new(item.product_id, item.order_id, item.quantity, item.total_price)?;
        if !read(&self.orders).contains(item.order_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "order {} does not exist",
                item.order_id
            )));
        }
        if !read(&self.products).contains(item.product_id.as_i64()) {
            return Err(StoreError::Integrity(format!(
                "product {} does not exist",
                item.product_id
            )));
        }
        let mut items = write(&self.items);
        if !items.contains(item.id.as_i64()) {
            return Err(StoreError::not_found("item", item.id));
        }
        items.rows.insert(item.id.as_i64(), item.clone());
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        require_assigned(id.as_i64())?;
        let mut items = write(&self.items);
        if !items.contains(id.as_i64()) {
            return Err(StoreError::not_found("item", id));
        }
        items.rows.remove(&id.as_i64());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::models::{DomainError, NewOrder, NewUser};

    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    fn new_provider(name: &str) -> NewProvider {
        NewProvider::new(name.into(), "US".into()).unwrap()
    }

    fn new_user(login: &str) -> NewUser {
        NewUser::new(login, "hash".into(), "regular").unwrap()
    }

    /// Seed a user, the "Created" state, and one order; returns the order.
    async fn seed_order(store: &MemoryStore) -> Order {
        let user = UserStore::create(store, new_user("cmd@cmd.ru")).await.unwrap();
        OrderStateStore::create(store, NewOrderState::new("Created".into()).unwrap())
            .await
            .unwrap();
        OrderStore::create(store, NewOrder::for_user(user.id).unwrap())
            .await
            .unwrap()
    }

    // =========================================================================
    // Integrity and ID-assignment scenarios
    // =========================================================================

    #[tokio::test]
    async fn test_first_provider_gets_id_one_and_round_trips() {
        let store = store();
        let created = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        assert_eq!(created.id, ProviderId::new(1));

        let fetched = ProviderStore::get(&store, created.id).await.unwrap();
        assert_eq!(fetched.name, "Acme");
        assert_eq!(fetched.origin, "US");
    }

    #[tokio::test]
    async fn test_provider_with_products_cannot_be_deleted() {
        let store = store();
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(10.0), 5).unwrap(),
        )
        .await
        .unwrap();

        let err = ProviderStore::delete(&store, provider.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));

        // Both sides survive the rejected delete.
        assert!(ProviderStore::get(&store, provider.id).await.is_ok());
        assert_eq!(
            ProductStore::list(&store, Page::first()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_new_order_starts_in_initial_state_with_zero_total() {
        let store = store();
        let order = seed_order(&store).await;
        assert_eq!(order.state_id, OrderStateId::new(1));
        assert_eq!(order.total_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_item_create_does_not_consume_an_id() {
        let store = store();
        let order = seed_order(&store).await;
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let product = ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(10.0), 5).unwrap(),
        )
        .await
        .unwrap();

        let absent = ProductId::new(999);
        let err = ItemStore::create(
            &store,
            NewItem::new(absent, order.id, 3, dec!(30.0)).unwrap(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));

        // The next successful create still gets id 1.
        let item = ItemStore::create(
            &store,
            NewItem::new(product.id, order.id, 3, dec!(30.0)).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(item.id, ItemId::new(1));
    }

    #[tokio::test]
    async fn test_concurrent_same_login_creates_one_winner() {
        let store = Arc::new(store());
        let (a, b) = tokio::join!(
            {
                let store = Arc::clone(&store);
                tokio::spawn(
                    async move { UserStore::create(&*store, new_user("dup@cmd.ru")).await },
                )
            },
            {
                let store = Arc::clone(&store);
                tokio::spawn(
                    async move { UserStore::create(&*store, new_user("dup@cmd.ru")).await },
                )
            },
        );
        let results = [a.unwrap(), b.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(StoreError::Conflict(_)))));
        assert_eq!(UserStore::list(&*store, Page::first()).await.unwrap().len(), 1);
    }

    // =========================================================================
    // Contract behavior
    // =========================================================================

    #[tokio::test]
    async fn test_delete_missing_id_is_not_found_and_store_unchanged() {
        let store = store();
        ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let before = ProviderStore::list(&store, Page::first()).await.unwrap();

        let err = ProviderStore::delete(&store, ProviderId::new(42)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let after = ProviderStore::list(&store, Page::first()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_delete_with_zero_id_is_required() {
        let store = store();
        let err = ProviderStore::delete(&store, ProviderId::new(0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Required { field: "id" }));
    }

    #[tokio::test]
    async fn test_list_pages_ascending_by_id() {
        let store = store();
        for name in ["a", "b", "c", "d", "e"] {
            ProviderStore::create(&store, new_provider(name)).await.unwrap();
        }

        let page = ProviderStore::list(&store, Page::new(2, 1)).await.unwrap();
        let ids: Vec<i64> = page.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 3]);

        // Offset past the end yields an empty page, not an error.
        let past = ProviderStore::list(&store, Page::new(10, 99)).await.unwrap();
        assert!(past.is_empty());

        // limit bounds the result even when more rows match.
        let capped = ProviderStore::list(&store, Page::new(3, 0)).await.unwrap();
        assert_eq!(capped.len(), 3);
    }

    #[tokio::test]
    async fn test_items_filter_by_order_before_paging() {
        let store = store();
        let order_a = seed_order(&store).await;
        let order_b = OrderStore::create(
            &store,
            NewOrder::for_user(order_a.user_id).unwrap(),
        )
        .await
        .unwrap();
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let product = ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(1.0), 100).unwrap(),
        )
        .await
        .unwrap();

        for order in [order_a.id, order_b.id, order_a.id, order_a.id] {
            ItemStore::create(
                &store,
                NewItem::new(product.id, order, 1, dec!(1.0)).unwrap(),
            )
            .await
            .unwrap();
        }

        let page = ItemStore::list(&store, Page::new(2, 1), Some(order_a.id))
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().map(|i| i.id.as_i64()).collect();
        // order_a owns items 1, 3, 4; offset 1 + limit 2 leaves 3 and 4.
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_orders_filter_by_user() {
        let store = store();
        let first = seed_order(&store).await;
        let other = UserStore::create(&store, new_user("other@cmd.ru")).await.unwrap();
        OrderStore::create(&store, NewOrder::for_user(other.id).unwrap())
            .await
            .unwrap();

        let mine = OrderStore::list(&store, Page::first(), Some(first.user_id))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, first.id);

        let all = OrderStore::list(&store, Page::first(), None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_login() {
        let store = store();
        let created = UserStore::create(&store, new_user("cmd@cmd.ru")).await.unwrap();

        let login = Login::parse("cmd@cmd.ru").unwrap();
        let found = UserStore::get_by_login(&store, &login).await.unwrap();
        assert_eq!(found.id, created.id);

        let missing = Login::parse("nobody@cmd.ru").unwrap();
        let err = UserStore::get_by_login(&store, &missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let store = store();
        UserStore::create(&store, new_user("cmd@cmd.ru")).await.unwrap();
        let err = UserStore::create(&store, new_user("cmd@cmd.ru")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_cannot_steal_a_login() {
        let store = store();
        UserStore::create(&store, new_user("first@cmd.ru")).await.unwrap();
        let second = UserStore::create(&store, new_user("second@cmd.ru")).await.unwrap();

        let mut hijacked = second;
        hijacked.login = Login::parse("first@cmd.ru").unwrap();
        let err = UserStore::update(&store, hijacked).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = store();
        let provider = Provider {
            id: ProviderId::new(9),
            name: "Ghost".into(),
            origin: "US".into(),
        };
        let err = ProviderStore::update(&store, provider).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_replaces_row() {
        let store = store();
        let mut provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        provider.origin = "MX".into();
        ProviderStore::update(&store, provider.clone()).await.unwrap();
        let fetched = ProviderStore::get(&store, provider.id).await.unwrap();
        assert_eq!(fetched.origin, "MX");
    }

    #[tokio::test]
    async fn test_product_update_rechecks_provider_and_invariants() {
        let store = store();
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let product = ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(10.0), 5).unwrap(),
        )
        .await
        .unwrap();

        let mut dangling = product.clone();
        dangling.provider_id = ProviderId::new(999);
        let err = ProductStore::update(&store, dangling).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));

        let mut discounted = product.clone();
        discounted.price = dec!(-5.0);
        let err = ProductStore::update(&store, discounted).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::Negative { field: "price" })
        ));

        // The stored row survives both rejected updates untouched.
        assert_eq!(ProductStore::get(&store, product.id).await.unwrap(), product);
    }

    #[tokio::test]
    async fn test_order_update_rechecks_references() {
        let store = store();
        let order = seed_order(&store).await;

        let mut restated = order.clone();
        restated.state_id = OrderStateId::new(42);
        let err = OrderStore::update(&store, restated).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
        assert_eq!(OrderStore::get(&store, order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_item_update_rechecks_references_and_quantity() {
        let store = store();
        let order = seed_order(&store).await;
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let product = ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(2.0), 4).unwrap(),
        )
        .await
        .unwrap();
        let item = ItemStore::create(
            &store,
            NewItem::new(product.id, order.id, 2, dec!(4.0)).unwrap(),
        )
        .await
        .unwrap();

        let mut rehomed = item.clone();
        rehomed.order_id = OrderId::new(77);
        let err = ItemStore::update(&store, rehomed).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));

        let mut emptied = item.clone();
        emptied.quantity = 0;
        let err = ItemStore::update(&store, emptied).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::NotPositive { field: "quantity" })
        ));
    }

    #[tokio::test]
    async fn test_order_create_checks_user_and_state() {
        let store = store();
        let draft = NewOrder::for_user(UserId::new(7)).unwrap();
        let err = OrderStore::create(&store, draft).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_user_with_orders_cannot_be_deleted() {
        let store = store();
        let order = seed_order(&store).await;
        let err = UserStore::delete(&store, order.user_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
        assert!(UserStore::get(&store, order.user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_order_state_in_use_cannot_be_deleted() {
        let store = store();
        let order = seed_order(&store).await;
        let err = OrderStateStore::delete(&store, order.state_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));
    }

    #[tokio::test]
    async fn test_order_with_items_cannot_be_deleted() {
        let store = store();
        let order = seed_order(&store).await;
        let provider = ProviderStore::create(&store, new_provider("Acme")).await.unwrap();
        let product = ProductStore::create(
            &store,
            NewProduct::new("Widget".into(), provider.id, dec!(2.0), 4).unwrap(),
        )
        .await
        .unwrap();
        ItemStore::create(
            &store,
            NewItem::new(product.id, order.id, 2, dec!(4.0)).unwrap(),
        )
        .await
        .unwrap();

        let err = OrderStore::delete(&store, order.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Integrity(_)));

        // Deleting the item first unblocks the order.
        ItemStore::delete(&store, ItemId::new(1)).await.unwrap();
        OrderStore::delete(&store, order.id).await.unwrap();
    }
}
