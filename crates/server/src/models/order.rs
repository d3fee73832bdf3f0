//! Order, order-state, and line-item domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use storeroom_core::{ItemId, OrderId, OrderStateId, ProductId, UserId};

use super::DomainError;

/// The state every new order starts in ("Created").
pub const INITIAL_ORDER_STATE: OrderStateId = OrderStateId::new(1);

/// A named state in the order lifecycle ("Created", "In progress", "Delivery").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    pub id: OrderStateId,
    pub name: String,
}

/// An order-state draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewOrderState {
    pub name: String,
}

impl NewOrderState {
    /// Validate and build an order-state draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if the name is empty.
    pub fn new(name: String) -> Result<Self, DomainError> {
        super::require_text(&name, "name")?;
        Ok(Self { name })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_order_state(self, id: OrderStateId) -> OrderState {
        OrderState {
            id,
            name: self.name,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    /// Owning user; must exist at write time.
    pub user_id: UserId,
    /// Current lifecycle state; must exist at write time.
    pub state_id: OrderStateId,
    /// Sum of line-item prices, never negative.
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// An order draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub state_id: OrderStateId,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A fresh, empty order for a user: initial state, zero total.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if the user ID is unassigned.
    pub fn for_user(user_id: UserId) -> Result<Self, DomainError> {
        Self::new(user_id, INITIAL_ORDER_STATE, Decimal::ZERO, Utc::now())
    }

    /// Validate and build an order draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the user or state ID is unassigned, or the
    /// total is negative.
    pub fn new(
        user_id: UserId,
        state_id: OrderStateId,
        total_amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !user_id.is_assigned() {
            return Err(DomainError::Required { field: "user_id" });
        }
        if !state_id.is_assigned() {
            return Err(DomainError::Required { field: "state_id" });
        }
        if total_amount.is_sign_negative() {
            return Err(DomainError::Negative {
                field: "total_amount",
            });
        }
        Ok(Self {
            user_id,
            state_id,
            total_amount,
            created_at,
        })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            state_id: self.state_id,
            total_amount: self.total_amount,
            created_at: self.created_at,
        }
    }
}

/// A persisted order line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    /// Purchased product; must exist at write time.
    pub product_id: ProductId,
    /// Owning order; must exist at write time.
    pub order_id: OrderId,
    /// Units ordered, strictly positive.
    pub quantity: i64,
    /// Line total, never negative.
    pub total_price: Decimal,
}

/// A line-item draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub quantity: i64,
    pub total_price: Decimal,
}

impl NewItem {
    /// Validate and build a line-item draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the product or order ID is unassigned, the
    /// quantity is not strictly positive, or the total price is negative.
    pub fn new(
        product_id: ProductId,
        order_id: OrderId,
        quantity: i64,
        total_price: Decimal,
    ) -> Result<Self, DomainError> {
        if !product_id.is_assigned() {
            return Err(DomainError::Required {
                field: "product_id",
            });
        }
        if !order_id.is_assigned() {
            return Err(DomainError::Required { field: "order_id" });
        }
        if quantity <= 0 {
            return Err(DomainError::NotPositive { field: "quantity" });
        }
        if total_price.is_sign_negative() {
            return Err(DomainError::Negative {
                field: "total_price",
            });
        }
        Ok(Self {
            product_id,
            order_id,
            quantity,
            total_price,
        })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            product_id: self.product_id,
            order_id: self.order_id,
            quantity: self.quantity,
            total_price: self.total_price,
        }
    }
}
