//! Provider and product domain types.

use rust_decimal::Decimal;
use storeroom_core::{ProductId, ProviderId};

use super::DomainError;

/// A persisted provider (supplier of products).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    /// Country or region of origin.
    pub origin: String,
}

/// A provider draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub origin: String,
}

impl NewProvider {
    /// Validate and build a provider draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Required`] if name or origin is empty.
    pub fn new(name: String, origin: String) -> Result<Self, DomainError> {
        super::require_text(&name, "name")?;
        super::require_text(&origin, "origin")?;
        Ok(Self { name, origin })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_provider(self, id: ProviderId) -> Provider {
        Provider {
            id,
            name: self.name,
            origin: self.origin,
        }
    }
}

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Supplying provider; must exist at write time.
    pub provider_id: ProviderId,
    /// Unit price, never negative.
    pub price: Decimal,
    /// Units on hand, never negative.
    pub stock: i64,
}

/// A product draft awaiting persistence.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub provider_id: ProviderId,
    pub price: Decimal,
    pub stock: i64,
}

impl NewProduct {
    /// Validate and build a product draft.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError`] if the name is empty, the provider ID is
    /// unassigned, or price/stock is negative.
    pub fn new(
        name: String,
        provider_id: ProviderId,
        price: Decimal,
        stock: i64,
    ) -> Result<Self, DomainError> {
        super::require_text(&name, "name")?;
        if !provider_id.is_assigned() {
            return Err(DomainError::Required {
                field: "provider_id",
            });
        }
        if price.is_sign_negative() {
            return Err(DomainError::Negative { field: "price" });
        }
        if stock < 0 {
            return Err(DomainError::Negative { field: "stock" });
        }
        Ok(Self {
            name,
            provider_id,
            price,
            stock,
        })
    }

    /// Attach a store-assigned ID, producing the persisted entity.
    #[must_use]
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            provider_id: self.provider_id,
            price: self.price,
            stock: self.stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_new_provider_valid() {
        let draft = NewProvider::new("Acme".into(), "US".into()).expect("valid draft");
        let provider = draft.into_provider(ProviderId::new(1));
        assert_eq!(provider.name, "Acme");
        assert_eq!(provider.origin, "US");
    }

    #[test]
    fn test_new_provider_requires_fields() {
        assert!(NewProvider::new(String::new(), "US".into()).is_err());
        assert!(NewProvider::new("Acme".into(), String::new()).is_err());
    }

    #[test]
    fn test_new_product_valid() {
        let draft = NewProduct::new("Widget".into(), ProviderId::new(1), dec!(10.00), 5)
            .expect("valid draft");
        assert_eq!(draft.stock, 5);
    }

    #[test]
    fn test_new_product_rejects_negative_price() {
        assert_eq!(
            NewProduct::new("Widget".into(), ProviderId::new(1), dec!(-0.01), 5).unwrap_err(),
            DomainError::Negative { field: "price" }
        );
    }

    #[test]
    fn test_new_product_rejects_negative_stock() {
        assert_eq!(
            NewProduct::new("Widget".into(), ProviderId::new(1), dec!(1.00), -1).unwrap_err(),
            DomainError::Negative { field: "stock" }
        );
    }

    #[test]
    fn test_new_product_requires_provider() {
        assert_eq!(
            NewProduct::new("Widget".into(), ProviderId::new(0), dec!(1.00), 1).unwrap_err(),
            DomainError::Required {
                field: "provider_id"
            }
        );
    }

    #[test]
    fn test_zero_price_and_stock_allowed() {
        assert!(NewProduct::new("Freebie".into(), ProviderId::new(1), dec!(0), 0).is_ok());
    }
}
