//! Value objects for the order domain.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::Sku;
use crate::money::Money;

use super::OrderError;

/// Human-facing order number, e.g. `ORD20240501123000-1A2B3C4D`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Wraps an existing order number.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Generates a fresh number from the current time and a random suffix.
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "ORD{}-{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            suffix[..8].to_ascii_uppercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One line of an order. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderItemRepr")]
pub struct OrderItem {
    sku: Sku,
    product_name: String,
    unit_price: Money,
    quantity: u32,
    total_price: Money,
}

#[derive(Deserialize)]
struct OrderItemRepr {
    sku: Sku,
    product_name: String,
    unit_price: Money,
    quantity: u32,
}

impl TryFrom<OrderItemRepr> for OrderItem {
    type Error = OrderError;

    fn try_from(repr: OrderItemRepr) -> Result<Self, Self::Error> {
        OrderItem::new(repr.sku, repr.product_name, repr.unit_price, repr.quantity)
    }
}

impl OrderItem {
    /// Creates a line, pricing it at `unit_price * quantity`.
    ///
    /// Fails on a zero price or a zero quantity.
    pub fn new(
        sku: impl Into<Sku>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if unit_price.is_zero() {
            return Err(OrderError::InvalidPrice { price: unit_price });
        }
        let total_price = unit_price.multiply(i64::from(quantity))?;
        Ok(Self {
            sku: sku.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
            total_price,
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> &Money {
        &self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price * quantity`, fixed at construction.
    pub fn total_price(&self) -> &Money {
        &self.total_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cny(amount: &str) -> Money {
        Money::parse(amount, "CNY").unwrap()
    }

    #[test]
    fn test_order_number_format() {
        let number = OrderNumber::generate();
        assert!(number.as_str().starts_with("ORD"));
        assert_eq!(number.as_str().len(), "ORD".len() + 14 + 1 + 8);
        assert_ne!(number, OrderNumber::generate());
    }

    #[test]
    fn test_order_item_total_price() {
        let item = OrderItem::new("SKU-A", "Widget", cny("10.00"), 3).unwrap();
        assert_eq!(item.total_price(), &cny("30.00"));
        assert_eq!(item.sku().as_str(), "SKU-A");
        assert_eq!(item.product_name(), "Widget");
    }

    #[test]
    fn test_order_item_zero_quantity_fails() {
        let result = OrderItem::new("SKU-A", "Widget", cny("10.00"), 0);
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_order_item_zero_price_fails() {
        let result = OrderItem::new("SKU-A", "Widget", cny("0"), 1);
        assert!(matches!(result, Err(OrderError::InvalidPrice { .. })));
    }

    #[test]
    fn test_order_item_deserialization_recomputes_total() {
        let item = OrderItem::new("SKU-A", "Widget", cny("2.50"), 4).unwrap();
        let mut json: serde_json::Value = serde_json::to_value(&item).unwrap();
        json["total_price"] = serde_json::json!({"amount": "999.00", "currency": "CNY"});

        let back: OrderItem = serde_json::from_value(json).unwrap();
        assert_eq!(back.total_price(), &cny("10.00"));
    }

    #[test]
    fn test_order_item_deserialization_rejects_zero_quantity() {
        let json = r#"{"sku":"SKU-A","product_name":"Widget",
            "unit_price":{"amount":"1.00","currency":"CNY"},"quantity":0}"#;
        assert!(serde_json::from_str::<OrderItem>(json).is_err());
    }
}
