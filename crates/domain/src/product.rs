//! Product aggregate: a catalogue entry with its own stock.

use common::AggregateMeta;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::ids::{MerchantId, Sku};
use crate::inventory::Inventory;
use crate::lifecycle::ResourceStatus;
use crate::money::{Money, MoneyError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    meta: AggregateMeta,
    sku: Sku,
    name: String,
    merchant_id: MerchantId,
    price: Money,
    inventory: Inventory,
    status: ResourceStatus,
}

impl Aggregate for Product {
    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}

fn ensure_priced(price: &Money) -> Result<(), DomainError> {
    if price.is_zero() {
        return Err(MoneyError::InvalidAmount("price must be greater than 0".to_string()).into());
    }
    Ok(())
}

impl Product {
    /// Lists an active product sold by `merchant_id`.
    pub fn list(
        sku: impl Into<Sku>,
        name: impl Into<String>,
        merchant_id: MerchantId,
        price: Money,
        initial_stock: u32,
    ) -> Result<Self, DomainError> {
        ensure_priced(&price)?;
        Ok(Self {
            meta: AggregateMeta::new(),
            sku: sku.into(),
            name: name.into(),
            merchant_id,
            price,
            inventory: Inventory::new(initial_stock),
            status: ResourceStatus::Active,
        })
    }

    /// Rebuilds a product from stored fields. Storage adapters only.
    pub fn rehydrate(
        meta: AggregateMeta,
        sku: Sku,
        name: String,
        merchant_id: MerchantId,
        price: Money,
        inventory: Inventory,
        status: ResourceStatus,
    ) -> Self {
        Self {
            meta,
            sku,
            name,
            merchant_id,
            price,
            inventory,
            status,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    pub fn price(&self) -> &Money {
        &self.price
    }

    pub fn available_stock(&self) -> u32 {
        self.inventory.available_stock()
    }

    pub fn has_enough_stock(&self, quantity: u32) -> bool {
        self.inventory.has_enough_stock(quantity)
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Fails with `ResourceInactive` if the product is delisted.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        self.status.ensure_active(Self::aggregate_type(), &self.sku)
    }

    /// Receives new stock.
    pub fn add_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.inventory = self.inventory.add(quantity)?;
        self.meta.touch();
        Ok(())
    }

    /// Puts back stock taken by a cancelled order.
    ///
    /// Allowed on an inactive product: the units were already counted.
    pub fn restore_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.inventory = self.inventory.add(quantity)?;
        self.meta.touch();
        Ok(())
    }

    /// Takes stock for a confirmed order.
    pub fn reduce_stock(&mut self, quantity: u32) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.inventory = self.inventory.reduce(quantity)?;
        self.meta.touch();
        Ok(())
    }

    /// Reprices the product. Existing order lines keep their price.
    pub fn change_price(&mut self, price: Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        ensure_priced(&price)?;
        self.price.ensure_same_currency(&price)?;
        self.price = price;
        self.meta.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        if self.status != ResourceStatus::Active {
            self.status = ResourceStatus::Active;
            self.meta.touch();
        }
    }

    pub fn deactivate(&mut self) {
        if self.status != ResourceStatus::Inactive {
            self.status = ResourceStatus::Inactive;
            self.meta.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn cny(amount: &str) -> Money {
        Money::parse(amount, "CNY").unwrap()
    }

    fn product(stock: u32) -> Product {
        Product::list("SKU-A", "Widget", MerchantId::new(), cny("10.00"), stock).unwrap()
    }

    #[test]
    fn test_list_requires_price() {
        let result = Product::list("SKU-A", "Widget", MerchantId::new(), cny("0"), 1);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAmount);
    }

    #[test]
    fn test_stock_movements() {
        let mut product = product(5);
        product.reduce_stock(3).unwrap();
        product.add_stock(10).unwrap();
        assert_eq!(product.available_stock(), 12);
    }

    #[test]
    fn test_reduce_beyond_stock() {
        let mut product = product(2);
        let err = product.reduce_stock(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientInventory);
        assert_eq!(product.available_stock(), 2);
    }

    #[test]
    fn test_inactive_product() {
        let mut product = product(2);
        product.deactivate();
        assert_eq!(
            product.reduce_stock(1).unwrap_err().kind(),
            ErrorKind::ResourceInactive
        );
        product.restore_stock(1).unwrap();
        assert_eq!(product.available_stock(), 3);
    }

    #[test]
    fn test_change_price() {
        let mut product = product(1);
        product.change_price(cny("12.50")).unwrap();
        assert_eq!(product.price(), &cny("12.50"));

        let usd = Money::parse("12.50", "USD").unwrap();
        assert_eq!(
            product.change_price(usd).unwrap_err().kind(),
            ErrorKind::CurrencyMismatch
        );
    }
}
