//! Non-negative product stock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Stock changes must be strictly positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The reduction exceeds the available stock.
    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: u32 },

    /// The addition would overflow the stock counter.
    #[error("Stock overflow: {available} + {quantity}")]
    Overflow { available: u32, quantity: u32 },
}

/// Available stock of one product. Immutable; mutators return a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    available_stock: u32,
}

impl Inventory {
    pub fn new(available_stock: u32) -> Self {
        Self { available_stock }
    }

    pub fn available_stock(&self) -> u32 {
        self.available_stock
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.available_stock == 0
    }

    /// Returns true if `quantity` units can be taken. Mutators re-check regardless.
    pub fn has_enough_stock(&self, quantity: u32) -> bool {
        quantity <= self.available_stock
    }

    pub fn add(&self, quantity: u32) -> Result<Inventory, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        let available_stock =
            self.available_stock
                .checked_add(quantity)
                .ok_or(InventoryError::Overflow {
                    available: self.available_stock,
                    quantity,
                })?;
        Ok(Self { available_stock })
    }

    pub fn reduce(&self, quantity: u32) -> Result<Inventory, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if !self.has_enough_stock(quantity) {
            return Err(InventoryError::InsufficientInventory {
                requested: quantity,
                available: self.available_stock,
            });
        }
        Ok(Self {
            available_stock: self.available_stock - quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_reduce() {
        let inventory = Inventory::new(5).add(3).unwrap().reduce(8).unwrap();
        assert_eq!(inventory.available_stock(), 0);
        assert!(inventory.is_out_of_stock());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let inventory = Inventory::new(5);
        assert!(matches!(
            inventory.add(0),
            Err(InventoryError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            inventory.reduce(0),
            Err(InventoryError::InvalidQuantity { quantity: 0 })
        ));
    }

    #[test]
    fn test_reduce_beyond_stock_leaves_stock_unchanged() {
        let inventory = Inventory::new(4);
        for requested in [5, 6, u32::MAX] {
            assert_eq!(
                inventory.reduce(requested),
                Err(InventoryError::InsufficientInventory {
                    requested,
                    available: 4,
                })
            );
            assert_eq!(inventory.available_stock(), 4);
        }
    }

    #[test]
    fn test_has_enough_stock() {
        let inventory = Inventory::new(2);
        assert!(inventory.has_enough_stock(2));
        assert!(!inventory.has_enough_stock(3));
    }

    #[test]
    fn test_add_overflow() {
        let inventory = Inventory::new(u32::MAX);
        assert!(matches!(
            inventory.add(1),
            Err(InventoryError::Overflow { .. })
        ));
    }
}
