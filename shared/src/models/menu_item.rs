//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu item as read by the ordering core.
///
/// Owned by the catalog (admin back office); the ordering core never writes
/// it. Prices are integer minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    /// Unit price in minor units (cents), always non-negative
    pub price: i64,
    /// Unavailable items cannot be priced into a new order
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_json_shape() {
        let item = MenuItem {
            id: 42,
            name: "Taco".to_string(),
            price: 300,
            available: true,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"price\":300"));
        assert!(json.contains("\"available\":true"));
    }
}
