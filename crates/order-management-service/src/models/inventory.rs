//! 可售商品规格

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 可售规格（product_items）
///
/// 库存不允许为负，下单事务内先锁定再扣减
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUnit {
    pub id: i64,
    pub product_id: i64,
    pub stock: i32,
    /// 货币价格
    pub price: i64,
    /// 积分价格
    pub point_price: i64,
    pub pack_quantity: i32,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

impl InventoryUnit {
    /// 库存是否足够扣减
    pub fn can_fulfil(&self, quantity: i32) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(stock: i32) -> InventoryUnit {
        InventoryUnit {
            id: 1,
            product_id: 1,
            stock,
            price: 12_000,
            point_price: 12,
            pack_quantity: 1,
            unit: "kg".into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_fulfil() {
        assert!(unit(5).can_fulfil(5));
        assert!(unit(5).can_fulfil(1));
        assert!(!unit(5).can_fulfil(6));
        assert!(!unit(0).can_fulfil(1));
        assert!(!unit(5).can_fulfil(0));
    }
}
