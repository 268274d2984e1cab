//! 库存规格仓储

use sqlx::PgConnection;

use crate::error::Result;
use crate::models::InventoryUnit;

/// 库存规格仓储
///
/// 只暴露事务内操作：库存读写必须与订单写入处于同一事务
pub struct InventoryRepository;

impl InventoryRepository {
    /// 在事务中获取规格（带行级锁）
    ///
    /// 同一规格的并发下单在此串行化
    pub async fn get_unit_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<InventoryUnit>> {
        let unit = sqlx::query_as::<_, InventoryUnit>(
            r#"
            SELECT id, product_id, stock, price, point_price, pack_quantity, unit, updated_at
            FROM product_items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(unit)
    }

    /// 在事务中扣减库存
    ///
    /// 返回是否扣减成功；库存不足时不修改任何行
    pub async fn decrement_stock_in_tx(
        tx: &mut PgConnection,
        id: i64,
        quantity: i32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE product_items
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
