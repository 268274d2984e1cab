//! 订单仓储
//!
//! 订单与订单明细的数据访问，写操作均在调用方事务内执行

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, PaymentStatus,
};

const ORDER_COLUMNS: &str = r#"
    id, order_code, idempotency_key, user_id, invoice_number, payment_method,
    payment_type, price_total, point_total, shipping_cost, grand_total,
    payment_status, status, created_at, updated_at
"#;

const ORDER_ITEM_COLUMNS: &str = r#"
    id, order_id, product_item_id, product_name, unit_price, quantity,
    weight, unit, line_total, created_at
"#;

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 按幂等键查询订单（事务外）
    pub async fn get_order_by_idempotency_key(&self, key: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn list_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// 用户全部订单，最新在前
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 用户指定状态的订单，最新在前
    pub async fn list_by_user_and_status(
        &self,
        user_id: i64,
        status: OrderStatus,
    ) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1 AND status = $2
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    // ==================== 事务操作 ====================

    /// 在事务中按幂等键查询订单
    pub async fn get_by_idempotency_key_in_tx(
        tx: &mut PgConnection,
        key: &str,
    ) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 在事务中获取订单（带行级锁）
    pub async fn get_order_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(order)
    }

    /// 在事务中插入订单
    ///
    /// 幂等键冲突时返回唯一约束错误，由调用方识别
    pub async fn create_order_in_tx(tx: &mut PgConnection, order: &NewOrder) -> Result<Order> {
        let created = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                order_code, idempotency_key, user_id, invoice_number, payment_method,
                payment_type, price_total, point_total, shipping_cost, grand_total,
                payment_status, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order.order_code)
        .bind(&order.idempotency_key)
        .bind(order.user_id)
        .bind(&order.invoice_number)
        .bind(&order.payment_method)
        .bind(order.payment_type)
        .bind(order.price_total)
        .bind(order.point_total)
        .bind(order.shipping_cost)
        .bind(order.grand_total)
        .bind(order.payment_status)
        .bind(order.status)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 在事务中插入订单明细
    pub async fn create_item_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        item: &NewOrderItem,
    ) -> Result<OrderItem> {
        let created = sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            INSERT INTO order_items (
                order_id, product_item_id, product_name, unit_price, quantity,
                weight, unit, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_ITEM_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(item.product_item_id)
        .bind(&item.product_name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.weight)
        .bind(&item.unit)
        .bind(item.line_total)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 在事务中更新订单状态，可同时更新支付状态
    pub async fn update_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order> {
        let updated = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $2,
                payment_status = COALESCE($3, payment_status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .fetch_one(tx)
        .await?;

        Ok(updated)
    }

    pub async fn delete_items_in_tx(tx: &mut PgConnection, order_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_order_in_tx(tx: &mut PgConnection, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(tx)
            .await?;

        Ok(())
    }

    /// 在事务中清理用户购物车里已下单的规格
    pub async fn clear_cart_items_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        product_item_ids: &[i64],
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM carts WHERE user_id = $1 AND product_item_id = ANY($2)",
        )
        .bind(user_id)
        .bind(product_item_ids)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }
}
