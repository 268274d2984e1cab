//! 订单及订单明细实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{OrderStatus, PaymentStatus, PaymentType};

/// 订单号前缀
pub const ORDER_CODE_PREFIX: &str = "GS";

/// 订单
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    /// 对外展示的订单号，如 GS1A2B3C4D
    pub order_code: String,
    /// 客户端生成的幂等键，全局唯一
    pub idempotency_key: String,
    pub user_id: i64,
    pub invoice_number: String,
    /// 客户端传入的支付方式文案
    pub payment_method: String,
    pub payment_type: PaymentType,
    /// 商品金额合计（货币）
    pub price_total: i64,
    /// 商品积分合计
    pub point_total: i64,
    pub shipping_cost: i64,
    /// 应付总额（积分订单为积分数）
    pub grand_total: i64,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 订单明细
///
/// 名称、单价等展示字段在下单时快照，之后不再随商品变化
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_item_id: i64,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub weight: i32,
    pub unit: String,
    pub line_total: i64,
    pub created_at: DateTime<Utc>,
}

/// 待插入的订单
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_code: String,
    pub idempotency_key: String,
    pub user_id: i64,
    pub invoice_number: String,
    pub payment_method: String,
    pub payment_type: PaymentType,
    pub price_total: i64,
    pub point_total: i64,
    pub shipping_cost: i64,
    pub grand_total: i64,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
}

/// 待插入的订单明细
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_item_id: i64,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub weight: i32,
    pub unit: String,
    pub line_total: i64,
}

/// 订单及其明细
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// 生成订单号
///
/// 固定前缀加随机 UUID 十六进制形式的前 8 位（大写）
pub fn generate_order_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", ORDER_CODE_PREFIX, hex[..8].to_uppercase())
}
