//! 服务层数据传输对象

use serde::Serialize;

use crate::models::{
    AffiliateBonus, Order, OrderItem, OrderSource, PaymentType, TotalBonus,
};

/// 下单命令
///
/// 金额字段均为已取整的整数；积分订单的 `grand_total` 为积分数
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    pub user_id: i64,
    pub idempotency_key: String,
    pub payment_type: PaymentType,
    pub source: OrderSource,
    /// 客户端传入的支付方式文案，原样保存
    pub payment_method: String,
    pub invoice_number: String,
    pub price_total: i64,
    pub point_total: i64,
    pub shipping_cost: i64,
    pub grand_total: i64,
    pub items: Vec<PlaceOrderItem>,
}

/// 下单明细
#[derive(Debug, Clone)]
pub struct PlaceOrderItem {
    pub product_item_id: i64,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub weight: i32,
    pub unit: String,
    pub line_total: i64,
}

/// 下单结果
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub bonuses: Vec<AffiliateBonus>,
    /// 幂等重放时为 true，表示未创建新订单
    pub replayed: bool,
}

/// 奖励领取结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResult {
    pub bonus: AffiliateBonus,
    pub total_bonus: TotalBonus,
}
