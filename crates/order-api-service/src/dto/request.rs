//! 请求 DTO 定义

use order_management::dto::{PlaceOrderCommand, PlaceOrderItem};
use order_management::{OrderSource, PaymentType};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::error::ApiError;

/// 金额按四舍五入（远离零）取整
pub fn round_amount(value: f64) -> i64 {
    value.round() as i64
}

/// 下单请求（四个下单入口共用）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: i64,
    #[validate(length(min = 1, message = "idempotencyKey is required"))]
    pub idempotency_key: String,
    #[validate(length(min = 1, message = "metodePembayaran is required"))]
    pub metode_pembayaran: String,
    /// 现金订单的商品小计
    #[serde(default)]
    pub harga_rp: f64,
    /// 积分订单的商品小计
    #[serde(default)]
    pub harga_poin: f64,
    #[serde(default)]
    pub ongkir: f64,
    pub total_bayar: f64,
    #[serde(default)]
    pub invoice_number: String,
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,
}

/// 下单明细
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// 可售规格 ID
    pub product_id: i64,
    #[validate(length(min = 1, message = "namaProduk is required"))]
    pub nama_produk: String,
    pub harga: f64,
    #[validate(range(min = 1, message = "jumlah must be at least 1"))]
    pub jumlah: i32,
    #[serde(default)]
    pub berat: f64,
    #[serde(default)]
    pub satuan: String,
    pub total_harga: f64,
}

impl CreateOrderRequest {
    /// 转换为下单命令，金额取整
    ///
    /// 重量取整后超出 i32 范围时返回 `ApiError::InvalidRequest`
    pub fn into_command(
        self,
        payment_type: PaymentType,
        source: OrderSource,
    ) -> Result<PlaceOrderCommand, ApiError> {
        let (price_total, point_total) = match payment_type {
            PaymentType::Cod => (round_amount(self.harga_rp), 0),
            PaymentType::Points => (0, round_amount(self.harga_poin)),
        };

        let items = self
            .items
            .into_iter()
            .map(OrderItemRequest::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlaceOrderCommand {
            user_id: self.user_id,
            idempotency_key: self.idempotency_key,
            payment_type,
            source,
            payment_method: self.metode_pembayaran,
            invoice_number: self.invoice_number,
            price_total,
            point_total,
            shipping_cost: round_amount(self.ongkir),
            grand_total: round_amount(self.total_bayar),
            items,
        })
    }
}

impl OrderItemRequest {
    fn into_item(self) -> Result<PlaceOrderItem, ApiError> {
        let weight = i32::try_from(round_amount(self.berat)).map_err(|_| {
            ApiError::InvalidRequest(format!("berat: {} is out of range", self.berat))
        })?;

        Ok(PlaceOrderItem {
            product_item_id: self.product_id,
            product_name: self.nama_produk,
            unit_price: round_amount(self.harga),
            quantity: self.jumlah,
            weight,
            unit: self.satuan,
            line_total: round_amount(self.total_harga),
        })
    }
}

/// 幂等键查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOrderQuery {
    pub idempotency_key: Option<String>,
}

/// 订单状态更新请求
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// 奖励领取请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBonusRequest {
    pub bonus_id: i64,
    pub user_id: i64,
}

/// 积分汇率设置请求
///
/// 后台表单可能提交数字或数字字符串
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPointRateRequest {
    pub harga_poin: Value,
}

impl SetPointRateRequest {
    /// 解析为整数汇率；数字截断小数，字符串须为整数
    pub fn rate(&self) -> Result<i64, ApiError> {
        match &self.harga_poin {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|v| v.trunc() as i64))
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid hargaPoin value: {n}"))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid hargaPoin value: {s}"))),
            _ => Err(ApiError::BadRequest("Invalid hargaPoin type".to_string())),
        }
    }
}
