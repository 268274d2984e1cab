//! 订单服务错误类型
//!
//! 业务错误的 Display 文本直接作为接口返回的 message，
//! 与移动端已有的文案保持一致。

use thiserror::Error;

/// 订单服务错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    // === 请求校验 ===
    #[error("{0}")]
    Validation(String),

    #[error("Items are required")]
    EmptyItems,

    #[error("Total bayar harus lebih dari 0")]
    NonPositiveTotal,

    #[error("idempotencyKey is required")]
    MissingIdempotencyKey,

    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),

    // === 资源不存在 ===
    #[error("User not found")]
    UserNotFound(i64),

    #[error("User points not found")]
    UserPointsNotFound(i64),

    #[error("Product item with ID {0} not found")]
    InventoryUnitNotFound(i64),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Bonus not found")]
    BonusNotFound(i64),

    #[error("Bonus not found or already claimed")]
    BonusNotPending(i64),

    #[error("Harga Poin setting not found")]
    PointRateNotFound,

    // === 业务规则 ===
    #[error("Anda tidak memiliki poin")]
    NoPoints,

    #[error("Poin tidak cukup. Poin Anda: {balance}")]
    InsufficientPoints { balance: i64, required: i64 },

    #[error("Insufficient stock for {product_name}. Available: {available}")]
    InsufficientStock {
        product_name: String,
        available: i32,
    },

    #[error("You don't have permission to claim this bonus")]
    BonusOwnershipMismatch { bonus_id: i64, user_id: i64 },

    #[error("Bonus has expired and cannot be claimed")]
    BonusExpired(i64),

    #[error("Total bonus already reached {}", group_thousands(*.cap))]
    BonusCapExceeded { cap: i64 },

    #[error("Bonus status must be claimed before transferring")]
    BonusNotClaimed(i64),

    #[error("Harga Poin must be a positive number")]
    NonPositivePointRate,

    // === 系统错误 ===
    #[error("Invalid hargaPoin value: {0}")]
    InvalidPointRate(String),

    #[error("hargaPoin setting is not configured")]
    PointRateUnavailable,

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("通知发送失败: {0}")]
    Notification(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 订单服务 Result 类型别名
pub type Result<T> = std::result::Result<T, OrderError>;

/// 以逗号分组千位，用于上限提示文案
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

impl OrderError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            Self::Notification(_) => true,
            _ => false,
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Notification(_) | Self::Internal(_)
                | Self::InvalidPointRate(_)
                | Self::PointRateUnavailable
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmptyItems => "EMPTY_ITEMS",
            Self::NonPositiveTotal => "NON_POSITIVE_TOTAL",
            Self::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            Self::InvalidOrderStatus(_) => "INVALID_ORDER_STATUS",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::UserPointsNotFound(_) => "USER_POINTS_NOT_FOUND",
            Self::InventoryUnitNotFound(_) => "PRODUCT_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::BonusNotFound(_) => "BONUS_NOT_FOUND",
            Self::BonusNotPending(_) => "BONUS_NOT_PENDING",
            Self::PointRateNotFound => "POINT_RATE_NOT_FOUND",
            Self::NoPoints => "NO_POINTS",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::BonusOwnershipMismatch { .. } => "BONUS_FORBIDDEN",
            Self::BonusExpired(_) => "BONUS_EXPIRED",
            Self::BonusCapExceeded { .. } => "BONUS_CAP_EXCEEDED",
            Self::BonusNotClaimed(_) => "BONUS_NOT_CLAIMED",
            Self::NonPositivePointRate => "NON_POSITIVE_POINT_RATE",
            Self::InvalidPointRate(_) => "INVALID_POINT_RATE",
            Self::PointRateUnavailable => "POINT_RATE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Notification(_) => "NOTIFICATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
