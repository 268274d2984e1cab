//! HTTP 层错误类型定义
//!
//! 将领域错误映射为 HTTP 状态码与统一的 JSON 错误体

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_management::OrderError;
use serde_json::json;

/// 请求格式错误时的固定提示
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request format";

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 请求体无法解析或字段校验失败，details 为解析器/校验器原文
    #[error("Invalid request format")]
    InvalidRequest(String),

    /// 请求参数语义错误（提示文案直接返回给调用方）
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Order(err) => order_status(err),
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Order(err) => err.error_code(),
        }
    }

    /// 附加信息：解析错误原文或系统错误原文
    fn details(&self) -> Option<String> {
        match self {
            Self::InvalidRequest(details) => Some(details.clone()),
            Self::Order(err) if !err.is_business_error() => Some(err.to_string()),
            _ => None,
        }
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::UserNotFound(_)
        | OrderError::UserPointsNotFound(_)
        | OrderError::InventoryUnitNotFound(_)
        | OrderError::OrderNotFound
        | OrderError::BonusNotFound(_)
        | OrderError::BonusNotPending(_)
        | OrderError::PointRateNotFound => StatusCode::NOT_FOUND,

        OrderError::BonusOwnershipMismatch { .. } => StatusCode::FORBIDDEN,

        other if other.is_business_error() => StatusCode::BAD_REQUEST,

        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "请求处理失败");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "请求被拒绝");
        }

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": self.to_string(),
            "details": self.details(),
            "data": serde_json::Value::Null
        });

        (status, Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidRequest(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (OrderError::EmptyItems, StatusCode::BAD_REQUEST),
            (OrderError::NonPositiveTotal, StatusCode::BAD_REQUEST),
            (OrderError::UserNotFound(1), StatusCode::NOT_FOUND),
            (OrderError::UserPointsNotFound(1), StatusCode::NOT_FOUND),
            (OrderError::InventoryUnitNotFound(9), StatusCode::NOT_FOUND),
            (OrderError::OrderNotFound, StatusCode::NOT_FOUND),
            (OrderError::BonusNotFound(3), StatusCode::NOT_FOUND),
            (OrderError::BonusNotPending(3), StatusCode::NOT_FOUND),
            (OrderError::PointRateNotFound, StatusCode::NOT_FOUND),
            (OrderError::NoPoints, StatusCode::BAD_REQUEST),
            (
                OrderError::InsufficientPoints {
                    balance: 5,
                    required: 10,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::InsufficientStock {
                    product_name: "Bayam".into(),
                    available: 0,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::BonusOwnershipMismatch {
                    bonus_id: 1,
                    user_id: 2,
                },
                StatusCode::FORBIDDEN,
            ),
            (OrderError::BonusExpired(1), StatusCode::BAD_REQUEST),
            (
                OrderError::BonusCapExceeded { cap: 500_000 },
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::BonusNotClaimed(1), StatusCode::BAD_REQUEST),
            (OrderError::NonPositivePointRate, StatusCode::BAD_REQUEST),
            (
                OrderError::InvalidOrderStatus("shipped".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrderError::InvalidPointRate("abc".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OrderError::PointRateUnavailable,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OrderError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OrderError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let code = err.error_code();
            assert_eq!(ApiError::from(err).status_code(), expected, "{code}");
        }
    }

    #[test]
    fn test_invalid_request_status() {
        let err = ApiError::InvalidRequest("missing field `userId`".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_business_error_body() {
        let (status, body) = body_json(OrderError::InsufficientPoints {
            balance: 120,
            required: 300,
        }
        .into())
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INSUFFICIENT_POINTS");
        assert_eq!(body["message"], "Poin tidak cukup. Poin Anda: 120");
        assert!(body["details"].is_null());
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_system_error_keeps_raw_text() {
        let (status, body) = body_json(OrderError::InvalidPointRate("abc".into()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Invalid hargaPoin value: abc");
        assert_eq!(body["details"], "Invalid hargaPoin value: abc");
    }

    #[tokio::test]
    async fn test_invalid_request_body() {
        let (_, body) = body_json(ApiError::InvalidRequest("expected i64".into())).await;

        assert_eq!(body["message"], INVALID_REQUEST_MESSAGE);
        assert_eq!(body["details"], "expected i64");
    }
}
