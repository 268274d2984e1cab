//! 响应 DTO 定义

use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Success")
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// 累计已领取奖励
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalBonusDto {
    pub user_id: i64,
    pub total_bonus: i64,
}

/// 积分汇率
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRateDto {
    pub harga_poin: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.code, "SUCCESS");
        assert_eq!(response.data, Some("test data"));
    }

    #[test]
    fn test_api_response_serialization() {
        let response = ApiResponse::success_with_message(
            PointRateDto { harga_poin: 1000 },
            "Harga Poin updated successfully",
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Harga Poin updated successfully");
        assert_eq!(json["data"]["hargaPoin"], 1000);
    }

    #[test]
    fn test_empty_response_omits_data() {
        let response = ApiResponse::<()>::success_empty("Order deleted successfully");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"data\""));
    }
}
