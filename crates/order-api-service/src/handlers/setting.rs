//! 配置项 API 处理器

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use crate::{
    dto::{ApiResponse, PointRateDto, SetPointRateRequest},
    error::Result,
    state::AppState,
};

/// 获取积分汇率
///
/// GET /api/v1/settings/harga-poin
pub async fn get_point_rate(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PointRateDto>>> {
    let harga_poin = state.settings.get_point_rate().await?;
    Ok(Json(ApiResponse::success(PointRateDto { harga_poin })))
}

/// 设置积分汇率
///
/// POST /api/v1/settings/harga-poin
pub async fn set_point_rate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetPointRateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PointRateDto>>> {
    let Json(req) = payload?;
    let rate = req.rate()?;

    let harga_poin = state.settings.set_point_rate(rate).await?;
    info!(harga_poin, "积分汇率已更新");

    Ok(Json(ApiResponse::success_with_message(
        PointRateDto { harga_poin },
        "Harga Poin updated successfully",
    )))
}
