//! 推荐奖励 API 处理器

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use order_management::AffiliateBonus;
use order_management::dto::ClaimResult;

use crate::{
    dto::{ApiResponse, ClaimBonusRequest, TotalBonusDto},
    error::Result,
    state::AppState,
};

/// 领取奖励
///
/// POST /api/v1/afiliasi-app/claim
pub async fn claim_bonus(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ClaimBonusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ClaimResult>>> {
    let Json(req) = payload?;
    let result = state.bonuses.claim(req.bonus_id, req.user_id).await?;

    Ok(Json(ApiResponse::success_with_message(
        result,
        "Bonus claimed successfully",
    )))
}

/// 用户累计已领取奖励
///
/// GET /api/v1/afiliasi-app/total/{userId}
pub async fn get_total_bonus(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<TotalBonusDto>>> {
    let total_bonus = state.bonuses.total_claimed(user_id).await?;
    Ok(Json(ApiResponse::success(TotalBonusDto {
        user_id,
        total_bonus,
    })))
}

/// 待领取奖励（来源订单已送达），按到期时间升序
///
/// GET /api/v1/afiliasi-app/pending/{userId}
pub async fn list_pending_bonuses(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AffiliateBonus>>>> {
    let bonuses = state.bonuses.pending_bonuses(user_id).await?;
    Ok(Json(ApiResponse::success(bonuses)))
}

/// 已过期奖励
///
/// GET /api/v1/afiliasi-app/expired/{userId}
pub async fn list_expired_bonuses(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AffiliateBonus>>>> {
    let bonuses = state.bonuses.expired_bonuses(user_id).await?;
    Ok(Json(ApiResponse::success(bonuses)))
}

/// 运营打款：claimed → transferred
///
/// PATCH /api/v1/afiliasi-bonus/{id}/transfer
pub async fn transfer_bonus(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AffiliateBonus>>> {
    let bonus = state.bonuses.transfer(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        bonus,
        "Bonus transferred successfully",
    )))
}
