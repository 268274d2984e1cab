//! 订单 API 处理器
//!
//! 四个下单入口（COD/积分 × 直接购买/购物车）共用同一个事务核心，
//! 以及订单查询、状态更新与删除接口

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use order_management::{Order, OrderSource, OrderStatus, OrderWithItems, PaymentType};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CheckOrderQuery, CreateOrderRequest, UpdateOrderStatusRequest},
    error::{ApiError, Result},
    state::AppState,
};

type PlaceResponse = (StatusCode, Json<ApiResponse<OrderWithItems>>);

/// COD 直接下单
///
/// POST /api/v1/pesanan-app/cod
pub async fn create_cod_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<PlaceResponse> {
    place(state, payload, PaymentType::Cod, OrderSource::Direct).await
}

/// COD 购物车下单
///
/// POST /api/v1/pesanan-app/cod-cart
pub async fn create_cod_cart_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<PlaceResponse> {
    place(state, payload, PaymentType::Cod, OrderSource::Cart).await
}

/// 积分直接下单
///
/// POST /api/v1/pesanan-app/poin
pub async fn create_points_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<PlaceResponse> {
    place(state, payload, PaymentType::Points, OrderSource::Direct).await
}

/// 积分购物车下单
///
/// POST /api/v1/pesanan-app/poin-cart
pub async fn create_points_cart_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<PlaceResponse> {
    place(state, payload, PaymentType::Points, OrderSource::Cart).await
}

/// 解析、校验后交给下单服务；新订单返回 201，幂等重放返回 200
async fn place(
    state: AppState,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
    payment_type: PaymentType,
    source: OrderSource,
) -> Result<PlaceResponse> {
    let Json(req) = payload?;
    req.validate()?;

    let command = req.into_command(payment_type, source)?;
    let placed = state.orders.place_order(command).await?;

    let (status, message) = if placed.replayed {
        (StatusCode::OK, "Order already exists")
    } else {
        info!(
            order_id = placed.order.id,
            order_code = %placed.order.order_code,
            bonuses = placed.bonuses.len(),
            "订单已创建"
        );
        (StatusCode::CREATED, "Order created successfully")
    };

    let data = OrderWithItems {
        order: placed.order,
        items: placed.items,
    };

    Ok((status, Json(ApiResponse::success_with_message(data, message))))
}

/// 按幂等键查询订单
///
/// GET /api/v1/pesanan-app/check?idempotencyKey=
pub async fn check_order(
    State(state): State<AppState>,
    Query(query): Query<CheckOrderQuery>,
) -> Result<Json<ApiResponse<Order>>> {
    let key = query
        .idempotency_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("idempotencyKey is required".to_string()))?;

    let order = state.orders.check_order(&key).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 获取订单详情（含明细）
///
/// GET /api/v1/pesanan-app/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderWithItems>>> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 用户订单列表，按创建时间倒序
///
/// GET /api/v1/pesanan-app/user/{userId}
pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = state.orders.list_user_orders(user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 用户已送达订单
///
/// GET /api/v1/pesanan-app/user-delivered/{userId}
pub async fn list_delivered_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = state.orders.list_delivered_orders(user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 更新订单状态
///
/// PUT /api/v1/pesanan/{id}
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<UpdateOrderStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Order>>> {
    let Json(req) = payload?;
    let status: OrderStatus = req.status.trim().to_lowercase().parse()?;

    let order = state.orders.update_status(id, status).await?;
    Ok(Json(ApiResponse::success_with_message(
        order,
        "Order status updated successfully",
    )))
}

/// 删除订单及其明细
///
/// DELETE /api/v1/pesanan/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::<()>::success_empty(
        "Order deleted successfully",
    )))
}
