//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::{handlers, state::AppState};

/// 移动端下单与订单查询路由
fn order_app_routes() -> Router<AppState> {
    Router::new()
        .route("/pesanan-app/cod", post(handlers::order::create_cod_order))
        .route(
            "/pesanan-app/cod-cart",
            post(handlers::order::create_cod_cart_order),
        )
        .route("/pesanan-app/poin", post(handlers::order::create_points_order))
        .route(
            "/pesanan-app/poin-cart",
            post(handlers::order::create_points_cart_order),
        )
        .route("/pesanan-app/check", get(handlers::order::check_order))
        .route("/pesanan-app/{id}", get(handlers::order::get_order))
        .route(
            "/pesanan-app/user/{user_id}",
            get(handlers::order::list_user_orders),
        )
        .route(
            "/pesanan-app/user-delivered/{user_id}",
            get(handlers::order::list_delivered_orders),
        )
}

/// 后台订单管理路由
fn order_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/pesanan/{id}", put(handlers::order::update_order_status))
        .route("/pesanan/{id}", delete(handlers::order::delete_order))
}

/// 推荐奖励路由
fn bonus_routes() -> Router<AppState> {
    Router::new()
        .route("/afiliasi-app/claim", post(handlers::bonus::claim_bonus))
        .route(
            "/afiliasi-app/total/{user_id}",
            get(handlers::bonus::get_total_bonus),
        )
        .route(
            "/afiliasi-app/pending/{user_id}",
            get(handlers::bonus::list_pending_bonuses),
        )
        .route(
            "/afiliasi-app/expired/{user_id}",
            get(handlers::bonus::list_expired_bonuses),
        )
        .route(
            "/afiliasi-bonus/{id}/transfer",
            patch(handlers::bonus::transfer_bonus),
        )
}

/// 配置项路由
fn setting_routes() -> Router<AppState> {
    Router::new().route(
        "/settings/harga-poin",
        get(handlers::setting::get_point_rate).post(handlers::setting::set_point_rate),
    )
}

/// 组装 /api/v1 下的全部业务路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(order_app_routes())
        .merge(order_admin_routes())
        .merge(bonus_routes())
        .merge(setting_routes())
}

/// 探针路由
pub fn probe_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use commerce_shared::database::Database;
    use http_body_util::BodyExt;
    use order_management::{
        BonusPolicy, BonusService, NotificationDispatcher, OrderService, SettingService,
    };
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use super::*;

    /// 使用惰性连接池构造状态，以下请求都在访问数据库之前返回
    fn app() -> Router {
        let pool = PgPool::connect_lazy("postgres://localhost/test").unwrap();
        let settings = Arc::new(SettingService::new(pool.clone()));
        let (dispatcher, _receiver) = NotificationDispatcher::channel(8);
        let orders = Arc::new(OrderService::new(
            pool.clone(),
            settings.point_rate_provider(),
            BonusPolicy::default(),
            dispatcher,
        ));
        let bonuses = Arc::new(BonusService::new(pool.clone(), BonusPolicy::default()));
        let state = AppState::new(Database::from_pool(pool), orders, bonuses, settings);

        Router::new()
            .nest("/api/v1", api_routes())
            .merge(probe_routes())
            .with_state(state)
    }

    async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_order_body_is_rejected() {
        for path in ["cod", "cod-cart", "poin", "poin-cart"] {
            let (status, body) = send(
                Method::POST,
                &format!("/api/v1/pesanan-app/{path}"),
                Some(json!({ "userId": "abc" })),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body["message"], "Invalid request format");
            assert_eq!(body["code"], "INVALID_REQUEST");
            assert!(body["details"].is_string());
        }
    }

    #[tokio::test]
    async fn test_order_validation_errors() {
        let (status, body) = send(
            Method::POST,
            "/api/v1/pesanan-app/cod",
            Some(json!({
                "userId": 1,
                "idempotencyKey": "",
                "metodePembayaran": "COD",
                "totalBayar": 10000,
                "items": []
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request format");
        assert!(
            body["details"]
                .as_str()
                .unwrap()
                .contains("idempotencyKey is required")
        );
    }

    #[tokio::test]
    async fn test_oversized_item_weight_is_rejected() {
        let (status, body) = send(
            Method::POST,
            "/api/v1/pesanan-app/cod",
            Some(json!({
                "userId": 1,
                "idempotencyKey": "key-weight",
                "metodePembayaran": "COD",
                "totalBayar": 10000,
                "items": [{
                    "productId": 1,
                    "namaProduk": "Beras",
                    "harga": 10000,
                    "jumlah": 1,
                    "berat": 5.0e9,
                    "totalHarga": 10000
                }]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request format");
        assert!(body["details"].as_str().unwrap().starts_with("berat:"));
    }

    #[tokio::test]
    async fn test_check_requires_idempotency_key() {
        let (status, body) = send(Method::GET, "/api/v1/pesanan-app/check", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "idempotencyKey is required");

        let (status, _) = send(
            Method::GET,
            "/api/v1/pesanan-app/check?idempotencyKey=",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_status() {
        let (status, body) = send(
            Method::PUT,
            "/api/v1/pesanan/1",
            Some(json!({ "status": "shipped" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ORDER_STATUS");
        assert_eq!(body["message"], "Invalid order status: shipped");
    }

    #[tokio::test]
    async fn test_claim_requires_both_ids() {
        let (status, body) = send(
            Method::POST,
            "/api/v1/afiliasi-app/claim",
            Some(json!({ "bonusId": 3 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request format");
    }

    #[tokio::test]
    async fn test_set_point_rate_rejects_non_numeric() {
        let (status, body) = send(
            Method::POST,
            "/api/v1/settings/harga-poin",
            Some(json!({ "hargaPoin": "seribu" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid hargaPoin value: seribu");
    }
}
