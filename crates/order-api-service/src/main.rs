//! 订单 API 服务入口

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::HeaderValue, middleware};
use commerce_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
    retry::RetryPolicy,
};
use order_api_service::{routes, state::AppState, worker::BonusExpiryWorker};
use order_management::{
    BonusPolicy, BonusService, ChatNotifier, FcmPushGateway, FcmTokenStore,
    NotificationDispatcher, NotificationWorker, OrderService, PushGateway, SettingService,
    TelegramNotifier, UserRepository,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{info, warn};

const SERVICE_NAME: &str = "order-api-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_default();
    let _guard = observability::init(SERVICE_NAME, &config.observability).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let policy = BonusPolicy::from_config(&config.bonus);
    let settings = Arc::new(SettingService::new(db.pool().clone()));

    // 通知：事务提交后入队，由独立任务投递
    let notification = &config.notification;
    let (dispatcher, receiver) = NotificationDispatcher::channel(notification.queue_capacity);

    let push = FcmPushGateway::from_config(notification)?
        .map(|gateway| Arc::new(gateway) as Arc<dyn PushGateway>);
    if push.is_none() {
        warn!("FCM server key not configured, push notifications disabled");
    }
    let chat = TelegramNotifier::from_config(notification)?
        .map(|notifier| Arc::new(notifier) as Arc<dyn ChatNotifier>);
    if chat.is_none() {
        warn!("Telegram bot token or chat ids not configured, order messages disabled");
    }

    let tokens: Arc<dyn FcmTokenStore> = Arc::new(UserRepository::new(db.pool().clone()));
    let notification_worker = NotificationWorker::new(
        push,
        chat,
        tokens,
        RetryPolicy::with_max_retries(notification.max_retries),
        notification.admin_order_url.clone(),
    );
    tokio::spawn(notification_worker.run(receiver));

    let orders = Arc::new(OrderService::new(
        db.pool().clone(),
        settings.point_rate_provider(),
        policy.clone(),
        dispatcher,
    ));
    let bonuses = Arc::new(BonusService::new(db.pool().clone(), policy));

    // 奖励过期扫描
    let expiry_worker = BonusExpiryWorker::new(bonuses.clone(), &config.expiry.cron)
        .map_err(|e| anyhow::anyhow!("invalid expiry cron '{}': {}", config.expiry.cron, e))?;
    tokio::spawn(async move {
        expiry_worker.run().await;
    });

    let state = AppState::new(db.clone(), orders, bonuses, settings);

    let app = Router::new()
        .nest("/api/v1", routes::api_routes())
        .merge(routes::probe_routes())
        // handler panic 转为 500，未提交的事务随连接归还时回滚
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(cors_layer())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：ORDER_CORS_ORIGINS 为逗号分隔的来源列表，未设置或为 * 时放开
fn cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("ORDER_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    layer.allow_origin(origins)
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
