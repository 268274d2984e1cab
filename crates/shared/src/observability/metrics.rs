//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("orders_placed_total", "Order placement attempts by outcome");
    metrics::describe_histogram!(
        "order_placement_duration_seconds",
        "Order placement duration in seconds"
    );

    metrics::describe_counter!(
        "affiliate_bonuses_created_total",
        "Affiliate bonus rows created by referral level"
    );
    metrics::describe_counter!("bonus_claims_total", "Bonus claim attempts by outcome");
    metrics::describe_counter!("bonuses_expired_total", "Bonuses moved to expired by the sweep");

    metrics::describe_counter!("notifications_total", "Notification deliveries by channel");
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last background worker run"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录下单结果
///
/// status 取值：created / replayed / rejected / failed
#[inline]
pub fn record_order_placement(payment: &str, source: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "orders_placed_total",
        "payment" => payment.to_string(),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "order_placement_duration_seconds",
        "payment" => payment.to_string()
    )
    .record(duration_secs);
}

/// 记录推荐奖励创建
#[inline]
pub fn record_bonus_created(level: i32) {
    metrics::counter!("affiliate_bonuses_created_total", "level" => level.to_string()).increment(1);
}

/// 记录奖励领取结果
#[inline]
pub fn record_bonus_claim(status: &str) {
    metrics::counter!("bonus_claims_total", "status" => status.to_string()).increment(1);
}

/// 记录过期扫描处理数量
#[inline]
pub fn record_bonus_expiration(count: u64) {
    metrics::counter!("bonuses_expired_total").increment(count);
}

/// 记录通知投递
#[inline]
pub fn record_notification(channel: &str, status: &str) {
    metrics::counter!(
        "notifications_total",
        "channel" => channel.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录后台 Worker 最近一次运行时间
#[inline]
pub fn set_worker_last_run(worker: &str) {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string()).set(now);
}
