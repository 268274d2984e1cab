//! 可观测性模块集成测试
//!
//! 使用本地 recorder 渲染 Prometheus 文本，验证指标名称与标签。

use commerce_shared::observability::metrics::{
    record_bonus_claim, record_bonus_created, record_bonus_expiration, record_notification,
    record_order_placement, set_worker_last_run,
};
use metrics_exporter_prometheus::PrometheusBuilder;

fn render(record: impl FnOnce()) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, record);
    handle.render()
}

#[test]
fn test_order_placement_labels() {
    let output = render(|| {
        record_order_placement("cod", "direct", "created", 0.05);
        record_order_placement("points", "cart", "rejected", 0.01);
    });

    assert!(output.contains("orders_placed_total"));
    assert!(output.contains("payment=\"cod\""));
    assert!(output.contains("source=\"cart\""));
    assert!(output.contains("status=\"rejected\""));
    assert!(output.contains("order_placement_duration_seconds"));
}

#[test]
fn test_bonus_metrics() {
    let output = render(|| {
        record_bonus_created(1);
        record_bonus_created(2);
        record_bonus_claim("claimed");
        record_bonus_expiration(4);
    });

    assert!(output.contains("affiliate_bonuses_created_total{level=\"1\"} 1"));
    assert!(output.contains("affiliate_bonuses_created_total{level=\"2\"} 1"));
    assert!(output.contains("bonus_claims_total{status=\"claimed\"} 1"));
    assert!(output.contains("bonuses_expired_total 4"));
}

#[test]
fn test_notification_and_worker_metrics() {
    let output = render(|| {
        record_notification("fcm", "sent");
        record_notification("telegram", "failed");
        set_worker_last_run("bonus_expiry_worker");
    });

    assert!(output.contains("channel=\"telegram\""));
    assert!(output.contains("worker_last_run_timestamp{worker=\"bonus_expiry_worker\"}"));
}
