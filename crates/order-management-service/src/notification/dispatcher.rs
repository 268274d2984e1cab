//! 通知派发
//!
//! 业务服务在事务提交后把任务放入有界队列，由后台 worker 逐个发送。
//! 队列已满或 worker 已退出时任务被丢弃并记录日志，不阻塞调用方。

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use commerce_shared::observability::metrics;
use commerce_shared::retry::{RetryPolicy, retry_with_policy};

use super::channels::{ChatNotifier, PushGateway};
use super::template;
use super::types::{NotificationJob, PushMessage};
use crate::error::OrderError;
use crate::repository::FcmTokenStore;

const PUSH_CHANNEL: &str = "push";
const CHAT_CHANNEL: &str = "telegram";

/// 通知任务入口
///
/// 可廉价克隆，注入到各业务服务
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<NotificationJob>,
}

impl NotificationDispatcher {
    /// 创建派发器与对应的接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// 投递任务，返回是否入队成功
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let kind = job.kind();
        let order_id = job.order_id();

        match self.sender.try_send(job) {
            Ok(()) => {
                debug!(kind, order_id, "通知任务已入队");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, order_id, "通知队列已满，丢弃任务");
                metrics::record_notification("queue", "dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(kind, order_id, "通知 worker 已停止，丢弃任务");
                metrics::record_notification("queue", "closed");
                false
            }
        }
    }
}

/// 通知发送 worker
///
/// 未配置的渠道为 `None`，对应消息直接跳过
pub struct NotificationWorker {
    push: Option<Arc<dyn PushGateway>>,
    chat: Option<Arc<dyn ChatNotifier>>,
    tokens: Arc<dyn FcmTokenStore>,
    retry: RetryPolicy,
    admin_order_url: String,
}

impl NotificationWorker {
    pub fn new(
        push: Option<Arc<dyn PushGateway>>,
        chat: Option<Arc<dyn ChatNotifier>>,
        tokens: Arc<dyn FcmTokenStore>,
        retry: RetryPolicy,
        admin_order_url: impl Into<String>,
    ) -> Self {
        Self {
            push,
            chat,
            tokens,
            retry,
            admin_order_url: admin_order_url.into(),
        }
    }

    /// 消费队列直到所有发送端被释放
    pub async fn run(self, mut receiver: mpsc::Receiver<NotificationJob>) {
        info!(
            push_enabled = self.push.is_some(),
            chat_enabled = self.chat.is_some(),
            "通知 worker 启动"
        );

        while let Some(job) = receiver.recv().await {
            self.handle(job).await;
        }

        info!("通知队列已关闭，worker 退出");
    }

    /// 处理单个任务，所有失败只记录不返回
    #[instrument(skip(self, job), fields(kind = job.kind(), order_id = job.order_id()))]
    pub async fn handle(&self, job: NotificationJob) {
        match &job {
            NotificationJob::OrderPlaced(notice) => {
                if let Some(message) = template::order_placed_push(notice) {
                    self.deliver_push(notice.order.user_id, message).await;
                }
                let text = template::telegram_order_message(notice, &self.admin_order_url);
                self.deliver_chat(&text).await;
            }
            NotificationJob::StatusChanged(notice) => {
                if let Some(message) = template::status_changed_push(notice) {
                    self.deliver_push(notice.user_id, message).await;
                }
            }
        }
    }

    // ==================== 私有方法 ====================

    async fn deliver_push(&self, user_id: i64, message: PushMessage) {
        let Some(push) = &self.push else {
            metrics::record_notification(PUSH_CHANNEL, "skipped");
            return;
        };

        if !push.is_token_valid(&message.token).await {
            warn!(user_id, "FCM token 已失效，清除");
            metrics::record_notification(PUSH_CHANNEL, "invalid_token");
            if let Err(e) = self.tokens.clear_fcm_token(user_id).await {
                error!(user_id, error = %e, "清除 FCM token 失败");
            }
            return;
        }

        let result = retry_with_policy(
            &self.retry,
            "fcm_push",
            OrderError::is_retryable,
            || push.send(&message),
        )
        .await;

        match result {
            Ok(()) => {
                info!(user_id, title = %message.title, "推送已发送");
                metrics::record_notification(PUSH_CHANNEL, "sent");
            }
            Err(e) => {
                error!(user_id, error = %e, "推送发送失败");
                metrics::record_notification(PUSH_CHANNEL, "failed");
            }
        }
    }

    async fn deliver_chat(&self, text: &str) {
        let Some(chat) = &self.chat else {
            metrics::record_notification(CHAT_CHANNEL, "skipped");
            return;
        };

        let result = retry_with_policy(
            &self.retry,
            "telegram_broadcast",
            OrderError::is_retryable,
            || chat.broadcast(text),
        )
        .await;

        match result {
            Ok(delivered) => {
                info!(delivered, "运营群通知已发送");
                metrics::record_notification(CHAT_CHANNEL, "sent");
            }
            Err(e) => {
                error!(error = %e, "运营群通知发送失败");
                metrics::record_notification(CHAT_CHANNEL, "failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use mockall::predicate::eq;

    use crate::models::{Order, OrderItem, OrderStatus, PaymentType};
    use crate::notification::channels::{MockChatNotifier, MockPushGateway};
    use crate::notification::types::{CustomerContact, OrderPlacedNotice, StatusChangedNotice};
    use crate::repository::MockFcmTokenStore;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    fn placed_job(token: Option<&str>) -> NotificationJob {
        let now = Utc::now();
        NotificationJob::OrderPlaced(OrderPlacedNotice {
            order: Order {
                id: 11,
                order_code: "GSAAAA1111".into(),
                idempotency_key: "k".into(),
                user_id: 5,
                invoice_number: "INV".into(),
                payment_method: "COD".into(),
                payment_type: PaymentType::Cod,
                price_total: 200_000,
                point_total: 0,
                shipping_cost: 0,
                grand_total: 200_000,
                payment_status: PaymentType::Cod.initial_payment_status(),
                status: OrderStatus::Pending,
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: 1,
                order_id: 11,
                product_item_id: 3,
                product_name: "Kangkung".into(),
                unit_price: 100_000,
                quantity: 2,
                weight: 250,
                unit: "gr".into(),
                line_total: 200_000,
                created_at: now,
            }],
            customer: CustomerContact {
                fullname: Some("Sari Dewi".into()),
                phone_number: Some("0812".into()),
                fcm_token: token.map(String::from),
            },
        })
    }

    fn worker(
        push: Option<MockPushGateway>,
        chat: Option<MockChatNotifier>,
        tokens: MockFcmTokenStore,
    ) -> NotificationWorker {
        NotificationWorker::new(
            push.map(|p| Arc::new(p) as Arc<dyn PushGateway>),
            chat.map(|c| Arc::new(c) as Arc<dyn ChatNotifier>),
            Arc::new(tokens),
            fast_retry(),
            "https://admin.example.com/orders",
        )
    }

    #[tokio::test]
    async fn test_order_placed_sends_push_and_chat() {
        let mut push = MockPushGateway::new();
        push.expect_is_token_valid()
            .with(eq("tok-1"))
            .times(1)
            .returning(|_| true);
        push.expect_send()
            .withf(|m| m.token == "tok-1" && m.title == "Hai Sari, Pesanan COD Berhasil 🎉")
            .times(1)
            .returning(|_| Ok(()));

        let mut chat = MockChatNotifier::new();
        chat.expect_broadcast()
            .withf(|text| {
                text.starts_with("🛒 <b>ORDER BARUU #GSAAAA1111</b>")
                    && text.contains("https://admin.example.com/orders/11")
            })
            .times(1)
            .returning(|_| Ok(2));

        let mut tokens = MockFcmTokenStore::new();
        tokens.expect_clear_fcm_token().never();

        worker(Some(push), Some(chat), tokens)
            .handle(placed_job(Some("tok-1")))
            .await;
    }

    #[tokio::test]
    async fn test_invalid_token_is_cleared_and_push_skipped() {
        let mut push = MockPushGateway::new();
        push.expect_is_token_valid().times(1).returning(|_| false);
        push.expect_send().never();

        let mut chat = MockChatNotifier::new();
        chat.expect_broadcast().times(1).returning(|_| Ok(1));

        let mut tokens = MockFcmTokenStore::new();
        tokens
            .expect_clear_fcm_token()
            .with(eq(5_i64))
            .times(1)
            .returning(|_| Ok(()));

        worker(Some(push), Some(chat), tokens)
            .handle(placed_job(Some("stale")))
            .await;
    }

    #[tokio::test]
    async fn test_missing_token_skips_push() {
        let mut push = MockPushGateway::new();
        push.expect_is_token_valid().never();
        push.expect_send().never();

        let mut chat = MockChatNotifier::new();
        chat.expect_broadcast().times(1).returning(|_| Ok(1));

        worker(Some(push), Some(chat), MockFcmTokenStore::new())
            .handle(placed_job(None))
            .await;
    }

    #[tokio::test]
    async fn test_transient_push_failure_is_retried() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let mut push = MockPushGateway::new();
        push.expect_is_token_valid().returning(|_| true);
        push.expect_send().times(3).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(OrderError::Notification("503".into()))
            } else {
                Ok(())
            }
        });

        worker(Some(push), None, MockFcmTokenStore::new())
            .handle(placed_job(Some("tok")))
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_chat_failure_gives_up_after_retries() {
        let mut chat = MockChatNotifier::new();
        // 首次 + 3 次重试
        chat.expect_broadcast()
            .times(4)
            .returning(|_| Err(OrderError::Notification("unreachable".into())));

        worker(None, Some(chat), MockFcmTokenStore::new())
            .handle(placed_job(Some("tok")))
            .await;
    }

    #[tokio::test]
    async fn test_status_change_only_pushes() {
        let mut push = MockPushGateway::new();
        push.expect_is_token_valid().returning(|_| true);
        push.expect_send()
            .withf(|m| m.body == "Pesanan Anda sekarang dalam status: Completed")
            .times(1)
            .returning(|_| Ok(()));

        let mut chat = MockChatNotifier::new();
        chat.expect_broadcast().never();

        let job = NotificationJob::StatusChanged(StatusChangedNotice {
            order_id: 11,
            order_code: "GSAAAA1111".into(),
            user_id: 5,
            status: OrderStatus::Completed,
            fcm_token: Some("tok".into()),
        });

        worker(Some(push), Some(chat), MockFcmTokenStore::new())
            .handle(job)
            .await;
    }

    #[tokio::test]
    async fn test_enqueue_drops_when_full() {
        let (dispatcher, _receiver) = NotificationDispatcher::channel(1);
        assert!(dispatcher.enqueue(placed_job(None)));
        assert!(!dispatcher.enqueue(placed_job(None)));
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_stopped() {
        let (dispatcher, receiver) = NotificationDispatcher::channel(4);
        drop(receiver);
        assert!(!dispatcher.enqueue(placed_job(None)));
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_closed() {
        let mut chat = MockChatNotifier::new();
        chat.expect_broadcast().times(2).returning(|_| Ok(1));

        let (dispatcher, receiver) = NotificationDispatcher::channel(8);
        assert!(dispatcher.enqueue(placed_job(None)));
        assert!(dispatcher.enqueue(placed_job(None)));
        drop(dispatcher);

        let handle = tokio::spawn(worker(None, Some(chat), MockFcmTokenStore::new()).run(receiver));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should exit once the queue is closed")
            .unwrap();
    }
}
