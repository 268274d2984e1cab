//! 通知模块
//!
//! 订单事务提交后的用户推送与运营群消息。
//!
//! ## 功能特性
//!
//! - **异步派发**：业务侧只把任务放入有界队列，不等待发送结果
//! - **重试退避**：瞬时故障按指数退避重试
//! - **失效 token 清理**：推送前校验 FCM token，失效即清除
//! - **失败隔离**：任何发送失败只记录日志与指标，不影响订单
//!
//! ## 使用示例
//!
//! ```ignore
//! let (dispatcher, receiver) = NotificationDispatcher::channel(1024);
//! tokio::spawn(worker.run(receiver));
//!
//! dispatcher.enqueue(NotificationJob::OrderPlaced(notice));
//! ```

pub mod channels;
pub mod dispatcher;
pub mod template;
pub mod types;

pub use channels::{ChatNotifier, FcmPushGateway, PushGateway, TelegramNotifier};
pub use dispatcher::{NotificationDispatcher, NotificationWorker};
pub use types::{
    CustomerContact, NotificationJob, OrderPlacedNotice, PushMessage, StatusChangedNotice,
};
