//! 通知渠道
//!
//! - **PushGateway**: 用户设备推送（FCM）
//! - **ChatNotifier**: 运营群消息（Telegram）

mod fcm;
mod telegram;

pub use fcm::FcmPushGateway;
pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use super::types::PushMessage;
use crate::error::Result;

/// 设备推送网关
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// 校验 token 是否仍然有效
    ///
    /// 只有确认失效时返回 false，网络故障等无法判断的情况视为有效
    async fn is_token_valid(&self, token: &str) -> bool;

    /// 发送推送，失败返回 `OrderError::Notification`
    async fn send(&self, message: &PushMessage) -> Result<()>;
}

/// 运营群消息
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// 向所有配置的会话广播，返回成功送达的会话数
    ///
    /// 全部失败时返回错误
    async fn broadcast(&self, text: &str) -> Result<usize>;
}
