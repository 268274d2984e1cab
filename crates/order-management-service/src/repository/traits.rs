//! 仓储 Trait 定义
//!
//! 服务层通过这些接口访问下单流程之外的数据源，便于替换与 mock 测试

use async_trait::async_trait;

use crate::error::Result;

/// 积分兑换比例查询
///
/// 返回每 1 积分对应的货币金额；未配置时返回 `None`，
/// 配置值不是整数时返回 `OrderError::InvalidPointRate`。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointRateProvider: Send + Sync {
    async fn current_rate(&self) -> Result<Option<i64>>;
}

/// FCM token 存储
///
/// 推送渠道发现 token 失效时清除
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FcmTokenStore: Send + Sync {
    async fn clear_fcm_token(&self, user_id: i64) -> Result<()>;
}
