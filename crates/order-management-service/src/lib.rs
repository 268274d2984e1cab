//! 订单与推荐奖励管理服务
//!
//! 下单、库存扣减、积分支付以及两级推荐奖励的核心业务逻辑。
//!
//! ## 核心功能
//!
//! - **幂等下单**：同一幂等键只会生成一笔订单，重试返回原订单
//! - **库存扣减**：下单事务内锁定并扣减可售规格库存
//! - **积分支付**：积分订单在同一事务内扣减用户积分
//! - **推荐奖励**：订单达到门槛时沿推荐链最多向上两级生成待领取奖励
//! - **奖励领取**：领取时校验归属、有效期与累计上限
//! - **过期扫描**：将超期未领取的奖励批量标记为过期
//! - **通知发送**：事务提交后异步推送 FCM 与 Telegram 通知
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `notification`: 通知模板、渠道与异步派发

pub mod error;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;

pub use error::{OrderError, Result};
pub use models::*;
pub use notification::{
    ChatNotifier, FcmPushGateway, NotificationDispatcher, NotificationJob, NotificationWorker,
    PushGateway, TelegramNotifier,
};
pub use repository::{
    BonusRepository, FcmTokenStore, InventoryRepository, OrderRepository, PointRateProvider,
    SettingRepository, UserRepository,
};
pub use service::{BonusPolicy, BonusService, OrderService, SettingService, dto};
