//! 服务层
//!
//! 实现下单与推荐奖励业务逻辑，协调仓储层与通知派发。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `policy`: 奖励规则常量与判定
//! - `bonus_walk`: 推荐链遍历与奖励生成
//! - `order_service`: 下单、查询与订单管理
//! - `bonus_service`: 奖励领取、打款与过期扫描
//! - `setting_service`: 积分兑换比例配置

pub mod bonus_service;
pub mod bonus_walk;
pub mod dto;
pub mod order_service;
pub mod policy;
pub mod setting_service;

pub use bonus_service::BonusService;
pub use order_service::OrderService;
pub use policy::BonusPolicy;
pub use setting_service::SettingService;
