//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行类型安全的数据库操作
//! - 事务控制由调用方（服务层）决定，`_in_tx` 结尾的函数接收事务连接
//! - 服务层依赖的外部查询以 trait 暴露，支持 mock 测试

mod bonus_repo;
mod inventory_repo;
mod order_repo;
mod setting_repo;
mod traits;
mod user_repo;

pub use bonus_repo::BonusRepository;
pub use inventory_repo::InventoryRepository;
pub use order_repo::OrderRepository;
pub use setting_repo::SettingRepository;
pub use traits::*;
pub use user_repo::UserRepository;
