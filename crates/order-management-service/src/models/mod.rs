//! 订单服务领域模型
//!
//! 订单、库存规格、用户、推荐奖励与配置项实体

pub mod bonus;
pub mod enums;
pub mod inventory;
pub mod order;
pub mod setting;
pub mod user;

// 重新导出常用类型
pub use bonus::{AffiliateBonus, NewAffiliateBonus, TotalBonus};
pub use enums::{BonusStatus, OrderSource, OrderStatus, PaymentStatus, PaymentType};
pub use inventory::InventoryUnit;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems, generate_order_code};
pub use setting::{POINT_RATE_KEY, Setting};
pub use user::{User, UserPoints, UserProfile};
