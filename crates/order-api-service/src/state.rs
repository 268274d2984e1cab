//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use commerce_shared::database::Database;
use order_management::{BonusService, OrderService, SettingService};

/// Axum 应用共享状态
///
/// 各服务通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub orders: Arc<OrderService>,
    pub bonuses: Arc<BonusService>,
    pub settings: Arc<SettingService>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(
        db: Database,
        orders: Arc<OrderService>,
        bonuses: Arc<BonusService>,
        settings: Arc<SettingService>,
    ) -> Self {
        Self {
            db,
            orders,
            bonuses,
            settings,
        }
    }
}
