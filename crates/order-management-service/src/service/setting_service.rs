//! 配置项服务
//!
//! 目前只有积分兑换比例（每 1 积分对应的货币金额）

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{OrderError, Result};
use crate::models::POINT_RATE_KEY;
use crate::repository::{PointRateProvider, SettingRepository};

pub struct SettingService {
    repo: Arc<SettingRepository>,
}

impl SettingService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Arc::new(SettingRepository::new(pool)),
        }
    }

    /// 共享给下单服务的兑换比例查询
    pub fn point_rate_provider(&self) -> Arc<dyn PointRateProvider> {
        self.repo.clone()
    }

    #[instrument(skip(self))]
    pub async fn get_point_rate(&self) -> Result<i64> {
        self.repo
            .current_rate()
            .await?
            .ok_or(OrderError::PointRateNotFound)
    }

    #[instrument(skip(self))]
    pub async fn set_point_rate(&self, rate: i64) -> Result<i64> {
        if rate <= 0 {
            return Err(OrderError::NonPositivePointRate);
        }

        self.repo.upsert(POINT_RATE_KEY, &rate.to_string()).await?;
        info!(rate, "积分兑换比例已更新");
        Ok(rate)
    }
}
