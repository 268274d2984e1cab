//! 配置项仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PointRateProvider;
use crate::error::{OrderError, Result};
use crate::models::{POINT_RATE_KEY, Setting};

/// 配置项仓储
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Setting>> {
        let setting = sqlx::query_as::<_, Setting>(
            "SELECT key, value, updated_at FROM settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(setting)
    }

    /// 写入配置项，已存在则覆盖
    pub async fn upsert(&self, key: &str, value: &str) -> Result<Setting> {
        let setting = sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(setting)
    }
}

/// 解析积分兑换比例的存储值
pub(crate) fn parse_point_rate(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| OrderError::InvalidPointRate(raw.to_string()))
}

#[async_trait]
impl PointRateProvider for SettingRepository {
    async fn current_rate(&self) -> Result<Option<i64>> {
        self.get(POINT_RATE_KEY)
            .await?
            .map(|setting| parse_point_rate(&setting.value))
            .transpose()
    }
}
