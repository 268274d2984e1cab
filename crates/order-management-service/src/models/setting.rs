//! 键值配置项

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 每积分对应货币金额的配置键
pub const POINT_RATE_KEY: &str = "hargaPoin";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
