//! 推荐奖励实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::BonusStatus;

/// 推荐奖励
///
/// 被推荐用户的订单达到门槛时，为推荐链上的用户生成的一笔待领取奖励
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateBonus {
    pub id: i64,
    /// 受益人
    pub user_id: i64,
    /// 下单的被推荐用户
    pub referral_user_id: i64,
    pub order_id: i64,
    pub bonus_amount: i64,
    /// 1 为直接推荐人，2 为推荐人的推荐人
    pub bonus_level: i32,
    pub status: BonusStatus,
    pub expiry_date: DateTime<Utc>,
    pub bonus_received_at: DateTime<Utc>,
    #[sqlx(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub transferred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AffiliateBonus {
    /// 是否已超过有效期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }

    /// 是否仍可领取
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BonusStatus::Pending && !self.is_expired_at(now)
    }
}

/// 待插入的推荐奖励
#[derive(Debug, Clone)]
pub struct NewAffiliateBonus {
    pub user_id: i64,
    pub referral_user_id: i64,
    pub order_id: i64,
    pub bonus_amount: i64,
    pub bonus_level: i32,
    pub expiry_date: DateTime<Utc>,
    pub bonus_received_at: DateTime<Utc>,
}

/// 用户累计已领取奖励
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TotalBonus {
    pub id: i64,
    pub user_id: i64,
    pub total_bonus: i64,
    pub updated_at: DateTime<Utc>,
}
