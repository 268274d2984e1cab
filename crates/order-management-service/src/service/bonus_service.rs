//! 推荐奖励服务
//!
//! 奖励领取、运营打款、查询与过期扫描。
//!
//! 领取在单个事务内完成：锁定奖励行与用户累计行，校验归属、状态、
//! 有效期与累计上限后同时更新两者。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use commerce_shared::observability::metrics;

use super::dto::ClaimResult;
use super::policy::BonusPolicy;
use crate::error::{OrderError, Result};
use crate::models::{AffiliateBonus, BonusStatus};
use crate::repository::BonusRepository;

/// 推荐奖励服务
pub struct BonusService {
    pool: PgPool,
    bonus_repo: Arc<BonusRepository>,
    policy: BonusPolicy,
}

impl BonusService {
    pub fn new(pool: PgPool, policy: BonusPolicy) -> Self {
        Self {
            bonus_repo: Arc::new(BonusRepository::new(pool.clone())),
            pool,
            policy,
        }
    }

    /// 领取奖励
    pub async fn claim(&self, bonus_id: i64, user_id: i64) -> Result<ClaimResult> {
        self.claim_at(bonus_id, user_id, Utc::now()).await
    }

    /// 以指定时间领取奖励
    ///
    /// 已过期的奖励会先被标记为过期并提交，再返回 `BonusExpired`。
    #[instrument(skip(self))]
    pub async fn claim_at(
        &self,
        bonus_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClaimResult> {
        let result = self.execute_claim(bonus_id, user_id, now).await;

        match &result {
            Ok(claimed) => {
                metrics::record_bonus_claim("claimed");
                info!(
                    amount = claimed.bonus.bonus_amount,
                    total_bonus = claimed.total_bonus.total_bonus,
                    "奖励领取成功"
                );
            }
            Err(OrderError::BonusExpired(_)) => {
                metrics::record_bonus_claim("expired");
                warn!("奖励已过期，领取失败");
            }
            Err(e) if e.is_business_error() => {
                metrics::record_bonus_claim("rejected");
                warn!(error = %e, "奖励领取被拒绝");
            }
            Err(_) => metrics::record_bonus_claim("failed"),
        }

        result
    }

    /// 运营打款：仅已领取的奖励可标记为已打款
    #[instrument(skip(self))]
    pub async fn transfer(&self, bonus_id: i64) -> Result<AffiliateBonus> {
        let mut tx = self.pool.begin().await?;

        let bonus = BonusRepository::get_for_update_in_tx(&mut tx, bonus_id)
            .await?
            .ok_or(OrderError::BonusNotFound(bonus_id))?;

        if bonus.status != BonusStatus::Claimed {
            return Err(OrderError::BonusNotClaimed(bonus_id));
        }

        let bonus = BonusRepository::mark_transferred_in_tx(&mut tx, bonus_id, Utc::now()).await?;
        tx.commit().await?;

        info!(user_id = bonus.user_id, amount = bonus.bonus_amount, "奖励已打款");
        Ok(bonus)
    }

    /// 用户已领取奖励合计
    #[instrument(skip(self))]
    pub async fn total_claimed(&self, user_id: i64) -> Result<i64> {
        self.bonus_repo.sum_claimed(user_id).await
    }

    /// 待领取且来源订单已送达的奖励
    #[instrument(skip(self))]
    pub async fn pending_bonuses(&self, user_id: i64) -> Result<Vec<AffiliateBonus>> {
        self.bonus_repo.list_pending_delivered(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn expired_bonuses(&self, user_id: i64) -> Result<Vec<AffiliateBonus>> {
        self.bonus_repo
            .list_by_status(user_id, BonusStatus::Expired)
            .await
    }

    /// 订单产生的奖励
    pub async fn bonuses_for_order(&self, order_id: i64) -> Result<Vec<AffiliateBonus>> {
        self.bonus_repo.list_by_order(order_id).await
    }

    /// 过期扫描：批量标记超期未领取的奖励
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let expired = self.bonus_repo.expire_overdue(now).await?;
        metrics::record_bonus_expiration(expired);
        info!(expired, "过期扫描完成");
        Ok(expired)
    }

    // ==================== 私有方法 ====================

    async fn execute_claim(
        &self,
        bonus_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ClaimResult> {
        let mut tx = self.pool.begin().await?;

        let bonus = BonusRepository::get_for_update_in_tx(&mut tx, bonus_id)
            .await?
            .ok_or(OrderError::BonusNotFound(bonus_id))?;

        check_claimable(&bonus, user_id)?;

        if bonus.is_expired_at(now) {
            BonusRepository::mark_expired_in_tx(&mut tx, bonus_id).await?;
            tx.commit().await?;
            return Err(OrderError::BonusExpired(bonus_id));
        }

        let total = BonusRepository::get_or_create_total_for_update_in_tx(&mut tx, user_id).await?;
        if self.policy.exceeds_cap(total.total_bonus, bonus.bonus_amount) {
            return Err(OrderError::BonusCapExceeded {
                cap: self.policy.cap(),
            });
        }

        let total_bonus =
            BonusRepository::add_to_total_in_tx(&mut tx, user_id, bonus.bonus_amount).await?;
        let bonus = BonusRepository::mark_claimed_in_tx(&mut tx, bonus_id, now).await?;

        tx.commit().await?;

        Ok(ClaimResult { bonus, total_bonus })
    }
}

/// 归属与状态校验
fn check_claimable(bonus: &AffiliateBonus, user_id: i64) -> Result<()> {
    if bonus.user_id != user_id {
        return Err(OrderError::BonusOwnershipMismatch {
            bonus_id: bonus.id,
            user_id,
        });
    }
    match bonus.status {
        BonusStatus::Pending => Ok(()),
        BonusStatus::Expired => Err(OrderError::BonusExpired(bonus.id)),
        BonusStatus::Claimed | BonusStatus::Transferred => {
            Err(OrderError::BonusNotPending(bonus.id))
        }
    }
}
