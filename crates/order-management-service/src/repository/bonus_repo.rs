//! 推荐奖励仓储
//!
//! 奖励记录与用户累计奖励的数据访问

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{AffiliateBonus, BonusStatus, NewAffiliateBonus, OrderStatus, TotalBonus};

const BONUS_COLUMNS: &str = r#"
    id, user_id, referral_user_id, order_id, bonus_amount, bonus_level, status,
    expiry_date, bonus_received_at, claimed_at, transferred_at, created_at, updated_at
"#;

/// 推荐奖励仓储
pub struct BonusRepository {
    pool: PgPool,
}

impl BonusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 用户已领取奖励金额合计
    pub async fn sum_claimed(&self, user_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(bonus_amount), 0)::BIGINT
            FROM affiliate_bonuses
            WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(BonusStatus::Claimed)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// 待领取且来源订单已送达的奖励，按到期时间升序
    pub async fn list_pending_delivered(&self, user_id: i64) -> Result<Vec<AffiliateBonus>> {
        let bonuses = sqlx::query_as::<_, AffiliateBonus>(
            r#"
            SELECT b.id, b.user_id, b.referral_user_id, b.order_id, b.bonus_amount,
                   b.bonus_level, b.status, b.expiry_date, b.bonus_received_at,
                   b.claimed_at, b.transferred_at, b.created_at, b.updated_at
            FROM affiliate_bonuses b
            JOIN orders o ON o.id = b.order_id
            WHERE b.user_id = $1 AND b.status = $2 AND o.status = $3
            ORDER BY b.expiry_date ASC, b.id ASC
            "#,
        )
        .bind(user_id)
        .bind(BonusStatus::Pending)
        .bind(OrderStatus::Delivered)
        .fetch_all(&self.pool)
        .await?;

        Ok(bonuses)
    }

    pub async fn list_by_status(
        &self,
        user_id: i64,
        status: BonusStatus,
    ) -> Result<Vec<AffiliateBonus>> {
        let bonuses = sqlx::query_as::<_, AffiliateBonus>(&format!(
            r#"
            SELECT {BONUS_COLUMNS} FROM affiliate_bonuses
            WHERE user_id = $1 AND status = $2
            ORDER BY expiry_date DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(bonuses)
    }

    pub async fn list_by_order(&self, order_id: i64) -> Result<Vec<AffiliateBonus>> {
        let bonuses = sqlx::query_as::<_, AffiliateBonus>(&format!(
            "SELECT {BONUS_COLUMNS} FROM affiliate_bonuses WHERE order_id = $1 ORDER BY bonus_level"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bonuses)
    }

    /// 将所有超期的待领取奖励批量标记为过期
    ///
    /// 返回受影响的行数
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE affiliate_bonuses
            SET status = $1, updated_at = NOW()
            WHERE status = $2 AND expiry_date < $3
            "#,
        )
        .bind(BonusStatus::Expired)
        .bind(BonusStatus::Pending)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    // ==================== 事务操作 ====================

    pub async fn create_in_tx(
        tx: &mut PgConnection,
        bonus: &NewAffiliateBonus,
    ) -> Result<AffiliateBonus> {
        let created = sqlx::query_as::<_, AffiliateBonus>(&format!(
            r#"
            INSERT INTO affiliate_bonuses (
                user_id, referral_user_id, order_id, bonus_amount, bonus_level,
                status, expiry_date, bonus_received_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BONUS_COLUMNS}
            "#
        ))
        .bind(bonus.user_id)
        .bind(bonus.referral_user_id)
        .bind(bonus.order_id)
        .bind(bonus.bonus_amount)
        .bind(bonus.bonus_level)
        .bind(BonusStatus::Pending)
        .bind(bonus.expiry_date)
        .bind(bonus.bonus_received_at)
        .fetch_one(tx)
        .await?;

        Ok(created)
    }

    /// 在事务中获取奖励（带行级锁）
    pub async fn get_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<AffiliateBonus>> {
        let bonus = sqlx::query_as::<_, AffiliateBonus>(&format!(
            "SELECT {BONUS_COLUMNS} FROM affiliate_bonuses WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(bonus)
    }

    pub async fn mark_expired_in_tx(tx: &mut PgConnection, id: i64) -> Result<()> {
        sqlx::query("UPDATE affiliate_bonuses SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(BonusStatus::Expired)
            .execute(tx)
            .await?;

        Ok(())
    }

    pub async fn mark_claimed_in_tx(
        tx: &mut PgConnection,
        id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<AffiliateBonus> {
        let bonus = sqlx::query_as::<_, AffiliateBonus>(&format!(
            r#"
            UPDATE affiliate_bonuses
            SET status = $2, claimed_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {BONUS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(BonusStatus::Claimed)
        .bind(claimed_at)
        .fetch_one(tx)
        .await?;

        Ok(bonus)
    }

    pub async fn mark_transferred_in_tx(
        tx: &mut PgConnection,
        id: i64,
        transferred_at: DateTime<Utc>,
    ) -> Result<AffiliateBonus> {
        let bonus = sqlx::query_as::<_, AffiliateBonus>(&format!(
            r#"
            UPDATE affiliate_bonuses
            SET status = $2, transferred_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {BONUS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(BonusStatus::Transferred)
        .bind(transferred_at)
        .fetch_one(tx)
        .await?;

        Ok(bonus)
    }

    /// 在事务中获取用户累计奖励（不存在时先创建，带行级锁）
    pub async fn get_or_create_total_for_update_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
    ) -> Result<TotalBonus> {
        sqlx::query(
            r#"
            INSERT INTO total_bonuses (user_id, total_bonus)
            VALUES ($1, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let total = sqlx::query_as::<_, TotalBonus>(
            r#"
            SELECT id, user_id, total_bonus, updated_at
            FROM total_bonuses
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(total)
    }

    pub async fn add_to_total_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        amount: i64,
    ) -> Result<TotalBonus> {
        let total = sqlx::query_as::<_, TotalBonus>(
            r#"
            UPDATE total_bonuses
            SET total_bonus = total_bonus + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING id, user_id, total_bonus, updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(tx)
        .await?;

        Ok(total)
    }
}
