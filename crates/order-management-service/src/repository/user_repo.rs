//! 用户仓储
//!
//! 用户资料、推荐关系、积分余额与 FCM token

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::traits::FcmTokenStore;
use crate::error::Result;
use crate::models::{User, UserPoints, UserProfile};

const PROFILE_QUERY: &str = r#"
    SELECT u.id, u.referred_by, u.fcm_token, d.fullname, d.phone_number
    FROM users u
    LEFT JOIN user_details d ON d.user_id = u.id
    WHERE u.id = $1
"#;

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(PROFILE_QUERY)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn clear_fcm_token(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET fcm_token = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== 事务操作 ====================

    pub async fn get_profile_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(PROFILE_QUERY)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(profile)
    }

    /// 在事务中读取推荐链节点
    pub async fn get_user_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, referred_by FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(user)
    }

    /// 在事务中获取积分余额（带行级锁）
    pub async fn get_points_for_update_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
    ) -> Result<Option<UserPoints>> {
        let points = sqlx::query_as::<_, UserPoints>(
            "SELECT user_id, points FROM user_points WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(tx)
        .await?;

        Ok(points)
    }

    /// 在事务中扣减积分，返回扣减后的余额
    pub async fn deduct_points_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        amount: i64,
    ) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            UPDATE user_points
            SET points = points - $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING points
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(tx)
        .await?;

        Ok(balance)
    }
}

#[async_trait]
impl FcmTokenStore for UserRepository {
    async fn clear_fcm_token(&self, user_id: i64) -> Result<()> {
        UserRepository::clear_fcm_token(self, user_id).await
    }
}
