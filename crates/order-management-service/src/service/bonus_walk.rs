//! 推荐链奖励生成
//!
//! 从下单用户的推荐人开始逐级向上，每到达一级生成一条待领取奖励。
//! 在下单事务内执行，任一奖励写入失败会导致整个订单回滚。

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{debug, warn};

use super::policy::BonusPolicy;
use crate::error::Result;
use crate::models::{AffiliateBonus, NewAffiliateBonus, User};
use crate::repository::{BonusRepository, UserRepository};

/// 为订单沿推荐链生成奖励
///
/// 推荐人不存在、层级用尽或遇到已访问过的用户（推荐环）时停止遍历。
pub async fn create_referral_bonuses(
    conn: &mut PgConnection,
    policy: &BonusPolicy,
    purchaser: &User,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<AffiliateBonus>> {
    let mut created = Vec::new();
    let mut visited = HashSet::from([purchaser.id]);
    let mut referrer_id = purchaser.referred_by;
    let mut level = 1;

    while level <= policy.max_level() {
        let Some(current_id) = referrer_id else {
            break;
        };

        if !visited.insert(current_id) {
            warn!(
                purchaser_id = purchaser.id,
                referrer_id = current_id,
                level,
                "推荐链存在环，停止生成奖励"
            );
            break;
        }

        let Some(referrer) = UserRepository::get_user_in_tx(&mut *conn, current_id).await? else {
            debug!(referrer_id = current_id, level, "推荐人不存在，停止生成奖励");
            break;
        };

        let Some(amount) = policy.bonus_for_level(level) else {
            break;
        };

        let bonus = BonusRepository::create_in_tx(
            &mut *conn,
            &NewAffiliateBonus {
                user_id: referrer.id,
                referral_user_id: purchaser.id,
                order_id,
                bonus_amount: amount,
                bonus_level: level,
                expiry_date: policy.expiry_from(now),
                bonus_received_at: now,
            },
        )
        .await?;

        debug!(
            bonus_id = bonus.id,
            beneficiary_id = referrer.id,
            level,
            amount,
            "推荐奖励已生成"
        );

        created.push(bonus);
        referrer_id = referrer.referred_by;
        level += 1;
    }

    Ok(created)
}
