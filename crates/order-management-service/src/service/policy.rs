//! 推荐奖励规则
//!
//! 奖励基数、各级比例、下单门槛、累计上限与有效期集中在一处，
//! 由配置文件的 `bonus` 段构造。

use chrono::{DateTime, Duration, Months, Utc};

use commerce_shared::config::BonusConfig;

/// 积分订单低于该积分数时不读取兑换比例，直接视为未达门槛
pub const POINTS_RATE_LOOKUP_FLOOR: i64 = 200;

/// 比例以万分比表示
const BPS_DENOMINATOR: i64 = 10_000;

#[derive(Debug, Clone)]
pub struct BonusPolicy {
    base_amount: i64,
    level_bps: [i64; 2],
    qualifying_total: i64,
    cap: i64,
    expiry_months: u32,
}

impl Default for BonusPolicy {
    fn default() -> Self {
        Self::from_config(&BonusConfig::default())
    }
}

impl BonusPolicy {
    pub fn from_config(config: &BonusConfig) -> Self {
        Self {
            base_amount: config.base_amount,
            level_bps: [config.level_one_bps, config.level_two_bps],
            qualifying_total: config.qualifying_total,
            cap: config.cap,
            expiry_months: config.expiry_months,
        }
    }

    /// 推荐链最多向上遍历的层级
    pub fn max_level(&self) -> i32 {
        self.level_bps.len() as i32
    }

    /// 指定层级的奖励金额，超出层级返回 `None`
    pub fn bonus_for_level(&self, level: i32) -> Option<i64> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        let bps = self.level_bps.get(index)?;
        Some(self.base_amount * bps / BPS_DENOMINATOR)
    }

    /// 货到付款订单是否达到奖励门槛
    pub fn qualifies_cash(&self, grand_total: i64) -> bool {
        grand_total >= self.qualifying_total
    }

    /// 积分订单是否需要读取兑换比例
    pub fn needs_point_rate(&self, point_total: i64) -> bool {
        point_total >= POINTS_RATE_LOOKUP_FLOOR
    }

    /// 积分订单按兑换比例折算后是否达到奖励门槛
    pub fn qualifies_points(&self, point_total: i64, rate: i64) -> bool {
        point_total.saturating_mul(rate) >= self.qualifying_total
    }

    /// 奖励到期时间
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_months(Months::new(self.expiry_months))
            .unwrap_or_else(|| now + Duration::days(30 * i64::from(self.expiry_months)))
    }

    /// 领取后累计金额是否超过上限
    pub fn exceeds_cap(&self, current_total: i64, amount: i64) -> bool {
        current_total.saturating_add(amount) > self.cap
    }

    pub fn cap(&self) -> i64 {
        self.cap
    }
}
