//! 奖励过期扫描 Worker
//!
//! 按 cron 表达式（默认每天 0 点）将超期未领取的奖励批量标记为 expired。
//! 扫描是单条 UPDATE，多实例同时执行也只会生效一次。

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use commerce_shared::observability::metrics;
use cron::Schedule;
use order_management::BonusService;
use tracing::{error, info, warn};

const WORKER_NAME: &str = "bonus_expiry_worker";

pub struct BonusExpiryWorker {
    bonuses: Arc<BonusService>,
    expression: String,
    schedule: Schedule,
}

impl BonusExpiryWorker {
    /// 创建 Worker，cron 表达式为六段式（秒 分 时 日 月 周）
    pub fn new(
        bonuses: Arc<BonusService>,
        cron_expression: &str,
    ) -> Result<Self, cron::error::Error> {
        let schedule = Schedule::from_str(cron_expression)?;
        Ok(Self {
            bonuses,
            expression: cron_expression.to_string(),
            schedule,
        })
    }

    /// after 之后的下一个执行时间
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// 主循环：等待下一个调度点后执行一次扫描
    pub async fn run(&self) {
        info!(cron = %self.expression, "BonusExpiryWorker 已启动");

        loop {
            let now = Utc::now();
            let Some(next) = self.next_run_after(now) else {
                warn!("cron 表达式没有后续执行时间，Worker 退出");
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            self.run_once(Utc::now()).await;
        }
    }

    /// 执行一次扫描，失败只记录日志，等待下一个调度点
    pub async fn run_once(&self, now: DateTime<Utc>) -> Option<u64> {
        let result = match self.bonuses.expire_overdue(now).await {
            Ok(expired) => {
                info!(expired, "奖励过期扫描完成");
                Some(expired)
            }
            Err(e) => {
                error!(error = %e, "奖励过期扫描失败");
                None
            }
        };

        metrics::set_worker_last_run(WORKER_NAME);
        result
    }
}
