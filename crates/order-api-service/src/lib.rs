//! 订单 API 服务
//!
//! 对移动端与运营后台暴露下单、订单查询、推荐奖励与积分汇率的 REST API，
//! 并在进程内运行奖励过期扫描。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: HTTP 错误映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//! - `worker`: 后台定时任务

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod worker;

pub use dto::ApiResponse;
pub use error::{ApiError, Result};
pub use state::AppState;
