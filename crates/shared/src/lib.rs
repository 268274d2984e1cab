//! 共享基础设施库
//!
//! 订单服务各 crate 共用的配置加载、数据库连接池、基础错误、
//! 可观测性（日志、Prometheus 指标、HTTP 中间件）与重试策略。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod retry;
