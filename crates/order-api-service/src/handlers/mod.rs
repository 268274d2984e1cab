//! HTTP 请求处理器模块

pub mod bonus;
pub mod health;
pub mod order;
pub mod setting;
