//! 订单服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// 支付类型
///
/// 决定订单的支付状态初始值以及奖励门槛的计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum PaymentType {
    /// 货到付款
    Cod,
    /// 积分支付
    Points,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Points => "points",
        }
    }

    /// 下单时的支付状态：积分订单已在事务内扣款
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            Self::Cod => PaymentStatus::Unpaid,
            Self::Points => PaymentStatus::Paid,
        }
    }
}

/// 下单来源
///
/// 购物车下单会在同一事务内清理对应的购物车条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    /// 商品页直接下单
    Direct,
    /// 购物车结算
    Cart,
}

impl OrderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Cart => "cart",
        }
    }
}

/// 支付状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// 订单履约状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum OrderStatus {
    /// 待处理
    #[default]
    Pending,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
    /// 已送达，同时视为已付款
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Delivered => "delivered",
        }
    }

    /// 首字母大写的展示名，用于推送文案
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Delivered => "Delivered",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "delivered" => Ok(Self::Delivered),
            other => Err(OrderError::InvalidOrderStatus(other.to_string())),
        }
    }
}

/// 推荐奖励状态
///
/// pending → claimed → transferred，或 pending → expired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum BonusStatus {
    /// 待领取
    #[default]
    Pending,
    /// 已领取，等待运营打款
    Claimed,
    /// 超期未领取
    Expired,
    /// 已打款
    Transferred,
}
