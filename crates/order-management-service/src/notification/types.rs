//! 通知类型定义

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Order, OrderItem, OrderStatus};

/// 下单者联系方式（来自下单事务内读取的用户资料）
#[derive(Debug, Clone, Default)]
pub struct CustomerContact {
    pub fullname: Option<String>,
    pub phone_number: Option<String>,
    pub fcm_token: Option<String>,
}

/// 新订单通知
#[derive(Debug, Clone)]
pub struct OrderPlacedNotice {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: CustomerContact,
}

/// 订单状态变更通知
#[derive(Debug, Clone)]
pub struct StatusChangedNotice {
    pub order_id: i64,
    pub order_code: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub fcm_token: Option<String>,
}

/// 派发队列中的通知任务
#[derive(Debug, Clone)]
pub enum NotificationJob {
    /// 新订单：用户推送 + 运营群消息
    OrderPlaced(OrderPlacedNotice),
    /// 状态变更：仅用户推送
    StatusChanged(StatusChangedNotice),
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderPlaced(_) => "order_placed",
            Self::StatusChanged(_) => "status_changed",
        }
    }

    pub fn user_id(&self) -> i64 {
        match self {
            Self::OrderPlaced(notice) => notice.order.user_id,
            Self::StatusChanged(notice) => notice.user_id,
        }
    }

    pub fn order_id(&self) -> i64 {
        match self {
            Self::OrderPlaced(notice) => notice.order.id,
            Self::StatusChanged(notice) => notice.order_id,
        }
    }
}

/// 单条推送消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    /// Android 通知渠道
    pub channel_id: String,
    /// 客户端去重标签
    pub tag: String,
    pub data: BTreeMap<String, String>,
}
