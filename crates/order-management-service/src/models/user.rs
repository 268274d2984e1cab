//! 用户相关实体

use serde::{Deserialize, Serialize};

/// 推荐链上的用户节点
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// 推荐人，可为空
    #[sqlx(default)]
    pub referred_by: Option<i64>,
}

/// 下单与通知需要的用户资料（users 关联 user_details）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    #[sqlx(default)]
    pub referred_by: Option<i64>,
    #[sqlx(default)]
    pub fcm_token: Option<String>,
    /// 用户详情不存在时为空
    #[sqlx(default)]
    pub fullname: Option<String>,
    #[sqlx(default)]
    pub phone_number: Option<String>,
}

impl UserProfile {
    /// 推荐链遍历的起点
    pub fn as_user(&self) -> User {
        User {
            id: self.id,
            referred_by: self.referred_by,
        }
    }
}

/// 用户积分余额
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPoints {
    pub user_id: i64,
    pub points: i64,
}
