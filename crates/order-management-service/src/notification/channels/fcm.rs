//! FCM 推送网关
//!
//! 使用 FCM legacy HTTP 接口，token 校验通过 `dry_run` 发送完成。

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use commerce_shared::config::NotificationConfig;

use super::PushGateway;
use crate::error::{OrderError, Result};
use crate::notification::types::PushMessage;

/// FCM 明确表示 token 失效的错误码
const INVALID_TOKEN_ERRORS: &[&str] = &["InvalidRegistration", "NotRegistered", "MismatchSenderId"];

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    to: &'a str,
    priority: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<FcmNotification<'a>>,
    data: &'a BTreeMap<String, String>,
    dry_run: bool,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
    android_channel_id: &'a str,
    sound: &'static str,
    tag: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    success: u32,
    #[serde(default)]
    failure: u32,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

impl FcmResponse {
    fn first_error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }
}

/// FCM 推送网关
pub struct FcmPushGateway {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmPushGateway {
    pub fn new(
        endpoint: impl Into<String>,
        server_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrderError::Notification(format!("构建 FCM 客户端失败: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        })
    }

    /// 根据配置创建，未配置服务端密钥时返回 `None`
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>> {
        match config.fcm_server_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Self::new(
                config.fcm_endpoint.clone(),
                key,
                Duration::from_millis(config.request_timeout_ms),
            )
            .map(Some),
            None => Ok(None),
        }
    }

    async fn post(&self, request: &FcmRequest<'_>) -> Result<FcmResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("key={}", self.server_key))
            .json(request)
            .send()
            .await
            .map_err(|e| OrderError::Notification(format!("FCM 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrderError::Notification(format!("FCM 返回 {status}: {body}")));
        }

        response
            .json::<FcmResponse>()
            .await
            .map_err(|e| OrderError::Notification(format!("FCM 响应解析失败: {e}")))
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    async fn is_token_valid(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        let data = BTreeMap::new();
        let request = FcmRequest {
            to: token,
            priority: "high",
            notification: None,
            data: &data,
            dry_run: true,
        };

        match self.post(&request).await {
            Ok(response) if response.success > 0 => true,
            Ok(response) => {
                let error = response.first_error().unwrap_or_default();
                debug!(error = %error, "FCM token 校验未通过");
                !INVALID_TOKEN_ERRORS.contains(&error)
            }
            Err(e) => {
                warn!(error = %e, "FCM token 校验请求失败，按有效处理");
                true
            }
        }
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        let request = FcmRequest {
            to: &message.token,
            priority: "high",
            notification: Some(FcmNotification {
                title: &message.title,
                body: &message.body,
                android_channel_id: &message.channel_id,
                sound: "default",
                tag: &message.tag,
            }),
            data: &message.data,
            dry_run: false,
        };

        let response = self.post(&request).await?;
        if response.failure > 0 || response.success == 0 {
            return Err(OrderError::Notification(format!(
                "FCM 发送失败: {}",
                response.first_error().unwrap_or("unknown")
            )));
        }

        Ok(())
    }
}
