//! Telegram 运营群通知

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use commerce_shared::config::NotificationConfig;

use super::ChatNotifier;
use crate::error::{OrderError, Result};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Telegram Bot 消息发送
pub struct TelegramNotifier {
    client: reqwest::Client,
    send_url: String,
    chat_ids: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        chat_ids: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OrderError::Notification(format!("构建 Telegram 客户端失败: {e}")))?;

        Ok(Self {
            client,
            send_url: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token),
            chat_ids,
        })
    }

    /// 根据配置创建，缺少 bot token 或 chat id 时返回 `None`
    pub fn from_config(config: &NotificationConfig) -> Result<Option<Self>> {
        let chat_ids = config.chat_ids();
        match config.telegram_bot_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) if !chat_ids.is_empty() => Self::new(
                &config.telegram_api_base,
                token,
                chat_ids,
                Duration::from_millis(config.request_timeout_ms),
            )
            .map(Some),
            _ => Ok(None),
        }
    }

    async fn send_to(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendMessageRequest {
                chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| OrderError::Notification(format!("Telegram 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrderError::Notification(format!(
                "Telegram 返回 {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ChatNotifier for TelegramNotifier {
    async fn broadcast(&self, text: &str) -> Result<usize> {
        let results = join_all(
            self.chat_ids
                .iter()
                .map(|chat_id| async move { (chat_id, self.send_to(chat_id, text).await) }),
        )
        .await;

        let mut delivered = 0;
        for (chat_id, result) in results {
            match result {
                Ok(()) => {
                    delivered += 1;
                    debug!(chat_id = %chat_id, "Telegram 消息已送达");
                }
                Err(e) => warn!(chat_id = %chat_id, error = %e, "Telegram 消息发送失败"),
            }
        }

        if delivered == 0 {
            return Err(OrderError::Notification(
                "Telegram 消息未送达任何会话".to_string(),
            ));
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = NotificationConfig::default();
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());

        config.telegram_bot_token = Some("123:abc".into());
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());

        config.telegram_chat_ids = " -100, ,42 ".into();
        let notifier = TelegramNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(notifier.chat_ids, vec!["-100".to_string(), "42".to_string()]);
        assert_eq!(
            notifier.send_url,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_request_body() {
        let json = serde_json::to_value(SendMessageRequest {
            chat_id: "-100",
            text: "<b>hi</b>",
            parse_mode: "HTML",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"chat_id": "-100", "text": "<b>hi</b>", "parse_mode": "HTML"})
        );
    }

    #[tokio::test]
    async fn test_broadcast_fails_when_no_chat_reachable() {
        // 9 号端口（discard）通常没有监听，连接立即失败
        let notifier = TelegramNotifier::new(
            "http://127.0.0.1:9",
            "token",
            vec!["1".into(), "2".into()],
            Duration::from_millis(200),
        )
        .unwrap();

        let result = notifier.broadcast("hello").await;
        assert!(matches!(result, Err(OrderError::Notification(_))));
    }
}
