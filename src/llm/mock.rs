//! Mock LLM 客户端（用于测试与离线演示，无需 API）
//!
//! - MockLlmClient：取最后一条 User 消息回显
//! - ScriptedLlmClient：按顺序返回预设结果，记录调用次数与收到的消息，可选每次调用的延迟

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};
use crate::memory::{Message, Role};

/// Mock 客户端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("Echo from Mock: {}", last_user))
    }
}

/// 脚本化客户端：第 N 次调用返回第 N 条预设结果；脚本耗尽后返回 fallback（未设置则报错）
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    received: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new(script: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// 全部成功的脚本
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// 脚本耗尽后始终返回该文本
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// 每次调用前等待（配合 tokio 暂停时钟模拟慢速服务）
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 已发生的调用次数（含失败的调用）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 每次调用收到的完整消息列表
    pub fn received(&self) -> Vec<Vec<Message>> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(messages.to_vec());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .map_err(|e| LlmError::Request(e.to_string()))?
            .pop_front();

        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(LlmError::Request("script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_echoes_last_user_message() {
        let messages = vec![
            Message::system("sys"),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];
        let out = MockLlmClient.complete(&messages).await.unwrap();
        assert_eq!(out, "Echo from Mock: second");
    }

    #[tokio::test]
    async fn test_scripted_replays_in_order_and_counts() {
        let client = ScriptedLlmClient::new(vec![
            Ok("one".to_string()),
            Err(LlmError::Api("quota".to_string())),
        ]);
        assert_eq!(client.complete(&[]).await.unwrap(), "one");
        assert_eq!(
            client.complete(&[]).await,
            Err(LlmError::Api("quota".to_string()))
        );
        assert!(client.complete(&[]).await.is_err());
        assert_eq!(client.calls(), 3);
        assert_eq!(client.received().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_fallback() {
        let client = ScriptedLlmClient::replies(["a"]).with_fallback("z");
        assert_eq!(client.complete(&[]).await.unwrap(), "a");
        assert_eq!(client.complete(&[]).await.unwrap(), "z");
        assert_eq!(client.complete(&[]).await.unwrap(), "z");
    }
}
