//! 协作 Agent：角色描述 + 一次补全调用
//!
//! Agent 是固定描述符（身份、角色、技能）上的无状态函数值：
//! invoke(task, transcript) 拼出 system 指令、回放对话记录、追加任务，调用一次补全服务并原样返回文本。
//! 不重试、不缓存、调用之间不保留任何状态。两种内置配置由 `Agent::history` / `Agent::data` 生成。

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::{LlmClient, LlmError};
use crate::memory::{Message, Transcript};

/// 两个固定角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// 历史 / 背景专家
    History,
    /// 数据分析专家
    Data,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::History => "history",
            AgentRole::Data => "data",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "history" => Ok(AgentRole::History),
            "data" => Ok(AgentRole::Data),
            _ => Err(format!("Unknown agent role: {}", s)),
        }
    }
}

/// Agent 调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// 补全服务未能给出回复
    #[error("{0}")]
    ServiceFailure(#[from] LlmError),
}

/// Agent 描述符：构造后不可变，只影响 system 指令文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub identity: String,
    pub role: String,
    /// 有序、去重
    pub skills: Vec<String>,
}

impl AgentDescriptor {
    pub fn new<I, S>(identity: impl Into<String>, role: impl Into<String>, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for skill in skills.into_iter().map(Into::into) {
            if !unique.contains(&skill) {
                unique.push(skill);
            }
        }
        Self {
            identity: identity.into(),
            role: role.into(),
            skills: unique,
        }
    }

    /// 内置描述符
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::History => Self::new(
                "History Agent",
                "History Research Specialist",
                [
                    "Deep knowledge of global historical events and trends",
                    "Ability to provide context for historical developments",
                    "Understanding of how past events shape the present",
                ],
            ),
            AgentRole::Data => Self::new(
                "Data Agent",
                "Data Analysis Expert",
                [
                    "Interpreting numerical data and statistics",
                    "Identifying trends and patterns in data",
                    "Providing data-driven insights",
                ],
            ),
        }
    }

    pub fn system_instruction(&self) -> String {
        format!(
            "You are {}, a {}. Your skills include: {}. Respond to the task based on your role and skills.",
            self.identity,
            self.role,
            self.skills.join(", ")
        )
    }
}

/// 角色绑定的 Agent，补全服务在构造时注入
#[derive(Clone)]
pub struct Agent {
    descriptor: AgentDescriptor,
    llm: Arc<dyn LlmClient>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(descriptor: AgentDescriptor, llm: Arc<dyn LlmClient>) -> Self {
        Self { descriptor, llm }
    }

    pub fn for_role(role: AgentRole, llm: Arc<dyn LlmClient>) -> Self {
        Self::new(AgentDescriptor::for_role(role), llm)
    }

    pub fn history(llm: Arc<dyn LlmClient>) -> Self {
        Self::for_role(AgentRole::History, llm)
    }

    pub fn data(llm: Arc<dyn LlmClient>) -> Self {
        Self::for_role(AgentRole::Data, llm)
    }

    pub fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }

    pub fn identity(&self) -> &str {
        &self.descriptor.identity
    }

    /// system 指令 + 回放的对话记录 + 任务（最后一条 user 消息）
    pub fn build_messages(&self, task: &str, transcript: Option<&Transcript>) -> Vec<Message> {
        let mut messages = vec![Message::system(self.descriptor.system_instruction())];
        if let Some(transcript) = transcript {
            messages.extend(transcript.to_messages());
        }
        messages.push(Message::user(task));
        messages
    }

    pub async fn invoke(
        &self,
        task: &str,
        transcript: Option<&Transcript>,
    ) -> Result<String, AgentError> {
        let messages = self.build_messages(task, transcript);
        tracing::debug!(
            agent = %self.descriptor.identity,
            messages = messages.len(),
            "Invoking completion service"
        );
        Ok(self.llm.complete(&messages).await?)
    }
}
