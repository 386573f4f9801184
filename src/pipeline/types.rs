//! 流水线类型定义
//!
//! 步骤定义、步骤产出（Continue / Final）与错误类型

use thiserror::Error;

use crate::agent::{AgentError, AgentRole};
use crate::memory::Transcript;

/// 模板占位符：原始任务
pub const TASK_PLACEHOLDER: &str = "{task}";
/// 模板占位符：最近一条发言的文本
pub const LAST_TURN_PLACEHOLDER: &str = "{last}";

/// 步骤定义：属于配置，不随单次运行变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    /// 步骤名称
    pub name: String,
    /// 执行该步骤的 Agent 角色
    pub role: AgentRole,
    /// 提示词模板，支持 `{task}` 与 `{last}`
    pub prompt_template: String,
    /// 是否把当前对话记录交给 Agent
    pub pass_transcript: bool,
    /// 终止步骤：结果直接作为最终答案，不写入对话记录
    pub terminal: bool,
}

impl StepDefinition {
    pub fn new(name: impl Into<String>, role: AgentRole, prompt_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            prompt_template: prompt_template.into(),
            pass_transcript: true,
            terminal: false,
        }
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn without_transcript(mut self) -> Self {
        self.pass_transcript = false;
        self
    }

    /// 模板是否引用最近一条发言
    pub fn needs_last_turn(&self) -> bool {
        self.prompt_template.contains(LAST_TURN_PLACEHOLDER)
    }
}

/// 单步产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// 追加了一条发言后的新记录
    Continue(Transcript),
    /// 最终答案
    Final(String),
}

/// 单步执行结果
pub type StepResult = Result<StepOutcome, StepError>;

/// 步骤失败：保留失败的步骤名与原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("{source}")]
    Agent {
        step: String,
        #[source]
        source: AgentError,
    },

    #[error("step '{step}' needs a previous turn but the transcript is empty")]
    MissingContext { step: String },
}

impl StepError {
    pub fn step(&self) -> &str {
        match self {
            StepError::Agent { step, .. } | StepError::MissingContext { step } => step,
        }
    }
}

/// 流水线配置错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Pipeline has no steps")]
    Empty,

    #[error("Step '{step}' is placed after terminal step '{terminal}'")]
    StepAfterTerminal { step: String, terminal: String },

    #[error("First step '{0}' references {{last}} but no turn exists yet")]
    FirstStepNeedsContext(String),
}
