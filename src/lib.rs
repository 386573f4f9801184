//! Concord - 双智能体协作问答
//!
//! 历史专家与数据专家按固定步骤接力，共享一份不断增长的对话记录，最终合成答案。
//!
//! 模块划分：
//! - **agent**: 角色描述符与单次补全调用的 Agent
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排器主控循环、超时与错误
//! - **llm**: 补全服务抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 消息模型与单次协作的对话记录
//! - **observability**: 日志初始化
//! - **pipeline**: 步骤定义、单步执行与流水线构建

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod pipeline;

pub use crate::agent::{Agent, AgentDescriptor, AgentRole};
pub use crate::core::{CollabError, Orchestrator, RunReport};
