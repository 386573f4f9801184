//! 协作编排器：主控循环
//!
//! 持有两位固定角色的 Agent 与有序步骤列表；solve 逐步执行，在每个步骤开始前检查时间预算，
//! 任一步骤失败即终止并把错误转成字符串。补全调用本身不会被打断，超时只在步骤边界生效。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;

use crate::agent::{Agent, AgentRole};
use crate::config::AppConfig;
use crate::core::CollabError;
use crate::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};
use crate::memory::{Transcript, Turn};
use crate::pipeline::{Pipeline, StepOutcome};

/// solve 的默认时间预算
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// 补全服务后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    DeepSeek,
    OpenAi,
    Mock,
}

/// 显式配置的 provider 优先；provider 为 deepseek 或未知时，DeepSeek Key（或仅有 OpenAI Key）走 DeepSeek 兼容端点
pub fn select_backend(
    provider: &str,
    has_deepseek_key: bool,
    has_openai_key: bool,
) -> LlmBackend {
    match provider.to_lowercase().as_str() {
        "mock" => LlmBackend::Mock,
        "openai" if has_openai_key => LlmBackend::OpenAi,
        "openai" => LlmBackend::Mock,
        _ if has_deepseek_key || has_openai_key => LlmBackend::DeepSeek,
        _ => LlmBackend::Mock,
    }
}

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let backend = select_backend(
        &cfg.llm.provider,
        std::env::var("DEEPSEEK_API_KEY").is_ok(),
        std::env::var("OPENAI_API_KEY").is_ok(),
    );

    match backend {
        LlmBackend::DeepSeek => {
            let model = cfg
                .llm
                .deepseek
                .model
                .clone()
                .unwrap_or_else(|| cfg.llm.model.clone());
            tracing::info!("Using DeepSeek LLM ({})", model);
            Arc::new(create_deepseek_client(Some(&model)))
        }
        LlmBackend::OpenAi => {
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI LLM ({})", model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &model,
                std::env::var("OPENAI_API_KEY").ok().as_deref(),
            ))
        }
        LlmBackend::Mock => {
            if cfg.llm.provider.eq_ignore_ascii_case("mock") {
                tracing::info!("Using Mock LLM (configured)");
            } else {
                tracing::warn!(
                    provider = %cfg.llm.provider,
                    "No API key for configured provider, using Mock LLM"
                );
            }
            Arc::new(MockLlmClient)
        }
    }
}

/// 日志字段用的毫秒数，超出 u64 时饱和
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// 一次成功运行的完整结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub answer: String,
    /// 终止步骤之前累积的记录（终止步骤不追加发言）
    pub transcript: Transcript,
    /// 已完成的步骤数（含终止步骤）
    pub steps_completed: usize,
}

/// 编排器：两位 Agent + 步骤列表；可顺序复用，每次运行使用全新的记录
#[derive(Debug, Clone)]
pub struct Orchestrator {
    history: Agent,
    data: Agent,
    pipeline: Pipeline,
}

impl Orchestrator {
    /// 内置描述符 + 标准五步流程，两位 Agent 共享同一补全服务
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self::with_agents(
            Agent::history(llm.clone()),
            Agent::data(llm),
            Pipeline::standard(),
        )
    }

    pub fn with_agents(history: Agent, data: Agent, pipeline: Pipeline) -> Self {
        Self {
            history,
            data,
            pipeline,
        }
    }

    /// 使用配置中的描述符覆盖
    pub fn from_config(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self::with_agents(
            Agent::new(cfg.collab.descriptor(AgentRole::History), llm.clone()),
            Agent::new(cfg.collab.descriptor(AgentRole::Data), llm),
            Pipeline::standard(),
        )
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn agent(&self, role: AgentRole) -> &Agent {
        match role {
            AgentRole::History => &self.history,
            AgentRole::Data => &self.data,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// 对外接口：成功、超时、失败都以字符串返回，永不报错
    pub async fn solve(&self, task: &str, timeout: Duration) -> String {
        match self.run(task, timeout).await {
            Ok(report) => report.answer,
            Err(e) => e.to_string(),
        }
    }

    pub async fn solve_default(&self, task: &str) -> String {
        self.solve(task, DEFAULT_TIMEOUT).await
    }

    /// 带类型的运行结果；solve 在此之上把错误压平成字符串
    ///
    /// 时间预算在每个步骤开始前检查，`elapsed >= timeout` 即视为超时，
    /// 因此 `timeout` 为零时不会发起任何补全调用。
    pub async fn run(&self, task: &str, timeout: Duration) -> Result<RunReport, CollabError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("collab_run", %run_id);
        self.run_steps(task, timeout).instrument(span).await
    }

    async fn run_steps(&self, task: &str, timeout: Duration) -> Result<RunReport, CollabError> {
        let start = Instant::now();
        let mut transcript = Transcript::new();

        for (index, step) in self.pipeline.steps().iter().enumerate() {
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::warn!(
                    step = %step.name,
                    elapsed_ms = millis(elapsed),
                    budget_ms = millis(timeout),
                    "Time budget exhausted before step"
                );
                return Err(CollabError::Timeout {
                    elapsed,
                    budget: timeout,
                    next_step: step.name.clone(),
                });
            }

            let agent = self.agent(step.role);
            tracing::info!(step = %step.name, agent = %agent.identity(), index, "Step started");

            match step.run(agent, task, &transcript).await {
                Ok(StepOutcome::Final(answer)) => {
                    tracing::info!(
                        step = %step.name,
                        elapsed_ms = millis(start.elapsed()),
                        "Collaboration finished"
                    );
                    return Ok(RunReport {
                        answer,
                        transcript,
                        steps_completed: index + 1,
                    });
                }
                Ok(StepOutcome::Continue(next)) => {
                    transcript = next;
                    tracing::info!(step = %step.name, turns = transcript.len(), "Step finished");
                }
                Err(e) => {
                    tracing::warn!(step = %e.step(), error = %e, "Step failed, aborting run");
                    return Err(e.into());
                }
            }
        }

        let answer = transcript
            .last()
            .map(Turn::text)
            .map(String::from)
            .ok_or(CollabError::EmptyTranscript)?;
        Ok(RunReport {
            answer,
            steps_completed: self.pipeline.len(),
            transcript,
        })
    }
}
