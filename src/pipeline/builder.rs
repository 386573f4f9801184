//! 流水线构建器
//!
//! 提供流畅的API来构建步骤序列；`Pipeline::standard()` 给出默认的五步协作流程

use crate::agent::AgentRole;
use crate::pipeline::types::*;

const CONTEXT_RESEARCH: &str =
    "Provide relevant historical context and information for the following task: {task}";
const NEED_IDENTIFICATION: &str = "Based on the historical context provided, what specific data or statistics would be helpful to answer the original question? Historical context: {last}";
const DATA_PROVISIONING: &str = "Based on the data needs identified, provide relevant historical data or statistics. Data needs: {last}";
const ANALYSIS: &str = "Analyze the historical data provided and describe any trends or insights relevant to the original task. Historical data: {last}";
const SYNTHESIS: &str = "Based on all the historical context, data, and analysis, provide a comprehensive answer to the original task.";

/// 经过校验的有序步骤列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<StepDefinition>,
}

impl Pipeline {
    /// 背景调研 -> 需求识别 -> 数据提供 -> 分析 -> 综合（终止）
    pub fn standard() -> Self {
        Self {
            steps: vec![
                StepDefinition::new("context_research", AgentRole::History, CONTEXT_RESEARCH)
                    .without_transcript(),
                StepDefinition::new("need_identification", AgentRole::Data, NEED_IDENTIFICATION),
                StepDefinition::new("data_provisioning", AgentRole::History, DATA_PROVISIONING),
                StepDefinition::new("analysis", AgentRole::Data, ANALYSIS),
                StepDefinition::new("synthesis", AgentRole::History, SYNTHESIS).terminal(),
            ],
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// 流水线构建器
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: Vec<StepDefinition>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个已定义的步骤
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// 追加普通步骤
    pub fn then(self, name: impl Into<String>, role: AgentRole, template: impl Into<String>) -> Self {
        self.step(StepDefinition::new(name, role, template))
    }

    /// 追加终止步骤
    pub fn finish_with(
        self,
        name: impl Into<String>,
        role: AgentRole,
        template: impl Into<String>,
    ) -> Self {
        self.step(StepDefinition::new(name, role, template).terminal())
    }

    /// 校验：非空、终止步骤之后没有步骤、首步不引用 `{last}`
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let first = self.steps.first().ok_or(PipelineError::Empty)?;
        if first.needs_last_turn() {
            return Err(PipelineError::FirstStepNeedsContext(first.name.clone()));
        }

        if let Some(pos) = self.steps.iter().position(|s| s.terminal) {
            if let Some(next) = self.steps.get(pos + 1) {
                return Err(PipelineError::StepAfterTerminal {
                    step: next.name.clone(),
                    terminal: self.steps[pos].name.clone(),
                });
            }
        }

        Ok(Pipeline { steps: self.steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_shape() {
        let p = Pipeline::standard();
        let roles: Vec<AgentRole> = p.steps().iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                AgentRole::History,
                AgentRole::Data,
                AgentRole::History,
                AgentRole::Data,
                AgentRole::History,
            ]
        );
        let terminals: Vec<bool> = p.steps().iter().map(|s| s.terminal).collect();
        assert_eq!(terminals, vec![false, false, false, false, true]);
        assert!(!p.steps()[0].pass_transcript);
        assert!(p.steps()[1..].iter().all(|s| s.pass_transcript));
    }

    #[test]
    fn test_standard_pipeline_passes_validation() {
        let rebuilt = p_builder_from(Pipeline::standard()).build().unwrap();
        assert_eq!(rebuilt, Pipeline::standard());
    }

    fn p_builder_from(p: Pipeline) -> PipelineBuilder {
        p.steps
            .into_iter()
            .fold(PipelineBuilder::new(), PipelineBuilder::step)
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert_eq!(PipelineBuilder::new().build(), Err(PipelineError::Empty));
    }

    #[test]
    fn test_step_after_terminal_rejected() {
        let err = Pipeline::builder()
            .finish_with("done", AgentRole::History, "{task}")
            .then("extra", AgentRole::Data, "{last}")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::StepAfterTerminal {
                step: "extra".to_string(),
                terminal: "done".to_string(),
            }
        );
    }

    #[test]
    fn test_first_step_cannot_reference_last() {
        let err = Pipeline::builder()
            .then("bad", AgentRole::Data, "{last}")
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::FirstStepNeedsContext(_)));
    }

    #[test]
    fn test_pipeline_without_terminal_is_allowed() {
        let p = Pipeline::builder()
            .then("a", AgentRole::History, "{task}")
            .then("b", AgentRole::Data, "{last}")
            .build()
            .unwrap();
        assert_eq!(p.len(), 2);
    }
}
