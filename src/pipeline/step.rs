//! 单步执行：渲染提示词、调用 Agent、产出 Continue / Final

use crate::agent::Agent;
use crate::memory::{Transcript, Turn};
use crate::pipeline::types::*;

/// 单遍替换 `{task}` 与 `{last}`，替换进来的文本不会再被展开
pub fn render_prompt(template: &str, task: &str, last: Option<&str>) -> String {
    let mut out = String::with_capacity(template.len() + task.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(TASK_PLACEHOLDER) {
            out.push_str(task);
            rest = &tail[TASK_PLACEHOLDER.len()..];
        } else if let (true, Some(last)) = (tail.starts_with(LAST_TURN_PLACEHOLDER), last) {
            out.push_str(last);
            rest = &tail[LAST_TURN_PLACEHOLDER.len()..];
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

impl StepDefinition {
    /// 执行本步骤：最多一次补全调用
    ///
    /// 非终止步骤在记录副本上追加 `"{identity}: {reply}"` 作为 Agent 发言并返回 Continue；
    /// 终止步骤原样返回回复作为 Final，不触碰记录。
    pub async fn run(&self, agent: &Agent, task: &str, transcript: &Transcript) -> StepResult {
        let last = transcript.last().map(Turn::text);
        if self.needs_last_turn() && last.is_none() {
            return Err(StepError::MissingContext {
                step: self.name.clone(),
            });
        }

        let prompt = render_prompt(&self.prompt_template, task, last);
        let context = self.pass_transcript.then_some(transcript);

        let reply = agent
            .invoke(&prompt, context)
            .await
            .map_err(|source| StepError::Agent {
                step: self.name.clone(),
                source,
            })?;

        if self.terminal {
            Ok(StepOutcome::Final(reply))
        } else {
            let turn = Turn::agent(format!("{}: {}", agent.identity(), reply));
            Ok(StepOutcome::Continue(transcript.clone().with(turn)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::{AgentError, AgentRole};
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::memory::Role;

    #[test]
    fn test_render_prompt_substitutes_once() {
        let out = render_prompt("Task: {task} / Last: {last}", "say {last}", Some("prev"));
        assert_eq!(out, "Task: say {last} / Last: prev");
    }

    #[test]
    fn test_render_prompt_keeps_unknown_braces() {
        let out = render_prompt("{json} and {task}", "t", None);
        assert_eq!(out, "{json} and t");
    }

    #[tokio::test]
    async fn test_first_step_skips_transcript() {
        let llm = Arc::new(ScriptedLlmClient::replies(["R1"]));
        let agent = Agent::history(llm.clone());
        let step = StepDefinition::new("research", AgentRole::History, "About: {task}")
            .without_transcript();

        let outcome = step.run(&agent, "rome", &Transcript::new()).await.unwrap();

        match outcome {
            StepOutcome::Continue(t) => {
                assert_eq!(t.len(), 1);
                assert_eq!(t.turns()[0].text(), "History Agent: R1");
            }
            other => panic!("Expected Continue, got {:?}", other),
        }
        let sent = &llm.received()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].content, "About: rome");
    }

    #[tokio::test]
    async fn test_terminal_step_returns_final_without_append() {
        let llm = Arc::new(ScriptedLlmClient::replies(["answer"]));
        let agent = Agent::history(llm.clone());
        let step = StepDefinition::new("synthesis", AgentRole::History, "Wrap up").terminal();
        let transcript = Transcript::new().with(Turn::agent("Data Agent: numbers"));

        let outcome = step.run(&agent, "t", &transcript).await.unwrap();

        assert_eq!(outcome, StepOutcome::Final("answer".to_string()));
        let sent = &llm.received()[0];
        assert_eq!(sent[1].role, Role::Assistant);
        assert_eq!(sent[2].content, "Wrap up");
    }

    #[tokio::test]
    async fn test_missing_context_makes_no_call() {
        let llm = Arc::new(ScriptedLlmClient::replies(["unused"]));
        let agent = Agent::data(llm.clone());
        let step = StepDefinition::new("needs", AgentRole::Data, "Given {last}");

        let err = step.run(&agent, "t", &Transcript::new()).await.unwrap_err();

        assert_eq!(err.step(), "needs");
        assert!(matches!(err, StepError::MissingContext { .. }));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_agent_failure_keeps_step_name() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![Err(LlmError::Api(
            "quota exceeded".to_string(),
        ))]));
        let agent = Agent::data(llm);
        let step = StepDefinition::new("analysis", AgentRole::Data, "Analyze {last}");
        let transcript = Transcript::new().with(Turn::agent("History Agent: data"));

        let err = step.run(&agent, "t", &transcript).await.unwrap_err();

        assert_eq!(err.step(), "analysis");
        assert_eq!(err.to_string(), "API error: quota exceeded");
        assert!(matches!(
            err,
            StepError::Agent {
                source: AgentError::ServiceFailure(LlmError::Api(_)),
                ..
            }
        ));
    }
}
