//! 协作运行的错误类型
//!
//! 两类终止性错误：步骤失败（含补全服务失败）与超时。二者都不重试、不保留部分记录；
//! Display 即为 solve 对外返回的字符串。

use std::time::Duration;

use thiserror::Error;

use crate::pipeline::StepError;

/// 超时时 solve 返回的固定文本
pub const TIMEOUT_MESSAGE: &str = "Operation timed out. The process took too long to complete.";
/// 失败时 solve 返回文本的前缀
pub const ERROR_PREFIX: &str = "Error during collaboration: ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollabError {
    /// 在步骤边界发现已用时间达到预算
    #[error("Operation timed out. The process took too long to complete.")]
    Timeout {
        elapsed: Duration,
        budget: Duration,
        next_step: String,
    },

    #[error("Error during collaboration: {0}")]
    Step(#[from] StepError),

    /// 没有终止步骤且记录为空，拿不到回退答案
    #[error("Error during collaboration: pipeline finished without producing an answer")]
    EmptyTranscript,
}

impl CollabError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CollabError::Timeout { .. })
    }

    /// 失败的步骤名（超时时为尚未开始的步骤）
    pub fn step(&self) -> Option<&str> {
        match self {
            CollabError::Timeout { next_step, .. } => Some(next_step),
            CollabError::Step(e) => Some(e.step()),
            CollabError::EmptyTranscript => None,
        }
    }
}
