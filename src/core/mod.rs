//! 核心编排层：错误类型与主控循环

pub mod error;
pub mod orchestrator;

pub use error::{CollabError, ERROR_PREFIX, TIMEOUT_MESSAGE};
pub use orchestrator::{
    create_llm_from_config, select_backend, LlmBackend, Orchestrator, RunReport, DEFAULT_TIMEOUT,
};
