//! 步骤流水线：有序的 (步骤, 角色) 配置与单步执行

pub mod builder;
pub mod step;
pub mod types;

pub use builder::{Pipeline, PipelineBuilder};
pub use step::render_prompt;
pub use types::*;
