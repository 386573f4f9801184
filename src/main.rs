//! Concord 命令行入口
//!
//! 初始化日志、加载配置、构建补全服务与编排器，对命令行给出的问题跑一次协作并打印答案。

use concord::{
    config::{load_config, AppConfig},
    core::{create_llm_from_config, Orchestrator},
    observability,
};

const DEFAULT_TASK: &str =
    "How did the Industrial Revolution affect population growth in Europe during the 19th century?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::var("CONCORD_CONFIG").ok().map(Into::into);
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let task = if args.is_empty() {
        DEFAULT_TASK.to_string()
    } else {
        args.join(" ")
    };

    let llm = create_llm_from_config(&cfg);
    let orchestrator = Orchestrator::from_config(&cfg, llm);

    let answer = orchestrator.solve(&task, cfg.collab.timeout()).await;

    println!("{answer}");
    Ok(())
}
