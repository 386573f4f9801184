//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CONCORD__*` 覆盖（双下划线表示嵌套，如 `CONCORD__LLM__PROVIDER=openai`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::agent::{AgentDescriptor, AgentRole};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub collab: CollabSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            deepseek: LlmDeepSeekSection::default(),
            openai: LlmOpenAiSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

/// [collab] 段：整体超时与两个 Agent 的描述符覆盖
#[derive(Debug, Clone, Deserialize)]
pub struct CollabSection {
    /// 单次 solve 的时间预算（秒），只在步骤边界检查
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub history: AgentOverride,
    #[serde(default)]
    pub data: AgentOverride,
}

impl Default for CollabSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            history: AgentOverride::default(),
            data: AgentOverride::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

impl CollabSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 内置描述符叠加配置中的覆盖项
    pub fn descriptor(&self, role: AgentRole) -> AgentDescriptor {
        let over = match role {
            AgentRole::History => &self.history,
            AgentRole::Data => &self.data,
        };
        let base = AgentDescriptor::for_role(role);
        AgentDescriptor::new(
            over.identity.clone().unwrap_or(base.identity),
            over.role.clone().unwrap_or(base.role),
            over.skills.clone().unwrap_or(base.skills),
        )
    }
}

/// [collab.history] / [collab.data] 段：未设置的字段沿用内置值
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentOverride {
    pub identity: Option<String>,
    pub role: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// 从 config 目录加载配置，环境变量 CONCORD__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CONCORD__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    load_config_with_env(config_path, None)
}

/// `env` 为 None 时读取进程环境变量；传入 Map 时以其代替（键形如 `CONCORD__COLLAB__TIMEOUT_SECS`）
pub fn load_config_with_env(
    config_path: Option<PathBuf>,
    env: Option<config::Map<String, String>>,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(environment(env));

    let c = builder.build()?;
    c.try_deserialize()
}

/// 技能列表用逗号分隔，如 `CONCORD__COLLAB__DATA__SKILLS=statistics,charts`
fn environment(source: Option<config::Map<String, String>>) -> config::Environment {
    config::Environment::with_prefix("CONCORD")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("collab.history.skills")
        .with_list_parse_key("collab.data.skills")
        .source(source)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, "deepseek");
        assert_eq!(cfg.collab.timeout(), Duration::from_secs(300));
        assert_eq!(
            cfg.collab.descriptor(AgentRole::Data),
            AgentDescriptor::for_role(AgentRole::Data)
        );
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "mock"

[collab]
timeout_secs = 42

[collab.history]
identity = "Archivist"
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.collab.timeout_secs, 42);

        let history = cfg.collab.descriptor(AgentRole::History);
        assert_eq!(history.identity, "Archivist");
        assert_eq!(history.role, "History Research Specialist");
        assert_eq!(history.skills.len(), 3);
    }

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_collab_section() {
        let cfg = load_config_with_env(
            None,
            Some(env(&[
                ("CONCORD__LLM__PROVIDER", "mock"),
                ("CONCORD__COLLAB__TIMEOUT_SECS", "7"),
                ("CONCORD__COLLAB__HISTORY__IDENTITY", "Archivist"),
                ("CONCORD__COLLAB__DATA__SKILLS", "statistics,charts"),
            ])),
        )
        .unwrap();

        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.collab.timeout_secs, 7);
        assert_eq!(cfg.collab.descriptor(AgentRole::History).identity, "Archivist");
        assert_eq!(
            cfg.collab.descriptor(AgentRole::Data).skills,
            vec!["statistics".to_string(), "charts".to_string()]
        );
    }

    #[test]
    fn test_env_single_skill_is_a_list() {
        let cfg = load_config_with_env(
            None,
            Some(env(&[("CONCORD__COLLAB__HISTORY__SKILLS", "archives")])),
        )
        .unwrap();
        assert_eq!(
            cfg.collab.history.skills,
            Some(vec!["archives".to_string()])
        );
    }
}
