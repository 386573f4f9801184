//! 协作记录：单次 solve 内两位 Agent 之间的对话历史
//!
//! 只追加、不修改、不重排；每次 solve 结束即丢弃，不跨调用保留。

use serde::{Deserialize, Serialize};

use crate::memory::Message;

/// 发言方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Human,
    Agent,
}

/// 单条发言，创建后不可变
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 回放给补全服务时的消息形式：Human -> user，Agent -> assistant
    pub fn to_message(&self) -> Message {
        match self.speaker {
            Speaker::Human => Message::user(self.text.clone()),
            Speaker::Agent => Message::assistant(self.text.clone()),
        }
    }
}

/// 只追加的发言序列
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// 追加后返回自身，便于 Step 以值的方式产出新记录
    pub fn with(mut self, turn: Turn) -> Self {
        self.push(turn);
        self
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(Turn::to_message).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
