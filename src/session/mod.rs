use crate::chat::message::{ConversationMessage, MessageRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod store;

pub const SCHEMA_VERSION: u32 = 1;
const TITLE_CHARS: usize = 48;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub schema_version: u32,
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

impl ChatSession {
    pub fn new(created_at: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session_id: Uuid::new_v4().to_string(),
            title: None,
            created_at: created_at.into(),
            project_key: None,
            messages: Vec::new(),
        }
    }

    pub fn record(&mut self, project_key: Option<&str>, messages: &[ConversationMessage]) {
        self.project_key = project_key.map(str::to_string);
        self.messages = messages.to_vec();
        if self.title.is_none() {
            self.title = messages
                .iter()
                .find(|message| message.role == MessageRole::User)
                .map(|message| title_from(&message.content));
        }
    }

    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            format!(
                "Session {}",
                self.session_id.chars().take(8).collect::<String>()
            )
        })
    }
}

fn title_from(content: &str) -> String {
    let line = content.lines().next().unwrap_or("").trim();
    if line.chars().count() > TITLE_CHARS {
        format!("{}...", line.chars().take(TITLE_CHARS).collect::<String>())
    } else {
        line.to_string()
    }
}
