use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Text,
    Compose,
    Update,
    Draft,
    UpdateResult,
    Status,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
}

impl IssueDraft {
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn priority_text(&self) -> &str {
        self.priority.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<IssueDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    #[serde(default)]
    pub submitted: bool,
}

impl ConversationMessage {
    fn new(role: MessageRole, kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            kind,
            content: content.into(),
            draft: None,
            project_key: None,
            submitted: false,
        }
    }

    pub fn user(kind: MessageKind, content: impl Into<String>, project_key: Option<String>) -> Self {
        Self {
            project_key,
            ..Self::new(MessageRole::User, kind, content)
        }
    }

    pub fn draft(draft: IssueDraft, project_key: impl Into<String>) -> Self {
        Self {
            draft: Some(draft.clone()),
            project_key: Some(project_key.into()),
            ..Self::new(
                MessageRole::Assistant,
                MessageKind::Draft,
                draft.summary.unwrap_or_default(),
            )
        }
    }

    pub fn assistant(kind: MessageKind, content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, kind, content)
    }

    pub fn is_pending_draft(&self) -> bool {
        self.kind == MessageKind::Draft && self.draft.is_some() && !self.submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_serializes_with_wire_names() {
        let mut message = ConversationMessage::draft(
            IssueDraft {
                summary: Some("Ship it".into()),
                issue_type: Some("Task".into()),
                ..IssueDraft::default()
            },
            "OPS",
        );
        message.id = "fixed".into();

        let value = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(
            value,
            json!({
                "id": "fixed",
                "role": "assistant",
                "type": "draft",
                "content": "Ship it",
                "draft": {
                    "summary": "Ship it",
                    "labels": [],
                    "components": [],
                    "issueType": "Task"
                },
                "projectKey": "OPS",
                "submitted": false
            })
        );
    }

    #[test]
    fn update_result_kind_uses_kebab_case() {
        let value = serde_json::to_value(MessageKind::UpdateResult).expect("kind should serialize");
        assert_eq!(value, json!("update-result"));
    }
}
