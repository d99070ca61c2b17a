use crate::backend::types::{CreateIssueRequest, CreateIssueResponse, UpdateIssueRequest, UpdateIssueResponse};
use crate::chat::context::{build_combined_context, build_conversation_transcript, sanitize_draft};
use crate::chat::intent::{intent_from_text, ChatIntent};
use crate::chat::message::{ConversationMessage, IssueDraft, MessageKind};
use crate::error::ClientError;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatRequest {
    Compose {
        project_key: String,
        request: CreateIssueRequest,
    },
    Update(UpdateIssueRequest),
    CreateFromDraft {
        message_id: String,
        request: CreateIssueRequest,
    },
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    project_key: Option<String>,
    transcript_window: usize,
    submitting: BTreeSet<String>,
    in_flight: usize,
    generation: u64,
}

impl Conversation {
    pub fn new(transcript_window: usize) -> Self {
        Self {
            messages: Vec::new(),
            project_key: None,
            transcript_window,
            submitting: BTreeSet::new(),
            in_flight: 0,
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Requests prepared before a restore belong to the previous history;
    /// their answers are dropped by the `apply_*` methods.
    pub fn restore(&mut self, messages: Vec<ConversationMessage>) {
        self.messages = messages;
        self.submitting.clear();
        self.in_flight = 0;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn project_key(&self) -> Option<&str> {
        self.project_key.as_deref()
    }

    pub fn select_project(&mut self, project_key: Option<String>) {
        self.project_key = project_key.filter(|key| !key.trim().is_empty());
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_submitting(&self, message_id: &str) -> bool {
        self.submitting.contains(message_id)
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.messages
            .push(ConversationMessage::assistant(MessageKind::Error, text));
    }

    pub fn push_status(&mut self, text: impl Into<String>) {
        self.messages
            .push(ConversationMessage::assistant(MessageKind::Status, text));
    }

    pub fn send_chat_message(&mut self, text: &str, document_context: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let transcript = build_conversation_transcript(&self.messages, self.transcript_window);
        let intent = intent_from_text(text);
        let kind = match intent {
            ChatIntent::Compose => MessageKind::Compose,
            ChatIntent::Update { .. } => MessageKind::Update,
        };
        self.messages.push(ConversationMessage::user(
            kind,
            text,
            self.project_key.clone(),
        ));

        match intent {
            ChatIntent::Update { issue_key } => {
                debug!(issue = %issue_key, "routing chat message to issue update");
                self.in_flight += 1;
                Some(ChatRequest::Update(UpdateIssueRequest {
                    text: text.to_string(),
                }))
            }
            ChatIntent::Compose => {
                let Some(project_key) = self.project_key.clone() else {
                    self.push_error(
                        ClientError::validation("Select a project before asking for an issue draft")
                            .user_message(),
                    );
                    return None;
                };
                let combined = build_combined_context(document_context, &transcript);
                self.in_flight += 1;
                Some(ChatRequest::Compose {
                    request: CreateIssueRequest {
                        project_key: project_key.clone(),
                        text: text.to_string(),
                        create_on_jira: false,
                        draft: self.pending_draft_for(&project_key),
                        context_text: (!combined.is_empty()).then_some(combined),
                    },
                    project_key,
                })
            }
        }
    }

    pub fn create_issue_from_draft(&mut self, message_id: &str) -> Option<ChatRequest> {
        if self.submitting.contains(message_id) {
            return None;
        }
        let Some(message) = self
            .messages
            .iter()
            .find(|message| message.id == message_id && message.is_pending_draft())
        else {
            warn!(message = %message_id, "no pending draft to submit");
            return None;
        };

        let draft = message.draft.clone().unwrap_or_default();
        let project_key = message
            .project_key
            .clone()
            .or_else(|| self.project_key.clone());

        let failure = match (&project_key, draft.summary_text().trim().is_empty()) {
            (None, _) => Some("Select a project before creating the issue"),
            (_, true) => Some("The draft needs a summary before it can be created"),
            _ => None,
        };
        if let Some(reason) = failure {
            self.push_error(ClientError::validation(reason).user_message());
            return None;
        }

        self.submitting.insert(message_id.to_string());
        self.in_flight += 1;
        Some(ChatRequest::CreateFromDraft {
            message_id: message_id.to_string(),
            request: CreateIssueRequest {
                project_key: project_key.unwrap_or_default(),
                text: draft.summary_text().to_string(),
                create_on_jira: true,
                draft: Some(draft),
                context_text: None,
            },
        })
    }

    pub fn edit_draft(&mut self, message_id: &str, edit: impl FnOnce(&mut IssueDraft)) -> bool {
        if self.submitting.contains(message_id) {
            return false;
        }
        let Some(message) = self
            .messages
            .iter_mut()
            .find(|message| message.id == message_id && message.is_pending_draft())
        else {
            return false;
        };
        let Some(draft) = message.draft.as_mut() else {
            return false;
        };
        edit(draft);
        message.content = draft.summary_text().to_string();
        true
    }

    pub fn apply_compose_response(
        &mut self,
        generation: u64,
        project_key: &str,
        result: Result<CreateIssueResponse, ClientError>,
    ) {
        if !self.finish_request(generation, "compose") {
            return;
        }
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.push_error(err.user_message());
                return;
            }
        };

        match response.generated.as_ref().and_then(sanitize_draft) {
            Some(draft) => self
                .messages
                .push(ConversationMessage::draft(draft, project_key)),
            None => self.push_error("The assistant did not return a draft"),
        }

        let chunk_count = response
            .context
            .as_ref()
            .map(|context| context.rag_chunks.len())
            .unwrap_or(0);
        if chunk_count > 0 {
            self.push_status(format!(
                "Used {chunk_count} knowledge base excerpt{}",
                if chunk_count == 1 { "" } else { "s" }
            ));
        }
    }

    pub fn apply_update_response(
        &mut self,
        generation: u64,
        result: Result<UpdateIssueResponse, ClientError>,
    ) {
        if !self.finish_request(generation, "update") {
            return;
        }
        match result {
            Ok(response) => {
                let content = describe_update(&response);
                self.messages
                    .push(ConversationMessage::assistant(MessageKind::UpdateResult, content));
            }
            Err(err) => self.push_error(err.user_message()),
        }
    }

    pub fn apply_created_issue(
        &mut self,
        generation: u64,
        message_id: &str,
        result: Result<CreateIssueResponse, ClientError>,
    ) {
        if !self.finish_request(generation, "create issue") {
            return;
        }
        self.submitting.remove(message_id);

        let created = match result {
            Ok(response) => response.created,
            Err(err) => {
                self.push_error(err.user_message());
                return;
            }
        };
        let Some(created) = created else {
            self.push_error("The issue was not created");
            return;
        };

        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
        {
            message.submitted = true;
        }
        self.push_status(format!("Created issue {}", created.key));
    }

    fn pending_draft_for(&self, project_key: &str) -> Option<IssueDraft> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.is_pending_draft())
            .filter(|message| message.project_key.as_deref() == Some(project_key))
            .and_then(|message| message.draft.clone())
    }

    fn finish_request(&mut self, generation: u64, label: &str) -> bool {
        if generation != self.generation {
            warn!(
                request = label,
                sent = generation,
                current = self.generation,
                "dropping chat response for a conversation that was replaced"
            );
            return false;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        true
    }
}

fn describe_update(response: &UpdateIssueResponse) -> String {
    let mut lines = Vec::new();
    match response.issue_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            if response.updated_fields.is_empty() {
                lines.push(format!("No changes were applied to {key}"));
            } else {
                lines.push(format!(
                    "Updated {key}: {}",
                    response.updated_fields.join(", ")
                ));
            }
        }
        _ => lines.push("No issue key was found in the request".to_string()),
    }

    let analysis = match &response.analysis {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
    };
    if !analysis.is_empty() {
        lines.push(analysis);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{ComposeContext, CreatedIssue};
    use serde_json::json;

    const TRANSCRIPT_WINDOW: usize = 8;

    fn conversation() -> Conversation {
        let mut conversation = Conversation::new(TRANSCRIPT_WINDOW);
        conversation.select_project(Some("OPS".into()));
        conversation
    }

    fn compose_response(summary: &str) -> CreateIssueResponse {
        CreateIssueResponse {
            generated: Some(json!({"summary": summary, "labels": "a, b", "priority": "High"})),
            created: None,
            context: Some(ComposeContext {
                rag_chunks: vec![json!({}), json!({})],
            }),
        }
    }

    fn last_draft_id(conversation: &Conversation) -> String {
        conversation
            .messages()
            .iter()
            .rev()
            .find(|message| message.kind == MessageKind::Draft)
            .map(|message| message.id.clone())
            .expect("a draft message should exist")
    }

    #[test]
    fn compose_request_carries_combined_context() {
        let mut conversation = conversation();
        let request = conversation
            .send_chat_message("  Add audit logging  ", "Intro\nName: Atlas")
            .expect("compose request should be prepared");

        let ChatRequest::Compose { project_key, request } = request else {
            panic!("expected a compose request");
        };
        assert_eq!(project_key, "OPS");
        assert_eq!(request.text, "Add audit logging");
        assert!(!request.create_on_jira);
        assert_eq!(request.context_text.as_deref(), Some("Intro\nName: Atlas"));
        assert!(conversation.is_waiting());
        assert_eq!(conversation.messages()[0].kind, MessageKind::Compose);
    }

    #[test]
    fn second_compose_includes_transcript_and_pending_draft() {
        let mut conversation = conversation();
        conversation.send_chat_message("First ask", "");
        conversation.apply_compose_response(0, "OPS", Ok(compose_response("Draft one")));

        let Some(ChatRequest::Compose { request, .. }) =
            conversation.send_chat_message("Make it shorter", "")
        else {
            panic!("expected a compose request");
        };
        let context = request.context_text.expect("transcript should be sent");
        assert!(context.starts_with("User (OPS): First ask"));
        assert!(context.contains("Assistant Draft for OPS:\nSummary: Draft one"));
        assert_eq!(
            request.draft.and_then(|draft| draft.summary),
            Some("Draft one".to_string())
        );
    }

    #[test]
    fn empty_context_is_omitted() {
        let mut conversation = conversation();
        let Some(ChatRequest::Compose { request, .. }) = conversation.send_chat_message("Ask", "")
        else {
            panic!("expected a compose request");
        };
        assert!(request.context_text.is_none());
    }

    #[test]
    fn compose_without_project_appends_error() {
        let mut conversation = Conversation::new(TRANSCRIPT_WINDOW);
        assert!(conversation.send_chat_message("Draft something", "").is_none());
        let kinds: Vec<MessageKind> = conversation.messages().iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Compose, MessageKind::Error]);
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn update_line_routes_to_update_endpoint() {
        let mut conversation = Conversation::new(TRANSCRIPT_WINDOW);
        let request = conversation.send_chat_message("assign OPS-4 to Dana", "doc");
        assert_eq!(
            request,
            Some(ChatRequest::Update(UpdateIssueRequest {
                text: "assign OPS-4 to Dana".into()
            }))
        );

        conversation.apply_update_response(0, Ok(UpdateIssueResponse {
            issue_key: Some("OPS-4".into()),
            updated_fields: vec!["assignee".into()],
            analysis: Some(json!("Assigned to Dana")),
        }));
        let last = conversation.messages().last().expect("result should be appended");
        assert_eq!(last.kind, MessageKind::UpdateResult);
        assert_eq!(last.content, "Updated OPS-4: assignee\nAssigned to Dana");
    }

    #[test]
    fn compose_response_appends_sanitized_draft_and_rag_note() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask", "");
        conversation.apply_compose_response(0, "OPS", Ok(compose_response("  Tidy  ")));

        let messages = conversation.messages();
        let draft = messages[1].draft.as_ref().expect("draft should be attached");
        assert_eq!(draft.summary.as_deref(), Some("Tidy"));
        assert_eq!(draft.labels, vec!["a", "b"]);
        assert_eq!(messages[1].project_key.as_deref(), Some("OPS"));
        assert_eq!(messages[2].kind, MessageKind::Status);
        assert_eq!(messages[2].content, "Used 2 knowledge base excerpts");
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn failures_become_error_messages() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask", "");
        conversation.apply_compose_response(0, "OPS", Err(ClientError::server(502, "LLM unavailable")));
        let last = conversation.messages().last().expect("error should be appended");
        assert_eq!(last.kind, MessageKind::Error);
        assert_eq!(last.content, "LLM unavailable");
    }

    #[test]
    fn draft_can_be_edited_then_created_once() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask", "");
        conversation.apply_compose_response(0, "OPS", Ok(compose_response("Original")));
        let draft_id = last_draft_id(&conversation);

        assert!(conversation.edit_draft(&draft_id, |draft| {
            draft.summary = Some("Edited".into());
        }));

        let Some(ChatRequest::CreateFromDraft { message_id, request }) =
            conversation.create_issue_from_draft(&draft_id)
        else {
            panic!("expected a create request");
        };
        assert_eq!(message_id, draft_id);
        assert!(request.create_on_jira);
        assert_eq!(request.text, "Edited");
        assert!(conversation.create_issue_from_draft(&draft_id).is_none());
        assert!(!conversation.edit_draft(&draft_id, |_| {}));

        conversation.apply_created_issue(
            0,
            &draft_id,
            Ok(CreateIssueResponse {
                created: Some(CreatedIssue { key: "OPS-9".into() }),
                ..CreateIssueResponse::default()
            }),
        );
        let last = conversation.messages().last().expect("status should be appended");
        assert_eq!(last.content, "Created issue OPS-9");
        assert!(conversation
            .messages()
            .iter()
            .any(|message| message.id == draft_id && message.submitted));
        assert!(conversation.create_issue_from_draft(&draft_id).is_none());
    }

    #[test]
    fn draft_without_summary_is_not_submitted() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask", "");
        conversation.apply_compose_response(0, "OPS", Ok(compose_response("Original")));
        let draft_id = last_draft_id(&conversation);
        conversation.edit_draft(&draft_id, |draft| draft.summary = Some("   ".into()));

        assert!(conversation.create_issue_from_draft(&draft_id).is_none());
        let last = conversation.messages().last().expect("error should be appended");
        assert_eq!(last.kind, MessageKind::Error);
    }

    #[test]
    fn answers_for_a_replaced_history_are_dropped() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask in session A", "");
        let sent = conversation.generation();

        conversation.restore(Vec::new());
        assert!(!conversation.is_waiting());
        conversation.apply_compose_response(sent, "OPS", Ok(compose_response("draft for A")));

        assert!(conversation.messages().is_empty());
        assert!(!conversation.is_waiting());
    }

    #[test]
    fn late_issue_creation_does_not_land_in_the_new_history() {
        let mut conversation = conversation();
        conversation.send_chat_message("Ask", "");
        conversation.apply_compose_response(0, "OPS", Ok(compose_response("Original")));
        let draft_id = last_draft_id(&conversation);
        assert!(conversation.create_issue_from_draft(&draft_id).is_some());
        let sent = conversation.generation();

        conversation.restore(Vec::new());
        let Some(ChatRequest::Compose { .. }) = conversation.send_chat_message("Fresh ask", "")
        else {
            panic!("expected a compose request");
        };
        conversation.apply_created_issue(
            sent,
            &draft_id,
            Ok(CreateIssueResponse {
                created: Some(CreatedIssue { key: "OPS-1".into() }),
                ..CreateIssueResponse::default()
            }),
        );

        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["Fresh ask"]);
        assert!(conversation.is_waiting());
    }
}
