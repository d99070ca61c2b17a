use crate::chat::message::{ConversationMessage, IssueDraft, MessageKind, MessageRole};
use crate::form::defaults::humanize;
use crate::form::editor::FallbackField;
use crate::form::schema::TemplateSection;
use crate::form::value::FieldValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const PLACEHOLDER_TITLE: &str = "Placeholders";
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub fn format_field_for_context(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.trim().to_string(),
        FieldValue::Checkbox(checked) => {
            if *checked {
                "true".to_string()
            } else {
                String::new()
            }
        }
        FieldValue::CheckboxGroup(options) => options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        FieldValue::Table(rows) => rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| {
                row.iter()
                    .map(|cell| cell.trim())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        FieldValue::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub fn build_document_context(
    sections: &[TemplateSection],
    values: &BTreeMap<String, FieldValue>,
    fallback: &[FallbackField],
) -> String {
    let structured = sections.iter().any(|section| !section.fields.is_empty());
    if !structured {
        let lines: Vec<String> = fallback
            .iter()
            .filter_map(|field| {
                let text = field.text.trim();
                (!text.is_empty()).then(|| format!("{}: {text}", humanize(&field.name)))
            })
            .collect();
        if lines.is_empty() {
            return String::new();
        }
        return format!("{PLACEHOLDER_TITLE}\n{}", lines.join("\n"));
    }

    sections
        .iter()
        .filter_map(|section| {
            let lines: Vec<String> = section
                .fields
                .iter()
                .filter_map(|field| {
                    let formatted = format_field_for_context(values.get(&field.name)?);
                    (!formatted.is_empty())
                        .then(|| format!("{}: {formatted}", field.display_label()))
                })
                .collect();
            (!lines.is_empty()).then(|| format!("{}\n{}", section.title.trim(), lines.join("\n")))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_conversation_transcript(history: &[ConversationMessage], window: usize) -> String {
    let relevant: Vec<&ConversationMessage> = history
        .iter()
        .filter(|message| match message.role {
            MessageRole::User => true,
            MessageRole::Assistant => message.kind == MessageKind::Draft,
        })
        .collect();
    let start = relevant.len().saturating_sub(window);

    relevant[start..]
        .iter()
        .map(|message| match message.role {
            MessageRole::User => format!(
                "User ({}): {}",
                message.project_key.as_deref().unwrap_or("unknown"),
                message.content
            ),
            MessageRole::Assistant => render_draft_block(message),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_draft_block(message: &ConversationMessage) -> String {
    let empty = IssueDraft::default();
    let draft = message.draft.as_ref().unwrap_or(&empty);
    format!(
        "Assistant Draft for {}:\nSummary: {}\nDescription: {}\nPriority: {}",
        message.project_key.as_deref().unwrap_or("unknown"),
        draft.summary_text(),
        draft.description_text(),
        draft.priority_text()
    )
}

pub fn build_combined_context(document_context: &str, transcript: &str) -> String {
    [document_context.trim(), transcript.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn sanitize_draft(raw: &Value) -> Option<IssueDraft> {
    let object = raw.as_object()?;

    Some(IssueDraft {
        summary: trimmed(object, "summary"),
        description: trimmed(object, "description"),
        labels: normalize_tags(object.get("labels")),
        components: normalize_tags(object.get("components")),
        priority: string_field(object, "priority"),
        assignee: trimmed(object, "assignee"),
        issue_type: string_field(object, "issueType"),
        epic_key: string_field(object, "epicKey"),
        estimate: object.get("estimate").and_then(parse_estimate),
    })
}

/// Accepts `"a, b c"` or `["a", "b c"]`; trims entries, joins inner
/// whitespace with `-`, drops empties and keeps duplicates.
pub fn normalize_tags(raw: Option<&Value>) -> Vec<String> {
    let entries: Vec<String> = match raw {
        Some(Value::String(text)) => text.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    entries
        .iter()
        .map(|entry| entry.split_whitespace().collect::<Vec<_>>().join("-"))
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn parse_estimate(raw: &Value) -> Option<f64> {
    let parsed = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|estimate| estimate.is_finite())
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn trimmed(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::defaults::build_defaults;
    use crate::form::schema::parse_sections;
    use crate::form::value::CheckboxOption;
    use serde_json::json;

    const TRANSCRIPT_WINDOW: usize = 8;

    fn option(text: &str, selected: bool) -> CheckboxOption {
        CheckboxOption {
            value: text.to_lowercase(),
            label: text.to_string(),
            text: text.to_string(),
            selected,
        }
    }

    #[test]
    fn formats_each_value_kind() {
        assert_eq!(format_field_for_context(&FieldValue::Text("  hi  ".into())), "hi");
        assert_eq!(format_field_for_context(&FieldValue::Checkbox(false)), "");
        assert_eq!(format_field_for_context(&FieldValue::Checkbox(true)), "true");
        assert_eq!(
            format_field_for_context(&FieldValue::CheckboxGroup(vec![
                option("Alpha", true),
                option("Beta", false),
                option("Gamma", true),
            ])),
            "Alpha, Gamma"
        );
        assert_eq!(
            format_field_for_context(&FieldValue::Table(vec![
                vec!["a".into(), "b".into()],
                vec![" ".into(), String::new()],
                vec!["c".into(), " d ".into()],
            ])),
            "a | b\nc | d"
        );
        assert_eq!(
            format_field_for_context(&FieldValue::List(vec!["x".into(), "y".into()])),
            "x, y"
        );
    }

    #[test]
    fn formatting_is_idempotent_on_unchanged_value() {
        let value = FieldValue::Table(vec![vec!["a".into(), "b".into()]]);
        assert_eq!(format_field_for_context(&value), format_field_for_context(&value));
    }

    #[test]
    fn document_context_skips_empty_fields_and_sections() {
        let sections = parse_sections(&json!([
            {"section": "Intro", "fields": [
                {"name": "project_name", "type": "text", "default": "Atlas"},
                {"name": "notes", "type": "textarea", "label": "Notes"}
            ]},
            {"section": "Empty", "fields": [{"name": "blank", "type": "text"}]},
            {"section": "Risks", "fields": [
                {"name": "risks", "type": "table", "label": "Risk table", "default": [["Late", "High"]]}
            ]}
        ]));
        let values = build_defaults(&sections);

        assert_eq!(
            build_document_context(&sections, &values, &[]),
            "Intro\nProject Name: Atlas\n\nRisks\nRisk table: Late | High"
        );
    }

    #[test]
    fn document_context_uses_fallback_without_schema() {
        let fallback = vec![
            FallbackField {
                name: "client_name".into(),
                text: "ACME".into(),
            },
            FallbackField {
                name: "empty".into(),
                text: "  ".into(),
            },
        ];
        assert_eq!(
            build_document_context(&[], &BTreeMap::new(), &fallback),
            "Placeholders\nClient Name: ACME"
        );
        assert_eq!(build_document_context(&[], &BTreeMap::new(), &fallback[1..]), "");
    }

    fn draft_message(index: usize) -> ConversationMessage {
        ConversationMessage::draft(
            IssueDraft {
                summary: Some(format!("draft {index}")),
                description: Some("desc".into()),
                priority: Some("High".into()),
                ..IssueDraft::default()
            },
            "OPS",
        )
    }

    #[test]
    fn transcript_keeps_last_eight_user_and_draft_messages() {
        let mut history = Vec::new();
        for index in 0..10 {
            if index % 2 == 0 {
                history.push(ConversationMessage::user(
                    MessageKind::Compose,
                    format!("user {index}"),
                    Some("OPS".into()),
                ));
            } else {
                history.push(draft_message(index));
            }
            history.push(ConversationMessage::assistant(MessageKind::Status, "noise"));
        }
        history.insert(0, ConversationMessage::assistant(MessageKind::Error, "boom"));
        history.push(ConversationMessage::assistant(MessageKind::Text, "chatter"));

        let transcript = build_conversation_transcript(&history, TRANSCRIPT_WINDOW);
        let blocks: Vec<&str> = transcript.split("\n\n").collect();
        assert_eq!(blocks.len(), 8);
        assert_eq!(blocks[0], "User (OPS): user 2");
        assert_eq!(
            blocks[7],
            "Assistant Draft for OPS:\nSummary: draft 9\nDescription: desc\nPriority: High"
        );
        assert!(!transcript.contains("noise"));
        assert!(!transcript.contains("boom"));
        assert!(!transcript.contains("chatter"));
    }

    #[test]
    fn user_message_without_project_is_unknown() {
        let history = vec![ConversationMessage::user(MessageKind::Text, "hello", None)];
        assert_eq!(
            build_conversation_transcript(&history, TRANSCRIPT_WINDOW),
            "User (unknown): hello"
        );
    }

    #[test]
    fn combined_context_joins_non_empty_parts() {
        assert_eq!(build_combined_context("doc", "chat"), "doc\n\n---\n\nchat");
        assert_eq!(build_combined_context("doc", ""), "doc");
        assert_eq!(build_combined_context("  ", "chat"), "chat");
        assert_eq!(build_combined_context("", ""), "");
    }

    #[test]
    fn sanitize_draft_normalizes_tags_and_estimate() {
        let draft = sanitize_draft(&json!({
            "summary": "  Fix login  ",
            "description": "\nBody\n",
            "labels": "a, b , go live",
            "components": ["api", "  web  ui ", "", "api"],
            "assignee": " dana ",
            "priority": "High",
            "estimate": "3.5"
        }))
        .expect("object draft should sanitize");

        assert_eq!(draft.summary.as_deref(), Some("Fix login"));
        assert_eq!(draft.description.as_deref(), Some("Body"));
        assert_eq!(draft.labels, vec!["a", "b", "go-live"]);
        assert_eq!(draft.components, vec!["api", "web-ui", "api"]);
        assert_eq!(draft.assignee.as_deref(), Some("dana"));
        assert_eq!(draft.estimate, Some(3.5));
    }

    #[test]
    fn sanitize_draft_drops_unparsable_estimate_and_rejects_non_objects() {
        let draft = sanitize_draft(&json!({"estimate": "soon"})).expect("object should sanitize");
        assert_eq!(draft.estimate, None);
        let serialized = serde_json::to_value(&draft).expect("draft should serialize");
        assert!(serialized.get("estimate").is_none());

        assert!(sanitize_draft(&json!("text")).is_none());
        assert!(sanitize_draft(&json!(null)).is_none());
        assert!(sanitize_draft(&json!([1, 2])).is_none());
    }
}
