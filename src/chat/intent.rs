use std::collections::BTreeSet;

const UPDATE_VERBS: &[&str] = &[
    "update", "change", "set", "assign", "reassign", "unassign", "move", "rename", "retitle",
    "close", "resolve", "reopen", "transition", "edit", "modify", "label", "relabel", "add",
    "remove", "prioritize", "priority", "status",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatIntent {
    Compose,
    Update { issue_key: String },
}

/// Routes a chat line: naming an issue key together with an update verb
/// means "update that issue", anything else composes a new one.
pub fn intent_from_text(text: &str) -> ChatIntent {
    let lowered = text.to_ascii_lowercase();
    let tokens = token_set(&lowered);
    let mentions_update = UPDATE_VERBS.iter().any(|verb| tokens.contains(verb));

    match find_issue_key(text) {
        Some(issue_key) if mentions_update => ChatIntent::Update { issue_key },
        _ => ChatIntent::Compose,
    }
}

pub fn find_issue_key(text: &str) -> Option<String> {
    text.split(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-'))
        .map(|token| token.trim_matches('-'))
        .find(|token| is_issue_key(token))
        .map(|token| token.to_ascii_uppercase())
}

fn is_issue_key(token: &str) -> bool {
    let Some((project, number)) = token.split_once('-') else {
        return false;
    };
    let mut chars = project.chars();
    let starts_with_letter = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic());
    starts_with_letter
        && project.len() >= 2
        && project.chars().all(|ch| ch.is_ascii_alphanumeric())
        && !number.is_empty()
        && number.chars().all(|ch| ch.is_ascii_digit())
}

fn token_set(text: &str) -> BTreeSet<&str> {
    text.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_update_with_issue_key() {
        assert_eq!(
            intent_from_text("Please assign SCRUM-5 to Dana"),
            ChatIntent::Update {
                issue_key: "SCRUM-5".to_string()
            }
        );
        assert_eq!(
            intent_from_text("change the priority of ops-12 to High"),
            ChatIntent::Update {
                issue_key: "OPS-12".to_string()
            }
        );
    }

    #[test]
    fn issue_key_alone_composes() {
        assert_eq!(
            intent_from_text("Write a follow-up to SCRUM-5 covering the rollout"),
            ChatIntent::Compose
        );
    }

    #[test]
    fn update_verb_without_key_composes() {
        assert_eq!(
            intent_from_text("Create a ticket to update the onboarding docs"),
            ChatIntent::Compose
        );
    }

    #[test]
    fn issue_key_shape_is_strict() {
        assert_eq!(find_issue_key("see follow-up"), None);
        assert_eq!(find_issue_key("v-2 release"), None);
        assert_eq!(find_issue_key("(AB1-77)"), Some("AB1-77".to_string()));
        assert_eq!(find_issue_key("ABC-12-extra"), None);
    }
}
