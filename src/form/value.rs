use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxOption {
    pub value: String,
    pub label: String,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Checkbox(bool),
    CheckboxGroup(Vec<CheckboxOption>),
    Table(Vec<Vec<String>>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Checkbox(_) => "checkbox",
            Self::CheckboxGroup(_) => "checkbox-group",
            Self::Table(_) => "table",
            Self::List(_) => "list",
        }
    }
}
