use crate::form::defaults::humanize;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Textarea,
    RichText,
    CheckboxGroup,
    Table,
    List,
    Checkbox,
    Radio,
    Select,
    Unknown(String),
}

impl FieldType {
    fn parse(raw: &str) -> Self {
        match raw {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "richtext" => Self::RichText,
            "checkbox-group" => Self::CheckboxGroup,
            "table" => Self::Table,
            "list" => Self::List,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "select" => Self::Select,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

impl Default for FieldType {
    fn default() -> Self {
        Self::Text
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            Some(kind) => Self::parse(kind),
            None => Self::Unknown(raw.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFieldDefinition {
    #[serde(default)]
    pub name: Value,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Value,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub rows: Value,
    #[serde(default)]
    pub polishable: Value,
    #[serde(default)]
    pub help: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredOption {
    pub value: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefault {
    pub value: String,
    pub text: Option<String>,
    pub label: Option<String>,
    pub selected: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text { default: String },
    Textarea { default: String },
    RichText { default: String },
    Radio { options: Vec<DeclaredOption>, default: String },
    Select { options: Vec<DeclaredOption>, default: String },
    Checkbox { default: bool },
    List { default: Vec<String> },
    Table {
        default: Option<Vec<Vec<String>>>,
        seed_rows: Vec<Vec<String>>,
    },
    CheckboxGroup {
        options: Vec<DeclaredOption>,
        default: Option<Vec<GroupDefault>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub label: Option<String>,
    pub help: Option<String>,
    pub polishable: bool,
    pub declared_type: FieldType,
    pub kind: FieldKind,
}

impl FieldDefinition {
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => humanize(&self.name),
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, FieldKind::Table { .. })
    }

    pub fn seed_column_count(&self) -> usize {
        match &self.kind {
            FieldKind::Table { default, seed_rows } => default
                .as_ref()
                .and_then(|rows| rows.first())
                .or_else(|| seed_rows.first())
                .map(|row| row.len())
                .filter(|count| *count > 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSection {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

impl TemplateSection {
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled section"
        } else {
            self.title.as_str()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AutoSection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub default_text: Option<String>,
}

pub fn parse_sections(raw: &Value) -> Vec<TemplateSection> {
    let Some(items) = raw.as_array() else {
        if !raw.is_null() {
            warn!(kind = json_kind(raw), "schema is not a list; ignoring it");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let Some(object) = item.as_object() else {
                warn!(kind = json_kind(item), "skipping non-object schema section");
                return None;
            };
            let fields = object
                .get("fields")
                .and_then(Value::as_array)
                .map(|fields| fields.iter().filter_map(parse_field).collect())
                .unwrap_or_default();
            Some(TemplateSection {
                title: object
                    .get("section")
                    .and_then(scalar_to_string)
                    .unwrap_or_default(),
                description: object
                    .get("description")
                    .and_then(scalar_to_string)
                    .filter(|text| !text.trim().is_empty()),
                fields,
            })
        })
        .collect()
}

pub fn parse_field(raw: &Value) -> Option<FieldDefinition> {
    let parsed: RawFieldDefinition = match serde_json::from_value(raw.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "skipping malformed field definition");
            return None;
        }
    };
    validate_field(parsed)
}

pub fn validate_field(raw: RawFieldDefinition) -> Option<FieldDefinition> {
    let Some(name) = scalar_to_string(&raw.name).filter(|name| !name.trim().is_empty()) else {
        warn!("skipping field definition without a name");
        return None;
    };

    let kind = match &raw.field_type {
        FieldType::Text => FieldKind::Text {
            default: default_string(&raw.default),
        },
        FieldType::Textarea => FieldKind::Textarea {
            default: default_string(&raw.default),
        },
        FieldType::RichText => FieldKind::RichText {
            default: default_string(&raw.default),
        },
        FieldType::Radio => FieldKind::Radio {
            options: declared_options(&name, &raw.options),
            default: default_string(&raw.default),
        },
        FieldType::Select => FieldKind::Select {
            options: declared_options(&name, &raw.options),
            default: default_string(&raw.default),
        },
        FieldType::Checkbox => FieldKind::Checkbox {
            default: is_truthy(&raw.default),
        },
        FieldType::List => FieldKind::List {
            default: raw
                .default
                .as_array()
                .map(|items| items.iter().map(cell_to_string).collect())
                .unwrap_or_default(),
        },
        FieldType::Table => FieldKind::Table {
            default: raw.default.as_array().map(|rows| table_rows(rows)),
            seed_rows: raw
                .rows
                .as_array()
                .map(|rows| table_rows(rows))
                .unwrap_or_default(),
        },
        FieldType::CheckboxGroup => FieldKind::CheckboxGroup {
            options: declared_options(&name, &raw.options),
            default: raw.default.as_array().map(|entries| group_defaults(entries)),
        },
        FieldType::Unknown(kind) => {
            warn!(field = %name, kind = %kind, "unknown field type; treating as text");
            FieldKind::Text {
                default: default_string(&raw.default),
            }
        }
    };

    Some(FieldDefinition {
        label: scalar_to_string(&raw.label),
        help: scalar_to_string(&raw.help).filter(|help| !help.trim().is_empty()),
        polishable: is_truthy(&raw.polishable),
        declared_type: raw.field_type,
        name,
        kind,
    })
}

fn declared_options(field_name: &str, raw: &Value) -> Vec<DeclaredOption> {
    let Some(items) = raw.as_array() else {
        if !raw.is_null() {
            warn!(field = %field_name, "options is not a list; using no options");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(DeclaredOption {
                value: object.get("value").and_then(scalar_to_string),
                label: object.get("label").and_then(scalar_to_string),
            }),
            Value::Null => None,
            other => scalar_to_string(other).map(|text| DeclaredOption {
                value: Some(text.clone()),
                label: Some(text),
            }),
        })
        .collect()
}

fn group_defaults(entries: &[Value]) -> Vec<GroupDefault> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(object) => {
                let value = object.get("value").and_then(scalar_to_string)?;
                Some(GroupDefault {
                    value,
                    text: object.get("text").and_then(scalar_to_string),
                    label: object.get("label").and_then(scalar_to_string),
                    selected: object.get("selected").map(is_truthy),
                })
            }
            other => scalar_to_string(other).map(|value| GroupDefault {
                value,
                text: None,
                label: None,
                selected: None,
            }),
        })
        .collect()
}

fn table_rows(rows: &[Value]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| match row.as_array() {
            Some(cells) => cells.iter().map(cell_to_string).collect(),
            None => vec![cell_to_string(row)],
        })
        .collect()
}

fn default_string(value: &Value) -> String {
    scalar_to_string(value).unwrap_or_default()
}

pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => scalar_to_string(other).unwrap_or_default(),
    }
}

/// Truthiness as the browser client evaluates it: empty strings, zero, null
/// and false are false, everything else (including `"false"`) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
