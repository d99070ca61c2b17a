use crate::chat::message::IssueDraft;
use crate::form::editor::{GenerateJob, GeneratePayload};
use crate::form::schema::{parse_sections, AutoSection, TemplateSection};
use crate::form::value::FieldValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateList {
    #[serde(default)]
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFields {
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub placeholders: Vec<String>,
    #[serde(default)]
    pub auto_sections: Vec<AutoSection>,
    #[serde(default)]
    pub schema: Value,
}

impl TemplateFields {
    pub fn sections(&self) -> Vec<TemplateSection> {
        parse_sections(&self.schema)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
    pub output_filename: String,
}

impl From<GenerateJob> for GenerateRequest {
    fn from(job: GenerateJob) -> Self {
        let (fields, data) = match job.payload {
            GeneratePayload::Fields(fields) => (Some(fields), None),
            GeneratePayload::Data(data) => (None, Some(data)),
        };
        Self {
            template_id: job.template_id,
            fields,
            data,
            output_filename: job.output_filename,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolishRequest {
    pub text: String,
    pub field_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolishResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_onboarded_at: Option<String>,
}

impl ProjectSummary {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && name != self.key => format!("{} ({name})", self.key),
            _ => self.key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueRequest {
    pub project_key: String,
    pub text: String,
    pub create_on_jira: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<IssueDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeContext {
    #[serde(default, rename = "ragChunks")]
    pub rag_chunks: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIssueResponse {
    #[serde(default)]
    pub generated: Option<Value>,
    #[serde(default)]
    pub created: Option<CreatedIssue>,
    #[serde(default)]
    pub context: Option<ComposeContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateIssueRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueResponse {
    #[serde(default)]
    pub issue_key: Option<String>,
    #[serde(default)]
    pub updated_fields: Vec<String>,
    #[serde(default)]
    pub analysis: Option<Value>,
}
