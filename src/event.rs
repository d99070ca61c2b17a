use crate::backend::types::{CreateIssueResponse, ProjectSummary, TemplateFields, UpdateIssueResponse};
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub enum AppEvent {
    TemplatesLoaded(Result<Vec<String>, ClientError>),
    TemplateLoaded {
        template_id: String,
        result: Result<TemplateFields, ClientError>,
    },
    TemplateUploaded(Result<TemplateFields, ClientError>),
    DocumentGenerated {
        filename: String,
        result: Result<Vec<u8>, ClientError>,
    },
    PolishFinished {
        field_name: String,
        result: Result<Vec<String>, ClientError>,
    },
    ProjectsLoaded(Result<Vec<ProjectSummary>, ClientError>),
    ComposeFinished {
        generation: u64,
        project_key: String,
        result: Result<CreateIssueResponse, ClientError>,
    },
    UpdateFinished {
        generation: u64,
        result: Result<UpdateIssueResponse, ClientError>,
    },
    IssueCreated {
        generation: u64,
        message_id: String,
        result: Result<CreateIssueResponse, ClientError>,
    },
}
