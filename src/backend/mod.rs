pub mod types;

use crate::chat::conversation::ChatRequest;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::event::AppEvent;
use crate::form::editor::{GenerateJob, DOCX_EXTENSION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use tokio::runtime::Handle;
use tokio::time::Duration;
use tracing::{debug, error, warn};
use types::{
    CreateIssueRequest, CreateIssueResponse, GenerateRequest, PolishRequest, PolishResponse,
    ProjectList, TemplateFields, TemplateList, UpdateIssueRequest, UpdateIssueResponse,
};

pub const MAX_POLISH_SUGGESTIONS: usize = 3;
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    alive: Arc<AtomicBool>,
}

impl BackendClient {
    pub fn new(
        config: &AppConfig,
        runtime_handle: Handle,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.backend_url).map_err(|err| {
            ClientError::validation(format!("invalid backend url {}: {err}", config.backend_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::validation(format!(
                "invalid backend url {}",
                config.backend_url
            )));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            tx,
            runtime_handle,
            alive: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Marks the owner as gone. Requests still running complete, but their
    /// results are discarded.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn list_templates(&self) {
        let http = self.http.clone();
        let url = self.endpoint(&["templates"]);
        self.dispatch(
            "list_templates",
            async move {
                let list: TemplateList = read_json(http.get(url?).send().await?).await?;
                Ok::<_, ClientError>(list.templates)
            },
            AppEvent::TemplatesLoaded,
        );
    }

    pub fn load_template(&self, template_id: &str) {
        let http = self.http.clone();
        let url = self.endpoint(&["template", template_id, "fields"]);
        let template_id = template_id.to_string();
        self.dispatch(
            "load_template",
            async move { read_json::<TemplateFields>(http.get(url?).send().await?).await },
            move |result| AppEvent::TemplateLoaded {
                template_id,
                result,
            },
        );
    }

    pub fn upload_template(&self, path: &Path) -> Result<(), ClientError> {
        let file_name = upload_file_name(path)?;
        let path = path.to_path_buf();
        let http = self.http.clone();
        let url = self.endpoint(&["upload-template"]);
        self.dispatch(
            "upload_template",
            async move {
                let bytes = tokio::fs::read(&path).await.map_err(|err| {
                    ClientError::validation(format!("Could not read {}: {err}", path.display()))
                })?;
                let part = Part::bytes(bytes).file_name(file_name).mime_str(DOCX_MIME)?;
                let form = Form::new().part("file", part);
                read_json::<TemplateFields>(http.post(url?).multipart(form).send().await?).await
            },
            AppEvent::TemplateUploaded,
        );
        Ok(())
    }

    pub fn generate(&self, job: GenerateJob) {
        let filename = job.output_filename.clone();
        let request = GenerateRequest::from(job);
        let http = self.http.clone();
        let url = self.endpoint(&["generate"]);
        self.dispatch(
            "generate",
            async move {
                let response = http.post(url?).json(&request).send().await?;
                let status = response.status().as_u16();
                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body = response.bytes().await?;
                parse_document(status, content_type.as_deref(), &body)
            },
            move |result| AppEvent::DocumentGenerated { filename, result },
        );
    }

    pub fn polish(&self, field_name: &str, text: &str) -> Result<(), ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::validation("Write some text before polishing it"));
        }
        let request = PolishRequest {
            text: text.to_string(),
            field_name: field_name.to_string(),
        };
        let field_name = field_name.to_string();
        self.post_json(
            "polish",
            &["polish"],
            request,
            |response: PolishResponse| {
                let mut suggestions = response.suggestions;
                suggestions.retain(|suggestion| !suggestion.trim().is_empty());
                suggestions.truncate(MAX_POLISH_SUGGESTIONS);
                suggestions
            },
            move |result| AppEvent::PolishFinished { field_name, result },
        );
        Ok(())
    }

    pub fn list_projects(&self) {
        let http = self.http.clone();
        let url = self.endpoint(&["projects"]);
        self.dispatch(
            "list_projects",
            async move {
                let list: ProjectList = read_json(http.get(url?).send().await?).await?;
                Ok::<_, ClientError>(list.projects)
            },
            AppEvent::ProjectsLoaded,
        );
    }

    pub fn send_chat(&self, generation: u64, request: ChatRequest) {
        match request {
            ChatRequest::Compose {
                project_key,
                request,
            } => self.create_issue("compose_issue", request, move |result| {
                AppEvent::ComposeFinished {
                    generation,
                    project_key,
                    result,
                }
            }),
            ChatRequest::CreateFromDraft {
                message_id,
                request,
            } => self.create_issue("create_issue", request, move |result| {
                AppEvent::IssueCreated {
                    generation,
                    message_id,
                    result,
                }
            }),
            ChatRequest::Update(request) => self.update_issue(generation, request),
        }
    }

    fn create_issue(
        &self,
        label: &'static str,
        request: CreateIssueRequest,
        into_event: impl FnOnce(Result<CreateIssueResponse, ClientError>) -> AppEvent + Send + 'static,
    ) {
        self.post_json(
            label,
            &["ai", "create-issue"],
            request,
            |response: CreateIssueResponse| response,
            into_event,
        );
    }

    fn update_issue(&self, generation: u64, request: UpdateIssueRequest) {
        self.post_json(
            "update_issue",
            &["ai", "update-issue"],
            request,
            |response: UpdateIssueResponse| response,
            move |result| AppEvent::UpdateFinished { generation, result },
        );
    }

    fn post_json<B, R, T>(
        &self,
        label: &'static str,
        segments: &[&str],
        body: B,
        map: impl FnOnce(R) -> T + Send + 'static,
        into_event: impl FnOnce(Result<T, ClientError>) -> AppEvent + Send + 'static,
    ) where
        B: Serialize + Send + 'static,
        R: DeserializeOwned + Send + 'static,
        T: Send + 'static,
    {
        let http = self.http.clone();
        let url = self.endpoint(segments);
        self.dispatch(
            label,
            async move {
                let response = http.post(url?).json(&body).send().await?;
                read_json::<R>(response).await.map(map)
            },
            into_event,
        );
    }

    fn dispatch<T, F>(
        &self,
        label: &'static str,
        request: F,
        into_event: impl FnOnce(Result<T, ClientError>) -> AppEvent + Send + 'static,
    ) where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        debug!(request = label, "dispatching backend request");
        let tx = self.tx.clone();
        let alive = Arc::clone(&self.alive);

        self.runtime_handle.spawn(async move {
            let result = request.await;
            if let Err(err) = &result {
                error!(request = label, error = %err, "backend request failed");
            }
            if !alive.load(Ordering::SeqCst) {
                warn!(request = label, "dropping response that arrived after shutdown");
                return;
            }
            let _ = tx.send(into_event(result));
        });
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        endpoint_url(&self.base_url, segments)
    }
}

fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::validation(format!("invalid backend url {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    parse_json(status, &body)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decodes a JSON answer. Non-2xx statuses and 2xx bodies carrying an
/// `error` key both become `ClientError::Server`.
pub fn parse_json<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ClientError> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !is_success(status) => {
            return Err(ClientError::server(status, plain_error_text(status, body)));
        }
        Err(err) => return Err(ClientError::MalformedResponse(err.to_string())),
    };

    if !is_success(status) {
        let message = server_message(&value).unwrap_or_else(|| format!("HTTP {status}"));
        return Err(ClientError::server(status, message));
    }
    if let Some(message) = embedded_error(&value) {
        return Err(ClientError::server(status, message));
    }

    serde_json::from_value(value).map_err(|err| ClientError::MalformedResponse(err.to_string()))
}

pub fn parse_document(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Vec<u8>, ClientError> {
    let is_json = content_type.is_some_and(|value| value.contains("json"));
    if !is_success(status) || is_json {
        let failure = match parse_json::<Value>(status, body) {
            Err(err) => err,
            Ok(_) => ClientError::MalformedResponse("expected a document, got JSON".to_string()),
        };
        return Err(failure);
    }
    if body.is_empty() {
        return Err(ClientError::MalformedResponse("empty document".to_string()));
    }
    Ok(body.to_vec())
}

pub fn server_message(value: &Value) -> Option<String> {
    if let Some(message) = embedded_error(value) {
        return Some(message);
    }
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn embedded_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(text) => {
            let text = text.trim();
            Some(if text.is_empty() { "Unknown error" } else { text }.to_string())
        }
        other => Some(other.to_string()),
    }
}

fn plain_error_text(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() || text.starts_with('<') {
        format!("HTTP {status}")
    } else {
        text.chars().take(200).collect()
    }
}

fn upload_file_name(path: &Path) -> Result<String, ClientError> {
    let is_docx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCX_EXTENSION.trim_start_matches('.')));
    let file_name = path.file_name().and_then(|name| name.to_str());
    match file_name {
        Some(name) if is_docx => Ok(name.to_string()),
        _ => Err(ClientError::validation(format!(
            "Only {DOCX_EXTENSION} templates can be uploaded ({})",
            path.display()
        ))),
    }
}

pub fn save_document(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = Path::new(filename)
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty filename"))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
