use crate::backend::types::{ProjectSummary, TemplateFields};
use crate::backend::{save_document, BackendClient};
use crate::chat::context::build_document_context;
use crate::chat::conversation::Conversation;
use crate::chat::message::{ConversationMessage, MessageKind, MessageRole};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::event::AppEvent;
use crate::form::editor::FieldEditor;
use crate::form::render::{FieldEdit, FormView};
use crate::session::store::SessionStore;
use crate::session::ChatSession;
use crate::theme::Theme;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

struct Notice {
    text: String,
    is_error: bool,
}

enum DraftAction {
    Summary(String, String),
    Description(String, String),
    Priority(String, String),
    Create(String),
}

pub struct DocPilotApp {
    rx: Receiver<AppEvent>,
    backend: BackendClient,
    config: AppConfig,
    theme: Theme,
    templates: Vec<String>,
    selected_template: Option<String>,
    editor: FieldEditor,
    upload_path: String,
    output_filename: String,
    loading_template: bool,
    uploading: bool,
    generating: bool,
    polishing: BTreeSet<String>,
    suggestions: BTreeMap<String, Vec<String>>,
    notice: Option<Notice>,
    projects: Vec<ProjectSummary>,
    conversation: Conversation,
    chat_input: String,
    store: SessionStore,
    sessions: Vec<ChatSession>,
    current_session: ChatSession,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
    visuals_applied: bool,
}

impl DocPilotApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        backend: BackendClient,
        config: AppConfig,
        store: SessionStore,
    ) -> Self {
        let (sessions, warnings) = store.load_all();
        let mut app = Self {
            rx,
            backend,
            output_filename: config.default_output_filename.clone(),
            conversation: Conversation::new(config.transcript_window),
            config,
            theme: Theme::default(),
            templates: Vec::new(),
            selected_template: None,
            editor: FieldEditor::default(),
            upload_path: String::new(),
            loading_template: false,
            uploading: false,
            generating: false,
            polishing: BTreeSet::new(),
            suggestions: BTreeMap::new(),
            notice: None,
            projects: Vec::new(),
            chat_input: String::new(),
            store,
            sessions,
            current_session: ChatSession::new(Self::timestamp()),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
            visuals_applied: false,
        };

        for warning in warnings {
            app.log_diagnostic(format!("session load warning: {warning}"));
        }
        app.backend.list_templates();
        app.backend.list_projects();
        app
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.log_diagnostic(&text);
        self.notice = Some(Notice {
            text,
            is_error: false,
        });
    }

    fn notify_error(&mut self, err: &ClientError) {
        self.log_diagnostic(format!("error: {err}"));
        self.notice = Some(Notice {
            text: err.user_message(),
            is_error: true,
        });
    }

    fn is_busy(&self) -> bool {
        self.loading_template
            || self.uploading
            || self.generating
            || !self.polishing.is_empty()
            || self.conversation.is_waiting()
    }

    fn refresh_sessions(&mut self) {
        let (sessions, warnings) = self.store.load_all();
        self.sessions = sessions;
        for warning in warnings {
            self.log_diagnostic(format!("session load warning: {warning}"));
        }
    }

    fn persist_conversation(&mut self) {
        if self.conversation.messages().is_empty() {
            return;
        }
        self.current_session
            .record(self.conversation.project_key(), self.conversation.messages());
        if let Err(err) = self.store.save(&self.current_session) {
            self.log_diagnostic(format!("failed to persist session: {err}"));
            return;
        }
        let known = self
            .sessions
            .iter()
            .any(|session| session.session_id == self.current_session.session_id);
        if !known {
            self.refresh_sessions();
        }
    }

    fn open_session(&mut self, session_id: &str) {
        let (session, warning) = self.store.load_one(session_id);
        if let Some(warning) = warning {
            self.log_diagnostic(format!("session load warning: {warning}"));
        }
        match session {
            Some(session) => {
                self.conversation.restore(session.messages.clone());
                self.conversation.select_project(session.project_key.clone());
                self.current_session = session;
                self.scroll_to_bottom = true;
            }
            None => self.notify_error(&ClientError::validation("Session unavailable")),
        }
    }

    fn start_new_session(&mut self) {
        self.conversation.restore(Vec::new());
        self.current_session = ChatSession::new(Self::timestamp());
        self.chat_input.clear();
    }

    fn select_template(&mut self, template_id: String) {
        if self.selected_template.as_deref() == Some(template_id.as_str()) && !self.loading_template {
            return;
        }
        self.loading_template = true;
        self.backend.load_template(&template_id);
        self.selected_template = Some(template_id);
    }

    fn install_template(&mut self, template_id: String, fields: TemplateFields) {
        self.editor = FieldEditor::load(
            Some(template_id.clone()),
            fields.sections(),
            &fields.placeholders,
            &fields.auto_sections,
        );
        self.suggestions.clear();
        self.polishing.clear();

        let summary = if self.editor.has_structured_schema() {
            format!("{} section(s)", self.editor.sections().len())
        } else if self.editor.can_generate() {
            format!("{} placeholder(s)", self.editor.fallback_field_count())
        } else {
            "nothing to fill".to_string()
        };
        self.notify(format!("Loaded {template_id}: {summary}"));
    }

    fn upload(&mut self) {
        let path = PathBuf::from(self.upload_path.trim());
        match self.backend.upload_template(&path) {
            Ok(()) => self.uploading = true,
            Err(err) => self.notify_error(&err),
        }
    }

    fn generate(&mut self) {
        match self
            .editor
            .generate_job(&self.output_filename, &self.config.default_output_filename)
        {
            Ok(job) => {
                self.output_filename = job.output_filename.clone();
                self.generating = true;
                self.backend.generate(job);
            }
            Err(err) => self.notify_error(&err),
        }
    }

    fn send_chat(&mut self) {
        let text = std::mem::take(&mut self.chat_input);
        let document_context = build_document_context(
            self.editor.sections(),
            self.editor.values(),
            self.editor.fallback_fields(),
        );
        if let Some(request) = self.conversation.send_chat_message(&text, &document_context) {
            self.backend.send_chat(self.conversation.generation(), request);
        }
        self.scroll_to_bottom = true;
        self.persist_conversation();
    }

    fn apply_field_edits(&mut self, edits: Vec<FieldEdit>) {
        for edit in edits {
            match &edit {
                FieldEdit::RequestPolish { field } => {
                    let text = self
                        .editor
                        .value(field)
                        .and_then(|value| value.as_text())
                        .unwrap_or("")
                        .to_string();
                    match self.backend.polish(field, &text) {
                        Ok(()) => {
                            self.polishing.insert(field.clone());
                            self.suggestions.remove(field);
                        }
                        Err(err) => self.notify_error(&err),
                    }
                }
                FieldEdit::ApplySuggestion { field, .. } => {
                    if edit.apply(&mut self.editor) {
                        self.suggestions.remove(field);
                    }
                }
                _ => {
                    edit.apply(&mut self.editor);
                }
            }
        }
    }

    fn apply_draft_actions(&mut self, actions: Vec<DraftAction>) {
        let mut changed = false;
        for action in actions {
            match action {
                DraftAction::Summary(id, text) => {
                    changed |= self
                        .conversation
                        .edit_draft(&id, |draft| draft.summary = Some(text));
                }
                DraftAction::Description(id, text) => {
                    changed |= self
                        .conversation
                        .edit_draft(&id, |draft| draft.description = Some(text));
                }
                DraftAction::Priority(id, text) => {
                    changed |= self
                        .conversation
                        .edit_draft(&id, |draft| draft.priority = Some(text));
                }
                DraftAction::Create(id) => {
                    if let Some(request) = self.conversation.create_issue_from_draft(&id) {
                        self.backend.send_chat(self.conversation.generation(), request);
                    }
                    changed = true;
                }
            }
        }
        if changed {
            self.persist_conversation();
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TemplatesLoaded(Ok(templates)) => {
                self.log_diagnostic(format!("{} template(s) available", templates.len()));
                self.templates = templates;
            }
            AppEvent::TemplatesLoaded(Err(err)) => self.notify_error(&err),
            AppEvent::TemplateLoaded {
                template_id,
                result,
            } => {
                if self.selected_template.as_deref() != Some(template_id.as_str()) {
                    warn!(template = %template_id, "ignoring fields of a template that is no longer selected");
                    return;
                }
                self.loading_template = false;
                match result {
                    Ok(fields) => self.install_template(template_id, fields),
                    Err(err) => self.notify_error(&err),
                }
            }
            AppEvent::TemplateUploaded(result) => {
                self.uploading = false;
                let uploaded = result.and_then(|fields| match fields.template_id.clone() {
                    Some(template_id) if !template_id.trim().is_empty() => Ok((template_id, fields)),
                    _ => Err(ClientError::MalformedResponse(
                        "upload answer has no template_id".to_string(),
                    )),
                });
                match uploaded {
                    Ok((template_id, fields)) => {
                        if !self.templates.contains(&template_id) {
                            self.templates.push(template_id.clone());
                            self.templates.sort();
                        }
                        self.selected_template = Some(template_id.clone());
                        self.loading_template = false;
                        self.upload_path.clear();
                        self.install_template(template_id, fields);
                    }
                    Err(err) => self.notify_error(&err),
                }
            }
            AppEvent::DocumentGenerated { filename, result } => {
                self.generating = false;
                match result {
                    Ok(bytes) => match save_document(&self.config.output_dir, &filename, &bytes) {
                        Ok(path) => {
                            info!(path = %path.display(), "document generated");
                            self.notify(format!("Saved {}", path.display()));
                        }
                        Err(err) => {
                            self.log_diagnostic(format!("failed to save {filename}: {err}"));
                            self.notice = Some(Notice {
                                text: format!("Could not save {filename}: {err}"),
                                is_error: true,
                            });
                        }
                    },
                    Err(err) => self.notify_error(&err),
                }
            }
            AppEvent::PolishFinished { field_name, result } => {
                self.polishing.remove(&field_name);
                match result {
                    Ok(suggestions) if suggestions.is_empty() => {
                        self.notify("No suggestions returned");
                    }
                    Ok(suggestions) => {
                        self.suggestions.insert(field_name, suggestions);
                    }
                    Err(err) => self.notify_error(&err),
                }
            }
            AppEvent::ProjectsLoaded(Ok(projects)) => {
                self.log_diagnostic(format!("{} project(s) available", projects.len()));
                self.projects = projects;
            }
            AppEvent::ProjectsLoaded(Err(err)) => {
                self.log_diagnostic(format!("project list unavailable: {err}"));
                self.conversation
                    .push_error(format!("Could not load projects: {}", err.user_message()));
            }
            AppEvent::ComposeFinished {
                generation,
                project_key,
                result,
            } => {
                self.conversation
                    .apply_compose_response(generation, &project_key, result);
                self.scroll_to_bottom = true;
                self.persist_conversation();
            }
            AppEvent::UpdateFinished { generation, result } => {
                self.conversation.apply_update_response(generation, result);
                self.scroll_to_bottom = true;
                self.persist_conversation();
            }
            AppEvent::IssueCreated {
                generation,
                message_id,
                result,
            } => {
                self.conversation
                    .apply_created_issue(generation, &message_id, result);
                self.scroll_to_bottom = true;
                self.persist_conversation();
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("DocPilot");
                ui.separator();
                ui.label(RichText::new(&self.config.backend_url).color(theme.text_muted));
                if self.is_busy() {
                    ui.separator();
                    ui.spinner();
                }
                if let Some(notice) = &self.notice {
                    ui.separator();
                    let color = if notice.is_error {
                        theme.danger
                    } else {
                        theme.success
                    };
                    ui.label(RichText::new(&notice.text).color(color));
                }
            });
        });
    }

    fn render_left_panel(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        egui::SidePanel::left("templates_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Templates");
                if ui.small_button("Refresh").clicked() {
                    self.backend.list_templates();
                }

                let mut clicked_template: Option<String> = None;
                ScrollArea::vertical()
                    .id_salt("template_list")
                    .max_height(220.0)
                    .show(ui, |ui| {
                        if self.templates.is_empty() {
                            ui.label(RichText::new("No templates").color(theme.text_muted));
                        }
                        for template in &self.templates {
                            let selected = self.selected_template.as_deref() == Some(template.as_str());
                            if ui.selectable_label(selected, template).clicked() {
                                clicked_template = Some(template.clone());
                            }
                        }
                    });
                if let Some(template_id) = clicked_template {
                    self.select_template(template_id);
                }

                ui.separator();
                ui.strong("Upload");
                ui.add(
                    egui::TextEdit::singleline(&mut self.upload_path)
                        .hint_text("/path/to/template.docx")
                        .desired_width(f32::INFINITY),
                );
                if ui
                    .add_enabled(
                        !self.uploading && !self.upload_path.trim().is_empty(),
                        egui::Button::new("Upload template"),
                    )
                    .clicked()
                {
                    self.upload();
                }

                ui.separator();
                ui.strong("Generate");
                ui.add(
                    egui::TextEdit::singleline(&mut self.output_filename)
                        .hint_text(self.config.default_output_filename.as_str())
                        .desired_width(f32::INFINITY),
                );
                ui.label(
                    RichText::new(format!("into {}", self.config.output_dir.display()))
                        .color(theme.text_muted)
                        .size(11.0),
                );
                let can_generate = self.editor.can_generate() && !self.generating;
                let label = if self.generating {
                    "Generating..."
                } else {
                    "Generate document"
                };
                if ui.add_enabled(can_generate, theme.primary_button(label)).clicked() {
                    self.generate();
                }

                ui.separator();
                let can_switch = !self.conversation.is_waiting();
                ui.horizontal(|ui| {
                    ui.strong("Sessions");
                    if ui
                        .add_enabled(can_switch, egui::Button::new("New").small())
                        .clicked()
                    {
                        self.start_new_session();
                    }
                });
                let mut clicked_session: Option<String> = None;
                ScrollArea::vertical()
                    .id_salt("session_list")
                    .show(ui, |ui| {
                        for session in &self.sessions {
                            let current = session.session_id == self.current_session.session_id;
                            if ui
                                .add_enabled(
                                    can_switch,
                                    egui::SelectableLabel::new(current, session.display_title()),
                                )
                                .clicked()
                            {
                                clicked_session = Some(session.session_id.clone());
                            }
                        }
                    });
                if let Some(session_id) = clicked_session {
                    self.open_session(&session_id);
                }
            });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let mut draft_actions = Vec::new();
        let mut send_now = false;

        egui::SidePanel::right("chat_panel")
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.heading("Issue assistant");

                let selected_label = self
                    .conversation
                    .project_key()
                    .and_then(|key| self.projects.iter().find(|project| project.key == key))
                    .map(ProjectSummary::display_name)
                    .or_else(|| self.conversation.project_key().map(str::to_string))
                    .unwrap_or_else(|| "Select a project".to_string());
                let mut picked: Option<String> = None;
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt("project_picker")
                        .selected_text(selected_label)
                        .show_ui(ui, |ui| {
                            for project in &self.projects {
                                let selected =
                                    self.conversation.project_key() == Some(project.key.as_str());
                                if ui.selectable_label(selected, project.display_name()).clicked() {
                                    picked = Some(project.key.clone());
                                }
                            }
                        });
                    if ui.small_button("Reload").clicked() {
                        self.backend.list_projects();
                    }
                });
                if let Some(project_key) = picked {
                    self.conversation.select_project(Some(project_key));
                }
                ui.separator();

                let history_height = (ui.available_height() - 90.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_history")
                    .max_height(history_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in self.conversation.messages() {
                            ui.push_id(message.id.as_str(), |ui| {
                                render_message(
                                    ui,
                                    &theme,
                                    message,
                                    self.conversation.is_submitting(&message.id),
                                    &mut draft_actions,
                                );
                            });
                            ui.add_space(theme.spacing_4);
                        }
                        if self.conversation.is_waiting() {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new("Working...").color(theme.text_muted));
                            });
                        }
                        if self.scroll_to_bottom {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });
                self.scroll_to_bottom = false;

                ui.separator();
                let response = ui.add(
                    egui::TextEdit::multiline(&mut self.chat_input)
                        .desired_rows(2)
                        .desired_width(f32::INFINITY)
                        .hint_text("Describe an issue, or e.g. \"assign OPS-12 to Dana\""),
                );
                let enter = response.has_focus()
                    && ui.input(|input| input.key_pressed(egui::Key::Enter) && !input.modifiers.shift);
                let clicked = ui
                    .add_enabled(
                        !self.chat_input.trim().is_empty(),
                        theme.primary_button("Send"),
                    )
                    .clicked();
                send_now = (enter || clicked) && !self.chat_input.trim().is_empty();
            });

        if send_now {
            self.send_chat();
        }
        if !draft_actions.is_empty() {
            self.apply_draft_actions(draft_actions);
        }
    }

    fn render_center_panel(&mut self, ctx: &egui::Context) {
        let theme = self.theme.clone();
        let mut edits = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            let title = self
                .selected_template
                .clone()
                .unwrap_or_else(|| "No template selected".to_string());
            ui.heading(title);
            ui.separator();

            let form_height = (ui.available_height() - 40.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("form")
                .max_height(form_height)
                .show(ui, |ui| {
                    if self.loading_template {
                        ui.spinner();
                    } else if self.editor.template_id().is_some() {
                        let view = FormView {
                            editor: &self.editor,
                            theme: &theme,
                            polishing: &self.polishing,
                            suggestions: &self.suggestions,
                        };
                        view.show(ui, &mut |edit| edits.push(edit));
                    } else {
                        ui.label(
                            RichText::new("Pick a template on the left or upload a .docx file.")
                                .color(theme.text_muted),
                        );
                    }
                });

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(entry);
                            }
                        });
                });
        });

        if !edits.is_empty() {
            self.apply_field_edits(edits);
        }
    }
}

fn render_message(
    ui: &mut egui::Ui,
    theme: &Theme,
    message: &ConversationMessage,
    submitting: bool,
    actions: &mut Vec<DraftAction>,
) {
    let (fill, text_color) = match (message.role, message.kind) {
        (MessageRole::User, _) => (theme.user_bubble, theme.text_primary),
        (_, MessageKind::Error) => (theme.surface_2, theme.danger),
        (_, MessageKind::Status) => (theme.surface_2, theme.success),
        _ => (theme.surface_2, theme.text_primary),
    };

    theme.bubble_frame(fill).show(ui, |ui| {
        ui.set_width(ui.available_width());
        let who = match message.role {
            MessageRole::User => match message.project_key.as_deref() {
                Some(key) => format!("You ({key})"),
                None => "You".to_string(),
            },
            MessageRole::Assistant => "Assistant".to_string(),
        };
        ui.label(RichText::new(who).color(theme.text_muted).size(11.0));

        match (&message.draft, message.kind) {
            (Some(draft), MessageKind::Draft) => {
                render_draft(ui, theme, message, draft, submitting, actions);
            }
            _ => {
                ui.label(RichText::new(&message.content).color(text_color));
            }
        }
    });
}

fn render_draft(
    ui: &mut egui::Ui,
    theme: &Theme,
    message: &ConversationMessage,
    draft: &crate::chat::message::IssueDraft,
    submitting: bool,
    actions: &mut Vec<DraftAction>,
) {
    let project = message.project_key.as_deref().unwrap_or("unknown");
    ui.label(
        RichText::new(format!("Draft for {project}"))
            .color(theme.text_primary)
            .strong(),
    );
    let editable = !message.submitted && !submitting;

    let mut summary = draft.summary_text().to_string();
    if ui
        .add_enabled(
            editable,
            egui::TextEdit::singleline(&mut summary)
                .hint_text("Summary")
                .desired_width(f32::INFINITY),
        )
        .changed()
    {
        actions.push(DraftAction::Summary(message.id.clone(), summary));
    }

    let mut description = draft.description_text().to_string();
    if ui
        .add_enabled(
            editable,
            egui::TextEdit::multiline(&mut description)
                .hint_text("Description")
                .desired_rows(4)
                .desired_width(f32::INFINITY),
        )
        .changed()
    {
        actions.push(DraftAction::Description(message.id.clone(), description));
    }

    let mut priority = draft.priority_text().to_string();
    ui.horizontal(|ui| {
        ui.label(RichText::new("Priority").color(theme.text_muted).size(12.0));
        if ui
            .add_enabled(
                editable,
                egui::TextEdit::singleline(&mut priority).desired_width(120.0),
            )
            .changed()
        {
            actions.push(DraftAction::Priority(message.id.clone(), priority.clone()));
        }
    });

    let details: Vec<String> = [
        ("Type", draft.issue_type.clone()),
        ("Assignee", draft.assignee.clone()),
        ("Epic", draft.epic_key.clone()),
        ("Estimate", draft.estimate.map(|estimate| estimate.to_string())),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|value| format!("{label}: {value}")))
    .chain((!draft.labels.is_empty()).then(|| format!("Labels: {}", draft.labels.join(", "))))
    .chain(
        (!draft.components.is_empty())
            .then(|| format!("Components: {}", draft.components.join(", "))),
    )
    .collect();
    for line in details {
        ui.label(RichText::new(line).color(theme.text_muted).size(12.0));
    }

    if message.submitted {
        ui.label(RichText::new("Created").color(theme.success).size(12.0));
    } else if submitting {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new("Creating...").color(theme.text_muted).size(12.0));
        });
    } else if ui
        .add(egui::Button::new(RichText::new("Create issue").color(Color32::WHITE)).fill(theme.accent_primary))
        .clicked()
    {
        actions.push(DraftAction::Create(message.id.clone()));
    }
}

impl eframe::App for DocPilotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }
        self.drain_events(ctx);
        self.render_top_bar(ctx);
        self.render_left_panel(ctx);
        self.render_chat_panel(ctx);
        self.render_center_panel(ctx);
        if self.is_busy() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

impl Drop for DocPilotApp {
    fn drop(&mut self) {
        self.backend.shutdown();
    }
}
