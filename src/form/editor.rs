use crate::error::ClientError;
use crate::form::defaults::build_defaults;
use crate::form::identity::{self, IdentifiedRow, TableIdentity};
use crate::form::schema::{AutoSection, FieldDefinition, TemplateSection};
use crate::form::value::FieldValue;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

pub const DOCX_EXTENSION: &str = ".docx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackField {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratePayload {
    Fields(BTreeMap<String, FieldValue>),
    Data(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateJob {
    pub template_id: String,
    pub payload: GeneratePayload,
    pub output_filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct FieldEditor {
    template_id: Option<String>,
    sections: Vec<TemplateSection>,
    definitions: BTreeMap<String, FieldDefinition>,
    values: BTreeMap<String, FieldValue>,
    fallback: Vec<FallbackField>,
    tables: BTreeMap<String, TableIdentity>,
}

impl FieldEditor {
    pub fn load(
        template_id: Option<String>,
        sections: Vec<TemplateSection>,
        placeholders: &[String],
        auto_sections: &[AutoSection],
    ) -> Self {
        let values = build_defaults(&sections);
        let definitions: BTreeMap<String, FieldDefinition> = sections
            .iter()
            .flat_map(|section| section.fields.iter())
            .map(|field| (field.name.clone(), field.clone()))
            .collect();

        let mut seen: BTreeSet<String> = BTreeSet::new();
        let fallback = placeholders
            .iter()
            .filter(|name| !name.trim().is_empty() && seen.insert(name.to_string()))
            .map(|name| FallbackField {
                name: name.clone(),
                text: auto_sections
                    .iter()
                    .find(|section| &section.id == name)
                    .and_then(|section| section.default_text.clone())
                    .unwrap_or_default(),
            })
            .collect();

        let mut editor = Self {
            template_id,
            sections,
            definitions,
            values,
            fallback,
            tables: BTreeMap::new(),
        };
        let table_names: Vec<String> = editor
            .definitions
            .values()
            .filter(|field| field.is_table())
            .map(|field| field.name.clone())
            .collect();
        for name in table_names {
            editor.sync_table(&name);
        }

        debug!(
            template = editor.template_id.as_deref().unwrap_or("-"),
            fields = editor.values.len(),
            fallback = editor.fallback.len(),
            "loaded field editor"
        );
        editor
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn sections(&self) -> &[TemplateSection] {
        &self.sections
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn fallback_fields(&self) -> &[FallbackField] {
        &self.fallback
    }

    pub fn has_structured_schema(&self) -> bool {
        self.sections.iter().any(|section| !section.fields.is_empty())
    }

    pub fn fallback_field_count(&self) -> usize {
        self.fallback.len()
    }

    pub fn can_generate(&self) -> bool {
        self.template_id.is_some() && (self.has_structured_schema() || !self.fallback.is_empty())
    }

    pub fn set_field_value(&mut self, name: &str, value: FieldValue) -> bool {
        let Some(current) = self.values.get(name) else {
            warn!(field = %name, "ignoring edit for undeclared field");
            return false;
        };
        if current.kind_name() != value.kind_name() {
            warn!(
                field = %name,
                expected = current.kind_name(),
                actual = value.kind_name(),
                "ignoring edit with mismatched value kind"
            );
            return false;
        }

        let is_table = matches!(value, FieldValue::Table(_));
        self.values.insert(name.to_string(), value);
        if is_table {
            self.sync_table(name);
        }
        true
    }

    pub fn set_fallback_text(&mut self, name: &str, text: impl Into<String>) -> bool {
        match self.fallback.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn toggle_checkbox_option(&mut self, name: &str, option_value: &str) -> bool {
        let Some(FieldValue::CheckboxGroup(options)) = self.values.get_mut(name) else {
            return false;
        };
        match options.iter_mut().find(|option| option.value == option_value) {
            Some(option) => {
                option.selected = !option.selected;
                true
            }
            None => false,
        }
    }

    pub fn set_checkbox_text(&mut self, name: &str, option_value: &str, text: impl Into<String>) -> bool {
        let Some(FieldValue::CheckboxGroup(options)) = self.values.get_mut(name) else {
            return false;
        };
        match options.iter_mut().find(|option| option.value == option_value) {
            Some(option) => {
                option.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn set_list_item(&mut self, name: &str, index: usize, text: impl Into<String>) -> bool {
        let Some(FieldValue::List(items)) = self.values.get_mut(name) else {
            return false;
        };
        match items.get_mut(index) {
            Some(item) => {
                *item = text.into();
                true
            }
            None => false,
        }
    }

    pub fn add_list_item(&mut self, name: &str) -> bool {
        let Some(FieldValue::List(items)) = self.values.get_mut(name) else {
            return false;
        };
        items.push(String::new());
        true
    }

    pub fn remove_list_item(&mut self, name: &str, index: usize) -> bool {
        let Some(FieldValue::List(items)) = self.values.get_mut(name) else {
            return false;
        };
        if items.len() <= 1 || index >= items.len() {
            return false;
        }
        items.remove(index);
        true
    }

    pub fn set_table_cell(&mut self, name: &str, row: usize, column: usize, text: impl Into<String>) -> bool {
        let Some(FieldValue::Table(rows)) = self.values.get(name) else {
            return false;
        };
        let mut next = rows.clone();
        let Some(cell) = next.get_mut(row).and_then(|cells| cells.get_mut(column)) else {
            debug!(field = %name, row, column, "ignoring out of range cell edit");
            return false;
        };
        *cell = text.into();
        self.set_field_value(name, FieldValue::Table(next))
    }

    pub fn add_table_row(&mut self, name: &str) -> bool {
        let Some(FieldValue::Table(rows)) = self.values.get(name) else {
            return false;
        };
        let seed_columns = self
            .definitions
            .get(name)
            .map(FieldDefinition::seed_column_count)
            .unwrap_or(1);
        let state = self.table_state(name);
        let snapshot = identity::add_row(&state, rows, seed_columns);
        self.values
            .insert(name.to_string(), FieldValue::Table(snapshot.rows));
        self.tables.insert(name.to_string(), snapshot.identity);
        true
    }

    pub fn remove_table_row(&mut self, name: &str, index: usize) -> bool {
        let Some(FieldValue::Table(rows)) = self.values.get(name) else {
            return false;
        };
        let before = rows.len();
        let state = self.table_state(name);
        let snapshot = identity::remove_row(&state, rows, index);
        let removed = snapshot.rows.len() < before;
        self.values
            .insert(name.to_string(), FieldValue::Table(snapshot.rows));
        self.tables.insert(name.to_string(), snapshot.identity);
        removed
    }

    pub fn table_rows(&self, name: &str) -> Vec<IdentifiedRow> {
        match (self.values.get(name), self.tables.get(name)) {
            (Some(FieldValue::Table(rows)), Some(state)) => state.annotate(rows),
            _ => Vec::new(),
        }
    }

    pub fn generate_job(&self, requested_filename: &str, default_filename: &str) -> Result<GenerateJob, ClientError> {
        let Some(template_id) = self.template_id.clone() else {
            return Err(ClientError::validation("Select or upload a template first"));
        };

        let payload = if self.has_structured_schema() {
            GeneratePayload::Fields(self.values.clone())
        } else if !self.fallback.is_empty() {
            GeneratePayload::Data(
                self.fallback
                    .iter()
                    .map(|field| (field.name.clone(), field.text.clone()))
                    .collect(),
            )
        } else {
            return Err(ClientError::validation(
                "This template has no fields or placeholders to fill",
            ));
        };

        Ok(GenerateJob {
            template_id,
            payload,
            output_filename: normalize_filename(requested_filename, default_filename),
        })
    }

    fn table_state(&self, name: &str) -> TableIdentity {
        self.tables
            .get(name)
            .cloned()
            .unwrap_or_else(|| TableIdentity::new(name))
    }

    fn sync_table(&mut self, name: &str) {
        let Some(FieldValue::Table(rows)) = self.values.get(name) else {
            return;
        };
        let next = identity::reconcile(&self.table_state(name), name, rows);
        self.tables.insert(name.to_string(), next);
    }
}

pub fn normalize_filename(raw: &str, default_filename: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default_filename.to_string();
    }
    if trimmed.to_ascii_lowercase().ends_with(DOCX_EXTENSION) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{DOCX_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::parse_sections;
    use crate::form::value::CheckboxOption;
    use serde_json::json;

    fn editor() -> FieldEditor {
        let sections = parse_sections(&json!([
            {
                "section": "Plan",
                "fields": [
                    {"name": "summary", "type": "textarea", "default": "Draft"},
                    {"name": "grid", "type": "table", "default": [["A", "1"], ["B", "2"], ["C", "3"]]},
                    {"name": "checks", "type": "checkbox-group", "options": [{"value": "x", "label": "X"}]},
                    {"name": "steps", "type": "list"},
                    {"name": "done", "type": "checkbox"}
                ]
            }
        ]));
        FieldEditor::load(Some("plan.docx".into()), sections, &[], &[])
    }

    fn row_ids(editor: &FieldEditor, name: &str) -> Vec<String> {
        editor
            .table_rows(name)
            .into_iter()
            .map(|row| row.id.to_string())
            .collect()
    }

    #[test]
    fn normalize_filename_appends_extension_and_defaults() {
        assert_eq!(normalize_filename("report", "generated.docx"), "report.docx");
        assert_eq!(normalize_filename("report.docx", "generated.docx"), "report.docx");
        assert_eq!(normalize_filename("REPORT.DOCX", "generated.docx"), "REPORT.DOCX");
        assert_eq!(normalize_filename("  ", "generated.docx"), "generated.docx");
        assert_eq!(normalize_filename("", "generated.docx"), "generated.docx");
    }

    #[test]
    fn every_declared_field_gets_exactly_one_value() {
        let editor = editor();
        let names: Vec<&str> = editor.values().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["checks", "done", "grid", "steps", "summary"]);
    }

    #[test]
    fn unknown_names_and_mismatched_kinds_are_rejected() {
        let mut editor = editor();
        assert!(!editor.set_field_value("nope", FieldValue::Text("x".into())));
        assert!(!editor.set_field_value("summary", FieldValue::Checkbox(true)));
        assert!(editor.value("nope").is_none());
        assert!(editor.set_field_value("summary", FieldValue::Text("Final".into())));
        assert_eq!(editor.value("summary"), Some(&FieldValue::Text("Final".into())));
    }

    #[test]
    fn table_row_removal_keeps_surviving_identities() {
        let mut editor = editor();
        let before = row_ids(&editor, "grid");
        assert_eq!(before.len(), 3);

        assert!(editor.remove_table_row("grid", 1));
        assert_eq!(row_ids(&editor, "grid"), vec![before[0].clone(), before[2].clone()]);
        assert_eq!(
            editor.value("grid"),
            Some(&FieldValue::Table(vec![
                vec!["A".into(), "1".into()],
                vec!["C".into(), "3".into()],
            ]))
        );
    }

    #[test]
    fn table_row_addition_copies_column_count() {
        let mut editor = editor();
        let before = row_ids(&editor, "grid");
        assert!(editor.add_table_row("grid"));
        let after = row_ids(&editor, "grid");
        assert_eq!(&after[..3], &before[..]);
        assert!(!before.contains(&after[3]));
        let rows = editor.table_rows("grid");
        assert_eq!(rows[3].cells.len(), 2);
        assert!(rows[3].cells.iter().all(|cell| cell.value.is_empty()));
    }

    #[test]
    fn cell_edits_keep_identities() {
        let mut editor = editor();
        let before = editor.table_rows("grid");
        assert!(editor.set_table_cell("grid", 0, 1, "changed"));
        assert!(!editor.set_table_cell("grid", 9, 0, "nope"));
        let after = editor.table_rows("grid");
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].cells[1].id, before[0].cells[1].id);
        assert_eq!(after[0].cells[1].value, "changed");
    }

    #[test]
    fn wholesale_table_replacement_is_reconciled() {
        let mut editor = editor();
        let before = row_ids(&editor, "grid");
        assert!(editor.set_field_value("grid", FieldValue::Table(vec![vec!["Z".into()]])));
        assert_eq!(row_ids(&editor, "grid"), vec![before[0].clone()]);
    }

    #[test]
    fn checkbox_group_edits_address_options_by_value() {
        let mut editor = editor();
        assert!(editor.toggle_checkbox_option("checks", "x"));
        assert!(editor.set_checkbox_text("checks", "x", "Custom"));
        assert!(!editor.toggle_checkbox_option("checks", "missing"));
        assert_eq!(
            editor.value("checks"),
            Some(&FieldValue::CheckboxGroup(vec![CheckboxOption {
                value: "x".into(),
                label: "X".into(),
                text: "Custom".into(),
                selected: false,
            }]))
        );
    }

    #[test]
    fn list_keeps_one_entry() {
        let mut editor = editor();
        assert!(!editor.remove_list_item("steps", 0));
        assert!(editor.add_list_item("steps"));
        assert!(editor.set_list_item("steps", 1, "second"));
        assert!(editor.remove_list_item("steps", 0));
        assert_eq!(editor.value("steps"), Some(&FieldValue::List(vec!["second".into()])));
    }

    #[test]
    fn empty_upload_disables_generation() {
        let editor = FieldEditor::load(Some("blank.docx".into()), Vec::new(), &[], &[]);
        assert!(!editor.has_structured_schema());
        assert_eq!(editor.fallback_field_count(), 0);
        assert!(!editor.can_generate());
        assert!(matches!(
            editor.generate_job("out", "generated.docx"),
            Err(ClientError::ValidationGap(_))
        ));
    }

    #[test]
    fn fallback_fields_are_seeded_from_auto_sections() {
        let auto = vec![AutoSection {
            id: "intro".into(),
            heading: Some("Intro".into()),
            default_text: Some("Hello".into()),
        }];
        let placeholders = vec!["intro".to_string(), "client".to_string(), "intro".to_string()];
        let mut editor = FieldEditor::load(Some("t.docx".into()), Vec::new(), &placeholders, &auto);

        assert_eq!(editor.fallback_field_count(), 2);
        assert!(editor.can_generate());
        assert!(editor.set_fallback_text("client", "ACME"));

        let job = editor
            .generate_job("", "generated.docx")
            .expect("fallback job should build");
        assert_eq!(job.output_filename, "generated.docx");
        let GeneratePayload::Data(data) = job.payload else {
            panic!("expected fallback data payload");
        };
        assert_eq!(data.get("intro").map(String::as_str), Some("Hello"));
        assert_eq!(data.get("client").map(String::as_str), Some("ACME"));
    }

    #[test]
    fn generation_requires_a_template() {
        let editor = FieldEditor::default();
        assert!(matches!(
            editor.generate_job("x", "generated.docx"),
            Err(ClientError::ValidationGap(_))
        ));
    }
}
