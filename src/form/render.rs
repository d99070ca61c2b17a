use crate::form::editor::FieldEditor;
use crate::form::schema::{DeclaredOption, FieldDefinition, FieldKind, TemplateSection};
use crate::form::value::FieldValue;
use crate::theme::Theme;
use eframe::egui::{self, RichText};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    SetText { field: String, text: String },
    SetCheckbox { field: String, checked: bool },
    ToggleOption { field: String, option: String },
    SetOptionText { field: String, option: String, text: String },
    SetListItem { field: String, index: usize, text: String },
    AddListItem { field: String },
    RemoveListItem { field: String, index: usize },
    SetCell { field: String, row: usize, column: usize, text: String },
    AddRow { field: String },
    RemoveRow { field: String, index: usize },
    SetFallback { name: String, text: String },
    RequestPolish { field: String },
    ApplySuggestion { field: String, text: String },
}

impl FieldEdit {
    pub fn apply(&self, editor: &mut FieldEditor) -> bool {
        match self {
            Self::SetText { field, text } | Self::ApplySuggestion { field, text } => {
                editor.set_field_value(field, FieldValue::Text(text.clone()))
            }
            Self::SetCheckbox { field, checked } => {
                editor.set_field_value(field, FieldValue::Checkbox(*checked))
            }
            Self::ToggleOption { field, option } => editor.toggle_checkbox_option(field, option),
            Self::SetOptionText {
                field,
                option,
                text,
            } => editor.set_checkbox_text(field, option, text.clone()),
            Self::SetListItem { field, index, text } => {
                editor.set_list_item(field, *index, text.clone())
            }
            Self::AddListItem { field } => editor.add_list_item(field),
            Self::RemoveListItem { field, index } => editor.remove_list_item(field, *index),
            Self::SetCell {
                field,
                row,
                column,
                text,
            } => editor.set_table_cell(field, *row, *column, text.clone()),
            Self::AddRow { field } => editor.add_table_row(field),
            Self::RemoveRow { field, index } => editor.remove_table_row(field, *index),
            Self::SetFallback { name, text } => editor.set_fallback_text(name, text.clone()),
            Self::RequestPolish { .. } => false,
        }
    }
}

pub fn option_pairs(options: &[DeclaredOption]) -> Vec<(String, String)> {
    options
        .iter()
        .filter_map(|option| {
            let value = option.value.clone().or_else(|| option.label.clone())?;
            let label = option.label.clone().unwrap_or_else(|| value.clone());
            Some((value, label))
        })
        .collect()
}

pub struct FormView<'a> {
    pub editor: &'a FieldEditor,
    pub theme: &'a Theme,
    pub polishing: &'a BTreeSet<String>,
    pub suggestions: &'a BTreeMap<String, Vec<String>>,
}

impl FormView<'_> {
    pub fn show(&self, ui: &mut egui::Ui, emit: &mut dyn FnMut(FieldEdit)) {
        if self.editor.has_structured_schema() {
            for section in self.editor.sections() {
                self.render_section(section, ui, emit);
                ui.add_space(self.theme.spacing_12);
            }
        } else {
            self.render_fallback(ui, emit);
        }
    }

    fn render_section(
        &self,
        section: &TemplateSection,
        ui: &mut egui::Ui,
        emit: &mut dyn FnMut(FieldEdit),
    ) {
        let theme = self.theme;
        theme.card_frame().show(ui, |ui| {
            ui.label(
                RichText::new(section.display_title())
                    .color(theme.text_primary)
                    .size(15.0)
                    .strong(),
            );
            if let Some(description) = section.description.as_deref() {
                ui.label(RichText::new(description).color(theme.text_muted).size(12.0));
            }
            ui.add_space(theme.spacing_8);

            ui.vertical(|ui| {
                ui.spacing_mut().item_spacing.y = theme.spacing_8;
                for field in &section.fields {
                    ui.push_id(field.name.as_str(), |ui| {
                        self.render_field(field, ui, emit);
                    });
                }
            });
        });
    }

    fn render_field(&self, field: &FieldDefinition, ui: &mut egui::Ui, emit: &mut dyn FnMut(FieldEdit)) {
        let theme = self.theme;
        let Some(value) = self.editor.value(&field.name) else {
            return;
        };

        if !matches!(field.kind, FieldKind::Checkbox { .. }) {
            ui.label(
                RichText::new(field.display_label())
                    .color(theme.text_muted)
                    .size(12.0),
            );
        }

        match (&field.kind, value) {
            (FieldKind::Text { .. }, FieldValue::Text(text)) => {
                let mut text = text.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY))
                    .changed()
                {
                    emit(FieldEdit::SetText {
                        field: field.name.clone(),
                        text,
                    });
                }
            }
            (FieldKind::Textarea { .. } | FieldKind::RichText { .. }, FieldValue::Text(text)) => {
                let mut text = text.clone();
                if ui
                    .add(
                        egui::TextEdit::multiline(&mut text)
                            .desired_rows(4)
                            .desired_width(f32::INFINITY),
                    )
                    .changed()
                {
                    emit(FieldEdit::SetText {
                        field: field.name.clone(),
                        text,
                    });
                }
            }
            (FieldKind::Radio { options, .. }, FieldValue::Text(current)) => {
                let mut selected = current.clone();
                ui.horizontal_wrapped(|ui| {
                    for (value, label) in option_pairs(options) {
                        ui.radio_value(&mut selected, value, label);
                    }
                });
                if &selected != current {
                    emit(FieldEdit::SetText {
                        field: field.name.clone(),
                        text: selected,
                    });
                }
            }
            (FieldKind::Select { options, .. }, FieldValue::Text(current)) => {
                let pairs = option_pairs(options);
                let mut selected = current.clone();
                let selected_label = pairs
                    .iter()
                    .find(|(value, _)| value == current)
                    .map(|(_, label)| label.clone())
                    .unwrap_or_else(|| current.clone());
                egui::ComboBox::from_id_salt("select")
                    .selected_text(selected_label)
                    .show_ui(ui, |ui| {
                        for (value, label) in pairs {
                            ui.selectable_value(&mut selected, value, label);
                        }
                    });
                if &selected != current {
                    emit(FieldEdit::SetText {
                        field: field.name.clone(),
                        text: selected,
                    });
                }
            }
            (FieldKind::Checkbox { .. }, FieldValue::Checkbox(checked)) => {
                let mut checked = *checked;
                if ui
                    .checkbox(
                        &mut checked,
                        RichText::new(field.display_label())
                            .color(theme.text_primary)
                            .size(13.0),
                    )
                    .changed()
                {
                    emit(FieldEdit::SetCheckbox {
                        field: field.name.clone(),
                        checked,
                    });
                }
            }
            (FieldKind::CheckboxGroup { .. }, FieldValue::CheckboxGroup(options)) => {
                for option in options {
                    ui.push_id(option.value.as_str(), |ui| {
                        ui.horizontal(|ui| {
                            let mut selected = option.selected;
                            if ui.checkbox(&mut selected, "").changed() {
                                emit(FieldEdit::ToggleOption {
                                    field: field.name.clone(),
                                    option: option.value.clone(),
                                });
                            }
                            let mut text = option.text.clone();
                            if ui
                                .add_enabled(
                                    option.selected,
                                    egui::TextEdit::singleline(&mut text)
                                        .desired_width(f32::INFINITY)
                                        .hint_text(option.label.as_str()),
                                )
                                .changed()
                            {
                                emit(FieldEdit::SetOptionText {
                                    field: field.name.clone(),
                                    option: option.value.clone(),
                                    text,
                                });
                            }
                        });
                    });
                }
            }
            (FieldKind::List { .. }, FieldValue::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    ui.push_id(index, |ui| {
                        ui.horizontal(|ui| {
                            let mut text = item.clone();
                            let width = (ui.available_width() - 32.0).max(80.0);
                            if ui
                                .add(egui::TextEdit::singleline(&mut text).desired_width(width))
                                .changed()
                            {
                                emit(FieldEdit::SetListItem {
                                    field: field.name.clone(),
                                    index,
                                    text,
                                });
                            }
                            if ui
                                .add_enabled(items.len() > 1, egui::Button::new("x").small())
                                .clicked()
                            {
                                emit(FieldEdit::RemoveListItem {
                                    field: field.name.clone(),
                                    index,
                                });
                            }
                        });
                    });
                }
                if ui.small_button("Add item").clicked() {
                    emit(FieldEdit::AddListItem {
                        field: field.name.clone(),
                    });
                }
            }
            (FieldKind::Table { .. }, FieldValue::Table(_)) => {
                self.render_table(field, ui, emit);
            }
            (_, other) => {
                ui.label(
                    RichText::new(format!("Unsupported value ({})", other.kind_name()))
                        .color(theme.warning)
                        .size(12.0),
                );
            }
        }

        if let Some(help) = field.help.as_deref() {
            ui.label(RichText::new(help).color(theme.text_muted).size(11.0));
        }
        if field.polishable && value.as_text().is_some() {
            self.render_polish(field, value, ui, emit);
        }
    }

    fn render_table(&self, field: &FieldDefinition, ui: &mut egui::Ui, emit: &mut dyn FnMut(FieldEdit)) {
        let rows = self.editor.table_rows(&field.name);
        let row_count = rows.len();
        for (row_index, row) in rows.iter().enumerate() {
            ui.push_id(row.id.as_str(), |ui| {
                ui.horizontal(|ui| {
                    let columns = row.cells.len().max(1) as f32;
                    let width = ((ui.available_width() - 36.0) / columns).max(60.0);
                    for (column, cell) in row.cells.iter().enumerate() {
                        ui.push_id(cell.id.as_str(), |ui| {
                            let mut text = cell.value.clone();
                            if ui
                                .add(egui::TextEdit::singleline(&mut text).desired_width(width))
                                .changed()
                            {
                                emit(FieldEdit::SetCell {
                                    field: field.name.clone(),
                                    row: row_index,
                                    column,
                                    text,
                                });
                            }
                        });
                    }
                    if ui
                        .add_enabled(row_count > 1, egui::Button::new("x").small())
                        .clicked()
                    {
                        emit(FieldEdit::RemoveRow {
                            field: field.name.clone(),
                            index: row_index,
                        });
                    }
                });
            });
        }
        if ui.small_button("Add row").clicked() {
            emit(FieldEdit::AddRow {
                field: field.name.clone(),
            });
        }
    }

    fn render_polish(
        &self,
        field: &FieldDefinition,
        value: &FieldValue,
        ui: &mut egui::Ui,
        emit: &mut dyn FnMut(FieldEdit),
    ) {
        let theme = self.theme;
        let busy = self.polishing.contains(&field.name);
        let has_text = value.as_text().is_some_and(|text| !text.trim().is_empty());
        ui.horizontal(|ui| {
            let label = if busy { "Polishing..." } else { "Polish" };
            if ui
                .add_enabled(!busy && has_text, egui::Button::new(label).small())
                .clicked()
            {
                emit(FieldEdit::RequestPolish {
                    field: field.name.clone(),
                });
            }
        });

        let Some(suggestions) = self.suggestions.get(&field.name) else {
            return;
        };
        for (index, suggestion) in suggestions.iter().enumerate() {
            ui.push_id(("suggestion", index), |ui| {
                egui::Frame::new()
                    .fill(theme.surface_3)
                    .corner_radius(egui::CornerRadius::same(theme.radius_8))
                    .inner_margin(egui::Margin::same(theme.spacing_8 as i8))
                    .show(ui, |ui| {
                        ui.label(RichText::new(suggestion).color(theme.text_primary).size(13.0));
                        if ui.small_button("Use this").clicked() {
                            emit(FieldEdit::ApplySuggestion {
                                field: field.name.clone(),
                                text: suggestion.clone(),
                            });
                        }
                    });
            });
        }
    }

    fn render_fallback(&self, ui: &mut egui::Ui, emit: &mut dyn FnMut(FieldEdit)) {
        let theme = self.theme;
        let fields = self.editor.fallback_fields();
        if fields.is_empty() {
            ui.label(
                RichText::new("This template has no fields or placeholders.")
                    .color(theme.text_muted)
                    .size(13.0),
            );
            return;
        }

        theme.card_frame().show(ui, |ui| {
            ui.label(
                RichText::new("Placeholders")
                    .color(theme.text_primary)
                    .size(15.0)
                    .strong(),
            );
            for field in fields {
                ui.push_id(field.name.as_str(), |ui| {
                    ui.label(
                        RichText::new(crate::form::defaults::humanize(&field.name))
                            .color(theme.text_muted)
                            .size(12.0),
                    );
                    let mut text = field.text.clone();
                    if ui
                        .add(
                            egui::TextEdit::multiline(&mut text)
                                .desired_rows(2)
                                .desired_width(f32::INFINITY),
                        )
                        .changed()
                    {
                        emit(FieldEdit::SetFallback {
                            name: field.name.clone(),
                            text,
                        });
                    }
                });
            }
        });
    }
}
