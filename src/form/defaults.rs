use crate::form::schema::{DeclaredOption, FieldDefinition, FieldKind, GroupDefault, TemplateSection};
use crate::form::value::{CheckboxOption, FieldValue};
use std::collections::{BTreeMap, BTreeSet};

pub fn humanize(name: &str) -> String {
    name.split(['_', '.', '-'])
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn default_for(field: &FieldDefinition) -> FieldValue {
    match &field.kind {
        FieldKind::Text { default }
        | FieldKind::Textarea { default }
        | FieldKind::RichText { default }
        | FieldKind::Radio { default, .. }
        | FieldKind::Select { default, .. } => FieldValue::Text(default.clone()),
        FieldKind::Checkbox { default } => FieldValue::Checkbox(*default),
        FieldKind::List { default } => {
            if default.is_empty() {
                FieldValue::List(vec![String::new()])
            } else {
                FieldValue::List(default.clone())
            }
        }
        FieldKind::Table { default, seed_rows } => {
            FieldValue::Table(default.as_ref().unwrap_or(seed_rows).clone())
        }
        FieldKind::CheckboxGroup { options, default } => FieldValue::CheckboxGroup(
            checkbox_group_default(&field.name, options, default.as_deref()),
        ),
    }
}

pub fn build_defaults(sections: &[TemplateSection]) -> BTreeMap<String, FieldValue> {
    sections
        .iter()
        .flat_map(|section| section.fields.iter())
        .map(|field| (field.name.clone(), default_for(field)))
        .collect()
}

fn checkbox_group_default(
    field_name: &str,
    options: &[DeclaredOption],
    defaults: Option<&[GroupDefault]>,
) -> Vec<CheckboxOption> {
    let declared: Vec<(String, String)> = options
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let value = option
                .value
                .clone()
                .unwrap_or_else(|| format!("{field_name}_option_{index}"));
            let label = option.label.clone().unwrap_or_else(|| humanize(&value));
            (value, label)
        })
        .collect();

    let Some(defaults) = defaults else {
        return declared
            .into_iter()
            .map(|(value, label)| CheckboxOption {
                value,
                text: label.clone(),
                label,
                selected: true,
            })
            .collect();
    };

    let mut merged: Vec<CheckboxOption> = declared
        .iter()
        .map(|(value, label)| match defaults.iter().find(|entry| &entry.value == value) {
            Some(entry) => CheckboxOption {
                value: value.clone(),
                label: label.clone(),
                text: entry
                    .text
                    .clone()
                    .or_else(|| entry.label.clone())
                    .unwrap_or_else(|| label.clone()),
                selected: entry.selected.unwrap_or(true),
            },
            None => CheckboxOption {
                value: value.clone(),
                label: label.clone(),
                text: label.clone(),
                selected: true,
            },
        })
        .collect();

    let mut known: BTreeSet<String> = declared.into_iter().map(|(value, _)| value).collect();
    for entry in defaults {
        if !known.insert(entry.value.clone()) {
            continue;
        }
        let label = entry
            .label
            .clone()
            .or_else(|| entry.text.clone())
            .unwrap_or_else(|| humanize(&entry.value));
        merged.push(CheckboxOption {
            value: entry.value.clone(),
            text: entry.text.clone().unwrap_or_else(|| label.clone()),
            label,
            selected: entry.selected.unwrap_or(true),
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::schema::{parse_field, parse_sections};
    use serde_json::json;

    fn field(raw: serde_json::Value) -> FieldDefinition {
        parse_field(&raw).expect("fixture field should parse")
    }

    fn group(value: FieldValue) -> Vec<CheckboxOption> {
        match value {
            FieldValue::CheckboxGroup(options) => options,
            other => panic!("expected checkbox group, got {}", other.kind_name()),
        }
    }

    #[test]
    fn humanize_splits_on_separators() {
        assert_eq!(humanize("project_scope.in-out"), "Project Scope In Out");
        assert_eq!(humanize("summary"), "Summary");
        assert_eq!(humanize("__a__b"), "A B");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn checkbox_group_without_default_selects_everything() {
        let options = group(default_for(&field(json!({
            "name": "checks",
            "type": "checkbox-group",
            "options": [{"label": "Alpha"}, {"value": "beta"}, {}]
        }))));

        assert_eq!(options.len(), 3);
        assert!(options.iter().all(|option| option.selected));
        assert!(options.iter().all(|option| option.text == option.label));
        assert_eq!(options[0].value, "checks_option_0");
        assert_eq!(options[0].label, "Alpha");
        assert_eq!(options[1].label, "Beta");
        assert_eq!(options[2].value, "checks_option_2");
        assert_eq!(options[2].label, "Checks Option 2");
    }

    #[test]
    fn checkbox_group_default_merges_by_value_and_appends_unknowns_once() {
        let options = group(default_for(&field(json!({
            "name": "checks",
            "type": "checkbox-group",
            "options": [{"value": "a", "label": "A"}, {"value": "b", "label": "B"}],
            "default": [
                {"value": "b", "text": "Bee", "selected": false},
                {"value": "z", "text": "Zed"},
                "y",
                {"value": "z", "text": "Again"}
            ]
        }))));

        let values: Vec<&str> = options.iter().map(|option| option.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "z", "y"]);
        assert!(options[0].selected);
        assert_eq!(options[0].text, "A");
        assert!(!options[1].selected);
        assert_eq!(options[1].text, "Bee");
        assert_eq!(options[2].text, "Zed");
        assert!(options[2].selected);
        assert_eq!(options[3].label, "Y");
    }

    #[test]
    fn table_default_wins_over_rows_and_cells_become_strings() {
        let value = default_for(&field(json!({
            "name": "grid",
            "type": "table",
            "rows": [["seed"]],
            "default": [["a", null], [1, true]]
        })));
        assert_eq!(
            value,
            FieldValue::Table(vec![
                vec!["a".into(), String::new()],
                vec!["1".into(), "true".into()],
            ])
        );

        let seeded = default_for(&field(json!({
            "name": "grid",
            "type": "table",
            "rows": [["seed"]]
        })));
        assert_eq!(seeded, FieldValue::Table(vec![vec!["seed".into()]]));
    }

    #[test]
    fn list_is_never_empty() {
        let empty = default_for(&field(json!({"name": "items", "type": "list", "default": []})));
        assert_eq!(empty, FieldValue::List(vec![String::new()]));

        let filled = default_for(&field(json!({
            "name": "items",
            "type": "list",
            "default": ["one", "two"]
        })));
        assert_eq!(filled, FieldValue::List(vec!["one".into(), "two".into()]));
    }

    #[test]
    fn scalar_kinds_fall_back_to_empty_or_false() {
        assert_eq!(
            default_for(&field(json!({"name": "c", "type": "checkbox"}))),
            FieldValue::Checkbox(false)
        );
        assert_eq!(
            default_for(&field(json!({"name": "c", "type": "checkbox", "default": "yes"}))),
            FieldValue::Checkbox(true)
        );
        assert_eq!(
            default_for(&field(json!({"name": "r", "type": "radio"}))),
            FieldValue::Text(String::new())
        );
        assert_eq!(
            default_for(&field(json!({"name": "t", "type": "richtext", "default": "<p>x</p>"}))),
            FieldValue::Text("<p>x</p>".into())
        );
    }

    #[test]
    fn duplicate_names_keep_last_declaration() {
        let sections = parse_sections(&json!([
            {"section": "One", "fields": [{"name": "dup", "type": "text", "default": "first"}]},
            {"section": "Two", "fields": [{"name": "dup", "type": "checkbox", "default": true}]}
        ]));
        let defaults = build_defaults(&sections);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.get("dup"), Some(&FieldValue::Checkbox(true)));
    }
}
