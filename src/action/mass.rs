//! Expands a record selection into per-record operation payloads.

use serde_json::{Map, Value};

use super::schema::MassActionTemplate;

/// Input-record fields never copied into a payload; they describe the form
/// record itself, not user data.
const RESERVED_INPUT_FIELDS: [&str; 2] = ["ObjectApiName", "RecordTypeId"];

/// Builds one payload per selected record.
///
/// Each payload starts as a copy of the template record, receives the
/// selected record's id under `lookup`, then row-mapped fields from the
/// selected record, then the user-entered `input` fields (renamed through
/// the field mapping where configured). Output order matches selection
/// order and duplicate selected ids produce duplicate payloads.
pub fn expand_mass_records(
    template: &MassActionTemplate,
    selection: &[Value],
    input: Option<&Value>,
    lookup: &str,
) -> Vec<Value> {
    selection
        .iter()
        .map(|selected| {
            let mut out = match &template.record {
                Some(Value::Object(base)) => base.clone(),
                _ => Map::new(),
            };

            if let Some(id) = selected.get("Id") {
                if !id.is_null() {
                    out.insert(lookup.to_string(), id.clone());
                }
            }

            if let Some(mapping) = &template.row_mapping {
                for (source, target) in mapping {
                    if let Some(v) = selected.get(source) {
                        out.insert(target.clone(), v.clone());
                    }
                }
            }

            if let Some(Value::Object(fields)) = input {
                for (name, v) in fields {
                    if RESERVED_INPUT_FIELDS.contains(&name.as_str()) {
                        continue;
                    }
                    let target = template
                        .field_mapping
                        .as_ref()
                        .and_then(|m| m.get(name))
                        .unwrap_or(name);
                    out.insert(target.clone(), v.clone());
                }
            }

            Value::Object(out)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_expansion_preserves_order_and_count() {
        let template = MassActionTemplate::default();
        let selection = vec![json!({"Id": "1"}), json!({"Id": "2"})];
        let input = json!({"Name": "X"});

        let out = expand_mass_records(&template, &selection, Some(&input), "AccountId");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], json!({"AccountId": "1", "Name": "X"}));
        assert_eq!(out[1], json!({"AccountId": "2", "Name": "X"}));
    }

    #[test]
    fn test_template_record_seeds_every_payload() {
        let template = MassActionTemplate {
            record: Some(json!({"Status__c": "New"})),
            ..Default::default()
        };
        let selection = vec![json!({"Id": "7"})];

        let out = expand_mass_records(&template, &selection, None, "CaseId");
        assert_eq!(out[0], json!({"Status__c": "New", "CaseId": "7"}));
    }

    #[test]
    fn test_row_mapping_copies_and_renames_selected_fields() {
        let template = MassActionTemplate {
            row_mapping: Some(HashMap::from([
                ("Name".to_string(), "AccountName__c".to_string()),
                ("Missing__c".to_string(), "Other__c".to_string()),
            ])),
            ..Default::default()
        };
        let selection = vec![json!({"Id": "1", "Name": "Acme"})];

        let out = expand_mass_records(&template, &selection, None, "AccountId");
        assert_eq!(out[0]["AccountName__c"], "Acme");
        assert!(out[0].get("Other__c").is_none());
    }

    #[test]
    fn test_input_fields_renamed_and_reserved_names_skipped() {
        let template = MassActionTemplate {
            field_mapping: Some(HashMap::from([(
                "Comment".to_string(),
                "Description".to_string(),
            )])),
            ..Default::default()
        };
        let selection = vec![json!({"Id": "1"})];
        let input = json!({
            "Comment": "hello",
            "Priority": "High",
            "ObjectApiName": "Task",
            "RecordTypeId": "012"
        });

        let out = expand_mass_records(&template, &selection, Some(&input), "WhatId");
        assert_eq!(
            out[0],
            json!({"WhatId": "1", "Description": "hello", "Priority": "High"})
        );
    }

    #[test]
    fn test_input_overwrites_template_values() {
        let template = MassActionTemplate {
            record: Some(json!({"Priority": "Low"})),
            ..Default::default()
        };
        let selection = vec![json!({"Id": "1"})];
        let input = json!({"Priority": "High"});

        let out = expand_mass_records(&template, &selection, Some(&input), "Id");
        assert_eq!(out[0]["Priority"], "High");
    }

    #[test]
    fn test_duplicate_ids_produce_duplicate_payloads() {
        let template = MassActionTemplate::default();
        let selection = vec![json!({"Id": "1"}), json!({"Id": "1"})];

        let out = expand_mass_records(&template, &selection, None, "AccountId");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], out[1]);
    }

    #[test]
    fn test_selected_record_without_id_leaves_lookup_unset() {
        let template = MassActionTemplate::default();
        let selection = vec![json!({"Name": "NoId"})];

        let out = expand_mass_records(&template, &selection, None, "AccountId");
        assert_eq!(out[0], json!({}));
    }
}
