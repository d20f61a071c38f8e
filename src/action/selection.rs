//! Projects the external record selection into action payloads.

use serde_json::{Map, Value};

use super::schema::SelectionDescriptor;
use crate::error::ActionError;

/// Formats a selection according to its descriptor.
///
/// An empty selection is a precondition violation unless `allow_none` is
/// set, and `max_rows` caps the accepted count. A `field` descriptor yields
/// a flat value list, `fields` yields one sub-object per record merged over
/// the optional `record` template, and a bare descriptor passes the records
/// through unchanged.
pub fn format_selection(
    desc: &SelectionDescriptor,
    records: &[Value],
) -> Result<Value, ActionError> {
    if records.is_empty() && !desc.allow_none {
        return Err(ActionError::NoRecordSelected);
    }
    if let Some(max) = desc.max_rows {
        if records.len() > max {
            return Err(ActionError::TooManyRecords {
                count: records.len(),
                max,
            });
        }
    }

    if let Some(field) = &desc.field {
        let values = records
            .iter()
            .map(|r| r.get(field).cloned().unwrap_or(Value::Null))
            .collect();
        return Ok(Value::Array(values));
    }

    if let Some(fields) = &desc.fields {
        let rows = records
            .iter()
            .map(|r| {
                let mut row = match &desc.record {
                    Some(Value::Object(template)) => template.clone(),
                    _ => Map::new(),
                };
                for field in fields {
                    if let Some(v) = r.get(field) {
                        row.insert(field.clone(), v.clone());
                    }
                }
                Value::Object(row)
            })
            .collect();
        return Ok(Value::Array(rows));
    }

    Ok(Value::Array(records.to_vec()))
}
