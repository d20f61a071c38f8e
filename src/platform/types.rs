//! Wire types shared with the host platform.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Reserved channel for utility-bar messages.
pub const UTILITY_CHANNEL: &str = "utility";

/// One field projection requested from the record fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Dotted field path on the object (`Account.Owner.Name`).
    pub path: String,
    /// Response key when it differs from the path (label projections).
    pub alias: Option<String>,
    /// Request the translated label instead of the raw value.
    pub label: bool,
}

impl FieldSpec {
    pub fn value(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            label: false,
        }
    }

    pub fn labeled(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
            label: true,
        }
    }

    /// Key under which the value appears in the fetch response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.path)
    }
}

/// Navigation target in the host application's page-reference form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReference {
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default)]
    pub attributes: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl PageReference {
    pub fn record_page(record_id: &str, action_name: &str) -> Self {
        Self {
            page_type: "standard__recordPage".into(),
            attributes: json!({ "recordId": record_id, "actionName": action_name }),
            state: None,
        }
    }

    /// Applies host workarounds before navigation.
    ///
    /// Object-page `new` references must not carry `defaultFieldValues`
    /// entries with empty values; the host rejects the whole navigation when
    /// a bare `key=` fragment is present.
    pub fn normalized(mut self) -> Self {
        if self.page_type != "standard__objectPage" {
            return self;
        }
        let is_new = self.attributes.get("actionName").and_then(Value::as_str) == Some("new");
        if !is_new {
            return self;
        }
        let Some(state) = self.state.as_mut() else {
            return self;
        };
        let Some(dfv) = state.get_mut("defaultFieldValues") else {
            return self;
        };
        match dfv {
            Value::String(s) => {
                let kept: Vec<&str> = s
                    .split(',')
                    .filter(|frag| !frag.is_empty() && !frag.trim_end().ends_with('='))
                    .collect();
                *dfv = Value::String(kept.join(","));
            }
            Value::Object(map) => {
                map.retain(|_, v| match v {
                    Value::Null => false,
                    Value::String(s) => !s.is_empty(),
                    _ => true,
                });
            }
            _ => {}
        }
        self
    }
}

/// Transient message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub variant: ToastVariant,
    #[serde(default)]
    pub mode: ToastMode,
}

impl Toast {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Info,
            mode: ToastMode::Dismissable,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Warning,
            mode: ToastMode::Dismissable,
        }
    }

    /// Error toasts stick until dismissed.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Error,
            mode: ToastMode::Sticky,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastMode {
    #[default]
    Dismissable,
    Sticky,
}

/// Confirmation prompt raised before a guarded execute step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
}

/// Modal form presented to collect user input before an execute step.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    pub kind: FormKind,
    pub title: Option<String>,
    /// Seed record the form edits (field defaults).
    pub record: Value,
    /// Field descriptors, passed through to the host form component.
    pub fields: Vec<Value>,
    /// Extra inputs (flow input variables, selection projections).
    pub inputs: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    /// Screen flow launched by API name.
    Flow { name: String },
    /// Plain record form.
    Record,
}

impl FormRequest {
    pub fn flow(name: impl Into<String>, title: Option<String>, inputs: Option<Value>) -> Self {
        Self {
            kind: FormKind::Flow { name: name.into() },
            title,
            record: Value::Null,
            fields: Vec::new(),
            inputs,
        }
    }

    pub fn record(title: Option<String>, record: Value, fields: Vec<Value>) -> Self {
        Self {
            kind: FormKind::Record,
            title,
            record,
            fields,
            inputs: None,
        }
    }
}

/// Read-only detail modal.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub fields: Vec<Value>,
    pub context: Option<Value>,
}

/// File upload dialog bound to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub record_id: String,
    /// Raw action params, passed through to the host dialog.
    pub params: Value,
}

/// Payload published on an action channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub action: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Event bubbled to the hosting container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentEvent {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

/// Bulk data operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmlOperation {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for DmlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DmlOperation::Insert => write!(f, "insert"),
            DmlOperation::Update => write!(f, "update"),
            DmlOperation::Delete => write!(f, "delete"),
        }
    }
}
