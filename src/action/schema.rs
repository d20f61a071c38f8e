//! Action metadata schema.
//!
//! Configuration records carry their action list as a JSON string; after
//! merging it is deserialized into [`ActionDescriptor`] chains. The `type`
//! discriminant is an explicit enum so a typo'd kind cannot silently fall
//! through a string switch — unknown kinds land in [`ActionKind::Custom`]
//! and route to the parent-notification fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::error::ActionError;
use crate::platform::DmlOperation;

// ================================
// Action kind
// ================================

/// Discriminant of an [`ActionDescriptor`].
///
/// Application-defined kinds deserialize into `Custom` and are forwarded to
/// the hosting container instead of failing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Navigation,
    Open,
    Edit,
    #[serde(rename = "openURL")]
    OpenUrl,
    Flow,
    Create,
    Update,
    #[serde(rename = "LDS")]
    Lds,
    #[serde(rename = "DML")]
    Dml,
    Apex,
    LdsForm,
    DmlForm,
    ApexForm,
    #[serde(rename = "massDML")]
    MassDml,
    MassApex,
    MassForm,
    MassApexForm,
    ShowDetails,
    Upload,
    Download,
    Reload,
    Done,
    Toast,
    Utility,
    #[serde(rename = "action")]
    ActionMessage,
    Notify,
    Clipboard,
    #[serde(untagged)]
    Custom(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Navigation => "navigation",
            ActionKind::Open => "open",
            ActionKind::Edit => "edit",
            ActionKind::OpenUrl => "openURL",
            ActionKind::Flow => "flow",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Lds => "LDS",
            ActionKind::Dml => "DML",
            ActionKind::Apex => "apex",
            ActionKind::LdsForm => "ldsForm",
            ActionKind::DmlForm => "dmlForm",
            ActionKind::ApexForm => "apexForm",
            ActionKind::MassDml => "massDML",
            ActionKind::MassApex => "massApex",
            ActionKind::MassForm => "massForm",
            ActionKind::MassApexForm => "massApexForm",
            ActionKind::ShowDetails => "showDetails",
            ActionKind::Upload => "upload",
            ActionKind::Download => "download",
            ActionKind::Reload => "reload",
            ActionKind::Done => "done",
            ActionKind::Toast => "toast",
            ActionKind::Utility => "utility",
            ActionKind::ActionMessage => "action",
            ActionKind::Notify => "notify",
            ActionKind::Clipboard => "clipboard",
            ActionKind::Custom(s) => s,
        }
    }

    /// Kinds that operate on the external record selection.
    pub fn is_mass(&self) -> bool {
        matches!(
            self,
            ActionKind::MassDml
                | ActionKind::MassApex
                | ActionKind::MassForm
                | ActionKind::MassApexForm
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ================================
// Action descriptor
// ================================

/// One unit of work in an action chain.
///
/// `next` runs after the action completes, `error` replaces the default
/// toast when a gateway call fails. All remaining configuration fields are
/// captured in `extra` and passed through untouched.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<ActionDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Box<ActionDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionDescriptor>,
    /// `true`/`false` or a condition string evaluated against the merge
    /// context when the configuration enables evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ActionDescriptor {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            name: None,
            label: None,
            params: Value::Null,
            next: None,
            error: None,
            channel: None,
            selection: None,
            hidden: None,
            disabled: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    pub fn with_next(mut self, next: ActionDescriptor) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn with_error(mut self, error: ActionDescriptor) -> Self {
        self.error = Some(Box::new(error));
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_selection(mut self, selection: SelectionDescriptor) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Deserializes `params` into a kind-specific shape.
    ///
    /// Missing or invalid required fields are configuration bugs; null params
    /// read as an empty object so all-optional shapes parse.
    pub fn parse_params<T: serde::de::DeserializeOwned>(&self) -> Result<T, ActionError> {
        let params = match &self.params {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| {
            ActionError::ConfigError(format!("invalid '{}' action params: {e}", self.kind))
        })
    }

    /// Confirmation knobs, tolerant of params that carry none.
    pub fn confirm_params(&self) -> ConfirmParams {
        serde_json::from_value(self.params.clone()).unwrap_or_default()
    }
}

// ================================
// Selection descriptor
// ================================

/// How the external record selection is projected into an action's payload.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub selection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Project a single field into a flat value list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Project several fields into a list of sub-objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Template merged under each `fields` projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
    #[serde(default)]
    pub allow_none: bool,
}

// ================================
// Mass-operation template
// ================================

/// Per-record payload template for mass operations.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MassActionTemplate {
    /// Base payload copied into every output record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
    /// Selected-record fields to copy, source name to target name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_mapping: Option<HashMap<String, String>>,
    /// Renames applied to user-entered form fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_mapping: Option<HashMap<String, String>>,
}

// ================================
// Kind-specific params
// ================================

/// Confirmation step shared by the execute-style kinds.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmParams {
    #[serde(default)]
    pub bypass_confirm: bool,
    #[serde(default)]
    pub confirm_title: Option<String>,
    #[serde(default)]
    pub confirm_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrlParams {
    pub url: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FlowParams {
    pub name: String,
    #[serde(default)]
    pub inputs: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
}

/// `create`/`update` payload.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordParams {
    pub record: Value,
}

/// `LDS` payload: explicit operation through the record gateway.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LdsParams {
    pub operation: DmlOperation,
    pub record: Value,
}

/// `DML` payload: bulk operation through the DML executor.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DmlParams {
    pub operation: DmlOperation,
    #[serde(default)]
    pub records: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApexParams {
    pub name: String,
    /// Invocation payload. When absent, the whole params object is sent.
    #[serde(default)]
    pub params: Value,
}

/// Form-backed kinds: the modal collects input, then the named follow-up
/// executes with the form output.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub fields: Vec<Value>,
    /// `ldsForm`/`dmlForm` operation.
    #[serde(default)]
    pub operation: Option<DmlOperation>,
    /// `apexForm` action name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Mass-operation params: expansion template plus execution knobs.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MassParams {
    /// `insert`/`update`/`delete` for the DML kinds. Matched by name so an
    /// unknown operation reports as unsupported rather than unparseable.
    #[serde(default)]
    pub operation: Option<String>,
    /// Lookup field receiving each selected record's id. Required for
    /// `insert`, implied `Id` for `update`.
    #[serde(default)]
    pub lookup: Option<String>,
    /// `massApex`/`massApexForm` action name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
    #[serde(flatten)]
    pub template: MassActionTemplate,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DownloadParams {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    /// Selection field holding one content-version id per record.
    #[serde(default)]
    pub selected_versions_field: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReloadParams {
    #[serde(default)]
    pub record_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardParams {
    pub text: String,
}

/// `utility`/`action`/`notify` payload.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChannelParams {
    /// Nested action payload republished to the receiving component.
    #[serde(default)]
    pub action: Option<Value>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailsParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_kind_deserializes_platform_names() {
        assert_eq!(
            serde_json::from_value::<ActionKind>(json!("openURL")).unwrap(),
            ActionKind::OpenUrl
        );
        assert_eq!(
            serde_json::from_value::<ActionKind>(json!("LDS")).unwrap(),
            ActionKind::Lds
        );
        assert_eq!(
            serde_json::from_value::<ActionKind>(json!("massDML")).unwrap(),
            ActionKind::MassDml
        );
        assert_eq!(
            serde_json::from_value::<ActionKind>(json!("showDetails")).unwrap(),
            ActionKind::ShowDetails
        );
        assert_eq!(
            serde_json::from_value::<ActionKind>(json!("action")).unwrap(),
            ActionKind::ActionMessage
        );
    }

    #[test]
    fn test_action_kind_unknown_becomes_custom() {
        let kind: ActionKind = serde_json::from_value(json!("customWidgetThing")).unwrap();
        assert_eq!(kind, ActionKind::Custom("customWidgetThing".into()));
        assert_eq!(kind.as_str(), "customWidgetThing");
    }

    #[test]
    fn test_action_kind_serializes_back_to_platform_names() {
        assert_eq!(
            serde_json::to_value(ActionKind::OpenUrl).unwrap(),
            json!("openURL")
        );
        assert_eq!(
            serde_json::to_value(ActionKind::Custom("x".into())).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_descriptor_deserializes_chain() {
        let action: ActionDescriptor = serde_json::from_value(json!({
            "type": "toast",
            "name": "notifyUser",
            "params": {"title": "Done", "message": "Saved"},
            "next": {"type": "done", "params": {"tab": "refresh"}},
            "icon": "utility:check"
        }))
        .unwrap();
        assert_eq!(action.kind, ActionKind::Toast);
        assert_eq!(action.name.as_deref(), Some("notifyUser"));
        let next = action.next.as_ref().unwrap();
        assert_eq!(next.kind, ActionKind::Done);
        assert_eq!(action.extra["icon"], json!("utility:check"));
    }

    #[test]
    fn test_parse_params_missing_required_field_is_config_error() {
        let action = ActionDescriptor::new(ActionKind::OpenUrl).with_params(json!({}));
        let err = action.parse_params::<OpenUrlParams>().unwrap_err();
        assert!(matches!(err, crate::error::ActionError::ConfigError(_)));
        assert!(err.to_string().contains("openURL"));
    }

    #[test]
    fn test_parse_params_null_reads_as_empty_object() {
        let action = ActionDescriptor::new(ActionKind::Reload);
        let params: ReloadParams = action.parse_params().unwrap();
        assert!(params.record_id.is_none());
    }

    #[test]
    fn test_confirm_params_defaults() {
        let action = ActionDescriptor::new(ActionKind::Dml).with_params(json!({
            "operation": "delete",
            "records": [{"Id": "001"}],
            "bypassConfirm": true
        }));
        let confirm = action.confirm_params();
        assert!(confirm.bypass_confirm);
        assert!(confirm.confirm_message.is_none());
        let bare = ActionDescriptor::new(ActionKind::Apex).confirm_params();
        assert!(!bare.bypass_confirm);
    }

    #[test]
    fn test_selection_descriptor_camel_case() {
        let sel: SelectionDescriptor = serde_json::from_value(json!({
            "field": "Amount",
            "maxRows": 5,
            "allowNone": true
        }))
        .unwrap();
        assert_eq!(sel.field.as_deref(), Some("Amount"));
        assert_eq!(sel.max_rows, Some(5));
        assert!(sel.allow_none);
    }

    #[test]
    fn test_mass_params_flatten_template() {
        let params: MassParams = serde_json::from_value(json!({
            "operation": "insert",
            "lookup": "AccountId",
            "record": {"Status__c": "New"},
            "rowMapping": {"Name": "AccountName__c"}
        }))
        .unwrap();
        assert_eq!(params.operation.as_deref(), Some("insert"));
        assert_eq!(params.template.record, Some(json!({"Status__c": "New"})));
        assert_eq!(
            params.template.row_mapping.unwrap()["Name"],
            "AccountName__c"
        );
    }
}
