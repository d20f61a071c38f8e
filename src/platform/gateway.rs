//! Gateway traits in front of the host platform.
//!
//! Every side effect the pipeline can take goes through one of these traits,
//! so embedders decide how records, navigation, modals, and channels are
//! actually wired. All methods return [`GatewayError`] on failure; the
//! dispatcher turns those into toasts or error continuations.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::types::{
    ConfirmRequest, DetailsRequest, DmlOperation, FieldSpec, FormRequest, PageReference, Toast,
    UploadRequest,
};
use super::{ChannelMessage, ParentEvent};
use crate::config::RawActionConfig;
use crate::error::GatewayError;

/// Reads record fields for the merge engine.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetches the given field projections for one record.
    ///
    /// The response maps each spec's response key to its value. Relationship
    /// paths may come back nested (`{"Account": {"Name": ...}}`); the caller
    /// walks them.
    async fn fetch_fields(
        &self,
        object: &str,
        record_id: &str,
        fields: &[FieldSpec],
    ) -> Result<Value, GatewayError>;
}

/// Loads action-bar configuration records and configuration-domain tokens.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Loads one configuration by developer name.
    async fn fetch_action_config(&self, name: &str) -> Result<RawActionConfig, GatewayError>;

    /// Resolves configuration-domain token values. Requests are batched
    /// across domains: `{domain: [field, ...]}` in, `{domain: {field: value}}`
    /// out. Fields the provider does not know are omitted from the response.
    async fn fetch_token_values(
        &self,
        request: &HashMap<String, Vec<String>>,
    ) -> Result<HashMap<String, HashMap<String, Value>>, GatewayError>;
}

/// Single-record operations against the host's record cache.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn create_record(&self, record: &Value) -> Result<Value, GatewayError>;
    async fn update_record(&self, record: &Value) -> Result<Value, GatewayError>;
    async fn delete_record(&self, record_id: &str) -> Result<(), GatewayError>;
    /// Invalidates cached copies of the given records in the host UI.
    async fn notify_change(&self, record_ids: &[String]) -> Result<(), GatewayError>;
}

/// Bulk data operations.
#[async_trait]
pub trait DmlExecutor: Send + Sync {
    async fn execute(
        &self,
        operation: DmlOperation,
        records: &[Value],
    ) -> Result<Value, GatewayError>;
}

/// Server-side action invocation.
#[async_trait]
pub trait ApexInvoker: Send + Sync {
    async fn invoke(&self, action: &str, params: &Value) -> Result<Value, GatewayError>;
}

/// Page and URL navigation.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, page: &PageReference) -> Result<(), GatewayError>;
    async fn open_url(&self, url: &str, target: &str) -> Result<(), GatewayError>;
}

/// User-facing modals and toasts.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Asks the user to confirm a guarded step.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<bool, GatewayError>;

    /// Presents a modal form; `None` means the user cancelled.
    async fn present_form(&self, request: &FormRequest) -> Result<Option<Value>, GatewayError>;

    async fn show_details(&self, request: &DetailsRequest) -> Result<(), GatewayError>;

    /// Presents a file upload dialog; `None` means the user cancelled.
    async fn upload_file(&self, request: &UploadRequest) -> Result<Option<Value>, GatewayError>;

    /// Raises a transient toast. Infallible: hosts drop toasts they cannot show.
    async fn toast(&self, toast: &Toast);
}

/// Channel publication and parent-container notification.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, message: &ChannelMessage) -> Result<(), GatewayError>;
    async fn notify_parent(&self, event: &ParentEvent) -> Result<(), GatewayError>;
}

/// System clipboard access.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn copy_text(&self, text: &str) -> Result<(), GatewayError>;
}
