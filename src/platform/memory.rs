//! In-memory gateway implementations.
//!
//! Deterministic stand-ins for every gateway trait, used by this crate's
//! tests and exported for embedders who need the same thing. `Static*` types
//! serve canned data; `Recording*` types capture what the dispatcher did so
//! assertions can replay it.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::gateway::{
    ApexInvoker, Clipboard, ConfigProvider, DmlExecutor, Navigator, Presenter, Publisher,
    RecordFetcher, RecordGateway,
};
use super::types::{
    ChannelMessage, ConfirmRequest, DetailsRequest, DmlOperation, FieldSpec, FormRequest,
    PageReference, ParentEvent, Toast, UploadRequest,
};
use crate::config::RawActionConfig;
use crate::error::GatewayError;

fn record_key(object: &str, record_id: &str) -> (String, String) {
    (object.to_string(), record_id.to_string())
}

/// Record fetcher backed by a static record set.
///
/// Records are keyed by `(object, record id)`. Value projections walk the
/// record by dotted path and come back nested, the way the live gateway
/// returns relationship queries; label projections read a parallel label map
/// and come back flat under their alias.
#[derive(Default)]
pub struct StaticRecordFetcher {
    records: HashMap<(String, String), Value>,
    labels: HashMap<(String, String), Value>,
    calls: AtomicUsize,
}

impl StaticRecordFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, object: &str, record_id: &str, record: Value) -> Self {
        self.records.insert(record_key(object, record_id), record);
        self
    }

    pub fn with_labels(mut self, object: &str, record_id: &str, labels: Value) -> Self {
        self.labels.insert(record_key(object, record_id), labels);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn path_value(data: &Value, path: &str) -> Option<Value> {
    let mut current = data;
    for seg in path.split('.') {
        current = current.get(seg)?;
    }
    Some(current.clone())
}

fn insert_nested(out: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            out.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = slot {
                insert_nested(inner, rest, value);
            }
        }
    }
}

#[async_trait]
impl RecordFetcher for StaticRecordFetcher {
    async fn fetch_fields(
        &self,
        object: &str,
        record_id: &str,
        fields: &[FieldSpec],
    ) -> Result<Value, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = record_key(object, record_id);
        let record = self
            .records
            .get(&key)
            .ok_or_else(|| GatewayError::new(format!("record not found: {object}/{record_id}")))?;
        let mut out = Map::new();
        for spec in fields {
            if spec.label {
                let label = self
                    .labels
                    .get(&key)
                    .and_then(|labels| path_value(labels, &spec.path))
                    .unwrap_or(Value::Null);
                out.insert(spec.response_key().to_string(), label);
            } else if let Some(value) = path_value(record, &spec.path) {
                insert_nested(&mut out, &spec.path, value);
            }
        }
        Ok(Value::Object(out))
    }
}

/// Config provider backed by static configuration records and token values.
#[derive(Default)]
pub struct StaticConfigProvider {
    configs: HashMap<String, RawActionConfig>,
    token_values: HashMap<String, HashMap<String, Value>>,
    config_calls: AtomicUsize,
    token_calls: AtomicUsize,
}

impl StaticConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, name: &str, config: RawActionConfig) -> Self {
        self.configs.insert(name.to_string(), config);
        self
    }

    /// Registers token values for one domain from a JSON object.
    pub fn with_token_values(mut self, domain: &str, values: Value) -> Self {
        let fields = values
            .as_object()
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        self.token_values.insert(domain.to_string(), fields);
        self
    }

    pub fn config_fetch_count(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }

    pub fn token_fetch_count(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigProvider for StaticConfigProvider {
    async fn fetch_action_config(&self, name: &str) -> Result<RawActionConfig, GatewayError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        self.configs
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::new(format!("configuration not found: {name}")))
    }

    async fn fetch_token_values(
        &self,
        request: &HashMap<String, Vec<String>>,
    ) -> Result<HashMap<String, HashMap<String, Value>>, GatewayError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let mut response = HashMap::new();
        for (domain, fields) in request {
            let Some(known) = self.token_values.get(domain) else {
                continue;
            };
            let mut resolved = HashMap::new();
            for field in fields {
                if let Some(value) = known.get(field) {
                    resolved.insert(field.clone(), value.clone());
                }
            }
            response.insert(domain.clone(), resolved);
        }
        Ok(response)
    }
}

/// Recording single-record gateway.
///
/// Successful creates answer with `{"id": "created-<n>"}` unless a response
/// is scripted; updates echo the record back.
#[derive(Default)]
pub struct RecordingRecordGateway {
    pub created: Mutex<Vec<Value>>,
    pub updated: Mutex<Vec<Value>>,
    pub deleted: Mutex<Vec<String>>,
    pub notified: Mutex<Vec<Vec<String>>>,
    response: Mutex<Option<Value>>,
    failure: Mutex<Option<Value>>,
}

impl RecordingRecordGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response of the next create/update call.
    pub fn respond_with(self, response: Value) -> Self {
        *self.response.lock() = Some(response);
        self
    }

    /// Makes every call fail with the given error payload.
    pub fn fail_with(self, payload: Value) -> Self {
        *self.failure.lock() = Some(payload);
        self
    }

    fn check_failure(&self) -> Result<(), GatewayError> {
        match self.failure.lock().clone() {
            Some(payload) => Err(GatewayError::from_payload(payload)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordGateway for RecordingRecordGateway {
    async fn create_record(&self, record: &Value) -> Result<Value, GatewayError> {
        self.check_failure()?;
        let mut created = self.created.lock();
        created.push(record.clone());
        let scripted = self.response.lock().clone();
        Ok(scripted.unwrap_or_else(|| json!({ "id": format!("created-{}", created.len()) })))
    }

    async fn update_record(&self, record: &Value) -> Result<Value, GatewayError> {
        self.check_failure()?;
        self.updated.lock().push(record.clone());
        let scripted = self.response.lock().clone();
        Ok(scripted.unwrap_or_else(|| record.clone()))
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), GatewayError> {
        self.check_failure()?;
        self.deleted.lock().push(record_id.to_string());
        Ok(())
    }

    async fn notify_change(&self, record_ids: &[String]) -> Result<(), GatewayError> {
        self.check_failure()?;
        self.notified.lock().push(record_ids.to_vec());
        Ok(())
    }
}

/// Recording bulk DML executor.
#[derive(Default)]
pub struct RecordingDmlExecutor {
    pub executed: Mutex<Vec<(DmlOperation, Vec<Value>)>>,
    response: Mutex<Option<Value>>,
    failure: Mutex<Option<Value>>,
}

impl RecordingDmlExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(self, response: Value) -> Self {
        *self.response.lock() = Some(response);
        self
    }

    pub fn fail_with(self, payload: Value) -> Self {
        *self.failure.lock() = Some(payload);
        self
    }
}

#[async_trait]
impl DmlExecutor for RecordingDmlExecutor {
    async fn execute(
        &self,
        operation: DmlOperation,
        records: &[Value],
    ) -> Result<Value, GatewayError> {
        if let Some(payload) = self.failure.lock().clone() {
            return Err(GatewayError::from_payload(payload));
        }
        self.executed.lock().push((operation, records.to_vec()));
        let scripted = self.response.lock().clone();
        Ok(scripted.unwrap_or_else(|| json!({ "processed": records.len() })))
    }
}

/// Recording Apex invoker.
#[derive(Default)]
pub struct RecordingApexInvoker {
    pub invoked: Mutex<Vec<(String, Value)>>,
    response: Mutex<Option<Value>>,
    failure: Mutex<Option<Value>>,
}

impl RecordingApexInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(self, response: Value) -> Self {
        *self.response.lock() = Some(response);
        self
    }

    pub fn fail_with(self, payload: Value) -> Self {
        *self.failure.lock() = Some(payload);
        self
    }
}

#[async_trait]
impl ApexInvoker for RecordingApexInvoker {
    async fn invoke(&self, action: &str, params: &Value) -> Result<Value, GatewayError> {
        if let Some(payload) = self.failure.lock().clone() {
            return Err(GatewayError::from_payload(payload));
        }
        self.invoked
            .lock()
            .push((action.to_string(), params.clone()));
        Ok(self.response.lock().clone().unwrap_or(Value::Null))
    }
}

/// Recording navigator.
#[derive(Default)]
pub struct RecordingNavigator {
    pub pages: Mutex<Vec<PageReference>>,
    pub urls: Mutex<Vec<(String, String)>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, page: &PageReference) -> Result<(), GatewayError> {
        self.pages.lock().push(page.clone());
        Ok(())
    }

    async fn open_url(&self, url: &str, target: &str) -> Result<(), GatewayError> {
        self.urls.lock().push((url.to_string(), target.to_string()));
        Ok(())
    }
}

/// Presenter with scripted confirm/form/upload answers.
///
/// Confirms default to accepted; form and upload responses default to
/// cancelled (`None`) until scripted.
pub struct ScriptedPresenter {
    confirm_response: Mutex<bool>,
    form_response: Mutex<Option<Value>>,
    upload_response: Mutex<Option<Value>>,
    pub confirms: Mutex<Vec<ConfirmRequest>>,
    pub forms: Mutex<Vec<FormRequest>>,
    pub details: Mutex<Vec<DetailsRequest>>,
    pub uploads: Mutex<Vec<UploadRequest>>,
    pub toasts: Mutex<Vec<Toast>>,
}

impl Default for ScriptedPresenter {
    fn default() -> Self {
        Self {
            confirm_response: Mutex::new(true),
            form_response: Mutex::new(None),
            upload_response: Mutex::new(None),
            confirms: Mutex::new(Vec::new()),
            forms: Mutex::new(Vec::new()),
            details: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            toasts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirm(self, accepted: bool) -> Self {
        *self.confirm_response.lock() = accepted;
        self
    }

    pub fn with_form_response(self, response: Value) -> Self {
        *self.form_response.lock() = Some(response);
        self
    }

    pub fn with_upload_response(self, response: Value) -> Self {
        *self.upload_response.lock() = Some(response);
        self
    }
}

#[async_trait]
impl Presenter for ScriptedPresenter {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<bool, GatewayError> {
        self.confirms.lock().push(request.clone());
        Ok(*self.confirm_response.lock())
    }

    async fn present_form(&self, request: &FormRequest) -> Result<Option<Value>, GatewayError> {
        self.forms.lock().push(request.clone());
        Ok(self.form_response.lock().clone())
    }

    async fn show_details(&self, request: &DetailsRequest) -> Result<(), GatewayError> {
        self.details.lock().push(request.clone());
        Ok(())
    }

    async fn upload_file(&self, request: &UploadRequest) -> Result<Option<Value>, GatewayError> {
        self.uploads.lock().push(request.clone());
        Ok(self.upload_response.lock().clone())
    }

    async fn toast(&self, toast: &Toast) {
        self.toasts.lock().push(toast.clone());
    }
}

/// Recording channel publisher.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(String, ChannelMessage)>>,
    pub parent_events: Mutex<Vec<ParentEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, channel: &str, message: &ChannelMessage) -> Result<(), GatewayError> {
        self.published
            .lock()
            .push((channel.to_string(), message.clone()));
        Ok(())
    }

    async fn notify_parent(&self, event: &ParentEvent) -> Result<(), GatewayError> {
        self.parent_events.lock().push(event.clone());
        Ok(())
    }
}

/// Clipboard that stores the last copied text.
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn copy_text(&self, text: &str) -> Result<(), GatewayError> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}
