//! Action dispatch — the chain execution driver.
//!
//! The [`ActionDispatcher`] interprets one [`ActionDescriptor`] chain per
//! user interaction: it executes the leaf, then follows `next` with the
//! propagated context, or `error` with the failure payload when a gateway
//! call rejects. Chains are walked iteratively through a work slot rather
//! than by recursion, so chain depth is bounded by configuration instead of
//! the stack.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::mass::expand_mass_records;
use super::schema::{
    ActionDescriptor, ActionKind, ApexParams, ChannelParams, ClipboardParams, DetailsParams,
    DmlParams, DownloadParams, FlowParams, FormParams, LdsParams, MassParams, OpenUrlParams,
    RecordParams, ReloadParams,
};
use super::selection::format_selection;
use super::url::{document_download_url, rewrite_url_macros, version_download_url};
use crate::error::{ActionError, ActionResult};
use crate::platform::{
    ApexInvoker, ChannelMessage, Clipboard, ConfirmRequest, DetailsRequest, DmlExecutor,
    DmlOperation, FormRequest, Navigator, PageReference, ParentEvent, Presenter, Publisher,
    RecordGateway, Toast, UploadRequest, UTILITY_CHANNEL,
};
use crate::runtime::{IdGenerator, UuidIdGenerator};

const CONFIRM_DECLINED: &str = "confirmation declined";
const FORM_CANCELLED: &str = "form cancelled";
const UPLOAD_CANCELLED: &str = "upload cancelled";

/// How `dispatch` behaves when called while another chain is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Overlapping chains run independently; the last completion wins.
    #[default]
    Allow,
    /// A second dispatch fails fast with [`ActionError::ChainInFlight`].
    Reject,
}

/// Dispatcher limits and policies.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Upper bound on executed steps per chain, continuations included.
    pub max_chain_steps: usize,
    pub overlap: OverlapPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_chain_steps: 64,
            overlap: OverlapPolicy::Allow,
        }
    }
}

/// Ambient state of the hosting component during a dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchScope {
    pub record_id: Option<String>,
    pub object_api_name: Option<String>,
    pub user_id: Option<String>,
    /// Externally-supplied record selection for mass kinds.
    pub selection: Vec<Value>,
}

impl DispatchScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, object: impl Into<String>, record_id: impl Into<String>) -> Self {
        self.object_api_name = Some(object.into());
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_selection(mut self, selection: Vec<Value>) -> Self {
        self.selection = selection;
        self
    }
}

/// What one executed chain step did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Leaf finished; chaining continues into `next`.
    Completed,
    /// Gateway failure transferred control to the `error` continuation.
    Recovered(String),
    /// Gateway failure with no continuation; surfaced as an error toast.
    Failed(String),
    /// Chain stopped early (declined confirmation, cancelled modal).
    Halted(String),
}

/// One executed step in a dispatch report.
#[derive(Debug, Clone)]
pub struct DispatchStep {
    pub id: String,
    pub kind: ActionKind,
    pub name: Option<String>,
    pub outcome: StepOutcome,
}

/// Trace of one dispatch call, in execution order.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub steps: Vec<DispatchStep>,
}

impl DispatchReport {
    /// Whether the chain ran to its end without failing or halting.
    pub fn completed(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.outcome, StepOutcome::Completed | StepOutcome::Recovered(_)))
    }

    pub fn last_outcome(&self) -> Option<&StepOutcome> {
        self.steps.last().map(|s| &s.outcome)
    }
}

/// Side-effect collaborators behind the dispatcher.
#[derive(Clone)]
pub struct DispatchGateways {
    pub navigator: Arc<dyn Navigator>,
    pub record_gateway: Arc<dyn RecordGateway>,
    pub dml_executor: Arc<dyn DmlExecutor>,
    pub apex_invoker: Arc<dyn ApexInvoker>,
    pub presenter: Arc<dyn Presenter>,
    pub publisher: Arc<dyn Publisher>,
    pub clipboard: Arc<dyn Clipboard>,
}

enum LeafOutcome {
    /// Leaf done; `Some` replaces the chain context for `next`.
    Completed(Option<Value>),
    /// Stop the chain without error.
    Halted(&'static str),
}

/// Interprets action chains against the gateway collaborators.
pub struct ActionDispatcher {
    gateways: DispatchGateways,
    id_generator: Arc<dyn IdGenerator>,
    config: DispatchConfig,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a rejecting dispatch ends, normally or not.
struct FlightSlot<'a> {
    flag: Option<&'a AtomicBool>,
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        if let Some(flag) = self.flag {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

impl ActionDispatcher {
    pub fn new(gateways: DispatchGateways) -> Self {
        Self {
            gateways,
            id_generator: Arc::new(UuidIdGenerator),
            config: DispatchConfig::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Executes an action chain.
    ///
    /// Configuration and precondition violations return `Err` before side
    /// effects; runtime gateway failures stay inside the report, transferring
    /// control to the action's `error` continuation when one is configured
    /// and raising an error toast otherwise.
    pub async fn dispatch(
        &self,
        action: &ActionDescriptor,
        scope: &DispatchScope,
        context: Option<Value>,
    ) -> ActionResult<DispatchReport> {
        let _slot = self.claim_slot()?;

        let mut report = DispatchReport::default();
        let mut pending = Some((action.clone(), context));
        let mut steps = 0usize;

        while let Some((action, context)) = pending.take() {
            steps += 1;
            if steps > self.config.max_chain_steps {
                return Err(ActionError::ChainLimitExceeded(self.config.max_chain_steps));
            }

            let action = self.apply_selection(action, scope)?;
            let step_id = self.id_generator.next_id();
            debug!(step = %step_id, kind = %action.kind, "dispatching action");

            let outcome = self.execute_leaf(&action, scope, context.as_ref()).await;
            let step_kind = action.kind.clone();
            let step_name = action.name.clone();

            match outcome {
                Ok(LeafOutcome::Completed(result)) => {
                    report.steps.push(DispatchStep {
                        id: step_id,
                        kind: step_kind,
                        name: step_name,
                        outcome: StepOutcome::Completed,
                    });
                    if let Some(next) = action.next {
                        pending = Some((*next, result.or(context)));
                    }
                }
                Ok(LeafOutcome::Halted(reason)) => {
                    debug!(step = %step_id, reason, "action chain halted");
                    report.steps.push(DispatchStep {
                        id: step_id,
                        kind: step_kind,
                        name: step_name,
                        outcome: StepOutcome::Halted(reason.to_string()),
                    });
                }
                Err(ActionError::GatewayError(failure)) => {
                    let message = failure.message();
                    warn!(step = %step_id, kind = %step_kind, error = %message, "action failed");
                    if let Some(handler) = action.error {
                        report.steps.push(DispatchStep {
                            id: step_id,
                            kind: step_kind,
                            name: step_name,
                            outcome: StepOutcome::Recovered(message),
                        });
                        pending = Some((*handler, Some(failure.into_payload())));
                    } else {
                        self.gateways
                            .presenter
                            .toast(&Toast::error("Action failed", message.clone()))
                            .await;
                        report.steps.push(DispatchStep {
                            id: step_id,
                            kind: step_kind,
                            name: step_name,
                            outcome: StepOutcome::Failed(message),
                        });
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Ok(report)
    }

    fn claim_slot(&self) -> ActionResult<FlightSlot<'_>> {
        match self.config.overlap {
            OverlapPolicy::Allow => Ok(FlightSlot { flag: None }),
            OverlapPolicy::Reject => {
                if self
                    .in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    return Err(ActionError::ChainInFlight);
                }
                Ok(FlightSlot {
                    flag: Some(&self.in_flight),
                })
            }
        }
    }

    /// Injects the formatted selection into the action's params under the
    /// descriptor's name (`selection` by default).
    fn apply_selection(
        &self,
        mut action: ActionDescriptor,
        scope: &DispatchScope,
    ) -> ActionResult<ActionDescriptor> {
        let Some(desc) = &action.selection else {
            return Ok(action);
        };
        let formatted = format_selection(desc, &scope.selection)?;
        let key = desc.name.clone().unwrap_or_else(|| "selection".to_string());
        match &mut action.params {
            Value::Object(map) => {
                map.insert(key, formatted);
            }
            Value::Null => {
                let mut map = Map::new();
                map.insert(key, formatted);
                action.params = Value::Object(map);
            }
            _ => {
                return Err(ActionError::ConfigError(format!(
                    "'{}' action params must be an object to receive a selection",
                    action.kind
                )));
            }
        }
        Ok(action)
    }

    async fn execute_leaf(
        &self,
        action: &ActionDescriptor,
        scope: &DispatchScope,
        context: Option<&Value>,
    ) -> ActionResult<LeafOutcome> {
        match &action.kind {
            ActionKind::Navigation => {
                let page: PageReference = action.parse_params()?;
                self.gateways.navigator.navigate(&page.normalized()).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Open => self.open_record(action, scope, context, "view").await,
            ActionKind::Edit => self.open_record(action, scope, context, "edit").await,
            ActionKind::OpenUrl => {
                let params: OpenUrlParams = action.parse_params()?;
                let url = rewrite_url_macros(&params.url);
                let target = params.target.as_deref().unwrap_or("_blank");
                self.gateways.navigator.open_url(&url, target).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Flow => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: FlowParams = action.parse_params()?;
                let request = FormRequest::flow(params.name, params.title, params.inputs);
                match self.gateways.presenter.present_form(&request).await? {
                    Some(output) => Ok(LeafOutcome::Completed(Some(output))),
                    None => Ok(LeafOutcome::Halted(FORM_CANCELLED)),
                }
            }
            ActionKind::Create => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: RecordParams = action.parse_params()?;
                let created = self.gateways.record_gateway.create_record(&params.record).await?;
                Ok(LeafOutcome::Completed(Some(created)))
            }
            ActionKind::Update => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: RecordParams = action.parse_params()?;
                let updated = self.gateways.record_gateway.update_record(&params.record).await?;
                Ok(LeafOutcome::Completed(Some(updated)))
            }
            ActionKind::Lds => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: LdsParams = action.parse_params()?;
                let result = self.run_record_operation(params.operation, params.record).await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::Dml => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: DmlParams = action.parse_params()?;
                if params.records.is_empty() {
                    return Err(ActionError::ConfigError(
                        "'DML' action requires records".to_string(),
                    ));
                }
                let result = self
                    .gateways
                    .dml_executor
                    .execute(params.operation, &params.records)
                    .await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::Apex => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: ApexParams = action.parse_params()?;
                // Without a nested payload the params object itself is the
                // invocation argument, so injected selections stay visible.
                let payload = match params.params {
                    Value::Null => action.params.clone(),
                    configured => configured,
                };
                let result = self
                    .gateways
                    .apex_invoker
                    .invoke(&params.name, &payload)
                    .await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::LdsForm | ActionKind::DmlForm => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: FormParams = action.parse_params()?;
                let operation = params.operation.ok_or_else(|| {
                    ActionError::ConfigError(format!(
                        "'{}' action requires an operation",
                        action.kind
                    ))
                })?;
                let record = params.record.ok_or_else(|| {
                    ActionError::ConfigError(format!("'{}' action requires a record", action.kind))
                })?;
                if params.fields.is_empty() {
                    return Err(ActionError::ConfigError(format!(
                        "'{}' action requires fields",
                        action.kind
                    )));
                }
                let request = FormRequest::record(params.title, record.clone(), params.fields);
                let Some(output) = self.gateways.presenter.present_form(&request).await? else {
                    return Ok(LeafOutcome::Halted(FORM_CANCELLED));
                };
                let payload = overlay(record, output);
                let result = if action.kind == ActionKind::LdsForm {
                    self.run_record_operation(operation, payload).await?
                } else {
                    self.gateways
                        .dml_executor
                        .execute(operation, std::slice::from_ref(&payload))
                        .await?
                };
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::ApexForm => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let params: FormParams = action.parse_params()?;
                let name = params.name.ok_or_else(|| {
                    ActionError::ConfigError("'apexForm' action requires a name".to_string())
                })?;
                if params.fields.is_empty() {
                    return Err(ActionError::ConfigError(
                        "'apexForm' action requires fields".to_string(),
                    ));
                }
                let record = params.record.unwrap_or_else(|| json!({}));
                let request = FormRequest::record(params.title, record.clone(), params.fields);
                let Some(output) = self.gateways.presenter.present_form(&request).await? else {
                    return Ok(LeafOutcome::Halted(FORM_CANCELLED));
                };
                let result = self
                    .gateways
                    .apex_invoker
                    .invoke(&name, &overlay(record, output))
                    .await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::MassDml
            | ActionKind::MassApex
            | ActionKind::MassForm
            | ActionKind::MassApexForm => self.execute_mass(action, scope).await,
            ActionKind::ShowDetails => {
                let params: DetailsParams = action.parse_params()?;
                let request = DetailsRequest {
                    title: params.title,
                    message: params.message,
                    fields: params.fields,
                    context: context.cloned(),
                };
                self.gateways.presenter.show_details(&request).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Upload => {
                let record_id = context_id(context)
                    .or_else(|| scope.record_id.clone())
                    .ok_or_else(|| {
                        ActionError::ConfigError(
                            "'upload' action requires a record id from context or scope"
                                .to_string(),
                        )
                    })?;
                let request = UploadRequest {
                    record_id,
                    params: action.params.clone(),
                };
                match self.gateways.presenter.upload_file(&request).await? {
                    Some(_) => Ok(LeafOutcome::Completed(None)),
                    None => Ok(LeafOutcome::Halted(UPLOAD_CANCELLED)),
                }
            }
            ActionKind::Download => {
                let params: DownloadParams = action.parse_params()?;
                let url = download_target(&params, scope)?;
                self.gateways.navigator.open_url(&url, "_blank").await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Reload => {
                let params: ReloadParams = action.parse_params()?;
                let record_id = params
                    .record_id
                    .or_else(|| context_id(context))
                    .or_else(|| scope.record_id.clone())
                    .ok_or_else(|| {
                        ActionError::ConfigError("'reload' action requires a record id".to_string())
                    })?;
                self.gateways.record_gateway.notify_change(&[record_id]).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Done => {
                let event = ParentEvent {
                    name: "done".to_string(),
                    payload: action.params.clone(),
                    context: context.cloned(),
                };
                self.gateways.publisher.notify_parent(&event).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Toast => {
                let toast: Toast = action.parse_params()?;
                self.gateways.presenter.toast(&toast).await;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Utility | ActionKind::ActionMessage | ActionKind::Notify => {
                let params: ChannelParams = action.parse_params()?;
                let channel = if action.kind == ActionKind::Utility {
                    UTILITY_CHANNEL.to_string()
                } else {
                    action
                        .channel
                        .clone()
                        .or(params.channel)
                        .ok_or_else(|| {
                            ActionError::ConfigError(format!(
                                "'{}' action requires a channel",
                                action.kind
                            ))
                        })?
                };
                let message = ChannelMessage {
                    action: params.action.unwrap_or_else(|| action.params.clone()),
                    context: context.cloned(),
                };
                self.gateways.publisher.publish(&channel, &message).await?;
                Ok(LeafOutcome::Completed(None))
            }
            ActionKind::Clipboard => {
                let params: ClipboardParams = action.parse_params()?;
                self.gateways.clipboard.copy_text(&params.text).await?;
                Ok(LeafOutcome::Completed(None))
            }
            // Escape hatch: application-defined kinds bubble to the container.
            ActionKind::Custom(name) => {
                let event = ParentEvent {
                    name: name.clone(),
                    payload: action.params.clone(),
                    context: context.cloned(),
                };
                self.gateways.publisher.notify_parent(&event).await?;
                Ok(LeafOutcome::Completed(None))
            }
        }
    }

    async fn open_record(
        &self,
        action: &ActionDescriptor,
        scope: &DispatchScope,
        context: Option<&Value>,
        action_name: &str,
    ) -> ActionResult<LeafOutcome> {
        let target = context_id(context)
            .or_else(|| scope.record_id.clone())
            .ok_or_else(|| {
                ActionError::ConfigError(format!(
                    "'{}' action requires a record id from context or scope",
                    action.kind
                ))
            })?;
        self.gateways
            .navigator
            .navigate(&PageReference::record_page(&target, action_name))
            .await?;
        Ok(LeafOutcome::Completed(None))
    }

    /// Runs the optional confirmation gate; `Ok(false)` means declined.
    async fn confirmed(&self, action: &ActionDescriptor) -> ActionResult<bool> {
        let confirm = action.confirm_params();
        if confirm.bypass_confirm {
            return Ok(true);
        }
        let request = ConfirmRequest {
            title: confirm
                .confirm_title
                .or_else(|| action.label.clone())
                .unwrap_or_else(|| "Confirm".to_string()),
            message: confirm
                .confirm_message
                .unwrap_or_else(|| "Please confirm the operation.".to_string()),
        };
        Ok(self.gateways.presenter.confirm(&request).await?)
    }

    async fn run_record_operation(
        &self,
        operation: DmlOperation,
        record: Value,
    ) -> ActionResult<Value> {
        match operation {
            DmlOperation::Insert => {
                Ok(self.gateways.record_gateway.create_record(&record).await?)
            }
            DmlOperation::Update => {
                Ok(self.gateways.record_gateway.update_record(&record).await?)
            }
            DmlOperation::Delete => {
                let id = record.get("Id").and_then(Value::as_str).ok_or_else(|| {
                    ActionError::ConfigError("record delete requires an Id".to_string())
                })?;
                self.gateways.record_gateway.delete_record(id).await?;
                Ok(json!({ "id": id, "deleted": true }))
            }
        }
    }

    async fn execute_mass(
        &self,
        action: &ActionDescriptor,
        scope: &DispatchScope,
    ) -> ActionResult<LeafOutcome> {
        if scope.selection.is_empty() {
            return Err(ActionError::NoRecordSelected);
        }
        let params: MassParams = action.parse_params()?;

        match &action.kind {
            ActionKind::MassDml => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let (operation, records) = mass_dml_payloads(&params, &scope.selection, None)?;
                let result = self.gateways.dml_executor.execute(operation, &records).await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::MassApex => {
                if !self.confirmed(action).await? {
                    return Ok(LeafOutcome::Halted(CONFIRM_DECLINED));
                }
                let name = params.name.clone().ok_or_else(|| {
                    ActionError::ConfigError("'massApex' action requires a name".to_string())
                })?;
                let lookup = params.lookup.as_deref().unwrap_or("Id");
                let records =
                    expand_mass_records(&params.template, &scope.selection, None, lookup);
                let result = self
                    .gateways
                    .apex_invoker
                    .invoke(&name, &json!({ "records": records }))
                    .await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::MassForm => {
                let Some(input) = self.present_mass_form(&params).await? else {
                    return Ok(LeafOutcome::Halted(FORM_CANCELLED));
                };
                let (operation, records) =
                    mass_dml_payloads(&params, &scope.selection, Some(&input))?;
                let result = self.gateways.dml_executor.execute(operation, &records).await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            ActionKind::MassApexForm => {
                let name = params.name.clone().ok_or_else(|| {
                    ActionError::ConfigError("'massApexForm' action requires a name".to_string())
                })?;
                let Some(input) = self.present_mass_form(&params).await? else {
                    return Ok(LeafOutcome::Halted(FORM_CANCELLED));
                };
                let lookup = params.lookup.as_deref().unwrap_or("Id");
                let records =
                    expand_mass_records(&params.template, &scope.selection, Some(&input), lookup);
                let result = self
                    .gateways
                    .apex_invoker
                    .invoke(&name, &json!({ "records": records }))
                    .await?;
                Ok(LeafOutcome::Completed(Some(result)))
            }
            // execute_mass is only entered for the mass kinds
            _ => Err(ActionError::UnsupportedOperation(
                action.kind.to_string(),
            )),
        }
    }

    async fn present_mass_form(&self, params: &MassParams) -> ActionResult<Option<Value>> {
        if params.fields.is_empty() {
            return Err(ActionError::ConfigError(
                "mass form action requires fields".to_string(),
            ));
        }
        let seed = params.template.record.clone().unwrap_or_else(|| json!({}));
        let request = FormRequest::record(params.title.clone(), seed, params.fields.clone());
        Ok(self.gateways.presenter.present_form(&request).await?)
    }
}

fn context_id(context: Option<&Value>) -> Option<String> {
    context
        .and_then(|c| c.get("Id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Form output wins over template fields.
fn overlay(template: Value, output: Value) -> Value {
    match (template, output) {
        (Value::Object(mut base), Value::Object(out)) => {
            for (k, v) in out {
                base.insert(k, v);
            }
            Value::Object(base)
        }
        (_, out) => out,
    }
}

/// Applies the mass DML operation rules to build per-record payloads.
fn mass_dml_payloads(
    params: &MassParams,
    selection: &[Value],
    input: Option<&Value>,
) -> ActionResult<(DmlOperation, Vec<Value>)> {
    let operation = params.operation.as_deref().ok_or_else(|| {
        ActionError::ConfigError("mass operation requires an 'operation'".to_string())
    })?;
    match operation {
        "insert" => {
            let lookup = params.lookup.as_deref().ok_or_else(|| {
                ActionError::ConfigError(
                    "mass insert requires a 'lookup' field name".to_string(),
                )
            })?;
            Ok((
                DmlOperation::Insert,
                expand_mass_records(&params.template, selection, input, lookup),
            ))
        }
        "update" => {
            let lookup = params.lookup.as_deref().unwrap_or("Id");
            Ok((
                DmlOperation::Update,
                expand_mass_records(&params.template, selection, input, lookup),
            ))
        }
        "delete" => {
            let payloads = selection
                .iter()
                .filter_map(|r| r.get("Id").cloned())
                .map(|id| json!({ "Id": id }))
                .collect();
            Ok((DmlOperation::Delete, payloads))
        }
        other => Err(ActionError::UnsupportedOperation(other.to_string())),
    }
}

/// Resolves the download servlet URL; exactly one source must be configured.
fn download_target(params: &DownloadParams, scope: &DispatchScope) -> ActionResult<String> {
    match (
        &params.document_id,
        &params.version_id,
        &params.selected_versions_field,
    ) {
        (Some(document), None, None) => Ok(document_download_url(document)),
        (None, Some(version), None) => Ok(version_download_url(&[version.clone()])),
        (None, None, Some(field)) => {
            let versions: Vec<String> = scope
                .selection
                .iter()
                .filter_map(|r| r.get(field).and_then(Value::as_str).map(str::to_string))
                .collect();
            if versions.is_empty() {
                return Err(ActionError::NoRecordSelected);
            }
            Ok(version_download_url(&versions))
        }
        _ => Err(ActionError::ConfigError(
            "'download' action requires exactly one of documentId, versionId or \
             selectedVersionsField"
                .to_string(),
        )),
    }
}
