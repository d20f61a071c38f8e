//! # Actionflow — A Declarative Action-Bar Runtime
//!
//! `actionflow` executes metadata-configured action bars against a hosting
//! record platform. A configuration record carries a JSON list of action
//! descriptors whose text may reference live data through `{{{DOMAIN.field}}}`
//! merge tokens. The crate:
//!
//! - **Merges tokens**: resolves record, user, generic (dates/ids), row,
//!   context, and configuration-defined token domains concurrently, then
//!   substitutes them into the template with an `ESCAPE(((...)))` post-pass
//!   for JSON-embedded text.
//! - **Parses action chains**: typed [`ActionDescriptor`]s with `next`/`error`
//!   continuations, per-action `hidden`/`disabled` expressions, and an escape
//!   hatch for application-defined kinds.
//! - **Dispatches**: interprets each chain against pluggable platform
//!   gateways (navigation, record CRUD, bulk DML, Apex, modals, channels,
//!   clipboard), expanding mass operations over the caller's record
//!   selection.
//! - **Caches**: parsed configurations and configuration-domain token values
//!   are cached with an optional TTL.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use actionflow::{ActionRunner, DispatchGateways, DispatchScope, MergeContext};
//! use actionflow::memory::{
//!     MemoryClipboard, RecordingApexInvoker, RecordingDmlExecutor, RecordingNavigator,
//!     RecordingPublisher, RecordingRecordGateway, ScriptedPresenter, StaticConfigProvider,
//!     StaticRecordFetcher,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let gateways = DispatchGateways {
//!         navigator: Arc::new(RecordingNavigator::new()),
//!         record_gateway: Arc::new(RecordingRecordGateway::new()),
//!         dml_executor: Arc::new(RecordingDmlExecutor::new()),
//!         apex_invoker: Arc::new(RecordingApexInvoker::new()),
//!         presenter: Arc::new(ScriptedPresenter::new()),
//!         publisher: Arc::new(RecordingPublisher::new()),
//!         clipboard: Arc::new(MemoryClipboard::new()),
//!     };
//!     let runner = ActionRunner::builder(
//!         Arc::new(StaticRecordFetcher::new()),
//!         Arc::new(StaticConfigProvider::new()),
//!         gateways,
//!     )
//!     .build();
//!
//!     let ctx = MergeContext::new().with_record("Case", "500x0000001");
//!     let bar = runner.actions("case_bar", &ctx).await.unwrap();
//!     for action in &bar {
//!         println!("{}", action.descriptor.kind);
//!     }
//!     let report = runner
//!         .run_action("case_bar", "markClosed", &ctx, &DispatchScope::new(), None)
//!         .await
//!         .unwrap();
//!     assert!(report.completed());
//! }
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod eval;
pub mod merge;
pub mod platform;
pub mod runner;
pub mod runtime;

pub use crate::action::{
    ActionDescriptor, ActionDispatcher, ActionKind, DispatchConfig, DispatchGateways,
    DispatchReport, DispatchScope, DispatchStep, MassActionTemplate, OverlapPolicy,
    SelectionDescriptor, StepOutcome,
};
pub use crate::config::{ActionBarConfig, CacheConfig, CacheStats, ConfigCache, RawActionConfig};
pub use crate::error::{ActionError, ActionResult, GatewayError, MergeError, MergeResult};
pub use crate::merge::{extract_tokens, has_tokens, MergeContext, MergeEngine, MergeOptions};
pub use crate::platform::memory;
pub use crate::platform::{
    ApexInvoker, ChannelMessage, Clipboard, ConfigProvider, ConfirmRequest, DetailsRequest,
    DmlExecutor, DmlOperation, FieldSpec, FormKind, FormRequest, Navigator, PageReference,
    ParentEvent, Presenter, Publisher, RecordFetcher, RecordGateway, Toast, UploadRequest,
};
pub use crate::runner::{ActionRunner, ActionRunnerBuilder, PreparedAction};
pub use crate::runtime::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
