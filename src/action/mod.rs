//! Action-dispatch pipeline.
//!
//! Merged configuration deserializes into [`ActionDescriptor`] chains; the
//! [`ActionDispatcher`] interprets them against the platform gateways,
//! expanding mass operations over the current record selection and following
//! `next`/`error` continuations.

mod dispatcher;
mod mass;
mod schema;
mod selection;
mod url;

pub use dispatcher::{
    ActionDispatcher, DispatchConfig, DispatchGateways, DispatchReport, DispatchScope,
    DispatchStep, OverlapPolicy, StepOutcome,
};
pub use mass::expand_mass_records;
pub use schema::{
    ActionDescriptor, ActionKind, ApexParams, ChannelParams, ClipboardParams, ConfirmParams,
    DetailsParams, DmlParams, DownloadParams, FlowParams, FormParams, LdsParams,
    MassActionTemplate, MassParams, OpenUrlParams, RecordParams, ReloadParams,
    SelectionDescriptor,
};
pub use selection::format_selection;
pub use url::{document_download_url, rewrite_url_macros, version_download_url};
