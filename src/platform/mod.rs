//! Host-platform gateways and wire types.
//!
//! The pipeline never touches records, navigation, modals, or channels
//! directly; it calls gateway traits the embedder implements. [`memory`]
//! ships in-memory implementations of every trait for tests and embedders.

mod gateway;
pub mod memory;
mod types;

pub use gateway::{
    ApexInvoker, Clipboard, ConfigProvider, DmlExecutor, Navigator, Presenter, Publisher,
    RecordFetcher, RecordGateway,
};
pub use types::{
    ChannelMessage, ConfirmRequest, DetailsRequest, DmlOperation, FieldSpec, FormKind, FormRequest,
    PageReference, ParentEvent, Toast, ToastMode, ToastVariant, UploadRequest, UTILITY_CHANNEL,
};
