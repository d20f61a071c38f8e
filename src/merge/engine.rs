//! Merge orchestration.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::resolver::{self, DomainValues, RecordDomainRequest};
use super::substitute::{apply_escapes, apply_tokens};
use super::token::{
    extract_tokens, has_tokens, TokenMap, DOMAIN_CONTEXT, DOMAIN_GENERIC, DOMAIN_RECORD,
    DOMAIN_ROW, DOMAIN_USER,
};
use crate::config::ConfigCache;
use crate::error::MergeResult;
use crate::platform::{ConfigProvider, RecordFetcher};
use crate::runtime::{Clock, SystemClock};

/// Inputs for one merge.
///
/// Row and context data are caller-owned and never fetched; record and user
/// data are optional head starts that spare gateway round-trips.
#[derive(Debug, Clone, Default)]
pub struct MergeContext {
    pub user_id: Option<String>,
    pub user_data: Option<Value>,
    pub object_api_name: Option<String>,
    pub record_id: Option<String>,
    pub record_data: Option<Value>,
    pub row_data: Option<Value>,
    pub context_data: Option<Value>,
}

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_user_data(mut self, data: Value) -> Self {
        self.user_data = Some(data);
        self
    }

    pub fn with_record(
        mut self,
        object_api_name: impl Into<String>,
        record_id: impl Into<String>,
    ) -> Self {
        self.object_api_name = Some(object_api_name.into());
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_object(mut self, object_api_name: impl Into<String>) -> Self {
        self.object_api_name = Some(object_api_name.into());
        self
    }

    pub fn with_record_data(mut self, data: Value) -> Self {
        self.record_data = Some(data);
        self
    }

    pub fn with_row_data(mut self, data: Value) -> Self {
        self.row_data = Some(data);
        self
    }

    pub fn with_context_data(mut self, data: Value) -> Self {
        self.context_data = Some(data);
        self
    }
}

/// Merge tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// chrono format string for `*Local` date tokens.
    pub local_date_format: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            local_date_format: "%m/%d/%Y".into(),
        }
    }
}

/// Resolves and substitutes template tokens.
///
/// Resolution fans out per domain and runs concurrently; substitution starts
/// once every resolver has settled, and the first rejection aborts the merge.
pub struct MergeEngine {
    record_fetcher: Arc<dyn RecordFetcher>,
    config_provider: Arc<dyn ConfigProvider>,
    cache: Arc<ConfigCache>,
    clock: Arc<dyn Clock>,
    options: MergeOptions,
}

impl MergeEngine {
    pub fn new(
        record_fetcher: Arc<dyn RecordFetcher>,
        config_provider: Arc<dyn ConfigProvider>,
        cache: Arc<ConfigCache>,
    ) -> Self {
        Self {
            record_fetcher,
            config_provider,
            cache,
            clock: Arc::new(SystemClock),
            options: MergeOptions::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Extracts tokens and merges in one call.
    pub async fn merge_str(&self, template: &str, ctx: &MergeContext) -> MergeResult<String> {
        if !has_tokens(template) {
            return Ok(template.to_string());
        }
        let object = ctx.object_api_name.as_deref().unwrap_or_default();
        let token_map = extract_tokens(template, object);
        self.merge_tokens(template, &token_map, ctx).await
    }

    /// Merges a template against a previously derived token map.
    pub async fn merge_tokens(
        &self,
        template: &str,
        token_map: &TokenMap,
        ctx: &MergeContext,
    ) -> MergeResult<String> {
        if !has_tokens(template) {
            return Ok(template.to_string());
        }
        let mut resolved: HashMap<String, DomainValues> = HashMap::new();

        // Caller-supplied domains never fetch; absent data leaves the domain
        // unresolved and its tokens in place.
        if let (Some(tokens), Some(data)) = (token_map.get(DOMAIN_ROW), &ctx.row_data) {
            resolved.insert(
                DOMAIN_ROW.into(),
                resolver::project_provided_domain(tokens, data),
            );
        }
        if let (Some(tokens), Some(data)) = (token_map.get(DOMAIN_CONTEXT), &ctx.context_data) {
            resolved.insert(
                DOMAIN_CONTEXT.into(),
                resolver::project_provided_domain(tokens, data),
            );
        }
        if let Some(tokens) = token_map.get(DOMAIN_GENERIC) {
            resolved.insert(
                DOMAIN_GENERIC.into(),
                resolver::resolve_generic_domain(
                    tokens,
                    ctx.user_id.as_deref(),
                    ctx.object_api_name.as_deref(),
                    ctx.record_id.as_deref(),
                    self.clock.as_ref(),
                    &self.options.local_date_format,
                ),
            );
        }

        let (record, user, config) = tokio::try_join!(
            self.resolve_record(token_map, ctx),
            self.resolve_user(token_map, ctx),
            resolver::resolve_config_domains(
                token_map,
                &self.cache,
                self.config_provider.as_ref()
            ),
        )?;
        if let Some(values) = record {
            resolved.insert(DOMAIN_RECORD.into(), values);
        }
        if let Some(values) = user {
            resolved.insert(DOMAIN_USER.into(), values);
        }
        resolved.extend(config);

        let substituted = apply_tokens(template, token_map, &resolved);
        Ok(apply_escapes(&substituted))
    }

    async fn resolve_record(
        &self,
        token_map: &TokenMap,
        ctx: &MergeContext,
    ) -> MergeResult<Option<DomainValues>> {
        let Some(tokens) = token_map.get(DOMAIN_RECORD) else {
            return Ok(None);
        };
        let req = RecordDomainRequest {
            domain: DOMAIN_RECORD,
            object: ctx.object_api_name.as_deref().unwrap_or_default(),
            record_id: ctx.record_id.as_deref(),
            provided: ctx.record_data.as_ref(),
            id_kind: "record id",
        };
        resolver::resolve_record_domain(req, tokens, self.record_fetcher.as_ref())
            .await
            .map(Some)
    }

    async fn resolve_user(
        &self,
        token_map: &TokenMap,
        ctx: &MergeContext,
    ) -> MergeResult<Option<DomainValues>> {
        let Some(tokens) = token_map.get(DOMAIN_USER) else {
            return Ok(None);
        };
        let req = RecordDomainRequest {
            domain: DOMAIN_USER,
            object: "User",
            record_id: ctx.user_id.as_deref(),
            provided: ctx.user_data.as_ref(),
            id_kind: "user id",
        };
        resolver::resolve_record_domain(req, tokens, self.record_fetcher.as_ref())
            .await
            .map(Some)
    }
}
