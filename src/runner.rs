//! High-level action runner and builder.
//!
//! [`ActionRunner`] (constructed via [`ActionRunnerBuilder`]) is the main
//! entry point for hosting an action bar. It loads and caches configuration
//! records, contextualizes their templates through the merge engine,
//! evaluates per-action visibility flags, and dispatches chains through the
//! platform gateways.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::action::{
    ActionDescriptor, ActionDispatcher, DispatchConfig, DispatchGateways, DispatchReport,
    DispatchScope,
};
use crate::config::{ActionBarConfig, CacheConfig, ConfigCache};
use crate::error::{ActionError, ActionResult, MergeError};
use crate::eval;
use crate::merge::{has_tokens, MergeContext, MergeEngine, MergeOptions};
use crate::platform::{ConfigProvider, RecordFetcher};
use crate::runtime::{Clock, IdGenerator};

/// One action after contextualization and flag evaluation.
#[derive(Debug, Clone)]
pub struct PreparedAction {
    pub descriptor: ActionDescriptor,
    pub hidden: bool,
    pub disabled: bool,
}

impl PreparedAction {
    /// Whether the action may be rendered and invoked.
    pub fn actionable(&self) -> bool {
        !self.hidden && !self.disabled
    }
}

/// Action runner with builder-based configuration.
///
/// Use [`ActionRunner::builder`] to wire the gateways, then call
/// [`actions`](Self::actions) to render a bar and
/// [`run_action`](Self::run_action) to execute one of its entries.
pub struct ActionRunner {
    config_provider: Arc<dyn ConfigProvider>,
    cache: Arc<ConfigCache>,
    merge_engine: MergeEngine,
    dispatcher: ActionDispatcher,
}

impl ActionRunner {
    /// Create a new builder from the mandatory collaborators.
    pub fn builder(
        record_fetcher: Arc<dyn RecordFetcher>,
        config_provider: Arc<dyn ConfigProvider>,
        gateways: DispatchGateways,
    ) -> ActionRunnerBuilder {
        ActionRunnerBuilder {
            record_fetcher,
            config_provider,
            gateways,
            cache: None,
            cache_config: CacheConfig::default(),
            clock: None,
            merge_options: MergeOptions::default(),
            dispatch_config: DispatchConfig::default(),
            id_generator: None,
        }
    }

    /// Loads a parsed configuration, consulting the cache first.
    ///
    /// A cached entry derived against a different object keeps its template
    /// but re-derives the token map; no gateway round-trip is spent.
    pub async fn load_config(
        &self,
        name: &str,
        object_api_name: &str,
    ) -> ActionResult<Arc<ActionBarConfig>> {
        if let Some(cached) = self.cache.get_config(name) {
            if cached.object_api_name == object_api_name {
                return Ok(cached);
            }
            debug!(config = name, object = object_api_name, "re-deriving token map");
            return Ok(self.cache.insert_config(cached.for_object(object_api_name)));
        }
        debug!(config = name, "fetching action configuration");
        let raw = self.config_provider.fetch_action_config(name).await?;
        let parsed = ActionBarConfig::parse(name, &raw, object_api_name)?;
        Ok(self.cache.insert_config(parsed))
    }

    /// Loads, contextualizes, and evaluates a configuration's action list.
    pub async fn actions(
        &self,
        name: &str,
        ctx: &MergeContext,
    ) -> ActionResult<Vec<PreparedAction>> {
        let object = ctx.object_api_name.as_deref().unwrap_or_default();
        let config = self.load_config(name, object).await?;
        self.prepare(&config, ctx).await
    }

    /// Contextualizes an already-loaded configuration.
    pub async fn prepare(
        &self,
        config: &ActionBarConfig,
        ctx: &MergeContext,
    ) -> ActionResult<Vec<PreparedAction>> {
        let merged = match &config.token_map {
            Some(map) => {
                self.merge_engine
                    .merge_tokens(&config.template, map, ctx)
                    .await?
            }
            None if has_tokens(&config.template) => {
                return Err(MergeError::MissingTokenMap.into());
            }
            None => config.template.clone(),
        };
        let descriptors: Vec<ActionDescriptor> = serde_json::from_str(&merged).map_err(|e| {
            ActionError::ParseError(format!("actions of configuration {}: {e}", config.name))
        })?;

        let scope = evaluation_scope(ctx);
        let mut prepared = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let hidden = resolve_flag(&descriptor.hidden, config.do_evaluation, &scope)?;
            let disabled = resolve_flag(&descriptor.disabled, config.do_evaluation, &scope)?;
            prepared.push(PreparedAction {
                descriptor,
                hidden,
                disabled,
            });
        }
        Ok(prepared)
    }

    /// Loads, prepares, and dispatches one named action.
    pub async fn run_action(
        &self,
        config_name: &str,
        action_name: &str,
        ctx: &MergeContext,
        scope: &DispatchScope,
        context: Option<Value>,
    ) -> ActionResult<DispatchReport> {
        let prepared = self.actions(config_name, ctx).await?;
        let action = prepared
            .iter()
            .find(|p| p.descriptor.name.as_deref() == Some(action_name))
            .ok_or_else(|| {
                ActionError::ConfigError(format!(
                    "no action named '{action_name}' in configuration '{config_name}'"
                ))
            })?;
        if !action.actionable() {
            return Err(ActionError::ConfigError(format!(
                "action '{action_name}' is hidden or disabled"
            )));
        }
        self.dispatcher
            .dispatch(&action.descriptor, scope, context)
            .await
    }

    /// Dispatches an action chain directly, outside any configuration.
    pub async fn run(
        &self,
        action: &ActionDescriptor,
        scope: &DispatchScope,
        context: Option<Value>,
    ) -> ActionResult<DispatchReport> {
        self.dispatcher.dispatch(action, scope, context).await
    }

    /// Merges an arbitrary template through the runner's engine.
    pub async fn merge(&self, template: &str, ctx: &MergeContext) -> ActionResult<String> {
        Ok(self.merge_engine.merge_str(template, ctx).await?)
    }

    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Drops one configuration from the cache.
    pub fn invalidate(&self, name: &str) {
        self.cache.remove_config(name);
    }
}

/// Builder for configuring an [`ActionRunner`].
pub struct ActionRunnerBuilder {
    record_fetcher: Arc<dyn RecordFetcher>,
    config_provider: Arc<dyn ConfigProvider>,
    gateways: DispatchGateways,
    cache: Option<Arc<ConfigCache>>,
    cache_config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
    merge_options: MergeOptions,
    dispatch_config: DispatchConfig,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl ActionRunnerBuilder {
    /// Share an existing cache instead of building a private one.
    pub fn cache(mut self, cache: Arc<ConfigCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Tuning for the private cache; ignored when [`cache`](Self::cache) is set.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Clock for generic date tokens.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn merge_options(mut self, options: MergeOptions) -> Self {
        self.merge_options = options;
        self
    }

    /// Chain limits and overlap policy.
    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    /// Step-id generator, fixed in tests for stable reports.
    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn build(self) -> ActionRunner {
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ConfigCache::new(self.cache_config)));
        let mut merge_engine = MergeEngine::new(
            self.record_fetcher,
            self.config_provider.clone(),
            cache.clone(),
        )
        .with_options(self.merge_options);
        if let Some(clock) = self.clock {
            merge_engine = merge_engine.with_clock(clock);
        }
        let mut dispatcher = ActionDispatcher::new(self.gateways).with_config(self.dispatch_config);
        if let Some(id_generator) = self.id_generator {
            dispatcher = dispatcher.with_id_generator(id_generator);
        }
        ActionRunner {
            config_provider: self.config_provider,
            cache,
            merge_engine,
            dispatcher,
        }
    }
}

/// Scope for `hidden`/`disabled` expressions: record data overlaid with row
/// and context data, later sources winning.
fn evaluation_scope(ctx: &MergeContext) -> Value {
    let mut scope = Map::new();
    for data in [&ctx.record_data, &ctx.row_data, &ctx.context_data] {
        if let Some(Value::Object(fields)) = data {
            for (key, value) in fields {
                scope.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(scope)
}

/// Literal booleans always apply; expression strings only when the
/// configuration enables evaluation.
fn resolve_flag(flag: &Option<Value>, do_evaluation: bool, scope: &Value) -> ActionResult<bool> {
    match flag {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(value) if do_evaluation => Ok(eval::evaluate_flag(value, scope)?),
        Some(_) => Ok(false),
    }
}
