//! Process-wide configuration cache.
//!
//! The cache is an explicitly owned object handed to the runner at build
//! time; embedders that want isolation construct one per scope, embedders
//! that want sharing clone the `Arc`.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ActionBarConfig;

/// Cache tuning.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Entry lifetime; `None` keeps entries for the life of the process.
    pub ttl: Option<Duration>,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub config_entries: usize,
    pub token_domains: usize,
    pub token_entries: usize,
}

struct Entry<T> {
    value: T,
    created_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }
}

/// Cache for parsed configurations and configuration-domain token values.
///
/// Entries never change once written: configurations are immutable metadata
/// and token domains only append fields as they are first requested.
/// Staleness is governed by [`CacheConfig::ttl`] (measured from the entry's
/// first write); expired entries are dropped on read.
pub struct ConfigCache {
    configs: DashMap<String, Entry<Arc<ActionBarConfig>>>,
    tokens: DashMap<String, Entry<HashMap<String, Value>>>,
    config: CacheConfig,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ConfigCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            configs: DashMap::new(),
            tokens: DashMap::new(),
            config,
        }
    }

    pub fn get_config(&self, name: &str) -> Option<Arc<ActionBarConfig>> {
        let mut expired = false;
        let hit = {
            let entry = self.configs.get(name)?;
            if self.is_expired(entry.created_at) {
                expired = true;
                None
            } else {
                Some(entry.value.clone())
            }
        };
        if expired {
            self.configs.remove(name);
        }
        hit
    }

    pub fn insert_config(&self, config: ActionBarConfig) -> Arc<ActionBarConfig> {
        let shared = Arc::new(config);
        self.configs
            .insert(shared.name.clone(), Entry::new(shared.clone()));
        shared
    }

    pub fn remove_config(&self, name: &str) {
        self.configs.remove(name);
    }

    /// Cached value for one configuration-domain field.
    pub fn token_value(&self, domain: &str, field: &str) -> Option<Value> {
        let mut expired = false;
        let hit = {
            let entry = self.tokens.get(domain)?;
            if self.is_expired(entry.created_at) {
                expired = true;
                None
            } else {
                entry.value.get(field).cloned()
            }
        };
        if expired {
            self.tokens.remove(domain);
        }
        hit
    }

    /// Merges freshly fetched fields into a domain.
    pub fn insert_token_values(&self, domain: &str, values: HashMap<String, Value>) {
        let mut entry = self
            .tokens
            .entry(domain.to_string())
            .or_insert_with(|| Entry::new(HashMap::new()));
        entry.value.extend(values);
    }

    pub fn clear(&self) {
        self.configs.clear();
        self.tokens.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            config_entries: self.configs.len(),
            token_domains: self.tokens.len(),
            token_entries: self.tokens.iter().map(|e| e.value.len()).sum(),
        }
    }

    fn is_expired(&self, created_at: Instant) -> bool {
        match self.config.ttl {
            Some(ttl) => created_at.elapsed() > ttl,
            None => false,
        }
    }
}
