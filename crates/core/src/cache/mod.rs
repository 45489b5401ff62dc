//! TTL result cache for expensive lookups.
//!
//! Keys are a blake3 digest of the operation name and a canonical (sorted-key) JSON rendering
//! of the parameters, so logically equal parameter sets always share an entry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::domain::cache::{CacheCategory, CacheEntry, CacheKey};
use crate::errors::{ApplicationError, DomainError};

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, ApplicationError>;

    /// At most one entry per key; an existing entry keeps its `created_at`.
    async fn upsert_entry(&self, entry: CacheEntry) -> Result<(), ApplicationError>;

    async fn delete_entry(&self, key: &CacheKey) -> Result<bool, ApplicationError>;

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, ApplicationError>;

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, ApplicationError>;
}

/// Default lifetimes per data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub default: Duration,
    pub static_data: Duration,
    pub pricing: Duration,
    pub search: Duration,
}

impl CacheTtls {
    pub fn for_category(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Static => self.static_data,
            CacheCategory::Pricing => self.pricing,
            CacheCategory::Search => self.search,
            CacheCategory::Default => self.default,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            default: Duration::from_secs(config.default_ttl_secs),
            static_data: Duration::from_secs(config.static_ttl_secs),
            pricing: Duration::from_secs(config.pricing_ttl_secs),
            search: Duration::from_secs(config.search_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub category: CacheCategory,
    /// Overrides the category default when set.
    pub ttl: Option<Duration>,
    /// Defaults to the operation name.
    pub namespace: Option<String>,
    /// Upper bound on the producer call in `cache_api_call`.
    pub timeout: Option<Duration>,
}

impl CacheOptions {
    pub fn new(category: CacheCategory) -> Self {
        Self { category, ttl: None, namespace: None, timeout: None }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new(CacheCategory::Default)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(key) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Stable JSON rendering with object keys sorted at every depth.
pub fn canonical_params(params: &Value) -> String {
    let mut out = String::new();
    write_canonical(params, &mut out);
    out
}

pub fn derive_key(operation: &str, params: &Value) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(operation.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_params(params).as_bytes());
    CacheKey(hasher.finalize().to_hex().to_string())
}

fn params_value<P: Serialize + ?Sized>(operation: &str, params: &P) -> Result<Value, ApplicationError> {
    serde_json::to_value(params).map_err(|error| {
        DomainError::validation(format!("cache parameters for `{operation}` are not serializable: {error}"))
            .into()
    })
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
    now.checked_add_signed(ttl).unwrap_or(now)
}

#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttls: CacheTtls,
    enabled: bool,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, clock: Arc::new(SystemClock), ttls: CacheTtls::default(), enabled: true }
    }

    pub fn from_config(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self { store, clock: Arc::new(SystemClock), ttls: CacheTtls::from(config), enabled: config.enabled }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Stored payload for a live entry, `None` on a miss. Expired entries are deleted on sight.
    pub async fn get<P: Serialize + ?Sized>(
        &self,
        operation: &str,
        params: &P,
    ) -> Result<Option<Value>, ApplicationError> {
        if !self.enabled {
            return Ok(None);
        }
        let key = derive_key(operation, &params_value(operation, params)?);
        self.lookup(operation, &key).await
    }

    async fn lookup(&self, operation: &str, key: &CacheKey) -> Result<Option<Value>, ApplicationError> {
        let Some(entry) = self.store.get_entry(key).await? else {
            debug!(event_name = "cache.lookup.miss", operation, "cache miss");
            return Ok(None);
        };

        if entry.is_expired(self.clock.now()) {
            debug!(event_name = "cache.lookup.expired", operation, key = %key, "cache entry expired");
            if let Err(error) = self.store.delete_entry(key).await {
                warn!(
                    event_name = "cache.expire.failed",
                    operation,
                    error = %error,
                    "failed to remove expired cache entry"
                );
            }
            return Ok(None);
        }

        debug!(event_name = "cache.lookup.hit", operation, "cache hit");
        Ok(Some(entry.payload))
    }

    pub async fn set<P: Serialize + ?Sized>(
        &self,
        operation: &str,
        params: &P,
        payload: Value,
        options: &CacheOptions,
    ) -> Result<(), ApplicationError> {
        if !self.enabled {
            return Ok(());
        }
        let key = derive_key(operation, &params_value(operation, params)?);
        self.store_payload(operation, key, payload, options).await
    }

    async fn store_payload(
        &self,
        operation: &str,
        key: CacheKey,
        payload: Value,
        options: &CacheOptions,
    ) -> Result<(), ApplicationError> {
        let now = self.clock.now();
        let ttl = options.ttl.unwrap_or_else(|| self.ttls.for_category(options.category));
        let entry = CacheEntry {
            key,
            operation: operation.to_string(),
            namespace: options.namespace.clone().unwrap_or_else(|| operation.to_string()),
            payload,
            expires_at: expiry(now, ttl),
            created_at: now,
            updated_at: now,
        };
        self.store.upsert_entry(entry).await
    }

    pub async fn clear_namespace(&self, namespace: &str) -> Result<u64, ApplicationError> {
        let removed = self.store.clear_namespace(namespace).await?;
        debug!(event_name = "cache.namespace.cleared", namespace, removed, "cache namespace cleared");
        Ok(removed)
    }

    pub async fn clear_expired(&self) -> Result<u64, ApplicationError> {
        let removed = self.store.clear_expired(self.clock.now()).await?;
        debug!(event_name = "cache.expired.swept", removed, "expired cache entries swept");
        Ok(removed)
    }

    /// Returns the cached value for `(operation, params)` or runs `producer` and stores its
    /// output. Cache read/write failures are logged and bypassed; producer failures propagate.
    pub async fn cache_api_call<P, T, F, Fut>(
        &self,
        operation: &str,
        params: &P,
        producer: F,
        options: &CacheOptions,
    ) -> Result<T, ApplicationError>
    where
        P: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApplicationError>>,
    {
        let key = if self.enabled {
            match params_value(operation, params) {
                Ok(value) => Some(derive_key(operation, &value)),
                Err(error) => {
                    warn!(event_name = "cache.key.failed", operation, error = %error, "bypassing cache");
                    None
                }
            }
        } else {
            None
        };

        if let Some(key) = &key {
            match self.lookup(operation, key).await {
                Ok(Some(payload)) => match serde_json::from_value::<T>(payload) {
                    Ok(value) => return Ok(value),
                    Err(error) => warn!(
                        event_name = "cache.decode.failed",
                        operation,
                        error = %error,
                        "cached payload has an unexpected shape; treating as miss"
                    ),
                },
                Ok(None) => {}
                Err(error) => warn!(
                    event_name = "cache.lookup.failed",
                    operation,
                    error = %error,
                    "cache read failed; calling producer directly"
                ),
            }
        }

        let value = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, producer()).await.map_err(|_| {
                ApplicationError::LookupTimeout {
                    operation: operation.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                }
            })??,
            None => producer().await?,
        };

        if let Some(key) = key {
            match serde_json::to_value(&value) {
                Ok(payload) => {
                    if let Err(error) = self.store_payload(operation, key, payload, options).await {
                        warn!(
                            event_name = "cache.write.failed",
                            operation,
                            error = %error,
                            "failed to store producer result"
                        );
                    }
                }
                Err(error) => warn!(
                    event_name = "cache.encode.failed",
                    operation,
                    error = %error,
                    "producer result is not serializable; skipping cache write"
                ),
            }
        }

        Ok(value)
    }
}
