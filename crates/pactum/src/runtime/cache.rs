use crate::runtime::HandlerError;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

///
/// Cache
///
/// Byte cache used by generated controllers: read before GET handlers,
/// invalidate by prefix after writes.
///

pub trait Cache {
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    fn invalidate_prefix(&self, prefix: &str);
}

/// `prefix:operation`, plus the JSON request when there is one.
pub fn cache_key<T: Serialize + ?Sized>(
    prefix: &str,
    operation: &str,
    request: Option<&T>,
) -> Result<String, HandlerError> {
    match request {
        Some(request) => {
            let body =
                serde_json::to_string(request).map_err(|e| HandlerError::Encode(e.to_string()))?;
            Ok(format!("{prefix}:{operation}:{body}"))
        }
        None => Ok(format!("{prefix}:{operation}")),
    }
}

/// A cached value, if present and decodable. Undecodable entries read as a
/// miss.
pub fn cache_read<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let bytes = cache.get(key)?;

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, error = %e, "cache entry ignored");
            None
        }
    }
}

/// Store `value` under `key`; a ttl of zero never expires.
pub fn cache_write<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), HandlerError> {
    let bytes = serde_json::to_vec(value).map_err(|e| HandlerError::Encode(e.to_string()))?;
    let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
    cache.set(key, bytes, ttl);

    Ok(())
}

///
/// MemoryCache
///

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = matches!(
            entries.get(key),
            Some((_, Some(expires))) if *expires <= Instant::now()
        );
        if expired {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|(value, _)| value.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (value, expires));
    }

    fn invalidate_prefix(&self, prefix: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| !key.starts_with(prefix));
    }
}
