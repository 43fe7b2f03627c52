//! Cache construction options

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options recognized when building an [`LruCache`](crate::LruCache).
///
/// Field names also accept the camelCase spelling (`maxElements`,
/// `maxAge`, `size`) so existing option objects deserialize unchanged.
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries
    #[serde(alias = "maxElements")]
    pub max_elements: usize,

    /// Entries not re-set within this many milliseconds read as absent
    #[serde(default, alias = "maxAge", skip_serializing_if = "Option::is_none")]
    pub max_age_ms: Option<u64>,

    /// Number of keys to pre-size the index for
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub size_hint: Option<usize>,
}

impl CacheConfig {
    /// Create a config with the given capacity and no expiry
    pub fn new(max_elements: usize) -> Self {
        Self {
            max_elements,
            max_age_ms: None,
            size_hint: None,
        }
    }

    /// Expire entries that have not been set within `max_age`
    ///
    /// Rounded up to whole milliseconds, so any non-zero age stays non-zero.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        let ms = max_age.as_nanos().div_ceil(1_000_000);
        self.max_age_ms = Some(ms.min(u64::MAX as u128) as u64);
        self
    }

    /// Pre-size the index for `size` keys
    pub fn with_size_hint(mut self, size: usize) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Check that the options describe a constructible cache
    pub fn validate(&self) -> Result<()> {
        if self.max_elements == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(())
    }

    /// Maximum entry age, if expiry is enabled
    ///
    /// A zero age disables expiry, matching the behavior of an unset option.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Initial index capacity: the size hint, never above `max_elements`
    ///
    /// Without a hint the index grows on demand.
    pub(crate) fn initial_capacity(&self) -> usize {
        self.size_hint.map_or(0, |size| size.min(self.max_elements))
    }
}
