//! Cached Response Module
//!
//! Envelope stored by `CacheStore::cache_ai_response`.

use serde::{Deserialize, Serialize};

use crate::cache::RequestDescriptor;

/// Bumped whenever the envelope shape changes; older envelopes read as misses.
pub const CACHE_FORMAT_VERSION: u32 = 1;

// == Cached Response ==
/// A generated payload together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse<T> {
    pub version: u32,
    pub descriptor: RequestDescriptor,
    /// Unix milliseconds
    pub generated_at: u64,
    pub payload: T,
}

impl<T> CachedResponse<T> {
    pub fn new(descriptor: RequestDescriptor, generated_at: u64, payload: T) -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            descriptor,
            generated_at,
            payload,
        }
    }

    pub fn is_current(&self) -> bool {
        self.version == CACHE_FORMAT_VERSION
    }
}
