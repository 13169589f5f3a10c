//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::RequestDescriptor;

/// Request body for storing a raw entry (PUT /entries)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.trim().is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.ttl == Some(0) {
            return Some("TTL must be greater than 0".to_string());
        }
        None
    }
}

/// Request body for storing a generated response (PUT /responses)
#[derive(Debug, Clone, Deserialize)]
pub struct CacheResponseRequest {
    pub descriptor: RequestDescriptor,
    pub response: Value,
}

impl CacheResponseRequest {
    pub fn validate(&self) -> Option<String> {
        validate_descriptor(&self.descriptor)
    }
}

/// Rejects descriptors that could never come from a real generation request.
pub fn validate_descriptor(descriptor: &RequestDescriptor) -> Option<String> {
    if descriptor.topic.trim().is_empty() {
        return Some("Topic cannot be empty".to_string());
    }
    if descriptor.grade_level.trim().is_empty() {
        return Some("Grade level cannot be empty".to_string());
    }
    None
}
