//! Cache Key Module
//!
//! Derives deterministic, URL-safe cache keys from lesson generation requests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Model name used when a request does not pin one.
pub const DEFAULT_MODEL: &str = "default";

// == Amount Tier ==
/// How much content (or how many exercises) a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountTier {
    Light,
    Standard,
    Extensive,
}

// == Request Descriptor ==
/// The parameters of a content generation request that determine its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub topic: String,
    pub grade_level: String,
    pub content_amount: AmountTier,
    pub exercise_amount: AmountTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl RequestDescriptor {
    pub fn new(
        topic: impl Into<String>,
        grade_level: impl Into<String>,
        content_amount: AmountTier,
        exercise_amount: AmountTier,
    ) -> Self {
        Self {
            topic: topic.into(),
            grade_level: grade_level.into(),
            content_amount,
            exercise_amount,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    // == Normalize ==
    /// Lower-cases and trims the topic and fills in the default model.
    /// Grade and tiers are kept verbatim.
    pub fn normalize(&self) -> NormalizedDescriptor {
        NormalizedDescriptor {
            topic: self.topic.trim().to_lowercase(),
            grade_level: self.grade_level.clone(),
            content_amount: self.content_amount,
            exercise_amount: self.exercise_amount,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    // == Cache Key ==
    pub fn cache_key(&self) -> String {
        generate_key(self)
    }
}

/// Descriptor after normalization; its field order fixes the key encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDescriptor {
    pub topic: String,
    pub grade_level: String,
    pub content_amount: AmountTier,
    pub exercise_amount: AmountTier,
    pub model: String,
}

/// Encodes the normalized descriptor as unpadded URL-safe base64 of its JSON
/// form, so the key doubles as a storage identifier.
pub fn generate_key(descriptor: &RequestDescriptor) -> String {
    let normalized = descriptor.normalize();
    // Plain strings and unit enums; this serialization cannot fail.
    let json = serde_json::to_vec(&normalized).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}
