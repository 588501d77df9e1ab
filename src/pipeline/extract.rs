//! Company extraction: normalised photos → [`ExtractionResult`].
//!
//! The model is an unreliable collaborator, so this stage never returns an
//! error. Every failure (no credential, timeout, provider error, empty or
//! unparsable reply) yields the fallback record: name `"New company"`,
//! confidence `0.0`, and a [`DegradeReason`] saying why. Callers cannot
//! mistake a fallback for a real extraction because `degraded` is set.
//!
//! ## Coercion rules for the model's JSON
//!
//! * string fields are trimmed; absent or empty → `None`
//!   (`companyName` falls back to `"New company"` instead)
//! * list fields keep element order, stringify scalars, trim and drop
//!   empties; a list that ends up empty → `None`
//! * `confidence` is used when numeric (clamped to `0..=1`), else `0.5`

use crate::inference::{InferenceService, InlineImage};
use crate::model::DEFAULT_COMPANY_NAME;
use crate::pipeline::normalize::NormalizedImage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Confidence used when the model answers but does not rate itself.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Why an extraction fell back to the default record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DegradeReason {
    /// No inference credential is configured.
    NoCredential,
    /// The provider call failed.
    ServiceError(String),
    /// The provider did not answer within the configured bound.
    Timeout(u64),
    /// The provider answered with nothing.
    EmptyResponse,
    /// The reply was not a JSON object.
    InvalidJson(String),
}

/// Structured company data read off the booth photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub company_name: String,
    pub website: Option<String>,
    pub short_description: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub booth: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub product_categories: Option<Vec<String>>,
    /// Self-reported certainty in `0..=1`.
    pub confidence: f64,
    /// Set when this is the fallback record rather than model output.
    pub degraded: Option<DegradeReason>,
}

impl ExtractionResult {
    /// The record used whenever extraction could not run.
    pub fn fallback(reason: DegradeReason) -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            website: None,
            short_description: None,
            country: None,
            city: None,
            booth: None,
            emails: None,
            phones: None,
            product_categories: None,
            confidence: 0.0,
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```$").unwrap());

/// Remove a ```json … ``` wrapper some providers add despite the prompt.
fn strip_json_fence(text: &str) -> &str {
    match RE_JSON_FENCE.captures(text) {
        Some(caps) => caps.get(1).map_or(text, |m| m.as_str().trim()),
        None => text,
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
}

fn list_field(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = match obj.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(scalar_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        // A lone string where a list was asked for counts as one entry.
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse the model's reply into an [`ExtractionResult`].
///
/// Never fails: empty or non-object replies produce the fallback record.
pub fn parse_extraction(text: &str) -> ExtractionResult {
    let text = text.trim();
    if text.is_empty() {
        return ExtractionResult::fallback(DegradeReason::EmptyResponse);
    }

    let obj = match serde_json::from_str::<Value>(strip_json_fence(text)) {
        Ok(Value::Object(obj)) => obj,
        Ok(other) => {
            return ExtractionResult::fallback(DegradeReason::InvalidJson(format!(
                "expected an object, got {}",
                json_kind(&other)
            )))
        }
        Err(e) => return ExtractionResult::fallback(DegradeReason::InvalidJson(e.to_string())),
    };

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    ExtractionResult {
        company_name: text_field(&obj, "companyName")
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
        website: text_field(&obj, "website"),
        short_description: text_field(&obj, "shortDescription"),
        country: text_field(&obj, "country"),
        city: text_field(&obj, "city"),
        booth: text_field(&obj, "booth"),
        emails: list_field(&obj, "emails"),
        phones: list_field(&obj, "phones"),
        product_categories: list_field(&obj, "productCategories"),
        confidence,
        degraded: None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Client ───────────────────────────────────────────────────────────────

/// Runs the single extraction call of a scan.
#[derive(Clone)]
pub struct Extractor {
    service: Option<Arc<dyn InferenceService>>,
    prompt: String,
    timeout: Duration,
}

impl Extractor {
    pub fn new(
        service: Option<Arc<dyn InferenceService>>,
        prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            prompt: prompt.into(),
            timeout,
        }
    }

    /// Whether a real inference service is wired in.
    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Extract company data from the photos of one scan.
    ///
    /// All images go out in one request, in upload order, after the prompt.
    pub async fn extract(&self, images: &[NormalizedImage]) -> ExtractionResult {
        let Some(ref service) = self.service else {
            info!("No inference credential; using fallback extraction");
            return ExtractionResult::fallback(DegradeReason::NoCredential);
        };

        let inline: Vec<InlineImage> = images.iter().map(|img| InlineImage::jpeg(&img.bytes)).collect();
        let start = Instant::now();

        let reply =
            match tokio::time::timeout(self.timeout, service.generate(&self.prompt, &inline)).await
            {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!("Extraction failed: {e}");
                    return ExtractionResult::fallback(DegradeReason::ServiceError(e.to_string()));
                }
                Err(_) => {
                    warn!(
                        "Extraction via {} timed out after {}s",
                        service.name(),
                        self.timeout.as_secs()
                    );
                    return ExtractionResult::fallback(DegradeReason::Timeout(
                        self.timeout.as_secs(),
                    ));
                }
            };

        let result = parse_extraction(&reply);
        match result.degraded {
            Some(ref reason) => warn!("Unusable extraction reply: {reason:?}"),
            None => debug!(
                "Extracted '{}' (confidence {:.2}) from {} images in {:?}",
                result.company_name,
                result.confidence,
                images.len(),
                start.elapsed()
            ),
        }
        result
    }
}
