//! Configuration types for booth scanning.
//!
//! All pipeline behaviour is controlled through [`ScanConfig`], built via
//! its [`ScanConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the CLI, tests and a host service.

use crate::error::ScanError;
use crate::inference::InferenceService;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Configuration for a scan.
///
/// Built via [`ScanConfig::builder()`] or using [`ScanConfig::default()`].
///
/// # Example
/// ```rust
/// use boothscan::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .max_side(1600)
///     .jpeg_quality(80)
///     .model("gemini-2.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// Longest allowed image side in pixels after normalisation. Default: 1600.
    ///
    /// 1600 px keeps booth signage legible for the model while a batch of
    /// photos still fits comfortably in one inference request.
    pub max_side: u32,

    /// JPEG quality (1–100) of normalised images. Default: 80.
    pub jpeg_quality: u8,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    pub provider_name: Option<String>,

    /// Pre-constructed inference service. Takes precedence over `provider_name`.
    pub inference: Option<Arc<dyn InferenceService>>,

    /// Sampling temperature for the extraction call. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Upper bound for the extraction call in seconds. Default: 60.
    ///
    /// A call that runs longer yields the degraded result.
    pub extraction_timeout_secs: u64,

    /// Confidence below which a warning line is added to the notes. Default: 0.6.
    pub low_confidence_threshold: f64,

    /// Custom extraction prompt. If None, uses [`crate::prompts::EXTRACTION_PROMPT`].
    pub extraction_prompt: Option<String>,

    /// Receives per-stage events while a scan runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_side: 1600,
            jpeg_quality: 80,
            model: None,
            provider_name: None,
            inference: None,
            temperature: 0.1,
            max_tokens: 2048,
            extraction_timeout_secs: 60,
            low_confidence_threshold: 0.6,
            extraction_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("max_side", &self.max_side)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("inference", &self.inference.as_ref().map(|s| s.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("extraction_timeout_secs", &self.extraction_timeout_secs)
            .field("low_confidence_threshold", &self.low_confidence_threshold)
            .field("extraction_prompt", &self.extraction_prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ScanProgressCallback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn max_side(mut self, px: u32) -> Self {
        self.config.max_side = px;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn inference(mut self, service: Arc<dyn InferenceService>) -> Self {
        self.config.inference = Some(service);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn extraction_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extraction_timeout_secs = secs;
        self
    }

    pub fn low_confidence_threshold(mut self, t: f64) -> Self {
        self.config.low_confidence_threshold = t;
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if c.max_side < 16 {
            return Err(ScanError::InvalidConfig(format!(
                "max_side must be ≥ 16, got {}",
                c.max_side
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ScanError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if !(0.0..=1.0).contains(&c.low_confidence_threshold) {
            return Err(ScanError::InvalidConfig(format!(
                "Low-confidence threshold must be 0–1, got {}",
                c.low_confidence_threshold
            )));
        }
        if c.extraction_timeout_secs == 0 {
            return Err(ScanError::InvalidConfig(
                "Extraction timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}
