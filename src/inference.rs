//! The inference-service seam: a prompt plus inline images in, text out.
//!
//! The pipeline only ever talks to [`InferenceService`]. [`LlmInference`]
//! adapts any `edgequake_llm` provider (Gemini, OpenAI, Anthropic, Ollama,
//! …) to it; tests substitute a scripted double.
//!
//! ## Resolution order
//!
//! [`resolve_inference`] goes from most-specific to least-specific:
//!
//! 1. **Pre-built service** (`config.inference`)
//! 2. **Named provider + model** (`config.provider_name`)
//! 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
//! 4. **First API key present**: `GEMINI_API_KEY`, `OPENAI_API_KEY`,
//!    `ANTHROPIC_API_KEY`
//!
//! When none of these yields a provider the result is `None`, and the
//! extraction stage degrades instead of failing.

use crate::config::ScanConfig;
use crate::error::InferenceError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One image embedded in an inference request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// Base64 (standard alphabet) of the encoded bytes.
    pub data: String,
    pub mime_type: String,
}

impl InlineImage {
    /// Wrap an encoded JPEG.
    pub fn jpeg(bytes: &[u8]) -> Self {
        let data = STANDARD.encode(bytes);
        debug!("Encoded image → {} bytes base64", data.len());
        Self {
            data,
            mime_type: "image/jpeg".to_string(),
        }
    }
}

/// A multimodal model that answers one prompt about a set of images.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Short provider label used in logs and errors.
    fn name(&self) -> &str;

    /// Send `prompt` followed by `images` (in order) and return the raw text reply.
    async fn generate(&self, prompt: &str, images: &[InlineImage])
        -> Result<String, InferenceError>;
}

/// [`InferenceService`] backed by an `edgequake_llm` provider.
pub struct LlmInference {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
}

impl LlmInference {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: 0.1,
            max_tokens: 2048,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Sampling settings plus a JSON-only response format.
    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..CompletionOptions::json_mode()
        }
    }
}

#[async_trait]
impl InferenceService for LlmInference {
    fn name(&self) -> &str {
        &self.label
    }

    async fn generate(
        &self,
        prompt: &str,
        images: &[InlineImage],
    ) -> Result<String, InferenceError> {
        // Instruction text first, then every photo in upload order, all in a
        // single user turn.
        let parts: Vec<ImageData> = images
            .iter()
            .map(|img| ImageData::new(img.data.clone(), img.mime_type.as_str()))
            .collect();
        let messages = vec![ChatMessage::user_with_images(prompt, parts)];

        let response = self
            .provider
            .chat(&messages, Some(&self.options()))
            .await
            .map_err(|e| InferenceError {
                provider: self.label.clone(),
                detail: format!("{e}"),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Default model per provider when none is configured.
fn default_model(provider: &str) -> &'static str {
    match provider {
        "gemini" => "gemini-2.5-flash",
        "anthropic" => "claude-sonnet-4-20250514",
        _ => "gpt-4.1-mini",
    }
}

fn create_service(
    provider_name: &str,
    model: &str,
    config: &ScanConfig,
) -> Option<Arc<dyn InferenceService>> {
    match ProviderFactory::create_llm_provider(provider_name, model) {
        Ok(provider) => {
            info!("Extraction via {provider_name}/{model}");
            let service = LlmInference::new(provider, format!("{provider_name}/{model}"))
                .with_sampling(config.temperature, config.max_tokens);
            Some(Arc::new(service))
        }
        Err(e) => {
            warn!("Inference provider '{provider_name}' unavailable: {e}");
            None
        }
    }
}

fn env_present(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}

/// Pick the inference service for `config`, or `None` when no credential
/// is available.
pub fn resolve_inference(config: &ScanConfig) -> Option<Arc<dyn InferenceService>> {
    // 1) Caller-provided service takes priority
    if let Some(ref service) = config.inference {
        return Some(Arc::clone(service));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model(name));
        return create_service(name, model, config);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_service(&prov, &model, config);
        }
    }

    // 4) First API key present
    for (key, provider) in [
        ("GEMINI_API_KEY", "gemini"),
        ("OPENAI_API_KEY", "openai"),
        ("ANTHROPIC_API_KEY", "anthropic"),
    ] {
        if env_present(key) {
            let model = config.model.as_deref().unwrap_or(default_model(provider));
            return create_service(provider, model, config);
        }
    }

    debug!("No inference credential configured");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_llm::MockProvider;

    struct Echo;

    #[async_trait]
    impl InferenceService for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            prompt: &str,
            images: &[InlineImage],
        ) -> Result<String, InferenceError> {
            Ok(format!("{prompt}:{}", images.len()))
        }
    }

    #[test]
    fn inline_jpeg_is_valid_base64() {
        let img = InlineImage::jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(img.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&img.data).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn prebuilt_service_wins() {
        let config = ScanConfig::builder()
            .inference(Arc::new(Echo))
            .provider_name("openai")
            .build()
            .unwrap();
        let service = resolve_inference(&config).expect("service");
        assert_eq!(service.name(), "echo");
    }

    #[test]
    fn default_models_per_provider() {
        assert!(default_model("gemini").starts_with("gemini"));
        assert!(default_model("anthropic").starts_with("claude"));
        assert!(default_model("openai").starts_with("gpt"));
    }

    #[test]
    fn llm_options_request_json_only() {
        let service = LlmInference::new(Arc::new(MockProvider::new()), "mock")
            .with_sampling(0.3, 512);
        let options = service.options();
        assert_eq!(options.response_format.as_deref(), Some("json_object"));
        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn llm_inference_returns_provider_reply() {
        let provider = MockProvider::new();
        provider.add_response(r#"{"company_name":"Acme"}"#).await;
        let service = LlmInference::new(Arc::new(provider), "mock");

        let images = vec![InlineImage::jpeg(b"a"), InlineImage::jpeg(b"b")];
        let reply = service.generate("Extract", &images).await.unwrap();
        assert_eq!(reply, r#"{"company_name":"Acme"}"#);
        assert_eq!(service.name(), "mock");
    }

    #[tokio::test]
    async fn service_sees_images_in_order() {
        let images = vec![InlineImage::jpeg(b"a"), InlineImage::jpeg(b"b")];
        let reply = Echo.generate("p", &images).await.unwrap();
        assert_eq!(reply, "p:2");
    }
}
