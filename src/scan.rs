//! The scan entry point: photos in, company id out.
//!
//! [`Scanner`] is built once by the host with its store, blob store and
//! config, then shared across requests. Each [`Scanner::scan`] call runs
//! the stages in [`crate::pipeline`] and returns a [`ScanOutput`].
//!
//! ## Failure model
//!
//! | Stage | Failure | Effect |
//! |-------|---------|--------|
//! | validate  | no files | `Validation`, nothing written |
//! | normalize | any image undecodable | `UnsupportedFormat`, nothing written |
//! | extract   | anything | never fails; fallback record, confidence 0 |
//! | persist   | company insert | `Persistence`, no uploads attempted |
//! | persist   | one photo | recorded in `assets`, scan still succeeds |
//!
//! Persistence runs in its own task. If the caller drops the `scan`
//! future (client disconnect), the write sequence still completes, so an
//! asset row never exists without its uploaded blob.

use crate::catalog::Catalog;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::inference::resolve_inference;
use crate::model::NewCompany;
use crate::output::{ScanOutput, ScanRequest, ScanStats};
use crate::pipeline::extract::{ExtractionResult, Extractor};
use crate::pipeline::{normalize, persist};
use crate::prompts::EXTRACTION_PROMPT;
use crate::store::{BlobStore, CompanyStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Build the notes field from the extraction.
///
/// Parts, joined by a blank line: the short description (if any), then a
/// warning when `confidence < threshold`. `None` when there are no parts.
pub fn compose_notes(
    short_description: Option<&str>,
    confidence: f64,
    threshold: f64,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(desc) = short_description.map(str::trim).filter(|d| !d.is_empty()) {
        parts.push(desc.to_string());
    }
    if confidence < threshold {
        // Ties round up: 0.125 shows as 0.13.
        let shown = (confidence * 100.0).round() / 100.0;
        parts.push(format!("Low confidence extraction ({shown:.2})."));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Map an extraction onto the columns of a new company row.
///
/// List columns are copied as-is: a list that was not read stays NULL
/// rather than becoming `[]`.
pub fn company_from_extraction(
    extraction: &ExtractionResult,
    owner_id: Option<String>,
    notes: Option<String>,
) -> NewCompany {
    NewCompany {
        user_id: owner_id,
        name: extraction.company_name.clone(),
        website: extraction.website.clone(),
        short_description: extraction.short_description.clone(),
        country: extraction.country.clone(),
        city: extraction.city.clone(),
        booth: extraction.booth.clone(),
        emails: extraction.emails.clone(),
        phones: extraction.phones.clone(),
        product_categories: extraction.product_categories.clone(),
        confidence: Some(extraction.confidence),
        notes,
    }
}

/// Runs scans against one set of injected backends.
#[derive(Clone)]
pub struct Scanner {
    config: ScanConfig,
    store: Arc<dyn CompanyStore>,
    blobs: Arc<dyn BlobStore>,
    extractor: Extractor,
}

impl Scanner {
    /// Create a scanner. The inference service is resolved here, once;
    /// see [`crate::inference::resolve_inference`].
    pub fn new(
        config: ScanConfig,
        store: Arc<dyn CompanyStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let service = resolve_inference(&config);
        let prompt = config
            .extraction_prompt
            .clone()
            .unwrap_or_else(|| EXTRACTION_PROMPT.to_string());
        let extractor = Extractor::new(
            service,
            prompt,
            Duration::from_secs(config.extraction_timeout_secs),
        );
        Self {
            config,
            store,
            blobs,
            extractor,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Record-management operations over the same backends.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(Arc::clone(&self.store), Arc::clone(&self.blobs))
    }

    /// Normalise and extract without writing anything.
    pub async fn extract_only(&self, files: Vec<Vec<u8>>) -> Result<ExtractionResult, ScanError> {
        if files.is_empty() {
            return Err(ScanError::Validation("At least one image is required".into()));
        }
        let images = normalize::normalize_all(
            files,
            self.config.max_side,
            self.config.jpeg_quality,
            self.config.progress_callback.clone(),
        )
        .await?;
        Ok(self.extractor.extract(&images).await)
    }

    /// Run one scan end to end.
    ///
    /// # Errors
    /// - [`ScanError::Validation`]: no files
    /// - [`ScanError::UnsupportedFormat`]: an image could not be normalised
    /// - [`ScanError::Persistence`]: the company row could not be created
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanOutput, ScanError> {
        let total_start = Instant::now();
        let ScanRequest {
            files,
            owner_id,
            hint_text,
        } = request;

        // ── Step 1: Validate ─────────────────────────────────────────────
        if files.is_empty() {
            return Err(ScanError::Validation("At least one image is required".into()));
        }
        let total = files.len();
        info!("Starting scan: {} images", total);
        if let Some(ref hint) = hint_text {
            debug!("Scan hint ({} chars) is not used for extraction", hint.len());
        }
        let progress = self.config.progress_callback.clone();
        if let Some(ref cb) = progress {
            cb.on_scan_start(total);
        }

        // ── Step 2: Normalise every image ────────────────────────────────
        let normalize_start = Instant::now();
        let images = normalize::normalize_all(
            files,
            self.config.max_side,
            self.config.jpeg_quality,
            progress.clone(),
        )
        .await?;
        let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;
        debug!("Normalised {} images in {}ms", images.len(), normalize_duration_ms);

        // ── Step 3: Extract ──────────────────────────────────────────────
        let extraction_start = Instant::now();
        let extraction = self.extractor.extract(&images).await;
        let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
        if let Some(ref cb) = progress {
            cb.on_extraction_complete(extraction.confidence, extraction.is_degraded());
        }

        // ── Step 4: Derive notes ─────────────────────────────────────────
        let notes = compose_notes(
            extraction.short_description.as_deref(),
            extraction.confidence,
            self.config.low_confidence_threshold,
        );
        let company = company_from_extraction(&extraction, owner_id, notes);

        // ── Step 5: Persist (detached from the caller) ───────────────────
        let persist_start = Instant::now();
        let task = tokio::spawn(persist::persist_scan(
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
            company,
            images,
            progress.clone(),
        ));
        let (record, assets) = task
            .await
            .map_err(|e| ScanError::Internal(format!("Persist task panicked: {e}")))??;
        let persist_duration_ms = persist_start.elapsed().as_millis() as u64;

        // ── Step 6: Report ───────────────────────────────────────────────
        let uploaded = assets.iter().filter(|a| a.is_uploaded()).count();
        if let Some(ref cb) = progress {
            cb.on_scan_complete(record.id, uploaded, total);
        }

        let stats = ScanStats {
            total_images: total,
            uploaded_images: uploaded,
            failed_images: total - uploaded,
            normalize_duration_ms,
            extraction_duration_ms,
            persist_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Scan complete: company {}, {}/{} photos, {}ms total",
            record.id, uploaded, total, stats.total_duration_ms
        );

        Ok(ScanOutput {
            company_id: record.id,
            company: record,
            extraction,
            assets,
            stats,
        })
    }
}
