//! # boothscan
//!
//! Turn a handful of trade-show booth photos into a structured company
//! record using a vision language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photos (JPEG / PNG / WebP …)
//!  │
//!  ├─ 1. Validate   at least one image
//!  ├─ 2. Normalise  EXIF-rotate, fit 1600px, re-encode JPEG (spawn_blocking)
//!  ├─ 3. Extract    one multimodal call → JSON → ExtractionResult
//!  │                (no credential / timeout / bad JSON → confidence 0)
//!  ├─ 4. Persist    company row, then upload + link each photo
//!  └─ 5. Output     company id, record, per-photo outcomes, stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boothscan::{MemoryBlobStore, MemoryStore, ScanConfig, ScanRequest, Scanner};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let scanner = Scanner::new(
//!         ScanConfig::default(),
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(MemoryBlobStore::default()),
//!     );
//!     let photo = std::fs::read("booth.jpg")?;
//!     let output = scanner.scan(ScanRequest::new(vec![photo])).await?;
//!     println!("{} ({:.2})", output.company.name, output.extraction.confidence);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `boothscan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when embedding the library in a service:
//! ```toml
//! boothscan = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalog;
pub mod config;
pub mod error;
pub mod inference;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scan;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalog::Catalog;
pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::{InferenceError, ScanError, StoreError, UploadError};
pub use inference::{InferenceService, InlineImage, LlmInference};
pub use model::{
    CompanyChanges, CompanyRecord, CompanyUpdate, CompanyView, ContactList, ImageAsset,
    NewCompany, NewImageAsset, DEFAULT_COMPANY_NAME,
};
pub use output::{AssetOutcome, AssetStatus, ScanOutput, ScanRequest, ScanStats};
pub use pipeline::extract::{DegradeReason, ExtractionResult};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use scan::Scanner;
pub use store::{
    BlobStore, CompanyStore, LocalBlobStore, MemoryBlobStore, MemoryStore, SupabaseBlobStore,
    SupabaseConfig, SupabaseStore,
};
