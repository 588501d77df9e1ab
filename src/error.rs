//! Error types for the boothscan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanError`] (**fatal**): the scan cannot proceed at all (no images,
//!   an undecodable photo, the company row could not be written). Returned
//!   as `Err(ScanError)` from [`crate::Scanner::scan`] and the
//!   [`crate::Catalog`] operations.
//!
//! * [`UploadError`] (**non-fatal**): one photo could not be stored or
//!   linked, but the company record exists and every other photo is fine.
//!   Stored inside [`crate::output::AssetOutcome`] so callers can see
//!   exactly which indices made it.
//!
//! Backend failures surface as [`StoreError`] and inference failures as
//! [`InferenceError`]; the latter never escapes the extraction stage.

use thiserror::Error;
use uuid::Uuid;

/// All fatal errors returned by the boothscan library.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The request was rejected before any work started.
    #[error("Invalid scan request: {0}")]
    Validation(String),

    /// An uploaded image could not be decoded or re-encoded.
    #[error(
        "Unsupported image format (image {index}): {detail}\n\
Use JPEG or PNG, or ensure your device sends photos as JPEG."
    )]
    UnsupportedFormat { index: usize, detail: String },

    /// No company with this id exists.
    #[error("Company {id} not found")]
    CompanyNotFound { id: Uuid },

    /// The asset does not exist or belongs to another company.
    #[error("Asset {asset_id} not found for company {company_id}")]
    AssetNotFound { company_id: Uuid, asset_id: Uuid },

    // ── Server errors ─────────────────────────────────────────────────────
    /// The relational store rejected a write the operation depends on.
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Whether the caller caused this error (4xx) rather than the system (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::Validation(_)
                | ScanError::UnsupportedFormat { .. }
                | ScanError::CompanyNotFound { .. }
                | ScanError::AssetNotFound { .. }
        )
    }
}

/// A non-fatal error for a single photo of a scan.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum UploadError {
    /// The blob store rejected the upload.
    #[error("Image {index}: upload to '{path}' failed: {detail}")]
    UploadFailed {
        index: usize,
        path: String,
        detail: String,
    },

    /// The blob was stored but its asset row could not be inserted.
    #[error("Image {index}: asset row for '{path}' could not be created: {detail}")]
    LinkFailed {
        index: usize,
        path: String,
        detail: String,
    },
}

/// Failure reported by a [`crate::store::CompanyStore`] or
/// [`crate::store::BlobStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body did not have the expected shape.
    #[error("Could not decode response: {0}")]
    Decode(String),

    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A write reported success but returned no row.
    #[error("{0} returned no row")]
    MissingRow(&'static str),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Request(e.to_string())
        }
    }
}

/// The inference service could not produce a response.
#[derive(Debug, Clone, Error)]
#[error("Inference via '{provider}' failed: {detail}")]
pub struct InferenceError {
    pub provider: String,
    pub detail: String,
}
