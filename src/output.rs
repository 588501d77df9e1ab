//! Input and output types of one scan.

use crate::error::UploadError;
use crate::model::{CompanyRecord, ImageAsset};
use crate::pipeline::extract::ExtractionResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One batch of booth photos to turn into a company.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Raw uploaded images in the order the user took them.
    pub files: Vec<Vec<u8>>,
    /// Owning user, when the deployment tracks ownership.
    pub owner_id: Option<String>,
    /// Free-text hint from the user. Accepted and logged, but not sent to
    /// the model.
    pub hint_text: Option<String>,
}

impl ScanRequest {
    pub fn new(files: Vec<Vec<u8>>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }

    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint_text = Some(hint.into());
        self
    }
}

/// What happened to one photo during persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum AssetStatus {
    Uploaded(ImageAsset),
    Failed(UploadError),
}

/// Persistence result for the photo at `index` of the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetOutcome {
    pub index: usize,
    pub status: AssetStatus,
}

impl AssetOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self.status, AssetStatus::Uploaded(_))
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        match &self.status {
            AssetStatus::Uploaded(a) => Some(a),
            AssetStatus::Failed(_) => None,
        }
    }
}

/// Result of a successful scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    pub company_id: Uuid,
    pub company: CompanyRecord,
    pub extraction: ExtractionResult,
    /// One entry per input image, in input order.
    pub assets: Vec<AssetOutcome>,
    pub stats: ScanStats,
}

impl ScanOutput {
    /// Assets that were stored, in `sort_order`.
    pub fn uploaded_assets(&self) -> Vec<&ImageAsset> {
        self.assets.iter().filter_map(AssetOutcome::asset).collect()
    }
}

/// Timing and counts for one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_images: usize,
    pub uploaded_images: usize,
    pub failed_images: usize,
    pub normalize_duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub persist_duration_ms: u64,
    pub total_duration_ms: u64,
}
