//! Persistence: company row first, then one upload + asset row per photo.
//!
//! The company insert is the only step that can fail the scan. After it
//! succeeds, photos are handled one at a time in upload order; a photo
//! whose upload (or asset insert) fails is recorded as
//! [`AssetStatus::Failed`] and skipped, so good extraction data is never
//! thrown away over one bad upload. `sort_order` is always the original
//! index, so a failed photo leaves a gap rather than renumbering the rest.

use crate::error::{ScanError, UploadError};
use crate::model::{asset_path, CompanyRecord, NewCompany, NewImageAsset};
use crate::output::{AssetOutcome, AssetStatus};
use crate::pipeline::normalize::NormalizedImage;
use crate::progress::ProgressCallback;
use crate::store::{BlobStore, CompanyStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MIME type of every stored photo.
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Create the company and attach as many photos as can be stored.
///
/// # Errors
/// [`ScanError::Persistence`] if the company row cannot be inserted; no
/// upload is attempted in that case. Per-photo failures never error.
pub async fn persist_scan(
    store: Arc<dyn CompanyStore>,
    blobs: Arc<dyn BlobStore>,
    company: NewCompany,
    images: Vec<NormalizedImage>,
    progress: Option<ProgressCallback>,
) -> Result<(CompanyRecord, Vec<AssetOutcome>), ScanError> {
    let record = store.insert_company(company).await?;
    info!("Created company {} ('{}')", record.id, record.name);

    let total = images.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, image) in images.iter().enumerate() {
        let status = store_photo(store.as_ref(), blobs.as_ref(), record.id, index, image).await;
        if let Some(ref cb) = progress {
            match &status {
                AssetStatus::Uploaded(_) => cb.on_asset_uploaded(index, total),
                AssetStatus::Failed(e) => cb.on_asset_failed(index, total, &e.to_string()),
            }
        }
        outcomes.push(AssetOutcome { index, status });
    }

    let uploaded = outcomes.iter().filter(|o| o.is_uploaded()).count();
    if uploaded < total {
        warn!(
            "Company {}: {}/{} photos stored",
            record.id, uploaded, total
        );
    }
    Ok((record, outcomes))
}

async fn store_photo(
    store: &dyn CompanyStore,
    blobs: &dyn BlobStore,
    company_id: uuid::Uuid,
    index: usize,
    image: &NormalizedImage,
) -> AssetStatus {
    let path = asset_path(company_id, index);

    if let Err(e) = blobs.upload(&path, &image.bytes, PHOTO_CONTENT_TYPE).await {
        warn!("Storage upload error for {path}: {e}");
        return AssetStatus::Failed(UploadError::UploadFailed {
            index,
            path,
            detail: e.to_string(),
        });
    }

    let asset = NewImageAsset {
        company_id,
        public_url: blobs.public_url(&path),
        storage_path: path.clone(),
        sort_order: index as i32,
    };
    match store.insert_asset(asset).await {
        Ok(row) => {
            debug!("Linked {} as asset {} (sort_order {})", path, row.id, index);
            AssetStatus::Uploaded(row)
        }
        Err(e) => {
            warn!("Asset row for {path} failed: {e}");
            // No row points at this blob any more.
            if let Err(cleanup) = blobs.remove(std::slice::from_ref(&path)).await {
                warn!("Could not remove orphaned {path}: {cleanup}");
            }
            AssetStatus::Failed(UploadError::LinkFailed {
                index,
                path,
                detail: e.to_string(),
            })
        }
    }
}
