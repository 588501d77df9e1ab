//! Progress-callback trait for per-stage scan events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to receive
//! events as the pipeline normalises, extracts and uploads.
//!
//! # Example
//!
//! ```rust
//! use boothscan::{ScanConfig, ScanProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl ScanProgressCallback for CountingCallback {
//!     fn on_asset_uploaded(&self, index: usize, total: usize) {
//!         self.uploaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("photo {}/{} stored", index + 1, total);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { uploaded: AtomicUsize::new(0) });
//! let config = ScanConfig::builder()
//!     .progress_callback(cb as Arc<dyn ScanProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;
use uuid::Uuid;

/// Called by the scan pipeline as it moves through its stages.
///
/// Normalisation runs concurrently, so `on_image_normalized` may be called
/// from several threads at once and in any index order. Upload events
/// arrive sequentially in index order. All methods default to no-ops.
pub trait ScanProgressCallback: Send + Sync {
    /// Called once, before any image is decoded.
    fn on_scan_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called when one image has been normalised.
    ///
    /// # Arguments
    /// * `index`: zero-based upload index
    /// * `total`: number of images in the scan
    /// * `bytes`: size of the normalised JPEG
    fn on_image_normalized(&self, index: usize, total: usize, bytes: usize) {
        let _ = (index, total, bytes);
    }

    /// Called once the extraction step has produced its result.
    fn on_extraction_complete(&self, confidence: f64, degraded: bool) {
        let _ = (confidence, degraded);
    }

    /// Called when a photo has been stored and linked.
    fn on_asset_uploaded(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a photo was skipped because it could not be stored.
    fn on_asset_failed(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once the record and all upload attempts are done.
    fn on_scan_complete(&self, company_id: Uuid, uploaded: usize, total: usize) {
        let _ = (company_id, uploaded, total);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;
