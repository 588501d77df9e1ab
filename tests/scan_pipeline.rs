//! Integration tests for the scan pipeline and record management.
//!
//! Everything runs against the in-memory backends with a scripted
//! inference service, so no network or credentials are needed. Wrappers
//! around the memory stores inject the failures under test.
//!
//! Run with:
//!   cargo test --test scan_pipeline

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use boothscan::{
    AssetStatus, BlobStore, CompanyChanges, CompanyStore, CompanyUpdate, ContactList,
    DegradeReason, InferenceError, InferenceService, InlineImage, LocalBlobStore, MemoryBlobStore,
    MemoryStore, ScanConfig, ScanError, ScanProgressCallback, ScanRequest, Scanner, StoreError,
    UploadError,
};
use boothscan::model::{CompanyRecord, ImageAsset, NewCompany, NewImageAsset};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use uuid::Uuid;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

const ACME_REPLY: &str = r#"{
  "companyName": "Acme Robotics",
  "website": "https://acme.io",
  "shortDescription": "Robotics startup",
  "country": "Germany",
  "city": "Berlin",
  "booth": "H2-114",
  "emails": ["hello@acme.io", "sales@acme.io"],
  "phones": null,
  "productCategories": ["Robots", "Grippers"],
  "confidence": 0.45
}"#;

/// Replies with a fixed text and records the decoded size of every image
/// it was sent, per call, in the order received.
struct Scripted {
    reply: String,
    calls: AtomicUsize,
    images_seen: Mutex<Vec<Vec<(u32, u32)>>>,
}

impl Scripted {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            images_seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl InferenceService for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _prompt: &str,
        images: &[InlineImage],
    ) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(images.iter().all(|i| i.mime_type == "image/jpeg"));
        let sizes = images
            .iter()
            .map(|i| {
                let bytes = STANDARD.decode(&i.data).unwrap();
                let img = image::load_from_memory(&bytes).unwrap();
                (img.width(), img.height())
            })
            .collect();
        self.images_seen.lock().unwrap().push(sizes);
        Ok(self.reply.clone())
    }
}

struct Broken;

#[async_trait]
impl InferenceService for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn generate(&self, _: &str, _: &[InlineImage]) -> Result<String, InferenceError> {
        Err(InferenceError {
            provider: "broken".into(),
            detail: "503 Service Unavailable".into(),
        })
    }
}

/// Memory blobs whose uploads fail for paths ending in one of `fail_suffixes`.
struct FlakyBlobs {
    inner: MemoryBlobStore,
    fail_suffixes: Vec<String>,
}

#[async_trait]
impl BlobStore for FlakyBlobs {
    async fn upload(&self, path: &str, bytes: &[u8], ct: &str) -> Result<(), StoreError> {
        if self.fail_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            return Err(StoreError::Http {
                status: 500,
                body: "storage down".into(),
            });
        }
        self.inner.upload(path, bytes, ct).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        self.inner.remove(paths).await
    }
}

/// Memory blobs that signal each upload start, then take a while to finish.
struct SlowBlobs {
    inner: MemoryBlobStore,
    started: Notify,
    delay: Duration,
}

#[async_trait]
impl BlobStore for SlowBlobs {
    async fn upload(&self, path: &str, bytes: &[u8], ct: &str) -> Result<(), StoreError> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.upload(path, bytes, ct).await
    }

    fn public_url(&self, path: &str) -> String {
        self.inner.public_url(path)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        self.inner.remove(paths).await
    }
}

/// Memory store with switchable failures on insert paths.
struct FaultyStore {
    inner: MemoryStore,
    fail_company_insert: bool,
    fail_asset_sort_order: Option<i32>,
}

impl FaultyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_company_insert: false,
            fail_asset_sort_order: None,
        }
    }
}

#[async_trait]
impl CompanyStore for FaultyStore {
    async fn insert_company(&self, company: NewCompany) -> Result<CompanyRecord, StoreError> {
        if self.fail_company_insert {
            return Err(StoreError::Http {
                status: 503,
                body: "database unavailable".into(),
            });
        }
        self.inner.insert_company(company).await
    }
    async fn get_company(&self, id: Uuid) -> Result<Option<CompanyRecord>, StoreError> {
        self.inner.get_company(id).await
    }
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        self.inner.list_companies().await
    }
    async fn update_company(
        &self,
        id: Uuid,
        changes: &CompanyChanges,
    ) -> Result<Option<CompanyRecord>, StoreError> {
        self.inner.update_company(id, changes).await
    }
    async fn delete_company(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_company(id).await
    }
    async fn insert_asset(&self, asset: NewImageAsset) -> Result<ImageAsset, StoreError> {
        if self.fail_asset_sort_order == Some(asset.sort_order) {
            return Err(StoreError::Http {
                status: 500,
                body: "insert failed".into(),
            });
        }
        self.inner.insert_asset(asset).await
    }
    async fn list_assets(&self, company_id: Uuid) -> Result<Vec<ImageAsset>, StoreError> {
        self.inner.list_assets(company_id).await
    }
    async fn list_assets_for(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<ImageAsset>, StoreError> {
        self.inner.list_assets_for(company_ids).await
    }
    async fn get_asset(
        &self,
        company_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<ImageAsset>, StoreError> {
        self.inner.get_asset(company_id, asset_id).await
    }
    async fn delete_asset(&self, asset_id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_asset(asset_id).await
    }
}

fn config_with(service: Arc<dyn InferenceService>) -> ScanConfig {
    ScanConfig::builder().inference(service).build().unwrap()
}

fn memory_scanner(
    service: Arc<dyn InferenceService>,
) -> (Scanner, Arc<MemoryStore>, Arc<MemoryBlobStore>) {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::default());
    let scanner = Scanner::new(config_with(service), store.clone(), blobs.clone());
    (scanner, store, blobs)
}

fn credential_in_env() -> bool {
    [
        "GEMINI_API_KEY",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "EDGEQUAKE_LLM_PROVIDER",
    ]
    .iter()
    .any(|k| std::env::var(k).map(|v| !v.is_empty()).unwrap_or(false))
}

// ── Scan ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_creates_company_with_ordered_photos() {
    let service = Scripted::new(ACME_REPLY);
    let (scanner, store, blobs) = memory_scanner(service.clone());

    let out = scanner
        .scan(ScanRequest::new(vec![png(64, 48), png(32, 32), png(48, 64)]).owner("user-1"))
        .await
        .unwrap();

    let saved = store.get_company(out.company_id).await.unwrap().unwrap();
    assert_eq!(saved.name, "Acme Robotics");
    assert_eq!(saved.user_id.as_deref(), Some("user-1"));
    assert_eq!(saved.booth.as_deref(), Some("H2-114"));
    assert_eq!(
        saved.emails,
        Some(vec!["hello@acme.io".to_string(), "sales@acme.io".to_string()])
    );
    assert_eq!(saved.phones, None);
    assert_eq!(saved.confidence, Some(0.45));

    let assets = store.list_assets(out.company_id).await.unwrap();
    let orders: Vec<i32> = assets.iter().map(|a| a.sort_order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    for (i, a) in assets.iter().enumerate() {
        assert_eq!(a.storage_path, format!("{}/{}.jpg", out.company_id, i));
        assert_eq!(a.public_url, blobs.public_url(&a.storage_path));
        let bytes = blobs.get(&a.storage_path).await.unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *service.images_seen.lock().unwrap(),
        vec![vec![(64, 48), (32, 32), (48, 64)]]
    );
    assert_eq!(out.stats.uploaded_images, 3);
    assert_eq!(out.stats.failed_images, 0);
}

#[tokio::test]
async fn low_confidence_is_noted_after_description() {
    let (scanner, store, _) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner.scan(ScanRequest::new(vec![png(8, 8)])).await.unwrap();

    let saved = store.get_company(out.company_id).await.unwrap().unwrap();
    assert_eq!(
        saved.notes.as_deref(),
        Some("Robotics startup\n\nLow confidence extraction (0.45).")
    );
}

#[tokio::test]
async fn confident_extraction_without_description_has_no_notes() {
    let reply = r#"```json
{"companyName": "Quiet Co", "confidence": 0.92}
```"#;
    let (scanner, _, _) = memory_scanner(Scripted::new(reply));
    let out = scanner.scan(ScanRequest::new(vec![png(8, 8)])).await.unwrap();
    assert_eq!(out.company.name, "Quiet Co");
    assert_eq!(out.company.notes, None);
    assert!(!out.extraction.is_degraded());
}

#[tokio::test]
async fn large_photo_is_stored_within_max_side() {
    let (scanner, store, blobs) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner
        .scan(ScanRequest::new(vec![png(3200, 800)]))
        .await
        .unwrap();

    let asset = &store.list_assets(out.company_id).await.unwrap()[0];
    let stored = blobs.get(&asset.storage_path).await.unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1600, 400));
}

#[tokio::test]
async fn empty_request_is_rejected_without_writes() {
    let (scanner, store, blobs) = memory_scanner(Scripted::new(ACME_REPLY));
    let err = scanner.scan(ScanRequest::new(vec![])).await.unwrap_err();

    assert!(matches!(err, ScanError::Validation(_)));
    assert!(err.is_client_error());
    assert_eq!(store.company_count().await, 0);
    assert!(blobs.paths().await.is_empty());
}

#[tokio::test]
async fn undecodable_photo_aborts_before_persistence() {
    let service = Scripted::new(ACME_REPLY);
    let (scanner, store, blobs) = memory_scanner(service.clone());
    let err = scanner
        .scan(ScanRequest::new(vec![
            png(8, 8),
            b"definitely not an image".to_vec(),
        ]))
        .await
        .unwrap_err();

    match err {
        ScanError::UnsupportedFormat { index, .. } => assert_eq!(index, 1),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.company_count().await, 0);
    assert!(blobs.paths().await.is_empty());
}

#[tokio::test]
async fn failed_upload_leaves_gap_and_keeps_record() {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(FlakyBlobs {
        inner: MemoryBlobStore::default(),
        fail_suffixes: vec!["/1.jpg".into()],
    });
    let scanner = Scanner::new(
        config_with(Scripted::new(ACME_REPLY)),
        store.clone(),
        blobs.clone(),
    );

    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8), png(8, 8)]))
        .await
        .unwrap();

    assert!(store.get_company(out.company_id).await.unwrap().is_some());
    let orders: Vec<i32> = store
        .list_assets(out.company_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.sort_order)
        .collect();
    assert_eq!(orders, vec![0, 2]);

    assert_eq!(out.assets.len(), 3);
    assert!(matches!(
        out.assets[1].status,
        AssetStatus::Failed(UploadError::UploadFailed { index: 1, .. })
    ));
    assert_eq!(out.stats.failed_images, 1);
}

#[tokio::test]
async fn failed_asset_row_removes_its_blob() {
    let store = Arc::new(FaultyStore {
        fail_asset_sort_order: Some(0),
        ..FaultyStore::new()
    });
    let blobs = Arc::new(MemoryBlobStore::default());
    let scanner = Scanner::new(
        config_with(Scripted::new(ACME_REPLY)),
        store.clone(),
        blobs.clone(),
    );

    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8)]))
        .await
        .unwrap();

    assert!(matches!(
        out.assets[0].status,
        AssetStatus::Failed(UploadError::LinkFailed { index: 0, .. })
    ));
    assert_eq!(
        blobs.paths().await,
        vec![format!("{}/1.jpg", out.company_id)]
    );
}

#[tokio::test]
async fn company_insert_failure_is_fatal_and_uploads_nothing() {
    let store = Arc::new(FaultyStore {
        fail_company_insert: true,
        ..FaultyStore::new()
    });
    let blobs = Arc::new(MemoryBlobStore::default());
    let scanner = Scanner::new(
        config_with(Scripted::new(ACME_REPLY)),
        store.clone(),
        blobs.clone(),
    );

    let err = scanner
        .scan(ScanRequest::new(vec![png(8, 8)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Persistence(_)));
    assert!(!err.is_client_error());
    assert!(blobs.paths().await.is_empty());
}

#[tokio::test]
async fn service_error_degrades_to_default_record() {
    let (scanner, store, _) = memory_scanner(Arc::new(Broken));
    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8)]).hint("booth near the entrance"))
        .await
        .unwrap();

    assert!(matches!(
        out.extraction.degraded,
        Some(DegradeReason::ServiceError(_))
    ));
    let saved = store.get_company(out.company_id).await.unwrap().unwrap();
    assert_eq!(saved.name, "New company");
    assert_eq!(saved.confidence, Some(0.0));
    assert_eq!(
        saved.notes.as_deref(),
        Some("Low confidence extraction (0.00).")
    );
    assert_eq!(store.asset_count().await, 1);
}

#[tokio::test]
async fn missing_credential_yields_zero_confidence() {
    if credential_in_env() {
        println!("SKIP — an inference credential is set in the environment");
        return;
    }
    let store = Arc::new(MemoryStore::new());
    let scanner = Scanner::new(
        ScanConfig::default(),
        store.clone(),
        Arc::new(MemoryBlobStore::default()),
    );
    assert!(!scanner.extractor().is_configured());

    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(16, 16)]))
        .await
        .unwrap();
    assert_eq!(out.extraction.confidence, 0.0);
    assert_eq!(out.extraction.company_name, "New company");
    assert_eq!(out.extraction.degraded, Some(DegradeReason::NoCredential));
    assert_eq!(out.stats.uploaded_images, 2);
}

#[tokio::test]
async fn progress_events_cover_every_photo() {
    #[derive(Default)]
    struct Recorder {
        started: AtomicUsize,
        normalized: AtomicUsize,
        extracted: AtomicUsize,
        uploaded: AtomicUsize,
        failed: AtomicUsize,
        completed: Mutex<Option<(Uuid, usize, usize)>>,
    }
    impl ScanProgressCallback for Recorder {
        fn on_scan_start(&self, total: usize) {
            self.started.store(total, Ordering::SeqCst);
        }
        fn on_image_normalized(&self, _: usize, _: usize, _: usize) {
            self.normalized.fetch_add(1, Ordering::SeqCst);
        }
        fn on_extraction_complete(&self, _: f64, _: bool) {
            self.extracted.fetch_add(1, Ordering::SeqCst);
        }
        fn on_asset_uploaded(&self, _: usize, _: usize) {
            self.uploaded.fetch_add(1, Ordering::SeqCst);
        }
        fn on_asset_failed(&self, _: usize, _: usize, _: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_scan_complete(&self, id: Uuid, uploaded: usize, total: usize) {
            *self.completed.lock().unwrap() = Some((id, uploaded, total));
        }
    }

    let recorder = Arc::new(Recorder::default());
    let config = ScanConfig::builder()
        .inference(Scripted::new(ACME_REPLY))
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let blobs = Arc::new(FlakyBlobs {
        inner: MemoryBlobStore::default(),
        fail_suffixes: vec!["/0.jpg".into()],
    });
    let scanner = Scanner::new(config, Arc::new(MemoryStore::new()), blobs);

    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8)]))
        .await
        .unwrap();

    assert_eq!(recorder.started.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.normalized.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.extracted.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.uploaded.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.failed.load(Ordering::SeqCst), 1);
    assert_eq!(
        *recorder.completed.lock().unwrap(),
        Some((out.company_id, 1, 2))
    );
}

#[tokio::test]
async fn scan_output_is_json_serialisable() {
    let (scanner, _, _) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner.scan(ScanRequest::new(vec![png(8, 8)])).await.unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["company_id"], out.company_id.to_string());
    assert_eq!(json["extraction"]["companyName"], "Acme Robotics");
    assert_eq!(json["assets"][0]["status"]["outcome"], "uploaded");
}

#[tokio::test]
async fn dropped_scan_still_finishes_persisting() {
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(SlowBlobs {
        inner: MemoryBlobStore::default(),
        started: Notify::new(),
        delay: Duration::from_millis(40),
    });
    let scanner = Scanner::new(
        config_with(Scripted::new(ACME_REPLY)),
        store.clone(),
        blobs.clone(),
    );

    // Abandon the request as soon as the first upload begins.
    tokio::select! {
        _ = scanner.scan(ScanRequest::new(vec![png(16, 16), png(16, 16), png(16, 16)])) => {
            panic!("scan returned before its first upload finished");
        }
        _ = blobs.started.notified() => {}
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.asset_count().await < 3 {
        assert!(Instant::now() < deadline, "persistence stopped after the caller left");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let companies = store.list_companies().await.unwrap();
    assert_eq!(companies.len(), 1);
    let assets = store.list_assets(companies[0].id).await.unwrap();
    assert_eq!(assets.len(), 3);
    for asset in &assets {
        assert!(
            blobs.inner.get(&asset.storage_path).await.is_some(),
            "row without blob: {}",
            asset.storage_path
        );
    }
}

#[tokio::test]
async fn offline_directory_receives_photos() {
    let dir = tempfile::tempdir().unwrap();
    let scanner = Scanner::new(
        config_with(Scripted::new(ACME_REPLY)),
        Arc::new(MemoryStore::new()),
        Arc::new(LocalBlobStore::new(dir.path())),
    );
    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8)]))
        .await
        .unwrap();
    for i in 0..2 {
        let p = dir.path().join(out.company_id.to_string()).join(format!("{i}.jpg"));
        assert!(p.exists(), "missing {}", p.display());
    }
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn email_list_round_trips_through_update() {
    let (scanner, _, _) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner.scan(ScanRequest::new(vec![png(8, 8)])).await.unwrap();
    let catalog = scanner.catalog();

    let view = catalog
        .update(
            out.company_id,
            CompanyUpdate {
                emails: Some(ContactList::from(vec![
                    " a@x.com".to_string(),
                    "b@x.com ".to_string(),
                ])),
                categories: Some(vec!["Sensors".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        view.record.emails,
        Some(vec!["a@x.com".to_string(), "b@x.com".to_string()])
    );

    let back = catalog.get(out.company_id).await.unwrap().unwrap();
    assert_eq!(back.record.emails.as_ref().map(Vec::len), Some(2));
    assert_eq!(back.record.product_categories, Some(vec!["Sensors".to_string()]));
    assert_eq!(back.record.name, "Acme Robotics");
    assert!(back.record.updated_at >= out.company.updated_at);
}

#[tokio::test]
async fn update_accepts_joined_phone_string() {
    let (scanner, _, _) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner.scan(ScanRequest::new(vec![png(8, 8)])).await.unwrap();
    let update: CompanyUpdate =
        serde_json::from_str(r#"{"phones": "+49 30 1234; +49 30 5678 ,"}"#).unwrap();

    let view = scanner
        .catalog()
        .update(out.company_id, update)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        view.record.phones,
        Some(vec!["+49 30 1234".to_string(), "+49 30 5678".to_string()])
    );
}

#[tokio::test]
async fn delete_cascades_rows_and_blobs() {
    let (scanner, store, blobs) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8)]))
        .await
        .unwrap();

    assert!(scanner.catalog().delete(out.company_id).await.unwrap());
    assert_eq!(store.company_count().await, 0);
    assert_eq!(store.asset_count().await, 0);
    assert!(blobs.paths().await.is_empty());
}

#[tokio::test]
async fn remove_photo_keeps_remaining_order() {
    let (scanner, store, blobs) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8), png(8, 8)]))
        .await
        .unwrap();
    let catalog = scanner.catalog();
    let middle = out.uploaded_assets()[1].clone();

    catalog.remove_photo(out.company_id, middle.id).await.unwrap();

    let orders: Vec<i32> = store
        .list_assets(out.company_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.sort_order)
        .collect();
    assert_eq!(orders, vec![0, 2]);
    assert!(blobs.get(&middle.storage_path).await.is_none());

    let err = catalog
        .remove_photo(out.company_id, middle.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::AssetNotFound { .. }));
}

#[tokio::test]
async fn list_shows_thumbnail_of_first_photo() {
    let (scanner, _, _) = memory_scanner(Scripted::new(ACME_REPLY));
    let out = scanner
        .scan(ScanRequest::new(vec![png(8, 8), png(8, 8)]))
        .await
        .unwrap();

    let views = scanner.catalog().list().await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].status, "Saved");
    assert_eq!(
        views[0].thumbnail.as_deref(),
        Some(out.uploaded_assets()[0].public_url.as_str())
    );
}
