//! Supabase backends: PostgREST for rows, Supabase Storage for photos.
//!
//! Both clients authenticate with the service-role key and are created
//! once by the host, then shared through `Arc`. The expected schema is in
//! `sql/schema.sql`; `image_assets.company_id` cascades on delete.

use super::{BlobStore, CompanyStore};
use crate::error::StoreError;
use crate::model::{CompanyChanges, CompanyRecord, ImageAsset, NewCompany, NewImageAsset};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Default storage bucket for company photos.
pub const DEFAULT_BUCKET: &str = "company-assets";

/// Connection settings shared by [`SupabaseStore`] and [`SupabaseBlobStore`].
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub service_key: String,
    pub bucket: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            bucket: DEFAULT_BUCKET.to_string(),
            timeout_secs: 30,
        }
    }

    /// Read `SUPABASE_URL` (or `NEXT_PUBLIC_SUPABASE_URL`),
    /// `SUPABASE_SERVICE_ROLE_KEY` and optionally `BOOTHSCAN_BUCKET`.
    /// `None` when either of the first two is missing.
    pub fn from_env() -> Option<Self> {
        let non_empty = |k: &str| std::env::var(k).ok().filter(|v| !v.is_empty());
        let url = non_empty("SUPABASE_URL").or_else(|| non_empty("NEXT_PUBLIC_SUPABASE_URL"))?;
        let key = non_empty("SUPABASE_SERVICE_ROLE_KEY")?;
        let mut config = Self::new(url, key);
        if let Some(bucket) = non_empty("BOOTHSCAN_BUCKET") {
            config.bucket = bucket;
        }
        Some(config)
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    fn client(&self) -> Result<Client, StoreError> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(StoreError::from)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Turn a non-2xx response into [`StoreError::Http`].
async fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        body,
    })
}

/// PostgREST `in` filter value: `in.(a,b,c)`.
fn in_filter(ids: &[Uuid]) -> String {
    let joined: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    format!("in.({})", joined.join(","))
}

async fn rows<T: DeserializeOwned>(resp: Response) -> Result<Vec<T>, StoreError> {
    Ok(check(resp).await?.json::<Vec<T>>().await?)
}

// ── Rows ─────────────────────────────────────────────────────────────────

/// [`CompanyStore`] over PostgREST (`/rest/v1`).
pub struct SupabaseStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let client = config.client()?;
        Ok(Self { config, client })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, name)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.config
            .authorize(self.client.request(method, self.table(table)))
            .header("Prefer", "return=representation")
    }
}

#[async_trait]
impl CompanyStore for SupabaseStore {
    async fn insert_company(&self, company: NewCompany) -> Result<CompanyRecord, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, "companies")
            .json(&company)
            .send()
            .await?;
        let row = rows::<CompanyRecord>(resp)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::MissingRow("insert companies"))?;
        debug!("Inserted company {}", row.id);
        Ok(row)
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<CompanyRecord>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, "companies")
            .query(&[("id", format!("eq.{id}")), ("select", "*".into())])
            .send()
            .await?;
        Ok(rows::<CompanyRecord>(resp).await?.into_iter().next())
    }

    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, "companies")
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        rows(resp).await
    }

    async fn update_company(
        &self,
        id: Uuid,
        changes: &CompanyChanges,
    ) -> Result<Option<CompanyRecord>, StoreError> {
        let resp = self
            .request(reqwest::Method::PATCH, "companies")
            .query(&[("id", format!("eq.{id}"))])
            .json(changes)
            .send()
            .await?;
        Ok(rows::<CompanyRecord>(resp).await?.into_iter().next())
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, StoreError> {
        let resp = self
            .request(reqwest::Method::DELETE, "companies")
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        Ok(!rows::<CompanyRecord>(resp).await?.is_empty())
    }

    async fn insert_asset(&self, asset: NewImageAsset) -> Result<ImageAsset, StoreError> {
        let resp = self
            .request(reqwest::Method::POST, "image_assets")
            .json(&asset)
            .send()
            .await?;
        rows::<ImageAsset>(resp)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::MissingRow("insert image_assets"))
    }

    async fn list_assets(&self, company_id: Uuid) -> Result<Vec<ImageAsset>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, "image_assets")
            .query(&[
                ("company_id", format!("eq.{company_id}")),
                ("select", "*".into()),
                ("order", "sort_order.asc".into()),
            ])
            .send()
            .await?;
        rows(resp).await
    }

    async fn list_assets_for(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<ImageAsset>, StoreError> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .request(reqwest::Method::GET, "image_assets")
            .query(&[
                ("company_id", in_filter(company_ids)),
                ("select", "*".into()),
                ("order", "sort_order.asc".into()),
            ])
            .send()
            .await?;
        rows(resp).await
    }

    async fn get_asset(
        &self,
        company_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<ImageAsset>, StoreError> {
        let resp = self
            .request(reqwest::Method::GET, "image_assets")
            .query(&[
                ("id", format!("eq.{asset_id}")),
                ("company_id", format!("eq.{company_id}")),
                ("select", "*".into()),
            ])
            .send()
            .await?;
        Ok(rows::<ImageAsset>(resp).await?.into_iter().next())
    }

    async fn delete_asset(&self, asset_id: Uuid) -> Result<bool, StoreError> {
        let resp = self
            .request(reqwest::Method::DELETE, "image_assets")
            .query(&[("id", format!("eq.{asset_id}"))])
            .send()
            .await?;
        Ok(!rows::<ImageAsset>(resp).await?.is_empty())
    }
}

// ── Blobs ────────────────────────────────────────────────────────────────

/// [`BlobStore`] over Supabase Storage (`/storage/v1`).
pub struct SupabaseBlobStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseBlobStore {
    pub fn new(config: SupabaseConfig) -> Result<Self, StoreError> {
        let client = config.client()?;
        Ok(Self { config, client })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }
}

#[async_trait]
impl BlobStore for SupabaseBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let req = self
            .client
            .post(self.object_url(path))
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes.to_vec());
        check(self.config.authorize(req).send().await?).await?;
        debug!("Uploaded {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        if paths.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.config.url, self.config.bucket);
        let req = self
            .client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": paths }));
        check(self.config.authorize(req).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_trims_trailing_slash_and_redacts_key() {
        let c = SupabaseConfig::new("https://xyz.supabase.co/", "service-secret");
        assert_eq!(c.url, "https://xyz.supabase.co");
        assert_eq!(c.bucket, DEFAULT_BUCKET);
        assert!(!format!("{c:?}").contains("service-secret"));
    }

    #[test]
    fn storage_urls() {
        let c = SupabaseConfig::new("https://xyz.supabase.co", "k").with_bucket("photos");
        let blobs = SupabaseBlobStore::new(c).unwrap();
        assert_eq!(
            blobs.object_url("abc/0.jpg"),
            "https://xyz.supabase.co/storage/v1/object/photos/abc/0.jpg"
        );
        assert_eq!(
            blobs.public_url("abc/0.jpg"),
            "https://xyz.supabase.co/storage/v1/object/public/photos/abc/0.jpg"
        );
    }

    #[test]
    fn in_filter_lists_every_id() {
        let a = Uuid::nil();
        let b = Uuid::from_u128(7);
        assert_eq!(in_filter(&[a, b]), format!("in.({a},{b})"));
        assert_eq!(in_filter(&[a]), "in.(00000000-0000-0000-0000-000000000000)");
    }

    #[test]
    fn table_url() {
        let store = SupabaseStore::new(SupabaseConfig::new("https://xyz.supabase.co", "k")).unwrap();
        assert_eq!(
            store.table("companies"),
            "https://xyz.supabase.co/rest/v1/companies"
        );
    }
}
