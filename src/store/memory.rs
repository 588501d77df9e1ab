//! Process-local stores. Nothing survives the process; ids are UUIDv4 and
//! timestamps come from the system clock.

use super::{BlobStore, CompanyStore};
use crate::error::StoreError;
use crate::model::{CompanyChanges, CompanyRecord, ImageAsset, NewCompany, NewImageAsset};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    /// Insertion order doubles as creation order.
    companies: Vec<CompanyRecord>,
    assets: Vec<ImageAsset>,
}

/// In-memory [`CompanyStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn company_count(&self) -> usize {
        self.tables.read().await.companies.len()
    }

    pub async fn asset_count(&self) -> usize {
        self.tables.read().await.assets.len()
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn insert_company(&self, company: NewCompany) -> Result<CompanyRecord, StoreError> {
        let now = Utc::now();
        let record = CompanyRecord {
            id: Uuid::new_v4(),
            user_id: company.user_id,
            name: company.name,
            website: company.website,
            short_description: company.short_description,
            country: company.country,
            city: company.city,
            booth: company.booth,
            emails: company.emails,
            phones: company.phones,
            product_categories: company.product_categories,
            confidence: company.confidence,
            notes: company.notes,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.companies.push(record.clone());
        Ok(record)
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<CompanyRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CompanyRecord> = tables.companies.iter().rev().cloned().collect();
        // Stable: equal timestamps keep newest-inserted first.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_company(
        &self,
        id: Uuid,
        changes: &CompanyChanges,
    ) -> Result<Option<CompanyRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.companies.iter_mut().find(|c| c.id == id).map(|c| {
            changes.apply_to(c);
            c.clone()
        }))
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.companies.len();
        tables.companies.retain(|c| c.id != id);
        let existed = tables.companies.len() != before;
        if existed {
            tables.assets.retain(|a| a.company_id != id);
        }
        Ok(existed)
    }

    async fn insert_asset(&self, asset: NewImageAsset) -> Result<ImageAsset, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.companies.iter().any(|c| c.id == asset.company_id) {
            return Err(StoreError::Http {
                status: 409,
                body: format!("company {} does not exist", asset.company_id),
            });
        }
        let row = ImageAsset {
            id: Uuid::new_v4(),
            company_id: asset.company_id,
            storage_path: asset.storage_path,
            public_url: asset.public_url,
            sort_order: asset.sort_order,
            created_at: Utc::now(),
        };
        tables.assets.push(row.clone());
        Ok(row)
    }

    async fn list_assets(&self, company_id: Uuid) -> Result<Vec<ImageAsset>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ImageAsset> = tables
            .assets
            .iter()
            .filter(|a| a.company_id == company_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.sort_order);
        Ok(rows)
    }

    async fn list_assets_for(
        &self,
        company_ids: &[Uuid],
    ) -> Result<Vec<ImageAsset>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ImageAsset> = tables
            .assets
            .iter()
            .filter(|a| company_ids.contains(&a.company_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.sort_order);
        Ok(rows)
    }

    async fn get_asset(
        &self,
        company_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<ImageAsset>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .assets
            .iter()
            .find(|a| a.id == asset_id && a.company_id == company_id)
            .cloned())
    }

    async fn delete_asset(&self, asset_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.assets.len();
        tables.assets.retain(|a| a.id != asset_id);
        Ok(tables.assets.len() != before)
    }
}

/// In-memory [`BlobStore`]; public URLs are `{base_url}/{path}`.
pub struct MemoryBlobStore {
    base_url: String,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(path).cloned()
    }

    /// Stored paths in lexical order.
    pub async fn paths(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://company-assets")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StoreError> {
        self.objects
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        for p in paths {
            objects.remove(p);
        }
        Ok(())
    }
}
