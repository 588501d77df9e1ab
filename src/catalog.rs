//! Reviewing and editing scanned companies after the fact.
//!
//! [`Catalog`] wraps the same store and blob handles the scanner writes
//! to. Reads return [`CompanyView`]s (record, ordered photos, thumbnail);
//! writes keep rows and blobs consistent. A blob that cannot be removed is
//! logged and left behind, never surfaced as an error.

use crate::error::ScanError;
use crate::model::{CompanyChanges, CompanyUpdate, CompanyView, ImageAsset};
use crate::store::{BlobStore, CompanyStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CompanyStore>,
    blobs: Arc<dyn BlobStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn CompanyStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Every company, newest first, with its photos. Two queries in total.
    pub async fn list(&self) -> Result<Vec<CompanyView>, ScanError> {
        let records = self.store.list_companies().await?;
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();

        let mut by_company: HashMap<Uuid, Vec<ImageAsset>> = HashMap::new();
        for asset in self.store.list_assets_for(&ids).await? {
            by_company.entry(asset.company_id).or_default().push(asset);
        }

        let views: Vec<CompanyView> = records
            .into_iter()
            .map(|record| {
                let photos = by_company.remove(&record.id).unwrap_or_default();
                CompanyView::new(record, photos)
            })
            .collect();
        debug!("Listed {} companies", views.len());
        Ok(views)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<CompanyView>, ScanError> {
        let Some(record) = self.store.get_company(id).await? else {
            return Ok(None);
        };
        let photos = self.store.list_assets(id).await?;
        Ok(Some(CompanyView::new(record, photos)))
    }

    /// Apply a partial update. `None` if the company does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        update: CompanyUpdate,
    ) -> Result<Option<CompanyView>, ScanError> {
        let changes = CompanyChanges::from_update(update, Utc::now());
        let Some(record) = self.store.update_company(id, &changes).await? else {
            return Ok(None);
        };
        info!("Updated company {}", id);
        let photos = self.store.list_assets(id).await?;
        Ok(Some(CompanyView::new(record, photos)))
    }

    /// Delete a company, its asset rows and their blobs. Returns whether
    /// the company existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ScanError> {
        let paths: Vec<String> = self
            .store
            .list_assets(id)
            .await?
            .into_iter()
            .map(|a| a.storage_path)
            .collect();

        if !self.store.delete_company(id).await? {
            return Ok(false);
        }
        info!("Deleted company {} ({} photos)", id, paths.len());

        if let Err(e) = self.blobs.remove(&paths).await {
            warn!("Company {id}: could not remove {} blobs: {e}", paths.len());
        }
        Ok(true)
    }

    /// Assets of a company ordered by `sort_order`.
    pub async fn assets(&self, company_id: Uuid) -> Result<Vec<ImageAsset>, ScanError> {
        Ok(self.store.list_assets(company_id).await?)
    }

    /// Remove one photo: blob first, then its row.
    ///
    /// # Errors
    /// - [`ScanError::CompanyNotFound`]: no company `company_id`
    /// - [`ScanError::AssetNotFound`]: `asset_id` is not a photo of it
    pub async fn remove_photo(&self, company_id: Uuid, asset_id: Uuid) -> Result<(), ScanError> {
        if self.store.get_company(company_id).await?.is_none() {
            return Err(ScanError::CompanyNotFound { id: company_id });
        }
        let asset = self
            .store
            .get_asset(company_id, asset_id)
            .await?
            .ok_or(ScanError::AssetNotFound {
                company_id,
                asset_id,
            })?;

        if let Err(e) = self
            .blobs
            .remove(std::slice::from_ref(&asset.storage_path))
            .await
        {
            warn!("Could not remove blob {}: {e}", asset.storage_path);
        }
        self.store.delete_asset(asset.id).await?;
        info!("Removed photo {} from company {}", asset_id, company_id);
        Ok(())
    }
}
