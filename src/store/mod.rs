//! Narrow contracts for the relational store and the blob store.
//!
//! The pipeline and [`crate::Catalog`] receive these as injected
//! `Arc<dyn …>` handles; nothing in the crate holds a global client.
//!
//! | Backend | Relational | Blobs | Use |
//! |---------|------------|-------|-----|
//! | [`memory`]   | [`MemoryStore`]   | [`MemoryBlobStore`]   | tests, offline runs |
//! | [`local`]    | n/a               | [`LocalBlobStore`]    | offline runs that keep the photos |
//! | [`supabase`] | [`SupabaseStore`] | [`SupabaseBlobStore`] | production |

use crate::error::StoreError;
use crate::model::{CompanyChanges, CompanyRecord, ImageAsset, NewCompany, NewImageAsset};
use async_trait::async_trait;
use uuid::Uuid;

pub mod local;
pub mod memory;
pub mod supabase;

pub use local::LocalBlobStore;
pub use memory::{MemoryBlobStore, MemoryStore};
pub use supabase::{SupabaseBlobStore, SupabaseConfig, SupabaseStore};

/// Rows of `companies` and `image_assets`. Each call is atomic on its own;
/// no multi-call transactions are assumed.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Insert a company and return the stored row with its generated id.
    async fn insert_company(&self, company: NewCompany) -> Result<CompanyRecord, StoreError>;

    async fn get_company(&self, id: Uuid) -> Result<Option<CompanyRecord>, StoreError>;

    /// All companies, newest first.
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, StoreError>;

    /// Apply `changes`; `None` if no such company.
    async fn update_company(
        &self,
        id: Uuid,
        changes: &CompanyChanges,
    ) -> Result<Option<CompanyRecord>, StoreError>;

    /// Delete a company together with its asset rows. Returns whether it existed.
    async fn delete_company(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_asset(&self, asset: NewImageAsset) -> Result<ImageAsset, StoreError>;

    /// Assets of a company ordered by `sort_order` ascending.
    async fn list_assets(&self, company_id: Uuid) -> Result<Vec<ImageAsset>, StoreError>;

    /// Assets of several companies in one query, ordered by `sort_order`
    /// ascending. Callers group the rows by `company_id`.
    async fn list_assets_for(&self, company_ids: &[Uuid])
        -> Result<Vec<ImageAsset>, StoreError>;

    /// An asset, only if it belongs to `company_id`.
    async fn get_asset(
        &self,
        company_id: Uuid,
        asset_id: Uuid,
    ) -> Result<Option<ImageAsset>, StoreError>;

    async fn delete_asset(&self, asset_id: Uuid) -> Result<bool, StoreError>;
}

/// Object storage for photo files, under one fixed bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, replacing anything already there.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
        -> Result<(), StoreError>;

    /// Public URL under which `path` is served.
    fn public_url(&self, path: &str) -> String;

    /// Delete the given paths. Missing paths are not an error.
    async fn remove(&self, paths: &[String]) -> Result<(), StoreError>;
}
