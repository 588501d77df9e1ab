//! Persisted record types and the shapes used to create or edit them.
//!
//! Field names follow the relational columns (`companies`,
//! `image_assets`) so the same structs serialise straight into PostgREST
//! request bodies and deserialise from its responses.
//!
//! List-valued columns (`emails`, `phones`, `product_categories`) are
//! `Option<Vec<String>>`: `None` (SQL `NULL`, "never set") and `Some(vec![])`
//! ("explicitly emptied") are different states and both survive a
//! write/read cycle.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name used whenever extraction could not find one.
pub const DEFAULT_COMPANY_NAME: &str = "New company";

/// A company captured from one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: Uuid,
    /// Owning user, when the deployment tracks ownership.
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    pub website: Option<String>,
    pub short_description: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub booth: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub product_categories: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for a company insert; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCompany {
    pub user_id: Option<String>,
    pub name: String,
    pub website: Option<String>,
    pub short_description: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub booth: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub product_categories: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
}

/// One stored photo of a company. `sort_order` is the zero-based index
/// of the photo in the original upload; the lowest one is the thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: Uuid,
    pub company_id: Uuid,
    pub storage_path: String,
    pub public_url: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Column values for an asset insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImageAsset {
    pub company_id: Uuid,
    pub storage_path: String,
    pub public_url: String,
    pub sort_order: i32,
}

/// Storage path of the `index`-th photo of a company.
pub fn asset_path(company_id: Uuid, index: usize) -> String {
    format!("{company_id}/{index}.jpg")
}

// ── Editing ──────────────────────────────────────────────────────────────

/// A contact list as supplied by an editing client: either a proper list
/// or one free-text string such as `"a@x.com, b@x.com; c@x.com"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactList {
    Items(Vec<String>),
    Joined(String),
}

static RE_LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;]").unwrap());

impl ContactList {
    /// Trimmed, non-empty entries in their original order.
    pub fn into_entries(self) -> Vec<String> {
        match self {
            ContactList::Items(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            ContactList::Joined(text) => RE_LIST_SEPARATOR
                .split(&text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<Vec<String>> for ContactList {
    fn from(items: Vec<String>) -> Self {
        ContactList::Items(items)
    }
}

impl From<&str> for ContactList {
    fn from(text: &str) -> Self {
        ContactList::Joined(text.to_string())
    }
}

/// A partial edit of a company. Only `Some` fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub website: Option<String>,
    pub emails: Option<ContactList>,
    pub phones: Option<ContactList>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub booth: Option<String>,
    pub categories: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// The column-level patch a [`CompanyUpdate`] turns into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_categories: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyChanges {
    /// Build the patch for `update`, stamped with `now`.
    pub fn from_update(update: CompanyUpdate, now: DateTime<Utc>) -> Self {
        Self {
            name: update.name,
            website: update.website,
            country: update.country,
            city: update.city,
            booth: update.booth,
            notes: update.notes,
            emails: update.emails.map(ContactList::into_entries),
            phones: update.phones.map(ContactList::into_entries),
            product_categories: update.categories,
            updated_at: now,
        }
    }

    /// Apply the patch to an in-memory record.
    pub fn apply_to(&self, record: &mut CompanyRecord) {
        if let Some(ref v) = self.name {
            record.name = v.clone();
        }
        if let Some(ref v) = self.website {
            record.website = Some(v.clone());
        }
        if let Some(ref v) = self.country {
            record.country = Some(v.clone());
        }
        if let Some(ref v) = self.city {
            record.city = Some(v.clone());
        }
        if let Some(ref v) = self.booth {
            record.booth = Some(v.clone());
        }
        if let Some(ref v) = self.notes {
            record.notes = Some(v.clone());
        }
        if let Some(ref v) = self.emails {
            record.emails = Some(v.clone());
        }
        if let Some(ref v) = self.phones {
            record.phones = Some(v.clone());
        }
        if let Some(ref v) = self.product_categories {
            record.product_categories = Some(v.clone());
        }
        record.updated_at = self.updated_at;
    }
}

// ── Read model ───────────────────────────────────────────────────────────

/// A company as shown to a reviewer: the record plus its ordered photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyView {
    #[serde(flatten)]
    pub record: CompanyRecord,
    /// Photos ordered by `sort_order`.
    pub photos: Vec<ImageAsset>,
    /// URL of the first photo, if any.
    pub thumbnail: Option<String>,
    /// Always `"Saved"` for records read back from the store.
    pub status: String,
}

impl CompanyView {
    pub fn new(record: CompanyRecord, mut photos: Vec<ImageAsset>) -> Self {
        photos.sort_by_key(|a| a.sort_order);
        let thumbnail = photos.first().map(|a| a.public_url.clone());
        Self {
            record,
            photos,
            thumbnail,
            status: "Saved".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CompanyRecord {
        let now = Utc::now();
        CompanyRecord {
            id: Uuid::new_v4(),
            user_id: None,
            name: "Acme".into(),
            website: None,
            short_description: None,
            country: None,
            city: None,
            booth: None,
            emails: None,
            phones: Some(vec!["+1 555".into()]),
            product_categories: None,
            confidence: Some(0.9),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn joined_contact_list_splits_on_comma_and_semicolon() {
        let list = ContactList::from(" a@x.com, b@x.com;c@x.com ,, ");
        assert_eq!(list.into_entries(), vec!["a@x.com", "b@x.com", "c@x.com"]);
    }

    #[test]
    fn item_contact_list_keeps_order_and_count() {
        let list = ContactList::from(vec!["a@x.com".to_string(), " b@x.com ".to_string()]);
        assert_eq!(list.into_entries(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn contact_list_deserialises_both_shapes() {
        let a: ContactList = serde_json::from_str(r#"["a@x.com","b@x.com"]"#).unwrap();
        let b: ContactList = serde_json::from_str(r#""a@x.com, b@x.com""#).unwrap();
        assert_eq!(a.into_entries(), b.into_entries());
    }

    #[test]
    fn changes_skip_untouched_columns() {
        let update = CompanyUpdate {
            city: Some("Berlin".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(CompanyChanges::from_update(update, Utc::now())).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("city"));
        assert!(obj.contains_key("updated_at"));
        assert!(!obj.contains_key("emails"));
        assert!(!obj.contains_key("name"));
    }

    #[test]
    fn apply_keeps_untouched_fields() {
        let mut r = record();
        let update = CompanyUpdate {
            emails: Some(ContactList::from("x@y.com")),
            ..Default::default()
        };
        CompanyChanges::from_update(update, Utc::now()).apply_to(&mut r);
        assert_eq!(r.emails, Some(vec!["x@y.com".to_string()]));
        assert_eq!(r.phones, Some(vec!["+1 555".to_string()]));
        assert_eq!(r.name, "Acme");
    }

    #[test]
    fn empty_list_and_null_are_distinct_after_serde() {
        let mut r = record();
        r.emails = Some(vec![]);
        let back: CompanyRecord = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back.emails, Some(vec![]));
        assert_eq!(back.product_categories, None);
    }

    #[test]
    fn view_thumbnail_is_lowest_sort_order() {
        let r = record();
        let asset = |order: i32| ImageAsset {
            id: Uuid::new_v4(),
            company_id: r.id,
            storage_path: asset_path(r.id, order as usize),
            public_url: format!("https://cdn/{order}.jpg"),
            sort_order: order,
            created_at: Utc::now(),
        };
        let view = CompanyView::new(r.clone(), vec![asset(2), asset(0)]);
        assert_eq!(view.thumbnail.as_deref(), Some("https://cdn/0.jpg"));
        assert_eq!(view.photos[1].sort_order, 2);
        assert_eq!(view.status, "Saved");
    }
}
