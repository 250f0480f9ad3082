//! Database Models - document collections and the driver-shaped result types
//! returned verbatim to API callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored document. Always a JSON object; `_id` holds the storage key.
pub type Document = Map<String, Value>;

/// Field holding the system-assigned storage key of every document.
pub const ID_FIELD: &str = "_id";

/// Role value that grants access to privileged routes.
pub const ADMIN_ROLE: &str = "admin";

/// Document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Blogs,
    Reviews,
    Contacts,
    SavedBlogs,
    Users,
    Profiles,
    Authors,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Blogs,
        Collection::Reviews,
        Collection::Contacts,
        Collection::SavedBlogs,
        Collection::Users,
        Collection::Profiles,
        Collection::Authors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Blogs => "blogs",
            Collection::Reviews => "reviews",
            Collection::Contacts => "contacts",
            Collection::SavedBlogs => "saved_blogs",
            Collection::Users => "users",
            Collection::Profiles => "profiles",
            Collection::Authors => "authors",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertOneResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// Result of a single `$set` update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

/// Result of a single delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}
