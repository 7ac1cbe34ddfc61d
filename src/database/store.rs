use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::models::UserDocument;

/// Key of an entry inside an embedded sequence
pub const ENTRY_ID_FIELD: &str = "_id";

/// Errors from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Connection(String),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Embedded sequences of a user document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Budgets,
    SavingsGoals,
}

impl Sequence {
    /// Field name inside the stored document
    pub fn field(&self) -> &'static str {
        match self {
            Sequence::Budgets => "budgets",
            Sequence::SavingsGoals => "savings_goals",
        }
    }
}

/// One document per user, keyed by subject id.
///
/// Every method is a single atomic operation on one document. Mutations return the
/// number of documents changed (0 or 1) and refresh the document's `updated_at`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, subject_id: &str) -> Result<Option<UserDocument>, StoreError>;

    /// Create the document unless one already exists. Returns true when created.
    async fn insert_if_absent(&self, document: &UserDocument) -> Result<bool, StoreError>;

    /// Shallow-merge top level fields
    async fn set_fields(&self, subject_id: &str, fields: Map<String, Value>) -> Result<u64, StoreError>;

    /// Append an entry to an embedded sequence
    async fn push_entry(&self, subject_id: &str, sequence: Sequence, entry: Value) -> Result<u64, StoreError>;

    /// Merge fields into the one entry whose `_id` matches
    async fn update_entry(
        &self,
        subject_id: &str,
        sequence: Sequence,
        entry_id: &str,
        fields: Map<String, Value>,
    ) -> Result<u64, StoreError>;

    /// Remove the entry whose `_id` matches
    async fn pull_entry(&self, subject_id: &str, sequence: Sequence, entry_id: &str) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self);

    fn backend(&self) -> &'static str;
}
