use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use super::models::UserDocument;
use super::store::{Sequence, StoreError, UserStore, ENTRY_ID_FIELD};

/// Process-local document store. Each operation runs under one write lock,
/// which gives the same single-document atomicity as the database backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Using in-memory document store");
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn touch(document: &mut Map<String, Value>) {
    document.insert("updated_at".to_string(), json!(Utc::now()));
}

fn sequence_mut<'a>(
    document: &'a mut Map<String, Value>,
    sequence: Sequence,
) -> Result<&'a mut Vec<Value>, StoreError> {
    document
        .entry(sequence.field())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::Query(format!("field '{}' is not an array", sequence.field())))
}

fn has_id(entry: &Value, entry_id: &str) -> bool {
    entry.get(ENTRY_ID_FIELD).and_then(Value::as_str) == Some(entry_id)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find(&self, subject_id: &str) -> Result<Option<UserDocument>, StoreError> {
        let documents = self.documents.read().await;
        match documents.get(subject_id) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, document: &UserDocument) -> Result<bool, StoreError> {
        let value = serde_json::to_value(document)?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.subject_id) {
            return Ok(false);
        }
        documents.insert(document.subject_id.clone(), value);
        Ok(true)
    }

    async fn set_fields(&self, subject_id: &str, fields: Map<String, Value>) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(subject_id).and_then(Value::as_object_mut) else {
            return Ok(0);
        };
        document.extend(fields);
        touch(document);
        Ok(1)
    }

    async fn push_entry(&self, subject_id: &str, sequence: Sequence, entry: Value) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(subject_id).and_then(Value::as_object_mut) else {
            return Ok(0);
        };
        sequence_mut(document, sequence)?.push(entry);
        touch(document);
        Ok(1)
    }

    async fn update_entry(
        &self,
        subject_id: &str,
        sequence: Sequence,
        entry_id: &str,
        fields: Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(subject_id).and_then(Value::as_object_mut) else {
            return Ok(0);
        };
        let entries = sequence_mut(document, sequence)?;
        let Some(entry) = entries
            .iter_mut()
            .find(|e| has_id(e, entry_id))
            .and_then(Value::as_object_mut)
        else {
            return Ok(0);
        };
        entry.extend(fields);
        touch(document);
        Ok(1)
    }

    async fn pull_entry(&self, subject_id: &str, sequence: Sequence, entry_id: &str) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(subject_id).and_then(Value::as_object_mut) else {
            return Ok(0);
        };
        let entries = sequence_mut(document, sequence)?;
        let before = entries.len();
        entries.retain(|e| !has_id(e, entry_id));
        if entries.len() == before {
            return Ok(0);
        }
        touch(document);
        Ok(1)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {
        let mut documents = self.documents.write().await;
        info!("Dropping {} in-memory documents", documents.len());
        documents.clear();
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, amount: f64) -> Value {
        json!({ "_id": id, "category": "food", "amount": amount, "spent": 0.0,
                "created_at": Utc::now(), "updated_at": Utc::now() })
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_if_absent(&UserDocument::new("u1", Utc::now())).await.unwrap();
        store
    }

    #[tokio::test]
    async fn insert_if_absent_is_idempotent() {
        let store = seeded().await;
        store.push_entry("u1", Sequence::Budgets, entry("b1", 10.0)).await.unwrap();

        let created = store.insert_if_absent(&UserDocument::new("u1", Utc::now())).await.unwrap();
        assert!(!created);
        // the earlier append survives a second create attempt
        assert_eq!(store.find("u1").await.unwrap().unwrap().budgets.len(), 1);
    }

    #[tokio::test]
    async fn mutations_on_missing_owner_change_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.push_entry("ghost", Sequence::Budgets, entry("b1", 1.0)).await.unwrap(), 0);
        assert_eq!(store.pull_entry("ghost", Sequence::Budgets, "b1").await.unwrap(), 0);
        assert_eq!(store.set_fields("ghost", Map::new()).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_targets_one_element() {
        let store = seeded().await;
        store.push_entry("u1", Sequence::Budgets, entry("b1", 10.0)).await.unwrap();
        store.push_entry("u1", Sequence::Budgets, entry("b2", 20.0)).await.unwrap();

        let mut fields = Map::new();
        fields.insert("spent".into(), json!(5.0));
        assert_eq!(store.update_entry("u1", Sequence::Budgets, "b2", fields).await.unwrap(), 1);

        let doc = store.find("u1").await.unwrap().unwrap();
        assert_eq!(doc.budgets[0].spent, 0.0);
        assert_eq!(doc.budgets[1].spent, 5.0);
        assert_eq!(doc.budgets[1].amount, 20.0);
    }

    #[tokio::test]
    async fn pull_reports_zero_when_already_gone() {
        let store = seeded().await;
        store.push_entry("u1", Sequence::SavingsGoals, json!({"_id": "g1"})).await.unwrap();
        assert_eq!(store.pull_entry("u1", Sequence::SavingsGoals, "g1").await.unwrap(), 1);
        assert_eq!(store.pull_entry("u1", Sequence::SavingsGoals, "g1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mutations_refresh_document_timestamp() {
        let store = seeded().await;
        let before = store.find("u1").await.unwrap().unwrap().updated_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.push_entry("u1", Sequence::Budgets, entry("b1", 1.0)).await.unwrap();
        let after = store.find("u1").await.unwrap().unwrap().updated_at;
        assert!(after > before);
    }
}
