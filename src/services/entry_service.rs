use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::Caller;
use crate::database::models::{EntryKind, UserDocument};
use crate::database::UserStore;
use crate::error::ApiError;
use crate::types::Access;

/// List/create/update/delete over one embedded sequence of the owner's document
pub struct EntryService<K> {
    store: Arc<dyn UserStore>,
    _kind: PhantomData<K>,
}

impl<K: EntryKind> EntryService<K> {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    fn label_lower() -> String {
        K::LABEL.to_lowercase()
    }

    /// Entries in stored order. A missing owner document is an empty list.
    pub async fn list(&self, caller: &Caller, owner_id: &str) -> Result<Vec<K>, ApiError> {
        caller.authorize(owner_id, Access::Read)?;
        info!("Listing {} entries for user {}", Self::label_lower(), owner_id);

        match self.store.find(owner_id).await? {
            Some(document) => Ok(K::entries(&document).to_vec()),
            None => {
                info!("No document for user {}, returning empty list", owner_id);
                Ok(Vec::new())
            }
        }
    }

    /// Append a new entry and return its id
    pub async fn create(&self, caller: &Caller, owner_id: &str, payload: K::New) -> Result<String, ApiError> {
        caller.authorize(owner_id, Access::Write)?;

        let now = Utc::now();
        let entry_id = Uuid::new_v4().simple().to_string();
        let entry = K::create(payload, entry_id.clone(), now).map_err(ApiError::bad_request)?;

        // Create-if-absent, then a separate append: concurrent first writes cannot clobber each other
        if self.store.insert_if_absent(&UserDocument::new(owner_id, now)).await? {
            info!("Created document for user {} on first write", owner_id);
        }

        let modified = self
            .store
            .push_entry(owner_id, K::SEQUENCE, serde_json::to_value(&entry)?)
            .await?;
        if modified == 0 {
            error!(
                "Append of {} {} left document of user {} unmodified",
                Self::label_lower(),
                entry_id,
                owner_id
            );
            return Err(ApiError::internal_server_error(format!("Failed to create {}", Self::label_lower())));
        }

        info!("Created {} {} for user {}", Self::label_lower(), entry_id, owner_id);
        Ok(entry_id)
    }

    /// Merge the non-null fields of the patch into one entry
    pub async fn update(
        &self,
        caller: &Caller,
        owner_id: &str,
        entry_id: &str,
        patch: K::Patch,
    ) -> Result<(), ApiError> {
        caller.authorize(owner_id, Access::Write)?;
        K::validate_patch(&patch).map_err(ApiError::bad_request)?;

        self.require_entry(owner_id, entry_id).await?;

        let mut fields = match serde_json::to_value(&patch)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.retain(|_, v| !v.is_null());
        fields.insert("updated_at".to_string(), json!(Utc::now()));

        let modified = self.store.update_entry(owner_id, K::SEQUENCE, entry_id, fields).await?;
        if modified == 0 {
            warn!("{} {} vanished before update for user {}", K::LABEL, entry_id, owner_id);
            return Err(ApiError::not_found(format!("{} not found or not modified", K::LABEL)));
        }

        info!("Updated {} {} for user {}", Self::label_lower(), entry_id, owner_id);
        Ok(())
    }

    pub async fn delete(&self, caller: &Caller, owner_id: &str, entry_id: &str) -> Result<(), ApiError> {
        caller.authorize(owner_id, Access::Write)?;

        self.require_entry(owner_id, entry_id).await?;

        let modified = self.store.pull_entry(owner_id, K::SEQUENCE, entry_id).await?;
        if modified == 0 {
            warn!("{} {} vanished before delete for user {}", K::LABEL, entry_id, owner_id);
            return Err(ApiError::not_found(format!("{} not found or not deleted", K::LABEL)));
        }

        info!("Deleted {} {} for user {}", Self::label_lower(), entry_id, owner_id);
        Ok(())
    }

    async fn require_entry(&self, owner_id: &str, entry_id: &str) -> Result<(), ApiError> {
        let Some(document) = self.store.find(owner_id).await? else {
            warn!("User {} not found for {} {}", owner_id, Self::label_lower(), entry_id);
            return Err(ApiError::not_found("User not found"));
        };

        if !K::entries(&document).iter().any(|e| e.entry_id() == entry_id) {
            warn!("{} {} not found for user {}", K::LABEL, entry_id, owner_id);
            return Err(ApiError::not_found(format!("{} not found", K::LABEL)));
        }

        Ok(())
    }
}
