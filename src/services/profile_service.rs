use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::api::format::{ProfileUpdate, ProfileView};
use crate::auth::Caller;
use crate::database::models::UserDocument;
use crate::database::UserStore;
use crate::error::ApiError;
use crate::types::Access;

/// Outcome of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyRegistered,
}

impl Registration {
    pub fn message(&self) -> &'static str {
        match self {
            Registration::Created => "User registered successfully",
            Registration::AlreadyRegistered => "User already registered",
        }
    }
}

pub struct ProfileService {
    store: Arc<dyn UserStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create the caller's own document from their claims. Repeating it is a no-op.
    pub async fn register(&self, caller: &Caller) -> Result<Registration, ApiError> {
        let document = UserDocument::from_identity(&caller.identity, Utc::now());

        if self.store.insert_if_absent(&document).await? {
            info!("Registered user {} ({:?})", caller.subject_id(), caller.identity.source);
            Ok(Registration::Created)
        } else {
            info!("User {} already registered", caller.subject_id());
            Ok(Registration::AlreadyRegistered)
        }
    }

    pub async fn get_profile(&self, caller: &Caller, owner_id: &str) -> Result<ProfileView, ApiError> {
        caller.authorize(owner_id, Access::Read)?;

        if let Some(document) = self.store.find(owner_id).await? {
            return Ok(ProfileView::from(&document));
        }

        // Seed from claims only when they belong to the owner
        let now = Utc::now();
        let document = if caller.owns(owner_id) {
            UserDocument::from_identity(&caller.identity, now)
        } else {
            UserDocument::new(owner_id, now)
        };
        if self.store.insert_if_absent(&document).await? {
            info!("Created document for user {} on first profile read", owner_id);
        }

        match self.store.find(owner_id).await? {
            Some(document) => Ok(ProfileView::from(&document)),
            None => Ok(ProfileView::placeholder(owner_id, &caller.identity)),
        }
    }

    pub async fn update_profile(
        &self,
        caller: &Caller,
        owner_id: &str,
        update: ProfileUpdate,
    ) -> Result<(), ApiError> {
        caller.authorize(owner_id, Access::Write)?;
        update.validate().map_err(ApiError::bad_request)?;

        if self
            .store
            .insert_if_absent(&UserDocument::from_identity(&caller.identity, Utc::now()))
            .await?
        {
            info!("Created document for user {} before profile update", owner_id);
        }

        let modified = self.store.set_fields(owner_id, update.to_storage_fields()?).await?;
        if modified == 0 {
            error!("Profile update left document of user {} unmodified", owner_id);
            return Err(ApiError::internal_server_error("Failed to update profile"));
        }

        info!("Updated profile for user {}", owner_id);
        Ok(())
    }
}
