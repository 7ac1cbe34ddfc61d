use crate::error::ApiError;
use crate::types::Access;

use super::Identity;

/// Authenticated caller, injected into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    /// Whether development identities may read data they do not own
    pub dev_read_bypass: bool,
}

impl Caller {
    pub fn new(identity: Identity, dev_read_bypass: bool) -> Self {
        Self {
            identity,
            dev_read_bypass,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.identity.subject_id
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.identity.subject_id == owner_id
    }

    /// Writes require the caller to be the owner. Reads additionally admit development
    /// identities when the read bypass is enabled.
    pub fn authorize(&self, owner_id: &str, access: Access) -> Result<(), ApiError> {
        if self.owns(owner_id) {
            return Ok(());
        }

        if access == Access::Read && self.dev_read_bypass && self.identity.is_development() {
            tracing::debug!(
                "Development identity {} reading data of {}",
                self.identity.subject_id,
                owner_id
            );
            return Ok(());
        }

        tracing::warn!(
            "Caller {} denied {:?} access to user {}",
            self.identity.subject_id,
            access,
            owner_id
        );
        Err(match access {
            Access::Read => ApiError::forbidden("Not authorized to access this user's data"),
            Access::Write => ApiError::forbidden("Not authorized to update this user's data"),
        })
    }
}
