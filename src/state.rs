use std::sync::Arc;

use crate::auth::{AuthPolicy, FirebaseVerifier, TokenVerifier};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::models::EntryKind;
use crate::database::UserStore;
use crate::services::{DashboardService, EntryService, ProfileService};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    pub policy: AuthPolicy,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, verifier: Option<Arc<dyn TokenVerifier>>, policy: AuthPolicy) -> Self {
        Self {
            store,
            verifier,
            policy,
            security: SecurityConfig {
                enable_cors: false,
                cors_origins: Vec::new(),
            },
        }
    }

    /// Wire the verifier and policy from configuration around an opened store
    pub fn from_config(config: &AppConfig, store: Arc<dyn UserStore>) -> Self {
        let verifier = FirebaseVerifier::from_config(&config.auth).map(|v| Arc::new(v) as Arc<dyn TokenVerifier>);
        if verifier.is_none() {
            tracing::warn!("No FIREBASE_PROJECT_ID configured; only development credentials are accepted");
        }

        Self {
            store,
            verifier,
            policy: config.auth_policy(),
            security: config.security.clone(),
        }
    }

    pub fn entries<K: EntryKind>(&self) -> EntryService<K> {
        EntryService::new(self.store.clone())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone())
    }

    pub fn dashboards(&self) -> DashboardService {
        DashboardService::new(self.store.clone())
    }
}
