//! Persisted user profile (onboarding and logout).

use std::sync::Arc;

use nutrigpt_client::UserProfile;
use tracing::{info, warn};

use crate::cache::PlanCache;
use crate::error::{AppError, AppResult};
use crate::store::{Store, keys};

pub struct ProfileRepository {
    store: Arc<dyn Store>,
    plans: Arc<PlanCache>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn Store>, plans: Arc<PlanCache>) -> Self {
        Self { store, plans }
    }

    /// The stored profile. Unreadable data counts as "not onboarded".
    pub fn load(&self) -> AppResult<Option<UserProfile>> {
        let Some(raw) = self.store.get(keys::PROFILE)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable stored profile");
                Ok(None)
            }
        }
    }

    /// Replace the profile. Any cached plan was built for the old profile and is dropped.
    pub fn save(&self, profile: &UserProfile) -> AppResult<()> {
        profile.validate().map_err(AppError::Validation)?;
        let raw = serde_json::to_string(profile)?;
        self.store.set(keys::PROFILE, &raw)?;
        self.plans.invalidate()?;
        info!(goal = ?profile.goal, "profile saved");
        Ok(())
    }

    /// Forget the profile and the cached plan. Progress history is kept.
    pub fn logout(&self) -> AppResult<()> {
        self.store.remove(keys::PROFILE)?;
        self.plans.invalidate()?;
        info!("profile cleared");
        Ok(())
    }
}
