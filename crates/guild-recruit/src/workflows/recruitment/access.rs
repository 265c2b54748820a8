use std::sync::Arc;

use super::domain::{Actor, GuildId};
use crate::storage::{RecruitmentStore, StoreError};

/// Resolves whether an actor may perform a privileged action for a guild.
///
/// Administrators pass unconditionally. Everyone else must hold at least one
/// of the guild's configured admin roles; a guild with no settings or an empty
/// role set is administrator-only. A store failure propagates as an error and
/// callers treat it as a denial; privilege checks never fail open.
pub struct AccessPolicy<S> {
    store: Arc<S>,
}

impl<S> Clone for AccessPolicy<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RecruitmentStore> AccessPolicy<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn is_authorized(&self, guild: &GuildId, actor: &Actor) -> Result<bool, StoreError> {
        if actor.is_administrator {
            return Ok(true);
        }

        let settings = self.store.guild_settings(guild).await?;
        Ok(match settings {
            Some(settings) if !settings.admin_roles.is_empty() => actor
                .roles
                .iter()
                .any(|role| settings.admin_roles.contains(role)),
            _ => false,
        })
    }
}
