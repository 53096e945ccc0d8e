//! The four select-list caches shared by the school screens.

use std::sync::Arc;

use derive_more::Display;
use payloads::{APIClient, responses::SelectOption};
use tokio::sync::watch;

use crate::{
    auth::AuthSession,
    entity_cache::{CacheSubscription, EntityCache},
    error::FetchError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntityKind {
    #[display("students")]
    Students,
    #[display("teachers")]
    Teachers,
    #[display("parents")]
    Parents,
    #[display("classes")]
    Classes,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Students,
        EntityKind::Teachers,
        EntityKind::Parents,
        EntityKind::Classes,
    ];

    async fn fetch_options(
        self,
        client: &APIClient,
    ) -> Result<Vec<SelectOption>, FetchError> {
        let options = match self {
            Self::Students => client.student_options().await?,
            Self::Teachers => client.teacher_options().await?,
            Self::Parents => client.parent_options().await?,
            Self::Classes => client.class_options().await?,
        };
        Ok(options)
    }
}

pub type OptionCache = EntityCache<SelectOption>;

impl EntityCache<SelectOption> {
    /// Cache backed by the options endpoint for `kind`.
    pub fn for_kind(
        kind: EntityKind,
        client: Arc<APIClient>,
        auth: watch::Receiver<AuthSession>,
    ) -> Self {
        EntityCache::new(kind, auth, move || {
            let client = client.clone();
            async move { kind.fetch_options(&client).await }
        })
    }
}

/// One cache per entity type, sharing a client and auth signal.
#[derive(Debug, Clone)]
pub struct EntityCaches {
    pub students: OptionCache,
    pub teachers: OptionCache,
    pub parents: OptionCache,
    pub classes: OptionCache,
}

impl EntityCaches {
    pub fn new(
        client: Arc<APIClient>,
        auth: watch::Receiver<AuthSession>,
    ) -> Self {
        let cache = |kind| {
            OptionCache::for_kind(kind, client.clone(), auth.clone())
        };
        Self {
            students: cache(EntityKind::Students),
            teachers: cache(EntityKind::Teachers),
            parents: cache(EntityKind::Parents),
            classes: cache(EntityKind::Classes),
        }
    }

    pub fn get(&self, kind: EntityKind) -> &OptionCache {
        match kind {
            EntityKind::Students => &self.students,
            EntityKind::Teachers => &self.teachers,
            EntityKind::Parents => &self.parents,
            EntityKind::Classes => &self.classes,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionCache> {
        EntityKind::ALL.into_iter().map(move |kind| self.get(kind))
    }

    /// Attach every cache to the auth signal. Dropping the returned
    /// subscriptions detaches them again.
    pub fn attach_all(&self) -> Vec<CacheSubscription> {
        self.iter().map(EntityCache::attach).collect()
    }

    /// Refresh all four caches concurrently.
    pub async fn refresh_all(&self) {
        futures::future::join_all(self.iter().map(EntityCache::refresh))
            .await;
    }
}
