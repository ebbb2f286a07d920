//! Workspace profile replication.
//!
//! One batched update carries the display name, moderation settings,
//! locale, visual assets, and the special-purpose channel fields. A
//! single rejected field would fail the whole batch, so assets are
//! validated before inclusion and special channels are included only when
//! their source channel resolved through the channel map.

use bytes::Bytes;
use tracing::{info, warn};
use wsmirror_gateway::assets::{AssetFetcher, ImageFormat};
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{EntityId, EntityKind, ProfileUpdate, WorkspaceProfile};

use crate::idmap::IdentityMap;
use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;

/// Replicates the source workspace's profile onto the target.
pub struct ProfileReplicator<'a> {
    gateway: &'a dyn WorkspaceGateway,
    fetcher: &'a dyn AssetFetcher,
    pacing: &'a Pacing,
}

impl<'a> ProfileReplicator<'a> {
    /// Create a replicator over the given gateway and asset fetcher.
    pub fn new(
        gateway: &'a dyn WorkspaceGateway,
        fetcher: &'a dyn AssetFetcher,
        pacing: &'a Pacing,
    ) -> Self {
        Self {
            gateway,
            fetcher,
            pacing,
        }
    }

    /// Build and submit the batched profile update.
    pub async fn run(
        &self,
        source: &WorkspaceProfile,
        target_ws: EntityId,
        map: &IdentityMap,
    ) -> CloneReport {
        let mut report = CloneReport::new();

        let update = ProfileUpdate {
            name: Some(source.name.clone()),
            description: source.description.clone(),
            verification_level: Some(source.verification_level),
            content_filter: Some(source.content_filter),
            afk_timeout_secs: Some(source.afk_timeout_secs),
            locale: Some(source.locale.clone()),
            default_notifications: Some(source.default_notifications),
            icon: self.profile_asset("icon", source.icon_url.as_deref()).await,
            splash: self
                .profile_asset("splash", source.splash_url.as_deref())
                .await,
            banner: self
                .profile_asset("banner", source.banner_url.as_deref())
                .await,
            afk_channel_id: resolve_channel(map, source.afk_channel_id),
            system_channel_id: resolve_channel(map, source.system_channel_id),
            rules_channel_id: resolve_channel(map, source.rules_channel_id),
            public_updates_channel_id: resolve_channel(map, source.public_updates_channel_id),
        };

        match guarded_call("workspace profile", || {
            self.gateway.update_profile(target_ws, update.clone())
        })
        .await
        {
            Some(()) => {
                report.profile_updated = true;
                info!(workspace = %source.name, "updated workspace profile");
            }
            None => report.record_failure("workspace profile"),
        }
        self.pacing.pause(self.pacing.profile).await;

        report
    }

    /// Download one visual asset and validate it against the formats the
    /// update endpoint accepts. Anything else is omitted from the batch.
    async fn profile_asset(&self, kind: &str, url: Option<&str>) -> Option<Bytes> {
        let url = url?;
        let data = match self.fetcher.fetch(url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(asset = kind, cause = %e, "asset download failed, omitting");
                return None;
            }
        };
        match ImageFormat::sniff(&data) {
            Some(format) if format.is_profile_asset() => Some(data),
            _ => {
                warn!(asset = kind, "unsupported asset type, omitting");
                None
            }
        }
    }
}

fn resolve_channel(map: &IdentityMap, source: Option<EntityId>) -> Option<EntityId> {
    source.and_then(|id| map.resolve(EntityKind::Channel, id))
}
