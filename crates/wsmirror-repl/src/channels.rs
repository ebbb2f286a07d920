//! Category and channel replication.
//!
//! Two phases: categories first (ascending source position), then
//! channels (ascending source position) with their parent category
//! resolved through the identity map. A channel whose parent did not get
//! created lands at the top level rather than failing.

use tracing::info;
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{
    CategorySpec, Channel, ChannelKind, ChannelSpec, EntityId, EntityKind, WorkspaceProfile,
};

use crate::idmap::IdentityMap;
use crate::overwrites::rewrite_overwrites;
use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;

/// Clamp a requested voice bitrate to what the target's tier permits.
///
/// A bitrate already below the ceiling passes through unchanged; one
/// above it becomes exactly the ceiling.
pub fn clamp_bitrate(requested: u32, ceiling: u32) -> u32 {
    requested.min(ceiling)
}

/// Replicates the source workspace's category/channel tree onto the
/// target.
pub struct ChannelReplicator<'a> {
    gateway: &'a dyn WorkspaceGateway,
    pacing: &'a Pacing,
}

impl<'a> ChannelReplicator<'a> {
    /// Create a replicator over the given gateway.
    pub fn new(gateway: &'a dyn WorkspaceGateway, pacing: &'a Pacing) -> Self {
        Self { gateway, pacing }
    }

    /// Replicate categories, then channels. Overlays are rewritten
    /// through the role map already in `map`; category and channel
    /// mappings are recorded into `map` for the metadata and webhook
    /// phases.
    pub async fn run(
        &self,
        source_ws: EntityId,
        target: &WorkspaceProfile,
        map: &mut IdentityMap,
    ) -> CloneReport {
        let mut report = CloneReport::new();
        self.replicate_categories(source_ws, target.id, map, &mut report).await;
        self.replicate_channels(source_ws, target, map, &mut report).await;
        report
    }

    async fn replicate_categories(
        &self,
        source_ws: EntityId,
        target_ws: EntityId,
        map: &mut IdentityMap,
        report: &mut CloneReport,
    ) {
        let Some(mut categories) =
            guarded_call("list categories", || self.gateway.categories(source_ws)).await
        else {
            return;
        };
        categories.sort_by_key(|c| c.position);

        for category in &categories {
            let label = format!("category {}", category.name);
            let spec = CategorySpec {
                name: category.name.clone(),
                position: category.position,
                overwrites: rewrite_overwrites(&category.overwrites, map),
            };

            match guarded_call(&label, || {
                self.gateway.create_category(target_ws, spec.clone())
            })
            .await
            {
                Some(created) => {
                    map.record(EntityKind::Category, category.id, created.id);
                    report.categories_created += 1;
                    info!(category = %category.name, "created category");
                }
                None => report.record_failure(label),
            }
            self.pacing.pause(self.pacing.channel).await;
        }
    }

    async fn replicate_channels(
        &self,
        source_ws: EntityId,
        target: &WorkspaceProfile,
        map: &mut IdentityMap,
        report: &mut CloneReport,
    ) {
        let Some(mut channels) =
            guarded_call("list channels", || self.gateway.channels(source_ws)).await
        else {
            return;
        };
        channels.sort_by_key(|c| c.position);

        for channel in &channels {
            let label = format!("{} channel {}", kind_label(channel.kind), channel.name);
            let spec = self.channel_spec(channel, target, map);

            match guarded_call(&label, || {
                self.gateway.create_channel(target.id, spec.clone())
            })
            .await
            {
                Some(created) => {
                    map.record(EntityKind::Channel, channel.id, created.id);
                    report.channels_created += 1;
                    info!(channel = %channel.name, kind = kind_label(channel.kind), "created channel");
                }
                None => report.record_failure(label),
            }
            self.pacing.pause(self.pacing.channel).await;
        }
    }

    fn channel_spec(
        &self,
        channel: &Channel,
        target: &WorkspaceProfile,
        map: &IdentityMap,
    ) -> ChannelSpec {
        let parent_id = channel
            .parent_id
            .and_then(|parent| map.resolve(EntityKind::Category, parent));
        let overwrites = rewrite_overwrites(&channel.overwrites, map);
        let bitrate = clamp_bitrate(channel.bitrate, target.bitrate_ceiling());

        let base = ChannelSpec {
            name: channel.name.clone(),
            kind: channel.kind,
            position: channel.position,
            parent_id,
            topic: None,
            slowmode_secs: 0,
            nsfw: false,
            bitrate: 0,
            user_limit: 0,
            overwrites,
        };

        match channel.kind {
            ChannelKind::Text => ChannelSpec {
                topic: channel.topic.clone(),
                slowmode_secs: channel.slowmode_secs,
                nsfw: channel.nsfw,
                ..base
            },
            ChannelKind::Voice => ChannelSpec {
                bitrate,
                user_limit: channel.user_limit,
                ..base
            },
            ChannelKind::Stage => ChannelSpec { bitrate, ..base },
        }
    }
}

fn kind_label(kind: ChannelKind) -> &'static str {
    match kind {
        ChannelKind::Text => "text",
        ChannelKind::Voice => "voice",
        ChannelKind::Stage => "stage",
    }
}
