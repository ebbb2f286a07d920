// File: crates/wsmirror-repl/src/engine.rs

//! The replication sequencer.
//!
//! Orders the replicators so that every cross-reference is created after
//! the entities it points at: roles before channels (overlay subjects),
//! channels before the profile and webhooks (channel references). Entity
//! failures stay inside their replicator; the only fatal path is the
//! precondition check on the two workspaces, which runs before any
//! mutation.

use tracing::info;
use wsmirror_gateway::assets::AssetFetcher;
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::EntityId;

use crate::channels::ChannelReplicator;
use crate::error::{CloneError, Result};
use crate::expressions::ExpressionReplicator;
use crate::idmap::IdentityMap;
use crate::options::CloneOptions;
use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;
use crate::roles::RoleReplicator;
use crate::settings::ProfileReplicator;
use crate::webhooks::WebhookReplicator;

/// The states a replication run moves through, in order. States whose
/// option flag is off are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePhase {
    /// No run started yet.
    Idle,
    /// Deleting existing target entities.
    Clearing,
    /// Creating roles.
    Roles,
    /// Creating categories and channels.
    Channels,
    /// Creating emoji and stickers.
    Expressions,
    /// Applying the profile update.
    Profile,
    /// Creating webhooks.
    Webhooks,
    /// Run finished; the report is final.
    Done,
}

/// Drives one replication run from a source workspace to a target.
pub struct CloneEngine<'a> {
    gateway: &'a dyn WorkspaceGateway,
    fetcher: &'a dyn AssetFetcher,
    options: CloneOptions,
    pacing: Pacing,
    phase: ClonePhase,
}

impl<'a> CloneEngine<'a> {
    /// Create an engine with default pacing.
    pub fn new(
        gateway: &'a dyn WorkspaceGateway,
        fetcher: &'a dyn AssetFetcher,
        options: CloneOptions,
    ) -> Self {
        Self {
            gateway,
            fetcher,
            options,
            pacing: Pacing::default(),
            phase: ClonePhase::Idle,
        }
    }

    /// Replace the post-call pacing delays.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// The phase the engine is currently in.
    pub fn phase(&self) -> ClonePhase {
        self.phase
    }

    /// Run the full replication sequence.
    ///
    /// Fails only when one of the two workspaces cannot be read; every
    /// later failure is entity-scoped and ends up in the report instead.
    pub async fn run(&mut self, source_id: EntityId, target_id: EntityId) -> Result<CloneReport> {
        let source = self
            .gateway
            .profile(source_id)
            .await
            .map_err(|cause| CloneError::SourceUnavailable {
                workspace_id: source_id,
                cause,
            })?;
        let target = self
            .gateway
            .profile(target_id)
            .await
            .map_err(|cause| CloneError::TargetUnavailable {
                workspace_id: target_id,
                cause,
            })?;

        info!(source = %source.name, target = %target.name, "starting replication run");

        let mut map = IdentityMap::new();
        let mut report = CloneReport::new();

        if self.options.clear_target {
            self.phase = ClonePhase::Clearing;
            self.clear_target(target.id).await;
        }

        if self.options.copy_roles {
            self.phase = ClonePhase::Roles;
            info!("replicating roles");
            report.merge(
                RoleReplicator::new(self.gateway, &self.pacing)
                    .run(source.id, target.id, &mut map)
                    .await,
            );
        }

        if self.options.copy_channels {
            self.phase = ClonePhase::Channels;
            info!("replicating categories and channels");
            report.merge(
                ChannelReplicator::new(self.gateway, &self.pacing)
                    .run(source.id, &target, &mut map)
                    .await,
            );
        }

        if self.options.copy_expressions {
            self.phase = ClonePhase::Expressions;
            info!("replicating emoji and stickers");
            report.merge(
                ExpressionReplicator::new(self.gateway, self.fetcher, &self.pacing)
                    .run(source.id, target.id)
                    .await,
            );
        }

        if self.options.copy_profile {
            self.phase = ClonePhase::Profile;
            info!("replicating workspace profile");
            report.merge(
                ProfileReplicator::new(self.gateway, self.fetcher, &self.pacing)
                    .run(&source, target.id, &map)
                    .await,
            );
        }

        if self.options.copy_webhooks {
            self.phase = ClonePhase::Webhooks;
            info!("replicating webhooks");
            report.merge(
                WebhookReplicator::new(self.gateway, self.fetcher, &self.pacing)
                    .run(source.id, target.id, &map)
                    .await,
            );
        }

        self.phase = ClonePhase::Done;
        info!(summary = %report.summary(), "replication run finished");
        Ok(report)
    }

    /// Delete every channel, category, non-default role, emoji, and
    /// sticker on the target. Runs to completion before any creation
    /// starts; deletions never interleave with creations.
    async fn clear_target(&self, target_ws: EntityId) {
        info!("clearing target workspace");

        if let Some(channels) =
            guarded_call("list channels", || self.gateway.channels(target_ws)).await
        {
            for channel in channels {
                let label = format!("delete channel {}", channel.name);
                guarded_call(&label, || self.gateway.delete_channel(target_ws, channel.id)).await;
                self.pacing.pause(self.pacing.channel).await;
            }
        }

        if let Some(categories) =
            guarded_call("list categories", || self.gateway.categories(target_ws)).await
        {
            for category in categories {
                let label = format!("delete category {}", category.name);
                guarded_call(&label, || {
                    self.gateway.delete_channel(target_ws, category.id)
                })
                .await;
                self.pacing.pause(self.pacing.channel).await;
            }
        }

        if let Some(roles) = guarded_call("list roles", || self.gateway.roles(target_ws)).await {
            for role in roles.into_iter().filter(|r| !r.is_default) {
                let label = format!("delete role {}", role.name);
                guarded_call(&label, || self.gateway.delete_role(target_ws, role.id)).await;
                self.pacing.pause(self.pacing.role).await;
            }
        }

        if let Some(emojis) = guarded_call("list emojis", || self.gateway.emojis(target_ws)).await {
            for emoji in emojis {
                let label = format!("delete emoji {}", emoji.name);
                guarded_call(&label, || self.gateway.delete_emoji(target_ws, emoji.id)).await;
                self.pacing.pause(self.pacing.emoji).await;
            }
        }

        if let Some(stickers) =
            guarded_call("list stickers", || self.gateway.stickers(target_ws)).await
        {
            for sticker in stickers {
                let label = format!("delete sticker {}", sticker.name);
                guarded_call(&label, || self.gateway.delete_sticker(target_ws, sticker.id)).await;
                self.pacing.pause(self.pacing.sticker).await;
            }
        }

        info!("target workspace cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, FakeFetcher, FakeGateway};
    use wsmirror_gateway::model::{OverwriteSubject, PermissionOverwrite, StickerFormat};

    const SRC: EntityId = EntityId(1);
    const TGT: EntityId = EntityId(2);
    const VIEW: u64 = 1 << 10;

    fn setup() -> (FakeGateway, FakeFetcher) {
        let gateway = FakeGateway::new();
        gateway.add_workspace(testkit::profile(1, "source"));
        gateway.add_workspace(testkit::profile(2, "target"));
        (gateway, FakeFetcher::new())
    }

    fn options(clear: bool) -> CloneOptions {
        CloneOptions {
            clear_target: clear,
            ..CloneOptions::default()
        }
    }

    #[tokio::test]
    async fn test_precondition_failure_is_fatal_and_mutation_free() {
        let gateway = FakeGateway::new();
        gateway.add_workspace(testkit::profile(2, "target"));
        let fetcher = FakeFetcher::new();

        let mut engine =
            CloneEngine::new(&gateway, &fetcher, options(true)).with_pacing(Pacing::zero());
        let result = engine.run(SRC, TGT).await;

        assert!(matches!(
            result,
            Err(CloneError::SourceUnavailable { workspace_id, .. }) if workspace_id == SRC
        ));
        assert!(gateway.mutation_log().is_empty());
    }

    #[tokio::test]
    async fn test_full_run_end_to_end() {
        // Source: roles A above B, category C holding text channel T whose
        // overlay grants B "view" only.
        let (gateway, fetcher) = setup();
        gateway.seed_role(SRC, testkit::default_role(10));
        gateway.seed_role(SRC, testkit::role(11, "B", 1));
        gateway.seed_role(SRC, testkit::role(12, "A", 2));
        gateway.seed_category(SRC, testkit::category(20, "C", 0));
        let mut t = testkit::text_channel(30, "T", 0, Some(20));
        t.overwrites = vec![PermissionOverwrite {
            subject: OverwriteSubject::Role(EntityId(11)),
            allow: VIEW,
            deny: 0,
        }];
        gateway.seed_channel(SRC, t);

        let mut engine =
            CloneEngine::new(&gateway, &fetcher, options(false)).with_pacing(Pacing::zero());
        let report = engine.run(SRC, TGT).await.unwrap();

        assert_eq!(report.roles_created, 2);
        assert_eq!(report.categories_created, 1);
        assert_eq!(report.channels_created, 1);
        assert_eq!(engine.phase(), ClonePhase::Done);

        // Hierarchy restored to the source's relative order.
        let repositions = gateway.repositions();
        assert_eq!(repositions.len(), 1);
        let positions = &repositions[0].1;
        assert_eq!(positions.len(), 2);
        assert!(positions[0].1 < positions[1].1);

        // T sits under the mapped C and grants mapped-B view, nothing else.
        let channels = gateway.channels_of(TGT);
        assert_eq!(channels.len(), 1);
        let t = &channels[0];
        assert_eq!(
            t.parent_id,
            Some(gateway.categories_of(TGT)[0].id)
        );
        assert_eq!(t.overwrites.len(), 1);
        let mapped_b = engine_map_role_b(&gateway);
        assert_eq!(t.overwrites[0].subject, OverwriteSubject::Role(mapped_b));
        assert_eq!(t.overwrites[0].allow, VIEW);
        assert_eq!(t.overwrites[0].deny, 0);
    }

    // The target id of source role B, recovered from the fake's state.
    fn engine_map_role_b(gateway: &FakeGateway) -> EntityId {
        gateway
            .roles_of(TGT)
            .iter()
            .find(|r| r.name == "B")
            .map(|r| r.id)
            .unwrap()
    }

    #[tokio::test]
    async fn test_system_channel_points_at_mapped_channel() {
        let (gateway, fetcher) = setup();
        let mut source = testkit::profile(1, "source");
        source.system_channel_id = Some(EntityId(30));
        gateway.add_workspace(source);
        gateway.seed_channel(SRC, testkit::text_channel(30, "announcements", 0, None));

        let mut engine =
            CloneEngine::new(&gateway, &fetcher, options(false)).with_pacing(Pacing::zero());
        engine.run(SRC, TGT).await.unwrap();

        let created = gateway.channels_of(TGT);
        assert_eq!(created.len(), 1);
        let (_, update) = &gateway.profile_updates()[0];
        assert_eq!(update.system_channel_id, Some(created[0].id));
    }

    #[tokio::test]
    async fn test_failed_emoji_download_excluded_but_run_completes() {
        let (gateway, mut fetcher) = setup();
        gateway.seed_emoji(SRC, testkit::emoji(100 << 22, "ok", "cdn/ok.png"));
        gateway.seed_emoji(SRC, testkit::emoji(200 << 22, "gone", "cdn/gone.png"));
        fetcher.insert("cdn/ok.png", testkit::png_bytes());

        let mut engine =
            CloneEngine::new(&gateway, &fetcher, options(false)).with_pacing(Pacing::zero());
        let report = engine.run(SRC, TGT).await.unwrap();

        assert_eq!(engine.phase(), ClonePhase::Done);
        assert_eq!(report.emojis_created, 1);
        let names: Vec<_> = gateway.emojis_of(TGT).iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_clearing_removes_target_entities_before_creation() {
        let (gateway, fetcher) = setup();
        gateway.seed_role(TGT, testkit::default_role(90));
        gateway.seed_role(TGT, testkit::role(91, "stale-role", 1));
        gateway.seed_channel(TGT, testkit::text_channel(92, "stale-channel", 0, None));
        gateway.seed_category(TGT, testkit::category(93, "stale-cat", 0));
        gateway.seed_emoji(TGT, testkit::emoji(94, "stale-emoji", "cdn/x.png"));
        gateway.seed_sticker(
            TGT,
            testkit::sticker(95, "stale-sticker", StickerFormat::Png, "cdn/y.png"),
        );
        gateway.seed_role(SRC, testkit::role(11, "fresh", 1));

        let mut engine =
            CloneEngine::new(&gateway, &fetcher, options(true)).with_pacing(Pacing::zero());
        engine.run(SRC, TGT).await.unwrap();

        // Stale entities are gone; the default role survives.
        let roles = gateway.roles_of(TGT);
        assert!(roles.iter().any(|r| r.is_default));
        assert!(!roles.iter().any(|r| r.name == "stale-role"));
        assert!(roles.iter().any(|r| r.name == "fresh"));
        assert!(gateway.channels_of(TGT).is_empty());
        assert!(gateway.categories_of(TGT).is_empty());
        assert!(gateway.emojis_of(TGT).is_empty());
        assert!(gateway.stickers_of(TGT).is_empty());

        // Every delete precedes the first create.
        let log = gateway.mutation_log();
        let first_create = log.iter().position(|op| op.starts_with("create")).unwrap();
        let last_delete = log.iter().rposition(|op| op.starts_with("delete")).unwrap();
        assert!(last_delete < first_create);
    }

    #[tokio::test]
    async fn test_skipped_roles_phase_drops_overlay_references() {
        let (gateway, fetcher) = setup();
        gateway.seed_role(SRC, testkit::role(11, "B", 1));
        let mut channel = testkit::text_channel(30, "T", 0, None);
        channel.overwrites = vec![PermissionOverwrite {
            subject: OverwriteSubject::Role(EntityId(11)),
            allow: VIEW,
            deny: 0,
        }];
        gateway.seed_channel(SRC, channel);

        let opts = CloneOptions {
            clear_target: false,
            copy_roles: false,
            ..CloneOptions::default()
        };
        let mut engine = CloneEngine::new(&gateway, &fetcher, opts).with_pacing(Pacing::zero());
        let report = engine.run(SRC, TGT).await.unwrap();

        // The role map stayed empty, so the overlay entry degrades to a drop.
        assert_eq!(report.roles_created, 0);
        assert_eq!(report.channels_created, 1);
        assert!(gateway.channels_of(TGT)[0].overwrites.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_phases_do_not_mutate() {
        let (gateway, fetcher) = setup();
        gateway.seed_role(SRC, testkit::role(11, "role", 1));
        gateway.seed_channel(SRC, testkit::text_channel(30, "chan", 0, None));

        let opts = CloneOptions {
            clear_target: false,
            copy_roles: false,
            copy_channels: false,
            copy_expressions: false,
            copy_webhooks: false,
            copy_profile: false,
        };
        let mut engine = CloneEngine::new(&gateway, &fetcher, opts).with_pacing(Pacing::zero());
        let report = engine.run(SRC, TGT).await.unwrap();

        assert_eq!(report.total_created(), 0);
        assert!(gateway.mutation_log().is_empty());
        assert_eq!(engine.phase(), ClonePhase::Done);
    }
}
