//! Webhook replication.
//!
//! Only webhooks bound to text channels are portable. Each one is
//! recreated on the target channel its source channel mapped to; a
//! webhook whose channel was never mapped is skipped. Avatar download is
//! best-effort and degrades to "no avatar".

use std::collections::HashSet;
use tracing::{debug, info};
use wsmirror_gateway::assets::AssetFetcher;
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{ChannelKind, EntityId, EntityKind, WebhookSpec};

use crate::idmap::IdentityMap;
use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;

/// Replicates webhooks onto mapped target channels.
pub struct WebhookReplicator<'a> {
    gateway: &'a dyn WorkspaceGateway,
    fetcher: &'a dyn AssetFetcher,
    pacing: &'a Pacing,
}

impl<'a> WebhookReplicator<'a> {
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

    /// Replicate every text-channel webhook whose channel resolved
    /// through the channel map.
    pub async fn run(
        &self,
        source_ws: EntityId,
        target_ws: EntityId,
        map: &IdentityMap,
    ) -> CloneReport {
        let mut report = CloneReport::new();

        let Some(webhooks) =
            guarded_call("list webhooks", || self.gateway.webhooks(source_ws)).await
        else {
            return report;
        };
        let Some(source_channels) =
            guarded_call("list channels", || self.gateway.channels(source_ws)).await
        else {
            return report;
        };

        let text_channels: HashSet<EntityId> = source_channels
            .iter()
            .filter(|c| c.kind == ChannelKind::Text)
            .map(|c| c.id)
            .collect();

        for webhook in &webhooks {
            if !text_channels.contains(&webhook.channel_id) {
                continue;
            }
            let Some(target_channel) = map.resolve(EntityKind::Channel, webhook.channel_id) else {
                debug!(webhook = %webhook.name, "channel not mapped, skipping");
                continue;
            };

            let avatar = match &webhook.avatar_url {
                Some(url) => match self.fetcher.fetch(url).await {
                    Ok(data) => Some(data),
                    Err(e) => {
                        debug!(webhook = %webhook.name, cause = %e, "avatar download failed");
                        None
                    }
                },
                None => None,
            };

            let label = format!("webhook {}", webhook.name);
            let spec = WebhookSpec {
                channel_id: target_channel,
                name: webhook.name.clone(),
                avatar,
            };
            match guarded_call(&label, || {
                self.gateway.create_webhook(target_ws, spec.clone())
            })
            .await
            {
                Some(_) => {
                    report.webhooks_created += 1;
                    info!(webhook = %webhook.name, "copied webhook");
                }
                None => report.record_failure(label),
            }
            self.pacing.pause(self.pacing.webhook).await;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, FakeFetcher, FakeGateway};
    use wsmirror_gateway::model::ChannelKind;

    const SRC: EntityId = EntityId(1);
    const TGT: EntityId = EntityId(2);

    fn setup() -> (FakeGateway, FakeFetcher) {
        let gateway = FakeGateway::new();
        gateway.add_workspace(testkit::profile(1, "source"));
        gateway.add_workspace(testkit::profile(2, "target"));
        (gateway, FakeFetcher::new())
    }

    async fn run(gateway: &FakeGateway, fetcher: &FakeFetcher, map: &IdentityMap) -> CloneReport {
        let pacing = Pacing::zero();
        WebhookReplicator::new(gateway, fetcher, &pacing)
            .run(SRC, TGT, map)
            .await
    }

    #[tokio::test]
    async fn test_webhook_recreated_on_mapped_channel() {
        let (gateway, fetcher) = setup();
        gateway.seed_channel(SRC, testkit::text_channel(30, "general", 0, None));
        gateway.seed_webhook(SRC, testkit::webhook(60, 30, "ci-bot", None));

        let mut map = IdentityMap::new();
        map.record(EntityKind::Channel, EntityId(30), EntityId(300));

        let report = run(&gateway, &fetcher, &map).await;

        assert_eq!(report.webhooks_created, 1);
        let created = gateway.webhooks_of(TGT);
        assert_eq!(created[0].name, "ci-bot");
        assert_eq!(created[0].channel_id, EntityId(300));
    }

    #[tokio::test]
    async fn test_unmapped_channel_skipped() {
        let (gateway, fetcher) = setup();
        gateway.seed_channel(SRC, testkit::text_channel(30, "general", 0, None));
        gateway.seed_webhook(SRC, testkit::webhook(60, 30, "ci-bot", None));

        let report = run(&gateway, &fetcher, &IdentityMap::new()).await;

        assert_eq!(report.webhooks_created, 0);
        assert!(gateway.webhooks_of(TGT).is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_non_text_channel_webhook_skipped() {
        let (gateway, fetcher) = setup();
        let mut channel = testkit::text_channel(31, "lounge", 0, None);
        channel.kind = ChannelKind::Voice;
        gateway.seed_channel(SRC, channel);
        gateway.seed_webhook(SRC, testkit::webhook(60, 31, "oddball", None));

        let mut map = IdentityMap::new();
        map.record(EntityKind::Channel, EntityId(31), EntityId(310));

        let report = run(&gateway, &fetcher, &map).await;

        assert_eq!(report.webhooks_created, 0);
    }

    #[tokio::test]
    async fn test_failed_avatar_download_degrades_to_no_avatar() {
        let (gateway, fetcher) = setup();
        gateway.seed_channel(SRC, testkit::text_channel(30, "general", 0, None));
        gateway.seed_webhook(
            SRC,
            testkit::webhook(60, 30, "ci-bot", Some("cdn/missing.png")),
        );

        let mut map = IdentityMap::new();
        map.record(EntityKind::Channel, EntityId(30), EntityId(300));

        let report = run(&gateway, &fetcher, &map).await;

        // Created anyway, just without the avatar.
        assert_eq!(report.webhooks_created, 1);
        assert_eq!(gateway.webhooks_of(TGT)[0].avatar_url, None);
    }

    #[tokio::test]
    async fn test_avatar_carried_when_download_succeeds() {
        let (gateway, mut fetcher) = setup();
        gateway.seed_channel(SRC, testkit::text_channel(30, "general", 0, None));
        gateway.seed_webhook(
            SRC,
            testkit::webhook(60, 30, "ci-bot", Some("cdn/avatar.png")),
        );
        fetcher.insert("cdn/avatar.png", testkit::png_bytes());

        let mut map = IdentityMap::new();
        map.record(EntityKind::Channel, EntityId(30), EntityId(300));

        run(&gateway, &fetcher, &map).await;

        assert!(gateway.webhooks_of(TGT)[0].avatar_url.is_some());
    }
}
