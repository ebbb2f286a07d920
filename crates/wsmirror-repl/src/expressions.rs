//! Emoji and sticker replication.
//!
//! Emoji are replicated in source-creation-time order, derived from the
//! timestamp embedded in their identifiers, since the platform does not
//! expose emoji ordering as an editable field. Asset downloads are
//! best-effort; an emoji or sticker whose asset cannot be fetched is
//! skipped and excluded from the counts.

use tracing::{debug, info};
use wsmirror_gateway::assets::AssetFetcher;
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{EmojiSpec, EntityId, StickerFormat, StickerSpec};

use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;

/// Replicates custom emoji and stickers. Nothing downstream references
/// them, so no identity mapping is kept.
pub struct ExpressionReplicator<'a> {
    gateway: &'a dyn WorkspaceGateway,
    fetcher: &'a dyn AssetFetcher,
    pacing: &'a Pacing,
}

impl<'a> ExpressionReplicator<'a> {
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

    /// Replicate all emoji, then all PNG stickers.
    pub async fn run(&self, source_ws: EntityId, target_ws: EntityId) -> CloneReport {
        let mut report = CloneReport::new();
        self.replicate_emojis(source_ws, target_ws, &mut report).await;
        self.replicate_stickers(source_ws, target_ws, &mut report).await;
        report
    }

    async fn replicate_emojis(
        &self,
        source_ws: EntityId,
        target_ws: EntityId,
        report: &mut CloneReport,
    ) {
        let Some(mut emojis) = guarded_call("list emojis", || self.gateway.emojis(source_ws)).await
        else {
            return;
        };
        emojis.sort_by_key(|e| e.id.created_at_ms());

        for emoji in &emojis {
            match self.fetcher.fetch(&emoji.url).await {
                Ok(image) => {
                    let label = format!("emoji {}", emoji.name);
                    let spec = EmojiSpec {
                        name: emoji.name.clone(),
                        image,
                    };
                    match guarded_call(&label, || {
                        self.gateway.create_emoji(target_ws, spec.clone())
                    })
                    .await
                    {
                        Some(_) => {
                            report.emojis_created += 1;
                            info!(emoji = %emoji.name, "copied emoji");
                        }
                        None => report.record_failure(label),
                    }
                }
                Err(e) => {
                    debug!(emoji = %emoji.name, cause = %e, "asset download failed, skipping");
                }
            }
            self.pacing.pause(self.pacing.emoji).await;
        }
    }

    async fn replicate_stickers(
        &self,
        source_ws: EntityId,
        target_ws: EntityId,
        report: &mut CloneReport,
    ) {
        let Some(stickers) =
            guarded_call("list stickers", || self.gateway.stickers(source_ws)).await
        else {
            return;
        };

        for sticker in &stickers {
            if sticker.format != StickerFormat::Png {
                // The creation endpoint only accepts static PNG; other
                // formats are not re-encoded.
                debug!(sticker = %sticker.name, format = ?sticker.format, "unsupported format, skipping");
                continue;
            }

            match self.fetcher.fetch(&sticker.url).await {
                Ok(image) => {
                    let label = format!("sticker {}", sticker.name);
                    let spec = StickerSpec {
                        name: sticker.name.clone(),
                        description: sticker.description.clone().unwrap_or_default(),
                        tag: sticker.tag.clone(),
                        image,
                    };
                    match guarded_call(&label, || {
                        self.gateway.create_sticker(target_ws, spec.clone())
                    })
                    .await
                    {
                        Some(_) => {
                            report.stickers_created += 1;
                            info!(sticker = %sticker.name, "copied sticker");
                        }
                        None => report.record_failure(label),
                    }
                }
                Err(e) => {
                    debug!(sticker = %sticker.name, cause = %e, "asset download failed, skipping");
                }
            }
            self.pacing.pause(self.pacing.sticker).await;
        }
    }
}
