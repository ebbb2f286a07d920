//! Per-run feature switches.

use serde::{Deserialize, Serialize};

/// Which parts of the source workspace a run replicates.
///
/// Each flag gates one replicator. The flags are independent, but a
/// skipped upstream replicator leaves its identity map empty, so
/// downstream reference rewriting degrades to dropping unresolvable
/// references (it never fails).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Delete every channel, non-default role, emoji, and sticker on the
    /// target before replicating. Destructive and not reversible.
    pub clear_target: bool,
    /// Replicate roles and restore their hierarchy order.
    pub copy_roles: bool,
    /// Replicate categories and channels, including permission overlays.
    pub copy_channels: bool,
    /// Replicate custom emoji and stickers.
    pub copy_expressions: bool,
    /// Replicate webhooks onto mapped text channels.
    pub copy_webhooks: bool,
    /// Replicate the workspace profile (name, settings, visual assets,
    /// special channels).
    pub copy_profile: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            clear_target: true,
            copy_roles: true,
            copy_channels: true,
            copy_expressions: true,
            copy_webhooks: true,
            copy_profile: true,
        }
    }
}
