//! Entity model for the remote platform.
//!
//! These types mirror what the management API exposes for a community
//! workspace: roles, the category/channel tree, permission overwrites,
//! emoji, stickers, webhooks, and the workspace profile. Snapshot types
//! (`Role`, `Channel`, ...) are read from a workspace; the `*Spec` types
//! are creation payloads submitted to a workspace.

use serde::{Deserialize, Serialize};

/// Milliseconds between the Unix epoch and the platform's id epoch.
const ID_EPOCH_MS: u64 = 1_420_070_400_000;

/// An opaque identifier issued by the remote platform.
///
/// The upper 42 bits embed the entity's creation time, which is the only
/// creation-order signal the platform exposes for emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Creation time encoded in the identifier, as Unix milliseconds.
    pub fn created_at_ms(&self) -> u64 {
        (self.0 >> 22) + ID_EPOCH_MS
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of entity whose identities are translated between workspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A role.
    Role,
    /// A category (channel-tree parent node).
    Category,
    /// A text, voice, or stage channel.
    Channel,
}

/// A role as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Permission bitset granted workspace-wide.
    pub permissions: u64,
    /// Display color (0 = no color).
    pub color: u32,
    /// Whether members are listed separately under this role.
    pub hoist: bool,
    /// Whether the role can be mentioned by anyone.
    pub mentionable: bool,
    /// Owned by an external integration; not creatable via the API.
    pub managed: bool,
    /// Hierarchy position; higher means more privileged.
    pub position: i64,
    /// Whether this is the workspace's built-in default role.
    pub is_default: bool,
}

/// Payload for creating a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Display name.
    pub name: String,
    /// Permission bitset.
    pub permissions: u64,
    /// Display color.
    pub color: u32,
    /// Whether members are listed separately.
    pub hoist: bool,
    /// Whether the role is mentionable.
    pub mentionable: bool,
}

/// The subject of a permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum OverwriteSubject {
    /// The workspace's built-in default role.
    DefaultRole,
    /// A specific role.
    Role(EntityId),
    /// An individual member. Member identities are not portable between
    /// workspaces.
    Member(EntityId),
}

/// One entry in a channel or category permission overlay.
///
/// A permission bit set in `allow` is explicitly granted, in `deny`
/// explicitly revoked; a bit set in neither is not mentioned at all. The
/// three states are distinct on the platform and must stay distinct here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Who the overwrite applies to.
    pub subject: OverwriteSubject,
    /// Explicitly granted permission bits.
    pub allow: u64,
    /// Explicitly revoked permission bits.
    pub deny: u64,
}

/// A category as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Position within the channel tree.
    pub position: i64,
    /// Permission overlay.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Payload for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Display name.
    pub name: String,
    /// Position within the channel tree.
    pub position: i64,
    /// Permission overlay.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// The channel kinds this system replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Text channel.
    Text,
    /// Voice channel.
    Voice,
    /// Stage channel.
    Stage,
}

/// A channel as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Channel kind.
    pub kind: ChannelKind,
    /// Position among siblings.
    pub position: i64,
    /// Parent category, if nested.
    pub parent_id: Option<EntityId>,
    /// Topic text (text channels).
    pub topic: Option<String>,
    /// Slow-mode delay in seconds (text channels).
    pub slowmode_secs: u32,
    /// Age-restricted flag (text channels).
    pub nsfw: bool,
    /// Audio bitrate in bits per second (voice and stage channels).
    pub bitrate: u32,
    /// Maximum simultaneous members, 0 = unlimited (voice channels).
    pub user_limit: u32,
    /// Permission overlay.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Payload for creating a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Display name.
    pub name: String,
    /// Channel kind.
    pub kind: ChannelKind,
    /// Position among siblings.
    pub position: i64,
    /// Parent category on the target, if any.
    pub parent_id: Option<EntityId>,
    /// Topic text (text channels).
    pub topic: Option<String>,
    /// Slow-mode delay in seconds (text channels).
    pub slowmode_secs: u32,
    /// Age-restricted flag (text channels).
    pub nsfw: bool,
    /// Audio bitrate in bits per second (voice and stage channels).
    pub bitrate: u32,
    /// Maximum simultaneous members (voice channels).
    pub user_limit: u32,
    /// Permission overlay.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// A custom emoji as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Emoji name.
    pub name: String,
    /// Whether the emoji is animated.
    pub animated: bool,
    /// URL of the image asset.
    pub url: String,
}

/// Payload for creating a custom emoji.
#[derive(Debug, Clone)]
pub struct EmojiSpec {
    /// Emoji name.
    pub name: String,
    /// Raw image bytes.
    pub image: bytes::Bytes,
}

/// Sticker asset formats known to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerFormat {
    /// Static PNG; the only format the creation endpoint accepts.
    Png,
    /// Animated PNG.
    Apng,
    /// Lottie vector animation.
    Lottie,
    /// Animated GIF.
    Gif,
}

/// A sticker as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sticker {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Sticker name.
    pub name: String,
    /// Description text.
    pub description: Option<String>,
    /// The emoji tag associated with the sticker.
    pub tag: String,
    /// Asset format.
    pub format: StickerFormat,
    /// URL of the asset.
    pub url: String,
}

/// Payload for creating a sticker.
#[derive(Debug, Clone)]
pub struct StickerSpec {
    /// Sticker name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// The emoji tag associated with the sticker.
    pub tag: String,
    /// Raw PNG bytes.
    pub image: bytes::Bytes,
}

/// A webhook as read from a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Channel the webhook posts into.
    pub channel_id: EntityId,
    /// Webhook name.
    pub name: String,
    /// URL of the avatar asset, if one is set.
    pub avatar_url: Option<String>,
}

/// Payload for creating a webhook.
#[derive(Debug, Clone)]
pub struct WebhookSpec {
    /// Target channel the webhook posts into.
    pub channel_id: EntityId,
    /// Webhook name.
    pub name: String,
    /// Raw avatar image bytes, if any.
    pub avatar: Option<bytes::Bytes>,
}

/// Workspace identity and settings as read from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceProfile {
    /// Platform-issued identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: Option<String>,
    /// Member verification level.
    pub verification_level: u8,
    /// Explicit content filter level.
    pub content_filter: u8,
    /// AFK timeout in seconds.
    pub afk_timeout_secs: u32,
    /// Preferred locale tag.
    pub locale: String,
    /// Default notification level.
    pub default_notifications: u8,
    /// Entitlement tier; bounds voice bitrate.
    pub premium_tier: u8,
    /// URL of the icon asset.
    pub icon_url: Option<String>,
    /// URL of the invite splash asset.
    pub splash_url: Option<String>,
    /// URL of the banner asset.
    pub banner_url: Option<String>,
    /// Channel members are moved to when AFK.
    pub afk_channel_id: Option<EntityId>,
    /// Channel that receives system messages.
    pub system_channel_id: Option<EntityId>,
    /// Channel holding the workspace rules.
    pub rules_channel_id: Option<EntityId>,
    /// Channel for public platform updates.
    pub public_updates_channel_id: Option<EntityId>,
}

impl WorkspaceProfile {
    /// Maximum voice bitrate this workspace's tier entitles it to, in
    /// bits per second.
    pub fn bitrate_ceiling(&self) -> u32 {
        match self.premium_tier {
            0 => 96_000,
            1 => 128_000,
            2 => 256_000,
            _ => 384_000,
        }
    }
}

/// Batched workspace settings update. Fields left as `None` are omitted
/// from the request entirely.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New verification level.
    pub verification_level: Option<u8>,
    /// New content filter level.
    pub content_filter: Option<u8>,
    /// New AFK timeout in seconds.
    pub afk_timeout_secs: Option<u32>,
    /// New locale tag.
    pub locale: Option<String>,
    /// New default notification level.
    pub default_notifications: Option<u8>,
    /// New icon image bytes.
    pub icon: Option<bytes::Bytes>,
    /// New invite splash image bytes.
    pub splash: Option<bytes::Bytes>,
    /// New banner image bytes.
    pub banner: Option<bytes::Bytes>,
    /// New AFK channel.
    pub afk_channel_id: Option<EntityId>,
    /// New system message channel.
    pub system_channel_id: Option<EntityId>,
    /// New rules channel.
    pub rules_channel_id: Option<EntityId>,
    /// New public updates channel.
    pub public_updates_channel_id: Option<EntityId>,
}
