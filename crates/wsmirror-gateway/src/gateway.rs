//! The management-API surface consumed by the replication engine.
//!
//! This trait is the narrow seam between the engine and the remote
//! platform. The concrete authenticated client lives outside this
//! workspace; tests implement the trait with in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Category, CategorySpec, Channel, ChannelSpec, Emoji, EmojiSpec, EntityId, ProfileUpdate, Role,
    RoleSpec, Sticker, StickerSpec, Webhook, WebhookSpec, WorkspaceProfile,
};

/// Authenticated access to workspaces on the remote platform.
///
/// Read operations snapshot a workspace's current structure; mutations
/// create or delete entities on a workspace. Every operation can fail with
/// [`GatewayError::RateLimited`](crate::error::GatewayError::RateLimited),
/// which carries the remote's retry-after duration and is reported
/// separately from all other failures.
#[async_trait]
pub trait WorkspaceGateway: Send + Sync {
    /// Read a workspace's profile and settings.
    async fn profile(&self, workspace: EntityId) -> Result<WorkspaceProfile>;

    /// List a workspace's roles, including the default role.
    async fn roles(&self, workspace: EntityId) -> Result<Vec<Role>>;

    /// List a workspace's categories.
    async fn categories(&self, workspace: EntityId) -> Result<Vec<Category>>;

    /// List a workspace's channels (not including categories).
    async fn channels(&self, workspace: EntityId) -> Result<Vec<Channel>>;

    /// List a workspace's custom emoji.
    async fn emojis(&self, workspace: EntityId) -> Result<Vec<Emoji>>;

    /// List a workspace's stickers.
    async fn stickers(&self, workspace: EntityId) -> Result<Vec<Sticker>>;

    /// List a workspace's webhooks.
    async fn webhooks(&self, workspace: EntityId) -> Result<Vec<Webhook>>;

    /// Create a role.
    async fn create_role(&self, workspace: EntityId, spec: RoleSpec) -> Result<Role>;

    /// Reposition roles in bulk. Each pair maps a role id to its new
    /// hierarchy position.
    async fn reposition_roles(
        &self,
        workspace: EntityId,
        positions: Vec<(EntityId, i64)>,
    ) -> Result<()>;

    /// Delete a role.
    async fn delete_role(&self, workspace: EntityId, role: EntityId) -> Result<()>;

    /// Create a category.
    async fn create_category(&self, workspace: EntityId, spec: CategorySpec) -> Result<Category>;

    /// Create a channel. An overwrite subject of
    /// [`OverwriteSubject::DefaultRole`](crate::model::OverwriteSubject::DefaultRole)
    /// is resolved to the workspace's own default role.
    async fn create_channel(&self, workspace: EntityId, spec: ChannelSpec) -> Result<Channel>;

    /// Delete a channel or category (they share one id space).
    async fn delete_channel(&self, workspace: EntityId, channel: EntityId) -> Result<()>;

    /// Create a custom emoji from raw image bytes.
    async fn create_emoji(&self, workspace: EntityId, spec: EmojiSpec) -> Result<Emoji>;

    /// Delete a custom emoji.
    async fn delete_emoji(&self, workspace: EntityId, emoji: EntityId) -> Result<()>;

    /// Create a sticker from raw PNG bytes.
    async fn create_sticker(&self, workspace: EntityId, spec: StickerSpec) -> Result<Sticker>;

    /// Delete a sticker.
    async fn delete_sticker(&self, workspace: EntityId, sticker: EntityId) -> Result<()>;

    /// Create a webhook on a channel.
    async fn create_webhook(&self, workspace: EntityId, spec: WebhookSpec) -> Result<Webhook>;

    /// Apply a batched settings update to a workspace.
    async fn update_profile(&self, workspace: EntityId, update: ProfileUpdate) -> Result<()>;
}
