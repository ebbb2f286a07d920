//! In-memory gateway and asset-fetcher fakes for engine tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use wsmirror_gateway::error::{GatewayError, Result};
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{
    Category, CategorySpec, Channel, ChannelKind, ChannelSpec, Emoji, EmojiSpec, EntityId,
    ProfileUpdate, Role, RoleSpec, Sticker, StickerFormat, StickerSpec, Webhook, WebhookSpec,
    WorkspaceProfile,
};

#[derive(Default)]
struct FakeState {
    profiles: HashMap<EntityId, WorkspaceProfile>,
    roles: HashMap<EntityId, Vec<Role>>,
    categories: HashMap<EntityId, Vec<Category>>,
    channels: HashMap<EntityId, Vec<Channel>>,
    emojis: HashMap<EntityId, Vec<Emoji>>,
    stickers: HashMap<EntityId, Vec<Sticker>>,
    webhooks: HashMap<EntityId, Vec<Webhook>>,
    repositions: Vec<(EntityId, Vec<(EntityId, i64)>)>,
    profile_updates: Vec<(EntityId, ProfileUpdate)>,
    rate_limit_once: HashMap<&'static str, Duration>,
    fail_always: HashMap<&'static str, &'static str>,
    mutation_log: Vec<String>,
    next_id: u64,
}

/// A `WorkspaceGateway` over plain in-memory tables, with programmable
/// rate limits and failures keyed by operation name.
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_id: 1_000,
                ..FakeState::default()
            }),
        }
    }

    pub fn add_workspace(&self, profile: WorkspaceProfile) {
        let mut state = self.state.lock().unwrap();
        let id = profile.id;
        state.profiles.insert(id, profile);
        state.roles.entry(id).or_default();
        state.categories.entry(id).or_default();
        state.channels.entry(id).or_default();
        state.emojis.entry(id).or_default();
        state.stickers.entry(id).or_default();
        state.webhooks.entry(id).or_default();
    }

    pub fn seed_role(&self, ws: EntityId, role: Role) {
        self.state.lock().unwrap().roles.entry(ws).or_default().push(role);
    }

    pub fn seed_category(&self, ws: EntityId, category: Category) {
        self.state.lock().unwrap().categories.entry(ws).or_default().push(category);
    }

    pub fn seed_channel(&self, ws: EntityId, channel: Channel) {
        self.state.lock().unwrap().channels.entry(ws).or_default().push(channel);
    }

    pub fn seed_emoji(&self, ws: EntityId, emoji: Emoji) {
        self.state.lock().unwrap().emojis.entry(ws).or_default().push(emoji);
    }

    pub fn seed_sticker(&self, ws: EntityId, sticker: Sticker) {
        self.state.lock().unwrap().stickers.entry(ws).or_default().push(sticker);
    }

    pub fn seed_webhook(&self, ws: EntityId, webhook: Webhook) {
        self.state.lock().unwrap().webhooks.entry(ws).or_default().push(webhook);
    }

    /// Make the next call to `op` report a rate limit with the given
    /// retry-after, then behave normally.
    pub fn rate_limit_once(&self, op: &'static str, retry_after: Duration) {
        self.state.lock().unwrap().rate_limit_once.insert(op, retry_after);
    }

    /// Make every call to `op` fail validation with `msg`.
    pub fn fail_always(&self, op: &'static str, msg: &'static str) {
        self.state.lock().unwrap().fail_always.insert(op, msg);
    }

    pub fn roles_of(&self, ws: EntityId) -> Vec<Role> {
        self.state.lock().unwrap().roles.get(&ws).cloned().unwrap_or_default()
    }

    pub fn categories_of(&self, ws: EntityId) -> Vec<Category> {
        self.state.lock().unwrap().categories.get(&ws).cloned().unwrap_or_default()
    }

    pub fn channels_of(&self, ws: EntityId) -> Vec<Channel> {
        self.state.lock().unwrap().channels.get(&ws).cloned().unwrap_or_default()
    }

    pub fn emojis_of(&self, ws: EntityId) -> Vec<Emoji> {
        self.state.lock().unwrap().emojis.get(&ws).cloned().unwrap_or_default()
    }

    pub fn stickers_of(&self, ws: EntityId) -> Vec<Sticker> {
        self.state.lock().unwrap().stickers.get(&ws).cloned().unwrap_or_default()
    }

    pub fn webhooks_of(&self, ws: EntityId) -> Vec<Webhook> {
        self.state.lock().unwrap().webhooks.get(&ws).cloned().unwrap_or_default()
    }

    pub fn repositions(&self) -> Vec<(EntityId, Vec<(EntityId, i64)>)> {
        self.state.lock().unwrap().repositions.clone()
    }

    pub fn profile_updates(&self) -> Vec<(EntityId, ProfileUpdate)> {
        self.state.lock().unwrap().profile_updates.clone()
    }

    /// Mutation names in the order they were accepted.
    pub fn mutation_log(&self) -> Vec<String> {
        self.state.lock().unwrap().mutation_log.clone()
    }

    fn gate(state: &mut FakeState, op: &'static str) -> Result<()> {
        if let Some(retry_after) = state.rate_limit_once.remove(op) {
            return Err(GatewayError::RateLimited { retry_after });
        }
        if let Some(msg) = state.fail_always.get(op) {
            return Err(GatewayError::Validation {
                msg: (*msg).to_string(),
            });
        }
        Ok(())
    }

    fn alloc_id(state: &mut FakeState) -> EntityId {
        state.next_id += 1;
        EntityId(state.next_id << 22)
    }
}

#[async_trait]
impl WorkspaceGateway for FakeGateway {
    async fn profile(&self, workspace: EntityId) -> Result<WorkspaceProfile> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "profile")?;
        state
            .profiles
            .get(&workspace)
            .cloned()
            .ok_or(GatewayError::WorkspaceNotFound {
                workspace_id: workspace,
            })
    }

    async fn roles(&self, workspace: EntityId) -> Result<Vec<Role>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "roles")?;
        Ok(state.roles.get(&workspace).cloned().unwrap_or_default())
    }

    async fn categories(&self, workspace: EntityId) -> Result<Vec<Category>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "categories")?;
        Ok(state.categories.get(&workspace).cloned().unwrap_or_default())
    }

    async fn channels(&self, workspace: EntityId) -> Result<Vec<Channel>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "channels")?;
        Ok(state.channels.get(&workspace).cloned().unwrap_or_default())
    }

    async fn emojis(&self, workspace: EntityId) -> Result<Vec<Emoji>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "emojis")?;
        Ok(state.emojis.get(&workspace).cloned().unwrap_or_default())
    }

    async fn stickers(&self, workspace: EntityId) -> Result<Vec<Sticker>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "stickers")?;
        Ok(state.stickers.get(&workspace).cloned().unwrap_or_default())
    }

    async fn webhooks(&self, workspace: EntityId) -> Result<Vec<Webhook>> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "webhooks")?;
        Ok(state.webhooks.get(&workspace).cloned().unwrap_or_default())
    }

    async fn create_role(&self, workspace: EntityId, spec: RoleSpec) -> Result<Role> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_role")?;
        let id = Self::alloc_id(&mut state);
        let roles = state.roles.entry(workspace).or_default();
        let role = Role {
            id,
            name: spec.name,
            permissions: spec.permissions,
            color: spec.color,
            hoist: spec.hoist,
            mentionable: spec.mentionable,
            managed: false,
            position: roles.len() as i64 + 1,
            is_default: false,
        };
        roles.push(role.clone());
        state.mutation_log.push(format!("create_role {}", role.name));
        Ok(role)
    }

    async fn reposition_roles(
        &self,
        workspace: EntityId,
        positions: Vec<(EntityId, i64)>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "reposition_roles")?;
        state.repositions.push((workspace, positions));
        state.mutation_log.push("reposition_roles".to_string());
        Ok(())
    }

    async fn delete_role(&self, workspace: EntityId, role: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "delete_role")?;
        if let Some(roles) = state.roles.get_mut(&workspace) {
            roles.retain(|r| r.id != role);
        }
        state.mutation_log.push(format!("delete_role {}", role));
        Ok(())
    }

    async fn create_category(&self, workspace: EntityId, spec: CategorySpec) -> Result<Category> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_category")?;
        let id = Self::alloc_id(&mut state);
        let category = Category {
            id,
            name: spec.name,
            position: spec.position,
            overwrites: spec.overwrites,
        };
        state.categories.entry(workspace).or_default().push(category.clone());
        state
            .mutation_log
            .push(format!("create_category {}", category.name));
        Ok(category)
    }

    async fn create_channel(&self, workspace: EntityId, spec: ChannelSpec) -> Result<Channel> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_channel")?;
        let id = Self::alloc_id(&mut state);
        let channel = Channel {
            id,
            name: spec.name,
            kind: spec.kind,
            position: spec.position,
            parent_id: spec.parent_id,
            topic: spec.topic,
            slowmode_secs: spec.slowmode_secs,
            nsfw: spec.nsfw,
            bitrate: spec.bitrate,
            user_limit: spec.user_limit,
            overwrites: spec.overwrites,
        };
        state.channels.entry(workspace).or_default().push(channel.clone());
        state
            .mutation_log
            .push(format!("create_channel {}", channel.name));
        Ok(channel)
    }

    async fn delete_channel(&self, workspace: EntityId, channel: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "delete_channel")?;
        if let Some(channels) = state.channels.get_mut(&workspace) {
            channels.retain(|c| c.id != channel);
        }
        if let Some(categories) = state.categories.get_mut(&workspace) {
            categories.retain(|c| c.id != channel);
        }
        state.mutation_log.push(format!("delete_channel {}", channel));
        Ok(())
    }

    async fn create_emoji(&self, workspace: EntityId, spec: EmojiSpec) -> Result<Emoji> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_emoji")?;
        let id = Self::alloc_id(&mut state);
        let emoji = Emoji {
            id,
            name: spec.name,
            animated: false,
            url: String::new(),
        };
        state.emojis.entry(workspace).or_default().push(emoji.clone());
        state.mutation_log.push(format!("create_emoji {}", emoji.name));
        Ok(emoji)
    }

    async fn delete_emoji(&self, workspace: EntityId, emoji: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "delete_emoji")?;
        if let Some(emojis) = state.emojis.get_mut(&workspace) {
            emojis.retain(|e| e.id != emoji);
        }
        state.mutation_log.push(format!("delete_emoji {}", emoji));
        Ok(())
    }

    async fn create_sticker(&self, workspace: EntityId, spec: StickerSpec) -> Result<Sticker> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_sticker")?;
        let id = Self::alloc_id(&mut state);
        let sticker = Sticker {
            id,
            name: spec.name,
            description: Some(spec.description),
            tag: spec.tag,
            format: StickerFormat::Png,
            url: String::new(),
        };
        state.stickers.entry(workspace).or_default().push(sticker.clone());
        state
            .mutation_log
            .push(format!("create_sticker {}", sticker.name));
        Ok(sticker)
    }

    async fn delete_sticker(&self, workspace: EntityId, sticker: EntityId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "delete_sticker")?;
        if let Some(stickers) = state.stickers.get_mut(&workspace) {
            stickers.retain(|s| s.id != sticker);
        }
        state.mutation_log.push(format!("delete_sticker {}", sticker));
        Ok(())
    }

    async fn create_webhook(&self, workspace: EntityId, spec: WebhookSpec) -> Result<Webhook> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "create_webhook")?;
        let id = Self::alloc_id(&mut state);
        let webhook = Webhook {
            id,
            channel_id: spec.channel_id,
            name: spec.name,
            avatar_url: spec.avatar.map(|_| "stored".to_string()),
        };
        state.webhooks.entry(workspace).or_default().push(webhook.clone());
        state
            .mutation_log
            .push(format!("create_webhook {}", webhook.name));
        Ok(webhook)
    }

    async fn update_profile(&self, workspace: EntityId, update: ProfileUpdate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::gate(&mut state, "update_profile")?;
        state.profile_updates.push((workspace, update));
        state.mutation_log.push("update_profile".to_string());
        Ok(())
    }
}

/// An `AssetFetcher` over a URL→bytes table; unknown URLs report 404.
pub struct FakeFetcher {
    assets: HashMap<String, Bytes>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, url: &str, data: Bytes) {
        self.assets.insert(url.to_string(), data);
    }
}

#[async_trait]
impl wsmirror_gateway::assets::AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.assets
            .get(url)
            .cloned()
            .ok_or(GatewayError::Http {
                status: 404,
                msg: "Not Found".to_string(),
            })
    }
}

/// Valid PNG magic followed by filler, enough to pass format sniffing.
pub fn png_bytes() -> Bytes {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&[0u8; 24]);
    Bytes::from(data)
}

pub fn profile(id: u64, name: &str) -> WorkspaceProfile {
    WorkspaceProfile {
        id: EntityId(id),
        name: name.to_string(),
        description: None,
        verification_level: 1,
        content_filter: 2,
        afk_timeout_secs: 300,
        locale: "en-US".to_string(),
        default_notifications: 1,
        premium_tier: 0,
        icon_url: None,
        splash_url: None,
        banner_url: None,
        afk_channel_id: None,
        system_channel_id: None,
        rules_channel_id: None,
        public_updates_channel_id: None,
    }
}

pub fn role(id: u64, name: &str, position: i64) -> Role {
    Role {
        id: EntityId(id),
        name: name.to_string(),
        permissions: 0,
        color: 0,
        hoist: false,
        mentionable: false,
        managed: false,
        position,
        is_default: false,
    }
}

pub fn default_role(id: u64) -> Role {
    Role {
        is_default: true,
        position: 0,
        ..role(id, "@everyone", 0)
    }
}

pub fn category(id: u64, name: &str, position: i64) -> Category {
    Category {
        id: EntityId(id),
        name: name.to_string(),
        position,
        overwrites: Vec::new(),
    }
}

pub fn text_channel(id: u64, name: &str, position: i64, parent: Option<u64>) -> Channel {
    Channel {
        id: EntityId(id),
        name: name.to_string(),
        kind: ChannelKind::Text,
        position,
        parent_id: parent.map(EntityId),
        topic: None,
        slowmode_secs: 0,
        nsfw: false,
        bitrate: 0,
        user_limit: 0,
        overwrites: Vec::new(),
    }
}

pub fn voice_channel(id: u64, name: &str, position: i64, bitrate: u32, user_limit: u32) -> Channel {
    Channel {
        kind: ChannelKind::Voice,
        bitrate,
        user_limit,
        ..text_channel(id, name, position, None)
    }
}

pub fn emoji(id: u64, name: &str, url: &str) -> Emoji {
    Emoji {
        id: EntityId(id),
        name: name.to_string(),
        animated: false,
        url: url.to_string(),
    }
}

pub fn sticker(id: u64, name: &str, format: StickerFormat, url: &str) -> Sticker {
    Sticker {
        id: EntityId(id),
        name: name.to_string(),
        description: Some(format!("{name} sticker")),
        tag: "smile".to_string(),
        format,
        url: url.to_string(),
    }
}

pub fn webhook(id: u64, channel: u64, name: &str, avatar_url: Option<&str>) -> Webhook {
    Webhook {
        id: EntityId(id),
        channel_id: EntityId(channel),
        name: name.to_string(),
        avatar_url: avatar_url.map(str::to_string),
    }
}
