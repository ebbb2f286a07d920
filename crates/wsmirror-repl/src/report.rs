// File: crates/wsmirror-repl/src/report.rs

//! Run summary for admin consumption.

use serde::Serialize;

/// Counters and failure labels for one replication run.
///
/// Each replicator produces its own partial report; the sequencer merges
/// them and emits the result once at the end of the run, regardless of
/// how many individual entities failed along the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloneReport {
    /// Roles created on the target.
    pub roles_created: u64,
    /// Categories created on the target.
    pub categories_created: u64,
    /// Channels created on the target.
    pub channels_created: u64,
    /// Custom emoji created on the target.
    pub emojis_created: u64,
    /// Stickers created on the target.
    pub stickers_created: u64,
    /// Webhooks created on the target.
    pub webhooks_created: u64,
    /// Whether the batched profile update was applied.
    pub profile_updated: bool,
    /// Labels of entities that were abandoned after a failed call.
    pub failures: Vec<String>,
}

impl CloneReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold another replicator's partial report into this one.
    pub fn merge(&mut self, other: CloneReport) {
        self.roles_created += other.roles_created;
        self.categories_created += other.categories_created;
        self.channels_created += other.channels_created;
        self.emojis_created += other.emojis_created;
        self.stickers_created += other.stickers_created;
        self.webhooks_created += other.webhooks_created;
        self.profile_updated |= other.profile_updated;
        self.failures.extend(other.failures);
    }

    /// Record an entity that was abandoned after a failed call.
    pub fn record_failure(&mut self, label: impl Into<String>) {
        self.failures.push(label.into());
    }

    /// Total entities created across all kinds.
    pub fn total_created(&self) -> u64 {
        self.roles_created
            + self.categories_created
            + self.channels_created
            + self.emojis_created
            + self.stickers_created
            + self.webhooks_created
    }

    /// Format as a human-readable summary string.
    pub fn summary(&self) -> String {
        format!(
            "created {} roles, {} categories, {} channels, {} emojis, {} stickers, {} webhooks; profile {}; {} failures",
            self.roles_created,
            self.categories_created,
            self.channels_created,
            self.emojis_created,
            self.stickers_created,
            self.webhooks_created,
            if self.profile_updated { "updated" } else { "unchanged" },
            self.failures.len()
        )
    }

    /// Render the report as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
