//! Source-to-target identity translation.
//!
//! As replicators create entities on the target, they record which source
//! entity each one came from. Downstream replicators translate
//! cross-references (overlay subjects, parent categories, special
//! channels, webhook bindings) through these tables. A source id with no
//! recorded counterpart means the reference is dropped, never an error.

use std::collections::HashMap;
use wsmirror_gateway::model::{EntityId, EntityKind};

/// Per-kind source→target identity tables for one run.
///
/// Populated monotonically while the run progresses; there is no removal.
/// Role, category, and channel ids are kept in separate tables since they
/// are semantically distinct even though the platform's id space never
/// collides.
#[derive(Debug, Default)]
pub struct IdentityMap {
    roles: HashMap<EntityId, EntityId>,
    categories: HashMap<EntityId, EntityId>,
    channels: HashMap<EntityId, EntityId>,
}

impl IdentityMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `source` was replicated as `target`.
    pub fn record(&mut self, kind: EntityKind, source: EntityId, target: EntityId) {
        let table = match kind {
            EntityKind::Role => &mut self.roles,
            EntityKind::Category => &mut self.categories,
            EntityKind::Channel => &mut self.channels,
        };
        table.insert(source, target);
    }

    /// Look up the target counterpart of a source entity.
    pub fn resolve(&self, kind: EntityKind, source: EntityId) -> Option<EntityId> {
        let table = match kind {
            EntityKind::Role => &self.roles,
            EntityKind::Category => &self.categories,
            EntityKind::Channel => &self.channels,
        };
        table.get(&source).copied()
    }

    /// Number of recorded mappings of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Role => self.roles.len(),
            EntityKind::Category => self.categories.len(),
            EntityKind::Channel => self.channels.len(),
        }
    }
}
