//! Role replication.
//!
//! Roles are created highest-hierarchy-position first so that an
//! interrupted run never leaves a higher-privilege role parked below a
//! lower one for longer than necessary. Once every creatable role exists,
//! one bulk reposition call restores the source's exact relative order.

use tracing::{debug, info};
use wsmirror_gateway::gateway::WorkspaceGateway;
use wsmirror_gateway::model::{EntityId, EntityKind, RoleSpec};

use crate::idmap::IdentityMap;
use crate::pacing::Pacing;
use crate::report::CloneReport;
use crate::retry::guarded_call;

/// Replicates the source workspace's roles onto the target.
pub struct RoleReplicator<'a> {
    gateway: &'a dyn WorkspaceGateway,
    pacing: &'a Pacing,
}

impl<'a> RoleReplicator<'a> {
    /// Create a replicator over the given gateway.
    pub fn new(gateway: &'a dyn WorkspaceGateway, pacing: &'a Pacing) -> Self {
        Self { gateway, pacing }
    }

    /// Replicate every creatable role and restore the source hierarchy
    /// order. Records source→target mappings in `map` as roles are
    /// created.
    pub async fn run(
        &self,
        source_ws: EntityId,
        target_ws: EntityId,
        map: &mut IdentityMap,
    ) -> CloneReport {
        let mut report = CloneReport::new();

        let Some(source_roles) = guarded_call("list roles", || self.gateway.roles(source_ws)).await
        else {
            return report;
        };

        let mut creatable: Vec<_> = source_roles.iter().filter(|r| !r.is_default).collect();
        creatable.sort_by(|a, b| b.position.cmp(&a.position));

        for role in creatable {
            if role.managed {
                // Integration-owned roles cannot be recreated via the API.
                debug!(role = %role.name, "skipping managed role");
                continue;
            }

            let label = format!("role {}", role.name);
            let spec = RoleSpec {
                name: role.name.clone(),
                permissions: role.permissions,
                color: role.color,
                hoist: role.hoist,
                mentionable: role.mentionable,
            };

            match guarded_call(&label, || self.gateway.create_role(target_ws, spec.clone())).await {
                Some(created) => {
                    map.record(EntityKind::Role, role.id, created.id);
                    report.roles_created += 1;
                    info!(role = %role.name, "created role");
                }
                None => report.record_failure(label),
            }
            self.pacing.pause(self.pacing.role).await;
        }

        // One bulk reposition restoring the source's relative order. If it
        // fails, permissions still function; only display order is off.
        let mut positions: Vec<(EntityId, i64)> = source_roles
            .iter()
            .filter_map(|r| {
                map.resolve(EntityKind::Role, r.id)
                    .map(|target| (target, r.position))
            })
            .collect();
        positions.sort_by_key(|&(_, position)| position);

        if !positions.is_empty() {
            guarded_call("role positions", || {
                self.gateway.reposition_roles(target_ws, positions.clone())
            })
            .await;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, FakeGateway};
    use std::time::Duration;
    use wsmirror_gateway::model::Role;

    const SRC: EntityId = EntityId(1);
    const TGT: EntityId = EntityId(2);

    fn setup() -> FakeGateway {
        let gateway = FakeGateway::new();
        gateway.add_workspace(testkit::profile(1, "source"));
        gateway.add_workspace(testkit::profile(2, "target"));
        gateway
    }

    async fn run(gateway: &FakeGateway, map: &mut IdentityMap) -> CloneReport {
        let pacing = Pacing::zero();
        RoleReplicator::new(gateway, &pacing).run(SRC, TGT, map).await
    }

    #[tokio::test]
    async fn test_creates_highest_position_first() {
        let gateway = setup();
        gateway.seed_role(SRC, testkit::default_role(10));
        gateway.seed_role(SRC, testkit::role(11, "member", 1));
        gateway.seed_role(SRC, testkit::role(12, "admin", 2));

        let mut map = IdentityMap::new();
        let report = run(&gateway, &mut map).await;

        assert_eq!(report.roles_created, 2);
        let log = gateway.mutation_log();
        assert_eq!(log[0], "create_role admin");
        assert_eq!(log[1], "create_role member");
    }

    #[tokio::test]
    async fn test_managed_and_default_roles_skipped() {
        let gateway = setup();
        gateway.seed_role(SRC, testkit::default_role(10));
        gateway.seed_role(
            SRC,
            Role {
                managed: true,
                ..testkit::role(11, "some-bot", 3)
            },
        );
        gateway.seed_role(SRC, testkit::role(12, "mods", 1));

        let mut map = IdentityMap::new();
        let report = run(&gateway, &mut map).await;

        assert_eq!(report.roles_created, 1);
        assert_eq!(gateway.roles_of(TGT).len(), 1);
        assert_eq!(gateway.roles_of(TGT)[0].name, "mods");
        assert_eq!(map.resolve(EntityKind::Role, EntityId(11)), None);
    }

    #[tokio::test]
    async fn test_reposition_matches_source_order() {
        let gateway = setup();
        gateway.seed_role(SRC, testkit::role(11, "b", 1));
        gateway.seed_role(SRC, testkit::role(12, "a", 2));

        let mut map = IdentityMap::new();
        run(&gateway, &mut map).await;

        let repositions = gateway.repositions();
        assert_eq!(repositions.len(), 1);
        let (ws, positions) = &repositions[0];
        assert_eq!(*ws, TGT);
        let b_target = map.resolve(EntityKind::Role, EntityId(11)).unwrap();
        let a_target = map.resolve(EntityKind::Role, EntityId(12)).unwrap();
        assert_eq!(positions.as_slice(), &[(b_target, 1), (a_target, 2)]);
    }

    #[tokio::test]
    async fn test_failed_role_recorded_and_run_continues() {
        let gateway = setup();
        gateway.seed_role(SRC, testkit::role(11, "good", 1));
        gateway.seed_role(SRC, testkit::role(12, "bad", 2));
        gateway.rate_limit_once("create_role", Duration::from_millis(10));
        gateway.fail_always("reposition_roles", "boom");

        let mut map = IdentityMap::new();
        let report = run(&gateway, &mut map).await;

        // The rate-limited first create retries once and succeeds; the
        // failed reposition is logged but not counted as an entity failure.
        assert_eq!(report.roles_created, 2);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_no_reposition_when_nothing_created() {
        let gateway = setup();
        gateway.seed_role(SRC, testkit::default_role(10));

        let mut map = IdentityMap::new();
        let report = run(&gateway, &mut map).await;

        assert_eq!(report.roles_created, 0);
        assert!(gateway.repositions().is_empty());
    }
}
