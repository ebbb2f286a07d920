//! Permission overlay rewriting.
//!
//! A source overlay references source role ids; the target needs the same
//! overlay expressed in target ids. Member subjects are excluded outright
//! since member identities are not portable between workspaces.

use crate::idmap::IdentityMap;
use wsmirror_gateway::model::{EntityKind, OverwriteSubject, PermissionOverwrite};

/// Rewrite a source overlay into a target-valid overlay.
///
/// The default-role sentinel passes through unchanged (the gateway binds
/// it to the target's own default role). Role subjects resolve through
/// the role map; unresolved ones are dropped. Allow/deny masks are copied
/// verbatim, so a permission the source never mentioned stays unmentioned.
pub fn rewrite_overwrites(
    source: &[PermissionOverwrite],
    map: &IdentityMap,
) -> Vec<PermissionOverwrite> {
    source
        .iter()
        .filter_map(|ow| {
            let subject = match ow.subject {
                OverwriteSubject::DefaultRole => OverwriteSubject::DefaultRole,
                OverwriteSubject::Role(source_id) => {
                    OverwriteSubject::Role(map.resolve(EntityKind::Role, source_id)?)
                }
                OverwriteSubject::Member(_) => return None,
            };
            Some(PermissionOverwrite {
                subject,
                allow: ow.allow,
                deny: ow.deny,
            })
        })
        .collect()
}
