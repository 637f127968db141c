use crate::review::domain::{EmployeeRelation, RelationRole};

/// Every relation a role change touches, ready to be committed in one batch.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CascadePlan {
    pub(crate) relation: EmployeeRelation,
    pub(crate) peers: Vec<EmployeeRelation>,
}

impl CascadePlan {
    pub(crate) fn into_batch(self) -> Vec<EmployeeRelation> {
        let mut batch = Vec::with_capacity(self.peers.len() + 1);
        batch.push(self.relation);
        batch.extend(self.peers);
        batch
    }
}

/// Plans the move of `current` to `next` without touching storage.
///
/// A departing project leader is removed from every other leader set in the period; peers
/// left without leaders fall back to free person. The cascade stops there.
pub(crate) fn plan_role_change(
    current: &EmployeeRelation,
    own_name: &str,
    next: RelationRole,
    period_relations: &[EmployeeRelation],
) -> CascadePlan {
    let mut relation = current.clone();
    let previous = relation.role;
    relation.role = next;

    let mut peers = Vec::new();
    if previous == RelationRole::ProjectLeader && next != RelationRole::ProjectLeader {
        for peer in period_relations {
            if peer.employee_id == current.employee_id || !peer.leaders.contains(own_name) {
                continue;
            }
            let mut peer = peer.clone();
            peer.leaders.remove(own_name);
            if peer.leaders.is_empty() {
                peer.role = RelationRole::FreePerson;
            }
            peers.push(peer);
        }

        if next == RelationRole::ProjectMember {
            relation.leaders.remove(own_name);
        }
    }

    if next == RelationRole::FreePerson {
        relation.leaders.clear();
    }
    relation.normalize(own_name);

    CascadePlan { relation, peers }
}
