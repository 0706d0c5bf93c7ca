//! Dealing a distribution to participants.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::catalog::RoleId;
use crate::planner::Distribution;
use crate::roster::ParticipantId;

/// Caller-owned role pins, participant -> role.
pub type LockSet = BTreeMap<ParticipantId, RoleId>;

/// Result of one deal. Replaces any earlier assignment wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assignment {
    roles: BTreeMap<ParticipantId, RoleId>,
    /// Unlocked participants left over when the pool ran dry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unassigned: Vec<ParticipantId>,
}

impl Assignment {
    pub fn get(&self, participant: &ParticipantId) -> Option<&RoleId> {
        self.roles.get(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &RoleId)> {
        self.roles.iter()
    }

    pub fn unassigned(&self) -> &[ParticipantId] {
        &self.unassigned
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// How many participants received each role.
    pub fn role_counts(&self) -> HashMap<&RoleId, usize> {
        let mut counts = HashMap::new();
        for role in self.roles.values() {
            *counts.entry(role).or_insert(0) += 1;
        }
        counts
    }
}

/// Deals `distribution` using the thread-local RNG.
pub fn assign(
    participants: &[ParticipantId],
    locks: &LockSet,
    distribution: &Distribution,
) -> Assignment {
    assign_with_rng(participants, locks, distribution, &mut rand::thread_rng())
}

/// Deals `distribution` to `participants`, honoring `locks`.
///
/// Locked participants get their pinned role and one matching pool entry is
/// removed; a pin whose role has no entry left is honored anyway. Pins for
/// participants not in `participants` are ignored. The rest of the pool is
/// shuffled (Fisher-Yates) and handed out in participant order.
pub fn assign_with_rng<R: Rng + ?Sized>(
    participants: &[ParticipantId],
    locks: &LockSet,
    distribution: &Distribution,
    rng: &mut R,
) -> Assignment {
    let mut pool = distribution.to_pool();
    let mut roles = BTreeMap::new();

    for (participant, role) in locks {
        if !participants.contains(participant) {
            debug!(%participant, %role, "ignoring lock for absent participant");
            continue;
        }
        match pool.iter().position(|entry| entry == role) {
            Some(position) => {
                pool.remove(position);
            }
            None => debug!(%participant, %role, "locked role has no slot left, honoring it anyway"),
        }
        roles.insert(participant.clone(), role.clone());
    }

    pool.shuffle(rng);

    let mut dealt = pool.into_iter();
    let mut unassigned = Vec::new();
    for participant in participants.iter().filter(|id| !locks.contains_key(*id)) {
        match dealt.next() {
            Some(role) => {
                roles.insert(participant.clone(), role);
            }
            None => unassigned.push(participant.clone()),
        }
    }

    Assignment { roles, unassigned }
}
