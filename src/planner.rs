//! Distribution planning and the balance heuristic.
//!
//! [`compute_distribution`] decides how many of each role a game of a given
//! size gets; [`evaluate_balance`] judges a distribution without failing.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::catalog::{ids, Catalog, RoleId, Team, MANDATORY_ROLES};
use crate::error::PlanError;

pub const MIN_PARTICIPANTS: usize = 8;
pub const MAX_PARTICIPANTS: usize = 20;

const MIN_SPECIAL_RATIO: f64 = 0.2;
const MAX_SPECIAL_RATIO: f64 = 0.6;

struct OptionalTier {
    min_participants: usize,
    roles: &'static [&'static str],
}

/// Optional roles, offered one slot each, in this order.
const OPTIONAL_TIERS: [OptionalTier; 3] = [
    OptionalTier {
        min_participants: 10,
        roles: &[ids::ALIEN, ids::CUPID],
    },
    OptionalTier {
        min_participants: 12,
        roles: &[ids::BEAR, ids::ELDER, ids::RAVEN],
    },
    OptionalTier {
        min_participants: 14,
        roles: &[ids::BARBIE, ids::SHEPHERD],
    },
];

/// Round-robin order for slots left after the tiers and extra werewolves.
// NOTE: this cycle is kept for compatibility with existing deals; a remainder
// rule driven by the catalog scaling tables would be cleaner.
const FILLER_CYCLE: [&str; 5] = [ids::SEER, ids::WITCH, ids::HUNTER, ids::CUPID, ids::ALIEN];

/// Planned quantity of each role, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<(RoleId, usize)>,
}

impl Distribution {
    pub fn new() -> Self {
        Distribution::default()
    }

    /// Quantity of `role`, 0 when absent.
    pub fn get(&self, role: &str) -> usize {
        self.entries
            .iter()
            .find(|(id, _)| id == role)
            .map_or(0, |(_, quantity)| *quantity)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.entries.iter().any(|(id, _)| id == role)
    }

    /// Sets the quantity of `role`, keeping its position if already present.
    pub fn set(&mut self, role: &str, quantity: usize) {
        match self.entries.iter_mut().find(|(id, _)| id == role) {
            Some((_, current)) => *current = quantity,
            None => self.entries.push((RoleId::from(role), quantity)),
        }
    }

    pub fn add(&mut self, role: &str, extra: usize) {
        let current = self.get(role);
        self.set(role, current + extra);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoleId, usize)> {
        self.entries.iter().map(|(id, quantity)| (id, *quantity))
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &RoleId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, quantity)| quantity).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One pool entry per dealt role, in distribution order.
    pub fn to_pool(&self) -> Vec<RoleId> {
        self.entries
            .iter()
            .flat_map(|(id, quantity)| std::iter::repeat(id.clone()).take(*quantity))
            .collect()
    }
}

impl<'a> FromIterator<(&'a str, usize)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (&'a str, usize)>>(iter: I) -> Self {
        let mut distribution = Distribution::new();
        for (role, quantity) in iter {
            distribution.set(role, quantity);
        }
        distribution
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, quantity) in &self.entries {
            map.serialize_entry(id, quantity)?;
        }
        map.end()
    }
}

/// Werewolves before any extra ones are added: `max(2, n/4)` capped at
/// 2 up to 11 participants, 3 up to 15, 4 beyond.
pub fn baseline_werewolves(participant_count: usize) -> usize {
    let cap = match participant_count {
        0..=11 => 2,
        12..=15 => 3,
        _ => 4,
    };
    (participant_count / 4).max(2).min(cap)
}

pub fn compute_distribution(
    catalog: &Catalog,
    participant_count: usize,
) -> Result<Distribution, PlanError> {
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&participant_count) {
        return Err(PlanError::InvalidParticipantCount {
            count: participant_count,
            min: MIN_PARTICIPANTS,
            max: MAX_PARTICIPANTS,
        });
    }

    // WEREWOLF and the mandatory roles are planned unconditionally.
    catalog.check_integrity()?;

    let mut distribution = Distribution::new();
    let werewolves = baseline_werewolves(participant_count);
    distribution.set(ids::WEREWOLF, werewolves);

    for role in MANDATORY_ROLES {
        distribution.set(role, 1);
    }

    // werewolves <= 4 and participant_count >= 8, so this cannot underflow
    let mut remaining = participant_count - werewolves - MANDATORY_ROLES.len();

    for tier in &OPTIONAL_TIERS {
        if remaining == 0 || participant_count < tier.min_participants {
            continue;
        }
        for role in tier.roles {
            if remaining > 0 && catalog.contains(role) {
                distribution.set(role, 1);
                remaining -= 1;
            }
        }
    }

    if remaining > 0 {
        let extra_werewolves = (remaining / 4).min(participant_count / 6);
        if extra_werewolves > 0 {
            debug!(extra_werewolves, remaining, "adding extra werewolves");
            distribution.add(ids::WEREWOLF, extra_werewolves);
            remaining -= extra_werewolves;
        }

        // Entries missing from the catalog are stepped over; the mandatory
        // ones are always present, so the cycle is never empty.
        let fillers: Vec<&str> = FILLER_CYCLE
            .into_iter()
            .filter(|role| catalog.contains(role))
            .collect();
        for role in fillers.iter().cycle().take(remaining) {
            distribution.add(role, 1);
        }
    }

    let total = distribution.total();
    if total != participant_count {
        return Err(PlanError::DistributionMismatch {
            total,
            expected: participant_count,
        });
    }

    debug!(participant_count, roles = distribution.len(), "computed role distribution");
    Ok(distribution)
}

/// Figures behind a balance verdict.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BalanceMetrics {
    pub total: usize,
    pub werewolf_count: usize,
    /// Every non-werewolf participant, neutral roles included.
    pub villager_count: usize,
    pub neutral_count: usize,
    pub special_count: usize,
    /// `None` when there are no werewolves at all.
    pub villager_to_werewolf_ratio: Option<f64>,
    pub special_role_ratio: f64,
    pub min_villager_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BalanceVerdict {
    pub is_balanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BalanceMetrics>,
    /// Why no metrics could be computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl BalanceVerdict {
    fn degraded(issue: String) -> Self {
        BalanceVerdict {
            is_balanced: false,
            metrics: None,
            issue: Some(issue),
        }
    }
}

/// Judges a distribution. Never fails: an unknown role yields an
/// unbalanced verdict carrying the lookup error.
pub fn evaluate_balance(catalog: &Catalog, distribution: &Distribution) -> BalanceVerdict {
    let mut werewolf_count = 0;
    let mut villager_count = 0;
    let mut neutral_count = 0;
    let mut special_count = 0;

    for (id, quantity) in distribution.iter() {
        let role = match catalog.get_role(id.as_str()) {
            Ok(role) => role,
            Err(err) => return BalanceVerdict::degraded(err.to_string()),
        };

        match role.team {
            Team::Werewolves => werewolf_count += quantity,
            Team::Villagers => villager_count += quantity,
            Team::Neutral => {
                villager_count += quantity;
                neutral_count += quantity;
            }
        }
        if role.special {
            special_count += quantity;
        }
    }

    let total = distribution.total();
    let villager_to_werewolf_ratio =
        (werewolf_count > 0).then(|| villager_count as f64 / werewolf_count as f64);
    let special_role_ratio = if total > 0 {
        special_count as f64 / total as f64
    } else {
        0.0
    };
    let min_villager_ratio = if total <= 11 { 1.5 } else { 2.0 };

    let ratio_ok = villager_to_werewolf_ratio.is_some_and(|ratio| ratio >= min_villager_ratio);
    let special_ok = (MIN_SPECIAL_RATIO..=MAX_SPECIAL_RATIO).contains(&special_role_ratio);

    BalanceVerdict {
        is_balanced: ratio_ok && special_ok,
        metrics: Some(BalanceMetrics {
            total,
            werewolf_count,
            villager_count,
            neutral_count,
            special_count,
            villager_to_werewolf_ratio,
            special_role_ratio,
            min_villager_ratio,
        }),
        issue: None,
    }
}
