//! Role definitions and the read-only catalog that holds them.
//!
//! The built-in table is declared through `define_roles!`; a custom table
//! can be loaded from JSON with [`Catalog::load`]. Either way the catalog is
//! built once and only ever handed out by reference.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, PlanError, RoleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Werewolves,
    Villagers,
    Neutral,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Werewolves => "werewolves",
            Team::Villagers => "villagers",
            Team::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Catalog key of a role, e.g. `SEER`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleId {
    fn from(id: &str) -> Self {
        RoleId(id.to_string())
    }
}

impl From<String> for RoleId {
    fn from(id: String) -> Self {
        RoleId(id)
    }
}

impl Borrow<str> for RoleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for RoleId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RoleId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// An immutable role definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RoleDef")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub team: Team,
    pub description: String,
    pub min_players: usize,
    /// Ascending breakpoints: at >= threshold participants, use this many.
    pub scaling: BTreeMap<usize, usize>,
    /// Counts towards the special-role ratio of a balance check.
    pub special: bool,
}

/// Werewolves never count as special unless a catalog says so.
fn default_special(team: Team) -> bool {
    team != Team::Werewolves
}

/// On-disk form of a role; `special` may be left out.
#[derive(Debug, Deserialize)]
struct RoleDef {
    id: RoleId,
    name: String,
    team: Team,
    description: String,
    min_players: usize,
    scaling: BTreeMap<usize, usize>,
    #[serde(default)]
    special: Option<bool>,
}

impl From<RoleDef> for Role {
    fn from(def: RoleDef) -> Self {
        Role {
            special: def.special.unwrap_or_else(|| default_special(def.team)),
            id: def.id,
            name: def.name,
            team: def.team,
            description: def.description,
            min_players: def.min_players,
            scaling: def.scaling,
        }
    }
}

impl Role {
    pub fn is_available(&self, participant_count: usize) -> bool {
        participant_count >= self.min_players
    }

    /// Quantity from the scaling table for `participant_count`
    /// (0 when the role is not yet available).
    pub fn scaled_quantity(&self, participant_count: usize) -> usize {
        if !self.is_available(participant_count) {
            return 0;
        }
        self.scaling
            .range(..=participant_count)
            .next_back()
            .map(|(_, quantity)| *quantity)
            .unwrap_or(0)
    }
}

macro_rules! define_roles {
    (
        $(
            $id:ident: $name:literal => {
                team: $team:ident,
                description: $description:literal,
                min_players: $min:literal,
                scaling: { $($threshold:literal => $quantity:literal),* $(,)? }
                $(, special: $special:expr)?
            }
        ),* $(,)?
    ) => {
        /// Identifiers of the built-in roles.
        pub mod ids {
            $(pub const $id: &str = stringify!($id);)*
        }

        fn standard_roles() -> Vec<Role> {
            vec![$(
                Role {
                    id: RoleId::from(stringify!($id)),
                    name: $name.to_string(),
                    team: Team::$team,
                    description: $description.to_string(),
                    min_players: $min,
                    scaling: [$(($threshold, $quantity)),*].into_iter().collect(),
                    special: define_roles!(@special $team $($special)?),
                },
            )*]
        }
    };

    (@special $team:ident) => { default_special(Team::$team) };
    (@special $team:ident $val:expr) => { $val };
}

define_roles! {
    WEREWOLF: "Loup-Garou" => {
        team: Werewolves,
        description: "Se réveille la nuit pour éliminer un villageois",
        min_players: 8,
        scaling: { 8 => 2, 12 => 3, 16 => 4 }
    },
    SEER: "Voyante" => {
        team: Villagers,
        description: "Peut découvrir le rôle d'un joueur chaque nuit",
        min_players: 8,
        scaling: { 8 => 1, 12 => 2 }
    },
    WITCH: "Sorcière" => {
        team: Villagers,
        description: "Possède deux potions: une pour sauver, une pour tuer",
        min_players: 8,
        scaling: { 8 => 1, 14 => 2 }
    },
    HUNTER: "Chasseur" => {
        team: Villagers,
        description: "Peut éliminer un joueur en mourant",
        min_players: 8,
        scaling: { 8 => 1 }
    },
    CUPID: "Cupidon" => {
        team: Villagers,
        description: "Désigne deux amoureux au début du jeu",
        min_players: 10,
        scaling: { 10 => 1 }
    },
    ALIEN: "Alien" => {
        team: Villagers,
        description: "Peut espionner les Loups-Garous depuis l'espace",
        min_players: 10,
        scaling: { 10 => 1 }
    },
    BEAR: "Ours" => {
        team: Neutral,
        description: "Grogne si ses voisins sont des Loups-Garous",
        min_players: 12,
        scaling: { 12 => 1 }
    },
    ELDER: "L'Ancien" => {
        team: Villagers,
        description: "Peut survivre à une première attaque des Loups-Garous",
        min_players: 12,
        scaling: { 12 => 1 }
    },
    RAVEN: "Corbeau" => {
        team: Villagers,
        description: "Désigne un joueur suspect chaque nuit",
        min_players: 12,
        scaling: { 12 => 1 }
    },
    BARBIE: "Barbie" => {
        team: Villagers,
        description: "Protège un joueur chaque nuit avec son style unique",
        min_players: 14,
        scaling: { 14 => 1 }
    },
    SHEPHERD: "Berger" => {
        team: Villagers,
        description: "Connaît l'identité d'un joueur au début",
        min_players: 14,
        scaling: { 14 => 1 }
    },

    // Plain filler, never planned automatically
    VILLAGER: "Villageois" => {
        team: Villagers,
        description: "Aucun pouvoir, vote avec le village",
        min_players: 8,
        scaling: { 8 => 0 },
        special: false
    },
}

/// Roles every plan deals exactly once.
pub const MANDATORY_ROLES: [&str; 3] = [ids::SEER, ids::WITCH, ids::HUNTER];

#[derive(Debug, Deserialize)]
struct CatalogFile {
    roles: Vec<Role>,
}

/// Ordered, read-only set of roles keyed by id.
#[derive(Debug, Clone)]
pub struct Catalog {
    roles: Vec<Role>,
    index: HashMap<RoleId, usize>,
}

impl Catalog {
    pub fn standard() -> Self {
        // The built-in table has unique ids and ordered scaling tables.
        let roles = standard_roles();
        let index = roles
            .iter()
            .enumerate()
            .map(|(position, role)| (role.id.clone(), position))
            .collect();
        Catalog { roles, index }
    }

    pub fn from_roles(roles: Vec<Role>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(roles.len());
        for (position, role) in roles.iter().enumerate() {
            let starts_in_range = role
                .scaling
                .keys()
                .next()
                .is_some_and(|first| *first >= role.min_players);
            if !starts_in_range {
                return Err(CatalogError::UnorderedScaling(role.id.clone()));
            }
            if index.insert(role.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateRole(role.id.clone()));
            }
        }
        Ok(Catalog { roles, index })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Catalog::from_roles(file.roles)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Catalog::from_json(&json)?;
        debug!(path = %path.display(), roles = catalog.len(), "loaded role catalog");
        Ok(catalog)
    }

    /// Startup validation: the planner cannot run without these roles.
    pub fn check_integrity(&self) -> Result<(), PlanError> {
        std::iter::once(ids::WEREWOLF)
            .chain(MANDATORY_ROLES)
            .find(|id| !self.contains(id))
            .map_or(Ok(()), |id| Err(PlanError::MissingMandatoryRole(RoleId::from(id))))
    }

    pub fn get_role(&self, id: &str) -> Result<&Role, RoleError> {
        self.index
            .get(id)
            .map(|position| &self.roles[*position])
            .ok_or_else(|| RoleError::UnknownRole {
                id: id.to_string(),
                suggestions: self.suggest(id),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &RoleId> {
        self.roles.iter().map(|role| &role.id)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Close matches for a mistyped id, best first.
    pub fn suggest(&self, id: &str) -> Vec<RoleId> {
        let normalized_input = id.to_lowercase();

        let mut candidates: Vec<(&RoleId, f64)> = self
            .roles
            .iter()
            .map(|role| {
                let similarity =
                    strsim::jaro_winkler(&normalized_input, &role.id.as_str().to_lowercase());
                (&role.id, similarity)
            })
            .filter(|(_, similarity)| *similarity >= 0.7)
            .collect();

        candidates.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        if let Some((closest, similarity)) = candidates.first() {
            if *similarity >= 0.85 {
                return vec![(*closest).clone()];
            }
        }

        candidates
            .into_iter()
            .take(3)
            .map(|(role_id, _)| role_id.clone())
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard()
    }
}
