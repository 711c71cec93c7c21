//! Players: role-labelled, positionable units carrying the doom flag.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DothError, Result};
use crate::geometry::Vec2;

/// Number of players in a full party.
pub const PARTY_SIZE: usize = 8;

/// Number of players afflicted with doom each cycle.
pub const AFFLICTED_PER_CYCLE: usize = 4;

/// Index of a player in the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u8);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single player in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Job label, e.g. "DarkKnight". Doubles as the sprite name.
    pub role: String,
    /// Reference spot the player returns to at the start of a cycle.
    pub home: Vec2,
    /// Where the player currently stands.
    pub position: Vec2,
    pub afflicted: bool,
}

impl Entity {
    pub fn new(id: EntityId, role: impl Into<String>, home: Vec2) -> Self {
        Self {
            id,
            role: role.into(),
            home,
            position: home,
            afflicted: false,
        }
    }
}

/// A request to move one entity to a target position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub entity: EntityId,
    pub target: Vec2,
}

/// Build the entity table for a roster, one entity per role, with homes
/// supplied by `home_for(index)`.
pub fn build_roster<S: AsRef<str>>(roles: &[S], home_for: impl Fn(usize) -> Vec2) -> Vec<Entity> {
    roles
        .iter()
        .enumerate()
        .map(|(i, role)| Entity::new(EntityId(i as u8), role.as_ref(), home_for(i)))
        .collect()
}

/// Count afflicted entities.
pub fn afflicted_count(entities: &[Entity]) -> usize {
    entities.iter().filter(|e| e.afflicted).count()
}

/// Mark exactly the given entities afflicted.
///
/// The selection must name [`AFFLICTED_PER_CYCLE`] distinct roster
/// members and no entity may already be afflicted. Nothing is mutated
/// unless the whole selection is valid.
pub fn apply_afflictions(entities: &mut [Entity], selection: &[EntityId]) -> Result<()> {
    let already = afflicted_count(entities);
    if selection.len() != AFFLICTED_PER_CYCLE || already != 0 {
        return Err(DothError::InvalidAfflictionState {
            afflicted: already + selection.len(),
            expected: AFFLICTED_PER_CYCLE,
        });
    }
    for (i, id) in selection.iter().enumerate() {
        if id.index() >= entities.len() {
            return Err(DothError::UnknownEntity(*id));
        }
        if selection[..i].contains(id) {
            return Err(DothError::DuplicateEntity(*id));
        }
    }
    for id in selection {
        entities[id.index()].afflicted = true;
    }
    Ok(())
}

/// Clear every doom flag.
pub fn clear_afflictions(entities: &mut [Entity]) {
    for e in entities {
        e.afflicted = false;
    }
}
