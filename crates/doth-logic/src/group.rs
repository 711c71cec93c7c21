//! Pairs and the four-pair group.
//!
//! The group is an indexable table `Quadrant → Pair` over a fixed entity
//! table. Exchanging the flexible members of two pairs is a pure table
//! update that returns an [`Exchange`] record; replaying the records in
//! reverse with [`Group::undo`] restores the original pairing and homes.

use serde::{Deserialize, Serialize};

use crate::arena::ArenaLayout;
use crate::entity::{self, Entity, EntityId, PARTY_SIZE};
use crate::error::{DothError, Result};
use crate::geometry::{Quadrant, Vec2};

/// Two players sharing a quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// Member whose slot may be exchanged with another pair's.
    pub flexible: EntityId,
    /// Member that never leaves this pair.
    pub fixed: EntityId,
}

impl Pair {
    pub fn members(&self) -> [EntityId; 2] {
        [self.flexible, self.fixed]
    }
}

/// Classification of a pair by how many of its members are afflicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairClass {
    /// No afflicted member.
    Clean,
    /// Exactly one afflicted member.
    Balanced,
    /// Both members afflicted.
    Double,
}

impl PairClass {
    pub fn from_count(afflicted: usize) -> Self {
        match afflicted {
            0 => PairClass::Clean,
            1 => PairClass::Balanced,
            _ => PairClass::Double,
        }
    }
}

/// Record of one flexible-slot exchange, enough to reverse it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub a: Quadrant,
    pub b: Quadrant,
    /// Home of `a`'s flexible slot before the exchange.
    pub a_position: Vec2,
    /// Home of `b`'s flexible slot before the exchange.
    pub b_position: Vec2,
}

/// Eight entities partitioned into four quadrant pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    entities: Vec<Entity>,
    pairs: [Pair; 4],
}

impl Group {
    /// Pair up a full party: entity `2i` is the flexible member and
    /// `2i + 1` the static member of quadrant `i` (NE, SE, SW, NW).
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        if entities.len() != PARTY_SIZE {
            return Err(DothError::PartySize {
                found: entities.len(),
                expected: PARTY_SIZE,
            });
        }
        let pairs = Quadrant::ALL.map(|q| Pair {
            flexible: EntityId((q.index() * 2) as u8),
            fixed: EntityId((q.index() * 2 + 1) as u8),
        });
        Ok(Self { entities, pairs })
    }

    /// Build a group from role labels, placing each member on its
    /// quadrant's stack spot.
    pub fn from_roster<S: AsRef<str>>(roles: &[S], layout: &ArenaLayout) -> Result<Self> {
        let entities = entity::build_roster(roles, |i| {
            let quadrant = Quadrant::ALL[(i / 2) % 4];
            if i % 2 == 0 {
                layout.flex_spot(quadrant)
            } else {
                layout.static_spot(quadrant)
            }
        });
        Self::new(entities)
    }

    pub fn pair(&self, quadrant: Quadrant) -> &Pair {
        &self.pairs[quadrant.index()]
    }

    /// Snapshot of the pairing table.
    pub fn pairing(&self) -> [Pair; 4] {
        self.pairs
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Quadrant, &Pair)> {
        Quadrant::ALL.into_iter().zip(self.pairs.iter())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(id.index())
            .ok_or(DothError::UnknownEntity(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(id.index())
            .ok_or(DothError::UnknownEntity(id))
    }

    /// Quadrant whose pair currently holds `id`.
    pub fn quadrant_of(&self, id: EntityId) -> Option<Quadrant> {
        self.pairs()
            .find(|(_, p)| p.members().contains(&id))
            .map(|(q, _)| q)
    }

    /// Number of afflicted members in a pair.
    pub fn afflicted_in(&self, quadrant: Quadrant) -> usize {
        self.pair(quadrant)
            .members()
            .iter()
            .filter(|id| self.entities[id.index()].afflicted)
            .count()
    }

    pub fn classify(&self, quadrant: Quadrant) -> PairClass {
        PairClass::from_count(self.afflicted_in(quadrant))
    }

    /// First afflicted member of a pair, flexible slot first.
    pub fn afflicted_member(&self, quadrant: Quadrant) -> Option<EntityId> {
        self.pair(quadrant)
            .members()
            .into_iter()
            .find(|id| self.entities[id.index()].afflicted)
    }

    /// First clear member of a pair, flexible slot first.
    pub fn clear_member(&self, quadrant: Quadrant) -> Option<EntityId> {
        self.pair(quadrant)
            .members()
            .into_iter()
            .find(|id| !self.entities[id.index()].afflicted)
    }

    /// True when every pair holds one afflicted and one clear member.
    pub fn is_balanced(&self) -> bool {
        Quadrant::ALL
            .iter()
            .all(|q| self.classify(*q) == PairClass::Balanced)
    }

    pub fn apply_afflictions(&mut self, selection: &[EntityId]) -> Result<()> {
        entity::apply_afflictions(&mut self.entities, selection)
    }

    pub fn clear_afflictions(&mut self) {
        entity::clear_afflictions(&mut self.entities);
    }

    /// Swap the flexible members of two pairs.
    ///
    /// Each incoming member takes over the home of the slot it joins.
    /// Swapping a quadrant with itself is a no-op that still yields a
    /// valid (identity) record.
    pub fn exchange_flexible(&mut self, a: Quadrant, b: Quadrant) -> Result<Exchange> {
        let first = self.pair(a).flexible;
        let second = self.pair(b).flexible;
        let a_position = self.entity(first)?.home;
        let b_position = self.entity(second)?.home;

        self.pairs[a.index()].flexible = second;
        self.pairs[b.index()].flexible = first;
        self.entity_mut(second)?.home = a_position;
        self.entity_mut(first)?.home = b_position;

        Ok(Exchange {
            a,
            b,
            a_position,
            b_position,
        })
    }

    /// Reverse a log of exchanges, newest first.
    pub fn undo(&mut self, log: &[Exchange]) -> Result<()> {
        for record in log.iter().rev() {
            let in_a = self.pair(record.a).flexible;
            let in_b = self.pair(record.b).flexible;
            self.pairs[record.a.index()].flexible = in_b;
            self.pairs[record.b.index()].flexible = in_a;
            self.entity_mut(in_b)?.home = record.a_position;
            self.entity_mut(in_a)?.home = record.b_position;
        }
        Ok(())
    }
}
