//! Safe-spot assignment after the doom shift.
//!
//! Every afflicted player takes one of four afflicted spots and every
//! clear player one of four clear spots. Two strategies exist:
//!
//! - [`assign_by_pair`]: quadrant `i`'s afflicted member takes
//!   `afflicted[i]`, its clear member `clear[i]` (quadrant order NE, SE,
//!   SW, NW). Used by the pair formation.
//! - [`assign_in_roster_order`]: the `n`th afflicted player in roster
//!   order takes `afflicted[n]`, likewise for clear players. Used by the
//!   conga formation.
//!
//! Either way the result is a bijection onto the eight spots; both
//! functions verify that before returning.

use serde::{Deserialize, Serialize};

use crate::arena::{ArenaLayout, SafeSpot};
use crate::entity::{afflicted_count, Entity, EntityId, Move, AFFLICTED_PER_CYCLE};
use crate::error::{DothError, Result};
use crate::geometry::{Quadrant, Vec2};
use crate::group::Group;

/// Ordered afflicted and clear spot lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotPlan {
    pub afflicted: [SafeSpot; 4],
    pub clear: [SafeSpot; 4],
}

impl SpotPlan {
    /// All eight spots, afflicted first.
    pub fn all(&self) -> impl Iterator<Item = SafeSpot> + '_ {
        self.afflicted.iter().chain(self.clear.iter()).copied()
    }

    /// Spots named more than once across both lists.
    pub fn duplicates(&self) -> Vec<SafeSpot> {
        let spots: Vec<_> = self.all().collect();
        let mut dups = Vec::new();
        for (i, spot) in spots.iter().enumerate() {
            if spots[..i].contains(spot) && !dups.contains(spot) {
                dups.push(*spot);
            }
        }
        dups
    }
}

/// Which strategy maps players onto a [`SpotPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStrategy {
    ByPair,
    RosterOrder,
}

/// One player's destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub entity: EntityId,
    pub spot: SafeSpot,
    pub target: Vec2,
}

impl Placement {
    pub fn as_move(&self) -> Move {
        Move {
            entity: self.entity,
            target: self.target,
        }
    }
}

fn check_count(entities: &[Entity]) -> Result<()> {
    let afflicted = afflicted_count(entities);
    if afflicted != AFFLICTED_PER_CYCLE {
        return Err(DothError::InvalidAfflictionState {
            afflicted,
            expected: AFFLICTED_PER_CYCLE,
        });
    }
    Ok(())
}

/// Fail if any spot is taken by more than one player.
pub fn check_bijection(placements: &[Placement]) -> Result<()> {
    for (i, p) in placements.iter().enumerate() {
        if let Some(other) = placements[..i].iter().find(|o| o.spot == p.spot) {
            return Err(DothError::SpotCollision {
                spot: p.spot,
                first: other.entity,
                second: p.entity,
            });
        }
    }
    Ok(())
}

/// Send each pair's afflicted and clear members to their quadrant's spots.
pub fn assign_by_pair(
    group: &Group,
    plan: &SpotPlan,
    layout: &ArenaLayout,
) -> Result<Vec<Placement>> {
    check_count(group.entities())?;

    let mut afflicted = Vec::with_capacity(4);
    let mut clear = Vec::with_capacity(4);
    for q in Quadrant::ALL {
        let (Some(doomed), Some(cleanser)) = (group.afflicted_member(q), group.clear_member(q))
        else {
            return Err(DothError::UnbalancedPair(q));
        };
        let i = q.index();
        afflicted.push(Placement {
            entity: doomed,
            spot: plan.afflicted[i],
            target: layout.spot(plan.afflicted[i]),
        });
        clear.push(Placement {
            entity: cleanser,
            spot: plan.clear[i],
            target: layout.spot(plan.clear[i]),
        });
    }

    afflicted.extend(clear);
    check_bijection(&afflicted)?;
    Ok(afflicted)
}

/// Fill afflicted and clear spots in roster order.
pub fn assign_in_roster_order(
    entities: &[Entity],
    plan: &SpotPlan,
    layout: &ArenaLayout,
) -> Result<Vec<Placement>> {
    check_count(entities)?;

    let afflicted = entities.iter().filter(|e| e.afflicted);
    let clear = entities.iter().filter(|e| !e.afflicted);
    let placements: Vec<_> = afflicted
        .zip(plan.afflicted.iter())
        .chain(clear.zip(plan.clear.iter()))
        .map(|(e, spot)| Placement {
            entity: e.id,
            spot: *spot,
            target: layout.spot(*spot),
        })
        .collect();

    check_bijection(&placements)?;
    Ok(placements)
}
