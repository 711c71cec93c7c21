//! Doom-shift reassignment: decide which pairs trade flexible members so
//! that every pair ends up with one afflicted and one clear player.
//!
//! # Cases
//!
//! | Double pairs | Action |
//! |--------------|--------|
//! | 0 | Already balanced, nothing moves |
//! | 1 | Swap with the first clean pair (NE, SE, SW, NW order) |
//! | 2 | Two swaps, topology picked by the NW/SW tie-break |
//!
//! With exactly four afflicted players no other case can occur.
//!
//! # Tie-break
//!
//! When two pairs are doubled, two clean pairs remain and two disjoint
//! swap topologies would both work. NW and SW are the reference pairs:
//!
//! - equal afflicted counts (both doubled or both clean): the doubles sit
//!   on one side, so swap across it, NW↔NE and SW↔SE ([`SwapTopology::Lateral`])
//! - otherwise the doubles sit on a diagonal or a row, so swap within each
//!   side, NW↔SW and NE↔SE ([`SwapTopology::Axis`])
//!
//! ```
//! use doth_logic::arena::ArenaLayout;
//! use doth_logic::assignment::reassign;
//! use doth_logic::entity::EntityId;
//! use doth_logic::group::Group;
//!
//! let roles = ["A", "B", "C", "D", "E", "F", "G", "H"];
//! let mut group = Group::from_roster(&roles, &ArenaLayout::default()).unwrap();
//! group.apply_afflictions(&[2, 3, 6, 4].map(EntityId)).unwrap();
//!
//! let mut log = Vec::new();
//! let moves = reassign(&mut group, &mut log).unwrap();
//! assert!(group.is_balanced());
//! assert_eq!(log.len(), 1);
//! assert_eq!(moves.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::entity::{afflicted_count, Move, AFFLICTED_PER_CYCLE};
use crate::error::{DothError, Result};
use crate::geometry::Quadrant;
use crate::group::{Exchange, Group, PairClass};

/// Which pair of disjoint swaps resolves a two-double state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapTopology {
    /// NW↔NE and SW↔SE.
    Lateral,
    /// NW↔SW and NE↔SE.
    Axis,
}

impl SwapTopology {
    pub fn swaps(self) -> [(Quadrant, Quadrant); 2] {
        match self {
            SwapTopology::Lateral => [
                (Quadrant::NorthWest, Quadrant::NorthEast),
                (Quadrant::SouthWest, Quadrant::SouthEast),
            ],
            SwapTopology::Axis => [
                (Quadrant::NorthWest, Quadrant::SouthWest),
                (Quadrant::NorthEast, Quadrant::SouthEast),
            ],
        }
    }
}

/// The swaps a group needs, computed without touching it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExchangePlan {
    pub swaps: Vec<(Quadrant, Quadrant)>,
    /// Set only when two pairs were doubled.
    pub topology: Option<SwapTopology>,
}

impl ExchangePlan {
    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }
}

/// Fail unless exactly four players are afflicted.
pub fn check_affliction_state(group: &Group) -> Result<()> {
    let afflicted = afflicted_count(group.entities());
    if afflicted != AFFLICTED_PER_CYCLE {
        return Err(DothError::InvalidAfflictionState {
            afflicted,
            expected: AFFLICTED_PER_CYCLE,
        });
    }
    Ok(())
}

/// Pick the topology for a two-double state from the reference pairs.
pub fn select_topology(group: &Group) -> SwapTopology {
    if group.afflicted_in(Quadrant::NorthWest) == group.afflicted_in(Quadrant::SouthWest) {
        SwapTopology::Lateral
    } else {
        SwapTopology::Axis
    }
}

/// Work out the exchanges needed to balance every pair.
pub fn plan_exchanges(group: &Group) -> Result<ExchangePlan> {
    check_affliction_state(group)?;

    let mut doubles = Vec::new();
    let mut cleans = Vec::new();
    for q in Quadrant::ALL {
        match group.classify(q) {
            PairClass::Double => doubles.push(q),
            PairClass::Clean => cleans.push(q),
            PairClass::Balanced => {}
        }
    }

    let plan = match (doubles.as_slice(), cleans.first()) {
        ([double], Some(clean)) => ExchangePlan {
            swaps: vec![(*double, *clean)],
            topology: None,
        },
        ([_, _], _) => {
            let topology = select_topology(group);
            ExchangePlan {
                swaps: topology.swaps().to_vec(),
                topology: Some(topology),
            }
        }
        _ => ExchangePlan::default(),
    };
    Ok(plan)
}

/// Apply a plan, appending one record per swap to `undo_log`.
///
/// Returns the moves for the renderer: after each swap, both incoming
/// flexible members walk to the home of the slot they joined.
pub fn apply_plan(
    group: &mut Group,
    plan: &ExchangePlan,
    undo_log: &mut Vec<Exchange>,
) -> Result<Vec<Move>> {
    let mut moves = Vec::with_capacity(plan.swaps.len() * 2);
    for &(a, b) in &plan.swaps {
        let record = group.exchange_flexible(a, b)?;
        log::debug!(
            "exchange {} <-> {}: {} -> {}, {} -> {}",
            a,
            b,
            group.pair(a).flexible,
            record.a_position,
            group.pair(b).flexible,
            record.b_position
        );
        moves.push(Move {
            entity: group.pair(a).flexible,
            target: record.a_position,
        });
        moves.push(Move {
            entity: group.pair(b).flexible,
            target: record.b_position,
        });
        undo_log.push(record);
    }
    Ok(moves)
}

/// Plan and apply the doom shift in one step.
pub fn reassign(group: &mut Group, undo_log: &mut Vec<Exchange>) -> Result<Vec<Move>> {
    let plan = plan_exchanges(group)?;
    if let Some(topology) = plan.topology {
        log::debug!("two doubled pairs, using {:?} swaps", topology);
    }
    apply_plan(group, &plan, undo_log)
}
