//! Error types for the choreography core.

use thiserror::Error;

use crate::arena::SafeSpot;
use crate::config::ConfigError;
use crate::entity::EntityId;
use crate::geometry::Quadrant;

/// Errors surfaced by the assignment and driver layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DothError {
    /// The affliction flags do not afflict exactly `expected` entities.
    #[error("invalid affliction state: {afflicted} afflicted, expected {expected}")]
    InvalidAfflictionState { afflicted: usize, expected: usize },
    /// A formation was given the wrong number of players.
    #[error("party has {found} players, expected {expected}")]
    PartySize { found: usize, expected: usize },
    /// An id that does not belong to the roster.
    #[error("unknown entity id {0}")]
    UnknownEntity(EntityId),
    /// The same entity was selected more than once.
    #[error("entity {0} selected more than once")]
    DuplicateEntity(EntityId),
    /// A pair does not hold one afflicted and one clear member.
    #[error("pair {0} is not balanced")]
    UnbalancedPair(Quadrant),
    /// Two entities were assigned the same safe spot.
    #[error("safe spot {spot} assigned to both {first} and {second}")]
    SpotCollision {
        spot: SafeSpot,
        first: EntityId,
        second: EntityId,
    },
    /// The driver already ran every configured loop.
    #[error("scenario finished after {0} cycles")]
    ScenarioFinished(u32),
    /// Scenario configuration failed validation.
    #[error("invalid scenario config: {}", join_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T, E = DothError> = std::result::Result<T, E>;
