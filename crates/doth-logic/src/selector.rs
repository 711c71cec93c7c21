//! Affliction selectors: who gets doom each cycle.
//!
//! The driver asks a selector for exactly four roster ids per cycle.
//! [`RandomSelector`] samples uniformly; [`ScriptedSelector`] replays
//! fixed selections for the first cycles and then defers to a random
//! one. Any `FnMut(u32, &[Entity]) -> Vec<EntityId>` also works, which is
//! how tests inject deterministic selections.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::entity::{Entity, EntityId, AFFLICTED_PER_CYCLE};

/// Supplies the afflicted subset for a cycle.
pub trait AfflictionSelector {
    fn select(&mut self, cycle: u32, entities: &[Entity]) -> Vec<EntityId>;
}

impl<F> AfflictionSelector for F
where
    F: FnMut(u32, &[Entity]) -> Vec<EntityId>,
{
    fn select(&mut self, cycle: u32, entities: &[Entity]) -> Vec<EntityId> {
        self(cycle, entities)
    }
}

/// Uniform choice of four distinct players.
#[derive(Debug, Clone)]
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    /// Deterministic selector for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RandomSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> AfflictionSelector for RandomSelector<R> {
    fn select(&mut self, _cycle: u32, entities: &[Entity]) -> Vec<EntityId> {
        let amount = AFFLICTED_PER_CYCLE.min(entities.len());
        let mut picked: Vec<_> = rand::seq::index::sample(&mut self.rng, entities.len(), amount)
            .into_iter()
            .map(|i| entities[i].id)
            .collect();
        picked.sort();
        picked
    }
}

/// Fixed selections for the opening cycles, random afterwards.
#[derive(Debug, Clone)]
pub struct ScriptedSelector<R = StdRng> {
    scripts: Vec<[u8; 4]>,
    fallback: RandomSelector<R>,
}

impl<R: Rng> ScriptedSelector<R> {
    pub fn new(scripts: Vec<[u8; 4]>, fallback: RandomSelector<R>) -> Self {
        Self { scripts, fallback }
    }

    pub fn script_len(&self) -> usize {
        self.scripts.len()
    }
}

impl<R: Rng> AfflictionSelector for ScriptedSelector<R> {
    fn select(&mut self, cycle: u32, entities: &[Entity]) -> Vec<EntityId> {
        match self.scripts.get(cycle as usize) {
            Some(script) => script.iter().map(|&i| EntityId(i)).collect(),
            None => {
                if self.script_len() > 0 && cycle as usize == self.script_len() {
                    log::warn!(
                        "scripted afflictions exhausted after {} cycles, switching to random",
                        self.script_len()
                    );
                }
                self.fallback.select(cycle, entities)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::build_roster;
    use crate::geometry::Vec2;

    fn party() -> Vec<Entity> {
        build_roster(&["A", "B", "C", "D", "E", "F", "G", "H"], |_| Vec2::ZERO)
    }

    #[test]
    fn random_picks_four_distinct_members() {
        let entities = party();
        let mut selector = RandomSelector::seeded(7);
        for cycle in 0..200 {
            let picked = selector.select(cycle, &entities);
            assert_eq!(picked.len(), 4);
            let mut dedup = picked.clone();
            dedup.dedup();
            assert_eq!(dedup.len(), 4);
            assert!(picked.iter().all(|id| id.index() < 8));
        }
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let entities = party();
        let mut a = RandomSelector::seeded(42);
        let mut b = RandomSelector::seeded(42);
        for cycle in 0..20 {
            assert_eq!(a.select(cycle, &entities), b.select(cycle, &entities));
        }
    }

    #[test]
    fn random_eventually_covers_every_member() {
        let entities = party();
        let mut selector = RandomSelector::seeded(3);
        let mut seen = [false; 8];
        for cycle in 0..100 {
            for id in selector.select(cycle, &entities) {
                seen[id.index()] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn scripted_replays_then_falls_back() {
        let entities = party();
        let scripts = vec![[1, 2, 3, 6], [2, 3, 4, 5], [0, 1, 5, 7]];
        let mut selector = ScriptedSelector::new(scripts.clone(), RandomSelector::seeded(1));
        let mut reference = RandomSelector::seeded(1);
        assert_eq!(selector.script_len(), 3);

        for (cycle, script) in scripts.iter().enumerate() {
            let picked = selector.select(cycle as u32, &entities);
            assert_eq!(picked, script.map(EntityId).to_vec());
        }
        assert_eq!(selector.select(3, &entities), reference.select(3, &entities));
    }

    #[test]
    fn injected_rng_drives_the_sample() {
        let entities = party();
        let mut injected = RandomSelector::with_rng(StdRng::seed_from_u64(5));
        let mut seeded = RandomSelector::seeded(5);
        for cycle in 0..10 {
            assert_eq!(
                injected.select(cycle, &entities),
                seeded.select(cycle, &entities)
            );
        }
    }

    #[test]
    fn empty_script_is_pure_random() {
        let entities = party();
        let mut selector = ScriptedSelector::new(Vec::new(), RandomSelector::seeded(8));
        let mut reference = RandomSelector::seeded(8);
        assert_eq!(selector.script_len(), 0);
        assert_eq!(selector.select(0, &entities), reference.select(0, &entities));
    }

    #[test]
    fn closures_are_selectors() {
        let entities = party();
        let mut fixed = |_cycle: u32, _entities: &[Entity]| vec![EntityId(0); 4];
        assert_eq!(fixed.select(0, &entities).len(), 4);
    }
}
