//! Scenario configuration: roster, formation, safe-spot orderings, loop
//! count, the affliction script and an optional intro frame.
//!
//! Built-in presets cover the strategies the diagrams were made for. A
//! config can also be loaded from JSON; call [`validate_config`] before
//! handing it to the driver.
//!
//! ```
//! use doth_logic::config::{preset, validate_config};
//!
//! let chobi = preset("chobi").unwrap();
//! assert_eq!(chobi.loops, 3);
//! assert!(validate_config(&chobi).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arena::{ArenaLayout, SafeSpot};
use crate::entity::PARTY_SIZE;
use crate::geometry::Vec2;
use crate::safe_spots::{SpotPlan, SpotStrategy};
use crate::selector::{RandomSelector, ScriptedSelector};

/// How the party lines up before doom goes out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Formation {
    /// Four quadrant pairs around the boss; the doom shift exchanges
    /// flexible members between pairs.
    Pairs,
    /// A single line along `conga_direction`; the doom shift steps
    /// afflicted players along `doom_direction` and clear players away.
    Conga {
        conga_direction: Vec2,
        doom_direction: Vec2,
    },
}

/// Title frame shown once before the first cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intro {
    pub title: String,
    /// Roster indices shown with doom on the title frame.
    pub afflicted: [u8; 4],
}

/// Everything needed to run one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    /// Job labels in roster order.
    pub roster: Vec<String>,
    /// Number of full cycles to run.
    pub loops: u32,
    pub formation: Formation,
    pub spots: SpotPlan,
    pub strategy: SpotStrategy,
    /// Afflicted roster indices for the opening cycles.
    #[serde(default)]
    pub scripted_afflictions: Vec<[u8; 4]>,
    /// Seed for random afflictions (None = entropy).
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub layout: ArenaLayout,
    #[serde(default)]
    pub intro: Option<Intro>,
}

impl ScenarioConfig {
    /// Build the affliction selector this config describes.
    pub fn selector(&self) -> ScriptedSelector {
        let fallback = match self.seed {
            Some(seed) => RandomSelector::seeded(seed),
            None => RandomSelector::from_entropy(),
        };
        ScriptedSelector::new(self.scripted_afflictions.clone(), fallback)
    }
}

/// Scenario validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scenario name is empty")]
    EmptyName,
    #[error("roster has {0} players, expected 8")]
    RosterSize(usize),
    #[error("roster slot {0} has an empty role")]
    EmptyRole(usize),
    #[error("loop count is zero")]
    ZeroLoops,
    #[error("safe spot {0} listed more than once")]
    DuplicateSpot(SafeSpot),
    #[error("script {script} names player {id}, outside the roster")]
    ScriptOutOfRange { script: usize, id: u8 },
    #[error("script {script} names player {id} twice")]
    ScriptDuplicate { script: usize, id: u8 },
    #[error("{0} direction is zero")]
    ZeroDirection(&'static str),
    #[error("by-pair spot strategy needs the pair formation")]
    StrategyNeedsPairs,
    #[error("intro title is empty")]
    EmptyTitle,
    #[error("intro names player {0}, outside the roster")]
    IntroOutOfRange(u8),
    #[error("intro names player {0} twice")]
    IntroDuplicate(u8),
}

/// Validate a scenario, returning all errors found.
pub fn validate_config(config: &ScenarioConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ConfigError::EmptyName);
    }
    if config.roster.len() != PARTY_SIZE {
        errors.push(ConfigError::RosterSize(config.roster.len()));
    }
    for (i, role) in config.roster.iter().enumerate() {
        if role.trim().is_empty() {
            errors.push(ConfigError::EmptyRole(i));
        }
    }
    if config.loops == 0 {
        errors.push(ConfigError::ZeroLoops);
    }
    for spot in config.spots.duplicates() {
        errors.push(ConfigError::DuplicateSpot(spot));
    }

    for (script, ids) in config.scripted_afflictions.iter().enumerate() {
        for (i, &id) in ids.iter().enumerate() {
            if id as usize >= PARTY_SIZE {
                errors.push(ConfigError::ScriptOutOfRange { script, id });
            } else if ids[..i].contains(&id) {
                errors.push(ConfigError::ScriptDuplicate { script, id });
            }
        }
    }

    if let Some(intro) = &config.intro {
        if intro.title.trim().is_empty() {
            errors.push(ConfigError::EmptyTitle);
        }
        for (i, &id) in intro.afflicted.iter().enumerate() {
            if id as usize >= PARTY_SIZE {
                errors.push(ConfigError::IntroOutOfRange(id));
            } else if intro.afflicted[..i].contains(&id) {
                errors.push(ConfigError::IntroDuplicate(id));
            }
        }
    }

    match &config.formation {
        Formation::Pairs => {}
        Formation::Conga {
            conga_direction,
            doom_direction,
        } => {
            if conga_direction.is_zero() {
                errors.push(ConfigError::ZeroDirection("conga"));
            }
            if doom_direction.is_zero() {
                errors.push(ConfigError::ZeroDirection("doom"));
            }
            if config.strategy == SpotStrategy::ByPair {
                errors.push(ConfigError::StrategyNeedsPairs);
            }
        }
    }

    errors
}

fn roster(names: [&str; 8]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

const CONGA_ROSTER: [&str; 8] = [
    "Astrologian",
    "BlackMage",
    "Monk",
    "Ninja",
    "DarkKnight",
    "Dancer",
    "Gunbreaker",
    "Scholar",
];

fn conga(
    name: &str,
    conga_direction: Vec2,
    doom_direction: Vec2,
    afflicted: [SafeSpot; 4],
    clear: [SafeSpot; 4],
) -> ScenarioConfig {
    ScenarioConfig {
        name: name.to_string(),
        roster: roster(CONGA_ROSTER),
        loops: 10,
        formation: Formation::Conga {
            conga_direction,
            doom_direction,
        },
        spots: SpotPlan { afflicted, clear },
        strategy: SpotStrategy::RosterOrder,
        scripted_afflictions: Vec::new(),
        seed: None,
        layout: ArenaLayout::default(),
        intro: None,
    }
}

/// All built-in scenarios.
pub fn presets() -> Vec<ScenarioConfig> {
    use SafeSpot::*;

    let sqrt2 = std::f32::consts::SQRT_2;

    let chobi = ScenarioConfig {
        name: "chobi".to_string(),
        roster: roster([
            "DarkKnight",
            "Summoner",
            "Scholar",
            "Ninja",
            "Gunbreaker",
            "Dancer",
            "Astrologian",
            "Monk",
        ]),
        loops: 3,
        formation: Formation::Pairs,
        spots: SpotPlan {
            afflicted: [NorthEast, EastInner, WestInner, NorthWest],
            clear: [EastOuter, SouthEast, SouthWest, WestOuter],
        },
        strategy: SpotStrategy::ByPair,
        scripted_afflictions: vec![[1, 2, 3, 6], [2, 3, 4, 5], [0, 1, 5, 7]],
        seed: None,
        layout: ArenaLayout::default(),
        intro: Some(Intro {
            title: "Chobi DotH".to_string(),
            afflicted: [1, 2, 3, 6],
        }),
    };

    let maxwell = conga(
        "maxwell",
        Vec2::RIGHT * sqrt2,
        Vec2::DOWN * sqrt2,
        [WestInner, SouthWest, SouthEast, EastInner],
        [WestOuter, NorthWest, NorthEast, EastOuter],
    );

    let mut victalis = maxwell.clone();
    victalis.name = "victalis".to_string();
    victalis.roster = roster([
        "Scholar",
        "Astrologian",
        "Gunbreaker",
        "Warrior",
        "Monk",
        "Ninja",
        "Dancer",
        "Summoner",
    ]);
    victalis.loops = 1;

    vec![
        chobi,
        maxwell,
        conga(
            "week1-ns",
            Vec2::RIGHT + Vec2::DOWN,
            Vec2::LEFT + Vec2::DOWN,
            [NorthWest, WestInner, SouthWest, EastInner],
            [WestOuter, NorthEast, EastOuter, SouthEast],
        ),
        conga(
            "ns-alternative",
            Vec2::DOWN * sqrt2,
            Vec2::LEFT * sqrt2,
            [NorthWest, WestInner, SouthWest, EastInner],
            [NorthEast, EastOuter, SouthEast, WestOuter],
        ),
        conga(
            "maxwell-flipped",
            Vec2::RIGHT * sqrt2,
            Vec2::UP * sqrt2,
            [WestInner, NorthWest, NorthEast, EastInner],
            [WestOuter, SouthWest, SouthEast, EastOuter],
        ),
        conga(
            "bien",
            Vec2::RIGHT * sqrt2,
            Vec2::UP * sqrt2,
            [NorthWest, WestInner, SouthWest, EastInner],
            [NorthEast, EastOuter, SouthEast, WestOuter],
        ),
        victalis,
    ]
}

/// Look up a built-in scenario by name.
pub fn preset(name: &str) -> Option<ScenarioConfig> {
    presets().into_iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_validate() {
        for p in presets() {
            let errors = validate_config(&p);
            assert!(errors.is_empty(), "{}: {:?}", p.name, errors);
        }
    }

    #[test]
    fn preset_names_are_unique() {
        let names: Vec<_> = presets().into_iter().map(|p| p.name).collect();
        for (i, n) in names.iter().enumerate() {
            assert!(!names[..i].contains(n), "duplicate preset {}", n);
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(preset("nope").is_none());
    }

    #[test]
    fn catches_roster_and_loop_errors() {
        let mut c = preset("chobi").unwrap();
        c.roster.pop();
        c.roster[0] = "  ".to_string();
        c.loops = 0;
        c.name.clear();
        let errors = validate_config(&c);
        assert!(errors.contains(&ConfigError::RosterSize(7)));
        assert!(errors.contains(&ConfigError::EmptyRole(0)));
        assert!(errors.contains(&ConfigError::ZeroLoops));
        assert!(errors.contains(&ConfigError::EmptyName));
    }

    #[test]
    fn catches_bad_scripts() {
        let mut c = preset("chobi").unwrap();
        c.scripted_afflictions = vec![[0, 1, 2, 3], [0, 0, 2, 9]];
        let errors = validate_config(&c);
        assert_eq!(
            errors,
            vec![
                ConfigError::ScriptDuplicate { script: 1, id: 0 },
                ConfigError::ScriptOutOfRange { script: 1, id: 9 },
            ]
        );
    }

    #[test]
    fn catches_duplicate_spots() {
        let mut c = preset("bien").unwrap();
        c.spots.clear[0] = SafeSpot::NorthWest;
        assert_eq!(
            validate_config(&c),
            vec![ConfigError::DuplicateSpot(SafeSpot::NorthWest)]
        );
    }

    #[test]
    fn conga_needs_directions_and_roster_order() {
        let mut c = preset("maxwell").unwrap();
        c.formation = Formation::Conga {
            conga_direction: Vec2::ZERO,
            doom_direction: Vec2::UP,
        };
        c.strategy = SpotStrategy::ByPair;
        let errors = validate_config(&c);
        assert!(errors.contains(&ConfigError::ZeroDirection("conga")));
        assert!(errors.contains(&ConfigError::StrategyNeedsPairs));
    }

    #[test]
    fn only_chobi_has_an_intro() {
        for p in presets() {
            assert_eq!(p.intro.is_some(), p.name == "chobi", "{}", p.name);
        }
    }

    #[test]
    fn catches_bad_intro() {
        let mut c = preset("chobi").unwrap();
        c.intro = Some(Intro {
            title: " ".to_string(),
            afflicted: [1, 1, 3, 8],
        });
        assert_eq!(
            validate_config(&c),
            vec![
                ConfigError::EmptyTitle,
                ConfigError::IntroDuplicate(1),
                ConfigError::IntroOutOfRange(8),
            ]
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let c = preset("week1-ns").unwrap();
        let json = serde_json::to_string(&c).unwrap();
        let back: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "name": "custom",
            "roster": ["A", "B", "C", "D", "E", "F", "G", "H"],
            "loops": 2,
            "formation": { "type": "pairs" },
            "spots": {
                "afflicted": ["NorthEast", "EastInner", "WestInner", "NorthWest"],
                "clear": ["EastOuter", "SouthEast", "SouthWest", "WestOuter"]
            },
            "strategy": "by_pair"
        }"#;
        let c: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert!(c.scripted_afflictions.is_empty());
        assert_eq!(c.seed, None);
        assert_eq!(c.intro, None);
        assert!(validate_config(&c).is_empty());
    }
}
