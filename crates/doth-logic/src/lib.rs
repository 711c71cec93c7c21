//! Pure choreography logic for DotH positioning diagrams.
//!
//! This crate decides who stands where during each cycle of the Death of
//! the Heavens doom mechanic. It never draws anything: the driver issues
//! requests against a [`renderer::SceneRenderer`], so the same logic runs
//! under a video backend, a JSON timeline recorder, or a test stub.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`arena`] | Named safe spots and pair stack spots |
//! | [`assignment`] | Doom-shift exchanges that balance every pair |
//! | [`config`] | Scenario configuration, presets, validation |
//! | [`driver`] | Per-cycle state machine (enter → doom → shift → relocate → resolve → reset) |
//! | [`entity`] | Players, roster construction, doom flags |
//! | [`error`] | Error types |
//! | [`geometry`] | 2D vectors and quadrants |
//! | [`group`] | Quadrant pairs, exchange records, undo |
//! | [`renderer`] | Scene-renderer trait plus recording and null renderers |
//! | [`safe_spots`] | Bijective safe-spot assignment |
//! | [`selector`] | Random and scripted affliction selection |

pub mod arena;
pub mod assignment;
pub mod config;
pub mod driver;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod group;
pub mod renderer;
pub mod safe_spots;
pub mod selector;

pub use error::{DothError, Result};
