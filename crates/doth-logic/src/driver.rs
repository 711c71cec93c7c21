//! Scenario driver: the per-cycle state machine.
//!
//! ```text
//! Entering → AfflictionApplied → Reassigned → Relocated → Resolved → Reset
//!    ↑                                                                  │
//!    └──────────────────────────── next cycle ──────────────────────────┘
//! ```
//!
//! Each [`ScenarioDriver::step`] runs one phase and hands back the
//! [`CycleContext`] it was given, updated. The context carries everything
//! that belongs to a single cycle (who was afflicted, the exchange log,
//! where everyone ended up) so nothing leaks between cycles; Reset undoes
//! the exchange log and clears the doom flags. A step that fails rolls
//! the cycle back the same way and returns the driver to `Entering`.
//!
//! Scenarios with an [`Intro`](crate::config::Intro) play it once before
//! the first cycle via [`ScenarioDriver::intro`]; [`ScenarioDriver::run`]
//! does this automatically.
//!
//! ```
//! use doth_logic::config::preset;
//! use doth_logic::driver::ScenarioDriver;
//! use doth_logic::renderer::RecordingRenderer;
//!
//! let mut config = preset("chobi").unwrap();
//! config.seed = Some(1);
//! let mut driver = ScenarioDriver::from_config(config).unwrap();
//! let mut renderer = RecordingRenderer::new();
//! let reports = driver.run(&mut renderer).unwrap();
//! assert_eq!(reports.len(), 3);
//! assert!(driver.is_finished());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::assignment;
use crate::config::{validate_config, Formation, ScenarioConfig};
use crate::entity::{self, Entity, EntityId, Move};
use crate::error::{DothError, Result};
use crate::geometry::Vec2;
use crate::group::{Exchange, Group};
use crate::renderer::{Drawable, SceneRenderer};
use crate::safe_spots::{self, Placement, SpotStrategy};
use crate::selector::{AfflictionSelector, ScriptedSelector};

/// Radius of the puddle a clear player drops at resolution.
pub const PUDDLE_RADIUS: f32 = 1.5;

/// Where the boss stands.
pub const BOSS_POSITION: Vec2 = Vec2::new(0.0, 3.0);

/// Half-width of the square players scatter in while fading in.
const SCATTER: f32 = 1.0;

/// Fraction of the doom direction players step during a conga shift.
const CONGA_STEP: f32 = 0.5;

/// Phase the driver will run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CyclePhase {
    Entering,
    AfflictionApplied,
    Reassigned,
    Relocated,
    Resolved,
    Reset,
}

impl CyclePhase {
    pub const ORDER: [CyclePhase; 6] = [
        CyclePhase::Entering,
        CyclePhase::AfflictionApplied,
        CyclePhase::Reassigned,
        CyclePhase::Relocated,
        CyclePhase::Resolved,
        CyclePhase::Reset,
    ];

    pub fn next(self) -> CyclePhase {
        match self {
            CyclePhase::Entering => CyclePhase::AfflictionApplied,
            CyclePhase::AfflictionApplied => CyclePhase::Reassigned,
            CyclePhase::Reassigned => CyclePhase::Relocated,
            CyclePhase::Relocated => CyclePhase::Resolved,
            CyclePhase::Resolved => CyclePhase::Reset,
            CyclePhase::Reset => CyclePhase::Entering,
        }
    }
}

/// A cleanse puddle dropped by a clear player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Puddle {
    pub id: u8,
    pub owner: EntityId,
    pub center: Vec2,
    pub radius: f32,
}

impl Puddle {
    pub fn covers(&self, point: Vec2) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// State owned by a single cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleContext {
    pub cycle: u32,
    /// Phases completed so far, in order.
    pub completed: Vec<CyclePhase>,
    pub afflicted: Vec<EntityId>,
    /// Undo log for the doom shift.
    pub exchanges: Vec<Exchange>,
    /// Moves made during the doom shift.
    pub shifts: Vec<Move>,
    pub placements: Vec<Placement>,
    pub puddles: Vec<Puddle>,
}

impl CycleContext {
    pub fn new(cycle: u32) -> Self {
        Self {
            cycle,
            ..Self::default()
        }
    }
}

/// The party in whichever formation the scenario uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Party {
    Pairs(Group),
    Conga(Vec<Entity>),
}

impl Party {
    /// Line up (or pair up) the roster for a formation.
    pub fn form(config: &ScenarioConfig) -> Result<Self> {
        match &config.formation {
            Formation::Pairs => Ok(Party::Pairs(Group::from_roster(
                &config.roster,
                &config.layout,
            )?)),
            Formation::Conga {
                conga_direction, ..
            } => {
                let center = (config.roster.len() as f32 - 1.0) / 2.0;
                let entities = entity::build_roster(&config.roster, |i| {
                    ((i as f32 - center) / 2.0) * *conga_direction
                });
                if entities.len() != entity::PARTY_SIZE {
                    return Err(DothError::PartySize {
                        found: entities.len(),
                        expected: entity::PARTY_SIZE,
                    });
                }
                Ok(Party::Conga(entities))
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        match self {
            Party::Pairs(group) => group.entities(),
            Party::Conga(entities) => entities,
        }
    }

    fn entities_mut(&mut self) -> &mut [Entity] {
        match self {
            Party::Pairs(group) => group.entities_mut(),
            Party::Conga(entities) => entities,
        }
    }

    pub fn group(&self) -> Option<&Group> {
        match self {
            Party::Pairs(group) => Some(group),
            Party::Conga(_) => None,
        }
    }

    fn set_positions(&mut self, moves: &[Move]) {
        let entities = self.entities_mut();
        for m in moves {
            if let Some(e) = entities.get_mut(m.entity.index()) {
                e.position = m.target;
            }
        }
    }
}

/// Runs cycles of a scenario against a renderer.
pub struct ScenarioDriver<S> {
    config: ScenarioConfig,
    party: Party,
    selector: S,
    phase: CyclePhase,
    cycles_done: u32,
    intro_played: bool,
    scatter_rng: StdRng,
}

impl ScenarioDriver<ScriptedSelector> {
    /// Driver using the selector the config describes.
    pub fn from_config(config: ScenarioConfig) -> Result<Self> {
        let selector = config.selector();
        Self::new(config, selector)
    }
}

impl<S: AfflictionSelector> ScenarioDriver<S> {
    pub fn new(config: ScenarioConfig, selector: S) -> Result<Self> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(DothError::InvalidConfig(errors));
        }
        let party = Party::form(&config)?;
        let scatter_rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            party,
            selector,
            phase: CyclePhase::Entering,
            cycles_done: 0,
            intro_played: false,
            scatter_rng,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Phase the next [`step`](Self::step) will run.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn cycles_done(&self) -> u32 {
        self.cycles_done
    }

    pub fn is_finished(&self) -> bool {
        self.cycles_done >= self.config.loops
    }

    /// Play the intro frame, if the scenario has one.
    ///
    /// Boss, title and every player on their home spot with the demo doom
    /// set go out as one batch, then all of it fades out and the flags are
    /// cleared. Returns false without drawing anything when there is no
    /// intro, it already played, or the first cycle has started.
    pub fn intro<R: SceneRenderer>(&mut self, renderer: &mut R) -> Result<bool> {
        let Some(intro) = &self.config.intro else {
            return Ok(false);
        };
        if self.intro_played || self.cycles_done > 0 || self.phase != CyclePhase::Entering {
            return Ok(false);
        }
        log::info!("{}: intro \"{}\"", self.config.name, intro.title);

        let selection: Vec<_> = intro.afflicted.iter().map(|&i| EntityId(i)).collect();
        entity::apply_afflictions(self.party.entities_mut(), &selection)?;
        let homes: Vec<_> = self
            .party
            .entities()
            .iter()
            .map(|e| Move {
                entity: e.id,
                target: e.home,
            })
            .collect();
        self.party.set_positions(&homes);

        renderer.place(Drawable::Title, Vec2::ZERO);
        renderer.fade_in(Drawable::Title);
        renderer.place(Drawable::Boss, BOSS_POSITION);
        renderer.fade_in(Drawable::Boss);
        for e in self.party.entities() {
            renderer.place(Drawable::Entity(e.id), e.home);
            renderer.fade_in(Drawable::Entity(e.id));
            if e.afflicted {
                renderer.place(Drawable::DoomMarker(e.id), e.home);
                renderer.fade_in(Drawable::DoomMarker(e.id));
            }
        }
        renderer.commit();

        renderer.fade_out(Drawable::Title);
        renderer.fade_out(Drawable::Boss);
        for e in self.party.entities() {
            renderer.fade_out(Drawable::Entity(e.id));
        }
        for id in &selection {
            renderer.fade_out(Drawable::DoomMarker(*id));
        }
        renderer.commit();

        entity::clear_afflictions(self.party.entities_mut());
        self.intro_played = true;
        Ok(true)
    }

    /// Fresh context for the next cycle.
    pub fn begin_cycle(&self) -> CycleContext {
        CycleContext::new(self.cycles_done)
    }

    /// Run the current phase and advance.
    ///
    /// On error the cycle is rolled back: exchanges are undone, doom is
    /// cleared and the next step starts a fresh `Entering`.
    pub fn step<R: SceneRenderer>(
        &mut self,
        mut ctx: CycleContext,
        renderer: &mut R,
    ) -> Result<CycleContext> {
        if self.is_finished() {
            return Err(DothError::ScenarioFinished(self.cycles_done));
        }
        let phase = self.phase;
        log::debug!("cycle {}: {:?}", ctx.cycle, phase);
        let outcome = match phase {
            CyclePhase::Entering => {
                self.enter(renderer);
                Ok(())
            }
            CyclePhase::AfflictionApplied => self.apply_doom(&mut ctx, renderer),
            CyclePhase::Reassigned => self.doom_shift(&mut ctx, renderer),
            CyclePhase::Relocated => self.relocate(&mut ctx, renderer),
            CyclePhase::Resolved => {
                self.resolve(&mut ctx, renderer);
                Ok(())
            }
            CyclePhase::Reset => self.reset(&ctx, renderer),
        };
        if let Err(e) = outcome {
            log::warn!("cycle {}: {:?} failed, rolling back: {}", ctx.cycle, phase, e);
            self.abort_cycle(&ctx, phase);
            return Err(e);
        }
        ctx.completed.push(phase);
        self.phase = phase.next();
        Ok(ctx)
    }

    /// Run every phase of one cycle.
    pub fn run_cycle<R: SceneRenderer>(&mut self, renderer: &mut R) -> Result<CycleContext> {
        let mut ctx = self.begin_cycle();
        log::info!("{}: cycle {} begins", self.config.name, ctx.cycle + 1);
        loop {
            ctx = self.step(ctx, renderer)?;
            if self.phase == CyclePhase::Entering {
                break;
            }
        }
        log::info!(
            "{}: cycle {} done, {} exchange(s)",
            self.config.name,
            ctx.cycle + 1,
            ctx.exchanges.len()
        );
        Ok(ctx)
    }

    /// Run the remaining cycles.
    pub fn run<R: SceneRenderer>(&mut self, renderer: &mut R) -> Result<Vec<CycleContext>> {
        self.intro(renderer)?;
        let mut reports = Vec::new();
        while !self.is_finished() {
            reports.push(self.run_cycle(renderer)?);
        }
        Ok(reports)
    }

    fn enter<R: SceneRenderer>(&mut self, renderer: &mut R) {
        let mut scattered = Vec::with_capacity(entity::PARTY_SIZE);
        for e in self.party.entities() {
            let spot = Vec2::new(
                self.scatter_rng.gen_range(-SCATTER..SCATTER),
                self.scatter_rng.gen_range(-SCATTER..SCATTER),
            );
            scattered.push(Move {
                entity: e.id,
                target: spot,
            });
        }
        for m in &scattered {
            renderer.place(Drawable::Entity(m.entity), m.target);
            renderer.fade_in(Drawable::Entity(m.entity));
        }
        renderer.commit();
        self.party.set_positions(&scattered);

        renderer.place(Drawable::Boss, BOSS_POSITION);
        renderer.fade_in(Drawable::Boss);
        renderer.commit();

        let homes: Vec<_> = self
            .party
            .entities()
            .iter()
            .map(|e| Move {
                entity: e.id,
                target: e.home,
            })
            .collect();
        renderer.animate_moves(&homes);
        renderer.commit();
        self.party.set_positions(&homes);
    }

    fn apply_doom<R: SceneRenderer>(
        &mut self,
        ctx: &mut CycleContext,
        renderer: &mut R,
    ) -> Result<()> {
        let selection = self.selector.select(ctx.cycle, self.party.entities());
        entity::apply_afflictions(self.party.entities_mut(), &selection)?;
        log::debug!("cycle {}: doom on {:?}", ctx.cycle, selection);

        for id in &selection {
            let position = self.party.entities()[id.index()].position;
            renderer.place(Drawable::DoomMarker(*id), position);
            renderer.fade_in(Drawable::DoomMarker(*id));
        }
        renderer.commit();
        ctx.afflicted = selection;
        Ok(())
    }

    fn doom_shift<R: SceneRenderer>(
        &mut self,
        ctx: &mut CycleContext,
        renderer: &mut R,
    ) -> Result<()> {
        let moves = match (&mut self.party, &self.config.formation) {
            (Party::Pairs(group), _) => assignment::reassign(group, &mut ctx.exchanges)?,
            (Party::Conga(entities), Formation::Conga { doom_direction, .. }) => {
                let step = CONGA_STEP * *doom_direction;
                entities
                    .iter()
                    .map(|e| Move {
                        entity: e.id,
                        target: if e.afflicted {
                            e.position + step
                        } else {
                            e.position - step
                        },
                    })
                    .collect()
            }
            (Party::Conga(_), Formation::Pairs) => Vec::new(),
        };

        self.animate_with_markers(&moves, renderer);
        ctx.shifts = moves;
        Ok(())
    }

    fn relocate<R: SceneRenderer>(
        &mut self,
        ctx: &mut CycleContext,
        renderer: &mut R,
    ) -> Result<()> {
        let placements = match (&self.party, self.config.strategy) {
            (Party::Pairs(group), SpotStrategy::ByPair) => {
                safe_spots::assign_by_pair(group, &self.config.spots, &self.config.layout)?
            }
            (party, _) => safe_spots::assign_in_roster_order(
                party.entities(),
                &self.config.spots,
                &self.config.layout,
            )?,
        };
        let moves: Vec<_> = placements.iter().map(Placement::as_move).collect();
        self.animate_with_markers(&moves, renderer);
        ctx.placements = placements;
        Ok(())
    }

    fn resolve<R: SceneRenderer>(&mut self, ctx: &mut CycleContext, renderer: &mut R) {
        let puddles: Vec<_> = self
            .party
            .entities()
            .iter()
            .filter(|e| !e.afflicted)
            .enumerate()
            .map(|(i, e)| Puddle {
                id: i as u8,
                owner: e.id,
                center: e.position,
                radius: PUDDLE_RADIUS,
            })
            .collect();
        for p in &puddles {
            renderer.place(Drawable::Puddle(p.id), p.center);
            renderer.fade_in(Drawable::Puddle(p.id));
        }
        renderer.commit();
        ctx.puddles = puddles;
    }

    fn reset<R: SceneRenderer>(&mut self, ctx: &CycleContext, renderer: &mut R) -> Result<()> {
        renderer.fade_out(Drawable::Boss);
        for e in self.party.entities() {
            renderer.fade_out(Drawable::Entity(e.id));
        }
        for id in &ctx.afflicted {
            renderer.fade_out(Drawable::DoomMarker(*id));
        }
        for p in &ctx.puddles {
            renderer.fade_out(Drawable::Puddle(p.id));
        }
        renderer.commit();

        entity::clear_afflictions(self.party.entities_mut());
        if let Party::Pairs(group) = &mut self.party {
            group.undo(&ctx.exchanges)?;
        }
        self.cycles_done += 1;
        Ok(())
    }

    /// Put the party back into its between-cycles state after a failed step.
    ///
    /// A failed Reset has already replayed the undo log.
    fn abort_cycle(&mut self, ctx: &CycleContext, failed: CyclePhase) {
        entity::clear_afflictions(self.party.entities_mut());
        if failed == CyclePhase::Reset {
            self.phase = CyclePhase::Entering;
            return;
        }
        if let Party::Pairs(group) = &mut self.party {
            if let Err(e) = group.undo(&ctx.exchanges) {
                log::error!("cycle {}: undo failed: {}", ctx.cycle, e);
            }
        }
        self.phase = CyclePhase::Entering;
    }

    /// Animate entity moves, dragging doom markers along, as one batch.
    fn animate_with_markers<R: SceneRenderer>(&mut self, moves: &[Move], renderer: &mut R) {
        if moves.is_empty() {
            return;
        }
        renderer.animate_moves(moves);
        for m in moves {
            if self.party.entities()[m.entity.index()].afflicted {
                renderer.animate_move(Drawable::DoomMarker(m.entity), m.target);
            }
        }
        renderer.commit();
        self.party.set_positions(moves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preset;
    use crate::renderer::{NullRenderer, RecordingRenderer, RenderCommand};

    fn scripted(script: Vec<[u8; 4]>) -> impl FnMut(u32, &[Entity]) -> Vec<EntityId> {
        move |cycle: u32, _: &[Entity]| {
            script[cycle as usize % script.len()]
                .iter()
                .map(|&i| EntityId(i))
                .collect()
        }
    }

    #[test]
    fn phases_run_in_order() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[1, 2, 3, 6]])).unwrap();
        let mut renderer = NullRenderer;

        let mut ctx = driver.begin_cycle();
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(driver.phase());
            ctx = driver.step(ctx, &mut renderer).unwrap();
        }
        assert_eq!(seen, CyclePhase::ORDER);
        assert_eq!(ctx.completed, CyclePhase::ORDER);
        assert_eq!(driver.phase(), CyclePhase::Entering);
        assert_eq!(driver.cycles_done(), 1);
    }

    #[test]
    fn step_after_last_loop_fails() {
        let mut config = preset("victalis").unwrap();
        config.seed = Some(9);
        let mut driver = ScenarioDriver::from_config(config).unwrap();
        driver.run(&mut NullRenderer).unwrap();
        let err = driver
            .step(driver.begin_cycle(), &mut NullRenderer)
            .unwrap_err();
        assert_eq!(err, DothError::ScenarioFinished(1));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = preset("chobi").unwrap();
        config.loops = 0;
        let err = ScenarioDriver::from_config(config).err().unwrap();
        assert!(matches!(err, DothError::InvalidConfig(_)));
    }

    #[test]
    fn bad_selection_fails_fast() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, |_: u32, _: &[Entity]| {
            vec![EntityId(0), EntityId(1), EntityId(2)]
        })
        .unwrap();
        let err = driver.run_cycle(&mut NullRenderer).unwrap_err();
        assert_eq!(
            err,
            DothError::InvalidAfflictionState {
                afflicted: 3,
                expected: 4
            }
        );
    }

    #[test]
    fn failed_step_rolls_back_to_entering() {
        let config = preset("chobi").unwrap();
        let mut calls = 0;
        let selector = move |_: u32, _: &[Entity]| {
            calls += 1;
            if calls == 1 {
                vec![EntityId(0), EntityId(1), EntityId(2)]
            } else {
                vec![EntityId(4), EntityId(5), EntityId(6), EntityId(7)]
            }
        };
        let mut driver = ScenarioDriver::new(config, selector).unwrap();

        assert!(driver.run_cycle(&mut NullRenderer).is_err());
        assert_eq!(driver.phase(), CyclePhase::Entering);
        assert_eq!(driver.cycles_done(), 0);
        assert_eq!(entity::afflicted_count(driver.party().entities()), 0);

        let ctx = driver.run_cycle(&mut NullRenderer).unwrap();
        assert_eq!(ctx.completed, CyclePhase::ORDER);
        assert_eq!(driver.cycles_done(), 1);
    }

    #[test]
    fn abort_after_shift_undoes_exchanges() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[4, 5, 6, 7]])).unwrap();
        let initial = driver.party().clone();

        let mut ctx = driver.begin_cycle();
        for _ in 0..3 {
            ctx = driver.step(ctx, &mut NullRenderer).unwrap();
        }
        assert_eq!(ctx.exchanges.len(), 2);
        assert_eq!(driver.phase(), CyclePhase::Relocated);

        driver.abort_cycle(&ctx, CyclePhase::Relocated);
        assert_eq!(driver.phase(), CyclePhase::Entering);
        let group = driver.party().group().unwrap();
        let start = initial.group().unwrap();
        assert_eq!(group.pairing(), start.pairing());
        for (now, then) in group.entities().iter().zip(start.entities()) {
            assert_eq!(now.home, then.home);
            assert!(!now.afflicted);
        }
    }

    #[test]
    fn intro_is_the_first_batch() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[0, 2, 5, 7]])).unwrap();
        let initial = driver.party().clone();
        let mut renderer = RecordingRenderer::new();

        assert!(driver.intro(&mut renderer).unwrap());
        let shown = &renderer.batches()[0];
        assert!(shown.contains(&RenderCommand::FadeIn {
            drawable: Drawable::Title
        }));
        for e in initial.entities() {
            assert!(shown.contains(&RenderCommand::Place {
                drawable: Drawable::Entity(e.id),
                position: e.home,
            }));
        }
        let markers: Vec<_> = shown
            .iter()
            .filter_map(|c| match c {
                RenderCommand::FadeIn {
                    drawable: Drawable::DoomMarker(id),
                } => Some(id.0),
                _ => None,
            })
            .collect();
        assert_eq!(markers, [1, 2, 3, 6]);
        assert!(renderer.batches()[1]
            .iter()
            .all(|c| matches!(c, RenderCommand::FadeOut { .. })));

        assert_eq!(driver.party(), &initial);
        assert_eq!(driver.phase(), CyclePhase::Entering);
        assert!(!driver.intro(&mut renderer).unwrap());
        assert_eq!(renderer.batches().len(), 2);
    }

    #[test]
    fn run_plays_intro_before_first_cycle() {
        let mut config = preset("chobi").unwrap();
        config.seed = Some(4);
        let mut driver = ScenarioDriver::from_config(config).unwrap();
        let mut renderer = RecordingRenderer::new();
        driver.run(&mut renderer).unwrap();
        assert_eq!(renderer.batches()[0][0].drawable(), Drawable::Title);
        let titles = renderer
            .commands()
            .filter(|c| c.drawable() == Drawable::Title)
            .count();
        assert_eq!(titles, 3);
    }

    #[test]
    fn intro_is_skipped_without_config_or_once_started() {
        let config = preset("maxwell").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[0, 2, 4, 6]])).unwrap();
        let mut renderer = RecordingRenderer::new();
        assert!(!driver.intro(&mut renderer).unwrap());
        assert!(renderer.batches().is_empty());

        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[0, 2, 4, 6]])).unwrap();
        driver.run_cycle(&mut NullRenderer).unwrap();
        assert!(!driver.intro(&mut renderer).unwrap());
        assert!(renderer.batches().is_empty());
    }

    #[test]
    fn pair_cycle_balances_and_resets() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[4, 5, 6, 7]])).unwrap();
        let initial = driver.party().clone();
        let mut renderer = RecordingRenderer::new();

        let mut ctx = driver.begin_cycle();
        for _ in 0..3 {
            ctx = driver.step(ctx, &mut renderer).unwrap();
        }
        let group = driver.party().group().unwrap();
        assert!(group.is_balanced());
        assert_eq!(ctx.exchanges.len(), 2);
        assert_eq!(ctx.shifts.len(), 4);

        for _ in 0..3 {
            ctx = driver.step(ctx, &mut renderer).unwrap();
        }
        assert_eq!(ctx.placements.len(), 8);
        assert_eq!(ctx.puddles.len(), 4);
        let group = driver.party().group().unwrap();
        assert_eq!(group.pairing(), initial.group().unwrap().pairing());
        assert_eq!(entity::afflicted_count(group.entities()), 0);
    }

    #[test]
    fn players_end_on_their_safe_spots() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[0, 1, 4, 5]])).unwrap();
        let mut renderer = RecordingRenderer::new();
        let ctx = driver.run_cycle(&mut renderer).unwrap();

        for p in &ctx.placements {
            assert_eq!(
                renderer.last_position(Drawable::Entity(p.entity)),
                Some(p.target)
            );
        }
        for puddle in &ctx.puddles {
            assert!(puddle.covers(puddle.center));
            assert!(!ctx.afflicted.contains(&puddle.owner));
        }
    }

    #[test]
    fn doom_markers_follow_their_players() {
        let config = preset("chobi").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[2, 3, 4, 6]])).unwrap();
        let mut renderer = RecordingRenderer::new();
        let ctx = driver.run_cycle(&mut renderer).unwrap();

        for id in &ctx.afflicted {
            assert_eq!(
                renderer.last_position(Drawable::DoomMarker(*id)),
                renderer.last_position(Drawable::Entity(*id))
            );
        }
    }

    #[test]
    fn conga_shift_steps_along_doom_direction() {
        let config = preset("maxwell").unwrap();
        let mut driver = ScenarioDriver::new(config, scripted(vec![[0, 2, 4, 6]])).unwrap();
        let mut ctx = driver.begin_cycle();
        for _ in 0..3 {
            ctx = driver.step(ctx, &mut NullRenderer).unwrap();
        }
        assert!(ctx.exchanges.is_empty());
        assert_eq!(ctx.shifts.len(), 8);

        let entities = driver.party().entities();
        // Maxwell steps doom south.
        assert!(entities[0].position.y < 0.0);
        assert!(entities[1].position.y > 0.0);
    }

    #[test]
    fn conga_line_is_centred() {
        let config = preset("maxwell").unwrap();
        let party = Party::form(&config).unwrap();
        let entities = party.entities();
        let first = entities[0].home;
        let last = entities[7].home;
        assert!((first.x + last.x).abs() < 1e-5);
        assert!(first.x < last.x);
        assert!(party.group().is_none());
    }

    #[test]
    fn every_batch_is_committed() {
        let mut config = preset("bien").unwrap();
        config.seed = Some(5);
        config.loops = 2;
        let mut driver = ScenarioDriver::from_config(config).unwrap();
        let mut renderer = RecordingRenderer::new();
        driver.run(&mut renderer).unwrap();

        // enter (3) + doom + shift + relocate + puddles + reset, per cycle
        assert_eq!(renderer.batches().len(), 2 * 8);
        let fades_out = renderer
            .commands()
            .filter(|c| matches!(c, RenderCommand::FadeOut { .. }))
            .count();
        // boss + 8 players + 4 markers + 4 puddles
        assert_eq!(fades_out, 2 * 17);
    }
}
