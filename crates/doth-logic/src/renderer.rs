//! The scene-renderer seam.
//!
//! The driver never draws anything itself. It issues placement, move and
//! fade requests against a [`SceneRenderer`]; requests issued between two
//! [`SceneRenderer::commit`] calls belong to one simultaneous batch.
//! [`RecordingRenderer`] keeps the requests as a serializable timeline so
//! a real renderer can replay them later.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Move};
use crate::geometry::Vec2;

/// Anything the renderer can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Drawable {
    /// A player sprite.
    Entity(EntityId),
    /// The doom overlay attached to a player.
    DoomMarker(EntityId),
    /// The boss sprite and its target ring.
    Boss,
    /// A cleanse puddle, numbered within its cycle.
    Puddle(u8),
    /// The scenario title on the intro frame.
    Title,
}

/// Backend that turns choreography requests into pixels.
pub trait SceneRenderer {
    /// Put a drawable at a position without animating.
    fn place(&mut self, drawable: Drawable, position: Vec2);
    /// Animate a drawable to a position.
    fn animate_move(&mut self, drawable: Drawable, position: Vec2);
    fn fade_in(&mut self, drawable: Drawable);
    fn fade_out(&mut self, drawable: Drawable);
    /// Close the current batch of simultaneous requests.
    fn commit(&mut self) {}

    /// Animate a batch of entity moves together.
    fn animate_moves(&mut self, moves: &[Move]) {
        for m in moves {
            self.animate_move(Drawable::Entity(m.entity), m.target);
        }
    }
}

/// One renderer request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    Place { drawable: Drawable, position: Vec2 },
    Move { drawable: Drawable, position: Vec2 },
    FadeIn { drawable: Drawable },
    FadeOut { drawable: Drawable },
}

impl RenderCommand {
    pub fn drawable(&self) -> Drawable {
        match *self {
            RenderCommand::Place { drawable, .. }
            | RenderCommand::Move { drawable, .. }
            | RenderCommand::FadeIn { drawable }
            | RenderCommand::FadeOut { drawable } => drawable,
        }
    }
}

/// Renderer that records every request, grouped into committed batches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingRenderer {
    batches: Vec<Vec<RenderCommand>>,
    #[serde(skip)]
    pending: Vec<RenderCommand>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed batches, oldest first.
    pub fn batches(&self) -> &[Vec<RenderCommand>] {
        &self.batches
    }

    /// Every committed command, flattened.
    pub fn commands(&self) -> impl DoubleEndedIterator<Item = &RenderCommand> {
        self.batches.iter().flatten()
    }

    /// Last committed position of each drawable that was placed or moved.
    pub fn last_position(&self, drawable: Drawable) -> Option<Vec2> {
        self.commands()
            .rev()
            .filter(|c| c.drawable() == drawable)
            .find_map(|c| match *c {
                RenderCommand::Place { position, .. } | RenderCommand::Move { position, .. } => {
                    Some(position)
                }
                _ => None,
            })
    }

    fn push(&mut self, command: RenderCommand) {
        self.pending.push(command);
    }
}

impl SceneRenderer for RecordingRenderer {
    fn place(&mut self, drawable: Drawable, position: Vec2) {
        self.push(RenderCommand::Place { drawable, position });
    }

    fn animate_move(&mut self, drawable: Drawable, position: Vec2) {
        self.push(RenderCommand::Move { drawable, position });
    }

    fn fade_in(&mut self, drawable: Drawable) {
        self.push(RenderCommand::FadeIn { drawable });
    }

    fn fade_out(&mut self, drawable: Drawable) {
        self.push(RenderCommand::FadeOut { drawable });
    }

    fn commit(&mut self) {
        if !self.pending.is_empty() {
            self.batches.push(std::mem::take(&mut self.pending));
        }
    }
}

/// Renderer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl SceneRenderer for NullRenderer {
    fn place(&mut self, _drawable: Drawable, _position: Vec2) {}
    fn animate_move(&mut self, _drawable: Drawable, _position: Vec2) {}
    fn fade_in(&mut self, _drawable: Drawable) {}
    fn fade_out(&mut self, _drawable: Drawable) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_groups_requests() {
        let mut r = RecordingRenderer::new();
        r.fade_in(Drawable::Boss);
        r.fade_in(Drawable::Entity(EntityId(0)));
        r.commit();
        r.commit();
        r.animate_move(Drawable::Entity(EntityId(0)), Vec2::new(1.0, 1.0));
        r.commit();

        assert_eq!(r.batches().len(), 2);
        assert_eq!(r.batches()[0].len(), 2);
        assert_eq!(r.commands().count(), 3);
    }

    #[test]
    fn uncommitted_requests_are_not_visible() {
        let mut r = RecordingRenderer::new();
        r.fade_out(Drawable::Puddle(0));
        assert_eq!(r.commands().count(), 0);
    }

    #[test]
    fn last_position_tracks_moves() {
        let mut r = RecordingRenderer::new();
        let e = Drawable::Entity(EntityId(2));
        r.place(e, Vec2::new(0.0, 0.0));
        r.commit();
        r.animate_moves(&[Move {
            entity: EntityId(2),
            target: Vec2::new(3.0, -1.0),
        }]);
        r.commit();
        assert_eq!(r.last_position(e), Some(Vec2::new(3.0, -1.0)));
        assert_eq!(r.last_position(Drawable::Boss), None);
    }

    #[test]
    fn commands_serialize_with_op_tags() {
        let cmd = RenderCommand::FadeIn {
            drawable: Drawable::DoomMarker(EntityId(5)),
        };
        assert_eq!(cmd.drawable(), Drawable::DoomMarker(EntityId(5)));
        let json = serde_json::to_value(cmd).unwrap();
        assert_eq!(json["op"], "fade_in");
        assert_eq!(json["drawable"]["kind"], "doom_marker");
        assert_eq!(json["drawable"]["id"], 5);
    }
}
