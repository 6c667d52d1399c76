//! Moving entities sharing one position record.

use maze_chase_core::{EntityId, EntitySnapshot, GhostId, GhostMode, Heading, Point, Rect};

/// Discriminates the player from the ghosts; ghosts carry their mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorKind {
    Player,
    Ghost { id: GhostId, mode: GhostMode },
}

/// Position, extent and headings of a player or ghost.
#[derive(Clone, Debug)]
pub(crate) struct Actor {
    pub(crate) kind: ActorKind,
    pub(crate) position: Point,
    pub(crate) spawn: Point,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) heading: Option<Heading>,
    pub(crate) desired: Option<Heading>,
}

impl Actor {
    pub(crate) fn player(spawn: Point, size: f32) -> Self {
        Self::spawned(ActorKind::Player, spawn, size)
    }

    pub(crate) fn ghost(id: GhostId, spawn: Point, size: f32) -> Self {
        Self::spawned(
            ActorKind::Ghost {
                id,
                mode: GhostMode::Normal,
            },
            spawn,
            size,
        )
    }

    fn spawned(kind: ActorKind, spawn: Point, size: f32) -> Self {
        Self {
            kind,
            position: spawn,
            spawn,
            width: size,
            height: size,
            heading: None,
            desired: None,
        }
    }

    pub(crate) fn id(&self) -> EntityId {
        match self.kind {
            ActorKind::Player => EntityId::Player,
            ActorKind::Ghost { id, .. } => EntityId::Ghost(id),
        }
    }

    pub(crate) fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player)
    }

    pub(crate) fn ghost_id(&self) -> Option<GhostId> {
        match self.kind {
            ActorKind::Ghost { id, .. } => Some(id),
            ActorKind::Player => None,
        }
    }

    pub(crate) fn mode(&self) -> Option<GhostMode> {
        match self.kind {
            ActorKind::Ghost { mode, .. } => Some(mode),
            ActorKind::Player => None,
        }
    }

    /// Changes the ghost mode; the player has none and is left untouched.
    pub(crate) fn set_mode(&mut self, next: GhostMode) {
        if let ActorKind::Ghost { mode, .. } = &mut self.kind {
            *mode = next;
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::at(self.position, self.width, self.height)
    }

    /// Velocity implied by the heading, in world units per second.
    ///
    /// Always axis-aligned: exactly one component equals `speed`, or both are
    /// zero when the actor has no heading.
    pub(crate) fn velocity(&self, speed: f32) -> Point {
        match self.heading {
            Some(heading) => Point::default().offset(heading, speed),
            None => Point::default(),
        }
    }

    /// Moves the actor back to its spawn, forgetting headings and mode.
    pub(crate) fn reset(&mut self) {
        self.position = self.spawn;
        self.heading = None;
        self.desired = None;
        self.set_mode(GhostMode::Normal);
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id(),
            bounds: self.bounds(),
            heading: self.heading,
            mode: self.mode(),
        }
    }
}
