//! Collision and movement engine shared by the player and the ghosts.

use maze_chase_core::{Heading, Point, Rect};

use crate::{
    actor::Actor,
    maze::{EdgePolicy, Maze},
};

/// Result of advancing a single actor through one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Motion {
    /// Heading adopted from the queued request this tick.
    pub(crate) committed: Option<Heading>,
    /// Whether a wall stopped the actor short of its full displacement.
    pub(crate) blocked: bool,
    /// Whether the actor crossed the tunnel to the opposite edge.
    pub(crate) wrapped: bool,
}

/// Advances the actor by `speed × dt` along its heading.
///
/// The queued heading is committed first when the actor sits close enough to
/// a tile centre. The displacement is walked in sub-steps of at most half a
/// tile, and the first sub-step that would overlap a wall is clamped flush
/// against the obstacle. Actors moving under [`EdgePolicy::Tunnel`] wrap
/// horizontally once they leave the playfield by more than their own width.
pub(crate) fn advance(
    actor: &mut Actor,
    maze: &Maze,
    speed: f32,
    dt: f32,
    tolerance: f32,
    edges: EdgePolicy,
) -> Motion {
    let distance = speed * dt;
    let committed = try_commit(actor, maze, tolerance.max(distance * 0.5), edges);

    let Some(heading) = actor.heading else {
        return Motion {
            committed,
            ..Motion::default()
        };
    };

    let max_step = maze.tile_size() * 0.5;
    let steps = (distance.abs() / max_step).ceil().max(1.0) as u32;
    let step_dt = dt / steps as f32;
    let velocity = actor.velocity(speed);

    let mut blocked = false;
    for _ in 0..steps {
        let previous = actor.position;
        let tentative = Point::new(
            previous.x + velocity.x * step_dt,
            previous.y + velocity.y * step_dt,
        );
        if maze.is_wall_at(Rect::at(tentative, actor.width, actor.height), edges) {
            blocked = true;
            actor.position = clamp_to_obstacle(actor, maze, previous, tentative, heading, edges);
            if actor.is_player() && actor.desired.is_none() {
                actor.heading = None;
            }
            break;
        }
        actor.position = tentative;
    }

    let wrapped = edges == EdgePolicy::Tunnel && wrap_horizontally(actor, maze.width());

    Motion {
        committed,
        blocked,
        wrapped,
    }
}

/// Commits the queued heading when the actor is centred on a tile and the
/// neighbouring tile in that heading is open.
///
/// On success the actor snaps onto the tile so it keeps travelling exactly
/// along the corridor.
pub(crate) fn try_commit(
    actor: &mut Actor,
    maze: &Maze,
    tolerance: f32,
    edges: EdgePolicy,
) -> Option<Heading> {
    let desired = actor.desired?;
    if actor.heading == Some(desired) {
        actor.desired = None;
        return None;
    }

    let aligned = aligned_position(actor, maze, tolerance)?;
    let probe = Rect::at(aligned, actor.width, actor.height).shifted(desired, maze.tile_size());
    if maze.is_wall_at(probe, edges) {
        return None;
    }

    actor.position = aligned;
    actor.heading = Some(desired);
    actor.desired = None;
    Some(desired)
}

/// Tile-aligned position of the actor, if its centre lies within
/// `tolerance` of the centre of the tile it occupies.
pub(crate) fn aligned_position(actor: &Actor, maze: &Maze, tolerance: f32) -> Option<Point> {
    let tile = maze.tile_size();
    let center = actor.bounds().center();
    let tile_center = Point::new(
        ((center.x / tile).floor() + 0.5) * tile,
        ((center.y / tile).floor() + 0.5) * tile,
    );

    if (center.x - tile_center.x).abs() > tolerance || (center.y - tile_center.y).abs() > tolerance
    {
        return None;
    }

    Some(Point::new(
        tile_center.x - actor.width * 0.5,
        tile_center.y - actor.height * 0.5,
    ))
}

/// Position flush against the wall hit by a sub-step from `previous` to
/// `tentative`. Sub-steps never exceed half a tile, so the tile under the
/// leading edge is the first blocking one.
fn clamp_to_obstacle(
    actor: &Actor,
    maze: &Maze,
    previous: Point,
    tentative: Point,
    heading: Heading,
    edges: EdgePolicy,
) -> Point {
    let tile = maze.tile_size();
    let flush = match heading {
        Heading::Right => Point::new(
            (((tentative.x + actor.width) / tile).floor() * tile - actor.width)
                .clamp(previous.x, tentative.x),
            previous.y,
        ),
        Heading::Left => Point::new(
            ((tentative.x / tile).ceil() * tile).clamp(tentative.x, previous.x),
            previous.y,
        ),
        Heading::Down => Point::new(
            previous.x,
            (((tentative.y + actor.height) / tile).floor() * tile - actor.height)
                .clamp(previous.y, tentative.y),
        ),
        Heading::Up => Point::new(
            previous.x,
            ((tentative.y / tile).ceil() * tile).clamp(tentative.y, previous.y),
        ),
    };

    if maze.is_wall_at(Rect::at(flush, actor.width, actor.height), edges) {
        previous
    } else {
        flush
    }
}

fn wrap_horizontally(actor: &mut Actor, playfield_width: f32) -> bool {
    if actor.position.x < -actor.width {
        actor.position.x = playfield_width;
        true
    } else if actor.position.x > playfield_width {
        actor.position.x = -actor.width;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::GhostId;

    const TILE: f32 = 32.0;

    fn corridor() -> Maze {
        Maze::load(&["XXXXX", "XP  X", "XX XX", "XXXXX"], TILE).expect("valid map")
    }

    #[test]
    fn blocked_player_is_clamped_flush_and_stops() {
        let maze = corridor();
        let mut player = Actor::player(Point::new(TILE, TILE), TILE);
        player.heading = Some(Heading::Right);

        let mut trail = Vec::new();
        let mut last = Motion::default();
        for _ in 0..4 {
            last = advance(&mut player, &maze, 20.0, 1.0, 4.0, EdgePolicy::Tunnel);
            trail.push(player.position.x);
        }

        assert_eq!(trail, vec![52.0, 72.0, 92.0, 96.0]);
        assert!(last.blocked);
        assert_eq!(player.heading, None);
        assert!(!maze.is_wall_at(player.bounds(), EdgePolicy::Tunnel));
    }

    #[test]
    fn blocked_ghost_keeps_its_heading() {
        let maze = corridor();
        let mut ghost = Actor::ghost(GhostId::Red, Point::new(3.0 * TILE, TILE), TILE);
        ghost.heading = Some(Heading::Right);

        let motion = advance(&mut ghost, &maze, 20.0, 1.0, 4.0, EdgePolicy::Solid);

        assert!(motion.blocked);
        assert_eq!(ghost.position, Point::new(3.0 * TILE, TILE));
        assert_eq!(ghost.heading, Some(Heading::Right));
    }

    #[test]
    fn queued_turn_waits_for_the_tile_centre() {
        let maze = corridor();
        let mut player = Actor::player(Point::new(TILE, TILE), TILE);
        player.heading = Some(Heading::Right);
        player.desired = Some(Heading::Down);

        let first = advance(&mut player, &maze, 16.0, 1.0, 4.0, EdgePolicy::Tunnel);
        assert_eq!(first.committed, None);
        assert_eq!(player.position, Point::new(48.0, TILE));

        let second = advance(&mut player, &maze, 16.0, 1.0, 4.0, EdgePolicy::Tunnel);
        assert_eq!(second.committed, None);
        assert_eq!(player.position, Point::new(64.0, TILE));

        let third = advance(&mut player, &maze, 16.0, 1.0, 4.0, EdgePolicy::Tunnel);
        assert_eq!(third.committed, Some(Heading::Down));
        assert_eq!(player.heading, Some(Heading::Down));
        assert_eq!(player.position, Point::new(64.0, 48.0));
    }

    #[test]
    fn turn_into_a_wall_is_not_committed() {
        let maze = corridor();
        let mut player = Actor::player(Point::new(TILE, TILE), TILE);
        player.desired = Some(Heading::Up);

        let motion = advance(&mut player, &maze, 16.0, 1.0, 4.0, EdgePolicy::Tunnel);

        assert_eq!(motion, Motion::default());
        assert_eq!(player.desired, Some(Heading::Up));
        assert_eq!(player.position, Point::new(TILE, TILE));
    }

    #[test]
    fn aligned_position_snaps_within_tolerance() {
        let maze = corridor();
        let mut player = Actor::player(Point::new(35.0, TILE), TILE);
        assert_eq!(
            aligned_position(&player, &maze, 4.0),
            Some(Point::new(TILE, TILE))
        );
        player.position.x = 40.0;
        assert_eq!(aligned_position(&player, &maze, 4.0), None);
    }

    #[test]
    fn coarse_tick_stops_at_the_first_wall() {
        let maze = Maze::load(&["XXXXXXXX", "XP-X-- X", "XXXXXXXX"], TILE).expect("valid map");
        let mut player = Actor::player(Point::new(TILE, TILE), TILE);
        player.heading = Some(Heading::Right);

        let motion = advance(&mut player, &maze, 128.0, 0.75, 4.0, EdgePolicy::Tunnel);

        assert!(motion.blocked);
        assert_eq!(player.position, Point::new(2.0 * TILE, TILE));
        assert!(!maze.is_wall_at(player.bounds(), EdgePolicy::Tunnel));
    }

    #[test]
    fn coarse_tick_crosses_open_floor_before_clamping() {
        let maze = Maze::load(&["XXXXXXXX", "XP-X-- X", "XXXXXXXX"], TILE).expect("valid map");
        let mut ghost = Actor::ghost(GhostId::Red, Point::new(TILE, TILE), TILE);
        ghost.heading = Some(Heading::Right);

        let motion = advance(&mut ghost, &maze, 64.0, 1.0, 4.0, EdgePolicy::Solid);

        assert!(motion.blocked);
        assert_eq!(ghost.position, Point::new(2.0 * TILE, TILE));
        assert_eq!(ghost.heading, Some(Heading::Right));
    }

    #[test]
    fn player_wraps_through_the_tunnel() {
        let maze = Maze::load(&["XXXXX", "-P- -", "XXXXX"], TILE).expect("valid map");
        let mut player = Actor::player(Point::new(-TILE, TILE), TILE);
        player.heading = Some(Heading::Left);

        let motion = advance(&mut player, &maze, 8.0, 1.0, 4.0, EdgePolicy::Tunnel);

        assert!(motion.wrapped);
        assert_eq!(player.position, Point::new(maze.width(), TILE));
    }
}
