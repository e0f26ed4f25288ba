//! Arena Geometry
//!
//! The playing field for N players is a regular 2N-gon inscribed at 95% of
//! the half-extent of the canvas. Even edges are player walls, odd edges are
//! neutral walls joining them. Each player's paddle track runs parallel to
//! their wall, set back toward the center.

use std::f64::consts::PI;

use crate::core::vec2::{Vec2, EPS};
use crate::game::body::{PlayerId, Segment};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::paddle::{Corner, Paddle};

/// Fraction of the canvas half-extent used for the circumradius.
pub const ARENA_SCALE: f64 = 0.95;

/// Distance kept between powerup spawns and the paddle tracks.
pub const POWERUP_MARGIN: f64 = 160.0;

/// Regular polygon geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Arena {
    /// Polygon center
    pub center: Vec2,
    /// Center-to-vertex distance
    pub circumradius: f64,
    /// Number of edges (twice the player count)
    pub sides: usize,
}

impl Arena {
    /// Polygon for `player_count` players on a `width` x `height` canvas.
    pub fn new(player_count: usize, width: f64, height: f64) -> Self {
        Self {
            center: Vec2::new(width / 2.0, height / 2.0),
            circumradius: ARENA_SCALE * width.min(height) / 2.0,
            sides: player_count * 2,
        }
    }

    /// Angle subtended by one edge.
    #[inline]
    pub fn angle_step(&self) -> f64 {
        2.0 * PI / self.sides as f64
    }

    /// Center-to-edge distance.
    #[inline]
    pub fn apothem(&self) -> f64 {
        self.circumradius * (self.angle_step() / 2.0).cos()
    }

    /// Length of every edge.
    #[inline]
    pub fn edge_length(&self) -> f64 {
        2.0 * self.circumradius * (self.angle_step() / 2.0).sin()
    }

    /// Vertex `i`; edge `i` runs from vertex `i` to vertex `i + 1`.
    pub fn vertex(&self, i: usize) -> Vec2 {
        let step = self.angle_step();
        self.center + Vec2::UP.rotate(i as f64 * step - step / 2.0) * self.circumradius
    }

    /// Endpoints of edge `i`.
    pub fn edge(&self, i: usize) -> (Vec2, Vec2) {
        (self.vertex(i), self.vertex((i + 1) % self.sides))
    }

    /// Unit normal of edge `i` pointing away from the center.
    pub fn outward_normal(&self, i: usize) -> Vec2 {
        Vec2::UP.rotate(i as f64 * self.angle_step())
    }

    /// Whether `point` lies strictly inside the polygon.
    pub fn contains(&self, point: Vec2) -> bool {
        (0..self.sides).all(|i| (point - self.vertex(i)).dot(self.outward_normal(i)) < 0.0)
    }

    /// How a paddle end on edge `edge`'s track approaches the neighbouring
    /// wall when moving along `direction`.
    fn corner(&self, edge: usize, anchor: Vec2, direction: Vec2, half_width: f64, half_thickness: f64) -> Corner {
        let neighbours = [(edge + 1) % self.sides, (edge + self.sides - 1) % self.sides];
        neighbours
            .iter()
            .filter_map(|&k| {
                let normal = self.outward_normal(k);
                let rate = direction.dot(normal);
                if rate <= EPS {
                    return None;
                }
                let reach = (self.vertex(k) - anchor).dot(normal);
                Some(Corner {
                    distance: reach - half_thickness - half_width * rate,
                    rate,
                })
            })
            .min_by(|a, b| a.limit(0.0).total_cmp(&b.limit(0.0)))
            .unwrap_or(Corner::OPEN)
    }
}

/// Walls and paddles built for a player list.
#[derive(Clone, Debug)]
pub struct ArenaLayout {
    /// Polygon geometry
    pub arena: Arena,
    /// Boundary segments in edge order
    pub walls: Vec<Segment>,
    /// One paddle per player, in player order
    pub paddles: Vec<Paddle>,
    /// Radius around the center in which powerups may appear
    pub powerup_spawn_radius: f64,
}

/// Build the field for `players`.
///
/// Player `i` owns edge `2i`. Fails if the paddle would not fit inside the
/// polygon.
pub fn build_arena(players: &[PlayerId], config: &GameConfig) -> Result<ArenaLayout, ConfigError> {
    let arena = Arena::new(players.len(), config.canvas_width, config.canvas_height);
    let apothem = arena.apothem();
    let wall_length = arena.edge_length();
    let half_thickness = config.paddle_height / 2.0;

    if config.paddle_wall_offset + half_thickness >= apothem {
        return Err(ConfigError::InvalidPaddle("paddle track lies outside the arena"));
    }

    let walls = (0..arena.sides)
        .map(|i| {
            let (a, b) = arena.edge(i);
            if i % 2 == 0 {
                Segment::player_wall(a, b, players[i / 2])
            } else {
                Segment::wall(a, b)
            }
        })
        .collect();

    let half_width = config.paddle_width_factor * wall_length / 2.0;
    let travel = (wall_length / 2.0 - half_width - half_thickness).max(0.0);
    let speed = wall_length * config.paddle_speed_factor;

    let paddles = players
        .iter()
        .enumerate()
        .map(|(i, &player)| {
            let normal = arena.outward_normal(2 * i);
            let anchor = arena.center + normal * (apothem - config.paddle_wall_offset);
            let axis = normal.perpendicular();
            let clockwise = arena.corner(2 * i, anchor, axis, half_width, half_thickness);
            let counter_clockwise = arena.corner(2 * i, anchor, -axis, half_width, half_thickness);
            Paddle::new(player, anchor, axis, half_width, half_thickness, travel, speed)
                .with_corners(clockwise, counter_clockwise)
        })
        .collect();

    let powerup_spawn_radius = (apothem - (half_thickness + POWERUP_MARGIN)).max(0.0);

    Ok(ArenaLayout {
        arena,
        walls,
        paddles,
        powerup_spawn_radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::is_nearly;
    use crate::game::body::SegmentKind;
    use crate::game::paddle::corner_clearance;

    #[test]
    fn test_polygon_is_regular() {
        let arena = Arena::new(3, 800.0, 600.0);
        assert_eq!(arena.sides, 6);
        assert!(is_nearly(arena.circumradius, 285.0));
        for i in 0..arena.sides {
            let (a, b) = arena.edge(i);
            assert!(is_nearly(a.distance(arena.center), arena.circumradius));
            assert!(is_nearly(a.distance(b), arena.edge_length()));
            let mid = a.lerp(b, 0.5);
            assert!(is_nearly(mid.distance(arena.center), arena.apothem()));
            let normal = arena.outward_normal(i);
            assert!((mid - arena.center).normalize().distance(normal) < 1e-9);
        }
    }

    #[test]
    fn test_two_players_get_a_square() {
        let layout = build_arena(&[7, 9], &GameConfig::default()).unwrap();
        assert_eq!(layout.walls.len(), 4);
        assert_eq!(layout.walls[0].kind, SegmentKind::PlayerWall(7));
        assert_eq!(layout.walls[1].kind, SegmentKind::Wall);
        assert_eq!(layout.walls[2].kind, SegmentKind::PlayerWall(9));
        assert_eq!(layout.walls[3].kind, SegmentKind::Wall);
    }

    #[test]
    fn test_paddles_sit_inside_their_walls() {
        let config = GameConfig::default();
        let layout = build_arena(&[1, 2, 3, 4], &config).unwrap();
        let apothem = layout.arena.apothem();
        for (i, paddle) in layout.paddles.iter().enumerate() {
            let wall = &layout.walls[2 * i];
            assert_eq!(wall.owner(), Some(paddle.player));
            let depth = paddle.center().distance(layout.arena.center);
            assert!(is_nearly(depth, apothem - config.paddle_wall_offset));
            // Paddle is parallel to its wall
            assert!(is_nearly(paddle.body.direction().cross(wall.direction()), 0.0));
            assert!(paddle.body.length() < wall.length());
        }
    }

    #[test]
    fn test_paddle_offset_must_fit() {
        let config = GameConfig { paddle_wall_offset: 10_000.0, ..GameConfig::default() };
        assert!(matches!(
            build_arena(&[1, 2], &config),
            Err(ConfigError::InvalidPaddle(_))
        ));
    }

    #[test]
    fn test_paddle_travel_stays_on_wall() {
        let config = GameConfig::default();
        let layout = build_arena(&[1, 2, 3, 4, 5, 6, 7, 8], &config).unwrap();
        let wall_half = layout.arena.edge_length() / 2.0;
        for paddle in &layout.paddles {
            let half_width = paddle.body.length() / 2.0;
            assert!(paddle.travel() + half_width + paddle.body.half_thickness <= wall_half + 1e-9);
        }
    }

    #[test]
    fn test_track_end_leaves_corner_gap() {
        let config = GameConfig::default();
        let clearance = corner_clearance(10.0);
        for n in 2..=8u32 {
            let players: Vec<PlayerId> = (1..=n).collect();
            let layout = build_arena(&players, &config).unwrap();
            for (i, paddle) in layout.paddles.iter().enumerate() {
                for direction in [1.0, -1.0] {
                    let mut p = paddle.clone();
                    p.set_clearance(clearance);
                    let target = direction * p.bound(direction);
                    p.body.translate(p.axis() * (target - p.offset()));

                    let end = if direction > 0.0 { p.body.b } else { p.body.a };
                    for (k, wall) in layout.walls.iter().enumerate() {
                        if k == 2 * i {
                            continue;
                        }
                        let gap = wall.closest_point(end).distance(end) - p.body.half_thickness;
                        assert!(gap >= clearance - 1e-6, "{} players, wall {}: gap {}", n, k, gap);
                    }
                }
            }
        }
    }

    #[test]
    fn test_square_corner_bound() {
        let layout = build_arena(&[1, 2], &GameConfig::default()).unwrap();
        let arena = &layout.arena;
        let mut paddle = layout.paddles[0].clone();
        paddle.set_clearance(30.0);

        // Neighbouring walls meet the player wall at a right angle
        let half_width = paddle.body.length() / 2.0;
        let expected = arena.edge_length() / 2.0 - paddle.body.half_thickness - half_width - 30.0;
        assert!(is_nearly(paddle.bound(1.0), expected));
        assert!(is_nearly(paddle.bound(-1.0), expected));
        assert!(paddle.bound(1.0) > 0.0);
    }

    #[test]
    fn test_contains() {
        let arena = Arena::new(2, 1000.0, 1000.0);
        assert!(arena.contains(arena.center));
        assert!(arena.contains(arena.center + Vec2::new(300.0, 300.0)));
        assert!(!arena.contains(arena.center + Vec2::new(400.0, 0.0)));
        assert!(!arena.contains(Vec2::new(2228.0, 214.0)));
    }
}
