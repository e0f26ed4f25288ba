//! Collision Primitives
//!
//! Time-of-impact queries and impulse resolution for circle-segment and
//! circle-circle pairs. All functions are pure over their arguments; numeric
//! degeneracies resolve to `None` or a fallback normal instead of failing.
//!
//! Times returned are relative to "now" and always lie in `[0, max_time]`.

use crate::core::solver::solve_quadratic;
use crate::core::vec2::{Vec2, EPS};
use crate::game::body::{Ball, Circle, Segment};

// =============================================================================
// TIME OF IMPACT
// =============================================================================

/// Earliest time in `[0, max_time]` at which a moving point, offset `rel_pos`
/// from a target and moving at `rel_vel` relative to it, comes within `reach`.
///
/// Only approaching motion counts: an overlapping pair that is separating
/// yields `None`, an overlapping pair that is closing yields `Some(0.0)`.
fn time_to_reach(rel_pos: Vec2, rel_vel: Vec2, reach: f64, max_time: f64) -> Option<f64> {
    let a = rel_vel.length_squared();
    if a < EPS {
        return None;
    }
    let b = 2.0 * rel_pos.dot(rel_vel);
    if b >= 0.0 {
        // Not closing
        return None;
    }
    let c = rel_pos.length_squared() - reach * reach;
    if c <= 0.0 {
        return Some(0.0);
    }

    let t = solve_quadratic(a, b, c).first()?;
    accept_time(t, max_time)
}

/// Clamp tiny negative roots to zero and reject anything outside the window.
#[inline]
fn accept_time(t: f64, max_time: f64) -> Option<f64> {
    if !t.is_finite() || t < -EPS || t > max_time {
        return None;
    }
    Some(t.max(0.0))
}

/// Time until `ball` first touches `line`, within `max_time`.
///
/// The segment's `half_thickness` is added to the ball radius, so a thick
/// segment behaves like a capsule. Contacts whose projection falls outside
/// the segment are retried against the endpoints as circle-point contacts.
pub fn get_wall_collision_time(ball: &Circle, line: &Segment, max_time: f64) -> Option<f64> {
    let reach = ball.radius + line.half_thickness;
    let rel_vel = ball.velocity - line.velocity;
    let rel_pos = ball.center - line.a;

    let dir = line.direction();
    let len_sq = dir.length_squared();
    if len_sq <= EPS {
        return time_to_reach(rel_pos, rel_vel, reach, max_time);
    }

    if let Some(t) = face_collision_time(rel_pos, rel_vel, dir, len_sq, reach, max_time) {
        return Some(t);
    }

    endpoint_collision_time(ball, line, reach, rel_vel, max_time)
}

fn face_collision_time(
    rel_pos: Vec2,
    rel_vel: Vec2,
    dir: Vec2,
    len_sq: f64,
    reach: f64,
    max_time: f64,
) -> Option<f64> {
    let normal = dir.perpendicular().scale(1.0 / len_sq.sqrt());

    // Signed distance and normal speed, oriented so the ball is on the + side
    let mut dist = rel_pos.dot(normal);
    let mut normal_speed = rel_vel.dot(normal);
    if dist < 0.0 {
        dist = -dist;
        normal_speed = -normal_speed;
    }

    if normal_speed > -EPS {
        // Parallel or receding
        return None;
    }

    let t = if dist <= reach {
        0.0
    } else {
        let roots = solve_quadratic(
            normal_speed * normal_speed,
            2.0 * dist * normal_speed,
            dist * dist - reach * reach,
        );
        accept_time(roots.first()?, max_time)?
    };

    // Contact must land on the segment itself
    let along = (rel_pos + rel_vel * t).dot(dir) / len_sq;
    if !(0.0..=1.0).contains(&along) {
        return None;
    }
    Some(t)
}

fn endpoint_collision_time(
    ball: &Circle,
    line: &Segment,
    reach: f64,
    rel_vel: Vec2,
    max_time: f64,
) -> Option<f64> {
    let hit_a = time_to_reach(ball.center - line.a, rel_vel, reach, max_time);
    let hit_b = time_to_reach(ball.center - line.b, rel_vel, reach, max_time);
    match (hit_a, hit_b) {
        (Some(ta), Some(tb)) => Some(ta.min(tb)),
        (ta, tb) => ta.or(tb),
    }
}

/// Time until circles `a` and `b` first touch, within `max_time`.
pub fn get_ball_collision_time(a: &Circle, b: &Circle, max_time: f64) -> Option<f64> {
    time_to_reach(
        a.center - b.center,
        a.velocity - b.velocity,
        a.radius + b.radius,
        max_time,
    )
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Place `ball` at exact contact with `line` and apply the normal impulse.
///
/// The restitution used is the lesser of the two bodies'. A moving line
/// (paddle) transfers its velocity into the ball through the relative
/// velocity term. If both bodies are immovable the ball's relative velocity
/// is reflected instead.
pub fn resolve_circle_line_collision(ball: &mut Ball, line: &mut Segment) {
    let reach = ball.radius + line.half_thickness;
    let closest = line.closest_point(ball.center);
    let rel_vel = ball.velocity - line.velocity;

    let mut normal = (ball.center - closest).normalize();
    if normal.length_squared() < EPS {
        // Center sits on the segment; push against the direction of travel
        normal = line.normal();
        if normal.dot(rel_vel) > 0.0 {
            normal = -normal;
        }
        if normal.length_squared() < EPS {
            normal = (-rel_vel).normalize();
        }
    }

    ball.center = closest + normal * reach;

    let normal_speed = rel_vel.dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let restitution = ball.restitution.min(line.restitution);
    let inverse_mass_sum = ball.inverse_mass + line.inverse_mass;
    if inverse_mass_sum < EPS {
        ball.velocity = ball.velocity - normal * ((1.0 + restitution) * normal_speed);
        return;
    }

    let impulse = -(1.0 + restitution) * normal_speed / inverse_mass_sum;
    ball.velocity = ball.velocity + normal * (impulse * ball.inverse_mass);
    line.velocity = line.velocity - normal * (impulse * line.inverse_mass);
}

/// Impulse-based collision between two balls along the line of centers.
///
/// Overlap is removed by pushing each ball along the normal in proportion
/// to its share of the total inverse mass.
pub fn resolve_ball_collision(a: &mut Ball, b: &mut Ball) {
    let delta = a.center - b.center;
    let dist = delta.length();
    let normal = if dist > EPS {
        delta.scale(1.0 / dist)
    } else {
        // Concentric: separate against the relative motion
        let fallback = (b.velocity - a.velocity).normalize();
        if fallback.length_squared() < EPS { Vec2::UP } else { fallback }
    };

    let inverse_mass_sum = a.inverse_mass + b.inverse_mass;
    if inverse_mass_sum < EPS {
        return;
    }

    let penetration = a.radius + b.radius - dist;
    if penetration > 0.0 {
        a.center = a.center + normal * (penetration * a.inverse_mass / inverse_mass_sum);
        b.center = b.center - normal * (penetration * b.inverse_mass / inverse_mass_sum);
    }

    let normal_speed = (a.velocity - b.velocity).dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let restitution = a.restitution.min(b.restitution);
    let impulse = -(1.0 + restitution) * normal_speed / inverse_mass_sum;
    a.velocity = a.velocity + normal * (impulse * a.inverse_mass);
    b.velocity = b.velocity - normal * (impulse * b.inverse_mass);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::{is_nearly, FAT_EPS};
    use crate::game::body::BallId;
    use proptest::prelude::*;

    fn ball(x: f64, y: f64, vx: f64, vy: f64, r: f64) -> Ball {
        Ball::new(BallId(0), Vec2::new(x, y), Vec2::new(vx, vy), r)
    }

    fn floor() -> Segment {
        Segment::wall(Vec2::new(-1000.0, 0.0), Vec2::new(1000.0, 0.0))
    }

    #[test]
    fn test_wall_time_head_on() {
        let (d, r, s) = (100.0, 10.0, 50.0);
        let b = ball(0.0, d, 0.0, -s, r);
        let t = get_wall_collision_time(&b.circle(), &floor(), 10.0).unwrap();
        assert!(is_nearly(t, (d - r) / s));
    }

    #[test]
    fn test_wall_time_from_below() {
        let b = ball(0.0, -60.0, 0.0, 20.0, 10.0);
        let t = get_wall_collision_time(&b.circle(), &floor(), 10.0).unwrap();
        assert!(is_nearly(t, 2.5));
    }

    #[test]
    fn test_wall_time_receding_or_parallel() {
        let away = ball(0.0, 50.0, 0.0, 10.0, 5.0);
        assert_eq!(get_wall_collision_time(&away.circle(), &floor(), 100.0), None);

        let parallel = ball(0.0, 50.0, 10.0, 0.0, 5.0);
        assert_eq!(get_wall_collision_time(&parallel.circle(), &floor(), 100.0), None);
    }

    #[test]
    fn test_wall_time_outside_window() {
        let b = ball(0.0, 100.0, 0.0, -10.0, 10.0);
        assert_eq!(get_wall_collision_time(&b.circle(), &floor(), 5.0), None);
        assert!(get_wall_collision_time(&b.circle(), &floor(), 9.0).is_some());
    }

    #[test]
    fn test_wall_time_overlapping_and_closing_is_zero() {
        let b = ball(0.0, 3.0, 0.0, -1.0, 5.0);
        assert_eq!(get_wall_collision_time(&b.circle(), &floor(), 1.0), Some(0.0));
    }

    #[test]
    fn test_wall_time_misses_past_end() {
        let short = Segment::wall(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        let b = ball(50.0, 50.0, 0.0, -10.0, 5.0);
        assert_eq!(get_wall_collision_time(&b.circle(), &short, 100.0), None);
    }

    #[test]
    fn test_wall_time_hits_endpoint() {
        let short = Segment::wall(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));

        // Along the segment's own line
        let b = ball(-50.0, 0.0, 10.0, 0.0, 5.0);
        let t = get_wall_collision_time(&b.circle(), &short, 100.0).unwrap();
        assert!(is_nearly(t, 4.5));

        // Glancing the corner: contact when (x, 3) is 5 from the origin
        let b = ball(-20.0, 3.0, 10.0, 0.0, 5.0);
        let t = get_wall_collision_time(&b.circle(), &short, 100.0).unwrap();
        assert!(is_nearly(t, 1.6));
    }

    #[test]
    fn test_wall_time_moving_thick_paddle() {
        let mut paddle = Segment::paddle(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0), 5.0, 1);
        paddle.velocity = Vec2::new(0.0, 10.0);
        let b = ball(0.0, 50.0, 0.0, 0.0, 10.0);
        let t = get_wall_collision_time(&b.circle(), &paddle, 10.0).unwrap();
        assert!(is_nearly(t, 3.5));
    }

    #[test]
    fn test_degenerate_segment_acts_as_point() {
        let point = Segment::wall(Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0));
        let b = ball(0.0, 30.0, 0.0, -10.0, 10.0);
        let t = get_wall_collision_time(&b.circle(), &point, 10.0).unwrap();
        assert!(is_nearly(t, 2.0));
    }

    #[test]
    fn test_ball_time_head_on() {
        let a = ball(0.0, 0.0, 10.0, 0.0, 5.0);
        let b = ball(100.0, 0.0, -10.0, 0.0, 5.0);
        let t = get_ball_collision_time(&a.circle(), &b.circle(), 10.0).unwrap();
        assert!(is_nearly(t, 4.5));
    }

    #[test]
    fn test_ball_time_none_cases() {
        let a = ball(0.0, 0.0, 0.0, 0.0, 5.0);
        let b = ball(100.0, 0.0, 0.0, 0.0, 5.0);
        assert_eq!(get_ball_collision_time(&a.circle(), &b.circle(), 10.0), None);

        // Same velocity never closes
        let a = ball(0.0, 0.0, 3.0, 3.0, 5.0);
        let b = ball(100.0, 0.0, 3.0, 3.0, 5.0);
        assert_eq!(get_ball_collision_time(&a.circle(), &b.circle(), 10.0), None);

        // Miss by passing wide
        let a = ball(0.0, 0.0, 10.0, 0.0, 5.0);
        let b = ball(100.0, 50.0, 0.0, 0.0, 5.0);
        assert_eq!(get_ball_collision_time(&a.circle(), &b.circle(), 100.0), None);
    }

    #[test]
    fn test_resolve_reflects_off_static_wall() {
        let mut b = ball(0.0, 10.0, 3.0, -4.0, 10.0);
        let mut wall = floor();
        resolve_circle_line_collision(&mut b, &mut wall);
        assert_eq!(b.velocity, Vec2::new(3.0, 4.0));
        assert_eq!(b.center, Vec2::new(0.0, 10.0));
        assert_eq!(wall.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_resolve_removes_penetration() {
        let mut b = ball(5.0, 7.0, 0.0, -4.0, 10.0);
        let mut wall = floor();
        resolve_circle_line_collision(&mut b, &mut wall);
        assert!(is_nearly(b.center.y, 10.0));
        assert!(is_nearly(b.center.x, 5.0));
    }

    #[test]
    fn test_resolve_paddle_transfers_momentum() {
        let mut paddle = Segment::paddle(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0), 5.0, 1);
        paddle.velocity = Vec2::new(0.0, 10.0);
        let mut b = ball(0.0, 15.0, 0.0, 0.0, 10.0);
        resolve_circle_line_collision(&mut b, &mut paddle);
        assert!(is_nearly(b.velocity.y, 20.0));
        assert!(is_nearly(b.velocity.x, 0.0));
        assert_eq!(paddle.velocity, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_resolve_uses_lesser_restitution() {
        let mut b = ball(0.0, 10.0, 0.0, -10.0, 10.0);
        b.restitution = 0.5;
        let mut wall = floor();
        resolve_circle_line_collision(&mut b, &mut wall);
        assert!(is_nearly(b.velocity.y, 5.0));
    }

    #[test]
    fn test_equal_balls_swap_velocity() {
        let mut a = ball(0.0, 0.0, 10.0, 0.0, 5.0);
        let mut b = ball(10.0, 0.0, -4.0, 0.0, 5.0);
        resolve_ball_collision(&mut a, &mut b);
        assert!(is_nearly(a.velocity.x, -4.0));
        assert!(is_nearly(b.velocity.x, 10.0));
    }

    #[test]
    fn test_separating_balls_untouched() {
        let mut a = ball(0.0, 0.0, -10.0, 0.0, 5.0);
        let mut b = ball(10.0, 0.0, 10.0, 0.0, 5.0);
        resolve_ball_collision(&mut a, &mut b);
        assert_eq!(a.velocity, Vec2::new(-10.0, 0.0));
        assert_eq!(b.velocity, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_overlapping_balls_separated_by_mass() {
        // b is four times heavier, so it moves a fifth of the overlap
        let mut a = ball(0.0, 0.0, 0.0, 0.0, 5.0);
        let mut b = ball(12.0, 0.0, 0.0, 0.0, 10.0);
        resolve_ball_collision(&mut a, &mut b);
        assert!(is_nearly(a.center.distance(b.center), 15.0));
        assert!(is_nearly(a.center.x, -2.4));
        assert!(is_nearly(b.center.x, 12.6));
    }

    fn momentum(a: &Ball, b: &Ball) -> Vec2 {
        a.velocity * (1.0 / a.inverse_mass) + b.velocity * (1.0 / b.inverse_mass)
    }

    fn kinetic_energy(a: &Ball, b: &Ball) -> f64 {
        0.5 * (a.velocity.length_squared() / a.inverse_mass
            + b.velocity.length_squared() / b.inverse_mass)
    }

    proptest! {
        #[test]
        fn prop_ball_collision_conserves_momentum(
            ra in 1.0f64..50.0,
            rb in 1.0f64..50.0,
            angle in 0.0f64..std::f64::consts::TAU,
            va in (-100.0f64..100.0, -100.0f64..100.0),
            vb in (-100.0f64..100.0, -100.0f64..100.0),
            ea in 0.0f64..=1.0,
            eb in 0.0f64..=1.0,
        ) {
            let offset = Vec2::from_angle(angle) * (ra + rb);
            let mut a = ball(0.0, 0.0, va.0, va.1, ra);
            let mut b = ball(offset.x, offset.y, vb.0, vb.1, rb);
            a.restitution = ea;
            b.restitution = eb;

            let before = momentum(&a, &b);
            resolve_ball_collision(&mut a, &mut b);
            let after = momentum(&a, &b);

            let scale = 1.0 + before.length();
            prop_assert!((after - before).length() <= FAT_EPS * scale);
        }

        #[test]
        fn prop_elastic_ball_collision_conserves_energy(
            ra in 1.0f64..50.0,
            rb in 1.0f64..50.0,
            angle in 0.0f64..std::f64::consts::TAU,
            va in (-100.0f64..100.0, -100.0f64..100.0),
            vb in (-100.0f64..100.0, -100.0f64..100.0),
        ) {
            let offset = Vec2::from_angle(angle) * (ra + rb);
            let mut a = ball(0.0, 0.0, va.0, va.1, ra);
            let mut b = ball(offset.x, offset.y, vb.0, vb.1, rb);

            let before = kinetic_energy(&a, &b);
            resolve_ball_collision(&mut a, &mut b);
            let after = kinetic_energy(&a, &b);

            prop_assert!((after - before).abs() <= FAT_EPS * (1.0 + before));
        }

        #[test]
        fn prop_wall_time_within_window(
            x in -500.0f64..500.0,
            y in 1.0f64..500.0,
            vx in -200.0f64..200.0,
            vy in -200.0f64..200.0,
            r in 1.0f64..30.0,
            max_time in 0.0f64..5.0,
        ) {
            let b = ball(x, y + r, vx, vy, r);
            if let Some(t) = get_wall_collision_time(&b.circle(), &floor(), max_time) {
                prop_assert!(t >= 0.0 && t <= max_time);
            }
        }
    }
}
