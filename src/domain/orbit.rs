//! Closed-form asteroid trajectories.
//!
//! An asteroid's position is never integrated tick by tick. Every consumer (the server sweep,
//! snapshots, clients) evaluates the same function of the launch parameters and elapsed time:
//!
//! ```text
//! s          = |(vx, vy)|
//! n          = (-vy, vx) / s
//! lateral(t) = curvature * s * t^2 / 2 + amplitude * sin(2 * PI * frequency * t)
//! p(t)       = (start_x + vx * t, start_y + vy * t) + n * lateral(t)
//! ```

use crate::domain::entities::{Bounds, OrbitParams, Point, Wobble};
use crate::domain::tuning::AsteroidTuning;
use rand::Rng;
use std::f32::consts::PI;

/// Position along the orbit `elapsed_secs` after launch.
pub fn position_at(params: &OrbitParams, elapsed_secs: f32) -> Point {
    let t = elapsed_secs.max(0.0);
    let base_x = params.start_x + params.vx * t;
    let base_y = params.start_y + params.vy * t;

    let speed = (params.vx * params.vx + params.vy * params.vy).sqrt();
    if speed <= f32::EPSILON {
        return Point::new(base_x, base_y);
    }

    let (nx, ny) = (-params.vy / speed, params.vx / speed);
    let lateral = 0.5 * params.curvature * speed * t * t
        + params.wobble.amplitude * (2.0 * PI * params.wobble.frequency * t).sin();

    Point::new(base_x + nx * lateral, base_y + ny * lateral)
}

/// Launch parameters for an asteroid entering from a random playfield edge.
///
/// The start point sits on the chosen edge and the velocity aims at a random point in the
/// middle half of the playfield, so every spawn crosses the screen.
pub fn random_edge_orbit<R: Rng + ?Sized>(
    bounds: Bounds,
    tuning: &AsteroidTuning,
    rng: &mut R,
) -> OrbitParams {
    let start = match rng.gen_range(0..4) {
        0 => Point::new(rng.gen_range(0.0..bounds.width), 0.0),
        1 => Point::new(bounds.width, rng.gen_range(0.0..bounds.height)),
        2 => Point::new(rng.gen_range(0.0..bounds.width), bounds.height),
        _ => Point::new(0.0, rng.gen_range(0.0..bounds.height)),
    };

    let target = Point::new(
        rng.gen_range(bounds.width * 0.25..bounds.width * 0.75),
        rng.gen_range(bounds.height * 0.25..bounds.height * 0.75),
    );
    let (dx, dy) = (target.x - start.x, target.y - start.y);
    let distance = (dx * dx + dy * dy).sqrt().max(1.0);
    let speed = rng.gen_range(tuning.min_speed..tuning.max_speed);

    OrbitParams {
        start_x: start.x,
        start_y: start.y,
        vx: dx / distance * speed,
        vy: dy / distance * speed,
        curvature: rng.gen_range(-tuning.max_curvature..tuning.max_curvature),
        wobble: Wobble {
            amplitude: rng.gen_range(0.0..tuning.max_wobble_amplitude),
            frequency: rng.gen_range(tuning.min_wobble_frequency..tuning.max_wobble_frequency),
        },
    }
}
