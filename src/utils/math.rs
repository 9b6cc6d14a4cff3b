use glam::{Vec2, Vec3};

/// World position: x/y are the walkable plane, z is a height/layering offset
/// that never participates in movement stepping.
pub type WorldPos = Vec3;

/// Advance `from` toward `to` by at most `step` on each axis independently.
///
/// Axis-independent stepping keeps diagonal movement in lockstep with the
/// per-axis destinations the action protocol produces, and guarantees exact
/// arrival with no overshoot.
pub fn step_toward(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    Vec2::new(
        step_axis(from.x, to.x, step),
        step_axis(from.y, to.y, step),
    )
}

fn step_axis(from: f32, to: f32, step: f32) -> f32 {
    let delta = to - from;
    if delta.abs() <= step {
        to
    } else if delta > 0.0 {
        from + step
    } else {
        from - step
    }
}

/// True once both axes have reached the destination.
pub fn arrived(pos: Vec2, dest: Vec2) -> bool {
    pos == dest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_snaps_without_overshoot() {
        let from = Vec2::new(0.0, 0.0);
        let to = Vec2::new(0.0, 4.0);
        let mut pos = from;
        let mut ticks = 0;
        while !arrived(pos, to) {
            pos = step_toward(pos, to, 3.0);
            ticks += 1;
            assert!(ticks <= 10, "stepping never converged");
        }
        assert_eq!(pos, to);
        assert_eq!(ticks, 2); // 3.0 then the remaining 1.0
    }

    #[test]
    fn step_toward_handles_negative_deltas() {
        let pos = step_toward(Vec2::new(5.0, 5.0), Vec2::new(1.0, 5.0), 2.0);
        assert_eq!(pos, Vec2::new(3.0, 5.0));
    }
}
