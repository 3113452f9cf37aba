//! Planar geometry helpers layered on top of `glam`.

use glam::Vec2;

/// Rotates `point` about `center` by `radians` (counter-clockwise in Y-up terms).
pub fn rotate_about(point: Vec2, center: Vec2, radians: f32) -> Vec2 {
    center + Vec2::from_angle(radians).rotate(point - center)
}

/// Arithmetic mean of the given points.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

/// Shoelace area; the sign follows the winding order.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f32 = (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum();
    0.5 * twice
}

/// True when every turn of the closed polygon has the same handedness.
///
/// Self-intersecting (bow-tie) quadrilaterals fail this check.
pub fn is_convex(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let turn = (b - a).perp_dot(c - b);
        if turn.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Projects a polygon onto `axis` and returns the `(min, max)` interval.
pub fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(min, max), p| {
        let d = p.dot(axis);
        (min.min(d), max.max(d))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_square_area_and_centroid() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert_relative_eq!(signed_area(&square), 1.0);
        assert_relative_eq!(centroid(&square).x, 0.5);
        assert!(is_convex(&square));
    }

    #[test]
    fn bow_tie_is_not_convex() {
        let bow_tie = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(!is_convex(&bow_tie));
        assert_relative_eq!(signed_area(&bow_tie), 0.0);
    }

    #[test]
    fn rotate_quarter_turn() {
        let p = rotate_about(Vec2::new(2.0, 1.0), Vec2::new(1.0, 1.0), std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-6);
    }
}
