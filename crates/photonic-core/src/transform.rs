//! Rigid 2D motions.
//!
//! [`Trans`] is the closed subgroup of quarter-turn rotations, optional mirror
//! and integer displacement. [`CplxTrans`] carries an arbitrary angle and a
//! real-valued displacement, still expressed in database units. [`Transform`]
//! is the sum of both and promotes to the complex variant whenever one side of
//! a composition is complex.
//!
//! In every variant the mirror (reflection across the local x-axis) is applied
//! first, then the rotation, then the displacement.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle % 360.0;
    let a = if a < 0.0 { a + 360.0 } else { a };
    if (360.0 - a).abs() < 1e-9 {
        0.0
    } else {
        a
    }
}

/// Quarter turns for an angle if it is a multiple of 90 degrees.
pub fn quarter_turns(angle: f64) -> Option<u8> {
    let q = normalize_angle(angle) / 90.0;
    let r = q.round();
    if (q - r).abs() < 1e-9 {
        Some((r as i64).rem_euclid(4) as u8)
    } else {
        None
    }
}

/// `(sin, cos)` of an angle in degrees, exact for multiples of 90.
pub fn sin_cos_deg(angle: f64) -> (f64, f64) {
    match quarter_turns(angle) {
        Some(0) => (0.0, 1.0),
        Some(1) => (1.0, 0.0),
        Some(2) => (0.0, -1.0),
        Some(3) => (-1.0, 0.0),
        _ => angle.to_radians().sin_cos(),
    }
}

/// Quarter-turn transformation with integer displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Trans {
    /// Counter-clockwise quarter turns, `0..4`.
    pub rot: u8,
    pub mirror: bool,
    pub disp: Point,
}

impl Trans {
    pub const R0: Trans = Trans::new(0, false, 0, 0);
    pub const R90: Trans = Trans::new(1, false, 0, 0);
    pub const R180: Trans = Trans::new(2, false, 0, 0);
    pub const R270: Trans = Trans::new(3, false, 0, 0);
    /// Mirror across the x-axis.
    pub const M0: Trans = Trans::new(0, true, 0, 0);
    pub const M45: Trans = Trans::new(1, true, 0, 0);
    /// Mirror across the y-axis.
    pub const M90: Trans = Trans::new(2, true, 0, 0);
    pub const M135: Trans = Trans::new(3, true, 0, 0);

    pub const fn new(rot: u8, mirror: bool, x: i64, y: i64) -> Self {
        Self {
            rot: rot % 4,
            mirror,
            disp: Point::new(x, y),
        }
    }

    pub fn translate(x: i64, y: i64) -> Self {
        Self::new(0, false, x, y)
    }

    pub fn angle(&self) -> f64 {
        self.rot as f64 * 90.0
    }

    fn linear(&self, p: Point) -> Point {
        let (x, y) = if self.mirror { (p.x, -p.y) } else { (p.x, p.y) };
        match self.rot {
            0 => Point::new(x, y),
            1 => Point::new(-y, x),
            2 => Point::new(-x, -y),
            _ => Point::new(y, -x),
        }
    }

    pub fn apply(&self, p: &Point) -> Point {
        self.linear(*p) + self.disp
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Trans) -> Trans {
        let rot = if self.mirror {
            (4 + self.rot - other.rot) % 4
        } else {
            (self.rot + other.rot) % 4
        };
        Trans {
            rot,
            mirror: self.mirror ^ other.mirror,
            disp: self.apply(&other.disp),
        }
    }

    pub fn inverse(&self) -> Trans {
        let linear = Trans {
            rot: if self.mirror { self.rot } else { (4 - self.rot) % 4 },
            mirror: self.mirror,
            disp: Point::default(),
        };
        Trans {
            disp: -linear.apply(&self.disp),
            ..linear
        }
    }

    pub fn to_cplx(&self) -> CplxTrans {
        CplxTrans::new(
            self.angle(),
            self.mirror,
            self.disp.x as f64,
            self.disp.y as f64,
        )
    }
}

/// Arbitrary-angle transformation with a real displacement in database units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CplxTrans {
    /// Counter-clockwise rotation in degrees, normalized into `[0, 360)`.
    pub angle: f64,
    pub mirror: bool,
    pub dx: f64,
    pub dy: f64,
}

impl CplxTrans {
    pub fn new(angle: f64, mirror: bool, dx: f64, dy: f64) -> Self {
        Self {
            angle: normalize_angle(angle),
            mirror,
            dx,
            dy,
        }
    }

    pub fn apply_f(&self, x: f64, y: f64) -> [f64; 2] {
        let y = if self.mirror { -y } else { y };
        let (s, c) = sin_cos_deg(self.angle);
        [x * c - y * s + self.dx, x * s + y * c + self.dy]
    }

    pub fn apply(&self, p: &Point) -> [f64; 2] {
        self.apply_f(p.x as f64, p.y as f64)
    }

    pub fn compose(&self, other: &CplxTrans) -> CplxTrans {
        let angle = if self.mirror {
            self.angle - other.angle
        } else {
            self.angle + other.angle
        };
        let [dx, dy] = self.apply_f(other.dx, other.dy);
        CplxTrans::new(angle, self.mirror ^ other.mirror, dx, dy)
    }

    pub fn inverse(&self) -> CplxTrans {
        let linear = CplxTrans::new(
            if self.mirror { self.angle } else { -self.angle },
            self.mirror,
            0.0,
            0.0,
        );
        let [dx, dy] = linear.apply_f(self.dx, self.dy);
        CplxTrans { dx: -dx, dy: -dy, ..linear }
    }

    /// The quarter-turn equivalent, if the angle allows it. The displacement
    /// is rounded onto the grid.
    pub fn to_trans(&self) -> Option<Trans> {
        quarter_turns(self.angle).map(|rot| {
            Trans::new(rot, self.mirror, self.dx.round() as i64, self.dy.round() as i64)
        })
    }
}

/// Either transformation variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Simple(Trans),
    Complex(CplxTrans),
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Simple(Trans::R0)
    }
}

impl From<Trans> for Transform {
    fn from(t: Trans) -> Self {
        Transform::Simple(t)
    }
}

impl From<CplxTrans> for Transform {
    fn from(t: CplxTrans) -> Self {
        Transform::Complex(t)
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn translate(x: i64, y: i64) -> Self {
        Transform::Simple(Trans::translate(x, y))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Transform::Complex(_))
    }

    pub fn angle(&self) -> f64 {
        match self {
            Transform::Simple(t) => t.angle(),
            Transform::Complex(t) => t.angle,
        }
    }

    pub fn is_mirror(&self) -> bool {
        match self {
            Transform::Simple(t) => t.mirror,
            Transform::Complex(t) => t.mirror,
        }
    }

    /// Displacement in (possibly fractional) database units.
    pub fn disp(&self) -> [f64; 2] {
        match self {
            Transform::Simple(t) => [t.disp.x as f64, t.disp.y as f64],
            Transform::Complex(t) => [t.dx, t.dy],
        }
    }

    /// Displacement rounded onto the grid.
    pub fn disp_point(&self) -> Point {
        match self {
            Transform::Simple(t) => t.disp,
            Transform::Complex(t) => Point::new(t.dx.round() as i64, t.dy.round() as i64),
        }
    }

    pub fn to_cplx(&self) -> CplxTrans {
        match self {
            Transform::Simple(t) => t.to_cplx(),
            Transform::Complex(t) => *t,
        }
    }

    /// `self ∘ other`. Stays simple only if both sides are simple.
    pub fn compose(&self, other: &Transform) -> Transform {
        match (self, other) {
            (Transform::Simple(a), Transform::Simple(b)) => Transform::Simple(a.compose(b)),
            _ => Transform::Complex(self.to_cplx().compose(&other.to_cplx())),
        }
    }

    pub fn inverse(&self) -> Transform {
        match self {
            Transform::Simple(t) => Transform::Simple(t.inverse()),
            Transform::Complex(t) => Transform::Complex(t.inverse()),
        }
    }

    /// Exact image of a point, in database units.
    pub fn apply_f(&self, p: &Point) -> [f64; 2] {
        match self {
            Transform::Simple(t) => {
                let q = t.apply(p);
                [q.x as f64, q.y as f64]
            }
            Transform::Complex(t) => t.apply(p),
        }
    }

    /// Image of a point, rounded onto the grid for complex transforms.
    pub fn apply(&self, p: &Point) -> Point {
        match self {
            Transform::Simple(t) => t.apply(p),
            Transform::Complex(t) => {
                let [x, y] = t.apply(p);
                Point::new(x.round() as i64, y.round() as i64)
            }
        }
    }

    /// Collapse a complex transform onto a quarter-turn one when its angle
    /// permits, rounding the displacement.
    pub fn snapped(&self) -> Transform {
        match self {
            Transform::Complex(t) => t.to_trans().map(Transform::Simple).unwrap_or(*self),
            simple => *simple,
        }
    }

    /// The same frame with the mirror flag cleared. Orientation and
    /// displacement are unchanged.
    pub fn without_mirror(&self) -> Transform {
        match self {
            Transform::Simple(t) => Transform::Simple(Trans { mirror: false, ..*t }),
            Transform::Complex(t) => Transform::Complex(CplxTrans { mirror: false, ..*t }),
        }
    }

    /// Build a frame from an orientation and a position, choosing the simple
    /// variant when the orientation is a quarter turn and the position is
    /// integral.
    pub fn frame(angle: f64, mirror: bool, disp: [f64; 2]) -> Transform {
        let integral = disp[0].fract() == 0.0 && disp[1].fract() == 0.0;
        match quarter_turns(angle) {
            Some(rot) if integral => {
                Transform::Simple(Trans::new(rot, mirror, disp[0] as i64, disp[1] as i64))
            }
            _ => Transform::Complex(CplxTrans::new(angle, mirror, disp[0], disp[1])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Transform> {
        let mut out = Vec::new();
        for rot in 0..4 {
            for mirror in [false, true] {
                out.push(Transform::Simple(Trans::new(rot, mirror, 13 * rot as i64 - 7, 5)));
            }
        }
        out.push(Transform::Complex(CplxTrans::new(37.0, false, 1.5, -2.25)));
        out.push(Transform::Complex(CplxTrans::new(-121.0, true, 100.0, 3.0)));
        out
    }

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6
    }

    #[test]
    fn test_trans_rotation_and_mirror() {
        let p = Point::new(2, 1);
        assert_eq!(Trans::R90.apply(&p), Point::new(-1, 2));
        assert_eq!(Trans::M0.apply(&p), Point::new(2, -1));
        assert_eq!(Trans::M90.apply(&p), Point::new(-2, 1));
        assert_eq!(Trans::new(1, false, 10, 20).apply(&p), Point::new(9, 22));
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let sample = Point::new(17, -4);
        for t in samples() {
            let id = t.inverse().compose(&t);
            assert!(close(id.apply_f(&sample), [17.0, -4.0]), "{t:?}");
            if let Transform::Simple(s) = t {
                assert_eq!(s.inverse().compose(&s), Trans::R0);
            }
        }
    }

    #[test]
    fn test_composition_is_associative() {
        let sample = Point::new(3, 11);
        let ts = samples();
        for a in &ts {
            for b in &ts {
                for c in &ts {
                    let left = a.compose(b).compose(c);
                    let right = a.compose(&b.compose(c));
                    assert!(close(left.apply_f(&sample), right.apply_f(&sample)));
                    assert!((left.angle() - right.angle()).abs() < 1e-9);
                    assert_eq!(left.is_mirror(), right.is_mirror());
                }
            }
        }
    }

    #[test]
    fn test_composition_applies_right_side_first() {
        let shift = Transform::translate(10, 0);
        let rot = Transform::Simple(Trans::R90);
        let p = Point::new(1, 0);
        assert_eq!(shift.compose(&rot).apply(&p), Point::new(10, 1));
        assert_eq!(rot.compose(&shift).apply(&p), Point::new(0, 11));
    }

    #[test]
    fn test_simple_subgroup_is_closed() {
        let a = Transform::Simple(Trans::new(1, true, 3, 4));
        let b = Transform::Simple(Trans::new(3, false, -2, 8));
        assert!(!a.compose(&b).is_complex());
        let c = Transform::Complex(CplxTrans::new(45.0, false, 0.0, 0.0));
        assert!(a.compose(&c).is_complex());
    }

    #[test]
    fn test_snapped_rounds_quarter_turns() {
        let t = Transform::Complex(CplxTrans::new(90.0, false, 9999.9999, 10000.0001));
        assert_eq!(t.snapped(), Transform::Simple(Trans::new(1, false, 10000, 10000)));
        let u = Transform::Complex(CplxTrans::new(30.0, false, 0.0, 0.0));
        assert_eq!(u.snapped(), u);
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(-90.0), 270.0);
        assert_eq!(normalize_angle(720.0), 0.0);
        assert_eq!(quarter_turns(-180.0), Some(2));
        assert_eq!(quarter_turns(45.0), None);
    }
}
