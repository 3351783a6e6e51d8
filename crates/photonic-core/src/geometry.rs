use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point in integer database units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn to_um(&self, dbu: f64) -> DPoint {
        DPoint::new(self.x as f64 * dbu, self.y as f64 * dbu)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// A 2D point in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DPoint {
    pub x: f64,
    pub y: f64,
}

impl DPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Snap onto the database grid.
    pub fn to_dbu(&self, dbu: f64) -> Point {
        Point::new((self.x / dbu).round() as i64, (self.y / dbu).round() as i64)
    }
}

/// An axis-aligned bounding box in database units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BBox::new(*first, *first);
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn left(&self) -> i64 {
        self.min.x
    }

    pub fn right(&self) -> i64 {
        self.max.x
    }

    pub fn bottom(&self) -> i64 {
        self.min.y
    }

    pub fn top(&self) -> i64 {
        self.max.y
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2, (self.min.y + self.max.y) / 2)
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The four corners as a counter-clockwise polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::rect(self.min.x, self.min.y, self.max.x, self.max.y)
    }
}

/// A straight edge between two integer points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub p1: Point,
    pub p2: Point,
}

impl Edge {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.p1.x.min(self.p2.x), self.p1.y.min(self.p2.y)),
            Point::new(self.p1.x.max(self.p2.x), self.p1.y.max(self.p2.y)),
        )
    }

    pub fn length(&self) -> f64 {
        self.p1.distance_to(&self.p2)
    }

    /// Whether the two edges share at least one point (touching counts).
    pub fn touches(&self, other: &Edge) -> bool {
        fn cross(o: Point, a: Point, b: Point) -> i128 {
            (a.x - o.x) as i128 * (b.y - o.y) as i128 - (a.y - o.y) as i128 * (b.x - o.x) as i128
        }
        fn on_segment(p: Point, q: Point, r: Point) -> bool {
            q.x >= p.x.min(r.x) && q.x <= p.x.max(r.x) && q.y >= p.y.min(r.y) && q.y <= p.y.max(r.y)
        }

        let d1 = cross(other.p1, other.p2, self.p1);
        let d2 = cross(other.p1, other.p2, self.p2);
        let d3 = cross(self.p1, self.p2, other.p1);
        let d4 = cross(self.p1, self.p2, other.p2);

        if ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0)) {
            return true;
        }
        (d1 == 0 && on_segment(other.p1, self.p1, other.p2))
            || (d2 == 0 && on_segment(other.p1, self.p2, other.p2))
            || (d3 == 0 && on_segment(self.p1, other.p1, self.p2))
            || (d4 == 0 && on_segment(self.p1, other.p2, self.p2))
    }
}

/// A polygon in database units: one hull and any number of holes.
///
/// Rings are stored open (the closing vertex is implied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub hull: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(hull: Vec<Point>) -> Self {
        Self {
            hull: dedup_ring(hull),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(hull: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            hull: dedup_ring(hull),
            holes: holes.into_iter().map(dedup_ring).filter(|h| h.len() >= 3).collect(),
        }
    }

    /// Axis-aligned rectangle from two opposite corners.
    pub fn rect(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        let (l, r) = (x1.min(x2), x1.max(x2));
        let (b, t) = (y1.min(y2), y1.max(y2));
        Self::new(vec![
            Point::new(l, b),
            Point::new(r, b),
            Point::new(r, t),
            Point::new(l, t),
        ])
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.hull)
    }

    pub fn vertex_count(&self) -> usize {
        self.hull.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_degenerate(&self) -> bool {
        self.hull.len() < 3 || self.area2() == 0
    }

    /// Twice the signed area of the hull minus the holes.
    pub fn area2(&self) -> i128 {
        let hull = ring_area2(&self.hull).abs();
        let holes: i128 = self.holes.iter().map(|h| ring_area2(h).abs()).sum();
        hull - holes
    }

    /// Twice the signed area of a ring; positive when counter-clockwise.
    pub fn signed_area2(ring: &[Point]) -> i128 {
        ring_area2(ring)
    }

    pub fn area(&self) -> f64 {
        self.area2() as f64 / 2.0
    }

    /// All edges of hull and holes.
    pub fn edges(&self) -> Vec<Edge> {
        std::iter::once(&self.hull)
            .chain(self.holes.iter())
            .flat_map(|ring| {
                ring.iter()
                    .zip(ring.iter().cycle().skip(1))
                    .map(|(a, b)| Edge::new(*a, *b))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn translated(&self, dx: i64, dy: i64) -> Self {
        Self {
            hull: self.hull.iter().map(|p| p.translate(dx, dy)).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|p| p.translate(dx, dy)).collect())
                .collect(),
        }
    }
}

fn ring_area2(ring: &[Point]) -> i128 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128)
        .sum()
}

/// Drop consecutive duplicate vertices and an explicit closing vertex.
fn dedup_ring(mut ring: Vec<Point>) -> Vec<Point> {
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}
