//! Integer polygon sets with boolean algebra.
//!
//! Boolean operations are delegated to `geo`; results are rounded back onto
//! the database grid.

use geo::{BooleanOps, LineString, MultiPolygon, Polygon as GeoPolygon};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{BBox, DPoint, Point, Polygon};
use crate::transform::{sin_cos_deg, Transform};

/// A set of polygons on one layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    polygons: Vec<Polygon>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon>) -> Self {
        let mut region = Self::new();
        region.extend(polygons);
        region
    }

    /// Add a polygon. Degenerate polygons are ignored.
    pub fn insert(&mut self, polygon: Polygon) {
        if !polygon.is_degenerate() {
            self.polygons.push(polygon);
        }
    }

    pub fn extend(&mut self, polygons: impl IntoIterator<Item = Polygon>) {
        for p in polygons {
            self.insert(p);
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.polygons
            .iter()
            .filter_map(Polygon::bbox)
            .reduce(|a, b| a.union(&b))
    }

    /// Area of the merged region, overlaps counted once.
    pub fn area(&self) -> f64 {
        self.merged().polygons.iter().map(Polygon::area).sum()
    }

    /// Union of all member polygons.
    pub fn merged(&self) -> Region {
        let merged = self
            .polygons
            .iter()
            .fold(MultiPolygon::new(Vec::new()), |acc, p| {
                acc.union(&MultiPolygon::new(vec![to_geo(p)]))
            });
        from_geo(&merged)
    }

    pub fn union(&self, other: &Region) -> Region {
        from_geo(&self.merged_geo().union(&other.merged_geo()))
    }

    pub fn difference(&self, other: &Region) -> Region {
        from_geo(&self.merged_geo().difference(&other.merged_geo()))
    }

    pub fn intersection(&self, other: &Region) -> Region {
        from_geo(&self.merged_geo().intersection(&other.merged_geo()))
    }

    pub fn xor(&self, other: &Region) -> Region {
        from_geo(&self.merged_geo().xor(&other.merged_geo()))
    }

    pub fn transformed(&self, t: &Transform) -> Region {
        Region {
            polygons: self.polygons.iter().map(|p| transform_polygon(p, t)).collect(),
        }
    }

    pub fn translated(&self, dx: i64, dy: i64) -> Region {
        Region {
            polygons: self.polygons.iter().map(|p| p.translated(dx, dy)).collect(),
        }
    }

    /// Minkowski sum with the vertical segment `[(0, -d), (0, d)]`.
    ///
    /// Each polygon is swept along y: the result is the union of the polygon
    /// shifted by `±d` and one quadrilateral per edge.
    pub fn minkowski_y(&self, d: i64) -> Region {
        let d = d.abs();
        if d == 0 {
            return self.merged();
        }
        let mut swept = Region::new();
        for polygon in &self.polygons {
            swept.insert(polygon.translated(0, d));
            swept.insert(polygon.translated(0, -d));
            for e in polygon.edges() {
                swept.insert(Polygon::new(vec![
                    e.p1.translate(0, -d),
                    e.p2.translate(0, -d),
                    e.p2.translate(0, d),
                    e.p1.translate(0, d),
                ]));
            }
        }
        swept.merged()
    }

    fn merged_geo(&self) -> MultiPolygon<f64> {
        to_geo_multi(&self.merged())
    }
}

impl FromIterator<Polygon> for Region {
    fn from_iter<I: IntoIterator<Item = Polygon>>(iter: I) -> Self {
        Region::from_polygons(iter)
    }
}

pub fn transform_polygon(p: &Polygon, t: &Transform) -> Polygon {
    Polygon::with_holes(
        p.hull.iter().map(|q| t.apply(q)).collect(),
        p.holes
            .iter()
            .map(|h| h.iter().map(|q| t.apply(q)).collect())
            .collect(),
    )
}

// ── geo conversion ───────────────────────────────────────────────────

fn ring_to_geo(ring: &[Point]) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect::<Vec<_>>(),
    )
}

fn to_geo(p: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&p.hull),
        p.holes.iter().map(|h| ring_to_geo(h)).collect(),
    )
}

fn to_geo_multi(region: &Region) -> MultiPolygon<f64> {
    MultiPolygon::new(region.polygons.iter().map(to_geo).collect())
}

fn ring_from_geo(ring: &LineString<f64>) -> Vec<Point> {
    ring.coords()
        .map(|c| Point::new(c.x.round() as i64, c.y.round() as i64))
        .collect()
}

fn from_geo(mp: &MultiPolygon<f64>) -> Region {
    mp.iter()
        .map(|p| {
            Polygon::with_holes(
                ring_from_geo(p.exterior()),
                p.interiors().iter().map(ring_from_geo).collect(),
            )
        })
        .collect()
}

// ── Path extrusion ───────────────────────────────────────────────────

/// Extrude a backbone (µm) into a polygon of constant `width` (µm).
///
/// Interior vertices are mitred. When given, `start_angle`/`end_angle`
/// (degrees) set the end caps perpendicular to those tangents instead of the
/// first/last segment.
pub fn extrude_path(
    backbone: &[DPoint],
    width: f64,
    start_angle: Option<f64>,
    end_angle: Option<f64>,
    dbu: f64,
) -> LayoutResult<Polygon> {
    let mut pts: Vec<DPoint> = Vec::with_capacity(backbone.len());
    for p in backbone {
        if pts.last().map_or(true, |q: &DPoint| q.distance_to(p) > 1e-9) {
            pts.push(*p);
        }
    }
    if pts.len() < 2 {
        return Err(LayoutError::invalid(
            "backbone",
            "a path needs at least two distinct points",
        ));
    }

    let seg_normals: Vec<[f64; 2]> = pts
        .windows(2)
        .map(|w| {
            let (dx, dy) = (w[1].x - w[0].x, w[1].y - w[0].y);
            let len = (dx * dx + dy * dy).sqrt();
            [-dy / len, dx / len]
        })
        .collect();
    let angle_normal = |a: f64| {
        let (s, c) = sin_cos_deg(a);
        [-s, c]
    };

    let half = width / 2.0;
    let n = pts.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for (i, p) in pts.iter().enumerate() {
        let normal = if i == 0 {
            start_angle.map_or(seg_normals[0], angle_normal)
        } else if i == n - 1 {
            end_angle.map_or(seg_normals[n - 2], angle_normal)
        } else {
            let (a, b) = (seg_normals[i - 1], seg_normals[i]);
            let (mx, my) = (a[0] + b[0], a[1] + b[1]);
            let len = (mx * mx + my * my).sqrt();
            if len < 1e-12 {
                b
            } else {
                let m = [mx / len, my / len];
                let cos_half = m[0] * b[0] + m[1] * b[1];
                [m[0] / cos_half, m[1] / cos_half]
            }
        };
        left.push(DPoint::new(p.x + normal[0] * half, p.y + normal[1] * half).to_dbu(dbu));
        right.push(DPoint::new(p.x - normal[0] * half, p.y - normal[1] * half).to_dbu(dbu));
    }

    right.reverse();
    left.extend(right);
    Ok(Polygon::new(left))
}
