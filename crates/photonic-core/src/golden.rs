//! Geometry regression checks against a reference cell or snapshot.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::cell::Cell;
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{Point, Polygon};
use crate::layer::LayerId;
use crate::region::Region;

fn check(cell: &str, layer: LayerId, actual: &Region, expected: &Region) -> LayoutResult<()> {
    let diff = actual.xor(expected);
    if diff.is_empty() {
        Ok(())
    } else {
        Err(LayoutError::GeometryMismatch {
            cell: cell.to_string(),
            layer,
            diff,
        })
    }
}

/// Compare the flattened geometry of two cells layer by layer.
pub fn compare(actual: &Cell, expected: &Cell) -> LayoutResult<()> {
    let layers: BTreeSet<LayerId> = actual
        .layers()
        .into_iter()
        .chain(expected.layers())
        .collect();
    for layer in layers {
        check(&actual.name, layer, &actual.region(layer), &expected.region(layer))?;
    }
    Ok(())
}

fn parse_layer(key: &str) -> LayoutResult<LayerId> {
    let bad = || LayoutError::invalid("snapshot", format!("bad layer key '{key}'"));
    let (l, d) = key.split_once('/').ok_or_else(bad)?;
    Ok(LayerId(l.parse().map_err(|_| bad())?, d.parse().map_err(|_| bad())?))
}

fn parse_region(value: &Value) -> LayoutResult<Region> {
    let polygons: Vec<Vec<[i64; 2]>> = serde_json::from_value(value.clone())?;
    Ok(polygons
        .into_iter()
        .map(|ring| Polygon::new(ring.into_iter().map(|[x, y]| Point::new(x, y)).collect()))
        .collect())
}

/// Compare a cell against a document produced by [`Cell::layer_snapshot`].
pub fn compare_snapshot(actual: &Cell, snapshot: &Value) -> LayoutResult<()> {
    let doc = snapshot
        .as_object()
        .ok_or_else(|| LayoutError::invalid("snapshot", "expected a JSON object"))?;
    let mut layers: BTreeSet<LayerId> = actual.layers().into_iter().collect();
    for key in doc.keys() {
        layers.insert(parse_layer(key)?);
    }
    for layer in layers {
        let expected = match doc.get(&layer.to_string()) {
            Some(v) => parse_region(v)?,
            None => Region::new(),
        };
        check(&actual.name, layer, &actual.region(layer), &expected)?;
    }
    Ok(())
}
