use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::{BBox, Point, Polygon};
use crate::layer::LayerId;
use crate::port::{Port, PortType};
use crate::region::{transform_polygon, Region};
use crate::transform::{quarter_turns, Transform};

/// Deterministic cell identifier (UUID v5 of the cell name).
pub type CellId = Uuid;

/// Index of an instance inside the builder that created it.
pub type InstanceId = usize;

pub fn cell_id_for(name: &str) -> CellId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

// ── Instance ─────────────────────────────────────────────────────────

/// A placed reference to a finished cell.
#[derive(Debug, Clone)]
pub struct Instance {
    pub cell: Arc<Cell>,
    pub trans: Transform,
}

impl Instance {
    pub fn new(cell: Arc<Cell>, trans: Transform) -> Self {
        Self { cell, trans }
    }

    /// The cell's ports in the parent frame.
    pub fn ports(&self) -> Vec<Port> {
        self.cell
            .ports()
            .iter()
            .map(|p| p.transformed(&self.trans))
            .collect()
    }

    pub fn port(&self, name: &str) -> LayoutResult<Port> {
        Ok(self.cell.port(name)?.transformed(&self.trans))
    }

    /// Place the instance so that its port `port` sits on `target`, facing it.
    ///
    /// Replaces the current transform. With `mirror` the instance is
    /// reflected across the axis of the connection.
    pub fn connect(&mut self, port: &str, target: &Port, mirror: bool) -> LayoutResult<()> {
        self.place(port, target, mirror, 180.0)
    }

    /// Like [`Instance::connect`] but the port ends up pointing the same way
    /// as `target`.
    pub fn align(&mut self, port: &str, target: &Port, mirror: bool) -> LayoutResult<()> {
        self.place(port, target, mirror, 0.0)
    }

    fn place(&mut self, port: &str, target: &Port, mirror: bool, offset: f64) -> LayoutResult<()> {
        let local = self.cell.port(port)?.trans;
        let frame = Transform::frame(target.orientation() + offset, mirror, target.position_f());
        self.trans = frame.compose(&local.inverse());
        Ok(())
    }

    /// Pre-compose `t`: the instance moves with its parent frame.
    pub fn transform(&mut self, t: &Transform) {
        self.trans = t.compose(&self.trans);
    }

    pub fn bbox(&self) -> Option<BBox> {
        let bbox = self.cell.bbox()?;
        transform_polygon(&bbox.to_polygon(), &self.trans).bbox()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Instance", 2)?;
        s.serialize_field("cell", &self.cell.name)?;
        s.serialize_field("trans", &self.trans)?;
        s.end()
    }
}

// ── Cell ─────────────────────────────────────────────────────────────

/// A finished, immutable layout cell.
#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub name: String,
    pub id: CellId,
    #[serde(serialize_with = "serialize_shapes")]
    shapes: BTreeMap<LayerId, Vec<Polygon>>,
    instances: Vec<Instance>,
    ports: Vec<Port>,
    info: BTreeMap<String, Value>,
}

impl Cell {
    pub fn shapes(&self, layer: LayerId) -> &[Polygon] {
        self.shapes.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Layers with geometry in this cell or any descendant.
    pub fn layers(&self) -> Vec<LayerId> {
        let mut layers: Vec<LayerId> = self.shapes.keys().copied().collect();
        for inst in &self.instances {
            layers.extend(inst.cell.layers());
        }
        layers.sort();
        layers.dedup();
        layers
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> LayoutResult<&Port> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| LayoutError::port_not_found(&self.name, name))
    }

    pub fn info(&self) -> &BTreeMap<String, Value> {
        &self.info
    }

    pub fn info_f64(&self, key: &str) -> Option<f64> {
        self.info.get(key).and_then(Value::as_f64)
    }

    pub fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }

    /// Bounding box of the whole hierarchy.
    pub fn bbox(&self) -> Option<BBox> {
        self.shapes
            .values()
            .flatten()
            .filter_map(Polygon::bbox)
            .chain(self.instances.iter().filter_map(Instance::bbox))
            .reduce(|a, b| a.union(&b))
    }

    /// All polygons on `layer`, flattened through the hierarchy (unmerged).
    pub fn region(&self, layer: LayerId) -> Region {
        let mut region = Region::from_polygons(self.shapes(layer).iter().cloned());
        for inst in &self.instances {
            region.extend(inst.cell.region(layer).transformed(&inst.trans).into_polygons());
        }
        region
    }

    /// Flattened, merged geometry per layer as a JSON document.
    ///
    /// Layers are keyed `"layer/datatype"`; polygons are listed as hull
    /// vertex arrays in a canonical order.
    pub fn layer_snapshot(&self) -> Value {
        let mut doc = serde_json::Map::new();
        for layer in self.layers() {
            let mut polygons: Vec<Vec<[i64; 2]>> = self
                .region(layer)
                .merged()
                .polygons()
                .iter()
                .map(|p| canonical_ring(&p.hull))
                .collect();
            polygons.sort();
            doc.insert(layer.to_string(), serde_json::json!(polygons));
        }
        Value::Object(doc)
    }
}

/// JSON object keys must be strings, so layers are keyed `"layer/datatype"`.
fn serialize_shapes<S: Serializer>(
    shapes: &BTreeMap<LayerId, Vec<Polygon>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(shapes.iter().map(|(layer, polygons)| (layer.to_string(), polygons)))
}

fn canonical_ring(ring: &[Point]) -> Vec<[i64; 2]> {
    let mut ring = ring.to_vec();
    if Polygon::signed_area2(&ring) < 0 {
        ring.reverse();
    }
    let start = ring
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (p.x, p.y))
        .map_or(0, |(i, _)| i);
    ring.iter()
        .cycle()
        .skip(start)
        .take(ring.len())
        .map(|p| [p.x, p.y])
        .collect()
}

// ── Builder ──────────────────────────────────────────────────────────

/// Mutable staging area for a cell. Only the registry turns it into a
/// shared [`Cell`].
#[derive(Debug)]
pub struct CellBuilder {
    name: String,
    dbu: f64,
    shapes: BTreeMap<LayerId, Vec<Polygon>>,
    instances: Vec<Instance>,
    ports: Vec<Port>,
    info: BTreeMap<String, Value>,
}

impl CellBuilder {
    pub fn new(name: &str, dbu: f64) -> Self {
        Self {
            name: name.to_string(),
            dbu,
            shapes: BTreeMap::new(),
            instances: Vec::new(),
            ports: Vec::new(),
            info: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database unit in micrometres.
    pub fn dbu(&self) -> f64 {
        self.dbu
    }

    pub fn insert_shape(&mut self, layer: LayerId, polygon: Polygon) {
        if !polygon.is_degenerate() {
            self.shapes.entry(layer).or_default().push(polygon);
        }
    }

    pub fn insert_region(&mut self, layer: LayerId, region: Region) {
        for p in region.into_polygons() {
            self.insert_shape(layer, p);
        }
    }

    pub fn shapes(&self, layer: LayerId) -> &[Polygon] {
        self.shapes.get(&layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn create_inst(&mut self, cell: Arc<Cell>) -> InstanceId {
        self.create_inst_at(cell, Transform::identity())
    }

    pub fn create_inst_at(&mut self, cell: Arc<Cell>, trans: Transform) -> InstanceId {
        self.instances.push(Instance::new(cell, trans));
        self.instances.len() - 1
    }

    pub fn inst(&self, id: InstanceId) -> &Instance {
        &self.instances[id]
    }

    pub fn inst_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id]
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn add_port(&mut self, port: Port) -> LayoutResult<()> {
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(LayoutError::invalid(
                "port",
                format!("duplicate port '{}' on cell '{}'", port.name, self.name),
            ));
        }
        self.ports.push(port);
        Ok(())
    }

    /// Add a copy of `port` under a new name.
    pub fn add_port_as(&mut self, name: &str, port: &Port) -> LayoutResult<()> {
        self.add_port(port.renamed(name))
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> LayoutResult<&Port> {
        self.ports
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| LayoutError::port_not_found(&self.name, name))
    }

    /// Rename ports clockwise starting from the west side: west ports bottom
    /// to top, north left to right, east top to bottom, south right to left,
    /// then any remaining angles. Optical ports become `o1..`, dc ports
    /// `e1..`; other types keep their names.
    pub fn autorename_ports(&mut self) {
        for (ty, prefix) in [(PortType::Optical, "o"), (PortType::Dc, "e")] {
            let mut group: Vec<usize> = (0..self.ports.len())
                .filter(|&i| self.ports[i].port_type == ty)
                .collect();
            group.sort_by(|&a, &b| clockwise_order(&self.ports[a], &self.ports[b]));
            for (n, i) in group.into_iter().enumerate() {
                self.ports[i].name = format!("{prefix}{}", n + 1);
            }
        }
    }

    pub fn set_info(&mut self, key: &str, value: impl Serialize) -> LayoutResult<()> {
        self.info.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Move everything built so far: shapes, instances and ports.
    pub fn transform(&mut self, t: &Transform) {
        for polygons in self.shapes.values_mut() {
            for p in polygons.iter_mut() {
                *p = transform_polygon(p, t);
            }
        }
        for inst in &mut self.instances {
            inst.transform(t);
        }
        for port in &mut self.ports {
            *port = port.transformed(t);
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.shapes
            .values()
            .flatten()
            .filter_map(Polygon::bbox)
            .chain(self.instances.iter().filter_map(Instance::bbox))
            .reduce(|a, b| a.union(&b))
    }

    pub fn finish(self) -> Cell {
        Cell {
            id: cell_id_for(&self.name),
            name: self.name,
            shapes: self.shapes,
            instances: self.instances,
            ports: self.ports,
            info: self.info,
        }
    }
}

fn side_rank(port: &Port) -> (u8, f64) {
    let [x, y] = port.position_f();
    match quarter_turns(port.orientation()) {
        Some(2) => (0, y),
        Some(1) => (1, x),
        Some(0) => (2, -y),
        Some(_) => (3, -x),
        None => (4, port.orientation()),
    }
}

fn clockwise_order(a: &Port, b: &Port) -> Ordering {
    let (ra, ka) = side_rank(a);
    let (rb, kb) = side_rank(b);
    ra.cmp(&rb)
        .then(ka.total_cmp(&kb))
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{CplxTrans, Trans};
    use crate::units::Dbu;

    const WG: LayerId = LayerId(1, 0);

    fn straight(length: i64) -> Arc<Cell> {
        let mut b = CellBuilder::new(&format!("straight_{length}"), 0.001);
        b.insert_shape(WG, Polygon::rect(0, -250, length, 250));
        b.add_port(Port::at("o1", 0, 0, 180.0, Dbu(500), WG)).unwrap();
        b.add_port(Port::at("o2", length, 0, 0.0, Dbu(500), WG)).unwrap();
        Arc::new(b.finish())
    }

    #[test]
    fn test_connect_lands_on_target() {
        let s = straight(1000);
        let target = Port::at("t", 5000, 3000, 90.0, Dbu(500), WG);
        for mirror in [false, true] {
            let mut inst = Instance::new(s.clone(), Transform::identity());
            inst.connect("o1", &target, mirror).unwrap();
            let p = inst.port("o1").unwrap();
            assert_eq!(p.position(), target.position());
            assert_eq!(p.orientation(), 270.0);
            assert_eq!(inst.port("o2").unwrap().position(), Point::new(5000, 4000));
        }
    }

    #[test]
    fn test_connect_is_not_cumulative() {
        let s = straight(1000);
        let target = Port::at("t", 100, 0, 0.0, Dbu(500), WG);
        let mut inst = Instance::new(s, Transform::translate(777, 777));
        inst.connect("o1", &target, false).unwrap();
        let first = inst.trans;
        inst.connect("o1", &target, false).unwrap();
        assert_eq!(inst.trans, first);
    }

    #[test]
    fn test_connect_complex_target_within_one_dbu() {
        let s = straight(1000);
        let target = Port::new(
            "t",
            Transform::Complex(CplxTrans::new(30.0, false, 1234.0, -567.0)),
            Dbu(500),
            WG,
            PortType::Optical,
        );
        let mut inst = Instance::new(s, Transform::identity());
        inst.connect("o1", &target, false).unwrap();
        let p = inst.port("o1").unwrap();
        let [x, y] = p.position_f();
        assert!((x - 1234.0).abs() <= 1.0 && (y + 567.0).abs() <= 1.0);
        assert!((p.orientation() - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_align_keeps_direction() {
        let s = straight(1000);
        let target = Port::at("t", 0, 0, 180.0, Dbu(500), WG);
        let mut inst = Instance::new(s, Transform::identity());
        inst.align("o2", &target, false).unwrap();
        assert_eq!(inst.port("o2").unwrap().orientation(), 180.0);
        assert_eq!(inst.port("o1").unwrap().position(), Point::new(1000, 0));
    }

    #[test]
    fn test_missing_port() {
        let s = straight(1000);
        let target = Port::at("t", 0, 0, 0.0, Dbu(500), WG);
        let mut inst = Instance::new(s, Transform::identity());
        let err = inst.connect("o9", &target, false).unwrap_err();
        assert!(matches!(err, LayoutError::PortNotFound { ref port, .. } if port == "o9"));
    }

    #[test]
    fn test_autorename_clockwise() {
        let mut b = CellBuilder::new("four", 0.001);
        b.add_port(Port::at("a", 10, 5, 0.0, Dbu(500), WG)).unwrap();
        b.add_port(Port::at("b", 0, 5, 180.0, Dbu(500), WG)).unwrap();
        b.add_port(Port::at("c", 10, -5, 0.0, Dbu(500), WG)).unwrap();
        b.add_port(Port::at("d", 0, -5, 180.0, Dbu(500), WG)).unwrap();
        b.autorename_ports();
        let names: Vec<(&str, Point)> = b
            .ports()
            .iter()
            .map(|p| (p.name.as_str(), p.position()))
            .collect();
        assert!(names.contains(&("o1", Point::new(0, -5))));
        assert!(names.contains(&("o2", Point::new(0, 5))));
        assert!(names.contains(&("o3", Point::new(10, 5))));
        assert!(names.contains(&("o4", Point::new(10, -5))));
    }

    #[test]
    fn test_duplicate_port_rejected() {
        let mut b = CellBuilder::new("dup", 0.001);
        b.add_port(Port::at("o1", 0, 0, 0.0, Dbu(500), WG)).unwrap();
        assert!(b.add_port(Port::at("o1", 5, 0, 0.0, Dbu(500), WG)).is_err());
    }

    #[test]
    fn test_flattened_region_and_bbox() {
        let s = straight(1000);
        let mut b = CellBuilder::new("top", 0.001);
        let i = b.create_inst(s.clone());
        let j = b.create_inst(s);
        let target = b.inst(i).port("o2").unwrap();
        b.inst_mut(j).connect("o1", &target, false).unwrap();
        b.transform(&Transform::Simple(Trans::R90));
        let cell = b.finish();
        assert_eq!(cell.region(WG).len(), 2);
        assert!((cell.region(WG).area() - 1_000_000.0).abs() < 1e-6);
        assert_eq!(
            cell.bbox().unwrap(),
            BBox::new(Point::new(-250, 0), Point::new(250, 2000))
        );
        assert_eq!(cell.id, cell_id_for("top"));
    }

    #[test]
    fn test_layer_snapshot_is_canonical() {
        let s = straight(1000);
        let snap = s.layer_snapshot();
        assert_eq!(
            snap["1/0"],
            serde_json::json!([[[0, -250], [1000, -250], [1000, 250], [0, 250]]])
        );
    }
}
