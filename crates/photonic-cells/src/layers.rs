//! Generic technology: layer numbers, port types by layer and the 3D layer
//! stack used by simulation front ends.

use std::collections::BTreeMap;

use photonic_core::{LayerId, LayerMap, LayoutError, LayoutResult, PortType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const WG: LayerId = LayerId(1, 0);
pub const WAFER: LayerId = LayerId(50, 0);
pub const WGCLAD: LayerId = LayerId(111, 0);
pub const SLAB150: LayerId = LayerId(2, 0);
pub const SLAB90: LayerId = LayerId(3, 0);
pub const SHALLOW_ETCH: LayerId = LayerId(2, 6);
pub const SHALLOWTRENCH: LayerId = LayerId(5, 0);
pub const DEEP_ETCH: LayerId = LayerId(3, 6);
pub const DEEPTRENCH: LayerId = LayerId(4, 0);
pub const GE: LayerId = LayerId(5, 0);
pub const UNDERCUT: LayerId = LayerId(6, 0);
pub const WGN: LayerId = LayerId(34, 0);
pub const WGN_CLAD: LayerId = LayerId(36, 0);

pub const N: LayerId = LayerId(20, 0);
pub const NP: LayerId = LayerId(22, 0);
pub const NPP: LayerId = LayerId(24, 0);
pub const P: LayerId = LayerId(21, 0);
pub const PP: LayerId = LayerId(23, 0);
pub const PPP: LayerId = LayerId(25, 0);
pub const GEN: LayerId = LayerId(26, 0);
pub const GEP: LayerId = LayerId(27, 0);

pub const HEATER: LayerId = LayerId(47, 0);
pub const M1: LayerId = LayerId(41, 0);
pub const M2: LayerId = LayerId(45, 0);
pub const M3: LayerId = LayerId(49, 0);
pub const VIAC: LayerId = LayerId(40, 0);
pub const VIA1: LayerId = LayerId(44, 0);
pub const VIA2: LayerId = LayerId(43, 0);
pub const PADOPEN: LayerId = LayerId(46, 0);

pub const DICING: LayerId = LayerId(100, 0);
pub const NO_TILE_SI: LayerId = LayerId(71, 0);
pub const PADDING: LayerId = LayerId(67, 0);
pub const DEVREC: LayerId = LayerId(68, 0);
pub const FLOORPLAN: LayerId = LayerId(64, 0);
pub const TEXT: LayerId = LayerId(66, 0);
pub const PORT: LayerId = LayerId(1, 10);
pub const PORTE: LayerId = LayerId(1, 11);
pub const PORTH: LayerId = LayerId(70, 0);
pub const SHOW_PORTS: LayerId = LayerId(1, 12);
pub const LABEL: LayerId = LayerId(201, 0);
pub const LABEL_SETTINGS: LayerId = LayerId(202, 0);
pub const TE: LayerId = LayerId(203, 0);
pub const TM: LayerId = LayerId(204, 0);
pub const DRC_MARKER: LayerId = LayerId(205, 0);
pub const LABEL_INSTANCE: LayerId = LayerId(206, 0);
pub const ERROR_MARKER: LayerId = LayerId(207, 0);
pub const ERROR_PATH: LayerId = LayerId(208, 0);

pub const SOURCE: LayerId = LayerId(110, 0);
pub const MONITOR: LayerId = LayerId(101, 0);

/// Generic layer map (Chrostowski & Hochberg, "Silicon Photonics Design",
/// p. 353). Foundry PDKs replace it with their own.
pub fn generic_layer_map() -> LayerMap {
    [
        ("WG", WG),
        ("WAFER", WAFER),
        ("WGCLAD", WGCLAD),
        ("SLAB150", SLAB150),
        ("SLAB90", SLAB90),
        ("SHALLOW_ETCH", SHALLOW_ETCH),
        ("SHALLOWTRENCH", SHALLOWTRENCH),
        ("DEEP_ETCH", DEEP_ETCH),
        ("DEEPTRENCH", DEEPTRENCH),
        ("GE", GE),
        ("UNDERCUT", UNDERCUT),
        ("WGN", WGN),
        ("WGN_CLAD", WGN_CLAD),
        ("N", N),
        ("NP", NP),
        ("NPP", NPP),
        ("P", P),
        ("PP", PP),
        ("PPP", PPP),
        ("GEN", GEN),
        ("GEP", GEP),
        ("HEATER", HEATER),
        ("M1", M1),
        ("M2", M2),
        ("M3", M3),
        ("VIAC", VIAC),
        ("VIA1", VIA1),
        ("VIA2", VIA2),
        ("PADOPEN", PADOPEN),
        ("DICING", DICING),
        ("NO_TILE_SI", NO_TILE_SI),
        ("PADDING", PADDING),
        ("DEVREC", DEVREC),
        ("FLOORPLAN", FLOORPLAN),
        ("TEXT", TEXT),
        ("PORT", PORT),
        ("PORTE", PORTE),
        ("PORTH", PORTH),
        ("SHOW_PORTS", SHOW_PORTS),
        ("LABEL", LABEL),
        ("LABEL_SETTINGS", LABEL_SETTINGS),
        ("TE", TE),
        ("TM", TM),
        ("DRC_MARKER", DRC_MARKER),
        ("LABEL_INSTANCE", LABEL_INSTANCE),
        ("ERROR_MARKER", ERROR_MARKER),
        ("ERROR_PATH", ERROR_PATH),
        ("SOURCE", SOURCE),
        ("MONITOR", MONITOR),
    ]
    .into_iter()
    .fold(LayerMap::new(), |map, (name, id)| map.with_layer(name, id))
}

/// Port type implied by the layer a port sits on.
pub fn port_type_for_layer(layer: LayerId) -> Option<PortType> {
    match layer {
        WG | WGN | SLAB150 => Some(PortType::Optical),
        M1 | M2 | M3 => Some(PortType::Dc),
        TE => Some(PortType::VerticalTe),
        TM => Some(PortType::VerticalTm),
        _ => None,
    }
}

/// Port type of a port marker layer.
pub fn port_type_for_marker(layer: LayerId) -> Option<PortType> {
    match layer {
        PORT => Some(PortType::Optical),
        PORTE => Some(PortType::Dc),
        TE => Some(PortType::VerticalTe),
        TM => Some(PortType::VerticalTm),
        _ => None,
    }
}

// ── 3D stack ─────────────────────────────────────────────────────────

/// One level of the 3D process stack. Lengths in µm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerLevel {
    pub layer: LayerId,
    pub thickness: f64,
    #[serde(default)]
    pub thickness_tolerance: Option<f64>,
    pub zmin: f64,
    #[serde(default)]
    pub material: Option<String>,
    /// Degrees from the normal.
    #[serde(default)]
    pub sidewall_angle: f64,
    /// Bias versus normalized height, `[z, bias]` rows.
    #[serde(default)]
    pub z_to_bias: Option<[Vec<f64>; 2]>,
    #[serde(default)]
    pub info: BTreeMap<String, Value>,
}

impl LayerLevel {
    pub fn new(layer: LayerId, thickness: f64, zmin: f64, material: &str) -> Self {
        Self {
            layer,
            thickness,
            thickness_tolerance: None,
            zmin,
            material: Some(material.to_string()),
            sidewall_angle: 0.0,
            z_to_bias: None,
            info: BTreeMap::new(),
        }
    }

    pub fn with_sidewall_angle(mut self, angle: f64) -> Self {
        self.sidewall_angle = angle;
        self
    }

    pub fn with_mesh_order(mut self, order: u32) -> Self {
        self.info.insert("mesh_order".to_string(), Value::from(order));
        self
    }
}

/// Named process levels, for simulation and 3D rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    pub layers: BTreeMap<String, LayerLevel>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, name: &str, level: LayerLevel) -> Self {
        self.layers.insert(name.to_string(), level);
        self
    }

    pub fn get(&self, name: &str) -> LayoutResult<&LayerLevel> {
        self.layers.get(name).ok_or_else(|| {
            LayoutError::invalid(
                "layer_stack",
                format!(
                    "'{name}' not in {:?}",
                    self.layers.keys().collect::<Vec<_>>()
                ),
            )
        })
    }

    fn with_thickness(&self) -> impl Iterator<Item = &LayerLevel> {
        self.layers.values().filter(|l| l.thickness != 0.0)
    }

    pub fn layer_to_thickness(&self) -> BTreeMap<LayerId, f64> {
        self.with_thickness().map(|l| (l.layer, l.thickness)).collect()
    }

    pub fn layer_to_zmin(&self) -> BTreeMap<LayerId, f64> {
        self.with_thickness().map(|l| (l.layer, l.zmin)).collect()
    }

    pub fn layer_to_material(&self) -> BTreeMap<LayerId, String> {
        self.with_thickness()
            .filter_map(|l| l.material.clone().map(|m| (l.layer, m)))
            .collect()
    }

    pub fn layer_to_sidewall_angle(&self) -> BTreeMap<LayerId, f64> {
        self.with_thickness().map(|l| (l.layer, l.sidewall_angle)).collect()
    }

    pub fn layer_to_info(&self) -> BTreeMap<LayerId, BTreeMap<String, Value>> {
        self.layers.values().map(|l| (l.layer, l.info.clone())).collect()
    }
}

/// Parameters of the generic stack. Lengths in µm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerStackParameters {
    pub thickness_wg: f64,
    pub thickness_slab_deep_etch: f64,
    pub thickness_slab_shallow_etch: f64,
    pub sidewall_angle_wg: f64,
    pub thickness_clad: f64,
    pub thickness_nitride: f64,
    pub thickness_ge: f64,
    pub gap_silicon_to_nitride: f64,
    pub zmin_heater: f64,
    pub zmin_metal1: f64,
    pub thickness_metal1: f64,
    pub zmin_metal2: f64,
    pub thickness_metal2: f64,
    pub zmin_metal3: f64,
    pub thickness_metal3: f64,
    pub substrate_thickness: f64,
    pub box_thickness: f64,
    pub undercut_thickness: f64,
}

impl Default for LayerStackParameters {
    fn default() -> Self {
        Self {
            thickness_wg: 0.220,
            thickness_slab_deep_etch: 0.090,
            thickness_slab_shallow_etch: 0.150,
            sidewall_angle_wg: 10.0,
            thickness_clad: 3.0,
            thickness_nitride: 0.350,
            thickness_ge: 0.500,
            gap_silicon_to_nitride: 0.100,
            zmin_heater: 1.1,
            zmin_metal1: 1.1,
            thickness_metal1: 0.700,
            zmin_metal2: 2.3,
            thickness_metal2: 0.700,
            zmin_metal3: 3.2,
            thickness_metal3: 2.000,
            substrate_thickness: 10.0,
            box_thickness: 3.0,
            undercut_thickness: 5.0,
        }
    }
}

/// Generic silicon-on-insulator stack.
pub fn generic_layer_stack(p: &LayerStackParameters) -> LayerStack {
    let deep_etch = p.thickness_wg - p.thickness_slab_deep_etch;
    let shallow_etch = p.thickness_wg - p.thickness_slab_shallow_etch;
    let mut undercut = LayerLevel::new(UNDERCUT, -p.undercut_thickness, -p.box_thickness, "air")
        .with_mesh_order(1);
    undercut.z_to_bias = Some([
        vec![0.0, 0.3, 0.6, 0.8, 0.9, 1.0],
        vec![0.0, -0.5, -1.0, -1.5, -2.0, -2.5],
    ]);

    LayerStack::new()
        .with_level(
            "substrate",
            LayerLevel::new(
                WAFER,
                p.substrate_thickness,
                -p.substrate_thickness - p.box_thickness,
                "si",
            )
            .with_mesh_order(101),
        )
        .with_level(
            "box",
            LayerLevel::new(WAFER, p.box_thickness, -p.box_thickness, "sio2").with_mesh_order(9),
        )
        .with_level(
            "core",
            LayerLevel::new(WG, p.thickness_wg, 0.0, "si")
                .with_sidewall_angle(p.sidewall_angle_wg)
                .with_mesh_order(2),
        )
        .with_level(
            "shallow_etch",
            LayerLevel::new(SHALLOW_ETCH, shallow_etch, 0.0, "si").with_mesh_order(1),
        )
        .with_level(
            "deep_etch",
            LayerLevel::new(DEEP_ETCH, deep_etch, 0.0, "si").with_mesh_order(1),
        )
        .with_level(
            "clad",
            LayerLevel::new(WAFER, p.thickness_clad, 0.0, "sio2").with_mesh_order(10),
        )
        .with_level(
            "slab150",
            LayerLevel::new(SLAB150, p.thickness_slab_shallow_etch, 0.0, "si").with_mesh_order(3),
        )
        .with_level(
            "slab90",
            LayerLevel::new(SLAB90, p.thickness_slab_deep_etch, 0.0, "si").with_mesh_order(2),
        )
        .with_level(
            "nitride",
            LayerLevel::new(
                WGN,
                p.thickness_nitride,
                p.thickness_wg + p.gap_silicon_to_nitride,
                "sin",
            )
            .with_mesh_order(2),
        )
        .with_level(
            "ge",
            LayerLevel::new(GE, p.thickness_ge, p.thickness_wg, "ge").with_mesh_order(1),
        )
        .with_level("undercut", undercut)
        .with_level(
            "via_contact",
            LayerLevel::new(
                VIAC,
                p.zmin_metal1 - p.thickness_slab_deep_etch,
                p.thickness_slab_deep_etch,
                "Aluminum",
            )
            .with_sidewall_angle(-10.0)
            .with_mesh_order(1),
        )
        .with_level(
            "metal1",
            LayerLevel::new(M1, p.thickness_metal1, p.zmin_metal1, "Aluminum").with_mesh_order(2),
        )
        .with_level(
            "heater",
            LayerLevel::new(HEATER, 0.750, p.zmin_heater, "TiN").with_mesh_order(2),
        )
        .with_level(
            "via1",
            LayerLevel::new(
                VIA1,
                p.zmin_metal2 - (p.zmin_metal1 + p.thickness_metal1),
                p.zmin_metal1 + p.thickness_metal1,
                "Aluminum",
            )
            .with_mesh_order(1),
        )
        .with_level(
            "metal2",
            LayerLevel::new(M2, p.thickness_metal2, p.zmin_metal2, "Aluminum").with_mesh_order(2),
        )
        .with_level(
            "via2",
            LayerLevel::new(
                VIA2,
                p.zmin_metal3 - (p.zmin_metal2 + p.thickness_metal2),
                p.zmin_metal2 + p.thickness_metal2,
                "Aluminum",
            )
            .with_mesh_order(1),
        )
        .with_level(
            "metal3",
            LayerLevel::new(M3, p.thickness_metal3, p.zmin_metal3, "Aluminum").with_mesh_order(2),
        )
}
