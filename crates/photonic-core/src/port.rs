use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::layer::LayerId;
use crate::transform::{quarter_turns, sin_cos_deg, Transform};
use crate::units::Dbu;

/// What kind of connection a port represents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    #[default]
    Optical,
    Dc,
    FibreLaunch,
    VerticalTe,
    VerticalTm,
    Custom(String),
}

impl PortType {
    pub fn as_str(&self) -> &str {
        match self {
            PortType::Optical => "optical",
            PortType::Dc => "dc",
            PortType::FibreLaunch => "fibre_launch",
            PortType::VerticalTe => "vertical_te",
            PortType::VerticalTm => "vertical_tm",
            PortType::Custom(tag) => tag,
        }
    }
}

/// An oriented connection point.
///
/// The frame never carries a mirror: its displacement is the position and
/// its rotation is the outward direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub trans: Transform,
    pub width: Dbu,
    pub layer: LayerId,
    #[serde(default)]
    pub port_type: PortType,
}

impl Port {
    pub fn new(name: &str, trans: Transform, width: Dbu, layer: LayerId, port_type: PortType) -> Self {
        Self {
            name: name.to_string(),
            trans: trans.without_mirror().snapped(),
            width,
            layer,
            port_type,
        }
    }

    /// Optical port at an integer position facing `angle` degrees.
    pub fn at(name: &str, x: i64, y: i64, angle: f64, width: Dbu, layer: LayerId) -> Self {
        Self::new(
            name,
            Transform::frame(angle, false, [x as f64, y as f64]),
            width,
            layer,
            PortType::Optical,
        )
    }

    pub fn with_type(mut self, port_type: PortType) -> Self {
        self.port_type = port_type;
        self
    }

    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn position(&self) -> Point {
        self.trans.disp_point()
    }

    /// Position without rounding, in database units.
    pub fn position_f(&self) -> [f64; 2] {
        self.trans.disp()
    }

    /// Outward direction in degrees, `[0, 360)`.
    pub fn orientation(&self) -> f64 {
        self.trans.angle()
    }

    /// Unit vector along the outward direction.
    pub fn direction(&self) -> [f64; 2] {
        let (s, c) = sin_cos_deg(self.orientation());
        [c, s]
    }

    pub fn is_manhattan(&self) -> bool {
        quarter_turns(self.orientation()).is_some()
    }

    /// The port as seen through `t`. A mirror in `t` flips the orientation
    /// and is then dropped from the frame.
    pub fn transformed(&self, t: &Transform) -> Port {
        Port {
            trans: t.compose(&self.trans).without_mirror().snapped(),
            ..self.clone()
        }
    }
}
