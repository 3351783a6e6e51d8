use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::geometry::DPoint;
use crate::layer::LayerId;
use crate::region::{extrude_path, Region};
use crate::units::Dbu;

/// One cladding band: geometry on `layer` between `d_min` and `d_max` away
/// from the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub layer: LayerId,
    pub d_min: Dbu,
    pub d_max: Dbu,
}

impl Section {
    pub fn new(layer: LayerId, d_min: Dbu, d_max: Dbu) -> Self {
        Self { layer, d_min, d_max }
    }
}

/// Named set of cladding sections added around a core shape. When
/// `main_layer` is set no section may be drawn on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    pub name: String,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_layer: Option<LayerId>,
}

impl Enclosure {
    pub fn new(name: &str, sections: Vec<Section>) -> Self {
        Self {
            name: name.to_string(),
            sections,
            main_layer: None,
        }
    }

    pub fn with_main_layer(mut self, layer: LayerId) -> Self {
        self.main_layer = Some(layer);
        self
    }

    pub fn validate(&self) -> LayoutResult<()> {
        for s in &self.sections {
            if s.d_min.0 < 0 || s.d_max.0 < s.d_min.0 {
                return Err(LayoutError::invalid(
                    "enclosure",
                    format!(
                        "section on {} needs 0 <= d_min <= d_max, got {}..{}",
                        s.layer, s.d_min, s.d_max
                    ),
                ));
            }
            if Some(s.layer) == self.main_layer {
                return Err(LayoutError::invalid(
                    "enclosure",
                    format!("{} has a section on its main layer {}", self.name, s.layer),
                ));
            }
        }
        Ok(())
    }

    /// Cladding for an extruded path. Each band is the path re-extruded at
    /// `width + 2 d_max`, minus the extrusion at `width + 2 d_min` when
    /// `d_min > 0`.
    pub fn apply_to_path(
        &self,
        backbone: &[DPoint],
        width: f64,
        start_angle: Option<f64>,
        end_angle: Option<f64>,
        dbu: f64,
    ) -> LayoutResult<Vec<(LayerId, Region)>> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.sections.len());
        for s in &self.sections {
            let grown = |d: Dbu| -> LayoutResult<Region> {
                let w = width + 2.0 * d.to_um(dbu).0;
                let p = extrude_path(backbone, w, start_angle, end_angle, dbu)?;
                Ok(Region::from_polygons([p]))
            };
            let mut band = grown(s.d_max)?;
            if s.d_min.0 > 0 {
                band = band.difference(&grown(s.d_min)?);
            }
            out.push((s.layer, band));
        }
        Ok(out)
    }

    /// Cladding grown from `core` by a Minkowski sum along y.
    pub fn apply_minkowski_y(&self, core: &Region) -> LayoutResult<Vec<(LayerId, Region)>> {
        self.validate()?;
        Ok(self
            .sections
            .iter()
            .map(|s| {
                let mut band = core.minkowski_y(s.d_max.0);
                if s.d_min.0 > 0 {
                    band = band.difference(&core.minkowski_y(s.d_min.0));
                }
                (s.layer, band)
            })
            .collect())
    }
}
