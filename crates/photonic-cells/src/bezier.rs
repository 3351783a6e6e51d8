//! Bézier S-bend.

use std::sync::Arc;

use photonic_core::region::extrude_path;
use photonic_core::{
    Cell, DPoint, Enclosure, LayerId, LayoutError, LayoutResult, Library, Port, Um,
};
use serde::{Deserialize, Serialize};

use crate::curves::{bezier_curve, linspace};
use crate::factory::CellConfig;
use crate::straight::{default_layer, grid_width};

fn default_nb_points() -> usize {
    99
}

fn default_t_stop() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BendSConfig {
    pub width: Um,
    /// Lateral offset between the two ends.
    pub height: Um,
    pub length: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default = "default_nb_points")]
    pub nb_points: usize,
    #[serde(default)]
    pub t_start: f64,
    #[serde(default = "default_t_stop")]
    pub t_stop: f64,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl BendSConfig {
    pub fn new(width: Um, height: Um, length: Um, layer: LayerId) -> Self {
        Self {
            width,
            height,
            length,
            layer,
            nb_points: default_nb_points(),
            t_start: 0.0,
            t_stop: default_t_stop(),
            enclosure: None,
        }
    }
}

impl CellConfig for BendSConfig {
    const BUILDER: &'static str = "bend_s";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        bend_s(lib, self)
    }
}

/// S-bend with control polygon `(0,0) (L/2,0) (L/2,H) (L,H)`; both ends are
/// horizontal.
pub fn bend_s(lib: &Library, config: &BendSConfig) -> LayoutResult<Arc<Cell>> {
    let width = grid_width("width", config.width, lib.dbu())?;
    if config.length.0 <= 0.0 {
        return Err(LayoutError::invalid(
            "length",
            format!("must be positive, got {}", config.length),
        ));
    }
    if config.nb_points < 2 {
        return Err(LayoutError::invalid("nb_points", "need at least two points"));
    }
    if !(0.0 <= config.t_start && config.t_start < config.t_stop && config.t_stop <= 1.0) {
        return Err(LayoutError::invalid(
            "t_start",
            format!(
                "need 0 <= t_start < t_stop <= 1, got {}..{}",
                config.t_start, config.t_stop
            ),
        ));
    }
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let (l, h) = (config.length.0, config.height.0);
        let control = [
            DPoint::new(0.0, 0.0),
            DPoint::new(l / 2.0, 0.0),
            DPoint::new(l / 2.0, h),
            DPoint::new(l, h),
        ];
        let backbone = bezier_curve(
            &linspace(config.t_start, config.t_stop, config.nb_points),
            &control,
        );
        let a0 = tangent_deg(config.t_start, &control);
        let a1 = tangent_deg(config.t_stop, &control);
        let dbu = c.dbu();
        let core = extrude_path(&backbone, config.width.0, Some(a0), Some(a1), dbu)?;
        if let Some(enclosure) = &config.enclosure {
            for (layer, band) in
                enclosure.apply_to_path(&backbone, config.width.0, Some(a0), Some(a1), dbu)?
            {
                c.insert_region(layer, band);
            }
        }
        c.insert_shape(config.layer, core);

        let (start, end) = match (backbone.first(), backbone.last()) {
            (Some(s), Some(e)) => (s.to_dbu(dbu), e.to_dbu(dbu)),
            _ => return Err(LayoutError::invalid("nb_points", "empty backbone")),
        };
        c.add_port(Port::at("o1", start.x, start.y, a0 + 180.0, width, config.layer))?;
        c.add_port(Port::at("o2", end.x, end.y, a1, width, config.layer))?;
        c.set_info("sim", "FDTD")?;
        Ok(())
    })
}

/// Direction of travel along the curve at `t`, in degrees.
fn tangent_deg(t: f64, control: &[DPoint]) -> f64 {
    // the derivative is a Bézier curve over the control point differences
    let diffs: Vec<DPoint> = control
        .windows(2)
        .map(|w| DPoint::new(w[1].x - w[0].x, w[1].y - w[0].y))
        .collect();
    bezier_curve(&[t], &diffs)
        .first()
        .map_or(0.0, |d| d.y.atan2(d.x).to_degrees())
}
