//! Euler (clothoid) bends.

use std::sync::Arc;

use photonic_core::{Cell, Enclosure, LayerId, LayoutError, LayoutResult, Library, Um};
use serde::{Deserialize, Serialize};

use crate::circular::{check_angle_step, check_bend, default_angle, default_angle_step, insert_bend};
use crate::curves::{euler_curve, euler_length};
use crate::factory::CellConfig;
use crate::straight::{default_layer, grid_width};

fn default_p() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BendEulerConfig {
    pub width: Um,
    /// Minimum radius of curvature.
    pub radius: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
    #[serde(default = "default_angle")]
    pub angle: f64,
    /// Fraction of the turn made in the clothoid ramps.
    #[serde(default = "default_p")]
    pub p: f64,
    #[serde(default = "default_angle_step")]
    pub angle_step: f64,
}

impl BendEulerConfig {
    pub fn new(width: Um, radius: Um, layer: LayerId) -> Self {
        Self {
            width,
            radius,
            layer,
            enclosure: None,
            angle: default_angle(),
            p: default_p(),
            angle_step: default_angle_step(),
        }
    }
}

impl CellConfig for BendEulerConfig {
    const BUILDER: &'static str = "bend_euler";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        bend_euler(lib, self)
    }
}

pub fn bend_euler(lib: &Library, config: &BendEulerConfig) -> LayoutResult<Arc<Cell>> {
    let width = grid_width("width", config.width, lib.dbu())?;
    check_bend(config.radius, config.angle)?;
    if !(0.0..=1.0).contains(&config.p) || config.p == 0.0 {
        return Err(LayoutError::invalid(
            "p",
            format!("must lie in (0, 1], got {}", config.p),
        ));
    }
    check_angle_step(config.angle.abs() * (1.0 + config.p), config.angle_step)?;
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let backbone = euler_curve(config.radius.0, config.angle, config.p, config.angle_step);
        insert_bend(
            c,
            &backbone,
            config.width.0,
            width,
            config.layer,
            config.enclosure.as_ref(),
            config.angle,
        )?;
        c.set_info("radius_min_um", config.radius)?;
        c.set_info(
            "length_um",
            euler_length(config.radius.0, config.angle, config.p),
        )?;
        Ok(())
    })
}
