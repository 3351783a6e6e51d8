//! Straight waveguides.

use std::sync::Arc;

use photonic_core::{
    Cell, Dbu, Enclosure, LayerId, LayoutError, LayoutResult, Library, Polygon, Port, Region, Um,
};
use serde::{Deserialize, Serialize};

use crate::factory::CellConfig;
use crate::layers::WG;

pub(crate) fn default_layer() -> LayerId {
    WG
}

/// Width in database units, which must sit on the 2-dbu grid so the
/// waveguide is symmetric about its axis.
pub(crate) fn grid_width(name: &str, width: Um, dbu: f64) -> LayoutResult<Dbu> {
    let w = width
        .to_dbu_exact(dbu)
        .ok_or_else(|| LayoutError::invalid(name, format!("{width} is off the {dbu} µm grid")))?;
    check_width(name, w)?;
    Ok(w)
}

pub(crate) fn check_width(name: &str, width: Dbu) -> LayoutResult<()> {
    if width.0 <= 0 {
        return Err(LayoutError::invalid(name, format!("must be positive, got {width}")));
    }
    if !width.is_even() {
        return Err(LayoutError::invalid(
            name,
            format!("must be a multiple of 2 dbu, got {width}"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StraightDbuConfig {
    pub width: Dbu,
    pub length: Dbu,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl CellConfig for StraightDbuConfig {
    const BUILDER: &'static str = "straight";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        straight_dbu(lib, self)
    }
}

/// Rectangle `[0, length] × [-width/2, width/2]` with `o1` facing west at the
/// origin and `o2` facing east at `(length, 0)`.
pub fn straight_dbu(lib: &Library, config: &StraightDbuConfig) -> LayoutResult<Arc<Cell>> {
    check_width("width", config.width)?;
    if config.length.0 < 0 {
        return Err(LayoutError::invalid(
            "length",
            format!("must not be negative, got {}", config.length),
        ));
    }
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let (w, l) = (config.width.0, config.length.0);
        let core = Polygon::rect(0, -w / 2, l, w / 2);
        if let Some(enclosure) = &config.enclosure {
            for (layer, band) in enclosure.apply_minkowski_y(&Region::from_polygons([core.clone()]))? {
                c.insert_region(layer, band);
            }
        }
        c.insert_shape(config.layer, core);

        c.add_port(Port::at("o1", 0, 0, 180.0, config.width, config.layer))?;
        c.add_port(Port::at("o2", l, 0, 0.0, config.width, config.layer))?;

        let dbu = c.dbu();
        c.set_info("width_um", config.width.to_um(dbu))?;
        c.set_info("length_um", config.length.to_um(dbu))?;
        c.set_info("width_dbu", config.width)?;
        c.set_info("length_dbu", config.length)?;
        c.autorename_ports();
        Ok(())
    })
}

/// Straight waveguide in micrometres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StraightConfig {
    pub width: Um,
    pub length: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl CellConfig for StraightConfig {
    const BUILDER: &'static str = "straight";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        straight(lib, self)
    }
}

/// Converts to database units and delegates to [`straight_dbu`]; both
/// spellings of the same waveguide share one cell. The length is snapped to
/// the grid, the width must already lie on it.
pub fn straight(lib: &Library, config: &StraightConfig) -> LayoutResult<Arc<Cell>> {
    let dbu = lib.dbu();
    straight_dbu(
        lib,
        &StraightDbuConfig {
            width: grid_width("width", config.width, dbu)?,
            length: config.length.to_dbu(dbu),
            layer: config.layer,
            enclosure: config.enclosure.clone(),
        },
    )
}
