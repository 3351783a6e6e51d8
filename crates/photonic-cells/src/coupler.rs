//! Directional couplers.

use std::sync::Arc;

use photonic_core::{
    Cell, Dbu, Enclosure, LayerId, LayoutError, LayoutResult, Library, Transform, Um,
};
use serde::{Deserialize, Serialize};

use crate::bezier::{bend_s, BendSConfig};
use crate::factory::CellConfig;
use crate::straight::{default_layer, grid_width, straight_dbu, StraightDbuConfig};

fn default_gap() -> Um {
    Um(0.2)
}

fn default_length() -> Um {
    Um(10.0)
}

fn default_width() -> Um {
    Um(0.5)
}

fn default_bend_extent() -> Um {
    Um(5.0)
}

/// Two parallel straights separated by `gap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StraightCouplerConfig {
    #[serde(default = "default_gap")]
    pub gap: Um,
    #[serde(default = "default_length")]
    pub length: Um,
    #[serde(default = "default_width")]
    pub width: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl Default for StraightCouplerConfig {
    fn default() -> Self {
        Self {
            gap: default_gap(),
            length: default_length(),
            width: default_width(),
            layer: default_layer(),
            enclosure: None,
        }
    }
}

impl CellConfig for StraightCouplerConfig {
    const BUILDER: &'static str = "straight_coupler";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        straight_coupler(lib, self)
    }
}

/// Half the centre-to-centre spacing of the two coupled waveguides.
fn half_pitch(gap: Um, width: Dbu, dbu: f64) -> LayoutResult<Dbu> {
    let gap = gap
        .to_dbu_exact(dbu)
        .ok_or_else(|| LayoutError::invalid("gap", format!("{gap} is off the {dbu} µm grid")))?;
    if gap.0 <= 0 || !gap.is_even() {
        return Err(LayoutError::invalid(
            "gap",
            format!("must be a positive multiple of 2 dbu, got {gap}"),
        ));
    }
    Ok(Dbu((gap.0 + width.0) / 2))
}

/// Ports: `o1` top-left, `o2` top-right, `o3` bottom-right, `o4` bottom-left.
pub fn straight_coupler(lib: &Library, config: &StraightCouplerConfig) -> LayoutResult<Arc<Cell>> {
    let dbu = lib.dbu();
    let width = grid_width("width", config.width, dbu)?;
    let offset = half_pitch(config.gap, width, dbu)?;
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let wg = straight_dbu(
            lib,
            &StraightDbuConfig {
                width,
                length: config.length.to_dbu(dbu),
                layer: config.layer,
                enclosure: config.enclosure.clone(),
            },
        )?;
        let top = c.create_inst_at(wg.clone(), Transform::translate(0, offset.0));
        let bot = c.create_inst_at(wg, Transform::translate(0, -offset.0));

        let ports = [
            ("o1", top, "o1"),
            ("o2", top, "o2"),
            ("o3", bot, "o2"),
            ("o4", bot, "o1"),
        ];
        for (name, inst, port) in ports {
            let p = c.inst(inst).port(port)?;
            c.add_port_as(name, &p)?;
        }
        c.set_info("sim", "MODE")?;
        Ok(())
    })
}

/// Symmetric coupler: a straight coupler with an S-bend on each arm.
///
/// ```text
///        dx                       dx
///     |------|                 |------|
///  o2 ________                 ______ o3
///             \               /            |
///              =============== gap         | dy
///             /               \            |
///     _______/                 \_______    |
///  o1                                  o4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CouplerConfig {
    #[serde(default = "default_gap")]
    pub gap: Um,
    #[serde(default = "default_length")]
    pub length: Um,
    /// Port-to-port vertical spacing.
    #[serde(default = "default_bend_extent")]
    pub dy: Um,
    /// Horizontal extent of each S-bend.
    #[serde(default = "default_bend_extent")]
    pub dx: Um,
    #[serde(default = "default_width")]
    pub width: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl Default for CouplerConfig {
    fn default() -> Self {
        Self {
            gap: default_gap(),
            length: default_length(),
            dy: default_bend_extent(),
            dx: default_bend_extent(),
            width: default_width(),
            layer: default_layer(),
            enclosure: None,
        }
    }
}

impl CellConfig for CouplerConfig {
    const BUILDER: &'static str = "coupler";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        coupler(lib, self)
    }
}

pub fn coupler(lib: &Library, config: &CouplerConfig) -> LayoutResult<Arc<Cell>> {
    let height = config.dy / 2.0 - config.gap / 2.0 - config.width / 2.0;
    if height.0 <= 0.0 {
        return Err(LayoutError::invalid(
            "dy",
            format!(
                "{} leaves no room for S-bends with gap {} and width {}",
                config.dy, config.gap, config.width
            ),
        ));
    }
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let wg = straight_coupler(
            lib,
            &StraightCouplerConfig {
                gap: config.gap,
                length: config.length,
                width: config.width,
                layer: config.layer,
                enclosure: config.enclosure.clone(),
            },
        )?;
        let mut sbend = BendSConfig::new(config.width, height, config.dx, config.layer);
        sbend.enclosure = config.enclosure.clone();
        let sbend = bend_s(lib, &sbend)?;

        let wg = c.create_inst(wg);
        let placements = [
            ("o2", "o1", true),
            ("o2", "o4", false),
            ("o1", "o2", false),
            ("o1", "o3", true),
        ];
        let mut arms = Vec::with_capacity(placements.len());
        for (port, target, mirror) in placements {
            let target = c.inst(wg).port(target)?;
            let arm = c.create_inst(sbend.clone());
            c.inst_mut(arm).connect(port, &target, mirror)?;
            arms.push(arm);
        }
        let [top_left, bot_left, top_right, bot_right] = [arms[0], arms[1], arms[2], arms[3]];

        let ports = [
            ("o1", bot_left, "o1"),
            ("o2", top_left, "o1"),
            ("o3", top_right, "o2"),
            ("o4", bot_right, "o2"),
        ];
        for (name, inst, port) in ports {
            let p = c.inst(inst).port(port)?;
            c.add_port_as(name, &p)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use photonic_core::{Point, Polygon, Region};

    use super::*;
    use crate::layers::WG;

    #[test]
    fn test_straight_coupler_ports() {
        let lib = Library::new("test");
        let cell = straight_coupler(&lib, &StraightCouplerConfig::default()).unwrap();
        let pos = |n: &str| cell.port(n).unwrap().position();
        assert_eq!(pos("o1"), Point::new(0, 350));
        assert_eq!(pos("o2"), Point::new(10_000, 350));
        assert_eq!(pos("o3"), Point::new(10_000, -350));
        assert_eq!(pos("o4"), Point::new(0, -350));
        assert_eq!(cell.info_str("sim"), Some("MODE"));
    }

    #[test]
    fn test_coupler_symmetry() {
        let lib = Library::new("test");
        let cell = coupler(&lib, &CouplerConfig::default()).unwrap();
        let port = |n: &str| cell.port(n).unwrap();
        assert_eq!(port("o1").position(), Point::new(-5000, -2500));
        assert_eq!(port("o2").position(), Point::new(-5000, 2500));
        assert_eq!(port("o3").position(), Point::new(15_000, 2500));
        assert_eq!(port("o4").position(), Point::new(15_000, -2500));
        assert_eq!((port("o2").position().y - port("o1").position().y).abs(), 5000);
        assert_eq!(port("o1").orientation(), 180.0);
        assert_eq!(port("o3").orientation(), 0.0);

        // the coupling gap survives flattening
        let wg = cell.region(WG).merged();
        let window = Region::from_polygons([Polygon::rect(4000, -100, 6000, 100)]);
        assert!(wg.intersection(&window).is_empty());
        let wider = Region::from_polygons([Polygon::rect(4000, -101, 6000, 101)]);
        assert!(!wg.intersection(&wider).is_empty());
    }

    #[test]
    fn test_coupler_rejects_small_dy() {
        let lib = Library::new("test");
        let config = CouplerConfig {
            dy: Um(0.5),
            ..CouplerConfig::default()
        };
        assert!(coupler(&lib, &config).is_err());
    }

    #[test]
    fn test_odd_gap_rejected() {
        let lib = Library::new("test");
        let config = StraightCouplerConfig {
            gap: Um(0.201),
            ..StraightCouplerConfig::default()
        };
        assert!(straight_coupler(&lib, &config).is_err());
    }
}
