//! Constant-radius bends.

use std::sync::Arc;

use photonic_core::region::extrude_path;
use photonic_core::transform::quarter_turns;
use photonic_core::{
    Cell, CellBuilder, DPoint, Dbu, Enclosure, LayerId, LayoutError, LayoutResult, Library, Port,
    PortType, Transform, Um,
};
use serde::{Deserialize, Serialize};

use crate::curves::{circular_arc, sample_count, MAX_SAMPLES};
use crate::factory::CellConfig;
use crate::straight::{default_layer, grid_width};

pub(crate) fn default_angle() -> f64 {
    90.0
}

pub(crate) fn default_angle_step() -> f64 {
    1.0
}

pub(crate) fn check_bend(radius: Um, angle: f64) -> LayoutResult<()> {
    if radius.0.is_nan() || radius.0 <= 0.0 {
        return Err(LayoutError::invalid(
            "radius",
            format!("must be positive, got {radius}"),
        ));
    }
    if angle == 0.0 || !angle.is_finite() {
        return Err(LayoutError::invalid("angle", format!("must be non-zero, got {angle}")));
    }
    Ok(())
}

/// `span` is the heading change the sampler walks in `angle_step` increments.
pub(crate) fn check_angle_step(span: f64, angle_step: f64) -> LayoutResult<()> {
    match sample_count(span, angle_step) {
        Some(_) => Ok(()),
        None => Err(LayoutError::invalid(
            "angle_step",
            format!("{angle_step} must be positive and sample {span}° in at most {MAX_SAMPLES} steps"),
        )),
    }
}

/// Extrude a bend backbone that leaves the origin heading east and ends
/// heading `angle`, then add `o1` at its start and `o2` at its end.
pub(crate) fn insert_bend(
    c: &mut CellBuilder,
    backbone: &[DPoint],
    width_um: f64,
    width: Dbu,
    layer: LayerId,
    enclosure: Option<&Enclosure>,
    angle: f64,
) -> LayoutResult<()> {
    let dbu = c.dbu();
    let core = extrude_path(backbone, width_um, Some(0.0), Some(angle), dbu)?;
    if let Some(enclosure) = enclosure {
        for (l, band) in enclosure.apply_to_path(backbone, width_um, Some(0.0), Some(angle), dbu)? {
            c.insert_region(l, band);
        }
    }
    c.insert_shape(layer, core);

    let end = backbone
        .last()
        .ok_or_else(|| LayoutError::invalid("backbone", "empty"))?;
    let disp = if quarter_turns(angle).is_some() {
        let p = end.to_dbu(dbu);
        [p.x as f64, p.y as f64]
    } else {
        [end.x / dbu, end.y / dbu]
    };
    c.add_port(Port::at("o1", 0, 0, 180.0, width, layer))?;
    c.add_port(Port::new(
        "o2",
        Transform::frame(angle, false, disp),
        width,
        layer,
        PortType::Optical,
    ))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BendCircularConfig {
    pub width: Um,
    pub radius: Um,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
    #[serde(default = "default_angle")]
    pub angle: f64,
    #[serde(default = "default_angle_step")]
    pub angle_step: f64,
}

impl BendCircularConfig {
    pub fn new(width: Um, radius: Um, layer: LayerId) -> Self {
        Self {
            width,
            radius,
            layer,
            enclosure: None,
            angle: default_angle(),
            angle_step: default_angle_step(),
        }
    }
}

impl CellConfig for BendCircularConfig {
    const BUILDER: &'static str = "bend_circular";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        bend_circular(lib, self)
    }
}

/// Circular bend of `radius` through `angle` degrees (counter-clockwise when
/// positive).
pub fn bend_circular(lib: &Library, config: &BendCircularConfig) -> LayoutResult<Arc<Cell>> {
    let width = grid_width("width", config.width, lib.dbu())?;
    check_bend(config.radius, config.angle)?;
    check_angle_step(config.angle, config.angle_step)?;
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let backbone = circular_arc(config.radius.0, config.angle, config.angle_step);
        insert_bend(
            c,
            &backbone,
            config.width.0,
            width,
            config.layer,
            config.enclosure.as_ref(),
            config.angle,
        )?;
        c.set_info("radius_um", config.radius)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use photonic_core::{Point, Section};

    use super::*;
    use crate::layers::{WG, WGCLAD};

    #[test]
    fn test_quarter_bend_ports() {
        let lib = Library::new("test");
        let cell = bend_circular(&lib, &BendCircularConfig::new(Um(1.0), Um(10.0), WG)).unwrap();
        let o1 = cell.port("o1").unwrap();
        let o2 = cell.port("o2").unwrap();
        assert_eq!(o1.position(), Point::new(0, 0));
        assert_eq!(o2.position(), Point::new(10_000, 10_000));
        assert_eq!(o2.orientation() - o1.orientation(), -90.0);
        assert!(!o2.trans.is_complex());

        let centre = Point::new(0, 10_000);
        assert_relative_eq!(o1.position().distance_to(&centre), 10_000.0);
        assert_relative_eq!(o2.position().distance_to(&centre), 10_000.0);
        assert_relative_eq!(
            o1.position().distance_to(&o2.position()),
            10_000.0 * 2f64.sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_odd_angle_keeps_exact_port() {
        let lib = Library::new("test");
        let mut config = BendCircularConfig::new(Um(1.0), Um(9.0), WG);
        config.angle = 9.0;
        let cell = bend_circular(&lib, &config).unwrap();
        let o2 = cell.port("o2").unwrap();
        assert!(o2.trans.is_complex());
        assert_relative_eq!(o2.orientation(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bend_enclosure() {
        let lib = Library::new("test");
        let mut config = BendCircularConfig::new(Um(0.5), Um(10.0), WG);
        config.enclosure = Some(Enclosure::new(
            "WGSTD",
            vec![Section::new(WGCLAD, Dbu(0), Dbu(2000))],
        ));
        let cell = bend_circular(&lib, &config).unwrap();
        assert!(cell.region(WGCLAD).area() > cell.region(WG).area());
    }

    #[test]
    fn test_invalid_bends_rejected() {
        let lib = Library::new("test");
        let mut config = BendCircularConfig::new(Um(1.0), Um(0.0), WG);
        assert!(matches!(
            bend_circular(&lib, &config),
            Err(LayoutError::InvalidParameter { .. })
        ));
        config.radius = Um(5.0);
        config.angle = 0.0;
        assert!(bend_circular(&lib, &config).is_err());
        assert_eq!(lib.cell_count(), 0);
    }

    #[test]
    fn test_ports_follow_the_backbone_for_any_turn() {
        let lib = Library::new("test");
        let cases = [
            (90.0, Point::new(10_000, 10_000), 90.0),
            (-90.0, Point::new(10_000, -10_000), 270.0),
            (180.0, Point::new(0, 20_000), 180.0),
            (-180.0, Point::new(0, -20_000), 180.0),
        ];
        for (angle, end, orientation) in cases {
            let mut config = BendCircularConfig::new(Um(0.5), Um(10.0), WG);
            config.angle = angle;
            let cell = bend_circular(&lib, &config).unwrap();
            let o1 = cell.port("o1").unwrap();
            let o2 = cell.port("o2").unwrap();
            assert_eq!(o1.position(), Point::new(0, 0), "angle {angle}");
            assert_eq!(o1.orientation(), 180.0, "angle {angle}");
            assert_eq!(o2.position(), end, "angle {angle}");
            assert_eq!(o2.orientation(), orientation, "angle {angle}");
        }
    }

    #[test]
    fn test_bad_angle_step_rejected() {
        let lib = Library::new("test");
        for step in [0.0, -1.0, 1e-9] {
            let mut config = BendCircularConfig::new(Um(0.5), Um(10.0), WG);
            config.angle_step = step;
            assert!(matches!(
                bend_circular(&lib, &config),
                Err(LayoutError::InvalidParameter { ref name, .. }) if name == "angle_step"
            ));
        }
        assert_eq!(lib.cell_count(), 0);
    }
}
