use std::sync::Arc;

use photonic_core::{
    Cell, Dbu, Enclosure, LayerId, LayoutError, LayoutResult, Library, Point, Polygon, Port,
    Region,
};
use serde::{Deserialize, Serialize};

use crate::factory::CellConfig;
use crate::straight::{check_width, default_layer};

/// Linear taper from `width1` at `x = 0` to `width2` at `x = length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaperConfig {
    pub width1: Dbu,
    pub width2: Dbu,
    pub length: Dbu,
    #[serde(default = "default_layer")]
    pub layer: LayerId,
    #[serde(default)]
    pub enclosure: Option<Enclosure>,
}

impl CellConfig for TaperConfig {
    const BUILDER: &'static str = "taper";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        taper(lib, self)
    }
}

pub fn taper(lib: &Library, config: &TaperConfig) -> LayoutResult<Arc<Cell>> {
    // both ends are drawn at ±w/2
    check_width("width1", config.width1)?;
    check_width("width2", config.width2)?;
    if config.length.0 <= 0 {
        return Err(LayoutError::invalid(
            "length",
            format!("must be positive, got {}", config.length),
        ));
    }
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let (w1, w2, l) = (config.width1.0, config.width2.0, config.length.0);
        let core = Polygon::new(vec![
            Point::new(0, -w1 / 2),
            Point::new(l, -w2 / 2),
            Point::new(l, w2 / 2),
            Point::new(0, w1 / 2),
        ]);
        if let Some(enclosure) = &config.enclosure {
            if let Some(bbox) = core.bbox() {
                let hull = Region::from_polygons([bbox.to_polygon()]);
                for (layer, band) in enclosure.apply_minkowski_y(&hull)? {
                    c.insert_region(layer, band);
                }
            }
        }
        c.insert_shape(config.layer, core);

        c.add_port(Port::at("o1", 0, 0, 180.0, config.width1, config.layer))?;
        c.add_port(Port::at("o2", l, 0, 0.0, config.width2, config.layer))?;

        let dbu = c.dbu();
        c.set_info("width1_um", config.width1.to_um(dbu))?;
        c.set_info("width2_um", config.width2.to_um(dbu))?;
        c.set_info("length_um", config.length.to_um(dbu))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{WG, WGCLAD};
    use photonic_core::Section;

    fn config(enclosure: Option<Enclosure>) -> TaperConfig {
        TaperConfig {
            width1: Dbu(500),
            width2: Dbu(1000),
            length: Dbu(10_000),
            layer: WG,
            enclosure,
        }
    }

    #[test]
    fn test_taper_ports_carry_widths() {
        let lib = Library::new("test");
        let cell = taper(&lib, &config(None)).unwrap();
        assert_eq!(cell.port("o1").unwrap().width, Dbu(500));
        assert_eq!(cell.port("o2").unwrap().width, Dbu(1000));
        assert_eq!(cell.port("o2").unwrap().position(), Point::new(10_000, 0));
        let area = cell.region(WG).area();
        assert!((area - 750.0 * 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_taper_cladding_follows_bbox() {
        let lib = Library::new("test");
        let enc = Enclosure::new("WGSTD", vec![Section::new(WGCLAD, Dbu(0), Dbu(2000))]);
        let cell = taper(&lib, &config(Some(enc))).unwrap();
        let bbox = cell.region(WGCLAD).bbox().unwrap();
        assert_eq!((bbox.bottom(), bbox.top()), (-2500, 2500));
    }

    #[test]
    fn test_taper_rejects_zero_length() {
        let lib = Library::new("test");
        let bad = TaperConfig {
            length: Dbu(0),
            ..config(None)
        };
        assert!(taper(&lib, &bad).is_err());
    }

    #[test]
    fn test_odd_widths_rejected() {
        let lib = Library::new("test");
        let odd = TaperConfig {
            width1: Dbu(501),
            width2: Dbu(1001),
            length: Dbu(1000),
            ..config(None)
        };
        assert!(matches!(
            taper(&lib, &odd),
            Err(LayoutError::InvalidParameter { ref name, .. }) if name == "width1"
        ));
        let odd_end = TaperConfig {
            width2: Dbu(1001),
            ..config(None)
        };
        assert!(taper(&lib, &odd_end).is_err());
        assert_eq!(lib.cell_count(), 0);
    }

    #[test]
    fn test_drawn_ends_match_port_widths() {
        let lib = Library::new("test");
        let cell = taper(&lib, &config(None)).unwrap();
        let core = &cell.shapes(WG)[0];
        let height_at = |x: i64| {
            let ys: Vec<i64> = core.hull.iter().filter(|p| p.x == x).map(|p| p.y).collect();
            ys.iter().max().unwrap() - ys.iter().min().unwrap()
        };
        assert_eq!(Dbu(height_at(0)), cell.port("o1").unwrap().width);
        assert_eq!(Dbu(height_at(10_000)), cell.port("o2").unwrap().width);
    }
}
