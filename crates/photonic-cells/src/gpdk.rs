//! Generic technology presets: builders pre-bound to the strip waveguide
//! cross-section.

use photonic_core::{
    CellBuilder, Dbu, Enclosure, InstanceId, LayoutResult, Library, Port, Section, Um,
};

use crate::bezier::BendSConfig;
use crate::circular::BendCircularConfig;
use crate::euler::BendEulerConfig;
use crate::factory::{Bound, CellFactory, Overrides};
use crate::grating::GratingCouplerConfig;
use crate::layers::{WG, WGCLAD};
use crate::route::route;
use crate::straight::{StraightConfig, StraightDbuConfig};
use crate::taper::TaperConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tech {
    /// Strip waveguide width.
    pub width_sc: Um,
    pub radius_sc: Um,
}

pub const TECH: Tech = Tech {
    width_sc: Um(0.5),
    radius_sc: Um(10.0),
};

/// Cladding extent around the strip core.
pub const CLADDING_SC: Um = Um(2.0);

/// 2 µm of cladding around the `WG` core, on the grid of `lib`.
pub fn enclosure_sc(lib: &Library) -> Enclosure {
    let d_max = CLADDING_SC.to_dbu(lib.dbu());
    Enclosure::new("WGSTD", vec![Section::new(WGCLAD, Dbu(0), d_max)]).with_main_layer(WG)
}

pub fn straight_sc(lib: &Library) -> Bound<StraightConfig> {
    Bound::new(StraightConfig {
        width: TECH.width_sc,
        length: Um(10.0),
        layer: WG,
        enclosure: Some(enclosure_sc(lib)),
    })
}

pub fn straight_dbu_sc(lib: &Library) -> Bound<StraightDbuConfig> {
    let dbu = lib.dbu();
    Bound::new(StraightDbuConfig {
        width: TECH.width_sc.to_dbu(dbu),
        length: Um(10.0).to_dbu(dbu),
        layer: WG,
        enclosure: Some(enclosure_sc(lib)),
    })
}

pub fn bend_s_sc(lib: &Library) -> Bound<BendSConfig> {
    let mut config = BendSConfig::new(TECH.width_sc, Um(10.0), Um(20.0), WG);
    config.enclosure = Some(enclosure_sc(lib));
    Bound::new(config)
}

pub fn bend_euler_sc(lib: &Library) -> Bound<BendEulerConfig> {
    let mut config = BendEulerConfig::new(TECH.width_sc, TECH.radius_sc, WG);
    config.enclosure = Some(enclosure_sc(lib));
    Bound::new(config)
}

pub fn bend_circular_sc(lib: &Library) -> Bound<BendCircularConfig> {
    let mut config = BendCircularConfig::new(TECH.width_sc, TECH.radius_sc, WG);
    config.enclosure = Some(enclosure_sc(lib));
    Bound::new(config)
}

pub fn taper_sc(lib: &Library) -> Bound<TaperConfig> {
    let dbu = lib.dbu();
    Bound::new(TaperConfig {
        width1: TECH.width_sc.to_dbu(dbu),
        width2: (TECH.width_sc * 2.0).to_dbu(dbu),
        length: Um(10.0).to_dbu(dbu),
        layer: WG,
        enclosure: Some(enclosure_sc(lib)),
    })
}

pub fn grating_coupler_sc() -> Bound<GratingCouplerConfig> {
    Bound::new(GratingCouplerConfig {
        wg_width: TECH.width_sc,
        ..GratingCouplerConfig::default()
    })
}

/// [`route`] with clad straights and the preset Euler bend.
pub fn route_sc(
    c: &mut CellBuilder,
    lib: &Library,
    p1: &Port,
    p2: &Port,
) -> LayoutResult<Vec<InstanceId>> {
    let bend = bend_euler_sc(lib).build(lib, &Overrides::new())?;
    route(c, lib, p1, p2, &straight_dbu_sc(lib), &bend)
}

#[cfg(test)]
mod tests {
    use photonic_core::Transform;

    use super::*;
    use crate::overrides;

    #[test]
    fn test_presets_carry_cladding() {
        let lib = Library::new("gpdk");
        let factories: Vec<Box<dyn CellFactory>> = vec![
            Box::new(straight_sc(&lib)),
            Box::new(straight_dbu_sc(&lib)),
            Box::new(bend_s_sc(&lib)),
            Box::new(bend_euler_sc(&lib)),
            Box::new(bend_circular_sc(&lib)),
            Box::new(taper_sc(&lib)),
        ];
        for f in factories {
            let cell = f.build(&lib, &Overrides::new()).unwrap();
            assert!(!cell.shapes(WGCLAD).is_empty(), "{}", cell.name);
            assert_eq!(cell.port("o1").unwrap().width, Dbu(500), "{}", cell.name);
        }
        // both straight presets resolve to one cell
        assert_eq!(lib.cell_count(), 5);
    }

    #[test]
    fn test_straight_presets_share_cell() {
        let lib = Library::new("gpdk");
        let a = straight_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        let b = straight_dbu_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        assert_eq!(a.name, b.name);
    }

    #[test]
    fn test_grating_preset() {
        let lib = Library::new("gpdk");
        let cell = grating_coupler_sc().build(&lib, &Overrides::new()).unwrap();
        assert_eq!(cell.info_str("polarization"), Some("te"));
        let tm = grating_coupler_sc()
            .build(&lib, &overrides!("polarization" => "tm"))
            .unwrap();
        assert_ne!(cell.name, tm.name);
    }

    #[test]
    fn test_route_between_offset_straights() {
        let _ = env_logger::builder().is_test(true).try_init();
        let lib = Library::new("gpdk");
        let wg = straight_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        let mut c = CellBuilder::new("routing", lib.dbu());
        let sl = c.create_inst(wg.clone());
        let sr = c.create_inst_at(wg, Transform::translate(50_000, 50_000));
        let p1 = c.inst(sl).port("o2").unwrap();
        let p2 = c.inst(sr).port("o1").unwrap();

        let placed = route_sc(&mut c, &lib, &p1, &p2).unwrap();
        let end = c.inst(*placed.last().unwrap()).port("o2").unwrap();
        assert_eq!(end.position(), p2.position());
        let bends = placed
            .iter()
            .filter(|&&id| c.inst(id).cell.name.starts_with("bend_euler"))
            .count();
        assert_eq!(bends, 2);
    }

    #[test]
    fn test_presets_follow_library_grid() {
        let lib = Library::from_config_json(r#"{"name": "coarse", "dbu": 0.002}"#).unwrap();
        let enclosure = enclosure_sc(&lib);
        assert_eq!(enclosure.sections[0].d_max, Dbu(1000));
        assert_eq!(enclosure.main_layer, Some(WG));

        let wg = straight_dbu_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        assert_eq!(wg.port("o1").unwrap().width, Dbu(250));
        assert_eq!(wg.port("o2").unwrap().position().x, 5000);
        let clad = wg.region(WGCLAD).bbox().unwrap();
        assert_eq!((clad.bottom(), clad.top()), (-1125, 1125));

        let t = taper_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        assert_eq!(t.port("o2").unwrap().width, Dbu(500));
        assert_eq!(t.info_f64("width2_um"), Some(1.0));

        let um = straight_sc(&lib).build(&lib, &Overrides::new()).unwrap();
        assert_eq!(um.name, wg.name);
    }
}
