use std::sync::Arc;

use photonic_cells::gpdk::{bend_euler_sc, route_sc, straight_sc};
use photonic_cells::layers::WG;
use photonic_cells::{
    mzi, overrides, BendCircularConfig, Bound, CellConfig, CellFactory, MziConfig, MziFactories,
    Overrides,
};
use photonic_core::{CellBuilder, LayoutError, Library, Transform, Um};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_mzi_defaults_through_config() {
    init();
    let lib = Library::new("mzi");
    let cell = MziConfig::default().build_cell(&lib).unwrap();
    assert_eq!(cell.ports().len(), 4);
    assert_eq!(cell.info_f64("delta_length_um"), Some(10.0));

    let again = MziConfig::default().build_cell(&lib).unwrap();
    assert!(Arc::ptr_eq(&cell, &again));
}

#[test]
fn test_mzi_with_injected_bend() {
    init();
    let lib = Library::new("mzi");
    let circular: Arc<dyn CellFactory> = Arc::new(|lib: &Library, o: &Overrides| {
        Bound::new(BendCircularConfig::new(Um(1.0), Um(5.0), WG)).build(lib, o)
    });
    let factories = MziFactories {
        bend: circular,
        ..MziFactories::default()
    };
    let config = MziConfig::default();
    let custom = mzi(&lib, &config, &factories).unwrap();
    let default = mzi(&lib, &config, &MziFactories::default()).unwrap();
    assert_ne!(custom.name, default.name);
    assert!(custom
        .instances()
        .iter()
        .any(|i| i.cell.name.starts_with("bend_circular")));

    let o3 = custom.port("o3").unwrap().position();
    let o4 = custom.port("o4").unwrap().position();
    assert_eq!(o3.x, o4.x);
}

#[test]
fn test_mzi_unknown_setting_rejected() {
    let lib = Library::new("mzi");
    let config = MziConfig {
        splitter_settings: overrides!("gapp" => 0.3),
        ..MziConfig::default()
    };
    let err = mzi(&lib, &config, &MziFactories::default()).unwrap_err();
    assert!(matches!(err, LayoutError::Config(_)));
}

#[test]
fn test_route_lands_on_rotated_target() {
    init();
    let lib = Library::new("route");
    let wg = straight_sc(&lib).build(&lib, &Overrides::new()).unwrap();
    let mut c = CellBuilder::new("top", lib.dbu());
    let a = c.create_inst(wg.clone());
    let b = c.create_inst(wg);
    c.inst_mut(b).transform(&Transform::frame(90.0, false, [60_000.0, 40_000.0]));

    let p1 = c.inst(a).port("o2").unwrap();
    let p2 = c.inst(b).port("o1").unwrap();
    assert_eq!(p2.orientation(), 270.0);
    let placed = route_sc(&mut c, &lib, &p1, &p2).unwrap();
    let end = c.inst(*placed.last().unwrap()).port("o2").unwrap();
    assert_eq!(end.position(), p2.position());
    assert_eq!(end.orientation(), 90.0);
}

#[test]
fn test_bend_chain_closes_within_a_dbu() {
    let lib = Library::new("chain");
    let bend = bend_euler_sc(&lib)
        .build(&lib, &overrides!("angle" => 37.0))
        .unwrap();
    let mut c = CellBuilder::new("bend_chain", lib.dbu());
    let b1 = c.create_inst(bend.clone());
    let b2 = c.create_inst(bend);
    let target = c.inst(b1).port("o2").unwrap();
    c.inst_mut(b2).connect("o1", &target, false).unwrap();

    let [x0, y0] = target.position_f();
    let [x1, y1] = c.inst(b2).port("o1").unwrap().position_f();
    assert!((x0 - x1).abs() <= 1.0 && (y0 - y1).abs() <= 1.0);
    let out = c.inst(b2).port("o2").unwrap();
    assert!((out.orientation() - 74.0).abs() < 1e-9);
}
