//! Focusing elliptical grating couplers.

use std::sync::Arc;

use photonic_core::region::extrude_path;
use photonic_core::spatial::EdgeIndex;
use photonic_core::{
    Cell, DPoint, Dbu, Edge, LayerId, LayoutError, LayoutResult, Library, Point, Polygon, Port,
    PortType, Region, Transform, Um,
};
use serde::{Deserialize, Serialize};

use crate::curves::ellipse_arc;
use crate::factory::CellConfig;
use crate::layers::{UNDERCUT, WG};
use crate::straight::grid_width;

const TOOTH_ANGLE_STEP: f64 = 1.0;
const FIBRE_LAUNCH_WIDTH: Dbu = Dbu(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    Te,
    Tm,
}

/// How far the taper reaches over the grating, in periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaperExtent {
    First,
    Last,
    Periods(f64),
}

/// All lengths in µm, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GratingCouplerConfig {
    pub polarization: Polarization,
    pub taper_length: Um,
    pub taper_angle: f64,
    pub trenches_extra_angle: f64,
    /// Centre wavelength.
    pub lambda_c: Um,
    pub fiber_angle: f64,
    pub grating_line_width: Um,
    pub wg_width: Um,
    /// Tooth effective index.
    pub neff: f64,
    pub layer_taper: Option<LayerId>,
    pub layer_trench: LayerId,
    pub p_start: u32,
    pub n_periods: u32,
    pub taper_offset: Um,
    pub taper_extent: TaperExtent,
    /// Overrides `neff` when given.
    pub period: Option<Um>,
    pub x_fiber_launch: Option<Um>,
    pub clad_index: f64,
    pub spiked: bool,
}

impl Default for GratingCouplerConfig {
    fn default() -> Self {
        Self {
            polarization: Polarization::Te,
            taper_length: Um(16.6),
            taper_angle: 40.0,
            trenches_extra_angle: 10.0,
            lambda_c: Um(1.554),
            fiber_angle: 15.0,
            grating_line_width: Um(0.343),
            wg_width: Um(0.5),
            neff: 2.638,
            layer_taper: Some(WG),
            layer_trench: UNDERCUT,
            p_start: 26,
            n_periods: 30,
            taper_offset: Um(0.0),
            taper_extent: TaperExtent::Last,
            period: None,
            x_fiber_launch: None,
            clad_index: 1.443,
            spiked: true,
        }
    }
}

impl GratingCouplerConfig {
    /// TE grating for 1554 nm.
    pub fn te() -> Self {
        Self {
            taper_offset: Um(-0.030),
            ..Self::default()
        }
    }

    /// TM grating for 1580 nm.
    pub fn tm() -> Self {
        Self {
            polarization: Polarization::Tm,
            taper_length: Um(17.0),
            lambda_c: Um(1.58),
            grating_line_width: Um(0.55),
            p_start: 17,
            n_periods: 20,
            neff: 1.8,
            taper_offset: Um(-0.325),
            ..Self::default()
        }
    }
}

impl CellConfig for GratingCouplerConfig {
    const BUILDER: &'static str = "grating_coupler_elliptical";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        grating_coupler_elliptical(lib, self)
    }
}

/// Ellipse family of a focusing grating: tooth `p` has semi-axes
/// `p·(a, b)` and is centred at `p·x`.
#[derive(Debug, Clone, Copy)]
struct Ellipses {
    a: f64,
    b: f64,
    x: f64,
    period: f64,
}

impl Ellipses {
    fn new(config: &GratingCouplerConfig) -> LayoutResult<Self> {
        let lambda = config.lambda_c.0;
        if lambda <= 0.0 {
            return Err(LayoutError::invalid("lambda_c", "must be positive"));
        }
        let sin_theta = config.fiber_angle.to_radians().sin();
        let n_clad = config.clad_index;
        let neff = match config.period {
            Some(period) if period.0 > 0.0 => lambda / period.0 + n_clad * sin_theta,
            Some(period) => {
                return Err(LayoutError::invalid(
                    "period",
                    format!("must be positive, got {period}"),
                ))
            }
            None => config.neff,
        };
        let d = neff * neff - n_clad * n_clad * sin_theta * sin_theta;
        if d <= 0.0 {
            return Err(LayoutError::invalid(
                "neff",
                format!("{neff} cannot phase-match a {}° fibre", config.fiber_angle),
            ));
        }
        let a = lambda * neff / d;
        let x = lambda * n_clad * sin_theta / d;
        Ok(Self {
            a,
            b: lambda / d.sqrt(),
            x,
            period: a + x,
        })
    }
}

/// One trench: an elliptical arc extruded to `width`, optionally with a
/// triangular spike on each end cap.
fn grating_tooth(
    ap: f64,
    bp: f64,
    xp: f64,
    width: f64,
    span: f64,
    spiked: bool,
    dbu: f64,
) -> LayoutResult<Region> {
    let backbone = ellipse_arc(ap, bp, xp, -span / 2.0, span / 2.0, TOOTH_ANGLE_STEP);
    let path = extrude_path(&backbone, width, None, None, dbu)?;
    if !spiked || backbone.len() < 2 {
        return Ok(Region::from_polygons([path]));
    }

    let spike = width / 3.0 / dbu;
    let index = EdgeIndex::build(std::slice::from_ref(&path));
    let n = backbone.len();
    let mut region = Region::from_polygons([path]);
    for (end, inner) in [(backbone[0], backbone[1]), (backbone[n - 1], backbone[n - 2])] {
        let outward = unit(inner, end);
        // reach a little past the end so the rounded cap edge is always crossed
        let tip = DPoint::new(end.x + outward[0] * 2.0 * dbu, end.y + outward[1] * 2.0 * dbu);
        let ray = Edge::new(inner.to_dbu(dbu), tip.to_dbu(dbu));
        for hit in index.touching(&ray) {
            region.insert(spike_on(&hit.edge, outward, spike));
        }
    }
    Ok(region.merged())
}

fn unit(from: DPoint, to: DPoint) -> [f64; 2] {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    [dx / len, dy / len]
}

fn spike_on(edge: &Edge, outward: [f64; 2], height: f64) -> Polygon {
    let (p1, p2) = (edge.p1, edge.p2);
    let (dx, dy) = ((p2.x - p1.x) as f64, (p2.y - p1.y) as f64);
    let len = (dx * dx + dy * dy).sqrt();
    let mut normal = [-dy / len, dx / len];
    if normal[0] * outward[0] + normal[1] * outward[1] < 0.0 {
        normal = [-normal[0], -normal[1]];
    }
    let mid = [(p1.x + p2.x) as f64 / 2.0, (p1.y + p2.y) as f64 / 2.0];
    let apex = Point::new(
        (mid[0] + normal[0] * height).round() as i64,
        (mid[1] + normal[1] * height).round() as i64,
    );
    Polygon::new(vec![p1, apex, p2])
}

/// Elliptical grating coupler. The waveguide end of the taper sits at the
/// origin (port `o1`, facing west); `FL` marks the fibre launch position.
pub fn grating_coupler_elliptical(
    lib: &Library,
    config: &GratingCouplerConfig,
) -> LayoutResult<Arc<Cell>> {
    let dbu = lib.dbu();
    let wg_width = grid_width("wg_width", config.wg_width, dbu)?;
    let ellipses = Ellipses::new(config)?;
    let trench_width = ellipses.period - config.grating_line_width.0;
    if trench_width <= 0.0 {
        return Err(LayoutError::invalid(
            "grating_line_width",
            format!(
                "{} leaves no trench in a {:.4} µm period",
                config.grating_line_width, ellipses.period
            ),
        ));
    }
    // two extra teeth past the last period
    let p_end = config
        .p_start
        .checked_add(config.n_periods)
        .and_then(|p| p.checked_add(2))
        .ok_or_else(|| {
            LayoutError::invalid(
                "n_periods",
                format!(
                    "p_start {} + n_periods {} overflows the period index",
                    config.p_start, config.n_periods
                ),
            )
        })?;
    let name = config.cell_name()?;
    lib.lookup_or_build(&name, |c| {
        let Ellipses { a, b, x, period } = ellipses;
        let span = config.taper_angle + config.trenches_extra_angle;
        let mut trenches = Region::new();
        for p in config.p_start..p_end {
            let k = p as f64 - 0.5;
            let tooth = grating_tooth(k * a, k * b, k * x, trench_width, span, config.spiked, dbu)?;
            trenches.extend(tooth.into_polygons());
        }
        c.insert_region(config.layer_trench, trenches);

        let n = match config.taper_extent {
            TaperExtent::Last => config.n_periods as f64 + 1.0,
            TaperExtent::First => -1.5,
            TaperExtent::Periods(v) => v,
        };
        let p_taper = config.p_start as f64 + n;
        let taper_length = config.taper_length.0 + (n - 1.0) * period;
        let (a_t, b_t, x_t) = (a * p_taper, b * p_taper, x * p_taper);
        let x_out = a_t + x_t - taper_length + config.grating_line_width.0 / 2.0;

        let half = config.wg_width.0 / 2.0;
        let mut outline = vec![DPoint::new(x_out, half), DPoint::new(x_out, -half)];
        outline.extend(ellipse_arc(
            a_t,
            b_t,
            x_t + period,
            -config.taper_angle / 2.0,
            config.taper_angle / 2.0,
            TOOTH_ANGLE_STEP,
        ));
        let offset = config.taper_offset.to_dbu(dbu).0;
        if let Some(layer) = config.layer_taper {
            let taper = Polygon::new(outline.iter().map(|p| p.to_dbu(dbu)).collect());
            c.insert_shape(layer, taper.translated(offset, 0));
        }

        let shift = -(Um(x_out).to_dbu(dbu).0 + offset);
        c.transform(&Transform::translate(shift, 0));

        if let Some(layer) = config.layer_taper {
            c.add_port(Port::at("o1", 0, 0, 180.0, wg_width, layer))?;
        }
        let x_launch = config
            .x_fiber_launch
            .unwrap_or(Um(config.p_start as f64 * a - config.grating_line_width.0 + 9.0));
        c.add_port(
            Port::at("FL", x_launch.to_dbu(dbu).0, 0, 0.0, FIBRE_LAUNCH_WIDTH, WG)
                .with_type(PortType::FibreLaunch),
        )?;

        c.set_info("polarization", config.polarization)?;
        c.set_info("wavelength", config.lambda_c.0 * 1e3)?;
        c.set_info("period", period)?;
        Ok(())
    })
}

pub fn grating_coupler_te(lib: &Library) -> LayoutResult<Arc<Cell>> {
    grating_coupler_elliptical(lib, &GratingCouplerConfig::te())
}

pub fn grating_coupler_tm(lib: &Library) -> LayoutResult<Arc<Cell>> {
    grating_coupler_elliptical(lib, &GratingCouplerConfig::tm())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_te_grating_ports_and_info() {
        let lib = Library::new("test");
        let cell = grating_coupler_elliptical(&lib, &GratingCouplerConfig::te()).unwrap();
        let o1 = cell.port("o1").unwrap();
        assert_eq!(o1.position(), Point::new(0, 0));
        assert_eq!(o1.orientation(), 180.0);
        assert_eq!(o1.width, Dbu(500));
        let fl = cell.port("FL").unwrap();
        assert_eq!(fl.port_type, PortType::FibreLaunch);
        assert_eq!(fl.width, Dbu(100));
        assert_eq!(cell.info_str("polarization"), Some("te"));
        assert!((cell.info_f64("wavelength").unwrap() - 1554.0).abs() < 1e-9);
        let period = cell.info_f64("period").unwrap();
        assert!((period - 0.686).abs() < 1e-3);
    }

    #[test]
    fn test_taper_starts_at_origin() {
        let lib = Library::new("test");
        let cell = grating_coupler_elliptical(&lib, &GratingCouplerConfig::te()).unwrap();
        let taper = cell.region(WG).bbox().unwrap();
        assert_eq!(taper.left(), 0);
        assert_eq!((taper.bottom() + taper.top()), 0);
    }

    #[test]
    fn test_one_trench_per_tooth() {
        let lib = Library::new("test");
        let config = GratingCouplerConfig::tm();
        let cell = grating_coupler_elliptical(&lib, &config).unwrap();
        let trenches = cell.region(UNDERCUT).merged();
        assert_eq!(trenches.len(), config.n_periods as usize + 2);
    }

    #[test]
    fn test_spikes_add_area() {
        let lib = Library::new("test");
        let spiked = grating_coupler_elliptical(&lib, &GratingCouplerConfig::te()).unwrap();
        let plain = grating_coupler_elliptical(
            &lib,
            &GratingCouplerConfig {
                spiked: false,
                ..GratingCouplerConfig::te()
            },
        )
        .unwrap();
        assert_ne!(spiked.name, plain.name);
        assert!(spiked.region(UNDERCUT).area() > plain.region(UNDERCUT).area());
    }

    #[test]
    fn test_tooth_spikes_sit_on_end_caps() {
        let plain = grating_tooth(20.0, 18.0, 2.0, 0.3, 50.0, false, 0.001).unwrap();
        let spiked = grating_tooth(20.0, 18.0, 2.0, 0.3, 50.0, true, 0.001).unwrap();
        assert_eq!(spiked.len(), 1);
        let extra = spiked.area() - plain.area();
        // two triangles, base 300 dbu, height 100 dbu
        assert!((extra - 2.0 * 0.5 * 300.0 * 100.0).abs() < 2_000.0);
    }

    #[test]
    fn test_period_overrides_neff() {
        let config = GratingCouplerConfig {
            period: Some(Um(0.7)),
            ..GratingCouplerConfig::te()
        };
        let e = Ellipses::new(&config).unwrap();
        assert!((e.period - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_line_width_beyond_period_rejected() {
        let lib = Library::new("test");
        let config = GratingCouplerConfig {
            grating_line_width: Um(2.0),
            ..GratingCouplerConfig::te()
        };
        assert!(matches!(
            grating_coupler_elliptical(&lib, &config),
            Err(LayoutError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = serde_json::from_str::<GratingCouplerConfig>(r#"{"n_period": 3}"#);
        assert!(err.is_err());
        let ok: GratingCouplerConfig =
            serde_json::from_str(r#"{"taper_extent": {"periods": 2.5}, "polarization": "tm"}"#)
                .unwrap();
        assert_eq!(ok.taper_extent, TaperExtent::Periods(2.5));
    }

    #[test]
    fn test_presets_differ_by_polarization() {
        let lib = Library::new("test");
        let te = grating_coupler_te(&lib).unwrap();
        let tm = grating_coupler_tm(&lib).unwrap();
        assert_ne!(te.name, tm.name);
        assert_eq!(tm.info_str("polarization"), Some("tm"));
        assert!((tm.info_f64("wavelength").unwrap() - 1580.0).abs() < 1e-9);
    }

    #[test]
    fn test_period_index_overflow_rejected() {
        let lib = Library::new("test");
        let config = GratingCouplerConfig {
            p_start: u32::MAX - 1,
            n_periods: 1,
            ..GratingCouplerConfig::te()
        };
        let err = grating_coupler_elliptical(&lib, &config).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidParameter { ref name, .. } if name == "n_periods"));
        assert_eq!(lib.cell_count(), 0);
    }
}
