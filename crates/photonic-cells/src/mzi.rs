//! Mach-Zehnder interferometer.

use std::fmt;
use std::sync::Arc;

use photonic_core::{
    cell_name, Cell, CellBuilder, Dbu, Enclosure, Instance, InstanceId, LayerId, LayoutError,
    LayoutResult, Library, Port, Transform, Um,
};
use serde::{Deserialize, Serialize};

use crate::coupler::CouplerConfig;
use crate::euler::BendEulerConfig;
use crate::factory::{Bound, CellConfig, CellFactory, Overrides};
use crate::layers::WG;
use crate::route::route;
use crate::straight::{grid_width, StraightConfig, StraightDbuConfig};

/// Where the combiner goes relative to the end of the top arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinerOffset {
    /// Combiner west ports `k` bend footprints east of the arm ends.
    BendMultiple(u32),
    /// Two bend footprints plus a straight of at least this length.
    MinStraight(Um),
}

impl Default for CombinerOffset {
    fn default() -> Self {
        CombinerOffset::BendMultiple(2)
    }
}

/// ```text
///                b2______b3
///               |  sxtop  |
///       straight_y        |
///               |         |
///               b1        b4
///     splitter==|         |==combiner
///               b5        b8
///               |         |
///       straight_y        |
///               |         |
/// delta_length/2          |
///               |         |
///              b6__sxbot__b7
///                   Lx
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MziConfig {
    /// Extra vertical length of the bottom arm.
    pub delta_length: Um,
    /// Vertical length of both arms.
    pub length_y: Um,
    /// Horizontal length of both arms; `None` keeps the straight factory's
    /// own length.
    pub length_x: Option<Um>,
    /// Without it the arm inputs are exposed instead of the splitter.
    pub with_splitter: bool,
    pub port_e1_splitter: String,
    pub port_e0_splitter: String,
    pub port_e0_combiner: String,
    pub width: Um,
    pub layer: LayerId,
    pub radius: Um,
    pub enclosure: Option<Enclosure>,
    pub combiner_offset: CombinerOffset,
    /// Extra settings for the splitter and combiner factories.
    pub splitter_settings: Overrides,
}

impl Default for MziConfig {
    fn default() -> Self {
        Self {
            delta_length: Um(10.0),
            length_y: Um(2.0),
            length_x: Some(Um(0.1)),
            with_splitter: true,
            port_e1_splitter: "o3".to_string(),
            port_e0_splitter: "o4".to_string(),
            port_e0_combiner: "o1".to_string(),
            width: Um(1.0),
            layer: WG,
            radius: Um(5.0),
            enclosure: None,
            combiner_offset: CombinerOffset::default(),
            splitter_settings: Overrides::new(),
        }
    }
}

/// Sub-cell factories of an interferometer.
#[derive(Clone)]
pub struct MziFactories {
    /// 90° bend; called with `width`, `layer`, `radius`, `enclosure`.
    pub bend: Arc<dyn CellFactory>,
    /// Called with `length`, `width`, `layer`, `enclosure`.
    pub straight: Arc<dyn CellFactory>,
    pub straight_y: Option<Arc<dyn CellFactory>>,
    pub straight_x_top: Option<Arc<dyn CellFactory>>,
    pub straight_x_bot: Option<Arc<dyn CellFactory>>,
    /// Called with `width`, `layer`, `enclosure` and the splitter settings.
    pub splitter: Arc<dyn CellFactory>,
    /// Defaults to the splitter.
    pub combiner: Option<Arc<dyn CellFactory>>,
}

impl Default for MziFactories {
    fn default() -> Self {
        Self {
            bend: Arc::new(Bound::new(BendEulerConfig::new(Um(1.0), Um(5.0), WG))),
            straight: Arc::new(Bound::new(StraightConfig {
                width: Um(1.0),
                length: Um(10.0),
                layer: WG,
                enclosure: None,
            })),
            straight_y: None,
            straight_x_top: None,
            straight_x_bot: None,
            splitter: Arc::new(Bound::new(CouplerConfig::default())),
            combiner: None,
        }
    }
}

impl fmt::Debug for MziFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MziFactories")
            .field("straight_y", &self.straight_y.is_some())
            .field("straight_x_top", &self.straight_x_top.is_some())
            .field("straight_x_bot", &self.straight_x_bot.is_some())
            .field("combiner", &self.combiner.is_some())
            .finish_non_exhaustive()
    }
}

impl CellConfig for MziConfig {
    const BUILDER: &'static str = "mzi";

    fn build_cell(&self, lib: &Library) -> LayoutResult<Arc<Cell>> {
        mzi(lib, self, &MziFactories::default())
    }
}

fn settings(pairs: Vec<(&str, serde_json::Value)>) -> Overrides {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn straight_settings(config: &MziConfig, length: Option<Um>) -> LayoutResult<Overrides> {
    let mut s = settings(vec![
        ("width", serde_json::to_value(config.width)?),
        ("layer", serde_json::to_value(config.layer)?),
        ("enclosure", serde_json::to_value(&config.enclosure)?),
    ]);
    if let Some(length) = length {
        s.insert("length".to_string(), serde_json::to_value(length)?);
    }
    Ok(s)
}

fn port_of(c: &CellBuilder, inst: InstanceId, name: &str) -> LayoutResult<Port> {
    c.inst(inst).port(name)
}

/// Everything that decides the geometry: the record plus the names of the
/// cells the factories produced.
#[derive(Serialize)]
struct Identity<'a> {
    config: &'a MziConfig,
    bend: &'a str,
    splitter: &'a str,
    combiner: &'a str,
    straight_y_bot: &'a str,
    straight_y_top: &'a str,
    straight_x_top: &'a str,
    straight_x_bot: &'a str,
}

/// Interferometer with a bottom arm `delta_length` longer than the top arm.
pub fn mzi(lib: &Library, config: &MziConfig, f: &MziFactories) -> LayoutResult<Arc<Cell>> {
    let dbu = lib.dbu();
    let width = grid_width("width", config.width, dbu)?;

    let bend = f.bend.build(
        lib,
        &settings(vec![
            ("width", serde_json::to_value(config.width)?),
            ("layer", serde_json::to_value(config.layer)?),
            ("radius", serde_json::to_value(config.radius)?),
            ("enclosure", serde_json::to_value(&config.enclosure)?),
        ]),
    )?;
    let mut coupler_settings = config.splitter_settings.clone();
    coupler_settings.extend(settings(vec![
        ("width", serde_json::to_value(config.width)?),
        ("layer", serde_json::to_value(config.layer)?),
        ("enclosure", serde_json::to_value(&config.enclosure)?),
    ]));
    let splitter = f.splitter.build(lib, &coupler_settings)?;
    let combiner = match &f.combiner {
        Some(factory) => factory.build(lib, &coupler_settings)?,
        None => splitter.clone(),
    };

    let straight_y = f.straight_y.as_ref().unwrap_or(&f.straight);
    let sy_bot = straight_y.build(
        lib,
        &straight_settings(config, Some(config.delta_length / 2.0 + config.length_y))?,
    )?;
    let sy_top = straight_y.build(lib, &straight_settings(config, Some(config.length_y))?)?;
    let sx_top = f
        .straight_x_top
        .as_ref()
        .unwrap_or(&f.straight)
        .build(lib, &straight_settings(config, config.length_x)?)?;
    let sx_bot = f
        .straight_x_bot
        .as_ref()
        .unwrap_or(&f.straight)
        .build(lib, &straight_settings(config, config.length_x)?)?;

    let name = cell_name(
        MziConfig::BUILDER,
        &Identity {
            config,
            bend: &bend.name,
            splitter: &splitter.name,
            combiner: &combiner.name,
            straight_y_bot: &sy_bot.name,
            straight_y_top: &sy_top.name,
            straight_x_top: &sx_top.name,
            straight_x_bot: &sx_bot.name,
        },
    )?;

    let connector = Bound::new(StraightDbuConfig {
        width,
        length: Dbu(0),
        layer: config.layer,
        enclosure: config.enclosure.clone(),
    });

    lib.lookup_or_build(&name, |c| {
        let cp1 = Instance::new(splitter.clone(), Transform::identity());
        if config.with_splitter {
            c.create_inst(splitter.clone());
        }

        let place = |c: &mut CellBuilder, cell: &Arc<Cell>, port: &str, target: &Port, mirror| {
            let inst = c.create_inst(cell.clone());
            c.inst_mut(inst).connect(port, target, mirror)?;
            Ok::<_, LayoutError>(inst)
        };

        // bottom arm, turning south out of the splitter
        let b5 = place(c, &bend, "o1", &cp1.port(&config.port_e0_splitter)?, true)?;
        let t = port_of(c, b5, "o2")?;
        let syl = place(c, &sy_bot, "o1", &t, false)?;
        let t = port_of(c, syl, "o2")?;
        let b6 = place(c, &bend, "o1", &t, false)?;
        let t = port_of(c, b6, "o2")?;
        let sxb = place(c, &sx_bot, "o1", &t, false)?;

        // top arm, the second bend traversed backwards
        let b1 = place(c, &bend, "o1", &cp1.port(&config.port_e1_splitter)?, false)?;
        let t = port_of(c, b1, "o2")?;
        let sytl = place(c, &sy_top, "o1", &t, false)?;
        let t = port_of(c, sytl, "o2")?;
        let b2 = place(c, &bend, "o2", &t, false)?;
        let t = port_of(c, b2, "o1")?;
        let sxt = place(c, &sx_top, "o1", &t, false)?;

        let footprint = (bend.port("o2")?.position().x - bend.port("o1")?.position().x).abs();
        let offset = match config.combiner_offset {
            CombinerOffset::BendMultiple(k) => i64::from(k) * footprint,
            CombinerOffset::MinStraight(len) => 2 * footprint + len.to_dbu(dbu).0,
        };
        let cp2 = place(
            c,
            &combiner,
            config.port_e0_combiner.as_str(),
            &cp1.port(&config.port_e0_splitter)?,
            false,
        )?;
        let top_end = port_of(c, sxt, "o2")?;
        let bot_end = port_of(c, sxb, "o2")?;
        let dx = top_end.position().x + offset - port_of(c, cp2, "o1")?.position().x;
        c.inst_mut(cp2).transform(&Transform::translate(dx, 0));

        let top_start = port_of(c, cp2, "o2")?;
        route(c, lib, &top_start, &top_end, &connector, &bend)?;
        let bot_start = port_of(c, cp2, "o1")?;
        route(c, lib, &bot_start, &bot_end, &connector, &bend)?;

        let inputs = if config.with_splitter {
            cp1.ports()
                .into_iter()
                .filter(|p| p.orientation() == 180.0)
                .collect()
        } else {
            vec![port_of(c, b1, "o1")?, port_of(c, b5, "o1")?]
        };
        let outputs: Vec<Port> = c
            .inst(cp2)
            .ports()
            .into_iter()
            .filter(|p| p.orientation() == 0.0)
            .collect();
        for (i, p) in inputs.iter().enumerate() {
            c.add_port_as(&format!("in{i}"), p)?;
        }
        for (i, p) in outputs.iter().enumerate() {
            c.add_port_as(&format!("out{i}"), p)?;
        }
        c.autorename_ports();

        c.set_info("delta_length_um", config.delta_length)?;
        Ok(())
    })
}
