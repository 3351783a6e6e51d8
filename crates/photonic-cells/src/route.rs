//! Point-to-point optical routing between two Manhattan ports.

use std::sync::Arc;

use log::debug;
use photonic_core::transform::quarter_turns;
use photonic_core::{Cell, CellBuilder, InstanceId, LayoutError, LayoutResult, Library, Point, Port};

use crate::factory::CellFactory;

type Dir = (i64, i64);

fn axis(port: &Port) -> Option<Dir> {
    if port.trans.is_complex() {
        return None;
    }
    quarter_turns(port.orientation()).map(|q| match q {
        0 => (1, 0),
        1 => (0, 1),
        2 => (-1, 0),
        _ => (0, -1),
    })
}

fn dot(v: Point, d: Dir) -> i64 {
    v.x * d.0 + v.y * d.1
}

fn left_of(d: Dir) -> Dir {
    (-d.1, d.0)
}

fn infeasible(p1: &Port, p2: &Port, reason: impl Into<String>) -> LayoutError {
    LayoutError::RouteInfeasible {
        from: p1.name.clone(),
        to: p2.name.clone(),
        reason: reason.into(),
    }
}

/// How a 90° bend cell advances a route: `along` in the incoming direction,
/// `lateral` in the outgoing one.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    along: i64,
    lateral: i64,
    turns_left: bool,
}

impl Footprint {
    fn of(bend: &Cell) -> LayoutResult<Self> {
        let bad = |reason: &str| LayoutError::invalid("bend90", format!("{}: {reason}", bend.name));
        let (o1, o2) = (bend.port("o1")?, bend.port("o2")?);
        let (inward, out) = match (axis(o1), axis(o2)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(bad("ports must be on the grid and axis aligned")),
        };
        let travel = (-inward.0, -inward.1);
        let cross = travel.0 * out.1 - travel.1 * out.0;
        if cross == 0 {
            return Err(bad("does not turn by 90°"));
        }
        let d = o2.position() - o1.position();
        let (along, lateral) = (dot(d, travel), dot(d, out));
        if along <= 0 || lateral <= 0 {
            return Err(bad("ports are not at opposite corners"));
        }
        Ok(Self {
            along,
            lateral,
            turns_left: cross > 0,
        })
    }

    fn span(&self) -> i64 {
        self.along + self.lateral
    }
}

/// Appends straights and bends to `c`, tracking the open end.
struct Router<'a> {
    c: &'a mut CellBuilder,
    lib: &'a Library,
    straight: &'a dyn CellFactory,
    bend: &'a Arc<Cell>,
    footprint: Footprint,
    head: Port,
    placed: Vec<InstanceId>,
}

impl Router<'_> {
    fn straight(&mut self, length: i64) -> LayoutResult<()> {
        if length == 0 {
            return Ok(());
        }
        let overrides = crate::overrides!("width" => self.head.width.0, "length" => length);
        let cell = self.straight.build(self.lib, &overrides)?;
        self.attach(cell, false)
    }

    fn bend(&mut self, left: bool) -> LayoutResult<()> {
        let mirror = left != self.footprint.turns_left;
        self.attach(self.bend.clone(), mirror)
    }

    fn attach(&mut self, cell: Arc<Cell>, mirror: bool) -> LayoutResult<()> {
        let inst = self.c.create_inst(cell);
        self.c.inst_mut(inst).connect("o1", &self.head, mirror)?;
        self.head = self.c.inst(inst).port("o2")?;
        self.placed.push(inst);
        Ok(())
    }
}

/// Join `p1` to `p2` with straights from `straight` and copies of `bend90`.
///
/// Supported shapes: a single straight between collinear ports facing each
/// other, an L with one bend between perpendicular ports, and a Z with two
/// bends between antiparallel ports. Anything else fails with
/// [`LayoutError::RouteInfeasible`]. Straights are requested with `width`
/// and `length` overrides in database units.
pub fn route(
    c: &mut CellBuilder,
    lib: &Library,
    p1: &Port,
    p2: &Port,
    straight: &dyn CellFactory,
    bend90: &Arc<Cell>,
) -> LayoutResult<Vec<InstanceId>> {
    let (u, w) = match (axis(p1), axis(p2)) {
        (Some(u), Some(d2)) => (u, (-d2.0, -d2.1)),
        _ => return Err(infeasible(p1, p2, "ports must face along an axis")),
    };
    let footprint = Footprint::of(bend90)?;
    let v = p2.position() - p1.position();
    let along = dot(v, u);
    let n = left_of(u);
    let lateral = dot(v, n);

    let mut router = Router {
        c,
        lib,
        straight,
        bend: bend90,
        footprint,
        head: p1.clone(),
        placed: Vec::new(),
    };

    if w == u {
        if lateral == 0 {
            if along < 0 {
                return Err(infeasible(p1, p2, "target lies behind the start port"));
            }
            router.straight(along)?;
        } else {
            let span = footprint.span();
            if along < span {
                return Err(infeasible(
                    p1,
                    p2,
                    format!("{along} dbu along the axis, two bends need {span}"),
                ));
            }
            if lateral.abs() < span {
                return Err(infeasible(
                    p1,
                    p2,
                    format!("lateral offset {} dbu, two bends need {span}", lateral.abs()),
                ));
            }
            let left = lateral > 0;
            router.straight(along - span)?;
            router.bend(left)?;
            router.straight(lateral.abs() - span)?;
            router.bend(!left)?;
        }
    } else if w == (-u.0, -u.1) {
        return Err(infeasible(p1, p2, "ports face the same way"));
    } else {
        let before = along - footprint.along;
        let after = dot(v, w) - footprint.lateral;
        if before < 0 || after < 0 {
            return Err(infeasible(
                p1,
                p2,
                "corner is closer than one bend to either port",
            ));
        }
        router.straight(before)?;
        router.bend(w == n)?;
        router.straight(after)?;
    }

    if router.head.position() != p2.position() {
        return Err(infeasible(
            p1,
            p2,
            format!(
                "route ends at {:?}, target is at {:?}",
                router.head.position(),
                p2.position()
            ),
        ));
    }
    debug!(
        "routed {} -> {} with {} instances",
        p1.name,
        p2.name,
        router.placed.len()
    );
    Ok(router.placed)
}
