//! Builds the two chain samples and prints a summary of each.

use std::process::ExitCode;

use log::{error, info};
use photonic_cells::gpdk::{bend_euler_sc, straight_sc};
use photonic_cells::{overrides, CellFactory};
use photonic_core::{Cell, LayoutResult, Library};

/// Two 37° Euler bends, the second connected to the first.
fn bend_chain(lib: &Library) -> LayoutResult<std::sync::Arc<Cell>> {
    let bend = bend_euler_sc(lib).build(lib, &overrides!("angle" => 37.0))?;
    lib.lookup_or_build("bend_chain", |c| {
        let b1 = c.create_inst(bend.clone());
        let b2 = c.create_inst(bend.clone());
        let target = c.inst(b1).port("o2")?;
        c.inst_mut(b2).connect("o1", &target, false)?;
        Ok(())
    })
}

/// A straight 1.5 nm longer than 1 µm followed by a 1 µm one.
fn straight_chain(lib: &Library) -> LayoutResult<std::sync::Arc<Cell>> {
    let nm = 1e-3;
    let s1 = straight_sc(lib).build(lib, &overrides!("length" => 1.0 + 1.5 * nm))?;
    let s2 = straight_sc(lib).build(lib, &overrides!("length" => 1.0))?;
    lib.lookup_or_build("straight_chain", |c| {
        let a = c.create_inst(s1.clone());
        let b = c.create_inst(s2.clone());
        let target = c.inst(a).port("o2")?;
        c.inst_mut(b).connect("o1", &target, false)?;
        Ok(())
    })
}

fn run() -> LayoutResult<()> {
    let lib = Library::new("samples");
    for cell in [bend_chain(&lib)?, straight_chain(&lib)?] {
        let bbox = cell.bbox();
        info!(
            "{}: {} instances, bbox {:?}",
            cell.name,
            cell.instances().len(),
            bbox
        );
        for inst in cell.instances() {
            info!("  {} at {:?}", inst.cell.name, inst.trans);
        }
    }
    info!("library holds {} cells", lib.cell_count());
    println!("{}", lib.to_json()?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
