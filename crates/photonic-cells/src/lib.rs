//! # Photonic Cells
//!
//! Parametric builders for photonic layout cells on top of `photonic-core`.
//! Every builder takes one configuration record, derives a deterministic
//! cell name from it and registers the result in a [`Library`], so equal
//! parameters always yield the same shared cell.
//!
//! [`Library`]: photonic_core::Library

pub mod layers;
pub mod curves;
pub mod factory;
pub mod straight;
pub mod taper;
pub mod bezier;
pub mod circular;
pub mod euler;
pub mod coupler;
pub mod grating;
pub mod route;
pub mod mzi;
pub mod gpdk;

pub use bezier::{bend_s, BendSConfig};
pub use circular::{bend_circular, BendCircularConfig};
pub use coupler::{coupler, straight_coupler, CouplerConfig, StraightCouplerConfig};
pub use euler::{bend_euler, BendEulerConfig};
pub use factory::{Bound, CellConfig, CellFactory, Overrides};
pub use grating::{
    grating_coupler_elliptical, grating_coupler_te, grating_coupler_tm, GratingCouplerConfig,
    Polarization,
};
pub use mzi::{mzi, CombinerOffset, MziConfig, MziFactories};
pub use route::route;
pub use straight::{straight, straight_dbu, StraightConfig, StraightDbuConfig};
pub use taper::{taper, TaperConfig};
