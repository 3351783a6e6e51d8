//! # Photonic Core
//!
//! Layout kernel for parametric photonic cells: integer geometry, the
//! quarter-turn and arbitrary-angle transform algebra, ports, immutable
//! cells with a connect/align placement protocol, a polygon region engine
//! on top of `geo`, enclosures, deterministic naming and the cell registry.

pub mod units;
pub mod geometry;
pub mod transform;
pub mod layer;
pub mod port;
pub mod error;
pub mod region;
pub mod enclosure;
pub mod spatial;
pub mod cell;
pub mod naming;
pub mod registry;
pub mod golden;

pub use cell::{Cell, CellBuilder, CellId, Instance, InstanceId};
pub use enclosure::{Enclosure, Section};
pub use error::{LayoutError, LayoutResult};
pub use geometry::{BBox, DPoint, Edge, Point, Polygon};
pub use layer::{Layer, LayerId, LayerMap};
pub use naming::cell_name;
pub use port::{Port, PortType};
pub use region::Region;
pub use registry::{Library, LibraryConfig};
pub use transform::{CplxTrans, Trans, Transform};
pub use units::{Dbu, Um, DEFAULT_DBU};
