use thiserror::Error;

use crate::layer::LayerId;
use crate::region::Region;

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Port '{port}' not found on cell '{cell}'")]
    PortNotFound { cell: String, port: String },

    #[error("No route from '{from}' to '{to}': {reason}")]
    RouteInfeasible {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Geometry of cell '{cell}' differs on layer {layer} ({} polygons)", diff.len())]
    GeometryMismatch {
        cell: String,
        layer: LayerId,
        diff: Region,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type LayoutResult<T> = Result<T, LayoutError>;

impl LayoutError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        LayoutError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn port_not_found(cell: &str, port: &str) -> Self {
        LayoutError::PortNotFound {
            cell: cell.to_string(),
            port: port.to_string(),
        }
    }
}
