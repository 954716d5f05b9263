//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "zoom_factor": 1.5, "node_width": 180.0 }
//! ```

use crate::error::SyncError;
use nodal_render::{GridStyle, NodeMetrics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Fine grid spacing in canvas units.
    pub grid_square: i64,
    /// Fine squares per coarse grid cell.
    pub grid_cells: i64,
    pub node_width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub socket_radius: f64,
    /// Distance of the Input/Output boundary nodes from the viewport edge.
    pub boundary_margin: f64,
    /// Scale applied per wheel step.
    pub zoom_factor: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_square: 25,
            grid_cells: 10,
            node_width: 150.0,
            header_height: 5.0,
            row_height: 25.0,
            socket_radius: 6.0,
            boundary_margin: 50.0,
            zoom_factor: 1.25,
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        serde_json::from_str(text).map_err(SyncError::Config)
    }

    pub fn metrics(&self) -> NodeMetrics {
        NodeMetrics {
            width: self.node_width,
            header_height: self.header_height,
            row_height: self.row_height,
            socket_radius: self.socket_radius,
            ..NodeMetrics::default()
        }
    }

    pub fn grid(&self) -> GridStyle {
        GridStyle {
            square_size: self.grid_square,
            cell_size: self.grid_cells,
        }
    }
}
