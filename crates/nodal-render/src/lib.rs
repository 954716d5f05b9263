pub mod grid;
pub mod layout;
pub mod palette;
pub mod path;

pub use grid::{GridLines, GridStyle, grid_lines};
pub use layout::NodeMetrics;
pub use palette::{Color, socket_color};
pub use path::connection_path;

// Re-export kurbo types so downstream crates share one geometry vocabulary
pub use kurbo::{Point, Rect, Vec2};
