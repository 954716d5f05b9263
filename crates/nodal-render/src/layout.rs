//! Node geometry: port rows and socket placement.
//!
//! A node is a header strip followed by one row per visible port, stacked
//! top to bottom. Input sockets sit on the left edge of their row, output
//! sockets on the right edge.

use kurbo::{Point, Rect, Size, Vec2};
use nodal_core::PortDirection;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeMetrics {
    pub width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub socket_radius: f64,
    /// Horizontal inset of sockets from the node edge.
    pub socket_offset: f64,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            width: 150.0,
            header_height: 5.0,
            row_height: 25.0,
            socket_radius: 6.0,
            socket_offset: 0.0,
        }
    }
}

impl NodeMetrics {
    /// Outline of a node at `position` with `rows` port rows.
    pub fn node_rect(&self, position: Point, rows: usize) -> Rect {
        Rect::from_origin_size(
            position,
            Size::new(self.width, self.header_height + self.row_height * rows as f64),
        )
    }

    /// Rectangle of the `index`-th port row of a node at `position`.
    pub fn row_rect(&self, position: Point, index: usize) -> Rect {
        let origin = position + Vec2::new(0.0, self.header_height + self.row_height * index as f64);
        Rect::from_origin_size(origin, Size::new(self.width, self.row_height))
    }

    /// Canvas position of the socket of a port row.
    pub fn socket_position(&self, row: Rect, direction: PortDirection) -> Point {
        let x = match direction {
            PortDirection::Input => row.x0 + self.socket_offset,
            PortDirection::Output => row.x1 - self.socket_offset,
        };
        Point::new(x, row.center().y)
    }

    /// Sockets accept clicks in twice their drawn radius.
    pub fn socket_hit(&self, socket: Point, at: Point) -> bool {
        socket.distance(at) <= self.socket_radius * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_height_grows_with_rows() {
        let m = NodeMetrics::default();
        let rect = m.node_rect(Point::new(10.0, 20.0), 2);
        assert_eq!(rect, Rect::new(10.0, 20.0, 160.0, 75.0));
    }

    #[test]
    fn sockets_sit_on_row_edges() {
        let m = NodeMetrics::default();
        let row = m.row_rect(Point::ORIGIN, 1);
        assert_eq!(row, Rect::new(0.0, 30.0, 150.0, 55.0));
        assert_eq!(m.socket_position(row, PortDirection::Input), Point::new(0.0, 42.5));
        assert_eq!(m.socket_position(row, PortDirection::Output), Point::new(150.0, 42.5));
        assert!(m.socket_hit(Point::new(150.0, 42.5), Point::new(160.0, 42.5)));
        assert!(!m.socket_hit(Point::new(150.0, 42.5), Point::new(170.0, 42.5)));
    }
}
