//! Graphics objects mirroring domain entities.
//!
//! Each object keeps the identifier of its domain counterpart plus a
//! snapshot of the attributes layout and painting need. `scope` is the graph
//! scope the object is attached to; `ports` / `child_ports` form the
//! separate rendering tree used for placement.

use kurbo::Point;
use nodal_core::{Connection, Identifier, Node, Port, PortDirection, PortType};
use nodal_render::{Color, socket_color};
use smallvec::SmallVec;

// ─── Mirrors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsNode {
    pub id: Identifier,
    pub name: String,
    pub position: Point,
    /// The graph this node owns; double-clicking enters it.
    pub child_graph: Identifier,
    /// The scope this node is attached to, if any.
    pub scope: Option<Identifier>,
    /// Top-level ports in stacking order.
    pub ports: SmallVec<[Identifier; 4]>,
}

impl GraphicsNode {
    pub fn from_domain(node: &Node, position: Point) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            position,
            child_graph: node.child_graph,
            scope: None,
            ports: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPort {
    pub id: Identifier,
    pub name: String,
    pub direction: PortDirection,
    pub port_type: PortType,
    /// Socket color, from the port type.
    pub color: Color,
    pub node: Identifier,
    pub parent_port: Option<Identifier>,
    pub child_ports: Vec<Identifier>,
    pub scope: Option<Identifier>,
}

impl GraphicsPort {
    pub fn from_domain(port: &Port) -> Self {
        Self {
            id: port.id,
            name: port.name.clone(),
            direction: port.direction,
            port_type: port.port_type,
            color: socket_color(port.port_type),
            node: port.node,
            parent_port: port.parent_port,
            child_ports: Vec::new(),
            scope: None,
        }
    }
}

/// One end of a drawn connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Socket {
    /// A port of a node inside the scope.
    Port(Identifier),
    /// A boundary port mirroring the given port of the scope's parent node.
    Virtual(Identifier),
}

impl Socket {
    pub fn port(self) -> Identifier {
        match self {
            Socket::Port(id) | Socket::Virtual(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsConnection {
    pub id: Identifier,
    pub source: Identifier,
    pub target: Identifier,
    pub scope: Option<Identifier>,
    /// Resolved sockets, set while attached.
    pub endpoints: Option<(Socket, Socket)>,
}

impl GraphicsConnection {
    pub fn from_domain(connection: &Connection) -> Self {
        Self {
            id: connection.id,
            source: connection.source,
            target: connection.target,
            scope: None,
            endpoints: None,
        }
    }
}

// ─── Boundary ────────────────────────────────────────────────────────────

/// A port on a boundary node. It has no identity of its own: `mirrors` is
/// the parent-node port it stands for, and `direction` is that port's
/// direction inverted.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualPort {
    pub mirrors: Identifier,
    pub name: String,
    pub direction: PortDirection,
    pub port_type: PortType,
}

impl VirtualPort {
    pub fn mirroring(port: &Port) -> Self {
        Self {
            mirrors: port.id,
            name: port.name.clone(),
            direction: port.direction.inverted(),
            port_type: port.port_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    Input,
    Output,
}

impl BoundarySide {
    pub fn name(self) -> &'static str {
        match self {
            BoundarySide::Input => "Input",
            BoundarySide::Output => "Output",
        }
    }
}

/// Synthetic node exposing the parent node's ports inside a sub-graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryNode {
    pub side: BoundarySide,
    pub position: Point,
    pub ports: Vec<VirtualPort>,
}

impl BoundaryNode {
    pub fn new(side: BoundarySide, position: Point) -> Self {
        Self {
            side,
            position,
            ports: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.side.name()
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────

/// What a double-click on an item asks the navigator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Make the given graph the active scope.
    Enter(Identifier),
    /// Go up to the parent scope.
    Leave,
    Stay,
}

pub trait Clickable {
    fn double_click(&self) -> Navigation;
}

/// A port reference usable as a connection end, with the direction it plays
/// in the scope it is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub port: Identifier,
    pub direction: PortDirection,
}

pub trait Connectable {
    fn endpoint(&self) -> Endpoint;
}

impl Clickable for GraphicsNode {
    fn double_click(&self) -> Navigation {
        Navigation::Enter(self.child_graph)
    }
}

impl Clickable for GraphicsPort {
    fn double_click(&self) -> Navigation {
        Navigation::Stay
    }
}

impl Clickable for GraphicsConnection {
    fn double_click(&self) -> Navigation {
        Navigation::Stay
    }
}

impl Clickable for BoundaryNode {
    fn double_click(&self) -> Navigation {
        Navigation::Stay
    }
}

impl Connectable for GraphicsPort {
    fn endpoint(&self) -> Endpoint {
        Endpoint {
            port: self.id,
            direction: self.direction,
        }
    }
}

impl Connectable for VirtualPort {
    fn endpoint(&self) -> Endpoint {
        Endpoint {
            port: self.mirrors,
            direction: self.direction,
        }
    }
}

/// The item found under a canvas point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Node(Identifier),
    /// The socket of a port.
    Port(Identifier),
    /// The socket of a virtual port, by mirrored port.
    Virtual(Identifier),
    Boundary(BoundarySide),
    Connection(Identifier),
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(direction: PortDirection) -> Port {
        Port {
            id: Identifier::new(),
            name: "value".into(),
            direction,
            port_type: PortType::intern("int"),
            node: Identifier::new(),
            parent_port: None,
            child_ports: Vec::new(),
        }
    }

    #[test]
    fn virtual_port_inverts_direction() {
        let input = port(PortDirection::Input);
        let virtual_port = VirtualPort::mirroring(&input);
        assert_eq!(virtual_port.direction, PortDirection::Output);
        assert_eq!(
            virtual_port.endpoint(),
            Endpoint {
                port: input.id,
                direction: PortDirection::Output
            }
        );
    }

    #[test]
    fn port_color_follows_its_type() {
        let mut float = port(PortDirection::Input);
        float.port_type = PortType::intern("float");
        assert_eq!(GraphicsPort::from_domain(&float).color, Color::from_hex("#8abeb7").unwrap());
        let mut mesh = port(PortDirection::Input);
        mesh.port_type = PortType::intern("Mesh");
        assert_eq!(GraphicsPort::from_domain(&mesh).color, nodal_render::palette::LIGHT_GRAY);
    }

    #[test]
    fn double_click_on_node_enters_its_graph() {
        let node = Node {
            id: Identifier::new(),
            name: "A".into(),
            graph: Identifier::new(),
            ports: SmallVec::new(),
            child_graph: Identifier::new(),
        };
        let graphics = GraphicsNode::from_domain(&node, Point::ORIGIN);
        assert_eq!(graphics.double_click(), Navigation::Enter(node.child_graph));
    }
}
