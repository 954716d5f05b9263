//! Nested-graph views: one canvas per graph scope.
//!
//! A `GraphicsGraph` records which registered nodes, ports and connections
//! are attached to its scope. Attachment is idempotent in both directions so
//! that a notification replayed after a hierarchical detach (a node taking
//! its ports with it, a port taking its connections) is harmless.
//!
//! Non-root scopes carry a `Boundary`: an Input and an Output node whose
//! virtual ports mirror the parent node's ports with inverted direction.

use crate::error::SyncError;
use crate::items::{BoundaryNode, BoundarySide, Hit, Socket, VirtualPort};
use crate::registry::Registry;
use kurbo::{BezPath, Point, Rect};
use nodal_core::{EntityKind, Identifier, Port, PortDirection};
use nodal_render::layout::NodeMetrics;
use nodal_render::path::{connection_path, distance_to};
use nodal_render::{GridLines, GridStyle, grid_lines};

/// The identifiers attached to one scope, in attachment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attached {
    pub nodes: Vec<Identifier>,
    pub ports: Vec<Identifier>,
    pub connections: Vec<Identifier>,
}

fn insert(list: &mut Vec<Identifier>, id: Identifier) -> bool {
    if list.contains(&id) {
        false
    } else {
        list.push(id);
        true
    }
}

fn erase(list: &mut Vec<Identifier>, id: Identifier) -> bool {
    let before = list.len();
    list.retain(|x| *x != id);
    list.len() != before
}

// ─── Boundary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub input: BoundaryNode,
    pub output: BoundaryNode,
}

impl Boundary {
    pub fn new(input_at: Point, output_at: Point) -> Self {
        Self {
            input: BoundaryNode::new(BoundarySide::Input, input_at),
            output: BoundaryNode::new(BoundarySide::Output, output_at),
        }
    }

    pub fn side(&self, side: BoundarySide) -> &BoundaryNode {
        match side {
            BoundarySide::Input => &self.input,
            BoundarySide::Output => &self.output,
        }
    }

    fn side_mut(&mut self, side: BoundarySide) -> &mut BoundaryNode {
        match side {
            BoundarySide::Input => &mut self.input,
            BoundarySide::Output => &mut self.output,
        }
    }

    /// Add a virtual port for a parent-node port. The parent's inputs
    /// appear on the Input node, its outputs on the Output node. Returns
    /// false if the port is already mirrored.
    pub fn mirror(&mut self, port: &Port) -> bool {
        if self.virtual_port(port.id).is_some() {
            return false;
        }
        let side = match port.direction {
            PortDirection::Input => BoundarySide::Input,
            PortDirection::Output => BoundarySide::Output,
        };
        self.side_mut(side).ports.push(VirtualPort::mirroring(port));
        true
    }

    /// Remove the virtual port mirroring `port`, if any.
    pub fn unmirror(&mut self, port: Identifier) -> bool {
        let input = erase_virtual(&mut self.input, port);
        let output = erase_virtual(&mut self.output, port);
        input || output
    }

    pub fn rename(&mut self, port: Identifier, name: &str) -> bool {
        for node in [&mut self.input, &mut self.output] {
            if let Some(vp) = node.ports.iter_mut().find(|vp| vp.mirrors == port) {
                vp.name = name.to_string();
                return true;
            }
        }
        false
    }

    pub fn virtual_port(&self, port: Identifier) -> Option<&VirtualPort> {
        self.input
            .ports
            .iter()
            .chain(self.output.ports.iter())
            .find(|vp| vp.mirrors == port)
    }

    /// Position of a virtual port's socket.
    pub fn socket_position(&self, port: Identifier, metrics: &NodeMetrics) -> Option<Point> {
        [&self.input, &self.output].into_iter().find_map(|node| {
            let index = node.ports.iter().position(|vp| vp.mirrors == port)?;
            let row = metrics.row_rect(node.position, index);
            Some(metrics.socket_position(row, node.ports[index].direction))
        })
    }
}

fn erase_virtual(node: &mut BoundaryNode, port: Identifier) -> bool {
    let before = node.ports.len();
    node.ports.retain(|vp| vp.mirrors != port);
    node.ports.len() != before
}

// ─── GraphicsGraph ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsGraph {
    id: Identifier,
    parent_node: Option<Identifier>,
    attached: Attached,
    boundary: Option<Boundary>,
}

impl GraphicsGraph {
    #[must_use]
    pub fn new(id: Identifier, parent_node: Option<Identifier>) -> Self {
        Self {
            id,
            parent_node,
            attached: Attached::default(),
            boundary: None,
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn parent_node(&self) -> Option<Identifier> {
        self.parent_node
    }

    pub fn is_root(&self) -> bool {
        self.parent_node.is_none()
    }

    pub fn attached(&self) -> &Attached {
        &self.attached
    }

    pub fn nodes(&self) -> &[Identifier] {
        &self.attached.nodes
    }

    pub fn ports(&self) -> &[Identifier] {
        &self.attached.ports
    }

    pub fn connections(&self) -> &[Identifier] {
        &self.attached.connections
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub(crate) fn boundary_mut(&mut self) -> Option<&mut Boundary> {
        self.boundary.as_mut()
    }

    pub(crate) fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = Some(boundary);
    }

    pub(crate) fn attach_node(&mut self, id: Identifier) -> bool {
        insert(&mut self.attached.nodes, id)
    }

    pub(crate) fn detach_node(&mut self, id: Identifier) -> bool {
        erase(&mut self.attached.nodes, id)
    }

    pub(crate) fn attach_port(&mut self, id: Identifier) -> bool {
        insert(&mut self.attached.ports, id)
    }

    pub(crate) fn detach_port(&mut self, id: Identifier) -> bool {
        erase(&mut self.attached.ports, id)
    }

    pub(crate) fn attach_connection(&mut self, id: Identifier) -> bool {
        insert(&mut self.attached.connections, id)
    }

    pub(crate) fn detach_connection(&mut self, id: Identifier) -> bool {
        erase(&mut self.attached.connections, id)
    }

    /// Background grid lines for the visible part of the canvas.
    pub fn background(&self, visible: Rect, style: GridStyle) -> GridLines {
        grid_lines(visible, style)
    }
}

// ─── Attachment ──────────────────────────────────────────────────────────

impl Registry {
    /// Attach a registered node to `scope`, moving it out of any other
    /// scope it was attached to.
    pub fn attach_node(&mut self, scope: Identifier, id: Identifier) -> Result<bool, SyncError> {
        let previous = self.nodes.get(id)?.scope;
        if let Some(previous) = previous
            && previous != scope
        {
            self.detach_node(previous, id)?;
        }
        let attached = self.graphs.get_mut(scope)?.attach_node(id);
        self.nodes.get_mut(id)?.scope = Some(scope);
        if attached {
            log::debug!("attach node {id} to scope {scope}");
        } else {
            log::trace!("node {id} already attached to scope {scope}");
        }
        Ok(attached)
    }

    /// Detach a node and whichever of its ports are still attached.
    pub fn detach_node(&mut self, scope: Identifier, id: Identifier) -> Result<bool, SyncError> {
        let Ok(graph) = self.graphs.get_mut(scope) else {
            log::trace!("scope {scope} already gone, node {id} left unattached");
            if let Ok(node) = self.nodes.get_mut(id) {
                node.scope = None;
            }
            return Ok(false);
        };
        let detached = graph.detach_node(id);
        let owned: Vec<Identifier> = graph
            .ports()
            .iter()
            .copied()
            .filter(|p| self.ports.get(*p).is_ok_and(|port| port.node == id))
            .collect();
        for port in owned {
            graph.detach_port(port);
            if let Ok(p) = self.ports.get_mut(port) {
                p.scope = None;
            }
        }
        if let Ok(node) = self.nodes.get_mut(id)
            && node.scope == Some(scope)
        {
            node.scope = None;
        }
        if detached {
            log::debug!("detach node {id} from scope {scope}");
        } else {
            log::trace!("node {id} was not attached to scope {scope}");
        }
        Ok(detached)
    }

    pub fn attach_port(&mut self, scope: Identifier, id: Identifier) -> Result<bool, SyncError> {
        let previous = self.ports.get(id)?.scope;
        if let Some(previous) = previous
            && previous != scope
        {
            self.detach_port(previous, id)?;
        }
        let attached = self.graphs.get_mut(scope)?.attach_port(id);
        self.ports.get_mut(id)?.scope = Some(scope);
        if attached {
            log::debug!("attach port {id} to scope {scope}");
        }
        Ok(attached)
    }

    pub fn detach_port(&mut self, scope: Identifier, id: Identifier) -> Result<bool, SyncError> {
        let detached = match self.graphs.get_mut(scope) {
            Ok(graph) => graph.detach_port(id),
            Err(_) => false,
        };
        if let Ok(port) = self.ports.get_mut(id)
            && port.scope == Some(scope)
        {
            port.scope = None;
        }
        if detached {
            log::debug!("detach port {id} from scope {scope}");
        } else {
            log::trace!("port {id} was not attached to scope {scope}");
        }
        Ok(detached)
    }

    /// Attach a connection, resolving both ends to sockets visible in
    /// `scope`. A stale end is logged and only this connection is skipped.
    pub fn attach_connection(
        &mut self,
        scope: Identifier,
        id: Identifier,
    ) -> Result<bool, SyncError> {
        let graph = self.graphs.get(scope)?;
        let connection = self.connections.get(id)?;
        let (source, target) = (connection.source, connection.target);
        let (Some(source_socket), Some(target_socket)) =
            (self.socket(graph, source), self.socket(graph, target))
        else {
            log::error!(
                "cannot attach connection {id} to scope {scope}: {} -> {} has a stale end",
                self.describe_port(source),
                self.describe_port(target),
            );
            return Ok(false);
        };

        let attached = self.graphs.get_mut(scope)?.attach_connection(id);
        let connection = self.connections.get_mut(id)?;
        connection.scope = Some(scope);
        connection.endpoints = Some((source_socket, target_socket));
        if attached {
            log::debug!("attach connection {id} to scope {scope}");
        }
        Ok(attached)
    }

    pub fn detach_connection(&mut self, scope: Identifier, id: Identifier) -> bool {
        let detached = match self.graphs.get_mut(scope) {
            Ok(graph) => graph.detach_connection(id),
            Err(_) => false,
        };
        if let Ok(connection) = self.connections.get_mut(id)
            && connection.scope == Some(scope)
        {
            connection.scope = None;
            connection.endpoints = None;
        }
        if detached {
            log::debug!("detach connection {id} from scope {scope}");
        } else {
            log::trace!("connection {id} was not attached to scope {scope}");
        }
        detached
    }

    /// The socket standing for `port` inside `graph`: a virtual port for the
    /// scope's parent node, the port itself for nodes attached here.
    fn socket(&self, graph: &GraphicsGraph, port: Identifier) -> Option<Socket> {
        let p = self.ports.get(port).ok()?;
        if graph.parent_node() == Some(p.node) {
            graph.boundary()?.virtual_port(port)?;
            Some(Socket::Virtual(port))
        } else if p.scope == Some(graph.id()) {
            Some(Socket::Port(port))
        } else {
            None
        }
    }

    fn describe_port(&self, port: Identifier) -> String {
        match self.ports.get(port) {
            Ok(p) => match self.nodes.get(p.node) {
                Ok(n) => format!("{}.{}", n.name, p.name),
                Err(_) => p.name.clone(),
            },
            Err(_) => port.to_string(),
        }
    }

    // ─── Layout and hit testing ──────────────────────────────────────────

    /// A node's ports in stacking order, parents before children.
    pub fn port_rows(&self, node: Identifier) -> Vec<Identifier> {
        let mut rows = Vec::new();
        if let Ok(n) = self.nodes.get(node) {
            for &port in &n.ports {
                self.collect_rows(port, &mut rows);
            }
        }
        rows
    }

    fn collect_rows(&self, port: Identifier, rows: &mut Vec<Identifier>) {
        rows.push(port);
        if let Ok(p) = self.ports.get(port) {
            for &child in &p.child_ports {
                self.collect_rows(child, rows);
            }
        }
    }

    pub fn node_rect(&self, node: Identifier, metrics: &NodeMetrics) -> Result<Rect, SyncError> {
        let n = self.nodes.get(node)?;
        Ok(metrics.node_rect(n.position, self.port_rows(node).len()))
    }

    pub fn socket_position(
        &self,
        port: Identifier,
        metrics: &NodeMetrics,
    ) -> Result<Point, SyncError> {
        let p = self.ports.get(port)?;
        let n = self.nodes.get(p.node)?;
        let index = self
            .port_rows(p.node)
            .iter()
            .position(|r| *r == port)
            .ok_or(SyncError::NotFound {
                kind: EntityKind::Port,
                id: port,
            })?;
        let row = metrics.row_rect(n.position, index);
        Ok(metrics.socket_position(row, p.direction))
    }

    /// Drawn path of an attached connection.
    pub fn connection_path(
        &self,
        id: Identifier,
        metrics: &NodeMetrics,
    ) -> Result<Option<BezPath>, SyncError> {
        let connection = self.connections.get(id)?;
        let (Some(scope), Some((source, target))) = (connection.scope, connection.endpoints) else {
            return Ok(None);
        };
        let graph = self.graphs.get(scope)?;
        let source = self.socket_point(graph, source, metrics)?;
        let target = self.socket_point(graph, target, metrics)?;
        Ok(Some(connection_path(source, target)))
    }

    fn socket_point(
        &self,
        graph: &GraphicsGraph,
        socket: Socket,
        metrics: &NodeMetrics,
    ) -> Result<Point, SyncError> {
        match socket {
            Socket::Port(port) => self.socket_position(port, metrics),
            Socket::Virtual(port) => graph
                .boundary()
                .and_then(|b| b.socket_position(port, metrics))
                .ok_or(SyncError::NotFound {
                    kind: EntityKind::Port,
                    id: port,
                }),
        }
    }

    /// The topmost item of `scope` under `at`.
    pub fn hit(&self, scope: Identifier, at: Point, metrics: &NodeMetrics) -> Result<Hit, SyncError> {
        let graph = self.graphs.get(scope)?;

        for &node in graph.nodes().iter().rev() {
            for port in self.port_rows(node) {
                if metrics.socket_hit(self.socket_position(port, metrics)?, at) {
                    return Ok(Hit::Port(port));
                }
            }
        }
        if let Some(boundary) = graph.boundary() {
            for node in [&boundary.input, &boundary.output] {
                for vp in &node.ports {
                    if let Some(socket) = boundary.socket_position(vp.mirrors, metrics)
                        && metrics.socket_hit(socket, at)
                    {
                        return Ok(Hit::Virtual(vp.mirrors));
                    }
                }
            }
        }
        for &node in graph.nodes().iter().rev() {
            if self.node_rect(node, metrics)?.contains(at) {
                return Ok(Hit::Node(node));
            }
        }
        if let Some(boundary) = graph.boundary() {
            for node in [&boundary.input, &boundary.output] {
                if metrics.node_rect(node.position, node.ports.len()).contains(at) {
                    return Ok(Hit::Boundary(node.side));
                }
            }
        }
        for &connection in graph.connections().iter().rev() {
            if let Some(path) = self.connection_path(connection, metrics)?
                && distance_to(&path, at) <= metrics.socket_radius
            {
                return Ok(Hit::Connection(connection));
            }
        }
        Ok(Hit::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::PortType;

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
    fn attach_is_idempotent() {
        let mut graph = GraphicsGraph::new(Identifier::new(), None);
        let id = Identifier::new();
        assert!(graph.attach_node(id));
        assert!(!graph.attach_node(id));
        assert_eq!(graph.nodes(), &[id]);
        assert!(graph.detach_node(id));
        assert!(!graph.detach_node(id));
    }

    #[test]
    fn port_outside_its_node_rows_has_no_socket() {
        let mut registry = Registry::new();
        let node = nodal_core::Node {
            id: Identifier::new(),
            name: "A".into(),
            graph: Identifier::new(),
            ports: Default::default(),
            child_graph: Identifier::new(),
        };
        registry.create_node(&node, Point::ORIGIN).unwrap();
        let mut first = port(PortDirection::Input);
        first.node = node.id;
        let mut second = port(PortDirection::Output);
        second.node = node.id;
        registry.create_port(&first).unwrap();
        registry.create_port(&second).unwrap();

        let metrics = NodeMetrics::default();
        assert_eq!(
            registry.socket_position(second.id, &metrics).unwrap(),
            Point::new(150.0, 42.5)
        );
        registry.nodes.get_mut(node.id).unwrap().ports.retain(|p| *p != second.id);
        assert!(matches!(
            registry.socket_position(second.id, &metrics),
            Err(SyncError::NotFound {
                kind: EntityKind::Port,
                ..
            })
        ));
    }

    #[test]
    fn boundary_sorts_ports_by_direction() {
        let mut boundary = Boundary::new(Point::new(-100.0, 0.0), Point::new(100.0, 0.0));
        let input = port(PortDirection::Input);
        let output = port(PortDirection::Output);
        assert!(boundary.mirror(&input));
        assert!(!boundary.mirror(&input));
        assert!(boundary.mirror(&output));

        assert_eq!(boundary.input.ports.len(), 1);
        assert_eq!(boundary.input.ports[0].direction, PortDirection::Output);
        assert_eq!(boundary.output.ports[0].direction, PortDirection::Input);

        assert!(boundary.unmirror(input.id));
        assert!(!boundary.unmirror(input.id));
        assert!(boundary.input.ports.is_empty());
        assert_eq!(boundary.output.ports.len(), 1);
    }

    #[test]
    fn boundary_rename_follows_mirrored_port() {
        let mut boundary = Boundary::new(Point::ORIGIN, Point::ORIGIN);
        let input = port(PortDirection::Input);
        boundary.mirror(&input);
        assert!(boundary.rename(input.id, "renamed"));
        assert_eq!(boundary.virtual_port(input.id).unwrap().name, "renamed");
        assert!(!boundary.rename(Identifier::new(), "x"));
    }
}
