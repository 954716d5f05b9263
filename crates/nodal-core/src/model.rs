//! In-memory node-graph model.
//!
//! A `State` owns every graph scope, node, port and connection, keyed by
//! `Identifier`. The root graph has no parent node; every node owns exactly
//! one child graph, which is what drill-down navigation enters. Structural
//! mutations go through the primitives at the bottom of this file, each of
//! which queues the matching `Event`s in mutation order.

use crate::error::ModelError;
use crate::event::{Event, Removed};
use crate::id::{Identifier, PortType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};
use std::fmt;

// ─── Entities ────────────────────────────────────────────────────────────

/// The four kinds of domain entity mirrored by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Graph,
    Node,
    Port,
    Connection,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Graph => "graph",
            EntityKind::Node => "node",
            EntityKind::Port => "port",
            EntityKind::Connection => "connection",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    /// The direction a port presents from the other side of a scope boundary.
    pub fn inverted(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

/// A graph scope. Only the root graph has no parent node.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub id: Identifier,
    pub parent_node: Option<Identifier>,
    /// Nodes living directly in this scope.
    pub nodes: Vec<Identifier>,
    /// Every port (top-level and nested) of the nodes in this scope.
    pub ports: Vec<Identifier>,
    pub connections: Vec<Identifier>,
}

impl Graph {
    fn new(id: Identifier, parent_node: Option<Identifier>) -> Self {
        Self {
            id,
            parent_node,
            nodes: Vec::new(),
            ports: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_node.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Identifier,
    pub name: String,
    /// The scope this node currently lives in.
    pub graph: Identifier,
    /// Top-level ports in creation order.
    pub ports: SmallVec<[Identifier; 4]>,
    /// The scope this node owns.
    pub child_graph: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    pub id: Identifier,
    pub name: String,
    pub direction: PortDirection,
    pub port_type: PortType,
    pub node: Identifier,
    pub parent_port: Option<Identifier>,
    pub child_ports: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: Identifier,
    pub source: Identifier,
    pub target: Identifier,
    /// The scope the connection is drawn in.
    pub graph: Identifier,
}

// ─── State ───────────────────────────────────────────────────────────────

/// The complete model: every live entity plus the queue of structural
/// events not yet delivered to subscribers.
#[derive(Debug, Clone)]
pub struct State {
    root: Identifier,
    graphs: HashMap<Identifier, Graph>,
    nodes: HashMap<Identifier, Node>,
    ports: HashMap<Identifier, Port>,
    connections: HashMap<Identifier, Connection>,
    events: VecDeque<Event>,
}

impl State {
    /// Create a model holding only the root graph. The root exists from the
    /// start, so no creation event is queued for it.
    #[must_use]
    pub fn new() -> Self {
        let root = Identifier::new();
        let mut graphs = HashMap::new();
        graphs.insert(root, Graph::new(root, None));
        Self {
            root,
            graphs,
            nodes: HashMap::new(),
            ports: HashMap::new(),
            connections: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    pub fn root_graph(&self) -> &Graph {
        &self.graphs[&self.root]
    }

    pub fn root_id(&self) -> Identifier {
        self.root
    }

    // ─── Lookups ─────────────────────────────────────────────────────────

    pub fn graph(&self, id: Identifier) -> Result<&Graph, ModelError> {
        self.graphs
            .get(&id)
            .ok_or(ModelError::not_found(EntityKind::Graph, id))
    }

    pub fn node(&self, id: Identifier) -> Result<&Node, ModelError> {
        self.nodes
            .get(&id)
            .ok_or(ModelError::not_found(EntityKind::Node, id))
    }

    pub fn port(&self, id: Identifier) -> Result<&Port, ModelError> {
        self.ports
            .get(&id)
            .ok_or(ModelError::not_found(EntityKind::Port, id))
    }

    pub fn connection(&self, id: Identifier) -> Result<&Connection, ModelError> {
        self.connections
            .get(&id)
            .ok_or(ModelError::not_found(EntityKind::Connection, id))
    }

    /// Which kind of entity, if any, carries this identifier.
    pub fn kind_of(&self, id: Identifier) -> Option<EntityKind> {
        if self.graphs.contains_key(&id) {
            Some(EntityKind::Graph)
        } else if self.nodes.contains_key(&id) {
            Some(EntityKind::Node)
        } else if self.ports.contains_key(&id) {
            Some(EntityKind::Port)
        } else if self.connections.contains_key(&id) {
            Some(EntityKind::Connection)
        } else {
            None
        }
    }

    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// The scope a graph's parent node lives in, i.e. one level up.
    pub fn parent_graph(&self, graph: Identifier) -> Option<Identifier> {
        let parent_node = self.graphs.get(&graph)?.parent_node?;
        self.nodes.get(&parent_node).map(|n| n.graph)
    }

    /// All ports of a node, parents before children.
    pub fn node_ports_recursive(&self, node: Identifier) -> Vec<Identifier> {
        let mut out = Vec::new();
        if let Some(n) = self.nodes.get(&node) {
            for &port in &n.ports {
                self.collect_port_tree(port, &mut out);
            }
        }
        out
    }

    fn collect_port_tree(&self, port: Identifier, out: &mut Vec<Identifier>) {
        out.push(port);
        if let Some(p) = self.ports.get(&port) {
            for &child in &p.child_ports {
                self.collect_port_tree(child, out);
            }
        }
    }

    /// Connections in any scope that have `port` as an endpoint.
    pub fn connections_of_port(&self, port: Identifier) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self
            .connections
            .values()
            .filter(|c| c.source == port || c.target == port)
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids
    }

    /// The connection between two ports inside `graph`, if any.
    pub fn find_connection(
        &self,
        graph: Identifier,
        source: Identifier,
        target: Identifier,
    ) -> Option<&Connection> {
        let g = self.graphs.get(&graph)?;
        g.connections
            .iter()
            .filter_map(|c| self.connections.get(c))
            .find(|c| c.source == source && c.target == target)
    }

    // ─── Paths ───────────────────────────────────────────────────────────

    /// Human-readable path of any live entity, for diagnostics.
    /// Unknown identifiers render as the bare identifier.
    pub fn path(&self, id: Identifier) -> String {
        if let Some(graph) = self.graphs.get(&id) {
            return match graph.parent_node {
                Some(node) => self.node_path(node),
                None => "/".to_string(),
            };
        }
        if self.nodes.contains_key(&id) {
            return self.node_path(id);
        }
        if self.ports.contains_key(&id) {
            return self.port_path(id);
        }
        if let Some(c) = self.connections.get(&id) {
            return format!("{} -> {}", self.port_path(c.source), self.port_path(c.target));
        }
        id.to_string()
    }

    fn node_path(&self, id: Identifier) -> String {
        let Some(node) = self.nodes.get(&id) else {
            return id.to_string();
        };
        let prefix = self
            .graphs
            .get(&node.graph)
            .and_then(|g| g.parent_node)
            .map(|parent| self.node_path(parent))
            .unwrap_or_default();
        format!("{prefix}/{}", node.name)
    }

    fn port_path(&self, id: Identifier) -> String {
        let Some(port) = self.ports.get(&id) else {
            return id.to_string();
        };
        match port.parent_port {
            Some(parent) => format!("{}.{}", self.port_path(parent), port.name),
            None => format!("{}.{}", self.node_path(port.node), port.name),
        }
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Pop the oldest undelivered event.
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Take every undelivered event, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: Event) {
        log::trace!("queue {:?}", event.topic());
        self.events.push_back(event);
    }

    fn removed(&self, id: Identifier) -> Removed {
        Removed {
            id,
            path: self.path(id),
        }
    }

    // ─── Structural primitives ───────────────────────────────────────────

    /// Add a node (and its child graph) to `graph`.
    pub(crate) fn add_node(&mut self, graph: Identifier, name: &str) -> Result<Identifier, ModelError> {
        self.graph(graph)?;
        let id = Identifier::new();
        let child_graph = Identifier::new();
        let node = Node {
            id,
            name: name.to_string(),
            graph,
            ports: SmallVec::new(),
            child_graph,
        };
        let child = Graph::new(child_graph, Some(id));

        self.nodes.insert(id, node.clone());
        self.emit(Event::NodeCreated(node.clone()));
        self.graphs.insert(child_graph, child.clone());
        self.emit(Event::GraphCreated(child));
        if let Some(g) = self.graphs.get_mut(&graph) {
            g.nodes.push(id);
        }
        self.emit(Event::NodeRegistered { graph, node });
        Ok(id)
    }

    pub(crate) fn add_port(
        &mut self,
        node: Identifier,
        name: &str,
        direction: PortDirection,
        port_type: PortType,
        parent_port: Option<Identifier>,
    ) -> Result<Identifier, ModelError> {
        let graph = self.node(node)?.graph;
        if let Some(parent) = parent_port
            && self.port(parent)?.node != node
        {
            return Err(ModelError::Document(format!(
                "parent port {} does not belong to {}",
                self.path(parent),
                self.path(node)
            )));
        }

        let id = Identifier::new();
        let port = Port {
            id,
            name: name.to_string(),
            direction,
            port_type,
            node,
            parent_port,
            child_ports: Vec::new(),
        };
        self.ports.insert(id, port.clone());
        match parent_port {
            Some(parent) => {
                if let Some(p) = self.ports.get_mut(&parent) {
                    p.child_ports.push(id);
                }
            }
            None => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.ports.push(id);
                }
            }
        }
        self.emit(Event::PortCreated(port.clone()));
        if let Some(g) = self.graphs.get_mut(&graph) {
            g.ports.push(id);
        }
        self.emit(Event::PortRegistered {
            graph,
            port: port.clone(),
        });
        self.emit(Event::NodePortRegistered { node, port });
        Ok(id)
    }

    pub(crate) fn add_connection(
        &mut self,
        graph: Identifier,
        source: Identifier,
        target: Identifier,
    ) -> Identifier {
        let id = Identifier::new();
        let connection = Connection {
            id,
            source,
            target,
            graph,
        };
        self.connections.insert(id, connection.clone());
        self.emit(Event::ConnectionCreated(connection.clone()));
        if let Some(g) = self.graphs.get_mut(&graph) {
            g.connections.push(id);
        }
        self.emit(Event::ConnectionRegistered { graph, connection });
        id
    }

    pub(crate) fn remove_connection(&mut self, id: Identifier) -> Result<(), ModelError> {
        let graph = self.connection(id)?.graph;
        let removed = self.removed(id);
        if let Some(g) = self.graphs.get_mut(&graph) {
            g.connections.retain(|c| *c != id);
        }
        self.emit(Event::ConnectionUnregistered {
            graph,
            connection: removed.clone(),
        });
        self.connections.remove(&id);
        self.emit(Event::ConnectionDeleted(removed));
        Ok(())
    }

    /// Remove a port, its child ports and every connection touching them.
    pub(crate) fn remove_port(&mut self, id: Identifier) -> Result<(), ModelError> {
        let port = self.port(id)?.clone();

        for child in port.child_ports.iter().rev() {
            self.remove_port(*child)?;
        }
        for connection in self.connections_of_port(id) {
            self.remove_connection(connection)?;
        }

        let graph = self.node(port.node)?.graph;
        let removed = self.removed(id);
        match port.parent_port {
            Some(parent) => {
                if let Some(p) = self.ports.get_mut(&parent) {
                    p.child_ports.retain(|c| *c != id);
                }
            }
            None => {
                if let Some(n) = self.nodes.get_mut(&port.node) {
                    n.ports.retain(|p| *p != id);
                }
            }
        }
        if let Some(g) = self.graphs.get_mut(&graph) {
            g.ports.retain(|p| *p != id);
        }
        self.emit(Event::PortUnregistered {
            graph,
            port: removed.clone(),
        });
        self.emit(Event::NodePortUnregistered {
            node: port.node,
            port: removed.clone(),
        });
        self.ports.remove(&id);
        self.emit(Event::PortDeleted(removed));
        Ok(())
    }

    /// Remove a node together with everything inside its child graph.
    pub(crate) fn remove_node(&mut self, id: Identifier) -> Result<(), ModelError> {
        let node = self.node(id)?.clone();

        let inner = self.graph(node.child_graph)?.clone();
        for child in inner.nodes.iter().rev() {
            self.remove_node(*child)?;
        }
        let leftover: Vec<Identifier> = self.graph(node.child_graph)?.connections.clone();
        for connection in leftover {
            self.remove_connection(connection)?;
        }
        for port in node.ports.iter().rev() {
            self.remove_port(*port)?;
        }

        let graph_removed = self.removed(node.child_graph);
        self.graphs.remove(&node.child_graph);
        self.emit(Event::GraphDeleted(graph_removed));

        let removed = self.removed(id);
        if let Some(g) = self.graphs.get_mut(&node.graph) {
            g.nodes.retain(|n| *n != id);
        }
        self.emit(Event::NodeUnregistered {
            graph: node.graph,
            node: removed.clone(),
        });
        self.nodes.remove(&id);
        self.emit(Event::NodeDeleted(removed));
        Ok(())
    }

    /// Move a node (with its ports) to another scope. Connections are the
    /// caller's responsibility.
    pub(crate) fn move_node(&mut self, id: Identifier, to: Identifier) -> Result<(), ModelError> {
        self.graph(to)?;
        let from = self.node(id)?.graph;
        if from == to {
            return Ok(());
        }
        let ports = self.node_ports_recursive(id);

        for port in ports.iter().rev() {
            let removed = self.removed(*port);
            self.emit(Event::PortUnregistered {
                graph: from,
                port: removed,
            });
        }
        let removed = self.removed(id);
        if let Some(g) = self.graphs.get_mut(&from) {
            g.nodes.retain(|n| *n != id);
            g.ports.retain(|p| !ports.contains(p));
        }
        self.emit(Event::NodeUnregistered {
            graph: from,
            node: removed,
        });

        if let Some(n) = self.nodes.get_mut(&id) {
            n.graph = to;
        }
        if let Some(g) = self.graphs.get_mut(&to) {
            g.nodes.push(id);
            g.ports.extend(ports.iter().copied());
        }
        let node = self.node(id)?.clone();
        self.emit(Event::NodeRegistered { graph: to, node });
        for port in &ports {
            let port = self.port(*port)?.clone();
            self.emit(Event::PortRegistered { graph: to, port });
        }
        Ok(())
    }

    pub(crate) fn move_connection(&mut self, id: Identifier, to: Identifier) -> Result<(), ModelError> {
        self.graph(to)?;
        let from = self.connection(id)?.graph;
        if from == to {
            return Ok(());
        }
        let removed = self.removed(id);
        if let Some(g) = self.graphs.get_mut(&from) {
            g.connections.retain(|c| *c != id);
        }
        self.emit(Event::ConnectionUnregistered {
            graph: from,
            connection: removed,
        });
        if let Some(c) = self.connections.get_mut(&id) {
            c.graph = to;
        }
        if let Some(g) = self.graphs.get_mut(&to) {
            g.connections.push(id);
        }
        let connection = self.connection(id)?.clone();
        self.emit(Event::ConnectionRegistered {
            graph: to,
            connection,
        });
        Ok(())
    }

    pub(crate) fn rename_node(&mut self, id: Identifier, name: &str) -> Result<(), ModelError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(ModelError::not_found(EntityKind::Node, id))?;
        node.name = name.to_string();
        self.emit(Event::NodeRenamed {
            node: id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub(crate) fn rename_port(&mut self, id: Identifier, name: &str) -> Result<(), ModelError> {
        let port = self
            .ports
            .get_mut(&id)
            .ok_or(ModelError::not_found(EntityKind::Port, id))?;
        port.name = name.to_string();
        self.emit(Event::PortRenamed {
            port: id,
            name: name.to_string(),
        });
        Ok(())
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
