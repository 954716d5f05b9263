//! Graphics entity registry: the single map from domain identifiers to
//! graphics objects.
//!
//! One `Catalog` per entity kind. A catalog never holds two objects for one
//! identifier: creating over an existing entry or deleting a missing one is
//! a `SyncError::Desync`, and a failed create leaves the first object in
//! place. Lookups accept any `Like` reference.

use crate::error::SyncError;
use crate::items::{GraphicsConnection, GraphicsNode, GraphicsPort};
use crate::resolve::{Like, Mirror, resolve};
use crate::scope::GraphicsGraph;
use kurbo::{Point, Vec2};
use nodal_core::{Connection, Graph, Identifier, Node, Port};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

// ─── Catalog ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Catalog<G> {
    items: HashMap<Identifier, G>,
}

impl<G> Default for Catalog<G> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<G: Mirror> Catalog<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under `id`. An existing entry is kept and reported.
    pub fn insert(&mut self, id: Identifier, item: G) -> Result<&mut G, SyncError> {
        match self.items.entry(id) {
            Entry::Occupied(_) => {
                log::error!("graphics {} {id} already exists", G::KIND);
                Err(SyncError::Desync {
                    kind: G::KIND,
                    id,
                    op: "create",
                })
            }
            Entry::Vacant(slot) => Ok(slot.insert(item)),
        }
    }

    pub fn remove(&mut self, id: Identifier) -> Result<G, SyncError> {
        self.items.remove(&id).ok_or_else(|| {
            log::error!("graphics {} {id} does not exist", G::KIND);
            SyncError::Desync {
                kind: G::KIND,
                id,
                op: "delete",
            }
        })
    }

    pub fn get(&self, id: Identifier) -> Result<&G, SyncError> {
        self.items.get(&id).ok_or(SyncError::NotFound { kind: G::KIND, id })
    }

    pub fn get_mut(&mut self, id: Identifier) -> Result<&mut G, SyncError> {
        self.items
            .get_mut(&id)
            .ok_or(SyncError::NotFound { kind: G::KIND, id })
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.items.contains_key(&id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self.items.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn values(&self) -> impl Iterator<Item = &G> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ─── Registry ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) graphs: Catalog<GraphicsGraph>,
    pub(crate) nodes: Catalog<GraphicsNode>,
    pub(crate) ports: Catalog<GraphicsPort>,
    pub(crate) connections: Catalog<GraphicsConnection>,
    /// Connections dropped along with one of their ports whose own deletion
    /// has not arrived yet.
    discarded: HashSet<Identifier>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graphs(&self) -> &Catalog<GraphicsGraph> {
        &self.graphs
    }

    pub fn nodes(&self) -> &Catalog<GraphicsNode> {
        &self.nodes
    }

    pub fn ports(&self) -> &Catalog<GraphicsPort> {
        &self.ports
    }

    pub fn connections(&self) -> &Catalog<GraphicsConnection> {
        &self.connections
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn graph<'a>(&'a self, like: impl Into<Like<'a>>) -> Result<&'a GraphicsGraph, SyncError> {
        resolve(&self.graphs, like.into())
    }

    pub fn node<'a>(&'a self, like: impl Into<Like<'a>>) -> Result<&'a GraphicsNode, SyncError> {
        resolve(&self.nodes, like.into())
    }

    pub fn port<'a>(&'a self, like: impl Into<Like<'a>>) -> Result<&'a GraphicsPort, SyncError> {
        resolve(&self.ports, like.into())
    }

    pub fn connection<'a>(
        &'a self,
        like: impl Into<Like<'a>>,
    ) -> Result<&'a GraphicsConnection, SyncError> {
        resolve(&self.connections, like.into())
    }

    // ─── Graphs ──────────────────────────────────────────────────────────

    pub fn create_graph(&mut self, graph: &Graph) -> Result<&mut GraphicsGraph, SyncError> {
        log::trace!("create graphics graph {}", graph.id);
        self.graphs
            .insert(graph.id, GraphicsGraph::new(graph.id, graph.parent_node))
    }

    pub fn delete_graph(&mut self, id: Identifier) -> Result<GraphicsGraph, SyncError> {
        log::debug!("delete graphics graph {id}");
        self.graphs.remove(id)
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Mirror a node, placed at `position`.
    pub fn create_node(
        &mut self,
        node: &Node,
        position: Point,
    ) -> Result<&mut GraphicsNode, SyncError> {
        log::trace!("create graphics node {} '{}'", node.id, node.name);
        self.nodes
            .insert(node.id, GraphicsNode::from_domain(node, position))
    }

    /// Drop a node's mirror, detaching it from its scope first.
    pub fn delete_node(&mut self, id: Identifier) -> Result<(), SyncError> {
        let scope = self.nodes.get(id).ok().and_then(|n| n.scope);
        if let Some(scope) = scope {
            self.detach_node(scope, id)?;
        }
        let node = self.nodes.remove(id)?;
        log::debug!("delete graphics node {id} '{}'", node.name);
        Ok(())
    }

    pub fn rename_node(&mut self, id: Identifier, name: &str) -> Result<(), SyncError> {
        let node = self.nodes.get_mut(id)?;
        log::debug!("rename graphics node {id}: '{}' -> '{name}'", node.name);
        node.name = name.to_string();
        Ok(())
    }

    pub fn set_position(&mut self, id: Identifier, position: Point) -> Result<(), SyncError> {
        self.nodes.get_mut(id)?.position = position;
        Ok(())
    }

    pub fn move_node_by(&mut self, id: Identifier, delta: Vec2) -> Result<(), SyncError> {
        let node = self.nodes.get_mut(id)?;
        node.position += delta;
        Ok(())
    }

    // ─── Ports ───────────────────────────────────────────────────────────

    /// Mirror a port and hang it under its node (or parent port) in the
    /// rendering tree.
    pub fn create_port(&mut self, port: &Port) -> Result<&mut GraphicsPort, SyncError> {
        self.ports.insert(port.id, GraphicsPort::from_domain(port))?;
        let linked = match port.parent_port {
            Some(parent) => self.ports.get_mut(parent).map(|p| {
                if !p.child_ports.contains(&port.id) {
                    p.child_ports.push(port.id);
                }
            }),
            None => self.nodes.get_mut(port.node).map(|n| {
                if !n.ports.contains(&port.id) {
                    n.ports.push(port.id);
                }
            }),
        };
        if let Err(err) = linked {
            log::error!("graphics port {} has no rendering parent: {err}", port.id);
            self.ports.remove(port.id)?;
            return Err(err);
        }
        log::trace!("create graphics port {} '{}'", port.id, port.name);
        self.ports.get_mut(port.id)
    }

    /// Drop a port's mirror. Connections still referencing the port are
    /// discarded with it; their own deletion later is a no-op.
    pub fn delete_port(&mut self, id: Identifier) -> Result<(), SyncError> {
        let port = self.ports.remove(id)?;

        let stale: Vec<Identifier> = self
            .connections
            .values()
            .filter(|c| c.source == id || c.target == id)
            .map(|c| c.id)
            .collect();
        for connection in stale {
            self.discard_connection(connection)?;
        }

        if let Some(scope) = port.scope
            && let Ok(graph) = self.graphs.get_mut(scope)
        {
            graph.detach_port(id);
        }
        match port.parent_port {
            Some(parent) => {
                if let Ok(p) = self.ports.get_mut(parent) {
                    p.child_ports.retain(|c| *c != id);
                }
            }
            None => {
                if let Ok(n) = self.nodes.get_mut(port.node) {
                    n.ports.retain(|p| *p != id);
                }
            }
        }
        log::debug!("delete graphics port {id} '{}'", port.name);
        Ok(())
    }

    pub fn rename_port(&mut self, id: Identifier, name: &str) -> Result<(), SyncError> {
        let port = self.ports.get_mut(id)?;
        log::debug!("rename graphics port {id}: '{}' -> '{name}'", port.name);
        port.name = name.to_string();
        Ok(())
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn create_connection(
        &mut self,
        connection: &Connection,
    ) -> Result<&mut GraphicsConnection, SyncError> {
        log::trace!(
            "create graphics connection {} ({} -> {})",
            connection.id,
            connection.source,
            connection.target
        );
        self.connections
            .insert(connection.id, GraphicsConnection::from_domain(connection))
    }

    /// Drop a connection's mirror. Returns false when it was already
    /// discarded together with one of its ports.
    pub fn delete_connection(&mut self, id: Identifier) -> Result<bool, SyncError> {
        if self.discarded.remove(&id) {
            log::trace!("graphics connection {id} already discarded");
            return Ok(false);
        }
        let connection = self.connections.remove(id)?;
        if let Some(scope) = connection.scope
            && let Ok(graph) = self.graphs.get_mut(scope)
        {
            graph.detach_connection(id);
        }
        log::debug!("delete graphics connection {id}");
        Ok(true)
    }

    fn discard_connection(&mut self, id: Identifier) -> Result<(), SyncError> {
        let connection = self.connections.remove(id)?;
        if let Some(scope) = connection.scope
            && let Ok(graph) = self.graphs.get_mut(scope)
        {
            graph.detach_connection(id);
        }
        self.discarded.insert(id);
        log::debug!("discard graphics connection {id} with its port");
        Ok(())
    }
}
