//! Node documents, the node library, and the persistence hook points.
//!
//! A `NodeDocument` describes a node definition: its ports, the nodes and
//! connections of its child graph, and whatever extra data registered
//! serializers attached. Serializers and deserializers are hooks keyed by
//! entity kind; the model drives them, the editor supplies them.

use crate::error::ModelError;
use crate::id::{Identifier, PortType};
use crate::model::{Connection, Graph, Node, Port, PortDirection, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

// ─── Documents ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortDocument>,
    /// Nodes of the child graph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeDocument>,
    /// Connections of the child graph.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionDocument>,
    /// Data contributed by serializer hooks.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDocument {
    pub name: String,
    pub direction: PortDirection,
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortDocument>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDocument {
    pub source: PortAddress,
    pub target: PortAddress,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A port inside a node document: `node` indexes the document's `nodes`
/// (`None` is the documented node itself), `port` is a dotted name path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<usize>,
    pub port: String,
}

impl NodeDocument {
    /// Check that every connection address names a node and port the
    /// document defines, recursively.
    pub fn validate(&self) -> Result<(), ModelError> {
        for connection in &self.connections {
            for address in [&connection.source, &connection.target] {
                let ports = match address.node {
                    None => &self.ports,
                    Some(index) => {
                        &self
                            .nodes
                            .get(index)
                            .ok_or_else(|| {
                                ModelError::Document(format!(
                                    "{}: no node #{index}",
                                    self.name
                                ))
                            })?
                            .ports
                    }
                };
                if find_port_document(ports, &address.port).is_none() {
                    return Err(ModelError::Document(format!(
                        "{}: no port '{}'",
                        self.name, address.port
                    )));
                }
            }
        }
        self.nodes.iter().try_for_each(NodeDocument::validate)
    }
}

fn find_port_document<'a>(ports: &'a [PortDocument], path: &str) -> Option<&'a PortDocument> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = ports.iter().find(|p| p.name == first)?;
    for segment in segments {
        current = current.ports.iter().find(|p| p.name == segment)?;
    }
    Some(current)
}

// ─── Hooks ───────────────────────────────────────────────────────────────

/// Whether an entity is serialized as a reusable definition or as a placed
/// instance inside some other definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationType {
    Definition,
    Instance,
}

/// Contributes extra data to exported documents, one hook per entity kind.
pub trait Serializer {
    fn serialize_graph(&self, _graph: &Graph, _ty: SerializationType) -> Map<String, Value> {
        Map::new()
    }

    fn serialize_node(&self, _node: &Node, _ty: SerializationType) -> Map<String, Value> {
        Map::new()
    }

    fn serialize_port(&self, _port: &Port, _ty: SerializationType) -> Map<String, Value> {
        Map::new()
    }

    fn serialize_connection(
        &self,
        _connection: &Connection,
        _parent_node: &Node,
        _ty: SerializationType,
    ) -> Map<String, Value> {
        Map::new()
    }
}

/// Applies extra document data to freshly created entities.
pub trait Deserializer {
    fn deserialize_graph(&mut self, _data: &Map<String, Value>, _graph: &Graph) {}

    fn deserialize_node(&mut self, _data: &Map<String, Value>, _node: &Node) {}

    fn deserialize_port(&mut self, _data: &Map<String, Value>, _port: &Port) {}

    fn deserialize_connection(&mut self, _data: &Map<String, Value>, _connection: &Connection) {}
}

/// A serializer that adds nothing.
pub struct NoHooks;

impl Serializer for NoHooks {}
impl Deserializer for NoHooks {}

// ─── Export ──────────────────────────────────────────────────────────────

impl State {
    /// Describe `node` (ports and child graph) as a reusable definition.
    pub fn export_node(
        &self,
        node: Identifier,
        serializer: &dyn Serializer,
    ) -> Result<NodeDocument, ModelError> {
        self.export_node_as(node, serializer, SerializationType::Definition)
    }

    fn export_node_as(
        &self,
        id: Identifier,
        serializer: &dyn Serializer,
        ty: SerializationType,
    ) -> Result<NodeDocument, ModelError> {
        let node = self.node(id)?;
        let inner = self.graph(node.child_graph)?;

        let ports = node
            .ports
            .iter()
            .map(|p| self.export_port(*p, serializer, ty))
            .collect::<Result<Vec<_>, _>>()?;
        let nodes = inner
            .nodes
            .iter()
            .map(|n| self.export_node_as(*n, serializer, SerializationType::Instance))
            .collect::<Result<Vec<_>, _>>()?;

        let mut connections = Vec::with_capacity(inner.connections.len());
        for &cid in &inner.connections {
            let connection = self.connection(cid)?;
            connections.push(ConnectionDocument {
                source: self.port_address(inner, id, connection.source)?,
                target: self.port_address(inner, id, connection.target)?,
                extra: serializer.serialize_connection(connection, node, ty),
            });
        }

        let mut extra = serializer.serialize_node(node, ty);
        extra.extend(serializer.serialize_graph(inner, ty));
        Ok(NodeDocument {
            name: node.name.clone(),
            ports,
            nodes,
            connections,
            extra,
        })
    }

    fn export_port(
        &self,
        id: Identifier,
        serializer: &dyn Serializer,
        ty: SerializationType,
    ) -> Result<PortDocument, ModelError> {
        let port = self.port(id)?;
        let ports = port
            .child_ports
            .iter()
            .map(|p| self.export_port(*p, serializer, ty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PortDocument {
            name: port.name.clone(),
            direction: port.direction,
            port_type: port.port_type,
            ports,
            extra: serializer.serialize_port(port, ty),
        })
    }

    fn port_address(
        &self,
        inner: &Graph,
        owner: Identifier,
        port: Identifier,
    ) -> Result<PortAddress, ModelError> {
        let p = self.port(port)?;
        let node = if p.node == owner {
            None
        } else {
            let index = inner.nodes.iter().position(|n| *n == p.node).ok_or_else(|| {
                ModelError::Document(format!("{} is outside {}", self.path(port), self.path(owner)))
            })?;
            Some(index)
        };
        let mut names = vec![p.name.clone()];
        let mut parent = p.parent_port;
        while let Some(id) = parent {
            let pp = self.port(id)?;
            names.push(pp.name.clone());
            parent = pp.parent_port;
        }
        names.reverse();
        Ok(PortAddress {
            node,
            port: names.join("."),
        })
    }

    // ─── Import ──────────────────────────────────────────────────────────

    /// Instantiate a node document inside `graph`. Connections the model
    /// rejects are skipped with a warning.
    pub fn import_node(
        &mut self,
        graph: Identifier,
        document: &NodeDocument,
    ) -> Result<Imported, ModelError> {
        self.graph(graph)?;
        document.validate()?;
        let mut imported = Imported::default();
        let (root, _) = self.instantiate(graph, document, &mut imported)?;
        imported.root = Some(root);
        Ok(imported)
    }

    fn instantiate(
        &mut self,
        graph: Identifier,
        document: &NodeDocument,
        imported: &mut Imported,
    ) -> Result<(Identifier, HashMap<String, Identifier>), ModelError> {
        let node = self.add_node(graph, &document.name)?;
        imported.nodes.push((node, document.extra.clone()));

        let mut ports = HashMap::new();
        for port in &document.ports {
            self.instantiate_port(node, port, None, "", &mut ports, imported)?;
        }

        let inner = self.node(node)?.child_graph;
        let mut children = Vec::with_capacity(document.nodes.len());
        for child in &document.nodes {
            let (_, child_ports) = self.instantiate(inner, child, imported)?;
            children.push(child_ports);
        }

        for connection in &document.connections {
            let resolve = |address: &PortAddress| match address.node {
                None => ports.get(&address.port).copied(),
                Some(i) => children.get(i).and_then(|m| m.get(&address.port)).copied(),
            };
            let (Some(source), Some(target)) = (resolve(&connection.source), resolve(&connection.target))
            else {
                return Err(ModelError::Document(format!(
                    "{}: unresolved connection",
                    document.name
                )));
            };
            match self.validate_connection(inner, source, target) {
                Ok(()) => {
                    let id = self.add_connection(inner, source, target);
                    imported.connections.push((id, connection.extra.clone()));
                }
                Err(err) => log::warn!("import {}: skipping connection: {err}", document.name),
            }
        }
        Ok((node, ports))
    }

    fn instantiate_port(
        &mut self,
        node: Identifier,
        document: &PortDocument,
        parent: Option<Identifier>,
        prefix: &str,
        ports: &mut HashMap<String, Identifier>,
        imported: &mut Imported,
    ) -> Result<(), ModelError> {
        let id = self.add_port(node, &document.name, document.direction, document.port_type, parent)?;
        let path = if prefix.is_empty() {
            document.name.clone()
        } else {
            format!("{prefix}.{}", document.name)
        };
        imported.ports.push((id, document.extra.clone()));
        for child in &document.ports {
            self.instantiate_port(node, child, Some(id), &path, ports, imported)?;
        }
        ports.insert(path, id);
        Ok(())
    }
}

/// Entities created by `State::import_node`, each paired with the extra
/// document data the deserializer pass should apply to it.
#[derive(Debug, Clone, Default)]
pub struct Imported {
    pub root: Option<Identifier>,
    pub nodes: Vec<(Identifier, Map<String, Value>)>,
    pub ports: Vec<(Identifier, Map<String, Value>)>,
    pub connections: Vec<(Identifier, Map<String, Value>)>,
}

impl Imported {
    /// Run the deserializer hooks over every imported entity still alive.
    pub fn apply(&self, state: &State, deserializer: &mut dyn Deserializer) {
        for (id, data) in &self.nodes {
            if let Ok(node) = state.node(*id) {
                deserializer.deserialize_node(data, node);
                if let Ok(graph) = state.graph(node.child_graph) {
                    deserializer.deserialize_graph(data, graph);
                }
            }
        }
        for (id, data) in &self.ports {
            if let Ok(port) = state.port(*id) {
                deserializer.deserialize_port(data, port);
            }
        }
        for (id, data) in &self.connections {
            if let Ok(connection) = state.connection(*id) {
                deserializer.deserialize_connection(data, connection);
            }
        }
    }
}

// ─── Library ─────────────────────────────────────────────────────────────

/// Named node definitions available for import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    entries: BTreeMap<String, NodeDocument>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, name: &str, document: NodeDocument) {
        self.entries.insert(name.to_string(), document);
    }

    pub fn get(&self, name: &str) -> Result<&NodeDocument, ModelError> {
        self.entries
            .get(name)
            .ok_or_else(|| ModelError::UnknownLibraryEntry(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use pretty_assertions::assert_eq;

    /// A node `adder` with `a`, `b` inputs, an `sum` output, and an inner
    /// `add` node wired between them.
    fn adder(state: &mut State) -> Identifier {
        let root = state.root_id();
        let int = PortType::intern("int");
        let adder = state.add_node(root, "adder").unwrap();
        let a = state.add_port(adder, "a", PortDirection::Input, int, None).unwrap();
        let sum = state.add_port(adder, "sum", PortDirection::Output, int, None).unwrap();
        let inner = state.node(adder).unwrap().child_graph;
        let add = state.add_node(inner, "add").unwrap();
        let lhs = state.add_port(add, "lhs", PortDirection::Input, int, None).unwrap();
        let out = state.add_port(add, "out", PortDirection::Output, int, None).unwrap();
        state
            .execute(Command::ConnectPorts {
                graph: inner,
                source: a,
                target: lhs,
                force: false,
            })
            .unwrap();
        state
            .execute(Command::ConnectPorts {
                graph: inner,
                source: out,
                target: sum,
                force: false,
            })
            .unwrap();
        adder
    }

    #[test]
    fn export_describes_child_graph() {
        let mut state = State::new();
        let node = adder(&mut state);
        let doc = state.export_node(node, &NoHooks).unwrap();

        assert_eq!(doc.name, "adder");
        assert_eq!(doc.ports.len(), 2);
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(
            doc.connections[0].source,
            PortAddress {
                node: None,
                port: "a".into()
            }
        );
        assert_eq!(
            doc.connections[0].target,
            PortAddress {
                node: Some(0),
                port: "lhs".into()
            }
        );
    }

    #[test]
    fn import_recreates_exported_node() {
        let mut state = State::new();
        let node = adder(&mut state);
        let doc = state.export_node(node, &NoHooks).unwrap();

        let root = state.root_id();
        let imported = state.import_node(root, &doc).unwrap();
        let copy = imported.root.unwrap();
        assert_ne!(copy, node);
        assert_eq!(imported.nodes.len(), 2);
        assert_eq!(imported.connections.len(), 2);
        let again = state.export_node(copy, &NoHooks).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn validate_rejects_dangling_address() {
        let doc = NodeDocument {
            name: "broken".into(),
            connections: vec![ConnectionDocument {
                source: PortAddress {
                    node: Some(3),
                    port: "out".into(),
                },
                target: PortAddress {
                    node: None,
                    port: "in".into(),
                },
                extra: Map::new(),
            }],
            ..Default::default()
        };
        assert!(matches!(doc.validate(), Err(ModelError::Document(_))));
    }

    #[test]
    fn library_json_keeps_entries() {
        let mut state = State::new();
        let node = adder(&mut state);
        let mut library = Library::new();
        library.insert("math/adder", state.export_node(node, &NoHooks).unwrap());

        let json = library.to_json().unwrap();
        let back = Library::from_json(&json).unwrap();
        assert_eq!(back, library);
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["math/adder"]);
        assert!(matches!(
            back.get("missing"),
            Err(ModelError::UnknownLibraryEntry(_))
        ));
    }
}
