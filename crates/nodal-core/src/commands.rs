//! Command layer: the mutations an editor may request.
//!
//! Every user-visible change to the model is a `Command` executed through
//! `State::execute`. Commands validate first and only then touch the model,
//! so a rejected command leaves both the model and the event queue as they
//! were.

use crate::error::ModelError;
use crate::id::{Identifier, PortType};
use crate::model::{Graph, PortDirection, State};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateNode {
        graph: Identifier,
        name: String,
    },
    DeleteNode {
        node: Identifier,
    },
    CreatePort {
        node: Identifier,
        name: String,
        direction: PortDirection,
        port_type: PortType,
        parent_port: Option<Identifier>,
    },
    DeletePort {
        port: Identifier,
    },
    RenameNode {
        node: Identifier,
        name: String,
    },
    RenamePort {
        port: Identifier,
        name: String,
    },
    /// Connect two ports inside `graph`. With `force`, an existing
    /// connection into `target` is removed instead of rejecting the command.
    ConnectPorts {
        graph: Identifier,
        source: Identifier,
        target: Identifier,
        force: bool,
    },
    DisconnectPorts {
        graph: Identifier,
        source: Identifier,
        target: Identifier,
    },
    /// Move `nodes` into the child graph of a new node named `name`.
    GroupNodes {
        graph: Identifier,
        nodes: Vec<Identifier>,
        name: String,
    },
}

/// What a successful command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created(Identifier),
    Done,
}

impl Outcome {
    pub fn created(self) -> Option<Identifier> {
        match self {
            Outcome::Created(id) => Some(id),
            Outcome::Done => None,
        }
    }
}

impl State {
    /// Validate and apply a command.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, ModelError> {
        log::debug!("execute {command:?}");
        match command {
            Command::CreateNode { graph, name } => self.add_node(graph, &name).map(Outcome::Created),
            Command::DeleteNode { node } => self.remove_node(node).map(|_| Outcome::Done),
            Command::CreatePort {
                node,
                name,
                direction,
                port_type,
                parent_port,
            } => self
                .add_port(node, &name, direction, port_type, parent_port)
                .map(Outcome::Created),
            Command::DeletePort { port } => self.remove_port(port).map(|_| Outcome::Done),
            Command::RenameNode { node, name } => self.rename_node(node, &name).map(|_| Outcome::Done),
            Command::RenamePort { port, name } => self.rename_port(port, &name).map(|_| Outcome::Done),
            Command::ConnectPorts {
                graph,
                source,
                target,
                force,
            } => self
                .connect_ports(graph, source, target, force)
                .map(Outcome::Created),
            Command::DisconnectPorts {
                graph,
                source,
                target,
            } => self
                .disconnect_ports(graph, source, target)
                .map(|_| Outcome::Done),
            Command::GroupNodes { graph, nodes, name } => {
                self.group_nodes(graph, &nodes, &name).map(Outcome::Created)
            }
        }
    }

    /// The direction a port plays inside `graph`: its own direction for ports
    /// of nodes in the graph, the inverted one for ports of the graph's
    /// parent node. `None` if the port is not visible from `graph`.
    pub fn effective_direction(&self, graph: &Graph, port: Identifier) -> Option<PortDirection> {
        let port = self.port(port).ok()?;
        let node = self.node(port.node).ok()?;
        if node.graph == graph.id {
            Some(port.direction)
        } else if graph.parent_node == Some(node.id) {
            Some(port.direction.inverted())
        } else {
            None
        }
    }

    /// Check whether `source -> target` may be connected inside `graph`,
    /// ignoring an existing connection into `target`.
    pub fn validate_connection(
        &self,
        graph: Identifier,
        source: Identifier,
        target: Identifier,
    ) -> Result<(), ModelError> {
        let g = self.graph(graph)?;
        let src = self.port(source)?;
        let tgt = self.port(target)?;
        let invalid = |reason: &str| ModelError::InvalidConnection {
            source_path: self.path(source),
            target_path: self.path(target),
            reason: reason.to_string(),
        };

        let (Some(src_dir), Some(tgt_dir)) = (
            self.effective_direction(g, source),
            self.effective_direction(g, target),
        ) else {
            return Err(invalid("port is not visible from this graph"));
        };
        if src.node == tgt.node && g.parent_node != Some(src.node) {
            return Err(invalid("ports belong to the same node"));
        }
        if src_dir != PortDirection::Output {
            return Err(invalid("source does not output into this graph"));
        }
        if tgt_dir != PortDirection::Input {
            return Err(invalid("target does not accept input in this graph"));
        }
        if src.port_type != tgt.port_type {
            return Err(ModelError::TypeMismatch {
                source_type: src.port_type,
                target_type: tgt.port_type,
            });
        }
        Ok(())
    }

    fn connect_ports(
        &mut self,
        graph: Identifier,
        source: Identifier,
        target: Identifier,
        force: bool,
    ) -> Result<Identifier, ModelError> {
        self.validate_connection(graph, source, target)?;

        let existing = self
            .graph(graph)?
            .connections
            .iter()
            .filter_map(|c| self.connection(*c).ok())
            .find(|c| c.target == target)
            .map(|c| (c.id, c.source));
        if let Some((existing, existing_source)) = existing {
            if existing_source == source {
                return Err(ModelError::InvalidConnection {
                    source_path: self.path(source),
                    target_path: self.path(target),
                    reason: "ports are already connected".to_string(),
                });
            }
            if !force {
                return Err(ModelError::TargetOccupied {
                    target_path: self.path(target),
                });
            }
            log::debug!("force-reconnect {}: dropping previous input", self.path(target));
            self.remove_connection(existing)?;
        }
        Ok(self.add_connection(graph, source, target))
    }

    fn disconnect_ports(
        &mut self,
        graph: Identifier,
        source: Identifier,
        target: Identifier,
    ) -> Result<(), ModelError> {
        let Some(id) = self.find_connection(graph, source, target).map(|c| c.id) else {
            return Err(ModelError::NotConnected {
                source_path: self.path(source),
                target_path: self.path(target),
            });
        };
        self.remove_connection(id)
    }

    fn group_nodes(
        &mut self,
        graph: Identifier,
        nodes: &[Identifier],
        name: &str,
    ) -> Result<Identifier, ModelError> {
        let mut selection: Vec<Identifier> = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if self.node(node)?.graph != graph {
                return Err(ModelError::NotInGraph {
                    path: self.path(node),
                    graph: self.path(graph),
                });
            }
            if !selection.contains(&node) {
                selection.push(node);
            }
        }
        if selection.is_empty() {
            return Err(ModelError::EmptySelection);
        }

        // Classify the graph's connections before anything moves.
        let in_selection = |state: &State, port: Identifier| {
            state
                .port(port)
                .map(|p| selection.contains(&p.node))
                .unwrap_or(false)
        };
        let mut internal = Vec::new();
        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        for &id in &self.graph(graph)?.connections {
            let c = self.connection(id)?;
            match (in_selection(self, c.source), in_selection(self, c.target)) {
                (true, true) => internal.push(id),
                (false, true) => incoming.push((id, c.source, c.target)),
                (true, false) => outgoing.push((id, c.source, c.target)),
                (false, false) => {}
            }
        }

        let group = self.add_node(graph, name)?;
        let inner = self.node(group)?.child_graph;

        for (id, _, _) in incoming.iter().chain(outgoing.iter()) {
            self.remove_connection(*id)?;
        }
        for &node in &selection {
            self.move_node(node, inner)?;
        }
        for id in internal {
            self.move_connection(id, inner)?;
        }

        for (_, outside, inside) in incoming {
            let port = self.port(inside)?;
            let (port_name, port_type) = (port.name.clone(), port.port_type);
            let exposed = self.add_port(group, &port_name, PortDirection::Input, port_type, None)?;
            self.add_connection(graph, outside, exposed);
            self.add_connection(inner, exposed, inside);
        }
        let mut exposed_outputs: HashMap<Identifier, Identifier> = HashMap::new();
        for (_, inside, outside) in outgoing {
            let exposed = match exposed_outputs.get(&inside) {
                Some(exposed) => *exposed,
                None => {
                    let port = self.port(inside)?;
                    let (port_name, port_type) = (port.name.clone(), port.port_type);
                    let exposed =
                        self.add_port(group, &port_name, PortDirection::Output, port_type, None)?;
                    self.add_connection(inner, inside, exposed);
                    exposed_outputs.insert(inside, exposed);
                    exposed
                }
            };
            self.add_connection(graph, exposed, outside);
        }

        log::debug!("grouped {} node(s) into {}", selection.len(), self.path(group));
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        state: State,
        a: Identifier,
        b: Identifier,
        out: Identifier,
        input: Identifier,
    }

    fn pair() -> Pair {
        let mut state = State::new();
        let root = state.root_id();
        let int = PortType::intern("int");
        let a = state.add_node(root, "A").unwrap();
        let b = state.add_node(root, "B").unwrap();
        let out = state.add_port(a, "out", PortDirection::Output, int, None).unwrap();
        let input = state.add_port(b, "in", PortDirection::Input, int, None).unwrap();
        state.drain_events();
        Pair {
            state,
            a,
            b,
            out,
            input,
        }
    }

    #[test]
    fn connect_rejects_wrong_direction() {
        let Pair {
            mut state,
            out,
            input,
            ..
        } = pair();
        let root = state.root_id();
        let err = state
            .execute(Command::ConnectPorts {
                graph: root,
                source: input,
                target: out,
                force: false,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConnection { .. }));
        assert!(!state.has_pending_events());
    }

    #[test]
    fn connect_rejects_type_mismatch() {
        let Pair {
            mut state, a, input, ..
        } = pair();
        let root = state.root_id();
        let float_out = state
            .add_port(a, "f", PortDirection::Output, PortType::intern("float"), None)
            .unwrap();
        let err = state
            .execute(Command::ConnectPorts {
                graph: root,
                source: float_out,
                target: input,
                force: false,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::TypeMismatch { .. }));
    }

    #[test]
    fn occupied_target_needs_force() {
        let Pair {
            mut state,
            a,
            out,
            input,
            ..
        } = pair();
        let root = state.root_id();
        let other = state
            .add_port(a, "other", PortDirection::Output, PortType::intern("int"), None)
            .unwrap();
        state
            .execute(Command::ConnectPorts {
                graph: root,
                source: out,
                target: input,
                force: false,
            })
            .unwrap();

        let err = state
            .execute(Command::ConnectPorts {
                graph: root,
                source: other,
                target: input,
                force: false,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::TargetOccupied { .. }));

        state
            .execute(Command::ConnectPorts {
                graph: root,
                source: other,
                target: input,
                force: true,
            })
            .unwrap();
        assert_eq!(state.connections().count(), 1);
        assert!(state.find_connection(root, other, input).is_some());
    }

    #[test]
    fn disconnect_unknown_pair_fails() {
        let Pair {
            mut state,
            out,
            input,
            ..
        } = pair();
        let root = state.root_id();
        let err = state
            .execute(Command::DisconnectPorts {
                graph: root,
                source: out,
                target: input,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::NotConnected { .. }));
    }

    #[test]
    fn group_rejects_empty_selection() {
        let Pair { mut state, .. } = pair();
        let root = state.root_id();
        let err = state
            .execute(Command::GroupNodes {
                graph: root,
                nodes: vec![],
                name: "C".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptySelection));
    }

    #[test]
    fn group_exposes_crossing_connections_as_ports() {
        let Pair {
            mut state,
            a,
            b,
            out,
            input,
        } = pair();
        let root = state.root_id();
        state
            .execute(Command::ConnectPorts {
                graph: root,
                source: out,
                target: input,
                force: false,
            })
            .unwrap();

        let group = state
            .execute(Command::GroupNodes {
                graph: root,
                nodes: vec![b],
                name: "C".into(),
            })
            .unwrap()
            .created()
            .unwrap();
        let inner = state.node(group).unwrap().child_graph;

        let exposed = state.node(group).unwrap().ports.clone();
        assert_eq!(exposed.len(), 1);
        let exposed_port = state.port(exposed[0]).unwrap();
        assert_eq!(exposed_port.name, "in");
        assert_eq!(exposed_port.direction, PortDirection::Input);

        assert!(state.find_connection(root, out, exposed[0]).is_some());
        assert!(state.find_connection(inner, exposed[0], input).is_some());
        assert_eq!(state.node(a).unwrap().graph, root);
        assert_eq!(state.node(b).unwrap().graph, inner);
    }

    #[test]
    fn parent_port_acts_inverted_inside_child_graph() {
        let Pair { mut state, b, .. } = pair();
        let inner = state.node(b).unwrap().child_graph;
        let g = state.graph(inner).unwrap().clone();
        let input = state.node(b).unwrap().ports[0];
        assert_eq!(
            state.effective_direction(&g, input),
            Some(PortDirection::Output)
        );
    }
}
