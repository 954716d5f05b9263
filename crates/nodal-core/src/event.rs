//! Structural-change notifications and the topic bus that routes them.
//!
//! Events are value snapshots: a handler receives everything it needs to
//! mirror the change without reaching back into the model, which may already
//! have moved on (a deleted node is gone from `State` by the time its
//! `NodeDeleted` event is delivered).
//!
//! `Bus` keeps an ordered subscriber table per `Topic`. Delivery order is
//! registration order; `subscribers` hands out a snapshot so a handler may
//! subscribe or unsubscribe while an event is being dispatched.

use crate::id::Identifier;
use crate::model::{Connection, Graph, Node, Port};
use std::collections::HashMap;

/// Identifier and last known path of an entity that left a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    pub id: Identifier,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // ── state-wide lifecycle ──
    GraphCreated(Graph),
    GraphDeleted(Removed),
    NodeCreated(Node),
    NodeDeleted(Removed),
    PortCreated(Port),
    PortDeleted(Removed),
    ConnectionCreated(Connection),
    ConnectionDeleted(Removed),

    // ── per-graph membership ──
    NodeRegistered {
        graph: Identifier,
        node: Node,
    },
    NodeUnregistered {
        graph: Identifier,
        node: Removed,
    },
    PortRegistered {
        graph: Identifier,
        port: Port,
    },
    PortUnregistered {
        graph: Identifier,
        port: Removed,
    },
    ConnectionRegistered {
        graph: Identifier,
        connection: Connection,
    },
    ConnectionUnregistered {
        graph: Identifier,
        connection: Removed,
    },

    // ── per-node ports ──
    NodePortRegistered {
        node: Identifier,
        port: Port,
    },
    NodePortUnregistered {
        node: Identifier,
        port: Removed,
    },

    // ── cosmetic ──
    NodeRenamed {
        node: Identifier,
        name: String,
    },
    PortRenamed {
        port: Identifier,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GraphCreated,
    GraphDeleted,
    NodeCreated,
    NodeDeleted,
    PortCreated,
    PortDeleted,
    ConnectionCreated,
    ConnectionDeleted,
    NodeRegistered,
    NodeUnregistered,
    PortRegistered,
    PortUnregistered,
    ConnectionRegistered,
    ConnectionUnregistered,
    NodePortRegistered,
    NodePortUnregistered,
    NameChanged,
}

/// Who emits an event: the whole state, one graph, one node or one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    State,
    Graph(Identifier),
    Node(Identifier),
    Port(Identifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic {
    pub source: Source,
    pub kind: EventKind,
}

impl Topic {
    pub const fn new(source: Source, kind: EventKind) -> Self {
        Self { source, kind }
    }

    pub const fn state(kind: EventKind) -> Self {
        Self::new(Source::State, kind)
    }

    pub const fn graph(graph: Identifier, kind: EventKind) -> Self {
        Self::new(Source::Graph(graph), kind)
    }

    pub const fn node(node: Identifier, kind: EventKind) -> Self {
        Self::new(Source::Node(node), kind)
    }

    pub const fn port(port: Identifier, kind: EventKind) -> Self {
        Self::new(Source::Port(port), kind)
    }
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::GraphCreated(_) => Topic::state(EventKind::GraphCreated),
            Event::GraphDeleted(_) => Topic::state(EventKind::GraphDeleted),
            Event::NodeCreated(_) => Topic::state(EventKind::NodeCreated),
            Event::NodeDeleted(_) => Topic::state(EventKind::NodeDeleted),
            Event::PortCreated(_) => Topic::state(EventKind::PortCreated),
            Event::PortDeleted(_) => Topic::state(EventKind::PortDeleted),
            Event::ConnectionCreated(_) => Topic::state(EventKind::ConnectionCreated),
            Event::ConnectionDeleted(_) => Topic::state(EventKind::ConnectionDeleted),
            Event::NodeRegistered { graph, .. } => Topic::graph(*graph, EventKind::NodeRegistered),
            Event::NodeUnregistered { graph, .. } => {
                Topic::graph(*graph, EventKind::NodeUnregistered)
            }
            Event::PortRegistered { graph, .. } => Topic::graph(*graph, EventKind::PortRegistered),
            Event::PortUnregistered { graph, .. } => {
                Topic::graph(*graph, EventKind::PortUnregistered)
            }
            Event::ConnectionRegistered { graph, .. } => {
                Topic::graph(*graph, EventKind::ConnectionRegistered)
            }
            Event::ConnectionUnregistered { graph, .. } => {
                Topic::graph(*graph, EventKind::ConnectionUnregistered)
            }
            Event::NodePortRegistered { node, .. } => {
                Topic::node(*node, EventKind::NodePortRegistered)
            }
            Event::NodePortUnregistered { node, .. } => {
                Topic::node(*node, EventKind::NodePortUnregistered)
            }
            Event::NodeRenamed { node, .. } => Topic::node(*node, EventKind::NameChanged),
            Event::PortRenamed { port, .. } => Topic::port(*port, EventKind::NameChanged),
        }
    }
}

// ─── Bus ─────────────────────────────────────────────────────────────────

/// Handle returned by `Bus::subscribe`, used to end the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone)]
struct Entry<S> {
    id: SubscriptionId,
    subscriber: S,
}

/// Ordered, multi-subscriber topic table, indexed by topic.
#[derive(Debug, Clone)]
pub struct Bus<S> {
    topics: HashMap<Topic, Vec<Entry<S>>>,
    /// Topic of every live subscription.
    index: HashMap<SubscriptionId, Topic>,
    next_id: u64,
}

impl<S> Default for Bus<S> {
    fn default() -> Self {
        Self {
            topics: HashMap::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<S: Clone + PartialEq> Bus<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: Topic, subscriber: S) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.topics
            .entry(topic)
            .or_default()
            .push(Entry { id, subscriber });
        self.index.insert(id, topic);
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(topic) = self.index.remove(&id) else {
            return false;
        };
        if let Some(entries) = self.topics.get_mut(&topic) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                self.topics.remove(&topic);
            }
        }
        true
    }

    /// Drop every subscription held by `subscriber`. Returns how many went.
    pub fn unsubscribe_all(&mut self, subscriber: &S) -> usize {
        let index = &mut self.index;
        let mut removed = 0;
        self.topics.retain(|_, entries| {
            entries.retain(|e| {
                if &e.subscriber == subscriber {
                    index.remove(&e.id);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
            !entries.is_empty()
        });
        removed
    }

    /// Subscribers of `topic`, in registration order.
    pub fn subscribers(&self, topic: &Topic) -> Vec<S> {
        self.topics
            .get(topic)
            .map(|entries| entries.iter().map(|e| e.subscriber.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_come_back_in_registration_order() {
        let mut bus: Bus<&str> = Bus::new();
        let topic = Topic::state(EventKind::NodeCreated);
        bus.subscribe(topic, "registry");
        bus.subscribe(Topic::state(EventKind::NodeDeleted), "other");
        bus.subscribe(topic, "scope");
        assert_eq!(bus.subscribers(&topic), vec!["registry", "scope"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_entry() {
        let mut bus: Bus<u8> = Bus::new();
        let g = Identifier::new();
        let topic = Topic::graph(g, EventKind::NodeRegistered);
        let first = bus.subscribe(topic, 1);
        bus.subscribe(topic, 2);
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.subscribers(&topic), vec![2]);
    }

    #[test]
    fn unsubscribe_all_drops_every_topic_of_a_subscriber() {
        let mut bus: Bus<u8> = Bus::new();
        let g = Identifier::new();
        bus.subscribe(Topic::graph(g, EventKind::NodeRegistered), 7);
        bus.subscribe(Topic::graph(g, EventKind::NodeUnregistered), 7);
        bus.subscribe(Topic::graph(g, EventKind::NodeRegistered), 8);
        assert_eq!(bus.unsubscribe_all(&7), 2);
        assert_eq!(bus.len(), 1);
        assert!(bus.subscribers(&Topic::graph(g, EventKind::NodeUnregistered)).is_empty());
    }

    #[test]
    fn order_survives_removal_within_a_topic() {
        let mut bus: Bus<u8> = Bus::new();
        let topic = Topic::state(EventKind::PortCreated);
        bus.subscribe(topic, 1);
        let second = bus.subscribe(topic, 2);
        bus.subscribe(Topic::state(EventKind::PortDeleted), 9);
        bus.subscribe(topic, 3);
        bus.unsubscribe(second);
        bus.subscribe(topic, 4);
        assert_eq!(bus.subscribers(&topic), vec![1, 3, 4]);
        assert_eq!(bus.len(), 4);
    }

    #[test]
    fn topics_distinguish_sources() {
        let g = Identifier::new();
        let node = Node {
            id: Identifier::new(),
            name: "A".into(),
            graph: g,
            ports: Default::default(),
            child_graph: Identifier::new(),
        };
        let event = Event::NodeRegistered { graph: g, node };
        assert_eq!(event.topic(), Topic::graph(g, EventKind::NodeRegistered));
        assert_ne!(event.topic(), Topic::state(EventKind::NodeRegistered));
    }
}
