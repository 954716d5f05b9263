//! Subscription router: which graphics handler hears which model event.
//!
//! Subscriptions are plain data. A `Subscriber` names a handler inside
//! `GraphicsState`, and the router keeps a `Bus` of them per topic. The
//! registry subscribes to the state-wide lifecycle topics once, when the
//! router is built; every scope subscription is added later, so for any
//! entity the registry's create handler runs before the scope's attach.

use nodal_core::{Bus, EventKind, Identifier, Source, SubscriptionId, Topic};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    /// The entity registry: creation, deletion and renames.
    Registry,
    /// A scope's attach/detach handlers.
    Scope(Identifier),
    /// A scope's boundary, tracking its parent node's ports.
    Boundary(Identifier),
}

const STATE_TOPICS: [EventKind; 8] = [
    EventKind::GraphCreated,
    EventKind::GraphDeleted,
    EventKind::NodeCreated,
    EventKind::NodeDeleted,
    EventKind::PortCreated,
    EventKind::PortDeleted,
    EventKind::ConnectionCreated,
    EventKind::ConnectionDeleted,
];

const SCOPE_TOPICS: [EventKind; 6] = [
    EventKind::NodeRegistered,
    EventKind::NodeUnregistered,
    EventKind::PortRegistered,
    EventKind::PortUnregistered,
    EventKind::ConnectionRegistered,
    EventKind::ConnectionUnregistered,
];

#[derive(Debug)]
pub struct Router {
    bus: Bus<Subscriber>,
    /// Per-entity subscriptions (renames), so they can end with the entity.
    watches: HashMap<(Subscriber, Identifier), SubscriptionId>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        let mut bus = Bus::new();
        for kind in STATE_TOPICS {
            bus.subscribe(Topic::state(kind), Subscriber::Registry);
        }
        Self {
            bus,
            watches: HashMap::new(),
        }
    }

    /// Wire a scope's attach handlers, and its boundary when it has a
    /// parent node.
    pub fn subscribe_scope(&mut self, scope: Identifier, parent_node: Option<Identifier>) {
        for kind in SCOPE_TOPICS {
            self.bus
                .subscribe(Topic::graph(scope, kind), Subscriber::Scope(scope));
        }
        if let Some(node) = parent_node {
            for kind in [EventKind::NodePortRegistered, EventKind::NodePortUnregistered] {
                self.bus
                    .subscribe(Topic::node(node, kind), Subscriber::Boundary(scope));
            }
        }
        log::trace!("subscribed scope {scope}");
    }

    /// Drop every subscription held by a scope and its boundary.
    pub fn unsubscribe_scope(&mut self, scope: Identifier) -> usize {
        let owners = [Subscriber::Scope(scope), Subscriber::Boundary(scope)];
        self.watches.retain(|(subscriber, _), _| !owners.contains(subscriber));
        let removed: usize = owners.iter().map(|s| self.bus.unsubscribe_all(s)).sum();
        log::trace!("unsubscribed scope {scope} ({removed} topics)");
        removed
    }

    /// Subscribe to name changes of one node or port.
    pub fn watch_name(&mut self, subscriber: Subscriber, source: Source) {
        let entity = match source {
            Source::Node(id) | Source::Port(id) | Source::Graph(id) => id,
            Source::State => return,
        };
        if self.watches.contains_key(&(subscriber, entity)) {
            return;
        }
        let id = self
            .bus
            .subscribe(Topic::new(source, EventKind::NameChanged), subscriber);
        self.watches.insert((subscriber, entity), id);
    }

    pub fn unwatch(&mut self, subscriber: Subscriber, entity: Identifier) -> bool {
        match self.watches.remove(&(subscriber, entity)) {
            Some(id) => self.bus.unsubscribe(id),
            None => false,
        }
    }

    /// Subscribers of `topic` in registration order.
    pub fn subscribers(&self, topic: &Topic) -> Vec<Subscriber> {
        self.bus.subscribers(topic)
    }

    pub fn len(&self) -> usize {
        self.bus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bus.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_hears_lifecycle_before_scopes() {
        let router = Router::new();
        assert_eq!(
            router.subscribers(&Topic::state(EventKind::NodeCreated)),
            vec![Subscriber::Registry]
        );
        assert_eq!(router.len(), STATE_TOPICS.len());
    }

    #[test]
    fn scope_subscriptions_end_with_the_scope() {
        let mut router = Router::new();
        let scope = Identifier::new();
        let parent = Identifier::new();
        let port = Identifier::new();
        router.subscribe_scope(scope, Some(parent));
        router.watch_name(Subscriber::Boundary(scope), Source::Port(port));
        assert_eq!(
            router.subscribers(&Topic::node(parent, EventKind::NodePortRegistered)),
            vec![Subscriber::Boundary(scope)]
        );

        assert_eq!(router.unsubscribe_scope(scope), SCOPE_TOPICS.len() + 3);
        assert_eq!(router.len(), STATE_TOPICS.len());
        assert!(!router.unwatch(Subscriber::Boundary(scope), port));
    }

    #[test]
    fn root_scope_has_no_boundary() {
        let mut router = Router::new();
        let scope = Identifier::new();
        router.subscribe_scope(scope, None);
        assert_eq!(router.len(), STATE_TOPICS.len() + SCOPE_TOPICS.len());
    }

    #[test]
    fn watches_are_not_duplicated() {
        let mut router = Router::new();
        let node = Identifier::new();
        router.watch_name(Subscriber::Registry, Source::Node(node));
        router.watch_name(Subscriber::Registry, Source::Node(node));
        assert_eq!(
            router
                .subscribers(&Topic::node(node, EventKind::NameChanged))
                .len(),
            1
        );
        assert!(router.unwatch(Subscriber::Registry, node));
        assert!(!router.unwatch(Subscriber::Registry, node));
    }
}
