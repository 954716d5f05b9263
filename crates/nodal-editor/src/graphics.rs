//! `GraphicsState`: the registry, router and navigator of one editor
//! session, and the handlers that keep them in step with the model.
//!
//! The model queues its events; the session delivers each one through
//! `GraphicsState::handle`, which looks up the topic's subscribers and runs
//! the matching handler for each, in registration order.

use crate::config::EditorConfig;
use crate::error::SyncError;
use crate::items::{Clickable, Connectable, Hit};
use crate::navigator::Navigator;
use crate::registry::Registry;
use crate::router::{Router, Subscriber};
use crate::scope::Boundary;
use kurbo::Point;
use nodal_core::{Event, Graph, Identifier, Source, State};
use nodal_render::{GridLines, NodeMetrics};

#[derive(Debug)]
pub struct GraphicsState {
    registry: Registry,
    router: Router,
    navigator: Navigator,
    config: EditorConfig,
    metrics: NodeMetrics,
}

impl GraphicsState {
    /// Mirror the root graph of `state` and make it the active scope. The
    /// root exists before any event, so it is created here rather than by
    /// notification.
    pub fn new(state: &State, config: EditorConfig) -> Result<Self, SyncError> {
        let mut graphics = Self {
            registry: Registry::new(),
            router: Router::new(),
            navigator: Navigator::new(&config),
            metrics: config.metrics(),
            config,
        };
        let root = state.root_graph();
        graphics.on_graph_created(state, root)?;
        graphics.navigator.set_active(&graphics.registry, root.id)?;
        Ok(graphics)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    pub fn active_graph(&self) -> Option<Identifier> {
        self.navigator.active_graph()
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    pub fn set_active(&mut self, scope: Identifier) -> Result<bool, SyncError> {
        self.navigator.set_active(&self.registry, scope)
    }

    pub fn drill_down(&mut self, node: Identifier) -> Result<bool, SyncError> {
        self.navigator.drill_down(&self.registry, node)
    }

    pub fn drill_up(&mut self, state: &State) -> Result<bool, SyncError> {
        self.navigator.drill_up(&self.registry, state)
    }

    pub fn zoom(&mut self, steps: i32) {
        self.navigator.zoom(steps);
    }

    // ─── Interaction queries ─────────────────────────────────────────────

    /// Background grid of the active scope over the visible canvas.
    pub fn background(&self) -> GridLines {
        match self.navigator.active(&self.registry) {
            Some(scope) => scope.background(
                self.navigator.viewport().visible_rect(),
                self.config.grid(),
            ),
            None => GridLines::default(),
        }
    }

    /// The topmost item of the active scope under `at`.
    pub fn hit(&self, at: Point) -> Result<Hit, SyncError> {
        match self.navigator.active_graph() {
            Some(scope) => self.registry.hit(scope, at, &self.metrics),
            None => Ok(Hit::Empty),
        }
    }

    /// The double-click capability of a hit item, if it has one.
    pub fn clickable(&self, hit: Hit) -> Option<&dyn Clickable> {
        match hit {
            Hit::Node(id) => self.registry.node(id).ok().map(|n| n as &dyn Clickable),
            Hit::Port(id) => self.registry.port(id).ok().map(|p| p as &dyn Clickable),
            Hit::Connection(id) => self
                .registry
                .connection(id)
                .ok()
                .map(|c| c as &dyn Clickable),
            Hit::Boundary(side) => {
                let scope = self.navigator.active(&self.registry)?;
                scope.boundary().map(|b| b.side(side) as &dyn Clickable)
            }
            Hit::Virtual(_) | Hit::Empty => None,
        }
    }

    /// The connection-end capability of a hit item, if it has one.
    pub fn connectable(&self, hit: Hit) -> Option<&dyn Connectable> {
        match hit {
            Hit::Port(id) => self.registry.port(id).ok().map(|p| p as &dyn Connectable),
            Hit::Virtual(id) => {
                let scope = self.navigator.active(&self.registry)?;
                scope
                    .boundary()?
                    .virtual_port(id)
                    .map(|vp| vp as &dyn Connectable)
            }
            _ => None,
        }
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Deliver one model event to its subscribers.
    pub fn handle(&mut self, state: &State, event: &Event) -> Result<(), SyncError> {
        let topic = event.topic();
        let subscribers = self.router.subscribers(&topic);
        log::trace!("dispatch {topic:?} to {} subscriber(s)", subscribers.len());
        for subscriber in subscribers {
            match subscriber {
                Subscriber::Registry => self.on_state_event(state, event)?,
                Subscriber::Scope(scope) => self.on_scope_event(scope, event)?,
                Subscriber::Boundary(scope) => self.on_boundary_event(scope, event),
            }
        }
        Ok(())
    }

    fn on_state_event(&mut self, state: &State, event: &Event) -> Result<(), SyncError> {
        match event {
            Event::GraphCreated(graph) => self.on_graph_created(state, graph)?,
            Event::GraphDeleted(removed) => {
                self.router.unsubscribe_scope(removed.id);
                self.registry.delete_graph(removed.id)?;
                if self.navigator.release(removed.id) {
                    log::debug!("active scope {} deleted, back to root", removed.path);
                    self.navigator.set_active(&self.registry, state.root_id())?;
                }
            }
            Event::NodeCreated(node) => {
                let position = self.navigator.viewport_center();
                self.registry.create_node(node, position)?;
                log::debug!("node {} mirrored at {position:?}", state.path(node.id));
                self.router
                    .watch_name(Subscriber::Registry, Source::Node(node.id));
            }
            Event::NodeDeleted(removed) => {
                self.router.unwatch(Subscriber::Registry, removed.id);
                self.registry.delete_node(removed.id)?;
                log::debug!("node {} mirror dropped", removed.path);
            }
            Event::PortCreated(port) => {
                self.registry.create_port(port)?;
                log::debug!("port {} mirrored", state.path(port.id));
                self.router
                    .watch_name(Subscriber::Registry, Source::Port(port.id));
            }
            Event::PortDeleted(removed) => {
                self.router.unwatch(Subscriber::Registry, removed.id);
                self.registry.delete_port(removed.id)?;
                log::debug!("port {} mirror dropped", removed.path);
            }
            Event::ConnectionCreated(connection) => {
                self.registry.create_connection(connection)?;
                log::debug!(
                    "connection {} -> {} mirrored",
                    state.path(connection.source),
                    state.path(connection.target)
                );
            }
            Event::ConnectionDeleted(removed) => {
                if !self.registry.delete_connection(removed.id)? {
                    log::debug!("connection {} was already dropped", removed.path);
                }
            }
            Event::NodeRenamed { node, name } => self.registry.rename_node(*node, name)?,
            Event::PortRenamed { port, name } => self.registry.rename_port(*port, name)?,
            _ => log::trace!("registry ignores {:?}", event.topic()),
        }
        Ok(())
    }

    /// Create a graph's graphics graph, its boundary and its subscriptions.
    fn on_graph_created(&mut self, state: &State, graph: &Graph) -> Result<(), SyncError> {
        let scope = self.registry.create_graph(graph)?;
        if let Some(parent) = graph.parent_node {
            let half_width = self.config.viewport_width / 2.0;
            let margin = self.config.boundary_margin;
            let mut boundary = Boundary::new(
                Point::new(-half_width + margin, 0.0),
                Point::new(half_width - margin - self.config.node_width, 0.0),
            );
            for port in state.node_ports_recursive(parent) {
                if let Ok(port) = state.port(port) {
                    boundary.mirror(port);
                }
            }
            scope.set_boundary(boundary);
        }
        self.router.subscribe_scope(graph.id, graph.parent_node);
        log::debug!("scope {} ready", state.path(graph.id));
        Ok(())
    }

    fn on_scope_event(&mut self, scope: Identifier, event: &Event) -> Result<(), SyncError> {
        match event {
            Event::NodeRegistered { node, .. } => {
                self.registry.attach_node(scope, node.id)?;
            }
            Event::NodeUnregistered { node, .. } => {
                self.registry.detach_node(scope, node.id)?;
            }
            Event::PortRegistered { port, .. } => {
                self.registry.attach_port(scope, port.id)?;
            }
            Event::PortUnregistered { port, .. } => {
                self.registry.detach_port(scope, port.id)?;
            }
            Event::ConnectionRegistered { connection, .. } => {
                if let Err(err) = self.registry.attach_connection(scope, connection.id) {
                    log::error!(
                        "attaching connection {} -> {} to scope {scope} failed: {err}",
                        connection.source,
                        connection.target
                    );
                }
            }
            Event::ConnectionUnregistered { connection, .. } => {
                self.registry.detach_connection(scope, connection.id);
            }
            _ => log::trace!("scope {scope} ignores {:?}", event.topic()),
        }
        Ok(())
    }

    fn on_boundary_event(&mut self, scope: Identifier, event: &Event) {
        let Ok(graph) = self.registry.graphs.get_mut(scope) else {
            log::trace!("boundary of deleted scope {scope} ignores {:?}", event.topic());
            return;
        };
        let Some(boundary) = graph.boundary_mut() else {
            return;
        };
        match event {
            Event::NodePortRegistered { port, .. } => {
                if boundary.mirror(port) {
                    log::debug!("virtual port '{}' added to scope {scope}", port.name);
                }
                self.router
                    .watch_name(Subscriber::Boundary(scope), Source::Port(port.id));
            }
            Event::NodePortUnregistered { port, .. } => {
                if boundary.unmirror(port.id) {
                    log::debug!("virtual port {} removed from scope {scope}", port.path);
                } else {
                    log::trace!("no virtual port for {} in scope {scope}", port.path);
                }
                self.router.unwatch(Subscriber::Boundary(scope), port.id);
            }
            Event::PortRenamed { port, name } => {
                boundary.rename(*port, name);
            }
            _ => log::trace!("boundary of {scope} ignores {:?}", event.topic()),
        }
    }
}
