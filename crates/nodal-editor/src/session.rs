//! Editor session: the model, its graphics mirror, the node library and the
//! selection, kept together so every mutation is followed by its
//! synchronization pass.

use crate::config::EditorConfig;
use crate::error::SyncError;
use crate::graphics::GraphicsState;
use crate::interaction::{GROUP_NAME, Gesture, Selection};
use crate::items::{Endpoint, GraphicsNode, Hit, Navigation};
use crate::resolve::{Like, identifier};
use kurbo::Point;
use nodal_core::{Command, Identifier, Library, ModelError, Outcome, PortDirection, State};

#[derive(Debug)]
pub struct Editor {
    state: State,
    graphics: GraphicsState,
    library: Library,
    selection: Selection,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self, SyncError> {
        let state = State::new();
        let graphics = GraphicsState::new(&state, config)?;
        Ok(Self {
            state,
            graphics,
            library: Library::new(),
            selection: Selection::default(),
        })
    }

    #[must_use]
    pub fn with_library(mut self, library: Library) -> Self {
        self.library = library;
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn graphics(&self) -> &GraphicsState {
        &self.graphics
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The displayed scope, or the root before any scope is active.
    pub fn active_scope(&self) -> Identifier {
        self.graphics
            .active_graph()
            .unwrap_or_else(|| self.state.root_id())
    }

    // ─── Model ↔ graphics ────────────────────────────────────────────────

    /// Execute a command and synchronize the graphics with its events.
    pub fn execute(&mut self, command: Command) -> Result<Outcome, SyncError> {
        let outcome = self.state.execute(command)?;
        self.pump()?;
        Ok(outcome)
    }

    /// Deliver every queued model event. Returns how many were delivered.
    pub fn pump(&mut self) -> Result<usize, SyncError> {
        let mut delivered = 0;
        while let Some(event) = self.state.poll_event() {
            self.graphics.handle(&self.state, &event)?;
            delivered += 1;
        }
        let registry = self.graphics.registry();
        self.selection.retain(
            |id| registry.nodes().contains(id),
            |id| registry.connections().contains(id),
        );
        Ok(delivered)
    }

    /// Execute a user-issued command. A rejection is logged and the session
    /// carries on.
    fn issue(&mut self, command: Command) -> Result<Option<Outcome>, SyncError> {
        match self.state.execute(command) {
            Ok(outcome) => {
                self.pump()?;
                Ok(Some(outcome))
            }
            Err(err) => {
                log::warn!("command rejected: {err}");
                Ok(None)
            }
        }
    }

    // ─── Navigation ──────────────────────────────────────────────────────

    pub fn set_active(&mut self, scope: Identifier) -> Result<bool, SyncError> {
        self.graphics.set_active(scope)
    }

    pub fn drill_down(&mut self, node: Identifier) -> Result<bool, SyncError> {
        self.graphics.drill_down(node)
    }

    pub fn drill_up(&mut self) -> Result<bool, SyncError> {
        self.graphics.drill_up(&self.state)
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    pub fn handle_gesture(&mut self, gesture: Gesture) -> Result<(), SyncError> {
        log::trace!("gesture {gesture:?}");
        match gesture {
            Gesture::Click { at, extend } => match self.graphics.hit(at)? {
                Hit::Node(id) => self.selection.pick_node(id, extend),
                Hit::Connection(id) => self.selection.pick_connection(id, extend),
                Hit::Empty if !extend => self.selection.clear(),
                _ => {}
            },
            Gesture::DoubleClick { at } => {
                let navigation = match self.graphics.hit(at)? {
                    Hit::Empty => Navigation::Leave,
                    hit => self
                        .graphics
                        .clickable(hit)
                        .map_or(Navigation::Stay, |item| item.double_click()),
                };
                match navigation {
                    Navigation::Enter(scope) => {
                        self.graphics.set_active(scope)?;
                    }
                    Navigation::Leave => {
                        self.graphics.drill_up(&self.state)?;
                    }
                    Navigation::Stay => {}
                }
            }
            Gesture::Drag { from, to } => {
                if let Hit::Node(id) = self.graphics.hit(from)?
                    && !self.selection.contains_node(id)
                {
                    self.selection.pick_node(id, false);
                }
                let delta = to - from;
                for &id in self.selection.nodes() {
                    self.graphics.registry_mut().move_node_by(id, delta)?;
                }
            }
            Gesture::Connect { from, to, force } => {
                let (Some(a), Some(b)) = (self.endpoint_at(from)?, self.endpoint_at(to)?) else {
                    log::debug!("connect gesture needs a socket at both ends");
                    return Ok(());
                };
                let (source, target) = if a.direction == PortDirection::Output {
                    (a, b)
                } else {
                    (b, a)
                };
                let graph = self.active_scope();
                self.issue(Command::ConnectPorts {
                    graph,
                    source: source.port,
                    target: target.port,
                    force,
                })?;
            }
            Gesture::Delete => self.delete_selection()?,
            Gesture::Group => {
                let graph = self.active_scope();
                let nodes = self.selection.nodes().to_vec();
                let created = self.issue(Command::GroupNodes {
                    graph,
                    nodes,
                    name: GROUP_NAME.to_string(),
                })?;
                if let Some(group) = created.and_then(Outcome::created) {
                    self.selection.pick_node(group, false);
                }
            }
            Gesture::Wheel { steps } => self.graphics.zoom(steps),
        }
        Ok(())
    }

    fn endpoint_at(&self, at: Point) -> Result<Option<Endpoint>, SyncError> {
        let hit = self.graphics.hit(at)?;
        Ok(self.graphics.connectable(hit).map(|item| item.endpoint()))
    }

    /// Disconnect the selected connections, then delete the selected nodes.
    /// Items already removed by an earlier deletion are skipped.
    fn delete_selection(&mut self) -> Result<(), SyncError> {
        for id in self.selection.connections().to_vec() {
            let Ok(connection) = self.state.connection(id) else {
                log::trace!("connection {id} already gone");
                continue;
            };
            let command = Command::DisconnectPorts {
                graph: connection.graph,
                source: connection.source,
                target: connection.target,
            };
            self.issue(command)?;
        }
        for id in self.selection.nodes().to_vec() {
            if self.state.node(id).is_err() {
                log::trace!("node {id} already gone");
                continue;
            }
            self.issue(Command::DeleteNode { node: id })?;
        }
        self.selection.clear();
        Ok(())
    }

    // ─── Library ─────────────────────────────────────────────────────────

    /// Instantiate a library entry in `graph` (the active scope by default)
    /// and apply its editor data once its graphics exist.
    pub fn import_library_node(
        &mut self,
        name: &str,
        graph: Option<Identifier>,
    ) -> Result<Identifier, SyncError> {
        let document = self.library.get(name)?.clone();
        let graph = graph.unwrap_or_else(|| self.active_scope());
        let imported = self.state.import_node(graph, &document)?;
        self.pump()?;
        imported.apply(&self.state, &mut self.graphics);
        imported
            .root
            .ok_or_else(|| ModelError::Document(format!("{name}: nothing imported")).into())
    }

    /// Store a node's definition in the library under `name`.
    pub fn export_node<'a>(
        &mut self,
        node: impl Into<Like<'a>>,
        name: &str,
    ) -> Result<(), SyncError> {
        let id = identifier::<GraphicsNode>(node.into())?;
        let document = self.state.export_node(id, &self.graphics)?;
        log::debug!("export {} as '{name}'", self.state.path(id));
        self.library.insert(name, document);
        Ok(())
    }
}
