//! Active-scope navigator.
//!
//! Exactly one scope is displayed at a time. Switching is a synchronous swap
//! of the active identifier; the scope's graphics already exist because
//! every graph gets its graphics graph when it is created.

use crate::config::EditorConfig;
use crate::error::SyncError;
use crate::registry::Registry;
use crate::resolve::Like;
use crate::scope::GraphicsGraph;
use kurbo::{Point, Rect, Size, Vec2};
use nodal_core::{Identifier, State};

/// The visible part of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub zoom: f64,
    /// Widget size in pixels.
    pub size: Size,
}

impl Viewport {
    /// Canvas rectangle currently on screen.
    pub fn visible_rect(&self) -> Rect {
        let half = Vec2::new(self.size.width, self.size.height) / (2.0 * self.zoom);
        Rect::from_points(self.center - half, self.center + half)
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    active: Option<Identifier>,
    viewport: Viewport,
    zoom_factor: f64,
}

impl Navigator {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            active: None,
            viewport: Viewport {
                center: Point::ORIGIN,
                zoom: 1.0,
                size: Size::new(config.viewport_width, config.viewport_height),
            },
            zoom_factor: config.zoom_factor,
        }
    }

    pub fn active_graph(&self) -> Option<Identifier> {
        self.active
    }

    pub fn active<'r>(&self, registry: &'r Registry) -> Option<&'r GraphicsGraph> {
        self.active.and_then(|id| registry.graph(id).ok())
    }

    /// Display `scope`. Returns false if it was already active.
    pub fn set_active<'a>(
        &mut self,
        registry: &'a Registry,
        scope: impl Into<Like<'a>>,
    ) -> Result<bool, SyncError> {
        let id = registry.graph(scope)?.id();
        if self.active == Some(id) {
            log::trace!("scope {id} already active");
            return Ok(false);
        }
        log::debug!("activate scope {id}");
        self.active = Some(id);
        Ok(true)
    }

    /// Enter the graph owned by `node`.
    pub fn drill_down<'a>(
        &mut self,
        registry: &'a Registry,
        node: impl Into<Like<'a>>,
    ) -> Result<bool, SyncError> {
        let child = registry.node(node)?.child_graph;
        self.set_active(registry, child)
    }

    /// Go to the scope holding the active scope's parent node. No-op at the
    /// root.
    pub fn drill_up(&mut self, registry: &Registry, state: &State) -> Result<bool, SyncError> {
        let Some(active) = self.active else {
            return Ok(false);
        };
        match state.parent_graph(active) {
            Some(parent) => self.set_active(registry, parent),
            None => {
                log::trace!("scope {active} has no parent scope");
                Ok(false)
            }
        }
    }

    /// Forget the active scope if it is `scope`.
    pub(crate) fn release(&mut self, scope: Identifier) -> bool {
        if self.active == Some(scope) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_center(&self) -> Point {
        self.viewport.center
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.center += delta;
    }

    pub fn resize(&mut self, size: Size) {
        self.viewport.size = size;
    }

    /// Zoom in (positive steps) or out (negative steps) by the configured
    /// factor per step.
    pub fn zoom(&mut self, steps: i32) {
        self.viewport.zoom *= self.zoom_factor.powi(steps);
    }
}
