//! Canvas gestures and the current selection.
//!
//! Gestures arrive already decoded (the pixel-level mouse handling lives in
//! the host). `Editor::handle_gesture` turns them into navigation, graphics
//! moves, or model commands.

use kurbo::Point;
use nodal_core::Identifier;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Select what is under `at`. With `extend`, toggle it in the selection.
    Click { at: Point, extend: bool },
    /// Enter the node under `at`, or leave the scope on empty canvas.
    DoubleClick { at: Point },
    /// Move the selected nodes.
    Drag { from: Point, to: Point },
    /// Connect the sockets under `from` and `to`.
    Connect { from: Point, to: Point, force: bool },
    Delete,
    Group,
    Wheel { steps: i32 },
}

/// Name given to nodes created by grouping.
pub const GROUP_NAME: &str = "Group";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: Vec<Identifier>,
    connections: Vec<Identifier>,
}

impl Selection {
    pub fn nodes(&self) -> &[Identifier] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Identifier] {
        &self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    pub fn contains_node(&self, id: Identifier) -> bool {
        self.nodes.contains(&id)
    }

    /// Select only `id`, or toggle it when extending.
    pub fn pick_node(&mut self, id: Identifier, extend: bool) {
        pick(&mut self.nodes, &mut self.connections, id, extend);
    }

    pub fn pick_connection(&mut self, id: Identifier, extend: bool) {
        pick(&mut self.connections, &mut self.nodes, id, extend);
    }

    /// Drop entries whose item is gone.
    pub fn retain(
        &mut self,
        mut node_alive: impl FnMut(Identifier) -> bool,
        mut connection_alive: impl FnMut(Identifier) -> bool,
    ) {
        self.nodes.retain(|id| node_alive(*id));
        self.connections.retain(|id| connection_alive(*id));
    }
}

fn pick(list: &mut Vec<Identifier>, other: &mut Vec<Identifier>, id: Identifier, extend: bool) {
    if !extend {
        list.clear();
        other.clear();
        list.push(id);
    } else if let Some(index) = list.iter().position(|x| *x == id) {
        list.remove(index);
    } else {
        list.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pick_replaces_selection() {
        let mut selection = Selection::default();
        let (a, b, c) = (Identifier::new(), Identifier::new(), Identifier::new());
        selection.pick_node(a, false);
        selection.pick_connection(c, true);
        selection.pick_node(b, false);
        assert_eq!(selection.nodes(), &[b]);
        assert!(selection.connections().is_empty());
    }

    #[test]
    fn extend_toggles() {
        let mut selection = Selection::default();
        let (a, b) = (Identifier::new(), Identifier::new());
        selection.pick_node(a, true);
        selection.pick_node(b, true);
        selection.pick_node(a, true);
        assert_eq!(selection.nodes(), &[b]);
    }
}
