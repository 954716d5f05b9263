//! Editor-state hooks for the model's persistence pipeline.
//!
//! Node instances carry their canvas position under an `editor` key:
//!
//! ```json
//! { "name": "add", "editor": { "position": { "x": 120.0, "y": -40.0 } } }
//! ```
//!
//! Definitions carry no position; an imported definition is placed like any
//! new node.

use crate::graphics::GraphicsState;
use kurbo::Point;
use nodal_core::{Deserializer, Node, SerializationType, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const EDITOR_KEY: &str = "editor";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct EditorData {
    position: Position,
}

impl Serializer for GraphicsState {
    fn serialize_node(&self, node: &Node, ty: SerializationType) -> Map<String, Value> {
        let mut data = Map::new();
        if ty != SerializationType::Instance {
            return data;
        }
        let Ok(graphics) = self.registry().node(node.id) else {
            log::warn!("no graphics node for {} '{}', position not saved", node.id, node.name);
            return data;
        };
        let editor = EditorData {
            position: Position {
                x: graphics.position.x,
                y: graphics.position.y,
            },
        };
        match serde_json::to_value(editor) {
            Ok(value) => {
                data.insert(EDITOR_KEY.to_string(), value);
            }
            Err(err) => log::warn!("cannot serialize position of '{}': {err}", node.name),
        }
        data
    }
}

impl Deserializer for GraphicsState {
    fn deserialize_node(&mut self, data: &Map<String, Value>, node: &Node) {
        let Some(value) = data.get(EDITOR_KEY) else {
            return;
        };
        let editor: EditorData = match serde_json::from_value(value.clone()) {
            Ok(editor) => editor,
            Err(err) => {
                log::warn!("ignoring editor data of '{}': {err}", node.name);
                return;
            }
        };
        let position = Point::new(editor.position.x, editor.position.y);
        if let Err(err) = self.registry_mut().set_position(node.id, position) {
            log::warn!("cannot place '{}': {err}", node.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use nodal_core::{Command, State};
    use serde_json::json;

    fn session() -> (State, GraphicsState, Node) {
        let mut state = State::new();
        let mut graphics = GraphicsState::new(&state, EditorConfig::default()).unwrap();
        let root = state.root_id();
        let id = state
            .execute(Command::CreateNode {
                graph: root,
                name: "A".into(),
            })
            .unwrap()
            .created()
            .unwrap();
        while let Some(event) = state.poll_event() {
            graphics.handle(&state, &event).unwrap();
        }
        let node = state.node(id).unwrap().clone();
        (state, graphics, node)
    }

    #[test]
    fn instance_position_round_trips() {
        let (_state, mut graphics, node) = session();
        graphics
            .registry_mut()
            .set_position(node.id, Point::new(12.5, -3.0))
            .unwrap();

        let data = graphics.serialize_node(&node, SerializationType::Instance);
        assert_eq!(
            Value::Object(data.clone()),
            json!({ "editor": { "position": { "x": 12.5, "y": -3.0 } } })
        );

        graphics
            .registry_mut()
            .set_position(node.id, Point::ORIGIN)
            .unwrap();
        graphics.deserialize_node(&data, &node);
        assert_eq!(
            graphics.registry().node(node.id).unwrap().position,
            Point::new(12.5, -3.0)
        );
    }

    #[test]
    fn definitions_carry_no_position() {
        let (_state, graphics, node) = session();
        assert!(
            graphics
                .serialize_node(&node, SerializationType::Definition)
                .is_empty()
        );
    }

    #[test]
    fn malformed_editor_data_is_ignored() {
        let (_state, mut graphics, node) = session();
        let data = json!({ "editor": { "position": "left" } });
        let Value::Object(data) = data else {
            unreachable!()
        };
        graphics.deserialize_node(&data, &node);
        assert_eq!(graphics.registry().node(node.id).unwrap().position, Point::ORIGIN);
    }
}
