pub mod commands;
pub mod document;
pub mod error;
pub mod event;
pub mod id;
pub mod model;

pub use commands::{Command, Outcome};
pub use document::{
    Deserializer, Imported, Library, NoHooks, NodeDocument, SerializationType, Serializer,
};
pub use error::ModelError;
pub use event::{Bus, Event, EventKind, Removed, Source, SubscriptionId, Topic};
pub use id::{Identifier, PortType};
pub use model::*;
