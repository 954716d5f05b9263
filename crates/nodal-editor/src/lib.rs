pub mod config;
pub mod error;
pub mod graphics;
pub mod interaction;
pub mod items;
pub mod navigator;
pub mod persistence;
pub mod registry;
pub mod resolve;
pub mod router;
pub mod scope;
pub mod session;

pub use config::EditorConfig;
pub use error::SyncError;
pub use graphics::GraphicsState;
pub use interaction::{Gesture, Selection};
pub use items::{
    BoundaryNode, BoundarySide, Clickable, Connectable, Endpoint, GraphicsConnection,
    GraphicsNode, GraphicsPort, Hit, Navigation, Socket, VirtualPort,
};
pub use navigator::{Navigator, Viewport};
pub use registry::{Catalog, Registry};
pub use resolve::{DomainRef, GraphicsRef, Like};
pub use router::{Router, Subscriber};
pub use scope::{Attached, Boundary, GraphicsGraph};
pub use session::Editor;
