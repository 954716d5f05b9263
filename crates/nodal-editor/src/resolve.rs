//! "Like" references: an identifier, a domain handle, or a graphics object,
//! accepted interchangeably wherever the editor looks something up.
//!
//! All normalization goes through `identifier` (kind check) and `resolve`
//! (registry lookup). A graphics object of the requested kind resolves to
//! itself; any other kind is a `SyncError::TypeMismatch` naming the accepted
//! union.

use crate::error::SyncError;
use crate::items::{BoundaryNode, GraphicsConnection, GraphicsNode, GraphicsPort, VirtualPort};
use crate::registry::Catalog;
use crate::scope::GraphicsGraph;
use nodal_core::{Connection, EntityKind, Graph, Identifier, Node, Port, State};

#[derive(Debug, Clone, Copy)]
pub enum DomainRef<'a> {
    Graph(&'a Graph),
    Node(&'a Node),
    Port(&'a Port),
    Connection(&'a Connection),
}

impl DomainRef<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            DomainRef::Graph(_) => EntityKind::Graph,
            DomainRef::Node(_) => EntityKind::Node,
            DomainRef::Port(_) => EntityKind::Port,
            DomainRef::Connection(_) => EntityKind::Connection,
        }
    }

    pub fn id(&self) -> Identifier {
        match self {
            DomainRef::Graph(g) => g.id,
            DomainRef::Node(n) => n.id,
            DomainRef::Port(p) => p.id,
            DomainRef::Connection(c) => c.id,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            DomainRef::Graph(_) => "Graph",
            DomainRef::Node(_) => "Node",
            DomainRef::Port(_) => "Port",
            DomainRef::Connection(_) => "Connection",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GraphicsRef<'a> {
    Graph(&'a GraphicsGraph),
    Node(&'a GraphicsNode),
    Port(&'a GraphicsPort),
    Connection(&'a GraphicsConnection),
    Virtual(&'a VirtualPort),
    Boundary(&'a BoundaryNode),
}

impl GraphicsRef<'_> {
    /// Kind and identifier of the mirrored domain entity. Boundary items
    /// mirror nothing.
    pub fn mirrored(&self) -> Option<(EntityKind, Identifier)> {
        match self {
            GraphicsRef::Graph(g) => Some((EntityKind::Graph, g.id())),
            GraphicsRef::Node(n) => Some((EntityKind::Node, n.id)),
            GraphicsRef::Port(p) => Some((EntityKind::Port, p.id)),
            GraphicsRef::Connection(c) => Some((EntityKind::Connection, c.id)),
            GraphicsRef::Virtual(_) | GraphicsRef::Boundary(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            GraphicsRef::Graph(_) => "GraphicsGraph",
            GraphicsRef::Node(_) => "GraphicsNode",
            GraphicsRef::Port(_) => "GraphicsPort",
            GraphicsRef::Connection(_) => "GraphicsConnection",
            GraphicsRef::Virtual(_) => "VirtualPort",
            GraphicsRef::Boundary(_) => "BoundaryNode",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Like<'a> {
    Id(Identifier),
    Domain(DomainRef<'a>),
    Graphics(GraphicsRef<'a>),
}

impl Like<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            Like::Id(_) => "Identifier",
            Like::Domain(d) => d.type_name(),
            Like::Graphics(g) => g.type_name(),
        }
    }
}

impl From<Identifier> for Like<'_> {
    fn from(id: Identifier) -> Self {
        Like::Id(id)
    }
}

macro_rules! like_from {
    ($($ty:ty => $outer:ident($inner:path)),* $(,)?) => {
        $(
            impl<'a> From<&'a $ty> for Like<'a> {
                fn from(value: &'a $ty) -> Self {
                    Like::$outer($inner(value))
                }
            }
        )*
    };
}

like_from! {
    Graph => Domain(DomainRef::Graph),
    Node => Domain(DomainRef::Node),
    Port => Domain(DomainRef::Port),
    Connection => Domain(DomainRef::Connection),
    GraphicsGraph => Graphics(GraphicsRef::Graph),
    GraphicsNode => Graphics(GraphicsRef::Node),
    GraphicsPort => Graphics(GraphicsRef::Port),
    GraphicsConnection => Graphics(GraphicsRef::Connection),
    VirtualPort => Graphics(GraphicsRef::Virtual),
    BoundaryNode => Graphics(GraphicsRef::Boundary),
}

// ─── Resolution ──────────────────────────────────────────────────────────

/// A graphics type that mirrors one kind of domain entity.
pub trait Mirror: Sized {
    const KIND: EntityKind;
    /// The accepted union, for mismatch errors.
    const EXPECTED: &'static str;

    fn from_graphics(graphics: GraphicsRef<'_>) -> Option<&'_ Self>;
}

impl Mirror for GraphicsGraph {
    const KIND: EntityKind = EntityKind::Graph;
    const EXPECTED: &'static str = "GraphLike (Identifier | Graph | GraphicsGraph)";

    fn from_graphics(graphics: GraphicsRef<'_>) -> Option<&'_ Self> {
        match graphics {
            GraphicsRef::Graph(g) => Some(g),
            _ => None,
        }
    }
}

impl Mirror for GraphicsNode {
    const KIND: EntityKind = EntityKind::Node;
    const EXPECTED: &'static str = "NodeLike (Identifier | Node | GraphicsNode)";

    fn from_graphics(graphics: GraphicsRef<'_>) -> Option<&'_ Self> {
        match graphics {
            GraphicsRef::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl Mirror for GraphicsPort {
    const KIND: EntityKind = EntityKind::Port;
    const EXPECTED: &'static str = "PortLike (Identifier | Port | GraphicsPort)";

    fn from_graphics(graphics: GraphicsRef<'_>) -> Option<&'_ Self> {
        match graphics {
            GraphicsRef::Port(p) => Some(p),
            _ => None,
        }
    }
}

impl Mirror for GraphicsConnection {
    const KIND: EntityKind = EntityKind::Connection;
    const EXPECTED: &'static str =
        "ConnectionLike (Identifier | Connection | GraphicsConnection)";

    fn from_graphics(graphics: GraphicsRef<'_>) -> Option<&'_ Self> {
        match graphics {
            GraphicsRef::Connection(c) => Some(c),
            _ => None,
        }
    }
}

/// The identifier a reference stands for, provided it is of `G`'s kind.
pub fn identifier<G: Mirror>(like: Like<'_>) -> Result<Identifier, SyncError> {
    match like {
        Like::Id(id) => Ok(id),
        Like::Domain(d) if d.kind() == G::KIND => Ok(d.id()),
        Like::Graphics(g) => match g.mirrored() {
            Some((kind, id)) if kind == G::KIND => Ok(id),
            _ => Err(mismatch::<G>(like)),
        },
        Like::Domain(_) => Err(mismatch::<G>(like)),
    }
}

/// Resolve a reference to the registered graphics object.
pub(crate) fn resolve<'a, G: Mirror>(
    catalog: &'a Catalog<G>,
    like: Like<'a>,
) -> Result<&'a G, SyncError> {
    if let Like::Graphics(g) = like
        && let Some(item) = G::from_graphics(g)
    {
        return Ok(item);
    }
    catalog.get(identifier::<G>(like)?)
}

fn mismatch<G: Mirror>(like: Like<'_>) -> SyncError {
    SyncError::TypeMismatch {
        expected: G::EXPECTED,
        found: like.type_name(),
    }
}

// ─── Domain direction ────────────────────────────────────────────────────

pub fn domain_graph<'s>(state: &'s State, like: Like<'_>) -> Result<&'s Graph, SyncError> {
    Ok(state.graph(identifier::<GraphicsGraph>(like)?)?)
}

pub fn domain_node<'s>(state: &'s State, like: Like<'_>) -> Result<&'s Node, SyncError> {
    Ok(state.node(identifier::<GraphicsNode>(like)?)?)
}

pub fn domain_port<'s>(state: &'s State, like: Like<'_>) -> Result<&'s Port, SyncError> {
    Ok(state.port(identifier::<GraphicsPort>(like)?)?)
}

pub fn domain_connection<'s>(
    state: &'s State,
    like: Like<'_>,
) -> Result<&'s Connection, SyncError> {
    Ok(state.connection(identifier::<GraphicsConnection>(like)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodal_core::{PortDirection, PortType};

    fn port() -> Port {
        Port {
            id: Identifier::new(),
            name: "in".into(),
            direction: PortDirection::Input,
            port_type: PortType::intern("int"),
            node: Identifier::new(),
            parent_port: None,
            child_ports: Vec::new(),
        }
    }

    #[test]
    fn identifier_accepts_all_three_forms() {
        let domain = port();
        let graphics = GraphicsPort::from_domain(&domain);
        let id = domain.id;
        assert_eq!(identifier::<GraphicsPort>(id.into()).unwrap(), id);
        assert_eq!(identifier::<GraphicsPort>((&domain).into()).unwrap(), id);
        assert_eq!(identifier::<GraphicsPort>((&graphics).into()).unwrap(), id);
    }

    #[test]
    fn wrong_kind_names_the_expected_union() {
        let domain = port();
        let err = identifier::<GraphicsNode>((&domain).into()).unwrap_err();
        match err {
            SyncError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "NodeLike (Identifier | Node | GraphicsNode)");
                assert_eq!(found, "Port");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn virtual_port_is_not_port_like() {
        let virtual_port = VirtualPort::mirroring(&port());
        let err = identifier::<GraphicsPort>((&virtual_port).into()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::TypeMismatch {
                found: "VirtualPort",
                ..
            }
        ));
    }

    #[test]
    fn domain_lookup_of_unknown_id_is_not_found() {
        let state = State::new();
        let err = domain_node(&state, Identifier::new().into()).unwrap_err();
        assert!(matches!(err, SyncError::Model(_)));
        let root = domain_graph(&state, state.root_graph().into()).unwrap();
        assert_eq!(root.id, state.root_id());
    }
}
