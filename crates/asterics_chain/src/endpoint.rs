//! Things a connection can start or end at.

use asterics_model::{InterfaceId, ModuleId, PortRef};

/// One side of [`ProcessingChain::connect`](crate::ProcessingChain::connect).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Every unconnected interface and lone port of a module.
    Module(ModuleId),
    /// One interface.
    Interface(ModuleId, InterfaceId),
    /// One port.
    Port(PortRef),
    /// A layer: its last module as a source, its first as a sink.
    Layer(String),
}

impl From<ModuleId> for Endpoint {
    fn from(id: ModuleId) -> Self {
        Endpoint::Module(id)
    }
}

impl From<PortRef> for Endpoint {
    fn from(port: PortRef) -> Self {
        Endpoint::Port(port)
    }
}

/// An ordered group of modules, e.g. the stages of one pipeline layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Members in insertion order.
    pub modules: Vec<ModuleId>,
}

/// A successful connect: the endpoints as given and the port pairs wired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    /// Source endpoint.
    pub source: Endpoint,
    /// Sink endpoint.
    pub sink: Endpoint,
    /// `(driver, sink)` port pairs.
    pub wires: Vec<(PortRef, PortRef)>,
}
