//! Connection engine and processing-chain orchestration.
//!
//! A [`ProcessingChain`] borrows a module library and a session, creates
//! module instances from library prototypes and connects them. Connecting
//! two endpoints matches compatible interfaces (or lone ports), checks
//! direction, data type and width, and joins the ports through glue
//! signals. Every operation either succeeds completely or leaves the design
//! as it was.
//!
//! [`ProcessingChain::build`] instantiates declared dependencies, resolves
//! all widths, applies the rules of ports left open and, if no error was
//! recorded, returns the finished [`SystemGraph`].

#![warn(missing_docs)]

pub mod autoinst;
pub mod chain;
pub mod connect;
pub mod endpoint;
pub mod error;
pub mod finalize;
pub mod graph;
pub mod options;

#[cfg(test)]
mod test_support;

pub use chain::ProcessingChain;
pub use endpoint::{Connection, Endpoint, Layer};
pub use error::{BuildError, BuildFailure, ConnectionError};
pub use graph::SystemGraph;
pub use options::ChainOptions;
