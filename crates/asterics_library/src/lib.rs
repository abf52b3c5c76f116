//! Module library: prototypes by name and repository, interface templates
//! and discovery of a module's interfaces from its entity declaration.
//!
//! Registration code hands the library a factory per module; the factory
//! receives a [`Registration`], typically calls
//! [`Registration::discover_module`] on the module's top-level file,
//! declares dependencies and attaches behavior, and returns the prototype.

#![warn(missing_docs)]

pub mod discover;
pub mod error;
pub mod library;
pub mod session;
pub mod standard;
pub mod templates;

pub use discover::discover_module;
pub use error::ModuleError;
pub use library::{ModuleLibrary, Registration};
pub use session::Session;
pub use standard::{standard_port, StandardPort};
pub use templates::{as_stream, builtin_templates, slv_reg_interface, AS_STREAM, SLV_REG_INTERFACE};
