//! Data model of a hardware module composition.
//!
//! [`Module`]s own their [`Port`]s, [`Interface`]s and [`Generic`]s in
//! ID-indexed arenas; a [`Design`] holds module instances and the
//! [`GlueSignal`]s that join their ports. Generic values may link to other
//! generics; links are checked for cycles when they are made. The
//! [`expr`] module evaluates width and value expressions against the
//! values a design currently provides.

#![warn(missing_docs)]

pub mod arena;
pub mod behavior;
pub mod design;
pub mod error;
pub mod expr;
pub mod generic;
pub mod ids;
pub mod interface;
pub mod module;
pub mod port;
pub mod rules;
pub mod value;
pub mod width;

pub use arena::{Arena, ArenaId};
pub use behavior::{AutoInstContext, ModuleBehavior};
pub use design::{Design, GlueSignal};
pub use error::{AssignError, ObjectKind};
pub use expr::{evaluate, EvalError, Expr, GenericEnv, Resolution};
pub use generic::{Generic, GenericRef, GenericValue, ValueCheck};
pub use ids::{GenericId, GlueId, InterfaceId, ModuleId, PortId};
pub use interface::{Interface, InterfaceTemplate, TemplatePort};
pub use module::{Constant, Module, ModuleType};
pub use port::{Direction, Port, PortKind, PortRef};
pub use rules::{default_rules, Action, Condition, Rule};
pub use value::ConstValue;
pub use width::{Bound, DataWidth, Range, RangeDir, WidthCompat};
