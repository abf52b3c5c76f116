//! ID newtypes for model objects.
//!
//! Module IDs index the design; port, interface and generic IDs index the
//! arenas of one module and only make sense together with their module ID
//! (see [`PortRef`](crate::PortRef), [`GenericRef`](crate::GenericRef)).

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// A module instance in a [`Design`](crate::Design).
    ModuleId
);

define_id!(
    /// A port of one module.
    PortId
);

define_id!(
    /// An interface of one module.
    InterfaceId
);

define_id!(
    /// A generic of one module.
    GenericId
);

define_id!(
    /// A glue signal in a [`Design`](crate::Design).
    GlueId
);
