//! Parsing and validation of `asterics.toml` project files.
//!
//! The project file names the module repositories to load and the policy
//! switches of the processing chain (fatal-error handling, automatic
//! dependency instantiation, generic auto-propagation).

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
