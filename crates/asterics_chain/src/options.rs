//! Orchestrator switches, usually taken from the `[build]` config table.

use asterics_config::BuildConfig;

/// How a [`ProcessingChain`](crate::ProcessingChain) reacts to errors and
/// what [`build`](crate::ProcessingChain::build) runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainOptions {
    /// Refuse further operations after the first fatal error.
    pub abort_on_fatal: bool,
    /// Run [`auto_instantiate`](crate::ProcessingChain::auto_instantiate)
    /// during the build.
    pub auto_instantiate: bool,
    /// Link single-generic widths across connections.
    pub auto_propagate_generics: bool,
    /// Unresolved widths fail the build instead of warning.
    pub strict_widths: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        ChainOptions::from(&BuildConfig::default())
    }
}

impl From<&BuildConfig> for ChainOptions {
    fn from(build: &BuildConfig) -> Self {
        ChainOptions {
            abort_on_fatal: build.abort_on_fatal,
            auto_instantiate: build.auto_instantiate,
            auto_propagate_generics: build.auto_propagate_generics,
            strict_widths: build.strict_widths,
        }
    }
}
