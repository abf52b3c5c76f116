//! Configuration types deserialized from `asterics.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The whole project file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Module repositories keyed by repository name.
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryConfig>,
    /// Processing chain policy.
    #[serde(default)]
    pub build: BuildConfig,
}

/// `[project]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectMeta {
    /// System name, used for the top-level design.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// One `[repositories.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Directory holding one sub-directory per module.
    pub path: PathBuf,
}

/// `[build]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Stop accepting chain operations after the first fatal error
    /// (missing module, dependency cycle, generic link cycle).
    pub abort_on_fatal: bool,
    /// Run dependency auto-instantiation as part of the build.
    pub auto_instantiate: bool,
    /// Link mismatching single-generic widths across a connection.
    pub auto_propagate_generics: bool,
    /// Treat widths that stay unresolved after finalization as errors.
    pub strict_widths: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            abort_on_fatal: true,
            auto_instantiate: true,
            auto_propagate_generics: true,
            strict_widths: true,
        }
    }
}
