//! Module library errors and the diagnostics discovery emits.

use asterics_common::Span;
use asterics_diagnostics::{Category, Diagnostic, DiagnosticCode};
use asterics_model::AssignError;
use asterics_vhdl::ReadError;

/// Module name not registered.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// Declared dependency not registered.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);
/// Dependencies form a cycle.
pub const E303: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);
/// Module registered twice in one repository.
pub const E304: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);
/// Instance name already used in the chain.
pub const E305: DiagnosticCode = DiagnosticCode::new(Category::Error, 305);
/// Interface missing mandatory ports, dissolved into lone ports.
pub const W301: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);
/// Port width references a name the entity does not declare.
pub const W302: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);
/// Module registered.
pub const N301: DiagnosticCode = DiagnosticCode::new(Category::Note, 301);

/// A module name cannot be resolved, or a prototype cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// No module of that name.
    #[error("unknown module '{name}'{}", repository.as_ref().map(|r| format!(" in repository '{r}'")).unwrap_or_default())]
    Unknown {
        /// Requested name.
        name: String,
        /// Repository searched, `None` for all.
        repository: Option<String>,
    },
    /// A declared dependency is not registered.
    #[error("module '{module}' depends on '{dependency}', which is not registered")]
    MissingDependency {
        /// Module declaring the dependency.
        module: String,
        /// Missing name.
        dependency: String,
    },
    /// Dependencies loop.
    #[error("dependency cycle between modules: {}", modules.join(", "))]
    DependencyCycle {
        /// Members of the cycle.
        modules: Vec<String>,
    },
    /// Name registered twice in one repository.
    #[error("module '{name}' is already registered in repository '{repository}'")]
    Duplicate {
        /// Module name.
        name: String,
        /// Repository.
        repository: String,
    },
    /// Instance name taken.
    #[error("module instance '{name}' already exists")]
    DuplicateInstance {
        /// Instance name.
        name: String,
    },
    /// Declaration file could not be read.
    #[error("discovery of module '{module}' failed: {source}")]
    Discover {
        /// Module being registered.
        module: String,
        /// Reader failure.
        #[source]
        source: ReadError,
    },
    /// Discovered objects could not be attached.
    #[error(transparent)]
    Assign(#[from] AssignError),
}

impl ModuleError {
    /// Missing modules and dependency cycles invalidate all later wiring.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ModuleError::Unknown { .. }
                | ModuleError::MissingDependency { .. }
                | ModuleError::DependencyCycle { .. }
        )
    }

    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ModuleError::Unknown { name, .. } => {
                Diagnostic::error(E301, self.to_string(), Span::DUMMY)
                    .with_subject(name.clone())
                    .with_help("register the module with the library before adding it")
            }
            ModuleError::MissingDependency { module, .. } => {
                Diagnostic::error(E302, self.to_string(), Span::DUMMY).with_subject(module.clone())
            }
            ModuleError::DependencyCycle { modules } => {
                let diag = Diagnostic::error(E303, self.to_string(), Span::DUMMY);
                match modules.first() {
                    Some(first) => diag.with_subject(first.clone()),
                    None => diag,
                }
            }
            ModuleError::Duplicate { name, .. } => {
                Diagnostic::error(E304, self.to_string(), Span::DUMMY).with_subject(name.clone())
            }
            ModuleError::DuplicateInstance { name } => {
                Diagnostic::error(E305, self.to_string(), Span::DUMMY).with_subject(name.clone())
            }
            ModuleError::Discover { module, source } => {
                source.to_diagnostic().with_note(format!("while discovering module '{module}'"))
            }
            ModuleError::Assign(e) => e.to_diagnostic(),
        }
    }
}

/// Warning for an interface that lacks mandatory ports.
pub fn warning_incomplete_interface(module: &str, type_name: &str, missing: &[&str]) -> Diagnostic {
    Diagnostic::warning(
        W301,
        format!("incomplete '{type_name}' interface treated as lone ports"),
        Span::DUMMY,
    )
    .with_subject(module.to_string())
    .with_note(format!("missing mandatory ports: {}", missing.join(", ")))
}

/// Warning for a width that references an undeclared name.
pub fn warning_undeclared_width_generic(port: &str, name: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W302,
        format!("width references '{name}', which the entity does not declare"),
        span,
    )
    .with_subject(port.to_string())
}

/// Note for a registered module.
pub fn note_registered(name: &str, repository: &str) -> Diagnostic {
    Diagnostic::note(N301, format!("registered module '{name}'"), Span::DUMMY)
        .with_subject(format!("{repository}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classes() {
        let missing = ModuleError::MissingDependency {
            module: "as_invert".into(),
            dependency: "as_regmgr".into(),
        };
        assert!(missing.is_fatal());
        assert_eq!(
            missing.to_string(),
            "module 'as_invert' depends on 'as_regmgr', which is not registered"
        );
        let dup = ModuleError::DuplicateInstance { name: "a".into() };
        assert!(!dup.is_fatal());
        assert_eq!(dup.to_diagnostic().code, E305);
    }

    #[test]
    fn unknown_names_repository() {
        let err = ModuleError::Unknown {
            name: "as_gauss".into(),
            repository: Some("user".into()),
        };
        assert_eq!(err.to_string(), "unknown module 'as_gauss' in repository 'user'");
        let err = ModuleError::Unknown {
            name: "as_gauss".into(),
            repository: None,
        };
        assert_eq!(err.to_string(), "unknown module 'as_gauss'");
    }
}
