//! Registry of module prototypes.

use crate::discover::discover_module;
use crate::error::{note_registered, ModuleError};
use crate::session::Session;
use crate::templates::builtin_templates;
use asterics_model::{InterfaceTemplate, Module, ModuleBehavior, ModuleType};
use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Modules registered under one repository name.
#[derive(Debug, Default)]
struct Repository {
    name: String,
    modules: Vec<Module>,
    by_name: HashMap<String, usize>,
}

/// Named repositories of module prototypes plus the global interface
/// templates.
///
/// [`get`](Self::get) always hands out a copy, so instances never share
/// state with the prototype or with each other.
pub struct ModuleLibrary<'s> {
    session: &'s Session,
    templates: Vec<InterfaceTemplate>,
    repositories: Vec<Repository>,
}

impl<'s> ModuleLibrary<'s> {
    /// An empty library with the built-in interface templates.
    pub fn new(session: &'s Session) -> Self {
        ModuleLibrary {
            session,
            templates: builtin_templates(),
            repositories: Vec::new(),
        }
    }

    /// The session the library reports into.
    pub fn session(&self) -> &'s Session {
        self.session
    }

    /// Global interface templates.
    pub fn templates(&self) -> &[InterfaceTemplate] {
        &self.templates
    }

    /// Adds a global interface template for later registrations.
    pub fn add_template(&mut self, template: InterfaceTemplate) {
        self.templates.push(template);
    }

    /// Registers a module.
    ///
    /// `factory` receives a [`Registration`] for `module_dir` and returns
    /// the finished prototype. The repository is created on first use.
    pub fn register<F>(
        &mut self,
        name: &str,
        repository: &str,
        module_dir: impl AsRef<Path>,
        factory: F,
    ) -> Result<(), ModuleError>
    where
        F: FnOnce(Registration<'_>) -> Result<Module, ModuleError>,
    {
        let name = name.to_ascii_lowercase();
        let repository = repository.to_ascii_lowercase();
        if self
            .repository(&repository)
            .is_some_and(|r| r.by_name.contains_key(&name))
        {
            return Err(ModuleError::Duplicate { name, repository });
        }

        let interner = &self.session.interner;
        let ident = interner.intern_lower(&name);
        let mut module = Module::new(ident, ident);
        module.repository = repository.clone();
        let registration = Registration {
            session: self.session,
            module_dir: module_dir.as_ref().to_path_buf(),
            templates: &self.templates,
            module,
        };
        let mut prototype = factory(registration)?;
        prototype.name = ident;
        prototype.repository = repository.clone();

        let index = match self.repositories.iter().position(|r| r.name == repository) {
            Some(index) => index,
            None => {
                self.repositories.push(Repository {
                    name: repository.clone(),
                    ..Repository::default()
                });
                self.repositories.len() - 1
            }
        };
        let repo = &mut self.repositories[index];
        repo.by_name.insert(name.clone(), repo.modules.len());
        repo.modules.push(prototype);
        self.session.sink.emit(note_registered(&name, &repository));
        Ok(())
    }

    fn repository(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Returns the prototype without copying it.
    pub fn prototype(&self, name: &str, repository: Option<&str>) -> Result<&Module, ModuleError> {
        let name = name.to_ascii_lowercase();
        let found = match repository {
            Some(repo) => self
                .repository(&repo.to_ascii_lowercase())
                .and_then(|r| r.by_name.get(&name).map(|i| &r.modules[*i])),
            None => self
                .repositories
                .iter()
                .find_map(|r| r.by_name.get(&name).map(|i| &r.modules[*i])),
        };
        found.ok_or_else(|| ModuleError::Unknown {
            name,
            repository: repository.map(str::to_ascii_lowercase),
        })
    }

    /// A fresh copy of the named prototype.
    ///
    /// Without a repository, repositories are searched in the order they
    /// were created.
    pub fn get(&self, name: &str, repository: Option<&str>) -> Result<Module, ModuleError> {
        self.prototype(name, repository).cloned()
    }

    /// Returns `true` if some repository has the module.
    pub fn contains(&self, name: &str) -> bool {
        self.prototype(name, None).is_ok()
    }

    /// Repository names in creation order.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.repositories.iter().map(|r| r.name.as_str())
    }

    /// Module names of a repository in registration order.
    pub fn module_names(&self, repository: &str) -> Vec<&str> {
        self.repository(&repository.to_ascii_lowercase())
            .map(|r| {
                r.modules
                    .iter()
                    .map(|m| self.session.interner.resolve(m.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Transitive dependencies of `module`, dependencies before dependents.
    ///
    /// The module itself is not part of the result.
    pub fn resolve_dependencies(&self, module: &Module) -> Result<Vec<String>, ModuleError> {
        let interner = &self.session.interner;
        let root = interner.resolve(module.entity_name).to_string();
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let root_node = graph.add_node(root.clone());
        nodes.insert(root.clone(), root_node);

        let mut worklist: Vec<(String, Vec<String>)> = vec![(root, module.dependencies.clone())];
        while let Some((dependent, dependencies)) = worklist.pop() {
            let dependent_node = nodes[&dependent];
            for dependency in dependencies {
                let dependency = dependency.to_ascii_lowercase();
                let node = match nodes.get(&dependency) {
                    Some(node) => *node,
                    None => {
                        let prototype = self.prototype(&dependency, None).map_err(|_| {
                            ModuleError::MissingDependency {
                                module: dependent.clone(),
                                dependency: dependency.clone(),
                            }
                        })?;
                        let node = graph.add_node(dependency.clone());
                        nodes.insert(dependency.clone(), node);
                        worklist.push((dependency.clone(), prototype.dependencies.clone()));
                        node
                    }
                };
                graph.update_edge(node, dependent_node, ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter(|n| *n != root_node)
                .map(|n| graph[n].clone())
                .collect()),
            Err(cycle) => {
                let members = kosaraju_scc(&graph)
                    .into_iter()
                    .find(|scc| scc.contains(&cycle.node_id()))
                    .unwrap_or_else(|| vec![cycle.node_id()]);
                let mut modules: Vec<String> = members.into_iter().map(|n| graph[n].clone()).collect();
                modules.sort();
                Err(ModuleError::DependencyCycle { modules })
            }
        }
    }
}

/// Handed to a registration factory: the module being built and the tools
/// to populate it.
pub struct Registration<'a> {
    session: &'a Session,
    module_dir: PathBuf,
    templates: &'a [InterfaceTemplate],
    module: Module,
}

impl<'a> Registration<'a> {
    /// Directory the module sources live in.
    pub fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    /// The session.
    pub fn session(&self) -> &'a Session {
        self.session
    }

    /// The module built so far.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Mutable access for anything the helpers below do not cover.
    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    /// Reads a declaration file, relative to the module directory unless
    /// absolute, into the module.
    pub fn discover_module(&mut self, file: impl AsRef<Path>) -> Result<(), ModuleError> {
        let path = self.module_dir.join(file);
        discover_module(&mut self.module, &path, self.session, self.templates)
    }

    /// Adds a template used only by this module. Must precede discovery.
    pub fn add_interface_template(&mut self, template: InterfaceTemplate) {
        self.module.templates.push(template);
    }

    /// Declares a module needed at build time.
    pub fn add_dependency(&mut self, entity: &str) {
        let entity = entity.to_ascii_lowercase();
        if !self.module.dependencies.contains(&entity) {
            self.module.dependencies.push(entity);
        }
    }

    /// Attaches custom behavior.
    pub fn set_behavior(&mut self, behavior: impl ModuleBehavior + 'static) {
        self.module.behavior = Some(Arc::new(behavior));
    }

    /// Sets the hardware/software classification.
    pub fn set_module_type(&mut self, module_type: ModuleType) {
        self.module.module_type = module_type;
    }

    /// Sets the category.
    pub fn set_category(&mut self, category: &str) {
        self.module.category = category.to_string();
    }

    /// Finishes the registration.
    pub fn finish(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCER: &str = "entity as_source is\n  port (\n    clk : in std_logic;\n    \
        strobe_out : out std_logic;\n    data_out : out std_logic_vector(7 downto 0)\n  );\nend as_source;\n";

    fn library_with<'s>(session: &'s Session, deps: &[(&str, Vec<&str>)]) -> ModuleLibrary<'s> {
        let mut library = ModuleLibrary::new(session);
        for (name, dependencies) in deps {
            library
                .register(name, "default", "", |mut reg| {
                    for d in dependencies {
                        reg.add_dependency(d);
                    }
                    Ok(reg.finish())
                })
                .unwrap();
        }
        library
    }

    #[test]
    fn register_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("as_source.vhd"), PRODUCER).unwrap();
        let session = Session::new();
        let mut library = ModuleLibrary::new(&session);
        library
            .register("AS_SOURCE", "Default", dir.path(), |mut reg| {
                reg.discover_module("as_source.vhd")?;
                reg.set_category("source");
                Ok(reg.finish())
            })
            .unwrap();
        let module = library.get("as_source", Some("default")).unwrap();
        assert_eq!(module.ports.len(), 3);
        assert_eq!(module.category, "source");
        assert_eq!(module.repository, "default");
        assert_eq!(library.module_names("default"), vec!["as_source"]);
    }

    #[test]
    fn get_returns_independent_copies() {
        let session = Session::new();
        let library = library_with(&session, &[("as_invert", vec![])]);
        let mut a = library.get("as_invert", None).unwrap();
        a.category = "changed".into();
        let b = library.get("as_invert", None).unwrap();
        assert_eq!(b.category, "");
    }

    #[test]
    fn duplicate_and_unknown() {
        let session = Session::new();
        let mut library = library_with(&session, &[("as_invert", vec![])]);
        let err = library
            .register("as_invert", "default", "", |reg| Ok(reg.finish()))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Duplicate { .. }));
        library
            .register("as_invert", "user", "", |reg| Ok(reg.finish()))
            .unwrap();
        assert_eq!(library.repositories().collect::<Vec<_>>(), vec!["default", "user"]);
        assert!(matches!(
            library.get("as_gauss", None),
            Err(ModuleError::Unknown { .. })
        ));
        assert!(matches!(
            library.get("as_invert", Some("nowhere")),
            Err(ModuleError::Unknown { .. })
        ));
    }

    #[test]
    fn factory_error_registers_nothing() {
        let session = Session::new();
        let mut library = ModuleLibrary::new(&session);
        let err = library
            .register("broken", "default", "/nonexistent", |mut reg| {
                reg.discover_module("broken.vhd")?;
                Ok(reg.finish())
            })
            .unwrap_err();
        assert!(matches!(err, ModuleError::Discover { .. }));
        assert!(!library.contains("broken"));
    }

    #[test]
    fn dependencies_in_topological_order() {
        let session = Session::new();
        let library = library_with(
            &session,
            &[
                ("as_regmgr", vec!["as_helpers"]),
                ("as_helpers", vec![]),
                ("as_invert", vec!["as_regmgr", "as_helpers"]),
            ],
        );
        let module = library.get("as_invert", None).unwrap();
        let order = library.resolve_dependencies(&module).unwrap();
        assert_eq!(order, vec!["as_helpers", "as_regmgr"]);
    }

    #[test]
    fn missing_dependency_is_named() {
        let session = Session::new();
        let library = library_with(&session, &[("as_invert", vec!["as_regmgr"])]);
        let module = library.get("as_invert", None).unwrap();
        match library.resolve_dependencies(&module) {
            Err(ModuleError::MissingDependency { module, dependency }) => {
                assert_eq!(module, "as_invert");
                assert_eq!(dependency, "as_regmgr");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn dependency_cycle_detected() {
        let session = Session::new();
        let library = library_with(&session, &[("a", vec!["b"]), ("b", vec!["c"]), ("c", vec!["b"])]);
        let module = library.get("a", None).unwrap();
        match library.resolve_dependencies(&module) {
            Err(ModuleError::DependencyCycle { modules }) => assert_eq!(modules, vec!["b", "c"]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
