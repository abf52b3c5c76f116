//! Automatic instantiation of declared dependencies.

use std::collections::VecDeque;

use asterics_library::ModuleError;
use asterics_model::{AutoInstContext, ModuleId};

use crate::chain::ProcessingChain;
use crate::connect::Side;
use crate::endpoint::{Connection, Endpoint};
use crate::error::{note_auto_instantiated, BuildError};

impl<'a> ProcessingChain<'a> {
    /// Instantiates every dependency a module has no instance of yet, plus
    /// the top-level modules requested by still unconnected interfaces.
    /// Each instantiating module gets its own instance, named
    /// `{module}_{entity}`.
    ///
    /// Each module's dependency graph is validated before anything is
    /// created for it. Every new module runs its behavior hook once and is
    /// then wired to the module that needed it, in both directions. A
    /// failing branch is rolled back and the remaining ones still run,
    /// unless the failure stopped the chain. Returns the new modules.
    pub fn auto_instantiate(&mut self) -> Result<Vec<ModuleId>, BuildError> {
        self.guard()?;
        let library = self.library;
        let session = self.session;
        let interner = &session.interner;
        let mut created = Vec::new();
        let mut first_error = None;
        let mut queue: VecDeque<ModuleId> = self.design.modules().map(|(id, _)| id).collect();

        while let Some(id) = queue.pop_front() {
            let module = self.design.module(id);
            let wanted = match library.resolve_dependencies(module) {
                Ok(_) => {
                    let mut wanted: Vec<String> = module
                        .dependencies
                        .iter()
                        .map(|d| d.to_ascii_lowercase())
                        .collect();
                    wanted.extend(
                        module
                            .interfaces
                            .values()
                            .filter(|i| !i.connected)
                            .filter_map(|i| i.instantiate_in_top.as_ref())
                            .map(|e| e.to_ascii_lowercase()),
                    );
                    wanted
                }
                Err(e) => {
                    let e = self.fail(e.into());
                    first_error.get_or_insert(e);
                    if self.is_aborted() {
                        break;
                    }
                    continue;
                }
            };

            let label = self.design.module(id).label(interner).to_string();
            for entity in wanted {
                // One instance per instantiating module.
                let served = self
                    .design
                    .find_module(&format!("{label}_{entity}"), interner)
                    .is_some_and(|m| interner.resolve(self.design.module(m).entity_name) == entity);
                if served {
                    continue;
                }
                let snapshot = self.snapshot();
                match self.instantiate_for(id, &entity) {
                    Ok(new) => {
                        self.flush_pending();
                        created.push(new);
                        queue.push_back(new);
                    }
                    Err(e) => {
                        self.restore(snapshot);
                        let e = self.fail(e);
                        first_error.get_or_insert(e);
                        if self.is_aborted() {
                            break;
                        }
                    }
                }
            }
            if self.is_aborted() {
                break;
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(created),
        }
    }

    fn instantiate_for(&mut self, instantiator: ModuleId, entity: &str) -> Result<ModuleId, BuildError> {
        let session = self.session;
        let interner = &session.interner;
        let mut module = self.library.get(entity, None)?;
        let instantiator_name = self.design.module(instantiator).label(interner).to_string();
        let name = format!("{instantiator_name}_{entity}");
        if self.design.find_module(&name, interner).is_some() {
            return Err(ModuleError::DuplicateInstance { name }.into());
        }
        module.name = interner.intern_lower(&name);
        let behavior = module.behavior.clone();
        let id = self.design.add_module(module);
        self.pending
            .push(note_auto_instantiated(&name, entity, &instantiator_name));

        if let Some(behavior) = behavior {
            let mut ctx = AutoInstContext::new(&mut self.design, id, instantiator, interner);
            behavior.auto_inst_config(&mut ctx)?;
        }

        for (source, sink) in [(instantiator, id), (id, instantiator)] {
            if let Some(plan) = self.plan(Side::Module(source), Side::Module(sink), true)? {
                let wires = self.execute(&plan)?;
                self.connections.push(Connection {
                    source: Endpoint::Module(source),
                    sink: Endpoint::Module(sink),
                    wires,
                });
            }
        }
        Ok(id)
    }
}
