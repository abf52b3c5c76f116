//! The processing chain: module instances, layers and the build state.
//!
//! [`ProcessingChain`] owns the [`Design`] under construction. Every
//! mutating call either completes or leaves the design as it was; failures
//! are returned to the caller and also recorded in the session's sink so
//! that [`ProcessingChain::build`] can report the full list at the end.

use std::collections::{HashMap, HashSet};

use asterics_diagnostics::Diagnostic;
use asterics_library::{ModuleError, ModuleLibrary, Session};
use asterics_model::{AssignError, ConstValue, Design, GenericRef, Module, ModuleId, ObjectKind, PortRef};

use crate::endpoint::{Connection, Endpoint, Layer};
use crate::error::{BuildError, BuildFailure, ConnectionError};
use crate::graph::SystemGraph;
use crate::options::ChainOptions;

/// State restored when a multi-step operation fails halfway.
pub(crate) struct Snapshot {
    design: Design,
    connections: usize,
}

/// Builds one system from library modules.
pub struct ProcessingChain<'a> {
    /// Prototype source.
    pub(crate) library: &'a ModuleLibrary<'a>,
    /// Interner and diagnostic sink shared with the library.
    pub(crate) session: &'a Session,
    /// Behavior switches.
    pub(crate) options: ChainOptions,
    /// The design being built.
    pub(crate) design: Design,
    /// Layers in creation order.
    pub(crate) layers: Vec<Layer>,
    /// Successful connections in order.
    pub(crate) connections: Vec<Connection>,
    /// Diagnostics of the running operation, emitted once it succeeds.
    pub(crate) pending: Vec<Diagnostic>,
    /// Per-entity counter for unnamed instances.
    instance_counts: HashMap<String, usize>,
    /// Warnings and notes finalization already reported.
    pub(crate) reported: HashSet<String>,
    aborted: bool,
}

impl<'a> ProcessingChain<'a> {
    /// Creates an empty chain.
    pub fn new(library: &'a ModuleLibrary<'a>, session: &'a Session, options: ChainOptions) -> Self {
        ProcessingChain {
            library,
            session,
            options,
            design: Design::new(),
            layers: Vec::new(),
            connections: Vec::new(),
            pending: Vec::new(),
            instance_counts: HashMap::new(),
            reported: HashSet::new(),
            aborted: false,
        }
    }

    /// The options in effect.
    pub fn options(&self) -> ChainOptions {
        self.options
    }

    /// The design built so far.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Connections made so far, including those of auto-instantiation.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Layers in creation order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns `true` once a fatal error stopped the chain.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// A module instance.
    pub fn module(&self, id: ModuleId) -> &Module {
        self.design.module(id)
    }

    /// Looks up an instance by name.
    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.design.find_module(name, &self.session.interner)
    }

    /// Instantiates a library module.
    ///
    /// Without a name the instance is called `{entity}_{n}`, `n` counting
    /// the unnamed instances of that entity from 0.
    pub fn add_module(
        &mut self,
        entity: &str,
        name: Option<&str>,
        repository: Option<&str>,
    ) -> Result<ModuleId, BuildError> {
        self.guard()?;
        let result = self.instantiate(entity, name, repository);
        result.map_err(|e| self.fail(e))
    }

    fn instantiate(
        &mut self,
        entity: &str,
        name: Option<&str>,
        repository: Option<&str>,
    ) -> Result<ModuleId, BuildError> {
        let session = self.session;
        let entity = entity.to_ascii_lowercase();
        let mut module = self.library.get(&entity, repository)?;
        let name = match name {
            Some(name) => name.to_ascii_lowercase(),
            None => {
                let count = self.instance_counts.entry(entity.clone()).or_insert(0);
                let name = format!("{entity}_{count}");
                *count += 1;
                name
            }
        };
        if self.module_id(&name).is_some() {
            return Err(ModuleError::DuplicateInstance { name }.into());
        }
        module.name = session.interner.intern_lower(&name);
        Ok(self.design.add_module(module))
    }

    /// Qualified interface endpoint, e.g. `chain.interface(cam, "out")`.
    pub fn interface(&self, module: ModuleId, name: &str) -> Result<Endpoint, BuildError> {
        let m = self.existing_module(module)?;
        m.interface_by_name(name)
            .map(|id| Endpoint::Interface(module, id))
            .ok_or_else(|| {
                ConnectionError::UnknownTarget {
                    kind: "interface",
                    name: format!("{}.{}", m.label(&self.session.interner), name),
                }
                .into()
            })
    }

    /// Qualified port endpoint by declared name.
    pub fn port(&self, module: ModuleId, name: &str) -> Result<Endpoint, BuildError> {
        self.port_ref(module, name).map(Endpoint::Port)
    }

    /// Port reference by declared name.
    pub fn port_ref(&self, module: ModuleId, name: &str) -> Result<PortRef, BuildError> {
        let interner = &self.session.interner;
        let m = self.existing_module(module)?;
        m.port_by_code_name(name, interner)
            .map(|id| PortRef::new(module, id))
            .ok_or_else(|| {
                ConnectionError::UnknownTarget {
                    kind: "port",
                    name: format!("{}.{}", m.label(interner), name),
                }
                .into()
            })
    }

    pub(crate) fn existing_module(&self, module: ModuleId) -> Result<&Module, ConnectionError> {
        self.design
            .try_module(module)
            .ok_or_else(|| ConnectionError::UnknownTarget {
                kind: "module",
                name: format!("#{}", module.as_raw()),
            })
    }

    /// Creates an empty layer.
    pub fn add_layer(&mut self, name: &str) -> Result<(), BuildError> {
        self.guard()?;
        if self.layers.iter().any(|l| l.name == name) {
            let err = ConnectionError::DuplicateLayer {
                layer: name.to_string(),
            };
            return Err(self.fail(err.into()));
        }
        self.layers.push(Layer {
            name: name.to_string(),
            modules: Vec::new(),
        });
        Ok(())
    }

    /// Appends a module to a layer.
    pub fn add_to_layer(&mut self, layer: &str, module: ModuleId) -> Result<(), BuildError> {
        self.guard()?;
        let result = self.existing_module(module).map(|_| ()).and_then(|()| {
            match self.layers.iter_mut().find(|l| l.name == layer) {
                Some(l) => {
                    l.modules.push(module);
                    Ok(())
                }
                None => Err(ConnectionError::UnknownTarget {
                    kind: "layer",
                    name: layer.to_string(),
                }),
            }
        });
        result.map_err(|e| self.fail(e.into()))
    }

    fn generic_ref(&self, module: ModuleId, name: &str) -> Result<GenericRef, BuildError> {
        let interner = &self.session.interner;
        let m = self.existing_module(module)?;
        m.generic_by_name(name, interner)
            .map(|g| GenericRef::new(module, g))
            .ok_or_else(|| {
                AssignError::UnknownObject {
                    parent: m.label(interner).to_string(),
                    kind: ObjectKind::Generic,
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Sets a generic, writing through links to the end of the chain.
    pub fn set_generic(
        &mut self,
        module: ModuleId,
        name: &str,
        value: impl Into<ConstValue>,
    ) -> Result<(), BuildError> {
        self.guard()?;
        let session = self.session;
        let value = value.into();
        let result = self.generic_ref(module, name).and_then(|generic| {
            self.design
                .set_generic_value(generic, value, &session.interner)
                .map_err(BuildError::from)
        });
        result.map_err(|e| self.fail(e))
    }

    /// Links `from_module.from` to `to_module.to`.
    pub fn link_generic(
        &mut self,
        from_module: ModuleId,
        from: &str,
        to_module: ModuleId,
        to: &str,
    ) -> Result<(), BuildError> {
        self.guard()?;
        let session = self.session;
        let result = match (self.generic_ref(from_module, from), self.generic_ref(to_module, to)) {
            (Ok(from), Ok(to)) => self
                .design
                .link_generic(from, to, &session.interner)
                .map_err(BuildError::from),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Current value of a generic, following links.
    pub fn generic_value(&self, module: ModuleId, name: &str) -> Option<ConstValue> {
        let generic = self.generic_ref(module, name).ok()?;
        self.design.generic_value(generic)
    }

    /// Routes a port to the top level.
    pub fn make_external(&mut self, port: PortRef) -> Result<(), BuildError> {
        self.guard()?;
        let session = self.session;
        let result = match self.existing_module(port.module).map(|_| ()) {
            Err(e) => Err(BuildError::from(e)),
            Ok(()) => self
                .design
                .module_mut(port.module)
                .make_port_external(port.port, &session.interner)
                .map_err(BuildError::from),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Ties a port to a constant.
    pub fn set_port_value(&mut self, port: PortRef, value: &str) -> Result<(), BuildError> {
        self.guard()?;
        let session = self.session;
        let result = match self.existing_module(port.module).map(|_| ()) {
            Err(e) => Err(BuildError::from(e)),
            Ok(()) => self
                .design
                .module_mut(port.module)
                .set_port_fixed_value(port.port, value, &session.interner)
                .map_err(BuildError::from),
        };
        result.map_err(|e| self.fail(e))
    }

    /// Finishes the chain: auto-instantiation (when enabled), finalization,
    /// then either the read-only graph or every diagnostic of the build.
    pub fn build(mut self) -> Result<SystemGraph, BuildFailure> {
        if !self.aborted && self.options.auto_instantiate {
            // Failures are already in the sink.
            let _ = self.auto_instantiate();
        }
        // Finalize again even after an explicit call: modules and wires may
        // have been added since.
        if !self.aborted {
            let _ = self.finalize();
        }
        let diagnostics = self.session.sink.take_all();
        if self.aborted || diagnostics.iter().any(|d| d.severity.is_error()) {
            return Err(BuildFailure { diagnostics });
        }
        Ok(SystemGraph::new(
            self.design,
            self.connections,
            diagnostics,
            &self.session.interner,
        ))
    }

    /// Errors with [`BuildError::Aborted`] once the chain stopped.
    pub(crate) fn guard(&self) -> Result<(), BuildError> {
        if self.aborted {
            Err(BuildError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Records a failure and stops the chain on fatal errors if configured.
    pub(crate) fn fail(&mut self, err: BuildError) -> BuildError {
        self.pending.clear();
        self.session.sink.emit(err.to_diagnostic());
        if err.is_fatal() && self.options.abort_on_fatal {
            self.aborted = true;
        }
        err
    }

    /// Emits the diagnostics of the operation that just succeeded.
    pub(crate) fn flush_pending(&mut self) {
        for diag in self.pending.drain(..) {
            self.session.sink.emit(diag);
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            design: self.design.clone(),
            connections: self.connections.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.design = snapshot.design;
        self.connections.truncate(snapshot.connections);
        self.pending.clear();
    }
}
