//! The finished system, read-only, for emitters and visualizers.

use std::collections::HashMap;

use asterics_common::Interner;
use asterics_diagnostics::Diagnostic;
use asterics_model::{
    evaluate, ConstValue, DataWidth, Design, GenericRef, GlueId, GlueSignal, Module, ModuleId,
    PortRef, Resolution,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction as EdgeDirection;

use crate::endpoint::Connection;

/// A successfully built system.
///
/// Generic values are resolved as far as the expression resolver can take
/// them; port and glue widths carry the values finalization computed.
#[derive(Debug)]
pub struct SystemGraph {
    design: Design,
    connections: Vec<Connection>,
    names: HashMap<String, ModuleId>,
    generics: HashMap<GenericRef, ConstValue>,
    graph: DiGraph<ModuleId, GlueId>,
    nodes: HashMap<ModuleId, NodeIndex>,
    diagnostics: Vec<Diagnostic>,
}

impl SystemGraph {
    pub(crate) fn new(
        design: Design,
        connections: Vec<Connection>,
        diagnostics: Vec<Diagnostic>,
        interner: &Interner,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let mut names = HashMap::new();
        let mut generics = HashMap::new();
        for (id, module) in design.modules() {
            nodes.insert(id, graph.add_node(id));
            names.insert(module.label(interner).to_string(), id);
            let env = design.generic_env(id, interner);
            for g in module.generics.ids() {
                let generic = GenericRef::new(id, g);
                let Some(value) = design.generic_value(generic) else {
                    continue;
                };
                let value = match &value {
                    ConstValue::Symbol(text) => match evaluate(text, &env) {
                        Ok(Resolution::Resolved(v)) => ConstValue::Int(v),
                        _ => value,
                    },
                    _ => value,
                };
                generics.insert(generic, value);
            }
        }
        for (glue_id, glue) in design.glue_signals() {
            for sink in &glue.sinks {
                if sink.module != glue.driver.module {
                    graph.add_edge(nodes[&glue.driver.module], nodes[&sink.module], glue_id);
                }
            }
        }
        SystemGraph {
            design,
            connections,
            names,
            generics,
            graph,
            nodes,
            diagnostics,
        }
    }

    /// The underlying design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Module instances in creation order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.design.modules()
    }

    /// A module by instance name.
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.names.get(&name.to_ascii_lowercase()).copied()
    }

    /// Glue signals in creation order.
    pub fn glue_signals(&self) -> impl Iterator<Item = (GlueId, &GlueSignal)> {
        self.design.glue_signals()
    }

    /// Connections in the order they were made.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Final value of a generic.
    pub fn generic_value(&self, generic: GenericRef) -> Option<&ConstValue> {
        self.generics.get(&generic)
    }

    /// Final values of a module's generics, by name.
    pub fn generics_of(&self, module: ModuleId, interner: &Interner) -> Vec<(String, ConstValue)> {
        let m = self.design.module(module);
        m.generics
            .iter()
            .filter_map(|(id, g)| {
                self.generics
                    .get(&GenericRef::new(module, id))
                    .map(|v| (interner.resolve(g.name).to_string(), v.clone()))
            })
            .collect()
    }

    /// Width of a port after finalization.
    pub fn port_width(&self, port: PortRef) -> &DataWidth {
        self.design.port(port).effective_width()
    }

    /// Ports routed to the top level.
    pub fn external_ports(&self) -> Vec<PortRef> {
        self.design
            .modules()
            .flat_map(|(m, module)| {
                module
                    .ports
                    .iter()
                    .filter(|(_, p)| p.external)
                    .map(move |(p, _)| PortRef::new(m, p))
            })
            .collect()
    }

    /// Module-level connectivity: one edge per glue signal and sink module.
    pub fn connectivity(&self) -> &DiGraph<ModuleId, GlueId> {
        &self.graph
    }

    /// Modules fed by `module`, without duplicates.
    pub fn successors(&self, module: ModuleId) -> Vec<ModuleId> {
        self.neighbors(module, EdgeDirection::Outgoing)
    }

    /// Modules feeding `module`, without duplicates.
    pub fn predecessors(&self, module: ModuleId) -> Vec<ModuleId> {
        self.neighbors(module, EdgeDirection::Incoming)
    }

    fn neighbors(&self, module: ModuleId, direction: EdgeDirection) -> Vec<ModuleId> {
        let Some(node) = self.nodes.get(&module) else {
            return Vec::new();
        };
        let mut found: Vec<ModuleId> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.graph[n])
            .collect();
        found.sort();
        found.dedup();
        found
    }

    /// Notes and warnings collected during the build.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ChainOptions;
    use crate::test_support::*;
    use crate::ProcessingChain;
    use asterics_library::Session;
    use asterics_model::ConstValue;

    #[test]
    fn build_produces_graph() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(REGISTERED, Some("inv"), None).unwrap();
        chain.connect(cam, inv).unwrap();
        let graph = chain.build().unwrap();

        let regmgr = graph.module_by_name("inv_as_regmgr").unwrap();
        assert_eq!(graph.successors(cam), vec![inv]);
        assert_eq!(graph.predecessors(inv), vec![cam, regmgr]);
        assert!(graph.successors(inv).contains(&regmgr));
        assert!(graph
            .generics_of(regmgr, &session.interner)
            .contains(&("REG_COUNT".to_string(), ConstValue::Int(4))));
        let clk = graph
            .design()
            .module(cam)
            .port_by_code_name("clk", &session.interner)
            .unwrap();
        assert!(graph
            .external_ports()
            .contains(&asterics_model::PortRef::new(cam, clk)));
        assert!(graph.diagnostics().iter().all(|d| !d.severity.is_error()));
    }

    #[test]
    fn failed_build_reports_every_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let options = ChainOptions {
            abort_on_fatal: false,
            ..ChainOptions::default()
        };
        let mut chain = ProcessingChain::new(&library, &session, options);
        let a = chain.add_module(PRODUCER, None, None).unwrap();
        let b = chain.add_module(PRODUCER, None, None).unwrap();
        assert!(chain.connect(a, b).is_err());
        assert!(chain.add_module("as_nothing", None, None).is_err());
        let failure = chain.build().unwrap_err();
        assert_eq!(failure.error_count(), 2);
        assert!(failure.diagnostics.iter().any(|d| !d.severity.is_error()));
    }
}
